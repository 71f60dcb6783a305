// src/grading/evaluator.rs

use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::question::{Answer, AnswerKey, Question};

/// Outcome of grading a single question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionResult {
    pub question_id: i64,
    pub is_correct: bool,
    pub explanation: String,
}

/// Grades one answer against one question.
///
/// Total over every input: a missing or wrong-shaped answer is graded
/// incorrect, never an error.
pub fn evaluate(question: &Question, answer: Option<&Answer>) -> QuestionResult {
    let (is_correct, explanation) = match &question.answer_key {
        AnswerKey::MultipleChoice(correct) => multiple_choice(*correct, answer),
        AnswerKey::MultipleSelect(correct) => multiple_select(correct, answer),
        AnswerKey::TrueFalse(correct) => true_false(*correct, answer),
        AnswerKey::ShortAnswer(correct) => short_answer(correct, answer),
        AnswerKey::Unrecognized(tag) => (
            false,
            format!("Unable to determine correctness for question type '{}'.", tag),
        ),
    };

    QuestionResult {
        question_id: question.id,
        is_correct,
        explanation,
    }
}

fn multiple_choice(correct: usize, answer: Option<&Answer>) -> (bool, String) {
    let correct_label = correct + 1;
    match answer {
        Some(Answer::Index(selected)) => {
            if usize::try_from(*selected).is_ok_and(|s| s == correct) {
                (true, format!("You selected option {}, which is correct.", correct_label))
            } else {
                (
                    false,
                    format!(
                        "You selected option {}. The correct answer is option {}.",
                        display_label(*selected),
                        correct_label
                    ),
                )
            }
        }
        Some(_) => (
            false,
            format!(
                "Your answer is not a valid option. The correct answer is option {}.",
                correct_label
            ),
        ),
        None => (
            false,
            format!("No answer given. The correct answer is option {}.", correct_label),
        ),
    }
}

fn multiple_select(correct: &BTreeSet<usize>, answer: Option<&Answer>) -> (bool, String) {
    // Negative indices can never match, but they still count against equality.
    let selected: BTreeSet<i64> = match answer {
        Some(Answer::Indices(indices)) => indices.iter().copied().collect(),
        _ => BTreeSet::new(),
    };
    let expected: BTreeSet<i64> = correct.iter().filter_map(|i| i64::try_from(*i).ok()).collect();

    if selected.len() == expected.len() && selected.iter().all(|i| expected.contains(i)) {
        (true, "You selected exactly the correct options.".to_string())
    } else {
        let labels: Vec<String> = correct.iter().map(|i| (i + 1).to_string()).collect();
        let listed = if labels.is_empty() {
            "none".to_string()
        } else {
            labels.join(", ")
        };
        (false, format!("The correct options are {}.", listed))
    }
}

fn true_false(correct: bool, answer: Option<&Answer>) -> (bool, String) {
    let label = if correct { "True" } else { "False" };
    match answer {
        Some(Answer::Bool(given)) if *given == correct => {
            (true, format!("Correct. The answer is {}.", label))
        }
        _ => (false, format!("Incorrect. The correct answer is {}.", label)),
    }
}

fn short_answer(correct: &str, answer: Option<&Answer>) -> (bool, String) {
    let given = match answer {
        Some(Answer::Text(text)) => text.as_str(),
        _ => "",
    };

    if normalize(given) == normalize(correct) {
        (true, "Your answer matches the expected answer.".to_string())
    } else {
        (false, format!("The correct answer is \"{}\".", correct))
    }
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

fn display_label(selected: i64) -> String {
    selected.saturating_add(1).to_string()
}
