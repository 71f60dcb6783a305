// src/grading/aggregator.rs

use serde::Serialize;

use super::evaluator::{QuestionResult, evaluate};
use crate::models::question::{Answer, Question};

/// Pass threshold used when the caller does not supply one.
pub const DEFAULT_PASS_THRESHOLD: u32 = 70;

/// Aggregate outcome of one graded submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizVerdict {
    pub score: u32,
    pub max_score: u32,
    /// Rounded to the nearest whole percent, 0 when there are no questions.
    pub percentage: u32,
    pub passed: bool,
}

/// Verdict plus the per-question results it was computed from, in question order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GradeReport {
    pub verdict: QuizVerdict,
    pub results: Vec<QuestionResult>,
}

/// Grades a submission.
///
/// `answers` is index-aligned with `questions`. Missing trailing answers are
/// graded as absent and extra ones are ignored. A quiz with no questions
/// never passes, whatever the threshold.
pub fn aggregate(questions: &[Question], answers: &[Option<Answer>], pass_threshold: u32) -> GradeReport {
    let results: Vec<QuestionResult> = questions
        .iter()
        .enumerate()
        .map(|(i, question)| evaluate(question, answers.get(i).and_then(Option::as_ref)))
        .collect();

    let score = results.iter().filter(|r| r.is_correct).count();
    let verdict = verdict(score, questions.len(), pass_threshold);

    tracing::debug!(
        score = verdict.score,
        max_score = verdict.max_score,
        percentage = verdict.percentage,
        passed = verdict.passed,
        "Graded submission"
    );

    GradeReport { verdict, results }
}

/// Same as [`aggregate`] without the per-question results.
pub fn aggregate_verdict(questions: &[Question], answers: &[Option<Answer>], pass_threshold: u32) -> QuizVerdict {
    aggregate(questions, answers, pass_threshold).verdict
}

fn verdict(score: usize, max_score: usize, pass_threshold: u32) -> QuizVerdict {
    let percentage = percentage(score, max_score);
    QuizVerdict {
        score: u32::try_from(score).unwrap_or(u32::MAX),
        max_score: u32::try_from(max_score).unwrap_or(u32::MAX),
        percentage,
        passed: max_score > 0 && percentage >= pass_threshold,
    }
}

fn percentage(score: usize, max_score: usize) -> u32 {
    if max_score == 0 {
        return 0;
    }
    // Halves round up; score <= max_score keeps this within 0..=100.
    (score as f64 / max_score as f64 * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::AnswerKey;

    fn tf(id: i64) -> Question {
        Question {
            id,
            question_text: format!("Statement {}", id),
            options: vec![],
            answer_key: AnswerKey::TrueFalse(true),
            explanation: None,
        }
    }

    #[test]
    fn percentage_rounds_to_nearest() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 8), 13); // 12.5 rounds up
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn threshold_is_inclusive() {
        let questions: Vec<Question> = (1..=10).map(tf).collect();
        let mut answers = vec![Some(Answer::Bool(true)); 7];
        answers.extend(vec![Some(Answer::Bool(false)); 3]);

        let verdict = aggregate_verdict(&questions, &answers, 70);
        assert_eq!(verdict.percentage, 70);
        assert!(verdict.passed);

        let verdict = aggregate_verdict(&questions, &answers, 71);
        assert!(!verdict.passed);
    }

    #[test]
    fn empty_quiz_never_passes() {
        let verdict = aggregate_verdict(&[], &[], 0);
        assert_eq!(
            verdict,
            QuizVerdict {
                score: 0,
                max_score: 0,
                percentage: 0,
                passed: false
            }
        );
    }

    #[test]
    fn extra_answers_are_ignored() {
        let questions = vec![tf(1)];
        let answers = vec![Some(Answer::Bool(true)), Some(Answer::Bool(true))];

        let report = aggregate(&questions, &answers, 70);
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.verdict.score, 1);
        assert_eq!(report.verdict.max_score, 1);
    }

    #[test]
    fn results_follow_question_order() {
        let questions = vec![tf(5), tf(3), tf(9)];
        let report = aggregate(&questions, &[], 70);

        let ids: Vec<i64> = report.results.iter().map(|r| r.question_id).collect();
        assert_eq!(ids, vec![5, 3, 9]);
        assert!(report.results.iter().all(|r| !r.is_correct));
    }
}
