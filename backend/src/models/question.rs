// src/models/question.rs

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

use crate::{error::AppError, utils::html::clean_html};

/// The question types the grader knows how to score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    MultipleSelect,
    TrueFalse,
    ShortAnswer,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::MultipleSelect => "multiple_select",
            QuestionType::TrueFalse => "true_false",
            QuestionType::ShortAnswer => "short_answer",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "multiple_choice" => Some(QuestionType::MultipleChoice),
            "multiple_select" => Some(QuestionType::MultipleSelect),
            "true_false" => Some(QuestionType::TrueFalse),
            "short_answer" => Some(QuestionType::ShortAnswer),
            _ => None,
        }
    }
}

/// Correct-answer encoding. The variant is the question type, the payload
/// is the answer in the shape that type expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerKey {
    /// Zero-based option index.
    MultipleChoice(usize),
    /// Zero-based option indices; order is irrelevant.
    MultipleSelect(BTreeSet<usize>),
    TrueFalse(bool),
    /// Stored verbatim, compared trimmed and case-folded.
    ShortAnswer(String),
    /// A type tag outside the known set. Always graded incorrect.
    Unrecognized(String),
}

impl AnswerKey {
    /// Builds a key from the stored `question_type` tag and its JSON-encoded answer.
    ///
    /// An unknown tag is not an error (it becomes `Unrecognized`), but a known tag
    /// whose answer has the wrong shape is.
    pub fn from_parts(question_type: &str, correct_answer: &Value) -> Result<Self, String> {
        let Some(kind) = QuestionType::parse(question_type) else {
            return Ok(AnswerKey::Unrecognized(question_type.to_string()));
        };

        match kind {
            QuestionType::MultipleChoice => option_index(correct_answer)
                .map(AnswerKey::MultipleChoice)
                .ok_or_else(|| {
                    format!("multiple_choice answer must be a non-negative integer, got {correct_answer}")
                }),
            QuestionType::MultipleSelect => correct_answer
                .as_array()
                .and_then(|items| items.iter().map(option_index).collect::<Option<BTreeSet<_>>>())
                .map(AnswerKey::MultipleSelect)
                .ok_or_else(|| {
                    format!(
                        "multiple_select answer must be an array of non-negative integers, got {correct_answer}"
                    )
                }),
            QuestionType::TrueFalse => match correct_answer {
                Value::Bool(b) => Ok(AnswerKey::TrueFalse(*b)),
                Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Ok(AnswerKey::TrueFalse(true)),
                Value::String(s) if s.trim().eq_ignore_ascii_case("false") => Ok(AnswerKey::TrueFalse(false)),
                other => Err(format!("true_false answer must be a boolean, got {other}")),
            },
            QuestionType::ShortAnswer => match correct_answer {
                Value::String(s) => Ok(AnswerKey::ShortAnswer(s.clone())),
                Value::Null => Ok(AnswerKey::ShortAnswer(String::new())),
                other => Err(format!("short_answer answer must be a string, got {other}")),
            },
        }
    }

    /// The type tag as stored and serialized.
    pub fn question_type(&self) -> &str {
        match self {
            AnswerKey::MultipleChoice(_) => QuestionType::MultipleChoice.as_str(),
            AnswerKey::MultipleSelect(_) => QuestionType::MultipleSelect.as_str(),
            AnswerKey::TrueFalse(_) => QuestionType::TrueFalse.as_str(),
            AnswerKey::ShortAnswer(_) => QuestionType::ShortAnswer.as_str(),
            AnswerKey::Unrecognized(tag) => tag,
        }
    }

    /// JSON encoding of the correct answer, the inverse of `from_parts`.
    pub fn correct_answer(&self) -> Value {
        match self {
            AnswerKey::MultipleChoice(index) => Value::from(*index),
            AnswerKey::MultipleSelect(indices) => indices.iter().copied().map(Value::from).collect(),
            AnswerKey::TrueFalse(b) => Value::Bool(*b),
            AnswerKey::ShortAnswer(text) => Value::String(text.clone()),
            AnswerKey::Unrecognized(_) => Value::Null,
        }
    }
}

fn option_index(value: &Value) -> Option<usize> {
    value.as_u64().and_then(|i| usize::try_from(i).ok())
}

/// A gradable question.
///
/// Serialized flat, with `question_type` and `correct_answer` side by side,
/// which is also the shape stored in the `questions` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "QuestionRecord", into = "QuestionRecord")]
pub struct Question {
    pub id: i64,
    pub question_text: String,
    pub options: Vec<String>,
    pub answer_key: AnswerKey,
    /// Authored feedback shown after grading. Not used for scoring.
    pub explanation: Option<String>,
}

impl Question {
    pub fn question_type(&self) -> &str {
        self.answer_key.question_type()
    }
}

#[derive(Serialize, Deserialize)]
struct QuestionRecord {
    #[serde(default)]
    id: i64,
    question_type: String,
    #[serde(default)]
    question_text: String,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    correct_answer: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    explanation: Option<String>,
}

impl TryFrom<QuestionRecord> for Question {
    type Error = String;

    fn try_from(record: QuestionRecord) -> Result<Self, Self::Error> {
        let answer_key = AnswerKey::from_parts(&record.question_type, &record.correct_answer)?;
        Ok(Question {
            id: record.id,
            question_text: record.question_text,
            options: record.options,
            answer_key,
            explanation: record.explanation,
        })
    }
}

impl From<Question> for QuestionRecord {
    fn from(question: Question) -> Self {
        QuestionRecord {
            id: question.id,
            question_type: question.answer_key.question_type().to_string(),
            correct_answer: question.answer_key.correct_answer(),
            question_text: question.question_text,
            options: question.options,
            explanation: question.explanation,
        }
    }
}

/// One submitted answer.
///
/// Absence is modelled outside this type as `Option<Answer>::None`. Anything
/// that is neither a boolean, an integer, an integer array nor a string lands
/// in `Other`, so a wrong-typed answer is still distinguishable from no answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Bool(bool),
    Index(i64),
    Indices(Vec<i64>),
    Text(String),
    Other(Value),
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow)]
pub struct QuestionRow {
    pub id: i64,
    pub quiz_id: i64,
    pub position: i32,
    pub question_type: String,
    pub question_text: String,
    pub options: Json<Vec<String>>,
    pub correct_answer: Json<Value>,
    pub explanation: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl TryFrom<QuestionRow> for Question {
    type Error = String;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        let answer_key = AnswerKey::from_parts(&row.question_type, &row.correct_answer.0)
            .map_err(|e| format!("question {}: {}", row.id, e))?;
        Ok(Question {
            id: row.id,
            question_text: row.question_text,
            options: row.options.0,
            answer_key,
            explanation: row.explanation,
        })
    }
}

/// DTO for sending a question to a learner (no answer key, no explanation).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub question_type: String,
    pub question_text: String,
    pub options: Vec<String>,
}

impl From<&Question> for PublicQuestion {
    fn from(question: &Question) -> Self {
        PublicQuestion {
            id: question.id,
            question_type: question.question_type().to_string(),
            question_text: question.question_text.clone(),
            options: question.options.clone(),
        }
    }
}

/// DTO for creating or replacing a question.
#[derive(Debug, Deserialize, Validate)]
pub struct QuestionRequest {
    #[validate(length(min = 1, max = 32))]
    pub question_type: String,
    #[validate(length(min = 1, max = 2000))]
    pub question_text: String,
    #[serde(default)]
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct_answer: Value,
    #[validate(length(max = 2000))]
    pub explanation: Option<String>,
}

impl QuestionRequest {
    /// Parses and range-checks the answer key against the options.
    ///
    /// Unlike stored data, authoring only accepts the known question types.
    pub fn answer_key(&self) -> Result<AnswerKey, AppError> {
        let key = AnswerKey::from_parts(&self.question_type, &self.correct_answer)
            .map_err(AppError::BadRequest)?;

        let option_count = self.options.len();
        match &key {
            AnswerKey::Unrecognized(tag) => {
                return Err(AppError::BadRequest(format!(
                    "Unsupported question type '{}'",
                    tag
                )));
            }
            AnswerKey::MultipleChoice(index) if *index >= option_count => {
                return Err(AppError::BadRequest(format!(
                    "Correct option {} is out of range for {} options",
                    index, option_count
                )));
            }
            AnswerKey::MultipleSelect(indices) => {
                if indices.is_empty() {
                    return Err(AppError::BadRequest(
                        "multiple_select needs at least one correct option".to_string(),
                    ));
                }
                if let Some(index) = indices.iter().find(|i| **i >= option_count) {
                    return Err(AppError::BadRequest(format!(
                        "Correct option {} is out of range for {} options",
                        index, option_count
                    )));
                }
            }
            _ => {}
        }

        Ok(key)
    }

    /// Authored text with unsafe markup stripped. The answer key is left as is
    /// so grading compares against exactly what the author typed.
    pub fn sanitized(self) -> Self {
        QuestionRequest {
            question_text: clean_html(&self.question_text),
            options: self.options.iter().map(|o| clean_html(o)).collect(),
            explanation: self.explanation.as_deref().map(clean_html),
            ..self
        }
    }
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.len() > 20 {
        return Err(validator::ValidationError::new("too_many_options"));
    }
    for opt in options {
        if opt.is_empty() {
            return Err(validator::ValidationError::new("option_cannot_be_empty"));
        }
        if opt.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}
