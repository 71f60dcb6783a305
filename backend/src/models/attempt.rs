// src/models/attempt.rs

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use validator::Validate;

use crate::{
    grading::GradeReport,
    models::question::{Answer, Question},
};

/// Represents the 'quiz_attempts' table in the database.
/// Every submission is kept; nothing is overwritten on retake.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QuizAttempt {
    pub id: i64,
    pub quiz_id: i64,
    pub user_id: i64,
    pub answers: Json<Vec<Option<Answer>>>,
    pub score: i32,
    pub max_score: i32,
    pub percentage: i32,
    pub passed: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Best attempt of one user on a quiz, joined with `users`.
#[derive(Debug, Serialize, FromRow)]
pub struct LeaderboardEntry {
    pub username: String,
    pub score: i32,
    pub max_score: i32,
    pub percentage: i32,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for submitting a quiz attempt.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAttemptRequest {
    /// Answers index-aligned with the quiz questions; `null` means unanswered.
    #[validate(length(max = 500))]
    pub answers: Vec<Option<Answer>>,
}

/// DTO returned after an attempt is graded and stored.
#[derive(Debug, Serialize)]
pub struct AttemptResponse {
    pub attempt_id: i64,
    pub quiz_id: i64,
    #[serde(flatten)]
    pub report: GradeReport,
}

/// DTO for grading an ad-hoc question set without touching the database.
#[derive(Debug, Deserialize, Validate)]
pub struct GradeRequest {
    #[validate(length(max = 500))]
    pub questions: Vec<Question>,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub answers: Vec<Option<Answer>>,
    /// Falls back to the configured default when omitted.
    #[validate(range(max = 100))]
    pub pass_threshold: Option<u32>,
}
