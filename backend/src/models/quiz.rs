// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::{grading::DEFAULT_PASS_THRESHOLD, models::question::PublicQuestion, utils::html::clean_html};

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Quiz {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,

    /// Minimum percentage (0-100) needed to pass.
    pub pass_threshold: i32,

    /// Attempts allowed per user. `None` means unlimited.
    pub max_attempts: Option<i32>,

    pub created_by: Option<i64>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Quiz {
    /// Threshold as the grader takes it. The column is constrained to 0..=100.
    pub fn threshold(&self) -> u32 {
        u32::try_from(self.pass_threshold.clamp(0, 100)).unwrap_or(DEFAULT_PASS_THRESHOLD)
    }
}

/// Row for the quiz listing, with the number of questions attached.
#[derive(Debug, Serialize, FromRow)]
pub struct QuizSummary {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub pass_threshold: i32,
    pub max_attempts: Option<i32>,
    pub question_count: i64,
}

/// DTO for a learner fetching a quiz: metadata plus questions without answers.
#[derive(Debug, Serialize)]
pub struct QuizDetail {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub pass_threshold: i32,
    pub max_attempts: Option<i32>,
    pub questions: Vec<PublicQuestion>,
}

/// DTO for creating a quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(range(min = 0, max = 100))]
    pub pass_threshold: Option<i32>,
    #[validate(range(min = 1))]
    pub max_attempts: Option<i32>,
}

impl CreateQuizRequest {
    pub fn sanitized(self) -> Self {
        CreateQuizRequest {
            title: clean_html(&self.title),
            description: self.description.as_deref().map(clean_html),
            ..self
        }
    }
}

/// DTO for updating a quiz. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(range(min = 0, max = 100))]
    pub pass_threshold: Option<i32>,
    #[validate(range(min = 1))]
    pub max_attempts: Option<i32>,
}

impl UpdateQuizRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.pass_threshold.is_none()
            && self.max_attempts.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiz(pass_threshold: i32) -> Quiz {
        Quiz {
            id: 1,
            title: "Intro".to_string(),
            description: None,
            pass_threshold,
            max_attempts: None,
            created_by: None,
            created_at: None,
        }
    }

    #[test]
    fn threshold_is_clamped_to_percent_range() {
        assert_eq!(quiz(70).threshold(), 70);
        assert_eq!(quiz(-5).threshold(), 0);
        assert_eq!(quiz(250).threshold(), 100);
    }

    #[test]
    fn create_request_validates_threshold_range() {
        let req = CreateQuizRequest {
            title: "Quiz".to_string(),
            description: None,
            pass_threshold: Some(101),
            max_attempts: None,
        };
        assert!(req.validate().is_err());

        let req = CreateQuizRequest {
            title: "Quiz".to_string(),
            description: None,
            pass_threshold: Some(100),
            max_attempts: Some(0),
        };
        assert!(req.validate().is_err());
    }
}
