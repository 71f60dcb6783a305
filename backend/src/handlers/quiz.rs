// src/handlers/quiz.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{PgExecutor, PgPool, types::Json as SqlJson};
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    grading::{self, QuizVerdict},
    models::{
        attempt::{AttemptResponse, GradeRequest, LeaderboardEntry, QuizAttempt, SubmitAttemptRequest},
        question::{PublicQuestion, Question, QuestionRow},
        quiz::{Quiz, QuizDetail, QuizSummary},
    },
    utils::jwt::Claims,
};

/// Loads a quiz row or fails with 404.
pub(crate) async fn fetch_quiz<'e>(executor: impl PgExecutor<'e>, quiz_id: i64) -> Result<Quiz, AppError> {
    sqlx::query_as::<_, Quiz>(
        r#"
        SELECT id, title, description, pass_threshold, max_attempts, created_by, created_at
        FROM quizzes
        WHERE id = $1
        "#,
    )
    .bind(quiz_id)
    .fetch_optional(executor)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch quiz {}: {:?}", quiz_id, e);
        AppError::InternalServerError(e.to_string())
    })?
    .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))
}

/// Loads a quiz's questions in display order, answer keys included.
pub(crate) async fn fetch_questions<'e>(
    executor: impl PgExecutor<'e>,
    quiz_id: i64,
) -> Result<Vec<Question>, AppError> {
    let rows = sqlx::query_as::<_, QuestionRow>(
        r#"
        SELECT
            id,
            quiz_id,
            position,
            question_type,
            question_text,
            options,
            correct_answer,
            explanation,
            created_at
        FROM questions
        WHERE quiz_id = $1
        ORDER BY position, id
        "#,
    )
    .bind(quiz_id)
    .fetch_all(executor)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch questions for quiz {}: {:?}", quiz_id, e);
        AppError::InternalServerError(e.to_string())
    })?;

    rows.into_iter()
        .map(|row| Question::try_from(row).map_err(AppError::InternalServerError))
        .collect()
}

/// Lists all quizzes with their question counts.
pub async fn list_quizzes(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let quizzes = sqlx::query_as::<_, QuizSummary>(
        r#"
        SELECT
            q.id,
            q.title,
            q.description,
            q.pass_threshold,
            q.max_attempts,
            COUNT(qs.id) AS question_count
        FROM quizzes q
        LEFT JOIN questions qs ON qs.quiz_id = q.id
        GROUP BY q.id
        ORDER BY q.id DESC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list quizzes: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(quizzes))
}

/// Returns a quiz with its questions, hiding answer keys and explanations.
pub async fn get_quiz(
    State(pool): State<PgPool>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = fetch_quiz(&pool, quiz_id).await?;
    let questions = fetch_questions(&pool, quiz_id).await?;

    Ok(Json(QuizDetail {
        id: quiz.id,
        title: quiz.title,
        description: quiz.description,
        pass_threshold: quiz.pass_threshold,
        max_attempts: quiz.max_attempts,
        questions: questions.iter().map(PublicQuestion::from).collect(),
    }))
}

/// Submits an attempt for the current user.
///
/// * Locks the quiz row so concurrent submissions can't overrun `max_attempts`.
/// * Grades against the stored questions with the quiz's own threshold.
/// * Stores the attempt and returns the verdict with per-question results.
pub async fn submit_attempt(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
    Json(req): Json<SubmitAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let user_id = claims.user_id()?;

    let mut tx = pool.begin().await?;

    let quiz = sqlx::query_as::<_, Quiz>(
        r#"
        SELECT id, title, description, pass_threshold, max_attempts, created_by, created_at
        FROM quizzes
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(quiz_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;

    if let Some(max_attempts) = quiz.max_attempts {
        let used: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM quiz_attempts WHERE quiz_id = $1 AND user_id = $2",
        )
        .bind(quiz_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        if used >= i64::from(max_attempts) {
            return Err(AppError::Conflict(format!(
                "Attempt limit of {} reached for this quiz",
                max_attempts
            )));
        }
    }

    let questions = fetch_questions(&mut *tx, quiz_id).await?;
    let report = grading::aggregate(&questions, &req.answers, quiz.threshold());
    let QuizVerdict {
        score,
        max_score,
        percentage,
        passed,
    } = report.verdict;

    let attempt_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO quiz_attempts (quiz_id, user_id, answers, score, max_score, percentage, passed)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(quiz_id)
    .bind(user_id)
    .bind(SqlJson(&req.answers))
    .bind(to_column(score)?)
    .bind(to_column(max_score)?)
    .bind(to_column(percentage)?)
    .bind(passed)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to store attempt: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    tx.commit().await?;

    tracing::info!(
        quiz_id,
        user_id,
        attempt_id,
        score,
        max_score,
        passed,
        "Attempt graded"
    );

    Ok((
        StatusCode::CREATED,
        Json(AttemptResponse {
            attempt_id,
            quiz_id,
            report,
        }),
    ))
}

fn to_column(value: u32) -> Result<i32, AppError> {
    i32::try_from(value).map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Lists the current user's attempts on a quiz, newest first.
pub async fn list_my_attempts(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    fetch_quiz(&pool, quiz_id).await?;

    let attempts = sqlx::query_as::<_, QuizAttempt>(
        r#"
        SELECT id, quiz_id, user_id, answers, score, max_score, percentage, passed, created_at
        FROM quiz_attempts
        WHERE quiz_id = $1 AND user_id = $2
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(quiz_id)
    .bind(user_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list attempts: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(attempts))
}

/// Top 10 users on a quiz by their best attempt. Earlier attempts win ties.
pub async fn get_leaderboard(
    State(pool): State<PgPool>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    fetch_quiz(&pool, quiz_id).await?;

    let leaderboard = sqlx::query_as::<_, LeaderboardEntry>(
        r#"
        SELECT username, score, max_score, percentage, created_at
        FROM (
            SELECT DISTINCT ON (a.user_id)
                u.username,
                a.score,
                a.max_score,
                a.percentage,
                a.created_at
            FROM quiz_attempts a
            JOIN users u ON a.user_id = u.id
            WHERE a.quiz_id = $1
            ORDER BY a.user_id, a.percentage DESC, a.created_at ASC
        ) best
        ORDER BY percentage DESC, created_at ASC
        LIMIT 10
        "#,
    )
    .bind(quiz_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch leaderboard: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(leaderboard))
}

/// Grades a caller-supplied question set. Nothing is read or stored.
pub async fn grade(
    State(config): State<Config>,
    Json(req): Json<GradeRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let threshold = req.pass_threshold.unwrap_or(config.default_pass_threshold);
    let report = grading::aggregate(&req.questions, &req.answers, threshold);

    Ok(Json(report))
}
