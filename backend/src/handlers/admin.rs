// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{PgPool, Postgres, QueryBuilder, types::Json as SqlJson};
use validator::Validate;

use crate::{
    error::AppError,
    grading::DEFAULT_PASS_THRESHOLD,
    handlers::quiz::{fetch_questions, fetch_quiz},
    models::{
        question::QuestionRequest,
        quiz::{CreateQuizRequest, UpdateQuizRequest},
    },
    utils::{html::clean_html, jwt::Claims},
};

/// Creates a new quiz.
/// Admin only.
pub async fn create_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let payload = payload.sanitized();
    let created_by = claims.user_id()?;

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO quizzes (title, description, pass_threshold, max_attempts, created_by)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(payload.pass_threshold.unwrap_or(DEFAULT_PASS_THRESHOLD as i32))
    .bind(payload.max_attempts)
    .bind(created_by)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create quiz: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    tracing::info!(quiz_id = id, "Created quiz '{}'", payload.title);

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

/// Updates quiz metadata by ID.
/// Admin only.
pub async fn update_quiz(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if payload.is_empty() {
        return Ok(StatusCode::OK);
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE quizzes SET ");
    let mut separated = builder.separated(", ");

    if let Some(title) = payload.title {
        separated.push("title = ");
        separated.push_bind_unseparated(clean_html(&title));
    }

    if let Some(description) = payload.description {
        separated.push("description = ");
        separated.push_bind_unseparated(clean_html(&description));
    }

    if let Some(pass_threshold) = payload.pass_threshold {
        separated.push("pass_threshold = ");
        separated.push_bind_unseparated(pass_threshold);
    }

    if let Some(max_attempts) = payload.max_attempts {
        separated.push("max_attempts = ");
        separated.push_bind_unseparated(max_attempts);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update quiz: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Deletes a quiz together with its questions and attempts.
/// Admin only.
pub async fn delete_quiz(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM quizzes WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete quiz: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Lists a quiz's questions including answer keys.
/// Admin only.
pub async fn list_questions(
    State(pool): State<PgPool>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    fetch_quiz(&pool, quiz_id).await?;
    let questions = fetch_questions(&pool, quiz_id).await?;

    Ok(Json(questions))
}

/// Appends a question to the end of a quiz.
/// Admin only.
pub async fn create_question(
    State(pool): State<PgPool>,
    Path(quiz_id): Path<i64>,
    Json(payload): Json<QuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let key = payload.answer_key()?;
    let payload = payload.sanitized();

    fetch_quiz(&pool, quiz_id).await?;

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO questions
        (quiz_id, position, question_type, question_text, options, correct_answer, explanation)
        SELECT $1, COALESCE(MAX(position), 0) + 1, $2, $3, $4, $5, $6
        FROM questions
        WHERE quiz_id = $1
        RETURNING id
        "#,
    )
    .bind(quiz_id)
    .bind(key.question_type())
    .bind(&payload.question_text)
    .bind(SqlJson(&payload.options))
    .bind(SqlJson(key.correct_answer()))
    .bind(&payload.explanation)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

/// Replaces a question's content and answer key.
/// Admin only.
pub async fn update_question(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<QuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let key = payload.answer_key()?;
    let payload = payload.sanitized();

    let result = sqlx::query(
        r#"
        UPDATE questions
        SET question_type = $1,
            question_text = $2,
            options = $3,
            correct_answer = $4,
            explanation = $5
        WHERE id = $6
        "#,
    )
    .bind(key.question_type())
    .bind(&payload.question_text)
    .bind(SqlJson(&payload.options))
    .bind(SqlJson(key.correct_answer()))
    .bind(&payload.explanation)
    .bind(id)
    .execute(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Deletes a quiz question by ID.
/// Admin only.
pub async fn delete_question(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM questions WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete question: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
