// src/grading/mod.rs

//! Quiz grading: per-question evaluation and score aggregation.
//!
//! Everything here is pure and synchronous. Callers load questions and
//! answers however they like and hand them to [`aggregate`].

pub mod aggregator;
pub mod evaluator;

pub use aggregator::{DEFAULT_PASS_THRESHOLD, GradeReport, QuizVerdict, aggregate, aggregate_verdict};
pub use evaluator::{QuestionResult, evaluate};
