// src/config.rs

use std::env;
use dotenvy::dotenv;

use crate::grading::DEFAULT_PASS_THRESHOLD;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    /// Threshold applied by the stateless grade endpoint when none is given.
    pub default_pass_threshold: u32,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let jwt_expiration = parse_or(env::var("JWT_EXPIRATION").ok(), 86_400);

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let admin_username = env::var("ADMIN_USERNAME").ok().filter(|s| !s.is_empty());
        let admin_password = env::var("ADMIN_PASSWORD").ok().filter(|s| !s.is_empty());

        let default_pass_threshold =
            parse_or(env::var("QUIZ_PASS_THRESHOLD").ok(), DEFAULT_PASS_THRESHOLD).min(100);

        let port = parse_or(env::var("PORT").ok(), 3000);

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            admin_username,
            admin_password,
            default_pass_threshold,
            port,
        }
    }
}

/// Parses an optional variable, falling back on absence or garbage.
fn parse_or<T: std::str::FromStr>(raw: Option<String>, default: T) -> T {
    match raw {
        Some(value) => match value.trim().parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                tracing::warn!("Ignoring unparsable config value '{}'", value);
                default
            }
        },
        None => default,
    }
}
