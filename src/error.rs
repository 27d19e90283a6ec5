//! Error types for the poster service

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum Payment {
  #[error("Payment verification failed")]
  SignatureMismatch,

  #[error("Payment not captured (status: {0})")]
  NotCaptured(String),

  #[error("Payment does not match this checkout: {0}")]
  Mismatch(String),

  #[error("Unknown plan `{0}`")]
  UnknownPlan(String),

  #[error("Malformed webhook: {0}")]
  MalformedWebhook(String),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("Database error: {0}")]
  Database(#[from] sea_orm::DbErr),

  #[error("{0}")]
  Validation(String),

  #[error("Authentication required")]
  Unauthorized,

  #[error("User not found")]
  UserNotFound,

  #[error("You have no credits left. Subscribe to keep creating posters")]
  CreditsExhausted,

  #[error("Upstream error: {0}")]
  Upstream(String),

  #[error("There was an issue while creating your poster")]
  GenerationFailed { detail: String },

  #[error(transparent)]
  Payment(#[from] Payment),

  #[error("Configuration error: {0}")]
  Config(String),

  #[error("Internal error: {0}")]
  Internal(String),
}

impl Error {
  pub fn validation(message: impl Into<String>) -> Self {
    Self::Validation(message.into())
  }

  pub fn missing_config(var: &str) -> Self {
    Self::Config(format!("{var} is not set"))
  }
}

impl From<JsonRejection> for Error {
  fn from(rejection: JsonRejection) -> Self {
    Self::Validation(rejection.body_text())
  }
}

impl From<reqwest::Error> for Error {
  fn from(err: reqwest::Error) -> Self {
    Self::Upstream(err.to_string())
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = match &self {
      Error::Validation(_) => StatusCode::BAD_REQUEST,
      Error::Unauthorized => StatusCode::UNAUTHORIZED,
      Error::UserNotFound => StatusCode::NOT_FOUND,
      Error::CreditsExhausted => StatusCode::PAYMENT_REQUIRED,
      Error::Upstream(_) => StatusCode::BAD_GATEWAY,
      Error::Payment(_) => StatusCode::BAD_REQUEST,
      Error::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
      Error::GenerationFailed { .. }
      | Error::Database(_)
      | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let mut body = json::json!({
      "success": false,
      "message": self.to_string(),
    });

    match &self {
      Error::CreditsExhausted => {
        body["upgradeRequired"] = json::Value::Bool(true);
      }
      Error::GenerationFailed { detail } => {
        error!("Poster generation failed: {detail}");
        body["error"] = json::Value::String(detail.clone());
      }
      Error::Config(msg) => {
        error!("Configuration error: {msg}");
        body["message"] = "Service is not configured".into();
      }
      Error::Database(err) => {
        error!("Database error: {err}");
        body["message"] = "Database error".into();
      }
      Error::Internal(msg) => {
        error!("Internal error: {msg}");
        body["message"] = "Internal error".into();
      }
      _ => {}
    }

    (status, Json(body)).into_response()
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
