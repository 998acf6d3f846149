//! Error types and axum `IntoResponse` implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by a task handler.
#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Task(#[from] edge_tasks::Error),
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let Error::Task(err) = &self;
    let status = match err {
      e if e.is_not_found() => StatusCode::NOT_FOUND,
      edge_tasks::Error::Core(edge_core::Error::InvalidEvent) => {
        StatusCode::BAD_REQUEST
      }
      _ => {
        tracing::error!(error = %err, "task failed");
        StatusCode::INTERNAL_SERVER_ERROR
      }
    };
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}
