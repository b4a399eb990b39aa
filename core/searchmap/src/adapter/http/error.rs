//! HTTP 層のエラー（ページを出せないときだけ使う。ユースケースの失敗は画面内に表示する）

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::error::Error;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum HttpError {
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HttpError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<tokio::task::JoinError> for HttpError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Internal(format!("worker failed: {}", e))
    }
}

impl From<Error> for HttpError {
    fn from(e: Error) -> Self {
        Self::Internal(e.to_string())
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}
