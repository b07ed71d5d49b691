//! Error types for the HTTP surface and the outbound integrations.

use axum::{
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use thiserror::Error;

/// Rejections produced by the server's own middleware.
#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::Unauthorized => {
        let mut res = (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"wagate\""),
        );
        res
      }
    }
  }
}

/// A WhatsApp Cloud API send that did not go through.
#[derive(Debug, Error)]
pub enum SendError {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("provider rejected message ({status}): {body}")]
  Rejected {
    status: reqwest::StatusCode,
    body:   String,
  },
}

/// A handoff e-mail that could not be delivered.
#[derive(Debug, Error)]
pub enum NotifyError {
  #[error("mail transport is not configured")]
  NotConfigured,

  #[error("invalid address: {0}")]
  Address(#[from] lettre::address::AddressError),

  #[error("failed to build email: {0}")]
  Build(#[from] lettre::error::Error),

  #[error("smtp error: {0}")]
  Smtp(#[from] lettre::transport::smtp::Error),

  #[error("mail task failed: {0}")]
  Join(#[from] tokio::task::JoinError),
}
