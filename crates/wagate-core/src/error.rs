//! Error types for `wagate-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("tenant not found: {0}")]
  TenantNotFound(Uuid),

  #[error("tenant {0} has no contacts to broadcast to")]
  NoContacts(Uuid),

  #[error("invalid rule: {0}")]
  InvalidRule(String),

  #[error("invalid business hours: {0}")]
  InvalidHours(String),

  #[error("invalid broadcast: {0}")]
  InvalidBroadcast(String),

  #[error("invalid utc offset: {0} minutes")]
  InvalidOffset(i32),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box a backend error raised by a [`GatewayStore`](crate::store::GatewayStore).
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
