//! Error type for `wagate-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A column held a value no domain type maps to.
  #[error("corrupt column {column}: {value:?}")]
  Corrupt { column: &'static str, value: String },

  #[error("broadcast not found: {0}")]
  BroadcastNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
