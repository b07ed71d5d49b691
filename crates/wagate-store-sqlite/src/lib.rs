//! SQLite backend for the wagate gateway store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. Calls are serialized on that
//! thread, so concurrent webhook handlers and broadcast jobs can share one
//! cloned [`SqliteStore`].

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
