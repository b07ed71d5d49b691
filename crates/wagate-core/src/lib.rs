//! Core types, collaborator traits and decision logic for the wagate
//! WhatsApp gateway.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! inbound [`dispatch::Dispatcher`] and the broadcast [`runner`] talk to the
//! outside world only through [`store::GatewayStore`],
//! [`transport::Messenger`] and [`transport::HandoffNotifier`].

// Native `async fn` in impls of traits that declare `impl Future + Send`.
#![allow(async_fn_in_trait)]

pub mod broadcast;
pub mod contact;
pub mod dispatch;
pub mod error;
pub mod hours;
pub mod message;
pub mod replies;
pub mod rule;
pub mod runner;
pub mod store;
pub mod tenant;
pub mod transport;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
