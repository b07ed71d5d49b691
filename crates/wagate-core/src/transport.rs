//! Outbound capabilities: provider delivery and handoff notification.
//!
//! Both are best-effort. Callers log an `Err` and carry on; nothing here is
//! retried.

use std::future::Future;

use crate::tenant::Credential;

/// Delivers messages through the WhatsApp provider.
pub trait Messenger: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Send a free-form text reply.
  fn send_text<'a>(
    &'a self,
    credential: &'a Credential,
    recipient: &'a str,
    body: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Send a pre-approved template by name.
  fn send_template<'a>(
    &'a self,
    credential: &'a Credential,
    recipient: &'a str,
    template: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

/// Everything a human agent needs to pick up a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handoff {
  pub to_email:     String,
  pub tenant_name:  String,
  pub sender:       String,
  pub last_message: String,
}

/// Tells a tenant's staff that a customer asked for a human.
pub trait HandoffNotifier: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn notify_handoff<'a>(
    &'a self,
    handoff: &'a Handoff,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
