//! [`SmtpNotifier`], the e-mail implementation of [`HandoffNotifier`].
//!
//! lettre's SMTP transport is blocking, so each send runs on the blocking
//! pool.

use lettre::{
  Message, SmtpTransport, Transport,
  message::header::ContentType,
  transport::smtp::authentication::Credentials,
};
use serde::Deserialize;
use wagate_core::transport::{Handoff, HandoffNotifier};

use crate::error::NotifyError;

/// SMTP relay settings, the `[mail]` table of the config file.
#[derive(Deserialize, Clone)]
pub struct MailConfig {
  pub server:   String,
  #[serde(default = "default_port")]
  pub port:     u16,
  pub username: String,
  pub password: String,
  /// Sender address; defaults to `username`.
  pub from:     Option<String>,
}

fn default_port() -> u16 { 587 }

/// Without a [`MailConfig`] every notification fails with
/// [`NotifyError::NotConfigured`].
#[derive(Clone, Default)]
pub struct SmtpNotifier {
  mail: Option<MailConfig>,
}

impl SmtpNotifier {
  pub fn new(mail: Option<MailConfig>) -> Self { Self { mail } }
}

pub fn subject(handoff: &Handoff) -> String {
  format!("New Human Handoff Request - {}", handoff.tenant_name)
}

pub fn html_body(handoff: &Handoff) -> String {
  format!(
    "<h2>Human Handoff Request</h2>\
     <p>A customer has requested to speak with a human agent.</p>\
     <p><strong>Business:</strong> {}</p>\
     <p><strong>Customer Number:</strong> {}</p>\
     <p><strong>Last Message:</strong> {}</p>\
     <p>Please respond to them on WhatsApp as soon as possible.</p>",
    escape_html(&handoff.tenant_name),
    escape_html(&handoff.sender),
    escape_html(&handoff.last_message),
  )
}

fn escape_html(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for c in s.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      other => out.push(other),
    }
  }
  out
}

fn build_message(mail: &MailConfig, handoff: &Handoff) -> Result<Message, NotifyError> {
  let from = mail.from.as_deref().unwrap_or(&mail.username);
  Ok(
    Message::builder()
      .from(from.parse()?)
      .to(handoff.to_email.parse()?)
      .subject(subject(handoff))
      .header(ContentType::TEXT_HTML)
      .body(html_body(handoff))?,
  )
}

fn deliver(mail: &MailConfig, message: &Message) -> Result<(), NotifyError> {
  let transport = SmtpTransport::starttls_relay(&mail.server)?
    .port(mail.port)
    .credentials(Credentials::new(mail.username.clone(), mail.password.clone()))
    .build();
  transport.send(message)?;
  Ok(())
}

impl HandoffNotifier for SmtpNotifier {
  type Error = NotifyError;

  async fn notify_handoff<'a>(&'a self, handoff: &'a Handoff) -> Result<(), NotifyError> {
    let mail = self.mail.clone().ok_or(NotifyError::NotConfigured)?;
    let message = build_message(&mail, handoff)?;

    tokio::task::spawn_blocking(move || deliver(&mail, &message)).await??;
    tracing::info!(to = %handoff.to_email, sender = %handoff.sender, "handoff email sent");
    Ok(())
  }
}
