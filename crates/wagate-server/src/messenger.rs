//! [`CloudApiMessenger`], the WhatsApp Cloud API implementation of
//! [`Messenger`].
//!
//! Every send is one `POST {base}/{phone_number_id}/messages` authorised with
//! the tenant's bearer token. Anything other than a 2xx is a failure; the body
//! is kept for the log.

use std::time::Duration;

use serde_json::{Value, json};
use wagate_core::{tenant::Credential, transport::Messenger};

use crate::error::SendError;

#[derive(Clone)]
pub struct CloudApiMessenger {
  client:            reqwest::Client,
  base_url:          String,
  template_language: String,
}

impl CloudApiMessenger {
  pub fn new(
    base_url: &str,
    template_language: &str,
    timeout: Duration,
  ) -> Result<Self, SendError> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self {
      client,
      base_url: base_url.trim_end_matches('/').to_owned(),
      template_language: template_language.to_owned(),
    })
  }

  fn endpoint(&self, credential: &Credential) -> String {
    format!("{}/{}/messages", self.base_url, credential.phone_number_id)
  }

  async fn post(&self, credential: &Credential, payload: Value) -> Result<(), SendError> {
    let resp = self
      .client
      .post(self.endpoint(credential))
      .bearer_auth(&credential.access_token)
      .json(&payload)
      .send()
      .await?;

    let status = resp.status();
    if status.is_success() {
      return Ok(());
    }
    let body = resp.text().await.unwrap_or_default();
    Err(SendError::Rejected { status, body })
  }
}

pub fn text_payload(recipient: &str, body: &str) -> Value {
  json!({
    "messaging_product": "whatsapp",
    "to":                recipient,
    "type":              "text",
    "text":              { "body": body },
  })
}

pub fn template_payload(recipient: &str, template: &str, language: &str) -> Value {
  json!({
    "messaging_product": "whatsapp",
    "to":                recipient,
    "type":              "template",
    "template": {
      "name":     template,
      "language": { "code": language },
    },
  })
}

impl Messenger for CloudApiMessenger {
  type Error = SendError;

  async fn send_text<'a>(
    &'a self,
    credential: &'a Credential,
    recipient: &'a str,
    body: &'a str,
  ) -> Result<(), SendError> {
    self.post(credential, text_payload(recipient, body)).await
  }

  async fn send_template<'a>(
    &'a self,
    credential: &'a Credential,
    recipient: &'a str,
    template: &'a str,
  ) -> Result<(), SendError> {
    self
      .post(credential, template_payload(recipient, template, &self.template_language))
      .await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn text_payload_shape() {
    let p = text_payload("15550001", "hello");
    assert_eq!(p["messaging_product"], "whatsapp");
    assert_eq!(p["type"], "text");
    assert_eq!(p["to"], "15550001");
    assert_eq!(p["text"]["body"], "hello");
  }

  #[test]
  fn template_payload_carries_language() {
    let p = template_payload("15550001", "spring_sale", "en_US");
    assert_eq!(p["type"], "template");
    assert_eq!(p["template"]["name"], "spring_sale");
    assert_eq!(p["template"]["language"]["code"], "en_US");
  }

  #[test]
  fn endpoint_strips_trailing_slash() {
    let m = CloudApiMessenger::new(
      "https://graph.facebook.com/v19.0/",
      "en_US",
      Duration::from_secs(5),
    )
    .unwrap();
    let cred = Credential { phone_number_id: "123".into(), access_token: "t".into() };
    assert_eq!(m.endpoint(&cred), "https://graph.facebook.com/v19.0/123/messages");
  }
}
