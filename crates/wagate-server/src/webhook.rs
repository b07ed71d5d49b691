//! Provider-facing routes: the subscription handshake and inbound delivery.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/webhook` | `hub.mode`, `hub.verify_token`, `hub.challenge`; 403 on mismatch |
//! | `POST` | `/webhook` | Cloud API envelope; always `200 {"status":"ok"}` |
//!
//! The provider retries anything that is not a 2xx, so inbound delivery is
//! acknowledged even when the body is unusable or dispatch fails.

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use bytes::Bytes;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use wagate_core::{
  dispatch::InboundEvent,
  store::GatewayStore,
  transport::{HandoffNotifier, Messenger},
};

use crate::AppState;

// ─── Envelope ────────────────────────────────────────────────────────────────

/// The subset of the Cloud API notification payload the gateway reads.
#[derive(Debug, Default, Deserialize)]
pub struct Envelope {
  #[serde(default)]
  pub entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
pub struct Entry {
  #[serde(default)]
  pub changes: Vec<Change>,
}

#[derive(Debug, Deserialize)]
pub struct Change {
  #[serde(default)]
  pub value: ChangeValue,
}

/// Messages stay raw until [`Envelope::into_events`] so one malformed message
/// does not take the rest of the batch with it.
#[derive(Debug, Default, Deserialize)]
pub struct ChangeValue {
  pub metadata: Option<Metadata>,
  #[serde(default)]
  pub messages: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct Metadata {
  pub phone_number_id: String,
}

#[derive(Debug, Deserialize)]
pub struct InboundMessage {
  pub from: String,
  #[serde(rename = "type")]
  pub kind: String,
  pub text: Option<TextBody>,
}

#[derive(Debug, Deserialize)]
pub struct TextBody {
  pub body: String,
}

impl Envelope {
  /// Every text message in every change, in payload order. Status updates,
  /// media and other non-text messages are skipped.
  pub fn into_events(self) -> Vec<InboundEvent> {
    let mut events = Vec::new();
    for change in self.entry.into_iter().flat_map(|e| e.changes) {
      let Some(metadata) = change.value.metadata else {
        continue;
      };
      for raw in change.value.messages {
        let message = match InboundMessage::deserialize(raw) {
          Ok(message) => message,
          Err(e) => {
            tracing::warn!(error = %e, "skipping malformed inbound message");
            continue;
          }
        };
        match (message.kind.as_str(), message.text) {
          ("text", Some(text)) => events.push(InboundEvent {
            routing_key: metadata.phone_number_id.clone(),
            sender:      message.from,
            text:        text.body,
          }),
          (kind, _) => {
            tracing::debug!(%kind, from = %message.from, "ignoring non-text message");
          }
        }
      }
    }
    events
  }
}

// ─── Handlers ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
  #[serde(rename = "hub.mode")]
  pub mode:         Option<String>,
  #[serde(rename = "hub.verify_token")]
  pub verify_token: Option<String>,
  #[serde(rename = "hub.challenge")]
  pub challenge:    Option<String>,
}

/// `GET /webhook`: echo the challenge if the token matches.
pub async fn verify<S, M, N>(
  State(state): State<AppState<S, M, N>>,
  Query(params): Query<VerifyParams>,
) -> Response {
  let expected = state.config.verify_token.as_str();
  let token_ok = !expected.is_empty() && params.verify_token.as_deref() == Some(expected);

  match (params.mode.as_deref(), params.challenge) {
    (Some("subscribe"), Some(challenge)) if token_ok => {
      tracing::info!("webhook subscription verified");
      (StatusCode::OK, challenge).into_response()
    }
    _ => {
      tracing::warn!(mode = ?params.mode, "webhook verification rejected");
      (StatusCode::FORBIDDEN, Json(json!({ "error": "verification failed" }))).into_response()
    }
  }
}

/// `POST /webhook`: dispatch every inbound text message.
pub async fn receive<S, M, N>(
  State(state): State<AppState<S, M, N>>,
  body: Bytes,
) -> Json<Value>
where
  S: GatewayStore,
  M: Messenger,
  N: HandoffNotifier,
{
  let envelope: Envelope = match serde_json::from_slice(&body) {
    Ok(envelope) => envelope,
    Err(e) => {
      tracing::warn!(error = %e, "unparseable webhook payload");
      return ack();
    }
  };

  for event in envelope.into_events() {
    if let Err(e) = state.dispatcher.handle_inbound(&event, Utc::now()).await {
      tracing::error!(
        routing_key = %event.routing_key,
        sender = %event.sender,
        error = %e,
        "inbound dispatch failed"
      );
    }
  }
  ack()
}

fn ack() -> Json<Value> { Json(json!({ "status": "ok" })) }

#[cfg(test)]
mod tests {
  use super::*;

  fn parse(v: Value) -> Vec<InboundEvent> {
    serde_json::from_value::<Envelope>(v).unwrap().into_events()
  }

  #[test]
  fn extracts_text_messages_across_entries_and_changes() {
    let events = parse(json!({
      "object": "whatsapp_business_account",
      "entry": [
        { "id": "1", "changes": [
          { "field": "messages", "value": {
            "messaging_product": "whatsapp",
            "metadata": { "display_phone_number": "15550000", "phone_number_id": "pn-1" },
            "contacts": [{ "wa_id": "111" }],
            "messages": [
              { "from": "111", "id": "a", "type": "text", "text": { "body": "hi" } },
              { "from": "111", "id": "b", "type": "image", "image": { "id": "x" } }
            ]
          }},
          { "field": "messages", "value": {
            "metadata": { "phone_number_id": "pn-2" },
            "messages": [
              { "from": "222", "id": "c", "type": "text", "text": { "body": "menu" } }
            ]
          }}
        ]},
        { "id": "2", "changes": [
          { "field": "messages", "value": {
            "metadata": { "phone_number_id": "pn-1" },
            "statuses": [{ "id": "a", "status": "delivered" }]
          }}
        ]}
      ]
    }));

    assert_eq!(events, vec![
      InboundEvent { routing_key: "pn-1".into(), sender: "111".into(), text: "hi".into() },
      InboundEvent { routing_key: "pn-2".into(), sender: "222".into(), text: "menu".into() },
    ]);
  }

  #[test]
  fn change_without_metadata_is_skipped() {
    let events = parse(json!({
      "entry": [{ "changes": [{ "value": {
        "messages": [{ "from": "111", "type": "text", "text": { "body": "hi" } }]
      }}]}]
    }));
    assert!(events.is_empty());
  }

  #[test]
  fn malformed_message_only_drops_itself() {
    let events = parse(json!({
      "entry": [{ "changes": [
        { "value": {
          "metadata": { "phone_number_id": "pn-1" },
          "messages": [
            { "type": "text", "text": { "body": "no sender" } },
            { "from": "111", "text": { "body": "no type" } },
            { "from": "111", "type": "text", "text": {} },
            { "from": "111", "type": "text", "text": { "body": "hi" } }
          ]
        }},
        { "value": {
          "metadata": { "phone_number_id": "pn-2" },
          "messages": [{ "from": "222", "type": "text", "text": { "body": "menu" } }]
        }}
      ]}]
    }));

    assert_eq!(events, vec![
      InboundEvent { routing_key: "pn-1".into(), sender: "111".into(), text: "hi".into() },
      InboundEvent { routing_key: "pn-2".into(), sender: "222".into(), text: "menu".into() },
    ]);
  }

  #[test]
  fn empty_object_yields_nothing() {
    assert!(parse(json!({})).is_empty());
  }
}
