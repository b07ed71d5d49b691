//! Message log: the append-only audit trail of everything sent and received.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
  Inbound,
  Outbound,
}

/// One logged message. Never updated or deleted once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageLog {
  pub message_id:    Uuid,
  pub tenant_id:     Uuid,
  /// The customer's number, for both directions.
  pub sender_number: String,
  pub message_text:  String,
  pub direction:     Direction,
  /// Server-assigned.
  pub timestamp:     DateTime<Utc>,
}

/// Input to [`crate::store::GatewayStore::append_message`].
#[derive(Debug, Clone)]
pub struct NewMessage {
  pub tenant_id:     Uuid,
  pub sender_number: String,
  pub message_text:  String,
  pub direction:     Direction,
}

impl NewMessage {
  pub fn inbound(tenant_id: Uuid, sender: &str, text: &str) -> Self {
    Self {
      tenant_id,
      sender_number: sender.to_owned(),
      message_text: text.to_owned(),
      direction: Direction::Inbound,
    }
  }

  pub fn outbound(tenant_id: Uuid, recipient: &str, text: &str) -> Self {
    Self {
      tenant_id,
      sender_number: recipient.to_owned(),
      message_text: text.to_owned(),
      direction: Direction::Outbound,
    }
  }
}

/// Per-tenant message counters for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageStats {
  pub total:    u64,
  pub inbound:  u64,
  pub outbound: u64,
}
