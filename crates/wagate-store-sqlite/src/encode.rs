//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, UUIDs hyphenated lowercase strings and
//! enums their lowercase names. Counters are stored as `INTEGER` and read
//! back through `i64`.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::Row;
use uuid::Uuid;
use wagate_core::{
  broadcast::{Broadcast, BroadcastStatus},
  contact::Contact,
  hours::BusinessHours,
  message::{Direction, MessageLog},
  rule::AutoReplyRule,
  tenant::Tenant,
};

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_enum<T: FromStr>(column: &'static str, s: String) -> Result<T> {
  s.parse().map_err(|_| Error::Corrupt { column, value: s })
}

fn decode_count(column: &'static str, n: i64) -> Result<u64> {
  u64::try_from(n).map_err(|_| Error::Corrupt { column, value: n.to_string() })
}

// ─── Row types ───────────────────────────────────────────────────────────────
//
// Each `COLUMNS` constant lists the select order `from_row` expects.

/// Raw values read directly from a `tenants` row.
pub struct RawTenant {
  pub tenant_id:          String,
  pub business_name:      String,
  pub email:              String,
  pub phone_number_id:    String,
  pub whatsapp_number:    String,
  pub access_token:       String,
  pub is_active:          bool,
  pub utc_offset_minutes: i32,
  pub created_at:         String,
}

impl RawTenant {
  pub const COLUMNS: &'static str = "tenant_id, business_name, email, phone_number_id, \
    whatsapp_number, access_token, is_active, utc_offset_minutes, created_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      tenant_id:          row.get(0)?,
      business_name:      row.get(1)?,
      email:              row.get(2)?,
      phone_number_id:    row.get(3)?,
      whatsapp_number:    row.get(4)?,
      access_token:       row.get(5)?,
      is_active:          row.get(6)?,
      utc_offset_minutes: row.get(7)?,
      created_at:         row.get(8)?,
    })
  }

  pub fn into_tenant(self) -> Result<Tenant> {
    Ok(Tenant {
      tenant_id:          decode_uuid(&self.tenant_id)?,
      business_name:      self.business_name,
      email:              self.email,
      phone_number_id:    self.phone_number_id,
      whatsapp_number:    self.whatsapp_number,
      access_token:       self.access_token,
      is_active:          self.is_active,
      utc_offset_minutes: self.utc_offset_minutes,
      created_at:         decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `contacts` row.
pub struct RawContact {
  pub contact_id:   String,
  pub tenant_id:    String,
  pub name:         String,
  pub phone_number: String,
  pub created_at:   String,
}

impl RawContact {
  pub const COLUMNS: &'static str = "contact_id, tenant_id, name, phone_number, created_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      contact_id:   row.get(0)?,
      tenant_id:    row.get(1)?,
      name:         row.get(2)?,
      phone_number: row.get(3)?,
      created_at:   row.get(4)?,
    })
  }

  pub fn into_contact(self) -> Result<Contact> {
    Ok(Contact {
      contact_id:   decode_uuid(&self.contact_id)?,
      tenant_id:    decode_uuid(&self.tenant_id)?,
      name:         self.name,
      phone_number: self.phone_number,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from an `auto_reply_rules` row.
pub struct RawRule {
  pub rule_id:         String,
  pub tenant_id:       String,
  pub trigger_keyword: String,
  pub response_text:   String,
  pub is_active:       bool,
  pub created_at:      String,
}

impl RawRule {
  pub const COLUMNS: &'static str =
    "rule_id, tenant_id, trigger_keyword, response_text, is_active, created_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      rule_id:         row.get(0)?,
      tenant_id:       row.get(1)?,
      trigger_keyword: row.get(2)?,
      response_text:   row.get(3)?,
      is_active:       row.get(4)?,
      created_at:      row.get(5)?,
    })
  }

  pub fn into_rule(self) -> Result<AutoReplyRule> {
    Ok(AutoReplyRule {
      rule_id:         decode_uuid(&self.rule_id)?,
      tenant_id:       decode_uuid(&self.tenant_id)?,
      trigger_keyword: self.trigger_keyword,
      response_text:   self.response_text,
      is_active:       self.is_active,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `business_hours` row.
pub struct RawHours {
  pub tenant_id:   String,
  pub day_of_week: u8,
  pub open_time:   String,
  pub close_time:  String,
  pub is_open:     bool,
}

impl RawHours {
  pub const COLUMNS: &'static str = "tenant_id, day_of_week, open_time, close_time, is_open";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      tenant_id:   row.get(0)?,
      day_of_week: row.get(1)?,
      open_time:   row.get(2)?,
      close_time:  row.get(3)?,
      is_open:     row.get(4)?,
    })
  }

  pub fn into_hours(self) -> Result<BusinessHours> {
    Ok(BusinessHours {
      tenant_id:   decode_uuid(&self.tenant_id)?,
      day_of_week: self.day_of_week,
      open_time:   self.open_time,
      close_time:  self.close_time,
      is_open:     self.is_open,
    })
  }
}

/// Raw values read directly from a `message_logs` row.
pub struct RawMessage {
  pub message_id:    String,
  pub tenant_id:     String,
  pub sender_number: String,
  pub message_text:  String,
  pub direction:     String,
  pub timestamp:     String,
}

impl RawMessage {
  pub const COLUMNS: &'static str =
    "message_id, tenant_id, sender_number, message_text, direction, timestamp";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      message_id:    row.get(0)?,
      tenant_id:     row.get(1)?,
      sender_number: row.get(2)?,
      message_text:  row.get(3)?,
      direction:     row.get(4)?,
      timestamp:     row.get(5)?,
    })
  }

  pub fn into_message(self) -> Result<MessageLog> {
    Ok(MessageLog {
      message_id:    decode_uuid(&self.message_id)?,
      tenant_id:     decode_uuid(&self.tenant_id)?,
      sender_number: self.sender_number,
      message_text:  self.message_text,
      direction:     decode_enum::<Direction>("direction", self.direction)?,
      timestamp:     decode_dt(&self.timestamp)?,
    })
  }
}

/// Raw values read directly from a `broadcasts` row.
pub struct RawBroadcast {
  pub broadcast_id:  String,
  pub tenant_id:     String,
  pub title:         String,
  pub template_name: String,
  pub status:        String,
  pub total:         i64,
  pub sent:          i64,
  pub failed:        i64,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawBroadcast {
  pub const COLUMNS: &'static str = "broadcast_id, tenant_id, title, template_name, \
    status, total, sent, failed, created_at, updated_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      broadcast_id:  row.get(0)?,
      tenant_id:     row.get(1)?,
      title:         row.get(2)?,
      template_name: row.get(3)?,
      status:        row.get(4)?,
      total:         row.get(5)?,
      sent:          row.get(6)?,
      failed:        row.get(7)?,
      created_at:    row.get(8)?,
      updated_at:    row.get(9)?,
    })
  }

  pub fn into_broadcast(self) -> Result<Broadcast> {
    Ok(Broadcast {
      broadcast_id:  decode_uuid(&self.broadcast_id)?,
      tenant_id:     decode_uuid(&self.tenant_id)?,
      title:         self.title,
      template_name: self.template_name,
      status:        decode_enum::<BroadcastStatus>("status", self.status)?,
      total:         decode_count("total", self.total)?,
      sent:          decode_count("sent", self.sent)?,
      failed:        decode_count("failed", self.failed)?,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unknown_direction_is_reported_as_corrupt() {
    let err = decode_enum::<Direction>("direction", "sideways".into()).unwrap_err();
    assert!(matches!(err, Error::Corrupt { column: "direction", .. }));
  }

  #[test]
  fn negative_counter_is_rejected() {
    assert!(decode_count("sent", -1).is_err());
    assert_eq!(decode_count("sent", 7).unwrap(), 7);
  }
}
