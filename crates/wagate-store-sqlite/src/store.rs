//! [`SqliteStore`], the SQLite implementation of [`GatewayStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use wagate_core::{
  broadcast::{Broadcast, BroadcastStatus, NewBroadcast},
  contact::{Contact, NewContact},
  hours::BusinessHours,
  message::{Direction, MessageLog, MessageStats, NewMessage},
  rule::{AutoReplyRule, NewRule},
  store::GatewayStore,
  tenant::{NewTenant, Tenant},
};

use crate::{
  Error, Result,
  encode::{
    RawBroadcast, RawContact, RawHours, RawMessage, RawRule, RawTenant, encode_dt,
    encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A gateway store backed by a single SQLite file.
///
/// Cloning is cheap; clones share the same connection thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, used by tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    tracing::debug!("sqlite schema ready");
    Ok(())
  }

  async fn tenant_where(&self, clause: &'static str, key: String) -> Result<Option<Tenant>> {
    let sql = format!("SELECT {} FROM tenants WHERE {clause}", RawTenant::COLUMNS);

    let raw: Option<RawTenant> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![key], RawTenant::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawTenant::into_tenant).transpose()
  }

  async fn broadcasts_where(
    &self,
    clause: &'static str,
    key: String,
  ) -> Result<Vec<Broadcast>> {
    let sql = format!("SELECT {} FROM broadcasts WHERE {clause}", RawBroadcast::COLUMNS);

    let raws: Vec<RawBroadcast> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![key], RawBroadcast::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawBroadcast::into_broadcast).collect()
  }
}

// ─── GatewayStore impl ───────────────────────────────────────────────────────

impl GatewayStore for SqliteStore {
  type Error = Error;

  // ── Tenants ───────────────────────────────────────────────────────────────

  async fn create_tenant(&self, input: NewTenant) -> Result<Option<Tenant>> {
    let tenant = Tenant {
      tenant_id:          Uuid::new_v4(),
      business_name:      input.business_name,
      email:              input.email,
      phone_number_id:    input.phone_number_id,
      whatsapp_number:    input.whatsapp_number,
      access_token:       input.access_token,
      is_active:          true,
      utc_offset_minutes: input.utc_offset_minutes,
      created_at:         Utc::now(),
    };

    let row = tenant.clone();
    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT OR IGNORE INTO tenants (
             tenant_id, business_name, email, phone_number_id, whatsapp_number,
             access_token, is_active, utc_offset_minutes, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            encode_uuid(row.tenant_id),
            row.business_name,
            row.email,
            row.phone_number_id,
            row.whatsapp_number,
            row.access_token,
            row.is_active,
            row.utc_offset_minutes,
            encode_dt(row.created_at),
          ],
        )?)
      })
      .await?;

    Ok((inserted == 1).then_some(tenant))
  }

  async fn get_tenant(&self, tenant_id: Uuid) -> Result<Option<Tenant>> {
    self.tenant_where("tenant_id = ?1", encode_uuid(tenant_id)).await
  }

  async fn list_tenants(&self) -> Result<Vec<Tenant>> {
    let sql = format!("SELECT {} FROM tenants ORDER BY rowid", RawTenant::COLUMNS);

    let raws: Vec<RawTenant> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], RawTenant::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTenant::into_tenant).collect()
  }

  async fn resolve_tenant<'a>(&'a self, routing_key: &'a str) -> Result<Option<Tenant>> {
    self
      .tenant_where("phone_number_id = ?1 AND is_active = 1", routing_key.to_owned())
      .await
  }

  async fn set_tenant_active(&self, tenant_id: Uuid, active: bool) -> Result<Option<Tenant>> {
    let id_str = encode_uuid(tenant_id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE tenants SET is_active = ?2 WHERE tenant_id = ?1",
          rusqlite::params![id_str, active],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.get_tenant(tenant_id).await
  }

  // ── Contacts ──────────────────────────────────────────────────────────────

  async fn add_contact(&self, input: NewContact) -> Result<Option<Contact>> {
    let contact = Contact {
      contact_id:   Uuid::new_v4(),
      tenant_id:    input.tenant_id,
      name:         input.name,
      phone_number: input.phone_number,
      created_at:   Utc::now(),
    };

    let row = contact.clone();
    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT OR IGNORE INTO contacts (contact_id, tenant_id, name, phone_number, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            encode_uuid(row.contact_id),
            encode_uuid(row.tenant_id),
            row.name,
            row.phone_number,
            encode_dt(row.created_at),
          ],
        )?)
      })
      .await?;

    Ok((inserted == 1).then_some(contact))
  }

  async fn find_contact<'a>(
    &'a self,
    tenant_id: Uuid,
    phone_number: &'a str,
  ) -> Result<Option<Contact>> {
    let sql = format!(
      "SELECT {} FROM contacts WHERE tenant_id = ?1 AND phone_number = ?2",
      RawContact::COLUMNS
    );
    let id_str = encode_uuid(tenant_id);
    let phone = phone_number.to_owned();

    let raw: Option<RawContact> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str, phone], RawContact::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawContact::into_contact).transpose()
  }

  async fn count_contacts(&self, tenant_id: Uuid) -> Result<u64> {
    let id_str = encode_uuid(tenant_id);

    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM contacts WHERE tenant_id = ?1",
          rusqlite::params![id_str],
          |r| r.get(0),
        )?)
      })
      .await?;

    Ok(n as u64)
  }

  async fn list_contacts(&self, tenant_id: Uuid) -> Result<Vec<Contact>> {
    let sql = format!(
      "SELECT {} FROM contacts WHERE tenant_id = ?1 ORDER BY rowid",
      RawContact::COLUMNS
    );
    let id_str = encode_uuid(tenant_id);

    let raws: Vec<RawContact> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawContact::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawContact::into_contact).collect()
  }

  async fn delete_contact(&self, tenant_id: Uuid, contact_id: Uuid) -> Result<bool> {
    let tenant_str = encode_uuid(tenant_id);
    let contact_str = encode_uuid(contact_id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM contacts WHERE tenant_id = ?1 AND contact_id = ?2",
          rusqlite::params![tenant_str, contact_str],
        )?)
      })
      .await?;

    Ok(deleted > 0)
  }

  // ── Rules ─────────────────────────────────────────────────────────────────

  async fn add_rule(&self, input: NewRule) -> Result<AutoReplyRule> {
    let rule = AutoReplyRule {
      rule_id:         Uuid::new_v4(),
      tenant_id:       input.tenant_id,
      trigger_keyword: input.trigger_keyword,
      response_text:   input.response_text,
      is_active:       true,
      created_at:      Utc::now(),
    };

    let row = rule.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO auto_reply_rules (
             rule_id, tenant_id, trigger_keyword, response_text, is_active, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            encode_uuid(row.rule_id),
            encode_uuid(row.tenant_id),
            row.trigger_keyword,
            row.response_text,
            row.is_active,
            encode_dt(row.created_at),
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(rule)
  }

  async fn list_rules(&self, tenant_id: Uuid, active_only: bool) -> Result<Vec<AutoReplyRule>> {
    // `?2 = 0` disables the activity filter.
    let sql = format!(
      "SELECT {} FROM auto_reply_rules
       WHERE tenant_id = ?1 AND (?2 = 0 OR is_active = 1)
       ORDER BY rowid",
      RawRule::COLUMNS
    );
    let id_str = encode_uuid(tenant_id);

    let raws: Vec<RawRule> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![id_str, active_only], RawRule::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRule::into_rule).collect()
  }

  async fn toggle_rule(&self, tenant_id: Uuid, rule_id: Uuid) -> Result<Option<AutoReplyRule>> {
    let sql = format!(
      "UPDATE auto_reply_rules SET is_active = NOT is_active
       WHERE tenant_id = ?1 AND rule_id = ?2
       RETURNING {}",
      RawRule::COLUMNS
    );
    let tenant_str = encode_uuid(tenant_id);
    let rule_str = encode_uuid(rule_id);

    let raw: Option<RawRule> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![tenant_str, rule_str], RawRule::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRule::into_rule).transpose()
  }

  async fn delete_rule(&self, tenant_id: Uuid, rule_id: Uuid) -> Result<bool> {
    let tenant_str = encode_uuid(tenant_id);
    let rule_str = encode_uuid(rule_id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM auto_reply_rules WHERE tenant_id = ?1 AND rule_id = ?2",
          rusqlite::params![tenant_str, rule_str],
        )?)
      })
      .await?;

    Ok(deleted > 0)
  }

  // ── Business hours ────────────────────────────────────────────────────────

  async fn put_business_hours(&self, hours: BusinessHours) -> Result<BusinessHours> {
    let row = hours.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO business_hours (tenant_id, day_of_week, open_time, close_time, is_open)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (tenant_id, day_of_week) DO UPDATE SET
             open_time  = excluded.open_time,
             close_time = excluded.close_time,
             is_open    = excluded.is_open",
          rusqlite::params![
            encode_uuid(row.tenant_id),
            row.day_of_week,
            row.open_time,
            row.close_time,
            row.is_open,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(hours)
  }

  async fn business_hours_for(
    &self,
    tenant_id: Uuid,
    day_of_week: u8,
  ) -> Result<Option<BusinessHours>> {
    let sql = format!(
      "SELECT {} FROM business_hours WHERE tenant_id = ?1 AND day_of_week = ?2",
      RawHours::COLUMNS
    );
    let id_str = encode_uuid(tenant_id);

    let raw: Option<RawHours> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str, day_of_week], RawHours::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawHours::into_hours).transpose()
  }

  async fn list_business_hours(&self, tenant_id: Uuid) -> Result<Vec<BusinessHours>> {
    let sql = format!(
      "SELECT {} FROM business_hours WHERE tenant_id = ?1 ORDER BY day_of_week",
      RawHours::COLUMNS
    );
    let id_str = encode_uuid(tenant_id);

    let raws: Vec<RawHours> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawHours::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawHours::into_hours).collect()
  }

  async fn delete_business_hours(&self, tenant_id: Uuid, day_of_week: u8) -> Result<bool> {
    let id_str = encode_uuid(tenant_id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM business_hours WHERE tenant_id = ?1 AND day_of_week = ?2",
          rusqlite::params![id_str, day_of_week],
        )?)
      })
      .await?;

    Ok(deleted > 0)
  }

  // ── Message log ───────────────────────────────────────────────────────────

  async fn append_message(&self, input: NewMessage) -> Result<MessageLog> {
    let message = MessageLog {
      message_id:    Uuid::new_v4(),
      tenant_id:     input.tenant_id,
      sender_number: input.sender_number,
      message_text:  input.message_text,
      direction:     input.direction,
      timestamp:     Utc::now(),
    };

    let row = message.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO message_logs (
             message_id, tenant_id, sender_number, message_text, direction, timestamp
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            encode_uuid(row.message_id),
            encode_uuid(row.tenant_id),
            row.sender_number,
            row.message_text,
            row.direction.to_string(),
            encode_dt(row.timestamp),
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(message)
  }

  async fn has_inbound_from<'a>(&'a self, tenant_id: Uuid, sender: &'a str) -> Result<bool> {
    let id_str = encode_uuid(tenant_id);
    let sender = sender.to_owned();
    let inbound = Direction::Inbound.to_string();

    let seen = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT EXISTS (
             SELECT 1 FROM message_logs
             WHERE tenant_id = ?1 AND sender_number = ?2 AND direction = ?3
           )",
          rusqlite::params![id_str, sender, inbound],
          |r| r.get(0),
        )?)
      })
      .await?;

    Ok(seen)
  }

  async fn recent_messages(&self, tenant_id: Uuid, limit: usize) -> Result<Vec<MessageLog>> {
    let sql = format!(
      "SELECT {} FROM message_logs WHERE tenant_id = ?1 ORDER BY rowid DESC LIMIT ?2",
      RawMessage::COLUMNS
    );
    let id_str = encode_uuid(tenant_id);
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawMessage> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![id_str, limit], RawMessage::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMessage::into_message).collect()
  }

  async fn message_stats(&self, tenant_id: Uuid) -> Result<MessageStats> {
    let id_str = encode_uuid(tenant_id);
    let inbound = Direction::Inbound.to_string();
    let outbound = Direction::Outbound.to_string();

    let (total, inbound, outbound): (i64, i64, i64) = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*),
                  COALESCE(SUM(direction = ?2), 0),
                  COALESCE(SUM(direction = ?3), 0)
           FROM message_logs WHERE tenant_id = ?1",
          rusqlite::params![id_str, inbound, outbound],
          |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )?)
      })
      .await?;

    Ok(MessageStats {
      total:    total as u64,
      inbound:  inbound as u64,
      outbound: outbound as u64,
    })
  }

  // ── Broadcasts ────────────────────────────────────────────────────────────

  async fn create_broadcast(&self, input: NewBroadcast) -> Result<Broadcast> {
    let now = Utc::now();
    let broadcast = Broadcast {
      broadcast_id:  Uuid::new_v4(),
      tenant_id:     input.tenant_id,
      title:         input.title,
      template_name: input.template_name,
      status:        BroadcastStatus::Pending,
      total:         0,
      sent:          0,
      failed:        0,
      created_at:    now,
      updated_at:    now,
    };

    let row = broadcast.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO broadcasts (
             broadcast_id, tenant_id, title, template_name, status,
             total, sent, failed, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, 0, 0, 0, ?6, ?6)",
          rusqlite::params![
            encode_uuid(row.broadcast_id),
            encode_uuid(row.tenant_id),
            row.title,
            row.template_name,
            row.status.to_string(),
            encode_dt(row.created_at),
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(broadcast)
  }

  async fn get_broadcast(&self, broadcast_id: Uuid) -> Result<Option<Broadcast>> {
    let mut found = self
      .broadcasts_where("broadcast_id = ?1", encode_uuid(broadcast_id))
      .await?;
    Ok(found.pop())
  }

  async fn list_broadcasts(&self, tenant_id: Uuid) -> Result<Vec<Broadcast>> {
    self
      .broadcasts_where("tenant_id = ?1 ORDER BY rowid DESC", encode_uuid(tenant_id))
      .await
  }

  async fn update_broadcast(
    &self,
    mut broadcast: Broadcast,
    at: DateTime<Utc>,
  ) -> Result<Broadcast> {
    broadcast.updated_at = at;

    let id_str = encode_uuid(broadcast.broadcast_id);
    let status = broadcast.status.to_string();
    let counters = [broadcast.total, broadcast.sent, broadcast.failed]
      .map(|n| i64::try_from(n).unwrap_or(i64::MAX));
    let at_str = encode_dt(at);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE broadcasts
           SET status = ?2, total = ?3, sent = ?4, failed = ?5, updated_at = ?6
           WHERE broadcast_id = ?1",
          rusqlite::params![id_str, status, counters[0], counters[1], counters[2], at_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::BroadcastNotFound(broadcast.broadcast_id));
    }
    Ok(broadcast)
  }

  async fn list_broadcasts_by_status(&self, status: BroadcastStatus) -> Result<Vec<Broadcast>> {
    self
      .broadcasts_where("status = ?1 ORDER BY rowid", status.to_string())
      .await
  }
}
