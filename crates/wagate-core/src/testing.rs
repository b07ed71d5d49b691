//! In-memory fakes for the core's collaborators.

use std::{collections::HashSet, sync::Mutex};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  broadcast::{Broadcast, BroadcastStatus, NewBroadcast},
  contact::{Contact, NewContact},
  hours::BusinessHours,
  message::{Direction, MessageLog, MessageStats, NewMessage},
  rule::{AutoReplyRule, NewRule},
  store::GatewayStore,
  tenant::{Credential, NewTenant, Tenant},
  transport::{Handoff, HandoffNotifier, Messenger},
};

// ─── Store ───────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
  #[error("injected failure")]
  Injected,
}

#[derive(Default)]
struct Tables {
  tenants:    Vec<Tenant>,
  contacts:   Vec<Contact>,
  rules:      Vec<AutoReplyRule>,
  hours:      Vec<BusinessHours>,
  messages:   Vec<MessageLog>,
  broadcasts: Vec<Broadcast>,
  /// Every persisted broadcast update, in order.
  history:    Vec<Broadcast>,
}

/// Vec-backed store; insertion order is the natural enumeration order.
#[derive(Default)]
pub struct MemoryStore {
  tables:        Mutex<Tables>,
  /// Remaining broadcast updates allowed before injected failures start.
  update_budget: Mutex<Option<usize>>,
}

impl MemoryStore {
  /// Let `n` more broadcast updates succeed, then fail every one after.
  pub fn fail_broadcast_updates_after(&self, n: usize) {
    *self.update_budget.lock().unwrap() = Some(n);
  }

  pub fn messages(&self) -> Vec<MessageLog> {
    self.tables.lock().unwrap().messages.clone()
  }

  pub fn broadcast_history(&self, broadcast_id: Uuid) -> Vec<Broadcast> {
    let t = self.tables.lock().unwrap();
    t.history
      .iter()
      .filter(|b| b.broadcast_id == broadcast_id)
      .cloned()
      .collect()
  }

  pub fn replace_tenant(&self, tenant: Tenant) {
    let mut t = self.tables.lock().unwrap();
    if let Some(slot) = t.tenants.iter_mut().find(|x| x.tenant_id == tenant.tenant_id) {
      *slot = tenant;
    }
  }
}

impl GatewayStore for MemoryStore {
  type Error = MemoryError;

  async fn create_tenant(&self, input: NewTenant) -> Result<Option<Tenant>, MemoryError> {
    let mut t = self.tables.lock().unwrap();
    if t
      .tenants
      .iter()
      .any(|x| x.email == input.email || x.phone_number_id == input.phone_number_id)
    {
      return Ok(None);
    }
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
    t.tenants.push(tenant.clone());
    Ok(Some(tenant))
  }

  async fn get_tenant(&self, tenant_id: Uuid) -> Result<Option<Tenant>, MemoryError> {
    let t = self.tables.lock().unwrap();
    Ok(t.tenants.iter().find(|x| x.tenant_id == tenant_id).cloned())
  }

  async fn list_tenants(&self) -> Result<Vec<Tenant>, MemoryError> {
    Ok(self.tables.lock().unwrap().tenants.clone())
  }

  async fn resolve_tenant(&self, routing_key: &str) -> Result<Option<Tenant>, MemoryError> {
    let t = self.tables.lock().unwrap();
    Ok(
      t.tenants
        .iter()
        .find(|x| x.is_active && x.phone_number_id == routing_key)
        .cloned(),
    )
  }

  async fn set_tenant_active(
    &self,
    tenant_id: Uuid,
    active: bool,
  ) -> Result<Option<Tenant>, MemoryError> {
    let mut t = self.tables.lock().unwrap();
    Ok(t.tenants.iter_mut().find(|x| x.tenant_id == tenant_id).map(|x| {
      x.is_active = active;
      x.clone()
    }))
  }

  async fn add_contact(&self, input: NewContact) -> Result<Option<Contact>, MemoryError> {
    let mut t = self.tables.lock().unwrap();
    if t
      .contacts
      .iter()
      .any(|c| c.tenant_id == input.tenant_id && c.phone_number == input.phone_number)
    {
      return Ok(None);
    }
    let contact = Contact {
      contact_id:   Uuid::new_v4(),
      tenant_id:    input.tenant_id,
      name:         input.name,
      phone_number: input.phone_number,
      created_at:   Utc::now(),
    };
    t.contacts.push(contact.clone());
    Ok(Some(contact))
  }

  async fn find_contact(
    &self,
    tenant_id: Uuid,
    phone_number: &str,
  ) -> Result<Option<Contact>, MemoryError> {
    let t = self.tables.lock().unwrap();
    Ok(
      t.contacts
        .iter()
        .find(|c| c.tenant_id == tenant_id && c.phone_number == phone_number)
        .cloned(),
    )
  }

  async fn count_contacts(&self, tenant_id: Uuid) -> Result<u64, MemoryError> {
    let t = self.tables.lock().unwrap();
    Ok(t.contacts.iter().filter(|c| c.tenant_id == tenant_id).count() as u64)
  }

  async fn list_contacts(&self, tenant_id: Uuid) -> Result<Vec<Contact>, MemoryError> {
    let t = self.tables.lock().unwrap();
    Ok(t.contacts.iter().filter(|c| c.tenant_id == tenant_id).cloned().collect())
  }

  async fn delete_contact(&self, tenant_id: Uuid, contact_id: Uuid) -> Result<bool, MemoryError> {
    let mut t = self.tables.lock().unwrap();
    let before = t.contacts.len();
    t.contacts
      .retain(|c| !(c.tenant_id == tenant_id && c.contact_id == contact_id));
    Ok(t.contacts.len() != before)
  }

  async fn add_rule(&self, input: NewRule) -> Result<AutoReplyRule, MemoryError> {
    let rule = AutoReplyRule {
      rule_id:         Uuid::new_v4(),
      tenant_id:       input.tenant_id,
      trigger_keyword: input.trigger_keyword,
      response_text:   input.response_text,
      is_active:       true,
      created_at:      Utc::now(),
    };
    self.tables.lock().unwrap().rules.push(rule.clone());
    Ok(rule)
  }

  async fn list_rules(
    &self,
    tenant_id: Uuid,
    active_only: bool,
  ) -> Result<Vec<AutoReplyRule>, MemoryError> {
    let t = self.tables.lock().unwrap();
    Ok(
      t.rules
        .iter()
        .filter(|r| r.tenant_id == tenant_id && (!active_only || r.is_active))
        .cloned()
        .collect(),
    )
  }

  async fn toggle_rule(
    &self,
    tenant_id: Uuid,
    rule_id: Uuid,
  ) -> Result<Option<AutoReplyRule>, MemoryError> {
    let mut t = self.tables.lock().unwrap();
    Ok(
      t.rules
        .iter_mut()
        .find(|r| r.tenant_id == tenant_id && r.rule_id == rule_id)
        .map(|r| {
          r.is_active = !r.is_active;
          r.clone()
        }),
    )
  }

  async fn delete_rule(&self, tenant_id: Uuid, rule_id: Uuid) -> Result<bool, MemoryError> {
    let mut t = self.tables.lock().unwrap();
    let before = t.rules.len();
    t.rules.retain(|r| !(r.tenant_id == tenant_id && r.rule_id == rule_id));
    Ok(t.rules.len() != before)
  }

  async fn put_business_hours(&self, hours: BusinessHours) -> Result<BusinessHours, MemoryError> {
    let mut t = self.tables.lock().unwrap();
    t.hours
      .retain(|h| !(h.tenant_id == hours.tenant_id && h.day_of_week == hours.day_of_week));
    t.hours.push(hours.clone());
    Ok(hours)
  }

  async fn business_hours_for(
    &self,
    tenant_id: Uuid,
    day_of_week: u8,
  ) -> Result<Option<BusinessHours>, MemoryError> {
    let t = self.tables.lock().unwrap();
    Ok(
      t.hours
        .iter()
        .find(|h| h.tenant_id == tenant_id && h.day_of_week == day_of_week)
        .cloned(),
    )
  }

  async fn list_business_hours(&self, tenant_id: Uuid) -> Result<Vec<BusinessHours>, MemoryError> {
    let t = self.tables.lock().unwrap();
    let mut hours: Vec<_> = t.hours.iter().filter(|h| h.tenant_id == tenant_id).cloned().collect();
    hours.sort_by_key(|h| h.day_of_week);
    Ok(hours)
  }

  async fn delete_business_hours(
    &self,
    tenant_id: Uuid,
    day_of_week: u8,
  ) -> Result<bool, MemoryError> {
    let mut t = self.tables.lock().unwrap();
    let before = t.hours.len();
    t.hours
      .retain(|h| !(h.tenant_id == tenant_id && h.day_of_week == day_of_week));
    Ok(t.hours.len() != before)
  }

  async fn append_message(&self, input: NewMessage) -> Result<MessageLog, MemoryError> {
    let message = MessageLog {
      message_id:    Uuid::new_v4(),
      tenant_id:     input.tenant_id,
      sender_number: input.sender_number,
      message_text:  input.message_text,
      direction:     input.direction,
      timestamp:     Utc::now(),
    };
    self.tables.lock().unwrap().messages.push(message.clone());
    Ok(message)
  }

  async fn has_inbound_from(&self, tenant_id: Uuid, sender: &str) -> Result<bool, MemoryError> {
    let t = self.tables.lock().unwrap();
    Ok(t.messages.iter().any(|m| {
      m.tenant_id == tenant_id && m.sender_number == sender && m.direction == Direction::Inbound
    }))
  }

  async fn recent_messages(&self, tenant_id: Uuid, limit: usize) -> Result<Vec<MessageLog>, MemoryError> {
    let t = self.tables.lock().unwrap();
    Ok(
      t.messages
        .iter()
        .rev()
        .filter(|m| m.tenant_id == tenant_id)
        .take(limit)
        .cloned()
        .collect(),
    )
  }

  async fn message_stats(&self, tenant_id: Uuid) -> Result<MessageStats, MemoryError> {
    let t = self.tables.lock().unwrap();
    let mut stats = MessageStats::default();
    for m in t.messages.iter().filter(|m| m.tenant_id == tenant_id) {
      stats.total += 1;
      match m.direction {
        Direction::Inbound => stats.inbound += 1,
        Direction::Outbound => stats.outbound += 1,
      }
    }
    Ok(stats)
  }

  async fn create_broadcast(&self, input: NewBroadcast) -> Result<Broadcast, MemoryError> {
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
    self.tables.lock().unwrap().broadcasts.push(broadcast.clone());
    Ok(broadcast)
  }

  async fn get_broadcast(&self, broadcast_id: Uuid) -> Result<Option<Broadcast>, MemoryError> {
    let t = self.tables.lock().unwrap();
    Ok(t.broadcasts.iter().find(|b| b.broadcast_id == broadcast_id).cloned())
  }

  async fn list_broadcasts(&self, tenant_id: Uuid) -> Result<Vec<Broadcast>, MemoryError> {
    let t = self.tables.lock().unwrap();
    Ok(t.broadcasts.iter().rev().filter(|b| b.tenant_id == tenant_id).cloned().collect())
  }

  async fn update_broadcast(
    &self,
    mut broadcast: Broadcast,
    at: DateTime<Utc>,
  ) -> Result<Broadcast, MemoryError> {
    if let Some(left) = self.update_budget.lock().unwrap().as_mut() {
      if *left == 0 {
        return Err(MemoryError::Injected);
      }
      *left -= 1;
    }

    broadcast.updated_at = at;
    let mut t = self.tables.lock().unwrap();
    if let Some(slot) = t
      .broadcasts
      .iter_mut()
      .find(|b| b.broadcast_id == broadcast.broadcast_id)
    {
      *slot = broadcast.clone();
    }
    t.history.push(broadcast.clone());
    Ok(broadcast)
  }

  async fn list_broadcasts_by_status(
    &self,
    status: BroadcastStatus,
  ) -> Result<Vec<Broadcast>, MemoryError> {
    let t = self.tables.lock().unwrap();
    Ok(t.broadcasts.iter().filter(|b| b.status == status).cloned().collect())
  }
}

// ─── Transports ──────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("delivery to {0} rejected")]
pub struct Rejected(pub String);

/// Records every send; recipients in `failing` are rejected.
#[derive(Default)]
pub struct RecordingMessenger {
  failing:   HashSet<String>,
  texts:     Mutex<Vec<(String, String)>>,
  templates: Mutex<Vec<(String, String)>>,
}

impl RecordingMessenger {
  pub fn failing_for(recipients: &[&str]) -> Self {
    Self {
      failing: recipients.iter().map(|r| (*r).to_owned()).collect(),
      ..Self::default()
    }
  }

  pub fn texts(&self) -> Vec<(String, String)> { self.texts.lock().unwrap().clone() }

  pub fn templates(&self) -> Vec<(String, String)> {
    self.templates.lock().unwrap().clone()
  }
}

impl Messenger for RecordingMessenger {
  type Error = Rejected;

  async fn send_text(
    &self,
    _credential: &Credential,
    recipient: &str,
    body: &str,
  ) -> Result<(), Rejected> {
    self.texts.lock().unwrap().push((recipient.to_owned(), body.to_owned()));
    if self.failing.contains(recipient) {
      return Err(Rejected(recipient.to_owned()));
    }
    Ok(())
  }

  async fn send_template(
    &self,
    _credential: &Credential,
    recipient: &str,
    template: &str,
  ) -> Result<(), Rejected> {
    self
      .templates
      .lock()
      .unwrap()
      .push((recipient.to_owned(), template.to_owned()));
    if self.failing.contains(recipient) {
      return Err(Rejected(recipient.to_owned()));
    }
    Ok(())
  }
}

#[derive(Default)]
pub struct RecordingNotifier {
  fail:     bool,
  handoffs: Mutex<Vec<Handoff>>,
}

impl RecordingNotifier {
  pub fn failing() -> Self { Self { fail: true, ..Self::default() } }

  pub fn handoffs(&self) -> Vec<Handoff> { self.handoffs.lock().unwrap().clone() }
}

impl HandoffNotifier for RecordingNotifier {
  type Error = Rejected;

  async fn notify_handoff(&self, handoff: &Handoff) -> Result<(), Rejected> {
    self.handoffs.lock().unwrap().push(handoff.clone());
    if self.fail {
      return Err(Rejected(handoff.to_email.clone()));
    }
    Ok(())
  }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

pub async fn tenant(store: &MemoryStore, name: &str, routing_key: &str) -> Tenant {
  store
    .create_tenant(NewTenant {
      business_name:      name.into(),
      email:              format!("owner@{}.example", name.to_lowercase().replace(' ', "-")),
      phone_number_id:    routing_key.into(),
      whatsapp_number:    "+15550000000".into(),
      access_token:       format!("token-{routing_key}"),
      utc_offset_minutes: 0,
    })
    .await
    .unwrap()
    .unwrap()
}

pub async fn add_contacts(store: &MemoryStore, tenant_id: Uuid, numbers: &[&str]) {
  for (i, n) in numbers.iter().enumerate() {
    store
      .add_contact(NewContact {
        tenant_id,
        name: format!("contact {i}"),
        phone_number: (*n).to_owned(),
      })
      .await
      .unwrap();
  }
}
