//! The inbound dispatcher. Turns one customer message into at most one reply.
//!
//! Pipeline, first applicable branch wins:
//!
//! 1. business-hours gate (closed message, nothing else recorded)
//! 2. contact auto-save
//! 3. greeting for a sender never seen inbound
//! 4. `menu`
//! 5. `human` / `agent` handoff (email notification, best-effort)
//! 6. first matching auto-reply rule in creation order
//! 7. fallback

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  Error, Result,
  contact::{NewContact, auto_contact_name},
  hours::LocalSlot,
  message::{MessageLog, NewMessage},
  replies,
  rule::{first_match, normalize},
  store::GatewayStore,
  tenant::Tenant,
  transport::{Handoff, HandoffNotifier, Messenger},
};

/// One inbound text message, already extracted from the provider envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
  /// Provider-assigned id of the number the message was sent to.
  pub routing_key: String,
  pub sender:      String,
  pub text:        String,
}

/// Which branch of the pipeline produced the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "branch", rename_all = "snake_case")]
pub enum Branch {
  Closed,
  Greeting,
  Menu,
  Handoff,
  Rule { rule_id: Uuid },
  Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
  pub branch: Branch,
  pub text:   String,
}

/// Result of handling one event.
#[derive(Debug, Clone, Default)]
pub struct Dispatch {
  /// `None` when the event was dropped.
  pub reply:       Option<Reply>,
  /// Log rows appended while handling the event, in order.
  pub log_entries: Vec<MessageLog>,
}

impl Dispatch {
  pub fn dropped() -> Self { Self::default() }

  pub fn reply_text(&self) -> Option<&str> {
    self.reply.as_ref().map(|r| r.text.as_str())
  }
}

/// Applies the reply pipeline using explicit collaborators.
pub struct Dispatcher<S, M, N> {
  store:     Arc<S>,
  messenger: Arc<M>,
  notifier:  Arc<N>,
}

impl<S, M, N> Clone for Dispatcher<S, M, N> {
  fn clone(&self) -> Self {
    Self {
      store:     Arc::clone(&self.store),
      messenger: Arc::clone(&self.messenger),
      notifier:  Arc::clone(&self.notifier),
    }
  }
}

impl<S, M, N> Dispatcher<S, M, N>
where
  S: GatewayStore,
  M: Messenger,
  N: HandoffNotifier,
{
  pub fn new(store: Arc<S>, messenger: Arc<M>, notifier: Arc<N>) -> Self {
    Self { store, messenger, notifier }
  }

  /// Handle one inbound text message received at `now`.
  ///
  /// Events whose routing key matches no active tenant are dropped without
  /// touching the store. Send and notify failures are logged and do not fail
  /// the call; store errors do.
  pub async fn handle_inbound(
    &self,
    event: &InboundEvent,
    now: DateTime<Utc>,
  ) -> Result<Dispatch> {
    let Some(tenant) = self
      .store
      .resolve_tenant(&event.routing_key)
      .await
      .map_err(Error::store)?
    else {
      tracing::debug!(routing_key = %event.routing_key, "no active tenant; dropping event");
      return Ok(Dispatch::dropped());
    };
    let tenant_id = tenant.tenant_id;
    let sender = event.sender.as_str();
    tracing::info!(%tenant_id, %sender, "inbound message");

    let mut log_entries = Vec::new();

    if self.is_closed(&tenant, now).await? {
      return self
        .reply(&tenant, sender, Branch::Closed, replies::CLOSED.to_owned(), log_entries)
        .await;
    }

    self.auto_save_contact(&tenant, sender).await?;

    let first_contact = !self
      .store
      .has_inbound_from(tenant_id, sender)
      .await
      .map_err(Error::store)?;

    log_entries.push(self.append(NewMessage::inbound(tenant_id, sender, &event.text)).await?);

    if first_contact {
      let greeting = replies::greeting(&tenant.business_name);
      return self
        .reply(&tenant, sender, Branch::Greeting, greeting, log_entries)
        .await;
    }

    let normalized = normalize(&event.text);
    let (branch, text) = if normalized == "menu" {
      (Branch::Menu, replies::MENU.to_owned())
    } else if normalized.contains("human") || normalized.contains("agent") {
      self.notify(&tenant, event).await;
      (Branch::Handoff, replies::HANDOFF.to_owned())
    } else {
      let rules = self
        .store
        .list_rules(tenant_id, true)
        .await
        .map_err(Error::store)?;
      match first_match(&rules, &normalized) {
        Some(rule) => (
          Branch::Rule { rule_id: rule.rule_id },
          rule.response_text.clone(),
        ),
        None => (Branch::Fallback, replies::FALLBACK.to_owned()),
      }
    };

    self.reply(&tenant, sender, branch, text, log_entries).await
  }

  async fn is_closed(&self, tenant: &Tenant, now: DateTime<Utc>) -> Result<bool> {
    let slot = LocalSlot::at(now, tenant.clock());
    let hours = self
      .store
      .business_hours_for(tenant.tenant_id, slot.day_of_week)
      .await
      .map_err(Error::store)?;
    Ok(hours.is_some_and(|h| h.is_closed_at(&slot.hhmm)))
  }

  async fn auto_save_contact(&self, tenant: &Tenant, sender: &str) -> Result<()> {
    let existing = self
      .store
      .find_contact(tenant.tenant_id, sender)
      .await
      .map_err(Error::store)?;
    if existing.is_some() {
      return Ok(());
    }

    let count = self
      .store
      .count_contacts(tenant.tenant_id)
      .await
      .map_err(Error::store)?;
    let name = auto_contact_name(tenant, count);
    let created = self
      .store
      .add_contact(NewContact {
        tenant_id:    tenant.tenant_id,
        name:         name.clone(),
        phone_number: sender.to_owned(),
      })
      .await
      .map_err(Error::store)?;

    match created {
      Some(_) => tracing::info!(tenant_id = %tenant.tenant_id, %sender, %name, "auto-saved contact"),
      None => tracing::debug!(tenant_id = %tenant.tenant_id, %sender, "contact saved concurrently"),
    }
    Ok(())
  }

  async fn notify(&self, tenant: &Tenant, event: &InboundEvent) {
    let handoff = Handoff {
      to_email:     tenant.email.clone(),
      tenant_name:  tenant.business_name.clone(),
      sender:       event.sender.clone(),
      last_message: event.text.clone(),
    };
    if let Err(e) = self.notifier.notify_handoff(&handoff).await {
      tracing::warn!(
        tenant_id = %tenant.tenant_id,
        sender = %event.sender,
        error = %e,
        "handoff notification failed"
      );
    }
  }

  /// Send `text`, then log it as outbound regardless of delivery.
  async fn reply(
    &self,
    tenant: &Tenant,
    recipient: &str,
    branch: Branch,
    text: String,
    mut log_entries: Vec<MessageLog>,
  ) -> Result<Dispatch> {
    let credential = tenant.credential();
    if let Err(e) = self.messenger.send_text(&credential, recipient, &text).await {
      tracing::warn!(
        tenant_id = %tenant.tenant_id,
        %recipient,
        ?branch,
        error = %e,
        "reply delivery failed"
      );
    }
    log_entries.push(
      self
        .append(NewMessage::outbound(tenant.tenant_id, recipient, &text))
        .await?,
    );
    Ok(Dispatch { reply: Some(Reply { branch, text }), log_entries })
  }

  async fn append(&self, message: NewMessage) -> Result<MessageLog> {
    self.store.append_message(message).await.map_err(Error::store)
  }
}
