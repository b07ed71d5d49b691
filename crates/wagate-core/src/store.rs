//! The `GatewayStore` trait, the persistence capability.
//!
//! The trait is implemented by storage backends (e.g. `wagate-store-sqlite`).
//! The dispatcher, the broadcast runner and the admin API depend on this
//! abstraction, never on a concrete backend.
//!
//! Every method that touches tenant-owned rows takes the owning `tenant_id`
//! and scopes its query by it.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  broadcast::{Broadcast, BroadcastStatus, NewBroadcast},
  contact::{Contact, NewContact},
  hours::BusinessHours,
  message::{MessageLog, MessageStats, NewMessage},
  rule::{AutoReplyRule, NewRule},
  tenant::{NewTenant, Tenant},
};

/// Abstraction over a gateway store backend.
///
/// All methods return `Send` futures so the trait can be used from axum
/// handlers and spawned tokio tasks.
pub trait GatewayStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Tenants ───────────────────────────────────────────────────────────

  /// Onboard a tenant. Returns `None` if the email or routing key is
  /// already taken.
  fn create_tenant(
    &self,
    input: NewTenant,
  ) -> impl Future<Output = Result<Option<Tenant>, Self::Error>> + Send + '_;

  fn get_tenant(
    &self,
    tenant_id: Uuid,
  ) -> impl Future<Output = Result<Option<Tenant>, Self::Error>> + Send + '_;

  fn list_tenants(
    &self,
  ) -> impl Future<Output = Result<Vec<Tenant>, Self::Error>> + Send + '_;

  /// Find the *active* tenant owning `routing_key`.
  fn resolve_tenant<'a>(
    &'a self,
    routing_key: &'a str,
  ) -> impl Future<Output = Result<Option<Tenant>, Self::Error>> + Send + 'a;

  /// Soft (de)activation. Returns `None` if the tenant does not exist.
  fn set_tenant_active(
    &self,
    tenant_id: Uuid,
    active: bool,
  ) -> impl Future<Output = Result<Option<Tenant>, Self::Error>> + Send + '_;

  // ── Contacts ──────────────────────────────────────────────────────────

  /// Insert a contact. Returns `None` if the tenant already has a contact
  /// with this phone number; racing inserts land here rather than erroring.
  fn add_contact(
    &self,
    input: NewContact,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + '_;

  fn find_contact<'a>(
    &'a self,
    tenant_id: Uuid,
    phone_number: &'a str,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + 'a;

  fn count_contacts(
    &self,
    tenant_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// All contacts of a tenant in insertion order.
  fn list_contacts(
    &self,
    tenant_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Contact>, Self::Error>> + Send + '_;

  /// Returns `false` if no such contact exists for this tenant.
  fn delete_contact(
    &self,
    tenant_id: Uuid,
    contact_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Rules ─────────────────────────────────────────────────────────────

  fn add_rule(
    &self,
    input: NewRule,
  ) -> impl Future<Output = Result<AutoReplyRule, Self::Error>> + Send + '_;

  /// Rules of a tenant in creation order.
  fn list_rules(
    &self,
    tenant_id: Uuid,
    active_only: bool,
  ) -> impl Future<Output = Result<Vec<AutoReplyRule>, Self::Error>> + Send + '_;

  /// Flip a rule's active flag. Returns `None` if not found.
  fn toggle_rule(
    &self,
    tenant_id: Uuid,
    rule_id: Uuid,
  ) -> impl Future<Output = Result<Option<AutoReplyRule>, Self::Error>> + Send + '_;

  fn delete_rule(
    &self,
    tenant_id: Uuid,
    rule_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Business hours ────────────────────────────────────────────────────

  /// Insert or replace the entry for `hours.day_of_week`.
  fn put_business_hours(
    &self,
    hours: BusinessHours,
  ) -> impl Future<Output = Result<BusinessHours, Self::Error>> + Send + '_;

  fn business_hours_for(
    &self,
    tenant_id: Uuid,
    day_of_week: u8,
  ) -> impl Future<Output = Result<Option<BusinessHours>, Self::Error>> + Send + '_;

  /// All entries ordered by day of week.
  fn list_business_hours(
    &self,
    tenant_id: Uuid,
  ) -> impl Future<Output = Result<Vec<BusinessHours>, Self::Error>> + Send + '_;

  fn delete_business_hours(
    &self,
    tenant_id: Uuid,
    day_of_week: u8,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Message log (append-only) ─────────────────────────────────────────

  /// Append a log entry. The timestamp is set by the store.
  fn append_message(
    &self,
    input: NewMessage,
  ) -> impl Future<Output = Result<MessageLog, Self::Error>> + Send + '_;

  /// Whether any inbound message from `sender` was logged for this tenant.
  fn has_inbound_from<'a>(
    &'a self,
    tenant_id: Uuid,
    sender: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Most recent first.
  fn recent_messages(
    &self,
    tenant_id: Uuid,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<MessageLog>, Self::Error>> + Send + '_;

  fn message_stats(
    &self,
    tenant_id: Uuid,
  ) -> impl Future<Output = Result<MessageStats, Self::Error>> + Send + '_;

  // ── Broadcasts ────────────────────────────────────────────────────────

  /// Insert a broadcast with `status = pending` and zeroed counters.
  fn create_broadcast(
    &self,
    input: NewBroadcast,
  ) -> impl Future<Output = Result<Broadcast, Self::Error>> + Send + '_;

  fn get_broadcast(
    &self,
    broadcast_id: Uuid,
  ) -> impl Future<Output = Result<Option<Broadcast>, Self::Error>> + Send + '_;

  /// Newest first.
  fn list_broadcasts(
    &self,
    tenant_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Broadcast>, Self::Error>> + Send + '_;

  /// Persist status and counters, stamping `updated_at` with `at`.
  fn update_broadcast(
    &self,
    broadcast: Broadcast,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Broadcast, Self::Error>> + Send + '_;

  fn list_broadcasts_by_status(
    &self,
    status: BroadcastStatus,
  ) -> impl Future<Output = Result<Vec<Broadcast>, Self::Error>> + Send + '_;
}
