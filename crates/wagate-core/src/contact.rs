//! Contacts: the phone numbers a tenant can broadcast to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tenant::Tenant;

/// A phone number known to a tenant. `(tenant_id, phone_number)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
  pub contact_id:   Uuid,
  pub tenant_id:    Uuid,
  pub name:         String,
  pub phone_number: String,
  pub created_at:   DateTime<Utc>,
}

/// Input to [`crate::store::GatewayStore::add_contact`].
#[derive(Debug, Clone)]
pub struct NewContact {
  pub tenant_id:    Uuid,
  pub name:         String,
  pub phone_number: String,
}

/// Name given to a contact saved automatically from an inbound message, e.g.
/// `acme_store_client_4` for the fourth contact of "Acme Store".
pub fn auto_contact_name(tenant: &Tenant, existing_contacts: u64) -> String {
  format!("{}_client_{}", tenant.slug(), existing_contacts + 1)
}
