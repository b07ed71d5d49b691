//! Tenant: a business account that owns one WhatsApp number.
//!
//! Every other entity in the store hangs off a tenant. Tenants are never
//! deleted; an operator deactivates them instead, which makes the routing key
//! stop resolving.

use chrono::{DateTime, FixedOffset, Offset as _, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Largest offset accepted for a tenant's business-hours clock.
pub const MAX_OFFSET_MINUTES: i32 = 14 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
  pub tenant_id:          Uuid,
  pub business_name:      String,
  /// Where handoff notifications are delivered.
  pub email:              String,
  /// Provider-assigned phone number id; the inbound routing key.
  pub phone_number_id:    String,
  /// The human-readable WhatsApp number, display only.
  pub whatsapp_number:    String,
  /// Outbound credential for the provider API.
  #[serde(skip_serializing, default)]
  pub access_token:       String,
  pub is_active:          bool,
  /// Offset of the clock used for business-hours checks. Zero means UTC.
  pub utc_offset_minutes: i32,
  pub created_at:         DateTime<Utc>,
}

impl Tenant {
  /// The credential used for every outbound send on behalf of this tenant.
  pub fn credential(&self) -> Credential {
    Credential {
      phone_number_id: self.phone_number_id.clone(),
      access_token:    self.access_token.clone(),
    }
  }

  /// The fixed offset used for business-hours evaluation.
  pub fn clock(&self) -> FixedOffset {
    FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
  }

  /// Lower-cased display name with spaces replaced by underscores.
  pub fn slug(&self) -> String {
    self.business_name.to_lowercase().replace(' ', "_")
  }
}

/// Provider credentials for one tenant's number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
  pub phone_number_id: String,
  pub access_token:    String,
}

/// Input to [`crate::store::GatewayStore::create_tenant`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewTenant {
  pub business_name:      String,
  pub email:              String,
  pub phone_number_id:    String,
  pub whatsapp_number:    String,
  pub access_token:       String,
  #[serde(default)]
  pub utc_offset_minutes: i32,
}

impl NewTenant {
  pub fn validate(&self) -> Result<()> {
    if self.utc_offset_minutes.abs() > MAX_OFFSET_MINUTES {
      return Err(Error::InvalidOffset(self.utc_offset_minutes));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn tenant(name: &str, offset: i32) -> Tenant {
    Tenant {
      tenant_id:          Uuid::new_v4(),
      business_name:      name.into(),
      email:              "owner@example.com".into(),
      phone_number_id:    "pnid".into(),
      whatsapp_number:    "+15550000".into(),
      access_token:       "token".into(),
      is_active:          true,
      utc_offset_minutes: offset,
      created_at:         Utc::now(),
    }
  }

  #[test]
  fn slug_lowercases_and_joins_words() {
    assert_eq!(tenant("Joe's Pizza Place", 0).slug(), "joe's_pizza_place");
  }

  #[test]
  fn clock_honours_offset() {
    assert_eq!(tenant("x", 90).clock().local_minus_utc(), 90 * 60);
    assert_eq!(tenant("x", 0).clock().local_minus_utc(), 0);
  }

  #[test]
  fn offset_out_of_range_is_rejected() {
    let input = NewTenant {
      business_name:      "x".into(),
      email:              "x@example.com".into(),
      phone_number_id:    "1".into(),
      whatsapp_number:    "1".into(),
      access_token:       "t".into(),
      utc_offset_minutes: 15 * 60,
    };
    assert!(matches!(input.validate(), Err(Error::InvalidOffset(900))));
  }
}
