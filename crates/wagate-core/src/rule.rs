//! Auto-reply rules and the keyword matcher.
//!
//! Matching is plain substring containment over normalized text, evaluated in
//! rule creation order. The first hit wins; keyword length and specificity
//! play no part.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoReplyRule {
  pub rule_id:         Uuid,
  pub tenant_id:       Uuid,
  /// Always stored lower-cased.
  pub trigger_keyword: String,
  pub response_text:   String,
  pub is_active:       bool,
  pub created_at:      DateTime<Utc>,
}

/// Input to [`crate::store::GatewayStore::add_rule`].
#[derive(Debug, Clone)]
pub struct NewRule {
  pub tenant_id:       Uuid,
  pub trigger_keyword: String,
  pub response_text:   String,
}

impl NewRule {
  /// Build a rule input, lower-casing and trimming the keyword.
  ///
  /// An empty keyword would match every message, so it is rejected, as is an
  /// empty response.
  pub fn new(
    tenant_id: Uuid,
    trigger_keyword: &str,
    response_text: &str,
  ) -> Result<Self> {
    let trigger_keyword = normalize(trigger_keyword);
    let response_text = response_text.trim().to_owned();
    if trigger_keyword.is_empty() {
      return Err(Error::InvalidRule("trigger keyword is empty".into()));
    }
    if response_text.is_empty() {
      return Err(Error::InvalidRule("response text is empty".into()));
    }
    Ok(Self { tenant_id, trigger_keyword, response_text })
  }
}

/// Lower-case and trim surrounding whitespace.
pub fn normalize(text: &str) -> String { text.trim().to_lowercase() }

/// Return the first active rule whose keyword occurs in `normalized`.
///
/// `rules` must already be in creation order.
pub fn first_match<'a>(
  rules: &'a [AutoReplyRule],
  normalized: &str,
) -> Option<&'a AutoReplyRule> {
  rules
    .iter()
    .filter(|r| r.is_active)
    .find(|r| normalized.contains(r.trigger_keyword.as_str()))
}
