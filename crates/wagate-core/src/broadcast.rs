//! Broadcast records and the job abstraction that runs them.
//!
//! A broadcast moves `pending → running → completed` and never backwards.
//! Only the runner in [`crate::runner`] mutates it after creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

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
pub enum BroadcastStatus {
  Pending,
  Running,
  Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Broadcast {
  pub broadcast_id:  Uuid,
  pub tenant_id:     Uuid,
  pub title:         String,
  /// Provider template name sent to every contact.
  pub template_name: String,
  pub status:        BroadcastStatus,
  pub total:         u64,
  pub sent:          u64,
  pub failed:        u64,
  pub created_at:    DateTime<Utc>,
  /// Touched on every persisted change; a stale value on a running
  /// broadcast means its runner died.
  pub updated_at:    DateTime<Utc>,
}

impl Broadcast {
  /// Tag written to the message log for each delivered send.
  pub fn log_text(&self) -> String { format!("[BROADCAST] {}", self.title) }
}

/// Input to [`crate::store::GatewayStore::create_broadcast`].
#[derive(Debug, Clone)]
pub struct NewBroadcast {
  pub tenant_id:     Uuid,
  pub title:         String,
  pub template_name: String,
}

impl NewBroadcast {
  pub fn new(tenant_id: Uuid, title: &str, template_name: &str) -> Result<Self> {
    let title = title.trim();
    let template_name = template_name.trim();
    if title.is_empty() {
      return Err(Error::InvalidBroadcast("title is empty".into()));
    }
    if template_name.is_empty() {
      return Err(Error::InvalidBroadcast("template name is empty".into()));
    }
    Ok(Self {
      tenant_id,
      title: title.to_owned(),
      template_name: template_name.to_owned(),
    })
  }
}

// ─── Jobs ────────────────────────────────────────────────────────────────────

/// What a finished run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunReport {
  Completed { total: u64, sent: u64, failed: u64 },
  /// The broadcast or its tenant was missing; nothing was changed.
  Skipped,
}

/// Observable state of the background job running one broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobState {
  Queued,
  Running,
  Finished { report: RunReport },
  /// The run aborted; the broadcast row is left as it was.
  Failed { reason: String },
}

impl JobState {
  pub fn is_terminal(&self) -> bool {
    matches!(self, Self::Finished { .. } | Self::Failed { .. })
  }
}

/// Hands broadcasts to a background executor.
///
/// `schedule` must return without waiting for the run.
pub trait BroadcastScheduler: Send + Sync {
  fn schedule(&self, broadcast_id: Uuid);

  /// `None` if this scheduler never saw the id (e.g. after a restart).
  fn job_state(&self, broadcast_id: Uuid) -> Option<JobState>;
}
