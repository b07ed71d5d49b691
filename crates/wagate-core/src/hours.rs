//! Business hours: the per-day gate in front of the reply pipeline.
//!
//! A tenant has at most one entry per day of week (0 = Monday). A day with no
//! entry is always open. Times are `HH:MM` strings and are compared
//! lexicographically, which is correct because they are zero-padded.

use chrono::{DateTime, Datelike as _, FixedOffset, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessHours {
  pub tenant_id:   Uuid,
  /// 0 = Monday … 6 = Sunday.
  pub day_of_week: u8,
  pub open_time:   String,
  pub close_time:  String,
  /// `false` disables the entry; the day is then treated as always open.
  pub is_open:     bool,
}

impl BusinessHours {
  /// Validate and build an entry. Times must be zero-padded 24h `HH:MM`.
  pub fn new(
    tenant_id: Uuid,
    day_of_week: u8,
    open_time: &str,
    close_time: &str,
    is_open: bool,
  ) -> Result<Self> {
    if day_of_week > 6 {
      return Err(Error::InvalidHours(format!(
        "day_of_week must be 0..=6, got {day_of_week}"
      )));
    }
    let open_time = parse_hhmm(open_time)?;
    let close_time = parse_hhmm(close_time)?;
    Ok(Self { tenant_id, day_of_week, open_time, close_time, is_open })
  }

  /// Whether `hhmm` falls outside this entry's `[open, close)` window.
  /// A disabled entry never closes.
  pub fn is_closed_at(&self, hhmm: &str) -> bool {
    if !self.is_open {
      return false;
    }
    hhmm < self.open_time.as_str() || hhmm >= self.close_time.as_str()
  }
}

fn parse_hhmm(s: &str) -> Result<String> {
  let s = s.trim();
  if s.len() != 5 || NaiveTime::parse_from_str(s, "%H:%M").is_err() {
    return Err(Error::InvalidHours(format!("expected HH:MM, got {s:?}")));
  }
  Ok(s.to_owned())
}

/// A moment expressed the way business hours are looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSlot {
  pub day_of_week: u8,
  pub hhmm:        String,
}

impl LocalSlot {
  pub fn at(now: DateTime<Utc>, clock: FixedOffset) -> Self {
    let local = now.with_timezone(&clock);
    Self {
      day_of_week: local.weekday().num_days_from_monday() as u8,
      hhmm:        local.format("%H:%M").to_string(),
    }
  }
}
