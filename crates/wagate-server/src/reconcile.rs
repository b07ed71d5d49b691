//! Periodic scan for broadcasts whose runner has gone quiet.
//!
//! A broadcast stays `running` forever if its process dies mid-run. The
//! reconciler surfaces those at warn level; it never changes their status.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tokio::task::JoinHandle;
use wagate_core::{runner, store::GatewayStore};

/// Run one scan and return how many stalled broadcasts were reported.
pub async fn reconcile_once<S>(store: &S, stall_after: chrono::Duration) -> wagate_core::Result<usize>
where
  S: GatewayStore,
{
  let stalled = runner::find_stalled(store, Utc::now(), stall_after).await?;
  for b in &stalled {
    tracing::warn!(
      broadcast_id = %b.broadcast_id,
      tenant_id = %b.tenant_id,
      sent = b.sent,
      failed = b.failed,
      total = b.total,
      last_progress = %b.updated_at,
      "broadcast appears stalled"
    );
  }
  Ok(stalled.len())
}

/// Spawn the scan loop on the current runtime.
pub fn spawn_reconciler<S>(
  store: Arc<S>,
  every: Duration,
  stall_after: chrono::Duration,
) -> JoinHandle<()>
where
  S: GatewayStore + 'static,
{
  tokio::spawn(async move {
    let mut tick = tokio::time::interval(every);
    loop {
      tick.tick().await;
      if let Err(e) = reconcile_once(&*store, stall_after).await {
        tracing::error!(error = %e, "stalled-broadcast scan failed");
      }
    }
  })
}
