//! Broadcast creation, execution and stall detection.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{
  Error, Result,
  broadcast::{Broadcast, BroadcastScheduler, BroadcastStatus, NewBroadcast, RunReport},
  message::NewMessage,
  store::GatewayStore,
  transport::Messenger,
};

/// Create a pending broadcast and hand it to `scheduler`.
///
/// Fails without writing anything if the tenant does not exist or has no
/// contacts.
pub async fn create_broadcast<S, J>(
  store: &S,
  scheduler: &J,
  input: NewBroadcast,
) -> Result<Broadcast>
where
  S: GatewayStore,
  J: BroadcastScheduler + ?Sized,
{
  let tenant_id = input.tenant_id;
  store
    .get_tenant(tenant_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::TenantNotFound(tenant_id))?;

  let contacts = store.count_contacts(tenant_id).await.map_err(Error::store)?;
  if contacts == 0 {
    return Err(Error::NoContacts(tenant_id));
  }

  let broadcast = store.create_broadcast(input).await.map_err(Error::store)?;
  tracing::info!(
    broadcast_id = %broadcast.broadcast_id,
    %tenant_id,
    contacts,
    "broadcast created"
  );
  scheduler.schedule(broadcast.broadcast_id);
  Ok(broadcast)
}

/// Send the broadcast's template to every contact of its tenant.
///
/// Counters are persisted after each contact so `sent + failed` always
/// reflects progress. Any store error aborts the run and leaves the
/// broadcast in `running`.
pub async fn run_broadcast<S, M>(
  store: &S,
  messenger: &M,
  broadcast_id: Uuid,
) -> Result<RunReport>
where
  S: GatewayStore,
  M: Messenger,
{
  let Some(mut broadcast) =
    store.get_broadcast(broadcast_id).await.map_err(Error::store)?
  else {
    tracing::debug!(%broadcast_id, "broadcast not found; skipping run");
    return Ok(RunReport::Skipped);
  };
  let Some(tenant) =
    store.get_tenant(broadcast.tenant_id).await.map_err(Error::store)?
  else {
    tracing::debug!(%broadcast_id, "tenant not found; skipping run");
    return Ok(RunReport::Skipped);
  };

  let contacts = store
    .list_contacts(tenant.tenant_id)
    .await
    .map_err(Error::store)?;

  broadcast.status = BroadcastStatus::Running;
  broadcast.total = contacts.len() as u64;
  broadcast = store
    .update_broadcast(broadcast, Utc::now())
    .await
    .map_err(Error::store)?;
  tracing::info!(%broadcast_id, total = broadcast.total, "broadcast running");

  let credential = tenant.credential();
  let log_text = broadcast.log_text();

  for contact in &contacts {
    match messenger
      .send_template(&credential, &contact.phone_number, &broadcast.template_name)
      .await
    {
      Ok(()) => {
        broadcast.sent += 1;
        store
          .append_message(NewMessage::outbound(
            tenant.tenant_id,
            &contact.phone_number,
            &log_text,
          ))
          .await
          .map_err(Error::store)?;
      }
      Err(e) => {
        tracing::warn!(
          %broadcast_id,
          recipient = %contact.phone_number,
          error = %e,
          "broadcast send failed"
        );
        broadcast.failed += 1;
      }
    }
    broadcast = store
      .update_broadcast(broadcast, Utc::now())
      .await
      .map_err(Error::store)?;
  }

  broadcast.status = BroadcastStatus::Completed;
  let broadcast = store
    .update_broadcast(broadcast, Utc::now())
    .await
    .map_err(Error::store)?;

  tracing::info!(
    %broadcast_id,
    sent = broadcast.sent,
    failed = broadcast.failed,
    "broadcast completed"
  );
  Ok(RunReport::Completed {
    total:  broadcast.total,
    sent:   broadcast.sent,
    failed: broadcast.failed,
  })
}

/// Running broadcasts whose last persisted change is older than
/// `stall_after`.
pub async fn find_stalled<S>(
  store: &S,
  now: DateTime<Utc>,
  stall_after: Duration,
) -> Result<Vec<Broadcast>>
where
  S: GatewayStore,
{
  let cutoff = now - stall_after;
  let running = store
    .list_broadcasts_by_status(BroadcastStatus::Running)
    .await
    .map_err(Error::store)?;
  Ok(running.into_iter().filter(|b| b.updated_at < cutoff).collect())
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use super::*;
  use crate::{
    broadcast::JobState,
    message::Direction,
    testing::{MemoryStore, RecordingMessenger, add_contacts, tenant},
  };

  #[derive(Default)]
  struct RecordingScheduler {
    scheduled: Mutex<Vec<Uuid>>,
  }

  impl BroadcastScheduler for RecordingScheduler {
    fn schedule(&self, broadcast_id: Uuid) {
      self.scheduled.lock().unwrap().push(broadcast_id);
    }

    fn job_state(&self, _: Uuid) -> Option<JobState> { None }
  }

  #[tokio::test]
  async fn create_rejects_tenant_without_contacts() {
    let store = MemoryStore::default();
    let t = tenant(&store, "Acme", "pn-1").await;
    let scheduler = RecordingScheduler::default();

    let input = NewBroadcast::new(t.tenant_id, "Promo", "hello_world").unwrap();
    let err = create_broadcast(&store, &scheduler, input).await.unwrap_err();

    assert!(matches!(err, Error::NoContacts(id) if id == t.tenant_id));
    assert!(store.list_broadcasts(t.tenant_id).await.unwrap().is_empty());
    assert!(scheduler.scheduled.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn create_returns_pending_and_schedules() {
    let store = MemoryStore::default();
    let t = tenant(&store, "Acme", "pn-1").await;
    add_contacts(&store, t.tenant_id, &["111"]).await;
    let scheduler = RecordingScheduler::default();

    let input = NewBroadcast::new(t.tenant_id, "Promo", "hello_world").unwrap();
    let b = create_broadcast(&store, &scheduler, input).await.unwrap();

    assert_eq!(b.status, BroadcastStatus::Pending);
    assert_eq!((b.total, b.sent, b.failed), (0, 0, 0));
    assert_eq!(*scheduler.scheduled.lock().unwrap(), vec![b.broadcast_id]);
  }

  #[tokio::test]
  async fn create_for_unknown_tenant_fails() {
    let store = MemoryStore::default();
    let scheduler = RecordingScheduler::default();
    let id = Uuid::new_v4();
    let input = NewBroadcast::new(id, "Promo", "hello_world").unwrap();
    let err = create_broadcast(&store, &scheduler, input).await.unwrap_err();
    assert!(matches!(err, Error::TenantNotFound(_)));
  }

  #[tokio::test]
  async fn run_counts_successes_and_failures() {
    let store = MemoryStore::default();
    let t = tenant(&store, "Acme", "pn-1").await;
    add_contacts(&store, t.tenant_id, &["111", "222", "333"]).await;
    let messenger = RecordingMessenger::failing_for(&["222"]);

    let b = store
      .create_broadcast(NewBroadcast::new(t.tenant_id, "Sale", "promo_tpl").unwrap())
      .await
      .unwrap();

    let report = run_broadcast(&store, &messenger, b.broadcast_id).await.unwrap();
    assert_eq!(report, RunReport::Completed { total: 3, sent: 2, failed: 1 });

    let stored = store.get_broadcast(b.broadcast_id).await.unwrap().unwrap();
    assert_eq!(stored.status, BroadcastStatus::Completed);
    assert_eq!(stored.sent + stored.failed, stored.total);

    let templates = messenger.templates();
    assert_eq!(templates.len(), 3);
    assert!(templates.iter().all(|(_, tpl)| tpl == "promo_tpl"));

    let logs = store.messages();
    assert_eq!(logs.len(), 2);
    assert!(logs.iter().all(|m| m.direction == Direction::Outbound
      && m.message_text == "[BROADCAST] Sale"));
    assert!(!logs.iter().any(|m| m.sender_number == "222"));
  }

  #[tokio::test]
  async fn every_persisted_state_keeps_counters_within_total() {
    let store = MemoryStore::default();
    let t = tenant(&store, "Acme", "pn-1").await;
    add_contacts(&store, t.tenant_id, &["1", "2", "3", "4"]).await;
    let messenger = RecordingMessenger::failing_for(&["2", "4"]);

    let b = store
      .create_broadcast(NewBroadcast::new(t.tenant_id, "x", "tpl").unwrap())
      .await
      .unwrap();
    run_broadcast(&store, &messenger, b.broadcast_id).await.unwrap();

    let history = store.broadcast_history(b.broadcast_id);
    // running, one per contact, completed
    assert_eq!(history.len(), 6);
    assert!(history.iter().all(|h| h.sent + h.failed <= h.total));
    let progress: Vec<u64> = history.iter().map(|h| h.sent + h.failed).collect();
    assert_eq!(progress, vec![0, 1, 2, 3, 4, 4]);
    assert_eq!(history.last().unwrap().status, BroadcastStatus::Completed);
  }

  #[tokio::test]
  async fn missing_broadcast_is_skipped() {
    let store = MemoryStore::default();
    let messenger = RecordingMessenger::default();
    let report = run_broadcast(&store, &messenger, Uuid::new_v4()).await.unwrap();
    assert_eq!(report, RunReport::Skipped);
  }

  #[tokio::test]
  async fn store_failure_mid_run_leaves_broadcast_running() {
    let store = MemoryStore::default();
    let t = tenant(&store, "Acme", "pn-1").await;
    add_contacts(&store, t.tenant_id, &["1", "2", "3"]).await;
    let messenger = RecordingMessenger::default();

    let b = store
      .create_broadcast(NewBroadcast::new(t.tenant_id, "x", "tpl").unwrap())
      .await
      .unwrap();
    // The first update (status = running) succeeds, the next one fails.
    store.fail_broadcast_updates_after(1);

    let err = run_broadcast(&store, &messenger, b.broadcast_id).await.unwrap_err();
    assert!(matches!(err, Error::Store(_)));

    let stored = store.get_broadcast(b.broadcast_id).await.unwrap().unwrap();
    assert_eq!(stored.status, BroadcastStatus::Running);
    assert_eq!(stored.total, 3);
  }

  #[tokio::test]
  async fn stalled_detection_uses_heartbeat() {
    let store = MemoryStore::default();
    let t = tenant(&store, "Acme", "pn-1").await;
    let b = store
      .create_broadcast(NewBroadcast::new(t.tenant_id, "x", "tpl").unwrap())
      .await
      .unwrap();

    let mut running = b.clone();
    running.status = BroadcastStatus::Running;
    let beat = Utc::now() - Duration::minutes(30);
    store.update_broadcast(running, beat).await.unwrap();

    let stalled = find_stalled(&store, Utc::now(), Duration::minutes(10))
      .await
      .unwrap();
    assert_eq!(stalled.len(), 1);
    assert_eq!(stalled[0].broadcast_id, b.broadcast_id);

    let fresh = find_stalled(&store, Utc::now(), Duration::hours(1))
      .await
      .unwrap();
    assert!(fresh.is_empty());
  }
}
