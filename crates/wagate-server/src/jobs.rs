//! [`BroadcastJobs`], the in-process job registry behind
//! [`BroadcastScheduler`].
//!
//! Each scheduled broadcast runs on its own tokio task. A second task awaits
//! it and records the outcome, so a panicking run still ends in
//! [`JobState::Failed`]. Registry entries live for the life of the process.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, PoisonError},
};

use uuid::Uuid;
use wagate_core::{
  broadcast::{BroadcastScheduler, JobState},
  runner,
  store::GatewayStore,
  transport::Messenger,
};

type Registry = Arc<Mutex<HashMap<Uuid, JobState>>>;

pub struct BroadcastJobs<S, M> {
  store:     Arc<S>,
  messenger: Arc<M>,
  states:    Registry,
}

impl<S, M> BroadcastJobs<S, M> {
  pub fn new(store: Arc<S>, messenger: Arc<M>) -> Self {
    Self { store, messenger, states: Registry::default() }
  }
}

fn record(states: &Registry, broadcast_id: Uuid, state: JobState) {
  states
    .lock()
    .unwrap_or_else(PoisonError::into_inner)
    .insert(broadcast_id, state);
}

impl<S, M> BroadcastScheduler for BroadcastJobs<S, M>
where
  S: GatewayStore + 'static,
  M: Messenger + 'static,
{
  fn schedule(&self, broadcast_id: Uuid) {
    record(&self.states, broadcast_id, JobState::Queued);

    let store = Arc::clone(&self.store);
    let messenger = Arc::clone(&self.messenger);
    let states = Arc::clone(&self.states);
    let run = tokio::spawn(async move {
      record(&states, broadcast_id, JobState::Running);
      runner::run_broadcast(&*store, &*messenger, broadcast_id).await
    });

    let states = Arc::clone(&self.states);
    tokio::spawn(async move {
      let outcome = match run.await {
        Ok(Ok(report)) => JobState::Finished { report },
        Ok(Err(e)) => {
          tracing::error!(%broadcast_id, error = %e, "broadcast run aborted");
          JobState::Failed { reason: e.to_string() }
        }
        Err(e) => {
          tracing::error!(%broadcast_id, error = %e, "broadcast task died");
          JobState::Failed { reason: format!("task failed: {e}") }
        }
      };
      record(&states, broadcast_id, outcome);
    });
  }

  fn job_state(&self, broadcast_id: Uuid) -> Option<JobState> {
    self
      .states
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .get(&broadcast_id)
      .cloned()
  }
}
