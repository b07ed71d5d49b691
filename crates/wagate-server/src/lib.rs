//! HTTP server for the wagate WhatsApp gateway.
//!
//! Wires the provider webhook, the admin API and the background broadcast
//! jobs onto one axum [`Router`], backed by any [`GatewayStore`].

pub mod auth;
pub mod error;
pub mod jobs;
pub mod messenger;
pub mod notifier;
pub mod reconcile;
pub mod webhook;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Json, Router, middleware, routing::get};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use wagate_core::{
  broadcast::BroadcastScheduler,
  dispatch::Dispatcher,
  store::GatewayStore,
  transport::{HandoffNotifier, Messenger},
};

use auth::{AuthConfig, require_auth};
use jobs::BroadcastJobs;
use notifier::MailConfig;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `WAGATE_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                    String,
  #[serde(default = "default_port")]
  pub port:                    u16,
  pub store_path:              PathBuf,
  /// Shared secret for the provider's subscription handshake.
  pub verify_token:            String,
  #[serde(default = "default_graph_api_base")]
  pub graph_api_base:          String,
  #[serde(default = "default_template_language")]
  pub template_language:       String,
  #[serde(default = "default_http_timeout_secs")]
  pub http_timeout_secs:       u64,
  pub auth_username:           String,
  pub auth_password_hash:      String,
  /// Handoff e-mails are skipped (and logged) when absent.
  pub mail:                    Option<MailConfig>,
  #[serde(default = "default_stall_after_secs")]
  pub stall_after_secs:        u64,
  #[serde(default = "default_reconcile_interval_secs")]
  pub reconcile_interval_secs: u64,
}

fn default_host() -> String { "0.0.0.0".into() }
fn default_port() -> u16 { 8000 }
fn default_graph_api_base() -> String { "https://graph.facebook.com/v19.0".into() }
fn default_template_language() -> String { "en_US".into() }
fn default_http_timeout_secs() -> u64 { 30 }
fn default_stall_after_secs() -> u64 { 600 }
fn default_reconcile_interval_secs() -> u64 { 60 }

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through the webhook handlers.
pub struct AppState<S, M, N> {
  pub store:      Arc<S>,
  pub dispatcher: Dispatcher<S, M, N>,
  pub jobs:       Arc<dyn BroadcastScheduler>,
  pub config:     Arc<ServerConfig>,
  pub auth:       Arc<AuthConfig>,
}

impl<S, M, N> Clone for AppState<S, M, N> {
  fn clone(&self) -> Self {
    Self {
      store:      Arc::clone(&self.store),
      dispatcher: self.dispatcher.clone(),
      jobs:       Arc::clone(&self.jobs),
      config:     Arc::clone(&self.config),
      auth:       Arc::clone(&self.auth),
    }
  }
}

impl<S, M, N> AppState<S, M, N>
where
  S: GatewayStore + 'static,
  M: Messenger + 'static,
  N: HandoffNotifier + 'static,
{
  /// Build the dispatcher and the broadcast job registry around shared
  /// collaborators.
  pub fn new(store: Arc<S>, messenger: Arc<M>, notifier: Arc<N>, config: ServerConfig) -> Self {
    let dispatcher = Dispatcher::new(Arc::clone(&store), Arc::clone(&messenger), notifier);
    let jobs: Arc<dyn BroadcastScheduler> =
      Arc::new(BroadcastJobs::new(Arc::clone(&store), messenger));
    let auth = AuthConfig {
      username:      config.auth_username.clone(),
      password_hash: config.auth_password_hash.clone(),
    };
    Self {
      store,
      dispatcher,
      jobs,
      config: Arc::new(config),
      auth: Arc::new(auth),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the full gateway router: liveness, webhook, and the authenticated
/// admin API under `/api`.
pub fn router<S, M, N>(state: AppState<S, M, N>) -> Router
where
  S: GatewayStore + 'static,
  M: Messenger + 'static,
  N: HandoffNotifier + 'static,
{
  let api = wagate_api::api_router(Arc::clone(&state.store), Arc::clone(&state.jobs))
    .layer(middleware::from_fn_with_state(Arc::clone(&state.auth), require_auth));

  Router::new()
    .route("/", get(health))
    .route(
      "/webhook",
      get(webhook::verify::<S, M, N>).post(webhook::receive::<S, M, N>),
    )
    .with_state(state)
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> { Json(json!({ "status": "running" })) }
