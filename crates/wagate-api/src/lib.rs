//! JSON admin API for the wagate gateway.
//!
//! Exposes an axum [`Router`] backed by any [`GatewayStore`]. Everything a
//! tenant owns lives under `/tenants/{id}`. Auth, TLS and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", wagate_api::api_router(store.clone(), jobs.clone()))
//! ```

pub mod broadcasts;
pub mod contacts;
pub mod error;
pub mod hours;
pub mod messages;
pub mod rules;
pub mod tenants;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post},
};
use wagate_core::{broadcast::BroadcastScheduler, store::GatewayStore};

pub use error::ApiError;

/// State shared by every admin handler.
pub struct ApiState<S> {
  pub store: Arc<S>,
  pub jobs:  Arc<dyn BroadcastScheduler>,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), jobs: Arc::clone(&self.jobs) }
  }
}

/// Build the admin router for `store`, handing new broadcasts to `jobs`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, jobs: Arc<dyn BroadcastScheduler>) -> Router<()>
where
  S: GatewayStore + 'static,
{
  Router::new()
    // Tenants
    .route("/tenants", get(tenants::list::<S>).post(tenants::create::<S>))
    .route("/tenants/{id}", get(tenants::get_one::<S>))
    .route("/tenants/{id}/activate", post(tenants::activate::<S>))
    .route("/tenants/{id}/deactivate", post(tenants::deactivate::<S>))
    .route("/tenants/{id}/stats", get(tenants::stats::<S>))
    // Contacts
    .route(
      "/tenants/{id}/contacts",
      get(contacts::list::<S>).post(contacts::create::<S>),
    )
    .route("/tenants/{id}/contacts/{contact_id}", delete(contacts::remove::<S>))
    // Rules
    .route("/tenants/{id}/rules", get(rules::list::<S>).post(rules::create::<S>))
    .route("/tenants/{id}/rules/{rule_id}", delete(rules::remove::<S>))
    .route("/tenants/{id}/rules/{rule_id}/toggle", post(rules::toggle::<S>))
    // Business hours
    .route("/tenants/{id}/hours", get(hours::list::<S>).put(hours::upsert::<S>))
    .route("/tenants/{id}/hours/{day}", delete(hours::remove::<S>))
    // Message log
    .route("/tenants/{id}/messages", get(messages::recent::<S>))
    // Broadcasts
    .route(
      "/tenants/{id}/broadcasts",
      get(broadcasts::list::<S>).post(broadcasts::create::<S>),
    )
    .route("/tenants/{id}/broadcasts/{broadcast_id}", get(broadcasts::get_one::<S>))
    .route("/tenants/{id}/broadcasts/{broadcast_id}/job", get(broadcasts::job::<S>))
    .with_state(ApiState { store, jobs })
}
