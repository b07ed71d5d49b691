//! Handlers for `/tenants/:id/broadcasts` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/tenants/:id/broadcasts` | Newest first |
//! | `POST` | `/tenants/:id/broadcasts` | Body: `{"title":"..","template_name":".."}`; 202 + pending broadcast |
//! | `GET`  | `/tenants/:id/broadcasts/:broadcast_id` | Status and counters |
//! | `GET`  | `/tenants/:id/broadcasts/:broadcast_id/job` | Background job state |
//!
//! Creation returns as soon as the job is queued; progress is read back
//! from the broadcast row or the job endpoint.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;
use wagate_core::{
  broadcast::{Broadcast, JobState, NewBroadcast},
  runner,
  store::GatewayStore,
};

use crate::{ApiState, error::ApiError, tenants::require_tenant};

/// `GET /tenants/:id/broadcasts`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Broadcast>>, ApiError>
where
  S: GatewayStore,
{
  require_tenant(&*state.store, id).await?;
  let broadcasts = state.store.list_broadcasts(id).await.map_err(ApiError::store)?;
  Ok(Json(broadcasts))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub title:         String,
  pub template_name: String,
}

/// `POST /tenants/:id/broadcasts`
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GatewayStore,
{
  let input = NewBroadcast::new(id, &body.title, &body.template_name)?;
  let broadcast = runner::create_broadcast(&*state.store, &*state.jobs, input).await?;
  Ok((StatusCode::ACCEPTED, Json(broadcast)))
}

async fn owned_broadcast<S>(store: &S, id: Uuid, broadcast_id: Uuid) -> Result<Broadcast, ApiError>
where
  S: GatewayStore,
{
  store
    .get_broadcast(broadcast_id)
    .await
    .map_err(ApiError::store)?
    .filter(|b| b.tenant_id == id)
    .ok_or_else(|| ApiError::NotFound(format!("broadcast {broadcast_id} not found")))
}

/// `GET /tenants/:id/broadcasts/:broadcast_id`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  Path((id, broadcast_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Broadcast>, ApiError>
where
  S: GatewayStore,
{
  Ok(Json(owned_broadcast(&*state.store, id, broadcast_id).await?))
}

/// `GET /tenants/:id/broadcasts/:broadcast_id/job`
///
/// 404 when the running process never scheduled this broadcast, e.g. one
/// created before a restart.
pub async fn job<S>(
  State(state): State<ApiState<S>>,
  Path((id, broadcast_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<JobState>, ApiError>
where
  S: GatewayStore,
{
  owned_broadcast(&*state.store, id, broadcast_id).await?;
  let job = state
    .jobs
    .job_state(broadcast_id)
    .ok_or_else(|| ApiError::NotFound(format!("no job for broadcast {broadcast_id}")))?;
  Ok(Json(job))
}
