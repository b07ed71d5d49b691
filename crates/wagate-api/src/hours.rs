//! Handlers for `/tenants/:id/hours` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/tenants/:id/hours` | Ordered by day, 0 = Monday |
//! | `PUT`    | `/tenants/:id/hours` | Body: [`PutBody`]; replaces that day's entry |
//! | `DELETE` | `/tenants/:id/hours/:day` | Day becomes always-open |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;
use wagate_core::{hours::BusinessHours, store::GatewayStore};

use crate::{ApiState, error::ApiError, tenants::require_tenant};

/// `GET /tenants/:id/hours`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<BusinessHours>>, ApiError>
where
  S: GatewayStore,
{
  require_tenant(&*state.store, id).await?;
  let hours = state
    .store
    .list_business_hours(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(hours))
}

#[derive(Debug, Deserialize)]
pub struct PutBody {
  pub day_of_week: u8,
  pub open_time:   String,
  pub close_time:  String,
  #[serde(default = "default_open")]
  pub is_open:     bool,
}

fn default_open() -> bool { true }

/// `PUT /tenants/:id/hours`
pub async fn upsert<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<PutBody>,
) -> Result<Json<BusinessHours>, ApiError>
where
  S: GatewayStore,
{
  require_tenant(&*state.store, id).await?;
  let entry = BusinessHours::new(
    id,
    body.day_of_week,
    &body.open_time,
    &body.close_time,
    body.is_open,
  )?;
  let stored = state
    .store
    .put_business_hours(entry)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(stored))
}

/// `DELETE /tenants/:id/hours/:day`
pub async fn remove<S>(
  State(state): State<ApiState<S>>,
  Path((id, day)): Path<(Uuid, u8)>,
) -> Result<StatusCode, ApiError>
where
  S: GatewayStore,
{
  let deleted = state
    .store
    .delete_business_hours(id, day)
    .await
    .map_err(ApiError::store)?;
  if !deleted {
    return Err(ApiError::NotFound(format!("no hours set for day {day}")));
  }
  Ok(StatusCode::NO_CONTENT)
}
