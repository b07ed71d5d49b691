//! Handler for `GET /tenants/:id/messages[?limit=N]`.

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::Deserialize;
use uuid::Uuid;
use wagate_core::{message::MessageLog, store::GatewayStore};

use crate::{ApiState, error::ApiError, tenants::require_tenant};

pub const DEFAULT_LIMIT: usize = 50;
pub const MAX_LIMIT: usize = 500;

#[derive(Debug, Deserialize)]
pub struct RecentParams {
  pub limit: Option<usize>,
}

/// `GET /tenants/:id/messages`: newest first, capped at [`MAX_LIMIT`].
pub async fn recent<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<RecentParams>,
) -> Result<Json<Vec<MessageLog>>, ApiError>
where
  S: GatewayStore,
{
  require_tenant(&*state.store, id).await?;
  let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
  let messages = state
    .store
    .recent_messages(id, limit)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(messages))
}
