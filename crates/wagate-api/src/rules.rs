//! Handlers for `/tenants/:id/rules` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/tenants/:id/rules` | Creation order, inactive included |
//! | `POST`   | `/tenants/:id/rules` | Body: `{"trigger_keyword":"..","response_text":".."}` |
//! | `DELETE` | `/tenants/:id/rules/:rule_id` | 204, or 404 |
//! | `POST`   | `/tenants/:id/rules/:rule_id/toggle` | Flips `is_active` |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;
use wagate_core::{
  rule::{AutoReplyRule, NewRule},
  store::GatewayStore,
};

use crate::{ApiState, error::ApiError, tenants::require_tenant};

/// `GET /tenants/:id/rules`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<AutoReplyRule>>, ApiError>
where
  S: GatewayStore,
{
  require_tenant(&*state.store, id).await?;
  let rules = state.store.list_rules(id, false).await.map_err(ApiError::store)?;
  Ok(Json(rules))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub trigger_keyword: String,
  pub response_text:   String,
}

/// `POST /tenants/:id/rules`
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GatewayStore,
{
  require_tenant(&*state.store, id).await?;
  let input = NewRule::new(id, &body.trigger_keyword, &body.response_text)?;
  let rule = state.store.add_rule(input).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(rule)))
}

/// `DELETE /tenants/:id/rules/:rule_id`
pub async fn remove<S>(
  State(state): State<ApiState<S>>,
  Path((id, rule_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError>
where
  S: GatewayStore,
{
  if !state.store.delete_rule(id, rule_id).await.map_err(ApiError::store)? {
    return Err(ApiError::NotFound(format!("rule {rule_id} not found")));
  }
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /tenants/:id/rules/:rule_id/toggle`
pub async fn toggle<S>(
  State(state): State<ApiState<S>>,
  Path((id, rule_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<AutoReplyRule>, ApiError>
where
  S: GatewayStore,
{
  let rule = state
    .store
    .toggle_rule(id, rule_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("rule {rule_id} not found")))?;
  Ok(Json(rule))
}
