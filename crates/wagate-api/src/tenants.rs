//! Handlers for `/tenants` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/tenants` | All tenants, onboarding order |
//! | `POST` | `/tenants` | Body: [`NewTenant`]; 409 on duplicate email or routing key |
//! | `GET`  | `/tenants/:id` | 404 if not found |
//! | `POST` | `/tenants/:id/activate` | |
//! | `POST` | `/tenants/:id/deactivate` | Stops inbound routing; data is kept |
//! | `GET`  | `/tenants/:id/stats` | Message, rule and contact counts |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Serialize;
use uuid::Uuid;
use wagate_core::{
  store::GatewayStore,
  tenant::{NewTenant, Tenant},
};

use crate::{ApiState, error::ApiError};

/// Load a tenant or fail with 404. Every nested route starts here.
pub(crate) async fn require_tenant<S>(store: &S, id: Uuid) -> Result<Tenant, ApiError>
where
  S: GatewayStore,
{
  store
    .get_tenant(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("tenant {id} not found")))
}

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /tenants`
pub async fn list<S>(State(state): State<ApiState<S>>) -> Result<Json<Vec<Tenant>>, ApiError>
where
  S: GatewayStore,
{
  let tenants = state.store.list_tenants().await.map_err(ApiError::store)?;
  Ok(Json(tenants))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /tenants`
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<NewTenant>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GatewayStore,
{
  body.validate()?;
  for (field, value) in [
    ("business_name", &body.business_name),
    ("email", &body.email),
    ("phone_number_id", &body.phone_number_id),
    ("access_token", &body.access_token),
  ] {
    if value.trim().is_empty() {
      return Err(ApiError::BadRequest(format!("{field} must not be empty")));
    }
  }

  let tenant = state
    .store
    .create_tenant(body)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| {
      ApiError::Conflict("email or phone_number_id already registered".into())
    })?;

  tracing::info!(tenant_id = %tenant.tenant_id, name = %tenant.business_name, "tenant onboarded");
  Ok((StatusCode::CREATED, Json(tenant)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /tenants/:id`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Tenant>, ApiError>
where
  S: GatewayStore,
{
  Ok(Json(require_tenant(&*state.store, id).await?))
}

// ─── Activation ──────────────────────────────────────────────────────────────

async fn set_active<S>(store: &S, id: Uuid, active: bool) -> Result<Json<Tenant>, ApiError>
where
  S: GatewayStore,
{
  let tenant = store
    .set_tenant_active(id, active)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("tenant {id} not found")))?;
  tracing::info!(tenant_id = %id, active, "tenant activation changed");
  Ok(Json(tenant))
}

/// `POST /tenants/:id/activate`
pub async fn activate<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Tenant>, ApiError>
where
  S: GatewayStore,
{
  set_active(&*state.store, id, true).await
}

/// `POST /tenants/:id/deactivate`
pub async fn deactivate<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Tenant>, ApiError>
where
  S: GatewayStore,
{
  set_active(&*state.store, id, false).await
}

// ─── Stats ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct TenantStats {
  pub total_messages:    u64,
  pub inbound_messages:  u64,
  pub outbound_messages: u64,
  pub active_rules:      usize,
  pub contacts:          u64,
}

/// `GET /tenants/:id/stats`
pub async fn stats<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<TenantStats>, ApiError>
where
  S: GatewayStore,
{
  let store = &*state.store;
  require_tenant(store, id).await?;

  let messages = store.message_stats(id).await.map_err(ApiError::store)?;
  let active_rules = store.list_rules(id, true).await.map_err(ApiError::store)?.len();
  let contacts = store.count_contacts(id).await.map_err(ApiError::store)?;

  Ok(Json(TenantStats {
    total_messages: messages.total,
    inbound_messages: messages.inbound,
    outbound_messages: messages.outbound,
    active_rules,
    contacts,
  }))
}
