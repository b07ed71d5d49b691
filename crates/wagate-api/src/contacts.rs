//! Handlers for `/tenants/:id/contacts` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/tenants/:id/contacts` | Insertion order |
//! | `POST`   | `/tenants/:id/contacts` | Body: `{"name":"..","phone_number":".."}`; 409 on duplicate |
//! | `DELETE` | `/tenants/:id/contacts/:contact_id` | 204, or 404 |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;
use wagate_core::{
  contact::{Contact, NewContact},
  store::GatewayStore,
};

use crate::{ApiState, error::ApiError, tenants::require_tenant};

/// `GET /tenants/:id/contacts`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Contact>>, ApiError>
where
  S: GatewayStore,
{
  require_tenant(&*state.store, id).await?;
  let contacts = state.store.list_contacts(id).await.map_err(ApiError::store)?;
  Ok(Json(contacts))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name:         String,
  pub phone_number: String,
}

/// `POST /tenants/:id/contacts`
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GatewayStore,
{
  require_tenant(&*state.store, id).await?;

  let phone_number = body.phone_number.trim().to_owned();
  if phone_number.is_empty() {
    return Err(ApiError::BadRequest("phone_number must not be empty".into()));
  }

  let contact = state
    .store
    .add_contact(NewContact {
      tenant_id: id,
      name: body.name.trim().to_owned(),
      phone_number,
    })
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::Conflict("contact with this phone number exists".into()))?;

  Ok((StatusCode::CREATED, Json(contact)))
}

/// `DELETE /tenants/:id/contacts/:contact_id`
pub async fn remove<S>(
  State(state): State<ApiState<S>>,
  Path((id, contact_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError>
where
  S: GatewayStore,
{
  let deleted = state
    .store
    .delete_contact(id, contact_id)
    .await
    .map_err(ApiError::store)?;
  if !deleted {
    return Err(ApiError::NotFound(format!("contact {contact_id} not found")));
  }
  Ok(StatusCode::NO_CONTENT)
}
