//! Resource read and create handlers, shared by every resource kind

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::IntoResponse,
};
use medibridge_core::ResourceKind;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::db::{ResourceRepository, SharedStore};
use crate::error::AppError;

/// Query parameters for lookup by business identifier
#[derive(Debug, Deserialize)]
pub struct IdentifierQuery {
    pub system: String,
    pub value: String,
}

/// Response body for a successful create
#[derive(Serialize)]
pub struct CreateResponse {
    pub id: String,
}

/// GET /{kind}/{id} - Read a resource by id
pub async fn read(
    kind: ResourceKind,
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let repo = ResourceRepository::new(store, kind);
    let document = repo.get_by_id(&id).await?;
    Ok(Json(document))
}

/// GET /{kind}/by-identifier?system=..&value=.. - Read a resource by business identifier
pub async fn by_identifier(
    kind: ResourceKind,
    State(store): State<SharedStore>,
    query: Result<Query<IdentifierQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let repo = ResourceRepository::new(store, kind);
    let document = repo.get_by_identifier(&query.system, &query.value).await?;
    Ok(Json(document))
}

/// POST /{kind} - Validate and create a resource
pub async fn create(
    kind: ResourceKind,
    State(store): State<SharedStore>,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let repo = ResourceRepository::new(store, kind);
    let id = repo.create(body).await?.to_string();

    let location = format!("/{}/{}", kind.path(), id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(CreateResponse { id }),
    ))
}
