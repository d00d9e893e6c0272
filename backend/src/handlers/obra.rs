//! HTTP handlers for obra (work order) endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use shared::models::{Obra, ObraMaterial};
use shared::types::Pagination;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::obra::{CreateObraInput, EditObraInput, MaterialInput};
use crate::services::{AuthzService, ObraService};
use crate::AppState;

/// Create an obra
pub async fn create_obra(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateObraInput>,
) -> AppResult<Json<Obra>> {
    let authz = AuthzService::new(state.db.clone());
    let service = ObraService::new(state.db);
    let user = &current_user.0;

    let detail = format!("create obra {}", input.name);
    let obra = authz
        .guard(user, "obras", "create", &detail, || service.create(input))
        .await?;

    Ok(Json(obra))
}

/// List obras
pub async fn list_obras(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<Vec<Obra>>> {
    let service = ObraService::new(state.db);
    let obras = service.list(&pagination).await?;
    Ok(Json(obras))
}

/// Get one obra
pub async fn get_obra(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(obra_id): Path<Uuid>,
) -> AppResult<Json<Obra>> {
    let service = ObraService::new(state.db);
    let obra = service.get(obra_id).await?;
    Ok(Json(obra))
}

/// Edit an obra; the body must carry the version the editor loaded
pub async fn edit_obra(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(obra_id): Path<Uuid>,
    Json(mut input): Json<EditObraInput>,
) -> AppResult<Json<Obra>> {
    input.obra_id = obra_id;

    let authz = AuthzService::new(state.db.clone());
    let service = ObraService::new(state.db);
    let user = &current_user.0;

    let detail = format!("edit obra {} at version {}", obra_id, input.expected_version);
    let obra = authz
        .guard(user, "obras", "edit", &detail, || service.edit(input))
        .await?;

    Ok(Json(obra))
}

/// Replace the bill of materials of an obra
pub async fn set_obra_materials(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(obra_id): Path<Uuid>,
    Json(materials): Json<Vec<MaterialInput>>,
) -> AppResult<Json<Vec<ObraMaterial>>> {
    let authz = AuthzService::new(state.db.clone());
    let service = ObraService::new(state.db);
    let user = &current_user.0;

    let detail = format!("set materials of obra {} ({} lines)", obra_id, materials.len());
    let saved = authz
        .guard(user, "obras", "edit", &detail, || {
            service.set_materials(obra_id, materials)
        })
        .await?;

    Ok(Json(saved))
}

/// Bill of materials of one obra
pub async fn list_obra_materials(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(obra_id): Path<Uuid>,
) -> AppResult<Json<Vec<ObraMaterial>>> {
    let service = ObraService::new(state.db);
    let materials = service.list_materials(obra_id).await?;
    Ok(Json(materials))
}
