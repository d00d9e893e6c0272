//! HTTP handlers for the audit trail

use axum::{
    extract::{Path, Query, State},
    Json,
};

use shared::models::AuditEvent;
use shared::types::Pagination;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::AuditService;
use crate::AppState;

/// Recent audit events (requires audit:read)
pub async fn list_audit_events(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<Vec<AuditEvent>>> {
    if !current_user.0.has_permission("audit", "read") {
        return Err(AppError::InsufficientPermissions);
    }

    let service = AuditService::new(state.db);
    let events = service.list_recent(&pagination).await?;
    Ok(Json(events))
}

/// Audit events of one module (requires audit:read)
pub async fn list_audit_events_by_module(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(module): Path<String>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<Vec<AuditEvent>>> {
    if !current_user.0.has_permission("audit", "read") {
        return Err(AppError::InsufficientPermissions);
    }

    let service = AuditService::new(state.db);
    let events = service.list_by_module(&module, &pagination).await?;
    Ok(Json(events))
}
