//! HTTP handlers for stock ledger endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use shared::models::{Reservation, StockDomain, StockItem, StockMovement};
use shared::types::Pagination;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::stock::{AdjustInput, CreateItemInput, ReserveInput, ReturnInput};
use crate::services::{AuthzService, StockService};
use crate::AppState;

/// Reserve stock for an obra
pub async fn reserve_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<ReserveInput>,
) -> AppResult<Json<Reservation>> {
    let authz = AuthzService::new(state.db.clone());
    let service = StockService::new(state.db, state.events.clone());
    let user = &current_user.0;

    let detail = format!(
        "reserve {} of item {} for obra {}",
        input.quantity, input.item_id, input.obra_id
    );
    let reservation = authz
        .guard(user, "stock", "reserve", &detail, || {
            service.reserve(user.user_id, input)
        })
        .await?;

    Ok(Json(reservation))
}

/// Return reserved stock to the ledger
pub async fn return_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<ReturnInput>,
) -> AppResult<Json<()>> {
    let authz = AuthzService::new(state.db.clone());
    let service = StockService::new(state.db, state.events.clone());
    let user = &current_user.0;

    let detail = format!(
        "return {} of item {} from obra {}",
        input.quantity, input.item_id, input.obra_id
    );
    authz
        .guard(user, "stock", "return", &detail, || {
            service.return_stock(user.user_id, input)
        })
        .await?;

    Ok(Json(()))
}

/// Adjust the absolute quantity of an item
pub async fn adjust_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<AdjustInput>,
) -> AppResult<Json<()>> {
    let authz = AuthzService::new(state.db.clone());
    let service = StockService::new(state.db, state.events.clone());
    let user = &current_user.0;

    let detail = format!(
        "adjust item {} to {} ({})",
        input.item_id, input.new_quantity, input.reason
    );
    authz
        .guard(user, "stock", "adjust", &detail, || {
            service.adjust(user.user_id, input)
        })
        .await?;

    Ok(Json(()))
}

/// Register a new stock item
pub async fn create_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateItemInput>,
) -> AppResult<Json<StockItem>> {
    let authz = AuthzService::new(state.db.clone());
    let service = StockService::new(state.db, state.events.clone());
    let user = &current_user.0;

    let detail = format!("create item {} in domain {}", input.code, input.domain.as_str());
    let item = authz
        .guard(user, "stock", "create", &detail, || {
            service.create_item(input)
        })
        .await?;

    Ok(Json(item))
}

/// List items of one stock domain
pub async fn list_items(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(domain): Path<String>,
) -> AppResult<Json<Vec<StockItem>>> {
    let domain: StockDomain = domain.parse().map_err(|_| AppError::Validation {
        field: "domain".to_string(),
        message: "Unknown stock domain".to_string(),
        message_es: "Dominio de stock desconocido".to_string(),
    })?;

    let service = StockService::new(state.db, state.events.clone());
    let items = service.list_items(domain).await?;
    Ok(Json(items))
}

/// Get one stock item
pub async fn get_item(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<StockItem>> {
    let service = StockService::new(state.db, state.events.clone());
    let item = service.get_item(item_id).await?;
    Ok(Json(item))
}

/// Movement history of one item
pub async fn list_movements(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<Vec<StockMovement>>> {
    let service = StockService::new(state.db, state.events.clone());
    let movements = service.list_movements(item_id, &pagination).await?;
    Ok(Json(movements))
}

/// Active reservations of one obra
pub async fn list_obra_reservations(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(obra_id): Path<Uuid>,
) -> AppResult<Json<Vec<Reservation>>> {
    let service = StockService::new(state.db, state.events.clone());
    let reservations = service.list_reservations(obra_id).await?;
    Ok(Json(reservations))
}
