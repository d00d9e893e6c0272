//! HTTP handlers for pedido (purchase order) endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use shared::models::Pedido;
use shared::types::Pagination;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::pedido::PedidoWithLines;
use crate::services::{AuthzService, PedidoService};
use crate::AppState;

/// Generate a pedido covering the shortfalls of an obra
pub async fn generate_pedido(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(obra_id): Path<Uuid>,
) -> AppResult<Json<PedidoWithLines>> {
    let authz = AuthzService::new(state.db.clone());
    let service = PedidoService::new(state.db, state.events.clone());
    let user = &current_user.0;

    let detail = format!("generate pedido for obra {}", obra_id);
    let pedido = authz
        .guard(user, "pedidos", "generate", &detail, || {
            service.generate(obra_id)
        })
        .await?;

    Ok(Json(pedido))
}

/// Receive a pending pedido
pub async fn receive_pedido(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(pedido_id): Path<Uuid>,
) -> AppResult<Json<PedidoWithLines>> {
    let authz = AuthzService::new(state.db.clone());
    let service = PedidoService::new(state.db, state.events.clone());
    let user = &current_user.0;

    let detail = format!("receive pedido {}", pedido_id);
    let pedido = authz
        .guard(user, "pedidos", "receive", &detail, || {
            service.receive(user.user_id, pedido_id)
        })
        .await?;

    Ok(Json(pedido))
}

/// Get one pedido with its lines
pub async fn get_pedido(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(pedido_id): Path<Uuid>,
) -> AppResult<Json<PedidoWithLines>> {
    let service = PedidoService::new(state.db, state.events.clone());
    let pedido = service.get(pedido_id).await?;
    Ok(Json(pedido))
}

/// Pedidos of one obra
pub async fn list_obra_pedidos(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(obra_id): Path<Uuid>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<Vec<Pedido>>> {
    let service = PedidoService::new(state.db, state.events.clone());
    let pedidos = service.list_by_obra(obra_id, &pagination).await?;
    Ok(Json(pedidos))
}

/// Pending pedidos across all obras
pub async fn list_pending_pedidos(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<Vec<Pedido>>> {
    let service = PedidoService::new(state.db, state.events.clone());
    let pedidos = service.list_pending(&pagination).await?;
    Ok(Json(pedidos))
}
