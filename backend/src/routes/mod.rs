//! Route definitions for the Taller Window & Door Management Platform

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public)
        .nest("/auth", auth_routes())
        // Protected routes - stock ledger
        .nest("/stock", stock_routes())
        // Protected routes - work orders
        .nest("/obras", obra_routes())
        // Protected routes - purchase orders
        .nest("/pedidos", pedido_routes())
        // Protected routes - audit trail
        .nest("/audit", audit_routes())
}

/// Authentication routes (public except user creation)
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
        .nest("/users", user_routes())
}

/// User management routes (protected)
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_user))
        .route("/me", get(handlers::me))
        .route("/roles", get(handlers::list_roles))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Stock ledger routes (protected)
fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/items", post(handlers::create_item))
        .route("/items/:item_id", get(handlers::get_item))
        .route("/items/:item_id/movements", get(handlers::list_movements))
        .route("/domains/:domain/items", get(handlers::list_items))
        .route("/reserve", post(handlers::reserve_stock))
        .route("/return", post(handlers::return_stock))
        .route("/adjust", post(handlers::adjust_stock))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Work order routes (protected)
fn obra_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_obras).post(handlers::create_obra))
        .route("/:obra_id", get(handlers::get_obra).put(handlers::edit_obra))
        .route(
            "/:obra_id/materials",
            get(handlers::list_obra_materials).put(handlers::set_obra_materials),
        )
        .route(
            "/:obra_id/reservations",
            get(handlers::list_obra_reservations),
        )
        .route("/:obra_id/pedidos", get(handlers::list_obra_pedidos))
        .route("/:obra_id/pedidos/generate", post(handlers::generate_pedido))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Purchase order routes (protected)
fn pedido_routes() -> Router<AppState> {
    Router::new()
        .route("/pending", get(handlers::list_pending_pedidos))
        .route("/:pedido_id", get(handlers::get_pedido))
        .route("/:pedido_id/receive", put(handlers::receive_pedido))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Audit trail routes (protected)
fn audit_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_audit_events))
        .route("/modules/:module", get(handlers::list_audit_events_by_module))
        .route_layer(middleware::from_fn(auth_middleware))
}
