//! Business logic services for the Taller Window & Door Management Platform

pub mod audit;
pub mod auth;
pub mod authz;
pub mod obra;
pub mod pedido;
pub mod stock;

pub use audit::AuditService;
pub use auth::AuthService;
pub use authz::AuthzService;
pub use obra::ObraService;
pub use pedido::PedidoService;
pub use stock::StockService;

use crate::error::AppError;

/// Retries allowed for transactions aborted by transient contention
pub(crate) const TX_RETRIES: u32 = 2;

/// Serialization failure or deadlock reported by Postgres; safe to retry
/// the whole operation since nothing was committed
pub(crate) fn is_transient_conflict(err: &AppError) -> bool {
    match err {
        AppError::DatabaseError(sqlx::Error::Database(db)) => {
            matches!(db.code().as_deref(), Some("40001") | Some("40P01"))
        }
        _ => false,
    }
}
