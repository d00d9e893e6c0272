//! Error handling for the Taller Window & Door Management Platform
//!
//! Provides consistent error responses in Spanish and English

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String, message_es: String },

    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_es: String,
    },

    #[error("Conflict: {message}")]
    Conflict {
        resource: String,
        message: String,
        message_es: String,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Concurrency errors
    #[error("Stale version: expected {expected}, current {current}")]
    StaleVersion { expected: i64, current: i64 },

    // Stock ledger errors
    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Duplicate reservation: {0}")]
    DuplicateReservation(String),

    #[error("No prior reservation: {0}")]
    NoPriorReservation(String),

    #[error("Over-return: {0}")]
    OverReturn(String),

    // Order engine errors
    #[error("No shortfall: {0}")]
    NoShortfall(String),

    #[error("Pedido already received: {0}")]
    AlreadyReceived(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_es: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::InsufficientPermissions => (
                StatusCode::FORBIDDEN,
                ErrorDetail {
                    code: "INSUFFICIENT_PERMISSIONS".to_string(),
                    message_en: "You do not have permission to perform this action".to_string(),
                    message_es: "No tiene permiso para realizar esta acción".to_string(),
                    field: None,
                },
            ),
            AppError::Unauthorized {
                message,
                message_es,
            } => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail {
                    code: "UNAUTHORIZED".to_string(),
                    message_en: message.clone(),
                    message_es: message_es.clone(),
                    field: None,
                },
            ),
            AppError::Validation {
                field,
                message,
                message_es,
            } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message_en: message.clone(),
                    message_es: message_es.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::Conflict {
                resource,
                message,
                message_es,
            } => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "CONFLICT".to_string(),
                    message_en: message.clone(),
                    message_es: message_es.clone(),
                    field: Some(resource.clone()),
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message_en: format!("{} not found", resource),
                    message_es: format!("No se encontró {}", resource),
                    field: None,
                },
            ),
            AppError::StaleVersion { expected, current } => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "STALE_VERSION".to_string(),
                    message_en: format!(
                        "Data changed by another user (expected version {}, current {}), please reload and retry",
                        expected, current
                    ),
                    message_es: format!(
                        "Los datos fueron modificados por otro usuario (versión esperada {}, actual {}), recargue e intente de nuevo",
                        expected, current
                    ),
                    field: None,
                },
            ),
            AppError::InsufficientStock(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INSUFFICIENT_STOCK".to_string(),
                    message_en: msg.clone(),
                    message_es: format!("Stock insuficiente: {}", msg),
                    field: None,
                },
            ),
            AppError::DuplicateReservation(msg) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "DUPLICATE_RESERVATION".to_string(),
                    message_en: msg.clone(),
                    message_es: format!("Reserva duplicada: {}", msg),
                    field: None,
                },
            ),
            AppError::NoPriorReservation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "NO_PRIOR_RESERVATION".to_string(),
                    message_en: msg.clone(),
                    message_es: format!("No existe una reserva activa: {}", msg),
                    field: None,
                },
            ),
            AppError::OverReturn(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "OVER_RETURN".to_string(),
                    message_en: msg.clone(),
                    message_es: format!("Devolución mayor que la reserva: {}", msg),
                    field: None,
                },
            ),
            AppError::NoShortfall(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "NO_SHORTFALL".to_string(),
                    message_en: msg.clone(),
                    message_es: format!("No hay faltantes que pedir: {}", msg),
                    field: None,
                },
            ),
            AppError::AlreadyReceived(msg) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "ALREADY_RECEIVED".to_string(),
                    message_en: msg.clone(),
                    message_es: format!("El pedido ya fue recibido: {}", msg),
                    field: None,
                },
            ),
            AppError::InvalidStateTransition(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INVALID_STATE_TRANSITION".to_string(),
                    message_en: msg.clone(),
                    message_es: format!("No se puede cambiar el estado: {}", msg),
                    field: None,
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message_en: "A database error occurred, please retry later".to_string(),
                    message_es: "Ocurrió un error de base de datos, intente más tarde".to_string(),
                    field: None,
                },
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: msg.clone(),
                    message_es: "Error interno del servidor".to_string(),
                    field: None,
                },
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: "An internal server error occurred".to_string(),
                    message_es: "Error interno del servidor".to_string(),
                    field: None,
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
