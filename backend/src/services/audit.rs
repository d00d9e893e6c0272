//! Append-only audit trail
//!
//! Recording is best-effort: a failed insert is logged locally and dropped so
//! the audit step can never mask or replace the outcome of the operation
//! being audited.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::models::{AuditEvent, AuditOutcome};
use shared::types::Pagination;

use crate::error::{AppError, AppResult};

/// Audit service for recording and querying audit events
#[derive(Clone)]
pub struct AuditService {
    db: PgPool,
}

/// Row for audit event queries
#[derive(Debug, FromRow)]
struct AuditEventRow {
    id: Uuid,
    actor: Uuid,
    module: String,
    action: String,
    outcome: String,
    detail: String,
    origin: Option<String>,
    created_at: DateTime<Utc>,
}

impl AuditEventRow {
    fn into_event(self) -> AppResult<AuditEvent> {
        Ok(AuditEvent {
            id: self.id,
            actor: self.actor,
            module: self.module,
            action: self.action,
            outcome: AuditOutcome::from_str(&self.outcome).map_err(AppError::Internal)?,
            detail: self.detail,
            origin: self.origin,
            created_at: self.created_at,
        })
    }
}

impl AuditService {
    /// Create a new AuditService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record one audit event
    ///
    /// Never returns an error: an insert failure is logged and the event is
    /// dropped.
    pub async fn record(
        &self,
        actor: Uuid,
        module: &str,
        action: &str,
        outcome: AuditOutcome,
        detail: &str,
        origin: Option<&str>,
    ) {
        let result = sqlx::query(
            r#"
            INSERT INTO audit_log (actor, module, action, outcome, detail, origin)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(actor)
        .bind(module)
        .bind(action)
        .bind(outcome.as_str())
        .bind(detail)
        .bind(origin)
        .execute(&self.db)
        .await;

        if let Err(e) = result {
            tracing::warn!(
                module,
                action,
                outcome = outcome.as_str(),
                error = %e,
                "audit write failed, event dropped"
            );
        }
    }

    /// List recent audit events, newest first
    pub async fn list_recent(&self, pagination: &Pagination) -> AppResult<Vec<AuditEvent>> {
        let rows = sqlx::query_as::<_, AuditEventRow>(
            r#"
            SELECT id, actor, module, action, outcome, detail, origin, created_at
            FROM audit_log
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(AuditEventRow::into_event).collect()
    }

    /// List audit events for one module, newest first
    pub async fn list_by_module(
        &self,
        module: &str,
        pagination: &Pagination,
    ) -> AppResult<Vec<AuditEvent>> {
        let rows = sqlx::query_as::<_, AuditEventRow>(
            r#"
            SELECT id, actor, module, action, outcome, detail, origin, created_at
            FROM audit_log
            WHERE module = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(module)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(AuditEventRow::into_event).collect()
    }
}
