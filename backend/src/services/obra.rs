//! Obra (work order) service
//!
//! Obras carry a monotonic version counter. Edits must present the version
//! they were based on; a mismatch is rejected as a stale write and the caller
//! reloads instead of silently overwriting a concurrent edit.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use shared::models::{version_matches, Obra, ObraMaterial, ObraState, StockDomain};
use shared::types::Pagination;

use crate::error::{AppError, AppResult};
use crate::services::{is_transient_conflict, TX_RETRIES};

/// Obra service for work order lifecycle and bill of materials
#[derive(Clone)]
pub struct ObraService {
    db: PgPool,
}

/// Input for creating an obra
#[derive(Debug, Deserialize)]
pub struct CreateObraInput {
    pub name: String,
    pub client: String,
}

/// Full-replacement edit carrying the version the editor loaded
#[derive(Debug, Deserialize)]
pub struct EditObraInput {
    pub obra_id: Uuid,
    pub expected_version: i64,
    pub name: String,
    pub client: String,
    pub state: ObraState,
}

/// One bill-of-materials line for an obra
#[derive(Debug, Deserialize)]
pub struct MaterialInput {
    pub item_id: Uuid,
    pub domain: StockDomain,
    pub quantity_required: i64,
}

/// Row for obra queries
#[derive(Debug, FromRow)]
struct ObraRow {
    id: Uuid,
    name: String,
    client: String,
    state: String,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ObraRow {
    fn into_obra(self) -> AppResult<Obra> {
        Ok(Obra {
            id: self.id,
            name: self.name,
            client: self.client,
            state: ObraState::from_str(&self.state).map_err(AppError::Internal)?,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Row for bill-of-materials queries
#[derive(Debug, FromRow)]
struct MaterialRow {
    obra_id: Uuid,
    item_id: Uuid,
    domain: String,
    quantity_required: i64,
}

impl MaterialRow {
    fn into_material(self) -> AppResult<ObraMaterial> {
        Ok(ObraMaterial {
            obra_id: self.obra_id,
            item_id: self.item_id,
            domain: StockDomain::from_str(&self.domain).map_err(AppError::Internal)?,
            quantity_required: self.quantity_required,
        })
    }
}

const OBRA_COLUMNS: &str = "id, name, client, state, version, created_at, updated_at";

impl ObraService {
    /// Create a new ObraService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create an obra in pending state at version 1
    pub async fn create(&self, input: CreateObraInput) -> AppResult<Obra> {
        shared::validation::validate_name(&input.name).map_err(|msg| AppError::Validation {
            field: "name".to_string(),
            message: msg.to_string(),
            message_es: "Nombre de obra no válido".to_string(),
        })?;
        shared::validation::validate_name(&input.client).map_err(|msg| AppError::Validation {
            field: "client".to_string(),
            message: msg.to_string(),
            message_es: "Nombre de cliente no válido".to_string(),
        })?;

        let row = sqlx::query_as::<_, ObraRow>(&format!(
            r#"
            INSERT INTO obras (name, client, state, version)
            VALUES ($1, $2, 'pending', 1)
            RETURNING {}
            "#,
            OBRA_COLUMNS
        ))
        .bind(&input.name)
        .bind(&input.client)
        .fetch_one(&self.db)
        .await?;

        row.into_obra()
    }

    /// Get one obra
    pub async fn get(&self, obra_id: Uuid) -> AppResult<Obra> {
        let row = sqlx::query_as::<_, ObraRow>(&format!(
            "SELECT {} FROM obras WHERE id = $1",
            OBRA_COLUMNS
        ))
        .bind(obra_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Obra".to_string()))?;

        row.into_obra()
    }

    /// List obras, most recently updated first
    pub async fn list(&self, pagination: &Pagination) -> AppResult<Vec<Obra>> {
        let rows = sqlx::query_as::<_, ObraRow>(&format!(
            r#"
            SELECT {}
            FROM obras
            ORDER BY updated_at DESC
            LIMIT $1 OFFSET $2
            "#,
            OBRA_COLUMNS
        ))
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(ObraRow::into_obra).collect()
    }

    /// Apply a full-replacement edit guarded by the version counter
    ///
    /// The edit only lands if the stored version still equals
    /// `expected_version`; the saved row carries `expected_version + 1`.
    pub async fn edit(&self, input: EditObraInput) -> AppResult<Obra> {
        let mut attempts = 0;
        loop {
            match self.try_edit(&input).await {
                Err(e) if is_transient_conflict(&e) && attempts < TX_RETRIES => {
                    attempts += 1;
                    tracing::warn!(attempt = attempts, "retrying obra edit after transient conflict");
                }
                result => return result,
            }
        }
    }

    async fn try_edit(&self, input: &EditObraInput) -> AppResult<Obra> {
        let mut tx = self.db.begin().await?;

        let current = Self::lock_obra(&mut tx, input.obra_id).await?;

        if !version_matches(input.expected_version, current.version) {
            return Err(AppError::StaleVersion {
                expected: input.expected_version,
                current: current.version,
            });
        }

        let current_state = ObraState::from_str(&current.state).map_err(AppError::Internal)?;
        if !current_state.can_transition_to(input.state) {
            return Err(AppError::InvalidStateTransition(format!(
                "Obra cannot move from {} back to {}",
                current_state.as_str(),
                input.state.as_str()
            )));
        }

        let row = sqlx::query_as::<_, ObraRow>(&format!(
            r#"
            UPDATE obras
            SET name = $1, client = $2, state = $3, version = version + 1, updated_at = NOW()
            WHERE id = $4
            RETURNING {}
            "#,
            OBRA_COLUMNS
        ))
        .bind(&input.name)
        .bind(&input.client)
        .bind(input.state.as_str())
        .bind(input.obra_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        row.into_obra()
    }

    /// Replace the bill of materials of an obra
    pub async fn set_materials(
        &self,
        obra_id: Uuid,
        materials: Vec<MaterialInput>,
    ) -> AppResult<Vec<ObraMaterial>> {
        for m in &materials {
            if m.quantity_required <= 0 {
                return Err(AppError::Validation {
                    field: "quantity_required".to_string(),
                    message: "Required quantity must be positive".to_string(),
                    message_es: "La cantidad requerida debe ser positiva".to_string(),
                });
            }
        }

        let mut tx = self.db.begin().await?;

        Self::lock_obra(&mut tx, obra_id).await?;

        sqlx::query("DELETE FROM obra_materials WHERE obra_id = $1")
            .bind(obra_id)
            .execute(&mut *tx)
            .await?;

        for m in &materials {
            sqlx::query(
                r#"
                INSERT INTO obra_materials (obra_id, item_id, domain, quantity_required)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(obra_id)
            .bind(m.item_id)
            .bind(m.domain.as_str())
            .bind(m.quantity_required)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.list_materials(obra_id).await
    }

    /// Bill of materials of one obra
    pub async fn list_materials(&self, obra_id: Uuid) -> AppResult<Vec<ObraMaterial>> {
        let rows = sqlx::query_as::<_, MaterialRow>(
            r#"
            SELECT obra_id, item_id, domain, quantity_required
            FROM obra_materials
            WHERE obra_id = $1
            ORDER BY item_id ASC
            "#,
        )
        .bind(obra_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(MaterialRow::into_material).collect()
    }

    async fn lock_obra(tx: &mut Transaction<'_, Postgres>, obra_id: Uuid) -> AppResult<ObraRow> {
        sqlx::query_as::<_, ObraRow>(&format!(
            "SELECT {} FROM obras WHERE id = $1 FOR UPDATE",
            OBRA_COLUMNS
        ))
        .bind(obra_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Obra".to_string()))
    }
}
