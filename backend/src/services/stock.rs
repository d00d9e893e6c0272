//! Stock ledger and reservation service
//!
//! Owns all quantity mutations for the three stock domains. Every mutating
//! operation runs in one transaction with the touched rows locked
//! (`SELECT ... FOR UPDATE`), re-validating its checks under the lock, and
//! appends exactly one movement-log entry alongside the item update.
//!
//! Operations are not idempotent: calling reserve or adjust twice applies
//! twice. Callers must re-check state instead of retrying blindly; only
//! transient serialization conflicts are retried here.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use shared::ledger::{self, LedgerError};
use shared::models::{
    MovementKind, Reservation, ReservationState, StockDomain, StockItem, StockMovement,
};
use shared::types::Pagination;

use crate::error::{AppError, AppResult};
use crate::events::{self, DomainEvent, EventSender};
use crate::services::{is_transient_conflict, TX_RETRIES};

/// Stock service for reservations, returns, adjustments and ledger queries
#[derive(Clone)]
pub struct StockService {
    db: PgPool,
    events: EventSender,
}

/// Input for reserving stock against an obra
#[derive(Debug, Deserialize)]
pub struct ReserveInput {
    pub obra_id: Uuid,
    pub item_id: Uuid,
    pub domain: StockDomain,
    pub quantity: i64,
}

/// Input for returning reserved stock
#[derive(Debug, Deserialize)]
pub struct ReturnInput {
    pub obra_id: Uuid,
    pub item_id: Uuid,
    pub domain: StockDomain,
    pub quantity: i64,
}

/// Input for an absolute stock adjustment
#[derive(Debug, Deserialize)]
pub struct AdjustInput {
    pub item_id: Uuid,
    pub domain: StockDomain,
    pub new_quantity: i64,
    pub reason: String,
}

/// Input for registering a new stock item
#[derive(Debug, Deserialize)]
pub struct CreateItemInput {
    pub domain: StockDomain,
    pub code: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Decimal,
}

/// Row for stock item queries
#[derive(Debug, FromRow)]
struct StockItemRow {
    id: Uuid,
    domain: String,
    code: String,
    name: String,
    quantity: i64,
    unit_price: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StockItemRow {
    fn into_item(self) -> AppResult<StockItem> {
        Ok(StockItem {
            id: self.id,
            domain: StockDomain::from_str(&self.domain).map_err(AppError::Internal)?,
            code: self.code,
            name: self.name,
            quantity: self.quantity,
            unit_price: self.unit_price,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Row for reservation queries
#[derive(Debug, FromRow)]
struct ReservationRow {
    id: Uuid,
    obra_id: Uuid,
    item_id: Uuid,
    domain: String,
    quantity: i64,
    state: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ReservationRow {
    fn into_reservation(self) -> AppResult<Reservation> {
        Ok(Reservation {
            id: self.id,
            obra_id: self.obra_id,
            item_id: self.item_id,
            domain: StockDomain::from_str(&self.domain).map_err(AppError::Internal)?,
            quantity: self.quantity,
            state: ReservationState::from_str(&self.state).map_err(AppError::Internal)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Row for movement queries
#[derive(Debug, FromRow)]
struct MovementRow {
    id: Uuid,
    item_id: Uuid,
    domain: String,
    kind: String,
    delta: i64,
    actor: Uuid,
    note: Option<String>,
    created_at: DateTime<Utc>,
}

impl MovementRow {
    fn into_movement(self) -> AppResult<StockMovement> {
        Ok(StockMovement {
            id: self.id,
            item_id: self.item_id,
            domain: StockDomain::from_str(&self.domain).map_err(AppError::Internal)?,
            kind: MovementKind::from_str(&self.kind).map_err(AppError::Internal)?,
            delta: self.delta,
            actor: self.actor,
            note: self.note,
            created_at: self.created_at,
        })
    }
}

const ITEM_COLUMNS: &str =
    "id, domain, code, name, quantity, unit_price, created_at, updated_at";

const RESERVATION_COLUMNS: &str =
    "id, obra_id, item_id, domain, quantity, state, created_at, updated_at";

impl StockService {
    /// Create a new StockService instance
    pub fn new(db: PgPool, events: EventSender) -> Self {
        Self { db, events }
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Reserve stock for an obra
    ///
    /// Validation order: quantity, obra existence, item existence, stock
    /// sufficiency, duplicate active reservation. Decrements the item,
    /// creates the reservation and appends one movement, all in one
    /// transaction.
    pub async fn reserve(&self, actor: Uuid, input: ReserveInput) -> AppResult<Reservation> {
        if input.quantity <= 0 {
            return Err(invalid_quantity("quantity"));
        }

        let mut attempts = 0;
        loop {
            match self.try_reserve(actor, &input).await {
                Err(e) if is_transient_conflict(&e) && attempts < TX_RETRIES => {
                    attempts += 1;
                    tracing::warn!(attempt = attempts, "retrying reserve after transient conflict");
                }
                result => return result,
            }
        }
    }

    async fn try_reserve(&self, actor: Uuid, input: &ReserveInput) -> AppResult<Reservation> {
        let mut tx = self.db.begin().await?;

        let obra_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM obras WHERE id = $1)")
                .bind(input.obra_id)
                .fetch_one(&mut *tx)
                .await?;
        if !obra_exists {
            return Err(AppError::NotFound("Obra".to_string()));
        }

        let item = Self::lock_item(&mut tx, input.item_id, input.domain).await?;

        let new_quantity = ledger::check_reserve(item.quantity, input.quantity)
            .map_err(|e| ledger_error(&item.code, e))?;

        let duplicate = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM reservations
                WHERE obra_id = $1 AND item_id = $2 AND state = 'active'
            )
            "#,
        )
        .bind(input.obra_id)
        .bind(input.item_id)
        .fetch_one(&mut *tx)
        .await?;
        if duplicate {
            return Err(AppError::DuplicateReservation(format!(
                "Item {} already has an active reservation for this obra",
                item.code
            )));
        }

        Self::set_item_quantity(&mut tx, input.item_id, new_quantity).await?;

        let reservation = sqlx::query_as::<_, ReservationRow>(&format!(
            r#"
            INSERT INTO reservations (obra_id, item_id, domain, quantity, state)
            VALUES ($1, $2, $3, $4, 'active')
            RETURNING {}
            "#,
            RESERVATION_COLUMNS
        ))
        .bind(input.obra_id)
        .bind(input.item_id)
        .bind(input.domain.as_str())
        .bind(input.quantity)
        .fetch_one(&mut *tx)
        .await?;

        Self::append_movement(
            &mut tx,
            input.item_id,
            input.domain,
            MovementKind::Reserve,
            ledger::movement_delta(MovementKind::Reserve, input.quantity),
            actor,
            Some(&format!("obra {}", input.obra_id)),
        )
        .await?;

        tx.commit().await?;

        events::publish(
            &self.events,
            DomainEvent::StockChanged {
                item_id: input.item_id,
                domain: input.domain,
                quantity: new_quantity,
            },
        );

        reservation.into_reservation()
    }

    /// Return previously reserved stock to the ledger
    pub async fn return_stock(&self, actor: Uuid, input: ReturnInput) -> AppResult<()> {
        if input.quantity <= 0 {
            return Err(invalid_quantity("quantity"));
        }

        let mut attempts = 0;
        loop {
            match self.try_return(actor, &input).await {
                Err(e) if is_transient_conflict(&e) && attempts < TX_RETRIES => {
                    attempts += 1;
                    tracing::warn!(attempt = attempts, "retrying return after transient conflict");
                }
                result => return result,
            }
        }
    }

    async fn try_return(&self, actor: Uuid, input: &ReturnInput) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let item = Self::lock_item(&mut tx, input.item_id, input.domain).await?;

        let reservation = sqlx::query_as::<_, ReservationRow>(&format!(
            r#"
            SELECT {}
            FROM reservations
            WHERE obra_id = $1 AND item_id = $2 AND state = 'active'
            FOR UPDATE
            "#,
            RESERVATION_COLUMNS
        ))
        .bind(input.obra_id)
        .bind(input.item_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::NoPriorReservation(format!(
                "No active reservation of item {} for this obra",
                item.code
            ))
        })?;

        let remaining = ledger::check_return(reservation.quantity, input.quantity)
            .map_err(|e| ledger_error(&item.code, e))?;

        Self::set_item_quantity(&mut tx, input.item_id, item.quantity + input.quantity).await?;

        let state = if remaining == 0 { "returned" } else { "active" };
        sqlx::query(
            "UPDATE reservations SET quantity = $1, state = $2, updated_at = NOW() WHERE id = $3",
        )
        .bind(remaining)
        .bind(state)
        .bind(reservation.id)
        .execute(&mut *tx)
        .await?;

        Self::append_movement(
            &mut tx,
            input.item_id,
            input.domain,
            MovementKind::Return,
            ledger::movement_delta(MovementKind::Return, input.quantity),
            actor,
            Some(&format!("obra {}", input.obra_id)),
        )
        .await?;

        tx.commit().await?;

        events::publish(
            &self.events,
            DomainEvent::StockChanged {
                item_id: input.item_id,
                domain: input.domain,
                quantity: item.quantity + input.quantity,
            },
        );

        Ok(())
    }

    /// Set the absolute quantity of an item, recording the signed delta
    pub async fn adjust(&self, actor: Uuid, input: AdjustInput) -> AppResult<()> {
        if input.new_quantity < 0 {
            return Err(invalid_quantity("new_quantity"));
        }

        let mut attempts = 0;
        loop {
            match self.try_adjust(actor, &input).await {
                Err(e) if is_transient_conflict(&e) && attempts < TX_RETRIES => {
                    attempts += 1;
                    tracing::warn!(attempt = attempts, "retrying adjust after transient conflict");
                }
                result => return result,
            }
        }
    }

    async fn try_adjust(&self, actor: Uuid, input: &AdjustInput) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let item = Self::lock_item(&mut tx, input.item_id, input.domain).await?;

        let delta = ledger::check_adjust(item.quantity, input.new_quantity)
            .map_err(|e| ledger_error(&item.code, e))?;

        Self::set_item_quantity(&mut tx, input.item_id, input.new_quantity).await?;

        Self::append_movement(
            &mut tx,
            input.item_id,
            input.domain,
            MovementKind::Adjust,
            delta,
            actor,
            Some(&input.reason),
        )
        .await?;

        tx.commit().await?;

        events::publish(
            &self.events,
            DomainEvent::StockChanged {
                item_id: input.item_id,
                domain: input.domain,
                quantity: input.new_quantity,
            },
        );

        Ok(())
    }

    /// Register a new stock item
    pub async fn create_item(&self, input: CreateItemInput) -> AppResult<StockItem> {
        shared::validation::validate_item_code(&input.code).map_err(|msg| {
            AppError::Validation {
                field: "code".to_string(),
                message: msg.to_string(),
                message_es: "Código de artículo no válido".to_string(),
            }
        })?;
        if input.quantity < 0 {
            return Err(invalid_quantity("quantity"));
        }
        if input.unit_price < Decimal::ZERO {
            return Err(AppError::Validation {
                field: "unit_price".to_string(),
                message: "Unit price must not be negative".to_string(),
                message_es: "El precio unitario no puede ser negativo".to_string(),
            });
        }

        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM stock_items WHERE domain = $1 AND code = $2",
        )
        .bind(input.domain.as_str())
        .bind(&input.code)
        .fetch_one(&self.db)
        .await?;
        if existing > 0 {
            return Err(AppError::Conflict {
                resource: "stock_item".to_string(),
                message: "An item with this code already exists in the domain".to_string(),
                message_es: "Ya existe un artículo con este código en el dominio".to_string(),
            });
        }

        let row = sqlx::query_as::<_, StockItemRow>(&format!(
            r#"
            INSERT INTO stock_items (domain, code, name, quantity, unit_price)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(input.domain.as_str())
        .bind(&input.code)
        .bind(&input.name)
        .bind(input.quantity)
        .bind(input.unit_price)
        .fetch_one(&self.db)
        .await?;

        row.into_item()
    }

    // ------------------------------------------------------------------
    // Queries (read-only, non-locking)
    // ------------------------------------------------------------------

    /// Get one stock item
    pub async fn get_item(&self, item_id: Uuid) -> AppResult<StockItem> {
        let row = sqlx::query_as::<_, StockItemRow>(&format!(
            "SELECT {} FROM stock_items WHERE id = $1",
            ITEM_COLUMNS
        ))
        .bind(item_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock item".to_string()))?;

        row.into_item()
    }

    /// List items of one domain, ordered by code
    pub async fn list_items(&self, domain: StockDomain) -> AppResult<Vec<StockItem>> {
        let rows = sqlx::query_as::<_, StockItemRow>(&format!(
            "SELECT {} FROM stock_items WHERE domain = $1 ORDER BY code ASC",
            ITEM_COLUMNS
        ))
        .bind(domain.as_str())
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(StockItemRow::into_item).collect()
    }

    /// Movement history of one item, newest first
    pub async fn list_movements(
        &self,
        item_id: Uuid,
        pagination: &Pagination,
    ) -> AppResult<Vec<StockMovement>> {
        let rows = sqlx::query_as::<_, MovementRow>(
            r#"
            SELECT id, item_id, domain, kind, delta, actor, note, created_at
            FROM stock_movements
            WHERE item_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(item_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(MovementRow::into_movement).collect()
    }

    /// Active reservations of one obra
    pub async fn list_reservations(&self, obra_id: Uuid) -> AppResult<Vec<Reservation>> {
        let rows = sqlx::query_as::<_, ReservationRow>(&format!(
            r#"
            SELECT {}
            FROM reservations
            WHERE obra_id = $1 AND state = 'active'
            ORDER BY created_at ASC
            "#,
            RESERVATION_COLUMNS
        ))
        .bind(obra_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(ReservationRow::into_reservation)
            .collect()
    }

    // ------------------------------------------------------------------
    // Transaction helpers
    // ------------------------------------------------------------------

    async fn lock_item(
        tx: &mut Transaction<'_, Postgres>,
        item_id: Uuid,
        domain: StockDomain,
    ) -> AppResult<StockItemRow> {
        sqlx::query_as::<_, StockItemRow>(&format!(
            "SELECT {} FROM stock_items WHERE id = $1 AND domain = $2 FOR UPDATE",
            ITEM_COLUMNS
        ))
        .bind(item_id)
        .bind(domain.as_str())
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock item".to_string()))
    }

    async fn set_item_quantity(
        tx: &mut Transaction<'_, Postgres>,
        item_id: Uuid,
        quantity: i64,
    ) -> AppResult<()> {
        sqlx::query("UPDATE stock_items SET quantity = $1, updated_at = NOW() WHERE id = $2")
            .bind(quantity)
            .bind(item_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    pub(crate) async fn append_movement(
        tx: &mut Transaction<'_, Postgres>,
        item_id: Uuid,
        domain: StockDomain,
        kind: MovementKind,
        delta: i64,
        actor: Uuid,
        note: Option<&str>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO stock_movements (item_id, domain, kind, delta, actor, note)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(item_id)
        .bind(domain.as_str())
        .bind(kind.as_str())
        .bind(delta)
        .bind(actor)
        .bind(note)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

fn invalid_quantity(field: &str) -> AppError {
    AppError::Validation {
        field: field.to_string(),
        message: "Quantity must be a non-negative integer, and positive for reservations and returns"
            .to_string(),
        message_es: "La cantidad debe ser un entero no negativo, y positivo para reservas y devoluciones"
            .to_string(),
    }
}

fn ledger_error(item_code: &str, err: LedgerError) -> AppError {
    match err {
        LedgerError::InvalidQuantity => invalid_quantity("quantity"),
        LedgerError::InsufficientStock {
            requested,
            available,
        } => AppError::InsufficientStock(format!(
            "Item {}: requested {}, available {}",
            item_code, requested, available
        )),
        LedgerError::OverReturn {
            requested,
            reserved,
        } => AppError::OverReturn(format!(
            "Item {}: requested {}, reserved {}",
            item_code, requested, reserved
        )),
        LedgerError::NegativeAdjustment => invalid_quantity("new_quantity"),
    }
}
