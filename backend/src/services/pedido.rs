//! Pedido (purchase order) engine
//!
//! Generation walks the obra's bill of materials and orders only what is
//! missing after counting active reservations and stock on hand. The line
//! prices are snapshotted at generation time; the estimated total of an
//! existing pedido is never re-derived from current prices.
//!
//! Receipt is the terminal transition: it credits every line back into the
//! ledger and marks the pedido received, all in one transaction.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use shared::ledger;
use shared::models::{MovementKind, Pedido, PedidoLine, PedidoState, StockDomain};
use shared::types::Pagination;

use crate::error::{AppError, AppResult};
use crate::events::{self, DomainEvent, EventSender};
use crate::services::stock::StockService;
use crate::services::{is_transient_conflict, TX_RETRIES};

/// Pedido service for generating and receiving purchase orders
#[derive(Clone)]
pub struct PedidoService {
    db: PgPool,
    events: EventSender,
}

/// A pedido together with its lines
#[derive(Debug, serde::Serialize)]
pub struct PedidoWithLines {
    #[serde(flatten)]
    pub pedido: Pedido,
    pub lines: Vec<PedidoLine>,
}

/// Row for pedido queries
#[derive(Debug, FromRow)]
struct PedidoRow {
    id: Uuid,
    obra_id: Uuid,
    state: String,
    estimated_total: Decimal,
    issued_at: DateTime<Utc>,
    received_at: Option<DateTime<Utc>>,
}

impl PedidoRow {
    fn into_pedido(self) -> AppResult<Pedido> {
        Ok(Pedido {
            id: self.id,
            obra_id: self.obra_id,
            state: PedidoState::from_str(&self.state).map_err(AppError::Internal)?,
            estimated_total: self.estimated_total,
            issued_at: self.issued_at,
            received_at: self.received_at,
        })
    }
}

/// Row for pedido line queries
#[derive(Debug, FromRow)]
struct PedidoLineRow {
    id: Uuid,
    pedido_id: Uuid,
    item_id: Uuid,
    domain: String,
    quantity: i64,
    unit_price: Decimal,
}

impl PedidoLineRow {
    fn into_line(self) -> AppResult<PedidoLine> {
        Ok(PedidoLine {
            id: self.id,
            pedido_id: self.pedido_id,
            item_id: self.item_id,
            domain: StockDomain::from_str(&self.domain).map_err(AppError::Internal)?,
            quantity: self.quantity,
            unit_price: self.unit_price,
        })
    }
}

/// One material line joined with its reservation and stock counts
#[derive(Debug, FromRow)]
struct ShortfallRow {
    item_id: Uuid,
    domain: String,
    quantity_required: i64,
    reserved: i64,
    available: i64,
    unit_price: Decimal,
}

const PEDIDO_COLUMNS: &str = "id, obra_id, state, estimated_total, issued_at, received_at";

const LINE_COLUMNS: &str = "id, pedido_id, item_id, domain, quantity, unit_price";

impl PedidoService {
    /// Create a new PedidoService instance
    pub fn new(db: PgPool, events: EventSender) -> Self {
        Self { db, events }
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Generate a pedido covering the current shortfalls of an obra
    ///
    /// Each bill-of-materials line contributes
    /// `max(0, required - reserved - available)` units at the item's current
    /// unit price. With no positive shortfall there is nothing to order and
    /// no pedido is created. Shortfalls are recomputed from live state every
    /// time, so generating twice without stock changing produces two
    /// overlapping pedidos.
    pub async fn generate(&self, obra_id: Uuid) -> AppResult<PedidoWithLines> {
        let mut attempts = 0;
        loop {
            match self.try_generate(obra_id).await {
                Err(e) if is_transient_conflict(&e) && attempts < TX_RETRIES => {
                    attempts += 1;
                    tracing::warn!(
                        attempt = attempts,
                        "retrying pedido generation after transient conflict"
                    );
                }
                result => return result,
            }
        }
    }

    async fn try_generate(&self, obra_id: Uuid) -> AppResult<PedidoWithLines> {
        let mut tx = self.db.begin().await?;

        let obra_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM obras WHERE id = $1)")
                .bind(obra_id)
                .fetch_one(&mut *tx)
                .await?;
        if !obra_exists {
            return Err(AppError::NotFound("Obra".to_string()));
        }

        // One consistent snapshot of required / reserved / on-hand per line.
        let rows = sqlx::query_as::<_, ShortfallRow>(
            r#"
            SELECT
                m.item_id,
                m.domain,
                m.quantity_required,
                COALESCE(
                    (SELECT SUM(r.quantity) FROM reservations r
                     WHERE r.obra_id = m.obra_id
                       AND r.item_id = m.item_id
                       AND r.state = 'active'),
                    0
                )::BIGINT AS reserved,
                i.quantity AS available,
                i.unit_price
            FROM obra_materials m
            JOIN stock_items i ON i.id = m.item_id
            WHERE m.obra_id = $1
            ORDER BY m.item_id ASC
            "#,
        )
        .bind(obra_id)
        .fetch_all(&mut *tx)
        .await?;

        let mut lines: Vec<(Uuid, StockDomain, i64, Decimal)> = Vec::new();
        for row in rows {
            let missing = ledger::shortfall(row.quantity_required, row.reserved, row.available);
            if missing > 0 {
                let domain = StockDomain::from_str(&row.domain).map_err(AppError::Internal)?;
                lines.push((row.item_id, domain, missing, row.unit_price));
            }
        }

        if lines.is_empty() {
            return Err(AppError::NoShortfall(
                "All materials for this obra are covered by reservations and stock on hand"
                    .to_string(),
            ));
        }

        let totals: Vec<(i64, Decimal)> = lines.iter().map(|(_, _, q, p)| (*q, *p)).collect();
        let estimated_total = ledger::order_total(totals.iter());

        let pedido = sqlx::query_as::<_, PedidoRow>(&format!(
            r#"
            INSERT INTO pedidos (obra_id, state, estimated_total)
            VALUES ($1, 'pending', $2)
            RETURNING {}
            "#,
            PEDIDO_COLUMNS
        ))
        .bind(obra_id)
        .bind(estimated_total)
        .fetch_one(&mut *tx)
        .await?;

        let mut saved_lines = Vec::with_capacity(lines.len());
        for (item_id, domain, quantity, unit_price) in &lines {
            let line = sqlx::query_as::<_, PedidoLineRow>(&format!(
                r#"
                INSERT INTO pedido_lines (pedido_id, item_id, domain, quantity, unit_price)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING {}
                "#,
                LINE_COLUMNS
            ))
            .bind(pedido.id)
            .bind(item_id)
            .bind(domain.as_str())
            .bind(quantity)
            .bind(unit_price)
            .fetch_one(&mut *tx)
            .await?;
            saved_lines.push(line.into_line()?);
        }

        tx.commit().await?;

        Ok(PedidoWithLines {
            pedido: pedido.into_pedido()?,
            lines: saved_lines,
        })
    }

    /// Receive a pending pedido, crediting every line into the stock ledger
    pub async fn receive(&self, actor: Uuid, pedido_id: Uuid) -> AppResult<PedidoWithLines> {
        let mut attempts = 0;
        loop {
            match self.try_receive(actor, pedido_id).await {
                Err(e) if is_transient_conflict(&e) && attempts < TX_RETRIES => {
                    attempts += 1;
                    tracing::warn!(
                        attempt = attempts,
                        "retrying pedido receipt after transient conflict"
                    );
                }
                result => return result,
            }
        }
    }

    async fn try_receive(&self, actor: Uuid, pedido_id: Uuid) -> AppResult<PedidoWithLines> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, PedidoRow>(&format!(
            "SELECT {} FROM pedidos WHERE id = $1 FOR UPDATE",
            PEDIDO_COLUMNS
        ))
        .bind(pedido_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Pedido".to_string()))?;

        let state = PedidoState::from_str(&row.state).map_err(AppError::Internal)?;
        let next = state
            .receive()
            .map_err(|msg| AppError::AlreadyReceived(msg.to_string()))?;

        let lines = self.lines_in_tx(&mut tx, pedido_id).await?;

        // Item rows locked in line order so two receipts cannot deadlock.
        let mut new_quantities = Vec::with_capacity(lines.len());
        for line in &lines {
            let current = sqlx::query_scalar::<_, i64>(
                "SELECT quantity FROM stock_items WHERE id = $1 FOR UPDATE",
            )
            .bind(line.item_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Stock item".to_string()))?;

            let updated = current + line.quantity;
            sqlx::query("UPDATE stock_items SET quantity = $1, updated_at = NOW() WHERE id = $2")
                .bind(updated)
                .bind(line.item_id)
                .execute(&mut *tx)
                .await?;

            StockService::append_movement(
                &mut tx,
                line.item_id,
                line.domain,
                MovementKind::Receipt,
                ledger::movement_delta(MovementKind::Receipt, line.quantity),
                actor,
                Some(&format!("pedido {}", pedido_id)),
            )
            .await?;

            new_quantities.push((line.item_id, line.domain, updated));
        }

        let pedido = sqlx::query_as::<_, PedidoRow>(&format!(
            r#"
            UPDATE pedidos
            SET state = $1, received_at = NOW()
            WHERE id = $2
            RETURNING {}
            "#,
            PEDIDO_COLUMNS
        ))
        .bind(next.as_str())
        .bind(pedido_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        for (item_id, domain, quantity) in new_quantities {
            events::publish(
                &self.events,
                DomainEvent::StockChanged {
                    item_id,
                    domain,
                    quantity,
                },
            );
        }
        events::publish(
            &self.events,
            DomainEvent::PedidoReceived {
                pedido_id,
                obra_id: pedido.obra_id,
            },
        );

        Ok(PedidoWithLines {
            pedido: pedido.into_pedido()?,
            lines,
        })
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Get one pedido with its lines
    pub async fn get(&self, pedido_id: Uuid) -> AppResult<PedidoWithLines> {
        let row = sqlx::query_as::<_, PedidoRow>(&format!(
            "SELECT {} FROM pedidos WHERE id = $1",
            PEDIDO_COLUMNS
        ))
        .bind(pedido_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Pedido".to_string()))?;

        let lines = sqlx::query_as::<_, PedidoLineRow>(&format!(
            "SELECT {} FROM pedido_lines WHERE pedido_id = $1 ORDER BY item_id ASC",
            LINE_COLUMNS
        ))
        .bind(pedido_id)
        .fetch_all(&self.db)
        .await?;

        Ok(PedidoWithLines {
            pedido: row.into_pedido()?,
            lines: lines
                .into_iter()
                .map(PedidoLineRow::into_line)
                .collect::<AppResult<_>>()?,
        })
    }

    /// List pedidos of one obra, newest first
    pub async fn list_by_obra(
        &self,
        obra_id: Uuid,
        pagination: &Pagination,
    ) -> AppResult<Vec<Pedido>> {
        let rows = sqlx::query_as::<_, PedidoRow>(&format!(
            r#"
            SELECT {}
            FROM pedidos
            WHERE obra_id = $1
            ORDER BY issued_at DESC
            LIMIT $2 OFFSET $3
            "#,
            PEDIDO_COLUMNS
        ))
        .bind(obra_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(PedidoRow::into_pedido).collect()
    }

    /// List pending pedidos across all obras, oldest first
    pub async fn list_pending(&self, pagination: &Pagination) -> AppResult<Vec<Pedido>> {
        let rows = sqlx::query_as::<_, PedidoRow>(&format!(
            r#"
            SELECT {}
            FROM pedidos
            WHERE state = 'pending'
            ORDER BY issued_at ASC
            LIMIT $1 OFFSET $2
            "#,
            PEDIDO_COLUMNS
        ))
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(PedidoRow::into_pedido).collect()
    }

    async fn lines_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        pedido_id: Uuid,
    ) -> AppResult<Vec<PedidoLine>> {
        let rows = sqlx::query_as::<_, PedidoLineRow>(&format!(
            "SELECT {} FROM pedido_lines WHERE pedido_id = $1 ORDER BY item_id ASC",
            LINE_COLUMNS
        ))
        .bind(pedido_id)
        .fetch_all(&mut **tx)
        .await?;

        rows.into_iter().map(PedidoLineRow::into_line).collect()
    }
}
