//! Pedido (purchase order) models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::StockDomain;

/// Purchase-order state machine: pending -> received, terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PedidoState {
    Pending,
    Received,
}

impl PedidoState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PedidoState::Pending => "pending",
            PedidoState::Received => "received",
        }
    }

    /// Attempt the pending -> received transition
    pub fn receive(&self) -> Result<PedidoState, &'static str> {
        match self {
            PedidoState::Pending => Ok(PedidoState::Received),
            PedidoState::Received => Err("Pedido has already been received"),
        }
    }
}

impl std::str::FromStr for PedidoState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PedidoState::Pending),
            "received" => Ok(PedidoState::Received),
            other => Err(format!("Unknown pedido state: {}", other)),
        }
    }
}

/// A purchase order covering the shortfalls of one obra
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pedido {
    pub id: Uuid,
    pub obra_id: Uuid,
    pub state: PedidoState,
    /// Price snapshot taken at creation time, never re-derived
    pub estimated_total: Decimal,
    pub issued_at: DateTime<Utc>,
    pub received_at: Option<DateTime<Utc>>,
}

/// One line of a pedido, covering the shortfall of a single item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PedidoLine {
    pub id: Uuid,
    pub pedido_id: Uuid,
    pub item_id: Uuid,
    pub domain: StockDomain,
    pub quantity: i64,
    /// Unit price at creation time
    pub unit_price: Decimal,
}

impl PedidoLine {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_receive_transition() {
        assert_eq!(PedidoState::Pending.receive(), Ok(PedidoState::Received));
        assert!(PedidoState::Received.receive().is_err());
    }

    #[test]
    fn test_line_total() {
        let line = PedidoLine {
            id: Uuid::new_v4(),
            pedido_id: Uuid::new_v4(),
            item_id: Uuid::new_v4(),
            domain: StockDomain::Perfil,
            quantity: 5,
            unit_price: Decimal::from_str("12.30").unwrap(),
        };
        assert_eq!(line.line_total(), Decimal::from_str("61.50").unwrap());
    }
}
