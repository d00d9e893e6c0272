//! Stock ledger models
//!
//! Stock is split into three domains (profiles, hardware, glass) that share
//! one item table and one movement log. Quantities are integers; prices are
//! fixed-point decimals.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The three resource domains of the workshop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockDomain {
    /// Aluminum/PVC profiles
    Perfil,
    /// Hardware (hinges, handles, locks)
    Herraje,
    /// Glass panes
    Vidrio,
}

impl StockDomain {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockDomain::Perfil => "perfil",
            StockDomain::Herraje => "herraje",
            StockDomain::Vidrio => "vidrio",
        }
    }

    pub const ALL: [StockDomain; 3] =
        [StockDomain::Perfil, StockDomain::Herraje, StockDomain::Vidrio];
}

impl std::str::FromStr for StockDomain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "perfil" => Ok(StockDomain::Perfil),
            "herraje" => Ok(StockDomain::Herraje),
            "vidrio" => Ok(StockDomain::Vidrio),
            other => Err(format!("Unknown stock domain: {}", other)),
        }
    }
}

/// Kind of quantity-changing event in the movement log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Reserve,
    Return,
    Adjust,
    Receipt,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Reserve => "reserve",
            MovementKind::Return => "return",
            MovementKind::Adjust => "adjust",
            MovementKind::Receipt => "receipt",
        }
    }
}

impl std::str::FromStr for MovementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reserve" => Ok(MovementKind::Reserve),
            "return" => Ok(MovementKind::Return),
            "adjust" => Ok(MovementKind::Adjust),
            "receipt" => Ok(MovementKind::Receipt),
            other => Err(format!("Unknown movement kind: {}", other)),
        }
    }
}

/// Lifecycle of a reservation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationState {
    Active,
    Returned,
    Consumed,
}

impl ReservationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationState::Active => "active",
            ReservationState::Returned => "returned",
            ReservationState::Consumed => "consumed",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, ReservationState::Active)
    }
}

impl std::str::FromStr for ReservationState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ReservationState::Active),
            "returned" => Ok(ReservationState::Returned),
            "consumed" => Ok(ReservationState::Consumed),
            other => Err(format!("Unknown reservation state: {}", other)),
        }
    }
}

/// A stock item in one of the three domains
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockItem {
    pub id: Uuid,
    pub domain: StockDomain,
    pub code: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Immutable entry in the movement log; one per committed item mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: Uuid,
    pub item_id: Uuid,
    pub domain: StockDomain,
    pub kind: MovementKind,
    /// Signed quantity change applied to the item
    pub delta: i64,
    pub actor: Uuid,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A claim against available stock for a specific obra
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub obra_id: Uuid,
    pub item_id: Uuid,
    pub domain: StockDomain,
    pub quantity: i64,
    pub state: ReservationState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
