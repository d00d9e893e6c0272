//! Pure stock-ledger rules
//!
//! The backend services run these checks inside row-locked transactions; the
//! functions themselves are side-effect free so the invariants can be tested
//! without a database.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::MovementKind;

/// Rule violations detected before any write happens
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Quantity must be positive")]
    InvalidQuantity,

    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i64, available: i64 },

    #[error("Over-return: requested {requested}, reserved {reserved}")]
    OverReturn { requested: i64, reserved: i64 },

    #[error("Absolute quantity must not be negative")]
    NegativeAdjustment,
}

/// Validate a reservation and return the item quantity after it
pub fn check_reserve(available: i64, quantity: i64) -> Result<i64, LedgerError> {
    if quantity <= 0 {
        return Err(LedgerError::InvalidQuantity);
    }
    if quantity > available {
        return Err(LedgerError::InsufficientStock {
            requested: quantity,
            available,
        });
    }
    Ok(available - quantity)
}

/// Validate a return against an active reservation; returns the quantity
/// still reserved afterwards
pub fn check_return(reserved: i64, quantity: i64) -> Result<i64, LedgerError> {
    if quantity <= 0 {
        return Err(LedgerError::InvalidQuantity);
    }
    if quantity > reserved {
        return Err(LedgerError::OverReturn {
            requested: quantity,
            reserved,
        });
    }
    Ok(reserved - quantity)
}

/// Validate an absolute adjustment and return the movement delta
pub fn check_adjust(current: i64, new_quantity: i64) -> Result<i64, LedgerError> {
    if new_quantity < 0 {
        return Err(LedgerError::NegativeAdjustment);
    }
    Ok(new_quantity - current)
}

/// Signed item delta for a movement of `quantity` units
///
/// Adjust movements carry an explicit delta and do not go through here.
pub fn movement_delta(kind: MovementKind, quantity: i64) -> i64 {
    match kind {
        MovementKind::Reserve => -quantity,
        MovementKind::Return | MovementKind::Receipt => quantity,
        MovementKind::Adjust => quantity,
    }
}

/// Replay a movement history onto an initial quantity
///
/// The conservation invariant: for any committed history, the replayed value
/// equals the stored item quantity.
pub fn replay<I>(initial: i64, deltas: I) -> i64
where
    I: IntoIterator<Item = i64>,
{
    deltas.into_iter().fold(initial, |acc, d| acc + d)
}

/// Shortfall of one material line: what the obra still needs beyond its
/// active reservations and the stock currently on hand
pub fn shortfall(required: i64, reserved: i64, available: i64) -> i64 {
    (required - reserved - available).max(0)
}

/// Estimated total of an order given (quantity, unit price) per line
pub fn order_total<'a, I>(lines: I) -> Decimal
where
    I: IntoIterator<Item = &'a (i64, Decimal)>,
{
    lines
        .into_iter()
        .map(|(qty, price)| *price * Decimal::from(*qty))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_reserve_within_stock() {
        assert_eq!(check_reserve(10, 5), Ok(5));
        assert_eq!(check_reserve(10, 10), Ok(0));
    }

    #[test]
    fn test_reserve_insufficient() {
        assert_eq!(
            check_reserve(5, 20),
            Err(LedgerError::InsufficientStock {
                requested: 20,
                available: 5
            })
        );
    }

    #[test]
    fn test_reserve_invalid_quantity() {
        assert_eq!(check_reserve(10, 0), Err(LedgerError::InvalidQuantity));
        assert_eq!(check_reserve(10, -3), Err(LedgerError::InvalidQuantity));
    }

    #[test]
    fn test_return_within_reservation() {
        assert_eq!(check_return(5, 3), Ok(2));
        assert_eq!(check_return(5, 5), Ok(0));
    }

    #[test]
    fn test_over_return() {
        assert_eq!(
            check_return(2, 3),
            Err(LedgerError::OverReturn {
                requested: 3,
                reserved: 2
            })
        );
    }

    #[test]
    fn test_adjust_delta() {
        assert_eq!(check_adjust(5, 0), Ok(-5));
        assert_eq!(check_adjust(5, 12), Ok(7));
        assert_eq!(check_adjust(5, -5), Err(LedgerError::NegativeAdjustment));
    }

    #[test]
    fn test_movement_delta_signs() {
        assert_eq!(movement_delta(MovementKind::Reserve, 4), -4);
        assert_eq!(movement_delta(MovementKind::Return, 4), 4);
        assert_eq!(movement_delta(MovementKind::Receipt, 4), 4);
    }

    #[test]
    fn test_replay_conservation() {
        // reserve 5, return 2, receipt 10, adjust -3
        let deltas = vec![-5, 2, 10, -3];
        assert_eq!(replay(10, deltas), 14);
    }

    #[test]
    fn test_shortfall() {
        assert_eq!(shortfall(10, 3, 2), 5);
        assert_eq!(shortfall(10, 10, 0), 0);
        // Plenty on hand: nothing to order
        assert_eq!(shortfall(4, 0, 100), 0);
    }

    #[test]
    fn test_order_total_decimal() {
        let lines = vec![(5i64, dec("12.30")), (2, dec("0.99"))];
        assert_eq!(order_total(lines.iter()), dec("63.48"));
    }
}
