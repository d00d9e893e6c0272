//! Stock ledger tests
//!
//! Covers the reservation, return and adjustment rules plus the
//! conservation invariant: replaying the movement log over the initial
//! quantity always reproduces the stored quantity.

use proptest::prelude::*;

use shared::ledger::{
    check_adjust, check_reserve, check_return, movement_delta, replay, LedgerError,
};
use shared::models::{MovementKind, ReservationState, StockDomain};

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_domains_are_fixed() {
        assert_eq!(StockDomain::ALL.len(), 3);
        for domain in StockDomain::ALL {
            // Round-trips through its storage string
            assert_eq!(StockDomain::from_str(domain.as_str()), Ok(domain));
        }
        assert!(StockDomain::from_str("madera").is_err());
    }

    #[test]
    fn test_reserve_decrements_available() {
        assert_eq!(check_reserve(10, 4), Ok(6));
        assert_eq!(check_reserve(4, 4), Ok(0));
    }

    #[test]
    fn test_reserve_rejects_insufficient_stock() {
        // 5 available, 20 requested: rejected, nothing changes
        assert_eq!(
            check_reserve(5, 20),
            Err(LedgerError::InsufficientStock {
                requested: 20,
                available: 5
            })
        );
    }

    #[test]
    fn test_reserve_rejects_non_positive_quantity() {
        assert_eq!(check_reserve(10, 0), Err(LedgerError::InvalidQuantity));
        assert_eq!(check_reserve(10, -1), Err(LedgerError::InvalidQuantity));
    }

    #[test]
    fn test_partial_return_keeps_reservation_active() {
        // 5 reserved, 3 returned: 2 stay reserved
        assert_eq!(check_return(5, 3), Ok(2));
    }

    #[test]
    fn test_full_return_clears_reservation() {
        assert_eq!(check_return(5, 5), Ok(0));
    }

    #[test]
    fn test_over_return_rejected() {
        // 2 reserved, 3 requested back
        assert_eq!(
            check_return(2, 3),
            Err(LedgerError::OverReturn {
                requested: 3,
                reserved: 2
            })
        );
    }

    #[test]
    fn test_adjust_records_signed_delta() {
        // Breakage count: 5 on hand adjusted to 0 logs -5
        assert_eq!(check_adjust(5, 0), Ok(-5));
        assert_eq!(check_adjust(5, 12), Ok(7));
        assert_eq!(check_adjust(7, 7), Ok(0));
    }

    #[test]
    fn test_adjust_rejects_negative_target() {
        assert_eq!(check_adjust(5, -1), Err(LedgerError::NegativeAdjustment));
    }

    #[test]
    fn test_movement_deltas() {
        assert_eq!(movement_delta(MovementKind::Reserve, 5), -5);
        assert_eq!(movement_delta(MovementKind::Return, 5), 5);
        assert_eq!(movement_delta(MovementKind::Receipt, 5), 5);
    }

    #[test]
    fn test_reservation_states() {
        assert!(ReservationState::Active.is_active());
        assert!(!ReservationState::Returned.is_active());
        assert!(!ReservationState::Consumed.is_active());
    }

    /// A reserve/return cycle leaves the item where it started
    #[test]
    fn test_reserve_then_full_return_restores_quantity() {
        let initial = 10;
        let after_reserve = check_reserve(initial, 4).unwrap();
        assert_eq!(after_reserve, 6);

        let remaining_reserved = check_return(4, 4).unwrap();
        assert_eq!(remaining_reserved, 0);

        let restored = after_reserve + 4;
        assert_eq!(restored, initial);
    }

    /// Replaying the movement log reproduces the stored quantity
    #[test]
    fn test_ledger_replay_conservation() {
        let initial = 20;
        let movements = vec![
            movement_delta(MovementKind::Reserve, 8),
            movement_delta(MovementKind::Return, 3),
            movement_delta(MovementKind::Receipt, 10),
            -5, // adjust 25 -> 20
        ];
        assert_eq!(replay(initial, movements), 20);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn quantity_strategy() -> impl Strategy<Value = i64> {
        1i64..=10_000
    }

    fn stock_strategy() -> impl Strategy<Value = i64> {
        0i64..=10_000
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// A successful reservation never drives the quantity negative
        #[test]
        fn prop_reserve_never_negative(available in stock_strategy(), qty in quantity_strategy()) {
            if let Ok(remaining) = check_reserve(available, qty) {
                prop_assert!(remaining >= 0);
                prop_assert_eq!(remaining, available - qty);
            }
        }

        /// Reserving more than available always fails and changes nothing
        #[test]
        fn prop_overdraw_rejected(available in stock_strategy(), excess in 1i64..=1000) {
            let qty = available + excess;
            prop_assert_eq!(
                check_reserve(available, qty),
                Err(LedgerError::InsufficientStock { requested: qty, available })
            );
        }

        /// Returns never exceed the reserved quantity
        #[test]
        fn prop_return_bounded(reserved in stock_strategy(), qty in quantity_strategy()) {
            match check_return(reserved, qty) {
                Ok(remaining) => {
                    prop_assert!(qty <= reserved);
                    prop_assert!(remaining >= 0);
                }
                Err(LedgerError::OverReturn { .. }) => prop_assert!(qty > reserved),
                Err(e) => prop_assert!(false, "unexpected error: {e}"),
            }
        }

        /// reserve then full return is the identity on the item quantity
        #[test]
        fn prop_reserve_return_roundtrip(available in stock_strategy(), qty in quantity_strategy()) {
            if let Ok(after) = check_reserve(available, qty) {
                check_return(qty, qty).unwrap();
                prop_assert_eq!(after + qty, available);
            }
        }

        /// Replay over any committed sequence of operations matches the
        /// running quantity
        #[test]
        fn prop_replay_matches_running_quantity(
            initial in stock_strategy(),
            ops in prop::collection::vec((0u8..3, quantity_strategy()), 0..20),
        ) {
            let mut quantity = initial;
            let mut reserved = 0i64;
            let mut deltas = Vec::new();

            for (op, qty) in ops {
                match op {
                    // reserve
                    0 => {
                        if let Ok(next) = check_reserve(quantity, qty) {
                            quantity = next;
                            reserved += qty;
                            deltas.push(movement_delta(MovementKind::Reserve, qty));
                        }
                    }
                    // return
                    1 => {
                        if let Ok(left) = check_return(reserved, qty) {
                            reserved = left;
                            quantity += qty;
                            deltas.push(movement_delta(MovementKind::Return, qty));
                        }
                    }
                    // adjust to an absolute value
                    _ => {
                        let delta = check_adjust(quantity, qty).unwrap();
                        quantity = qty;
                        deltas.push(delta);
                    }
                }
            }

            prop_assert_eq!(replay(initial, deltas), quantity);
        }
    }
}
