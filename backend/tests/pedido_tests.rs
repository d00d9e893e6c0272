//! Pedido (purchase order) tests
//!
//! Covers shortfall computation, the price snapshot on order lines, and the
//! pending -> received terminal state machine.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::ledger::{order_total, shortfall};
use shared::models::{PedidoState, StockDomain};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;
    use shared::models::PedidoLine;
    use uuid::Uuid;

    #[test]
    fn test_shortfall_covers_the_gap() {
        // Needs 10, reserved 3, 2 on the shelf: order 5
        assert_eq!(shortfall(10, 3, 2), 5);
    }

    #[test]
    fn test_shortfall_zero_when_covered() {
        assert_eq!(shortfall(10, 10, 0), 0);
        assert_eq!(shortfall(10, 4, 6), 0);
        assert_eq!(shortfall(4, 0, 100), 0);
    }

    #[test]
    fn test_shortfall_never_negative() {
        // Surplus never produces a negative order line
        assert_eq!(shortfall(1, 50, 50), 0);
    }

    #[test]
    fn test_receive_is_terminal() {
        assert_eq!(PedidoState::Pending.receive(), Ok(PedidoState::Received));
        assert!(PedidoState::Received.receive().is_err());
    }

    #[test]
    fn test_line_total_uses_snapshot_price() {
        let line = PedidoLine {
            id: Uuid::new_v4(),
            pedido_id: Uuid::new_v4(),
            item_id: Uuid::new_v4(),
            domain: StockDomain::Herraje,
            quantity: 3,
            unit_price: dec("4.75"),
        };
        assert_eq!(line.line_total(), dec("14.25"));
    }

    #[test]
    fn test_order_total_sums_lines() {
        let lines = vec![(5i64, dec("12.30")), (2, dec("0.99")), (1, dec("100.00"))];
        assert_eq!(order_total(lines.iter()), dec("163.48"));
    }

    #[test]
    fn test_order_total_empty() {
        let lines: Vec<(i64, Decimal)> = vec![];
        assert_eq!(order_total(lines.iter()), Decimal::ZERO);
    }

    /// Generating against live state twice produces overlapping orders:
    /// the second run sees the same counts and orders the same quantities
    #[test]
    fn test_regeneration_repeats_uncovered_shortfall() {
        let first = shortfall(10, 0, 2);
        // Nothing reserved or received in between
        let second = shortfall(10, 0, 2);
        assert_eq!(first, 8);
        assert_eq!(second, first);
    }

    /// Receipt feeds the ledger, which closes the shortfall
    #[test]
    fn test_receipt_closes_shortfall() {
        let missing = shortfall(10, 3, 2);
        assert_eq!(missing, 5);

        // The received quantity lands as available stock
        let available_after = 2 + missing;
        assert_eq!(shortfall(10, 3, available_after), 0);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn count_strategy() -> impl Strategy<Value = i64> {
        0i64..=10_000
    }

    fn price_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=1_000_000).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Shortfall is never negative and never exceeds the requirement
        #[test]
        fn prop_shortfall_bounds(
            required in count_strategy(),
            reserved in count_strategy(),
            available in count_strategy(),
        ) {
            let s = shortfall(required, reserved, available);
            prop_assert!(s >= 0);
            prop_assert!(s <= required.max(0));
        }

        /// Receiving exactly the shortfall always covers the requirement
        #[test]
        fn prop_receiving_shortfall_covers(
            required in count_strategy(),
            reserved in count_strategy(),
            available in count_strategy(),
        ) {
            let s = shortfall(required, reserved, available);
            prop_assert_eq!(shortfall(required, reserved, available + s), 0);
        }

        /// The order total equals the sum of line totals, exactly
        #[test]
        fn prop_order_total_is_sum_of_lines(
            lines in prop::collection::vec((1i64..=1000, price_strategy()), 0..20),
        ) {
            let expected: Decimal = lines
                .iter()
                .map(|(qty, price)| *price * Decimal::from(*qty))
                .sum();
            prop_assert_eq!(order_total(lines.iter()), expected);
        }

        /// The state machine has exactly one transition and it is one-way
        #[test]
        fn prop_receive_terminal(double_receive in any::<bool>()) {
            let next = PedidoState::Pending.receive().unwrap();
            prop_assert_eq!(next, PedidoState::Received);
            if double_receive {
                prop_assert!(next.receive().is_err());
            }
        }
    }
}
