//! Property-based tests for creation validation.

use proptest::prelude::*;
use rust_decimal::Decimal;
use stockflow_shared::types::{ItemId, LocationId};

use crate::movement::error::{LocationRole, MovementError};
use crate::movement::line::NewMovementLine;
use crate::movement::types::MovementType;
use crate::movement::validation::validate_creation;

/// Strategy for generating configured movement types.
fn arb_configured_type() -> impl Strategy<Value = MovementType> {
    prop::sample::select(MovementType::CONFIGURED.to_vec())
}

/// Strategy for generating positive quantities with up to 4 decimals.
fn arb_positive_quantity() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000).prop_map(|n| Decimal::new(n, 4))
}

/// Strategy for generating non-positive quantities.
fn arb_non_positive_quantity() -> impl Strategy<Value = Decimal> {
    (-10_000_000i64..=0).prop_map(|n| Decimal::new(n, 4))
}

fn lines(quantities: &[Decimal]) -> Vec<NewMovementLine> {
    quantities
        .iter()
        .map(|quantity| NewMovementLine::new(ItemId::new(), *quantity))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Property 1: Location requirements follow the policy table
    // =========================================================================

    /// Supplying exactly the required locations is accepted.
    #[test]
    fn prop_exact_required_locations_accepted(
        movement_type in arb_configured_type(),
        quantities in prop::collection::vec(arb_positive_quantity(), 1..5),
    ) {
        let config = movement_type.config().unwrap();
        let source = config.requires_source_location.then(LocationId::new);
        let destination = config.requires_destination_location.then(LocationId::new);

        let accepted = validate_creation(movement_type, source, destination, &lines(&quantities));
        prop_assert!(accepted.is_ok());
    }

    /// Dropping any required location is rejected with the right role.
    #[test]
    fn prop_missing_required_location_rejected(
        movement_type in arb_configured_type(),
        quantity in arb_positive_quantity(),
    ) {
        let config = movement_type.config().unwrap();
        let lines = lines(&[quantity]);

        if config.requires_source_location {
            let result = validate_creation(movement_type, None, Some(LocationId::new()), &lines);
            let is_missing = matches!(
                result,
                Err(MovementError::MissingLocation { role: LocationRole::Source, movement_type: t })
                    if t == movement_type
            );
            prop_assert!(is_missing);
        }
        if config.requires_destination_location {
            let result = validate_creation(movement_type, Some(LocationId::new()), None, &lines);
            let is_missing = matches!(
                result,
                Err(MovementError::MissingLocation { role: LocationRole::Destination, .. })
            );
            prop_assert!(is_missing);
        }
    }

    // =========================================================================
    // Property 2: Quantities
    // =========================================================================

    /// The first non-positive line is reported by index.
    #[test]
    fn prop_first_bad_line_reported(
        good in prop::collection::vec(arb_positive_quantity(), 0..4),
        bad in arb_non_positive_quantity(),
        tail in prop::collection::vec(arb_positive_quantity(), 0..4),
    ) {
        let mut quantities = good.clone();
        quantities.push(bad);
        quantities.extend(tail);

        let result = validate_creation(
            MovementType::Transfer,
            Some(LocationId::new()),
            Some(LocationId::new()),
            &lines(&quantities),
        );
        let reported = matches!(
            result,
            Err(MovementError::InvalidQuantity { line_index }) if line_index == good.len()
        );
        prop_assert!(reported);
    }
}
