//! Business rule validation for movement creation.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockflow_shared::types::{ItemId, LocationId};
use tracing::{debug, warn};

use crate::movement::config::MovementTypeConfig;
use crate::movement::error::{LocationRole, MovementError};
use crate::movement::line::NewMovementLine;
use crate::movement::ports::{CollaboratorError, StockOracle};
use crate::movement::types::MovementType;

/// Outcome of the advisory stock pre-check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockCheck {
    /// Every line with a source location was confirmed.
    Verified {
        /// Number of lines the oracle confirmed.
        lines_checked: usize,
    },
    /// The oracle could not answer for at least one line; creation proceeds.
    Skipped(String),
    /// The type needs no check, or checking is disabled.
    NotRequired,
    /// A shortage was found and the request chose to proceed anyway.
    Short {
        /// The short item.
        item_id: ItemId,
        /// The location checked.
        location_id: LocationId,
        /// Zero-based index of the first short line.
        line_index: usize,
    },
}

impl StockCheck {
    /// True when the oracle confirmed every checked line.
    #[must_use]
    pub const fn is_verified(&self) -> bool {
        matches!(self, Self::Verified { .. })
    }
}

/// Validates the shape of a movement request against its type's policy.
///
/// Checks run in order: configured type, source location, destination
/// location, non-empty lines, positive requested quantities.
///
/// # Errors
///
/// `UnconfiguredType`, `MissingLocation`, `EmptyLineSet` or
/// `InvalidQuantity` for the first failing rule.
pub fn validate_creation(
    movement_type: MovementType,
    source_location_id: Option<LocationId>,
    destination_location_id: Option<LocationId>,
    lines: &[NewMovementLine],
) -> Result<&'static MovementTypeConfig, MovementError> {
    let config = movement_type.config()?;

    if config.requires_source_location && source_location_id.is_none() {
        return Err(MovementError::MissingLocation {
            movement_type,
            role: LocationRole::Source,
        });
    }
    if config.requires_destination_location && destination_location_id.is_none() {
        return Err(MovementError::MissingLocation {
            movement_type,
            role: LocationRole::Destination,
        });
    }

    if lines.is_empty() {
        return Err(MovementError::EmptyLineSet);
    }

    if let Some(line_index) = lines
        .iter()
        .position(|line| line.requested_quantity <= Decimal::ZERO)
    {
        return Err(MovementError::InvalidQuantity { line_index });
    }

    Ok(config)
}

/// Checks that a reference number is present when the type demands one.
///
/// # Errors
///
/// `MissingReferenceNumber` for an absent or blank reference.
pub fn validate_reference(
    config: &MovementTypeConfig,
    reference_number: Option<&str>,
) -> Result<(), MovementError> {
    let present = reference_number.is_some_and(|reference| !reference.trim().is_empty());
    if config.requires_reference_number && !present {
        return Err(MovementError::MissingReferenceNumber(config.movement_type));
    }
    Ok(())
}

/// Asks the oracle whether each line's effective source holds the requested
/// quantity.
///
/// Lines without a source location are not checked. An oracle failure or
/// timeout on a line is logged and that line is skipped; the remaining lines
/// are still checked.
///
/// # Errors
///
/// `InsufficientStock` for the first line the oracle answers `false` for.
pub async fn validate_stock_availability(
    config: &MovementTypeConfig,
    lines: &[NewMovementLine],
    default_source: Option<LocationId>,
    oracle: &dyn StockOracle,
    timeout: Duration,
    enabled: bool,
) -> Result<StockCheck, MovementError> {
    if !enabled || !config.requires_stock_validation {
        return Ok(StockCheck::NotRequired);
    }

    let mut lines_checked = 0;
    let mut skipped: Option<String> = None;

    for (line_index, line) in lines.iter().enumerate() {
        let Some(location_id) = line.from_location_id.or(default_source) else {
            continue;
        };

        let answer = tokio::time::timeout(
            timeout,
            oracle.has_available_stock(line.item_id, location_id, line.requested_quantity),
        )
        .await;

        match answer {
            Ok(Ok(true)) => lines_checked += 1,
            Ok(Ok(false)) => {
                return Err(MovementError::InsufficientStock {
                    item_id: line.item_id,
                    location_id,
                    line_index,
                });
            }
            Ok(Err(err)) => {
                warn!(line_index, item_id = %line.item_id, error = %err, "Stock check failed, continuing");
                skipped.get_or_insert_with(|| err.to_string());
            }
            Err(_) => {
                let err = CollaboratorError::Timeout(timeout);
                warn!(line_index, item_id = %line.item_id, error = %err, "Stock check timed out, continuing");
                skipped.get_or_insert_with(|| err.to_string());
            }
        }
    }

    debug!(lines_checked, skipped = skipped.is_some(), "Stock pre-check finished");

    Ok(skipped.map_or(StockCheck::Verified { lines_checked }, StockCheck::Skipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;

    struct FixedStock(Decimal);

    #[async_trait]
    impl StockOracle for FixedStock {
        async fn has_available_stock(
            &self,
            _item_id: ItemId,
            _location_id: LocationId,
            quantity: Decimal,
        ) -> Result<bool, CollaboratorError> {
            Ok(self.0 >= quantity)
        }
    }

    struct Offline;

    #[async_trait]
    impl StockOracle for Offline {
        async fn has_available_stock(
            &self,
            _item_id: ItemId,
            _location_id: LocationId,
            _quantity: Decimal,
        ) -> Result<bool, CollaboratorError> {
            Err(CollaboratorError::Unavailable("connection refused".into()))
        }
    }

    struct Slow;

    #[async_trait]
    impl StockOracle for Slow {
        async fn has_available_stock(
            &self,
            _item_id: ItemId,
            _location_id: LocationId,
            _quantity: Decimal,
        ) -> Result<bool, CollaboratorError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(true)
        }
    }

    const TIMEOUT: Duration = Duration::from_millis(50);

    #[test]
    fn test_transfer_requires_both_locations() {
        let lines = vec![NewMovementLine::new(ItemId::new(), dec!(5))];
        let l1 = Some(LocationId::new());
        let l2 = Some(LocationId::new());

        assert!(validate_creation(MovementType::Transfer, l1, l2, &lines).is_ok());
        assert!(matches!(
            validate_creation(MovementType::Transfer, l1, None, &lines),
            Err(MovementError::MissingLocation {
                role: LocationRole::Destination,
                ..
            })
        ));
    }

    #[test]
    fn test_source_checked_before_destination() {
        let lines = vec![NewMovementLine::new(ItemId::new(), dec!(1))];
        assert!(matches!(
            validate_creation(MovementType::Transfer, None, None, &lines),
            Err(MovementError::MissingLocation {
                role: LocationRole::Source,
                ..
            })
        ));
    }

    #[test]
    fn test_empty_lines_and_bad_quantities() {
        let to = Some(LocationId::new());
        assert!(matches!(
            validate_creation(MovementType::Receipt, None, to, &[]),
            Err(MovementError::EmptyLineSet)
        ));

        let lines = vec![
            NewMovementLine::new(ItemId::new(), dec!(1)),
            NewMovementLine::new(ItemId::new(), dec!(0)),
        ];
        assert!(matches!(
            validate_creation(MovementType::Receipt, None, to, &lines),
            Err(MovementError::InvalidQuantity { line_index: 1 })
        ));

        let lines = vec![NewMovementLine::new(ItemId::new(), dec!(-2))];
        assert!(matches!(
            validate_creation(MovementType::Receipt, None, to, &lines),
            Err(MovementError::InvalidQuantity { line_index: 0 })
        ));
    }

    #[test]
    fn test_legacy_types_are_rejected() {
        let lines = vec![NewMovementLine::new(ItemId::new(), dec!(1))];
        let loc = Some(LocationId::new());
        for legacy in [
            MovementType::Inbound,
            MovementType::Outbound,
            MovementType::Shipment,
        ] {
            assert!(matches!(
                validate_creation(legacy, loc, loc, &lines),
                Err(MovementError::UnconfiguredType(t)) if t == legacy
            ));
        }
    }

    #[test]
    fn test_reference_number_rules() {
        let receipt = MovementType::Receipt.config().unwrap();
        let transfer = MovementType::Transfer.config().unwrap();

        assert!(matches!(
            validate_reference(receipt, None),
            Err(MovementError::MissingReferenceNumber(MovementType::Receipt))
        ));
        assert!(validate_reference(receipt, Some("  ")).is_err());
        assert!(validate_reference(receipt, Some("PO-1001")).is_ok());
        assert!(validate_reference(transfer, None).is_ok());
    }

    #[tokio::test]
    async fn test_issue_short_of_stock() {
        let config = MovementType::Issue.config().unwrap();
        let item = ItemId::new();
        let source = LocationId::new();
        let lines = vec![NewMovementLine::new(item, dec!(10))];

        let result = validate_stock_availability(
            config,
            &lines,
            Some(source),
            &FixedStock(dec!(3)),
            TIMEOUT,
            true,
        )
        .await;

        match result {
            Err(MovementError::InsufficientStock {
                item_id,
                location_id,
                line_index,
            }) => {
                assert_eq!(item_id, item);
                assert_eq!(location_id, source);
                assert_eq!(line_index, 0);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stock_verified() {
        let config = MovementType::Transfer.config().unwrap();
        let lines = vec![
            NewMovementLine::new(ItemId::new(), dec!(2)),
            NewMovementLine::new(ItemId::new(), dec!(3)),
        ];

        let check = validate_stock_availability(
            config,
            &lines,
            Some(LocationId::new()),
            &FixedStock(dec!(3)),
            TIMEOUT,
            true,
        )
        .await
        .unwrap();

        assert_eq!(check, StockCheck::Verified { lines_checked: 2 });
    }

    #[tokio::test]
    async fn test_lines_without_source_are_not_checked() {
        let config = MovementType::Issue.config().unwrap();
        let lines = vec![NewMovementLine::new(ItemId::new(), dec!(100))];

        let check = validate_stock_availability(
            config,
            &lines,
            None,
            &FixedStock(dec!(0)),
            TIMEOUT,
            true,
        )
        .await
        .unwrap();

        assert_eq!(check, StockCheck::Verified { lines_checked: 0 });
    }

    #[tokio::test]
    async fn test_not_required_for_receipt_or_when_disabled() {
        let lines = vec![NewMovementLine::new(ItemId::new(), dec!(10))];
        let receipt = MovementType::Receipt.config().unwrap();
        let issue = MovementType::Issue.config().unwrap();
        let source = Some(LocationId::new());

        let check =
            validate_stock_availability(receipt, &lines, source, &FixedStock(dec!(0)), TIMEOUT, true)
                .await
                .unwrap();
        assert_eq!(check, StockCheck::NotRequired);

        let check =
            validate_stock_availability(issue, &lines, source, &FixedStock(dec!(0)), TIMEOUT, false)
                .await
                .unwrap();
        assert_eq!(check, StockCheck::NotRequired);
    }

    #[tokio::test]
    async fn test_oracle_unavailable_is_advisory() {
        let config = MovementType::Issue.config().unwrap();
        let lines = vec![NewMovementLine::new(ItemId::new(), dec!(1))];

        let check = validate_stock_availability(
            config,
            &lines,
            Some(LocationId::new()),
            &Offline,
            TIMEOUT,
            true,
        )
        .await
        .unwrap();

        assert!(matches!(check, StockCheck::Skipped(reason) if reason.contains("connection refused")));
    }

    #[tokio::test]
    async fn test_oracle_timeout_is_advisory() {
        let config = MovementType::Issue.config().unwrap();
        let lines = vec![NewMovementLine::new(ItemId::new(), dec!(1))];

        let check = validate_stock_availability(
            config,
            &lines,
            Some(LocationId::new()),
            &Slow,
            TIMEOUT,
            true,
        )
        .await
        .unwrap();

        assert_eq!(
            check,
            StockCheck::Skipped(CollaboratorError::Timeout(TIMEOUT).to_string())
        );
    }
}
