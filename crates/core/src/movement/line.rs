//! Movement lines: one item/quantity/location tuple within a movement.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockflow_shared::types::{
    ItemId, LocationId, LotId, MovementId, MovementLineId, Quantity, UnitOfMeasure,
};

use crate::movement::error::MovementError;
use crate::movement::types::{LineAction, LineStatus};

/// Input for a new movement line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMovementLine {
    /// The item to move.
    pub item_id: ItemId,
    /// Quantity requested; must be positive.
    pub requested_quantity: Decimal,
    /// Quantity actually moved; defaults to the requested quantity.
    pub actual_quantity: Option<Decimal>,
    /// Unit the quantities are counted in.
    pub unit_of_measure: UnitOfMeasure,
    /// Overrides the movement's source location.
    pub from_location_id: Option<LocationId>,
    /// Overrides the movement's destination location.
    pub to_location_id: Option<LocationId>,
    /// Lot or batch of the stock.
    pub lot_id: Option<LotId>,
    /// Serial number for serialised items.
    pub serial_number: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
}

impl NewMovementLine {
    /// Creates a line request for `quantity` units of `item_id`.
    #[must_use]
    pub fn new(item_id: ItemId, requested_quantity: Decimal) -> Self {
        Self {
            item_id,
            requested_quantity,
            actual_quantity: None,
            unit_of_measure: UnitOfMeasure::default(),
            from_location_id: None,
            to_location_id: None,
            lot_id: None,
            serial_number: None,
            notes: None,
        }
    }

    /// Sets the line-level source location.
    #[must_use]
    pub fn from_location(mut self, location_id: LocationId) -> Self {
        self.from_location_id = Some(location_id);
        self
    }

    /// Sets the line-level destination location.
    #[must_use]
    pub fn to_location(mut self, location_id: LocationId) -> Self {
        self.to_location_id = Some(location_id);
        self
    }

    /// Sets the unit of measure.
    #[must_use]
    pub fn unit(mut self, unit: UnitOfMeasure) -> Self {
        self.unit_of_measure = unit;
        self
    }

    /// Sets the lot.
    #[must_use]
    pub fn lot(mut self, lot_id: LotId) -> Self {
        self.lot_id = Some(lot_id);
        self
    }
}

/// Partial update of a line while its movement is editable.
///
/// The requested quantity is deliberately absent: it is fixed at creation.
/// Outer `None` leaves a field untouched; `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineChanges {
    /// New actual quantity.
    pub actual_quantity: Option<Decimal>,
    /// New line-level source location.
    pub from_location_id: Option<Option<LocationId>>,
    /// New line-level destination location.
    pub to_location_id: Option<Option<LocationId>>,
    /// New lot.
    pub lot_id: Option<Option<LotId>>,
    /// New serial number.
    pub serial_number: Option<Option<String>>,
    /// New notes.
    pub notes: Option<Option<String>>,
}

/// Persistence view of a line with every field exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredLine {
    /// Line id.
    pub id: MovementLineId,
    /// Parent movement.
    pub movement_id: MovementId,
    /// Item moved.
    pub item_id: ItemId,
    /// Requested quantity.
    pub requested_quantity: Decimal,
    /// Actual quantity.
    pub actual_quantity: Decimal,
    /// Unit of measure.
    pub unit_of_measure: UnitOfMeasure,
    /// Line-level source location.
    pub from_location_id: Option<LocationId>,
    /// Line-level destination location.
    pub to_location_id: Option<LocationId>,
    /// Lot.
    pub lot_id: Option<LotId>,
    /// Serial number.
    pub serial_number: Option<String>,
    /// Line status.
    pub status: LineStatus,
    /// Position within the movement.
    pub sequence: u32,
    /// Notes.
    pub notes: Option<String>,
}

/// A line of a movement.
///
/// The requested quantity is set once and never changes. The actual
/// quantity may be corrected until the line is completed or cancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementLine {
    /// Line id.
    pub id: MovementLineId,
    /// Back-reference to the owning movement.
    pub movement_id: MovementId,
    /// Item moved.
    pub item_id: ItemId,
    requested_quantity: Decimal,
    actual_quantity: Decimal,
    /// Unit of measure.
    pub unit_of_measure: UnitOfMeasure,
    /// Line-level source location; inherits the movement's when unset.
    pub from_location_id: Option<LocationId>,
    /// Line-level destination location; inherits the movement's when unset.
    pub to_location_id: Option<LocationId>,
    /// Lot.
    pub lot_id: Option<LotId>,
    /// Serial number.
    pub serial_number: Option<String>,
    status: LineStatus,
    /// Position within the movement, unique per movement.
    pub sequence: u32,
    /// Notes.
    pub notes: Option<String>,
}

impl MovementLine {
    /// Builds a pending line from a request.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantity` when the requested quantity is not positive
    /// or the actual quantity is negative. `line_index` is reported back.
    pub fn from_draft(
        movement_id: MovementId,
        sequence: u32,
        line_index: usize,
        draft: NewMovementLine,
    ) -> Result<Self, MovementError> {
        if draft.requested_quantity <= Decimal::ZERO {
            return Err(MovementError::InvalidQuantity { line_index });
        }
        let actual_quantity = draft.actual_quantity.unwrap_or(draft.requested_quantity);
        if actual_quantity < Decimal::ZERO {
            return Err(MovementError::InvalidQuantity { line_index });
        }

        Ok(Self {
            id: MovementLineId::new(),
            movement_id,
            item_id: draft.item_id,
            requested_quantity: draft.requested_quantity,
            actual_quantity,
            unit_of_measure: draft.unit_of_measure,
            from_location_id: draft.from_location_id,
            to_location_id: draft.to_location_id,
            lot_id: draft.lot_id,
            serial_number: draft.serial_number,
            status: LineStatus::Pending,
            sequence,
            notes: draft.notes,
        })
    }

    /// Rebuilds a line from its stored form.
    #[must_use]
    pub fn restore(stored: StoredLine) -> Self {
        Self {
            id: stored.id,
            movement_id: stored.movement_id,
            item_id: stored.item_id,
            requested_quantity: stored.requested_quantity,
            actual_quantity: stored.actual_quantity,
            unit_of_measure: stored.unit_of_measure,
            from_location_id: stored.from_location_id,
            to_location_id: stored.to_location_id,
            lot_id: stored.lot_id,
            serial_number: stored.serial_number,
            status: stored.status,
            sequence: stored.sequence,
            notes: stored.notes,
        }
    }

    /// Returns the stored form of the line.
    #[must_use]
    pub fn to_stored(&self) -> StoredLine {
        StoredLine {
            id: self.id,
            movement_id: self.movement_id,
            item_id: self.item_id,
            requested_quantity: self.requested_quantity,
            actual_quantity: self.actual_quantity,
            unit_of_measure: self.unit_of_measure,
            from_location_id: self.from_location_id,
            to_location_id: self.to_location_id,
            lot_id: self.lot_id,
            serial_number: self.serial_number.clone(),
            status: self.status,
            sequence: self.sequence,
            notes: self.notes.clone(),
        }
    }

    /// Quantity requested at creation.
    #[must_use]
    pub const fn requested_quantity(&self) -> Decimal {
        self.requested_quantity
    }

    /// Quantity actually moved.
    #[must_use]
    pub const fn actual_quantity(&self) -> Decimal {
        self.actual_quantity
    }

    /// Actual quantity with its unit.
    #[must_use]
    pub const fn actual(&self) -> Quantity {
        Quantity::new(self.actual_quantity, self.unit_of_measure)
    }

    /// Current line status.
    #[must_use]
    pub const fn status(&self) -> LineStatus {
        self.status
    }

    /// Source location after inheriting the movement default.
    #[must_use]
    pub fn effective_from(&self, movement_source: Option<LocationId>) -> Option<LocationId> {
        self.from_location_id.or(movement_source)
    }

    /// Destination location after inheriting the movement default.
    #[must_use]
    pub fn effective_to(&self, movement_destination: Option<LocationId>) -> Option<LocationId> {
        self.to_location_id.or(movement_destination)
    }

    /// Corrects the actual quantity.
    ///
    /// # Errors
    ///
    /// Returns `IllegalLineTransition` once the line is completed or
    /// cancelled, `InvalidQuantity` for a negative quantity.
    pub fn correct_actual_quantity(
        &mut self,
        quantity: Decimal,
        line_index: usize,
    ) -> Result<(), MovementError> {
        if self.status.is_terminal() {
            return Err(MovementError::IllegalLineTransition {
                operation: "CORRECT",
                current: self.status,
            });
        }
        if quantity < Decimal::ZERO {
            return Err(MovementError::InvalidQuantity { line_index });
        }
        self.actual_quantity = quantity;
        Ok(())
    }

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// Propagates the quantity correction errors.
    pub fn apply_changes(
        &mut self,
        changes: LineChanges,
        line_index: usize,
    ) -> Result<(), MovementError> {
        if let Some(quantity) = changes.actual_quantity {
            self.correct_actual_quantity(quantity, line_index)?;
        }
        if let Some(from) = changes.from_location_id {
            self.from_location_id = from;
        }
        if let Some(to) = changes.to_location_id {
            self.to_location_id = to;
        }
        if let Some(lot) = changes.lot_id {
            self.lot_id = lot;
        }
        if let Some(serial) = changes.serial_number {
            self.serial_number = serial;
        }
        if let Some(notes) = changes.notes {
            self.notes = notes;
        }
        Ok(())
    }

    /// Completes the line unless it is already completed or cancelled.
    ///
    /// Returns whether the status changed.
    pub fn complete_if_open(&mut self) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = LineStatus::Completed;
        true
    }

    /// Moves the line through its state machine.
    ///
    /// # Errors
    ///
    /// Returns `IllegalLineTransition` when the action is not legal from the
    /// current status.
    pub fn apply(&mut self, action: LineAction) -> Result<LineStatus, MovementError> {
        let next = next_line_status(action, self.status).ok_or(
            MovementError::IllegalLineTransition {
                operation: action.as_str(),
                current: self.status,
            },
        )?;
        self.status = next;
        Ok(next)
    }
}

/// Line transition table.
#[must_use]
pub const fn next_line_status(action: LineAction, current: LineStatus) -> Option<LineStatus> {
    match (action, current) {
        (LineAction::Pick, LineStatus::Pending) => Some(LineStatus::Picked),
        (LineAction::Ship, LineStatus::Picked) => Some(LineStatus::InTransit),
        (
            LineAction::Complete,
            LineStatus::Pending | LineStatus::Picked | LineStatus::InTransit,
        ) => Some(LineStatus::Completed),
        (
            LineAction::Cancel,
            LineStatus::Pending | LineStatus::Picked | LineStatus::InTransit,
        ) => Some(LineStatus::Cancelled),
        _ => None,
    }
}
