//! Movement type policy table.
//!
//! One static entry per configured `MovementType`, initialised at compile
//! time and never mutated. The lookup is an exhaustive `match`, so a new
//! canonical type cannot be added without a policy entry.

use stockflow_shared::types::LocationId;

use crate::movement::error::MovementError;
use crate::movement::task::{NewMovementTask, TaskPriority};
use crate::movement::types::{MovementPriority, MovementType, TaskType};

/// Static policy for one movement type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovementTypeConfig {
    /// The type this entry describes.
    pub movement_type: MovementType,
    /// A source location must be supplied.
    pub requires_source_location: bool,
    /// A destination location must be supplied.
    pub requires_destination_location: bool,
    /// Stock availability is pre-checked at the source.
    pub requires_stock_validation: bool,
    /// The inventory system may drive stock below zero.
    pub allows_negative_stock: bool,
    /// Tasks suggested for the movement, in execution order.
    pub suggested_tasks: &'static [TaskType],
    /// A reference number (supplier document, RMA) must be supplied.
    pub requires_reference_number: bool,
    /// Short description for pickers and dropdowns.
    pub description: &'static str,
}

static MOVEMENT_TYPE_CONFIGS: [MovementTypeConfig; 10] = [
    MovementTypeConfig {
        movement_type: MovementType::Receipt,
        requires_source_location: false,
        requires_destination_location: true,
        requires_stock_validation: false,
        allows_negative_stock: false,
        suggested_tasks: &[TaskType::Receive, TaskType::Inspect, TaskType::Putaway],
        requires_reference_number: true,
        description: "Receive goods from a supplier",
    },
    MovementTypeConfig {
        movement_type: MovementType::Issue,
        requires_source_location: true,
        requires_destination_location: false,
        requires_stock_validation: true,
        allows_negative_stock: false,
        suggested_tasks: &[TaskType::Pick, TaskType::Pack, TaskType::Ship],
        requires_reference_number: false,
        description: "Issue goods out of the warehouse",
    },
    MovementTypeConfig {
        movement_type: MovementType::Transfer,
        requires_source_location: true,
        requires_destination_location: true,
        requires_stock_validation: true,
        allows_negative_stock: false,
        suggested_tasks: &[TaskType::Pick, TaskType::Transfer, TaskType::Putaway],
        requires_reference_number: false,
        description: "Move stock between locations",
    },
    MovementTypeConfig {
        movement_type: MovementType::Adjustment,
        requires_source_location: false,
        requires_destination_location: true,
        requires_stock_validation: false,
        allows_negative_stock: true,
        suggested_tasks: &[TaskType::Count],
        requires_reference_number: false,
        description: "Correct the stock level at a location",
    },
    MovementTypeConfig {
        movement_type: MovementType::Picking,
        requires_source_location: true,
        requires_destination_location: true,
        requires_stock_validation: true,
        allows_negative_stock: false,
        suggested_tasks: &[TaskType::Pick, TaskType::Pack],
        requires_reference_number: false,
        description: "Pick stock for an order",
    },
    MovementTypeConfig {
        movement_type: MovementType::Putaway,
        requires_source_location: true,
        requires_destination_location: true,
        requires_stock_validation: true,
        allows_negative_stock: false,
        suggested_tasks: &[TaskType::Putaway],
        requires_reference_number: false,
        description: "Put received stock away into storage",
    },
    MovementTypeConfig {
        movement_type: MovementType::Return,
        requires_source_location: true,
        requires_destination_location: true,
        requires_stock_validation: false,
        allows_negative_stock: false,
        suggested_tasks: &[TaskType::Receive, TaskType::Inspect, TaskType::Putaway],
        requires_reference_number: true,
        description: "Book a customer return",
    },
    MovementTypeConfig {
        movement_type: MovementType::CycleCount,
        requires_source_location: false,
        requires_destination_location: true,
        requires_stock_validation: false,
        allows_negative_stock: true,
        suggested_tasks: &[TaskType::Count],
        requires_reference_number: false,
        description: "Count stock at a location",
    },
    MovementTypeConfig {
        movement_type: MovementType::Quarantine,
        requires_source_location: true,
        requires_destination_location: true,
        requires_stock_validation: true,
        allows_negative_stock: false,
        suggested_tasks: &[TaskType::Inspect, TaskType::Transfer],
        requires_reference_number: false,
        description: "Move stock into quarantine for inspection",
    },
    MovementTypeConfig {
        movement_type: MovementType::Relocation,
        requires_source_location: true,
        requires_destination_location: true,
        requires_stock_validation: true,
        allows_negative_stock: false,
        suggested_tasks: &[TaskType::Pick, TaskType::Transfer, TaskType::Putaway],
        requires_reference_number: false,
        description: "Relocate stock between bins",
    },
];

impl MovementTypeConfig {
    /// Returns the policy for a movement type, or `None` for the legacy
    /// unconfigured types.
    #[must_use]
    pub fn of(movement_type: MovementType) -> Option<&'static Self> {
        let index = match movement_type {
            MovementType::Receipt => 0,
            MovementType::Issue => 1,
            MovementType::Transfer => 2,
            MovementType::Adjustment => 3,
            MovementType::Picking => 4,
            MovementType::Putaway => 5,
            MovementType::Return => 6,
            MovementType::CycleCount => 7,
            MovementType::Quarantine => 8,
            MovementType::Relocation => 9,
            MovementType::Inbound | MovementType::Outbound | MovementType::Shipment => {
                return None;
            }
        };
        Some(&MOVEMENT_TYPE_CONFIGS[index])
    }

    /// Returns every configured policy entry.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &MOVEMENT_TYPE_CONFIGS
    }

    /// Builds task drafts for the suggested task types.
    ///
    /// Tasks working at the destination side (putaway, receive, inspect,
    /// count, unload) are placed at `destination`, the rest at `source`;
    /// each falls back to the other side when its own is unset.
    #[must_use]
    pub fn suggested_task_drafts(
        &self,
        priority: MovementPriority,
        source: Option<LocationId>,
        destination: Option<LocationId>,
    ) -> Vec<NewMovementTask> {
        let task_priority = TaskPriority::from_movement_priority(priority);
        self.suggested_tasks
            .iter()
            .map(|task_type| {
                let location_id = if task_type.works_at_destination() {
                    destination.or(source)
                } else {
                    source.or(destination)
                };
                NewMovementTask {
                    task_type: *task_type,
                    priority: task_priority,
                    location_id,
                    assigned_to: None,
                    scheduled_start: None,
                    expected_completion: None,
                    notes: None,
                }
            })
            .collect()
    }
}

impl MovementType {
    /// Returns the policy entry for this type.
    ///
    /// # Errors
    ///
    /// Returns `MovementError::UnconfiguredType` for the legacy types.
    pub fn config(self) -> Result<&'static MovementTypeConfig, MovementError> {
        MovementTypeConfig::of(self).ok_or(MovementError::UnconfiguredType(self))
    }
}
