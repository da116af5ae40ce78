//! Movement domain enumerations.
//!
//! Every enum here has a stable SCREAMING_SNAKE_CASE string form used for
//! persistence and serde, plus a case-insensitive `parse`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Generates `as_str`, `parse`, `ALL` and `Display` for a fieldless enum.
macro_rules! string_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Returns the string representation.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }

            /// Parses a value from its string form (case-insensitive).
            pub fn parse(s: &str) -> Option<Self> {
                let upper = s.trim().to_uppercase();
                match upper.as_str() {
                    $($text => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

/// Kind of inventory movement.
///
/// The first ten variants are the canonical, configured types. `Inbound`,
/// `Outbound` and `Shipment` are legacy display values with no policy entry;
/// movements of those types are rejected at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    /// Goods received from a supplier into a destination location.
    Receipt,
    /// Goods issued out of a source location.
    Issue,
    /// Stock moved between two locations.
    Transfer,
    /// Manual correction of the stock level at a location.
    Adjustment,
    /// Picking for an order.
    Picking,
    /// Putting received goods away into storage.
    Putaway,
    /// Customer return.
    Return,
    /// Periodic count of a location.
    CycleCount,
    /// Stock moved into quarantine for inspection.
    Quarantine,
    /// Internal relocation between bins.
    Relocation,
    /// Legacy alias, unconfigured.
    Inbound,
    /// Legacy alias, unconfigured.
    Outbound,
    /// Legacy alias, unconfigured.
    Shipment,
}

string_enum!(MovementType {
    Receipt => "RECEIPT",
    Issue => "ISSUE",
    Transfer => "TRANSFER",
    Adjustment => "ADJUSTMENT",
    Picking => "PICKING",
    Putaway => "PUTAWAY",
    Return => "RETURN",
    CycleCount => "CYCLE_COUNT",
    Quarantine => "QUARANTINE",
    Relocation => "RELOCATION",
    Inbound => "INBOUND",
    Outbound => "OUTBOUND",
    Shipment => "SHIPMENT",
});

impl MovementType {
    /// The types that carry a policy entry.
    pub const CONFIGURED: &'static [Self] = &[
        Self::Receipt,
        Self::Issue,
        Self::Transfer,
        Self::Adjustment,
        Self::Picking,
        Self::Putaway,
        Self::Return,
        Self::CycleCount,
        Self::Quarantine,
        Self::Relocation,
    ];

    /// Returns true if the type has a policy entry.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        !matches!(self, Self::Inbound | Self::Outbound | Self::Shipment)
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Receipt => "Receipt",
            Self::Issue => "Issue",
            Self::Transfer => "Transfer",
            Self::Adjustment => "Adjustment",
            Self::Picking => "Picking",
            Self::Putaway => "Putaway",
            Self::Return => "Return",
            Self::CycleCount => "Cycle Count",
            Self::Quarantine => "Quarantine",
            Self::Relocation => "Relocation",
            Self::Inbound => "Inbound",
            Self::Outbound => "Outbound",
            Self::Shipment => "Shipment",
        }
    }
}

/// Movement priority, ordered from least to most urgent.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementPriority {
    /// Can wait.
    Low,
    /// Default priority.
    #[default]
    Normal,
    /// Ahead of normal work.
    High,
    /// Same-shift handling expected.
    Urgent,
    /// Drop everything.
    Critical,
}

string_enum!(MovementPriority {
    Low => "LOW",
    Normal => "NORMAL",
    High => "HIGH",
    Urgent => "URGENT",
    Critical => "CRITICAL",
});

/// Movement lifecycle status.
///
/// `Draft` and `Pending` are entry states; `Completed` and `Cancelled` are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementStatus {
    /// Being prepared, freely editable.
    Draft,
    /// Released for execution, still editable.
    Pending,
    /// Being executed on the floor.
    InProgress,
    /// Inventory has been applied (immutable).
    Completed,
    /// Abandoned (immutable).
    Cancelled,
    /// Paused with a reason.
    OnHold,
}

string_enum!(MovementStatus {
    Draft => "DRAFT",
    Pending => "PENDING",
    InProgress => "IN_PROGRESS",
    Completed => "COMPLETED",
    Cancelled => "CANCELLED",
    OnHold => "ON_HOLD",
});

impl MovementStatus {
    /// Returns true if no further transition is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Returns true if a movement may be created directly in this status.
    #[must_use]
    pub const fn is_entry(&self) -> bool {
        matches!(self, Self::Draft | Self::Pending)
    }
}

/// Action requested against a movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementAction {
    /// Begin execution.
    Start,
    /// Finish execution and apply inventory.
    Complete,
    /// Pause execution.
    Hold,
    /// Resume after a hold.
    Release,
    /// Abandon the movement.
    Cancel,
    /// Hard-delete the movement and its children.
    Delete,
    /// Mutate fields, lines or tasks.
    Edit,
}

string_enum!(MovementAction {
    Start => "START",
    Complete => "COMPLETE",
    Hold => "HOLD",
    Release => "RELEASE",
    Cancel => "CANCEL",
    Delete => "DELETE",
    Edit => "EDIT",
});

impl MovementAction {
    /// Returns true if the action must carry a non-empty reason.
    #[must_use]
    pub const fn requires_reason(&self) -> bool {
        matches!(self, Self::Hold | Self::Cancel)
    }
}

/// Status of a single movement line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineStatus {
    /// Not yet touched.
    #[default]
    Pending,
    /// Picked from the source location.
    Picked,
    /// On its way to the destination.
    InTransit,
    /// Arrived and booked.
    Completed,
    /// Dropped from the movement.
    Cancelled,
}

string_enum!(LineStatus {
    Pending => "PENDING",
    Picked => "PICKED",
    InTransit => "IN_TRANSIT",
    Completed => "COMPLETED",
    Cancelled => "CANCELLED",
});

impl LineStatus {
    /// Returns true for `Completed` and `Cancelled`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Action requested against a movement line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineAction {
    /// Pending → Picked.
    Pick,
    /// Picked → InTransit.
    Ship,
    /// Pending/Picked/InTransit → Completed.
    Complete,
    /// Any non-terminal → Cancelled.
    Cancel,
}

string_enum!(LineAction {
    Pick => "PICK",
    Ship => "SHIP",
    Complete => "COMPLETE",
    Cancel => "CANCEL",
});

/// Kind of physical work a task represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    /// Pick stock from a location.
    Pick,
    /// Put stock away into a location.
    Putaway,
    /// Count stock.
    Count,
    /// Pack for shipping.
    Pack,
    /// Load onto a vehicle.
    Load,
    /// Unload from a vehicle.
    Unload,
    /// Quality inspection.
    Inspect,
    /// Receive at the dock.
    Receive,
    /// Hand over to a carrier.
    Ship,
    /// Move between locations.
    Transfer,
}

string_enum!(TaskType {
    Pick => "PICK",
    Putaway => "PUTAWAY",
    Count => "COUNT",
    Pack => "PACK",
    Load => "LOAD",
    Unload => "UNLOAD",
    Inspect => "INSPECT",
    Receive => "RECEIVE",
    Ship => "SHIP",
    Transfer => "TRANSFER",
});

impl TaskType {
    /// Returns true if the task is performed at the destination side of a movement.
    #[must_use]
    pub const fn works_at_destination(&self) -> bool {
        matches!(
            self,
            Self::Putaway | Self::Unload | Self::Inspect | Self::Receive | Self::Count
        )
    }
}

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Waiting for an assignee.
    #[default]
    Pending,
    /// Assigned to a worker.
    Assigned,
    /// Being worked on.
    InProgress,
    /// Done.
    Completed,
    /// Abandoned.
    Cancelled,
}

string_enum!(TaskStatus {
    Pending => "PENDING",
    Assigned => "ASSIGNED",
    InProgress => "IN_PROGRESS",
    Completed => "COMPLETED",
    Cancelled => "CANCELLED",
});

impl TaskStatus {
    /// Returns true for `Completed` and `Cancelled`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Action requested against a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskAction {
    /// Pending → Assigned.
    Assign,
    /// Assigned → InProgress.
    Start,
    /// InProgress → Completed.
    Complete,
    /// Any non-terminal → Cancelled.
    Cancel,
}

string_enum!(TaskAction {
    Assign => "ASSIGN",
    Start => "START",
    Complete => "COMPLETE",
    Cancel => "CANCEL",
});
