//! Movement error types.
//!
//! Every failure of the movement engine is one of these kinds. All of them
//! are returned to the caller; the engine never presents or swallows them.

use std::fmt;

use stockflow_shared::AppError;
use stockflow_shared::types::{
    ItemId, LocationId, MovementId, MovementLineId, MovementTaskId, WarehouseId,
};
use thiserror::Error;

use crate::movement::types::{
    LineStatus, MovementAction, MovementStatus, MovementType, TaskAction, TaskStatus,
};

/// Which side of a movement a location sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationRole {
    /// The location stock is taken from.
    Source,
    /// The location stock is put into.
    Destination,
}

impl fmt::Display for LocationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => f.write_str("source"),
            Self::Destination => f.write_str("destination"),
        }
    }
}

/// Reference to an entity that could not be found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    /// A movement.
    Movement(MovementId),
    /// A movement line.
    Line(MovementLineId),
    /// A movement task.
    Task(MovementTaskId),
    /// A warehouse in the directory.
    Warehouse(WarehouseId),
    /// A location in the directory.
    Location(LocationId),
    /// An item in the directory.
    Item(ItemId),
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Movement(id) => write!(f, "movement {id}"),
            Self::Line(id) => write!(f, "movement line {id}"),
            Self::Task(id) => write!(f, "movement task {id}"),
            Self::Warehouse(id) => write!(f, "warehouse {id}"),
            Self::Location(id) => write!(f, "location {id}"),
            Self::Item(id) => write!(f, "item {id}"),
        }
    }
}

/// Errors that can occur during movement operations.
#[derive(Debug, Error)]
pub enum MovementError {
    /// The movement type requires a location that was not supplied.
    #[error("{movement_type} movement requires a {role} location")]
    MissingLocation {
        /// The movement type.
        movement_type: MovementType,
        /// Which location is missing.
        role: LocationRole,
    },

    /// The movement has no lines.
    #[error("Movement must have at least one line")]
    EmptyLineSet,

    /// A line quantity is not acceptable.
    #[error("Invalid quantity on line {line_index}")]
    InvalidQuantity {
        /// Zero-based index of the offending line.
        line_index: usize,
    },

    /// The advisory stock pre-check found a shortage.
    #[error("Insufficient stock of item {item_id} at location {location_id} (line {line_index})")]
    InsufficientStock {
        /// The short item.
        item_id: ItemId,
        /// The location checked.
        location_id: LocationId,
        /// Zero-based index of the first failing line.
        line_index: usize,
    },

    /// The action is not legal from the current status.
    #[error("Cannot {action} a movement in status {current}")]
    IllegalTransition {
        /// The attempted action.
        action: MovementAction,
        /// The status the movement was in.
        current: MovementStatus,
    },

    /// The action requires a reason that was not supplied.
    #[error("A reason is required to {action}")]
    MissingReason {
        /// The action that needed a reason.
        action: &'static str,
    },

    /// The entity does not exist.
    #[error("{0} not found")]
    NotFound(EntityRef),

    /// The movement changed between read and write.
    #[error("Movement {movement_id} was modified concurrently; reload and retry")]
    ConcurrentModification {
        /// The contended movement.
        movement_id: MovementId,
    },

    /// The movement type has no policy entry.
    #[error("Movement type {0} is not configured")]
    UnconfiguredType(MovementType),

    /// The movement type requires a reference number.
    #[error("{0} movement requires a reference number")]
    MissingReferenceNumber(MovementType),

    /// Assigning a task requires a user.
    #[error("A user is required to assign a task")]
    MissingAssignee,

    /// The line action is not legal from the line's status.
    #[error("Cannot {operation} a line in status {current}")]
    IllegalLineTransition {
        /// The attempted operation (a `LineAction` or `CORRECT`).
        operation: &'static str,
        /// The status the line was in.
        current: LineStatus,
    },

    /// The task action is not legal from the task's status.
    #[error("Cannot {action} a task in status {current}")]
    IllegalTaskTransition {
        /// The attempted action.
        action: TaskAction,
        /// The status the task was in.
        current: TaskStatus,
    },

    /// Line or task execution on a movement that is not running.
    #[error("Movement in status {current} is not being executed")]
    InactiveMovement {
        /// The status the movement was in.
        current: MovementStatus,
    },

    /// Task priority outside 1..=10.
    #[error("Task priority {0} is out of range 1-10")]
    InvalidTaskPriority(u8),

    /// Two lines share a sequence number.
    #[error("Line sequence {0} is already used in this movement")]
    DuplicateSequence(u32),

    /// The inventory sink refused the completion deltas.
    #[error("Inventory sink failed: {0}")]
    InventorySink(String),

    /// The backing store failed.
    #[error("Store error: {0}")]
    Store(String),
}

impl MovementError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MissingLocation { .. }
            | Self::EmptyLineSet
            | Self::InvalidQuantity { .. }
            | Self::MissingReason { .. }
            | Self::UnconfiguredType(_)
            | Self::MissingReferenceNumber(_)
            | Self::MissingAssignee
            | Self::InvalidTaskPriority(_)
            | Self::DuplicateSequence(_) => 400,

            Self::NotFound(_) => 404,

            Self::ConcurrentModification { .. } => 409,

            Self::InsufficientStock { .. }
            | Self::IllegalTransition { .. }
            | Self::IllegalLineTransition { .. }
            | Self::IllegalTaskTransition { .. }
            | Self::InactiveMovement { .. } => 422,

            Self::InventorySink(_) => 502,

            Self::Store(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingLocation { .. } => "MISSING_LOCATION",
            Self::EmptyLineSet => "EMPTY_LINE_SET",
            Self::InvalidQuantity { .. } => "INVALID_QUANTITY",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            Self::IllegalTransition { .. } => "ILLEGAL_TRANSITION",
            Self::MissingReason { .. } => "MISSING_REASON",
            Self::NotFound(_) => "NOT_FOUND",
            Self::ConcurrentModification { .. } => "CONCURRENT_MODIFICATION",
            Self::UnconfiguredType(_) => "UNCONFIGURED_TYPE",
            Self::MissingReferenceNumber(_) => "MISSING_REFERENCE_NUMBER",
            Self::MissingAssignee => "MISSING_ASSIGNEE",
            Self::IllegalLineTransition { .. } => "ILLEGAL_LINE_TRANSITION",
            Self::IllegalTaskTransition { .. } => "ILLEGAL_TASK_TRANSITION",
            Self::InactiveMovement { .. } => "INACTIVE_MOVEMENT",
            Self::InvalidTaskPriority(_) => "INVALID_TASK_PRIORITY",
            Self::DuplicateSequence(_) => "DUPLICATE_SEQUENCE",
            Self::InventorySink(_) => "INVENTORY_SINK_ERROR",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// Returns true if re-reading and re-validating may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification { .. })
    }

    /// Returns true if the caller may proceed despite the error.
    ///
    /// Only the advisory stock pre-check is recoverable.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::InsufficientStock { .. })
    }
}

impl From<MovementError> for AppError {
    fn from(err: MovementError) -> Self {
        let message = err.to_string();
        match err {
            MovementError::NotFound(_) => Self::NotFound(message),
            MovementError::ConcurrentModification { .. } => Self::Conflict(message),
            MovementError::InsufficientStock { .. }
            | MovementError::IllegalTransition { .. }
            | MovementError::IllegalLineTransition { .. }
            | MovementError::IllegalTaskTransition { .. }
            | MovementError::InactiveMovement { .. } => Self::BusinessRule(message),
            MovementError::InventorySink(_) => Self::ExternalService(message),
            MovementError::Store(_) => Self::Database(message),
            MovementError::MissingLocation { .. }
            | MovementError::EmptyLineSet
            | MovementError::InvalidQuantity { .. }
            | MovementError::MissingReason { .. }
            | MovementError::UnconfiguredType(_)
            | MovementError::MissingReferenceNumber(_)
            | MovementError::MissingAssignee
            | MovementError::InvalidTaskPriority(_)
            | MovementError::DuplicateSequence(_) => Self::Validation(message),
        }
    }
}
