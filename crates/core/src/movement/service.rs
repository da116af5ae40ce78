//! Movement state machine.
//!
//! This module is the single source of truth for which actions are legal
//! from which status. Valid transitions:
//! - Draft/Pending → InProgress (start)
//! - InProgress → Completed (complete, applies inventory)
//! - InProgress/Pending → OnHold (hold, needs a reason)
//! - OnHold → the status held from (release)
//! - Pending/InProgress/OnHold → Cancelled (cancel, needs a reason)
//! - Draft/Cancelled → removed (delete)
//! - Draft/Pending → unchanged (edit)

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockflow_shared::types::{
    ItemId, LocationId, LotId, MovementId, MovementLineId, UnitOfMeasure, WarehouseId,
};

use crate::movement::config::MovementTypeConfig;
use crate::movement::entity::Movement;
use crate::movement::error::MovementError;
use crate::movement::types::{LineStatus, MovementAction, MovementStatus, MovementType};

/// Where an action leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionTarget {
    /// The movement moves to this status.
    Status(MovementStatus),
    /// The movement is hard-deleted.
    Removed,
    /// The status does not change.
    Unchanged,
}

/// A validated movement transition with its audit data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovementTransition {
    /// Execution started.
    Start {
        /// The new status (InProgress).
        new_status: MovementStatus,
        /// When.
        started_at: DateTime<Utc>,
    },
    /// Execution finished.
    Complete {
        /// The new status (Completed).
        new_status: MovementStatus,
        /// When.
        completed_at: DateTime<Utc>,
    },
    /// Execution paused.
    Hold {
        /// The new status (OnHold).
        new_status: MovementStatus,
        /// The active status to restore on release.
        held_from: MovementStatus,
        /// Why.
        reason: String,
        /// When.
        held_at: DateTime<Utc>,
    },
    /// Execution resumed.
    Release {
        /// The restored status.
        new_status: MovementStatus,
        /// When.
        released_at: DateTime<Utc>,
    },
    /// Movement abandoned.
    Cancel {
        /// The new status (Cancelled).
        new_status: MovementStatus,
        /// Why.
        reason: String,
        /// When.
        cancelled_at: DateTime<Utc>,
    },
}

impl MovementTransition {
    /// Returns the new status resulting from this transition.
    #[must_use]
    pub fn new_status(&self) -> MovementStatus {
        match self {
            Self::Start { new_status, .. }
            | Self::Complete { new_status, .. }
            | Self::Hold { new_status, .. }
            | Self::Release { new_status, .. }
            | Self::Cancel { new_status, .. } => *new_status,
        }
    }

    /// Returns when the transition happened.
    #[must_use]
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Self::Start { started_at: at, .. }
            | Self::Complete { completed_at: at, .. }
            | Self::Hold { held_at: at, .. }
            | Self::Release { released_at: at, .. }
            | Self::Cancel { cancelled_at: at, .. } => *at,
        }
    }

    /// Returns the action this transition performs.
    #[must_use]
    pub fn action(&self) -> MovementAction {
        match self {
            Self::Start { .. } => MovementAction::Start,
            Self::Complete { .. } => MovementAction::Complete,
            Self::Hold { .. } => MovementAction::Hold,
            Self::Release { .. } => MovementAction::Release,
            Self::Cancel { .. } => MovementAction::Cancel,
        }
    }
}

/// One stock change the inventory system must book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryDelta {
    /// Line the delta comes from.
    pub line_id: MovementLineId,
    /// Item.
    pub item_id: ItemId,
    /// Location.
    pub location_id: LocationId,
    /// Signed quantity: negative at the source, positive at the destination.
    pub quantity: Decimal,
    /// Unit of the quantity.
    pub unit_of_measure: UnitOfMeasure,
    /// Lot.
    pub lot_id: Option<LotId>,
}

/// Everything the inventory sink needs to apply a completed movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryIntent {
    /// The completed movement.
    pub movement_id: MovementId,
    /// Its type.
    pub movement_type: MovementType,
    /// Its warehouse.
    pub warehouse_id: WarehouseId,
    /// Whether source stock may go below zero.
    pub allows_negative_stock: bool,
    /// Stock changes, in line order, source before destination.
    pub deltas: Vec<InventoryDelta>,
}

impl InventoryIntent {
    /// Builds the deltas of a movement from its lines' actual quantities.
    ///
    /// Cancelled lines and zero quantities produce nothing.
    #[must_use]
    pub fn for_movement(movement: &Movement, config: &MovementTypeConfig) -> Self {
        let mut deltas = Vec::with_capacity(movement.lines.len() * 2);
        for line in &movement.lines {
            if line.status() == LineStatus::Cancelled || line.actual_quantity().is_zero() {
                continue;
            }
            if let Some(from) = line.effective_from(movement.source_location_id) {
                deltas.push(InventoryDelta {
                    line_id: line.id,
                    item_id: line.item_id,
                    location_id: from,
                    quantity: -line.actual_quantity(),
                    unit_of_measure: line.unit_of_measure,
                    lot_id: line.lot_id,
                });
            }
            if let Some(to) = line.effective_to(movement.destination_location_id) {
                deltas.push(InventoryDelta {
                    line_id: line.id,
                    item_id: line.item_id,
                    location_id: to,
                    quantity: line.actual_quantity(),
                    unit_of_measure: line.unit_of_measure,
                    lot_id: line.lot_id,
                });
            }
        }

        Self {
            movement_id: movement.id,
            movement_type: movement.movement_type,
            warehouse_id: movement.warehouse_id,
            allows_negative_stock: config.allows_negative_stock,
            deltas,
        }
    }
}

/// Stateless service for movement transitions.
///
/// All methods are associated functions; every caller (engine, UI, store)
/// asks this table instead of re-deriving the rules.
pub struct MovementWorkflow;

impl MovementWorkflow {
    /// The transition table.
    ///
    /// `held_from` only matters for `Release`; without it the movement
    /// resumes in `InProgress`.
    #[must_use]
    pub const fn target(
        action: MovementAction,
        current: MovementStatus,
        held_from: Option<MovementStatus>,
    ) -> Option<TransitionTarget> {
        use MovementStatus as S;
        match (action, current) {
            (MovementAction::Start, S::Draft | S::Pending) => {
                Some(TransitionTarget::Status(S::InProgress))
            }
            (MovementAction::Complete, S::InProgress) => {
                Some(TransitionTarget::Status(S::Completed))
            }
            (MovementAction::Hold, S::InProgress | S::Pending) => {
                Some(TransitionTarget::Status(S::OnHold))
            }
            (MovementAction::Release, S::OnHold) => Some(TransitionTarget::Status(match held_from {
                Some(S::Pending) => S::Pending,
                _ => S::InProgress,
            })),
            (MovementAction::Cancel, S::Pending | S::InProgress | S::OnHold) => {
                Some(TransitionTarget::Status(S::Cancelled))
            }
            (MovementAction::Delete, S::Draft | S::Cancelled) => Some(TransitionTarget::Removed),
            (MovementAction::Edit, S::Draft | S::Pending) => Some(TransitionTarget::Unchanged),
            _ => None,
        }
    }

    /// Actions legal from `current`, in a stable order.
    #[must_use]
    pub fn allowed_actions(current: MovementStatus) -> Vec<MovementAction> {
        MovementAction::ALL
            .iter()
            .copied()
            .filter(|action| Self::target(*action, current, None).is_some())
            .collect()
    }

    /// Check if a status-to-status transition is possible by any action.
    #[must_use]
    pub fn is_valid_transition(from: MovementStatus, to: MovementStatus) -> bool {
        MovementAction::ALL.iter().any(|action| {
            [None, Some(MovementStatus::Pending), Some(MovementStatus::InProgress)]
                .into_iter()
                .any(|held_from| {
                    Self::target(*action, from, held_from) == Some(TransitionTarget::Status(to))
                })
        })
    }

    fn ensure(
        action: MovementAction,
        current: MovementStatus,
        held_from: Option<MovementStatus>,
    ) -> Result<TransitionTarget, MovementError> {
        Self::target(action, current, held_from)
            .ok_or(MovementError::IllegalTransition { action, current })
    }

    fn ensure_status(
        action: MovementAction,
        current: MovementStatus,
        held_from: Option<MovementStatus>,
    ) -> Result<MovementStatus, MovementError> {
        match Self::ensure(action, current, held_from)? {
            TransitionTarget::Status(status) => Ok(status),
            TransitionTarget::Removed | TransitionTarget::Unchanged => {
                Err(MovementError::IllegalTransition { action, current })
            }
        }
    }

    fn require_reason(
        action: MovementAction,
        reason: Option<String>,
    ) -> Result<String, MovementError> {
        match reason {
            Some(reason) if !reason.trim().is_empty() => Ok(reason),
            _ => Err(MovementError::MissingReason {
                action: action.as_str(),
            }),
        }
    }

    /// Start a draft or pending movement.
    ///
    /// # Errors
    ///
    /// `IllegalTransition` from any other status.
    pub fn start(current: MovementStatus) -> Result<MovementTransition, MovementError> {
        let new_status = Self::ensure_status(MovementAction::Start, current, None)?;
        Ok(MovementTransition::Start {
            new_status,
            started_at: Utc::now(),
        })
    }

    /// Complete a movement in progress.
    ///
    /// # Errors
    ///
    /// `IllegalTransition` from any status but InProgress.
    pub fn complete(current: MovementStatus) -> Result<MovementTransition, MovementError> {
        let new_status = Self::ensure_status(MovementAction::Complete, current, None)?;
        Ok(MovementTransition::Complete {
            new_status,
            completed_at: Utc::now(),
        })
    }

    /// Put a pending or running movement on hold.
    ///
    /// # Errors
    ///
    /// `IllegalTransition` from other statuses, then `MissingReason`.
    pub fn hold(
        current: MovementStatus,
        reason: Option<String>,
    ) -> Result<MovementTransition, MovementError> {
        let new_status = Self::ensure_status(MovementAction::Hold, current, None)?;
        let reason = Self::require_reason(MovementAction::Hold, reason)?;
        Ok(MovementTransition::Hold {
            new_status,
            held_from: current,
            reason,
            held_at: Utc::now(),
        })
    }

    /// Release a held movement back to the status it was held from.
    ///
    /// # Errors
    ///
    /// `IllegalTransition` unless OnHold.
    pub fn release(
        current: MovementStatus,
        held_from: Option<MovementStatus>,
    ) -> Result<MovementTransition, MovementError> {
        let new_status = Self::ensure_status(MovementAction::Release, current, held_from)?;
        Ok(MovementTransition::Release {
            new_status,
            released_at: Utc::now(),
        })
    }

    /// Cancel a pending, running or held movement.
    ///
    /// # Errors
    ///
    /// `IllegalTransition` from Draft or a terminal status, then
    /// `MissingReason`.
    pub fn cancel(
        current: MovementStatus,
        reason: Option<String>,
    ) -> Result<MovementTransition, MovementError> {
        let new_status = Self::ensure_status(MovementAction::Cancel, current, None)?;
        let reason = Self::require_reason(MovementAction::Cancel, reason)?;
        Ok(MovementTransition::Cancel {
            new_status,
            reason,
            cancelled_at: Utc::now(),
        })
    }

    /// Check that the movement may be hard-deleted.
    ///
    /// # Errors
    ///
    /// `IllegalTransition` unless Draft or Cancelled.
    pub fn ensure_deletable(current: MovementStatus) -> Result<(), MovementError> {
        Self::ensure(MovementAction::Delete, current, None).map(|_| ())
    }

    /// Check that fields, lines and tasks may be mutated.
    ///
    /// # Errors
    ///
    /// `IllegalTransition` with action `Edit` unless Draft or Pending.
    pub fn ensure_editable(current: MovementStatus) -> Result<(), MovementError> {
        Self::ensure(MovementAction::Edit, current, None).map(|_| ())
    }

    /// Dispatches a status-changing action against a movement.
    ///
    /// Returns `None` for `Delete` and `Edit` once they are known to be legal;
    /// those do not produce a status transition.
    ///
    /// # Errors
    ///
    /// Same as the individual transitions.
    pub fn transition(
        movement: &Movement,
        action: MovementAction,
        reason: Option<String>,
    ) -> Result<Option<MovementTransition>, MovementError> {
        let current = movement.status;
        match action {
            MovementAction::Start => Self::start(current).map(Some),
            MovementAction::Complete => Self::complete(current).map(Some),
            MovementAction::Hold => Self::hold(current, reason).map(Some),
            MovementAction::Release => Self::release(current, movement.held_from).map(Some),
            MovementAction::Cancel => Self::cancel(current, reason).map(Some),
            MovementAction::Delete => Self::ensure_deletable(current).map(|()| None),
            MovementAction::Edit => Self::ensure_editable(current).map(|()| None),
        }
    }
}
