//! Movement tasks and their sub-state machine.
//!
//! A task is one unit of physical work (pick, putaway, count, ...) carried
//! out by a worker. Transitions:
//! - Pending → Assigned (assign, needs a user)
//! - Assigned → InProgress (start)
//! - InProgress → Completed (complete)
//! - Pending/Assigned/InProgress → Cancelled (cancel, needs a reason)

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use stockflow_shared::types::{LocationId, MovementId, MovementTaskId, UserId};

use crate::movement::error::MovementError;
use crate::movement::types::{MovementPriority, TaskAction, TaskStatus, TaskType};

/// Task priority on a 1 (lowest) to 10 (highest) scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct TaskPriority(u8);

impl TaskPriority {
    /// Lowest priority.
    pub const MIN: Self = Self(1);
    /// Highest priority.
    pub const MAX: Self = Self(10);

    /// Creates a priority.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTaskPriority` outside 1..=10.
    pub fn new(value: u8) -> Result<Self, MovementError> {
        if (1..=10).contains(&value) {
            Ok(Self(value))
        } else {
            Err(MovementError::InvalidTaskPriority(value))
        }
    }

    /// Returns the numeric priority.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Maps a movement priority onto the task scale.
    #[must_use]
    pub const fn from_movement_priority(priority: MovementPriority) -> Self {
        match priority {
            MovementPriority::Low => Self(3),
            MovementPriority::Normal => Self(5),
            MovementPriority::High => Self(7),
            MovementPriority::Urgent => Self(9),
            MovementPriority::Critical => Self(10),
        }
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        Self(5)
    }
}

impl TryFrom<u8> for TaskPriority {
    type Error = MovementError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TaskPriority> for u8 {
    fn from(priority: TaskPriority) -> Self {
        priority.0
    }
}

/// Input for a new task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMovementTask {
    /// Kind of work.
    pub task_type: TaskType,
    /// Priority.
    pub priority: TaskPriority,
    /// Where the work happens.
    pub location_id: Option<LocationId>,
    /// Pre-assigned worker. The task still starts in `Pending`.
    pub assigned_to: Option<UserId>,
    /// Planned start.
    pub scheduled_start: Option<DateTime<Utc>>,
    /// Deadline used for the overdue flag.
    pub expected_completion: Option<DateTime<Utc>>,
    /// Free-form notes.
    pub notes: Option<String>,
}

impl NewMovementTask {
    /// Creates a task request with default priority.
    #[must_use]
    pub fn new(task_type: TaskType) -> Self {
        Self {
            task_type,
            priority: TaskPriority::default(),
            location_id: None,
            assigned_to: None,
            scheduled_start: None,
            expected_completion: None,
            notes: None,
        }
    }
}

/// A task belonging to a movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementTask {
    /// Task id.
    pub id: MovementTaskId,
    /// Back-reference to the owning movement.
    pub movement_id: MovementId,
    /// Kind of work.
    pub task_type: TaskType,
    /// Priority.
    pub priority: TaskPriority,
    /// Assigned worker.
    pub assigned_to: Option<UserId>,
    /// Where the work happens.
    pub location_id: Option<LocationId>,
    /// Current status.
    pub status: TaskStatus,
    /// Planned start.
    pub scheduled_start: Option<DateTime<Utc>>,
    /// Deadline.
    pub expected_completion: Option<DateTime<Utc>>,
    /// When work started.
    pub actual_start: Option<DateTime<Utc>>,
    /// When work finished.
    pub actual_completion: Option<DateTime<Utc>>,
    /// Why the task was cancelled.
    pub cancel_reason: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
}

impl MovementTask {
    /// Builds a pending task from a request.
    #[must_use]
    pub fn from_draft(movement_id: MovementId, draft: NewMovementTask) -> Self {
        Self {
            id: MovementTaskId::new(),
            movement_id,
            task_type: draft.task_type,
            priority: draft.priority,
            assigned_to: draft.assigned_to,
            location_id: draft.location_id,
            status: TaskStatus::Pending,
            scheduled_start: draft.scheduled_start,
            expected_completion: draft.expected_completion,
            actual_start: None,
            actual_completion: None,
            cancel_reason: None,
            notes: draft.notes,
        }
    }

    /// Time between actual start and completion, once both are known.
    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        match (self.actual_start, self.actual_completion) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    /// True when the deadline has passed and the task is still open.
    ///
    /// Derived on every read; never stored.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.status.is_terminal() && self.expected_completion.is_some_and(|due| due < now)
    }

    /// Writes a validated transition onto the task.
    pub fn apply_transition(&mut self, transition: &TaskTransition) {
        match transition {
            TaskTransition::Assign { assigned_to, .. } => {
                self.assigned_to = Some(*assigned_to);
            }
            TaskTransition::Start { started_at, .. } => {
                self.actual_start = Some(*started_at);
            }
            TaskTransition::Complete { completed_at, .. } => {
                self.actual_completion = Some(*completed_at);
            }
            TaskTransition::Cancel { reason, .. } => {
                self.cancel_reason = Some(reason.clone());
            }
        }
        self.status = transition.new_status();
    }
}

/// Extra data some task actions need.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskActionInput {
    /// Worker for `Assign`.
    pub user_id: Option<UserId>,
    /// Reason for `Cancel`.
    pub reason: Option<String>,
}

/// A validated task transition with its audit data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskTransition {
    /// Task assigned to a worker.
    Assign {
        /// The new status (Assigned).
        new_status: TaskStatus,
        /// The worker.
        assigned_to: UserId,
        /// When it was assigned.
        assigned_at: DateTime<Utc>,
    },
    /// Work started.
    Start {
        /// The new status (InProgress).
        new_status: TaskStatus,
        /// When work started.
        started_at: DateTime<Utc>,
    },
    /// Work finished.
    Complete {
        /// The new status (Completed).
        new_status: TaskStatus,
        /// When work finished.
        completed_at: DateTime<Utc>,
        /// Completion minus start, when the start is known.
        duration: Option<Duration>,
    },
    /// Task abandoned.
    Cancel {
        /// The new status (Cancelled).
        new_status: TaskStatus,
        /// Why.
        reason: String,
        /// When.
        cancelled_at: DateTime<Utc>,
    },
}

impl TaskTransition {
    /// Returns the new status resulting from this transition.
    #[must_use]
    pub fn new_status(&self) -> TaskStatus {
        match self {
            Self::Assign { new_status, .. }
            | Self::Start { new_status, .. }
            | Self::Complete { new_status, .. }
            | Self::Cancel { new_status, .. } => *new_status,
        }
    }
}

/// Stateless service for task transitions.
pub struct TaskWorkflow;

impl TaskWorkflow {
    /// Task transition table.
    #[must_use]
    pub const fn next_status(action: TaskAction, current: TaskStatus) -> Option<TaskStatus> {
        match (action, current) {
            (TaskAction::Assign, TaskStatus::Pending) => Some(TaskStatus::Assigned),
            (TaskAction::Start, TaskStatus::Assigned) => Some(TaskStatus::InProgress),
            (TaskAction::Complete, TaskStatus::InProgress) => Some(TaskStatus::Completed),
            (
                TaskAction::Cancel,
                TaskStatus::Pending | TaskStatus::Assigned | TaskStatus::InProgress,
            ) => Some(TaskStatus::Cancelled),
            _ => None,
        }
    }

    /// Actions legal from `current`.
    #[must_use]
    pub fn allowed_actions(current: TaskStatus) -> Vec<TaskAction> {
        TaskAction::ALL
            .iter()
            .copied()
            .filter(|action| Self::next_status(*action, current).is_some())
            .collect()
    }

    fn ensure(action: TaskAction, current: TaskStatus) -> Result<TaskStatus, MovementError> {
        Self::next_status(action, current)
            .ok_or(MovementError::IllegalTaskTransition { action, current })
    }

    /// Assign a pending task.
    ///
    /// # Errors
    ///
    /// `IllegalTaskTransition` unless Pending, `MissingAssignee` without a user.
    pub fn assign(
        current: TaskStatus,
        user_id: Option<UserId>,
    ) -> Result<TaskTransition, MovementError> {
        let new_status = Self::ensure(TaskAction::Assign, current)?;
        let assigned_to = user_id.ok_or(MovementError::MissingAssignee)?;
        Ok(TaskTransition::Assign {
            new_status,
            assigned_to,
            assigned_at: Utc::now(),
        })
    }

    /// Start an assigned task.
    ///
    /// # Errors
    ///
    /// `IllegalTaskTransition` unless Assigned.
    pub fn start(current: TaskStatus) -> Result<TaskTransition, MovementError> {
        let new_status = Self::ensure(TaskAction::Start, current)?;
        Ok(TaskTransition::Start {
            new_status,
            started_at: Utc::now(),
        })
    }

    /// Complete a task in progress.
    ///
    /// # Errors
    ///
    /// `IllegalTaskTransition` unless InProgress.
    pub fn complete(
        current: TaskStatus,
        started_at: Option<DateTime<Utc>>,
    ) -> Result<TaskTransition, MovementError> {
        let new_status = Self::ensure(TaskAction::Complete, current)?;
        let completed_at = Utc::now();
        Ok(TaskTransition::Complete {
            new_status,
            completed_at,
            duration: started_at.map(|start| completed_at - start),
        })
    }

    /// Cancel an open task.
    ///
    /// # Errors
    ///
    /// `IllegalTaskTransition` from a terminal status, `MissingReason` for a
    /// blank reason.
    pub fn cancel(current: TaskStatus, reason: String) -> Result<TaskTransition, MovementError> {
        let new_status = Self::ensure(TaskAction::Cancel, current)?;
        if reason.trim().is_empty() {
            return Err(MovementError::MissingReason {
                action: TaskAction::Cancel.as_str(),
            });
        }
        Ok(TaskTransition::Cancel {
            new_status,
            reason,
            cancelled_at: Utc::now(),
        })
    }

    /// Dispatches `action` against a task.
    ///
    /// # Errors
    ///
    /// Same as the individual transitions.
    pub fn transition(
        task: &MovementTask,
        action: TaskAction,
        input: TaskActionInput,
    ) -> Result<TaskTransition, MovementError> {
        match action {
            TaskAction::Assign => Self::assign(task.status, input.user_id),
            TaskAction::Start => Self::start(task.status),
            TaskAction::Complete => Self::complete(task.status, task.actual_start),
            TaskAction::Cancel => Self::cancel(task.status, input.reason.unwrap_or_default()),
        }
    }
}
