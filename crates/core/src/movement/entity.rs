//! The movement aggregate: a movement with its owned lines and tasks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stockflow_shared::types::{LocationId, MovementId, MovementLineId, MovementTaskId, WarehouseId};

use crate::movement::config::MovementTypeConfig;
use crate::movement::error::{EntityRef, MovementError};
use crate::movement::line::{MovementLine, NewMovementLine};
use crate::movement::service::MovementTransition;
use crate::movement::task::{MovementTask, NewMovementTask};
use crate::movement::types::{
    LineStatus, MovementAction, MovementPriority, MovementStatus, MovementType,
};

/// Input for creating a movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMovement {
    /// Kind of movement.
    pub movement_type: MovementType,
    /// Priority.
    pub priority: MovementPriority,
    /// Owning warehouse.
    pub warehouse_id: WarehouseId,
    /// Default source location for lines.
    pub source_location_id: Option<LocationId>,
    /// Default destination location for lines.
    pub destination_location_id: Option<LocationId>,
    /// External document number.
    pub reference_number: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Business date; defaults to now.
    pub movement_date: Option<DateTime<Utc>>,
    /// Expected completion date.
    pub expected_date: Option<DateTime<Utc>>,
    /// Scheduled execution date.
    pub scheduled_date: Option<DateTime<Utc>>,
    /// `Draft` or `Pending`.
    pub initial_status: MovementStatus,
    /// Lines; at least one.
    pub lines: Vec<NewMovementLine>,
    /// Explicit tasks.
    pub tasks: Vec<NewMovementTask>,
    /// Append the type's suggested tasks when no explicit tasks are given.
    pub suggest_tasks: bool,
    /// Store the movement even when the stock pre-check reports a shortage.
    pub accept_stock_shortage: bool,
}

impl NewMovement {
    /// Starts a draft request for a movement of `movement_type`.
    #[must_use]
    pub fn new(movement_type: MovementType, warehouse_id: WarehouseId) -> Self {
        Self {
            movement_type,
            priority: MovementPriority::default(),
            warehouse_id,
            source_location_id: None,
            destination_location_id: None,
            reference_number: None,
            notes: None,
            movement_date: None,
            expected_date: None,
            scheduled_date: None,
            initial_status: MovementStatus::Draft,
            lines: Vec::new(),
            tasks: Vec::new(),
            suggest_tasks: false,
            accept_stock_shortage: false,
        }
    }

    /// Sets the source location.
    #[must_use]
    pub fn from_location(mut self, location_id: LocationId) -> Self {
        self.source_location_id = Some(location_id);
        self
    }

    /// Sets the destination location.
    #[must_use]
    pub fn to_location(mut self, location_id: LocationId) -> Self {
        self.destination_location_id = Some(location_id);
        self
    }

    /// Sets the reference number.
    #[must_use]
    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference_number = Some(reference.into());
        self
    }

    /// Sets the priority.
    #[must_use]
    pub fn priority(mut self, priority: MovementPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Creates the movement directly in `Pending`.
    #[must_use]
    pub fn pending(mut self) -> Self {
        self.initial_status = MovementStatus::Pending;
        self
    }

    /// Appends a line.
    #[must_use]
    pub fn line(mut self, line: NewMovementLine) -> Self {
        self.lines.push(line);
        self
    }

    /// Appends a task.
    #[must_use]
    pub fn task(mut self, task: NewMovementTask) -> Self {
        self.tasks.push(task);
        self
    }

    /// Asks for the type's suggested tasks.
    #[must_use]
    pub fn with_suggested_tasks(mut self) -> Self {
        self.suggest_tasks = true;
        self
    }

    /// Proceeds past a stock shortage instead of refusing the movement.
    ///
    /// The shortage is reported back as [`StockCheck::Short`].
    ///
    /// [`StockCheck::Short`]: crate::movement::validation::StockCheck::Short
    #[must_use]
    pub fn accept_stock_shortage(mut self) -> Self {
        self.accept_stock_shortage = true;
        self
    }
}

/// An inventory movement.
///
/// Lines and tasks are owned by the movement and die with it. Counters are
/// computed from them on every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    /// Movement id.
    pub id: MovementId,
    /// Kind of movement.
    pub movement_type: MovementType,
    /// Priority.
    pub priority: MovementPriority,
    /// Lifecycle status.
    pub status: MovementStatus,
    /// Owning warehouse.
    pub warehouse_id: WarehouseId,
    /// Default source location.
    pub source_location_id: Option<LocationId>,
    /// Default destination location.
    pub destination_location_id: Option<LocationId>,
    /// External document number.
    pub reference_number: Option<String>,
    /// Notes.
    pub notes: Option<String>,
    /// Business date.
    pub movement_date: DateTime<Utc>,
    /// Expected completion date.
    pub expected_date: Option<DateTime<Utc>>,
    /// Scheduled execution date.
    pub scheduled_date: Option<DateTime<Utc>>,
    /// First start.
    pub started_at: Option<DateTime<Utc>>,
    /// Completion.
    pub completed_at: Option<DateTime<Utc>>,
    /// Active status the movement was in when put on hold.
    pub held_from: Option<MovementStatus>,
    /// Reason of the latest hold.
    pub hold_reason: Option<String>,
    /// Reason of the cancellation.
    pub cancel_reason: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last write.
    pub updated_at: DateTime<Utc>,
    /// Optimistic-concurrency version, bumped by every store write.
    pub version: u64,
    /// Owned lines, ordered by sequence.
    pub lines: Vec<MovementLine>,
    /// Owned tasks.
    pub tasks: Vec<MovementTask>,
}

/// List-view projection of a movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementSummary {
    /// Movement id.
    pub id: MovementId,
    /// Kind of movement.
    pub movement_type: MovementType,
    /// Priority.
    pub priority: MovementPriority,
    /// Status.
    pub status: MovementStatus,
    /// Owning warehouse.
    pub warehouse_id: WarehouseId,
    /// External document number.
    pub reference_number: Option<String>,
    /// Business date.
    pub movement_date: DateTime<Utc>,
    /// Number of lines.
    pub total_lines: usize,
    /// Number of completed lines.
    pub completed_lines: usize,
    /// Number of open tasks.
    pub pending_tasks: usize,
    /// Completed lines as a whole percentage of all lines.
    pub progress_percent: u8,
}

impl Movement {
    /// Builds a new movement from a validated request.
    ///
    /// Lines get sequences 1..=n in request order; tasks come from the
    /// request or, when asked, from the type's suggestions.
    ///
    /// # Errors
    ///
    /// Returns `IllegalTransition` for a non-entry initial status and the
    /// line construction errors.
    pub fn assemble(
        draft: NewMovement,
        config: &MovementTypeConfig,
    ) -> Result<Self, MovementError> {
        if !draft.initial_status.is_entry() {
            return Err(MovementError::IllegalTransition {
                action: MovementAction::Edit,
                current: draft.initial_status,
            });
        }

        let id = MovementId::new();
        let now = Utc::now();

        let mut lines = Vec::with_capacity(draft.lines.len());
        for (index, line) in draft.lines.into_iter().enumerate() {
            let sequence = u32::try_from(index + 1).unwrap_or(u32::MAX);
            lines.push(MovementLine::from_draft(id, sequence, index, line)?);
        }

        let task_drafts = if draft.tasks.is_empty() && draft.suggest_tasks {
            config.suggested_task_drafts(
                draft.priority,
                draft.source_location_id,
                draft.destination_location_id,
            )
        } else {
            draft.tasks
        };
        let tasks = task_drafts
            .into_iter()
            .map(|task| MovementTask::from_draft(id, task))
            .collect();

        Ok(Self {
            id,
            movement_type: draft.movement_type,
            priority: draft.priority,
            status: draft.initial_status,
            warehouse_id: draft.warehouse_id,
            source_location_id: draft.source_location_id,
            destination_location_id: draft.destination_location_id,
            reference_number: draft.reference_number,
            notes: draft.notes,
            movement_date: draft.movement_date.unwrap_or(now),
            expected_date: draft.expected_date,
            scheduled_date: draft.scheduled_date,
            started_at: None,
            completed_at: None,
            held_from: None,
            hold_reason: None,
            cancel_reason: None,
            created_at: now,
            updated_at: now,
            version: 0,
            lines,
            tasks,
        })
    }

    /// Number of lines.
    #[must_use]
    pub fn total_lines(&self) -> usize {
        self.lines.len()
    }

    /// Number of completed lines; never exceeds `total_lines`.
    #[must_use]
    pub fn completed_lines(&self) -> usize {
        self.lines
            .iter()
            .filter(|line| line.status() == LineStatus::Completed)
            .count()
    }

    /// Number of tasks that are neither completed nor cancelled.
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.tasks
            .iter()
            .filter(|task| !task.status.is_terminal())
            .count()
    }

    /// Tasks whose deadline passed while still open.
    #[must_use]
    pub fn overdue_tasks(&self, now: DateTime<Utc>) -> Vec<&MovementTask> {
        self.tasks.iter().filter(|task| task.is_overdue(now)).collect()
    }

    /// List-view projection.
    #[must_use]
    pub fn summary(&self) -> MovementSummary {
        let total_lines = self.total_lines();
        let completed_lines = self.completed_lines();
        let progress_percent = if total_lines == 0 {
            0
        } else {
            u8::try_from(completed_lines * 100 / total_lines).unwrap_or(100)
        };

        MovementSummary {
            id: self.id,
            movement_type: self.movement_type,
            priority: self.priority,
            status: self.status,
            warehouse_id: self.warehouse_id,
            reference_number: self.reference_number.clone(),
            movement_date: self.movement_date,
            total_lines,
            completed_lines,
            pending_tasks: self.pending_tasks(),
            progress_percent,
        }
    }

    /// Position of a line in `lines`.
    #[must_use]
    pub fn line_index(&self, line_id: MovementLineId) -> Option<usize> {
        self.lines.iter().position(|line| line.id == line_id)
    }

    /// Looks up a line.
    ///
    /// # Errors
    ///
    /// `NotFound` when the line is not part of this movement.
    pub fn line(&self, line_id: MovementLineId) -> Result<&MovementLine, MovementError> {
        self.lines
            .iter()
            .find(|line| line.id == line_id)
            .ok_or(MovementError::NotFound(EntityRef::Line(line_id)))
    }

    /// Looks up a task.
    ///
    /// # Errors
    ///
    /// `NotFound` when the task is not part of this movement.
    pub fn task(&self, task_id: MovementTaskId) -> Result<&MovementTask, MovementError> {
        self.tasks
            .iter()
            .find(|task| task.id == task_id)
            .ok_or(MovementError::NotFound(EntityRef::Task(task_id)))
    }

    /// Looks up a task for mutation.
    ///
    /// # Errors
    ///
    /// `NotFound` when the task is not part of this movement.
    pub fn task_mut(&mut self, task_id: MovementTaskId) -> Result<&mut MovementTask, MovementError> {
        self.tasks
            .iter_mut()
            .find(|task| task.id == task_id)
            .ok_or(MovementError::NotFound(EntityRef::Task(task_id)))
    }

    /// Next free line sequence.
    #[must_use]
    pub fn next_sequence(&self) -> u32 {
        self.lines
            .iter()
            .map(|line| line.sequence)
            .max()
            .map_or(1, |max| max.saturating_add(1))
    }

    /// Appends a line with the next free sequence.
    ///
    /// # Errors
    ///
    /// Line construction errors.
    pub fn push_line(&mut self, draft: NewMovementLine) -> Result<&MovementLine, MovementError> {
        let index = self.lines.len();
        let line = MovementLine::from_draft(self.id, self.next_sequence(), index, draft)?;
        if self.lines.iter().any(|existing| existing.sequence == line.sequence) {
            return Err(MovementError::DuplicateSequence(line.sequence));
        }
        self.lines.push(line);
        Ok(&self.lines[index])
    }

    /// Removes a line.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown line, `EmptyLineSet` when it is the last one.
    pub fn take_line(&mut self, line_id: MovementLineId) -> Result<MovementLine, MovementError> {
        let index = self
            .line_index(line_id)
            .ok_or(MovementError::NotFound(EntityRef::Line(line_id)))?;
        if self.lines.len() == 1 {
            return Err(MovementError::EmptyLineSet);
        }
        Ok(self.lines.remove(index))
    }

    /// Removes a task.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown task.
    pub fn take_task(&mut self, task_id: MovementTaskId) -> Result<MovementTask, MovementError> {
        let index = self
            .tasks
            .iter()
            .position(|task| task.id == task_id)
            .ok_or(MovementError::NotFound(EntityRef::Task(task_id)))?;
        Ok(self.tasks.remove(index))
    }

    /// Writes a validated transition onto the movement.
    ///
    /// Completion also completes every open line.
    pub fn apply_transition(&mut self, transition: &MovementTransition) {
        match transition {
            MovementTransition::Start { started_at, .. } => {
                self.started_at.get_or_insert(*started_at);
            }
            MovementTransition::Complete { completed_at, .. } => {
                self.completed_at = Some(*completed_at);
                for line in &mut self.lines {
                    line.complete_if_open();
                }
            }
            MovementTransition::Hold {
                held_from, reason, ..
            } => {
                self.held_from = Some(*held_from);
                self.hold_reason = Some(reason.clone());
            }
            MovementTransition::Release { .. } => {
                self.held_from = None;
            }
            MovementTransition::Cancel { reason, .. } => {
                self.cancel_reason = Some(reason.clone());
                self.held_from = None;
            }
        }
        self.status = transition.new_status();
        self.updated_at = transition.at();
    }
}
