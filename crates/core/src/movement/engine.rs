//! Movement engine: the inbound API.
//!
//! The engine reads a movement, validates the requested change against the
//! state machines and writes it back under the movement's version guard.
//! It never retries; a lost race surfaces as `ConcurrentModification` and
//! the caller decides whether to re-read and try again.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use stockflow_shared::config::EngineSettings;
use stockflow_shared::types::{
    ItemId, LocationId, MovementId, MovementLineId, MovementTaskId, PageRequest, PageResponse,
};
use tracing::{debug, error, info, warn};

use crate::movement::entity::{Movement, MovementSummary, NewMovement};
use crate::movement::error::{EntityRef, MovementError};
use crate::movement::line::{LineChanges, NewMovementLine};
use crate::movement::ports::{
    CollaboratorError, InventorySink, ItemDirectory, LocationDirectory, StockOracle,
};
use crate::movement::service::{InventoryIntent, MovementTransition, MovementWorkflow};
use crate::movement::store::{MovementFilter, MovementStore};
use crate::movement::task::{MovementTask, NewMovementTask, TaskActionInput, TaskWorkflow};
use crate::movement::types::{LineAction, MovementAction, MovementStatus, TaskAction};
use crate::movement::validation::{
    StockCheck, validate_creation, validate_reference, validate_stock_availability,
};

/// Runtime knobs of the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Whether the stock pre-check runs at all.
    pub stock_validation_enabled: bool,
    /// Budget per stock-availability call.
    pub stock_check_timeout: Duration,
    /// Budget per directory lookup.
    pub directory_timeout: Duration,
    /// Lifetime of cached directory entries.
    pub directory_cache_ttl: Duration,
    /// Capacity of the directory cache.
    pub directory_cache_capacity: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from(&EngineSettings::default())
    }
}

impl From<&EngineSettings> for EngineConfig {
    fn from(settings: &EngineSettings) -> Self {
        Self {
            stock_validation_enabled: settings.stock_validation_enabled,
            stock_check_timeout: Duration::from_millis(settings.stock_check_timeout_ms),
            directory_timeout: Duration::from_millis(settings.directory_timeout_ms),
            directory_cache_ttl: Duration::from_secs(settings.directory_cache_ttl_secs),
            directory_cache_capacity: settings.directory_cache_capacity,
        }
    }
}

/// The external systems the engine talks to.
#[derive(Clone)]
pub struct Collaborators {
    /// Location and warehouse lookups.
    pub locations: Arc<dyn LocationDirectory>,
    /// Item lookups.
    pub items: Arc<dyn ItemDirectory>,
    /// Stock-availability pre-check.
    pub stock: Arc<dyn StockOracle>,
    /// Applies completed movements to inventory.
    pub inventory: Arc<dyn InventorySink>,
}

/// Result of a successful creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedMovement {
    /// The stored movement.
    pub movement: Movement,
    /// What the advisory stock pre-check concluded.
    pub stock_check: StockCheck,
}

/// Result of a successful transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The movement as stored after the transition.
    Updated(Movement),
    /// The movement and its children were deleted.
    Deleted(MovementId),
}

impl TransitionOutcome {
    /// The updated movement, if the transition did not delete it.
    #[must_use]
    pub fn into_movement(self) -> Option<Movement> {
        match self {
            Self::Updated(movement) => Some(movement),
            Self::Deleted(_) => None,
        }
    }
}

/// Orchestrates validation, state machines, persistence and collaborators.
pub struct MovementEngine<S> {
    store: Arc<S>,
    collaborators: Collaborators,
    config: EngineConfig,
}

impl<S: MovementStore> MovementEngine<S> {
    /// Creates an engine over `store`.
    #[must_use]
    pub fn new(store: Arc<S>, collaborators: Collaborators, config: EngineConfig) -> Self {
        Self {
            store,
            collaborators,
            config,
        }
    }

    /// The backing store.
    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validates and stores a new movement.
    ///
    /// Rules are checked in order: type policy and lines, reference number,
    /// entry status, directory existence, stock availability. Directory and
    /// stock failures other than a definite "no" are logged and ignored. A
    /// definite "no" is returned as `InsufficientStock` unless the request
    /// accepts shortages, in which case it is stored with
    /// [`StockCheck::Short`].
    ///
    /// # Errors
    ///
    /// Any validation error, `NotFound` for a warehouse, location or item the
    /// directory does not know, `InsufficientStock`, or a store error.
    pub async fn create_movement(
        &self,
        draft: NewMovement,
    ) -> Result<CreatedMovement, MovementError> {
        let config = validate_creation(
            draft.movement_type,
            draft.source_location_id,
            draft.destination_location_id,
            &draft.lines,
        )?;
        validate_reference(config, draft.reference_number.as_deref())?;
        if !draft.initial_status.is_entry() {
            return Err(MovementError::IllegalTransition {
                action: MovementAction::Edit,
                current: draft.initial_status,
            });
        }

        self.verify_directory(&draft).await?;

        let stock_check = match validate_stock_availability(
            config,
            &draft.lines,
            draft.source_location_id,
            self.collaborators.stock.as_ref(),
            self.config.stock_check_timeout,
            self.config.stock_validation_enabled,
        )
        .await
        {
            Err(MovementError::InsufficientStock {
                item_id,
                location_id,
                line_index,
            }) if draft.accept_stock_shortage => {
                warn!(
                    item_id = %item_id,
                    location_id = %location_id,
                    line_index,
                    "Stock shortage accepted by request"
                );
                StockCheck::Short {
                    item_id,
                    location_id,
                    line_index,
                }
            }
            other => other?,
        };

        let movement = Movement::assemble(draft, config)?;
        self.store.insert(&movement).await?;

        info!(
            movement_id = %movement.id,
            movement_type = %movement.movement_type,
            status = %movement.status,
            lines = movement.total_lines(),
            tasks = movement.tasks.len(),
            "Movement created"
        );

        Ok(CreatedMovement {
            movement,
            stock_check,
        })
    }

    /// Reads a movement and applies `action` to it.
    ///
    /// # Errors
    ///
    /// `NotFound`, then the errors of [`Self::commit_transition`].
    pub async fn transition(
        &self,
        movement_id: MovementId,
        action: MovementAction,
        reason: Option<String>,
    ) -> Result<TransitionOutcome, MovementError> {
        let snapshot = self.store.get(movement_id).await?;
        self.commit_transition(snapshot, action, reason).await
    }

    /// Applies `action` to a snapshot the caller already holds.
    ///
    /// The write only succeeds if nobody else wrote since the snapshot was
    /// read. Completion is committed first and then handed to the inventory
    /// sink exactly once; if the sink fails the completion is rolled back
    /// and `InventorySink` is returned.
    ///
    /// # Errors
    ///
    /// `IllegalTransition`, `MissingReason`, `ConcurrentModification`,
    /// `InventorySink` or a store error.
    pub async fn commit_transition(
        &self,
        snapshot: Movement,
        action: MovementAction,
        reason: Option<String>,
    ) -> Result<TransitionOutcome, MovementError> {
        let Some(transition) = MovementWorkflow::transition(&snapshot, action, reason)? else {
            if action == MovementAction::Delete {
                self.store.delete(snapshot.id, snapshot.version).await?;
                info!(movement_id = %snapshot.id, "Movement deleted");
                return Ok(TransitionOutcome::Deleted(snapshot.id));
            }
            return Ok(TransitionOutcome::Updated(snapshot));
        };

        let mut next = snapshot.clone();
        next.apply_transition(&transition);
        let saved = self.store.compare_and_swap(&next, snapshot.version).await?;

        if matches!(transition, MovementTransition::Complete { .. }) {
            self.apply_inventory(snapshot, &saved).await?;
            info!(movement_id = %saved.id, version = saved.version, "Movement completed");
        } else {
            debug!(
                movement_id = %saved.id,
                action = %action,
                status = %saved.status,
                version = saved.version,
                "Movement transitioned"
            );
        }

        Ok(TransitionOutcome::Updated(saved))
    }

    /// Hard-deletes a draft or cancelled movement with its children.
    ///
    /// # Errors
    ///
    /// `NotFound`, `IllegalTransition` from any other status, or
    /// `ConcurrentModification`.
    pub async fn delete_movement(&self, movement_id: MovementId) -> Result<(), MovementError> {
        self.transition(movement_id, MovementAction::Delete, None)
            .await
            .map(|_| ())
    }

    /// Appends a line to an editable movement.
    ///
    /// # Errors
    ///
    /// `IllegalTransition` unless Draft or Pending, `InvalidQuantity`, or
    /// `ConcurrentModification`.
    pub async fn add_line(
        &self,
        movement_id: MovementId,
        line: NewMovementLine,
    ) -> Result<Movement, MovementError> {
        let mut movement = self.store.get(movement_id).await?;
        MovementWorkflow::ensure_editable(movement.status)?;
        let expected = movement.version;

        movement.push_line(line)?;
        self.save(movement, expected).await
    }

    /// Changes a line of an editable movement.
    ///
    /// The requested quantity cannot be changed. Once the movement has
    /// started, use [`Self::correct_line_quantity`] instead.
    ///
    /// # Errors
    ///
    /// `NotFound`, `IllegalTransition` unless editable, the line's own
    /// correction errors, or `ConcurrentModification`.
    pub async fn mutate_line(
        &self,
        line_id: MovementLineId,
        changes: LineChanges,
    ) -> Result<Movement, MovementError> {
        let mut movement = self.owner_of_line(line_id).await?;
        MovementWorkflow::ensure_editable(movement.status)?;
        let expected = movement.version;

        let index = movement
            .line_index(line_id)
            .ok_or(MovementError::NotFound(EntityRef::Line(line_id)))?;
        movement.lines[index].apply_changes(changes, index)?;
        self.save(movement, expected).await
    }

    /// Records the quantity actually moved on a line.
    ///
    /// Unlike [`Self::mutate_line`] this is allowed on running and held
    /// movements, so a short pick can be booked before completion.
    ///
    /// # Errors
    ///
    /// `NotFound`, `InactiveMovement` once the movement is completed or
    /// cancelled, `IllegalLineTransition` once the line is, `InvalidQuantity`
    /// for a negative quantity, or `ConcurrentModification`.
    pub async fn correct_line_quantity(
        &self,
        line_id: MovementLineId,
        quantity: Decimal,
    ) -> Result<Movement, MovementError> {
        let mut movement = self.owner_of_line(line_id).await?;
        if movement.status.is_terminal() {
            return Err(MovementError::InactiveMovement {
                current: movement.status,
            });
        }
        let expected = movement.version;

        let index = movement
            .line_index(line_id)
            .ok_or(MovementError::NotFound(EntityRef::Line(line_id)))?;
        movement.lines[index].correct_actual_quantity(quantity, index)?;
        debug!(line_id = %line_id, quantity = %quantity, "Line quantity corrected");
        self.save(movement, expected).await
    }

    /// Removes a line from an editable movement, keeping at least one.
    ///
    /// # Errors
    ///
    /// `NotFound`, `IllegalTransition` unless editable, `EmptyLineSet`, or
    /// `ConcurrentModification`.
    pub async fn remove_line(&self, line_id: MovementLineId) -> Result<Movement, MovementError> {
        let mut movement = self.owner_of_line(line_id).await?;
        MovementWorkflow::ensure_editable(movement.status)?;
        let expected = movement.version;

        movement.take_line(line_id)?;
        self.save(movement, expected).await
    }

    /// Moves a line of a running movement through its state machine.
    ///
    /// # Errors
    ///
    /// `NotFound`, `InactiveMovement` unless InProgress,
    /// `IllegalLineTransition`, or `ConcurrentModification`.
    pub async fn transition_line(
        &self,
        line_id: MovementLineId,
        action: LineAction,
    ) -> Result<Movement, MovementError> {
        let mut movement = self.owner_of_line(line_id).await?;
        if movement.status != MovementStatus::InProgress {
            return Err(MovementError::InactiveMovement {
                current: movement.status,
            });
        }
        let expected = movement.version;

        let index = movement
            .line_index(line_id)
            .ok_or(MovementError::NotFound(EntityRef::Line(line_id)))?;
        let status = movement.lines[index].apply(action)?;
        debug!(line_id = %line_id, action = %action, status = %status, "Line transitioned");
        self.save(movement, expected).await
    }

    /// Adds a task to an editable movement.
    ///
    /// # Errors
    ///
    /// `IllegalTransition` unless editable, or `ConcurrentModification`.
    pub async fn add_task(
        &self,
        movement_id: MovementId,
        task: NewMovementTask,
    ) -> Result<Movement, MovementError> {
        let mut movement = self.store.get(movement_id).await?;
        MovementWorkflow::ensure_editable(movement.status)?;
        let expected = movement.version;

        movement.tasks.push(MovementTask::from_draft(movement.id, task));
        self.save(movement, expected).await
    }

    /// Removes a task from an editable movement.
    ///
    /// # Errors
    ///
    /// `NotFound`, `IllegalTransition` unless editable, or
    /// `ConcurrentModification`.
    pub async fn remove_task(&self, task_id: MovementTaskId) -> Result<Movement, MovementError> {
        let mut movement = self.owner_of_task(task_id).await?;
        MovementWorkflow::ensure_editable(movement.status)?;
        let expected = movement.version;

        movement.take_task(task_id)?;
        self.save(movement, expected).await
    }

    /// Moves a task through its state machine.
    ///
    /// Allowed while the owning movement is not completed or cancelled.
    ///
    /// # Errors
    ///
    /// `NotFound`, `InactiveMovement`, `IllegalTaskTransition`,
    /// `MissingAssignee`, `MissingReason`, or `ConcurrentModification`.
    pub async fn transition_task(
        &self,
        task_id: MovementTaskId,
        action: TaskAction,
        input: TaskActionInput,
    ) -> Result<Movement, MovementError> {
        let mut movement = self.owner_of_task(task_id).await?;
        if movement.status.is_terminal() {
            return Err(MovementError::InactiveMovement {
                current: movement.status,
            });
        }
        let expected = movement.version;

        let transition = TaskWorkflow::transition(movement.task(task_id)?, action, input)?;
        movement.task_mut(task_id)?.apply_transition(&transition);
        debug!(
            task_id = %task_id,
            action = %action,
            status = %transition.new_status(),
            "Task transitioned"
        );
        self.save(movement, expected).await
    }

    /// Actions the movement's current status allows.
    ///
    /// # Errors
    ///
    /// `NotFound`.
    pub async fn allowed_actions(
        &self,
        movement_id: MovementId,
    ) -> Result<Vec<MovementAction>, MovementError> {
        let movement = self.store.get(movement_id).await?;
        Ok(MovementWorkflow::allowed_actions(movement.status))
    }

    /// Loads a movement.
    ///
    /// # Errors
    ///
    /// `NotFound`.
    pub async fn get(&self, movement_id: MovementId) -> Result<Movement, MovementError> {
        self.store.get(movement_id).await
    }

    /// Lists movement summaries.
    ///
    /// # Errors
    ///
    /// Store errors.
    pub async fn list(
        &self,
        filter: &MovementFilter,
        page: PageRequest,
    ) -> Result<PageResponse<MovementSummary>, MovementError> {
        self.store.list(filter, page).await
    }

    async fn save(&self, mut movement: Movement, expected: u64) -> Result<Movement, MovementError> {
        movement.updated_at = Utc::now();
        self.store.compare_and_swap(&movement, expected).await
    }

    async fn owner_of_line(&self, line_id: MovementLineId) -> Result<Movement, MovementError> {
        let movement_id = self
            .store
            .find_line(line_id)
            .await?
            .ok_or(MovementError::NotFound(EntityRef::Line(line_id)))?;
        self.store.get(movement_id).await
    }

    async fn owner_of_task(&self, task_id: MovementTaskId) -> Result<Movement, MovementError> {
        let movement_id = self
            .store
            .find_task(task_id)
            .await?
            .ok_or(MovementError::NotFound(EntityRef::Task(task_id)))?;
        self.store.get(movement_id).await
    }

    /// Hands a committed completion to the inventory sink, undoing the
    /// commit when the sink refuses.
    async fn apply_inventory(
        &self,
        before: Movement,
        completed: &Movement,
    ) -> Result<(), MovementError> {
        let config = completed.movement_type.config()?;
        let intent = InventoryIntent::for_movement(completed, config);

        let Err(err) = self
            .collaborators
            .inventory
            .apply_movement_deltas(&intent)
            .await
        else {
            return Ok(());
        };

        error!(
            movement_id = %completed.id,
            deltas = intent.deltas.len(),
            error = %err,
            "Inventory sink failed, rolling back completion"
        );
        if let Err(rollback) = self.store.compare_and_swap(&before, completed.version).await {
            error!(movement_id = %completed.id, error = %rollback, "Completion rollback failed");
        }
        Err(MovementError::InventorySink(err.to_string()))
    }

    async fn verify_directory(&self, draft: &NewMovement) -> Result<(), MovementError> {
        let timeout = self.config.directory_timeout;
        let locations = &self.collaborators.locations;

        let warehouse = draft.warehouse_id;
        if let Some(found) =
            advisory(timeout, "warehouse", locations.get_warehouse(warehouse)).await
        {
            found.ok_or(MovementError::NotFound(EntityRef::Warehouse(warehouse)))?;
        }

        let location_ids: BTreeSet<LocationId> = draft
            .source_location_id
            .into_iter()
            .chain(draft.destination_location_id)
            .chain(draft.lines.iter().flat_map(|line| {
                line.from_location_id.into_iter().chain(line.to_location_id)
            }))
            .collect();
        for location_id in location_ids {
            if let Some(found) =
                advisory(timeout, "location", locations.get_location(location_id)).await
            {
                found.ok_or(MovementError::NotFound(EntityRef::Location(location_id)))?;
            }
        }

        let item_ids: BTreeSet<ItemId> = draft.lines.iter().map(|line| line.item_id).collect();
        for item_id in item_ids {
            if let Some(found) =
                advisory(timeout, "item", self.collaborators.items.get_item(item_id)).await
            {
                found.ok_or(MovementError::NotFound(EntityRef::Item(item_id)))?;
            }
        }

        Ok(())
    }
}

/// Runs a directory lookup with a time budget.
///
/// `None` means the directory could not answer and the check is skipped.
async fn advisory<T>(
    timeout: Duration,
    what: &'static str,
    lookup: impl Future<Output = Result<Option<T>, CollaboratorError>>,
) -> Option<Option<T>> {
    match tokio::time::timeout(timeout, lookup).await {
        Ok(Ok(found)) => Some(found),
        Ok(Err(err)) => {
            warn!(lookup = what, error = %err, "Directory lookup failed, continuing");
            None
        }
        Err(_) => {
            let err = CollaboratorError::Timeout(timeout);
            warn!(lookup = what, error = %err, "Directory lookup timed out, continuing");
            None
        }
    }
}
