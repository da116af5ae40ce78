//! Movement persistence port.
//!
//! A movement is always written together with its lines and tasks. Every
//! write after the insert is guarded by the movement's version: the store
//! only accepts it when the stored version still equals the version the
//! caller read, and then bumps it.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};
use stockflow_shared::types::{
    MovementId, MovementLineId, MovementTaskId, PageRequest, PageResponse, WarehouseId,
};

use crate::movement::entity::{Movement, MovementSummary};
use crate::movement::error::{EntityRef, MovementError};
use crate::movement::types::{MovementPriority, MovementStatus, MovementType};

/// Filter for listing movements. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementFilter {
    /// Only this warehouse.
    pub warehouse_id: Option<WarehouseId>,
    /// Only this status.
    pub status: Option<MovementStatus>,
    /// Only this type.
    pub movement_type: Option<MovementType>,
    /// Only this priority.
    pub priority: Option<MovementPriority>,
}

impl MovementFilter {
    /// True when `movement` passes every set field.
    #[must_use]
    pub fn matches(&self, movement: &Movement) -> bool {
        self.warehouse_id.is_none_or(|id| id == movement.warehouse_id)
            && self.status.is_none_or(|status| status == movement.status)
            && self
                .movement_type
                .is_none_or(|movement_type| movement_type == movement.movement_type)
            && self.priority.is_none_or(|priority| priority == movement.priority)
    }
}

/// Storage for movements and their children.
#[async_trait]
pub trait MovementStore: Send + Sync {
    /// Stores a new movement with its lines and tasks.
    async fn insert(&self, movement: &Movement) -> Result<(), MovementError>;

    /// Loads a movement with its children.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id.
    async fn get(&self, id: MovementId) -> Result<Movement, MovementError>;

    /// Lists movement summaries, newest first.
    async fn list(
        &self,
        filter: &MovementFilter,
        page: PageRequest,
    ) -> Result<PageResponse<MovementSummary>, MovementError>;

    /// Replaces the stored movement if its version is still
    /// `expected_version`, and returns it with the bumped version.
    ///
    /// # Errors
    ///
    /// `ConcurrentModification` when the stored version moved on,
    /// `NotFound` when the movement is gone.
    async fn compare_and_swap(
        &self,
        movement: &Movement,
        expected_version: u64,
    ) -> Result<Movement, MovementError>;

    /// Deletes a movement and its children under the same version guard.
    async fn delete(&self, id: MovementId, expected_version: u64) -> Result<(), MovementError>;

    /// Finds the movement owning a line.
    async fn find_line(&self, line_id: MovementLineId) -> Result<Option<MovementId>, MovementError>;

    /// Finds the movement owning a task.
    async fn find_task(&self, task_id: MovementTaskId) -> Result<Option<MovementId>, MovementError>;
}

/// Lock-free in-process store.
#[derive(Debug, Default)]
pub struct InMemoryMovementStore {
    movements: DashMap<MovementId, Movement>,
}

impl InMemoryMovementStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored movements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.movements.len()
    }

    /// True when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.movements.is_empty()
    }
}

#[async_trait]
impl MovementStore for InMemoryMovementStore {
    async fn insert(&self, movement: &Movement) -> Result<(), MovementError> {
        match self.movements.entry(movement.id) {
            Entry::Occupied(_) => Err(MovementError::Store(format!(
                "movement {} already exists",
                movement.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(movement.clone());
                Ok(())
            }
        }
    }

    async fn get(&self, id: MovementId) -> Result<Movement, MovementError> {
        self.movements
            .get(&id)
            .map(|stored| stored.clone())
            .ok_or(MovementError::NotFound(EntityRef::Movement(id)))
    }

    async fn list(
        &self,
        filter: &MovementFilter,
        page: PageRequest,
    ) -> Result<PageResponse<MovementSummary>, MovementError> {
        let mut matching: Vec<MovementSummary> = self
            .movements
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().summary())
            .collect();
        matching.sort_by(|a, b| b.movement_date.cmp(&a.movement_date).then(b.id.cmp(&a.id)));

        let total = u64::try_from(matching.len()).unwrap_or(u64::MAX);
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
        let data = matching.into_iter().skip(offset).take(limit).collect();

        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }

    async fn compare_and_swap(
        &self,
        movement: &Movement,
        expected_version: u64,
    ) -> Result<Movement, MovementError> {
        let mut stored = self
            .movements
            .get_mut(&movement.id)
            .ok_or(MovementError::NotFound(EntityRef::Movement(movement.id)))?;
        if stored.version != expected_version {
            return Err(MovementError::ConcurrentModification {
                movement_id: movement.id,
            });
        }

        let mut next = movement.clone();
        next.version = expected_version + 1;
        *stored = next.clone();
        Ok(next)
    }

    async fn delete(&self, id: MovementId, expected_version: u64) -> Result<(), MovementError> {
        match self.movements.entry(id) {
            Entry::Vacant(_) => Err(MovementError::NotFound(EntityRef::Movement(id))),
            Entry::Occupied(slot) if slot.get().version != expected_version => {
                Err(MovementError::ConcurrentModification { movement_id: id })
            }
            Entry::Occupied(slot) => {
                slot.remove();
                Ok(())
            }
        }
    }

    async fn find_line(&self, line_id: MovementLineId) -> Result<Option<MovementId>, MovementError> {
        Ok(self
            .movements
            .iter()
            .find(|entry| entry.lines.iter().any(|line| line.id == line_id))
            .map(|entry| *entry.key()))
    }

    async fn find_task(&self, task_id: MovementTaskId) -> Result<Option<MovementId>, MovementError> {
        Ok(self
            .movements
            .iter()
            .find(|entry| entry.tasks.iter().any(|task| task.id == task_id))
            .map(|entry| *entry.key()))
    }
}
