//! End-to-end tests for MovementEngine over the in-memory store.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use stockflow_shared::types::{
    ItemId, LocationId, PageRequest, SiteId, UnitOfMeasure, UserId, WarehouseId,
};

use crate::movement::engine::{Collaborators, EngineConfig, MovementEngine, TransitionOutcome};
use crate::movement::entity::{Movement, NewMovement};
use crate::movement::error::{EntityRef, LocationRole, MovementError};
use crate::movement::line::{LineChanges, NewMovementLine};
use crate::movement::ports::{
    CollaboratorError, InventorySink, Item, ItemDirectory, Location, LocationDirectory,
    StockOracle, Warehouse,
};
use crate::movement::service::InventoryIntent;
use crate::movement::store::{InMemoryMovementStore, MovementFilter};
use crate::movement::task::{NewMovementTask, TaskActionInput};
use crate::movement::types::{
    LineAction, LineStatus, MovementAction, MovementStatus, MovementType, TaskAction, TaskStatus,
    TaskType,
};
use crate::movement::validation::StockCheck;

// ============================================================================
// Fakes
// ============================================================================

/// Directory that knows one warehouse and every location not marked unknown.
#[derive(Default)]
struct FakeDirectory {
    warehouse: Option<WarehouseId>,
    unknown_locations: HashSet<LocationId>,
    offline: bool,
}

#[async_trait]
impl LocationDirectory for FakeDirectory {
    async fn get_location(&self, id: LocationId) -> Result<Option<Location>, CollaboratorError> {
        if self.offline {
            return Err(CollaboratorError::Unavailable("directory down".into()));
        }
        Ok((!self.unknown_locations.contains(&id)).then(|| Location {
            id,
            warehouse_id: self.warehouse.unwrap_or_default(),
            code: "A-01".into(),
            name: "Aisle".into(),
            is_active: true,
        }))
    }

    async fn get_warehouse(
        &self,
        id: WarehouseId,
    ) -> Result<Option<Warehouse>, CollaboratorError> {
        if self.offline {
            return Err(CollaboratorError::Unavailable("directory down".into()));
        }
        Ok((self.warehouse == Some(id)).then(|| Warehouse {
            id,
            site_id: SiteId::new(),
            code: "WH1".into(),
            name: "Main".into(),
            is_active: true,
        }))
    }
}

#[async_trait]
impl ItemDirectory for FakeDirectory {
    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, CollaboratorError> {
        if self.offline {
            return Err(CollaboratorError::Unavailable("directory down".into()));
        }
        Ok(Some(Item {
            id,
            sku: "SKU-1".into(),
            name: "Widget".into(),
            default_unit: UnitOfMeasure::Each,
        }))
    }
}

/// Oracle with the same stock everywhere; `None` means offline.
struct FakeStock(Option<Decimal>);

#[async_trait]
impl StockOracle for FakeStock {
    async fn has_available_stock(
        &self,
        _item_id: ItemId,
        _location_id: LocationId,
        quantity: Decimal,
    ) -> Result<bool, CollaboratorError> {
        self.0
            .map(|available| available >= quantity)
            .ok_or_else(|| CollaboratorError::Unavailable("oracle down".into()))
    }
}

/// Sink recording every intent it receives.
#[derive(Default)]
struct RecordingSink {
    calls: AtomicUsize,
    intents: Mutex<Vec<InventoryIntent>>,
    fail: bool,
}

#[async_trait]
impl InventorySink for RecordingSink {
    async fn apply_movement_deltas(
        &self,
        intent: &InventoryIntent,
    ) -> Result<(), CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.intents.lock().unwrap().push(intent.clone());
        if self.fail {
            Err(CollaboratorError::Rejected("ledger closed".into()))
        } else {
            Ok(())
        }
    }
}

struct Harness {
    engine: MovementEngine<InMemoryMovementStore>,
    sink: Arc<RecordingSink>,
    warehouse: WarehouseId,
}

fn harness_with(directory: FakeDirectory, stock: FakeStock, sink: RecordingSink) -> Harness {
    let warehouse = directory.warehouse.unwrap_or_default();
    let directory = Arc::new(directory);
    let sink = Arc::new(sink);
    let collaborators = Collaborators {
        locations: directory.clone(),
        items: directory,
        stock: Arc::new(stock),
        inventory: sink.clone(),
    };
    let config = EngineConfig {
        stock_check_timeout: std::time::Duration::from_millis(200),
        directory_timeout: std::time::Duration::from_millis(200),
        ..EngineConfig::default()
    };
    Harness {
        engine: MovementEngine::new(Arc::new(InMemoryMovementStore::new()), collaborators, config),
        sink,
        warehouse,
    }
}

fn harness() -> Harness {
    let warehouse = WarehouseId::new();
    harness_with(
        FakeDirectory {
            warehouse: Some(warehouse),
            ..FakeDirectory::default()
        },
        FakeStock(Some(dec!(100))),
        RecordingSink::default(),
    )
}

fn transfer(warehouse: WarehouseId) -> NewMovement {
    NewMovement::new(MovementType::Transfer, warehouse)
        .from_location(LocationId::new())
        .to_location(LocationId::new())
        .line(NewMovementLine::new(ItemId::new(), dec!(5)))
}

async fn create(h: &Harness, draft: NewMovement) -> Movement {
    h.engine.create_movement(draft).await.unwrap().movement
}

async fn act(h: &Harness, movement: &Movement, action: MovementAction) -> Movement {
    h.engine
        .transition(movement.id, action, Some("operator request".into()))
        .await
        .unwrap()
        .into_movement()
        .unwrap()
}

// ============================================================================
// Creation
// ============================================================================

#[tokio::test]
async fn test_create_transfer_and_missing_destination() {
    let h = harness();

    let created = h.engine.create_movement(transfer(h.warehouse)).await.unwrap();
    assert_eq!(created.movement.status, MovementStatus::Draft);
    assert_eq!(created.movement.lines[0].sequence, 1);
    assert_eq!(created.movement.lines[0].actual_quantity(), dec!(5));
    assert_eq!(created.stock_check, StockCheck::Verified { lines_checked: 1 });

    let mut draft = transfer(h.warehouse);
    draft.destination_location_id = None;
    assert!(matches!(
        h.engine.create_movement(draft).await,
        Err(MovementError::MissingLocation {
            role: LocationRole::Destination,
            ..
        })
    ));
    assert_eq!(h.engine.store().len(), 1);
}

#[tokio::test]
async fn test_create_issue_with_short_stock_is_rejected() {
    let warehouse = WarehouseId::new();
    let h = harness_with(
        FakeDirectory {
            warehouse: Some(warehouse),
            ..FakeDirectory::default()
        },
        FakeStock(Some(dec!(3))),
        RecordingSink::default(),
    );
    let item = ItemId::new();
    let source = LocationId::new();
    let draft = NewMovement::new(MovementType::Issue, warehouse)
        .from_location(source)
        .line(NewMovementLine::new(item, dec!(10)));

    let err = h.engine.create_movement(draft).await.unwrap_err();

    assert!(err.is_recoverable());
    assert!(matches!(
        err,
        MovementError::InsufficientStock { item_id, location_id, line_index: 0 }
            if item_id == item && location_id == source
    ));
    assert!(h.engine.store().is_empty());
}

#[tokio::test]
async fn test_create_issue_accepting_shortage_is_stored() {
    let warehouse = WarehouseId::new();
    let h = harness_with(
        FakeDirectory {
            warehouse: Some(warehouse),
            ..FakeDirectory::default()
        },
        FakeStock(Some(dec!(3))),
        RecordingSink::default(),
    );
    let item = ItemId::new();
    let source = LocationId::new();
    let draft = NewMovement::new(MovementType::Issue, warehouse)
        .from_location(source)
        .line(NewMovementLine::new(ItemId::new(), dec!(2)))
        .line(NewMovementLine::new(item, dec!(10)))
        .accept_stock_shortage();

    let created = h.engine.create_movement(draft).await.unwrap();

    assert_eq!(
        created.stock_check,
        StockCheck::Short {
            item_id: item,
            location_id: source,
            line_index: 1,
        }
    );
    assert!(!created.stock_check.is_verified());
    assert_eq!(h.engine.get(created.movement.id).await.unwrap(), created.movement);
}

#[tokio::test]
async fn test_create_proceeds_when_collaborators_are_down() {
    let h = harness_with(
        FakeDirectory {
            offline: true,
            ..FakeDirectory::default()
        },
        FakeStock(None),
        RecordingSink::default(),
    );

    let created = h.engine.create_movement(transfer(WarehouseId::new())).await.unwrap();

    assert!(matches!(created.stock_check, StockCheck::Skipped(_)));
}

#[tokio::test]
async fn test_create_rejects_unknown_directory_entries() {
    let h = harness();
    assert!(matches!(
        h.engine.create_movement(transfer(WarehouseId::new())).await,
        Err(MovementError::NotFound(EntityRef::Warehouse(_)))
    ));

    let ghost = LocationId::new();
    let warehouse = WarehouseId::new();
    let h = harness_with(
        FakeDirectory {
            warehouse: Some(warehouse),
            unknown_locations: HashSet::from([ghost]),
            offline: false,
        },
        FakeStock(Some(dec!(100))),
        RecordingSink::default(),
    );
    let draft = transfer(warehouse).line(NewMovementLine::new(ItemId::new(), dec!(1)).to_location(ghost));
    assert!(matches!(
        h.engine.create_movement(draft).await,
        Err(MovementError::NotFound(EntityRef::Location(id))) if id == ghost
    ));
}

#[tokio::test]
async fn test_create_rejects_legacy_type_and_missing_reference() {
    let h = harness();
    let draft = NewMovement::new(MovementType::Inbound, h.warehouse)
        .to_location(LocationId::new())
        .line(NewMovementLine::new(ItemId::new(), dec!(1)));
    assert!(matches!(
        h.engine.create_movement(draft).await,
        Err(MovementError::UnconfiguredType(MovementType::Inbound))
    ));

    let receipt = NewMovement::new(MovementType::Receipt, h.warehouse)
        .to_location(LocationId::new())
        .line(NewMovementLine::new(ItemId::new(), dec!(1)));
    assert!(matches!(
        h.engine.create_movement(receipt.clone()).await,
        Err(MovementError::MissingReferenceNumber(MovementType::Receipt))
    ));
    assert!(h.engine.create_movement(receipt.reference("PO-7")).await.is_ok());
}

#[tokio::test]
async fn test_create_rejects_non_entry_status() {
    let h = harness();
    let mut draft = transfer(h.warehouse);
    draft.initial_status = MovementStatus::Completed;
    assert!(matches!(
        h.engine.create_movement(draft).await,
        Err(MovementError::IllegalTransition {
            action: MovementAction::Edit,
            current: MovementStatus::Completed
        })
    ));
}

#[tokio::test]
async fn test_create_with_suggested_tasks() {
    let h = harness();
    let movement = create(&h, transfer(h.warehouse).with_suggested_tasks()).await;
    let types: Vec<TaskType> = movement.tasks.iter().map(|t| t.task_type).collect();
    assert_eq!(types, vec![TaskType::Pick, TaskType::Transfer, TaskType::Putaway]);
    assert_eq!(movement.tasks[2].location_id, movement.destination_location_id);
    assert_eq!(movement.tasks[0].location_id, movement.source_location_id);
}

// ============================================================================
// Movement lifecycle
// ============================================================================

#[tokio::test]
async fn test_pending_start_complete_emits_intent_once() {
    let h = harness();
    let movement = create(&h, transfer(h.warehouse).pending()).await;
    assert_eq!(movement.status, MovementStatus::Pending);

    let started = act(&h, &movement, MovementAction::Start).await;
    assert_eq!(started.status, MovementStatus::InProgress);
    assert!(started.started_at.is_some());

    let completed = act(&h, &started, MovementAction::Complete).await;
    assert_eq!(completed.status, MovementStatus::Completed);
    assert!(completed.completed_at.is_some());
    assert_eq!(completed.completed_lines(), completed.total_lines());

    assert_eq!(h.sink.calls.load(Ordering::SeqCst), 1);
    let intents = h.sink.intents.lock().unwrap();
    let intent = &intents[0];
    assert_eq!(intent.movement_id, movement.id);
    assert_eq!(intent.deltas.len(), 2);
    assert_eq!(intent.deltas[0].quantity, dec!(-5));
    assert_eq!(intent.deltas[1].quantity, dec!(5));
}

#[tokio::test]
async fn test_complete_from_wrong_status_leaves_state() {
    let h = harness();
    let movement = create(&h, transfer(h.warehouse).pending()).await;

    let result = h
        .engine
        .transition(movement.id, MovementAction::Complete, None)
        .await;

    assert!(matches!(result, Err(MovementError::IllegalTransition { .. })));
    let stored = h.engine.get(movement.id).await.unwrap();
    assert_eq!(stored.status, MovementStatus::Pending);
    assert_eq!(stored.version, movement.version);
    assert_eq!(h.sink.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_hold_release_restores_in_progress() {
    let h = harness();
    let movement = create(&h, transfer(h.warehouse)).await;
    let running = act(&h, &movement, MovementAction::Start).await;

    assert!(matches!(
        h.engine
            .transition(running.id, MovementAction::Hold, Some(String::new()))
            .await,
        Err(MovementError::MissingReason { .. })
    ));

    let held = act(&h, &running, MovementAction::Hold).await;
    assert_eq!(held.status, MovementStatus::OnHold);
    assert_eq!(held.held_from, Some(MovementStatus::InProgress));
    assert_eq!(held.hold_reason.as_deref(), Some("operator request"));

    let released = act(&h, &held, MovementAction::Release).await;
    assert_eq!(released.status, MovementStatus::InProgress);
    assert_eq!(released.held_from, None);
}

#[tokio::test]
async fn test_cancel_twice_fails_and_keeps_state() {
    let h = harness();
    let movement = create(&h, transfer(h.warehouse).pending()).await;

    let cancelled = act(&h, &movement, MovementAction::Cancel).await;
    assert_eq!(cancelled.status, MovementStatus::Cancelled);
    assert_eq!(cancelled.cancel_reason.as_deref(), Some("operator request"));

    let again = h
        .engine
        .transition(movement.id, MovementAction::Cancel, Some("again".into()))
        .await;
    assert!(matches!(
        again,
        Err(MovementError::IllegalTransition {
            current: MovementStatus::Cancelled,
            ..
        })
    ));
    assert_eq!(h.engine.get(movement.id).await.unwrap(), cancelled);
}

#[tokio::test]
async fn test_delete_only_draft_or_cancelled() {
    let h = harness();
    let draft = create(&h, transfer(h.warehouse)).await;
    let pending = create(&h, transfer(h.warehouse).pending()).await;

    h.engine.delete_movement(draft.id).await.unwrap();
    assert!(matches!(
        h.engine.get(draft.id).await,
        Err(MovementError::NotFound(EntityRef::Movement(_)))
    ));

    assert!(matches!(
        h.engine.delete_movement(pending.id).await,
        Err(MovementError::IllegalTransition {
            action: MovementAction::Delete,
            ..
        })
    ));

    act(&h, &pending, MovementAction::Cancel).await;
    let outcome = h
        .engine
        .transition(pending.id, MovementAction::Delete, None)
        .await
        .unwrap();
    assert_eq!(outcome, TransitionOutcome::Deleted(pending.id));
    assert!(h.engine.store().is_empty());
}

#[tokio::test]
async fn test_allowed_actions_follow_status() {
    let h = harness();
    let movement = create(&h, transfer(h.warehouse)).await;
    assert_eq!(
        h.engine.allowed_actions(movement.id).await.unwrap(),
        vec![
            MovementAction::Start,
            MovementAction::Delete,
            MovementAction::Edit
        ]
    );
    act(&h, &movement, MovementAction::Start).await;
    assert!(
        h.engine
            .allowed_actions(movement.id)
            .await
            .unwrap()
            .contains(&MovementAction::Complete)
    );
}

// ============================================================================
// Concurrency and the inventory sink
// ============================================================================

#[tokio::test]
async fn test_concurrent_complete_exactly_one_wins() {
    let h = Arc::new(harness());
    let movement = create(&h, transfer(h.warehouse)).await;
    let running = act(&h, &movement, MovementAction::Start).await;

    let attempts = (0..2).map(|_| {
        let h = Arc::clone(&h);
        let snapshot = running.clone();
        async move {
            h.engine
                .commit_transition(snapshot, MovementAction::Complete, None)
                .await
        }
    });
    let results = futures::future::join_all(attempts).await;

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(MovementError::ConcurrentModification { .. })))
        .count();
    assert_eq!(successes, 1);
    assert_eq!(conflicts, 1);
    assert_eq!(h.sink.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_concurrent_complete_across_tasks() {
    let h = Arc::new(harness());
    let movement = create(&h, transfer(h.warehouse)).await;
    let running = act(&h, &movement, MovementAction::Start).await;
    let barrier = Arc::new(tokio::sync::Barrier::new(2));

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let h = Arc::clone(&h);
            let barrier = Arc::clone(&barrier);
            let snapshot = running.clone();
            tokio::spawn(async move {
                barrier.wait().await;
                h.engine
                    .commit_transition(snapshot, MovementAction::Complete, None)
                    .await
            })
        })
        .collect();

    let mut successes = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(err) => {
                assert!(err.is_retryable());
                conflicts += 1;
            }
        }
    }
    assert_eq!((successes, conflicts), (1, 1));
    assert_eq!(h.sink.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_stale_snapshot_is_rejected() {
    let h = harness();
    let movement = create(&h, transfer(h.warehouse).pending()).await;
    let stale = movement.clone();

    act(&h, &movement, MovementAction::Start).await;

    assert!(matches!(
        h.engine
            .commit_transition(stale, MovementAction::Hold, Some("blocked".into()))
            .await,
        Err(MovementError::ConcurrentModification { movement_id }) if movement_id == movement.id
    ));
}

#[tokio::test]
async fn test_sink_failure_rolls_back_completion() {
    let warehouse = WarehouseId::new();
    let h = harness_with(
        FakeDirectory {
            warehouse: Some(warehouse),
            ..FakeDirectory::default()
        },
        FakeStock(Some(dec!(100))),
        RecordingSink {
            fail: true,
            ..RecordingSink::default()
        },
    );
    let movement = create(&h, transfer(warehouse)).await;
    let running = act(&h, &movement, MovementAction::Start).await;

    let result = h
        .engine
        .transition(running.id, MovementAction::Complete, None)
        .await;

    assert!(matches!(result, Err(MovementError::InventorySink(_))));
    assert_eq!(h.sink.calls.load(Ordering::SeqCst), 1);
    let stored = h.engine.get(running.id).await.unwrap();
    assert_eq!(stored.status, MovementStatus::InProgress);
    assert!(stored.completed_at.is_none());
    assert_eq!(stored.lines[0].status(), LineStatus::Pending);
    assert!(stored.version > running.version);
}

// ============================================================================
// Lines
// ============================================================================

#[tokio::test]
async fn test_line_edits_only_while_editable() {
    let h = harness();
    let movement = create(&h, transfer(h.warehouse)).await;

    let updated = h
        .engine
        .add_line(movement.id, NewMovementLine::new(ItemId::new(), dec!(2)))
        .await
        .unwrap();
    assert_eq!(updated.total_lines(), 2);
    assert_eq!(updated.lines[1].sequence, 2);

    let first = updated.lines[0].id;
    let corrected = h
        .engine
        .mutate_line(
            first,
            LineChanges {
                actual_quantity: Some(dec!(4)),
                notes: Some(Some("one damaged".into())),
                ..LineChanges::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(corrected.lines[0].actual_quantity(), dec!(4));
    assert_eq!(corrected.lines[0].requested_quantity(), dec!(5));

    let trimmed = h.engine.remove_line(updated.lines[1].id).await.unwrap();
    assert_eq!(trimmed.total_lines(), 1);
    assert!(matches!(
        h.engine.remove_line(first).await,
        Err(MovementError::EmptyLineSet)
    ));

    act(&h, &movement, MovementAction::Start).await;
    assert!(matches!(
        h.engine
            .add_line(movement.id, NewMovementLine::new(ItemId::new(), dec!(1)))
            .await,
        Err(MovementError::IllegalTransition {
            action: MovementAction::Edit,
            current: MovementStatus::InProgress
        })
    ));
    assert!(matches!(
        h.engine.mutate_line(first, LineChanges::default()).await,
        Err(MovementError::IllegalTransition { .. })
    ));
}

#[tokio::test]
async fn test_short_pick_is_booked_on_completion() {
    let h = harness();
    let movement = create(&h, transfer(h.warehouse).pending()).await;
    let line_id = movement.lines[0].id;
    let running = act(&h, &movement, MovementAction::Start).await;

    let corrected = h
        .engine
        .correct_line_quantity(line_id, dec!(3))
        .await
        .unwrap();
    assert_eq!(corrected.version, running.version + 1);
    assert_eq!(corrected.lines[0].actual_quantity(), dec!(3));
    assert_eq!(corrected.lines[0].requested_quantity(), dec!(5));

    assert!(matches!(
        h.engine.correct_line_quantity(line_id, dec!(-1)).await,
        Err(MovementError::InvalidQuantity { line_index: 0 })
    ));

    let completed = act(&h, &corrected, MovementAction::Complete).await;
    assert_eq!(completed.lines[0].actual_quantity(), dec!(3));
    let intents = h.sink.intents.lock().unwrap();
    let quantities: Vec<Decimal> = intents[0].deltas.iter().map(|d| d.quantity).collect();
    assert_eq!(quantities, vec![dec!(-3), dec!(3)]);
}

#[tokio::test]
async fn test_quantity_correction_stops_at_closed_line_or_movement() {
    let h = harness();
    let movement = create(
        &h,
        transfer(h.warehouse).line(NewMovementLine::new(ItemId::new(), dec!(2))),
    )
    .await;
    let first = movement.lines[0].id;
    let second = movement.lines[1].id;
    let running = act(&h, &movement, MovementAction::Start).await;

    h.engine.transition_line(first, LineAction::Complete).await.unwrap();
    assert!(matches!(
        h.engine.correct_line_quantity(first, dec!(1)).await,
        Err(MovementError::IllegalLineTransition {
            current: LineStatus::Completed,
            ..
        })
    ));

    let held = act(&h, &running, MovementAction::Hold).await;
    let corrected = h.engine.correct_line_quantity(second, dec!(1)).await.unwrap();
    assert_eq!(corrected.status, MovementStatus::OnHold);
    assert_eq!(corrected.lines[1].actual_quantity(), dec!(1));

    act(&h, &held, MovementAction::Cancel).await;
    assert!(matches!(
        h.engine.correct_line_quantity(second, dec!(2)).await,
        Err(MovementError::InactiveMovement {
            current: MovementStatus::Cancelled
        })
    ));
}

#[tokio::test]
async fn test_line_execution_requires_in_progress() {
    let h = harness();
    let movement = create(&h, transfer(h.warehouse)).await;
    let line_id = movement.lines[0].id;

    assert!(matches!(
        h.engine.transition_line(line_id, LineAction::Pick).await,
        Err(MovementError::InactiveMovement {
            current: MovementStatus::Draft
        })
    ));

    act(&h, &movement, MovementAction::Start).await;
    let picked = h.engine.transition_line(line_id, LineAction::Pick).await.unwrap();
    assert_eq!(picked.lines[0].status(), LineStatus::Picked);

    assert!(matches!(
        h.engine.transition_line(line_id, LineAction::Pick).await,
        Err(MovementError::IllegalLineTransition { .. })
    ));
    let shipped = h.engine.transition_line(line_id, LineAction::Ship).await.unwrap();
    assert_eq!(shipped.lines[0].status(), LineStatus::InTransit);
}

#[tokio::test]
async fn test_unknown_line_and_task() {
    let h = harness();
    assert!(matches!(
        h.engine
            .transition_line(Default::default(), LineAction::Pick)
            .await,
        Err(MovementError::NotFound(EntityRef::Line(_)))
    ));
    assert!(matches!(
        h.engine
            .transition_task(Default::default(), TaskAction::Start, TaskActionInput::default())
            .await,
        Err(MovementError::NotFound(EntityRef::Task(_)))
    ));
}

// ============================================================================
// Tasks
// ============================================================================

#[tokio::test]
async fn test_task_lifecycle_through_engine() {
    let h = harness();
    let movement = create(&h, transfer(h.warehouse).task(NewMovementTask::new(TaskType::Pick))).await;
    let task_id = movement.tasks[0].id;
    let user = UserId::new();

    assert!(matches!(
        h.engine
            .transition_task(task_id, TaskAction::Assign, TaskActionInput::default())
            .await,
        Err(MovementError::MissingAssignee)
    ));

    let assigned = h
        .engine
        .transition_task(
            task_id,
            TaskAction::Assign,
            TaskActionInput {
                user_id: Some(user),
                reason: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(assigned.tasks[0].status, TaskStatus::Assigned);
    assert_eq!(assigned.tasks[0].assigned_to, Some(user));

    let started = h
        .engine
        .transition_task(task_id, TaskAction::Start, TaskActionInput::default())
        .await
        .unwrap();
    assert!(started.tasks[0].actual_start.is_some());

    let done = h
        .engine
        .transition_task(task_id, TaskAction::Complete, TaskActionInput::default())
        .await
        .unwrap();
    let task = &done.tasks[0];
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(
        task.duration(),
        Some(task.actual_completion.unwrap() - task.actual_start.unwrap())
    );
    assert_eq!(done.pending_tasks(), 0);
}

#[tokio::test]
async fn test_task_edits_and_terminal_movement() {
    let h = harness();
    let movement = create(&h, transfer(h.warehouse)).await;

    let with_task = h
        .engine
        .add_task(movement.id, NewMovementTask::new(TaskType::Count))
        .await
        .unwrap();
    assert_eq!(with_task.pending_tasks(), 1);
    let task_id = with_task.tasks[0].id;

    let started = act(&h, &movement, MovementAction::Start).await;
    assert!(matches!(
        h.engine.remove_task(task_id).await,
        Err(MovementError::IllegalTransition { .. })
    ));

    act(&h, &started, MovementAction::Complete).await;
    assert!(matches!(
        h.engine
            .transition_task(
                task_id,
                TaskAction::Cancel,
                TaskActionInput {
                    reason: Some("done anyway".into()),
                    ..TaskActionInput::default()
                },
            )
            .await,
        Err(MovementError::InactiveMovement {
            current: MovementStatus::Completed
        })
    ));
}

#[tokio::test]
async fn test_list_reports_progress() {
    let h = harness();
    let movement = create(
        &h,
        transfer(h.warehouse).line(NewMovementLine::new(ItemId::new(), dec!(1))),
    )
    .await;
    act(&h, &movement, MovementAction::Start).await;
    h.engine
        .transition_line(movement.lines[0].id, LineAction::Complete)
        .await
        .unwrap();
    create(&h, transfer(h.warehouse)).await;

    let running = MovementFilter {
        status: Some(MovementStatus::InProgress),
        ..MovementFilter::default()
    };
    let page = h.engine.list(&running, PageRequest::default()).await.unwrap();
    assert_eq!(page.meta.total, 1);
    assert_eq!(page.data[0].completed_lines, 1);
    assert_eq!(page.data[0].progress_percent, 50);

    let all = h
        .engine
        .list(&MovementFilter::default(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(all.meta.total, 2);
}
