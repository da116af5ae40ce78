//! Row and domain conversions.
//!
//! Enumerations are stored by their string form; a row holding a value the
//! domain no longer knows is reported as a store error rather than skipped.

use sea_orm::ActiveValue::Set;

use stockflow_core::movement::{
    LineStatus, Movement, MovementError, MovementLine, MovementPriority, MovementStatus,
    MovementTask, MovementType, StoredLine, TaskPriority, TaskStatus, TaskType,
};
use stockflow_shared::types::{
    ItemId, LocationId, LotId, MovementId, MovementLineId, MovementTaskId, UnitOfMeasure, UserId,
    WarehouseId,
};

use crate::entities::{movement_lines, movement_tasks, movements};

fn parse_column<T>(
    column: &str,
    raw: &str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Result<T, MovementError> {
    parse(raw).ok_or_else(|| MovementError::Store(format!("invalid {column} value: {raw}")))
}

pub(super) fn version_to_i64(version: u64) -> Result<i64, MovementError> {
    i64::try_from(version).map_err(|_| MovementError::Store(format!("version {version} overflows")))
}

fn version_from_i64(version: i64) -> Result<u64, MovementError> {
    u64::try_from(version).map_err(|_| MovementError::Store(format!("negative version {version}")))
}

pub(super) fn movement_to_active(movement: &Movement) -> Result<movements::ActiveModel, MovementError> {
    Ok(movements::ActiveModel {
        id: Set(movement.id.into_inner()),
        movement_type: Set(movement.movement_type.as_str().to_string()),
        priority: Set(movement.priority.as_str().to_string()),
        status: Set(movement.status.as_str().to_string()),
        warehouse_id: Set(movement.warehouse_id.into_inner()),
        source_location_id: Set(movement.source_location_id.map(LocationId::into_inner)),
        destination_location_id: Set(movement.destination_location_id.map(LocationId::into_inner)),
        reference_number: Set(movement.reference_number.clone()),
        notes: Set(movement.notes.clone()),
        movement_date: Set(movement.movement_date),
        expected_date: Set(movement.expected_date),
        scheduled_date: Set(movement.scheduled_date),
        started_at: Set(movement.started_at),
        completed_at: Set(movement.completed_at),
        held_from: Set(movement.held_from.map(|status| status.as_str().to_string())),
        hold_reason: Set(movement.hold_reason.clone()),
        cancel_reason: Set(movement.cancel_reason.clone()),
        created_at: Set(movement.created_at),
        updated_at: Set(movement.updated_at),
        version: Set(version_to_i64(movement.version)?),
    })
}

pub(super) fn line_to_active(line: &MovementLine) -> Result<movement_lines::ActiveModel, MovementError> {
    let stored = line.to_stored();
    let sequence = i32::try_from(stored.sequence)
        .map_err(|_| MovementError::Store(format!("line sequence {} overflows", stored.sequence)))?;

    Ok(movement_lines::ActiveModel {
        id: Set(stored.id.into_inner()),
        movement_id: Set(stored.movement_id.into_inner()),
        item_id: Set(stored.item_id.into_inner()),
        requested_quantity: Set(stored.requested_quantity),
        actual_quantity: Set(stored.actual_quantity),
        unit_of_measure: Set(stored.unit_of_measure.as_str().to_string()),
        from_location_id: Set(stored.from_location_id.map(LocationId::into_inner)),
        to_location_id: Set(stored.to_location_id.map(LocationId::into_inner)),
        lot_id: Set(stored.lot_id.map(LotId::into_inner)),
        serial_number: Set(stored.serial_number),
        status: Set(stored.status.as_str().to_string()),
        sequence: Set(sequence),
        notes: Set(stored.notes),
    })
}

pub(super) fn task_to_active(task: &MovementTask) -> movement_tasks::ActiveModel {
    movement_tasks::ActiveModel {
        id: Set(task.id.into_inner()),
        movement_id: Set(task.movement_id.into_inner()),
        task_type: Set(task.task_type.as_str().to_string()),
        priority: Set(i32::from(task.priority.value())),
        assigned_to: Set(task.assigned_to.map(UserId::into_inner)),
        location_id: Set(task.location_id.map(LocationId::into_inner)),
        status: Set(task.status.as_str().to_string()),
        scheduled_start: Set(task.scheduled_start),
        expected_completion: Set(task.expected_completion),
        actual_start: Set(task.actual_start),
        actual_completion: Set(task.actual_completion),
        cancel_reason: Set(task.cancel_reason.clone()),
        notes: Set(task.notes.clone()),
    }
}

fn restore_line(model: movement_lines::Model) -> Result<MovementLine, MovementError> {
    let unit_of_measure = model
        .unit_of_measure
        .parse::<UnitOfMeasure>()
        .map_err(MovementError::Store)?;
    let sequence = u32::try_from(model.sequence)
        .map_err(|_| MovementError::Store(format!("invalid line sequence {}", model.sequence)))?;

    Ok(MovementLine::restore(StoredLine {
        id: MovementLineId::from_uuid(model.id),
        movement_id: MovementId::from_uuid(model.movement_id),
        item_id: ItemId::from_uuid(model.item_id),
        requested_quantity: model.requested_quantity,
        actual_quantity: model.actual_quantity,
        unit_of_measure,
        from_location_id: model.from_location_id.map(LocationId::from_uuid),
        to_location_id: model.to_location_id.map(LocationId::from_uuid),
        lot_id: model.lot_id.map(LotId::from_uuid),
        serial_number: model.serial_number,
        status: parse_column("line status", &model.status, LineStatus::parse)?,
        sequence,
        notes: model.notes,
    }))
}

fn restore_task(model: movement_tasks::Model) -> Result<MovementTask, MovementError> {
    let priority = u8::try_from(model.priority)
        .map_err(|_| MovementError::Store(format!("invalid task priority {}", model.priority)))
        .and_then(TaskPriority::new)?;

    Ok(MovementTask {
        id: MovementTaskId::from_uuid(model.id),
        movement_id: MovementId::from_uuid(model.movement_id),
        task_type: parse_column("task type", &model.task_type, TaskType::parse)?,
        priority,
        assigned_to: model.assigned_to.map(UserId::from_uuid),
        location_id: model.location_id.map(LocationId::from_uuid),
        status: parse_column("task status", &model.status, TaskStatus::parse)?,
        scheduled_start: model.scheduled_start,
        expected_completion: model.expected_completion,
        actual_start: model.actual_start,
        actual_completion: model.actual_completion,
        cancel_reason: model.cancel_reason,
        notes: model.notes,
    })
}

/// Rebuilds the aggregate from its rows.
pub(super) fn restore_movement(
    model: movements::Model,
    lines: Vec<movement_lines::Model>,
    tasks: Vec<movement_tasks::Model>,
) -> Result<Movement, MovementError> {
    let held_from = model
        .held_from
        .as_deref()
        .map(|raw| parse_column("held_from", raw, MovementStatus::parse))
        .transpose()?;

    Ok(Movement {
        id: MovementId::from_uuid(model.id),
        movement_type: parse_column("movement type", &model.movement_type, MovementType::parse)?,
        priority: parse_column("priority", &model.priority, MovementPriority::parse)?,
        status: parse_column("status", &model.status, MovementStatus::parse)?,
        warehouse_id: WarehouseId::from_uuid(model.warehouse_id),
        source_location_id: model.source_location_id.map(LocationId::from_uuid),
        destination_location_id: model.destination_location_id.map(LocationId::from_uuid),
        reference_number: model.reference_number,
        notes: model.notes,
        movement_date: model.movement_date,
        expected_date: model.expected_date,
        scheduled_date: model.scheduled_date,
        started_at: model.started_at,
        completed_at: model.completed_at,
        held_from,
        hold_reason: model.hold_reason,
        cancel_reason: model.cancel_reason,
        created_at: model.created_at,
        updated_at: model.updated_at,
        version: version_from_i64(model.version)?,
        lines: lines
            .into_iter()
            .map(restore_line)
            .collect::<Result<_, _>>()?,
        tasks: tasks
            .into_iter()
            .map(restore_task)
            .collect::<Result<_, _>>()?,
    })
}
