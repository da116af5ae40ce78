//! `SeaORM` implementation of the movement store.
//!
//! A movement row carries a `version` column. Every write after the insert
//! runs in a transaction as `UPDATE movements SET ..., version = expected + 1
//! WHERE id = ? AND version = expected`; when no row matches, the write is
//! rejected and nothing else in the transaction is applied. Lines and tasks
//! are replaced wholesale inside the same transaction.

mod convert;

use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::{
    ActiveValue::{NotSet, Set},
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use tracing::debug;
use uuid::Uuid;

use stockflow_core::movement::{
    EntityRef, Movement, MovementError, MovementFilter, MovementStore, MovementSummary,
};
use stockflow_shared::types::{
    MovementId, MovementLineId, MovementTaskId, PageRequest, PageResponse,
};

use crate::entities::{movement_lines, movement_tasks, movements};

use convert::{line_to_active, movement_to_active, restore_movement, task_to_active, version_to_i64};

/// Movement store backed by a relational database.
#[derive(Debug, Clone)]
pub struct SeaOrmMovementStore {
    db: DatabaseConnection,
}

impl SeaOrmMovementStore {
    /// Creates a new store over `db`.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

pub(crate) fn store_err(err: DbErr) -> MovementError {
    MovementError::Store(err.to_string())
}

/// Loads lines and tasks for a set of movements, grouped by movement id.
async fn load_children<C: ConnectionTrait>(
    conn: &C,
    ids: Vec<Uuid>,
) -> Result<
    (
        HashMap<Uuid, Vec<movement_lines::Model>>,
        HashMap<Uuid, Vec<movement_tasks::Model>>,
    ),
    MovementError,
> {
    let mut lines: HashMap<Uuid, Vec<movement_lines::Model>> = HashMap::new();
    let mut tasks: HashMap<Uuid, Vec<movement_tasks::Model>> = HashMap::new();
    if ids.is_empty() {
        return Ok((lines, tasks));
    }

    for line in movement_lines::Entity::find()
        .filter(movement_lines::Column::MovementId.is_in(ids.clone()))
        .order_by_asc(movement_lines::Column::Sequence)
        .all(conn)
        .await
        .map_err(store_err)?
    {
        lines.entry(line.movement_id).or_default().push(line);
    }

    // Task ids are UUID v7, so id order is creation order.
    for task in movement_tasks::Entity::find()
        .filter(movement_tasks::Column::MovementId.is_in(ids))
        .order_by_asc(movement_tasks::Column::Id)
        .all(conn)
        .await
        .map_err(store_err)?
    {
        tasks.entry(task.movement_id).or_default().push(task);
    }

    Ok((lines, tasks))
}

async fn load_movement<C: ConnectionTrait>(
    conn: &C,
    id: MovementId,
) -> Result<Movement, MovementError> {
    let model = movements::Entity::find_by_id(id.into_inner())
        .one(conn)
        .await
        .map_err(store_err)?
        .ok_or(MovementError::NotFound(EntityRef::Movement(id)))?;

    let (mut lines, mut tasks) = load_children(conn, vec![model.id]).await?;
    let key = model.id;
    restore_movement(
        model,
        lines.remove(&key).unwrap_or_default(),
        tasks.remove(&key).unwrap_or_default(),
    )
}

async fn insert_children<C: ConnectionTrait>(
    conn: &C,
    movement: &Movement,
) -> Result<(), MovementError> {
    let lines = movement
        .lines
        .iter()
        .map(line_to_active)
        .collect::<Result<Vec<_>, _>>()?;
    if !lines.is_empty() {
        movement_lines::Entity::insert_many(lines)
            .exec_without_returning(conn)
            .await
            .map_err(store_err)?;
    }

    let tasks: Vec<_> = movement.tasks.iter().map(task_to_active).collect();
    if !tasks.is_empty() {
        movement_tasks::Entity::insert_many(tasks)
            .exec_without_returning(conn)
            .await
            .map_err(store_err)?;
    }
    Ok(())
}

async fn delete_children<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<(), MovementError> {
    movement_lines::Entity::delete_many()
        .filter(movement_lines::Column::MovementId.eq(id))
        .exec(conn)
        .await
        .map_err(store_err)?;
    movement_tasks::Entity::delete_many()
        .filter(movement_tasks::Column::MovementId.eq(id))
        .exec(conn)
        .await
        .map_err(store_err)?;
    Ok(())
}

/// Explains why a version-guarded statement matched no row.
async fn guard_failure<C: ConnectionTrait>(conn: &C, id: MovementId) -> MovementError {
    match movements::Entity::find_by_id(id.into_inner()).one(conn).await {
        Ok(Some(_)) => MovementError::ConcurrentModification { movement_id: id },
        Ok(None) => MovementError::NotFound(EntityRef::Movement(id)),
        Err(err) => store_err(err),
    }
}

#[async_trait]
impl MovementStore for SeaOrmMovementStore {
    async fn insert(&self, movement: &Movement) -> Result<(), MovementError> {
        let txn = self.db.begin().await.map_err(store_err)?;

        movements::Entity::insert(movement_to_active(movement)?)
            .exec_without_returning(&txn)
            .await
            .map_err(store_err)?;
        insert_children(&txn, movement).await?;

        txn.commit().await.map_err(store_err)?;
        debug!(movement_id = %movement.id, "Movement inserted");
        Ok(())
    }

    async fn get(&self, id: MovementId) -> Result<Movement, MovementError> {
        load_movement(&self.db, id).await
    }

    async fn list(
        &self,
        filter: &MovementFilter,
        page: PageRequest,
    ) -> Result<PageResponse<MovementSummary>, MovementError> {
        let mut query = movements::Entity::find();
        if let Some(warehouse_id) = filter.warehouse_id {
            query = query.filter(movements::Column::WarehouseId.eq(warehouse_id.into_inner()));
        }
        if let Some(status) = filter.status {
            query = query.filter(movements::Column::Status.eq(status.as_str()));
        }
        if let Some(movement_type) = filter.movement_type {
            query = query.filter(movements::Column::MovementType.eq(movement_type.as_str()));
        }
        if let Some(priority) = filter.priority {
            query = query.filter(movements::Column::Priority.eq(priority.as_str()));
        }

        let total = query.clone().count(&self.db).await.map_err(store_err)?;
        let models = query
            .order_by_desc(movements::Column::MovementDate)
            .order_by_desc(movements::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(store_err)?;

        let ids = models.iter().map(|model| model.id).collect();
        let (mut lines, mut tasks) = load_children(&self.db, ids).await?;

        let data = models
            .into_iter()
            .map(|model| {
                let key = model.id;
                restore_movement(
                    model,
                    lines.remove(&key).unwrap_or_default(),
                    tasks.remove(&key).unwrap_or_default(),
                )
                .map(|movement| movement.summary())
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }

    async fn compare_and_swap(
        &self,
        movement: &Movement,
        expected_version: u64,
    ) -> Result<Movement, MovementError> {
        let next_version = expected_version + 1;
        let mut row = movement_to_active(movement)?;
        row.id = NotSet;
        row.version = Set(version_to_i64(next_version)?);

        let txn = self.db.begin().await.map_err(store_err)?;

        let updated = movements::Entity::update_many()
            .set(row)
            .filter(movements::Column::Id.eq(movement.id.into_inner()))
            .filter(movements::Column::Version.eq(version_to_i64(expected_version)?))
            .exec(&txn)
            .await
            .map_err(store_err)?;
        if updated.rows_affected == 0 {
            let err = guard_failure(&txn, movement.id).await;
            debug!(movement_id = %movement.id, expected_version, error = %err, "Version guard rejected write");
            return Err(err);
        }

        delete_children(&txn, movement.id.into_inner()).await?;
        insert_children(&txn, movement).await?;

        txn.commit().await.map_err(store_err)?;

        let mut saved = movement.clone();
        saved.version = next_version;
        Ok(saved)
    }

    async fn delete(&self, id: MovementId, expected_version: u64) -> Result<(), MovementError> {
        let txn = self.db.begin().await.map_err(store_err)?;

        delete_children(&txn, id.into_inner()).await?;
        let deleted = movements::Entity::delete_many()
            .filter(movements::Column::Id.eq(id.into_inner()))
            .filter(movements::Column::Version.eq(version_to_i64(expected_version)?))
            .exec(&txn)
            .await
            .map_err(store_err)?;
        if deleted.rows_affected == 0 {
            // Dropping the transaction restores the children.
            return Err(guard_failure(&txn, id).await);
        }

        txn.commit().await.map_err(store_err)?;
        debug!(movement_id = %id, "Movement deleted");
        Ok(())
    }

    async fn find_line(&self, line_id: MovementLineId) -> Result<Option<MovementId>, MovementError> {
        Ok(movement_lines::Entity::find_by_id(line_id.into_inner())
            .one(&self.db)
            .await
            .map_err(store_err)?
            .map(|line| MovementId::from_uuid(line.movement_id)))
    }

    async fn find_task(&self, task_id: MovementTaskId) -> Result<Option<MovementId>, MovementError> {
        Ok(movement_tasks::Entity::find_by_id(task_id.into_inner())
            .one(&self.db)
            .await
            .map_err(store_err)?
            .map(|task| MovementId::from_uuid(task.movement_id)))
    }
}
