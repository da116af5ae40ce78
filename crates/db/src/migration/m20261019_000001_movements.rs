//! Movement tables.
//!
//! Built with the schema builder so the same migration runs on Postgres and
//! on the `SQLite` database the tests use.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============================================================
        // MOVEMENTS
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Movements::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Movements::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Movements::MovementType).string_len(32).not_null())
                    .col(ColumnDef::new(Movements::Priority).string_len(16).not_null())
                    .col(ColumnDef::new(Movements::Status).string_len(16).not_null())
                    .col(ColumnDef::new(Movements::WarehouseId).uuid().not_null())
                    .col(ColumnDef::new(Movements::SourceLocationId).uuid().null())
                    .col(ColumnDef::new(Movements::DestinationLocationId).uuid().null())
                    .col(ColumnDef::new(Movements::ReferenceNumber).string_len(100).null())
                    .col(ColumnDef::new(Movements::Notes).text().null())
                    .col(
                        ColumnDef::new(Movements::MovementDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Movements::ExpectedDate).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Movements::ScheduledDate).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Movements::StartedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Movements::CompletedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Movements::HeldFrom).string_len(16).null())
                    .col(ColumnDef::new(Movements::HoldReason).text().null())
                    .col(ColumnDef::new(Movements::CancelReason).text().null())
                    .col(
                        ColumnDef::new(Movements::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Movements::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Movements::Version)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_movements_warehouse_status")
                    .table(Movements::Table)
                    .col(Movements::WarehouseId)
                    .col(Movements::Status)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // MOVEMENT LINES
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(MovementLines::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(MovementLines::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(MovementLines::MovementId).uuid().not_null())
                    .col(ColumnDef::new(MovementLines::ItemId).uuid().not_null())
                    .col(
                        ColumnDef::new(MovementLines::RequestedQuantity)
                            .decimal_len(18, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MovementLines::ActualQuantity)
                            .decimal_len(18, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(MovementLines::UnitOfMeasure).string_len(16).not_null())
                    .col(ColumnDef::new(MovementLines::FromLocationId).uuid().null())
                    .col(ColumnDef::new(MovementLines::ToLocationId).uuid().null())
                    .col(ColumnDef::new(MovementLines::LotId).uuid().null())
                    .col(ColumnDef::new(MovementLines::SerialNumber).string_len(100).null())
                    .col(ColumnDef::new(MovementLines::Status).string_len(16).not_null())
                    .col(ColumnDef::new(MovementLines::Sequence).integer().not_null())
                    .col(ColumnDef::new(MovementLines::Notes).text().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movement_lines_movement")
                            .from(MovementLines::Table, MovementLines::MovementId)
                            .to(Movements::Table, Movements::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_movement_lines_sequence")
                    .table(MovementLines::Table)
                    .col(MovementLines::MovementId)
                    .col(MovementLines::Sequence)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // MOVEMENT TASKS
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(MovementTasks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(MovementTasks::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(MovementTasks::MovementId).uuid().not_null())
                    .col(ColumnDef::new(MovementTasks::TaskType).string_len(16).not_null())
                    .col(ColumnDef::new(MovementTasks::Priority).integer().not_null())
                    .col(ColumnDef::new(MovementTasks::AssignedTo).uuid().null())
                    .col(ColumnDef::new(MovementTasks::LocationId).uuid().null())
                    .col(ColumnDef::new(MovementTasks::Status).string_len(16).not_null())
                    .col(
                        ColumnDef::new(MovementTasks::ScheduledStart)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(MovementTasks::ExpectedCompletion)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(MovementTasks::ActualStart).timestamp_with_time_zone().null())
                    .col(
                        ColumnDef::new(MovementTasks::ActualCompletion)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(MovementTasks::CancelReason).text().null())
                    .col(ColumnDef::new(MovementTasks::Notes).text().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movement_tasks_movement")
                            .from(MovementTasks::Table, MovementTasks::MovementId)
                            .to(Movements::Table, Movements::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_movement_tasks_movement")
                    .table(MovementTasks::Table)
                    .col(MovementTasks::MovementId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MovementTasks::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MovementLines::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Movements::Table).if_exists().to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Movements {
    Table,
    Id,
    MovementType,
    Priority,
    Status,
    WarehouseId,
    SourceLocationId,
    DestinationLocationId,
    ReferenceNumber,
    Notes,
    MovementDate,
    ExpectedDate,
    ScheduledDate,
    StartedAt,
    CompletedAt,
    HeldFrom,
    HoldReason,
    CancelReason,
    CreatedAt,
    UpdatedAt,
    Version,
}

#[derive(DeriveIden)]
enum MovementLines {
    Table,
    Id,
    MovementId,
    ItemId,
    RequestedQuantity,
    ActualQuantity,
    UnitOfMeasure,
    FromLocationId,
    ToLocationId,
    LotId,
    SerialNumber,
    Status,
    Sequence,
    Notes,
}

#[derive(DeriveIden)]
enum MovementTasks {
    Table,
    Id,
    MovementId,
    TaskType,
    Priority,
    AssignedTo,
    LocationId,
    Status,
    ScheduledStart,
    ExpectedCompletion,
    ActualStart,
    ActualCompletion,
    CancelReason,
    Notes,
}
