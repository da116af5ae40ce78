//! `SeaORM` Entity for `movement_tasks` table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "movement_tasks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub movement_id: Uuid,
    pub task_type: String,
    pub priority: i32,
    pub assigned_to: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub status: String,
    pub scheduled_start: Option<DateTimeUtc>,
    pub expected_completion: Option<DateTimeUtc>,
    pub actual_start: Option<DateTimeUtc>,
    pub actual_completion: Option<DateTimeUtc>,
    pub cancel_reason: Option<String>,
    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::movements::Entity",
        from = "Column::MovementId",
        to = "super::movements::Column::Id",
        on_delete = "Cascade"
    )]
    Movements,
}

impl Related<super::movements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Movements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
