//! `SeaORM` Entity for movements table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub movement_type: String,
    pub priority: String,
    pub status: String,
    pub warehouse_id: Uuid,
    pub source_location_id: Option<Uuid>,
    pub destination_location_id: Option<Uuid>,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
    pub movement_date: DateTimeUtc,
    pub expected_date: Option<DateTimeUtc>,
    pub scheduled_date: Option<DateTimeUtc>,
    pub started_at: Option<DateTimeUtc>,
    pub completed_at: Option<DateTimeUtc>,
    pub held_from: Option<String>,
    pub hold_reason: Option<String>,
    pub cancel_reason: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub version: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::movement_lines::Entity")]
    MovementLines,
    #[sea_orm(has_many = "super::movement_tasks::Entity")]
    MovementTasks,
}

impl Related<super::movement_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MovementLines.def()
    }
}

impl Related<super::movement_tasks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MovementTasks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
