//! `SeaORM` entities for the movement tables.

pub mod movement_lines;
pub mod movement_tasks;
pub mod movements;

pub mod prelude {
    //! Entity aliases.
    pub use super::movement_lines::Entity as MovementLines;
    pub use super::movement_tasks::Entity as MovementTasks;
    pub use super::movements::Entity as Movements;
}
