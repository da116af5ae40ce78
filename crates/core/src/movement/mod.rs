//! Inventory movement workflow.
//!
//! This module owns the movement type policy table, the movement and task
//! state machines, creation validation and the engine that ties them to a
//! store and the external collaborators.
//!
//! # Modules
//!
//! - `types` - Movement domain enums (types, statuses, actions)
//! - `config` - Static per-type policy table
//! - `line`, `task`, `entity` - The movement aggregate
//! - `validation` - Creation and stock pre-checks
//! - `service` - Movement state machine and inventory intents
//! - `settings` - Site/warehouse layered settings
//! - `ports` - Collaborator traits
//! - `store` - Persistence port and in-memory store
//! - `engine` - Inbound API

pub mod config;
pub mod engine;
pub mod entity;
pub mod error;
pub mod line;
pub mod ports;
pub mod service;
pub mod settings;
pub mod store;
pub mod task;
pub mod types;
pub mod validation;

#[cfg(test)]
mod service_props;
#[cfg(test)]
mod task_props;
#[cfg(test)]
mod tests;
#[cfg(test)]
mod validation_props;

pub use config::MovementTypeConfig;
pub use engine::{Collaborators, CreatedMovement, EngineConfig, MovementEngine, TransitionOutcome};
pub use entity::{Movement, MovementSummary, NewMovement};
pub use error::{EntityRef, LocationRole, MovementError};
pub use line::{LineChanges, MovementLine, NewMovementLine, StoredLine};
pub use ports::{
    CachedLocationDirectory, CollaboratorError, InventorySink, Item, ItemDirectory, Location,
    LocationDirectory, StockOracle, Warehouse,
};
pub use service::{
    InventoryDelta, InventoryIntent, MovementTransition, MovementWorkflow, TransitionTarget,
};
pub use settings::{SettingsError, SiteSettings, WarehouseSettings};
pub use store::{InMemoryMovementStore, MovementFilter, MovementStore};
pub use task::{
    MovementTask, NewMovementTask, TaskActionInput, TaskPriority, TaskTransition, TaskWorkflow,
};
pub use types::{
    LineAction, LineStatus, MovementAction, MovementPriority, MovementStatus, MovementType,
    TaskAction, TaskStatus, TaskType,
};
pub use validation::{StockCheck, validate_creation, validate_reference, validate_stock_availability};
