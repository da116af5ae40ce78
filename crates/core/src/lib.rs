//! Core business logic for Stockflow.
//!
//! This crate contains the movement workflow engine with ZERO web or
//! database dependencies. Persistence and the external inventory systems
//! plug in through the traits in [`movement::store`] and
//! [`movement::ports`].
//!
//! # Modules
//!
//! - `movement` - Movement types, state machines, validation and engine

pub mod movement;
