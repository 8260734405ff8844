//! Shared type definitions for the Preygent simulation.
//!
//! This crate holds the small vocabulary every other crate speaks: agent
//! identifiers, facing directions, grid positions, and the mutable body
//! state of an agent.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrapper for agent identifiers
//! - [`enums`] -- [`Direction`] ring and [`SensingMode`]
//! - [`structs`] -- [`Position`] and [`AgentState`]

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{Direction, SensingMode};
pub use ids::AgentId;
pub use structs::{AgentState, Position};
