//! The grid world, agents, and the domain primitive vocabulary.
//!
//! Agents live on an unbounded integer grid and compete for points. Each
//! agent runs its own program once per tick through a private interpreter
//! whose instruction table holds the standard vocabulary plus the domain
//! primitives (`move`, `turn`, `consume`, and friends).
//!
//! # Modules
//!
//! - [`primitives`] -- [`TickContext`], [`Effects`], the [`CellQuery`]
//!   capability, and the primitive instructions.
//! - [`agent`] -- [`Agent`] and the [`Spawner`] that creates agents.
//! - [`grid`] -- [`GridWorld`]: roster, tick stepping, and quiescence.

pub mod agent;
pub mod grid;
pub mod primitives;

// Re-export primary types at crate root.
pub use agent::{Agent, BodySettings, Spawner};
pub use grid::{EndReason, GridWorld, RunOutcome, TickOutcome};
pub use primitives::{
    CellQuery, Effects, PRIMITIVE_NAMES, TickContext, TraceAction, TraceEvent, vocabulary,
};
