//! Program trees, interpreter, and mutation operators for Preygent agents.
//!
//! Programs are Push-style trees of literals, instruction invocations, and
//! lists. They are stored as arenas of nodes addressed by [`NodeId`], so a
//! deep copy is a plain rebuild of the reachable nodes and no two agents
//! can ever alias the same tree.
//!
//! # Modules
//!
//! - [`program`] -- The [`Program`] arena, [`ProgramBuilder`], and text
//!   serialization.
//! - [`parse`] -- Program text parsing.
//! - [`random`] -- Random program synthesis bounded by size.
//! - [`interpreter`] -- [`Stacks`], [`InstructionSet`], and the
//!   [`Interpreter`] execution loop.
//! - [`instructions`] -- The context-free standard instruction vocabulary.
//! - [`mutation`] -- [`ProgramMutator`]: copy, point-mutate, compact.
//! - [`error`] -- [`ParseError`].

pub mod error;
pub mod instructions;
pub mod interpreter;
pub mod mutation;
pub mod parse;
pub mod program;
pub mod random;

// Re-export primary types at crate root.
pub use error::ParseError;
pub use interpreter::{
    Instruction, InstructionSet, Interpreter, InterpreterOptions, RunStats, Stacks,
};
pub use mutation::{MutationSettings, ProgramMutator, compact, copy};
pub use parse::parse;
pub use program::{Node, NodeId, NodeKind, Program, ProgramBuilder};
pub use random::{GeneratorSettings, generate};
