//! Configuration, ranking, champion persistence, and the evolution loop
//! for the Preygent simulation.
//!
//! # Modules
//!
//! - [`champion`] -- Reading and writing the best program as plain text.
//! - [`config`] -- Configuration loading from `preygent-config.yaml` into
//!   strongly-typed structs.
//! - [`evolution`] -- [`EvolutionLoop`] and its [`EvolutionCallback`] hooks.
//! - [`ranking`] -- Roster ordering used to pick elites.
//!
//! [`EvolutionLoop`]: evolution::EvolutionLoop
//! [`EvolutionCallback`]: evolution::EvolutionCallback

pub mod champion;
pub mod config;
pub mod evolution;
pub mod ranking;
