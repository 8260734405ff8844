//! Error types for the engine binary.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: preygent_core::config::ConfigError,
    },

    /// The saved champion could not be loaded.
    #[error("champion error: {source}")]
    Champion {
        /// The underlying champion error.
        #[from]
        source: preygent_core::champion::ChampionError,
    },

    /// The evolution loop failed.
    #[error("evolution error: {source}")]
    Evolution {
        /// The underlying evolution error.
        #[from]
        source: preygent_core::evolution::EvolutionError,
    },
}
