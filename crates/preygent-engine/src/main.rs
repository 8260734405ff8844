//! Evolution engine binary for the Preygent simulation.
//!
//! # Startup Sequence
//!
//! 1. Load configuration (`PREYGENT_CONFIG` or `preygent-config.yaml`)
//! 2. Initialize structured logging (tracing)
//! 3. Seed the random number generator
//! 4. Load the saved champion, if any, as the first elite
//! 5. Run generations until the limit (forever by default)
//! 6. Log the result

mod error;

use std::path::PathBuf;

use preygent_core::champion;
use preygent_core::config::{CONFIG_PATH_ENV, DEFAULT_CONFIG_FILE, LogFormat, PreygentConfig};
use preygent_core::evolution::{self, EvolutionLoop, LoggingCallback};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if configuration or the champion file cannot be
/// loaded, or if a new champion cannot be saved.
fn main() -> Result<(), EngineError> {
    // 1. Load configuration.
    let config_path = std::env::var(CONFIG_PATH_ENV)
        .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from);
    let config = PreygentConfig::load_or_default(&config_path)?;

    // 2. Initialize structured logging.
    init_logging(&config);
    info!(
        config = %config_path.display(),
        seed = ?config.world.seed,
        sensing = ?config.world.sensing,
        champion_path = %config.persistence.champion_path,
        "preygent-engine starting"
    );

    // 3. Seed the RNG.
    let rng = config
        .world
        .seed
        .map_or_else(SmallRng::from_os_rng, SmallRng::seed_from_u64);

    // 4. Load the saved champion.
    let mut evolution = EvolutionLoop::from_config(&config, rng);
    if let Some(path) = config.persistence.champion_file() {
        let loaded = champion::load_champion(
            &path,
            &**evolution.spawner().instructions(),
            config.interpreter.unwrap_single_list,
        )?;
        match loaded {
            Some(program) => {
                info!(
                    path = %path.display(),
                    size = program.size(),
                    "Loaded champion"
                );
                evolution = evolution.with_champion(program);
            }
            None => info!(path = %path.display(), "No champion file, starting fresh"),
        }
    }

    // 5. Run.
    let mut callback = LoggingCallback;
    let result = evolution.run(&mut callback)?;

    // 6. Log results.
    evolution::log_evolution_end(&result);
    info!(
        generations = result.generations,
        "preygent-engine shutdown complete"
    );

    Ok(())
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_logging(config: &PreygentConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match config.logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}
