//! Configuration loading and typed config structures for the Preygent simulation.
//!
//! The canonical configuration lives in `preygent-config.yaml` in the
//! working directory. This module defines strongly-typed structs that
//! mirror the YAML structure, and provides a loader that reads and
//! validates the file. Every field is optional in YAML.

use std::path::{Path, PathBuf};

use preygent_program::{GeneratorSettings, InterpreterOptions, MutationSettings};
use preygent_types::SensingMode;
use preygent_world::{BodySettings, Spawner};
use serde::Deserialize;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "preygent-config.yaml";

/// Environment variable naming an alternative configuration file.
pub const CONFIG_PATH_ENV: &str = "PREYGENT_CONFIG";

/// Environment variable overriding `persistence.champion_path`.
pub const CHAMPION_PATH_ENV: &str = "PREYGENT_CHAMPION_PATH";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is outside its accepted range.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `preygent-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PreygentConfig {
    /// Grid world and body settings.
    #[serde(default)]
    pub world: WorldConfig,

    /// Population and mutation parameters.
    #[serde(default)]
    pub evolution: EvolutionConfig,

    /// Program interpreter settings.
    #[serde(default)]
    pub interpreter: InterpreterConfig,

    /// Champion file settings.
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PreygentConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `PREYGENT_CHAMPION_PATH` overrides `persistence.champion_path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.persistence.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    ///
    /// # Errors
    ///
    /// Same as [`from_file`](Self::from_file) when the file exists.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::from_file(path);
        }
        let mut config = Self::default();
        config.persistence.apply_env_overrides();
        Ok(config)
    }

    /// Check value ranges that YAML types cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.world.spawn_extent < 1 {
            return Err(invalid("world.spawn_extent", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.evolution.mutation_rate) {
            return Err(invalid("evolution.mutation_rate", "must be within [0, 1]"));
        }
        if self.evolution.mutation_subtree_size == 0 {
            return Err(invalid("evolution.mutation_subtree_size", "must be at least 1"));
        }
        if self.evolution.random_program_size == 0 {
            return Err(invalid("evolution.random_program_size", "must be at least 1"));
        }
        if self.interpreter.erc_min > self.interpreter.erc_max {
            return Err(invalid("interpreter.erc_min", "must not exceed erc_max"));
        }
        Ok(())
    }

    /// Build the agent [`Spawner`] these settings describe.
    pub fn spawner(&self) -> Spawner {
        Spawner::new(
            self.interpreter.options(),
            self.mutation_settings(),
            self.world.body_settings(),
            self.evolution.random_program_size,
        )
    }

    /// Mutation settings, with literal ranges from the interpreter section.
    pub const fn mutation_settings(&self) -> MutationSettings {
        MutationSettings {
            rate: self.evolution.mutation_rate,
            subtree_size: self.evolution.mutation_subtree_size,
            generator: self.interpreter.generator_settings(),
        }
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_owned(),
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Grid world and body settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// RNG seed for reproducible runs (unset = OS entropy).
    #[serde(default)]
    pub seed: Option<u64>,

    /// Points each fresh body starts with.
    #[serde(default = "default_starting_points")]
    pub starting_points: u64,

    /// Fresh bodies spawn in `[0, spawn_extent)` on both axes.
    #[serde(default = "default_spawn_extent")]
    pub spawn_extent: i64,

    /// Which cell `available` and `consume` look at.
    #[serde(default)]
    pub sensing: SensingMode,

    /// Tick cap per generation (0 = run until quiescent, however long).
    #[serde(default = "default_max_ticks_per_generation")]
    pub max_ticks_per_generation: u64,

    /// Record a trace line for every primitive that acts.
    #[serde(default)]
    pub trace: bool,
}

impl WorldConfig {
    /// Settings for fresh bodies.
    pub const fn body_settings(&self) -> BodySettings {
        BodySettings {
            starting_points: self.starting_points,
            spawn_extent: self.spawn_extent,
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: None,
            starting_points: default_starting_points(),
            spawn_extent: default_spawn_extent(),
            sensing: SensingMode::default(),
            max_ticks_per_generation: default_max_ticks_per_generation(),
            trace: false,
        }
    }
}

/// Population and mutation parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EvolutionConfig {
    /// Agents carried verbatim into the next generation.
    #[serde(default = "default_elite_count")]
    pub elite_count: usize,

    /// Mutated offspring added per elite.
    #[serde(default = "default_mutants_per_elite")]
    pub mutants_per_elite: usize,

    /// Fresh random agents added each generation.
    #[serde(default = "default_random_quota")]
    pub random_quota: usize,

    /// Generations to run (0 = run forever).
    #[serde(default)]
    pub max_generations: u64,

    /// Largest random program, in nodes.
    #[serde(default = "default_random_program_size")]
    pub random_program_size: usize,

    /// Per-node subtree replacement probability.
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,

    /// Largest replacement subtree, in nodes.
    #[serde(default = "default_mutation_subtree_size")]
    pub mutation_subtree_size: usize,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            elite_count: default_elite_count(),
            mutants_per_elite: default_mutants_per_elite(),
            random_quota: default_random_quota(),
            max_generations: 0,
            random_program_size: default_random_program_size(),
            mutation_rate: default_mutation_rate(),
            mutation_subtree_size: default_mutation_subtree_size(),
        }
    }
}

/// Program interpreter settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InterpreterConfig {
    /// Exec-stack evaluations allowed per agent per tick.
    #[serde(default = "default_eval_step_limit")]
    pub eval_step_limit: u64,

    /// Treat a lone top-level list in program text as the root.
    #[serde(default = "default_true")]
    pub unwrap_single_list: bool,

    /// Smallest random integer literal.
    #[serde(default = "default_erc_min")]
    pub erc_min: i64,

    /// Largest random integer literal.
    #[serde(default = "default_erc_max")]
    pub erc_max: i64,
}

impl InterpreterConfig {
    /// Options for each agent's interpreter.
    pub const fn options(&self) -> InterpreterOptions {
        InterpreterOptions {
            eval_step_limit: self.eval_step_limit,
            unwrap_single_list: self.unwrap_single_list,
        }
    }

    /// Literal ranges for program generation.
    pub const fn generator_settings(&self) -> GeneratorSettings {
        GeneratorSettings {
            erc_min: self.erc_min,
            erc_max: self.erc_max,
        }
    }
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            eval_step_limit: default_eval_step_limit(),
            unwrap_single_list: true,
            erc_min: default_erc_min(),
            erc_max: default_erc_max(),
        }
    }
}

/// Champion file settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PersistenceConfig {
    /// Where the best program is read at startup and written on each new
    /// champion (empty = persistence disabled).
    #[serde(default = "default_champion_path")]
    pub champion_path: String,
}

impl PersistenceConfig {
    /// Override the champion path with `PREYGENT_CHAMPION_PATH` when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(CHAMPION_PATH_ENV) {
            self.champion_path = val;
        }
    }

    /// The champion file, or `None` when persistence is disabled.
    pub fn champion_file(&self) -> Option<PathBuf> {
        if self.champion_path.trim().is_empty() {
            None
        } else {
            Some(PathBuf::from(&self.champion_path))
        }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            champion_path: default_champion_path(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_starting_points() -> u64 {
    5
}

const fn default_spawn_extent() -> i64 {
    10
}

const fn default_max_ticks_per_generation() -> u64 {
    100_000
}

const fn default_elite_count() -> usize {
    25
}

const fn default_mutants_per_elite() -> usize {
    2
}

const fn default_random_quota() -> usize {
    250
}

const fn default_random_program_size() -> usize {
    20
}

const fn default_mutation_rate() -> f64 {
    0.05
}

const fn default_mutation_subtree_size() -> usize {
    5
}

const fn default_eval_step_limit() -> u64 {
    10_000
}

const fn default_erc_min() -> i64 {
    -10
}

const fn default_erc_max() -> i64 {
    10
}

const fn default_true() -> bool {
    true
}

fn default_champion_path() -> String {
    "best.push".to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = PreygentConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.world.starting_points, 5);
        assert_eq!(config.world.spawn_extent, 10);
        assert_eq!(config.world.sensing, SensingMode::Ahead);
        assert_eq!(config.world.max_ticks_per_generation, 100_000);
        assert_eq!(config.evolution.elite_count, 25);
        assert_eq!(config.evolution.mutants_per_elite, 2);
        assert_eq!(config.evolution.random_quota, 250);
        assert_eq!(config.interpreter.eval_step_limit, 10_000);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
world:
  seed: 123
  starting_points: 7
  spawn_extent: 4
  sensing: here
  max_ticks_per_generation: 500
  trace: true

evolution:
  elite_count: 5
  mutants_per_elite: 3
  random_quota: 40
  max_generations: 10
  random_program_size: 12
  mutation_rate: 0.1
  mutation_subtree_size: 3

interpreter:
  eval_step_limit: 2000
  unwrap_single_list: false
  erc_min: -3
  erc_max: 3

logging:
  level: "debug"
  format: json
"#;
        let config = PreygentConfig::parse(yaml).unwrap();
        assert_eq!(config.world.seed, Some(123));
        assert_eq!(config.world.sensing, SensingMode::Here);
        assert!(config.world.trace);
        assert_eq!(config.evolution.max_generations, 10);
        assert_eq!(config.evolution.mutants_per_elite, 3);
        assert!(!config.interpreter.unwrap_single_list);
        assert_eq!(config.logging.format, LogFormat::Json);

        let mutation = config.mutation_settings();
        assert_eq!(mutation.subtree_size, 3);
        assert_eq!(mutation.generator.erc_min, -3);
        assert_eq!(config.interpreter.options().eval_step_limit, 2000);
        assert_eq!(config.world.body_settings().starting_points, 7);
    }

    #[test]
    fn parse_minimal_yaml() {
        let config = PreygentConfig::parse("world:\n  seed: 7\n").unwrap();
        assert_eq!(config.world.seed, Some(7));
        assert_eq!(config.evolution.elite_count, 25);
        assert_eq!(config.interpreter.erc_max, 10);
    }

    #[test]
    fn parse_empty_yaml() {
        assert!(PreygentConfig::parse("").is_ok());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let err = PreygentConfig::parse("evolution:\n  mutation_rate: 1.5\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "evolution.mutation_rate",
                ..
            }
        ));
        let err = PreygentConfig::parse("interpreter:\n  erc_min: 5\n  erc_max: 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        let err = PreygentConfig::parse("world:\n  spawn_extent: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn unknown_sensing_mode_is_a_yaml_error() {
        let err = PreygentConfig::parse("world:\n  sensing: sideways\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
    }

    #[test]
    fn empty_champion_path_disables_persistence() {
        let persistence = PersistenceConfig {
            champion_path: "  ".to_owned(),
        };
        assert!(persistence.champion_file().is_none());
        let persistence = PersistenceConfig {
            champion_path: "best.push".to_owned(),
        };
        assert_eq!(persistence.champion_file(), Some(PathBuf::from("best.push")));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = PreygentConfig::load_or_default(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config.evolution.random_quota, 250);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "evolution:\n  random_quota: 9\n").unwrap();
        let config = PreygentConfig::from_file(&path).unwrap();
        assert_eq!(config.evolution.random_quota, 9);
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join(DEFAULT_CONFIG_FILE);
        if path.exists() {
            let config = PreygentConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
