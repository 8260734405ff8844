//! The generational evolution loop.
//!
//! Each generation:
//!
//! 1. resets the world,
//! 2. seeds it with every elite followed by its mutated offspring, then a
//!    quota of fresh random agents,
//! 3. runs the world to quiescence (or the per-generation tick cap),
//! 4. ranks the roster,
//! 5. reports and persists the top agent if it was not already an elite,
//! 6. keeps the top K agents as the next elite set.
//!
//! Elites are carried over exactly as they finished: identity, generation,
//! program, body, and interpreter stacks.

use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use preygent_program::Program;
use preygent_types::AgentId;
use preygent_world::{Agent, EndReason, GridWorld, Spawner, TraceEvent};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::champion::{self, ChampionError};
use crate::config::PreygentConfig;
use crate::ranking;

/// Errors that end an evolution run.
#[derive(Debug, thiserror::Error)]
pub enum EvolutionError {
    /// The champion file could not be written.
    #[error("champion error: {source}")]
    Champion {
        /// The underlying champion error.
        #[from]
        source: ChampionError,
    },
}

/// Population parameters for an [`EvolutionLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvolutionSettings {
    /// Agents carried verbatim into the next generation.
    pub elite_count: usize,
    /// Mutated offspring added per elite.
    pub mutants_per_elite: usize,
    /// Fresh random agents added each generation.
    pub random_quota: usize,
    /// Generations to run (0 = run forever).
    pub max_generations: u64,
    /// Tick cap per generation (0 = none).
    pub max_ticks_per_generation: u64,
}

impl Default for EvolutionSettings {
    fn default() -> Self {
        Self {
            elite_count: 25,
            mutants_per_elite: 2,
            random_quota: 250,
            max_generations: 0,
            max_ticks_per_generation: 100_000,
        }
    }
}

impl From<&PreygentConfig> for EvolutionSettings {
    fn from(config: &PreygentConfig) -> Self {
        Self {
            elite_count: config.evolution.elite_count,
            mutants_per_elite: config.evolution.mutants_per_elite,
            random_quota: config.evolution.random_quota,
            max_generations: config.evolution.max_generations,
            max_ticks_per_generation: config.world.max_ticks_per_generation,
        }
    }
}

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------

/// Per-generation statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationSummary {
    /// Generation number (1-based).
    pub generation: u64,
    /// Ticks the world ran.
    pub ticks: u64,
    /// Why the world stopped.
    pub end_reason: EndReason,
    /// Agents in the roster.
    pub population: usize,
    /// Agents with points left at the end.
    pub alive: usize,
    /// Points held by the whole roster after the run.
    pub total_points: u64,
    /// Points held by the top-ranked agent.
    pub top_points: u64,
}

/// A newly crowned champion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChampionReport {
    /// The champion's identity.
    pub id: AgentId,
    /// Points it finished with.
    pub points: u64,
    /// Generation it was created in.
    pub generation: u64,
    /// Generation in which it came out on top.
    pub crowned_in: u64,
    /// The agent it was mutated from, if any.
    pub parent: Option<AgentId>,
    /// Ticks the world ran in the crowning generation.
    pub ticks: u64,
    /// Structural size of its program.
    pub size: usize,
    /// Its program as text.
    pub program: String,
    /// When it was crowned.
    pub crowned_at: DateTime<Utc>,
}

/// Callback invoked as the evolution loop progresses.
pub trait EvolutionCallback {
    /// Called after every generation.
    fn on_generation(&mut self, summary: &GenerationSummary);

    /// Called when a new champion is crowned, after it is persisted.
    fn on_champion(&mut self, report: &ChampionReport);

    /// Called after each tick with that tick's trace events when tracing
    /// is on.
    fn on_trace(&mut self, _events: &[TraceEvent]) {}
}

/// A no-op callback for testing.
pub struct NoOpCallback;

impl EvolutionCallback for NoOpCallback {
    fn on_generation(&mut self, _summary: &GenerationSummary) {}
    fn on_champion(&mut self, _report: &ChampionReport) {}
}

/// Reports progress through `tracing`.
pub struct LoggingCallback;

impl EvolutionCallback for LoggingCallback {
    fn on_generation(&mut self, summary: &GenerationSummary) {
        debug!(
            generation = summary.generation,
            ticks = summary.ticks,
            end_reason = %summary.end_reason,
            population = summary.population,
            alive = summary.alive,
            total_points = summary.total_points,
            top_points = summary.top_points,
            "Generation complete"
        );
    }

    fn on_champion(&mut self, report: &ChampionReport) {
        info!(
            generation = report.crowned_in,
            ticks = report.ticks,
            id = %report.id,
            points = report.points,
            from_generation = report.generation,
            size = report.size,
            "New champion"
        );
        info!("{}", report.program);
    }

    fn on_trace(&mut self, events: &[TraceEvent]) {
        for event in events {
            debug!(tick = event.tick, "{event}");
        }
    }
}

/// Result of an evolution run.
#[derive(Debug)]
pub struct EvolutionResult {
    /// Generations completed.
    pub generations: u64,
    /// The last champion crowned during the run, if any.
    pub champion: Option<ChampionReport>,
    /// Statistics of the last generation, if any ran.
    pub final_summary: Option<GenerationSummary>,
}

/// Log the end of an evolution run.
pub fn log_evolution_end(result: &EvolutionResult) {
    info!(
        generations = result.generations,
        champion = ?result.champion.as_ref().map(|c| c.id),
        champion_points = result.champion.as_ref().map_or(0, |c| c.points),
        "Evolution ended"
    );
    if result.final_summary.is_none() {
        warn!("Evolution ended with no generations executed");
    }
}

// ---------------------------------------------------------------------------
// Loop
// ---------------------------------------------------------------------------

/// Drives generations of agents through the world.
#[derive(Debug)]
pub struct EvolutionLoop<R> {
    settings: EvolutionSettings,
    spawner: Spawner,
    world: GridWorld,
    elites: Vec<Agent>,
    champion_path: Option<PathBuf>,
    generation: u64,
    rng: R,
}

impl<R: Rng> EvolutionLoop<R> {
    /// Create a loop with an empty elite set.
    ///
    /// `champion_path` of `None` disables persistence.
    pub const fn new(
        settings: EvolutionSettings,
        spawner: Spawner,
        world: GridWorld,
        champion_path: Option<PathBuf>,
        rng: R,
    ) -> Self {
        Self {
            settings,
            spawner,
            world,
            elites: Vec::new(),
            champion_path,
            generation: 0,
            rng,
        }
    }

    /// Create a loop from a full configuration.
    pub fn from_config(config: &PreygentConfig, rng: R) -> Self {
        let world = GridWorld::new(config.world.sensing).with_trace(config.world.trace);
        Self::new(
            EvolutionSettings::from(config),
            config.spawner(),
            world,
            config.persistence.champion_file(),
            rng,
        )
    }

    /// Seed the elite set with a previously saved champion program.
    #[must_use]
    pub fn with_champion(mut self, program: Program) -> Self {
        let champion = Agent::from_program(&self.spawner, &mut self.rng, program, 0);
        self.elites = vec![champion];
        self
    }

    /// The agent factory.
    pub const fn spawner(&self) -> &Spawner {
        &self.spawner
    }

    /// The current elite set, best first.
    pub fn elites(&self) -> &[Agent] {
        &self.elites
    }

    /// Generations completed so far.
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Run generations until `max_generations` is reached (forever if 0).
    ///
    /// # Errors
    ///
    /// Returns [`EvolutionError::Champion`] if a champion cannot be saved.
    pub fn run(
        &mut self,
        callback: &mut dyn EvolutionCallback,
    ) -> Result<EvolutionResult, EvolutionError> {
        info!(
            elite_count = self.settings.elite_count,
            mutants_per_elite = self.settings.mutants_per_elite,
            random_quota = self.settings.random_quota,
            max_generations = self.settings.max_generations,
            seeded_elites = self.elites.len(),
            "Evolution starting"
        );

        let mut result = EvolutionResult {
            generations: 0,
            champion: None,
            final_summary: None,
        };
        loop {
            let max = self.settings.max_generations;
            if max > 0 && result.generations >= max {
                info!(generations = result.generations, "Generation limit reached");
                return Ok(result);
            }
            let (summary, champion) = self.run_generation(callback)?;
            result.generations = result.generations.saturating_add(1);
            result.final_summary = Some(summary);
            if champion.is_some() {
                result.champion = champion;
            }
        }
    }

    /// Run exactly one generation.
    ///
    /// Returns the generation summary and, if the top agent was not
    /// already an elite, its champion report.
    ///
    /// # Errors
    ///
    /// Returns [`EvolutionError::Champion`] if a champion cannot be saved.
    pub fn run_generation(
        &mut self,
        callback: &mut dyn EvolutionCallback,
    ) -> Result<(GenerationSummary, Option<ChampionReport>), EvolutionError> {
        self.generation = self.generation.saturating_add(1);
        let generation = self.generation;

        let previous: BTreeSet<AgentId> = self.elites.iter().map(Agent::id).collect();
        self.seed(generation);
        let seeded_points = self.world.total_points();

        let run = self
            .world
            .run_until_quiescent_with(self.settings.max_ticks_per_generation, |events| {
                callback.on_trace(events);
            });

        let final_points = self.world.total_points();
        if final_points != seeded_points {
            warn!(
                generation,
                seeded_points, final_points, "Total points changed during generation"
            );
        }

        let mut roster = self.world.take_roster();
        ranking::rank(&mut roster);

        let summary = GenerationSummary {
            generation,
            ticks: run.ticks,
            end_reason: run.reason,
            population: roster.len(),
            alive: roster.iter().filter(|agent| agent.is_alive()).count(),
            total_points: final_points,
            top_points: roster.first().map_or(0, Agent::points),
        };

        let champion = match roster.first() {
            Some(top) if !previous.contains(&top.id()) => {
                Some(self.crown(top, generation, run.ticks)?)
            }
            _ => None,
        };
        if let Some(report) = champion.as_ref() {
            callback.on_champion(report);
        }

        roster.truncate(self.settings.elite_count);
        self.elites = roster;

        callback.on_generation(&summary);
        Ok((summary, champion))
    }

    fn seed(&mut self, generation: u64) {
        self.world.reset();
        for elite in core::mem::take(&mut self.elites) {
            let mutants: Vec<Agent> = (0..self.settings.mutants_per_elite)
                .map(|_| elite.mutant(&self.spawner, &mut self.rng, generation))
                .collect();
            self.world.add_agent(elite);
            for mutant in mutants {
                self.world.add_agent(mutant);
            }
        }
        for _ in 0..self.settings.random_quota {
            let agent = Agent::random(&self.spawner, &mut self.rng, generation);
            self.world.add_agent(agent);
        }
        debug!(generation, population = self.world.len(), "World seeded");
    }

    fn crown(
        &self,
        top: &Agent,
        generation: u64,
        ticks: u64,
    ) -> Result<ChampionReport, EvolutionError> {
        if let Some(path) = self.champion_path.as_deref() {
            champion::save_champion(path, top.program())?;
        }
        Ok(ChampionReport {
            id: top.id(),
            points: top.points(),
            generation: top.generation(),
            crowned_in: generation,
            parent: top.state().parent,
            ticks,
            size: top.size(),
            program: top.program().to_string(),
            crowned_at: Utc::now(),
        })
    }
}
