//! The shared grid world.
//!
//! A [`GridWorld`] owns an ordered roster of agents and advances them in
//! discrete ticks. Roster order decides who acts first within a tick, and
//! therefore who gets first claim on a contested cell. Agents with zero
//! points keep their cell but are skipped.
//!
//! A tick is *active* when at least one agent moved, turned, or consumed.
//! The first inactive tick is quiescence, which ends a generation.

use preygent_types::{Position, SensingMode};
use tracing::{debug, warn};

use crate::agent::Agent;
use crate::primitives::{Effects, TickContext, TraceEvent};

/// Why [`GridWorld::run_until_quiescent`] stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// A tick passed with no world-changing effect.
    Quiescent,
    /// The tick cap was reached while the world was still active.
    TickCapReached,
}

impl core::fmt::Display for EndReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Quiescent => f.write_str("quiescent"),
            Self::TickCapReached => f.write_str("tick cap reached"),
        }
    }
}

/// What happened during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickOutcome {
    /// Whether any agent changed the world.
    pub active: bool,
    /// Union of every agent's effects.
    pub effects: Effects,
    /// Agents that acted (alive at their turn).
    pub acted: usize,
    /// Agents whose run hit the evaluation-step limit.
    pub exhausted: usize,
}

/// Result of running the world to quiescence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    /// Ticks stepped during this run, including the final inactive one.
    pub ticks: u64,
    /// Why the run stopped.
    pub reason: EndReason,
}

/// The simulation arena.
#[derive(Debug, Default)]
pub struct GridWorld {
    agents: Vec<Agent>,
    tick: u64,
    sensing: SensingMode,
    trace_enabled: bool,
    trace: Vec<TraceEvent>,
}

impl GridWorld {
    /// Create an empty world using `sensing` for `available` and `consume`.
    pub const fn new(sensing: SensingMode) -> Self {
        Self {
            agents: Vec::new(),
            tick: 0,
            sensing,
            trace_enabled: false,
            trace: Vec::new(),
        }
    }

    /// Turn per-primitive trace recording on or off.
    #[must_use]
    pub const fn with_trace(mut self, enabled: bool) -> Self {
        self.trace_enabled = enabled;
        self
    }

    /// Append an agent to the end of the roster.
    pub fn add_agent(&mut self, agent: Agent) {
        self.agents.push(agent);
    }

    /// Drop every agent, zero the tick counter, and clear the trace.
    pub fn reset(&mut self) {
        self.agents.clear();
        self.tick = 0;
        self.trace.clear();
    }

    /// Advance one tick.
    ///
    /// Every agent alive at its turn runs its program once, in roster
    /// order, and sees the changes made by those before it.
    pub fn step(&mut self) -> TickOutcome {
        let bodies = self.agents.iter().map(|agent| *agent.state()).collect();
        let mut context = TickContext::new(bodies, self.tick, self.sensing, self.trace_enabled);
        let mut outcome = TickOutcome::default();

        for (index, agent) in self.agents.iter_mut().enumerate() {
            if !context.select(index) {
                continue;
            }
            let stats = agent.step(&mut context);
            outcome.effects |= context.effects();
            outcome.acted = outcome.acted.saturating_add(1);
            if stats.exhausted {
                outcome.exhausted = outcome.exhausted.saturating_add(1);
            }
        }

        let (bodies, events) = context.into_parts();
        for (agent, body) in self.agents.iter_mut().zip(bodies) {
            *agent.state_mut() = body;
        }
        self.trace.extend(events);
        self.tick = self.tick.saturating_add(1);
        outcome.active = outcome.effects.is_active();
        outcome
    }

    /// Step until a tick is inactive or `max_ticks` ticks have run.
    ///
    /// A `max_ticks` of zero means no cap. Trace events recorded during
    /// the run are discarded; use
    /// [`run_until_quiescent_with`](Self::run_until_quiescent_with) to
    /// receive them.
    pub fn run_until_quiescent(&mut self, max_ticks: u64) -> RunOutcome {
        self.run_until_quiescent_with(max_ticks, |_| {})
    }

    /// Like [`run_until_quiescent`](Self::run_until_quiescent), handing
    /// each tick's trace events to `on_events` and then dropping them, so
    /// the trace buffer never holds more than one tick.
    pub fn run_until_quiescent_with<F>(&mut self, max_ticks: u64, mut on_events: F) -> RunOutcome
    where
        F: FnMut(&[TraceEvent]),
    {
        let mut ticks: u64 = 0;
        loop {
            let outcome = self.step();
            ticks = ticks.saturating_add(1);
            if !self.trace.is_empty() {
                on_events(&self.trace);
                self.trace.clear();
            }
            if !outcome.active {
                debug!(ticks, "world quiescent");
                return RunOutcome {
                    ticks,
                    reason: EndReason::Quiescent,
                };
            }
            if max_ticks > 0 && ticks >= max_ticks {
                warn!(ticks, "tick cap reached before quiescence");
                return RunOutcome {
                    ticks,
                    reason: EndReason::TickCapReached,
                };
            }
        }
    }

    /// Every agent on `position`, in roster order.
    pub fn agents_at(&self, position: Position) -> Vec<&Agent> {
        self.agents
            .iter()
            .filter(|agent| agent.position() == position)
            .collect()
    }

    /// The roster, in order.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Take the roster out of the world, leaving it empty.
    pub fn take_roster(&mut self) -> Vec<Agent> {
        core::mem::take(&mut self.agents)
    }

    /// Number of agents in the roster.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Ticks stepped since the last reset.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// The sensing mode in force.
    pub const fn sensing(&self) -> SensingMode {
        self.sensing
    }

    /// Trace events recorded by [`step`](Self::step) and not yet drained.
    pub fn trace(&self) -> &[TraceEvent] {
        &self.trace
    }

    /// Sum of points over the roster.
    pub fn total_points(&self) -> u64 {
        self.agents
            .iter()
            .fold(0_u64, |sum, agent| sum.saturating_add(agent.points()))
    }
}
