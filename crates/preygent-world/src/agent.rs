//! Agents: a body, a program, and a private interpreter.
//!
//! The [`Spawner`] holds everything needed to make agents: the shared
//! vocabulary, the interpreter options, the mutation operator, and the
//! settings for fresh bodies. Every agent gets its own [`Interpreter`]
//! over the shared, read-only instruction table, so stacks are never
//! shared between agents.

use std::sync::Arc;

use preygent_program::{
    InstructionSet, Interpreter, InterpreterOptions, MutationSettings, ParseError, Program,
    ProgramMutator, RunStats,
};
use preygent_types::{AgentId, AgentState, Position};
use rand::Rng;

use crate::primitives::{TickContext, vocabulary};

// ---------------------------------------------------------------------------
// Spawner
// ---------------------------------------------------------------------------

/// Settings for fresh agent bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodySettings {
    /// Points a fresh body starts with.
    pub starting_points: u64,
    /// Fresh bodies are placed uniformly in `[0, spawn_extent)` on both axes.
    pub spawn_extent: i64,
}

impl Default for BodySettings {
    fn default() -> Self {
        Self {
            starting_points: 5,
            spawn_extent: 10,
        }
    }
}

/// Makes agents that share one vocabulary.
#[derive(Debug)]
pub struct Spawner {
    mutator: ProgramMutator<TickContext>,
    options: InterpreterOptions,
    body: BodySettings,
    program_size: usize,
}

impl Spawner {
    /// Create a spawner over the full agent [`vocabulary`].
    ///
    /// `program_size` bounds the size of programs made by [`Agent::random`].
    pub fn new(
        options: InterpreterOptions,
        mutation: MutationSettings,
        body: BodySettings,
        program_size: usize,
    ) -> Self {
        Self::with_instructions(Arc::new(vocabulary()), options, mutation, body, program_size)
    }

    /// Create a spawner over a custom instruction table.
    pub const fn with_instructions(
        instructions: Arc<InstructionSet<TickContext>>,
        options: InterpreterOptions,
        mutation: MutationSettings,
        body: BodySettings,
        program_size: usize,
    ) -> Self {
        Self {
            mutator: ProgramMutator::new(instructions, mutation),
            options,
            body,
            program_size,
        }
    }

    /// The shared instruction table.
    pub const fn instructions(&self) -> &Arc<InstructionSet<TickContext>> {
        self.mutator.instructions()
    }

    /// The mutation operator.
    pub const fn mutator(&self) -> &ProgramMutator<TickContext> {
        &self.mutator
    }

    /// Interpreter options given to every agent.
    pub const fn options(&self) -> InterpreterOptions {
        self.options
    }

    /// Settings for fresh bodies.
    pub const fn body_settings(&self) -> BodySettings {
        self.body
    }

    /// Parse program text against the shared vocabulary.
    pub fn parse(&self, text: &str) -> Result<Program, ParseError> {
        preygent_program::parse(
            text,
            &**self.instructions(),
            self.options.unwrap_single_list,
        )
    }

    /// A fresh body for `generation`: starting points, facing North, at a
    /// random spawn cell.
    pub fn fresh_body<R: Rng + ?Sized>(&self, rng: &mut R, generation: u64) -> AgentState {
        AgentState::new(generation, self.spawn_position(rng), self.body.starting_points)
    }

    fn spawn_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Position {
        let extent = self.body.spawn_extent.max(1);
        Position::new(rng.random_range(0..extent), rng.random_range(0..extent))
    }

    fn interpreter(&self) -> Interpreter<TickContext> {
        Interpreter::new(self.options, Arc::clone(self.instructions()))
    }
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// A competing agent.
#[derive(Debug)]
pub struct Agent {
    state: AgentState,
    program: Program,
    interpreter: Interpreter<TickContext>,
}

impl Agent {
    /// A new agent with a random program and a fresh body.
    pub fn random<R: Rng + ?Sized>(spawner: &Spawner, rng: &mut R, generation: u64) -> Self {
        let program = spawner.mutator.random_program(rng, spawner.program_size);
        Self::from_program(spawner, rng, program, generation)
    }

    /// A new agent running `program`, with a fresh body.
    pub fn from_program<R: Rng + ?Sized>(
        spawner: &Spawner,
        rng: &mut R,
        program: Program,
        generation: u64,
    ) -> Self {
        Self {
            state: spawner.fresh_body(rng, generation),
            program,
            interpreter: spawner.interpreter(),
        }
    }

    /// A mutated, compacted offspring of this agent.
    ///
    /// The offspring has a new identity, belongs to `generation`, records
    /// this agent as its parent, and starts in a fresh body.
    pub fn mutant<R: Rng + ?Sized>(&self, spawner: &Spawner, rng: &mut R, generation: u64) -> Self {
        let mutated = spawner.mutator.mutate(&self.program, rng);
        let program = spawner.mutator.compact(&mutated);
        let mut child = Self::from_program(spawner, rng, program, generation);
        child.state.parent = Some(self.state.id);
        child
    }

    /// Run the program once against `context`.
    ///
    /// The agent's body is read and written through the context, which
    /// must have this agent selected as its actor.
    pub fn step(&mut self, context: &mut TickContext) -> RunStats {
        self.interpreter.run(&self.program, context)
    }

    /// Unique identity.
    pub const fn id(&self) -> AgentId {
        self.state.id
    }

    /// Current body.
    pub const fn state(&self) -> &AgentState {
        &self.state
    }

    /// Mutable access to the body.
    pub const fn state_mut(&mut self) -> &mut AgentState {
        &mut self.state
    }

    /// Points held.
    pub const fn points(&self) -> u64 {
        self.state.points
    }

    /// Generation of creation.
    pub const fn generation(&self) -> u64 {
        self.state.generation
    }

    /// Current cell.
    pub const fn position(&self) -> Position {
        self.state.position
    }

    /// Whether the agent still acts.
    pub const fn is_alive(&self) -> bool {
        self.state.is_alive()
    }

    /// The agent's program.
    pub const fn program(&self) -> &Program {
        &self.program
    }

    /// Structural size of the program.
    pub fn size(&self) -> usize {
        self.program.size()
    }

    /// The agent's interpreter.
    pub const fn interpreter(&self) -> &Interpreter<TickContext> {
        &self.interpreter
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use preygent_types::Direction;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn spawner() -> Spawner {
        Spawner::new(
            InterpreterOptions::default(),
            MutationSettings::default(),
            BodySettings::default(),
            20,
        )
    }

    #[test]
    fn fresh_bodies_follow_settings() {
        let spawner = spawner();
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..100 {
            let agent = Agent::random(&spawner, &mut rng, 4);
            let state = agent.state();
            assert_eq!(state.points, 5);
            assert_eq!(state.direction, Direction::North);
            assert_eq!(state.generation, 4);
            assert!(state.parent.is_none());
            assert!((0..10).contains(&state.position.x));
            assert!((0..10).contains(&state.position.y));
            assert!(agent.size() <= 20);
        }
    }

    #[test]
    fn mutant_has_new_identity_and_parent() {
        let spawner = spawner();
        let mut rng = SmallRng::seed_from_u64(2);
        let parent = Agent::random(&spawner, &mut rng, 1);
        let child = parent.mutant(&spawner, &mut rng, 7);
        assert_ne!(child.id(), parent.id());
        assert_eq!(child.generation(), 7);
        assert_eq!(child.state().parent, Some(parent.id()));
        assert_eq!(child.points(), 5);
    }

    #[test]
    fn mutant_program_is_compact() {
        let spawner = spawner();
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..20 {
            let parent = Agent::random(&spawner, &mut rng, 1);
            let child = parent.mutant(&spawner, &mut rng, 2);
            let recompacted = spawner.mutator().compact(child.program());
            assert_eq!(&recompacted, child.program());
        }
    }

    #[test]
    fn stacks_carry_over_between_steps() {
        let spawner = spawner();
        let mut rng = SmallRng::seed_from_u64(4);
        let program = spawner.parse("( 3 4 true )").unwrap();
        let mut agent = Agent::from_program(&spawner, &mut rng, program, 1);

        for _ in 0..2 {
            let mut context = TickContext::new(vec![*agent.state()], 0, Default::default(), false);
            assert!(context.select(0));
            agent.step(&mut context);
        }
        assert_eq!(agent.interpreter().stacks().integers(), &[3, 4, 3, 4]);
        assert_eq!(agent.interpreter().stacks().booleans(), &[true, true]);
    }

    #[test]
    fn parse_uses_agent_vocabulary() {
        let spawner = spawner();
        assert!(spawner.parse("( 1 move consume available nearest )").is_ok());
        assert!(spawner.parse("( fly )").is_err());
    }
}
