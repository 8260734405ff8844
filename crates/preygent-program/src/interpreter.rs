//! The Push-style execution loop.
//!
//! An [`Interpreter`] owns typed [`Stacks`] and a shared, read-only
//! [`InstructionSet`]. Running a program pushes its root onto the exec
//! stack and repeatedly pops and evaluates until the exec stack is empty
//! or the evaluation-step budget is spent:
//!
//! - integer and boolean literals go to their stacks,
//! - lists push their children in reverse so the first child runs next,
//! - instructions are looked up by name and called with the stacks and
//!   the caller-supplied context.
//!
//! The interpreter is generic over the context type `C`. Instructions are
//! plain function pointers `fn(&mut Stacks, &mut C)`; anything an
//! instruction may touch outside the stacks is reached through `C`.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::trace;

use crate::error::ParseError;
use crate::parse;
use crate::program::{NodeId, NodeKind, Program};

/// Values beyond this depth are silently dropped by typed-stack pushes.
pub const MAX_STACK_DEPTH: usize = 1024;

/// An instruction body.
pub type Instruction<C> = fn(&mut Stacks, &mut C);

// ---------------------------------------------------------------------------
// Stacks
// ---------------------------------------------------------------------------

/// The typed stacks an interpreter evaluates against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stacks {
    integer: Vec<i64>,
    boolean: Vec<bool>,
    exec: Vec<NodeId>,
}

impl Stacks {
    /// Create empty stacks.
    pub const fn new() -> Self {
        Self {
            integer: Vec::new(),
            boolean: Vec::new(),
            exec: Vec::new(),
        }
    }

    /// Push onto the integer stack.
    pub fn push_integer(&mut self, value: i64) {
        if self.integer.len() < MAX_STACK_DEPTH {
            self.integer.push(value);
        }
    }

    /// Pop the top integer, if any.
    pub fn pop_integer(&mut self) -> Option<i64> {
        self.integer.pop()
    }

    /// Pop the top two integers as `(second, top)`.
    ///
    /// Leaves the stack untouched unless both values are present.
    pub fn pop_integer_pair(&mut self) -> Option<(i64, i64)> {
        if self.integer.len() < 2 {
            return None;
        }
        let top = self.integer.pop()?;
        let second = self.integer.pop()?;
        Some((second, top))
    }

    /// Current integer stack, bottom first.
    pub fn integers(&self) -> &[i64] {
        &self.integer
    }

    /// Push onto the boolean stack.
    pub fn push_boolean(&mut self, value: bool) {
        if self.boolean.len() < MAX_STACK_DEPTH {
            self.boolean.push(value);
        }
    }

    /// Pop the top boolean, if any.
    pub fn pop_boolean(&mut self) -> Option<bool> {
        self.boolean.pop()
    }

    /// Pop the top two booleans as `(second, top)`.
    ///
    /// Leaves the stack untouched unless both values are present.
    pub fn pop_boolean_pair(&mut self) -> Option<(bool, bool)> {
        if self.boolean.len() < 2 {
            return None;
        }
        let top = self.boolean.pop()?;
        let second = self.boolean.pop()?;
        Some((second, top))
    }

    /// Current boolean stack, bottom first.
    pub fn booleans(&self) -> &[bool] {
        &self.boolean
    }

    /// Number of pending exec entries.
    pub fn exec_len(&self) -> usize {
        self.exec.len()
    }

    pub(crate) fn push_exec(&mut self, id: NodeId) {
        self.exec.push(id);
    }

    pub(crate) fn pop_exec(&mut self) -> Option<NodeId> {
        self.exec.pop()
    }

    pub(crate) fn peek_exec(&self) -> Option<NodeId> {
        self.exec.last().copied()
    }

    /// Empty the integer stack.
    pub fn flush_integers(&mut self) {
        self.integer.clear();
    }

    /// Empty the boolean stack.
    pub fn flush_booleans(&mut self) {
        self.boolean.clear();
    }
}

// ---------------------------------------------------------------------------
// Instruction set
// ---------------------------------------------------------------------------

/// Table of instructions keyed by name.
pub struct InstructionSet<C> {
    table: BTreeMap<&'static str, Instruction<C>>,
}

impl<C> InstructionSet<C> {
    /// Create an empty table.
    pub const fn new() -> Self {
        Self {
            table: BTreeMap::new(),
        }
    }

    /// Create a table holding the context-free standard vocabulary.
    pub fn standard() -> Self {
        let mut set = Self::new();
        crate::instructions::register_standard(&mut set);
        set
    }

    /// Register `body` under `name`, returning any instruction it replaces.
    pub fn register(&mut self, name: &'static str, body: Instruction<C>) -> Option<Instruction<C>> {
        self.table.insert(name, body)
    }

    /// Instruction body registered under `name`.
    pub fn get(&self, name: &str) -> Option<Instruction<C>> {
        self.table.get(name).copied()
    }

    /// The registered (static) spelling of `name`, if it is registered.
    pub fn lookup(&self, name: &str) -> Option<&'static str> {
        self.table.get_key_value(name).map(|(key, _)| *key)
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.table.keys().copied()
    }

    /// The `index`-th registered name in sorted order.
    pub fn name_at(&self, index: usize) -> Option<&'static str> {
        self.table.keys().nth(index).copied()
    }

    /// Number of registered instructions.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether no instructions are registered.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl<C> Default for InstructionSet<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> core::fmt::Debug for InstructionSet<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.table.keys()).finish()
    }
}

// ---------------------------------------------------------------------------
// Interpreter
// ---------------------------------------------------------------------------

/// Construction options for an [`Interpreter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterpreterOptions {
    /// Maximum exec-stack evaluations per run.
    pub eval_step_limit: u64,
    /// When parsing, use a lone top-level list as the root instead of
    /// wrapping it in another list.
    pub unwrap_single_list: bool,
}

impl Default for InterpreterOptions {
    fn default() -> Self {
        Self {
            eval_step_limit: 10_000,
            unwrap_single_list: true,
        }
    }
}

/// Outcome of a single [`Interpreter::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunStats {
    /// Exec-stack evaluations performed.
    pub steps: u64,
    /// Whether the run was cut short by the step budget.
    pub exhausted: bool,
}

/// A Push-style interpreter bound to one owner.
pub struct Interpreter<C> {
    options: InterpreterOptions,
    instructions: Arc<InstructionSet<C>>,
    stacks: Stacks,
}

impl<C> Interpreter<C> {
    /// Create an interpreter with empty stacks.
    pub const fn new(options: InterpreterOptions, instructions: Arc<InstructionSet<C>>) -> Self {
        Self {
            options,
            instructions,
            stacks: Stacks::new(),
        }
    }

    /// The options this interpreter was built with.
    pub const fn options(&self) -> InterpreterOptions {
        self.options
    }

    /// The shared instruction table.
    pub const fn instructions(&self) -> &Arc<InstructionSet<C>> {
        &self.instructions
    }

    /// Current stacks.
    pub const fn stacks(&self) -> &Stacks {
        &self.stacks
    }

    /// Parse program text against this interpreter's instruction table.
    pub fn parse(&self, text: &str) -> Result<Program, ParseError> {
        parse::parse(text, &*self.instructions, self.options.unwrap_single_list)
    }

    /// Execute `program` once against `context`.
    ///
    /// The integer and boolean stacks carry over between runs; the exec
    /// stack is always empty when this returns.
    pub fn run(&mut self, program: &Program, context: &mut C) -> RunStats {
        let limit = self.options.eval_step_limit;
        let mut stats = RunStats::default();

        self.stacks.exec.clear();
        self.stacks.push_exec(program.root());

        loop {
            if stats.steps >= limit {
                stats.exhausted = self.stacks.exec_len() > 0;
                self.stacks.exec.clear();
                break;
            }
            let Some(id) = self.stacks.pop_exec() else {
                break;
            };
            stats.steps = stats.steps.saturating_add(1);

            let Some(node) = program.node(id) else {
                continue;
            };
            match node.kind() {
                NodeKind::Integer(value) => self.stacks.push_integer(value),
                NodeKind::Boolean(value) => self.stacks.push_boolean(value),
                NodeKind::Instruction(name) => {
                    if let Some(body) = self.instructions.get(name) {
                        body(&mut self.stacks, context);
                    }
                }
                NodeKind::List => {
                    for child in node.children().iter().rev() {
                        self.stacks.push_exec(*child);
                    }
                }
            }
        }

        if stats.exhausted {
            trace!(steps = stats.steps, "evaluation step budget exhausted");
        }
        stats
    }
}

impl<C> core::fmt::Debug for Interpreter<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Interpreter")
            .field("options", &self.options)
            .field("instructions", &self.instructions.len())
            .field("stacks", &self.stacks)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Context that counts how often `tick` ran.
    #[derive(Default)]
    struct Counter {
        ticks: u32,
    }

    fn tick(_stacks: &mut Stacks, counter: &mut Counter) {
        counter.ticks = counter.ticks.saturating_add(1);
    }

    fn interpreter(limit: u64) -> Interpreter<Counter> {
        let mut set = InstructionSet::standard();
        set.register("tick", tick);
        let options = InterpreterOptions {
            eval_step_limit: limit,
            ..InterpreterOptions::default()
        };
        Interpreter::new(options, Arc::new(set))
    }

    #[test]
    fn literals_land_on_their_stacks() {
        let mut interp = interpreter(100);
        let program = interp.parse("( 3 true -4 )").unwrap();
        interp.run(&program, &mut Counter::default());
        assert_eq!(interp.stacks().integers(), &[3, -4]);
        assert_eq!(interp.stacks().booleans(), &[true]);
    }

    #[test]
    fn instructions_receive_context() {
        let mut interp = interpreter(100);
        let program = interp.parse("( tick ( tick tick ) )").unwrap();
        let mut counter = Counter::default();
        let stats = interp.run(&program, &mut counter);
        assert_eq!(counter.ticks, 3);
        assert!(!stats.exhausted);
        // Root list, inner list, three instructions.
        assert_eq!(stats.steps, 5);
    }

    #[test]
    fn children_run_in_order() {
        let mut interp = interpreter(100);
        let program = interp.parse("( 10 3 integer.- )").unwrap();
        interp.run(&program, &mut Counter::default());
        assert_eq!(interp.stacks().integers(), &[7]);
    }

    #[test]
    fn step_budget_aborts_run() {
        let mut interp = interpreter(3);
        let program = interp.parse("( tick tick tick tick tick )").unwrap();
        let mut counter = Counter::default();
        let stats = interp.run(&program, &mut counter);
        assert!(stats.exhausted);
        assert_eq!(stats.steps, 3);
        // The root list consumed one step.
        assert_eq!(counter.ticks, 2);
        assert_eq!(interp.stacks().exec_len(), 0);
    }

    #[test]
    fn exec_dup_loops_are_bounded() {
        let mut interp = interpreter(50);
        // exec.dup duplicates the following list, which itself duplicates...
        let program = interp.parse("( exec.dup ( tick ) )").unwrap();
        let stats = interp.run(&program, &mut Counter::default());
        assert!(!stats.exhausted);

        let mut interp = interpreter(50);
        let runaway = interp.parse("( ( exec.dup exec.dup exec.dup tick ) )").unwrap();
        let stats = interp.run(&runaway, &mut Counter::default());
        assert!(stats.steps <= 50);
    }

    #[test]
    fn stacks_persist_between_runs() {
        let mut interp = interpreter(100);
        let program = interp.parse("( 1 false )").unwrap();
        interp.run(&program, &mut Counter::default());
        interp.run(&program, &mut Counter::default());
        assert_eq!(interp.stacks().integers(), &[1, 1]);
        assert_eq!(interp.stacks().booleans(), &[false, false]);
    }

    #[test]
    fn flushes_are_per_stack() {
        let mut stacks = Stacks::new();
        stacks.push_integer(1);
        stacks.push_boolean(true);
        stacks.flush_integers();
        assert!(stacks.integers().is_empty());
        assert_eq!(stacks.booleans(), &[true]);
        stacks.flush_booleans();
        assert!(stacks.booleans().is_empty());
    }

    #[test]
    fn typed_stack_depth_is_capped() {
        let mut stacks = Stacks::new();
        for value in 0..2000 {
            stacks.push_integer(value);
        }
        assert_eq!(stacks.integers().len(), MAX_STACK_DEPTH);
    }

    #[test]
    fn pair_pops_leave_short_stacks_alone() {
        let mut stacks = Stacks::new();
        stacks.push_integer(5);
        assert_eq!(stacks.pop_integer_pair(), None);
        assert_eq!(stacks.integers(), &[5]);
        stacks.push_integer(6);
        assert_eq!(stacks.pop_integer_pair(), Some((5, 6)));
    }

    #[test]
    fn lookup_returns_registered_spelling() {
        let interp = interpreter(10);
        assert_eq!(interp.instructions().lookup("tick"), Some("tick"));
        assert!(interp.instructions().lookup("tock").is_none());
    }
}
