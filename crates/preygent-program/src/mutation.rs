//! Structural program operators: copy, point mutation, and compaction.
//!
//! All three rebuild the program bottom-up into a fresh arena, visiting
//! only nodes reachable from the root. Traversal uses an explicit frame
//! stack, so arbitrarily deep programs are handled without recursion.
//!
//! Mutation relies on the post-order layout of [`ProgramBuilder`]: the
//! nodes of the subtree being rebuilt are exactly those appended since the
//! subtree was entered, so replacing it is a truncate followed by a fresh
//! random subtree, and no unreachable nodes are left behind.

use std::sync::Arc;

use rand::Rng;

use crate::interpreter::InstructionSet;
use crate::program::{Node, NodeId, NodeKind, Program, ProgramBuilder};
use crate::random::{self, GeneratorSettings};

/// Tuning for [`ProgramMutator::mutate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MutationSettings {
    /// Per-node probability of replacing the subtree rooted there.
    pub rate: f64,
    /// Largest replacement subtree, in nodes.
    pub subtree_size: usize,
    /// Literal ranges for replacement subtrees.
    pub generator: GeneratorSettings,
}

impl Default for MutationSettings {
    fn default() -> Self {
        Self {
            rate: 0.05,
            subtree_size: 5,
            generator: GeneratorSettings::default(),
        }
    }
}

/// Creates, copies, mutates, and compacts programs over one vocabulary.
pub struct ProgramMutator<C> {
    instructions: Arc<InstructionSet<C>>,
    settings: MutationSettings,
}

impl<C> ProgramMutator<C> {
    /// Create a mutator drawing atoms from `instructions`.
    pub const fn new(instructions: Arc<InstructionSet<C>>, settings: MutationSettings) -> Self {
        Self {
            instructions,
            settings,
        }
    }

    /// The settings this mutator was built with.
    pub const fn settings(&self) -> &MutationSettings {
        &self.settings
    }

    /// The vocabulary replacement subtrees are drawn from.
    pub const fn instructions(&self) -> &Arc<InstructionSet<C>> {
        &self.instructions
    }

    /// Synthesize a random program of at most `max_size` nodes.
    pub fn random_program<R: Rng + ?Sized>(&self, rng: &mut R, max_size: usize) -> Program {
        random::generate(rng, max_size, &*self.instructions, &self.settings.generator)
    }

    /// Deep structural copy holding only reachable nodes.
    pub fn copy(&self, program: &Program) -> Program {
        copy(program)
    }

    /// Return a mutated copy of `program`.
    ///
    /// Nodes are visited children first. At each node, with probability
    /// `rate`, the subtree rooted there (including any mutations already
    /// applied inside it) is replaced by a fresh random subtree of
    /// `1..=subtree_size` nodes.
    pub fn mutate<R: Rng + ?Sized>(&self, program: &Program, rng: &mut R) -> Program {
        let rate = self.settings.rate;
        let max = self.settings.subtree_size.max(1);
        rebuild(program, |builder, start, built| {
            if rng.random::<f64>() >= rate {
                return built;
            }
            builder.truncate(start);
            let size = rng.random_range(1..=max);
            random::generate_into(
                builder,
                rng,
                size,
                &*self.instructions,
                &self.settings.generator,
            )
        })
    }

    /// Collapse single-child lists; see [`compact`].
    pub fn compact(&self, program: &Program) -> Program {
        compact(program)
    }
}

impl<C> core::fmt::Debug for ProgramMutator<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProgramMutator")
            .field("instructions", &self.instructions.len())
            .field("settings", &self.settings)
            .finish()
    }
}

/// Deep structural copy of `program` holding only reachable nodes.
pub fn copy(program: &Program) -> Program {
    rebuild(program, |_, _, built| built)
}

/// Replace every list that has exactly one child with that child.
///
/// Applies repeatedly and throughout the tree. The root stays a list: a
/// root holding a single atom is left as is. The result is never larger
/// than the input, and compacting twice equals compacting once.
pub fn compact(program: &Program) -> Program {
    let mut builder = ProgramBuilder::new();
    let mut stack = vec![Frame::new(program.root(), 0)];
    let mut root = None;

    while let Some(frame) = stack.last_mut() {
        if let Some(&child) = program.children(frame.source).get(frame.next) {
            frame.next = frame.next.saturating_add(1);
            stack.push(Frame::new(child, builder.len()));
            continue;
        }
        let Some(frame) = stack.pop() else {
            break;
        };
        let is_root = stack.is_empty();
        let kind = program.node(frame.source).map_or(NodeKind::List, Node::kind);
        let single = match frame.children.as_slice() {
            [only] => Some(*only),
            _ => None,
        };
        let built = match (kind, single) {
            (NodeKind::List, Some(only))
                if !is_root || matches!(builder.kind_of(only), Some(NodeKind::List)) =>
            {
                only
            }
            (NodeKind::List, _) => builder.list(frame.children),
            (atom, _) => builder.atom(atom),
        };
        match stack.last_mut() {
            Some(parent) => parent.children.push(built),
            None => root = Some(built),
        }
    }

    root.map_or_else(Program::empty, |root| builder.finish(root))
}

/// One node being rebuilt.
struct Frame {
    source: NodeId,
    start: usize,
    next: usize,
    children: Vec<NodeId>,
}

impl Frame {
    const fn new(source: NodeId, start: usize) -> Self {
        Self {
            source,
            start,
            next: 0,
            children: Vec::new(),
        }
    }
}

/// Rebuild `program` bottom-up into a fresh arena.
///
/// After each node is appended, `finish(builder, start, built)` may
/// replace it: `start` is the builder length when the node's subtree was
/// entered, and the returned id is what the parent will reference.
fn rebuild<F>(program: &Program, mut finish: F) -> Program
where
    F: FnMut(&mut ProgramBuilder, usize, NodeId) -> NodeId,
{
    let mut builder = ProgramBuilder::new();
    let mut stack = vec![Frame::new(program.root(), 0)];
    let mut root = None;

    while let Some(frame) = stack.last_mut() {
        if let Some(&child) = program.children(frame.source).get(frame.next) {
            frame.next = frame.next.saturating_add(1);
            stack.push(Frame::new(child, builder.len()));
            continue;
        }
        let Some(frame) = stack.pop() else {
            break;
        };
        let kind = program.node(frame.source).map_or(NodeKind::List, Node::kind);
        let built = match kind {
            NodeKind::List => builder.list(frame.children),
            atom => builder.atom(atom),
        };
        let built = finish(&mut builder, frame.start, built);
        match stack.last_mut() {
            Some(parent) => parent.children.push(built),
            None => root = Some(built),
        }
    }

    root.map_or_else(Program::empty, |root| builder.finish(root))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn vocab() -> Arc<InstructionSet<()>> {
        let mut set = InstructionSet::standard();
        set.register("move", |_, _| {});
        set.register("consume", |_, _| {});
        Arc::new(set)
    }

    fn mutator(rate: f64) -> ProgramMutator<()> {
        ProgramMutator::new(
            vocab(),
            MutationSettings {
                rate,
                ..MutationSettings::default()
            },
        )
    }

    fn parse(text: &str) -> Program {
        crate::parse::parse(text, &*vocab(), true).unwrap()
    }

    #[test]
    fn copy_drops_unreachable_nodes() {
        let mut b = ProgramBuilder::new();
        let _garbage = b.atom(NodeKind::Integer(42));
        let mv = b.atom(NodeKind::Instruction("move"));
        let root = b.list(vec![mv]);
        let padded = b.finish(root);
        assert_eq!(padded.arena_len(), 3);

        let copied = copy(&padded);
        assert_eq!(copied, padded);
        assert_eq!(copied.arena_len(), copied.size());
    }

    #[test]
    fn copy_is_independent_of_source() {
        let original = parse("( 1 move ( consume ) )");
        let copied = copy(&original);
        let mutated = mutator(1.0).mutate(&copied, &mut SmallRng::seed_from_u64(1));
        drop(mutated);
        assert_eq!(copied, original);
        assert_eq!(original.to_string(), "( 1 move ( consume ) )");
    }

    #[test]
    fn zero_rate_is_identity() {
        let program = parse("( 1 move ( consume ( 2 ( true ) ) ) )");
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..20 {
            assert_eq!(mutator(0.0).mutate(&program, &mut rng), program);
        }
    }

    #[test]
    fn full_rate_replaces_root_with_small_subtree() {
        let program = parse("( 1 move ( consume ( 2 ( true ) ) ) 3 4 5 6 )");
        let mut rng = SmallRng::seed_from_u64(5);
        for _ in 0..20 {
            let mutated = mutator(1.0).mutate(&program, &mut rng);
            assert!(mutated.size() <= MutationSettings::default().subtree_size);
            assert_eq!(mutated.arena_len(), mutated.size());
        }
    }

    #[test]
    fn mutation_leaves_no_garbage() {
        let m = mutator(0.3);
        let mut rng = SmallRng::seed_from_u64(8);
        let mut program = m.random_program(&mut rng, 40);
        for _ in 0..50 {
            program = m.mutate(&program, &mut rng);
            assert_eq!(program.arena_len(), program.size());
        }
    }

    #[test]
    fn mutation_is_reproducible() {
        let program = parse("( 1 move ( consume ) 2 3 )");
        let a = mutator(0.5).mutate(&program, &mut SmallRng::seed_from_u64(21));
        let b = mutator(0.5).mutate(&program, &mut SmallRng::seed_from_u64(21));
        assert_eq!(a, b);
    }

    #[test]
    fn compact_collapses_single_child_lists() {
        let program = parse("( ( ( move ) ) ( 1 ( 2 ) ) )");
        let compacted = compact(&program);
        assert_eq!(compacted.to_string(), "( move ( 1 2 ) )");
    }

    #[test]
    fn compact_unwraps_nested_root_lists() {
        let program = parse("( ( ( 1 2 ) ) )");
        assert_eq!(compact(&program).to_string(), "( 1 2 )");
        let single = parse("( ( move ) )");
        assert_eq!(compact(&single).to_string(), "( move )");
    }

    #[test]
    fn compact_is_idempotent_and_never_grows() {
        let m = mutator(0.2);
        let mut rng = SmallRng::seed_from_u64(13);
        for _ in 0..100 {
            let program = m.random_program(&mut rng, 30);
            let once = compact(&program);
            let twice = compact(&once);
            assert_eq!(once, twice);
            assert!(once.size() <= program.size());
            assert_eq!(once.arena_len(), once.size());
        }
    }

    #[test]
    fn compact_keeps_empty_lists() {
        let program = parse("( ( ) move )");
        assert_eq!(compact(&program).to_string(), "( ( ) move )");
    }
}
