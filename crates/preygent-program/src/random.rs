//! Random program synthesis.
//!
//! A target size is drawn uniformly from `1..=max_size`. A tree of size one
//! is a single atom: a registered instruction, an integer literal, or a
//! boolean literal, chosen with equal weight per option. A larger tree is a
//! list whose remaining size is split into randomly sized parts, each of
//! which is generated the same way. The resulting tree has exactly the
//! drawn size.

use rand::Rng;

use crate::interpreter::InstructionSet;
use crate::program::{NodeId, NodeKind, Program, ProgramBuilder};

/// Parameters for random literal generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorSettings {
    /// Smallest ephemeral random integer constant.
    pub erc_min: i64,
    /// Largest ephemeral random integer constant.
    pub erc_max: i64,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            erc_min: -10,
            erc_max: 10,
        }
    }
}

/// Generate a random program with between 1 and `max_size` nodes.
///
/// A `max_size` of zero is treated as one.
pub fn generate<C, R: Rng + ?Sized>(
    rng: &mut R,
    max_size: usize,
    instructions: &InstructionSet<C>,
    settings: &GeneratorSettings,
) -> Program {
    let mut builder = ProgramBuilder::new();
    let size = rng.random_range(1..=max_size.max(1));
    let root = generate_into(&mut builder, rng, size, instructions, settings);
    builder.finish(root)
}

/// Append a random subtree of exactly `size` nodes to `builder`.
///
/// Returns the id of the subtree root. A `size` of zero yields one atom.
pub(crate) fn generate_into<C, R: Rng + ?Sized>(
    builder: &mut ProgramBuilder,
    rng: &mut R,
    size: usize,
    instructions: &InstructionSet<C>,
    settings: &GeneratorSettings,
) -> NodeId {
    if size <= 1 {
        let kind = random_atom(rng, instructions, settings);
        return builder.atom(kind);
    }
    let remaining = size.saturating_sub(1);
    let parts = decompose(rng, remaining, remaining);
    let children = parts
        .into_iter()
        .map(|part| generate_into(builder, rng, part, instructions, settings))
        .collect();
    builder.list(children)
}

/// Split `total` into at most `max_parts` positive parts summing to `total`.
fn decompose<R: Rng + ?Sized>(rng: &mut R, total: usize, max_parts: usize) -> Vec<usize> {
    let mut parts = Vec::new();
    let mut left = total;
    let mut budget = max_parts;
    while left > 1 && budget > 1 {
        let part = rng.random_range(1..left);
        parts.push(part);
        left = left.saturating_sub(part);
        budget = budget.saturating_sub(1);
    }
    if left > 0 {
        parts.push(left);
    }
    parts
}

fn random_atom<C, R: Rng + ?Sized>(
    rng: &mut R,
    instructions: &InstructionSet<C>,
    settings: &GeneratorSettings,
) -> NodeKind {
    // Options: every instruction, plus one integer and one boolean slot.
    let options = instructions.len().saturating_add(2);
    let pick = rng.random_range(0..options);
    if let Some(name) = instructions.name_at(pick) {
        return NodeKind::Instruction(name);
    }
    if pick == instructions.len() {
        let low = settings.erc_min.min(settings.erc_max);
        let high = settings.erc_min.max(settings.erc_max);
        NodeKind::Integer(rng.random_range(low..=high))
    } else {
        NodeKind::Boolean(rng.random_bool(0.5))
    }
}
