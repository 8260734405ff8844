//! Arena-backed program trees.
//!
//! A [`Program`] owns a flat vector of [`Node`]s. Nodes refer to their
//! children by [`NodeId`] index into the same arena. Programs are only
//! constructed through [`ProgramBuilder`], which appends nodes in
//! post-order: every child index is smaller than its parent's index, and
//! every node of a subtree sits in one contiguous run ending at the
//! subtree root.
//!
//! Equality between programs is structural (same tree shape and contents),
//! independent of arena layout.

use core::fmt;

/// Index of a node inside a [`Program`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in its arena.
    pub const fn index(self) -> usize {
        self.0
    }
}

/// What a node holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Integer literal, pushed onto the integer stack.
    Integer(i64),
    /// Boolean literal, pushed onto the boolean stack.
    Boolean(bool),
    /// Invocation of a registered instruction by name.
    Instruction(&'static str),
    /// Ordered list of child nodes.
    List,
}

/// One node of a program tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    kind: NodeKind,
    children: Vec<NodeId>,
}

impl Node {
    /// The node's contents.
    pub const fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Child node ids, in execution order. Empty for atoms.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Whether this node is a list.
    pub const fn is_list(&self) -> bool {
        matches!(self.kind, NodeKind::List)
    }
}

/// A program tree stored as an arena of nodes.
#[derive(Debug, Clone)]
pub struct Program {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Program {
    /// The empty program: a single empty list. Executing it does nothing.
    pub fn empty() -> Self {
        let mut builder = ProgramBuilder::new();
        let root = builder.list(Vec::new());
        builder.finish(root)
    }

    /// Id of the root node.
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Look up a node by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Children of the node `id`, or an empty slice if `id` is unknown.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map_or(&[], Node::children)
    }

    /// Number of nodes reachable from the root.
    pub fn size(&self) -> usize {
        self.size_of(self.root)
    }

    /// Number of nodes in the subtree rooted at `id`.
    pub fn size_of(&self, id: NodeId) -> usize {
        let mut count: usize = 0;
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            let Some(node) = self.node(next) else {
                continue;
            };
            count = count.saturating_add(1);
            pending.extend_from_slice(&node.children);
        }
        count
    }

    /// Number of nodes stored in the arena, reachable or not.
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether two subtrees, possibly from different programs, have the
    /// same shape and contents.
    fn subtree_eq(&self, id: NodeId, other: &Self, other_id: NodeId) -> bool {
        let mut pending = vec![(id, other_id)];
        while let Some((a, b)) = pending.pop() {
            match (self.node(a), other.node(b)) {
                (Some(left), Some(right)) => {
                    if left.kind != right.kind || left.children.len() != right.children.len() {
                        return false;
                    }
                    pending.extend(left.children.iter().copied().zip(right.children.iter().copied()));
                }
                (None, None) => {}
                _ => return false,
            }
        }
        true
    }

    fn write_node(&self, id: NodeId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(node) = self.node(id) else {
            return Ok(());
        };
        match node.kind {
            NodeKind::Integer(value) => write!(f, "{value}"),
            NodeKind::Boolean(value) => write!(f, "{value}"),
            NodeKind::Instruction(name) => f.write_str(name),
            NodeKind::List => {
                f.write_str("(")?;
                for child in &node.children {
                    f.write_str(" ")?;
                    self.write_node(*child, f)?;
                }
                f.write_str(" )")
            }
        }
    }
}

impl PartialEq for Program {
    fn eq(&self, other: &Self) -> bool {
        self.subtree_eq(self.root, other, other.root)
    }
}

impl Eq for Program {}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_node(self.root, f)
    }
}

/// Appends nodes in post-order and produces a [`Program`].
#[derive(Debug, Clone, Default)]
pub struct ProgramBuilder {
    nodes: Vec<Node>,
}

impl ProgramBuilder {
    /// Create an empty builder.
    pub const fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Number of nodes appended so far.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no nodes have been appended.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append a childless node. A [`NodeKind::List`] becomes an empty list.
    pub fn atom(&mut self, kind: NodeKind) -> NodeId {
        self.push(Node {
            kind,
            children: Vec::new(),
        })
    }

    /// Append a list over already-appended children.
    pub fn list(&mut self, children: Vec<NodeId>) -> NodeId {
        self.push(Node {
            kind: NodeKind::List,
            children,
        })
    }

    /// Kind of an already-appended node.
    pub fn kind_of(&self, id: NodeId) -> Option<NodeKind> {
        self.nodes.get(id.index()).map(|node| node.kind)
    }

    /// Drop every node appended at or after position `len`.
    ///
    /// Because nodes are appended in post-order, truncating to the length
    /// observed before building a subtree discards exactly that subtree.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.nodes.truncate(len);
    }

    /// Finish with `root` as the program root.
    ///
    /// An unknown root yields the empty program.
    pub fn finish(self, root: NodeId) -> Program {
        if root.index() >= self.nodes.len() {
            return Program::empty();
        }
        Program {
            nodes: self.nodes,
            root,
        }
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// `( 1 move ( consume ) )`
    fn sample() -> Program {
        let mut b = ProgramBuilder::new();
        let one = b.atom(NodeKind::Integer(1));
        let mv = b.atom(NodeKind::Instruction("move"));
        let consume = b.atom(NodeKind::Instruction("consume"));
        let inner = b.list(vec![consume]);
        let root = b.list(vec![one, mv, inner]);
        b.finish(root)
    }

    #[test]
    fn size_counts_lists_and_atoms() {
        let program = sample();
        assert_eq!(program.size(), 5);
        let inner = program.children(program.root()).get(2).copied().unwrap();
        assert_eq!(program.size_of(inner), 2);
    }

    #[test]
    fn display_uses_push_syntax() {
        assert_eq!(sample().to_string(), "( 1 move ( consume ) )");
        assert_eq!(Program::empty().to_string(), "( )");
    }

    #[test]
    fn equality_ignores_arena_layout() {
        // Same tree, but with an unreachable node left at the front.
        let mut b = ProgramBuilder::new();
        let _garbage = b.atom(NodeKind::Boolean(true));
        let one = b.atom(NodeKind::Integer(1));
        let mv = b.atom(NodeKind::Instruction("move"));
        let consume = b.atom(NodeKind::Instruction("consume"));
        let inner = b.list(vec![consume]);
        let root = b.list(vec![one, mv, inner]);
        let padded = b.finish(root);

        assert_eq!(padded, sample());
        assert_ne!(padded.arena_len(), sample().arena_len());
    }

    #[test]
    fn different_trees_are_unequal() {
        let mut b = ProgramBuilder::new();
        let one = b.atom(NodeKind::Integer(2));
        let root = b.list(vec![one]);
        assert_ne!(b.finish(root), sample());
    }

    #[test]
    fn unknown_root_yields_empty_program() {
        let builder = ProgramBuilder::new();
        let program = builder.finish(NodeId(7));
        assert_eq!(program, Program::empty());
        assert_eq!(program.size(), 1);
    }
}
