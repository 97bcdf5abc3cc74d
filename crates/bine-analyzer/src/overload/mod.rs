//! Overloaded-name storage.
//!
//! Each name with overloadable declarations (functions, fibers, member
//! functions, member fibers, operators) maps to an [`Overloaded`] set,
//! which stores its declarations in a specialization [`poset::Poset`].

pub mod poset;

use bine_ast::nodes::{NodeId, OverloadKind};

use self::poset::Poset;

/// The declarations sharing one overloadable name.
#[derive(Debug, Clone)]
pub struct Overloaded {
    /// The shared name.
    pub name: String,
    /// Which dictionary this set belongs to.
    pub kind: OverloadKind,
    /// The declarations, ordered by parameter-type specialization.
    poset: Poset<NodeId>,
}

impl Overloaded {
    /// Creates an empty set for a name.
    #[must_use]
    pub fn new(name: String, kind: OverloadKind) -> Self {
        Self { name, kind, poset: Poset::new() }
    }

    /// The number of declarations in the set.
    #[must_use]
    pub fn len(&self) -> usize { self.poset.len() }

    /// True when the set has no declarations.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.poset.is_empty() }

    /// The declarations in topological (specialization) order.
    pub fn iter(&self) -> impl Iterator<Item = &NodeId> { self.poset.iter() }

    /// Inserts a declaration, ordered by `le` (at least as specific as).
    ///
    /// ## Errors
    ///
    /// Returns the previously inserted declaration when one with an
    /// equivalent parameter tuple already exists.
    pub fn insert(
        &mut self,
        decl: NodeId,
        le: &mut dyn FnMut(NodeId, NodeId) -> bool,
    ) -> Result<(), NodeId> {
        if let Some(previous) = self.poset.find_equivalent(decl, le) {
            return Err(previous);
        }
        self.poset.insert(decl, le);
        Ok(())
    }

    /// The most-specific declarations matching a probe.
    pub fn match_most_specific(
        &mut self,
        matches: &mut dyn FnMut(NodeId) -> bool,
    ) -> Vec<NodeId> {
        self.poset.match_most_specific(matches)
    }

    /// The more-specific neighbours of a declaration, for dispatch
    /// table generation.
    #[must_use]
    pub fn children(&self, decl: NodeId) -> &[NodeId] { self.poset.children(decl) }

    /// The less-specific neighbours of a declaration.
    #[must_use]
    pub fn parents(&self, decl: NodeId) -> &[NodeId] { self.poset.parents(decl) }

    /// The Hasse diagram in dot format, for diagnostics.
    pub fn dot(&self, label: &mut dyn FnMut(NodeId) -> String) -> String {
        self.poset.dot(label)
    }
}
