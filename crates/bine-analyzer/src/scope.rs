//! Scopes and declaration dictionaries.
//!
//! A scope carries one unique dictionary per uniquely-named category
//! (variables, types, programs) and one overloaded dictionary per
//! overloadable category (functions, fibers, member functions, member
//! fibers, binary and unary operators). Scopes form a chain through
//! their parents; class scopes additionally inherit the scopes of their
//! base classes, which are consulted when local lookup fails.

use std::fmt;

use bine_ast::nodes::{NodeId, OverloadKind};
use rustc_hash::FxHashMap;

use crate::overload::Overloaded;

/// Unique identifier for a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u32);

impl ScopeId {
    /// Creates a new `ScopeId` with the given value.
    #[must_use]
    pub const fn new(id: u32) -> Self { Self(id) }

    /// Returns the inner value of the `ScopeId`.
    #[must_use]
    pub const fn value(self) -> u32 { self.0 }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "scope:{}", self.0) }
}

/// The kind of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// The package root scope.
    Root,
    /// A class body scope.
    Class,
    /// The initializer sub-scope of a class, used for member default
    /// values; it forbids references to not-yet-declared members.
    Initializer,
    /// A function, fiber, operator or program body scope.
    Body,
    /// A block scope inside a body.
    Block,
}

/// One lexical scope.
#[derive(Debug, Clone)]
pub struct Scope {
    /// Unique identifier for this scope.
    pub id: ScopeId,
    /// The kind of scope.
    pub kind: ScopeKind,
    /// Parent scope (None for the root).
    pub parent: Option<ScopeId>,
    /// Base-class scopes, consulted when local lookup fails.
    pub inherited: Vec<ScopeId>,
    /// Variable declarations by name.
    variables: FxHashMap<String, NodeId>,
    /// Type declarations (basic, class, alias, generic parameter) by name.
    types: FxHashMap<String, NodeId>,
    /// Program declarations by name.
    programs: FxHashMap<String, NodeId>,
    /// Overloaded dictionaries by kind and name.
    overloads: FxHashMap<(OverloadKind, String), Overloaded>,
}

impl Scope {
    /// Creates a new scope.
    #[must_use]
    pub fn new(id: ScopeId, kind: ScopeKind, parent: Option<ScopeId>) -> Self {
        Self {
            id,
            kind,
            parent,
            inherited: Vec::new(),
            variables: FxHashMap::default(),
            types: FxHashMap::default(),
            programs: FxHashMap::default(),
            overloads: FxHashMap::default(),
        }
    }

    /// Adds a variable declaration.
    ///
    /// ## Errors
    ///
    /// Returns the previous declaration on a duplicate name.
    pub fn add_variable(&mut self, name: String, decl: NodeId) -> Result<(), NodeId> {
        add_unique(&mut self.variables, name, decl)
    }

    /// Adds a type declaration.
    ///
    /// ## Errors
    ///
    /// Returns the previous declaration on a duplicate name.
    pub fn add_type(&mut self, name: String, decl: NodeId) -> Result<(), NodeId> {
        add_unique(&mut self.types, name, decl)
    }

    /// Adds a program declaration.
    ///
    /// ## Errors
    ///
    /// Returns the previous declaration on a duplicate name.
    pub fn add_program(&mut self, name: String, decl: NodeId) -> Result<(), NodeId> {
        add_unique(&mut self.programs, name, decl)
    }

    /// Looks up a variable in this scope only.
    #[must_use]
    pub fn find_variable(&self, name: &str) -> Option<NodeId> {
        self.variables.get(name).copied()
    }

    /// Looks up a type in this scope only.
    #[must_use]
    pub fn find_type(&self, name: &str) -> Option<NodeId> { self.types.get(name).copied() }

    /// Looks up a program in this scope only.
    #[must_use]
    pub fn find_program(&self, name: &str) -> Option<NodeId> {
        self.programs.get(name).copied()
    }

    /// The overloaded set for a kind and name, creating it if absent.
    pub fn overloaded_mut(&mut self, kind: OverloadKind, name: &str) -> &mut Overloaded {
        self.overloads
            .entry((kind, name.to_string()))
            .or_insert_with(|| Overloaded::new(name.to_string(), kind))
    }

    /// The overloaded set for a kind and name, if present.
    #[must_use]
    pub fn overloaded(&self, kind: OverloadKind, name: &str) -> Option<&Overloaded> {
        self.overloads.get(&(kind, name.to_string()))
    }

    /// True when this scope has an overloaded set for the kind and name.
    #[must_use]
    pub fn has_overloaded(&self, kind: OverloadKind, name: &str) -> bool {
        self.overloads.contains_key(&(kind, name.to_string()))
    }

    /// True when any overloaded set in this scope carries the name.
    #[must_use]
    pub fn has_any_overloaded(&self, name: &str) -> bool {
        self.overloads.keys().any(|(_, n)| n == name)
    }

    /// Iterates the overloaded sets of this scope.
    pub fn overloads(&self) -> impl Iterator<Item = &Overloaded> { self.overloads.values() }

    /// Iterates the variable declarations of this scope.
    pub fn variables(&self) -> impl Iterator<Item = (&String, &NodeId)> {
        self.variables.iter()
    }

    /// Merges the unique dictionaries of another scope into this one,
    /// skipping colliding names (used for package imports).
    pub fn merge_unique(&mut self, other: &Self) {
        for (name, &decl) in &other.variables {
            let _ = self.variables.entry(name.clone()).or_insert(decl);
        }
        for (name, &decl) in &other.types {
            let _ = self.types.entry(name.clone()).or_insert(decl);
        }
        for (name, &decl) in &other.programs {
            let _ = self.programs.entry(name.clone()).or_insert(decl);
        }
    }
}

fn add_unique(
    map: &mut FxHashMap<String, NodeId>,
    name: String,
    decl: NodeId,
) -> Result<(), NodeId> {
    if let Some(&previous) = map.get(&name) {
        return Err(previous);
    }
    let _ = map.insert(name, decl);
    Ok(())
}

/// The table owning every scope of a compilation.
#[derive(Debug, Clone)]
pub struct ScopeTable {
    /// All scopes, indexed by id.
    scopes: Vec<Scope>,
}

impl Default for ScopeTable {
    fn default() -> Self { Self::new() }
}

impl ScopeTable {
    /// Creates a table holding only the root scope.
    #[must_use]
    pub fn new() -> Self {
        let root = Scope::new(ScopeId::new(0), ScopeKind::Root, None);
        Self { scopes: vec![root] }
    }

    /// The root scope id.
    #[must_use]
    pub const fn root(&self) -> ScopeId { ScopeId::new(0) }

    /// Creates a new scope and returns its id.
    pub fn create(&mut self, kind: ScopeKind, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId::new(self.scopes.len() as u32);
        self.scopes.push(Scope::new(id, kind, parent));
        id
    }

    /// Gets a scope by id.
    #[must_use]
    pub fn get(&self, id: ScopeId) -> &Scope { &self.scopes[id.value() as usize] }

    /// Gets a mutable scope by id.
    pub fn get_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.value() as usize]
    }

    /// Records that `scope` inherits from `base` (a base-class scope).
    pub fn inherit(&mut self, scope: ScopeId, base: ScopeId) {
        let scope = self.get_mut(scope);
        if !scope.inherited.contains(&base) {
            scope.inherited.push(base);
        }
    }

    /// The number of scopes in the table.
    #[must_use]
    pub fn len(&self) -> usize { self.scopes.len() }

    /// True when the table holds only the root scope.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.scopes.len() <= 1 }
}
