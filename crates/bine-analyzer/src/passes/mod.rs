//! The resolver pass pipeline.
//!
//! Four passes run over every file of a package, in order:
//!
//! 1. **Typer** registers named type declarations in the root scope;
//! 2. **ResolverSuper** resolves base types, super edges, conversion and
//!    assignment registrations, and all signature types;
//! 3. **ResolverHeader** inserts function-like declarations into their
//!    overloaded dictionaries and resolves member initializers;
//! 4. **ResolverSource** resolves bodies, performing identifier, member
//!    and overload resolution, the probabilistic sugar rewrites, and
//!    generic instantiation.
//!
//! Every declaration carries a [`ResolveState`] making the passes
//! idempotent: a generic instantiation cloned mid-pipeline is caught up
//! to the pipeline's current pass exactly once.

mod headers;
mod sources;
mod supers;
mod typer;

use bine_ast::Ast;
use bine_ast::nodes::{AnyNode, NodeId, ResolveState};
use bine_source::Location;

use crate::error::CompileError;
use crate::registry::Registry;
use crate::scope::{ScopeId, ScopeTable};
use crate::types::Type;

/// The shared state of the pass pipeline.
pub struct Analyzer<'a> {
    /// The arena being resolved.
    pub ast: &'a mut Ast,
    /// All scopes.
    pub scopes: ScopeTable,
    /// Class facts, signatures and resolved types.
    pub registry: Registry,
    /// The scope stack, innermost last.
    pub scope_stack: Vec<ScopeId>,
    /// Expected return types, innermost last ([`Type::Empty`] for none).
    pub return_stack: Vec<Type>,
    /// Expected yield types, innermost last.
    pub yield_stack: Vec<Type>,
    /// Enclosing class declarations, innermost last.
    pub class_stack: Vec<NodeId>,
    /// Every instantiation created so far, for pass catch-up.
    pub instantiations: Vec<NodeId>,
    /// The pass the pipeline is currently in.
    pub current_state: ResolveState,
}

impl<'a> Analyzer<'a> {
    /// Creates a fresh pipeline over an arena.
    #[must_use]
    pub fn new(ast: &'a mut Ast) -> Self {
        let scopes = ScopeTable::new();
        let root = scopes.root();
        Self {
            ast,
            scopes,
            registry: Registry::new(),
            scope_stack: vec![root],
            return_stack: Vec::new(),
            yield_stack: Vec::new(),
            class_stack: Vec::new(),
            instantiations: Vec::new(),
            current_state: ResolveState::Cloned,
        }
    }

    /// Runs all four passes over the given file nodes.
    ///
    /// ## Errors
    ///
    /// Returns the first compiler error encountered; the pipeline never
    /// continues past an error.
    pub fn run(&mut self, files: &[NodeId]) -> Result<(), CompileError> {
        log::debug!("pass 1: typing {} file(s)", files.len());
        self.current_state = ResolveState::Typed;
        for &file in files {
            self.typer_file(file)?;
        }
        self.catch_up()?;

        log::debug!("pass 2: resolving super types");
        self.current_state = ResolveState::Supered;
        for &file in files {
            self.super_file(file)?;
        }
        self.catch_up()?;

        log::debug!("pass 3: resolving headers");
        self.current_state = ResolveState::Headered;
        for &file in files {
            self.header_file(file)?;
        }
        self.catch_up()?;

        log::debug!("pass 4: resolving sources");
        self.current_state = ResolveState::Sourced;
        for &file in files {
            self.source_file(file)?;
        }
        self.catch_up()
    }

    /// Brings every instantiation created so far up to the pipeline's
    /// current pass. New instantiations created while catching up are
    /// themselves caught up (the list grows while iterating).
    pub(crate) fn catch_up(&mut self) -> Result<(), CompileError> {
        let mut i = 0;
        while i < self.instantiations.len() {
            let decl = self.instantiations[i];
            self.advance_decl(decl)?;
            i += 1;
        }
        Ok(())
    }

    /// Advances one declaration through the passes up to the current
    /// pipeline state, short-circuiting anything already done.
    pub(crate) fn advance_decl(&mut self, decl: NodeId) -> Result<(), CompileError> {
        while self.decl_state(decl) < self.current_state {
            match self.decl_state(decl) {
                ResolveState::Cloned => {
                    // Instantiations are reached through their generic's
                    // instantiation list; they are not registered by name.
                    self.set_decl_state(decl, ResolveState::Typed);
                }
                ResolveState::Typed => self.super_decl(decl)?,
                ResolveState::Supered => self.header_decl(decl)?,
                ResolveState::Headered => self.source_decl(decl)?,
                ResolveState::Sourced => break,
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Scope stack discipline
    // ---------------------------------------------------------------

    /// Runs a closure with a scope pushed, popping it on every exit
    /// path.
    pub(crate) fn scoped<R>(
        &mut self,
        scope: ScopeId,
        f: impl FnOnce(&mut Self) -> Result<R, CompileError>,
    ) -> Result<R, CompileError> {
        self.scope_stack.push(scope);
        let out = f(self);
        let _ = self.scope_stack.pop();
        out
    }

    /// The innermost scope.
    pub(crate) fn current_scope(&self) -> ScopeId {
        self.scope_stack.last().copied().unwrap_or_else(|| self.scopes.root())
    }

    // ---------------------------------------------------------------
    // Declaration state bookkeeping
    // ---------------------------------------------------------------

    /// The resolution state of a declaration (non-declaration nodes
    /// report fully resolved).
    pub(crate) fn decl_state(&self, decl: NodeId) -> ResolveState {
        match &self.ast[decl].data {
            AnyNode::ClassDecl(node) => node.state,
            AnyNode::BasicDecl(node) => node.state,
            AnyNode::AliasDecl(node) => node.state,
            AnyNode::FunctionDecl(node) => node.state,
            AnyNode::FiberDecl(node) => node.state,
            AnyNode::ProgramDecl(node) => node.state,
            AnyNode::BinaryOperatorDecl(node) => node.state,
            AnyNode::UnaryOperatorDecl(node) => node.state,
            AnyNode::ConversionOperatorDecl(node) => node.state,
            AnyNode::AssignmentOperatorDecl(node) => node.state,
            _ => ResolveState::Sourced,
        }
    }

    /// Updates the resolution state of a declaration.
    pub(crate) fn set_decl_state(&mut self, decl: NodeId, state: ResolveState) {
        match &mut self.ast[decl].data {
            AnyNode::ClassDecl(node) => node.state = state,
            AnyNode::BasicDecl(node) => node.state = state,
            AnyNode::AliasDecl(node) => node.state = state,
            AnyNode::FunctionDecl(node) => node.state = state,
            AnyNode::FiberDecl(node) => node.state = state,
            AnyNode::ProgramDecl(node) => node.state = state,
            AnyNode::BinaryOperatorDecl(node) => node.state = state,
            AnyNode::UnaryOperatorDecl(node) => node.state = state,
            AnyNode::ConversionOperatorDecl(node) => node.state = state,
            AnyNode::AssignmentOperatorDecl(node) => node.state = state,
            _ => {}
        }
    }

    /// Resets the state of every declaration in a subtree to
    /// [`ResolveState::Cloned`]; used on freshly cloned instantiations.
    pub(crate) fn reset_states(&mut self, root: NodeId) {
        for id in self.ast.collect_subtree(root) {
            self.set_decl_state(id, ResolveState::Cloned);
        }
    }

    // ---------------------------------------------------------------
    // Shared lookups
    // ---------------------------------------------------------------

    /// Searches one scope and its inherited (base class) scopes.
    pub(crate) fn scope_find<R>(
        &self,
        scope: ScopeId,
        f: &impl Fn(&crate::scope::Scope) -> Option<R>,
    ) -> Option<R> {
        let s = self.scopes.get(scope);
        if let Some(found) = f(s) {
            return Some(found);
        }
        for &base in &s.inherited {
            if let Some(found) = self.scope_find(base, f) {
                return Some(found);
            }
        }
        None
    }

    /// Searches the scope stack, innermost first, each scope together
    /// with its inherited scopes.
    pub(crate) fn stack_find<R>(
        &self,
        f: impl Fn(&crate::scope::Scope) -> Option<R>,
    ) -> Option<R> {
        for &scope in self.scope_stack.iter().rev() {
            if let Some(found) = self.scope_find(scope, &f) {
                return Some(found);
            }
        }
        None
    }

    /// Looks up a builtin basic type by name in the root scope.
    pub(crate) fn basic_type(
        &self,
        name: &str,
        loc: &Location,
    ) -> Result<Type, CompileError> {
        self.scopes
            .get(self.scopes.root())
            .find_type(name)
            .map(Type::Basic)
            .ok_or_else(|| CompileError::UnresolvedReference {
                name: name.to_string(),
                loc: loc.clone(),
            })
    }
}
