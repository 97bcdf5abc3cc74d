//! Generic instantiation.
//!
//! A call (or type reference) that resolves to a generic declaration
//! with a concrete argument tuple either reuses an existing
//! instantiation whose arguments are equivalent, or deep-clones the
//! declaration, binds the cloned type parameters to the arguments, and
//! pushes the clone through the pass pipeline up to the current pass.
//!
//! Substitution is performed through the binding table rather than by
//! rewriting type nodes: every cloned type-parameter reference resolves
//! through [`crate::registry::Registry::substitute`], so the clone's
//! signatures, member types and expression types all come out concrete.

use bine_ast::nodes::{AnyNode, NodeId};
use bine_source::Location;
use rustc_hash::FxHashMap;

use crate::error::CompileError;
use crate::passes::Analyzer;
use crate::types::Type;

impl Analyzer<'_> {
    /// Finds or creates the instantiation of a generic declaration for
    /// a concrete argument tuple.
    pub(crate) fn instantiate(
        &mut self,
        generic: NodeId,
        args: Vec<Type>,
        loc: &Location,
    ) -> Result<NodeId, CompileError> {
        // Reuse an existing instantiation with equivalent arguments;
        // every (generic, argument tuple) pair materializes exactly
        // once regardless of the number of use sites.
        for inst in self.decl_instantiations(generic) {
            if let Some(existing) = self.registry.instantiation_args.get(&inst)
                && existing.len() == args.len()
                && existing.iter().zip(&args).all(|(a, b)| self.registry.equivalent(a, b))
            {
                return Ok(inst);
            }
        }

        log::debug!(
            "instantiating {} with {} argument(s) at {}",
            crate::types::decl_name(self.ast, generic),
            args.len(),
            loc.extent()
        );

        let (clone, map) = self.ast.clone_subtree_with_map(generic);
        self.reset_states(clone);
        self.mark_instantiation(clone, generic);

        // Bind the cloned type parameters to the concrete arguments.
        let type_params = self.decl_type_params(generic);
        for (param, arg) in type_params.iter().zip(&args) {
            let cloned_param = map.get(param).copied().unwrap_or(*param);
            let _ = self.registry.bindings.insert(cloned_param, arg.clone());
            if let Some(bound) = self.registry.bounds.get(param).cloned() {
                let _ = self.registry.bounds.insert(cloned_param, bound);
            }
        }

        self.record_instantiation(generic, clone, args);

        // Catch the clone up to the pipeline's current pass. Member
        // generics instantiated from inside the clone recurse through
        // here; termination holds because every level binds at least
        // one type parameter.
        self.advance_decl(clone)?;
        Ok(clone)
    }

    /// Infers the generic argument tuple of a call from its argument
    /// types, unifying parameter types against argument types.
    pub(crate) fn infer_generic_args(
        &self,
        type_params: &[NodeId],
        params: &[Type],
        args: &[Type],
    ) -> Option<Vec<Type>> {
        let mut bound = FxHashMap::default();
        for (param, arg) in params.iter().zip(args) {
            self.unify(param, &self.registry.substitute(arg), &mut bound);
        }
        type_params
            .iter()
            .map(|tp| bound.get(tp).cloned())
            .collect::<Option<Vec<Type>>>()
            .filter(|types| types.iter().all(|ty| self.type_is_concrete(ty)))
    }

    /// Structural unification of a parameter type against an argument
    /// type, binding unbound type parameters on first occurrence.
    fn unify(&self, param: &Type, arg: &Type, bound: &mut FxHashMap<NodeId, Type>) {
        match (param, arg) {
            (Type::Generic(decl), _) if !self.registry.bindings.contains_key(decl) => {
                let _ = bound.entry(*decl).or_insert_with(|| arg.clone());
            }
            (Type::Optional(p), Type::Optional(a))
            | (Type::Weak(p), Type::Weak(a))
            | (Type::Fiber(p), Type::Fiber(a))
            | (Type::Sequence(p), Type::Sequence(a)) => self.unify(p, a, bound),
            // A plain value can bind an optional parameter's inner.
            (Type::Optional(p), a) => self.unify(p, a, bound),
            (Type::Array { element: p, .. }, Type::Array { element: a, .. }) => {
                self.unify(p, a, bound);
            }
            (Type::Tuple(ps), Type::Tuple(aas)) => {
                for (p, a) in ps.iter().zip(aas) {
                    self.unify(p, a, bound);
                }
            }
            (
                Type::Function { params: ps, ret: pr },
                Type::Function { params: aas, ret: ar },
            ) => {
                for (p, a) in ps.iter().zip(aas) {
                    self.unify(p, a, bound);
                }
                self.unify(pr, ar, bound);
            }
            (Type::Class { args: ps, .. }, Type::Class { args: aas, .. }) => {
                for (p, a) in ps.iter().zip(aas) {
                    self.unify(p, a, bound);
                }
            }
            _ => {}
        }
    }

    // ---------------------------------------------------------------
    // Declaration plumbing
    // ---------------------------------------------------------------

    /// The instantiation list of a generic declaration.
    fn decl_instantiations(&self, decl: NodeId) -> Vec<NodeId> {
        match &self.ast[decl].data {
            AnyNode::ClassDecl(node) => node.instantiations.clone(),
            AnyNode::FunctionDecl(node) => node.instantiations.clone(),
            AnyNode::FiberDecl(node) => node.instantiations.clone(),
            _ => Vec::new(),
        }
    }

    /// The type parameter list of a generic declaration.
    fn decl_type_params(&self, decl: NodeId) -> Vec<NodeId> {
        match &self.ast[decl].data {
            AnyNode::ClassDecl(node) => node.type_params.clone(),
            AnyNode::FunctionDecl(node) => node.type_params.clone(),
            AnyNode::FiberDecl(node) => node.type_params.clone(),
            _ => Vec::new(),
        }
    }

    /// Marks a fresh clone as an instantiation of its generic.
    fn mark_instantiation(&mut self, clone: NodeId, generic: NodeId) {
        match &mut self.ast[clone].data {
            AnyNode::ClassDecl(node) => {
                node.instantiation_of = Some(generic);
                node.instantiations.clear();
            }
            AnyNode::FunctionDecl(node) => {
                node.instantiation_of = Some(generic);
                node.instantiations.clear();
            }
            AnyNode::FiberDecl(node) => {
                node.instantiation_of = Some(generic);
                node.instantiations.clear();
            }
            _ => {}
        }
    }

    /// Appends a new instantiation to its generic's list and the
    /// catch-up queue.
    fn record_instantiation(&mut self, generic: NodeId, clone: NodeId, args: Vec<Type>) {
        match &mut self.ast[generic].data {
            AnyNode::ClassDecl(node) => node.instantiations.push(clone),
            AnyNode::FunctionDecl(node) => node.instantiations.push(clone),
            AnyNode::FiberDecl(node) => node.instantiations.push(clone),
            _ => {}
        }
        let _ = self.registry.instantiation_args.insert(clone, args);
        self.instantiations.push(clone);
    }
}
