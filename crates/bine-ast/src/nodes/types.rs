//! Syntactic type expression nodes.
//!
//! These are types as written in source. The analyzer resolves them into
//! its semantic type representation; the `target` slots here record which
//! declaration a written name resolved to.

use rustc_hash::FxHashMap;

use super::{AstNode, NodeId, NodeKind, remap, remap_opt, remap_vec};

/// A named type as written (basic, class, alias or generic parameter),
/// possibly with generic arguments (e.g. `Real`, `Box<Real>`).
#[derive(Clone, Debug)]
pub struct NamedType {
    /// The type name as written.
    pub name: String,
    /// Generic type arguments, if any.
    pub type_args: Vec<NodeId>,
    /// The declaration this name resolved to.
    pub target: Option<NodeId>,
}

impl AstNode for NamedType {
    fn kind(&self) -> NodeKind { NodeKind::Type }

    fn children(&self) -> Vec<NodeId> { self.type_args.clone() }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) {
        remap_vec(&mut self.type_args, map);
        remap_opt(&mut self.target, map);
    }
}

/// A qualified type (e.g. `Outer.Inner`).
#[derive(Clone, Debug)]
pub struct MemberType {
    /// The qualifying type expression.
    pub outer: NodeId,
    /// The qualified type expression, resolved in the outer type's scope.
    pub inner: NodeId,
}

impl AstNode for MemberType {
    fn kind(&self) -> NodeKind { NodeKind::Type }

    fn children(&self) -> Vec<NodeId> { vec![self.outer, self.inner] }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) {
        remap(&mut self.outer, map);
        remap(&mut self.inner, map);
    }
}

/// An array type with a dimension count (e.g. `Real[_, _]`).
#[derive(Clone, Debug)]
pub struct ArrayType {
    /// The element type expression.
    pub element: NodeId,
    /// The number of dimensions.
    pub dims: usize,
}

impl AstNode for ArrayType {
    fn kind(&self) -> NodeKind { NodeKind::Type }

    fn children(&self) -> Vec<NodeId> { vec![self.element] }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) { remap(&mut self.element, map); }
}

/// A tuple type (e.g. `(Real, Integer)`).
#[derive(Clone, Debug)]
pub struct TupleType {
    /// The element type expressions.
    pub elements: Vec<NodeId>,
}

impl AstNode for TupleType {
    fn kind(&self) -> NodeKind { NodeKind::Type }

    fn children(&self) -> Vec<NodeId> { self.elements.clone() }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) {
        remap_vec(&mut self.elements, map);
    }
}

/// A sequence type (e.g. `[Real]`), the type of sequence literals.
#[derive(Clone, Debug)]
pub struct SequenceType {
    /// The element type expression.
    pub element: NodeId,
}

impl AstNode for SequenceType {
    fn kind(&self) -> NodeKind { NodeKind::Type }

    fn children(&self) -> Vec<NodeId> { vec![self.element] }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) { remap(&mut self.element, map); }
}

/// A function type (e.g. `(Real, Real) -> Real`).
#[derive(Clone, Debug)]
pub struct FunctionType {
    /// The parameter type expressions.
    pub params: Vec<NodeId>,
    /// The return type expression; empty means no return value.
    pub return_type: Option<NodeId>,
}

impl AstNode for FunctionType {
    fn kind(&self) -> NodeKind { NodeKind::Type }

    fn children(&self) -> Vec<NodeId> {
        let mut children = self.params.clone();
        if let Some(ret) = self.return_type {
            children.push(ret);
        }
        children
    }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) {
        remap_vec(&mut self.params, map);
        remap_opt(&mut self.return_type, map);
    }
}

/// A fiber type wrapping its yield type (e.g. `Integer!`).
#[derive(Clone, Debug)]
pub struct FiberType {
    /// The yield element type expression.
    pub yield_type: NodeId,
}

impl AstNode for FiberType {
    fn kind(&self) -> NodeKind { NodeKind::Type }

    fn children(&self) -> Vec<NodeId> { vec![self.yield_type] }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) { remap(&mut self.yield_type, map); }
}

/// An optional type (e.g. `Real?`).
#[derive(Clone, Debug)]
pub struct OptionalType {
    /// The wrapped type expression.
    pub inner: NodeId,
}

impl AstNode for OptionalType {
    fn kind(&self) -> NodeKind { NodeKind::Type }

    fn children(&self) -> Vec<NodeId> { vec![self.inner] }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) { remap(&mut self.inner, map); }
}

/// A weak pointer type (e.g. `Node&`).
#[derive(Clone, Debug)]
pub struct WeakType {
    /// The wrapped type expression.
    pub inner: NodeId,
}

impl AstNode for WeakType {
    fn kind(&self) -> NodeKind { NodeKind::Type }

    fn children(&self) -> Vec<NodeId> { vec![self.inner] }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) { remap(&mut self.inner, map); }
}

/// The parser placeholder for a type yet to be resolved.
#[derive(Clone, Debug)]
pub struct UnknownType;

impl AstNode for UnknownType {
    fn kind(&self) -> NodeKind { NodeKind::Type }

    fn children(&self) -> Vec<NodeId> { Vec::new() }

    fn remap_ids(&mut self, _map: &FxHashMap<NodeId, NodeId>) {}
}

/// The unit type of expressions and functions without a value.
#[derive(Clone, Debug)]
pub struct EmptyType;

impl AstNode for EmptyType {
    fn kind(&self) -> NodeKind { NodeKind::Type }

    fn children(&self) -> Vec<NodeId> { Vec::new() }

    fn remap_ids(&mut self, _map: &FxHashMap<NodeId, NodeId>) {}
}
