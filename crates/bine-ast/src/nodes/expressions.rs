//! Expression node types.
//!
//! Expressions include literals, unresolved and resolved identifiers,
//! calls, member access, the optional/fiber sugar (`?`/`!`), and the
//! declaration forms that appear in expression position (parameters,
//! local variables, generic type parameters).

use rustc_hash::FxHashMap;

use super::{
    Annotations,
    AssignOp,
    AstNode,
    Literal,
    NodeId,
    NodeKind,
    OverloadKind,
    VarKind,
    remap,
    remap_opt,
    remap_vec,
};

/// A literal constant (e.g. `true`, `42`, `1.0`, `"text"`).
#[derive(Clone, Debug)]
pub struct LiteralExpr {
    /// The literal value.
    pub value: Literal,
}

impl AstNode for LiteralExpr {
    fn kind(&self) -> NodeKind { NodeKind::Expression }

    fn children(&self) -> Vec<NodeId> { Vec::new() }

    fn remap_ids(&mut self, _map: &FxHashMap<NodeId, NodeId>) {}
}

/// An identifier before resolution (e.g. `x`, `f<Real>`).
///
/// The resolver replaces this node with a [`VarRef`] or an
/// [`OverloadedRef`], keyed by the kind of the declaration it finds.
#[derive(Clone, Debug)]
pub struct NamedExpr {
    /// The identifier as written.
    pub name: String,
    /// Explicit generic type arguments, if any.
    pub type_args: Vec<NodeId>,
}

impl AstNode for NamedExpr {
    fn kind(&self) -> NodeKind { NodeKind::Expression }

    fn children(&self) -> Vec<NodeId> { self.type_args.clone() }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) {
        remap_vec(&mut self.type_args, map);
    }
}

/// A resolved reference to a variable-like declaration.
#[derive(Clone, Debug)]
pub struct VarRef {
    /// The identifier as written.
    pub name: String,
    /// What kind of declaration the target is.
    pub kind: VarKind,
    /// The declaration this reference resolved to.
    pub target: NodeId,
}

impl AstNode for VarRef {
    fn kind(&self) -> NodeKind { NodeKind::Expression }

    fn children(&self) -> Vec<NodeId> { Vec::new() }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) { remap(&mut self.target, map); }
}

/// A resolved reference to an overloaded name.
///
/// Until the enclosing call is resolved the `target` is empty; call
/// resolution fills it with the most-specific declaration.
#[derive(Clone, Debug)]
pub struct OverloadedRef {
    /// The name shared by the overload set.
    pub name: String,
    /// Which overloaded dictionary the set lives in.
    pub kind: OverloadKind,
    /// Explicit generic type arguments, if any.
    pub type_args: Vec<NodeId>,
    /// The declaration selected by call resolution.
    pub target: Option<NodeId>,
}

impl AstNode for OverloadedRef {
    fn kind(&self) -> NodeKind { NodeKind::Expression }

    fn children(&self) -> Vec<NodeId> { self.type_args.clone() }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) {
        remap_vec(&mut self.type_args, map);
        remap_opt(&mut self.target, map);
    }
}

/// A call expression (e.g. `f(a, b)`, `o.g(x)`).
#[derive(Clone, Debug)]
pub struct CallExpr {
    /// The callee expression.
    pub callee: NodeId,
    /// The arguments, in source order.
    pub args: Vec<NodeId>,
}

impl AstNode for CallExpr {
    fn kind(&self) -> NodeKind { NodeKind::Expression }

    fn children(&self) -> Vec<NodeId> {
        let mut children = vec![self.callee];
        children.extend(&self.args);
        children
    }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) {
        remap(&mut self.callee, map);
        remap_vec(&mut self.args, map);
    }
}

/// A binary operator application (e.g. `a + b`).
#[derive(Clone, Debug)]
pub struct BinaryCallExpr {
    /// The operator symbol.
    pub name: String,
    /// Left operand.
    pub left: NodeId,
    /// Right operand.
    pub right: NodeId,
    /// The operator declaration selected by resolution.
    pub target: Option<NodeId>,
}

impl AstNode for BinaryCallExpr {
    fn kind(&self) -> NodeKind { NodeKind::Expression }

    fn children(&self) -> Vec<NodeId> { vec![self.left, self.right] }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) {
        remap(&mut self.left, map);
        remap(&mut self.right, map);
        remap_opt(&mut self.target, map);
    }
}

/// A unary operator application (e.g. `-a`, `!ok`).
#[derive(Clone, Debug)]
pub struct UnaryCallExpr {
    /// The operator symbol.
    pub name: String,
    /// The operand.
    pub operand: NodeId,
    /// The operator declaration selected by resolution.
    pub target: Option<NodeId>,
}

impl AstNode for UnaryCallExpr {
    fn kind(&self) -> NodeKind { NodeKind::Expression }

    fn children(&self) -> Vec<NodeId> { vec![self.operand] }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) {
        remap(&mut self.operand, map);
        remap_opt(&mut self.target, map);
    }
}

/// An assignment expression, covering the plain form and the three
/// probabilistic sugars (which the resolver rewrites away).
#[derive(Clone, Debug)]
pub struct AssignExpr {
    /// Which assignment flavour this is.
    pub op: AssignOp,
    /// The left-hand side.
    pub left: NodeId,
    /// The right-hand side.
    pub right: NodeId,
}

impl AstNode for AssignExpr {
    fn kind(&self) -> NodeKind { NodeKind::Expression }

    fn children(&self) -> Vec<NodeId> { vec![self.left, self.right] }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) {
        remap(&mut self.left, map);
        remap(&mut self.right, map);
    }
}

/// Member access (e.g. `a.b`, `a.f(x)` before call formation).
#[derive(Clone, Debug)]
pub struct MemberExpr {
    /// The object expression.
    pub object: NodeId,
    /// The member expression, resolved in the object's class scope.
    pub member: NodeId,
}

impl AstNode for MemberExpr {
    fn kind(&self) -> NodeKind { NodeKind::Expression }

    fn children(&self) -> Vec<NodeId> { vec![self.object, self.member] }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) {
        remap(&mut self.object, map);
        remap(&mut self.member, map);
    }
}

/// Global access (e.g. `global::x` from inside a class).
#[derive(Clone, Debug)]
pub struct GlobalExpr {
    /// The member expression, resolved in the root scope.
    pub member: NodeId,
}

impl AstNode for GlobalExpr {
    fn kind(&self) -> NodeKind { NodeKind::Expression }

    fn children(&self) -> Vec<NodeId> { vec![self.member] }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) { remap(&mut self.member, map); }
}

/// The `super` expression.
#[derive(Clone, Debug)]
pub struct SuperExpr;

impl AstNode for SuperExpr {
    fn kind(&self) -> NodeKind { NodeKind::Expression }

    fn children(&self) -> Vec<NodeId> { Vec::new() }

    fn remap_ids(&mut self, _map: &FxHashMap<NodeId, NodeId>) {}
}

/// The `this` expression.
#[derive(Clone, Debug)]
pub struct ThisExpr;

impl AstNode for ThisExpr {
    fn kind(&self) -> NodeKind { NodeKind::Expression }

    fn children(&self) -> Vec<NodeId> { Vec::new() }

    fn remap_ids(&mut self, _map: &FxHashMap<NodeId, NodeId>) {}
}

/// The `nil` expression.
#[derive(Clone, Debug)]
pub struct NilExpr;

impl AstNode for NilExpr {
    fn kind(&self) -> NodeKind { NodeKind::Expression }

    fn children(&self) -> Vec<NodeId> { Vec::new() }

    fn remap_ids(&mut self, _map: &FxHashMap<NodeId, NodeId>) {}
}

/// Array indexing (e.g. `a[i]`, `m[i, j]`, `v[l..u]`).
#[derive(Clone, Debug)]
pub struct SliceExpr {
    /// The sliced object.
    pub object: NodeId,
    /// The index expressions; range indexes select sub-arrays.
    pub indexes: Vec<NodeId>,
}

impl AstNode for SliceExpr {
    fn kind(&self) -> NodeKind { NodeKind::Expression }

    fn children(&self) -> Vec<NodeId> {
        let mut children = vec![self.object];
        children.extend(&self.indexes);
        children
    }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) {
        remap(&mut self.object, map);
        remap_vec(&mut self.indexes, map);
    }
}

/// A range (e.g. `l..u`), used in slices and `for` loops.
#[derive(Clone, Debug)]
pub struct RangeExpr {
    /// Lower bound (inclusive).
    pub left: NodeId,
    /// Upper bound (inclusive).
    pub right: NodeId,
}

impl AstNode for RangeExpr {
    fn kind(&self) -> NodeKind { NodeKind::Expression }

    fn children(&self) -> Vec<NodeId> { vec![self.left, self.right] }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) {
        remap(&mut self.left, map);
        remap(&mut self.right, map);
    }
}

/// A parenthesised expression.
#[derive(Clone, Debug)]
pub struct ParenthesesExpr {
    /// The wrapped expression (possibly a comma list forming a tuple).
    pub inner: NodeId,
    /// Comma siblings after `inner`, making a tuple when non-empty.
    pub rest: Vec<NodeId>,
}

impl AstNode for ParenthesesExpr {
    fn kind(&self) -> NodeKind { NodeKind::Expression }

    fn children(&self) -> Vec<NodeId> {
        let mut children = vec![self.inner];
        children.extend(&self.rest);
        children
    }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) {
        remap(&mut self.inner, map);
        remap_vec(&mut self.rest, map);
    }
}

/// A sequence literal (e.g. `[1, 2, 3]`).
#[derive(Clone, Debug)]
pub struct SequenceExpr {
    /// The element expressions.
    pub elements: Vec<NodeId>,
}

impl AstNode for SequenceExpr {
    fn kind(&self) -> NodeKind { NodeKind::Expression }

    fn children(&self) -> Vec<NodeId> { self.elements.clone() }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) {
        remap_vec(&mut self.elements, map);
    }
}

/// A lambda function (e.g. `function (x:Real) -> Real { return x; }`).
#[derive(Clone, Debug)]
pub struct LambdaExpr {
    /// Parameter declarations.
    pub params: Vec<NodeId>,
    /// Declared return type, if any.
    pub return_type: Option<NodeId>,
    /// The body block.
    pub body: NodeId,
}

impl AstNode for LambdaExpr {
    fn kind(&self) -> NodeKind { NodeKind::Expression }

    fn children(&self) -> Vec<NodeId> {
        let mut children = self.params.clone();
        if let Some(ret) = self.return_type {
            children.push(ret);
        }
        children.push(self.body);
        children
    }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) {
        remap_vec(&mut self.params, map);
        remap_opt(&mut self.return_type, map);
        remap(&mut self.body, map);
    }
}

/// A downcast (e.g. `o @ Derived`), producing an optional of the target.
#[derive(Clone, Debug)]
pub struct CastExpr {
    /// The expression being cast.
    pub object: NodeId,
    /// The target type expression.
    pub target_type: NodeId,
}

impl AstNode for CastExpr {
    fn kind(&self) -> NodeKind { NodeKind::Expression }

    fn children(&self) -> Vec<NodeId> { vec![self.object, self.target_type] }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) {
        remap(&mut self.object, map);
        remap(&mut self.target_type, map);
    }
}

/// The has-value query (e.g. `o?`), valid on optionals and fibers.
#[derive(Clone, Debug)]
pub struct QueryExpr {
    /// The queried expression.
    pub operand: NodeId,
}

impl AstNode for QueryExpr {
    fn kind(&self) -> NodeKind { NodeKind::Expression }

    fn children(&self) -> Vec<NodeId> { vec![self.operand] }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) { remap(&mut self.operand, map); }
}

/// The value extraction (e.g. `o!`), valid on optionals and fibers.
#[derive(Clone, Debug)]
pub struct GetExpr {
    /// The dereferenced expression.
    pub operand: NodeId,
}

impl AstNode for GetExpr {
    fn kind(&self) -> NodeKind { NodeKind::Expression }

    fn children(&self) -> Vec<NodeId> { vec![self.operand] }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) { remap(&mut self.operand, map); }
}

/// A parameter declaration (e.g. `x:Real`, `x:Real <- 1.0`).
#[derive(Clone, Debug)]
pub struct ParameterDecl {
    /// The parameter name.
    pub name: String,
    /// The declared type expression.
    pub ty: NodeId,
    /// A default value, if any.
    pub value: Option<NodeId>,
}

impl AstNode for ParameterDecl {
    fn kind(&self) -> NodeKind { NodeKind::Expression }

    fn children(&self) -> Vec<NodeId> {
        let mut children = vec![self.ty];
        if let Some(value) = self.value {
            children.push(value);
        }
        children
    }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) {
        remap(&mut self.ty, map);
        remap_opt(&mut self.value, map);
    }
}

/// A local-variable declaration, which is an expression so that it can
/// appear as a `for`-loop index as well as in statement position.
#[derive(Clone, Debug)]
pub struct LocalVariableExpr {
    /// The variable name.
    pub name: String,
    /// The declared type expression; empty for `auto` variables.
    pub ty: Option<NodeId>,
    /// Array dimension expressions (e.g. `x:Real[n]`).
    pub brackets: Vec<NodeId>,
    /// Constructor arguments (e.g. `x:Gaussian(0.0, 1.0)`).
    pub args: Vec<NodeId>,
    /// The initial value (e.g. `x:Real <- 1.0`).
    pub value: Option<NodeId>,
    /// Annotations; `AUTO` when the type is inferred.
    pub annotations: Annotations,
}

impl AstNode for LocalVariableExpr {
    fn kind(&self) -> NodeKind { NodeKind::Expression }

    fn children(&self) -> Vec<NodeId> {
        let mut children = Vec::new();
        if let Some(ty) = self.ty {
            children.push(ty);
        }
        children.extend(&self.brackets);
        children.extend(&self.args);
        if let Some(value) = self.value {
            children.push(value);
        }
        children
    }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) {
        remap_opt(&mut self.ty, map);
        remap_vec(&mut self.brackets, map);
        remap_vec(&mut self.args, map);
        remap_opt(&mut self.value, map);
    }
}

/// A generic type parameter declaration (e.g. the `T` in `class Box<T>`).
#[derive(Clone, Debug)]
pub struct TypeParamDecl {
    /// The type parameter name.
    pub name: String,
    /// An upper bound type expression, if declared.
    pub bound: Option<NodeId>,
}

impl AstNode for TypeParamDecl {
    fn kind(&self) -> NodeKind { NodeKind::Expression }

    fn children(&self) -> Vec<NodeId> { self.bound.into_iter().collect() }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) { remap_opt(&mut self.bound, map); }
}
