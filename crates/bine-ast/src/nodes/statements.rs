//! Statement and declaration node types.
//!
//! Declarations are statements: a source file is a list of declaration
//! statements, a class body is a list of member declarations, and a
//! function body is a braces statement over ordinary statements.

use bine_source::FileId;
use rustc_hash::FxHashMap;

use super::{
    Annotations,
    AstNode,
    NodeId,
    NodeKind,
    ResolveState,
    remap,
    remap_opt,
    remap_vec,
};

/// The root node for one parsed source file.
#[derive(Clone, Debug)]
pub struct FileNode {
    /// The file this tree was parsed from.
    pub file: FileId,
    /// Top-level statements, in source order.
    pub stmts: Vec<NodeId>,
}

impl AstNode for FileNode {
    fn kind(&self) -> NodeKind { NodeKind::Statement }

    fn children(&self) -> Vec<NodeId> { self.stmts.clone() }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) { remap_vec(&mut self.stmts, map); }
}

/// A global variable declaration.
#[derive(Clone, Debug)]
pub struct GlobalVariableDecl {
    /// The variable name.
    pub name: String,
    /// The declared type expression.
    pub ty: NodeId,
    /// Array dimension expressions.
    pub brackets: Vec<NodeId>,
    /// Constructor arguments.
    pub args: Vec<NodeId>,
    /// The initial value, if any.
    pub value: Option<NodeId>,
}

impl AstNode for GlobalVariableDecl {
    fn kind(&self) -> NodeKind { NodeKind::Statement }

    fn children(&self) -> Vec<NodeId> {
        let mut children = vec![self.ty];
        children.extend(&self.brackets);
        children.extend(&self.args);
        if let Some(value) = self.value {
            children.push(value);
        }
        children
    }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) {
        remap(&mut self.ty, map);
        remap_vec(&mut self.brackets, map);
        remap_vec(&mut self.args, map);
        remap_opt(&mut self.value, map);
    }
}

/// A member variable declaration inside a class body.
#[derive(Clone, Debug)]
pub struct MemberVariableDecl {
    /// The variable name.
    pub name: String,
    /// The declared type expression.
    pub ty: NodeId,
    /// Array dimension expressions.
    pub brackets: Vec<NodeId>,
    /// Constructor arguments.
    pub args: Vec<NodeId>,
    /// The initial value, resolved in the class initializer scope.
    pub value: Option<NodeId>,
}

impl AstNode for MemberVariableDecl {
    fn kind(&self) -> NodeKind { NodeKind::Statement }

    fn children(&self) -> Vec<NodeId> {
        let mut children = vec![self.ty];
        children.extend(&self.brackets);
        children.extend(&self.args);
        if let Some(value) = self.value {
            children.push(value);
        }
        children
    }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) {
        remap(&mut self.ty, map);
        remap_vec(&mut self.brackets, map);
        remap_vec(&mut self.args, map);
        remap_opt(&mut self.value, map);
    }
}

/// A function declaration, global or member.
#[derive(Clone, Debug)]
pub struct FunctionDecl {
    /// The function name.
    pub name: String,
    /// Generic type parameters.
    pub type_params: Vec<NodeId>,
    /// Parameter declarations.
    pub params: Vec<NodeId>,
    /// Declared return type; empty means no return value.
    pub return_type: Option<NodeId>,
    /// The body; absent for declarations imported from interface files.
    pub body: Option<NodeId>,
    /// Annotations.
    pub annotations: Annotations,
    /// Whether this is a member function of a class.
    pub member: bool,
    /// Resolution progress, for pass idempotence.
    pub state: ResolveState,
    /// Generic instantiations cloned from this declaration.
    pub instantiations: Vec<NodeId>,
    /// The generic declaration this was instantiated from, if any.
    pub instantiation_of: Option<NodeId>,
}

impl AstNode for FunctionDecl {
    fn kind(&self) -> NodeKind { NodeKind::Statement }

    fn children(&self) -> Vec<NodeId> {
        let mut children = self.type_params.clone();
        children.extend(&self.params);
        if let Some(ret) = self.return_type {
            children.push(ret);
        }
        if let Some(body) = self.body {
            children.push(body);
        }
        children
    }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) {
        remap_vec(&mut self.type_params, map);
        remap_vec(&mut self.params, map);
        remap_opt(&mut self.return_type, map);
        remap_opt(&mut self.body, map);
        remap_vec(&mut self.instantiations, map);
        remap_opt(&mut self.instantiation_of, map);
    }
}

/// A fiber declaration, global or member.
///
/// The declared return type is always the fiber wrapper around the yield
/// type (`Integer!`); the parser enforces the wrapper.
#[derive(Clone, Debug)]
pub struct FiberDecl {
    /// The fiber name.
    pub name: String,
    /// Generic type parameters.
    pub type_params: Vec<NodeId>,
    /// Parameter declarations.
    pub params: Vec<NodeId>,
    /// The fiber return type (a [`super::FiberType`] expression).
    pub return_type: NodeId,
    /// The body; absent for declarations imported from interface files.
    pub body: Option<NodeId>,
    /// Annotations.
    pub annotations: Annotations,
    /// Whether this is a member fiber of a class.
    pub member: bool,
    /// Resolution progress, for pass idempotence.
    pub state: ResolveState,
    /// Generic instantiations cloned from this declaration.
    pub instantiations: Vec<NodeId>,
    /// The generic declaration this was instantiated from, if any.
    pub instantiation_of: Option<NodeId>,
}

impl AstNode for FiberDecl {
    fn kind(&self) -> NodeKind { NodeKind::Statement }

    fn children(&self) -> Vec<NodeId> {
        let mut children = self.type_params.clone();
        children.extend(&self.params);
        children.push(self.return_type);
        if let Some(body) = self.body {
            children.push(body);
        }
        children
    }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) {
        remap_vec(&mut self.type_params, map);
        remap_vec(&mut self.params, map);
        remap(&mut self.return_type, map);
        remap_opt(&mut self.body, map);
        remap_vec(&mut self.instantiations, map);
        remap_opt(&mut self.instantiation_of, map);
    }
}

/// A program declaration (an entry point with named options).
#[derive(Clone, Debug)]
pub struct ProgramDecl {
    /// The program name.
    pub name: String,
    /// Option parameter declarations.
    pub params: Vec<NodeId>,
    /// The body.
    pub body: Option<NodeId>,
    /// Resolution progress, for pass idempotence.
    pub state: ResolveState,
}

impl AstNode for ProgramDecl {
    fn kind(&self) -> NodeKind { NodeKind::Statement }

    fn children(&self) -> Vec<NodeId> {
        let mut children = self.params.clone();
        if let Some(body) = self.body {
            children.push(body);
        }
        children
    }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) {
        remap_vec(&mut self.params, map);
        remap_opt(&mut self.body, map);
    }
}

/// A class declaration.
#[derive(Clone, Debug)]
pub struct ClassDecl {
    /// The class name.
    pub name: String,
    /// Generic type parameters.
    pub type_params: Vec<NodeId>,
    /// Constructor parameter declarations.
    pub params: Vec<NodeId>,
    /// The base type expression, if the class extends another.
    pub base: Option<NodeId>,
    /// Arguments forwarded to the base constructor.
    pub base_args: Vec<NodeId>,
    /// Member declarations.
    pub body: Vec<NodeId>,
    /// Annotations (`final`, `abstract`).
    pub annotations: Annotations,
    /// Resolution progress, for pass idempotence.
    pub state: ResolveState,
    /// Generic instantiations cloned from this declaration.
    pub instantiations: Vec<NodeId>,
    /// The generic declaration this was instantiated from, if any.
    pub instantiation_of: Option<NodeId>,
}

impl AstNode for ClassDecl {
    fn kind(&self) -> NodeKind { NodeKind::Statement }

    fn children(&self) -> Vec<NodeId> {
        let mut children = self.type_params.clone();
        children.extend(&self.params);
        if let Some(base) = self.base {
            children.push(base);
        }
        children.extend(&self.base_args);
        children.extend(&self.body);
        children
    }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) {
        remap_vec(&mut self.type_params, map);
        remap_vec(&mut self.params, map);
        remap_opt(&mut self.base, map);
        remap_vec(&mut self.base_args, map);
        remap_vec(&mut self.body, map);
        remap_vec(&mut self.instantiations, map);
        remap_opt(&mut self.instantiation_of, map);
    }
}

/// A basic type declaration (e.g. `type Real;`, `type Integer < Real;`).
#[derive(Clone, Debug)]
pub struct BasicDecl {
    /// The type name.
    pub name: String,
    /// The base type expression, if the type inherits another basic.
    pub base: Option<NodeId>,
    /// Resolution progress, for pass idempotence.
    pub state: ResolveState,
}

impl AstNode for BasicDecl {
    fn kind(&self) -> NodeKind { NodeKind::Statement }

    fn children(&self) -> Vec<NodeId> { self.base.into_iter().collect() }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) { remap_opt(&mut self.base, map); }
}

/// A type alias declaration (e.g. `type Vector = Real[_];`).
#[derive(Clone, Debug)]
pub struct AliasDecl {
    /// The alias name.
    pub name: String,
    /// The aliased type expression.
    pub aliased: NodeId,
    /// Resolution progress, for pass idempotence.
    pub state: ResolveState,
}

impl AstNode for AliasDecl {
    fn kind(&self) -> NodeKind { NodeKind::Statement }

    fn children(&self) -> Vec<NodeId> { vec![self.aliased] }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) { remap(&mut self.aliased, map); }
}

/// A binary operator declaration (e.g. `operator (x:Real + y:Real) -> Real`).
#[derive(Clone, Debug)]
pub struct BinaryOperatorDecl {
    /// The operator symbol.
    pub name: String,
    /// Left parameter declaration.
    pub left: NodeId,
    /// Right parameter declaration.
    pub right: NodeId,
    /// Declared return type.
    pub return_type: Option<NodeId>,
    /// The body.
    pub body: Option<NodeId>,
    /// Resolution progress, for pass idempotence.
    pub state: ResolveState,
}

impl AstNode for BinaryOperatorDecl {
    fn kind(&self) -> NodeKind { NodeKind::Statement }

    fn children(&self) -> Vec<NodeId> {
        let mut children = vec![self.left, self.right];
        if let Some(ret) = self.return_type {
            children.push(ret);
        }
        if let Some(body) = self.body {
            children.push(body);
        }
        children
    }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) {
        remap(&mut self.left, map);
        remap(&mut self.right, map);
        remap_opt(&mut self.return_type, map);
        remap_opt(&mut self.body, map);
    }
}

/// A unary operator declaration (e.g. `operator (-x:Real) -> Real`).
#[derive(Clone, Debug)]
pub struct UnaryOperatorDecl {
    /// The operator symbol.
    pub name: String,
    /// The operand parameter declaration.
    pub operand: NodeId,
    /// Declared return type.
    pub return_type: Option<NodeId>,
    /// The body.
    pub body: Option<NodeId>,
    /// Resolution progress, for pass idempotence.
    pub state: ResolveState,
}

impl AstNode for UnaryOperatorDecl {
    fn kind(&self) -> NodeKind { NodeKind::Statement }

    fn children(&self) -> Vec<NodeId> {
        let mut children = vec![self.operand];
        if let Some(ret) = self.return_type {
            children.push(ret);
        }
        if let Some(body) = self.body {
            children.push(body);
        }
        children
    }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) {
        remap(&mut self.operand, map);
        remap_opt(&mut self.return_type, map);
        remap_opt(&mut self.body, map);
    }
}

/// A conversion operator declaration inside a class (`operator -> T`).
#[derive(Clone, Debug)]
pub struct ConversionOperatorDecl {
    /// The conversion target type expression.
    pub target_type: NodeId,
    /// The body.
    pub body: Option<NodeId>,
    /// Resolution progress, for pass idempotence.
    pub state: ResolveState,
}

impl AstNode for ConversionOperatorDecl {
    fn kind(&self) -> NodeKind { NodeKind::Statement }

    fn children(&self) -> Vec<NodeId> {
        let mut children = vec![self.target_type];
        if let Some(body) = self.body {
            children.push(body);
        }
        children
    }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) {
        remap(&mut self.target_type, map);
        remap_opt(&mut self.body, map);
    }
}

/// An assignment operator declaration inside a class (`operator <- x:T`).
#[derive(Clone, Debug)]
pub struct AssignmentOperatorDecl {
    /// The right-hand-side parameter declaration.
    pub param: NodeId,
    /// The body.
    pub body: Option<NodeId>,
    /// Resolution progress, for pass idempotence.
    pub state: ResolveState,
}

impl AstNode for AssignmentOperatorDecl {
    fn kind(&self) -> NodeKind { NodeKind::Statement }

    fn children(&self) -> Vec<NodeId> {
        let mut children = vec![self.param];
        if let Some(body) = self.body {
            children.push(body);
        }
        children
    }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) {
        remap(&mut self.param, map);
        remap_opt(&mut self.body, map);
    }
}

/// An expression in statement position.
#[derive(Clone, Debug)]
pub struct ExpressionStmt {
    /// The expression.
    pub expr: NodeId,
}

impl AstNode for ExpressionStmt {
    fn kind(&self) -> NodeKind { NodeKind::Statement }

    fn children(&self) -> Vec<NodeId> { vec![self.expr] }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) { remap(&mut self.expr, map); }
}

/// An `if` statement.
#[derive(Clone, Debug)]
pub struct IfStmt {
    /// The condition, which must be Boolean.
    pub cond: NodeId,
    /// The then block.
    pub then_block: NodeId,
    /// The else block, if any (possibly another `if`).
    pub else_block: Option<NodeId>,
}

impl AstNode for IfStmt {
    fn kind(&self) -> NodeKind { NodeKind::Statement }

    fn children(&self) -> Vec<NodeId> {
        let mut children = vec![self.cond, self.then_block];
        if let Some(else_block) = self.else_block {
            children.push(else_block);
        }
        children
    }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) {
        remap(&mut self.cond, map);
        remap(&mut self.then_block, map);
        remap_opt(&mut self.else_block, map);
    }
}

/// A `for` statement (e.g. `for (i:Integer in 1..10)`), possibly parallel.
#[derive(Clone, Debug)]
pub struct ForStmt {
    /// The index variable declaration.
    pub index: NodeId,
    /// The iterated range expression.
    pub range: NodeId,
    /// The body block.
    pub body: NodeId,
    /// Annotations; `PARALLEL` marks a parallel loop.
    pub annotations: Annotations,
}

impl AstNode for ForStmt {
    fn kind(&self) -> NodeKind { NodeKind::Statement }

    fn children(&self) -> Vec<NodeId> { vec![self.index, self.range, self.body] }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) {
        remap(&mut self.index, map);
        remap(&mut self.range, map);
        remap(&mut self.body, map);
    }
}

/// A `while` statement.
#[derive(Clone, Debug)]
pub struct WhileStmt {
    /// The condition, which must be Boolean.
    pub cond: NodeId,
    /// The body block.
    pub body: NodeId,
}

impl AstNode for WhileStmt {
    fn kind(&self) -> NodeKind { NodeKind::Statement }

    fn children(&self) -> Vec<NodeId> { vec![self.cond, self.body] }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) {
        remap(&mut self.cond, map);
        remap(&mut self.body, map);
    }
}

/// A `do ... while` statement.
#[derive(Clone, Debug)]
pub struct DoWhileStmt {
    /// The body block.
    pub body: NodeId,
    /// The condition, which must be Boolean.
    pub cond: NodeId,
}

impl AstNode for DoWhileStmt {
    fn kind(&self) -> NodeKind { NodeKind::Statement }

    fn children(&self) -> Vec<NodeId> { vec![self.body, self.cond] }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) {
        remap(&mut self.body, map);
        remap(&mut self.cond, map);
    }
}

/// A `return` statement.
#[derive(Clone, Debug)]
pub struct ReturnStmt {
    /// The returned value, if any.
    pub value: Option<NodeId>,
}

impl AstNode for ReturnStmt {
    fn kind(&self) -> NodeKind { NodeKind::Statement }

    fn children(&self) -> Vec<NodeId> { self.value.into_iter().collect() }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) { remap_opt(&mut self.value, map); }
}

/// A `yield` statement inside a fiber body.
#[derive(Clone, Debug)]
pub struct YieldStmt {
    /// The yielded value.
    pub value: NodeId,
}

impl AstNode for YieldStmt {
    fn kind(&self) -> NodeKind { NodeKind::Statement }

    fn children(&self) -> Vec<NodeId> { vec![self.value] }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) { remap(&mut self.value, map); }
}

/// An `assert` statement.
#[derive(Clone, Debug)]
pub struct AssertStmt {
    /// The asserted condition, which must be Boolean.
    pub cond: NodeId,
}

impl AstNode for AssertStmt {
    fn kind(&self) -> NodeKind { NodeKind::Statement }

    fn children(&self) -> Vec<NodeId> { vec![self.cond] }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) { remap(&mut self.cond, map); }
}

/// An `import` statement naming another package.
#[derive(Clone, Debug)]
pub struct ImportStmt {
    /// The imported package name.
    pub name: String,
}

impl AstNode for ImportStmt {
    fn kind(&self) -> NodeKind { NodeKind::Statement }

    fn children(&self) -> Vec<NodeId> { Vec::new() }

    fn remap_ids(&mut self, _map: &FxHashMap<NodeId, NodeId>) {}
}

/// A braces block of statements.
#[derive(Clone, Debug)]
pub struct BracesStmt {
    /// The contained statements, in source order.
    pub stmts: Vec<NodeId>,
}

impl AstNode for BracesStmt {
    fn kind(&self) -> NodeKind { NodeKind::Statement }

    fn children(&self) -> Vec<NodeId> { self.stmts.clone() }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) { remap_vec(&mut self.stmts, map); }
}

/// Where a raw passthrough block lands in the generated output.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum RawTag {
    /// Copied into the generated header.
    Header,
    /// Copied into the generated source.
    Source,
}

/// A raw target-language passthrough block (`hpp{{ ... }}` / `cpp{{ ... }}`).
#[derive(Clone, Debug)]
pub struct RawStmt {
    /// Whether the text belongs in the header or the source output.
    pub tag: RawTag,
    /// The verbatim text.
    pub text: String,
}

impl AstNode for RawStmt {
    fn kind(&self) -> NodeKind { NodeKind::Statement }

    fn children(&self) -> Vec<NodeId> { Vec::new() }

    fn remap_ids(&mut self, _map: &FxHashMap<NodeId, NodeId>) {}
}

/// An explicit instantiation directive (e.g. `instantiated Box<Real>;`).
#[derive(Clone, Debug)]
pub struct InstantiatedStmt {
    /// The instantiated type expression.
    pub ty: NodeId,
}

impl AstNode for InstantiatedStmt {
    fn kind(&self) -> NodeKind { NodeKind::Statement }

    fn children(&self) -> Vec<NodeId> { vec![self.ty] }

    fn remap_ids(&mut self, map: &FxHashMap<NodeId, NodeId>) { remap(&mut self.ty, map); }
}
