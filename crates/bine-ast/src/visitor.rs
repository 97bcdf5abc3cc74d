//! Read-only AST traversal.
//!
//! The [`Visitor`] trait provides one method per node type, each
//! defaulting to a recursive walk of the node's children. Implementors
//! override only the methods they care about; gatherers (such as the
//! local-variable and yield collectors used by fiber lowering) are small
//! visitors that record what they see.
//!
//! Mutation is not done through this trait. The resolver passes in the
//! analyzer crate are modifiers: they walk children themselves and may
//! replace a child slot with a new node id.

use crate::ast::Ast;
use crate::nodes::{
    AliasDecl,
    AnyNode,
    ArrayType,
    AssertStmt,
    AssignExpr,
    AssignmentOperatorDecl,
    AstNode,
    BasicDecl,
    BinaryCallExpr,
    BinaryOperatorDecl,
    BracesStmt,
    CallExpr,
    CastExpr,
    ClassDecl,
    ConversionOperatorDecl,
    DoWhileStmt,
    EmptyType,
    ExpressionStmt,
    FiberDecl,
    FiberType,
    FileNode,
    ForStmt,
    FunctionDecl,
    FunctionType,
    GetExpr,
    GlobalExpr,
    GlobalVariableDecl,
    IfStmt,
    ImportStmt,
    InstantiatedStmt,
    LambdaExpr,
    LiteralExpr,
    LocalVariableExpr,
    MemberExpr,
    MemberType,
    MemberVariableDecl,
    NamedExpr,
    NamedType,
    NilExpr,
    NodeId,
    OptionalType,
    OverloadedRef,
    ParameterDecl,
    ParenthesesExpr,
    ProgramDecl,
    QueryExpr,
    RangeExpr,
    RawStmt,
    ReturnStmt,
    SequenceExpr,
    SequenceType,
    SliceExpr,
    SuperExpr,
    ThisExpr,
    TupleType,
    TypeParamDecl,
    UnaryCallExpr,
    UnaryOperatorDecl,
    UnknownType,
    VarRef,
    WeakType,
    WhileStmt,
    YieldStmt,
};

macro_rules! define_visitor {
    ($($variant:ident => $method:ident),* $(,)?) => {
        /// Read-only visitor with per-node-type hooks.
        pub trait Visitor {
            /// Visits a node, dispatching on its type.
            fn visit(&mut self, ast: &Ast, id: NodeId) {
                match &ast[id].data {
                    $(AnyNode::$variant(node) => self.$method(ast, id, node),)*
                }
            }

            $(
                /// Visits a node of this type; the default walks its children.
                #[allow(unused_variables)]
                fn $method(&mut self, ast: &Ast, id: NodeId, node: &$variant) {
                    for child in node.children() {
                        self.visit(ast, child);
                    }
                }
            )*
        }
    };
}

define_visitor!(
    LiteralExpr => visit_literal_expr,
    NamedExpr => visit_named_expr,
    VarRef => visit_var_ref,
    OverloadedRef => visit_overloaded_ref,
    CallExpr => visit_call_expr,
    BinaryCallExpr => visit_binary_call_expr,
    UnaryCallExpr => visit_unary_call_expr,
    AssignExpr => visit_assign_expr,
    MemberExpr => visit_member_expr,
    GlobalExpr => visit_global_expr,
    SuperExpr => visit_super_expr,
    ThisExpr => visit_this_expr,
    NilExpr => visit_nil_expr,
    SliceExpr => visit_slice_expr,
    RangeExpr => visit_range_expr,
    ParenthesesExpr => visit_parentheses_expr,
    SequenceExpr => visit_sequence_expr,
    LambdaExpr => visit_lambda_expr,
    CastExpr => visit_cast_expr,
    QueryExpr => visit_query_expr,
    GetExpr => visit_get_expr,
    ParameterDecl => visit_parameter_decl,
    LocalVariableExpr => visit_local_variable_expr,
    TypeParamDecl => visit_type_param_decl,
    FileNode => visit_file,
    GlobalVariableDecl => visit_global_variable_decl,
    MemberVariableDecl => visit_member_variable_decl,
    FunctionDecl => visit_function_decl,
    FiberDecl => visit_fiber_decl,
    ProgramDecl => visit_program_decl,
    ClassDecl => visit_class_decl,
    BasicDecl => visit_basic_decl,
    AliasDecl => visit_alias_decl,
    BinaryOperatorDecl => visit_binary_operator_decl,
    UnaryOperatorDecl => visit_unary_operator_decl,
    ConversionOperatorDecl => visit_conversion_operator_decl,
    AssignmentOperatorDecl => visit_assignment_operator_decl,
    ExpressionStmt => visit_expression_stmt,
    IfStmt => visit_if_stmt,
    ForStmt => visit_for_stmt,
    WhileStmt => visit_while_stmt,
    DoWhileStmt => visit_do_while_stmt,
    ReturnStmt => visit_return_stmt,
    YieldStmt => visit_yield_stmt,
    AssertStmt => visit_assert_stmt,
    ImportStmt => visit_import_stmt,
    BracesStmt => visit_braces_stmt,
    RawStmt => visit_raw_stmt,
    InstantiatedStmt => visit_instantiated_stmt,
    NamedType => visit_named_type,
    MemberType => visit_member_type,
    ArrayType => visit_array_type,
    TupleType => visit_tuple_type,
    SequenceType => visit_sequence_type,
    FunctionType => visit_function_type,
    FiberType => visit_fiber_type,
    OptionalType => visit_optional_type,
    WeakType => visit_weak_type,
    UnknownType => visit_unknown_type,
    EmptyType => visit_empty_type,
);
