//! Abstract syntax tree for the Bine programming language.
//!
//! The AST is arena-allocated: all nodes live in an [`ast::Ast`] and refer
//! to one another through [`nodes::NodeId`] handles. Three traversal
//! species operate on it:
//!
//! - the **cloner** ([`ast::Ast::clone_subtree`]): a deep copy with fresh
//!   ids and an old-to-new id mapping, used by generic instantiation;
//! - **modifiers**: the resolver passes in the analyzer crate, which walk
//!   children and may replace a child slot with a new node id;
//! - **visitors** ([`visitor::Visitor`]): read-only traversals such as the
//!   gatherers used by fiber lowering and the code emitter.

pub mod ast;
pub mod nodes;
pub mod visitor;

pub use ast::Ast;
pub use nodes::{AnyNode, AstNode, NodeId, NodeKind};
