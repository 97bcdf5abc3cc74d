//! Semantic analysis for the Bine programming language.
//!
//! This crate provides the semantic core of the compiler:
//!
//! - **Scopes and dictionaries** ([`scope`]): unique and overloaded
//!   declaration dictionaries, with class scope inheritance;
//! - **Overload storage** ([`overload`]): specialization posets with
//!   transitive reduction and most-specific matching;
//! - **The type lattice** ([`types`], [`registry`]): the semantic type
//!   representation and the `definitely`/`possibly`/`common` relations;
//! - **The pass pipeline** ([`passes`]): Typer, ResolverSuper,
//!   ResolverHeader and ResolverSource;
//! - **Generic instantiation** ([`instantiate`](crate::passes)): clone,
//!   bind, and catch up through the passes;
//! - **Gatherers** ([`gather`]): the collectors fiber lowering uses.
//!
//! The entry point is [`analyze`], which runs the full pipeline over
//! the parsed files of a package and returns the [`Analysis`] the
//! emitter consumes.

pub mod error;
pub mod gather;
mod instantiate;
pub mod overload;
pub mod passes;
pub mod registry;
pub mod scope;
pub mod types;

use bine_ast::Ast;
use bine_ast::nodes::NodeId;
pub use error::{Candidate, CompileError};
use passes::Analyzer;
pub use registry::Registry;
pub use scope::{Scope, ScopeId, ScopeKind, ScopeTable};
pub use types::{Type, type_to_string};

/// The result of semantic analysis: every scope, every class fact, and
/// the resolved type of every expression.
#[derive(Debug)]
pub struct Analysis {
    /// All scopes of the package.
    pub scopes: ScopeTable,
    /// Class facts, signatures and resolved types.
    pub registry: Registry,
}

/// Runs the four-pass pipeline over the parsed files of a package.
///
/// ## Errors
///
/// Returns the first compiler error encountered. Nothing is emitted for
/// a package that fails analysis.
pub fn analyze(ast: &mut Ast, files: &[NodeId]) -> Result<Analysis, CompileError> {
    let mut analyzer = Analyzer::new(ast);
    analyzer.run(files)?;
    let Analyzer { scopes, registry, .. } = analyzer;
    Ok(Analysis { scopes, registry })
}
