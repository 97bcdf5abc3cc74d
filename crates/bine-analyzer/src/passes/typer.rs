//! Pass 1: register named type declarations in the root scope.
//!
//! Base types, parameters and bodies are untouched here; the only goal
//! is that every class, basic and alias name is present (exactly once)
//! before anything tries to reference it.

use bine_ast::nodes::{AnyNode, NodeId, ResolveState};

use super::Analyzer;
use crate::error::CompileError;
use crate::types::decl_name;

impl Analyzer<'_> {
    /// Registers the named type declarations of one file.
    pub(crate) fn typer_file(&mut self, file: NodeId) -> Result<(), CompileError> {
        let stmts = self.ast.children(file);
        for stmt in stmts {
            match &self.ast[stmt].data {
                AnyNode::ClassDecl(_) | AnyNode::BasicDecl(_) | AnyNode::AliasDecl(_) => {
                    self.register_type(stmt)?;
                }
                _ => {
                    // Everything else is registered by later passes.
                    self.set_decl_state(stmt, ResolveState::Typed);
                }
            }
        }
        Ok(())
    }

    fn register_type(&mut self, decl: NodeId) -> Result<(), CompileError> {
        if self.decl_state(decl) >= ResolveState::Typed {
            return Ok(());
        }

        let name = decl_name(self.ast, decl);
        let root = self.scopes.root();
        if let Err(previous) = self.scopes.get_mut(root).add_type(name.clone(), decl) {
            return Err(CompileError::PreviousDeclaration {
                name,
                loc: self.ast.loc(decl).clone(),
                previous: self.ast.loc(previous).clone(),
            });
        }

        log::trace!("registered type '{name}' as {decl}");
        self.set_decl_state(decl, ResolveState::Typed);
        Ok(())
    }
}
