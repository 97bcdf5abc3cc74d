//! Gatherers used by fiber lowering.
//!
//! Small read-only visitors that collect the pieces the emitter turns
//! into a fiber state class: the local variables of the body (one state
//! member each) and the yield statements (one label each). Neither
//! descends into lambda functions, which keep their own locals and
//! cannot yield.

use bine_ast::nodes::{LambdaExpr, LocalVariableExpr, NodeId, YieldStmt};
use bine_ast::visitor::Visitor;
use bine_ast::Ast;

/// Collects every local variable declared in a body, in source order.
#[derive(Debug, Default)]
pub struct LocalGatherer {
    /// The collected local variable declarations.
    pub locals: Vec<NodeId>,
}

impl LocalGatherer {
    /// Collects the locals of a subtree.
    #[must_use]
    pub fn gather(ast: &Ast, root: NodeId) -> Vec<NodeId> {
        let mut gatherer = Self::default();
        gatherer.visit(ast, root);
        gatherer.locals
    }
}

impl Visitor for LocalGatherer {
    fn visit_local_variable_expr(
        &mut self,
        ast: &Ast,
        id: NodeId,
        node: &LocalVariableExpr,
    ) {
        self.locals.push(id);
        for child in bine_ast::nodes::AstNode::children(node) {
            self.visit(ast, child);
        }
    }

    fn visit_lambda_expr(&mut self, _ast: &Ast, _id: NodeId, _node: &LambdaExpr) {
        // Lambda locals live in the lambda, not in the fiber state.
    }
}

/// Collects every yield statement of a body, in source order.
#[derive(Debug, Default)]
pub struct YieldGatherer {
    /// The collected yield statements.
    pub yields: Vec<NodeId>,
}

impl YieldGatherer {
    /// Collects the yields of a subtree.
    #[must_use]
    pub fn gather(ast: &Ast, root: NodeId) -> Vec<NodeId> {
        let mut gatherer = Self::default();
        gatherer.visit(ast, root);
        gatherer.yields
    }
}

impl Visitor for YieldGatherer {
    fn visit_yield_stmt(&mut self, ast: &Ast, id: NodeId, node: &YieldStmt) {
        self.yields.push(id);
        self.visit(ast, node.value);
    }

    fn visit_lambda_expr(&mut self, _ast: &Ast, _id: NodeId, _node: &LambdaExpr) {
        // A lambda cannot yield; nothing beneath it contributes labels.
    }
}
