//! Pass 4: body resolution.
//!
//! Walks every function, fiber, operator and program body: identifiers
//! resolve innermost-outwards and are replaced by resolved reference
//! nodes; calls resolve through the specialization posets (triggering
//! generic instantiation); the probabilistic assignment sugars rewrite
//! to calls; fiber calls in statement position re-yield; and the type
//! rules (conditions, indexes, returns, yields, assignments) are
//! enforced.

use bine_ast::nodes::{
    AnyNode,
    Annotations,
    AssignExpr,
    AssignOp,
    BracesStmt,
    CallExpr,
    ExpressionStmt,
    GetExpr,
    IfStmt,
    Literal,
    LocalVariableExpr,
    MemberExpr,
    NamedExpr,
    NamedType,
    NodeId,
    OverloadKind,
    OverloadedRef,
    QueryExpr,
    ResolveState,
    VarKind,
    VarRef,
    WhileStmt,
    YieldStmt,
};
use bine_source::Location;

use super::Analyzer;
use crate::error::{Candidate, CompileError};
use crate::scope::{Scope, ScopeId, ScopeKind};
use crate::types::{Type, signature_to_string, type_to_string};

/// What a name resolved to within the scope chain.
enum Found {
    /// A variable-like declaration.
    Var(NodeId),
    /// An overloaded set of the given kind, in the given scope.
    Overload(OverloadKind, ScopeId),
    /// A type declaration.
    TypeDecl(NodeId),
}

impl Analyzer<'_> {
    /// Resolves the bodies of one file.
    pub(crate) fn source_file(&mut self, file: NodeId) -> Result<(), CompileError> {
        let stmts = self.ast.children(file);
        for stmt in stmts {
            self.source_decl(stmt)?;
        }
        Ok(())
    }

    /// Resolves the body of one declaration.
    pub(crate) fn source_decl(&mut self, decl: NodeId) -> Result<(), CompileError> {
        if self.decl_state(decl) >= ResolveState::Sourced {
            return Ok(());
        }

        match self.ast[decl].data.clone() {
            AnyNode::FunctionDecl(node) => {
                self.set_decl_state(decl, ResolveState::Sourced);
                if !node.type_params.is_empty() && node.instantiation_of.is_none() {
                    // Generic templates are resolved per instantiation.
                    return Ok(());
                }
                let ret = self.registry.returns.get(&decl).cloned().unwrap_or_default();
                self.source_body(decl, &node.params, node.body, ret, None)
            }
            AnyNode::FiberDecl(node) => {
                self.set_decl_state(decl, ResolveState::Sourced);
                if !node.type_params.is_empty() && node.instantiation_of.is_none() {
                    return Ok(());
                }
                let ret = self.registry.returns.get(&decl).cloned().unwrap_or_default();
                let yield_ty = ret.unwrap_fiber().cloned().unwrap_or(Type::Unknown);
                self.source_body(decl, &node.params, node.body, Type::Empty, Some(yield_ty))
            }
            AnyNode::BinaryOperatorDecl(node) => {
                self.set_decl_state(decl, ResolveState::Sourced);
                let ret = self.registry.returns.get(&decl).cloned().unwrap_or_default();
                self.source_body(decl, &[node.left, node.right], node.body, ret, None)
            }
            AnyNode::UnaryOperatorDecl(node) => {
                self.set_decl_state(decl, ResolveState::Sourced);
                let ret = self.registry.returns.get(&decl).cloned().unwrap_or_default();
                self.source_body(decl, &[node.operand], node.body, ret, None)
            }
            AnyNode::ProgramDecl(node) => {
                self.set_decl_state(decl, ResolveState::Sourced);
                self.source_body(decl, &node.params, node.body, Type::Empty, None)
            }
            AnyNode::ClassDecl(node) => self.source_class(decl, &node),
            AnyNode::GlobalVariableDecl(node) => self.source_global_variable(decl, &node),
            AnyNode::InstantiatedStmt(node) => {
                let _ = self.resolve_type(node.ty)?;
                Ok(())
            }
            AnyNode::BasicDecl(_) | AnyNode::AliasDecl(_) => {
                self.set_decl_state(decl, ResolveState::Sourced);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Resolves a function-like body with its parameter defaults, in
    /// its pass-2 body scope, with the given return and yield contexts.
    fn source_body(
        &mut self,
        decl: NodeId,
        params: &[NodeId],
        body: Option<NodeId>,
        ret: Type,
        yield_ty: Option<Type>,
    ) -> Result<(), CompileError> {
        let Some(scope) = self.registry.body_scopes.get(&decl).copied() else {
            return Ok(());
        };

        self.return_stack.push(ret);
        if let Some(yield_ty) = yield_ty.clone() {
            self.yield_stack.push(yield_ty);
        }

        let out = self.scoped(scope, |this| {
            for &param in params {
                if let AnyNode::ParameterDecl(p) = this.ast[param].data.clone()
                    && let Some(value) = p.value
                {
                    let resolved = this.resolve_expr(value)?;
                    this.replace_parameter_value(param, resolved);
                }
            }
            if let Some(body) = body {
                let resolved = this.resolve_stmt(body)?;
                this.replace_body(decl, resolved);
            }
            Ok(())
        });

        if yield_ty.is_some() {
            let _ = self.yield_stack.pop();
        }
        let _ = self.return_stack.pop();
        out
    }

    /// Resolves a global variable's sizes, constructor arguments and
    /// initializer.
    fn source_global_variable(
        &mut self,
        decl: NodeId,
        node: &bine_ast::nodes::GlobalVariableDecl,
    ) -> Result<(), CompileError> {
        let loc = self.ast.loc(decl).clone();
        let declared = self.registry.var_types.get(&decl).cloned().unwrap_or_default();

        let mut brackets = node.brackets.clone();
        if !brackets.is_empty() {
            let integer = self.basic_type("Integer", &loc)?;
            for bracket in &mut brackets {
                *bracket = self.resolve_expr(*bracket)?;
                let bty = self.registry.type_of(*bracket);
                if !self.registry.definitely(&bty, &integer) {
                    return Err(CompileError::Index {
                        ty: type_to_string(self.ast, &bty),
                        loc: self.ast.loc(*bracket).clone(),
                    });
                }
            }
        }

        let mut args = node.args.clone();
        let mut arg_types = Vec::with_capacity(args.len());
        for arg in &mut args {
            *arg = self.resolve_expr(*arg)?;
            arg_types.push(self.registry.type_of(*arg));
        }
        if !args.is_empty() {
            let Some(class_decl) = self.registry.substitute(&declared).class_decl() else {
                return Err(CompileError::Constructor {
                    class: type_to_string(self.ast, &declared),
                    args: signature_to_string(self.ast, "", &arg_types),
                    loc,
                });
            };
            if !self.registry.call_possible(&arg_types, class_decl) {
                return Err(CompileError::Constructor {
                    class: crate::types::decl_name(self.ast, class_decl),
                    args: signature_to_string(self.ast, "", &arg_types),
                    loc,
                });
            }
            self.check_constructible(class_decl, &loc)?;
        }

        if let AnyNode::GlobalVariableDecl(var) = &mut self.ast[decl].data {
            var.brackets = brackets;
            var.args = args;
        }

        if let Some(value) = node.value {
            let resolved = self.resolve_expr(value)?;
            if let AnyNode::GlobalVariableDecl(var) = &mut self.ast[decl].data {
                var.value = Some(resolved);
            }
            let found = self.registry.type_of(resolved);
            if !self.assignable(&found, &declared) {
                return Err(CompileError::InitialValue {
                    declared: type_to_string(self.ast, &declared),
                    value: type_to_string(self.ast, &found),
                    loc,
                });
            }
        }
        Ok(())
    }

    fn source_class(
        &mut self,
        decl: NodeId,
        node: &bine_ast::nodes::ClassDecl,
    ) -> Result<(), CompileError> {
        self.set_decl_state(decl, ResolveState::Sourced);
        if !node.type_params.is_empty() && node.instantiation_of.is_none() {
            return Ok(());
        }
        let Some(info) = self.registry.classes.get(&decl) else { return Ok(()) };
        let scope = info.scope;
        let init_scope = info.init_scope;
        let base_decl = info.base_decl;

        self.class_stack.push(decl);
        let out = self.scoped(scope, |this| {
            // Base constructor arguments resolve in the initializer
            // scope (they may use constructor parameters).
            if !node.base_args.is_empty() {
                let base_args = node.base_args.clone();
                let mut resolved_args = Vec::with_capacity(base_args.len());
                let mut arg_types = Vec::with_capacity(base_args.len());
                for arg in base_args {
                    let resolved =
                        this.scoped(init_scope, |inner| inner.resolve_expr(arg))?;
                    arg_types.push(this.registry.type_of(resolved));
                    resolved_args.push(resolved);
                }
                if let AnyNode::ClassDecl(class) = &mut this.ast[decl].data {
                    class.base_args = resolved_args;
                }
                if let Some(base_decl) = base_decl
                    && !this.registry.call_possible(&arg_types, base_decl)
                {
                    return Err(CompileError::Constructor {
                        class: crate::types::decl_name(this.ast, base_decl),
                        args: signature_to_string(this.ast, "", &arg_types),
                        loc: this.ast.loc(decl).clone(),
                    });
                }
            }

            for &member in &node.body {
                match this.ast[member].data.clone() {
                    AnyNode::FunctionDecl(_) | AnyNode::FiberDecl(_) => {
                        this.source_decl(member)?;
                    }
                    AnyNode::ConversionOperatorDecl(conv) => {
                        if this.decl_state(member) < ResolveState::Sourced {
                            this.set_decl_state(member, ResolveState::Sourced);
                            let target = this.resolve_type(conv.target_type)?;
                            let body_scope =
                                this.scopes.create(ScopeKind::Body, Some(scope));
                            let _ = this.registry.body_scopes.insert(member, body_scope);
                            this.return_stack.push(target);
                            let out = this.scoped(body_scope, |inner| {
                                if let Some(body) = conv.body {
                                    let resolved = inner.resolve_stmt(body)?;
                                    inner.replace_body(member, resolved);
                                }
                                Ok(())
                            });
                            let _ = this.return_stack.pop();
                            out?;
                        }
                    }
                    AnyNode::AssignmentOperatorDecl(assign) => {
                        if this.decl_state(member) < ResolveState::Sourced {
                            this.set_decl_state(member, ResolveState::Sourced);
                            let body_scope =
                                this.scopes.create(ScopeKind::Body, Some(scope));
                            let _ = this.registry.body_scopes.insert(member, body_scope);
                            let name = crate::types::decl_name(this.ast, assign.param);
                            let _ = this
                                .scopes
                                .get_mut(body_scope)
                                .add_variable(name, assign.param);
                            this.return_stack.push(Type::Empty);
                            let out = this.scoped(body_scope, |inner| {
                                if let Some(body) = assign.body {
                                    let resolved = inner.resolve_stmt(body)?;
                                    inner.replace_body(member, resolved);
                                }
                                Ok(())
                            });
                            let _ = this.return_stack.pop();
                            out?;
                        }
                    }
                    _ => {}
                }
            }
            Ok(())
        });
        let _ = self.class_stack.pop();
        out
    }

    /// Updates the resolved body slot of a declaration.
    fn replace_body(&mut self, decl: NodeId, body: NodeId) {
        match &mut self.ast[decl].data {
            AnyNode::FunctionDecl(node) => node.body = Some(body),
            AnyNode::FiberDecl(node) => node.body = Some(body),
            AnyNode::ProgramDecl(node) => node.body = Some(body),
            AnyNode::BinaryOperatorDecl(node) => node.body = Some(body),
            AnyNode::UnaryOperatorDecl(node) => node.body = Some(body),
            AnyNode::ConversionOperatorDecl(node) => node.body = Some(body),
            AnyNode::AssignmentOperatorDecl(node) => node.body = Some(body),
            _ => {}
        }
    }

    // ===============================================================
    // Statements
    // ===============================================================

    /// Resolves one statement, returning the (possibly rewritten)
    /// statement id.
    pub(crate) fn resolve_stmt(&mut self, id: NodeId) -> Result<NodeId, CompileError> {
        match self.ast[id].data.clone() {
            AnyNode::BracesStmt(mut node) => {
                let scope = self.scopes.create(ScopeKind::Block, Some(self.current_scope()));
                self.scoped(scope, |this| {
                    for stmt in &mut node.stmts {
                        *stmt = this.resolve_stmt(*stmt)?;
                    }
                    this.ast[id].data = AnyNode::BracesStmt(node.clone());
                    Ok(id)
                })
            }
            AnyNode::ExpressionStmt(node) => self.resolve_expression_stmt(id, node.expr),
            AnyNode::IfStmt(mut node) => {
                node.cond = self.resolve_expr(node.cond)?;
                self.check_condition(node.cond)?;
                node.then_block = self.resolve_stmt(node.then_block)?;
                if let Some(else_block) = node.else_block {
                    node.else_block = Some(self.resolve_stmt(else_block)?);
                }
                self.ast[id].data = AnyNode::IfStmt(node);
                Ok(id)
            }
            AnyNode::WhileStmt(mut node) => {
                node.cond = self.resolve_expr(node.cond)?;
                self.check_condition(node.cond)?;
                node.body = self.resolve_stmt(node.body)?;
                self.ast[id].data = AnyNode::WhileStmt(node);
                Ok(id)
            }
            AnyNode::DoWhileStmt(mut node) => {
                node.body = self.resolve_stmt(node.body)?;
                node.cond = self.resolve_expr(node.cond)?;
                self.check_condition(node.cond)?;
                self.ast[id].data = AnyNode::DoWhileStmt(node);
                Ok(id)
            }
            AnyNode::AssertStmt(mut node) => {
                node.cond = self.resolve_expr(node.cond)?;
                self.check_condition(node.cond)?;
                self.ast[id].data = AnyNode::AssertStmt(node);
                Ok(id)
            }
            AnyNode::ForStmt(node) => self.resolve_for(id, node),
            AnyNode::ReturnStmt(mut node) => {
                let loc = self.ast.loc(id).clone();
                let Some(expected) = self.return_stack.last().cloned() else {
                    return Err(CompileError::Return { loc });
                };
                match node.value {
                    Some(value) => {
                        let resolved = self.resolve_expr(value)?;
                        node.value = Some(resolved);
                        let found = self.registry.type_of(resolved);
                        if !self.registry.definitely(&found, &expected) {
                            return Err(CompileError::ReturnType {
                                expected: type_to_string(self.ast, &expected),
                                found: type_to_string(self.ast, &found),
                                loc,
                            });
                        }
                    }
                    None => {
                        if !expected.is_empty() {
                            return Err(CompileError::ReturnType {
                                expected: type_to_string(self.ast, &expected),
                                found: "()".to_string(),
                                loc,
                            });
                        }
                    }
                }
                self.ast[id].data = AnyNode::ReturnStmt(node);
                Ok(id)
            }
            AnyNode::YieldStmt(mut node) => {
                let loc = self.ast.loc(id).clone();
                let Some(expected) = self.yield_stack.last().cloned() else {
                    return Err(CompileError::Yield { loc });
                };
                let resolved = self.resolve_expr(node.value)?;
                node.value = resolved;
                let found = self.registry.type_of(resolved);
                if !self.registry.definitely(&found, &expected) {
                    return Err(CompileError::YieldType {
                        expected: type_to_string(self.ast, &expected),
                        found: type_to_string(self.ast, &found),
                        loc,
                    });
                }
                self.ast[id].data = AnyNode::YieldStmt(node);
                Ok(id)
            }
            AnyNode::RawStmt(_) | AnyNode::ImportStmt(_) => Ok(id),
            AnyNode::InstantiatedStmt(node) => {
                let _ = self.resolve_type(node.ty)?;
                Ok(id)
            }
            _ => {
                // An expression in statement position without a wrapper.
                let resolved = self.resolve_expr(id)?;
                Ok(resolved)
            }
        }
    }

    /// Resolves an expression statement, applying the statement-level
    /// rewrites: the `~` and `~>` sugars and the re-yield of fiber
    /// calls whose handle is discarded.
    fn resolve_expression_stmt(
        &mut self,
        id: NodeId,
        expr: NodeId,
    ) -> Result<NodeId, CompileError> {
        if let AnyNode::AssignExpr(assign) = self.ast[expr].data.clone() {
            // `x ~ d` becomes: if the random variable already has a
            // value, observe it against the distribution, otherwise
            // associate it.
            match assign.op {
                AssignOp::Distribute => {
                    let rewritten = self.rewrite_distribute(expr, &assign)?;
                    return self.resolve_stmt(rewritten);
                }
                AssignOp::Observe if !self.yield_stack.is_empty() => {
                    // Inside a fiber the observation's weight is yielded.
                    let loc = self.ast.loc(expr).clone();
                    let stmt = self.ast.alloc(YieldStmt { value: expr }, loc);
                    return self.resolve_stmt(stmt);
                }
                _ => {}
            }
        }

        let resolved = self.resolve_expr(expr)?;
        let ty = self.registry.substitute(&self.registry.type_of(resolved));

        // A fiber called for its side effects inside another fiber:
        // consume it and re-yield everything it yields.
        if !self.yield_stack.is_empty()
            && matches!(self.ast[resolved].data, AnyNode::CallExpr(_))
            && matches!(ty, Type::Fiber(_))
        {
            let rewritten = self.rewrite_fiber_consume(resolved)?;
            return self.resolve_stmt(rewritten);
        }

        self.ast[id].data = AnyNode::ExpressionStmt(ExpressionStmt { expr: resolved });
        Ok(id)
    }

    /// Rewrites `x ~ d` to
    /// `if (x?) { x! ~> d; } else { d.assume(x); }`.
    fn rewrite_distribute(
        &mut self,
        expr: NodeId,
        assign: &AssignExpr,
    ) -> Result<NodeId, CompileError> {
        let loc = self.ast.loc(expr).clone();

        let x_query = self.ast.clone_subtree(assign.left);
        let x_observe = self.ast.clone_subtree(assign.left);
        let d_observe = self.ast.clone_subtree(assign.right);
        let x_assume = assign.left;
        let d_assume = assign.right;

        let cond = self.ast.alloc(QueryExpr { operand: x_query }, loc.clone());

        let got = self.ast.alloc(GetExpr { operand: x_observe }, loc.clone());
        let observe = self.ast.alloc(
            AssignExpr { op: AssignOp::Observe, left: got, right: d_observe },
            loc.clone(),
        );
        let observe_stmt = self.ast.alloc(ExpressionStmt { expr: observe }, loc.clone());
        let then_block =
            self.ast.alloc(BracesStmt { stmts: vec![observe_stmt] }, loc.clone());

        let assume_name =
            self.ast.alloc(NamedExpr { name: "assume".to_string(), type_args: Vec::new() }, loc.clone());
        let assume_member =
            self.ast.alloc(MemberExpr { object: d_assume, member: assume_name }, loc.clone());
        let assume_call =
            self.ast.alloc(CallExpr { callee: assume_member, args: vec![x_assume] }, loc.clone());
        let assume_stmt = self.ast.alloc(ExpressionStmt { expr: assume_call }, loc.clone());
        let else_block =
            self.ast.alloc(BracesStmt { stmts: vec![assume_stmt] }, loc.clone());

        Ok(self
            .ast
            .alloc(IfStmt { cond, then_block, else_block: Some(else_block) }, loc))
    }

    /// Rewrites a discarded fiber call inside a fiber body to a loop
    /// that consumes the callee and re-yields its values:
    /// `{ auto f_ <- <call>; while (f_?) { yield f_!; } }`.
    fn rewrite_fiber_consume(&mut self, call: NodeId) -> Result<NodeId, CompileError> {
        let loc = self.ast.loc(call).clone();
        let name = format!("fiber_{}_", call.index());

        let local = self.ast.alloc(
            LocalVariableExpr {
                name: name.clone(),
                ty: None,
                brackets: Vec::new(),
                args: Vec::new(),
                value: Some(call),
                annotations: Annotations::AUTO,
            },
            loc.clone(),
        );
        let local_stmt = self.ast.alloc(ExpressionStmt { expr: local }, loc.clone());

        let query_ref =
            self.ast.alloc(NamedExpr { name: name.clone(), type_args: Vec::new() }, loc.clone());
        let cond = self.ast.alloc(QueryExpr { operand: query_ref }, loc.clone());

        let get_ref = self.ast.alloc(NamedExpr { name, type_args: Vec::new() }, loc.clone());
        let got = self.ast.alloc(GetExpr { operand: get_ref }, loc.clone());
        let yield_stmt = self.ast.alloc(YieldStmt { value: got }, loc.clone());
        let while_body = self.ast.alloc(BracesStmt { stmts: vec![yield_stmt] }, loc.clone());
        let while_stmt = self.ast.alloc(WhileStmt { cond, body: while_body }, loc.clone());

        Ok(self
            .ast
            .alloc(BracesStmt { stmts: vec![local_stmt, while_stmt] }, loc))
    }

    fn resolve_for(
        &mut self,
        id: NodeId,
        mut node: bine_ast::nodes::ForStmt,
    ) -> Result<NodeId, CompileError> {
        let scope = self.scopes.create(ScopeKind::Block, Some(self.current_scope()));
        self.scoped(scope, |this| {
            node.range = this.resolve_expr(node.range)?;
            let range_ty = this.registry.type_of(node.range);
            let loc = this.ast.loc(node.range).clone();
            let integer = this.basic_type("Integer", &loc)?;
            if !this.registry.definitely(&range_ty, &Type::Sequence(Box::new(integer.clone())))
            {
                return Err(CompileError::Index {
                    ty: type_to_string(this.ast, &range_ty),
                    loc,
                });
            }

            // The index variable: declared Integer-compatible, or auto.
            if let AnyNode::LocalVariableExpr(index) = this.ast[node.index].data.clone() {
                let index_ty = match index.ty {
                    Some(ty) => this.resolve_type(ty)?,
                    None => integer.clone(),
                };
                if !this.registry.definitely(&integer, &index_ty) {
                    return Err(CompileError::Index {
                        ty: type_to_string(this.ast, &index_ty),
                        loc: this.ast.loc(node.index).clone(),
                    });
                }
                let _ = this.registry.var_types.insert(node.index, index_ty.clone());
                this.registry.set_type(node.index, index_ty);
                if let Err(previous) = this
                    .scopes
                    .get_mut(scope)
                    .add_variable(index.name.clone(), node.index)
                {
                    return Err(CompileError::PreviousDeclaration {
                        name: index.name,
                        loc: this.ast.loc(node.index).clone(),
                        previous: this.ast.loc(previous).clone(),
                    });
                }
            }

            node.body = this.resolve_stmt(node.body)?;
            this.ast[id].data = AnyNode::ForStmt(node.clone());
            Ok(id)
        })
    }

    /// Requires a Boolean condition.
    fn check_condition(&mut self, cond: NodeId) -> Result<(), CompileError> {
        let ty = self.registry.type_of(cond);
        let loc = self.ast.loc(cond).clone();
        let boolean = self.basic_type("Boolean", &loc)?;
        if self.registry.definitely(&ty, &boolean) {
            Ok(())
        } else {
            Err(CompileError::Condition { ty: type_to_string(self.ast, &ty), loc })
        }
    }

    // ===============================================================
    // Expressions
    // ===============================================================

    /// Resolves one expression, returning the (possibly replaced)
    /// expression id and recording its type.
    pub(crate) fn resolve_expr(&mut self, id: NodeId) -> Result<NodeId, CompileError> {
        match self.ast[id].data.clone() {
            AnyNode::LiteralExpr(node) => {
                let loc = self.ast.loc(id).clone();
                let ty = match node.value {
                    Literal::Bool(_) => self.basic_type("Boolean", &loc)?,
                    Literal::Int(_) => self.basic_type("Integer", &loc)?,
                    Literal::Real(_) => self.basic_type("Real", &loc)?,
                    Literal::Str(_) => self.basic_type("String", &loc)?,
                };
                self.registry.set_type(id, ty);
                Ok(id)
            }
            AnyNode::NamedExpr(node) => self.resolve_name(id, &node),
            AnyNode::VarRef(node) => {
                let ty = self.registry.var_types.get(&node.target).cloned().unwrap_or_default();
                self.registry.set_type(id, ty);
                Ok(id)
            }
            AnyNode::OverloadedRef(_) | AnyNode::NamedType(_) => Ok(id),
            AnyNode::CallExpr(node) => self.resolve_call(id, node),
            AnyNode::BinaryCallExpr(mut node) => {
                node.left = self.resolve_expr(node.left)?;
                node.right = self.resolve_expr(node.right)?;
                let args =
                    vec![self.registry.type_of(node.left), self.registry.type_of(node.right)];
                let loc = self.ast.loc(id).clone();
                let (target, ret) = self.select_operator(
                    OverloadKind::BinaryOperator,
                    &node.name,
                    &args,
                    &loc,
                )?;
                node.target = Some(target);
                self.registry.set_type(id, ret);
                self.ast[id].data = AnyNode::BinaryCallExpr(node);
                Ok(id)
            }
            AnyNode::UnaryCallExpr(mut node) => {
                node.operand = self.resolve_expr(node.operand)?;
                let args = vec![self.registry.type_of(node.operand)];
                let loc = self.ast.loc(id).clone();
                let (target, ret) = self.select_operator(
                    OverloadKind::UnaryOperator,
                    &node.name,
                    &args,
                    &loc,
                )?;
                node.target = Some(target);
                self.registry.set_type(id, ret);
                self.ast[id].data = AnyNode::UnaryCallExpr(node);
                Ok(id)
            }
            AnyNode::AssignExpr(node) => self.resolve_assign(id, node),
            AnyNode::MemberExpr(mut node) => {
                node.object = self.resolve_expr(node.object)?;
                let object_ty = self.registry.substitute(&self.registry.type_of(node.object));
                node.member = self.resolve_member(node.member, &object_ty)?;
                let ty = self.registry.type_of(node.member);
                self.registry.set_type(id, ty);
                self.ast[id].data = AnyNode::MemberExpr(node);
                Ok(id)
            }
            AnyNode::GlobalExpr(mut node) => {
                node.member = self.resolve_in_root(node.member)?;
                let ty = self.registry.type_of(node.member);
                self.registry.set_type(id, ty);
                self.ast[id].data = AnyNode::GlobalExpr(node);
                Ok(id)
            }
            AnyNode::ThisExpr(_) => {
                let loc = self.ast.loc(id).clone();
                let Some(&class) = self.class_stack.last() else {
                    return Err(CompileError::This { loc });
                };
                self.registry.set_type(id, Type::Class { decl: class, args: Vec::new() });
                Ok(id)
            }
            AnyNode::SuperExpr(_) => {
                let loc = self.ast.loc(id).clone();
                let Some(&class) = self.class_stack.last() else {
                    return Err(CompileError::Super { loc });
                };
                let base = self
                    .registry
                    .classes
                    .get(&class)
                    .and_then(|info| info.base.clone());
                let Some(base) = base else {
                    return Err(CompileError::SuperBase { loc });
                };
                self.registry.set_type(id, base);
                Ok(id)
            }
            AnyNode::NilExpr(_) => {
                self.registry.set_type(id, Type::Nil);
                Ok(id)
            }
            AnyNode::QueryExpr(mut node) => {
                node.operand = self.resolve_expr(node.operand)?;
                let ty = self.registry.substitute(&self.registry.type_of(node.operand));
                let loc = self.ast.loc(id).clone();
                match ty {
                    Type::Optional(_) | Type::Fiber(_) => {
                        let boolean = self.basic_type("Boolean", &loc)?;
                        self.registry.set_type(id, boolean);
                        self.ast[id].data = AnyNode::QueryExpr(node);
                        Ok(id)
                    }
                    // A class converting to an optional queries like one.
                    other if self.registry.optional_conversion(&other).is_some() => {
                        let boolean = self.basic_type("Boolean", &loc)?;
                        self.registry.set_type(id, boolean);
                        self.ast[id].data = AnyNode::QueryExpr(node);
                        Ok(id)
                    }
                    other => Err(CompileError::Query {
                        ty: type_to_string(self.ast, &other),
                        loc,
                    }),
                }
            }
            AnyNode::GetExpr(mut node) => {
                node.operand = self.resolve_expr(node.operand)?;
                let ty = self.registry.substitute(&self.registry.type_of(node.operand));
                let loc = self.ast.loc(id).clone();
                match ty {
                    Type::Optional(inner) | Type::Fiber(inner) => {
                        self.registry.set_type(id, *inner);
                        self.ast[id].data = AnyNode::GetExpr(node);
                        Ok(id)
                    }
                    other => match self.registry.optional_conversion(&other) {
                        Some(inner) => {
                            self.registry.set_type(id, inner);
                            self.ast[id].data = AnyNode::GetExpr(node);
                            Ok(id)
                        }
                        None => Err(CompileError::Get {
                            ty: type_to_string(self.ast, &other),
                            loc,
                        }),
                    },
                }
            }
            AnyNode::CastExpr(mut node) => {
                node.object = self.resolve_expr(node.object)?;
                let ty = self.registry.substitute(&self.registry.type_of(node.object));
                let loc = self.ast.loc(id).clone();
                if !ty.is_pointer_like() {
                    return Err(CompileError::Cast {
                        ty: type_to_string(self.ast, &ty),
                        loc,
                    });
                }
                let target = self.resolve_type(node.target_type)?;
                if target.class_decl().is_none() {
                    return Err(CompileError::Cast {
                        ty: type_to_string(self.ast, &target),
                        loc,
                    });
                }
                self.registry.set_type(id, Type::Optional(Box::new(target)));
                self.ast[id].data = AnyNode::CastExpr(node);
                Ok(id)
            }
            AnyNode::SliceExpr(node) => self.resolve_slice(id, node),
            AnyNode::RangeExpr(mut node) => {
                node.left = self.resolve_expr(node.left)?;
                node.right = self.resolve_expr(node.right)?;
                let loc = self.ast.loc(id).clone();
                let integer = self.basic_type("Integer", &loc)?;
                for end in [node.left, node.right] {
                    let ty = self.registry.type_of(end);
                    if !self.registry.definitely(&ty, &integer) {
                        return Err(CompileError::Index {
                            ty: type_to_string(self.ast, &ty),
                            loc: self.ast.loc(end).clone(),
                        });
                    }
                }
                self.registry.set_type(id, Type::Sequence(Box::new(integer)));
                self.ast[id].data = AnyNode::RangeExpr(node);
                Ok(id)
            }
            AnyNode::ParenthesesExpr(mut node) => {
                node.inner = self.resolve_expr(node.inner)?;
                for rest in &mut node.rest {
                    *rest = self.resolve_expr(*rest)?;
                }
                let ty = if node.rest.is_empty() {
                    self.registry.type_of(node.inner)
                } else {
                    let mut elements = vec![self.registry.type_of(node.inner)];
                    elements.extend(node.rest.iter().map(|r| self.registry.type_of(*r)));
                    Type::Tuple(elements)
                };
                self.registry.set_type(id, ty);
                self.ast[id].data = AnyNode::ParenthesesExpr(node);
                Ok(id)
            }
            AnyNode::SequenceExpr(mut node) => {
                let loc = self.ast.loc(id).clone();
                let mut element: Option<Type> = None;
                for item in &mut node.elements {
                    *item = self.resolve_expr(*item)?;
                    let ty = self.registry.type_of(*item);
                    element = match element {
                        None => Some(ty),
                        Some(current) => {
                            let Some(common) = self.registry.common(&current, &ty) else {
                                return Err(CompileError::Sequence { loc });
                            };
                            Some(common)
                        }
                    };
                }
                let element = element.unwrap_or(Type::Empty);
                self.registry.set_type(id, Type::Sequence(Box::new(element)));
                self.ast[id].data = AnyNode::SequenceExpr(node);
                Ok(id)
            }
            AnyNode::LambdaExpr(mut node) => {
                let scope = self.scopes.create(ScopeKind::Body, Some(self.current_scope()));
                let mut params = Vec::with_capacity(node.params.len());
                for &param in &node.params {
                    let ty = self.scoped(scope, |this| this.parameter_type(param))?;
                    let _ = self.registry.var_types.insert(param, ty.clone());
                    params.push(ty);
                    let name = crate::types::decl_name(self.ast, param);
                    if let Err(previous) =
                        self.scopes.get_mut(scope).add_variable(name.clone(), param)
                    {
                        return Err(CompileError::PreviousDeclaration {
                            name,
                            loc: self.ast.loc(param).clone(),
                            previous: self.ast.loc(previous).clone(),
                        });
                    }
                }
                let ret = match node.return_type {
                    Some(ret) => self.scoped(scope, |this| this.resolve_type(ret))?,
                    None => Type::Empty,
                };

                // A lambda is an opaque function context: it opens its
                // own return context and closes over no yield context.
                self.return_stack.push(ret.clone());
                let saved_yields = std::mem::take(&mut self.yield_stack);
                let out = self.scoped(scope, |this| this.resolve_stmt(node.body));
                self.yield_stack = saved_yields;
                let _ = self.return_stack.pop();
                node.body = out?;

                self.registry
                    .set_type(id, Type::Function { params, ret: Box::new(ret) });
                self.ast[id].data = AnyNode::LambdaExpr(node);
                Ok(id)
            }
            AnyNode::LocalVariableExpr(node) => self.resolve_local(id, node),
            AnyNode::ParameterDecl(_) => {
                let ty = self.parameter_type(id)?;
                self.registry.set_type(id, ty);
                Ok(id)
            }
            _ => Ok(id),
        }
    }

    /// Resolves a local variable declaration in expression position.
    fn resolve_local(
        &mut self,
        id: NodeId,
        mut node: LocalVariableExpr,
    ) -> Result<NodeId, CompileError> {
        let loc = self.ast.loc(id).clone();

        let mut ty = match node.ty {
            Some(t) => self.resolve_type(t)?,
            None => Type::Unknown,
        };

        let integer = if node.brackets.is_empty() {
            None
        } else {
            Some(self.basic_type("Integer", &loc)?)
        };
        for bracket in &mut node.brackets {
            *bracket = self.resolve_expr(*bracket)?;
            let bty = self.registry.type_of(*bracket);
            if let Some(integer) = &integer
                && !self.registry.definitely(&bty, integer)
            {
                return Err(CompileError::Index {
                    ty: type_to_string(self.ast, &bty),
                    loc: self.ast.loc(*bracket).clone(),
                });
            }
        }
        if !node.brackets.is_empty() {
            ty = Type::Array { element: Box::new(ty), dims: node.brackets.len() };
        }

        let mut arg_types = Vec::with_capacity(node.args.len());
        for arg in &mut node.args {
            *arg = self.resolve_expr(*arg)?;
            arg_types.push(self.registry.type_of(*arg));
        }
        if !node.args.is_empty() {
            let Some(class_decl) = self.registry.substitute(&ty).class_decl() else {
                return Err(CompileError::Constructor {
                    class: type_to_string(self.ast, &ty),
                    args: signature_to_string(self.ast, "", &arg_types),
                    loc,
                });
            };
            if !self.registry.call_possible(&arg_types, class_decl) {
                return Err(CompileError::Constructor {
                    class: crate::types::decl_name(self.ast, class_decl),
                    args: signature_to_string(self.ast, "", &arg_types),
                    loc,
                });
            }
            self.check_constructible(class_decl, &loc)?;
        }

        if let Some(value) = node.value {
            let resolved = self.resolve_expr(value)?;
            node.value = Some(resolved);
            let vty = self.registry.type_of(resolved);
            if node.annotations.contains(Annotations::AUTO) {
                ty = vty;
            } else if !self.assignable(&vty, &ty) {
                return Err(CompileError::InitialValue {
                    declared: type_to_string(self.ast, &ty),
                    value: type_to_string(self.ast, &vty),
                    loc,
                });
            }
        }

        // A plain class-typed local without an initializer is
        // default-constructed, so its class must be concrete.
        if node.value.is_none()
            && node.args.is_empty()
            && node.brackets.is_empty()
            && let Type::Class { decl, .. } = self.registry.substitute(&ty)
        {
            self.check_constructible(decl, &loc)?;
        }

        let scope = self.current_scope();
        if let Err(previous) = self.scopes.get_mut(scope).add_variable(node.name.clone(), id) {
            return Err(CompileError::PreviousDeclaration {
                name: node.name.clone(),
                loc,
                previous: self.ast.loc(previous).clone(),
            });
        }

        let _ = self.registry.var_types.insert(id, ty.clone());
        self.registry.set_type(id, ty);
        self.ast[id].data = AnyNode::LocalVariableExpr(node);
        Ok(id)
    }

    /// Resolves an assignment, rewriting the probabilistic sugars.
    fn resolve_assign(
        &mut self,
        id: NodeId,
        node: AssignExpr,
    ) -> Result<NodeId, CompileError> {
        let loc = self.ast.loc(id).clone();
        match node.op {
            AssignOp::Assign => {
                let left = self.resolve_expr(node.left)?;
                let right = self.resolve_expr(node.right)?;

                if !self.is_assignable_target(left) {
                    return Err(CompileError::NotAssignable { loc });
                }

                let lty = self.registry.type_of(left);
                let rty = self.registry.type_of(right);
                if !self.assignable(&rty, &lty) {
                    return Err(CompileError::Assignment {
                        left: type_to_string(self.ast, &lty),
                        right: type_to_string(self.ast, &rty),
                        loc,
                    });
                }

                self.registry.set_type(id, lty);
                self.ast[id].data =
                    AnyNode::AssignExpr(AssignExpr { op: AssignOp::Assign, left, right });
                Ok(id)
            }
            AssignOp::Simulate => {
                // `x <~ d` becomes `x <- d.simulate()`.
                let simulate = self.ast.alloc(
                    NamedExpr { name: "simulate".to_string(), type_args: Vec::new() },
                    loc.clone(),
                );
                let member = self
                    .ast
                    .alloc(MemberExpr { object: node.right, member: simulate }, loc.clone());
                let call =
                    self.ast.alloc(CallExpr { callee: member, args: Vec::new() }, loc.clone());
                let assign = self.ast.alloc(
                    AssignExpr { op: AssignOp::Assign, left: node.left, right: call },
                    loc,
                );
                self.resolve_expr(assign)
            }
            AssignOp::Observe => {
                // `x ~> d` becomes `d.observe(x)`.
                let observe = self.ast.alloc(
                    NamedExpr { name: "observe".to_string(), type_args: Vec::new() },
                    loc.clone(),
                );
                let member = self
                    .ast
                    .alloc(MemberExpr { object: node.right, member: observe }, loc.clone());
                let call = self
                    .ast
                    .alloc(CallExpr { callee: member, args: vec![node.left] }, loc);
                self.resolve_expr(call)
            }
            AssignOp::Distribute => {
                // Only meaningful in statement position, where it is
                // rewritten before resolution reaches here.
                Err(CompileError::NotAssignable { loc })
            }
        }
    }

    /// True when an expression may stand on the left of an assignment.
    fn is_assignable_target(&self, id: NodeId) -> bool {
        match &self.ast[id].data {
            AnyNode::VarRef(_) | AnyNode::SliceExpr(_) | AnyNode::GetExpr(_) => true,
            AnyNode::MemberExpr(node) => self.is_assignable_target(node.member),
            AnyNode::GlobalExpr(node) => self.is_assignable_target(node.member),
            AnyNode::ParenthesesExpr(node) => {
                node.rest.is_empty() && self.is_assignable_target(node.inner)
            }
            _ => false,
        }
    }

    /// Rejects construction of an abstract class.
    pub(crate) fn check_constructible(
        &self,
        decl: NodeId,
        loc: &Location,
    ) -> Result<(), CompileError> {
        if let AnyNode::ClassDecl(class) = &self.ast[decl].data
            && class.annotations.contains(Annotations::ABSTRACT)
        {
            return Err(CompileError::AbstractConstructor {
                class: class.name.clone(),
                loc: loc.clone(),
            });
        }
        Ok(())
    }

    /// The assignability rule: the value flows to the target, or the
    /// target is a class with a matching assignment operator.
    pub(crate) fn assignable(&self, value: &Type, target: &Type) -> bool {
        if self.registry.definitely(value, target) {
            return true;
        }
        self.registry
            .substitute(target)
            .class_decl()
            .is_some_and(|decl| self.registry.has_assignment(decl, value))
    }

    // ===============================================================
    // Name and member resolution
    // ===============================================================

    /// Resolves an identifier in the scope chain, replacing it with the
    /// resolved node form for the kind of declaration found.
    fn resolve_name(
        &mut self,
        id: NodeId,
        node: &NamedExpr,
    ) -> Result<NodeId, CompileError> {
        let found = self.stack_find(|scope| Self::find_in_scope(scope, &node.name));
        let Some(found) = found else {
            return Err(CompileError::UnresolvedReference {
                name: node.name.clone(),
                loc: self.ast.loc(id).clone(),
            });
        };
        self.found_to_node(id, node, found)
    }

    /// Resolves an identifier against the root scope only (`global::x`).
    fn resolve_in_root(&mut self, id: NodeId) -> Result<NodeId, CompileError> {
        let AnyNode::NamedExpr(node) = self.ast[id].data.clone() else {
            return self.resolve_expr(id);
        };
        let root = self.scopes.root();
        let found = self.scope_find(root, &|scope| Self::find_in_scope(scope, &node.name));
        let Some(found) = found else {
            return Err(CompileError::UnresolvedReference {
                name: node.name.clone(),
                loc: self.ast.loc(id).clone(),
            });
        };
        self.found_to_node(id, &node, found)
    }

    /// Resolves a member identifier in the scope of the object's class.
    fn resolve_member(
        &mut self,
        member: NodeId,
        object_ty: &Type,
    ) -> Result<NodeId, CompileError> {
        let AnyNode::NamedExpr(node) = self.ast[member].data.clone() else {
            return Ok(member); // Already resolved.
        };
        let loc = self.ast.loc(member).clone();

        let Type::Class { decl, .. } = object_ty else {
            return Err(CompileError::Member {
                ty: type_to_string(self.ast, object_ty),
                loc,
            });
        };
        let Some(info) = self.registry.classes.get(decl) else {
            return Err(CompileError::Member {
                ty: type_to_string(self.ast, object_ty),
                loc,
            });
        };
        let scope = info.scope;

        let found = self.scope_find(scope, &|s| Self::find_in_scope(s, &node.name));
        let Some(found) = found else {
            return Err(CompileError::UnresolvedReference { name: node.name.clone(), loc });
        };
        self.found_to_node(member, &node, found)
    }

    /// One scope's view of a name: variables shadow overloads, which
    /// shadow types.
    fn find_in_scope(scope: &Scope, name: &str) -> Option<Found> {
        if let Some(var) = scope.find_variable(name) {
            return Some(Found::Var(var));
        }
        for kind in [
            OverloadKind::Function,
            OverloadKind::Fiber,
            OverloadKind::MemberFunction,
            OverloadKind::MemberFiber,
        ] {
            if scope.has_overloaded(kind, name) {
                return Some(Found::Overload(kind, scope.id));
            }
        }
        scope.find_type(name).map(Found::TypeDecl)
    }

    /// Builds the resolved node for a lookup result.
    fn found_to_node(
        &mut self,
        id: NodeId,
        node: &NamedExpr,
        found: Found,
    ) -> Result<NodeId, CompileError> {
        let loc = self.ast.loc(id).clone();
        match found {
            Found::Var(target) => {
                let kind = self.var_kind(target);
                let ty = self.registry.var_types.get(&target).cloned().unwrap_or_default();
                let new = self.ast.alloc(
                    VarRef { name: node.name.clone(), kind, target },
                    loc,
                );
                self.registry.set_type(new, ty);
                Ok(new)
            }
            Found::Overload(kind, scope) => {
                let new = self.ast.alloc(
                    OverloadedRef {
                        name: node.name.clone(),
                        kind,
                        type_args: node.type_args.clone(),
                        target: None,
                    },
                    loc,
                );
                // A bare reference to a single overload has a function
                // type; anything else is pinned down at the call.
                let single = self
                    .scopes
                    .get(scope)
                    .overloaded(kind, &node.name)
                    .filter(|set| set.len() == 1)
                    .and_then(|set| set.iter().next().copied());
                if let Some(decl) = single
                    && let (Some(params), Some(ret)) = (
                        self.registry.signatures.get(&decl).cloned(),
                        self.registry.returns.get(&decl).cloned(),
                    )
                {
                    self.registry
                        .set_type(new, Type::Function { params, ret: Box::new(ret) });
                }
                Ok(new)
            }
            Found::TypeDecl(_) => {
                // A type used as an expression: a constructor callee or
                // similar. Replace with a named type node and resolve it.
                let new = self.ast.alloc(
                    NamedType {
                        name: node.name.clone(),
                        type_args: node.type_args.clone(),
                        target: None,
                    },
                    loc,
                );
                let ty = self.resolve_type(new)?;
                self.registry.set_type(new, ty);
                Ok(new)
            }
        }
    }

    /// The variable kind of a resolved target.
    fn var_kind(&self, target: NodeId) -> VarKind {
        match &self.ast[target].data {
            AnyNode::ParameterDecl(_) => VarKind::Parameter,
            AnyNode::LocalVariableExpr(_) => VarKind::Local,
            AnyNode::MemberVariableDecl(_) => VarKind::Member,
            _ => VarKind::Global,
        }
    }

    // ===============================================================
    // Calls
    // ===============================================================

    /// Resolves a call: arguments first, then the callee by its form
    /// (overloaded name, member, constructor, or function value).
    fn resolve_call(
        &mut self,
        id: NodeId,
        mut node: CallExpr,
    ) -> Result<NodeId, CompileError> {
        let loc = self.ast.loc(id).clone();

        let mut args = Vec::with_capacity(node.args.len());
        for arg in &mut node.args {
            *arg = self.resolve_expr(*arg)?;
            args.push(self.registry.type_of(*arg));
        }

        // A call whose callee already carries its target (rewrites may
        // re-resolve a resolved subtree) keeps its meaning.
        if let Some(target) = self.resolved_callee_target(node.callee) {
            let ret = self.registry.returns.get(&target).cloned().unwrap_or_default();
            self.registry.set_type(id, self.registry.substitute(&ret));
            self.ast[id].data = AnyNode::CallExpr(node);
            return Ok(id);
        }

        match self.ast[node.callee].data.clone() {
            AnyNode::NamedExpr(callee) => {
                let found =
                    self.stack_find(|scope| Self::find_in_scope(scope, &callee.name));
                match found {
                    Some(Found::Overload(kind, scope)) => {
                        let (target, ret) = self.select_overload(
                            scope,
                            kind,
                            &callee.name,
                            &args,
                            &callee.type_args,
                            &loc,
                        )?;
                        let new_callee = self.ast.alloc(
                            OverloadedRef {
                                name: callee.name.clone(),
                                kind,
                                type_args: callee.type_args.clone(),
                                target: Some(target),
                            },
                            self.ast.loc(node.callee).clone(),
                        );
                        node.callee = new_callee;
                        self.registry.set_type(id, ret);
                        self.ast[id].data = AnyNode::CallExpr(node);
                        Ok(id)
                    }
                    Some(Found::TypeDecl(_)) => {
                        self.resolve_constructor(id, node, &callee, &args, &loc)
                    }
                    Some(Found::Var(_)) => {
                        node.callee = self.resolve_expr(node.callee)?;
                        self.resolve_function_value_call(id, node, &args, &loc)
                    }
                    None => Err(CompileError::UnresolvedReference {
                        name: callee.name.clone(),
                        loc,
                    }),
                }
            }
            AnyNode::MemberExpr(mut callee) => {
                callee.object = self.resolve_expr(callee.object)?;
                let object_ty =
                    self.registry.substitute(&self.registry.type_of(callee.object));

                // Resolve the member name against the class scope; for
                // an overloaded member the call picks the target.
                if let AnyNode::NamedExpr(member) = self.ast[callee.member].data.clone() {
                    let Some(class_decl) = object_ty.class_decl() else {
                        return Err(CompileError::Member {
                            ty: type_to_string(self.ast, &object_ty),
                            loc,
                        });
                    };
                    // A member access through an optional or weak
                    // wrapper needs an explicit get first.
                    if !object_ty.is_class() {
                        return Err(CompileError::Member {
                            ty: type_to_string(self.ast, &object_ty),
                            loc,
                        });
                    }
                    let Some(info) = self.registry.classes.get(&class_decl) else {
                        return Err(CompileError::Member {
                            ty: type_to_string(self.ast, &object_ty),
                            loc,
                        });
                    };
                    let class_scope = info.scope;
                    let found = self
                        .scope_find(class_scope, &|s| Self::find_in_scope(s, &member.name));
                    match found {
                        Some(Found::Overload(kind, scope)) => {
                            let (target, ret) = self.select_overload(
                                scope,
                                kind,
                                &member.name,
                                &args,
                                &member.type_args,
                                &loc,
                            )?;
                            let new_member = self.ast.alloc(
                                OverloadedRef {
                                    name: member.name.clone(),
                                    kind,
                                    type_args: member.type_args.clone(),
                                    target: Some(target),
                                },
                                self.ast.loc(callee.member).clone(),
                            );
                            callee.member = new_member;
                            self.ast[node.callee].data = AnyNode::MemberExpr(callee);
                            self.registry.set_type(id, ret);
                            self.ast[id].data = AnyNode::CallExpr(node);
                            Ok(id)
                        }
                        Some(Found::Var(_)) => {
                            callee.member = self.resolve_member(callee.member, &object_ty)?;
                            let member_ty = self.registry.type_of(callee.member);
                            self.registry.set_type(node.callee, member_ty);
                            self.ast[node.callee].data = AnyNode::MemberExpr(callee);
                            self.resolve_function_value_call(id, node, &args, &loc)
                        }
                        _ => Err(CompileError::UnresolvedReference {
                            name: member.name.clone(),
                            loc,
                        }),
                    }
                } else {
                    node.callee = self.resolve_expr(node.callee)?;
                    self.resolve_function_value_call(id, node, &args, &loc)
                }
            }
            _ => {
                node.callee = self.resolve_expr(node.callee)?;
                // A constructor call through an already-resolved type
                // node keeps its meaning on re-resolution.
                if let AnyNode::NamedType(_) = self.ast[node.callee].data {
                    let ty = self.registry.type_of(node.callee);
                    self.registry.set_type(id, ty);
                    self.ast[id].data = AnyNode::CallExpr(node);
                    return Ok(id);
                }
                self.resolve_function_value_call(id, node, &args, &loc)
            }
        }
    }

    /// The already-selected target of a resolved callee, if any.
    fn resolved_callee_target(&self, callee: NodeId) -> Option<NodeId> {
        match &self.ast[callee].data {
            AnyNode::OverloadedRef(node) => node.target,
            AnyNode::MemberExpr(node) => match &self.ast[node.member].data {
                AnyNode::OverloadedRef(member) => member.target,
                _ => None,
            },
            _ => None,
        }
    }

    /// Resolves a constructor call `ClassName(args)`, inferring generic
    /// arguments from the argument types when not explicit.
    fn resolve_constructor(
        &mut self,
        id: NodeId,
        mut node: CallExpr,
        callee: &NamedExpr,
        args: &[Type],
        loc: &Location,
    ) -> Result<NodeId, CompileError> {
        let new_callee = self.ast.alloc(
            NamedType {
                name: callee.name.clone(),
                type_args: callee.type_args.clone(),
                target: None,
            },
            self.ast.loc(node.callee).clone(),
        );

        // An un-parameterised reference to a generic class infers its
        // arguments from the constructor argument types.
        let mut ty = if callee.type_args.is_empty() {
            let target = self
                .stack_find(|scope| scope.find_type(&callee.name))
                .ok_or_else(|| CompileError::UnresolvedReference {
                    name: callee.name.clone(),
                    loc: loc.clone(),
                })?;
            if let AnyNode::ClassDecl(class) = self.ast[target].data.clone()
                && !class.type_params.is_empty()
                && class.instantiation_of.is_none()
            {
                let params: Vec<Type> = class
                    .params
                    .iter()
                    .map(|p| self.registry.var_types.get(p).cloned().unwrap_or_default())
                    .collect();
                let Some(inferred) =
                    self.infer_generic_args(&class.type_params, &params, args)
                else {
                    return Err(CompileError::Constructor {
                        class: callee.name.clone(),
                        args: signature_to_string(self.ast, "", args),
                        loc: loc.clone(),
                    });
                };
                let inst = self.instantiate(target, inferred.clone(), loc)?;
                if let AnyNode::NamedType(named) = &mut self.ast[new_callee].data {
                    named.target = Some(inst);
                }
                Type::Class { decl: inst, args: inferred }
            } else {
                self.resolve_type(new_callee)?
            }
        } else {
            self.resolve_type(new_callee)?
        };

        ty = self.registry.substitute(&ty);
        let Some(class_decl) = ty.class_decl() else {
            return Err(CompileError::Constructor {
                class: callee.name.clone(),
                args: signature_to_string(self.ast, "", args),
                loc: loc.clone(),
            });
        };
        self.check_constructible(class_decl, loc)?;
        if !self.registry.call_possible(args, class_decl) {
            return Err(CompileError::Constructor {
                class: callee.name.clone(),
                args: signature_to_string(self.ast, "", args),
                loc: loc.clone(),
            });
        }

        self.registry.set_type(new_callee, ty.clone());
        node.callee = new_callee;
        self.registry.set_type(id, ty);
        self.ast[id].data = AnyNode::CallExpr(node);
        Ok(id)
    }

    /// Resolves a call through a function-typed value (a lambda
    /// parameter, a function-typed member, and so on).
    fn resolve_function_value_call(
        &mut self,
        id: NodeId,
        node: CallExpr,
        args: &[Type],
        loc: &Location,
    ) -> Result<NodeId, CompileError> {
        let callee_ty = self.registry.substitute(&self.registry.type_of(node.callee));
        let Type::Function { params, ret } = callee_ty else {
            return Err(CompileError::Call {
                kind: "function".to_string(),
                call: signature_to_string(self.ast, "<value>", args),
                loc: loc.clone(),
                candidates: Vec::new(),
            });
        };
        if params.len() != args.len()
            || !args.iter().zip(&params).all(|(a, p)| self.registry.definitely(a, p))
        {
            return Err(CompileError::Call {
                kind: "function".to_string(),
                call: signature_to_string(self.ast, "<value>", args),
                loc: loc.clone(),
                candidates: Vec::new(),
            });
        }
        self.registry.set_type(id, *ret);
        self.ast[id].data = AnyNode::CallExpr(node);
        Ok(id)
    }

    /// Selects the most-specific overload for a call from the set at
    /// the given scope, instantiating generic targets.
    fn select_overload(
        &mut self,
        scope: ScopeId,
        kind: OverloadKind,
        name: &str,
        args: &[Type],
        type_args: &[NodeId],
        loc: &Location,
    ) -> Result<(NodeId, Type), CompileError> {
        let matches = {
            let registry = &self.registry;
            let Some(set) = self.scopes.get(scope).overloaded(kind, name) else {
                return Err(CompileError::UnresolvedReference {
                    name: name.to_string(),
                    loc: loc.clone(),
                });
            };
            // The probe walk recolours vertices; work on a copy so the
            // stored set keeps clean colours.
            let mut set = set.clone();
            set.match_most_specific(&mut |decl| registry.call_possible(args, decl))
        };

        match matches.len() {
            1 => {
                let mut target = matches[0];

                // A generic target instantiates with explicit arguments
                // or with arguments inferred from the call.
                let (type_params, is_template) = match &self.ast[target].data {
                    AnyNode::FunctionDecl(f) => {
                        (f.type_params.clone(), f.instantiation_of.is_none())
                    }
                    AnyNode::FiberDecl(f) => {
                        (f.type_params.clone(), f.instantiation_of.is_none())
                    }
                    _ => (Vec::new(), false),
                };
                if !type_params.is_empty() && is_template {
                    let bound = if type_args.is_empty() {
                        let params = self
                            .registry
                            .signatures
                            .get(&target)
                            .cloned()
                            .unwrap_or_default();
                        self.infer_generic_args(&type_params, &params, args)
                    } else {
                        let mut bound = Vec::with_capacity(type_args.len());
                        for &arg in type_args {
                            bound.push(self.resolve_type(arg)?);
                        }
                        Some(bound)
                    };
                    let Some(bound) = bound.filter(|b| b.len() == type_params.len()) else {
                        return Err(CompileError::Call {
                            kind: kind.to_string(),
                            call: signature_to_string(self.ast, name, args),
                            loc: loc.clone(),
                            candidates: self.candidates(scope, kind, name),
                        });
                    };
                    target = self.instantiate(target, bound, loc)?;
                }

                let ret = self
                    .registry
                    .returns
                    .get(&target)
                    .cloned()
                    .unwrap_or_default();
                Ok((target, self.registry.substitute(&ret)))
            }
            0 => Err(CompileError::Call {
                kind: kind.to_string(),
                call: signature_to_string(self.ast, name, args),
                loc: loc.clone(),
                candidates: self.candidates(scope, kind, name),
            }),
            _ => Err(CompileError::AmbiguousCall {
                call: signature_to_string(self.ast, name, args),
                loc: loc.clone(),
                candidates: matches
                    .iter()
                    .map(|&decl| Candidate {
                        what: self.describe_signature(decl),
                        loc: self.ast.loc(decl).clone(),
                    })
                    .collect(),
            }),
        }
    }

    /// Selects an operator overload by symbol, searching the scope
    /// chain for the first set carrying it.
    fn select_operator(
        &mut self,
        kind: OverloadKind,
        name: &str,
        args: &[Type],
        loc: &Location,
    ) -> Result<(NodeId, Type), CompileError> {
        let found = self.stack_find(|scope| {
            if scope.has_overloaded(kind, name) { Some(scope.id) } else { None }
        });
        let Some(scope) = found else {
            return Err(CompileError::Call {
                kind: kind.to_string(),
                call: signature_to_string(self.ast, name, args),
                loc: loc.clone(),
                candidates: Vec::new(),
            });
        };
        self.select_overload(scope, kind, name, args, &[], loc)
    }

    /// The candidate list of a set, for call errors.
    fn candidates(&self, scope: ScopeId, kind: OverloadKind, name: &str) -> Vec<Candidate> {
        self.scopes
            .get(scope)
            .overloaded(kind, name)
            .map(|set| {
                set.iter()
                    .map(|&decl| Candidate {
                        what: self.describe_signature(decl),
                        loc: self.ast.loc(decl).clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Resolves an array slice.
    fn resolve_slice(
        &mut self,
        id: NodeId,
        mut node: bine_ast::nodes::SliceExpr,
    ) -> Result<NodeId, CompileError> {
        let loc = self.ast.loc(id).clone();
        node.object = self.resolve_expr(node.object)?;
        let object_ty = self.registry.substitute(&self.registry.type_of(node.object));

        let Type::Array { element, dims } = object_ty else {
            return Err(CompileError::Index {
                ty: type_to_string(self.ast, &object_ty),
                loc,
            });
        };
        if node.indexes.len() != dims {
            return Err(CompileError::Index {
                ty: type_to_string(self.ast, &Type::Array { element, dims }),
                loc,
            });
        }

        let integer = self.basic_type("Integer", &loc)?;
        let range = Type::Sequence(Box::new(integer.clone()));
        let mut kept = 0usize;
        for index in &mut node.indexes {
            *index = self.resolve_expr(*index)?;
            let ity = self.registry.type_of(*index);
            if self.registry.definitely(&ity, &integer) {
                // A plain index consumes a dimension.
            } else if self.registry.definitely(&ity, &range) {
                kept += 1;
            } else {
                return Err(CompileError::Index {
                    ty: type_to_string(self.ast, &ity),
                    loc: self.ast.loc(*index).clone(),
                });
            }
        }

        let ty = if kept == 0 {
            *element
        } else {
            Type::Array { element, dims: kept }
        };
        self.registry.set_type(id, ty);
        self.ast[id].data = AnyNode::SliceExpr(node);
        Ok(id)
    }
}
