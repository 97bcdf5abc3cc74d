//! Expression and statement emission, plus global function-likes.

use bine_analyzer::Type;
use bine_ast::nodes::{
    AnyNode,
    Annotations,
    FunctionDecl,
    GlobalVariableDecl,
    Literal,
    LocalVariableExpr,
    NodeId,
    OverloadKind,
    VarKind,
};

use super::CppGenerator;
use crate::mangle::{escape, internalise, is_translatable};

impl CppGenerator<'_> {
    // ===============================================================
    // Global function-likes
    // ===============================================================

    /// Emits a global function: declaration into the header, definition
    /// into the source.
    pub(crate) fn emit_function(&mut self, decl: NodeId, node: &FunctionDecl) {
        let name = self.decl_cpp_name(decl);
        let ret = self
            .analysis
            .registry
            .returns
            .get(&decl)
            .cloned()
            .unwrap_or(Type::Empty);
        let ret_text = self.type_text(&ret);
        let decl_params = self.params_text(&node.params, true);
        let def_params = self.params_text(&node.params, false);

        if !node.member {
            self.header.line(format!("{ret_text} {name}({decl_params});"));
        }

        let Some(body) = node.body else { return };
        let qualifier = self.member_qualifier();
        self.source.start(format!("{ret_text} bine::{qualifier}{name}({def_params}) "));
        self.open_body(body);
        self.source.blank();
    }

    /// Emits a binary operator, translated when the target language has
    /// it natively.
    pub(crate) fn emit_binary_operator(
        &mut self,
        decl: NodeId,
        node: &bine_ast::nodes::BinaryOperatorDecl,
    ) {
        let ret = self
            .analysis
            .registry
            .returns
            .get(&decl)
            .cloned()
            .unwrap_or(Type::Empty);
        let ret_text = self.type_text(&ret);
        let name = if is_translatable(&node.name) {
            format!("operator{}", node.name)
        } else {
            self.decl_cpp_name(decl)
        };
        let params = self.params_text(&[node.left, node.right], false);

        self.header.line(format!("{ret_text} {name}({params});"));
        let Some(body) = node.body else { return };
        self.source.start(format!("{ret_text} bine::{name}({params}) "));
        self.open_body(body);
        self.source.blank();
    }

    /// Emits a unary operator.
    pub(crate) fn emit_unary_operator(
        &mut self,
        decl: NodeId,
        node: &bine_ast::nodes::UnaryOperatorDecl,
    ) {
        let ret = self
            .analysis
            .registry
            .returns
            .get(&decl)
            .cloned()
            .unwrap_or(Type::Empty);
        let ret_text = self.type_text(&ret);
        let name = if is_translatable(&node.name) {
            format!("operator{}", node.name)
        } else {
            self.decl_cpp_name(decl)
        };
        let params = self.params_text(&[node.operand], false);

        self.header.line(format!("{ret_text} {name}({params});"));
        let Some(body) = node.body else { return };
        self.source.start(format!("{ret_text} bine::{name}({params}) "));
        self.open_body(body);
        self.source.blank();
    }

    /// Emits a program as a plain function the driver dispatches to.
    pub(crate) fn emit_program(
        &mut self,
        decl: NodeId,
        node: &bine_ast::nodes::ProgramDecl,
    ) {
        let name = self.decl_cpp_name(decl);
        let decl_params = self.params_text(&node.params, true);
        let def_params = self.params_text(&node.params, false);

        self.header.line(format!("void {name}({decl_params});"));
        let Some(body) = node.body else { return };
        self.source.start(format!("void bine::{name}({def_params}) "));
        self.open_body(body);
        self.source.blank();
    }

    /// Emits a global variable: extern declaration and definition.
    pub(crate) fn emit_global_variable(&mut self, decl: NodeId, node: &GlobalVariableDecl) {
        let ty = self.var_type(decl);
        let ty_text = self.type_text(&ty);
        let name = internalise(&node.name);

        self.header.line(format!("extern {ty_text} {name};"));

        self.source.start(format!("{ty_text} bine::{name}"));
        if let Some(value) = node.value {
            let rendered = self.expr(value);
            self.source.middle(format!(" = {rendered}"));
        } else if !node.args.is_empty() {
            let args = self.args_text(&node.args);
            self.source.middle(format!("({args})"));
        } else if !node.brackets.is_empty() {
            let dims = self.args_text(&node.brackets);
            self.source.middle(format!("({dims})"));
        }
        self.source.finish(";");
    }

    /// Opens a braces body onto the current source line and emits it.
    pub(crate) fn open_body(&mut self, body: NodeId) {
        self.source.finish("{");
        self.source.indent();
        if let AnyNode::BracesStmt(braces) = self.ast[body].data.clone() {
            for stmt in braces.stmts {
                self.stmt(stmt);
            }
        } else {
            self.stmt(body);
        }
        self.source.outdent();
        self.source.line("}");
    }

    // ===============================================================
    // Statements
    // ===============================================================

    /// Emits one statement into the source writer.
    pub(crate) fn stmt(&mut self, id: NodeId) {
        match self.ast[id].data.clone() {
            AnyNode::BracesStmt(node) => {
                self.source.line("{");
                self.source.indent();
                for stmt in node.stmts {
                    self.stmt(stmt);
                }
                self.source.outdent();
                self.source.line("}");
            }
            AnyNode::ExpressionStmt(node) => {
                if let AnyNode::LocalVariableExpr(local) = self.ast[node.expr].data.clone() {
                    self.local_stmt(node.expr, &local);
                } else {
                    let rendered = self.expr(node.expr);
                    self.source.line(format!("{rendered};"));
                }
            }
            AnyNode::IfStmt(node) => {
                let cond = self.expr(node.cond);
                self.source.start(format!("if ({cond}) "));
                self.open_block(node.then_block);
                if let Some(else_block) = node.else_block {
                    self.source.start("else ");
                    if let AnyNode::IfStmt(_) = self.ast[else_block].data {
                        self.source.finish("");
                        self.stmt(else_block);
                    } else {
                        self.open_block(else_block);
                    }
                }
            }
            AnyNode::WhileStmt(node) => {
                let cond = self.expr(node.cond);
                self.source.start(format!("while ({cond}) "));
                self.open_block(node.body);
            }
            AnyNode::DoWhileStmt(node) => {
                self.source.start("do ");
                self.open_block_unclosed(node.body);
                let cond = self.expr(node.cond);
                self.source.line(format!("}} while ({cond});"));
            }
            AnyNode::ForStmt(node) => self.for_stmt(&node),
            AnyNode::ReturnStmt(node) => {
                if self.fiber.is_some() {
                    // Inside a lowered fiber body a return finishes the
                    // state machine.
                    self.source.line("goto END_;");
                } else {
                    match node.value {
                        Some(value) => {
                            let rendered = self.expr(value);
                            self.source.line(format!("return {rendered};"));
                        }
                        None => self.source.line("return;"),
                    }
                }
            }
            AnyNode::YieldStmt(node) => self.yield_stmt(&node),
            AnyNode::AssertStmt(node) => {
                let cond = self.expr(node.cond);
                self.source.line(format!("assert({cond});"));
            }
            AnyNode::RawStmt(node) => {
                if node.tag == bine_ast::nodes::RawTag::Source {
                    self.source.line(node.text.trim());
                }
            }
            AnyNode::ImportStmt(_) | AnyNode::InstantiatedStmt(_) => {}
            _ => {
                let rendered = self.expr(id);
                self.source.line(format!("{rendered};"));
            }
        }
    }

    /// Opens a block for a control statement and closes it.
    fn open_block(&mut self, body: NodeId) {
        self.source.finish("{");
        self.source.indent();
        if let AnyNode::BracesStmt(braces) = self.ast[body].data.clone() {
            for stmt in braces.stmts {
                self.stmt(stmt);
            }
        } else {
            self.stmt(body);
        }
        self.source.outdent();
        self.source.line("}");
    }

    /// Opens a block without closing it (for `do ... while`).
    fn open_block_unclosed(&mut self, body: NodeId) {
        self.source.finish("{");
        self.source.indent();
        if let AnyNode::BracesStmt(braces) = self.ast[body].data.clone() {
            for stmt in braces.stmts {
                self.stmt(stmt);
            }
        } else {
            self.stmt(body);
        }
        self.source.outdent();
    }

    fn for_stmt(&mut self, node: &bine_ast::nodes::ForStmt) {
        if node.annotations.contains(Annotations::PARALLEL) {
            self.source.line("#pragma omp parallel for");
        }

        let index_name = match &self.ast[node.index].data {
            AnyNode::LocalVariableExpr(local) => self.fiber_local_name(node.index, &local.name),
            _ => "i_".to_string(),
        };
        let index_ty = self.type_text(&self.var_type(node.index));

        if let AnyNode::RangeExpr(range) = self.ast[node.range].data.clone() {
            let lower = self.expr(range.left);
            let upper = self.expr(range.right);
            if self.fiber.is_some() {
                // The index lives in the fiber state; initialize it
                // without redeclaring.
                self.source.start(format!(
                    "for ({index_name} = {lower}; {index_name} <= {upper}; ++{index_name}) "
                ));
            } else {
                self.source.start(format!(
                    "for ({index_ty} {index_name} = {lower}; {index_name} <= {upper}; \
                     ++{index_name}) "
                ));
            }
        } else {
            let range = self.expr(node.range);
            self.source.start(format!("for ({index_ty} {index_name} : {range}) "));
        }
        self.open_block(node.body);
    }

    /// Emits a local variable statement; inside a fiber the variable is
    /// a state member and only its initialization remains here.
    fn local_stmt(&mut self, id: NodeId, node: &LocalVariableExpr) {
        let ty = self.var_type(id);
        let ty_text = self.type_text(&ty);
        let name = self.fiber_local_name(id, &node.name);

        if self.fiber.is_some() {
            if let Some(value) = node.value {
                let rendered = self.expr(value);
                self.source.line(format!("{name} = {rendered};"));
            } else if !node.args.is_empty() {
                let args = self.args_text(&node.args);
                let text = self.constructed_text(&ty, &args);
                self.source.line(format!("{name} = {text};"));
            } else if !node.brackets.is_empty() {
                let dims = self.args_text(&node.brackets);
                self.source.line(format!("{name} = {ty_text}({dims});"));
            } else if ty.is_class() {
                // Objects are initialized, not left as null pointers.
                let text = self.constructed_text(&ty, "");
                self.source.line(format!("{name} = {text};"));
            }
            return;
        }

        if let Some(value) = node.value {
            let rendered = self.expr(value);
            self.source.line(format!("{ty_text} {name} = {rendered};"));
        } else if !node.args.is_empty() {
            let args = self.args_text(&node.args);
            let text = self.constructed_text(&ty, &args);
            self.source.line(format!("{ty_text} {name} = {text};"));
        } else if !node.brackets.is_empty() {
            let dims = self.args_text(&node.brackets);
            self.source.line(format!("{ty_text} {name}({dims});"));
        } else if ty.is_class() {
            let text = self.constructed_text(&ty, "");
            self.source.line(format!("{ty_text} {name} = {text};"));
        } else {
            self.source.line(format!("{ty_text} {name};"));
        }
    }

    /// The construction expression for a class (or plain) type.
    fn constructed_text(&self, ty: &Type, args: &str) -> String {
        match ty.class_decl() {
            Some(decl) => {
                format!("bine::make_object<bine::{}>({args})", self.decl_cpp_name(decl))
            }
            None => format!("{}({args})", self.type_text(ty)),
        }
    }

    // ===============================================================
    // Expressions
    // ===============================================================

    /// Renders an argument list.
    pub(crate) fn args_text(&mut self, args: &[NodeId]) -> String {
        let parts: Vec<String> = args.iter().map(|&arg| self.expr(arg)).collect();
        parts.join(", ")
    }

    /// Renders one expression.
    pub(crate) fn expr(&mut self, id: NodeId) -> String {
        match self.ast[id].data.clone() {
            AnyNode::LiteralExpr(node) => match node.value {
                Literal::Bool(b) => b.to_string(),
                Literal::Int(i) => i.to_string(),
                Literal::Real(r) => format!("{r:?}"),
                Literal::Str(s) => format!("std::string(\"{}\")", escape(&s)),
            },
            AnyNode::VarRef(node) => self.var_ref_text(&node),
            AnyNode::OverloadedRef(node) => {
                let target = node.target.map_or_else(
                    || internalise(&node.name),
                    |target| self.decl_cpp_name(target),
                );
                match node.kind {
                    OverloadKind::MemberFunction | OverloadKind::MemberFiber => {
                        format!("{}{target}", self.self_prefix())
                    }
                    _ => format!("bine::{target}"),
                }
            }
            AnyNode::CallExpr(node) => {
                // A constructor call allocates the object.
                if let AnyNode::NamedType(_) = self.ast[node.callee].data {
                    let ty = self.expr_type(id);
                    let args = self.args_text(&node.args);
                    return self.constructed_text(&ty, &args);
                }
                let callee = self.expr(node.callee);
                let args = self.args_text(&node.args);
                format!("{callee}({args})")
            }
            AnyNode::BinaryCallExpr(node) => {
                let left = self.expr(node.left);
                let right = self.expr(node.right);
                if is_translatable(&node.name) {
                    format!("({left} {} {right})", node.name)
                } else {
                    let name = node
                        .target
                        .map_or_else(|| internalise(&node.name), |t| self.decl_cpp_name(t));
                    format!("bine::{name}({left}, {right})")
                }
            }
            AnyNode::UnaryCallExpr(node) => {
                let operand = self.expr(node.operand);
                if is_translatable(&node.name) {
                    format!("({}{operand})", node.name)
                } else {
                    let name = node
                        .target
                        .map_or_else(|| internalise(&node.name), |t| self.decl_cpp_name(t));
                    format!("bine::{name}({operand})")
                }
            }
            AnyNode::AssignExpr(node) => {
                let left = self.expr(node.left);
                let right = self.expr(node.right);
                format!("{left} = {right}")
            }
            AnyNode::MemberExpr(node) => {
                // Access through `super` is a qualified call on this.
                if let AnyNode::SuperExpr(_) = self.ast[node.object].data {
                    let base = self
                        .class
                        .as_ref()
                        .and_then(|ctx| ctx.base.clone())
                        .unwrap_or_default();
                    let member = self.member_text(node.member);
                    return format!("this->{base}::{member}");
                }
                let object = self.expr(node.object);
                let member = self.member_text(node.member);
                format!("{object}->{member}")
            }
            AnyNode::GlobalExpr(node) => {
                let member = self.member_text(node.member);
                format!("::bine::{member}")
            }
            AnyNode::ThisExpr(_) => match &self.fiber {
                // Inside a lowered member fiber, the enclosing object is
                // the captured self pointer, not the state object.
                Some(ctx) if ctx.member => "self_".to_string(),
                _ => "bine::self_(this)".to_string(),
            },
            AnyNode::SuperExpr(_) => {
                let base = self
                    .class
                    .as_ref()
                    .and_then(|ctx| ctx.base.clone())
                    .unwrap_or_default();
                format!("this->{base}")
            }
            AnyNode::NilExpr(_) => "bine::nil".to_string(),
            AnyNode::SliceExpr(node) => {
                let object = self.expr(node.object);
                let indexes = self.args_text(&node.indexes);
                format!("{object}({indexes})")
            }
            AnyNode::RangeExpr(node) => {
                let left = self.expr(node.left);
                let right = self.expr(node.right);
                format!("bine::make_range({left}, {right})")
            }
            AnyNode::ParenthesesExpr(node) => {
                if node.rest.is_empty() {
                    let inner = self.expr(node.inner);
                    format!("({inner})")
                } else {
                    let mut parts = vec![self.expr(node.inner)];
                    parts.extend(node.rest.iter().map(|&r| self.expr(r)));
                    format!("std::make_tuple({})", parts.join(", "))
                }
            }
            AnyNode::SequenceExpr(node) => {
                let element = match self.expr_type(id) {
                    Type::Sequence(inner) => self.type_text(&inner),
                    other => self.type_text(&other),
                };
                let parts: Vec<String> =
                    node.elements.iter().map(|&e| self.expr(e)).collect();
                format!("bine::Sequence<{element}>({{{}}})", parts.join(", "))
            }
            AnyNode::LambdaExpr(node) => {
                let params = self.params_text(&node.params, false);
                let mut out = format!("[=]({params}) ");
                // A lambda body renders inline on one line.
                out.push_str(&self.inline_body(node.body));
                out
            }
            AnyNode::CastExpr(node) => {
                let object = self.expr(node.object);
                let target = self.expr_type(id);
                let inner = match &target {
                    Type::Optional(inner) => self.type_text(inner),
                    other => self.type_text(other),
                };
                format!("bine::cast<{inner}>({object})")
            }
            AnyNode::QueryExpr(node) => {
                let operand = self.expr(node.operand);
                format!("{operand}.query()")
            }
            AnyNode::GetExpr(node) => {
                let operand = self.expr(node.operand);
                format!("{operand}.get()")
            }
            AnyNode::LocalVariableExpr(node) => {
                // A bare reference position (for-loop index slot).
                self.fiber_local_name(id, &node.name)
            }
            AnyNode::NamedType(_) => {
                let ty = self.expr_type(id);
                self.type_text(&ty)
            }
            AnyNode::NamedExpr(node) => internalise(&node.name),
            _ => String::new(),
        }
    }

    /// Renders a resolved variable reference, honouring the class and
    /// fiber contexts.
    fn var_ref_text(&mut self, node: &bine_ast::nodes::VarRef) -> String {
        match node.kind {
            VarKind::Member => format!("{}{}", self.self_prefix(), internalise(&node.name)),
            VarKind::Global => format!("bine::{}", internalise(&node.name)),
            VarKind::Local => self.fiber_local_name(node.target, &node.name),
            VarKind::Parameter => internalise(&node.name),
        }
    }

    /// Renders the member part of a member access.
    fn member_text(&mut self, member: NodeId) -> String {
        match self.ast[member].data.clone() {
            AnyNode::VarRef(node) => internalise(&node.name),
            AnyNode::OverloadedRef(node) => node.target.map_or_else(
                || internalise(&node.name),
                |target| self.decl_cpp_name(target),
            ),
            AnyNode::NamedExpr(node) => internalise(&node.name),
            _ => self.expr(member),
        }
    }

    /// The prefix for member access from the current context: `this->`
    /// in a member body, `self_->` in a member fiber state.
    pub(crate) fn self_prefix(&self) -> &'static str {
        match &self.fiber {
            Some(ctx) if ctx.member => "self_->",
            _ => "this->",
        }
    }

    /// The `Class_::` qualifier for member definitions.
    pub(crate) fn member_qualifier(&self) -> String {
        self.class.as_ref().map_or_else(String::new, |ctx| format!("{}::", ctx.name))
    }

    /// Renders a braces body as a single-line block (for lambdas).
    fn inline_body(&mut self, body: NodeId) -> String {
        // Reuse the statement emitter through a scratch writer.
        let saved = std::mem::take(&mut self.source);
        self.stmt(body);
        let rendered = std::mem::replace(&mut self.source, saved).into_string();
        let mut out = String::new();
        for line in rendered.lines() {
            let line = line.trim();
            if !line.is_empty() {
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push_str(line);
            }
        }
        out
    }
}
