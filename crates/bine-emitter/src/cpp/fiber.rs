//! Fiber lowering: each fiber declaration becomes a state class with an
//! explicit label machine, plus a thin initialisation function that
//! allocates the state.
//!
//! The body transforms as follows:
//!
//! - `yield e` becomes `value_ = e; label_ = K; return true; LABELK_:;`
//!   for a fresh label `K`;
//! - `return` becomes `goto END_;`;
//! - the `query()` method opens with a dispatch switch over `label_`
//!   and closes with `END_: label_ = N + 1; return false;`;
//! - every parameter and every body local becomes a state member, with
//!   locals renamed by first occurrence so that differently-scoped
//!   locals of the same name cannot collide.

use bine_analyzer::Type;
use bine_analyzer::gather::{LocalGatherer, YieldGatherer};
use bine_analyzer::types::type_to_string;
use bine_ast::nodes::{AnyNode, FiberDecl, NodeId, YieldStmt};
use rustc_hash::FxHashMap;

use super::{CppGenerator, FiberCtx};
use crate::mangle::{encode32, internalise};

impl CppGenerator<'_> {
    /// Emits one (non-template) fiber: the state class and the
    /// initialisation function.
    pub(crate) fn emit_fiber(&mut self, decl: NodeId, node: &FiberDecl) {
        let name = self.decl_cpp_name(decl);
        let ret = self
            .analysis
            .registry
            .returns
            .get(&decl)
            .cloned()
            .unwrap_or(Type::Unknown);
        let yield_ty = ret.unwrap_fiber().cloned().unwrap_or(Type::Unknown);
        let yield_text = self.type_text(&yield_ty);
        let ret_text = self.type_text(&ret);

        // The state name folds in the signature, so overloads of the
        // same fiber name get distinct states.
        let signature = self
            .analysis
            .registry
            .signatures
            .get(&decl)
            .map(|sig| {
                sig.iter().map(|t| type_to_string(self.ast, t)).collect::<Vec<_>>().join(", ")
            })
            .unwrap_or_default();
        let state_name = format!("{name}{}FiberState_", encode32(&signature));

        let locals = node.body.map_or_else(Vec::new, |body| LocalGatherer::gather(self.ast, body));
        let yields = node.body.map_or(0, |body| YieldGatherer::gather(self.ast, body).len());

        // Rename the locals up front so every reference agrees. The
        // parameters claim their names first, so a local shadowing a
        // parameter still gets a distinct state member.
        let mut names = FxHashMap::default();
        let mut counts: FxHashMap<String, usize> = FxHashMap::default();
        for &param in &node.params {
            let base = bine_analyzer::types::decl_name(self.ast, param);
            let _ = counts.insert(base, 1);
        }
        for &local in &locals {
            let base = bine_analyzer::types::decl_name(self.ast, local);
            let count = counts.entry(base.clone()).or_insert(0);
            let unique = if *count == 0 {
                internalise(&base)
            } else {
                format!("{}{}_", internalise(&base), count)
            };
            *count += 1;
            let _ = names.insert(local, unique);
        }

        let member = node.member;
        let self_type = self.class.as_ref().map(|ctx| format!("bine::{}", ctx.name));

        // ---------------------- state class ----------------------

        self.source
            .start(format!("class {state_name} final : "));
        self.source.finish(format!("public bine::FiberState<{yield_text}> {{"));
        self.source.line(" public:");
        self.source.indent();

        let param_list = self.params_text(&node.params, false);
        let mut ctor_params = param_list.clone();
        if member && let Some(self_type) = &self_type {
            let self_param = format!("bine::SharedPtr<{self_type}> self_");
            ctor_params = if ctor_params.is_empty() {
                self_param
            } else {
                format!("{self_param}, {ctor_params}")
            };
        }

        self.source.start(format!("explicit {state_name}({ctor_params}) :"));
        self.source.finish("");
        self.source.indent();
        self.source.start(format!("bine::FiberState<{yield_text}>(0, {})", yields + 1));
        if member {
            self.source.finish(",");
            self.source.start("self_(self_)");
        }
        for &param in &node.params {
            let pname = internalise(&bine_analyzer::types::decl_name(self.ast, param));
            self.source.finish(",");
            self.source.start(format!("{pname}({pname})"));
        }
        self.source.finish(" {");
        self.source.line("}");
        self.source.outdent();
        self.source.blank();

        if member && let Some(self_type) = &self_type {
            self.source.line(format!("bine::SharedPtr<{self_type}> self_;"));
        }
        for &param in &node.params {
            let ty = self.var_type(param);
            let text = self.type_text(&ty);
            let pname = internalise(&bine_analyzer::types::decl_name(self.ast, param));
            self.source.line(format!("{text} {pname};"));
        }
        for &local in &locals {
            let ty = self.var_type(local);
            let text = self.type_text(&ty);
            let lname = names.get(&local).cloned().unwrap_or_default();
            self.source.line(format!("{text} {lname};"));
        }
        self.source.blank();

        // Standard state hooks: deep clone, freeze and thaw walk every
        // captured member.
        let mut captured: Vec<String> = Vec::new();
        if member {
            captured.push("self_".to_string());
        }
        for &param in &node.params {
            captured.push(internalise(&bine_analyzer::types::decl_name(self.ast, param)));
        }
        for &local in &locals {
            captured.push(names.get(&local).cloned().unwrap_or_default());
        }

        self.source.start(format!(
            "virtual bine::FiberState<{yield_text}>* clone_() const "
        ));
        self.source.finish("{");
        self.source.indent();
        self.source.line(format!("return new {state_name}(*this);"));
        self.source.outdent();
        self.source.line("}");

        self.source.start("virtual void freeze_() ");
        self.source.finish("{");
        self.source.indent();
        self.source.line(format!("bine::FiberState<{yield_text}>::freeze_();"));
        for name in &captured {
            self.source.line(format!("bine::freeze({name});"));
        }
        self.source.outdent();
        self.source.line("}");

        self.source.start("virtual void thaw_() ");
        self.source.finish("{");
        self.source.indent();
        self.source.line(format!("bine::FiberState<{yield_text}>::thaw_();"));
        for name in &captured {
            self.source.line(format!("bine::thaw({name});"));
        }
        self.source.outdent();
        self.source.line("}");
        self.source.blank();

        // The query method: dispatch switch, transformed body, end
        // label.
        self.source.start("virtual bool query() ");
        self.source.finish("{");
        self.source.indent();
        self.source.line("switch (label_) {");
        self.source.indent();
        for label in 0..=yields {
            self.source.line(format!("case {label}: goto LABEL{label}_;"));
        }
        self.source.line("default: goto END_;");
        self.source.outdent();
        self.source.line("}");
        self.source.line("LABEL0_: ;");

        let previous = self.fiber.replace(FiberCtx { label: 1, names, member });
        if let Some(body) = node.body {
            // The body's outer braces are stripped: the state machine's
            // labels must share the query method's scope so the switch
            // can reach them.
            if let AnyNode::BracesStmt(braces) = self.ast[body].data.clone() {
                for stmt in braces.stmts {
                    self.stmt(stmt);
                }
            } else {
                self.stmt(body);
            }
        }
        self.fiber = previous;

        self.source.line("END_:");
        self.source.line(format!("label_ = {};", yields + 1));
        self.source.line("return false;");
        self.source.outdent();
        self.source.line("}");

        self.source.outdent();
        self.source.line("};");
        self.source.blank();

        // ------------------ initialisation function ------------------

        let decl_params = self.params_text(&node.params, true);
        let def_params = self.params_text(&node.params, false);
        if !member {
            self.header.line(format!("{ret_text} {name}({decl_params});"));
        }

        let qualifier = self.member_qualifier();
        self.source
            .start(format!("{ret_text} bine::{qualifier}{name}({def_params}) "));
        self.source.finish("{");
        self.source.indent();
        let mut args: Vec<String> = Vec::new();
        if member {
            args.push("bine::self_(this)".to_string());
        }
        for &param in &node.params {
            args.push(internalise(&bine_analyzer::types::decl_name(self.ast, param)));
        }
        self.source.line(format!(
            "return bine::make_fiber<{state_name}>({});",
            args.join(", ")
        ));
        self.source.outdent();
        self.source.line("}");
        self.source.blank();
    }

    /// Emits a yield as a state transition.
    pub(crate) fn yield_stmt(&mut self, node: &YieldStmt) {
        let value = self.expr(node.value);
        let label = match &mut self.fiber {
            Some(ctx) => {
                let label = ctx.label;
                ctx.label += 1;
                label
            }
            None => return, // Unreachable after resolution.
        };
        self.source.line(format!("value_ = {value};"));
        self.source.line(format!("label_ = {label};"));
        self.source.line("return true;");
        self.source.line(format!("LABEL{label}_: ;"));
    }

    /// The emitted name of a local variable: its state-member rename
    /// inside a fiber, its plain mangled name elsewhere.
    pub(crate) fn fiber_local_name(&self, local: NodeId, name: &str) -> String {
        if let Some(ctx) = &self.fiber
            && let Some(renamed) = ctx.names.get(&local)
        {
            return renamed.clone();
        }
        internalise(name)
    }
}
