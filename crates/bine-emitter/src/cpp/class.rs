//! Class emission: the definition into the header, member definitions
//! into the source.

use bine_analyzer::Type;
use bine_ast::nodes::{AnyNode, Annotations, ClassDecl, NodeId, RawTag};

use super::{ClassCtx, CppGenerator};
use crate::mangle::internalise;

impl CppGenerator<'_> {
    /// Emits one (non-template) class.
    pub(crate) fn emit_class(&mut self, decl: NodeId, node: &ClassDecl) {
        let name = self.decl_cpp_name(decl);
        let info = self.analysis.registry.classes.get(&decl);
        let base = info.and_then(|i| i.base_decl).map(|b| self.decl_cpp_name(b));
        let conversions: Vec<Type> =
            info.map(|i| i.conversions.clone()).unwrap_or_default();
        let mut header_conversion = 0usize;
        let mut source_conversion = 0usize;

        self.class = Some(ClassCtx { decl, name: name.clone(), base: base.clone() });

        // ------------------------- header -------------------------

        let final_spec =
            if node.annotations.contains(Annotations::FINAL) { " final" } else { "" };
        self.header.start(format!("class {name}{final_spec} : public "));
        match &base {
            Some(base) => self.header.finish(format!("{base} {{")),
            None => self.header.finish("bine::Object {"),
        }
        self.header.line(" public:");
        self.header.indent();
        self.header.line(format!("using class_type_ = {name};"));
        match &base {
            Some(base) => self.header.line(format!("using super_type_ = {base};")),
            None => self.header.line("using super_type_ = bine::Object;"),
        }
        self.header.blank();

        let ctor_params = self.params_text(&node.params, true);
        self.header.line(format!("explicit {name}({ctor_params});"));
        self.header.blank();

        for &member in &node.body {
            match self.ast[member].data.clone() {
                AnyNode::MemberVariableDecl(var) => {
                    let ty = self.var_type(member);
                    let text = self.type_text(&ty);
                    self.header.line(format!("{text} {};", internalise(&var.name)));
                }
                AnyNode::FunctionDecl(f) => {
                    // A member template declares each instantiation.
                    let targets = if !f.type_params.is_empty() && f.instantiation_of.is_none()
                    {
                        f.instantiations.clone()
                    } else {
                        vec![member]
                    };
                    for target in targets {
                        let AnyNode::FunctionDecl(instance) = self.ast[target].data.clone()
                        else {
                            continue;
                        };
                        let ret = self
                            .analysis
                            .registry
                            .returns
                            .get(&target)
                            .cloned()
                            .unwrap_or(Type::Empty);
                        let ret_text = self.type_text(&ret);
                        let fname = self.decl_cpp_name(target);
                        let params = self.params_text(&instance.params, true);
                        self.header.line(format!("virtual {ret_text} {fname}({params});"));
                    }
                }
                AnyNode::FiberDecl(f) => {
                    let targets = if !f.type_params.is_empty() && f.instantiation_of.is_none()
                    {
                        f.instantiations.clone()
                    } else {
                        vec![member]
                    };
                    for target in targets {
                        let AnyNode::FiberDecl(instance) = self.ast[target].data.clone()
                        else {
                            continue;
                        };
                        let ret = self
                            .analysis
                            .registry
                            .returns
                            .get(&target)
                            .cloned()
                            .unwrap_or(Type::Empty);
                        let ret_text = self.type_text(&ret);
                        let fname = self.decl_cpp_name(target);
                        let params = self.params_text(&instance.params, true);
                        self.header.line(format!("{ret_text} {fname}({params});"));
                    }
                }
                AnyNode::ConversionOperatorDecl(_) => {
                    let target = conversions
                        .get(header_conversion)
                        .cloned()
                        .unwrap_or(Type::Unknown);
                    header_conversion += 1;
                    let text = self.type_text(&target);
                    self.header.line(format!("operator {text}();"));
                }
                AnyNode::AssignmentOperatorDecl(assign) => {
                    let ty = self.var_type(assign.param);
                    let text = self.type_text(&ty);
                    let pname =
                        internalise(&bine_analyzer::types::decl_name(self.ast, assign.param));
                    self.header.line(format!("{name}& operator=({text} {pname});"));
                }
                AnyNode::RawStmt(raw) => {
                    if raw.tag == RawTag::Header {
                        self.header.line(raw.text.trim());
                    }
                }
                _ => {}
            }
        }

        self.header.outdent();
        self.header.line("};");
        self.header.blank();

        // ------------------------- source -------------------------

        self.emit_constructor(node, &name, base.as_deref());

        for &member in &node.body {
            match self.ast[member].data.clone() {
                AnyNode::FunctionDecl(f) => {
                    if !f.type_params.is_empty() && f.instantiation_of.is_none() {
                        for inst in f.instantiations {
                            if let AnyNode::FunctionDecl(instance) =
                                self.ast[inst].data.clone()
                            {
                                self.emit_function(inst, &instance);
                            }
                        }
                    } else {
                        self.emit_function(member, &f);
                    }
                }
                AnyNode::FiberDecl(f) => {
                    if !f.type_params.is_empty() && f.instantiation_of.is_none() {
                        for inst in f.instantiations {
                            if let AnyNode::FiberDecl(instance) = self.ast[inst].data.clone()
                            {
                                self.emit_fiber(inst, &instance);
                            }
                        }
                    } else {
                        self.emit_fiber(member, &f);
                    }
                }
                AnyNode::ConversionOperatorDecl(conv) => {
                    let target = conversions
                        .get(source_conversion)
                        .cloned()
                        .unwrap_or(Type::Unknown);
                    source_conversion += 1;
                    let text = self.type_text(&target);
                    self.source.start(format!("bine::{name}::operator {text}() "));
                    if let Some(body) = conv.body {
                        self.open_body(body);
                    } else {
                        self.source.finish("{}");
                    }
                    self.source.blank();
                }
                AnyNode::AssignmentOperatorDecl(assign) => {
                    let ty = self.var_type(assign.param);
                    let text = self.type_text(&ty);
                    let pname =
                        internalise(&bine_analyzer::types::decl_name(self.ast, assign.param));
                    self.source.start(format!(
                        "bine::{name}& bine::{name}::operator=({text} {pname}) "
                    ));
                    self.source.finish("{");
                    self.source.indent();
                    if let Some(body) = assign.body
                        && let AnyNode::BracesStmt(braces) = self.ast[body].data.clone()
                    {
                        for stmt in braces.stmts {
                            self.stmt(stmt);
                        }
                    }
                    self.source.line("return *this;");
                    self.source.outdent();
                    self.source.line("}");
                    self.source.blank();
                }
                AnyNode::RawStmt(raw) => {
                    if raw.tag == RawTag::Source {
                        self.source.line(raw.text.trim());
                    }
                }
                _ => {}
            }
        }

        self.class = None;
    }

    /// Emits the constructor definition: base forwarding plus member
    /// initializers in declaration order.
    fn emit_constructor(&mut self, node: &ClassDecl, name: &str, base: Option<&str>) {
        let params = self.params_text(&node.params, false);
        self.source.start(format!("bine::{name}::{name}({params}) "));

        if base.is_some() && !node.base_args.is_empty() {
            let args = self.args_text(&node.base_args);
            let base = base.unwrap_or_default();
            self.source.middle(format!(": {base}({args}) "));
        }

        self.source.finish("{");
        self.source.indent();
        for &member in &node.body {
            if let AnyNode::MemberVariableDecl(var) = self.ast[member].data.clone() {
                let mname = internalise(&var.name);
                if let Some(value) = var.value {
                    let rendered = self.expr(value);
                    self.source.line(format!("this->{mname} = {rendered};"));
                } else if !var.args.is_empty() {
                    let ty = self.var_type(member);
                    let args = self.args_text(&var.args);
                    if let Some(class_decl) = ty.class_decl() {
                        let cname = self.decl_cpp_name(class_decl);
                        self.source.line(format!(
                            "this->{mname} = bine::make_object<bine::{cname}>({args});"
                        ));
                    }
                } else if !var.brackets.is_empty() {
                    let ty = self.var_type(member);
                    let text = self.type_text(&ty);
                    let dims = self.args_text(&var.brackets);
                    self.source.line(format!("this->{mname} = {text}({dims});"));
                } else if self.var_type(member).is_class() {
                    let ty = self.var_type(member);
                    if let Some(class_decl) = ty.class_decl() {
                        let cname = self.decl_cpp_name(class_decl);
                        self.source.line(format!(
                            "this->{mname} = bine::make_object<bine::{cname}>();"
                        ));
                    }
                }
            }
        }
        self.source.outdent();
        self.source.line("}");
        self.source.blank();
    }

}
