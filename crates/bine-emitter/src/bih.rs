//! Interface emission.
//!
//! Each package writes one interface file in the surface syntax,
//! carrying its type declarations and signatures so that downstream
//! packages can import the package without its sources.

use bine_analyzer::types::{decl_name, type_to_string};
use bine_analyzer::{Analysis, Type};
use bine_ast::Ast;
use bine_ast::nodes::{AnyNode, Annotations, NodeId};

use crate::writer::Writer;

/// Emits the interface of a package.
#[must_use]
pub fn emit_interface(ast: &Ast, analysis: &Analysis, files: &[(String, NodeId)]) -> String {
    let mut w = Writer::new();
    for (_, file) in files {
        for stmt in ast.children(*file) {
            decl(&mut w, ast, analysis, stmt);
        }
    }
    w.into_string()
}

fn decl(w: &mut Writer, ast: &Ast, analysis: &Analysis, id: NodeId) {
    match &ast[id].data {
        AnyNode::BasicDecl(node) => match node.base {
            Some(_) => {
                let base = analysis
                    .registry
                    .basic_bases
                    .get(&id)
                    .map(|b| decl_name(ast, *b))
                    .unwrap_or_default();
                w.line(format!("type {} < {base};", node.name));
            }
            None => w.line(format!("type {};", node.name)),
        },
        AnyNode::AliasDecl(node) => {
            let ty = analysis.registry.aliases.get(&id).cloned().unwrap_or(Type::Unknown);
            w.line(format!("type {} = {};", node.name, type_to_string(ast, &ty)));
        }
        AnyNode::ClassDecl(node) => {
            // The annotations travel with the interface so downstream
            // packages enforce them too.
            let mut head = String::new();
            if node.annotations.contains(Annotations::FINAL) {
                head.push_str("final ");
            }
            if node.annotations.contains(Annotations::ABSTRACT) {
                head.push_str("abstract ");
            }
            w.start(format!("{head}class {}", node.name));
            if !node.type_params.is_empty() {
                let params: Vec<String> =
                    node.type_params.iter().map(|&p| decl_name(ast, p)).collect();
                w.middle(format!("<{}>", params.join(", ")));
            }
            if !node.params.is_empty() {
                w.middle(format!("({})", params_text(ast, analysis, &node.params)));
            }
            if let Some(info) = analysis.registry.classes.get(&id)
                && let Some(base) = &info.base
            {
                w.middle(format!(" < {}", type_to_string(ast, base)));
            }
            w.finish(" {");
            w.indent();
            let conversions: Vec<Type> = analysis
                .registry
                .classes
                .get(&id)
                .map(|info| info.conversions.clone())
                .unwrap_or_default();
            let mut conversion = 0usize;
            for &member in &node.body {
                if let AnyNode::ConversionOperatorDecl(_) = &ast[member].data {
                    let target =
                        conversions.get(conversion).cloned().unwrap_or(Type::Unknown);
                    conversion += 1;
                    w.line(format!("operator -> {};", type_to_string(ast, &target)));
                } else {
                    decl(w, ast, analysis, member);
                }
            }
            w.outdent();
            w.line("}");
        }
        AnyNode::MemberVariableDecl(node) => {
            let ty = analysis.registry.var_types.get(&id).cloned().unwrap_or(Type::Unknown);
            w.line(format!("{}:{};", node.name, type_to_string(ast, &ty)));
        }
        AnyNode::GlobalVariableDecl(node) => {
            let ty = analysis.registry.var_types.get(&id).cloned().unwrap_or(Type::Unknown);
            w.line(format!("{}:{};", node.name, type_to_string(ast, &ty)));
        }
        AnyNode::FunctionDecl(node) => {
            w.start(format!("function {}", node.name));
            if !node.type_params.is_empty() {
                let params: Vec<String> =
                    node.type_params.iter().map(|&p| decl_name(ast, p)).collect();
                w.middle(format!("<{}>", params.join(", ")));
            }
            w.middle(format!("({})", params_text(ast, analysis, &node.params)));
            if let Some(ret) = analysis.registry.returns.get(&id)
                && !ret.is_empty()
            {
                w.middle(format!(" -> {}", type_to_string(ast, ret)));
            }
            w.finish(";");
        }
        AnyNode::FiberDecl(node) => {
            w.start(format!("fiber {}", node.name));
            if !node.type_params.is_empty() {
                let params: Vec<String> =
                    node.type_params.iter().map(|&p| decl_name(ast, p)).collect();
                w.middle(format!("<{}>", params.join(", ")));
            }
            w.middle(format!("({})", params_text(ast, analysis, &node.params)));
            if let Some(ret) = analysis.registry.returns.get(&id) {
                w.middle(format!(" -> {}", type_to_string(ast, ret)));
            }
            w.finish(";");
        }
        AnyNode::BinaryOperatorDecl(node) => {
            let left = param_text(ast, analysis, node.left);
            let right = param_text(ast, analysis, node.right);
            w.start(format!("operator ({left} {} {right})", node.name));
            if let Some(ret) = analysis.registry.returns.get(&id)
                && !ret.is_empty()
            {
                w.middle(format!(" -> {}", type_to_string(ast, ret)));
            }
            w.finish(";");
        }
        AnyNode::UnaryOperatorDecl(node) => {
            let operand = param_text(ast, analysis, node.operand);
            w.start(format!("operator ({}{operand})", node.name));
            if let Some(ret) = analysis.registry.returns.get(&id)
                && !ret.is_empty()
            {
                w.middle(format!(" -> {}", type_to_string(ast, ret)));
            }
            w.finish(";");
        }
        AnyNode::AssignmentOperatorDecl(node) => {
            let param = param_text(ast, analysis, node.param);
            w.line(format!("operator <- {param};"));
        }
        AnyNode::ProgramDecl(node) => {
            w.line(format!(
                "program {}({});",
                node.name,
                params_text(ast, analysis, &node.params)
            ));
        }
        _ => {}
    }
}

fn params_text(ast: &Ast, analysis: &Analysis, params: &[NodeId]) -> String {
    let parts: Vec<String> =
        params.iter().map(|&p| param_text(ast, analysis, p)).collect();
    parts.join(", ")
}

fn param_text(ast: &Ast, analysis: &Analysis, param: NodeId) -> String {
    let ty = analysis.registry.var_types.get(&param).cloned().unwrap_or(Type::Unknown);
    format!("{}:{}", decl_name(ast, param), type_to_string(ast, &ty))
}
