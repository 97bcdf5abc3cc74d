//! C++ code generation.
//!
//! One generator instance produces the package header and one source
//! file at a time. Declarations render into the header; definitions
//! into the source. Class and fiber contexts adjust how identifiers and
//! the suspending statements emit.

mod base;
mod class;
mod fiber;

use bine_analyzer::types::type_to_string;
use bine_analyzer::{Analysis, Type};
use bine_ast::Ast;
use bine_ast::nodes::{AnyNode, NodeId, RawTag};
use rustc_hash::FxHashMap;

use crate::mangle::{encode32, internalise};
use crate::writer::Writer;

/// The enclosing class while emitting members.
pub(crate) struct ClassCtx {
    /// The class declaration.
    pub decl: NodeId,
    /// The mangled class name.
    pub name: String,
    /// The mangled base class name, if any.
    pub base: Option<String>,
}

/// The fiber-lowering context while emitting a fiber body.
pub(crate) struct FiberCtx {
    /// The next yield label to assign.
    pub label: usize,
    /// State member names by local declaration.
    pub names: FxHashMap<NodeId, String>,
    /// Whether the state carries a `self_` pointer (member fibers).
    pub member: bool,
}

/// The C++ generator for one package.
pub(crate) struct CppGenerator<'a> {
    /// The resolved arena.
    pub ast: &'a Ast,
    /// The analysis result.
    pub analysis: &'a Analysis,
    /// The package header being accumulated.
    pub header: Writer,
    /// The source file being accumulated.
    pub source: Writer,
    /// The enclosing class, while emitting members.
    pub class: Option<ClassCtx>,
    /// The fiber context, while emitting a lowered fiber body.
    pub fiber: Option<FiberCtx>,
}

impl<'a> CppGenerator<'a> {
    /// Creates a generator over a resolved package.
    pub fn new(ast: &'a Ast, analysis: &'a Analysis) -> Self {
        Self {
            ast,
            analysis,
            header: Writer::new(),
            source: Writer::new(),
            class: None,
            fiber: None,
        }
    }

    /// Emits the top-level declarations of one file into the current
    /// source writer (and their declarations into the header).
    pub fn emit_file(&mut self, file: NodeId) {
        for stmt in self.ast.children(file) {
            self.emit_decl(stmt);
        }
    }

    /// Emits one top-level declaration, expanding generic templates
    /// into their instantiation lists.
    pub fn emit_decl(&mut self, decl: NodeId) {
        match self.ast[decl].data.clone() {
            AnyNode::ClassDecl(node) => {
                if !node.type_params.is_empty() && node.instantiation_of.is_none() {
                    for inst in node.instantiations {
                        self.emit_decl(inst);
                    }
                } else {
                    self.emit_class(decl, &node);
                }
            }
            AnyNode::FunctionDecl(node) => {
                if !node.type_params.is_empty() && node.instantiation_of.is_none() {
                    for inst in node.instantiations {
                        self.emit_decl(inst);
                    }
                } else {
                    self.emit_function(decl, &node);
                }
            }
            AnyNode::FiberDecl(node) => {
                if !node.type_params.is_empty() && node.instantiation_of.is_none() {
                    for inst in node.instantiations {
                        self.emit_decl(inst);
                    }
                } else {
                    self.emit_fiber(decl, &node);
                }
            }
            AnyNode::ProgramDecl(node) => self.emit_program(decl, &node),
            AnyNode::BinaryOperatorDecl(node) => self.emit_binary_operator(decl, &node),
            AnyNode::UnaryOperatorDecl(node) => self.emit_unary_operator(decl, &node),
            AnyNode::GlobalVariableDecl(node) => self.emit_global_variable(decl, &node),
            AnyNode::AliasDecl(node) => {
                let ty = self
                    .analysis
                    .registry
                    .aliases
                    .get(&decl)
                    .cloned()
                    .unwrap_or(Type::Unknown);
                let text = self.type_text(&ty);
                self.header.line(format!("using {} = {};", internalise(&node.name), text));
            }
            AnyNode::RawStmt(node) => match node.tag {
                RawTag::Header => self.header.line(node.text.trim()),
                RawTag::Source => self.source.line(node.text.trim()),
            },
            // Basics map to fixed target types; imports and explicit
            // instantiation directives have nothing of their own.
            AnyNode::BasicDecl(_)
            | AnyNode::ImportStmt(_)
            | AnyNode::InstantiatedStmt(_) => {}
            _ => {}
        }
    }

    // ---------------------------------------------------------------
    // Names and types
    // ---------------------------------------------------------------

    /// The mangled target-language name of a declaration; generic
    /// instantiations fold their argument tuple into the name.
    pub fn decl_cpp_name(&self, decl: NodeId) -> String {
        let name = bine_analyzer::types::decl_name(self.ast, decl);
        let mut out = internalise(&name);
        if let Some(args) = self.analysis.registry.instantiation_args.get(&decl) {
            let rendered: Vec<String> =
                args.iter().map(|a| type_to_string(self.ast, a)).collect();
            out.push_str(&encode32(&rendered.join(", ")));
            out.push('_');
        }
        out
    }

    /// The target-language rendering of a semantic type.
    pub fn type_text(&self, ty: &Type) -> String {
        let ty = self.analysis.registry.substitute(ty);
        match &ty {
            Type::Unknown | Type::Empty => "void".to_string(),
            Type::Nil => "bine::Nil".to_string(),
            Type::Basic(decl) => {
                let name = bine_analyzer::types::decl_name(self.ast, *decl);
                match name.as_str() {
                    "Boolean" => "unsigned char".to_string(),
                    "Integer" => "std::int64_t".to_string(),
                    "Real" => "double".to_string(),
                    "String" => "std::string".to_string(),
                    _ => format!("bine::{}", internalise(&name)),
                }
            }
            Type::Class { decl, .. } => {
                format!("bine::SharedPtr<bine::{}>", self.decl_cpp_name(*decl))
            }
            Type::Generic(decl) => {
                // An unbound generic can only appear inside a template,
                // which is never emitted; render its name defensively.
                format!("bine::{}", self.decl_cpp_name(*decl))
            }
            Type::Optional(inner) => match inner.as_ref() {
                Type::Weak(weak) => {
                    format!(
                        "bine::Optional<bine::WeakPtr<bine::{}>>",
                        weak.class_decl().map_or_else(
                            || self.type_text(weak),
                            |decl| self.decl_cpp_name(decl),
                        )
                    )
                }
                _ => format!("bine::Optional<{}>", self.type_text(inner)),
            },
            Type::Weak(inner) => match inner.class_decl() {
                Some(decl) => format!("bine::WeakPtr<bine::{}>", self.decl_cpp_name(decl)),
                None => format!("bine::WeakPtr<{}>", self.type_text(inner)),
            },
            Type::Fiber(inner) => format!("bine::Fiber<{}>", self.type_text(inner)),
            Type::Array { element, dims } => {
                format!("bine::Array<{}, {}>", self.type_text(element), dims)
            }
            Type::Sequence(inner) => format!("bine::Sequence<{}>", self.type_text(inner)),
            Type::Tuple(elements) => {
                let parts: Vec<String> =
                    elements.iter().map(|e| self.type_text(e)).collect();
                format!("std::tuple<{}>", parts.join(", "))
            }
            Type::Function { params, ret } => {
                let parts: Vec<String> = params.iter().map(|p| self.type_text(p)).collect();
                format!("bine::Function<{}({})>", self.type_text(ret), parts.join(", "))
            }
        }
    }

    /// The resolved type of an expression node.
    pub fn expr_type(&self, id: NodeId) -> Type {
        self.analysis.registry.substitute(&self.analysis.registry.type_of(id))
    }

    /// The resolved type of a variable-like declaration.
    pub fn var_type(&self, decl: NodeId) -> Type {
        self.analysis
            .registry
            .var_types
            .get(&decl)
            .map(|ty| self.analysis.registry.substitute(ty))
            .unwrap_or(Type::Unknown)
    }

    /// Renders a parameter list `Type name_ [= default]`.
    pub fn params_text(&mut self, params: &[NodeId], with_defaults: bool) -> String {
        let mut parts = Vec::with_capacity(params.len());
        for &param in params {
            let ty = self.var_type(param);
            let name = internalise(&bine_analyzer::types::decl_name(self.ast, param));
            let mut part = format!("{} {}", self.type_text(&ty), name);
            if with_defaults
                && let AnyNode::ParameterDecl(decl) = self.ast[param].data.clone()
                && let Some(value) = decl.value
            {
                let rendered = self.expr(value);
                part.push_str(&format!(" = {rendered}"));
            }
            parts.push(part);
        }
        parts.join(", ")
    }
}
