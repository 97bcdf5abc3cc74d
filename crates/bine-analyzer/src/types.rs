//! Semantic type representation.
//!
//! Syntactic type expressions in the AST resolve to values of [`Type`].
//! The subtype (`definitely`) and overlap (`possibly`) relations live on
//! the [`crate::registry::Registry`], which holds the class facts they
//! consult (super sets, conversions, generic bindings).

use bine_ast::nodes::{AnyNode, NodeId};
use bine_ast::Ast;

/// A semantic type.
///
/// Class, basic and generic types reference the arena id of their
/// declaration; equality on those ids is declaration identity. Aliases
/// never appear here: resolving an alias name yields its definition.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// Not yet resolved; never flows to anything.
    Unknown,
    /// The type of expressions and functions without a value.
    Empty,
    /// The type of `nil`.
    Nil,
    /// A basic type, by declaration.
    Basic(NodeId),
    /// A class type, by declaration, with its generic arguments.
    Class {
        /// The class declaration (an instantiation for bound generics).
        decl: NodeId,
        /// The generic arguments, empty for plain classes.
        args: Vec<Type>,
    },
    /// A generic type parameter, by declaration.
    Generic(NodeId),
    /// An optional wrapper.
    Optional(Box<Type>),
    /// A weak pointer wrapper.
    Weak(Box<Type>),
    /// A fiber handle with its yield type.
    Fiber(Box<Type>),
    /// A fixed-dimension array.
    Array {
        /// The element type.
        element: Box<Type>,
        /// The number of dimensions.
        dims: usize,
    },
    /// A tuple.
    Tuple(Vec<Type>),
    /// A sequence (the type of sequence literals).
    Sequence(Box<Type>),
    /// A function object type.
    Function {
        /// The parameter types.
        params: Vec<Type>,
        /// The return type ([`Type::Empty`] for none).
        ret: Box<Type>,
    },
}

impl Default for Type {
    fn default() -> Self { Self::Unknown }
}

impl Type {
    /// True for the unresolved placeholder.
    #[must_use]
    pub const fn is_unknown(&self) -> bool { matches!(self, Self::Unknown) }

    /// True for the no-value type.
    #[must_use]
    pub const fn is_empty(&self) -> bool { matches!(self, Self::Empty) }

    /// True for class types.
    #[must_use]
    pub const fn is_class(&self) -> bool { matches!(self, Self::Class { .. }) }

    /// The class declaration behind this type, unwrapping optional and
    /// weak wrappers.
    #[must_use]
    pub fn class_decl(&self) -> Option<NodeId> {
        match self {
            Self::Class { decl, .. } => Some(*decl),
            Self::Optional(inner) | Self::Weak(inner) => inner.class_decl(),
            _ => None,
        }
    }

    /// The wrapped type of an optional, if this is one.
    #[must_use]
    pub fn unwrap_optional(&self) -> Option<&Self> {
        match self {
            Self::Optional(inner) => Some(inner),
            _ => None,
        }
    }

    /// The yield type of a fiber, if this is one.
    #[must_use]
    pub fn unwrap_fiber(&self) -> Option<&Self> {
        match self {
            Self::Fiber(inner) => Some(inner),
            _ => None,
        }
    }

    /// True when values of this type are object pointers (class types,
    /// possibly behind optional or weak wrappers).
    #[must_use]
    pub fn is_pointer_like(&self) -> bool { self.class_decl().is_some() }
}

/// Renders a type for diagnostics, resolving declaration names through
/// the arena.
#[must_use]
pub fn type_to_string(ast: &Ast, ty: &Type) -> String {
    match ty {
        Type::Unknown => "<unknown>".to_string(),
        Type::Empty => "()".to_string(),
        Type::Nil => "nil".to_string(),
        Type::Basic(decl) | Type::Generic(decl) => decl_name(ast, *decl),
        Type::Class { decl, args } => {
            let name = decl_name(ast, *decl);
            if args.is_empty() {
                name
            } else {
                let args: Vec<String> = args.iter().map(|a| type_to_string(ast, a)).collect();
                format!("{name}<{}>", args.join(", "))
            }
        }
        Type::Optional(inner) => format!("{}?", type_to_string(ast, inner)),
        Type::Weak(inner) => format!("{}&", type_to_string(ast, inner)),
        Type::Fiber(inner) => format!("{}!", type_to_string(ast, inner)),
        Type::Array { element, dims } => {
            let holes: Vec<&str> = (0..*dims).map(|_| "_").collect();
            format!("{}[{}]", type_to_string(ast, element), holes.join(", "))
        }
        Type::Tuple(elements) => {
            let parts: Vec<String> = elements.iter().map(|e| type_to_string(ast, e)).collect();
            format!("({})", parts.join(", "))
        }
        Type::Sequence(element) => format!("[{}]", type_to_string(ast, element)),
        Type::Function { params, ret } => {
            let parts: Vec<String> = params.iter().map(|p| type_to_string(ast, p)).collect();
            if ret.is_empty() {
                format!("({})", parts.join(", "))
            } else {
                format!("({}) -> {}", parts.join(", "), type_to_string(ast, ret))
            }
        }
    }
}

/// Renders a parameter type tuple for diagnostics.
#[must_use]
pub fn signature_to_string(ast: &Ast, name: &str, params: &[Type]) -> String {
    let parts: Vec<String> = params.iter().map(|p| type_to_string(ast, p)).collect();
    format!("{name}({})", parts.join(", "))
}

/// The declared name of a named declaration node.
#[must_use]
pub fn decl_name(ast: &Ast, decl: NodeId) -> String {
    match &ast[decl].data {
        AnyNode::ClassDecl(node) => node.name.clone(),
        AnyNode::BasicDecl(node) => node.name.clone(),
        AnyNode::AliasDecl(node) => node.name.clone(),
        AnyNode::FunctionDecl(node) => node.name.clone(),
        AnyNode::FiberDecl(node) => node.name.clone(),
        AnyNode::ProgramDecl(node) => node.name.clone(),
        AnyNode::BinaryOperatorDecl(node) => node.name.clone(),
        AnyNode::UnaryOperatorDecl(node) => node.name.clone(),
        AnyNode::TypeParamDecl(node) => node.name.clone(),
        AnyNode::ParameterDecl(node) => node.name.clone(),
        AnyNode::LocalVariableExpr(node) => node.name.clone(),
        AnyNode::MemberVariableDecl(node) => node.name.clone(),
        AnyNode::GlobalVariableDecl(node) => node.name.clone(),
        _ => "<anonymous>".to_string(),
    }
}
