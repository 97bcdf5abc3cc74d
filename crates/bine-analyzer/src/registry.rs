//! Class facts, resolved signatures, and the type relations.
//!
//! The registry is the analyzer's side-table keyed by arena node ids:
//! class information (scopes, base, conversions, assignments), resolved
//! signatures and variable types, per-expression types, generic bounds
//! and bindings, and instantiation argument tuples.
//!
//! The two partial orders of the type lattice live here as well, because
//! they consult these facts:
//!
//! - [`Registry::definitely`]: a value of the left type can safely flow
//!   to a context of the right type (subtyping);
//! - [`Registry::possibly`]: the two types could share an instance, the
//!   weaker relation used for overload candidate filtering and for the
//!   specialization order of the overload posets.

use bine_ast::nodes::NodeId;
use rustc_hash::FxHashMap;

use crate::scope::ScopeId;
use crate::types::Type;

/// Per-class facts populated by the resolver passes.
#[derive(Debug, Clone)]
pub struct ClassInfo {
    /// The class body scope.
    pub scope: ScopeId,
    /// The initializer sub-scope used for member default values.
    pub init_scope: ScopeId,
    /// The resolved base type, if the class extends another.
    pub base: Option<Type>,
    /// The base class declaration, if the base is a class.
    pub base_decl: Option<NodeId>,
    /// Conversion target types registered by conversion operators.
    pub conversions: Vec<Type>,
    /// Types accepted by assignment operators.
    pub assignments: Vec<Type>,
}

/// The analyzer's side-tables, keyed by arena node ids.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    /// Class facts by class declaration.
    pub classes: FxHashMap<NodeId, ClassInfo>,
    /// Direct base by basic-type declaration.
    pub basic_bases: FxHashMap<NodeId, NodeId>,
    /// Resolved alias definitions by alias declaration.
    pub aliases: FxHashMap<NodeId, Type>,
    /// Declared bounds by generic type parameter.
    pub bounds: FxHashMap<NodeId, Type>,
    /// Bound arguments by generic type parameter (instantiation clones).
    pub bindings: FxHashMap<NodeId, Type>,
    /// Parameter type tuples by function-like declaration.
    pub signatures: FxHashMap<NodeId, Vec<Type>>,
    /// Number of trailing defaulted parameters by declaration.
    pub defaults: FxHashMap<NodeId, usize>,
    /// Return types by function-like declaration.
    pub returns: FxHashMap<NodeId, Type>,
    /// Resolved types by variable-like declaration.
    pub var_types: FxHashMap<NodeId, Type>,
    /// Resolved types by expression node.
    pub expr_types: FxHashMap<NodeId, Type>,
    /// Bound argument tuples by instantiation declaration.
    pub instantiation_args: FxHashMap<NodeId, Vec<Type>>,
    /// Body scopes by function-like declaration.
    pub body_scopes: FxHashMap<NodeId, ScopeId>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// The resolved type of an expression node, or unknown.
    #[must_use]
    pub fn type_of(&self, expr: NodeId) -> Type {
        self.expr_types.get(&expr).cloned().unwrap_or(Type::Unknown)
    }

    /// Records the resolved type of an expression node.
    pub fn set_type(&mut self, expr: NodeId, ty: Type) {
        let _ = self.expr_types.insert(expr, ty);
    }

    /// Substitutes generic bindings through a type, recursively.
    #[must_use]
    pub fn substitute(&self, ty: &Type) -> Type {
        match ty {
            Type::Generic(decl) => match self.bindings.get(decl) {
                Some(bound) => self.substitute(bound),
                None => ty.clone(),
            },
            Type::Optional(inner) => Type::Optional(Box::new(self.substitute(inner))),
            Type::Weak(inner) => Type::Weak(Box::new(self.substitute(inner))),
            Type::Fiber(inner) => Type::Fiber(Box::new(self.substitute(inner))),
            Type::Sequence(inner) => Type::Sequence(Box::new(self.substitute(inner))),
            Type::Array { element, dims } => Type::Array {
                element: Box::new(self.substitute(element)),
                dims: *dims,
            },
            Type::Tuple(elements) => {
                Type::Tuple(elements.iter().map(|e| self.substitute(e)).collect())
            }
            Type::Function { params, ret } => Type::Function {
                params: params.iter().map(|p| self.substitute(p)).collect(),
                ret: Box::new(self.substitute(ret)),
            },
            Type::Class { decl, args } => Type::Class {
                decl: *decl,
                args: args.iter().map(|a| self.substitute(a)).collect(),
            },
            _ => ty.clone(),
        }
    }

    // ---------------------------------------------------------------
    // The `definitely` relation (subtyping)
    // ---------------------------------------------------------------

    /// True when a value of type `t` can safely flow to a context of
    /// type `u`. Reflexive and transitive.
    #[must_use]
    pub fn definitely(&self, t: &Type, u: &Type) -> bool {
        let t = self.substitute(t);
        let u = self.substitute(u);
        if t == u {
            return true;
        }

        match (&t, &u) {
            (Type::Unknown, _) | (_, Type::Unknown) => false,

            // Optionals: nil flows to any optional, a plain value flows
            // into its optional, and optionals are covariant.
            (Type::Nil, Type::Optional(_)) => true,
            (Type::Optional(t1), Type::Optional(u1)) => self.definitely(t1, u1),
            (Type::Optional(_), _) => false,
            (_, Type::Optional(u1)) => self.definitely(&t, u1),

            // Weak pointers are covariant among themselves and accept
            // owning values, but never flow back to a plain type.
            (Type::Weak(t1), Type::Weak(u1)) => self.definitely(t1, u1),
            (Type::Weak(_), _) => false,
            (_, Type::Weak(u1)) => self.definitely(&t, u1),

            // Basics by identity or inheritance chain.
            (Type::Basic(a), Type::Basic(b)) => self.is_basic_super(*a, *b),
            (Type::Basic(_), _) => false,

            // Classes by identity (with equivalent arguments), by the
            // transitive super chain, or by a registered conversion.
            (Type::Class { decl: a, args: aa }, Type::Class { decl: b, args: ba })
                if a == b =>
            {
                aa.len() == ba.len()
                    && aa.iter().zip(ba).all(|(x, y)| self.equivalent(x, y))
            }
            (Type::Class { decl: a, .. }, _) => {
                if let Type::Class { decl: b, .. } = &u
                    && self.is_class_super(*a, *b)
                {
                    return true;
                }
                self.converts_to(*a, &u)
            }

            // An unbound generic flows where its bound flows.
            (Type::Generic(g), _) => {
                self.bounds.get(g).is_some_and(|bound| self.definitely(bound, &u))
            }
            (_, Type::Generic(_)) => false,

            // Fibers are covariant in their yield type.
            (Type::Fiber(y1), Type::Fiber(y2)) => self.definitely(y1, y2),

            // Functions: contravariant parameters, covariant return.
            (
                Type::Function { params: p1, ret: r1 },
                Type::Function { params: p2, ret: r2 },
            ) => {
                p1.len() == p2.len()
                    && p1.iter().zip(p2).all(|(a, b)| self.definitely(b, a))
                    && self.definitely(r1, r2)
            }

            // Arrays: element-covariant with equal dimension counts.
            (
                Type::Array { element: e1, dims: d1 },
                Type::Array { element: e2, dims: d2 },
            ) => d1 == d2 && self.definitely(e1, e2),

            // A sequence literal flows into an array of matching depth.
            (Type::Sequence(s), Type::Array { element, dims }) => {
                if *dims == 1 {
                    self.definitely(s, element)
                } else {
                    self.definitely(
                        s,
                        &Type::Array { element: element.clone(), dims: dims - 1 },
                    )
                }
            }
            (Type::Sequence(s1), Type::Sequence(s2)) => self.definitely(s1, s2),

            // Tuples elementwise.
            (Type::Tuple(a), Type::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| self.definitely(x, y))
            }

            _ => false,
        }
    }

    /// True when the two types are `definitely`-equivalent.
    #[must_use]
    pub fn equivalent(&self, a: &Type, b: &Type) -> bool {
        self.definitely(a, b) && self.definitely(b, a)
    }

    // ---------------------------------------------------------------
    // The `possibly` relation (overlap)
    // ---------------------------------------------------------------

    /// True when the two types could share an instance.
    #[must_use]
    pub fn possibly(&self, t: &Type, u: &Type) -> bool {
        let t = self.substitute(t);
        let u = self.substitute(u);
        if t == u {
            return true;
        }

        match (&t, &u) {
            (Type::Unknown, _) | (_, Type::Unknown) => false,

            // Strip optionals: the shared instance may be the value.
            (Type::Optional(t1), _) => self.possibly(t1, &u),
            (_, Type::Optional(u1)) => self.possibly(&t, u1),

            // An unbound generic overlaps anything its bound overlaps;
            // with no bound it overlaps everything.
            (Type::Generic(g), other) | (other, Type::Generic(g)) => {
                self.bounds.get(g).is_none_or(|bound| self.possibly(bound, other))
            }

            (Type::Weak(a), Type::Weak(b)) => self.possibly(a, b),

            (Type::Tuple(a), Type::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| self.possibly(x, y))
            }
            (
                Type::Array { element: e1, dims: d1 },
                Type::Array { element: e2, dims: d2 },
            ) => d1 == d2 && self.possibly(e1, e2),

            _ => self.definitely(&t, &u) || self.definitely(&u, &t),
        }
    }

    // ---------------------------------------------------------------
    // Least common super
    // ---------------------------------------------------------------

    /// The least common super type of two types, or None when they are
    /// incompatible. Used for conditional and sequence-element
    /// inference.
    #[must_use]
    pub fn common(&self, t: &Type, u: &Type) -> Option<Type> {
        let t = self.substitute(t);
        let u = self.substitute(u);

        if self.definitely(&t, &u) {
            return Some(u);
        }
        if self.definitely(&u, &t) {
            return Some(t);
        }

        match (&t, &u) {
            (Type::Nil, other) | (other, Type::Nil) => {
                Some(Type::Optional(Box::new((*other).clone())))
            }
            (Type::Optional(a), Type::Optional(b)) => {
                self.common(a, b).map(|c| Type::Optional(Box::new(c)))
            }
            (Type::Optional(a), other) | (other, Type::Optional(a)) => {
                self.common(a, other).map(|c| Type::Optional(Box::new(c)))
            }
            (Type::Class { decl: a, .. }, Type::Class { decl: b, .. }) => {
                // Walk up the super chain of `a` until a super of `b`
                // (or `b` itself) is found.
                let mut cursor = Some(*a);
                while let Some(current) = cursor {
                    if current == *b || self.is_class_super(*b, current) {
                        return Some(Type::Class { decl: current, args: Vec::new() });
                    }
                    cursor = self.classes.get(&current).and_then(|info| info.base_decl);
                }
                None
            }
            _ => None,
        }
    }

    // ---------------------------------------------------------------
    // Signature helpers
    // ---------------------------------------------------------------

    /// True when `a` is at least as specific as `b`: every parameter of
    /// `a` definitely flows to the matching parameter of `b`.
    #[must_use]
    pub fn sig_at_least_as_specific(&self, a: &[Type], b: &[Type]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| self.definitely(x, y))
    }

    /// True when the two parameter tuples are equivalent (duplicate
    /// overloads).
    #[must_use]
    pub fn sig_equivalent(&self, a: &[Type], b: &[Type]) -> bool {
        self.sig_at_least_as_specific(a, b) && self.sig_at_least_as_specific(b, a)
    }

    /// True when an argument tuple could bind to a declaration's
    /// parameters, honouring trailing defaults.
    #[must_use]
    pub fn call_possible(&self, args: &[Type], decl: NodeId) -> bool {
        let Some(params) = self.signatures.get(&decl) else { return false };
        let defaults = self.defaults.get(&decl).copied().unwrap_or(0);
        if args.len() > params.len() || args.len() + defaults < params.len() {
            return false;
        }
        args.iter().zip(params).all(|(a, p)| self.possibly(a, p))
    }

    /// True when an argument tuple definitely binds to a declaration's
    /// parameters.
    #[must_use]
    pub fn call_definite(&self, args: &[Type], decl: NodeId) -> bool {
        let Some(params) = self.signatures.get(&decl) else { return false };
        let defaults = self.defaults.get(&decl).copied().unwrap_or(0);
        if args.len() > params.len() || args.len() + defaults < params.len() {
            return false;
        }
        args.iter().zip(params).all(|(a, p)| self.definitely(a, p))
    }

    // ---------------------------------------------------------------
    // Class and basic facts
    // ---------------------------------------------------------------

    /// True when `b` is `a` itself or a transitive super class of `a`.
    #[must_use]
    pub fn is_class_super(&self, a: NodeId, b: NodeId) -> bool {
        let mut cursor = Some(a);
        let mut steps = 0usize;
        while let Some(current) = cursor {
            if current == b {
                return true;
            }
            cursor = self.classes.get(&current).and_then(|info| info.base_decl);
            steps += 1;
            if steps > self.classes.len() + 1 {
                break; // Malformed cycle; treated as unrelated.
            }
        }
        false
    }

    /// True when `b` is `a` itself or a transitive base of the basic
    /// type `a`.
    #[must_use]
    pub fn is_basic_super(&self, a: NodeId, b: NodeId) -> bool {
        let mut cursor = Some(a);
        let mut steps = 0usize;
        while let Some(current) = cursor {
            if current == b {
                return true;
            }
            cursor = self.basic_bases.get(&current).copied();
            steps += 1;
            if steps > self.basic_bases.len() + 1 {
                break;
            }
        }
        false
    }

    /// True when class `a` registered a conversion whose result flows
    /// to `u`.
    #[must_use]
    pub fn converts_to(&self, a: NodeId, u: &Type) -> bool {
        // The super chain is consulted as well: an inherited conversion
        // still applies.
        let mut cursor = Some(a);
        while let Some(current) = cursor {
            if let Some(info) = self.classes.get(&current) {
                if info.conversions.iter().any(|conv| self.definitely(conv, u)) {
                    return true;
                }
                cursor = info.base_decl;
            } else {
                break;
            }
        }
        false
    }

    /// The value type behind a class that converts to an optional, if
    /// any. The has-value and get sugars (`?`/`!`) accept such classes
    /// as if they were the optional itself.
    #[must_use]
    pub fn optional_conversion(&self, ty: &Type) -> Option<Type> {
        let Type::Class { decl, .. } = self.substitute(ty) else { return None };
        let mut cursor = Some(decl);
        while let Some(current) = cursor {
            let info = self.classes.get(&current)?;
            for conv in &info.conversions {
                if let Type::Optional(inner) = self.substitute(conv) {
                    return Some(*inner);
                }
            }
            cursor = info.base_decl;
        }
        None
    }

    /// True when class `decl` has an assignment operator accepting `ty`.
    #[must_use]
    pub fn has_assignment(&self, decl: NodeId, ty: &Type) -> bool {
        let mut cursor = Some(decl);
        while let Some(current) = cursor {
            if let Some(info) = self.classes.get(&current) {
                if info.assignments.iter().any(|accepted| self.definitely(ty, accepted)) {
                    return true;
                }
                cursor = info.base_decl;
            } else {
                break;
            }
        }
        false
    }
}
