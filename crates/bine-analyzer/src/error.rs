//! Compiler error types and reporting.
//!
//! Every error carries a primary location, and some carry candidate
//! locations (the overloads considered, or the previous declaration).
//! Errors are never caught inside the pipeline; they surface to the
//! driver, which renders them with [`CompileError::render`].

use bine_source::{Location, SourceManager};
use thiserror::Error;

/// A named candidate location attached to an error (an overload
/// considered, or a previous declaration of the same name).
#[derive(Debug, Clone)]
pub struct Candidate {
    /// A short description of the candidate (usually a signature).
    pub what: String,
    /// Where the candidate was declared.
    pub loc: Location,
}

/// Errors detected by the compiler pipeline.
#[derive(Debug, Error, Clone)]
pub enum CompileError {
    /// An input file cannot be opened.
    #[error("could not open file '{path}'")]
    FileNotFound {
        /// The path as given.
        path: String,
    },

    /// A name declared twice in the same dictionary.
    #[error("previous declaration of '{name}'")]
    PreviousDeclaration {
        /// The redeclared name.
        name: String,
        /// The offending (second) declaration.
        loc: Location,
        /// The previous declaration.
        previous: Location,
    },

    /// An identifier with no matching declaration in any enclosing scope.
    #[error("unresolved reference '{name}'")]
    UnresolvedReference {
        /// The unresolved name.
        name: String,
        /// Where it was used.
        loc: Location,
    },

    /// A call with no matching overload.
    #[error("no matching {kind} for call '{call}'")]
    Call {
        /// The kind of declaration sought.
        kind: String,
        /// A rendering of the call's name and argument types.
        call: String,
        /// Where the call is.
        loc: Location,
        /// All overloads considered.
        candidates: Vec<Candidate>,
    },

    /// A call with more than one most-specific match.
    #[error("ambiguous call '{call}'")]
    AmbiguousCall {
        /// A rendering of the call's name and argument types.
        call: String,
        /// Where the call is.
        loc: Location,
        /// The tied most-specific matches.
        candidates: Vec<Candidate>,
    },

    /// A cast applied to a non-pointer-like operand.
    #[error("cast of a value of type '{ty}', which is not an object type")]
    Cast {
        /// The operand type.
        ty: String,
        /// Where the cast is.
        loc: Location,
    },

    /// Member access on something that is not a class instance.
    #[error("member access on a value of type '{ty}', which is not a class type")]
    Member {
        /// The object type.
        ty: String,
        /// Where the access is.
        loc: Location,
    },

    /// `super` used outside a class.
    #[error("'super' used outside of a class")]
    Super {
        /// Where `super` is.
        loc: Location,
    },

    /// `super` used in a class with no base.
    #[error("'super' used in a class with no base class")]
    SuperBase {
        /// Where `super` is.
        loc: Location,
    },

    /// `this` used outside a class.
    #[error("'this' used outside of a class")]
    This {
        /// Where `this` is.
        loc: Location,
    },

    /// `!` applied to a non-optional, non-fiber operand.
    #[error("get ('!') applied to a value of type '{ty}', which is not an optional or fiber")]
    Get {
        /// The operand type.
        ty: String,
        /// Where the get is.
        loc: Location,
    },

    /// `?` applied to a non-optional, non-fiber operand.
    #[error("query ('?') applied to a value of type '{ty}', which is not an optional or fiber")]
    Query {
        /// The operand type.
        ty: String,
        /// Where the query is.
        loc: Location,
    },

    /// Assignment to an expression that is not assignable.
    #[error("left side of assignment is not assignable")]
    NotAssignable {
        /// Where the assignment is.
        loc: Location,
    },

    /// Assignment of an incompatible right-hand side.
    #[error("cannot assign a value of type '{right}' to a target of type '{left}'")]
    Assignment {
        /// The target type.
        left: String,
        /// The value type.
        right: String,
        /// Where the assignment is.
        loc: Location,
    },

    /// A variable initializer that disagrees with the declared type.
    #[error("cannot initialize a variable of type '{declared}' with a value of type '{value}'")]
    InitialValue {
        /// The declared type.
        declared: String,
        /// The initializer type.
        value: String,
        /// Where the declaration is.
        loc: Location,
    },

    /// A base clause naming something that cannot be a base.
    #[error("base type '{ty}' is not valid here")]
    Base {
        /// The base type as written.
        ty: String,
        /// Where the base clause is.
        loc: Location,
    },

    /// A base clause naming a final class.
    #[error("cannot extend final class '{class}'")]
    FinalBase {
        /// The final class named as base.
        class: String,
        /// Where the base clause is.
        loc: Location,
    },

    /// Construction of an abstract class.
    #[error("cannot construct an instance of abstract class '{class}'")]
    AbstractConstructor {
        /// The abstract class.
        class: String,
        /// Where the construction is.
        loc: Location,
    },

    /// A non-Boolean condition.
    #[error("condition of type '{ty}' is not Boolean")]
    Condition {
        /// The condition type.
        ty: String,
        /// Where the condition is.
        loc: Location,
    },

    /// A non-Integer array index.
    #[error("index of type '{ty}' is not Integer")]
    Index {
        /// The index type.
        ty: String,
        /// Where the index is.
        loc: Location,
    },

    /// `return` outside a function.
    #[error("'return' used outside of a function")]
    Return {
        /// Where the return is.
        loc: Location,
    },

    /// A return value of the wrong type.
    #[error("cannot return a value of type '{found}' from a function returning '{expected}'")]
    ReturnType {
        /// The declared return type.
        expected: String,
        /// The returned value type.
        found: String,
        /// Where the return is.
        loc: Location,
    },

    /// `yield` outside a fiber.
    #[error("'yield' used outside of a fiber")]
    Yield {
        /// Where the yield is.
        loc: Location,
    },

    /// A yield value of the wrong type.
    #[error("cannot yield a value of type '{found}' from a fiber yielding '{expected}'")]
    YieldType {
        /// The declared yield type.
        expected: String,
        /// The yielded value type.
        found: String,
        /// Where the yield is.
        loc: Location,
    },

    /// Constructor arguments incompatible with the class parameters.
    #[error("cannot construct '{class}' with arguments '{args}'")]
    Constructor {
        /// The class name.
        class: String,
        /// A rendering of the argument types.
        args: String,
        /// Where the construction is.
        loc: Location,
    },

    /// A sequence literal with no common element type.
    #[error("sequence elements have no common type")]
    Sequence {
        /// Where the sequence is.
        loc: Location,
    },
}

impl CompileError {
    /// The primary location of the error, when one exists.
    #[must_use]
    pub const fn loc(&self) -> Option<&Location> {
        match self {
            Self::FileNotFound { .. } => None,
            Self::PreviousDeclaration { loc, .. }
            | Self::UnresolvedReference { loc, .. }
            | Self::Call { loc, .. }
            | Self::AmbiguousCall { loc, .. }
            | Self::Cast { loc, .. }
            | Self::Member { loc, .. }
            | Self::Super { loc }
            | Self::SuperBase { loc }
            | Self::This { loc }
            | Self::Get { loc, .. }
            | Self::Query { loc, .. }
            | Self::NotAssignable { loc }
            | Self::Assignment { loc, .. }
            | Self::InitialValue { loc, .. }
            | Self::Base { loc, .. }
            | Self::FinalBase { loc, .. }
            | Self::AbstractConstructor { loc, .. }
            | Self::Condition { loc, .. }
            | Self::Index { loc, .. }
            | Self::Return { loc }
            | Self::ReturnType { loc, .. }
            | Self::Yield { loc }
            | Self::YieldType { loc, .. }
            | Self::Constructor { loc, .. }
            | Self::Sequence { loc } => Some(loc),
        }
    }

    /// Candidate locations attached to the error, if any.
    #[must_use]
    pub fn candidates(&self) -> &[Candidate] {
        match self {
            Self::Call { candidates, .. } | Self::AmbiguousCall { candidates, .. } => candidates,
            _ => &[],
        }
    }

    /// Renders the error in the driver's diagnostic format:
    /// `<file>:<line>[-<line>][.<col>[-.<col>]]: error: <message>`
    /// followed by a note block quoting the offending construct and one
    /// note per candidate.
    #[must_use]
    pub fn render(&self, sources: &SourceManager) -> String {
        let mut out = String::new();

        match self.loc() {
            Some(loc) => {
                out.push_str(&sources.format_location(loc));
                out.push_str(&format!(": error: {self}\n"));
                let quoted = sources.quote(loc);
                if !quoted.is_empty() {
                    out.push_str("note: in\n");
                    out.push_str(&quoted);
                }
            }
            None => out.push_str(&format!("error: {self}\n")),
        }

        if let Self::PreviousDeclaration { previous, .. } = self {
            out.push_str(&format!(
                "{}: note: previous declaration\n",
                sources.format_location(previous)
            ));
            let quoted = sources.quote(previous);
            if !quoted.is_empty() {
                out.push_str(&quoted);
            }
        }

        for candidate in self.candidates() {
            out.push_str(&format!(
                "{}: note: candidate '{}'\n",
                sources.format_location(&candidate.loc),
                candidate.what
            ));
        }

        out
    }
}
