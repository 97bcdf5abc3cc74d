//! Parse error types.

use bine_source::Location;
use thiserror::Error;

/// Errors produced by the lexer and parser.
#[derive(Debug, Error, Clone)]
pub enum ParseError {
    /// A character sequence the lexer cannot match.
    #[error("unrecognized token '{text}'")]
    UnrecognizedToken {
        /// The offending text.
        text: String,
        /// Where it was found.
        loc: Location,
    },

    /// A token other than the expected one.
    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        /// What the parser was looking for.
        expected: String,
        /// What it found instead.
        found: String,
        /// Where it was found.
        loc: Location,
    },

    /// The input ended mid-construct.
    #[error("unexpected end of file, expected {expected}")]
    UnexpectedEof {
        /// What the parser was looking for.
        expected: String,
        /// The end of the file.
        loc: Location,
    },

    /// A numeric literal that does not fit its type.
    #[error("invalid {kind} literal '{text}'")]
    InvalidLiteral {
        /// `integer` or `real`.
        kind: &'static str,
        /// The literal text.
        text: String,
        /// Where it was found.
        loc: Location,
    },
}

impl ParseError {
    /// The primary location of the error.
    #[must_use]
    pub const fn loc(&self) -> &Location {
        match self {
            Self::UnrecognizedToken { loc, .. }
            | Self::UnexpectedToken { loc, .. }
            | Self::UnexpectedEof { loc, .. }
            | Self::InvalidLiteral { loc, .. } => loc,
        }
    }
}
