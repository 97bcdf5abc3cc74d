//! Source file handling and position tracking for the Bine compiler.
//!
//! This crate provides the types every later stage leans on for accurate
//! source attribution: file identities, positions, spans, the [`Location`]
//! attached to every AST node, and the [`SourceManager`] that owns file
//! contents and renders locations for diagnostics.

pub mod types;

pub use types::{FileId, Location, Position, SourceFile, SourceManager, Span};
