//! Type definitions for source code representation.
//!
//! This module defines the core types used for representing source code
//! positions, spans and files in the Bine compiler. It provides the
//! foundation for accurate source tracking, which is essential for quality
//! error messages and diagnostics.
//!
//! Key types include:
//!
//! - `Position`: a specific place in source code with line, column, and byte offset
//! - `Span`: a byte range within a single file
//! - `Location`: the file/line/column extent attached to every AST node,
//!   together with the doc comment preceding the construct (if any)
//! - `SourceFile`: a complete source file with efficient position lookup
//! - `SourceManager`: registry of source files with unique identifiers

use std::fmt;
use std::ops::Range;
use std::path::PathBuf;

use rustc_hash::FxHashMap;

/// A unique identifier for a source file.
///
/// `FileId` is a newtype wrapper around `usize` that uniquely identifies
/// a source file within a `SourceManager`. Ids are assigned by the
/// `SourceManager` when source files are added to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileId(usize);

impl FileId {
    /// Creates a new `FileId` with the given value.
    #[must_use]
    pub const fn new(id: usize) -> Self { Self(id) }

    /// Returns the inner value of the `FileId`.
    #[must_use]
    pub const fn value(&self) -> usize { self.0 }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "file:{}", self.0) }
}

/// A position in a source file.
///
/// Positions are 1-indexed for line and column, following common editor
/// conventions. The `offset` is 0-indexed, representing the byte offset
/// from the start of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
    /// Byte offset from the start of the file (0-indexed)
    pub offset: usize,
}

impl Position {
    /// Creates a new position with the given line, column, and byte offset.
    #[must_use]
    pub const fn new(line: usize, column: usize, offset: usize) -> Self {
        Self { line, column, offset }
    }

    /// Creates a new position at the start of a file (line 1, column 1, offset 0).
    #[must_use]
    pub const fn start_of_file() -> Self { Self { line: 1, column: 1, offset: 0 } }

    /// Returns true if this position precedes the other position.
    #[must_use]
    pub const fn precedes(&self, other: &Self) -> bool { self.offset < other.offset }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A simple span that only contains start and end byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    /// Start offset
    pub start: usize,
    /// End offset
    pub end: usize,
}

impl Span {
    /// Creates a new span with the given start and end offsets.
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self { Self { start, end } }

    /// Merges two spans, creating a new span that covers both.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        Self::new(self.start.min(other.start), self.end.max(other.end))
    }
}

impl Default for Span {
    fn default() -> Self { Self::new(0, 0) }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self { Self { start: range.start, end: range.end } }
}

impl From<Span> for Range<usize> {
    fn from(span: Span) -> Self { span.start..span.end }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// The source extent attached to every AST node.
///
/// A location records the file and the first/last line and column of the
/// construct, plus the doc comment that immediately preceded it in the
/// source (captured by the lexer). Locations are immutable once created;
/// cloning a subtree shares them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    /// The file this location belongs to.
    pub file: FileId,
    /// First line of the construct (1-indexed).
    pub first_line: usize,
    /// Last line of the construct (1-indexed).
    pub last_line: usize,
    /// First column of the construct (1-indexed).
    pub first_column: usize,
    /// Last column of the construct (1-indexed).
    pub last_column: usize,
    /// Doc comment preceding the construct, without comment markers.
    pub doc: Option<String>,
}

impl Location {
    /// Creates a new location covering the given line/column extent.
    #[must_use]
    pub const fn new(
        file: FileId,
        first_line: usize,
        last_line: usize,
        first_column: usize,
        last_column: usize,
    ) -> Self {
        Self { file, first_line, last_line, first_column, last_column, doc: None }
    }

    /// Attaches a doc comment to this location.
    #[must_use]
    pub fn with_doc(mut self, doc: Option<String>) -> Self {
        self.doc = doc;
        self
    }

    /// Creates a location spanning from the start of `self` to the end of
    /// `other`. Both must belong to the same file; the doc comment of
    /// `self` is kept.
    #[must_use]
    pub fn span_to(&self, other: &Self) -> Self {
        debug_assert_eq!(self.file, other.file, "cannot span locations across files");
        Self {
            file: self.file,
            first_line: self.first_line,
            last_line: other.last_line,
            first_column: self.first_column,
            last_column: other.last_column,
            doc: self.doc.clone(),
        }
    }

    /// A placeholder location for synthesized nodes.
    #[must_use]
    pub const fn none() -> Self {
        Self { file: FileId::new(0), first_line: 0, last_line: 0, first_column: 0, last_column: 0, doc: None }
    }

    /// Returns true if this location was synthesized rather than parsed.
    #[must_use]
    pub const fn is_none(&self) -> bool { self.first_line == 0 }

    /// Renders the line/column extent in the diagnostic format
    /// `<line>[-<line>][.<col>[-.<col>]]` (the file name is prepended by
    /// the [`SourceManager`]).
    #[must_use]
    pub fn extent(&self) -> String {
        let mut out = format!("{}", self.first_line);
        if self.last_line != self.first_line {
            out.push_str(&format!("-{}", self.last_line));
        }
        if self.first_column > 0 {
            out.push_str(&format!(".{}", self.first_column));
            if self.last_column != self.first_column {
                out.push_str(&format!("-.{}", self.last_column));
            }
        }
        out
    }
}

impl Default for Location {
    fn default() -> Self { Self::none() }
}

/// A source file representation.
///
/// Contains the content of the file, its name, and precomputed line start
/// positions for efficient line/column lookup.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Identifier of the file
    pub id: FileId,
    /// Name of the file (usually a path)
    pub name: String,
    /// Path to the file, if available
    pub path: Option<PathBuf>,
    /// Content of the file
    pub content: String,
    /// Byte offsets of line starts (0-indexed, first entry is always 0)
    pub line_starts: Vec<usize>,
}

impl SourceFile {
    /// Creates a new source file with the given id, name, and content.
    #[must_use]
    pub fn new(id: FileId, name: String, content: String) -> Self {
        let line_starts = Self::compute_line_starts(&content);
        Self { id, name, path: None, content, line_starts }
    }

    /// Creates a new source file with the given id, name, path, and content.
    #[must_use]
    pub fn with_path(id: FileId, name: String, path: PathBuf, content: String) -> Self {
        let line_starts = Self::compute_line_starts(&content);
        Self { id, name, path: Some(path), content, line_starts }
    }

    /// Computes the byte offsets of all line starts in the content.
    fn compute_line_starts(content: &str) -> Vec<usize> {
        let mut line_starts = vec![0]; // First line always starts at byte 0

        for (i, c) in content.char_indices() {
            if c == '\n' {
                line_starts.push(i + 1);
            }
        }

        line_starts
    }

    /// Converts a byte offset to a `Position`.
    ///
    /// Uses binary search on the `line_starts` array to efficiently find
    /// the line number.
    ///
    /// ## Panics
    ///
    /// Panics if the byte offset is greater than the length of the file's
    /// content.
    #[must_use]
    pub fn position_from_offset(&self, byte_offset: usize) -> Position {
        assert!(
            byte_offset <= self.content.len(),
            "byte offset {} out of range for file with length {}",
            byte_offset,
            self.content.len()
        );

        match self.line_starts.binary_search(&byte_offset) {
            // Exact match means it's at the start of a line
            Ok(line) => Position::new(line + 1, 1, byte_offset),

            // No exact match, i is the insertion point (which means we're on line i-1)
            Err(line) => {
                let line = line - 1;
                let line_start_offset = self.line_starts[line];
                let column = byte_offset - line_start_offset + 1;

                Position::new(line + 1, column, byte_offset)
            }
        }
    }

    /// Builds a [`Location`] from a byte span within this file.
    #[must_use]
    pub fn location(&self, span: Span) -> Location {
        let start = self.position_from_offset(span.start);
        // The last byte of the span still belongs to the construct.
        let end = self.position_from_offset(span.end.max(span.start));
        Location::new(self.id, start.line, end.line, start.column, end.column)
    }

    /// Returns the text at the given span.
    ///
    /// ## Panics
    ///
    /// Panics if the span's range is invalid.
    #[must_use]
    pub fn text_at_span(&self, span: Span) -> &str { &self.content[span.start..span.end] }

    /// Returns the line of text containing the given 1-indexed line number.
    #[must_use]
    pub fn line(&self, line: usize) -> Option<&str> {
        let line_idx = line.checked_sub(1)?;
        let start_offset = *self.line_starts.get(line_idx)?;

        let end_offset = if line_idx + 1 < self.line_starts.len() {
            self.line_starts[line_idx + 1] - 1 // Exclude the newline
        } else {
            self.content.len()
        };

        Some(&self.content[start_offset..end_offset])
    }
}

/// A manager for source files.
///
/// The `SourceManager` keeps track of all source files and assigns unique
/// `FileId`s to them. It provides methods for adding files, retrieving
/// files by id, and rendering locations for diagnostics.
#[derive(Debug, Default, Clone)]
pub struct SourceManager {
    /// Map from `FileId` to `SourceFile`
    files: FxHashMap<FileId, SourceFile>,
    /// Next available file id
    next_id: usize,
}

impl SourceManager {
    /// Creates a new empty `SourceManager`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            files: FxHashMap::default(),
            next_id: 1, // Start from 1, reserve 0 for synthesized locations
        }
    }

    /// Adds a new source file and returns its `FileId`.
    pub fn add_file(&mut self, name: String, content: String) -> FileId {
        let id = FileId::new(self.next_id);
        self.next_id += 1;

        let file = SourceFile::new(id, name, content);
        drop(self.files.insert(id, file));

        id
    }

    /// Adds a new source file with a path and returns its `FileId`.
    pub fn add_file_with_path(&mut self, name: String, path: PathBuf, content: String) -> FileId {
        let id = FileId::new(self.next_id);
        self.next_id += 1;

        let file = SourceFile::with_path(id, name, path, content);
        drop(self.files.insert(id, file));

        id
    }

    /// Returns the source file with the given id, if it exists.
    #[must_use]
    pub fn get_file(&self, id: FileId) -> Option<&SourceFile> { self.files.get(&id) }

    /// Returns the name of the file a location belongs to.
    #[must_use]
    pub fn file_name(&self, id: FileId) -> &str {
        self.get_file(id).map_or("<unknown>", |file| file.name.as_str())
    }

    /// Renders a location as `<file>:<line>[-<line>][.<col>[-.<col>]]`.
    #[must_use]
    pub fn format_location(&self, loc: &Location) -> String {
        if loc.is_none() {
            return self.file_name(loc.file).to_string();
        }
        format!("{}:{}", self.file_name(loc.file), loc.extent())
    }

    /// Quotes the source lines a location covers, for "note: in" blocks.
    #[must_use]
    pub fn quote(&self, loc: &Location) -> String {
        let Some(file) = self.get_file(loc.file) else { return String::new() };
        let mut out = String::new();
        for line in loc.first_line..=loc.last_line {
            if let Some(text) = file.line(line) {
                out.push_str(text);
                out.push('\n');
            }
        }
        out
    }

    /// Returns an iterator over all registered files.
    pub fn files(&self) -> impl Iterator<Item = &SourceFile> { self.files.values() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_lookup_finds_lines_and_columns() {
        let file = SourceFile::new(FileId::new(1), "a.bi".to_string(), "ab\ncd\n".to_string());
        assert_eq!(file.position_from_offset(0), Position::new(1, 1, 0));
        assert_eq!(file.position_from_offset(1), Position::new(1, 2, 1));
        assert_eq!(file.position_from_offset(3), Position::new(2, 1, 3));
        assert_eq!(file.position_from_offset(4), Position::new(2, 2, 4));
    }

    #[test]
    fn location_extent_formats_ranges() {
        let loc = Location::new(FileId::new(1), 3, 3, 5, 5);
        assert_eq!(loc.extent(), "3.5");

        let loc = Location::new(FileId::new(1), 3, 4, 5, 9);
        assert_eq!(loc.extent(), "3-4.5-.9");
    }

    #[test]
    fn manager_formats_locations_with_file_names() {
        let mut manager = SourceManager::new();
        let id = manager.add_file("model.bi".to_string(), "class A {\n}\n".to_string());
        let loc = Location::new(id, 1, 1, 1, 9);
        assert_eq!(manager.format_location(&loc), "model.bi:1.1-.9");
        assert_eq!(manager.quote(&loc), "class A {\n");
    }
}
