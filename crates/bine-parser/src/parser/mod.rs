//! Recursive-descent parser for the Bine programming language.
//!
//! The parser consumes the token vector produced by the lexer and builds
//! nodes directly into the shared AST arena. Each source file parses to
//! one [`FileNode`] holding its top-level declarations.
//!
//! Doc comments are filtered out of the token stream up front and
//! attached to the declaration that follows them.

mod declarations;
mod expressions;
mod statements;
mod types;

use bine_ast::Ast;
use bine_ast::nodes::{FileNode, NodeId};
use bine_source::{Location, SourceFile, Span};

use crate::error::ParseError;
use crate::lexer::{self, Token, TokenKind, clean_doc};

/// Parses one source file into the given arena, returning the file node.
///
/// ## Errors
///
/// Returns the first lexical or syntactic error encountered.
pub fn parse_file(ast: &mut Ast, file: &SourceFile) -> Result<NodeId, ParseError> {
    let tokens = lexer::tokenize(file)?;
    let mut parser = Parser::new(ast, file, tokens);
    parser.file()
}

/// The recursive-descent parser.
///
/// Holds a cursor into the token vector and allocates nodes into the
/// arena as constructs complete.
pub struct Parser<'a> {
    /// The arena nodes are allocated into.
    pub(crate) ast: &'a mut Ast,
    /// The file being parsed, for location building.
    pub(crate) file: &'a SourceFile,
    /// Tokens with doc comments filtered out.
    tokens: Vec<Token>,
    /// Doc text attached to the token at the same index, if any.
    docs: Vec<Option<String>>,
    /// Cursor into `tokens`.
    pos: usize,
}

impl<'a> Parser<'a> {
    /// Creates a parser over a pre-lexed token vector.
    #[must_use]
    pub fn new(ast: &'a mut Ast, file: &'a SourceFile, raw_tokens: Vec<Token>) -> Self {
        let mut tokens = Vec::with_capacity(raw_tokens.len());
        let mut docs = Vec::with_capacity(raw_tokens.len());
        let mut pending: Option<String> = None;

        for token in raw_tokens {
            if token.kind == TokenKind::DocComment {
                pending = Some(clean_doc(file.text_at_span(token.span)));
            } else {
                tokens.push(token);
                docs.push(pending.take());
            }
        }

        Self { ast, file, tokens, docs, pos: 0 }
    }

    /// Parses the whole file.
    pub(crate) fn file(&mut self) -> Result<NodeId, ParseError> {
        let mut stmts = Vec::new();
        while !self.at_end() {
            stmts.push(self.top_statement()?);
        }

        let loc = Location::new(self.file.id, 1, self.file.line_starts.len(), 1, 1);
        Ok(self.ast.alloc(FileNode { file: self.file.id, stmts }, loc))
    }

    // ---------------------------------------------------------------
    // Cursor helpers
    // ---------------------------------------------------------------

    /// True when every token has been consumed.
    pub(crate) fn at_end(&self) -> bool { self.pos >= self.tokens.len() }

    /// The kind of the current token, if any.
    pub(crate) fn peek(&self) -> Option<TokenKind> { self.tokens.get(self.pos).map(|t| t.kind) }

    /// The kind of the token `n` ahead of the cursor, if any.
    pub(crate) fn peek_at(&self, n: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + n).map(|t| t.kind)
    }

    /// True if the current token has the given kind.
    pub(crate) fn at(&self, kind: TokenKind) -> bool { self.peek() == Some(kind) }

    /// Consumes and returns the current token.
    pub(crate) fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).copied();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Consumes the current token if it has the given kind.
    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consumes the current token, requiring the given kind.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        match self.tokens.get(self.pos) {
            Some(token) if token.kind == kind => {
                self.pos += 1;
                Ok(*token)
            }
            Some(token) => Err(ParseError::UnexpectedToken {
                expected: kind.describe().to_string(),
                found: token.kind.describe().to_string(),
                loc: self.file.location(token.span),
            }),
            None => Err(self.eof_error(kind.describe())),
        }
    }

    /// Consumes an identifier token and returns its text.
    pub(crate) fn expect_name(&mut self) -> Result<(String, Span), ParseError> {
        let token = self.expect(TokenKind::Identifier)?;
        Ok((self.file.text_at_span(token.span).to_string(), token.span))
    }

    /// The doc comment attached to the current token, if any.
    pub(crate) fn doc_here(&self) -> Option<String> {
        self.docs.get(self.pos).cloned().flatten()
    }

    /// An error for a construct the parser cannot start.
    pub(crate) fn unexpected(&self, expected: &str) -> ParseError {
        match self.tokens.get(self.pos) {
            Some(token) => ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: token.kind.describe().to_string(),
                loc: self.file.location(token.span),
            },
            None => self.eof_error(expected),
        }
    }

    fn eof_error(&self, expected: &str) -> ParseError {
        let end = self.file.content.len();
        ParseError::UnexpectedEof {
            expected: expected.to_string(),
            loc: self.file.location(Span::new(end, end)),
        }
    }

    // ---------------------------------------------------------------
    // Span and location helpers
    // ---------------------------------------------------------------

    /// The span of the current token, or an empty span at the file end.
    pub(crate) fn here(&self) -> Span {
        self.tokens.get(self.pos).map_or_else(
            || {
                let end = self.file.content.len();
                Span::new(end, end)
            },
            |t| t.span,
        )
    }

    /// The span of the most recently consumed token.
    pub(crate) fn prev_span(&self) -> Span {
        self.tokens
            .get(self.pos.saturating_sub(1))
            .map_or_else(|| Span::new(0, 0), |t| t.span)
    }

    /// Builds a location spanning from `start` to the last consumed token.
    pub(crate) fn loc_from(&self, start: Span) -> Location {
        self.file.location(start.merge(&self.prev_span()))
    }

    // ---------------------------------------------------------------
    // Backtracking
    // ---------------------------------------------------------------

    /// Attempts a speculative parse, restoring the cursor on failure.
    ///
    /// Nodes allocated by a failed attempt are simply left unreachable in
    /// the arena; the arena never frees during a compilation.
    pub(crate) fn try_parse<T>(
        &mut self,
        attempt: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Option<T> {
        let saved = self.pos;
        match attempt(self) {
            Ok(value) => Some(value),
            Err(_) => {
                self.pos = saved;
                None
            }
        }
    }

    /// Parses a comma-separated list of items until (not consuming) the
    /// given closing token.
    pub(crate) fn comma_list<T>(
        &mut self,
        close: TokenKind,
        mut item: impl FnMut(&mut Self) -> Result<T, ParseError>,
    ) -> Result<Vec<T>, ParseError> {
        let mut items = Vec::new();
        if !self.at(close) {
            loop {
                items.push(item(self)?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        Ok(items)
    }
}
