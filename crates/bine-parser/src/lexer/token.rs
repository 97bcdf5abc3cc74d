//! Token definitions for the Bine programming language.
//!
//! This module defines the token types and structures used by the lexer.

use std::fmt::{self, Display, Formatter};

use logos::{Lexer, Logos};

/// Consumes a raw passthrough block after its opening `{{`.
///
/// The block runs to the next `}}`; the token slice includes both
/// delimiters. Returns false when the block is unterminated.
fn raw_block(lex: &mut Lexer<'_, TokenKind>) -> bool {
    if let Some(end) = lex.remainder().find("}}") {
        lex.bump(end + 2);
        true
    } else {
        false
    }
}

/// Represents the type of a token in the Bine language.
///
/// This enum contains all token types recognized by the lexer, including:
///
/// - Keywords like `class`, `function`, `fiber`
/// - Literals (Boolean, integer, real, string)
/// - Operators and delimiters, including the probabilistic assignment
///   family `<-`, `<~`, `~`, `~>`
/// - Doc comments, which are kept as tokens so the parser can attach them
///   to the following declaration
#[derive(Logos, Debug, Eq, PartialEq, Clone, Copy, Hash)]
#[logos(skip r"[ \t\r\n\f]+")] // Skip whitespace
#[logos(skip r"//[^\n]*")] // Skip line comments
#[logos(skip r"/\*[^*]([^*]|\*[^/])*\*/")] // Skip plain block comments
#[logos(skip r"/\*\*/")] // Skip the degenerate empty block comment
pub enum TokenKind {
    // Keywords
    #[token("abstract")]
    Abstract,
    #[token("assert")]
    Assert,
    #[token("auto")]
    Auto,
    #[token("class")]
    Class,
    #[token("cpp")]
    Cpp,
    #[token("do")]
    Do,
    #[token("else")]
    Else,
    #[token("fiber")]
    Fiber,
    #[token("final")]
    Final,
    #[token("for")]
    For,
    #[token("function")]
    Function,
    #[token("global")]
    Global,
    #[token("hpp")]
    Hpp,
    #[token("if")]
    If,
    #[token("import")]
    Import,
    #[token("in")]
    In,
    #[token("instantiated")]
    Instantiated,
    #[token("nil")]
    Nil,
    #[token("operator")]
    Operator,
    #[token("parallel")]
    Parallel,
    #[token("program")]
    Program,
    #[token("return")]
    Return,
    #[token("super")]
    Super,
    #[token("this")]
    This,
    #[token("type")]
    Type,
    #[token("while")]
    While,
    #[token("yield")]
    Yield,

    // Keyword literals
    #[token("true")]
    True,
    #[token("false")]
    False,

    // Literals
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?")]
    RealLiteral,
    #[regex(r"[0-9]+")]
    IntLiteral,
    #[regex(r#""([^"\\]|\\.)*""#)]
    StringLiteral,

    // Identifiers
    #[regex(r"[A-Za-z][A-Za-z0-9_]*")]
    Identifier,
    #[token("_")]
    Underscore,

    // Doc comments (kept; attached to the following declaration)
    #[regex(r"/\*\*([^*]|\*[^/])*\*/", priority = 10)]
    DocComment,

    // Raw passthrough blocks, `{{ ... }}`
    #[token("{{", raw_block)]
    RawBlock,

    // Assignment family
    #[token("<-")]
    LeftArrow,
    #[token("<~")]
    LeftTilde,
    #[token("~>")]
    RightTilde,
    #[token("~")]
    Tilde,

    // Operators
    #[token("->")]
    Arrow,
    #[token("..")]
    DotDot,
    #[token("::")]
    ColonColon,
    #[token("==")]
    EqualEqual,
    #[token("!=")]
    BangEqual,
    #[token("<=")]
    LessEqual,
    #[token(">=")]
    GreaterEqual,
    #[token("<")]
    Less,
    #[token(">")]
    Greater,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("!")]
    Bang,
    #[token("?")]
    Question,
    #[token("@")]
    At,
    #[token("&")]
    Amp,
    #[token("=")]
    Equal,

    // Delimiters
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("[")]
    LeftBracket,
    #[token("]")]
    RightBracket,
    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
}

impl TokenKind {
    /// A human-readable description, used in error messages.
    #[must_use]
    pub const fn describe(&self) -> &'static str {
        match self {
            Self::Abstract => "'abstract'",
            Self::Assert => "'assert'",
            Self::Auto => "'auto'",
            Self::Class => "'class'",
            Self::Cpp => "'cpp'",
            Self::Do => "'do'",
            Self::Else => "'else'",
            Self::Fiber => "'fiber'",
            Self::Final => "'final'",
            Self::For => "'for'",
            Self::Function => "'function'",
            Self::Global => "'global'",
            Self::Hpp => "'hpp'",
            Self::If => "'if'",
            Self::Import => "'import'",
            Self::In => "'in'",
            Self::Instantiated => "'instantiated'",
            Self::Nil => "'nil'",
            Self::Operator => "'operator'",
            Self::Parallel => "'parallel'",
            Self::Program => "'program'",
            Self::Return => "'return'",
            Self::Super => "'super'",
            Self::This => "'this'",
            Self::Type => "'type'",
            Self::While => "'while'",
            Self::Yield => "'yield'",
            Self::True => "'true'",
            Self::False => "'false'",
            Self::RealLiteral => "real literal",
            Self::IntLiteral => "integer literal",
            Self::StringLiteral => "string literal",
            Self::Identifier => "identifier",
            Self::Underscore => "'_'",
            Self::DocComment => "doc comment",
            Self::RawBlock => "raw block",
            Self::LeftArrow => "'<-'",
            Self::LeftTilde => "'<~'",
            Self::RightTilde => "'~>'",
            Self::Tilde => "'~'",
            Self::Arrow => "'->'",
            Self::DotDot => "'..'",
            Self::ColonColon => "'::'",
            Self::EqualEqual => "'=='",
            Self::BangEqual => "'!='",
            Self::LessEqual => "'<='",
            Self::GreaterEqual => "'>='",
            Self::Less => "'<'",
            Self::Greater => "'>'",
            Self::AmpAmp => "'&&'",
            Self::PipePipe => "'||'",
            Self::Plus => "'+'",
            Self::Minus => "'-'",
            Self::Star => "'*'",
            Self::Slash => "'/'",
            Self::Bang => "'!'",
            Self::Question => "'?'",
            Self::At => "'@'",
            Self::Amp => "'&'",
            Self::Equal => "'='",
            Self::LeftParen => "'('",
            Self::RightParen => "')'",
            Self::LeftBracket => "'['",
            Self::RightBracket => "']'",
            Self::LeftBrace => "'{'",
            Self::RightBrace => "'}'",
            Self::Comma => "','",
            Self::Semicolon => "';'",
            Self::Colon => "':'",
            Self::Dot => "'.'",
        }
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result { write!(f, "{}", self.describe()) }
}

/// A token with its byte span in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// The token kind.
    pub kind: TokenKind,
    /// The byte span of the token text.
    pub span: bine_source::Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: bine_source::Span) -> Self { Self { kind, span } }
}
