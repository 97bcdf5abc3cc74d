//! Lexer for the Bine programming language.
//!
//! A thin wrapper over the `logos`-derived token enum that produces the
//! full token vector up front, reporting the first unrecognized character
//! as an error with its location.

pub mod token;

use bine_source::SourceFile;
use logos::Logos as _;
pub use token::{Token, TokenKind};

use crate::error::ParseError;

/// Tokenizes a whole source file.
///
/// ## Errors
///
/// Returns [`ParseError::UnrecognizedToken`] for the first character the
/// lexer cannot match.
pub fn tokenize(file: &SourceFile) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(&file.content);

    while let Some(result) = lexer.next() {
        let span = bine_source::Span::new(lexer.span().start, lexer.span().end);
        match result {
            Ok(kind) => tokens.push(Token::new(kind, span)),
            Err(()) => {
                return Err(ParseError::UnrecognizedToken {
                    text: lexer.slice().to_string(),
                    loc: file.location(span),
                });
            }
        }
    }

    Ok(tokens)
}

/// Strips the comment markers and leading asterisk gutter from a doc
/// comment token's text.
#[must_use]
pub fn clean_doc(text: &str) -> String {
    let body = text.strip_prefix("/**").and_then(|t| t.strip_suffix("*/")).unwrap_or(text);
    let mut out = String::new();
    for line in body.lines() {
        let line = line.trim_start();
        let line = line.strip_prefix('*').map_or(line, str::trim_start);
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line.trim_end());
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use bine_source::FileId;

    use super::*;

    fn lex(source: &str) -> Vec<TokenKind> {
        let file = SourceFile::new(FileId::new(1), "test.bi".to_string(), source.to_string());
        tokenize(&file).expect("lexing failed").into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_assignment_family() {
        assert_eq!(
            lex("x <- y <~ z ~> w ~ v"),
            vec![
                TokenKind::Identifier,
                TokenKind::LeftArrow,
                TokenKind::Identifier,
                TokenKind::LeftTilde,
                TokenKind::Identifier,
                TokenKind::RightTilde,
                TokenKind::Identifier,
                TokenKind::Tilde,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn ranges_do_not_swallow_reals() {
        assert_eq!(
            lex("1..10"),
            vec![TokenKind::IntLiteral, TokenKind::DotDot, TokenKind::IntLiteral]
        );
        assert_eq!(lex("1.5"), vec![TokenKind::RealLiteral]);
    }

    #[test]
    fn double_colon_lexes_as_one_token() {
        assert_eq!(
            lex("global::x"),
            vec![TokenKind::Global, TokenKind::ColonColon, TokenKind::Identifier]
        );
        assert_eq!(
            lex("x:Real"),
            vec![TokenKind::Identifier, TokenKind::Colon, TokenKind::Identifier]
        );
    }

    #[test]
    fn doc_comments_are_tokens_and_plain_comments_are_not() {
        assert_eq!(
            lex("/** doc */ class /* plain */ A"),
            vec![TokenKind::DocComment, TokenKind::Class, TokenKind::Identifier]
        );
    }

    #[test]
    fn raw_blocks_run_to_the_closing_delimiter() {
        assert_eq!(
            lex("cpp{{ int x = 0; }}"),
            vec![TokenKind::Cpp, TokenKind::RawBlock]
        );
    }

    #[test]
    fn clean_doc_strips_gutters() {
        assert_eq!(clean_doc("/**\n * One.\n * Two.\n */"), "One.\nTwo.");
    }
}
