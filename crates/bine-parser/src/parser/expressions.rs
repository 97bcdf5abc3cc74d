//! Expression parsing.
//!
//! A conventional precedence ladder. The assignment family (`<-`, `<~`,
//! `~`, `~>`) sits at the bottom and is right-associative; the
//! probabilistic forms are parsed as plain assignment expressions here
//! and rewritten to calls during resolution.

use bine_ast::nodes::{
    AssignExpr,
    AssignOp,
    BinaryCallExpr,
    CallExpr,
    CastExpr,
    GetExpr,
    GlobalExpr,
    LambdaExpr,
    Literal,
    LiteralExpr,
    MemberExpr,
    NamedExpr,
    NilExpr,
    NodeId,
    ParenthesesExpr,
    QueryExpr,
    RangeExpr,
    SequenceExpr,
    SliceExpr,
    SuperExpr,
    ThisExpr,
    UnaryCallExpr,
};
use bine_source::Span;

use super::Parser;
use crate::error::ParseError;
use crate::lexer::TokenKind;

impl Parser<'_> {
    /// Parses a full expression.
    pub(crate) fn expression(&mut self) -> Result<NodeId, ParseError> { self.assignment() }

    fn assignment(&mut self) -> Result<NodeId, ParseError> {
        let start = self.here();
        let left = self.or_expr()?;

        let op = match self.peek() {
            Some(TokenKind::LeftArrow) => AssignOp::Assign,
            Some(TokenKind::LeftTilde) => AssignOp::Simulate,
            Some(TokenKind::Tilde) => AssignOp::Distribute,
            Some(TokenKind::RightTilde) => AssignOp::Observe,
            _ => return Ok(left),
        };
        let _ = self.advance();

        let right = self.assignment()?;
        Ok(self.ast.alloc(AssignExpr { op, left, right }, self.loc_from(start)))
    }

    fn or_expr(&mut self) -> Result<NodeId, ParseError> {
        let start = self.here();
        let mut left = self.and_expr()?;
        while self.at(TokenKind::PipePipe) {
            let _ = self.advance();
            let right = self.and_expr()?;
            left = self.binary(start, "||", left, right);
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<NodeId, ParseError> {
        let start = self.here();
        let mut left = self.equality()?;
        while self.at(TokenKind::AmpAmp) {
            let _ = self.advance();
            let right = self.equality()?;
            left = self.binary(start, "&&", left, right);
        }
        Ok(left)
    }

    fn equality(&mut self) -> Result<NodeId, ParseError> {
        let start = self.here();
        let mut left = self.relational()?;
        loop {
            let name = match self.peek() {
                Some(TokenKind::EqualEqual) => "==",
                Some(TokenKind::BangEqual) => "!=",
                _ => break,
            };
            let _ = self.advance();
            let right = self.relational()?;
            left = self.binary(start, name, left, right);
        }
        Ok(left)
    }

    fn relational(&mut self) -> Result<NodeId, ParseError> {
        let start = self.here();
        let mut left = self.range()?;
        loop {
            let name = match self.peek() {
                Some(TokenKind::Less) => "<",
                Some(TokenKind::Greater) => ">",
                Some(TokenKind::LessEqual) => "<=",
                Some(TokenKind::GreaterEqual) => ">=",
                _ => break,
            };
            let _ = self.advance();
            let right = self.range()?;
            left = self.binary(start, name, left, right);
        }
        Ok(left)
    }

    fn range(&mut self) -> Result<NodeId, ParseError> {
        let start = self.here();
        let left = self.additive()?;
        if self.eat(TokenKind::DotDot) {
            let right = self.additive()?;
            return Ok(self.ast.alloc(RangeExpr { left, right }, self.loc_from(start)));
        }
        Ok(left)
    }

    fn additive(&mut self) -> Result<NodeId, ParseError> {
        let start = self.here();
        let mut left = self.multiplicative()?;
        loop {
            let name = match self.peek() {
                Some(TokenKind::Plus) => "+",
                Some(TokenKind::Minus) => "-",
                _ => break,
            };
            let _ = self.advance();
            let right = self.multiplicative()?;
            left = self.binary(start, name, left, right);
        }
        Ok(left)
    }

    fn multiplicative(&mut self) -> Result<NodeId, ParseError> {
        let start = self.here();
        let mut left = self.prefix()?;
        loop {
            let name = match self.peek() {
                Some(TokenKind::Star) => "*",
                Some(TokenKind::Slash) => "/",
                _ => break,
            };
            let _ = self.advance();
            let right = self.prefix()?;
            left = self.binary(start, name, left, right);
        }
        Ok(left)
    }

    fn prefix(&mut self) -> Result<NodeId, ParseError> {
        let start = self.here();
        let name = match self.peek() {
            Some(TokenKind::Plus) => "+",
            Some(TokenKind::Minus) => "-",
            Some(TokenKind::Bang) => "!",
            _ => return self.postfix(),
        };
        let _ = self.advance();
        let operand = self.prefix()?;
        Ok(self.ast.alloc(
            UnaryCallExpr { name: name.to_string(), operand, target: None },
            self.loc_from(start),
        ))
    }

    fn postfix(&mut self) -> Result<NodeId, ParseError> {
        let start = self.here();
        let mut expr = self.primary()?;

        loop {
            match self.peek() {
                Some(TokenKind::LeftParen) => {
                    let _ = self.advance();
                    let args = self.comma_list(TokenKind::RightParen, |p| p.expression())?;
                    let _ = self.expect(TokenKind::RightParen)?;
                    expr = self.ast.alloc(CallExpr { callee: expr, args }, self.loc_from(start));
                }
                Some(TokenKind::LeftBracket) => {
                    let _ = self.advance();
                    let indexes = self.comma_list(TokenKind::RightBracket, |p| p.expression())?;
                    let _ = self.expect(TokenKind::RightBracket)?;
                    expr = self
                        .ast
                        .alloc(SliceExpr { object: expr, indexes }, self.loc_from(start));
                }
                Some(TokenKind::Dot) => {
                    let _ = self.advance();
                    let member = self.name_expr()?;
                    expr = self
                        .ast
                        .alloc(MemberExpr { object: expr, member }, self.loc_from(start));
                }
                Some(TokenKind::Question) => {
                    let _ = self.advance();
                    expr = self.ast.alloc(QueryExpr { operand: expr }, self.loc_from(start));
                }
                Some(TokenKind::Bang) => {
                    let _ = self.advance();
                    expr = self.ast.alloc(GetExpr { operand: expr }, self.loc_from(start));
                }
                Some(TokenKind::At) => {
                    let _ = self.advance();
                    let target_type = self.type_expr()?;
                    expr = self.ast.alloc(
                        CastExpr { object: expr, target_type },
                        self.loc_from(start),
                    );
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn primary(&mut self) -> Result<NodeId, ParseError> {
        let start = self.here();
        match self.peek() {
            Some(TokenKind::True | TokenKind::False) => {
                let value = self.at(TokenKind::True);
                let _ = self.advance();
                Ok(self
                    .ast
                    .alloc(LiteralExpr { value: Literal::Bool(value) }, self.loc_from(start)))
            }
            Some(TokenKind::IntLiteral) => {
                let token = self.expect(TokenKind::IntLiteral)?;
                let text = self.file.text_at_span(token.span);
                let value = text.parse::<i64>().map_err(|_| ParseError::InvalidLiteral {
                    kind: "integer",
                    text: text.to_string(),
                    loc: self.file.location(token.span),
                })?;
                Ok(self
                    .ast
                    .alloc(LiteralExpr { value: Literal::Int(value) }, self.loc_from(start)))
            }
            Some(TokenKind::RealLiteral) => {
                let token = self.expect(TokenKind::RealLiteral)?;
                let text = self.file.text_at_span(token.span);
                let value = text.parse::<f64>().map_err(|_| ParseError::InvalidLiteral {
                    kind: "real",
                    text: text.to_string(),
                    loc: self.file.location(token.span),
                })?;
                Ok(self
                    .ast
                    .alloc(LiteralExpr { value: Literal::Real(value) }, self.loc_from(start)))
            }
            Some(TokenKind::StringLiteral) => {
                let token = self.expect(TokenKind::StringLiteral)?;
                let text = self.file.text_at_span(token.span);
                let value = unescape(&text[1..text.len() - 1]);
                Ok(self
                    .ast
                    .alloc(LiteralExpr { value: Literal::Str(value) }, self.loc_from(start)))
            }
            Some(TokenKind::Nil) => {
                let _ = self.advance();
                Ok(self.ast.alloc(NilExpr, self.loc_from(start)))
            }
            Some(TokenKind::This) => {
                let _ = self.advance();
                Ok(self.ast.alloc(ThisExpr, self.loc_from(start)))
            }
            Some(TokenKind::Super) => {
                let _ = self.advance();
                Ok(self.ast.alloc(SuperExpr, self.loc_from(start)))
            }
            Some(TokenKind::Global) => {
                let _ = self.advance();
                let _ = self.expect(TokenKind::ColonColon)?;
                let member = self.name_expr()?;
                Ok(self.ast.alloc(GlobalExpr { member }, self.loc_from(start)))
            }
            Some(TokenKind::Identifier) => self.name_expr(),
            Some(TokenKind::LeftParen) => {
                let _ = self.advance();
                let inner = self.expression()?;
                let mut rest = Vec::new();
                while self.eat(TokenKind::Comma) {
                    rest.push(self.expression()?);
                }
                let _ = self.expect(TokenKind::RightParen)?;
                Ok(self
                    .ast
                    .alloc(ParenthesesExpr { inner, rest }, self.loc_from(start)))
            }
            Some(TokenKind::LeftBracket) => {
                let _ = self.advance();
                let elements = self.comma_list(TokenKind::RightBracket, |p| p.expression())?;
                let _ = self.expect(TokenKind::RightBracket)?;
                Ok(self.ast.alloc(SequenceExpr { elements }, self.loc_from(start)))
            }
            Some(TokenKind::Function) => self.lambda(start),
            _ => Err(self.unexpected("an expression")),
        }
    }

    /// Parses an identifier expression, speculatively consuming explicit
    /// generic arguments when they are followed by a call.
    fn name_expr(&mut self) -> Result<NodeId, ParseError> {
        let start = self.here();
        let (name, _) = self.expect_name()?;

        let type_args = if self.at(TokenKind::Less) {
            // `f<Real>(x)` vs the comparison `f < Real`: accept the
            // argument list only when a call follows.
            self.try_parse(|parser| {
                let args = parser.type_args()?;
                if parser.at(TokenKind::LeftParen) {
                    Ok(args)
                } else {
                    Err(parser.unexpected("'(' after generic arguments"))
                }
            })
            .unwrap_or_default()
        } else {
            Vec::new()
        };

        Ok(self.ast.alloc(NamedExpr { name, type_args }, self.loc_from(start)))
    }

    /// Parses a lambda function expression.
    fn lambda(&mut self, start: Span) -> Result<NodeId, ParseError> {
        let _ = self.expect(TokenKind::Function)?;
        let _ = self.expect(TokenKind::LeftParen)?;
        let params = self.comma_list(TokenKind::RightParen, |p| p.parameter())?;
        let _ = self.expect(TokenKind::RightParen)?;

        let return_type =
            if self.eat(TokenKind::Arrow) { Some(self.type_expr()?) } else { None };
        let body = self.braces()?;

        Ok(self
            .ast
            .alloc(LambdaExpr { params, return_type, body }, self.loc_from(start)))
    }

    fn binary(&mut self, start: Span, name: &str, left: NodeId, right: NodeId) -> NodeId {
        self.ast.alloc(
            BinaryCallExpr { name: name.to_string(), left, right, target: None },
            self.loc_from(start),
        )
    }
}

/// Processes the escape sequences of a string literal body.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('0') => out.push('\0'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}
