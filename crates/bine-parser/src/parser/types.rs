//! Type expression parsing.

use bine_ast::nodes::{
    ArrayType,
    FiberType,
    FunctionType,
    MemberType,
    NamedType,
    NodeId,
    OptionalType,
    SequenceType,
    TupleType,
    WeakType,
};

use super::Parser;
use crate::error::ParseError;
use crate::lexer::TokenKind;

impl Parser<'_> {
    /// Parses a type expression, including postfix wrappers
    /// (`?` optional, `!` fiber, `&` weak, `[_, _]` array).
    pub(crate) fn type_expr(&mut self) -> Result<NodeId, ParseError> {
        let start = self.here();
        let mut ty = self.primary_type()?;

        loop {
            if self.eat(TokenKind::Question) {
                ty = self.ast.alloc(OptionalType { inner: ty }, self.loc_from(start));
            } else if self.eat(TokenKind::Bang) {
                ty = self.ast.alloc(FiberType { yield_type: ty }, self.loc_from(start));
            } else if self.eat(TokenKind::Amp) {
                ty = self.ast.alloc(WeakType { inner: ty }, self.loc_from(start));
            } else if self.at(TokenKind::LeftBracket)
                && self.peek_at(1) == Some(TokenKind::Underscore)
            {
                // An array type postfix; sized brackets belong to variable
                // declarations, not to the type.
                let _ = self.advance();
                let mut dims = 0;
                loop {
                    let _ = self.expect(TokenKind::Underscore)?;
                    dims += 1;
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                let _ = self.expect(TokenKind::RightBracket)?;
                ty = self.ast.alloc(ArrayType { element: ty, dims }, self.loc_from(start));
            } else {
                break;
            }
        }

        Ok(ty)
    }

    /// Parses a type without postfix wrappers.
    fn primary_type(&mut self) -> Result<NodeId, ParseError> {
        let start = self.here();
        match self.peek() {
            Some(TokenKind::Identifier) => {
                let mut ty = self.named_type()?;
                while self.eat(TokenKind::Dot) {
                    let inner = self.named_type()?;
                    ty = self.ast.alloc(MemberType { outer: ty, inner }, self.loc_from(start));
                }
                Ok(ty)
            }
            Some(TokenKind::LeftParen) => {
                let _ = self.advance();
                let elements =
                    self.comma_list(TokenKind::RightParen, |parser| parser.type_expr())?;
                let _ = self.expect(TokenKind::RightParen)?;

                if self.eat(TokenKind::Arrow) {
                    let return_type = Some(self.type_expr()?);
                    return Ok(self.ast.alloc(
                        FunctionType { params: elements, return_type },
                        self.loc_from(start),
                    ));
                }

                match elements.len() {
                    // A parenthesised single type is just that type.
                    1 => Ok(elements[0]),
                    _ => Ok(self.ast.alloc(TupleType { elements }, self.loc_from(start))),
                }
            }
            Some(TokenKind::LeftBracket) => {
                let _ = self.advance();
                let element = self.type_expr()?;
                let _ = self.expect(TokenKind::RightBracket)?;
                Ok(self.ast.alloc(SequenceType { element }, self.loc_from(start)))
            }
            _ => Err(self.unexpected("a type")),
        }
    }

    /// Parses a named type with optional generic arguments.
    pub(crate) fn named_type(&mut self) -> Result<NodeId, ParseError> {
        let start = self.here();
        let (name, _) = self.expect_name()?;
        let type_args = if self.at(TokenKind::Less) { self.type_args()? } else { Vec::new() };
        Ok(self.ast.alloc(NamedType { name, type_args, target: None }, self.loc_from(start)))
    }

    /// Parses an angle-bracketed generic argument list.
    pub(crate) fn type_args(&mut self) -> Result<Vec<NodeId>, ParseError> {
        let _ = self.expect(TokenKind::Less)?;
        let mut args = Vec::new();
        loop {
            args.push(self.type_expr()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        let _ = self.expect(TokenKind::Greater)?;
        Ok(args)
    }
}
