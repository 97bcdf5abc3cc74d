//! Statement parsing.

use bine_ast::nodes::{
    Annotations,
    AssertStmt,
    BracesStmt,
    DoWhileStmt,
    ExpressionStmt,
    ForStmt,
    IfStmt,
    LocalVariableExpr,
    NodeId,
    RawStmt,
    RawTag,
    ReturnStmt,
    WhileStmt,
    YieldStmt,
};

use super::Parser;
use crate::error::ParseError;
use crate::lexer::TokenKind;

impl Parser<'_> {
    /// Parses a braces block.
    pub(crate) fn braces(&mut self) -> Result<NodeId, ParseError> {
        let start = self.here();
        let _ = self.expect(TokenKind::LeftBrace)?;
        let mut stmts = Vec::new();
        while !self.at(TokenKind::RightBrace) && !self.at_end() {
            stmts.push(self.statement()?);
        }
        let _ = self.expect(TokenKind::RightBrace)?;
        Ok(self.ast.alloc(BracesStmt { stmts }, self.loc_from(start)))
    }

    /// Parses one statement inside a body.
    pub(crate) fn statement(&mut self) -> Result<NodeId, ParseError> {
        match self.peek() {
            Some(TokenKind::If) => self.if_stmt(),
            Some(TokenKind::For | TokenKind::Parallel) => self.for_stmt(),
            Some(TokenKind::While) => self.while_stmt(),
            Some(TokenKind::Do) => self.do_while_stmt(),
            Some(TokenKind::Return) => self.return_stmt(),
            Some(TokenKind::Yield) => self.yield_stmt(),
            Some(TokenKind::Assert) => self.assert_stmt(),
            Some(TokenKind::LeftBrace) => self.braces(),
            Some(TokenKind::Cpp | TokenKind::Hpp) => self.raw_stmt(),
            Some(TokenKind::Auto) => self.local_variable_stmt(),
            Some(TokenKind::Identifier) if self.peek_at(1) == Some(TokenKind::Colon) => {
                self.local_variable_stmt()
            }
            _ => {
                let start = self.here();
                let expr = self.expression()?;
                let _ = self.expect(TokenKind::Semicolon)?;
                Ok(self.ast.alloc(ExpressionStmt { expr }, self.loc_from(start)))
            }
        }
    }

    fn if_stmt(&mut self) -> Result<NodeId, ParseError> {
        let start = self.here();
        let _ = self.expect(TokenKind::If)?;
        let _ = self.expect(TokenKind::LeftParen)?;
        let cond = self.expression()?;
        let _ = self.expect(TokenKind::RightParen)?;
        let then_block = self.braces()?;

        let else_block = if self.eat(TokenKind::Else) {
            if self.at(TokenKind::If) { Some(self.if_stmt()?) } else { Some(self.braces()?) }
        } else {
            None
        };

        Ok(self
            .ast
            .alloc(IfStmt { cond, then_block, else_block }, self.loc_from(start)))
    }

    fn for_stmt(&mut self) -> Result<NodeId, ParseError> {
        let start = self.here();
        let mut annotations = Annotations::empty();
        if self.eat(TokenKind::Parallel) {
            annotations |= Annotations::PARALLEL;
        }
        let _ = self.expect(TokenKind::For)?;
        let _ = self.expect(TokenKind::LeftParen)?;

        let index_start = self.here();
        let index = if self.eat(TokenKind::Auto) {
            let (name, _) = self.expect_name()?;
            self.ast.alloc(
                LocalVariableExpr {
                    name,
                    ty: None,
                    brackets: Vec::new(),
                    args: Vec::new(),
                    value: None,
                    annotations: Annotations::AUTO,
                },
                self.loc_from(index_start),
            )
        } else {
            let (name, _) = self.expect_name()?;
            let _ = self.expect(TokenKind::Colon)?;
            let ty = Some(self.type_expr()?);
            self.ast.alloc(
                LocalVariableExpr {
                    name,
                    ty,
                    brackets: Vec::new(),
                    args: Vec::new(),
                    value: None,
                    annotations: Annotations::empty(),
                },
                self.loc_from(index_start),
            )
        };

        let _ = self.expect(TokenKind::In)?;
        let range = self.expression()?;
        let _ = self.expect(TokenKind::RightParen)?;
        let body = self.braces()?;

        Ok(self
            .ast
            .alloc(ForStmt { index, range, body, annotations }, self.loc_from(start)))
    }

    fn while_stmt(&mut self) -> Result<NodeId, ParseError> {
        let start = self.here();
        let _ = self.expect(TokenKind::While)?;
        let _ = self.expect(TokenKind::LeftParen)?;
        let cond = self.expression()?;
        let _ = self.expect(TokenKind::RightParen)?;
        let body = self.braces()?;
        Ok(self.ast.alloc(WhileStmt { cond, body }, self.loc_from(start)))
    }

    fn do_while_stmt(&mut self) -> Result<NodeId, ParseError> {
        let start = self.here();
        let _ = self.expect(TokenKind::Do)?;
        let body = self.braces()?;
        let _ = self.expect(TokenKind::While)?;
        let _ = self.expect(TokenKind::LeftParen)?;
        let cond = self.expression()?;
        let _ = self.expect(TokenKind::RightParen)?;
        let _ = self.expect(TokenKind::Semicolon)?;
        Ok(self.ast.alloc(DoWhileStmt { body, cond }, self.loc_from(start)))
    }

    fn return_stmt(&mut self) -> Result<NodeId, ParseError> {
        let start = self.here();
        let _ = self.expect(TokenKind::Return)?;
        let value =
            if self.at(TokenKind::Semicolon) { None } else { Some(self.expression()?) };
        let _ = self.expect(TokenKind::Semicolon)?;
        Ok(self.ast.alloc(ReturnStmt { value }, self.loc_from(start)))
    }

    fn yield_stmt(&mut self) -> Result<NodeId, ParseError> {
        let start = self.here();
        let _ = self.expect(TokenKind::Yield)?;
        let value = self.expression()?;
        let _ = self.expect(TokenKind::Semicolon)?;
        Ok(self.ast.alloc(YieldStmt { value }, self.loc_from(start)))
    }

    fn assert_stmt(&mut self) -> Result<NodeId, ParseError> {
        let start = self.here();
        let _ = self.expect(TokenKind::Assert)?;
        let cond = self.expression()?;
        let _ = self.expect(TokenKind::Semicolon)?;
        Ok(self.ast.alloc(AssertStmt { cond }, self.loc_from(start)))
    }

    /// Parses a raw passthrough block (`cpp{{ ... }}` or `hpp{{ ... }}`).
    pub(crate) fn raw_stmt(&mut self) -> Result<NodeId, ParseError> {
        let start = self.here();
        let tag = if self.eat(TokenKind::Cpp) {
            RawTag::Source
        } else {
            let _ = self.expect(TokenKind::Hpp)?;
            RawTag::Header
        };
        let token = self.expect(TokenKind::RawBlock)?;
        let slice = self.file.text_at_span(token.span);
        let text = slice
            .strip_prefix("{{")
            .and_then(|t| t.strip_suffix("}}"))
            .unwrap_or(slice)
            .to_string();
        Ok(self.ast.alloc(RawStmt { tag, text }, self.loc_from(start)))
    }

    /// Parses a local variable declaration statement.
    fn local_variable_stmt(&mut self) -> Result<NodeId, ParseError> {
        let start = self.here();
        let local = self.local_variable()?;
        let _ = self.expect(TokenKind::Semicolon)?;
        Ok(self.ast.alloc(ExpressionStmt { expr: local }, self.loc_from(start)))
    }

    /// Parses the local variable form shared by statements and `for`
    /// indexes: either `auto x <- e` or
    /// `x:Type [sizes] [(args)] [<- e]`.
    pub(crate) fn local_variable(&mut self) -> Result<NodeId, ParseError> {
        let start = self.here();
        if self.eat(TokenKind::Auto) {
            let (name, _) = self.expect_name()?;
            let _ = self.expect(TokenKind::LeftArrow)?;
            let value = Some(self.expression()?);
            return Ok(self.ast.alloc(
                LocalVariableExpr {
                    name,
                    ty: None,
                    brackets: Vec::new(),
                    args: Vec::new(),
                    value,
                    annotations: Annotations::AUTO,
                },
                self.loc_from(start),
            ));
        }

        let (name, _) = self.expect_name()?;
        let _ = self.expect(TokenKind::Colon)?;
        let ty = Some(self.type_expr()?);

        let mut brackets = Vec::new();
        if self.at(TokenKind::LeftBracket) {
            let _ = self.advance();
            brackets = self.comma_list(TokenKind::RightBracket, |p| p.expression())?;
            let _ = self.expect(TokenKind::RightBracket)?;
        }

        let mut args = Vec::new();
        if self.at(TokenKind::LeftParen) {
            let _ = self.advance();
            args = self.comma_list(TokenKind::RightParen, |p| p.expression())?;
            let _ = self.expect(TokenKind::RightParen)?;
        }

        let value = if self.eat(TokenKind::LeftArrow) { Some(self.expression()?) } else { None };

        Ok(self.ast.alloc(
            LocalVariableExpr {
                name,
                ty,
                brackets,
                args,
                value,
                annotations: Annotations::empty(),
            },
            self.loc_from(start),
        ))
    }
}
