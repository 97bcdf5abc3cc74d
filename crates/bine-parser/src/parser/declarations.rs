//! Declaration parsing: classes, basics, aliases, functions, fibers,
//! programs, operators, variables, imports and raw blocks.

use bine_ast::nodes::{
    AliasDecl,
    AnyNode,
    Annotations,
    AssignmentOperatorDecl,
    BasicDecl,
    BinaryOperatorDecl,
    ClassDecl,
    ConversionOperatorDecl,
    FiberDecl,
    FiberType,
    FunctionDecl,
    GlobalVariableDecl,
    ImportStmt,
    InstantiatedStmt,
    MemberVariableDecl,
    NodeId,
    ParameterDecl,
    ProgramDecl,
    ResolveState,
    TypeParamDecl,
    UnaryOperatorDecl,
};
use bine_source::Span;

use super::Parser;
use crate::error::ParseError;
use crate::lexer::TokenKind;

/// The pieces of a variable declaration after the name.
struct VariableParts {
    ty: NodeId,
    brackets: Vec<NodeId>,
    args: Vec<NodeId>,
    value: Option<NodeId>,
}

impl Parser<'_> {
    /// Parses one top-level statement of a source file.
    pub(crate) fn top_statement(&mut self) -> Result<NodeId, ParseError> {
        match self.peek() {
            Some(TokenKind::Class | TokenKind::Final | TokenKind::Abstract) => {
                self.class_decl()
            }
            Some(TokenKind::Type) => self.basic_or_alias_decl(),
            Some(TokenKind::Function) => self.function_decl(false),
            Some(TokenKind::Fiber) => self.fiber_decl(false),
            Some(TokenKind::Program) => self.program_decl(),
            Some(TokenKind::Operator) => self.operator_decl(),
            Some(TokenKind::Import) => self.import_decl(),
            Some(TokenKind::Instantiated) => self.instantiated_decl(),
            Some(TokenKind::Cpp | TokenKind::Hpp) => self.raw_stmt(),
            Some(TokenKind::Identifier) if self.peek_at(1) == Some(TokenKind::Colon) => {
                self.global_variable_decl()
            }
            _ => Err(self.unexpected("a declaration")),
        }
    }

    // ---------------------------------------------------------------
    // Classes
    // ---------------------------------------------------------------

    fn class_decl(&mut self) -> Result<NodeId, ParseError> {
        let start = self.here();
        let doc = self.doc_here();

        let mut annotations = Annotations::empty();
        loop {
            if self.eat(TokenKind::Final) {
                annotations |= Annotations::FINAL;
            } else if self.eat(TokenKind::Abstract) {
                annotations |= Annotations::ABSTRACT;
            } else {
                break;
            }
        }

        let _ = self.expect(TokenKind::Class)?;
        let (name, _) = self.expect_name()?;

        // `class C<T> ...` (type parameters) vs `class C < Base ...`
        // (base clause): accept the parameter list only when the class
        // header continues after it.
        let type_params = if self.at(TokenKind::Less) {
            self.try_parse(|parser| {
                let params = parser.type_params()?;
                match parser.peek() {
                    Some(
                        TokenKind::LeftParen | TokenKind::Less | TokenKind::LeftBrace,
                    ) => Ok(params),
                    _ => Err(parser.unexpected("the class header")),
                }
            })
            .unwrap_or_default()
        } else {
            Vec::new()
        };

        let mut params = Vec::new();
        if self.eat(TokenKind::LeftParen) {
            params = self.comma_list(TokenKind::RightParen, |p| p.parameter())?;
            let _ = self.expect(TokenKind::RightParen)?;
        }

        let mut base = None;
        let mut base_args = Vec::new();
        if self.eat(TokenKind::Less) {
            base = Some(self.type_expr()?);
            if self.eat(TokenKind::LeftParen) {
                base_args = self.comma_list(TokenKind::RightParen, |p| p.expression())?;
                let _ = self.expect(TokenKind::RightParen)?;
            }
        }

        let _ = self.expect(TokenKind::LeftBrace)?;
        let mut body = Vec::new();
        while !self.at(TokenKind::RightBrace) && !self.at_end() {
            body.push(self.member_decl()?);
        }
        let _ = self.expect(TokenKind::RightBrace)?;

        let loc = self.loc_from(start).with_doc(doc);
        Ok(self.ast.alloc(
            ClassDecl {
                name,
                type_params,
                params,
                base,
                base_args,
                body,
                annotations,
                state: ResolveState::Cloned,
                instantiations: Vec::new(),
                instantiation_of: None,
            },
            loc,
        ))
    }

    /// Parses one member declaration of a class body.
    fn member_decl(&mut self) -> Result<NodeId, ParseError> {
        match self.peek() {
            Some(TokenKind::Function) => self.function_decl(true),
            Some(TokenKind::Fiber) => self.fiber_decl(true),
            Some(TokenKind::Operator) => match self.peek_at(1) {
                Some(TokenKind::Arrow) => self.conversion_operator_decl(),
                Some(TokenKind::LeftArrow) => self.assignment_operator_decl(),
                _ => Err(self.unexpected("'->' or '<-' after 'operator'")),
            },
            Some(TokenKind::Cpp | TokenKind::Hpp) => self.raw_stmt(),
            Some(TokenKind::Identifier) if self.peek_at(1) == Some(TokenKind::Colon) => {
                self.member_variable_decl()
            }
            _ => Err(self.unexpected("a member declaration")),
        }
    }

    // ---------------------------------------------------------------
    // Basic types and aliases
    // ---------------------------------------------------------------

    fn basic_or_alias_decl(&mut self) -> Result<NodeId, ParseError> {
        let start = self.here();
        let doc = self.doc_here();
        let _ = self.expect(TokenKind::Type)?;
        let (name, _) = self.expect_name()?;

        if self.eat(TokenKind::Equal) {
            let aliased = self.type_expr()?;
            let _ = self.expect(TokenKind::Semicolon)?;
            let loc = self.loc_from(start).with_doc(doc);
            return Ok(self
                .ast
                .alloc(AliasDecl { name, aliased, state: ResolveState::Cloned }, loc));
        }

        let base = if self.eat(TokenKind::Less) { Some(self.type_expr()?) } else { None };
        let _ = self.expect(TokenKind::Semicolon)?;
        let loc = self.loc_from(start).with_doc(doc);
        Ok(self
            .ast
            .alloc(BasicDecl { name, base, state: ResolveState::Cloned }, loc))
    }

    // ---------------------------------------------------------------
    // Functions, fibers, programs
    // ---------------------------------------------------------------

    fn function_decl(&mut self, member: bool) -> Result<NodeId, ParseError> {
        let start = self.here();
        let doc = self.doc_here();
        let _ = self.expect(TokenKind::Function)?;
        let (name, _) = self.expect_name()?;

        let type_params =
            if self.at(TokenKind::Less) { self.type_params()? } else { Vec::new() };

        let _ = self.expect(TokenKind::LeftParen)?;
        let params = self.comma_list(TokenKind::RightParen, |p| p.parameter())?;
        let _ = self.expect(TokenKind::RightParen)?;

        let return_type =
            if self.eat(TokenKind::Arrow) { Some(self.type_expr()?) } else { None };
        let body = self.optional_body()?;

        let loc = self.loc_from(start).with_doc(doc);
        Ok(self.ast.alloc(
            FunctionDecl {
                name,
                type_params,
                params,
                return_type,
                body,
                annotations: Annotations::empty(),
                member,
                state: ResolveState::Cloned,
                instantiations: Vec::new(),
                instantiation_of: None,
            },
            loc,
        ))
    }

    fn fiber_decl(&mut self, member: bool) -> Result<NodeId, ParseError> {
        let start = self.here();
        let doc = self.doc_here();
        let _ = self.expect(TokenKind::Fiber)?;
        let (name, _) = self.expect_name()?;

        let type_params =
            if self.at(TokenKind::Less) { self.type_params()? } else { Vec::new() };

        let _ = self.expect(TokenKind::LeftParen)?;
        let params = self.comma_list(TokenKind::RightParen, |p| p.parameter())?;
        let _ = self.expect(TokenKind::RightParen)?;

        let _ = self.expect(TokenKind::Arrow)?;
        let declared = self.type_expr()?;

        // The return type of a fiber is always the fiber wrapper around
        // its yield type; accept a bare yield type and wrap it.
        let return_type = if matches!(self.ast[declared].data, AnyNode::FiberType(_)) {
            declared
        } else {
            let loc = self.ast[declared].loc.clone();
            self.ast.alloc(FiberType { yield_type: declared }, loc)
        };

        let body = self.optional_body()?;

        let loc = self.loc_from(start).with_doc(doc);
        Ok(self.ast.alloc(
            FiberDecl {
                name,
                type_params,
                params,
                return_type,
                body,
                annotations: Annotations::empty(),
                member,
                state: ResolveState::Cloned,
                instantiations: Vec::new(),
                instantiation_of: None,
            },
            loc,
        ))
    }

    fn program_decl(&mut self) -> Result<NodeId, ParseError> {
        let start = self.here();
        let doc = self.doc_here();
        let _ = self.expect(TokenKind::Program)?;
        let (name, _) = self.expect_name()?;

        let _ = self.expect(TokenKind::LeftParen)?;
        let params = self.comma_list(TokenKind::RightParen, |p| p.parameter())?;
        let _ = self.expect(TokenKind::RightParen)?;
        let body = self.optional_body()?;

        let loc = self.loc_from(start).with_doc(doc);
        Ok(self
            .ast
            .alloc(ProgramDecl { name, params, body, state: ResolveState::Cloned }, loc))
    }

    // ---------------------------------------------------------------
    // Operators
    // ---------------------------------------------------------------

    fn operator_decl(&mut self) -> Result<NodeId, ParseError> {
        let start = self.here();
        let doc = self.doc_here();
        let _ = self.expect(TokenKind::Operator)?;
        let _ = self.expect(TokenKind::LeftParen)?;

        if let Some(name) = self.operator_symbol() {
            // `operator (-x:Real) -> Real`
            let _ = self.advance();
            let operand = self.parameter()?;
            let _ = self.expect(TokenKind::RightParen)?;
            let return_type =
                if self.eat(TokenKind::Arrow) { Some(self.type_expr()?) } else { None };
            let body = self.optional_body()?;
            let loc = self.loc_from(start).with_doc(doc);
            return Ok(self.ast.alloc(
                UnaryOperatorDecl {
                    name: name.to_string(),
                    operand,
                    return_type,
                    body,
                    state: ResolveState::Cloned,
                },
                loc,
            ));
        }

        // `operator (x:Real + y:Real) -> Real`
        let left = self.parameter()?;
        let Some(name) = self.operator_symbol() else {
            return Err(self.unexpected("an operator symbol"));
        };
        let _ = self.advance();
        let right = self.parameter()?;
        let _ = self.expect(TokenKind::RightParen)?;
        let return_type =
            if self.eat(TokenKind::Arrow) { Some(self.type_expr()?) } else { None };
        let body = self.optional_body()?;
        let loc = self.loc_from(start).with_doc(doc);
        Ok(self.ast.alloc(
            BinaryOperatorDecl {
                name: name.to_string(),
                left,
                right,
                return_type,
                body,
                state: ResolveState::Cloned,
            },
            loc,
        ))
    }

    fn conversion_operator_decl(&mut self) -> Result<NodeId, ParseError> {
        let start = self.here();
        let doc = self.doc_here();
        let _ = self.expect(TokenKind::Operator)?;
        let _ = self.expect(TokenKind::Arrow)?;
        let target_type = self.type_expr()?;
        let body = self.optional_body()?;
        let loc = self.loc_from(start).with_doc(doc);
        Ok(self.ast.alloc(
            ConversionOperatorDecl { target_type, body, state: ResolveState::Cloned },
            loc,
        ))
    }

    fn assignment_operator_decl(&mut self) -> Result<NodeId, ParseError> {
        let start = self.here();
        let doc = self.doc_here();
        let _ = self.expect(TokenKind::Operator)?;
        let _ = self.expect(TokenKind::LeftArrow)?;
        let param = self.parameter()?;
        let body = self.optional_body()?;
        let loc = self.loc_from(start).with_doc(doc);
        Ok(self.ast.alloc(
            AssignmentOperatorDecl { param, body, state: ResolveState::Cloned },
            loc,
        ))
    }

    /// The operator symbol at the cursor, if the current token is one.
    fn operator_symbol(&self) -> Option<&'static str> {
        match self.peek() {
            Some(TokenKind::Plus) => Some("+"),
            Some(TokenKind::Minus) => Some("-"),
            Some(TokenKind::Star) => Some("*"),
            Some(TokenKind::Slash) => Some("/"),
            Some(TokenKind::EqualEqual) => Some("=="),
            Some(TokenKind::BangEqual) => Some("!="),
            Some(TokenKind::Less) => Some("<"),
            Some(TokenKind::Greater) => Some(">"),
            Some(TokenKind::LessEqual) => Some("<="),
            Some(TokenKind::GreaterEqual) => Some(">="),
            Some(TokenKind::AmpAmp) => Some("&&"),
            Some(TokenKind::PipePipe) => Some("||"),
            Some(TokenKind::Bang) => Some("!"),
            _ => None,
        }
    }

    // ---------------------------------------------------------------
    // Variables
    // ---------------------------------------------------------------

    fn global_variable_decl(&mut self) -> Result<NodeId, ParseError> {
        let start = self.here();
        let doc = self.doc_here();
        let (name, _) = self.expect_name()?;
        let parts = self.variable_parts()?;
        let _ = self.expect(TokenKind::Semicolon)?;
        let loc = self.loc_from(start).with_doc(doc);
        Ok(self.ast.alloc(
            GlobalVariableDecl {
                name,
                ty: parts.ty,
                brackets: parts.brackets,
                args: parts.args,
                value: parts.value,
            },
            loc,
        ))
    }

    fn member_variable_decl(&mut self) -> Result<NodeId, ParseError> {
        let start = self.here();
        let doc = self.doc_here();
        let (name, _) = self.expect_name()?;
        let parts = self.variable_parts()?;
        let _ = self.expect(TokenKind::Semicolon)?;
        let loc = self.loc_from(start).with_doc(doc);
        Ok(self.ast.alloc(
            MemberVariableDecl {
                name,
                ty: parts.ty,
                brackets: parts.brackets,
                args: parts.args,
                value: parts.value,
            },
            loc,
        ))
    }

    /// Parses `:Type [sizes] [(args)] [<- value]` after a variable name.
    fn variable_parts(&mut self) -> Result<VariableParts, ParseError> {
        let _ = self.expect(TokenKind::Colon)?;
        let ty = self.type_expr()?;

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

        Ok(VariableParts { ty, brackets, args, value })
    }

    // ---------------------------------------------------------------
    // Imports, explicit instantiations
    // ---------------------------------------------------------------

    fn import_decl(&mut self) -> Result<NodeId, ParseError> {
        let start = self.here();
        let _ = self.expect(TokenKind::Import)?;
        let (mut name, _) = self.expect_name()?;
        while self.eat(TokenKind::Dot) {
            let (part, _) = self.expect_name()?;
            name.push('.');
            name.push_str(&part);
        }
        let _ = self.expect(TokenKind::Semicolon)?;
        Ok(self.ast.alloc(ImportStmt { name }, self.loc_from(start)))
    }

    fn instantiated_decl(&mut self) -> Result<NodeId, ParseError> {
        let start = self.here();
        let _ = self.expect(TokenKind::Instantiated)?;
        let ty = self.type_expr()?;
        let _ = self.expect(TokenKind::Semicolon)?;
        Ok(self.ast.alloc(InstantiatedStmt { ty }, self.loc_from(start)))
    }

    // ---------------------------------------------------------------
    // Shared pieces
    // ---------------------------------------------------------------

    /// Parses a parameter declaration `name:Type [<- default]`.
    pub(crate) fn parameter(&mut self) -> Result<NodeId, ParseError> {
        let start = self.here();
        let (name, _) = self.expect_name()?;
        let _ = self.expect(TokenKind::Colon)?;
        let ty = self.type_expr()?;
        let value = if self.eat(TokenKind::LeftArrow) { Some(self.expression()?) } else { None };
        Ok(self
            .ast
            .alloc(ParameterDecl { name, ty, value }, self.loc_from(start)))
    }

    /// Parses a generic type parameter list `<T, U:Bound>`.
    pub(crate) fn type_params(&mut self) -> Result<Vec<NodeId>, ParseError> {
        let _ = self.expect(TokenKind::Less)?;
        let mut params = Vec::new();
        loop {
            let start = self.here();
            let (name, _span): (String, Span) = self.expect_name()?;
            let bound = if self.eat(TokenKind::Colon) { Some(self.type_expr()?) } else { None };
            params.push(self.ast.alloc(TypeParamDecl { name, bound }, self.loc_from(start)));
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        let _ = self.expect(TokenKind::Greater)?;
        Ok(params)
    }

    /// Parses a braces body, or accepts `;` for a bodiless declaration
    /// (as found in interface files).
    fn optional_body(&mut self) -> Result<Option<NodeId>, ParseError> {
        if self.at(TokenKind::LeftBrace) {
            Ok(Some(self.braces()?))
        } else {
            let _ = self.expect(TokenKind::Semicolon)?;
            Ok(None)
        }
    }
}
