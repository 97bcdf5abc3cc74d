//! Pass 3: overloaded dictionary population and member initializers.
//!
//! Function-like declarations (whose signatures pass 2 already
//! resolved) are inserted into the overloaded dictionary of their
//! enclosing scope, with duplicate detection by parameter-tuple
//! equivalence. Classes get their canonical constructor signature, and
//! member-variable initializers are resolved inside the initializer
//! sub-scope, which only sees constructor parameters and members
//! declared earlier in the body.

use bine_ast::nodes::{AnyNode, NodeId, OverloadKind, ResolveState};

use super::Analyzer;
use crate::error::CompileError;
use crate::types::{Type, decl_name, signature_to_string, type_to_string};

impl Analyzer<'_> {
    /// Populates overloaded dictionaries for one file.
    pub(crate) fn header_file(&mut self, file: NodeId) -> Result<(), CompileError> {
        let stmts = self.ast.children(file);
        for stmt in stmts {
            self.header_decl(stmt)?;
        }
        Ok(())
    }

    /// Populates header-level information for one declaration.
    pub(crate) fn header_decl(&mut self, decl: NodeId) -> Result<(), CompileError> {
        if self.decl_state(decl) >= ResolveState::Headered {
            return Ok(());
        }

        match self.ast[decl].data.clone() {
            AnyNode::FunctionDecl(node) => {
                self.set_decl_state(decl, ResolveState::Headered);
                if node.instantiation_of.is_none() {
                    let kind = if node.member {
                        OverloadKind::MemberFunction
                    } else {
                        OverloadKind::Function
                    };
                    self.insert_overload(kind, &node.name, decl)?;
                }
                Ok(())
            }
            AnyNode::FiberDecl(node) => {
                self.set_decl_state(decl, ResolveState::Headered);
                if node.instantiation_of.is_none() {
                    let kind = if node.member {
                        OverloadKind::MemberFiber
                    } else {
                        OverloadKind::Fiber
                    };
                    self.insert_overload(kind, &node.name, decl)?;
                }
                Ok(())
            }
            AnyNode::BinaryOperatorDecl(node) => {
                self.set_decl_state(decl, ResolveState::Headered);
                self.insert_overload(OverloadKind::BinaryOperator, &node.name, decl)
            }
            AnyNode::UnaryOperatorDecl(node) => {
                self.set_decl_state(decl, ResolveState::Headered);
                self.insert_overload(OverloadKind::UnaryOperator, &node.name, decl)
            }
            AnyNode::ProgramDecl(node) => {
                self.set_decl_state(decl, ResolveState::Headered);
                let scope = self.current_scope();
                if let Err(previous) =
                    self.scopes.get_mut(scope).add_program(node.name.clone(), decl)
                {
                    return Err(CompileError::PreviousDeclaration {
                        name: node.name.clone(),
                        loc: self.ast.loc(decl).clone(),
                        previous: self.ast.loc(previous).clone(),
                    });
                }
                Ok(())
            }
            AnyNode::ClassDecl(node) => self.header_class(decl, &node),
            AnyNode::BasicDecl(_)
            | AnyNode::AliasDecl(_)
            | AnyNode::ConversionOperatorDecl(_)
            | AnyNode::AssignmentOperatorDecl(_) => {
                self.set_decl_state(decl, ResolveState::Headered);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Inserts a declaration into the overloaded dictionary of the
    /// innermost scope, detecting duplicate signatures.
    fn insert_overload(
        &mut self,
        kind: OverloadKind,
        name: &str,
        decl: NodeId,
    ) -> Result<(), CompileError> {
        let scope = self.current_scope();
        let registry = &self.registry;
        let mut le = |a: NodeId, b: NodeId| {
            let (Some(sa), Some(sb)) = (registry.signatures.get(&a), registry.signatures.get(&b))
            else {
                return false;
            };
            registry.sig_at_least_as_specific(sa, sb)
        };

        let set = self.scopes.get_mut(scope).overloaded_mut(kind, name);
        if let Err(previous) = set.insert(decl, &mut le) {
            return Err(CompileError::PreviousDeclaration {
                name: name.to_string(),
                loc: self.ast.loc(decl).clone(),
                previous: self.ast.loc(previous).clone(),
            });
        }

        if log::log_enabled!(log::Level::Trace)
            && let Some(set) = self.scopes.get(scope).overloaded(kind, name)
        {
            let set = set.clone();
            let dot = set.dot(&mut |decl| self.describe_signature(decl));
            log::trace!("inserted {kind} '{name}' as {decl}; set is now\n{dot}");
        }
        Ok(())
    }

    /// Resolves header-level information for a class: the canonical
    /// constructor signature, member dictionaries, and member-variable
    /// initializers.
    fn header_class(
        &mut self,
        decl: NodeId,
        node: &bine_ast::nodes::ClassDecl,
    ) -> Result<(), CompileError> {
        self.set_decl_state(decl, ResolveState::Headered);

        let Some(info) = self.registry.classes.get(&decl) else {
            return Ok(()); // An unresolved template never reaches here.
        };
        let scope = info.scope;
        let init_scope = info.init_scope;

        // The canonical constructor: the declared parameter list.
        let mut signature = Vec::with_capacity(node.params.len());
        let mut defaults = 0usize;
        for &param in &node.params {
            signature.push(
                self.registry.var_types.get(&param).cloned().unwrap_or_default(),
            );
            if let AnyNode::ParameterDecl(p) = &self.ast[param].data {
                if p.value.is_some() {
                    defaults += 1;
                } else {
                    defaults = 0;
                }
            }
        }
        let _ = self.registry.signatures.insert(decl, signature);
        let _ = self.registry.defaults.insert(decl, defaults);

        // Constructor parameter defaults resolve in the initializer
        // sub-scope.
        self.scoped(init_scope, |this| {
            for &param in &node.params {
                if let AnyNode::ParameterDecl(p) = this.ast[param].data.clone()
                    && let Some(value) = p.value
                {
                    let resolved = this.resolve_expr(value)?;
                    this.replace_parameter_value(param, resolved);
                }
            }
            Ok(())
        })?;

        self.scoped(scope, |this| {
            for &member in &node.body {
                match this.ast[member].data.clone() {
                    AnyNode::FunctionDecl(_) | AnyNode::FiberDecl(_) => {
                        this.header_decl(member)?;
                    }
                    AnyNode::MemberVariableDecl(var) => {
                        let declared = this
                            .registry
                            .var_types
                            .get(&member)
                            .cloned()
                            .unwrap_or_default();

                        // Sized brackets and constructor arguments
                        // resolve in the initializer sub-scope, like the
                        // default value.
                        let mut brackets = var.brackets.clone();
                        for bracket in &mut brackets {
                            *bracket = this
                                .scoped(init_scope, |inner| inner.resolve_expr(*bracket))?;
                            let bty = this.registry.type_of(*bracket);
                            let loc = this.ast.loc(*bracket).clone();
                            let integer = this.basic_type("Integer", &loc)?;
                            if !this.registry.definitely(&bty, &integer) {
                                return Err(CompileError::Index {
                                    ty: type_to_string(this.ast, &bty),
                                    loc,
                                });
                            }
                        }

                        let mut args = var.args.clone();
                        let mut arg_types = Vec::with_capacity(args.len());
                        for arg in &mut args {
                            *arg = this
                                .scoped(init_scope, |inner| inner.resolve_expr(*arg))?;
                            arg_types.push(this.registry.type_of(*arg));
                        }
                        if !args.is_empty() {
                            let loc = this.ast.loc(member).clone();
                            let Some(class_decl) =
                                this.registry.substitute(&declared).class_decl()
                            else {
                                return Err(CompileError::Constructor {
                                    class: type_to_string(this.ast, &declared),
                                    args: signature_to_string(this.ast, "", &arg_types),
                                    loc,
                                });
                            };
                            if !this.registry.call_possible(&arg_types, class_decl) {
                                return Err(CompileError::Constructor {
                                    class: decl_name(this.ast, class_decl),
                                    args: signature_to_string(this.ast, "", &arg_types),
                                    loc,
                                });
                            }
                            this.check_constructible(class_decl, &loc)?;
                        }

                        if let AnyNode::MemberVariableDecl(node) =
                            &mut this.ast[member].data
                        {
                            node.brackets = brackets.clone();
                            node.args = args.clone();
                        }

                        // The initializer resolves in the initializer
                        // sub-scope, which cannot see this member or any
                        // later one.
                        if let Some(value) = var.value {
                            let resolved = this.scoped(init_scope, |inner| {
                                inner.resolve_expr(value)
                            })?;
                            if let AnyNode::MemberVariableDecl(node) =
                                &mut this.ast[member].data
                            {
                                node.value = Some(resolved);
                            }

                            let found = this.registry.type_of(resolved);
                            if !this.assignable(&found, &declared) {
                                return Err(CompileError::InitialValue {
                                    declared: type_to_string(this.ast, &declared),
                                    value: type_to_string(this.ast, &found),
                                    loc: this.ast.loc(member).clone(),
                                });
                            }
                        } else if args.is_empty()
                            && brackets.is_empty()
                            && let Type::Class { decl: member_class, .. } =
                                this.registry.substitute(&declared)
                        {
                            // The member is default-constructed, so its
                            // class must be concrete.
                            let loc = this.ast.loc(member).clone();
                            this.check_constructible(member_class, &loc)?;
                        }

                        // Later initializers may reference this member.
                        let _ = this
                            .scopes
                            .get_mut(init_scope)
                            .add_variable(var.name.clone(), member);
                    }
                    _ => {}
                }
            }
            Ok(())
        })
    }

    /// Updates the resolved default value of a parameter declaration.
    pub(crate) fn replace_parameter_value(&mut self, param: NodeId, value: NodeId) {
        if let AnyNode::ParameterDecl(node) = &mut self.ast[param].data {
            node.value = Some(value);
        }
    }

    /// A diagnostic rendering of a declaration's signature.
    pub(crate) fn describe_signature(&self, decl: NodeId) -> String {
        let name = decl_name(self.ast, decl);
        self.registry.signatures.get(&decl).map_or(name.clone(), |sig| {
            signature_to_string(self.ast, &name, sig)
        })
    }
}
