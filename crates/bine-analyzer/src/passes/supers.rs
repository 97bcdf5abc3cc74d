//! Pass 2: base types, super edges, conversions, and signature types.
//!
//! For classes this records the inheritance edge (before conversion
//! registration, so a conversion to the class's own super resolves
//! through inheritance), imports the base scope, registers generic
//! parameters, and resolves member types and member signatures. For
//! global function-likes it resolves parameter and return types into
//! fresh body scopes.
//!
//! The central type-expression resolver [`Analyzer::resolve_type`] also
//! lives here; later passes reuse it.

use bine_ast::nodes::{AnyNode, Annotations, NodeId, ResolveState};

use super::Analyzer;
use crate::error::CompileError;
use crate::registry::ClassInfo;
use crate::scope::ScopeKind;
use crate::types::{Type, decl_name, type_to_string};

impl Analyzer<'_> {
    /// Resolves super-level information for one file.
    pub(crate) fn super_file(&mut self, file: NodeId) -> Result<(), CompileError> {
        let stmts = self.ast.children(file);
        for stmt in stmts {
            self.super_decl(stmt)?;
        }
        Ok(())
    }

    /// Resolves super-level information for one declaration.
    pub(crate) fn super_decl(&mut self, decl: NodeId) -> Result<(), CompileError> {
        if self.decl_state(decl) >= ResolveState::Supered {
            return Ok(());
        }

        match self.ast[decl].data.clone() {
            AnyNode::ClassDecl(node) => self.super_class(decl, &node),
            AnyNode::BasicDecl(node) => self.super_basic(decl, &node),
            AnyNode::AliasDecl(node) => self.super_alias(decl, &node),
            AnyNode::FunctionDecl(node) => self.super_function(
                decl,
                &node.type_params,
                &node.params,
                node.return_type,
                false,
            ),
            AnyNode::FiberDecl(node) => self.super_function(
                decl,
                &node.type_params,
                &node.params,
                Some(node.return_type),
                true,
            ),
            AnyNode::BinaryOperatorDecl(node) => self.super_function(
                decl,
                &[],
                &[node.left, node.right],
                node.return_type,
                false,
            ),
            AnyNode::UnaryOperatorDecl(node) => {
                self.super_function(decl, &[], &[node.operand], node.return_type, false)
            }
            AnyNode::ProgramDecl(node) => {
                self.super_function(decl, &[], &node.params, None, false)
            }
            AnyNode::GlobalVariableDecl(node) => self.super_global_variable(decl, &node),
            _ => Ok(()),
        }
    }

    // ---------------------------------------------------------------
    // Classes
    // ---------------------------------------------------------------

    fn super_class(
        &mut self,
        decl: NodeId,
        node: &bine_ast::nodes::ClassDecl,
    ) -> Result<(), CompileError> {
        self.set_decl_state(decl, ResolveState::Supered);

        let parent = self.current_scope();
        let scope = self.scopes.create(ScopeKind::Class, Some(parent));
        let init_scope = self.scopes.create(ScopeKind::Initializer, Some(parent));
        let _ = self.registry.classes.insert(decl, ClassInfo {
            scope,
            init_scope,
            base: None,
            base_decl: None,
            conversions: Vec::new(),
            assignments: Vec::new(),
        });

        self.scoped(scope, |this| {
            // Generic parameters become type entries of the class scope.
            for &param in &node.type_params {
                let name = decl_name(this.ast, param);
                if let Err(previous) = this.scopes.get_mut(scope).add_type(name.clone(), param)
                {
                    return Err(CompileError::PreviousDeclaration {
                        name,
                        loc: this.ast.loc(param).clone(),
                        previous: this.ast.loc(previous).clone(),
                    });
                }
                if let AnyNode::TypeParamDecl(tp) = this.ast[param].data.clone()
                    && let Some(bound) = tp.bound
                {
                    let bound_ty = this.resolve_type(bound)?;
                    let _ = this.registry.bounds.insert(param, bound_ty);
                }
            }

            // The super edge is recorded before anything else of the
            // body, conversions included.
            if let Some(base) = node.base {
                let base_ty = this.resolve_type(base)?;
                let Some(base_decl) = base_ty.class_decl() else {
                    return Err(CompileError::Base {
                        ty: type_to_string(this.ast, &base_ty),
                        loc: this.ast.loc(base).clone(),
                    });
                };
                this.super_decl(base_decl)?;
                if let AnyNode::ClassDecl(base_class) = &this.ast[base_decl].data
                    && base_class.annotations.contains(Annotations::FINAL)
                {
                    return Err(CompileError::FinalBase {
                        class: base_class.name.clone(),
                        loc: this.ast.loc(base).clone(),
                    });
                }
                if let Some(base_info) = this.registry.classes.get(&base_decl) {
                    let base_scope = base_info.scope;
                    this.scopes.inherit(scope, base_scope);
                }
                if let Some(info) = this.registry.classes.get_mut(&decl) {
                    info.base = Some(base_ty);
                    info.base_decl = Some(base_decl);
                }
            }

            // Constructor parameters, visible to member initializers.
            for &param in &node.params {
                let ty = this.parameter_type(param)?;
                let name = decl_name(this.ast, param);
                let _ = this.registry.var_types.insert(param, ty);
                if let Err(previous) =
                    this.scopes.get_mut(init_scope).add_variable(name.clone(), param)
                {
                    return Err(CompileError::PreviousDeclaration {
                        name,
                        loc: this.ast.loc(param).clone(),
                        previous: this.ast.loc(previous).clone(),
                    });
                }
            }

            // Member walk: types and signatures only, no bodies.
            for &member in &node.body {
                match this.ast[member].data.clone() {
                    AnyNode::ConversionOperatorDecl(conv) => {
                        let target = this.resolve_type(conv.target_type)?;
                        if let Some(info) = this.registry.classes.get_mut(&decl) {
                            info.conversions.push(target);
                        }
                        this.set_decl_state(member, ResolveState::Supered);
                    }
                    AnyNode::AssignmentOperatorDecl(assign) => {
                        let ty = this.parameter_type(assign.param)?;
                        let _ = this.registry.var_types.insert(assign.param, ty.clone());
                        if let Some(info) = this.registry.classes.get_mut(&decl) {
                            info.assignments.push(ty);
                        }
                        this.set_decl_state(member, ResolveState::Supered);
                    }
                    AnyNode::MemberVariableDecl(var) => {
                        let mut ty = this.resolve_type(var.ty)?;
                        if !var.brackets.is_empty() {
                            ty = Type::Array {
                                element: Box::new(ty),
                                dims: var.brackets.len(),
                            };
                        }
                        let _ = this.registry.var_types.insert(member, ty);
                        if let Err(previous) =
                            this.scopes.get_mut(scope).add_variable(var.name.clone(), member)
                        {
                            return Err(CompileError::PreviousDeclaration {
                                name: var.name.clone(),
                                loc: this.ast.loc(member).clone(),
                                previous: this.ast.loc(previous).clone(),
                            });
                        }
                    }
                    AnyNode::FunctionDecl(_)
                    | AnyNode::FiberDecl(_) => this.super_decl(member)?,
                    _ => {}
                }
            }

            Ok(())
        })
    }

    // ---------------------------------------------------------------
    // Basics and aliases
    // ---------------------------------------------------------------

    fn super_basic(
        &mut self,
        decl: NodeId,
        node: &bine_ast::nodes::BasicDecl,
    ) -> Result<(), CompileError> {
        self.set_decl_state(decl, ResolveState::Supered);
        if let Some(base) = node.base {
            let base_ty = self.resolve_type(base)?;
            match base_ty {
                Type::Basic(base_decl) => {
                    let _ = self.registry.basic_bases.insert(decl, base_decl);
                }
                other => {
                    return Err(CompileError::Base {
                        ty: type_to_string(self.ast, &other),
                        loc: self.ast.loc(base).clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn super_alias(
        &mut self,
        decl: NodeId,
        node: &bine_ast::nodes::AliasDecl,
    ) -> Result<(), CompileError> {
        self.set_decl_state(decl, ResolveState::Supered);
        let ty = self.resolve_type(node.aliased)?;
        let _ = self.registry.aliases.insert(decl, ty);
        Ok(())
    }

    // ---------------------------------------------------------------
    // Function-likes
    // ---------------------------------------------------------------

    /// Resolves the signature of a function, fiber, operator or program
    /// into a fresh body scope.
    fn super_function(
        &mut self,
        decl: NodeId,
        type_params: &[NodeId],
        params: &[NodeId],
        return_type: Option<NodeId>,
        fiber: bool,
    ) -> Result<(), CompileError> {
        self.set_decl_state(decl, ResolveState::Supered);

        let parent = self.current_scope();
        let scope = self.scopes.create(ScopeKind::Body, Some(parent));
        let _ = self.registry.body_scopes.insert(decl, scope);

        self.scoped(scope, |this| {
            for &param in type_params {
                let name = decl_name(this.ast, param);
                if let Err(previous) = this.scopes.get_mut(scope).add_type(name.clone(), param)
                {
                    return Err(CompileError::PreviousDeclaration {
                        name,
                        loc: this.ast.loc(param).clone(),
                        previous: this.ast.loc(previous).clone(),
                    });
                }
                if let AnyNode::TypeParamDecl(tp) = this.ast[param].data.clone()
                    && let Some(bound) = tp.bound
                {
                    let bound_ty = this.resolve_type(bound)?;
                    let _ = this.registry.bounds.insert(param, bound_ty);
                }
            }

            let mut signature = Vec::with_capacity(params.len());
            let mut defaults = 0usize;
            for &param in params {
                let ty = this.parameter_type(param)?;
                let name = decl_name(this.ast, param);
                let _ = this.registry.var_types.insert(param, ty.clone());
                signature.push(ty);
                if let AnyNode::ParameterDecl(p) = &this.ast[param].data {
                    if p.value.is_some() {
                        defaults += 1;
                    } else {
                        defaults = 0; // Only trailing defaults count.
                    }
                }
                if let Err(previous) =
                    this.scopes.get_mut(scope).add_variable(name.clone(), param)
                {
                    return Err(CompileError::PreviousDeclaration {
                        name,
                        loc: this.ast.loc(param).clone(),
                        previous: this.ast.loc(previous).clone(),
                    });
                }
            }

            let ret = match return_type {
                Some(ty) => this.resolve_type(ty)?,
                None => Type::Empty,
            };
            if fiber && ret.unwrap_fiber().is_none() {
                // The parser wraps fiber return types; a bare one here
                // means the tree was constructed by hand.
                return Err(CompileError::Base {
                    ty: type_to_string(this.ast, &ret),
                    loc: this.ast.loc(decl).clone(),
                });
            }

            let _ = this.registry.signatures.insert(decl, signature);
            let _ = this.registry.defaults.insert(decl, defaults);
            let _ = this.registry.returns.insert(decl, ret);
            Ok(())
        })
    }

    fn super_global_variable(
        &mut self,
        decl: NodeId,
        node: &bine_ast::nodes::GlobalVariableDecl,
    ) -> Result<(), CompileError> {
        let mut ty = self.resolve_type(node.ty)?;
        if !node.brackets.is_empty() {
            ty = Type::Array { element: Box::new(ty), dims: node.brackets.len() };
        }
        let _ = self.registry.var_types.insert(decl, ty);

        let root = self.scopes.root();
        if let Err(previous) = self.scopes.get_mut(root).add_variable(node.name.clone(), decl)
        {
            return Err(CompileError::PreviousDeclaration {
                name: node.name.clone(),
                loc: self.ast.loc(decl).clone(),
                previous: self.ast.loc(previous).clone(),
            });
        }
        Ok(())
    }

    /// The resolved type of a parameter declaration.
    pub(crate) fn parameter_type(&mut self, param: NodeId) -> Result<Type, CompileError> {
        let AnyNode::ParameterDecl(node) = self.ast[param].data.clone() else {
            return Ok(Type::Unknown);
        };
        self.resolve_type(node.ty)
    }

    // ---------------------------------------------------------------
    // Type expression resolution
    // ---------------------------------------------------------------

    /// Resolves a syntactic type expression to a semantic type,
    /// recording resolved targets on named type nodes and triggering
    /// generic class instantiation for concrete argument tuples.
    pub(crate) fn resolve_type(&mut self, id: NodeId) -> Result<Type, CompileError> {
        let ty = match self.ast[id].data.clone() {
            AnyNode::NamedType(node) => {
                let target = match node.target {
                    Some(target) => target,
                    None => {
                        let found =
                            self.stack_find(|scope| scope.find_type(&node.name));
                        let Some(found) = found else {
                            return Err(CompileError::UnresolvedReference {
                                name: node.name.clone(),
                                loc: self.ast.loc(id).clone(),
                            });
                        };
                        if let AnyNode::NamedType(named) = &mut self.ast[id].data {
                            named.target = Some(found);
                        }
                        found
                    }
                };

                let mut args = Vec::with_capacity(node.type_args.len());
                for &arg in &node.type_args {
                    args.push(self.resolve_type(arg)?);
                }

                self.named_target_type(id, target, args)?
            }
            AnyNode::MemberType(node) => {
                let outer = self.resolve_type(node.outer)?;
                let Some(class_decl) = outer.class_decl() else {
                    return Err(CompileError::Member {
                        ty: type_to_string(self.ast, &outer),
                        loc: self.ast.loc(id).clone(),
                    });
                };
                let Some(info) = self.registry.classes.get(&class_decl) else {
                    return Err(CompileError::Member {
                        ty: type_to_string(self.ast, &outer),
                        loc: self.ast.loc(id).clone(),
                    });
                };
                let class_scope = info.scope;
                let AnyNode::NamedType(inner) = self.ast[node.inner].data.clone() else {
                    return Err(CompileError::Member {
                        ty: type_to_string(self.ast, &outer),
                        loc: self.ast.loc(id).clone(),
                    });
                };
                let found = self
                    .scope_find(class_scope, &|scope| scope.find_type(&inner.name))
                    .ok_or_else(|| CompileError::UnresolvedReference {
                        name: inner.name.clone(),
                        loc: self.ast.loc(node.inner).clone(),
                    })?;
                self.named_target_type(node.inner, found, Vec::new())?
            }
            AnyNode::ArrayType(node) => {
                let element = self.resolve_type(node.element)?;
                Type::Array { element: Box::new(element), dims: node.dims }
            }
            AnyNode::TupleType(node) => {
                let mut elements = Vec::with_capacity(node.elements.len());
                for &element in &node.elements {
                    elements.push(self.resolve_type(element)?);
                }
                Type::Tuple(elements)
            }
            AnyNode::SequenceType(node) => {
                Type::Sequence(Box::new(self.resolve_type(node.element)?))
            }
            AnyNode::FunctionType(node) => {
                let mut params = Vec::with_capacity(node.params.len());
                for &param in &node.params {
                    params.push(self.resolve_type(param)?);
                }
                let ret = match node.return_type {
                    Some(ret) => self.resolve_type(ret)?,
                    None => Type::Empty,
                };
                Type::Function { params, ret: Box::new(ret) }
            }
            AnyNode::FiberType(node) => {
                Type::Fiber(Box::new(self.resolve_type(node.yield_type)?))
            }
            AnyNode::OptionalType(node) => {
                Type::Optional(Box::new(self.resolve_type(node.inner)?))
            }
            AnyNode::WeakType(node) => Type::Weak(Box::new(self.resolve_type(node.inner)?)),
            AnyNode::UnknownType(_) => Type::Unknown,
            AnyNode::EmptyType(_) => Type::Empty,
            _ => Type::Unknown,
        };
        Ok(ty)
    }

    /// Builds the semantic type for a resolved named-type target.
    fn named_target_type(
        &mut self,
        at: NodeId,
        target: NodeId,
        args: Vec<Type>,
    ) -> Result<Type, CompileError> {
        match &self.ast[target].data {
            AnyNode::BasicDecl(_) => {
                if self.current_state >= ResolveState::Supered {
                    self.super_decl(target)?;
                }
                Ok(Type::Basic(target))
            }
            AnyNode::TypeParamDecl(_) => Ok(Type::Generic(target)),
            AnyNode::AliasDecl(node) => {
                let name = node.name.clone();
                if self.current_state >= ResolveState::Supered {
                    self.super_decl(target)?;
                }
                self.registry.aliases.get(&target).cloned().ok_or_else(|| {
                    CompileError::UnresolvedReference {
                        name,
                        loc: self.ast.loc(at).clone(),
                    }
                })
            }
            AnyNode::ClassDecl(node) => {
                let generic = !node.type_params.is_empty() && node.instantiation_of.is_none();
                let name = node.name.clone();
                let arity = node.type_params.len();
                if self.current_state >= ResolveState::Supered {
                    self.super_decl(target)?;
                }

                if generic {
                    if args.len() != arity {
                        return Err(CompileError::Base {
                            ty: name,
                            loc: self.ast.loc(at).clone(),
                        });
                    }
                    if args.iter().all(|arg| self.type_is_concrete(arg)) {
                        let loc = self.ast.loc(at).clone();
                        let inst = self.instantiate(target, args.clone(), &loc)?;
                        return Ok(Type::Class { decl: inst, args });
                    }
                    // Unbound arguments stay on the template until an
                    // instantiation substitutes them.
                    return Ok(Type::Class { decl: target, args });
                }

                if !args.is_empty() {
                    return Err(CompileError::Base {
                        ty: name,
                        loc: self.ast.loc(at).clone(),
                    });
                }
                Ok(Type::Class { decl: target, args: Vec::new() })
            }
            _ => Err(CompileError::UnresolvedReference {
                name: decl_name(self.ast, target),
                loc: self.ast.loc(at).clone(),
            }),
        }
    }

    /// True when a type contains no unbound generic parameter.
    pub(crate) fn type_is_concrete(&self, ty: &Type) -> bool {
        match self.registry.substitute(ty) {
            Type::Generic(_) => false,
            Type::Optional(inner)
            | Type::Weak(inner)
            | Type::Fiber(inner)
            | Type::Sequence(inner) => self.type_is_concrete(&inner),
            Type::Array { element, .. } => self.type_is_concrete(&element),
            Type::Tuple(elements) => elements.iter().all(|e| self.type_is_concrete(e)),
            Type::Function { params, ret } => {
                params.iter().all(|p| self.type_is_concrete(p)) && self.type_is_concrete(&ret)
            }
            Type::Class { args, .. } => args.iter().all(|a| self.type_is_concrete(a)),
            _ => true,
        }
    }
}
