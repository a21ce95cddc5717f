// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Host objects: member references, construction, `classOf` and
//! `try`/`catch`.

use tarn_ast::{is_tag_name, Node, NodeKind, Span, Try, TypeExpr};
use tarn_types::{TypeId, TypeNode};

use super::Analyzer;
use crate::code::{BindingKind, CatchClause, ClosureKind, Code, CodeKind, TryCatch};
use crate::error::{CompileError, ErrorKind};
use crate::interop::{HostMethod, ResolveError, CLASS_OBJECT};
use crate::scope::Scope;
use crate::type_expr::{resolve_class, Elaborator};

impl Analyzer<'_> {
    fn class_named(&self, name: &str, span: Span, scope: &Scope) -> Result<String, CompileError> {
        resolve_class(name, scope, self.resolver, &self.package)
            .ok_or_else(|| CompileError::unresolved(span, format!("Unknown class: {}", name)))
    }

    /// `target#name` or `target#name(args)`. A class name as the target
    /// selects a static member.
    pub(super) fn object_ref(
        &mut self,
        name: &str,
        args: Option<&[Node]>,
        target: &Node,
        span: Span,
        scope: &Scope,
        depth: u32,
    ) -> Result<Code, CompileError> {
        let static_class = match &target.kind {
            NodeKind::Sym(sym) => match scope.class(sym) {
                Some(class) => Some(class),
                None if is_tag_name(sym) => Some(self.class_named(sym, target.span, scope)?),
                None => None,
            },
            _ => None,
        };
        let (object, class) = match static_class {
            Some(class) => (None, class),
            None => {
                let object = self.analyze(target, scope, depth)?;
                let class = match self.store.node(object.ty) {
                    TypeNode::Host { class, .. } => class.clone(),
                    _ => {
                        return Err(CompileError::mismatch(
                            span,
                            format!(
                                "Cannot reference #{} of {}, a class instance is needed",
                                name,
                                self.describe(object.ty)
                            ),
                        ));
                    }
                };
                (Some(Box::new(object)), class)
            }
        };
        let is_static = object.is_none();

        let Some(args) = args else {
            let field = self
                .resolver
                .field(&class, name, is_static)
                .map_err(|e| unresolved_member(span, e))?;
            let ty = self.elaborate(&field.ty, scope, depth)?;
            let code = CodeKind::HostField { target: object, class, name: field.name, mutable: field.mutable };
            return Ok(Code::new(code, ty, span));
        };

        let args = self.analyze_all(args, scope, depth)?;
        let exported: Vec<TypeExpr> = args.iter().map(|a| self.store.export(a.ty)).collect();
        let method = self
            .resolver
            .method(&class, name, &exported, is_static)
            .map_err(|e| unresolved_member(span, e))?;
        let ret = self.pass_args(&method, &args, span, scope, depth)?;
        let code = CodeKind::HostCall { target: object, class, method: method.name, args };
        Ok(Code::new(code, ret, span))
    }

    /// `new Class(args)`
    pub(super) fn new_object(
        &mut self,
        class: &str,
        args: &[Node],
        span: Span,
        scope: &Scope,
        depth: u32,
    ) -> Result<Code, CompileError> {
        let class = self.class_named(class, span, scope)?;
        let args = self.analyze_all(args, scope, depth)?;
        let exported: Vec<TypeExpr> = args.iter().map(|a| self.store.export(a.ty)).collect();
        let ctor = self
            .resolver
            .constructor(&class, &exported)
            .map_err(|e| unresolved_member(span, e))?;
        self.pass_args(&ctor, &args, span, scope, depth)?;
        let ty = self.store.host(class.clone(), Vec::new());
        Ok(Code::new(CodeKind::New { class, args }, ty, span))
    }

    pub(super) fn class_of(&mut self, class: &str, span: Span, scope: &Scope) -> Result<Code, CompileError> {
        let class = self.class_named(class, span, scope)?;
        let ty = self.store.host(CLASS_OBJECT, Vec::new());
        Ok(Code::new(CodeKind::ClassOf(class), ty, span))
    }

    /// `try block catch E e: handler finally cleanup yrt`. The block runs in
    /// its own closure; every handler must agree with the block's type.
    pub(super) fn try_catch(&mut self, t: &Try, span: Span, scope: &Scope, depth: u32) -> Result<Code, CompileError> {
        let closure = self.new_closure(ClosureKind::Try, scope.nearest_closure(), TypeId::UNIT);
        let inner = scope.enter_closure(closure, None);
        let block = self.analyze(&t.block, &inner, depth)?;

        let cleanup = match &t.cleanup {
            Some(node) => {
                let code = self.analyze(node, &inner, depth)?;
                self.unify_or(code.ty, TypeId::UNIT, node.span, |store, _| {
                    format!("finally block must have a unit type, not {}", store.describe(code.ty))
                })?;
                Some(Box::new(code))
            }
            None => None,
        };

        let mut catches = Vec::with_capacity(t.catches.len());
        for catch in &t.catches {
            let class = self.class_named(&catch.exception, catch.span, scope)?;
            if !self.resolver.is_throwable(&class) {
                return Err(CompileError::mismatch(
                    catch.span,
                    format!("{} is not a throwable class", catch.exception),
                ));
            }
            let ty = self.store.host(class.clone(), Vec::new());
            let (handler_scope, binding) = match &catch.bind {
                Some(name) => {
                    let binding = self.new_binding(name, ty, BindingKind::Caught, false, catch.span);
                    (inner.bind(name, binding), Some(binding))
                }
                None => (inner.clone(), None),
            };
            let handler = self.analyze(&catch.handler, &handler_scope, depth)?;
            self.unify_or(block.ty, handler.ty, catch.handler.span, |store, _| {
                let [h, b] = store.describe_many([handler.ty, block.ty]);
                format!("This catch has {} type, while try block was {}", h, b)
            })?;
            catches.push(CatchClause { class, binding, handler });
        }

        let ty = block.ty;
        self.closure_mut(closure).ty = ty;
        let code = CodeKind::Try(TryCatch { closure, block: Box::new(block), catches, cleanup });
        Ok(Code::new(code, ty, span))
    }

    fn analyze_all(&mut self, nodes: &[Node], scope: &Scope, depth: u32) -> Result<Vec<Code>, CompileError> {
        nodes.iter().map(|n| self.analyze(n, scope, depth)).collect()
    }

    /// Unify arguments with the parameters of a resolved signature and
    /// return its result type. `()` passed for a host parameter is null.
    fn pass_args(
        &mut self,
        method: &HostMethod,
        args: &[Code],
        span: Span,
        scope: &Scope,
        depth: u32,
    ) -> Result<TypeId, CompileError> {
        let mut elaborator = Elaborator::new(&mut self.store, scope, self.resolver, &self.package, depth);
        let params = method
            .params
            .iter()
            .map(|p| elaborator.elaborate(p))
            .collect::<Result<Vec<_>, _>>()?;
        let ret = elaborator.elaborate(&method.ret)?;
        for (i, (arg, param)) in args.iter().zip(params).enumerate() {
            if arg.is_unit_literal() && self.store.node(param).is_host() {
                continue;
            }
            self.unify_or(arg.ty, param, arg.span, |store, err| {
                let [a, p] = store.describe_many([arg.ty, param]);
                format!(
                    "Cannot use {} as argument {} of {}, expected {}\n    {}",
                    a,
                    i + 1,
                    method.name,
                    p,
                    err
                )
            })?;
        }
        Ok(ret)
    }
}

fn unresolved_member(span: Span, err: ResolveError) -> CompileError {
    CompileError::new(ErrorKind::UnresolvedMember, span, err.0.clone()).caused_by(err)
}
