// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Function literals.

use tarn_ast::{is_tag_name, Bind, Node, NodeKind};
use tarn_types::{TypeId, TypeNode};

use super::Analyzer;
use crate::code::{BindingKind, ClosureId, ClosureKind, Code, CodeKind};
use crate::error::CompileError;
use crate::scope::Scope;

impl Analyzer<'_> {
    /// Fill the closure slot of a bound lambda. A type annotation on the
    /// binding constrains the slot before the body is analyzed.
    pub(super) fn lambda_bind(
        &mut self,
        closure: ClosureId,
        bind: &Bind,
        scope: &Scope,
        depth: u32,
    ) -> Result<Code, CompileError> {
        if let Some(annotation) = &bind.ty {
            let expected = self.elaborate(annotation, scope, depth)?;
            let slot = self.closures[closure.index()].ty;
            self.unify_or(slot, expected, bind.expr.span, |store, err| {
                let [slot, expected] = store.describe_many([slot, expected]);
                format!("{} (when checking {} is {})", err, slot, expected)
            })?;
        }
        self.closure_mut(closure).bind_name = Some(bind.name.clone());
        self.lambda(closure, &bind.expr, scope, depth)
    }

    /// Analyze `\arg -> body` into the given closure slot. The slot's current
    /// type, when it is already a function, supplies the argument type.
    pub(super) fn lambda(
        &mut self,
        closure: ClosureId,
        node: &Node,
        scope: &Scope,
        depth: u32,
    ) -> Result<Code, CompileError> {
        let NodeKind::Lambda(lambda) = &node.kind else {
            return Err(CompileError::malformed(node.span, "Closed binding must be a function binding"));
        };
        let slot = self.closures[closure.index()].ty;
        let expected = match self.store.node(slot) {
            TypeNode::Fun { arg, ret } => Some((*arg, *ret)),
            _ => None,
        };

        let (arg_ty, body_scope) = match &lambda.arg.kind {
            NodeKind::Unit => (TypeId::UNIT, scope.enter_closure(closure, None)),
            NodeKind::Sym(name) if !is_tag_name(name) => {
                let ty = match expected {
                    Some((arg, _)) => arg,
                    None => self.fresh(depth),
                };
                let binding = self.new_binding(name, ty, BindingKind::Argument(closure), false, lambda.arg.span);
                self.closure_mut(closure).arg = Some(binding);
                (ty, scope.enter_closure(closure, Some((name, binding))))
            }
            _ => {
                return Err(CompileError::malformed(
                    lambda.arg.span,
                    format!("Bad argument: {}", lambda.arg),
                ));
            }
        };
        if self.closures[closure.index()].bind_name.is_none() {
            self.closure_mut(closure).bind_name = lambda.bind_name.clone();
        }

        let mut body = if lambda.expr.is_lambda() {
            // curried: the inner closure is linked under this one first
            let ret = match expected {
                Some((_, ret)) => ret,
                None => self.fresh(depth),
            };
            let inner = self.new_closure(ClosureKind::Function, Some(closure), ret);
            self.lambda(inner, &lambda.expr, &body_scope, depth)?
        } else {
            self.analyze(&lambda.expr, &body_scope, depth)?
        };

        let fun = self.store.fun(arg_ty, body.ty);
        self.unify_or(fun, slot, node.span, |store, err| {
            let [fun, slot] = store.describe_many([fun, slot]);
            format!("Function type {} is not {} (self-binding)\n    {}", fun, slot, err)
        })?;
        body.mark_tail();
        let c = self.closure_mut(closure);
        c.ty = fun;
        c.body = Some(Box::new(body));
        Ok(Code::new(CodeKind::Closure(closure), fun, node.span).polymorphic(true))
    }
}
