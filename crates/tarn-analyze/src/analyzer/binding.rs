// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Statement sequences and bindings.

use tarn_ast::{Bind, CastKind, Node, NodeKind, Span};
use tarn_types::TypeId;

use super::Analyzer;
use crate::code::{BindingId, BindingKind, ClosureKind, Code, CodeKind, Statement};
use crate::error::{CompileError, ErrorKind};
use crate::scope::Scope;

impl Analyzer<'_> {
    /// `a; b; c`. Each binding is visible to the statements after it.
    /// Every plain binding must be referenced somewhere after it.
    pub(super) fn seq(&mut self, items: &[Node], span: Span, scope: &Scope, depth: u32) -> Result<Code, CompileError> {
        let Some((last, statements_nodes)) = items.split_last() else {
            return Ok(Code::new(CodeKind::Unit, TypeId::UNIT, span));
        };
        let mut scope = scope.clone();
        let mut statements = Vec::with_capacity(statements_nodes.len());
        let mut bound: Vec<(BindingId, Span)> = Vec::new();

        for node in statements_nodes {
            match &node.kind {
                NodeKind::Bind(bind) => {
                    let (value, binding) = if bind.expr.is_lambda() {
                        self.single_bind(bind, node.span, &scope, depth)?
                    } else {
                        self.value_bind(bind, node.span, &scope, depth)?
                    };
                    // Whatever is not generalized here is shared by every use.
                    scope = if self.binding(binding).polymorph {
                        let vars = self.store.free_vars(value.ty, Some(depth));
                        for denied in &vars.denied {
                            self.store.limit_depth(*denied, depth);
                        }
                        let free = vars.generalizable();
                        tracing::trace!(binding = %bind.name, free = free.len(), "generalized");
                        scope.bind_poly(&bind.name, binding, free)
                    } else {
                        self.store.limit_depth(value.ty, depth);
                        scope.bind(&bind.name, binding)
                    };
                    if bind.var {
                        self.register_var(binding, &scope);
                    }
                    statements.push(Statement::Bind { binding, value });
                    bound.push((binding, node.span));
                }
                NodeKind::Load(module) => {
                    let (code, signature) = self.load_module(module, node.span, depth)?;
                    scope = self.explode(module, &signature, code.ty, &scope, node.span, false)?;
                    statements.push(Statement::Load(code));
                }
                NodeKind::Import(class) => {
                    scope = import(class, &scope);
                }
                _ => {
                    let code = self.analyze(node, &scope, depth)?;
                    self.unify_or(TypeId::UNIT, code.ty, node.span, |store, _| {
                        format!("Unit type expected here, not a {}", store.describe(code.ty))
                    })?;
                    statements.push(Statement::Eval(code));
                }
            }
        }

        let result = self.analyze(last, &scope, depth)?;
        for (binding, span) in bound.iter().rev() {
            let b = self.binding(*binding);
            if !b.used {
                return Err(CompileError::new(
                    ErrorKind::UnusedBinding,
                    *span,
                    format!("Unused binding: {}", b.name),
                ));
            }
        }
        if statements.is_empty() {
            return Ok(result);
        }
        let (ty, polymorph) = (result.ty, result.polymorph);
        let code = CodeKind::Seq { statements, result: Box::new(result) };
        Ok(Code::new(code, ty, span).polymorphic(polymorph))
    }

    /// `name = value` where the value is not a lambda. The value is analyzed
    /// one level deeper so its own variables can be generalized.
    fn value_bind(&mut self, bind: &Bind, span: Span, scope: &Scope, depth: u32) -> Result<(Code, BindingId), CompileError> {
        let mut value = self.analyze(&bind.expr, scope, depth + 1)?;
        if let Some(ty) = &bind.ty {
            value = self.cast(CastKind::Is, ty, value, span, scope, depth)?;
        }
        let binding = self.new_binding(&bind.name, value.ty, BindingKind::Let, bind.var, span);
        self.binding_mut(binding).polymorph = value.polymorph && !bind.var;
        Ok((value, binding))
    }

    /// A binding of a lambda. The closure slot and its binding exist before
    /// the body is analyzed, so the body can refer to itself unless the
    /// binding is `norec`.
    pub(super) fn single_bind(
        &mut self,
        bind: &Bind,
        span: Span,
        scope: &Scope,
        depth: u32,
    ) -> Result<(Code, BindingId), CompileError> {
        if !bind.expr.is_lambda() {
            return Err(CompileError::malformed(span, "Closed binding must be a function binding"));
        }
        let ty = self.fresh(depth + 1);
        let closure = self.new_closure(ClosureKind::Function, scope.nearest_closure(), ty);
        let binding = self.new_binding(&bind.name, ty, BindingKind::Let, bind.var, span);
        self.binding_mut(binding).defining = true;
        self.closure_mut(closure).self_binding = Some(binding);

        let inner = if bind.no_rec { scope.clone() } else { scope.bind(&bind.name, binding) };
        let code = self.lambda_bind(closure, bind, &inner, depth + 1)?;

        let b = self.binding_mut(binding);
        b.ty = code.ty;
        b.defining = false;
        b.polymorph = !bind.var;
        Ok((code, binding))
    }

    /// A binding standing alone where an expression is expected. It can
    /// only be seen from inside its own body, so it has to be recursive.
    pub(super) fn standalone_bind(&mut self, bind: &Bind, span: Span, scope: &Scope, depth: u32) -> Result<Code, CompileError> {
        let (code, binding) = self.single_bind(bind, span, scope, depth)?;
        let b = self.binding(binding);
        if !b.self_used && !b.used {
            return Err(CompileError::new(
                ErrorKind::UnusedBinding,
                span,
                format!("Unused binding: {}", b.name),
            ));
        }
        Ok(code)
    }
}

/// `import pkg.Class`: the class becomes known by its last name segment.
fn import(class: &str, scope: &Scope) -> Scope {
    let internal = class.replace('.', "/");
    let short = internal.rsplit('/').next().unwrap_or(&internal).to_string();
    scope.import_class(&short, &internal)
}
