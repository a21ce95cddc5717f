// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Struct literals, member selection, keyed access and assignment.

use std::collections::HashSet;

use tarn_ast::{Node, NodeKind, Span};
use tarn_types::{FieldTag, Fields, Member, Row, TypeId, TypeNode};

use super::Analyzer;
use crate::code::{BindingKind, ClosureKind, Code, CodeKind, StructField};
use crate::error::{CompileError, ErrorKind};
use crate::scope::Scope;

impl Analyzer<'_> {
    /// `{ a = 1, f x = ... }`. Function fields see every sibling that is not
    /// `norec`; their bodies are analyzed once all fields have types.
    pub(super) fn structure(
        &mut self,
        fields: &[Node],
        span: Span,
        scope: &Scope,
        depth: u32,
    ) -> Result<Code, CompileError> {
        if fields.is_empty() {
            return Err(CompileError::malformed(span, "No sense in empty struct"));
        }
        let mut names = HashSet::new();
        let mut binds = Vec::with_capacity(fields.len());
        for field in fields {
            let NodeKind::Bind(bind) = &field.kind else {
                return Err(CompileError::malformed(
                    field.span,
                    format!(
                        "Unexpected beast in the structure ({}), please give me some field binding.",
                        field
                    ),
                ));
            };
            if !names.insert(bind.name.as_str()) {
                return Err(CompileError::new(
                    ErrorKind::DuplicateDefinition,
                    field.span,
                    format!("Duplicate field {} in the structure", bind.name),
                ));
            }
            binds.push((field, bind));
        }

        let mut local = scope.clone();
        let mut members = Fields::new();
        let mut values = Vec::with_capacity(binds.len());
        let mut pending = Vec::new();
        for (index, (field, bind)) in binds.iter().enumerate() {
            let deferred = bind.expr.is_lambda() && !bind.no_rec;
            let value = if deferred {
                let ty = self.fresh(depth);
                let closure = self.new_closure(ClosureKind::Function, scope.nearest_closure(), ty);
                pending.push((index, closure));
                Code::new(CodeKind::Closure(closure), ty, bind.expr.span)
            } else {
                self.analyze(&bind.expr, scope, depth)?
            };
            let tag = if bind.var {
                FieldTag::Mutable
            } else if value.polymorph || bind.expr.is_lambda() {
                FieldTag::Plain
            } else {
                FieldTag::NonPolymorphic
            };
            members.insert(bind.name.clone(), Member::tagged(value.ty, tag));
            let binding = if bind.no_rec {
                None
            } else {
                let binding = self.new_binding(
                    &bind.name,
                    value.ty,
                    BindingKind::StructField { index },
                    bind.var,
                    field.span,
                );
                local = local.bind(&bind.name, binding);
                Some(binding)
            };
            values.push(StructField {
                name: bind.name.clone(),
                value,
                mutable: bind.var,
                binding,
            });
        }

        for (index, closure) in pending {
            let (_, bind) = binds[index];
            let code = self.lambda_bind(closure, bind, &local, depth)?;
            values[index].value = code;
        }

        let ty = self.store.alloc(TypeNode::Struct(Row::closed(members)));
        Ok(Code::new(CodeKind::Struct(values), ty, span).polymorphic(true))
    }

    /// `src.field`
    pub(super) fn select(
        &mut self,
        src: &Node,
        field: &Node,
        span: Span,
        scope: &Scope,
        depth: u32,
    ) -> Result<Code, CompileError> {
        let name = match &field.kind {
            NodeKind::Sym(name) if !tarn_ast::is_tag_name(name) => name.clone(),
            _ => return Err(CompileError::malformed(field.span, format!("Illegal .{}", field))),
        };
        let ret = self.fresh(depth);
        let expected = self.store.select(&name, ret);
        let src = self.analyze(src, scope, depth)?;
        self.unify_or(expected, src.ty, span, |store, _| {
            format!("{} do not have .{} field\n", store.describe(src.ty), name)
        })?;
        let polymorph = src.polymorph
            && self
                .store
                .row(src.ty)
                .and_then(|row| row.complete())
                .and_then(|complete| complete.get(&name))
                .is_some_and(|member| member.tag == FieldTag::Plain);
        let code = CodeKind::Select { src: Box::new(src), field: name };
        Ok(Code::new(code, ret, span).polymorphic(polymorph))
    }

    /// `src.[key]`
    pub(super) fn key_ref(
        &mut self,
        src: &Node,
        keys: Option<&[Node]>,
        span: Span,
        scope: &Scope,
        depth: u32,
    ) -> Result<Code, CompileError> {
        let key = match keys {
            None | Some([]) => {
                return Err(CompileError::malformed(span, ".[] - missing key expression"));
            }
            Some([key]) => key,
            Some(_) => return Err(CompileError::malformed(span, "Unexpected , inside .[]")),
        };
        let src = self.analyze(src, scope, depth)?;
        let key = self.analyze(key, scope, depth)?;
        let elem = self.fresh(depth);
        let kind = self.fresh(depth);
        let expected = self.store.map(elem, key.ty, kind);
        self.unify_or(src.ty, expected, span, |store, _| {
            let [s, k] = store.describe_many([src.ty, key.ty]);
            format!("{} cannot be referenced by {} key", s, k)
        })?;
        let code = CodeKind::KeyRef { src: Box::new(src), key: Box::new(key) };
        Ok(Code::new(code, elem, span))
    }

    /// `target := value`
    pub(super) fn assign(
        &mut self,
        target: &Node,
        value: &Node,
        span: Span,
        scope: &Scope,
        depth: u32,
    ) -> Result<Code, CompileError> {
        let target = self.analyze(target, scope, depth)?;
        let value = self.analyze(value, scope, depth)?;
        self.unify_or(target.ty, value.ty, span, |_, err| err.to_string())?;
        if !self.may_assign(&target) {
            return Err(CompileError::mismatch(
                span,
                "Non-mutable expression on the left of the assign operator :=",
            ));
        }
        let code = CodeKind::Assign { target: Box::new(target), value: Box::new(value) };
        Ok(Code::new(code, TypeId::UNIT, span))
    }

    /// Whether `code` denotes an assignable place. Selecting a field of a
    /// type that is still open makes the field required to be mutable.
    fn may_assign(&mut self, code: &Code) -> bool {
        match &code.kind {
            CodeKind::Var(binding) => self.binding(*binding).mutable,
            CodeKind::ModuleField { mutable, .. } | CodeKind::HostField { mutable, .. } => *mutable,
            CodeKind::KeyRef { .. } => true,
            CodeKind::Select { src, field } => {
                let closed_tag = self
                    .store
                    .row(src.ty)
                    .and_then(|row| row.complete())
                    .and_then(|complete| complete.get(field))
                    .map(|member| member.tag);
                if closed_tag.is_some_and(|tag| tag != FieldTag::Mutable) {
                    return false;
                }
                self.store.retag_required(src.ty, field, FieldTag::Mutable);
                true
            }
            _ => false,
        }
    }
}
