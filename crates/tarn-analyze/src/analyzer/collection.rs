// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! List, array and hash literals.

use tarn_ast::{Node, Op, Span};
use tarn_types::TypeId;

use super::Analyzer;
use crate::code::{Code, CodeKind};
use crate::error::CompileError;
use crate::scope::Scope;

impl Analyzer<'_> {
    /// `[a, b, c]`, `[k: v, ...]` or `[:]`. The first element decides
    /// whether the literal is a list or a hash. A list literal is polymorphic
    /// when all its elements are; a hash literal never is.
    pub(super) fn list(
        &mut self,
        items: Option<&[Node]>,
        span: Span,
        scope: &Scope,
        depth: u32,
    ) -> Result<Code, CompileError> {
        let Some(items) = items else {
            let elem = self.fresh(depth);
            let key = self.fresh(depth);
            let ty = self.store.map(elem, key, TypeId::MAP_KIND);
            let code = CodeKind::Map { keys: Vec::new(), values: Vec::new() };
            return Ok(Code::new(code, ty, span));
        };

        let mut elem_ty: Option<TypeId> = None;
        let mut key_ty = TypeId::NO_KEY;
        let mut is_hash: Option<bool> = None;
        let mut keys = Vec::new();
        let mut values = Vec::with_capacity(items.len());
        let mut poly = true;
        for (i, item) in items.iter().enumerate() {
            let pair = item.as_binop().filter(|op| op.op == Op::Colon);
            let value_node = match (pair, is_hash) {
                (Some(op), None | Some(true)) => {
                    let Some(key_node) = op.left.as_deref() else {
                        return Err(CompileError::malformed(item.span, "Map item is missing a key"));
                    };
                    let key = self.analyze(key_node, scope, depth)?;
                    if is_hash.is_none() {
                        key_ty = key.ty;
                    } else {
                        self.unify_or(key_ty, key.ty, key_node.span, |store, _| {
                            let [k, others] = store.describe_many([key.ty, key_ty]);
                            format!("This map element has {} key, but others have had {}", k, others)
                        })?;
                    }
                    keys.push(key);
                    is_hash = Some(true);
                    &*op.right
                }
                (Some(_), Some(false)) => {
                    let hint = if i == 1 { " (or the key is missing on the first item?)" } else { "" };
                    return Err(CompileError::malformed(item.span, format!("Unexpected : in list{}", hint)));
                }
                (None, Some(true)) => {
                    return Err(CompileError::malformed(item.span, "Map item is missing a key"));
                }
                (None, _) => {
                    is_hash = Some(false);
                    item
                }
            };

            let value = match value_node.as_binop() {
                Some(op) if op.op == Op::Range && !matches!(is_hash, Some(true)) => match op.left.as_deref() {
                    Some(from) => self.range(from, &op.right, value_node.span, scope, depth)?,
                    None => self.analyze(value_node, scope, depth)?,
                },
                _ => self.analyze(value_node, scope, depth)?,
            };
            poly &= value.polymorph;
            match elem_ty {
                None => elem_ty = Some(value.ty),
                Some(expected) => {
                    let what = if is_hash == Some(true) { "map" } else { "list" };
                    self.unify_or(expected, value.ty, value_node.span, |store, _| {
                        let [v, others] = store.describe_many([value.ty, expected]);
                        format!("This {} element is {}, but others have been {}", what, v, others)
                    })?;
                }
            }
            values.push(value);
        }

        let elem = match elem_ty {
            Some(ty) => ty,
            None => self.fresh(depth),
        };
        let (kind, code) = if is_hash == Some(true) {
            (TypeId::MAP_KIND, CodeKind::Map { keys, values })
        } else {
            (TypeId::LIST_KIND, CodeKind::List(values))
        };
        let ty = self.store.map(elem, key_ty, kind);
        Ok(Code::new(code, ty, span).polymorphic(kind == TypeId::LIST_KIND && poly))
    }

    /// `from..to` inside a list literal; its element type is a number.
    pub(super) fn range(
        &mut self,
        from: &Node,
        to: &Node,
        span: Span,
        scope: &Scope,
        depth: u32,
    ) -> Result<Code, CompileError> {
        let from = self.analyze(from, scope, depth)?;
        let to = self.analyze(to, scope, depth)?;
        for limit in [&from, &to] {
            self.unify_or(TypeId::NUM, limit.ty, limit.span, |store, _| {
                format!(".. range expects limit to be number, not a {}", store.describe(limit.ty))
            })?;
        }
        let code = CodeKind::Range { from: Box::new(from), to: Box::new(to) };
        Ok(Code::new(code, TypeId::NUM, span))
    }
}

