// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! `is`, `as` and `unsafely_as`.

use std::mem::discriminant;

use tarn_ast::{CastKind, Span, TypeExpr};
use tarn_types::{TypeId, TypeNode};

use super::Analyzer;
use crate::code::{Code, CodeKind};
use crate::error::{CompileError, ErrorKind};
use crate::scope::Scope;

impl Analyzer<'_> {
    pub(super) fn cast(
        &mut self,
        kind: CastKind,
        ty: &TypeExpr,
        value: Code,
        span: Span,
        scope: &Scope,
        depth: u32,
    ) -> Result<Code, CompileError> {
        let target = self.elaborate(ty, scope, depth)?;
        // `()` stands for the null reference of any host type
        if value.is_unit_literal() && self.store.node(target).is_host() {
            return Ok(cast_to(value, target, false, span));
        }
        match kind {
            CastKind::Is => {
                let value_ty = value.ty;
                self.unify_or(value_ty, target, span, |store, err| {
                    let [v, t] = store.describe_many([value_ty, target]);
                    format!("{} (when checking {} is {})", err, v, t)
                })?;
                Ok(value)
            }
            CastKind::As => {
                if !self.assignable(value.ty, target) {
                    let [from, to] = self.store.describe_many([value.ty, target]);
                    return Err(CompileError::new(
                        ErrorKind::ImpossibleCast,
                        span,
                        format!("impossible cast from {} to {}", from, to),
                    ));
                }
                Ok(cast_to(value, target, true, span))
            }
            CastKind::UnsafelyAs => {
                let from = self.store.deref(value.ty);
                let to = self.store.deref(target);
                if !(self.store.is_var(from) && self.store.is_var(to)) && self.impossible(from, to) {
                    let [from, to] = self.store.describe_many([from, to]);
                    return Err(CompileError::new(
                        ErrorKind::ImpossibleCast,
                        span,
                        format!("impossible unsafely_as cast from {} to {}", from, to),
                    ));
                }
                Ok(cast_to(value, target, false, span))
            }
        }
    }

    /// `as`: host classes may be narrowed or widened along the class
    /// hierarchy; anything else must unify.
    fn assignable(&mut self, from: TypeId, to: TypeId) -> bool {
        match (self.store.node(from).clone(), self.store.node(to).clone()) {
            (TypeNode::Host { class: a, .. }, TypeNode::Host { class: b, .. }) => {
                self.resolver.distance(&a, &b).is_some() || self.resolver.distance(&b, &a).is_some()
            }
            (TypeNode::HostArray(a), TypeNode::HostArray(b)) => self.assignable(a, b),
            _ => self.store.unify(from, to).is_ok(),
        }
    }

    /// Two types no value can have both of: different shapes, neither of
    /// them a variable or a host object.
    fn impossible(&self, from: TypeId, to: TypeId) -> bool {
        let (a, b) = (self.store.node(from), self.store.node(to));
        if a.is_var() || b.is_var() || a.is_host() || b.is_host() {
            return false;
        }
        discriminant(a) != discriminant(b)
    }
}

fn cast_to(value: Code, target: TypeId, checked: bool, span: Span) -> Code {
    let code = CodeKind::Cast { value: Box::new(value), checked };
    Code::new(code, target, span)
}
