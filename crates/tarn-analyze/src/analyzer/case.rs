// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! `case ... of ... esac`

use tarn_ast::{is_tag_name, Case, Node, NodeKind, Op, Span};
use tarn_types::{Fields, Member, Row, TypeId, TypeNode};

use super::Analyzer;
use crate::code::{BindingKind, CaseChoice, Code, CodeKind};
use crate::error::CompileError;
use crate::scope::Scope;

impl Analyzer<'_> {
    /// The scrutinee must fit the closed variant built from all arms; arms
    /// naming the same tag share its payload type.
    pub(super) fn case(&mut self, case: &Case, span: Span, scope: &Scope, depth: u32) -> Result<Code, CompileError> {
        if case.choices.is_empty() {
            return Err(CompileError::malformed(span, "case expects some option!"));
        }
        let value = self.analyze(&case.value, scope, depth)?;

        let mut variants = Fields::new();
        let mut result: Option<TypeId> = None;
        let mut poly = true;
        let mut choices = Vec::with_capacity(case.choices.len());
        for choice in &case.choices {
            let (pattern, body) = match &choice.kind {
                NodeKind::BinOp(op) if op.op == Op::Colon => match op.left.as_deref() {
                    Some(pattern) => (pattern, &*op.right),
                    None => return Err(bad_pattern(choice)),
                },
                _ => {
                    return Err(CompileError::malformed(
                        choice.span,
                        format!("Expecting option, not a {}", choice),
                    ));
                }
            };
            let (tag, payload_node) = match &pattern.kind {
                NodeKind::BinOp(op) if op.op == Op::Apply => match op.left.as_deref().and_then(Node::as_sym) {
                    Some(tag) if is_tag_name(tag) => (tag, &*op.right),
                    _ => return Err(bad_pattern(pattern)),
                },
                _ => return Err(bad_pattern(pattern)),
            };

            let mut local = scope.clone();
            let (payload_ty, payload) = match &payload_node.kind {
                NodeKind::Unit => (TypeId::UNIT, None),
                NodeKind::Sym(name) if !is_tag_name(name) => {
                    let ty = self.fresh(depth);
                    let binding = self.new_binding(name, ty, BindingKind::CasePayload, false, payload_node.span);
                    local = local.bind(name, binding);
                    (ty, Some(binding))
                }
                _ => return Err(bad_pattern(pattern)),
            };
            match variants.get(tag) {
                Some(member) => {
                    let known = member.ty;
                    self.unify_or(known, payload_ty, payload_node.span, |_, err| err.to_string())?;
                }
                None => {
                    variants.insert(tag.to_string(), Member::plain(payload_ty));
                }
            }

            let body_code = self.analyze(body, &local, depth)?;
            poly &= body_code.polymorph;
            result = Some(match result {
                None => body_code.ty,
                Some(prev) => self.join(prev, body_code.ty, body.span, |choice, other| {
                    format!("This choice has a {} type, while another was a {}", choice, other)
                })?,
            });
            choices.push(CaseChoice { tag: tag.to_string(), payload, body: body_code });
        }

        let variant = self.store.alloc(TypeNode::Variant(Row::closed(variants)));
        self.unify_or(value.ty, variant, case.value.span, |store, err| {
            let [expected, given] = store.describe_many([variant, value.ty]);
            format!(
                "Inferred type for case argument is {}, but a {} is given\n    ({})",
                expected, given, err
            )
        })?;

        let ty = match result {
            Some(ty) => ty,
            None => self.fresh(depth),
        };
        let code = CodeKind::Case { value: Box::new(value), choices };
        Ok(Code::new(code, ty, span).polymorphic(poly))
    }
}

fn bad_pattern(pattern: &Node) -> CompileError {
    CompileError::malformed(pattern.span, format!("Bad case pattern: {}", pattern))
}
