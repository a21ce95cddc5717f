// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Application, operator sections, selector functions and `throw`.

use tarn_ast::{is_tag_name, Node, NodeKind, Op, Span};
use tarn_types::TypeNode;

use super::Analyzer;
use crate::code::{Code, CodeKind};
use crate::error::CompileError;
use crate::scope::Scope;

impl Analyzer<'_> {
    /// Apply an analyzed function to an argument node.
    pub(super) fn apply(
        &mut self,
        fun: Code,
        arg: &Node,
        span: Span,
        scope: &Scope,
        depth: u32,
    ) -> Result<Code, CompileError> {
        let arg = self.analyze(arg, scope, depth)?;
        let ret = self.fresh(depth);
        let expected = self.store.fun(arg.ty, ret);
        self.unify_or(fun.ty, expected, span, |store, err| {
            let [a, f] = store.describe_many([arg.ty, fun.ty]);
            format!("Cannot apply {} to {}\n    {}", a, f, err)
        })?;
        // A tagged value is as generic as its payload.
        let polymorph = matches!(fun.kind, CodeKind::VariantConstructor(_)) && arg.polymorph;
        let code = CodeKind::Apply { fun: Box::new(fun), arg: Box::new(arg) };
        Ok(Code::new(code, ret, span).polymorphic(polymorph))
    }

    /// `Tag` used as a value: a function from the payload to an open variant.
    pub(super) fn variant_constructor(&mut self, tag: &str, span: Span, depth: u32) -> Code {
        let payload = self.fresh(depth);
        let variant = self.store.tag(tag, payload);
        let ty = self.store.fun(payload, variant);
        Code::new(CodeKind::VariantConstructor(tag.to_string()), ty, span).polymorphic(true)
    }

    /// `(op arg)`: a function of the operator's first argument.
    pub(super) fn operator_section(
        &mut self,
        name: &str,
        arg: &Node,
        span: Span,
        scope: &Scope,
        depth: u32,
    ) -> Result<Code, CompileError> {
        let fun = self.resolve(name, span, scope, depth)?;
        let arg = self.analyze(arg, scope, depth)?;
        let first = self.fresh(depth);
        let ret = self.fresh(depth);
        let rest = self.store.fun(arg.ty, ret);
        let expected = self.store.fun(first, rest);
        self.unify_or(fun.ty, expected, span, |store, err| {
            let [a, f] = store.describe_many([arg.ty, fun.ty]);
            format!("Cannot apply {} as a 2nd argument to {}\n    {}", a, f, err)
        })?;
        let ty = self.store.fun(first, ret);
        let code = CodeKind::ApplySecond { fun: Box::new(fun), arg: Box::new(arg) };
        Ok(Code::new(code, ty, span))
    }

    /// `(.a.b.c)`: a function selecting a field path.
    pub(super) fn selector_function(&mut self, path: &Node, span: Span, depth: u32) -> Result<Code, CompileError> {
        let mut fields = Vec::new();
        let mut cur = path;
        loop {
            match &cur.kind {
                NodeKind::BinOp(op) if op.op == Op::Field => {
                    fields.push(selector_name(&op.right)?);
                    match op.left.as_deref() {
                        Some(left) => cur = left,
                        None => return Err(CompileError::malformed(span, "What's that dot doing here?")),
                    }
                }
                NodeKind::BinOp(op) => {
                    return Err(CompileError::malformed(
                        cur.span,
                        format!("Unexpected {} in field selector", op.op),
                    ));
                }
                _ => {
                    fields.push(selector_name(cur)?);
                    break;
                }
            }
        }
        fields.reverse();

        let ret = self.fresh(depth);
        let mut arg = ret;
        for field in fields.iter().rev() {
            arg = self.store.select(field, arg);
        }
        let ty = self.store.fun(arg, ret);
        Ok(Code::new(CodeKind::SelectorFunction(fields), ty, span).polymorphic(true))
    }

    /// `throw value`; the value must be a throwable host object.
    pub(super) fn throw(&mut self, value: &Node, span: Span, scope: &Scope, depth: u32) -> Result<Code, CompileError> {
        let value = self.analyze(value, scope, depth)?;
        let throwable = match self.store.node(value.ty) {
            TypeNode::Host { class, .. } => self.resolver.is_throwable(class),
            _ => false,
        };
        if !throwable {
            return Err(CompileError::mismatch(
                span,
                format!("Can only throw a throwable, not a {}", self.describe(value.ty)),
            ));
        }
        let ty = self.fresh(depth);
        Ok(Code::new(CodeKind::Throw(Box::new(value)), ty, span))
    }
}

fn selector_name(node: &Node) -> Result<String, CompileError> {
    match &node.kind {
        NodeKind::Sym(name) if !is_tag_name(name) => Ok(name.clone()),
        _ => Err(CompileError::malformed(node.span, format!("Illegal .{}", node))),
    }
}
