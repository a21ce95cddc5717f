// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Node dispatch.

use tarn_ast::{is_tag_name, BinOp, Lambda, Node, NodeKind, Op, SectionOp};
use tarn_types::TypeId;

use super::Analyzer;
use crate::code::{ClosureKind, Code, CodeKind};
use crate::error::CompileError;
use crate::scope::Scope;

impl Analyzer<'_> {
    /// Analyze one expression at let-nesting `depth`.
    pub(crate) fn analyze(&mut self, node: &Node, scope: &Scope, depth: u32) -> Result<Code, CompileError> {
        let span = node.span;
        match &node.kind {
            NodeKind::Sym(name) if is_tag_name(name) => Ok(self.variant_constructor(name, span, depth)),
            NodeKind::Sym(name) => self.resolve(name, span, scope, depth),
            NodeKind::Num(n) => Ok(Code::new(CodeKind::Number(*n), TypeId::NUM, span)),
            NodeKind::Str(s) => Ok(Code::new(CodeKind::Str(s.clone()), TypeId::STR, span)),
            NodeKind::Unit => Ok(Code::new(CodeKind::Unit, TypeId::UNIT, span)),
            NodeKind::Seq(items) => self.seq(items, span, scope, depth),
            NodeKind::Bind(bind) => self.standalone_bind(bind, span, scope, depth),
            NodeKind::BinOp(op) => self.binop(node, op, scope, depth),
            NodeKind::Cond(choices) => self.cond(choices, span, scope, depth),
            NodeKind::Struct(fields) => self.structure(fields, span, scope, depth),
            NodeKind::List(items) => self.list(items.as_deref(), span, scope, depth),
            NodeKind::Lambda(_) => {
                let ty = self.fresh(depth);
                let parent = scope.nearest_closure();
                let closure = self.new_closure(ClosureKind::Function, parent, ty);
                self.lambda(closure, node, scope, depth)
            }
            NodeKind::Case(case) => self.case(case, span, scope, depth),
            NodeKind::ConcatStr(parts) => {
                let parts = parts
                    .iter()
                    .map(|p| self.analyze(p, scope, depth))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Code::new(CodeKind::Concat(parts), TypeId::STR, span))
            }
            NodeKind::Load(module) => {
                let (code, _) = self.load_module(module, span, depth)?;
                Ok(code)
            }
            NodeKind::RSection(section) => match &section.op {
                SectionOp::Field => self.selector_function(&section.arg, span, depth),
                SectionOp::Operator(name) => self.operator_section(name, &section.arg, span, scope, depth),
            },
            NodeKind::New { class, args } => self.new_object(class, args, span, scope, depth),
            NodeKind::Try(t) => self.try_catch(t, span, scope, depth),
            NodeKind::ClassOf(class) => self.class_of(class, span, scope),
            NodeKind::Throw | NodeKind::Import(_) => Err(CompileError::malformed(
                span,
                format!("I think that this {} should not be here.", node),
            )),
        }
    }

    fn binop(&mut self, node: &Node, op: &BinOp, scope: &Scope, depth: u32) -> Result<Code, CompileError> {
        let span = node.span;
        match &op.op {
            Op::Apply => match op.left.as_deref() {
                Some(Node { kind: NodeKind::Throw, .. }) => self.throw(&op.right, span, scope, depth),
                Some(fun) => {
                    let fun = self.analyze(fun, scope, depth)?;
                    self.apply(fun, &op.right, span, scope, depth)
                }
                None => Err(incomplete(node, op)),
            },
            Op::Field => match (op.left.as_deref(), &op.right.kind) {
                (None, _) => Err(CompileError::malformed(span, "What's that dot doing here?")),
                (Some(src), NodeKind::List(keys)) => self.key_ref(src, keys.as_deref(), span, scope, depth),
                (Some(src), _) => self.select(src, &op.right, span, scope, depth),
            },
            Op::Assign => match op.left.as_deref() {
                Some(target) => self.assign(target, &op.right, span, scope, depth),
                None => Err(incomplete(node, op)),
            },
            Op::Lambda => {
                let placeholder = Node::new(
                    NodeKind::Lambda(Lambda {
                        arg: Box::new(Node::new(NodeKind::Sym("_".to_string()), span)),
                        expr: op.right.clone(),
                        bind_name: None,
                    }),
                    span,
                );
                self.analyze(&placeholder, scope, depth)
            }
            Op::Cast(kind, ty) => {
                let value = self.analyze(&op.right, scope, depth)?;
                self.cast(*kind, ty, value, span, scope, depth)
            }
            Op::ObjectRef { name, args } => self.object_ref(name, args.as_deref(), &op.right, span, scope, depth),
            Op::Loop => self.loop_(op.left.as_deref(), &op.right, span, scope, depth),
            Op::Range => {
                let left = op.left.as_deref().ok_or_else(|| incomplete(node, op))?;
                let range = self.range(left, &op.right, span, scope, depth)?;
                let ty = self.store.list(TypeId::NUM);
                Ok(Code::new(CodeKind::List(vec![range]), ty, span))
            }
            Op::Colon => Err(CompileError::malformed(
                span,
                format!("I think that this {} should not be here.", node),
            )),
            Op::Named(name) => match op.left.as_deref() {
                None if name == "-" => {
                    let negate = self.resolve("negate", span, scope, depth)?;
                    self.apply(negate, &op.right, span, scope, depth)
                }
                None => Err(incomplete(node, op)),
                Some(left) => {
                    let fun = self.resolve(name, span, scope, depth)?;
                    let partial = self.apply(fun, left, span, scope, depth)?;
                    self.apply(partial, &op.right, op.right.span, scope, depth)
                }
            },
        }
    }
}

fn incomplete(node: &Node, op: &BinOp) -> CompileError {
    CompileError::malformed(node.span, format!("Internal error (incomplete operator {})", op.op))
}
