// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Node constructors for hosts that assemble trees without the parser
//! (prelude stubs, generated code, tests). All nodes start at
//! `Span::DUMMY`; use [`Node::at`] to place them.

use crate::node::*;
use crate::type_expr::TypeExpr;
use crate::Span;

fn node(kind: NodeKind) -> Node {
    Node::new(kind, Span::DUMMY)
}

fn binop(op: Op, left: Option<Node>, right: Node) -> Node {
    node(NodeKind::BinOp(BinOp {
        op,
        left: left.map(Box::new),
        right: Box::new(right),
    }))
}

impl Node {
    /// Place this node at a source position.
    pub fn at(mut self, line: u32, col: u32) -> Self {
        self.span = Span::new(line, col);
        self
    }
}

pub fn sym(name: &str) -> Node {
    node(NodeKind::Sym(name.to_string()))
}

pub fn num(n: i64) -> Node {
    node(NodeKind::Num(Number::Int(n)))
}

pub fn float(x: f64) -> Node {
    node(NodeKind::Num(Number::Float(x)))
}

pub fn string(s: &str) -> Node {
    node(NodeKind::Str(s.to_string()))
}

pub fn unit() -> Node {
    node(NodeKind::Unit)
}

pub fn apply(fun: Node, arg: Node) -> Node {
    binop(Op::Apply, Some(fun), arg)
}

/// `fun a b c` as nested applications.
pub fn call(fun: Node, args: Vec<Node>) -> Node {
    args.into_iter().fold(fun, apply)
}

/// Named binary operator, e.g. `op("+", a, b)`.
pub fn op(name: &str, left: Node, right: Node) -> Node {
    binop(Op::Named(name.to_string()), Some(left), right)
}

/// Unary minus.
pub fn neg(operand: Node) -> Node {
    binop(Op::Named("-".to_string()), None, operand)
}

pub fn field(src: Node, name: &str) -> Node {
    binop(Op::Field, Some(src), sym(name))
}

pub fn key_ref(src: Node, keys: Vec<Node>) -> Node {
    binop(Op::Field, Some(src), list(keys))
}

pub fn assign(target: Node, value: Node) -> Node {
    binop(Op::Assign, Some(target), value)
}

pub fn cast(value: Node, kind: CastKind, ty: TypeExpr) -> Node {
    binop(Op::Cast(kind, ty), None, value)
}

pub fn object_ref(target: Node, member: &str, args: Option<Vec<Node>>) -> Node {
    binop(
        Op::ObjectRef { name: member.to_string(), args },
        None,
        target,
    )
}

pub fn loop_(cond: Node, body: Option<Node>) -> Node {
    match body {
        Some(body) => binop(Op::Loop, Some(cond), body),
        None => binop(Op::Loop, None, cond),
    }
}

pub fn pair(key: Node, value: Node) -> Node {
    binop(Op::Colon, Some(key), value)
}

pub fn range(from: Node, to: Node) -> Node {
    binop(Op::Range, Some(from), to)
}

pub fn placeholder_lambda(body: Node) -> Node {
    binop(Op::Lambda, None, body)
}

pub fn throw(value: Node) -> Node {
    apply(node(NodeKind::Throw), value)
}

fn make_bind(name: &str, expr: Node, var: bool, no_rec: bool, ty: Option<TypeExpr>) -> Node {
    node(NodeKind::Bind(Bind {
        name: name.to_string(),
        expr: Box::new(expr),
        var,
        no_rec,
        ty,
    }))
}

pub fn bind(name: &str, expr: Node) -> Node {
    make_bind(name, expr, false, false, None)
}

pub fn var_bind(name: &str, expr: Node) -> Node {
    make_bind(name, expr, true, false, None)
}

pub fn norec_bind(name: &str, expr: Node) -> Node {
    make_bind(name, expr, false, true, None)
}

pub fn typed_bind(name: &str, ty: TypeExpr, expr: Node) -> Node {
    make_bind(name, expr, false, false, Some(ty))
}

pub fn lambda(arg: Node, body: Node) -> Node {
    node(NodeKind::Lambda(Lambda {
        arg: Box::new(arg),
        expr: Box::new(body),
        bind_name: None,
    }))
}

/// `\a b c -> body` as curried lambdas.
pub fn lambda_n(args: &[&str], body: Node) -> Node {
    args.iter().rev().fold(body, |body, a| lambda(sym(a), body))
}

pub fn seq(items: Vec<Node>) -> Node {
    node(NodeKind::Seq(items))
}

/// `if g1 then v1 elif g2 then v2 else e fi`; `else_value` becomes the unguarded branch.
pub fn cond(branches: Vec<(Node, Node)>, else_value: Node) -> Node {
    let mut choices: Vec<CondChoice> = branches
        .into_iter()
        .map(|(guard, value)| CondChoice { value, guard: Some(guard) })
        .collect();
    choices.push(CondChoice { value: else_value, guard: None });
    node(NodeKind::Cond(choices))
}

pub fn struct_(fields: Vec<Node>) -> Node {
    node(NodeKind::Struct(fields))
}

pub fn list(items: Vec<Node>) -> Node {
    node(NodeKind::List(Some(items)))
}

/// The `[:]` empty literal.
pub fn empty_map() -> Node {
    node(NodeKind::List(None))
}

pub fn case(value: Node, choices: Vec<Node>) -> Node {
    node(NodeKind::Case(Case { value: Box::new(value), choices }))
}

/// `Tag pattern: body`
pub fn choice(tag: &str, pattern: Node, body: Node) -> Node {
    pair(apply(sym(tag), pattern), body)
}

pub fn concat(parts: Vec<Node>) -> Node {
    node(NodeKind::ConcatStr(parts))
}

pub fn load(module: &str) -> Node {
    node(NodeKind::Load(module.to_string()))
}

pub fn import(class: &str) -> Node {
    node(NodeKind::Import(class.to_string()))
}

pub fn section(op_name: &str, arg: Node) -> Node {
    node(NodeKind::RSection(RSection {
        op: SectionOp::Operator(op_name.to_string()),
        arg: Box::new(arg),
    }))
}

/// `(.a.b.c)`
pub fn field_section(path: &[&str]) -> Node {
    let mut parts = path.iter();
    let first = sym(parts.next().copied().unwrap_or_default());
    let arg = parts.fold(first, |acc, p| field(acc, p));
    node(NodeKind::RSection(RSection { op: SectionOp::Field, arg: Box::new(arg) }))
}

pub fn new_(class: &str, args: Vec<Node>) -> Node {
    node(NodeKind::New { class: class.to_string(), args })
}

pub fn class_of(class: &str) -> Node {
    node(NodeKind::ClassOf(class.to_string()))
}

pub fn try_(block: Node, catches: Vec<Catch>, cleanup: Option<Node>) -> Node {
    node(NodeKind::Try(Try {
        block: Box::new(block),
        catches,
        cleanup: cleanup.map(Box::new),
    }))
}

pub fn catch(exception: &str, bind: Option<&str>, handler: Node) -> Catch {
    Catch {
        exception: exception.to_string(),
        bind: bind.map(str::to_string),
        handler,
        span: Span::DUMMY,
    }
}
