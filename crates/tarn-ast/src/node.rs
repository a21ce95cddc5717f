// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Expression AST nodes, as produced by the parser.

use std::fmt;

use crate::type_expr::TypeExpr;
use crate::Span;

/// A node in the AST.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

/// The kind of node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Identifier. Capitalized identifiers are variant tags.
    Sym(String),
    /// Numeric literal
    Num(Number),
    /// String literal
    Str(String),
    /// `()`
    Unit,
    /// The `throw` keyword in function position
    Throw,
    /// Statement sequence `a; b; c`
    Seq(Vec<Node>),
    /// Binding `name = expr`
    Bind(Bind),
    /// Binary operator form; application is an operator too
    BinOp(BinOp),
    /// `if`/`elif`/`else` chain
    Cond(Vec<CondChoice>),
    /// Struct literal `{ a = 1, b = 2 }`; members should be bindings
    Struct(Vec<Node>),
    /// List or map literal; `None` is the bare `[:]` empty literal
    List(Option<Vec<Node>>),
    /// Lambda `\arg -> expr` / `do arg: expr done`
    Lambda(Lambda),
    /// `case value of choices esac`
    Case(Case),
    /// String interpolation parts
    ConcatStr(Vec<Node>),
    /// `load module.name`
    Load(String),
    /// Right section `(op arg)` or field selector `(.a.b)`
    RSection(RSection),
    /// `new ClassName(args)`
    New { class: String, args: Vec<Node> },
    /// `try ... catch ... finally ... yrt`
    Try(Try),
    /// `classOf ClassName`
    ClassOf(String),
    /// `import some.package.ClassName`
    Import(String),
}

/// A numeric literal.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Number {
    Int(i64),
    Float(f64),
}

/// A binding, either a sequence statement or a struct field.
#[derive(Debug, Clone, PartialEq)]
pub struct Bind {
    pub name: String,
    pub expr: Box<Node>,
    /// Declared with `var`.
    pub var: bool,
    /// Declared with `norec`: the bound value does not see its own name.
    pub no_rec: bool,
    /// Optional `is` annotation.
    pub ty: Option<TypeExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinOp {
    pub op: Op,
    pub left: Option<Box<Node>>,
    pub right: Box<Node>,
}

/// Operators. Everything not listed as a special form is resolved by name.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Juxtaposition `f x`
    Apply,
    /// `.field` or `.[key]`
    Field,
    /// `:=`
    Assign,
    /// `\expr` placeholder lambda
    Lambda,
    /// `is`, `as`, `unsafely_as`
    Cast(CastKind, TypeExpr),
    /// `obj#member` / `obj#method(args)`; the object is the right operand
    ObjectRef { name: String, args: Option<Vec<Node>> },
    /// `cond loop body`
    Loop,
    /// `key: value` (list items, case choices)
    Colon,
    /// `a..b`
    Range,
    /// Any other operator, looked up in scope (`+`, `-`, `==`, ...)
    Named(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CastKind {
    Is,
    As,
    UnsafelyAs,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CondChoice {
    pub value: Node,
    /// `None` marks the final `else` branch.
    pub guard: Option<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub arg: Box<Node>,
    pub expr: Box<Node>,
    pub bind_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub value: Box<Node>,
    /// Each choice should be `Tag pattern : expr`; the analyzer validates the shape.
    pub choices: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SectionOp {
    /// `(.a.b)`
    Field,
    Operator(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RSection {
    pub op: SectionOp,
    pub arg: Box<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Try {
    pub block: Box<Node>,
    pub catches: Vec<Catch>,
    pub cleanup: Option<Box<Node>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Catch {
    pub exception: String,
    pub bind: Option<String>,
    pub handler: Node,
    pub span: Span,
}

impl Node {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// The identifier, if this node is a bare symbol.
    pub fn as_sym(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Sym(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_lambda(&self) -> bool {
        matches!(self.kind, NodeKind::Lambda(_))
    }

    /// Binary operator node with the given operator kind.
    pub fn as_binop(&self) -> Option<&BinOp> {
        match &self.kind {
            NodeKind::BinOp(op) => Some(op),
            _ => None,
        }
    }
}

/// True when an identifier names a variant tag rather than a value.
pub fn is_tag_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_uppercase())
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{}", n),
            Number::Float(x) => write!(f, "{}", x),
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Apply => Ok(()),
            Op::Field => write!(f, "."),
            Op::Assign => write!(f, ":="),
            Op::Lambda => write!(f, "\\"),
            Op::Cast(CastKind::Is, _) => write!(f, "is"),
            Op::Cast(CastKind::As, _) => write!(f, "as"),
            Op::Cast(CastKind::UnsafelyAs, _) => write!(f, "unsafely_as"),
            Op::ObjectRef { .. } => write!(f, "#"),
            Op::Loop => write!(f, "loop"),
            Op::Colon => write!(f, ":"),
            Op::Range => write!(f, ".."),
            Op::Named(name) => write!(f, "{}", name),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Node], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", sep)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

/// Compact source-like rendering used in error messages.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Sym(s) => write!(f, "{}", s),
            NodeKind::Num(n) => write!(f, "{}", n),
            NodeKind::Str(s) => write!(f, "{:?}", s),
            NodeKind::Unit => write!(f, "()"),
            NodeKind::Throw => write!(f, "throw"),
            NodeKind::Seq(items) => {
                write!(f, "(")?;
                write_list(f, items, "; ")?;
                write!(f, ")")
            }
            NodeKind::Bind(b) => {
                if b.var {
                    write!(f, "var ")?;
                }
                write!(f, "{} = {}", b.name, b.expr)
            }
            NodeKind::BinOp(op) => {
                let left = op.left.as_ref().map(|l| l.to_string()).unwrap_or_default();
                match &op.op {
                    Op::Apply => write!(f, "({} {})", left, op.right),
                    Op::Field => write!(f, "{}.{}", left, op.right),
                    Op::ObjectRef { name, .. } => write!(f, "{}#{}", op.right, name),
                    Op::Cast(_, ty) => write!(f, "({} {} {})", op.right, op.op, ty),
                    other => write!(f, "({} {} {})", left, other, op.right),
                }
            }
            NodeKind::Cond(choices) => {
                write!(f, "if")?;
                for c in choices {
                    match &c.guard {
                        Some(g) => write!(f, " {} then {}", g, c.value)?,
                        None => write!(f, " else {}", c.value)?,
                    }
                }
                write!(f, " fi")
            }
            NodeKind::Struct(fields) => {
                write!(f, "{{")?;
                write_list(f, fields, ", ")?;
                write!(f, "}}")
            }
            NodeKind::List(None) => write!(f, "[:]"),
            NodeKind::List(Some(items)) => {
                write!(f, "[")?;
                write_list(f, items, ", ")?;
                write!(f, "]")
            }
            NodeKind::Lambda(l) => write!(f, "\\{} -> {}", l.arg, l.expr),
            NodeKind::Case(c) => {
                write!(f, "case {} of ", c.value)?;
                write_list(f, &c.choices, "; ")?;
                write!(f, " esac")
            }
            NodeKind::ConcatStr(parts) => {
                write!(f, "\"")?;
                for p in parts {
                    write!(f, "\\({})", p)?;
                }
                write!(f, "\"")
            }
            NodeKind::Load(name) => write!(f, "load {}", name),
            NodeKind::RSection(s) => match &s.op {
                SectionOp::Field => write!(f, "(.{})", s.arg),
                SectionOp::Operator(op) => write!(f, "({} {})", op, s.arg),
            },
            NodeKind::New { class, args } => {
                write!(f, "new {}(", class)?;
                write_list(f, args, ", ")?;
                write!(f, ")")
            }
            NodeKind::Try(_) => write!(f, "try ... yrt"),
            NodeKind::ClassOf(name) => write!(f, "classOf {}", name),
            NodeKind::Import(name) => write!(f, "import {}", name),
        }
    }
}
