// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Written type syntax (`x is {a is number}`, casts, module signatures).

use std::fmt;

use crate::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExprKind {
    /// Named type with optional parameters: primitives (`number`, `()`),
    /// containers (`list<T>`, `hash<K, V>`), variant tag shorthand
    /// (`Some number`) and free variables (`'a`).
    Named { name: String, args: Vec<TypeExpr> },
    /// `{a is T, var b is U}`
    Struct(Vec<TypeField>),
    /// `A T | B U`
    Variant(Vec<TypeField>),
    /// `A -> B`
    Fun(Box<TypeExpr>, Box<TypeExpr>),
    /// `~pkg.Class<T>[]`: host class reference, trailing `[]` pairs are array rank
    Host { class: String, args: Vec<TypeExpr> },
}

/// A struct field or variant arm in written type syntax.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeField {
    pub name: String,
    pub ty: TypeExpr,
    pub mutable: bool,
    pub span: Span,
}

impl TypeExpr {
    pub fn new(kind: TypeExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::new(
            TypeExprKind::Named { name: name.into(), args: Vec::new() },
            Span::DUMMY,
        )
    }

    pub fn with_args(name: impl Into<String>, args: Vec<TypeExpr>) -> Self {
        Self::new(TypeExprKind::Named { name: name.into(), args }, Span::DUMMY)
    }

    pub fn fun(arg: TypeExpr, ret: TypeExpr) -> Self {
        Self::new(TypeExprKind::Fun(Box::new(arg), Box::new(ret)), Span::DUMMY)
    }

    pub fn host(class: impl Into<String>) -> Self {
        Self::new(
            TypeExprKind::Host { class: class.into(), args: Vec::new() },
            Span::DUMMY,
        )
    }

    /// Display name used in arity and unknown-type errors.
    pub fn name(&self) -> String {
        match &self.kind {
            TypeExprKind::Named { name, .. } => name.clone(),
            TypeExprKind::Struct(_) => String::new(),
            TypeExprKind::Variant(_) => "|".to_string(),
            TypeExprKind::Fun(..) => "->".to_string(),
            TypeExprKind::Host { class, .. } => format!("~{}", class),
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[TypeExpr]) -> fmt::Result {
    if args.is_empty() {
        return Ok(());
    }
    write!(f, "<")?;
    for (i, a) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", a)?;
    }
    write!(f, ">")
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TypeExprKind::Named { name, args } => {
                let is_tag = name.chars().next().is_some_and(|c| c.is_uppercase());
                if is_tag && args.len() == 1 {
                    return write!(f, "{} {}", name, args[0]);
                }
                write!(f, "{}", name)?;
                write_args(f, args)
            }
            TypeExprKind::Struct(fields) => {
                write!(f, "{{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    if field.mutable {
                        write!(f, "var ")?;
                    }
                    write!(f, "{} is {}", field.name, field.ty)?;
                }
                write!(f, "}}")
            }
            TypeExprKind::Variant(arms) => {
                for (i, arm) in arms.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{} {}", arm.name, arm.ty)?;
                }
                Ok(())
            }
            TypeExprKind::Fun(arg, ret) => {
                if matches!(arg.kind, TypeExprKind::Fun(..) | TypeExprKind::Variant(_)) {
                    write!(f, "({}) -> {}", arg, ret)
                } else {
                    write!(f, "{} -> {}", arg, ret)
                }
            }
            TypeExprKind::Host { class, args } => {
                let base = class.trim_end_matches("[]");
                write!(f, "~{}", base)?;
                write_args(f, args)?;
                for _ in 0..(class.len() - base.len()) / 2 {
                    write!(f, "[]")?;
                }
                Ok(())
            }
        }
    }
}
