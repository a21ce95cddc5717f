// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Elaboration of written type syntax into the type graph.

use std::collections::HashMap;

use tarn_ast::{TypeExpr, TypeExprKind, TypeField};
use tarn_types::{FieldTag, Fields, Member, Row, TypeId, TypeNode, TypeStore};

use crate::error::{CompileError, ErrorKind};
use crate::interop::HostResolver;
use crate::scope::Scope;

const PRIMITIVES: &[(&str, TypeId)] = &[
    ("()", TypeId::UNIT),
    ("boolean", TypeId::BOOL),
    ("char", TypeId::CHAR),
    ("number", TypeId::NUM),
    ("string", TypeId::STR),
];

/// Internal name of a class written in source: imports first, then the
/// unit's package, then whatever the resolver finds for the bare name.
pub(crate) fn resolve_class(
    name: &str,
    scope: &Scope,
    resolver: &dyn HostResolver,
    package: &str,
) -> Option<String> {
    let name = name.replace('.', "/");
    if name.contains('/') {
        return resolver.resolve_class(&name);
    }
    if let Some(class) = scope.class(&name) {
        return Some(class);
    }
    if !package.is_empty() {
        if let Some(class) = resolver.resolve_class(&format!("{}/{}", package, name)) {
            return Some(class);
        }
    }
    resolver.resolve_class(&name)
}

/// Elaborates type expressions. Variables named `'x` are shared across
/// every expression elaborated by one elaborator.
pub(crate) struct Elaborator<'a> {
    store: &'a mut TypeStore,
    scope: &'a Scope,
    resolver: &'a dyn HostResolver,
    package: &'a str,
    depth: u32,
    vars: HashMap<String, TypeId>,
}

impl<'a> Elaborator<'a> {
    pub fn new(
        store: &'a mut TypeStore,
        scope: &'a Scope,
        resolver: &'a dyn HostResolver,
        package: &'a str,
        depth: u32,
    ) -> Self {
        Self { store, scope, resolver, package, depth, vars: HashMap::new() }
    }

    pub fn elaborate(&mut self, expr: &TypeExpr) -> Result<TypeId, CompileError> {
        match &expr.kind {
            TypeExprKind::Named { name, args } => self.named(expr, name, args),
            TypeExprKind::Struct(fields) => {
                let row = self.members(fields, "structure")?;
                Ok(self.store.alloc(TypeNode::Struct(row)))
            }
            TypeExprKind::Variant(arms) => {
                let row = self.members(arms, "variant")?;
                Ok(self.store.alloc(TypeNode::Variant(row)))
            }
            TypeExprKind::Fun(arg, ret) => {
                let arg = self.elaborate(arg)?;
                let ret = self.elaborate(ret)?;
                Ok(self.store.fun(arg, ret))
            }
            TypeExprKind::Host { class, args } => self.host(class, args),
        }
    }

    fn named(&mut self, expr: &TypeExpr, name: &str, args: &[TypeExpr]) -> Result<TypeId, CompileError> {
        if let Some((_, ty)) = PRIMITIVES.iter().find(|(n, _)| *n == name) {
            expects_params(expr, name, args, 0)?;
            return Ok(*ty);
        }
        match name {
            "array" | "list" | "list?" => {
                expects_params(expr, name, args, 1)?;
                let elem = self.elaborate(&args[0])?;
                let key = match name {
                    "array" => TypeId::NUM,
                    "list" => TypeId::NO_KEY,
                    _ => self.store.fresh(self.depth),
                };
                Ok(self.store.map(elem, key, TypeId::LIST_KIND))
            }
            "hash" | "map" => {
                expects_params(expr, name, args, 2)?;
                let key = self.elaborate(&args[0])?;
                let elem = self.elaborate(&args[1])?;
                let kind = if name == "hash" {
                    TypeId::MAP_KIND
                } else {
                    self.store.fresh(self.depth)
                };
                Ok(self.store.map(elem, key, kind))
            }
            _ if tarn_ast::is_tag_name(name) => {
                expects_params(expr, name, args, 1)?;
                let payload = self.elaborate(&args[0])?;
                let mut members = Fields::new();
                members.insert(name.to_string(), Member::plain(payload));
                Ok(self.store.alloc(TypeNode::Variant(Row::open(members.clone()).close(members))))
            }
            _ if name.starts_with('\'') => {
                if let Some(var) = self.vars.get(name) {
                    return Ok(*var);
                }
                let var = self.store.fresh(self.depth);
                self.vars.insert(name.to_string(), var);
                Ok(var)
            }
            _ => Err(CompileError::unresolved(expr.span, format!("Unknown type: {}", name))),
        }
    }

    /// Written structs and variants are closed with every member required.
    fn members(&mut self, fields: &[TypeField], what: &str) -> Result<Row, CompileError> {
        let mut members = Fields::new();
        for field in fields {
            let ty = self.elaborate(&field.ty)?;
            let tag = if field.mutable { FieldTag::Mutable } else { FieldTag::Plain };
            if members.insert(field.name.clone(), Member::tagged(ty, tag)).is_some() {
                return Err(CompileError::new(
                    ErrorKind::DuplicateDefinition,
                    field.span,
                    format!("Duplicate field name {} in {} type", field.name, what),
                ));
            }
        }
        Ok(Row::open(members.clone()).close(members))
    }

    fn host(&mut self, class: &str, args: &[TypeExpr]) -> Result<TypeId, CompileError> {
        let mut name = class;
        let mut rank = 0;
        while let Some(base) = name.strip_suffix("[]") {
            name = base;
            rank += 1;
        }
        let internal = resolve_class(name, self.scope, self.resolver, self.package)
            .unwrap_or_else(|| name.replace('.', "/"));
        let args = args
            .iter()
            .map(|a| self.elaborate(a))
            .collect::<Result<Vec<_>, _>>()?;
        let mut ty = self.store.host(internal, args);
        for _ in 0..rank {
            ty = self.store.alloc(TypeNode::HostArray(ty));
        }
        Ok(ty)
    }
}

fn expects_params(expr: &TypeExpr, name: &str, args: &[TypeExpr], count: usize) -> Result<(), CompileError> {
    if args.len() != count {
        return Err(CompileError::malformed(
            expr.span,
            format!("type {} expects {} parameters", name, count),
        ));
    }
    Ok(())
}

/// Elaborate a standalone signature with fresh variables at `depth`.
pub(crate) fn elaborate_at(
    store: &mut TypeStore,
    scope: &Scope,
    resolver: &dyn HostResolver,
    package: &str,
    depth: u32,
    expr: &TypeExpr,
) -> Result<TypeId, CompileError> {
    Elaborator::new(store, scope, resolver, package, depth).elaborate(expr)
}
