// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Conversion of inferred types back to written type syntax.
//!
//! Compiled module signatures are stored as [`TypeExpr`] so a later
//! compilation can elaborate them into its own store.

use std::collections::HashMap;

use tarn_ast::{Span, TypeExpr, TypeExprKind, TypeField};

use crate::display::var_name;
use crate::store::TypeStore;
use crate::types::{FieldTag, Row, TypeId, TypeNode};

impl TypeStore {
    /// Export `id` as written type syntax. Variables become `'a`, `'b`, ...
    /// Open rows are exported with the members known so far.
    pub fn export(&self, id: TypeId) -> TypeExpr {
        let mut vars = HashMap::new();
        self.export_type(id, &mut vars)
    }

    fn export_type(&self, id: TypeId, vars: &mut HashMap<TypeId, String>) -> TypeExpr {
        let id = self.resolve(id);
        match self.node(id) {
            TypeNode::Var { .. } => {
                let next = vars.len();
                TypeExpr::named(vars.entry(id).or_insert_with(|| var_name(next)).clone())
            }
            TypeNode::Unit => TypeExpr::named("()"),
            TypeNode::Bool => TypeExpr::named("boolean"),
            TypeNode::Char => TypeExpr::named("char"),
            TypeNode::Num => TypeExpr::named("number"),
            TypeNode::Str => TypeExpr::named("string"),
            TypeNode::NoKey => TypeExpr::named("none"),
            TypeNode::ListKind => TypeExpr::named("list"),
            TypeNode::MapKind => TypeExpr::named("hash"),
            TypeNode::Fun { arg, ret } => {
                TypeExpr::fun(self.export_type(*arg, vars), self.export_type(*ret, vars))
            }
            TypeNode::Struct(row) => {
                TypeExpr::new(TypeExprKind::Struct(self.export_row(row, vars)), Span::DUMMY)
            }
            TypeNode::Variant(row) => {
                TypeExpr::new(TypeExprKind::Variant(self.export_row(row, vars)), Span::DUMMY)
            }
            TypeNode::Map { elem, key, kind } => self.export_map(*elem, *key, *kind, vars),
            TypeNode::Host { class, args } => TypeExpr::new(
                TypeExprKind::Host {
                    class: class.replace('/', "."),
                    args: args.iter().map(|a| self.export_type(*a, vars)).collect(),
                },
                Span::DUMMY,
            ),
            TypeNode::HostArray(elem) => {
                let mut inner = self.export_type(*elem, vars);
                match &mut inner.kind {
                    TypeExprKind::Host { class, .. } => {
                        class.push_str("[]");
                        inner
                    }
                    _ => TypeExpr::with_args("array", vec![inner]),
                }
            }
        }
    }

    fn export_row(&self, row: &Row, vars: &mut HashMap<TypeId, String>) -> Vec<TypeField> {
        row.members()
            .map(|(name, member)| TypeField {
                name: name.clone(),
                ty: self.export_type(member.ty, vars),
                mutable: member.tag == FieldTag::Mutable,
                span: Span::DUMMY,
            })
            .collect()
    }

    fn export_map(
        &self,
        elem: TypeId,
        key: TypeId,
        kind: TypeId,
        vars: &mut HashMap<TypeId, String>,
    ) -> TypeExpr {
        let elem_ty = self.export_type(elem, vars);
        let key = self.resolve(key);
        match self.resolve(kind) {
            TypeId::LIST_KIND if key == TypeId::NO_KEY => TypeExpr::with_args("list", vec![elem_ty]),
            TypeId::LIST_KIND if key == TypeId::NUM => TypeExpr::with_args("array", vec![elem_ty]),
            TypeId::LIST_KIND if self.is_var(key) => TypeExpr::with_args("list?", vec![elem_ty]),
            TypeId::MAP_KIND => {
                TypeExpr::with_args("hash", vec![self.export_type(key, vars), elem_ty])
            }
            _ => TypeExpr::with_args("map", vec![self.export_type(key, vars), elem_ty]),
        }
    }
}
