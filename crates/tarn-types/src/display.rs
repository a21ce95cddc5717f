// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Human-readable type rendering for error messages.

use std::collections::HashMap;
use std::fmt::{self, Write};

use crate::store::TypeStore;
use crate::types::{FieldTag, Member, Row, TypeId, TypeNode};

/// Assigns `'a`, `'b`, ... to variables in order of first appearance. One
/// namer is shared by every type in the same message.
#[derive(Default)]
struct VarNames {
    names: HashMap<TypeId, String>,
}

impl VarNames {
    fn name(&mut self, var: TypeId) -> &str {
        let next = self.names.len();
        self.names.entry(var).or_insert_with(|| var_name(next))
    }
}

pub(crate) fn var_name(n: usize) -> String {
    let letter = (b'a' + (n % 26) as u8) as char;
    match n / 26 {
        0 => format!("'{}", letter),
        round => format!("'{}{}", letter, round),
    }
}

impl TypeStore {
    pub fn describe(&self, id: TypeId) -> String {
        let [s] = self.describe_many([id]);
        s
    }

    /// Render several types with consistent variable names.
    pub fn describe_many<const N: usize>(&self, ids: [TypeId; N]) -> [String; N] {
        let mut names = VarNames::default();
        ids.map(|id| {
            let mut out = String::new();
            // Writing to a String cannot fail.
            let _ = self.write_type(&mut out, id, &mut names, false);
            out
        })
    }

    /// `Display` adapter for a single type.
    pub fn display(&self, id: TypeId) -> TypeDisplay<'_> {
        TypeDisplay { store: self, id }
    }

    fn write_type(
        &self,
        out: &mut String,
        id: TypeId,
        names: &mut VarNames,
        as_arg: bool,
    ) -> fmt::Result {
        let id = self.resolve(id);
        match self.node(id) {
            TypeNode::Var { .. } => out.write_str(names.name(id)),
            TypeNode::Unit => out.write_str("()"),
            TypeNode::Bool => out.write_str("boolean"),
            TypeNode::Char => out.write_str("char"),
            TypeNode::Num => out.write_str("number"),
            TypeNode::Str => out.write_str("string"),
            TypeNode::NoKey => out.write_str("none"),
            TypeNode::ListKind => out.write_str("list"),
            TypeNode::MapKind => out.write_str("hash"),
            TypeNode::Fun { arg, ret } => {
                if as_arg {
                    out.write_char('(')?;
                }
                self.write_type(out, *arg, names, true)?;
                out.write_str(" -> ")?;
                self.write_type(out, *ret, names, false)?;
                if as_arg {
                    out.write_char(')')?;
                }
                Ok(())
            }
            TypeNode::Struct(row) => {
                out.write_char('{')?;
                for (i, (name, member)) in row.members().enumerate() {
                    if i > 0 {
                        out.write_str(", ")?;
                    }
                    if member.tag == FieldTag::Mutable {
                        out.write_str("var ")?;
                    }
                    if is_required_only(row, name) {
                        out.write_char('.')?;
                    }
                    write!(out, "{} is ", name)?;
                    self.write_type(out, member.ty, names, false)?;
                }
                out.write_char('}')
            }
            TypeNode::Variant(row) => {
                if as_arg {
                    out.write_char('(')?;
                }
                for (i, (name, Member { ty, .. })) in row.members().enumerate() {
                    if i > 0 {
                        out.write_str(" | ")?;
                    }
                    write!(out, "{} ", name)?;
                    self.write_type(out, *ty, names, true)?;
                }
                if as_arg {
                    out.write_char(')')?;
                }
                Ok(())
            }
            TypeNode::Map { elem, key, kind } => self.write_map(out, *elem, *key, *kind, names),
            TypeNode::Host { class, args } => {
                write!(out, "~{}", class.replace('/', "."))?;
                if !args.is_empty() {
                    out.write_char('<')?;
                    for (i, a) in args.iter().enumerate() {
                        if i > 0 {
                            out.write_str(", ")?;
                        }
                        self.write_type(out, *a, names, false)?;
                    }
                    out.write_char('>')?;
                }
                Ok(())
            }
            TypeNode::HostArray(elem) => {
                self.write_type(out, *elem, names, true)?;
                out.write_str("[]")
            }
        }
    }

    fn write_map(
        &self,
        out: &mut String,
        elem: TypeId,
        key: TypeId,
        kind: TypeId,
        names: &mut VarNames,
    ) -> fmt::Result {
        let key = self.resolve(key);
        let kind = self.resolve(kind);
        let keyed = match (kind, key) {
            (TypeId::LIST_KIND, TypeId::NO_KEY) => Some("list"),
            (TypeId::LIST_KIND, TypeId::NUM) => Some("array"),
            (TypeId::LIST_KIND, _) if self.is_var(key) => Some("list?"),
            (TypeId::MAP_KIND, _) => None,
            _ => {
                out.write_str("map")?;
                return self.write_pair(out, key, elem, names);
            }
        };
        match keyed {
            Some(container) => {
                write!(out, "{}<", container)?;
                self.write_type(out, elem, names, false)?;
                out.write_char('>')
            }
            None => {
                out.write_str("hash")?;
                self.write_pair(out, key, elem, names)
            }
        }
    }

    fn write_pair(&self, out: &mut String, a: TypeId, b: TypeId, names: &mut VarNames) -> fmt::Result {
        out.write_char('<')?;
        self.write_type(out, a, names, false)?;
        out.write_str(", ")?;
        self.write_type(out, b, names, false)?;
        out.write_char('>')
    }
}

fn is_required_only(row: &Row, name: &str) -> bool {
    match row {
        Row::Open { .. } => true,
        Row::Closed { complete, .. } => !complete.contains_key(name),
    }
}

pub struct TypeDisplay<'a> {
    store: &'a TypeStore,
    id: TypeId,
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.store.describe(self.id))
    }
}
