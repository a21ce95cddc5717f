// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Type graph node definitions.

use indexmap::IndexMap;

/// Index of a node in a [`TypeStore`](crate::TypeStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
    // Primitive singletons, allocated first by every store. Unification never
    // rewrites them.
    pub const UNIT: TypeId = TypeId(0);
    pub const BOOL: TypeId = TypeId(1);
    pub const CHAR: TypeId = TypeId(2);
    pub const NUM: TypeId = TypeId(3);
    pub const STR: TypeId = TypeId(4);
    /// Key type of sequences.
    pub const NO_KEY: TypeId = TypeId(5);
    /// Kind marker of list/array containers.
    pub const LIST_KIND: TypeId = TypeId(6);
    /// Kind marker of hash containers.
    pub const MAP_KIND: TypeId = TypeId(7);

    pub(crate) const PRIMITIVE_COUNT: u32 = 8;

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// How a struct field may be used.
///
/// Ordered by strength: merging two tags keeps the stronger one, and
/// anything at or above `NonPolymorphic` blocks generalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum FieldTag {
    #[default]
    Plain,
    NonPolymorphic,
    Mutable,
}

/// A struct field or variant arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Member {
    pub ty: TypeId,
    pub tag: FieldTag,
}

impl Member {
    pub fn plain(ty: TypeId) -> Self {
        Self { ty, tag: FieldTag::Plain }
    }

    pub fn tagged(ty: TypeId, tag: FieldTag) -> Self {
        Self { ty, tag }
    }
}

pub type Fields = IndexMap<String, Member>;

/// Member set of a struct or variant.
///
/// `Open` rows only know some members that must exist; unification with a
/// larger structural type may add more. `Closed` rows additionally carry the
/// complete member set, which can only shrink (intersection) afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    Open { required: Fields },
    Closed { required: Fields, complete: Fields },
}

impl Row {
    pub fn open(required: Fields) -> Self {
        Row::Open { required }
    }

    /// A row whose complete member set is known and nothing is required yet.
    pub fn closed(complete: Fields) -> Self {
        Row::Closed { required: Fields::new(), complete }
    }

    /// Open → closed transition. Closing a closed row keeps its complete set.
    pub fn close(self, complete: Fields) -> Self {
        match self {
            Row::Open { required } => Row::Closed { required, complete },
            closed @ Row::Closed { .. } => closed,
        }
    }

    pub fn required(&self) -> &Fields {
        match self {
            Row::Open { required } | Row::Closed { required, .. } => required,
        }
    }

    pub fn required_mut(&mut self) -> &mut Fields {
        match self {
            Row::Open { required } | Row::Closed { required, .. } => required,
        }
    }

    pub fn complete(&self) -> Option<&Fields> {
        match self {
            Row::Open { .. } => None,
            Row::Closed { complete, .. } => Some(complete),
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Row::Closed { .. })
    }

    /// Member by name, preferring the complete set.
    pub fn get(&self, name: &str) -> Option<&Member> {
        self.complete()
            .and_then(|c| c.get(name))
            .or_else(|| self.required().get(name))
    }

    /// Every member entry (complete set first, then required-only entries).
    pub fn members(&self) -> impl Iterator<Item = (&String, &Member)> {
        let complete = self.complete();
        complete
            .into_iter()
            .flat_map(|c| c.iter())
            .chain(
                self.required()
                    .iter()
                    .filter(move |(name, _)| complete.map_or(true, |c| !c.contains_key(*name))),
            )
    }
}

/// A type node. Only `Var` nodes and struct/variant nodes are ever replaced
/// by links during unification.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeNode {
    /// Unresolved type variable; `depth` is the let-nesting level it was created at.
    Var { depth: u32 },
    Unit,
    Bool,
    Char,
    Num,
    Str,
    NoKey,
    ListKind,
    MapKind,
    Fun { arg: TypeId, ret: TypeId },
    Struct(Row),
    Variant(Row),
    /// Unified list/array/hash representation.
    Map { elem: TypeId, key: TypeId, kind: TypeId },
    /// Host platform class, internal name (`java/lang/String`).
    Host { class: String, args: Vec<TypeId> },
    HostArray(TypeId),
}

impl TypeNode {
    pub fn is_var(&self) -> bool {
        matches!(self, TypeNode::Var { .. })
    }

    pub fn is_host(&self) -> bool {
        matches!(self, TypeNode::Host { .. } | TypeNode::HostArray(_))
    }

    pub fn row(&self) -> Option<&Row> {
        match self {
            TypeNode::Struct(row) | TypeNode::Variant(row) => Some(row),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(names: &[&str]) -> Fields {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.to_string(), Member::plain(TypeId(100 + i as u32))))
            .collect()
    }

    #[test]
    fn close_is_one_way() {
        let row = Row::open(fields(&["a"]));
        assert!(!row.is_closed());
        let row = row.close(fields(&["a", "b"]));
        assert!(row.is_closed());
        assert_eq!(row.required().len(), 1);
        let row = row.close(fields(&["z"]));
        assert!(row.complete().unwrap().contains_key("b"));
        assert!(!row.complete().unwrap().contains_key("z"));
    }

    #[test]
    fn members_lists_each_name_once() {
        let mut row = Row::closed(fields(&["a", "b"]));
        row.required_mut().insert("a".into(), Member::plain(TypeId(1)));
        let names: Vec<_> = row.members().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn tag_strength() {
        assert!(FieldTag::Mutable > FieldTag::NonPolymorphic);
        assert!(FieldTag::NonPolymorphic > FieldTag::Plain);
    }
}
