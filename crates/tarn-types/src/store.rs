// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Type node arena.

use crate::types::{Fields, FieldTag, Member, Row, TypeId, TypeNode};

#[derive(Debug, Clone)]
enum Slot {
    Link(TypeId),
    Node(TypeNode),
}

/// Arena of type nodes for one compilation.
///
/// Nodes are addressed by [`TypeId`]. Unification replaces variable and
/// struct/variant slots with links; every read goes through [`deref`].
///
/// [`deref`]: TypeStore::deref
#[derive(Debug, Clone)]
pub struct TypeStore {
    slots: Vec<Slot>,
}

impl Default for TypeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeStore {
    pub fn new() -> Self {
        let slots = vec![
            Slot::Node(TypeNode::Unit),
            Slot::Node(TypeNode::Bool),
            Slot::Node(TypeNode::Char),
            Slot::Node(TypeNode::Num),
            Slot::Node(TypeNode::Str),
            Slot::Node(TypeNode::NoKey),
            Slot::Node(TypeNode::ListKind),
            Slot::Node(TypeNode::MapKind),
        ];
        debug_assert_eq!(slots.len() as u32, TypeId::PRIMITIVE_COUNT);
        Self { slots }
    }

    /// Number of allocated nodes (links included).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn alloc(&mut self, node: TypeNode) -> TypeId {
        let id = TypeId(self.slots.len() as u32);
        self.slots.push(Slot::Node(node));
        id
    }

    /// Create a fresh type variable at the given let-nesting depth.
    pub fn fresh(&mut self, depth: u32) -> TypeId {
        self.alloc(TypeNode::Var { depth })
    }

    pub fn fun(&mut self, arg: TypeId, ret: TypeId) -> TypeId {
        self.alloc(TypeNode::Fun { arg, ret })
    }

    pub fn map(&mut self, elem: TypeId, key: TypeId, kind: TypeId) -> TypeId {
        self.alloc(TypeNode::Map { elem, key, kind })
    }

    pub fn list(&mut self, elem: TypeId) -> TypeId {
        self.map(elem, TypeId::NO_KEY, TypeId::LIST_KIND)
    }

    pub fn host(&mut self, class: impl Into<String>, args: Vec<TypeId>) -> TypeId {
        self.alloc(TypeNode::Host { class: class.into(), args })
    }

    /// Open single-member struct `{.name is ty}`.
    pub fn select(&mut self, name: &str, ty: TypeId) -> TypeId {
        let mut required = Fields::new();
        required.insert(name.to_string(), Member::plain(ty));
        self.alloc(TypeNode::Struct(Row::open(required)))
    }

    /// Open single-arm variant `Tag ty`, as built by a tag constructor.
    pub fn tag(&mut self, name: &str, ty: TypeId) -> TypeId {
        let mut required = Fields::new();
        required.insert(name.to_string(), Member::plain(ty));
        self.alloc(TypeNode::Variant(Row::open(required)))
    }

    /// Resolve links without compressing them.
    pub fn resolve(&self, mut id: TypeId) -> TypeId {
        while let Slot::Link(next) = &self.slots[id.index()] {
            id = *next;
        }
        id
    }

    /// Resolve links, compressing the path behind.
    pub fn deref(&mut self, id: TypeId) -> TypeId {
        let root = self.resolve(id);
        let mut cur = id;
        while cur != root {
            let Slot::Link(next) = self.slots[cur.index()] else { break };
            self.slots[cur.index()] = Slot::Link(root);
            cur = next;
        }
        root
    }

    /// The node `id` resolves to.
    pub fn node(&self, id: TypeId) -> &TypeNode {
        match &self.slots[self.resolve(id).index()] {
            Slot::Node(node) => node,
            Slot::Link(_) => unreachable!("resolve stops at nodes"),
        }
    }

    pub(crate) fn node_mut(&mut self, id: TypeId) -> &mut TypeNode {
        let root = self.deref(id);
        match &mut self.slots[root.index()] {
            Slot::Node(node) => node,
            Slot::Link(_) => unreachable!("deref stops at nodes"),
        }
    }

    pub(crate) fn replace(&mut self, id: TypeId, node: TypeNode) {
        self.slots[id.index()] = Slot::Node(node);
    }

    pub(crate) fn link(&mut self, from: TypeId, to: TypeId) {
        debug_assert!(from.0 >= TypeId::PRIMITIVE_COUNT, "primitive singletons are never linked");
        self.slots[from.index()] = Slot::Link(to);
    }

    pub fn is_var(&self, id: TypeId) -> bool {
        self.node(id).is_var()
    }

    /// Row of a struct or variant type.
    pub fn row(&self, id: TypeId) -> Option<&Row> {
        self.node(id).row()
    }

    /// Retag a required member of a struct or variant. Returns false when the
    /// type has no such required member.
    pub fn retag_required(&mut self, id: TypeId, name: &str, tag: FieldTag) -> bool {
        match self.node_mut(id) {
            TypeNode::Struct(row) | TypeNode::Variant(row) => {
                match row.required_mut().get_mut(name) {
                    Some(member) => {
                        member.tag = tag;
                        true
                    }
                    None => false,
                }
            }
            _ => false,
        }
    }

    /// Direct children of a node, in a stable order.
    pub(crate) fn children(&self, id: TypeId) -> Vec<TypeId> {
        match self.node(id) {
            TypeNode::Fun { arg, ret } => vec![*arg, *ret],
            TypeNode::Map { elem, key, kind } => vec![*elem, *key, *kind],
            TypeNode::Struct(row) | TypeNode::Variant(row) => {
                row.members().map(|(_, m)| m.ty).collect()
            }
            TypeNode::Host { args, .. } => args.clone(),
            TypeNode::HostArray(elem) => vec![*elem],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_are_preallocated() {
        let store = TypeStore::new();
        assert_eq!(store.node(TypeId::NUM), &TypeNode::Num);
        assert_eq!(store.node(TypeId::MAP_KIND), &TypeNode::MapKind);
        assert_eq!(store.len(), TypeId::PRIMITIVE_COUNT as usize);
    }

    #[test]
    fn deref_compresses_paths() {
        let mut store = TypeStore::new();
        let a = store.fresh(0);
        let b = store.fresh(0);
        let c = store.fresh(0);
        store.link(a, b);
        store.link(b, c);
        assert_eq!(store.deref(a), c);
        assert!(matches!(store.slots[a.index()], Slot::Link(t) if t == c));
    }

    #[test]
    fn retag_required_member() {
        let mut store = TypeStore::new();
        let s = store.select("x", TypeId::NUM);
        assert!(store.retag_required(s, "x", FieldTag::Mutable));
        assert!(!store.retag_required(s, "y", FieldTag::Mutable));
        assert_eq!(store.row(s).unwrap().get("x").unwrap().tag, FieldTag::Mutable);
    }
}
