// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Unification.

use std::collections::HashSet;

use crate::errors::{MismatchReason, TypeError};
use crate::store::TypeStore;
use crate::types::{FieldTag, Fields, Member, Row, TypeId, TypeNode};

impl TypeStore {
    /// Unify two types, aliasing variables and merging structural rows.
    ///
    /// On failure the graph may be partially unified; callers abort the
    /// compilation anyway.
    pub fn unify(&mut self, a: TypeId, b: TypeId) -> Result<(), TypeError> {
        let a = self.deref(a);
        let b = self.deref(b);
        if a == b {
            return Ok(());
        }

        match (self.node(a).clone(), self.node(b).clone()) {
            (TypeNode::Var { depth: da }, TypeNode::Var { depth: db }) => {
                // Keep the shallower variable so generalization stays sound.
                if da <= db {
                    self.link(b, a);
                } else {
                    self.link(a, b);
                }
                Ok(())
            }
            (TypeNode::Var { depth }, _) => self.bind_var(a, depth, b),
            (_, TypeNode::Var { depth }) => self.bind_var(b, depth, a),

            (TypeNode::Fun { arg: a1, ret: r1 }, TypeNode::Fun { arg: a2, ret: r2 }) => {
                self.unify(a1, a2)?;
                self.unify(r1, r2)
            }

            (
                TypeNode::Map { elem: e1, key: k1, kind: c1 },
                TypeNode::Map { elem: e2, key: k2, kind: c2 },
            ) => {
                self.unify(e1, e2)?;
                self.unify(k1, k2)?;
                self.unify(c1, c2)
            }

            (TypeNode::Struct(ra), TypeNode::Struct(rb)) => {
                let row = self.unify_rows(a, &ra, b, &rb)?;
                self.merge_into(a, b, TypeNode::Struct(row));
                Ok(())
            }
            (TypeNode::Variant(ra), TypeNode::Variant(rb)) => {
                let row = self.unify_rows(a, &ra, b, &rb)?;
                self.merge_into(a, b, TypeNode::Variant(row));
                Ok(())
            }

            (
                TypeNode::Host { class: c1, args: p1 },
                TypeNode::Host { class: c2, args: p2 },
            ) => {
                if c1 != c2 || (!p1.is_empty() && !p2.is_empty() && p1.len() != p2.len()) {
                    return Err(self.mismatch(a, b, MismatchReason::Shape));
                }
                for (x, y) in p1.iter().zip(p2.iter()) {
                    self.unify(*x, *y)?;
                }
                Ok(())
            }
            (TypeNode::HostArray(e1), TypeNode::HostArray(e2)) => self.unify(e1, e2),

            (x, y) if x == y && !matches!(x, TypeNode::Host { .. }) => Ok(()),

            _ => Err(self.mismatch(a, b, MismatchReason::Shape)),
        }
    }

    /// Store the merged row in `a` and alias `b` to it.
    fn merge_into(&mut self, a: TypeId, b: TypeId, merged: TypeNode) {
        let a = self.deref(a);
        let b = self.deref(b);
        self.replace(a, merged);
        if a != b {
            self.link(b, a);
        }
    }

    fn mismatch(&self, a: TypeId, b: TypeId, reason: MismatchReason) -> TypeError {
        let [left, right] = self.describe_many([a, b]);
        TypeError::new(left, right, reason)
    }

    /// Bind variable `var` to `ty` after the occurs check, lowering the depth
    /// of every variable inside `ty` to the variable's depth.
    fn bind_var(&mut self, var: TypeId, depth: u32, ty: TypeId) -> Result<(), TypeError> {
        let mut seen = HashSet::new();
        if self.occurs_limiting_depth(var, ty, depth, &mut seen) {
            return Err(self.mismatch(var, ty, MismatchReason::Cyclic));
        }
        self.link(var, ty);
        Ok(())
    }

    fn occurs_limiting_depth(
        &mut self,
        var: TypeId,
        ty: TypeId,
        depth: u32,
        seen: &mut HashSet<TypeId>,
    ) -> bool {
        let ty = self.deref(ty);
        if ty == var {
            return true;
        }
        if !seen.insert(ty) {
            return false;
        }
        if let TypeNode::Var { depth: d } = self.node_mut(ty) {
            if *d > depth {
                *d = depth;
            }
            return false;
        }
        for child in self.children(ty) {
            if self.occurs_limiting_depth(var, child, depth, seen) {
                return true;
            }
        }
        false
    }

    /// Merge two rows. Complete sets intersect, required sets join, and
    /// each side's required members must exist in the other's complete set.
    fn unify_rows(&mut self, a: TypeId, ra: &Row, b: TypeId, rb: &Row) -> Result<Row, TypeError> {
        let complete = match (ra.complete(), rb.complete()) {
            (None, None) => None,
            (Some(c), None) | (None, Some(c)) => Some(c.clone()),
            (Some(ca), Some(cb)) => {
                let mut merged = Fields::new();
                for (name, ma) in ca {
                    if let Some(mb) = cb.get(name) {
                        self.unify(ma.ty, mb.ty)?;
                        merged.insert(name.clone(), Member::tagged(ma.ty, merge_complete_tags(ma.tag, mb.tag)));
                    }
                }
                if merged.is_empty() {
                    return Err(self.mismatch(a, b, MismatchReason::NoCommonMembers));
                }
                Some(merged)
            }
        };

        self.check_required(ra.required(), rb.complete(), a, b)?;
        self.check_required(rb.required(), ra.complete(), b, a)?;

        let mut required = ra.required().clone();
        for (name, mb) in rb.required() {
            match required.get_mut(name) {
                Some(ma) => {
                    self.unify(ma.ty, mb.ty)?;
                    ma.tag = ma.tag.max(mb.tag);
                }
                None => {
                    required.insert(name.clone(), *mb);
                }
            }
        }

        Ok(match complete {
            Some(complete) => Row::Open { required }.close(complete),
            None => Row::Open { required },
        })
    }

    fn check_required(
        &mut self,
        required: &Fields,
        complete: Option<&Fields>,
        partial_side: TypeId,
        complete_side: TypeId,
    ) -> Result<(), TypeError> {
        let Some(complete) = complete else {
            return Ok(());
        };
        for (name, member) in required {
            let Some(given) = complete.get(name) else {
                return Err(self.mismatch(
                    complete_side,
                    partial_side,
                    MismatchReason::MissingMember(name.clone()),
                ));
            };
            if member.tag == FieldTag::Mutable && given.tag != FieldTag::Mutable {
                return Err(self.mismatch(
                    complete_side,
                    partial_side,
                    MismatchReason::ImmutableMember(name.clone()),
                ));
            }
            self.unify(member.ty, given.ty)?;
        }
        Ok(())
    }
}

/// Tag of a member both closed rows declare. Differing mutability means the
/// merged view can be neither assigned nor generalized.
fn merge_complete_tags(a: FieldTag, b: FieldTag) -> FieldTag {
    if a == b {
        a
    } else {
        FieldTag::NonPolymorphic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closed_struct(store: &mut TypeStore, fields: &[(&str, TypeId)]) -> TypeId {
        let complete = fields
            .iter()
            .map(|(n, t)| (n.to_string(), Member::plain(*t)))
            .collect();
        store.alloc(TypeNode::Struct(Row::closed(complete)))
    }

    #[test]
    fn var_binds_to_concrete() {
        let mut store = TypeStore::new();
        let v = store.fresh(0);
        store.unify(v, TypeId::NUM).unwrap();
        assert_eq!(store.deref(v), TypeId::NUM);
    }

    #[test]
    fn vars_alias_and_keep_shallower_depth() {
        let mut store = TypeStore::new();
        let deep = store.fresh(3);
        let shallow = store.fresh(1);
        store.unify(deep, shallow).unwrap();
        assert_eq!(store.deref(deep), store.deref(shallow));
        assert_eq!(store.node(deep), &TypeNode::Var { depth: 1 });
    }

    #[test]
    fn binding_lowers_inner_depths() {
        let mut store = TypeStore::new();
        let outer = store.fresh(0);
        let inner = store.fresh(2);
        let f = store.fun(inner, TypeId::NUM);
        store.unify(outer, f).unwrap();
        assert_eq!(store.node(inner), &TypeNode::Var { depth: 0 });
    }

    #[test]
    fn primitive_mismatch_describes_both_sides() {
        let mut store = TypeStore::new();
        let err = store.unify(TypeId::NUM, TypeId::STR).unwrap_err();
        assert_eq!(err.to_string(), "number is not string");
    }

    #[test]
    fn occurs_check() {
        let mut store = TypeStore::new();
        let v = store.fresh(0);
        let l = store.list(v);
        let err = store.unify(v, l).unwrap_err();
        assert_eq!(err.reason, MismatchReason::Cyclic);
    }

    #[test]
    fn selection_against_closed_struct() {
        let mut store = TypeStore::new();
        let s = closed_struct(&mut store, &[("a", TypeId::NUM), ("b", TypeId::STR)]);
        let res = store.fresh(0);
        let sel = store.select("b", res);
        store.unify(sel, s).unwrap();
        assert_eq!(store.deref(res), TypeId::STR);
        let row = store.row(s).unwrap();
        assert!(row.is_closed());
        assert!(row.required().contains_key("b"));
    }

    #[test]
    fn missing_member_is_an_error() {
        let mut store = TypeStore::new();
        let s = closed_struct(&mut store, &[("a", TypeId::NUM)]);
        let res = store.fresh(0);
        let sel = store.select("c", res);
        let err = store.unify(s, sel).unwrap_err();
        assert_eq!(err.reason, MismatchReason::MissingMember("c".into()));
    }

    #[test]
    fn open_rows_join() {
        let mut store = TypeStore::new();
        let x = store.fresh(0);
        let y = store.fresh(0);
        let a = store.select("a", x);
        let b = store.select("b", y);
        store.unify(a, b).unwrap();
        let row = store.row(a).unwrap();
        assert!(!row.is_closed());
        assert_eq!(row.required().len(), 2);
    }

    #[test]
    fn closed_rows_intersect() {
        let mut store = TypeStore::new();
        let s1 = closed_struct(&mut store, &[("a", TypeId::NUM), ("b", TypeId::STR)]);
        let s2 = closed_struct(&mut store, &[("a", TypeId::NUM), ("c", TypeId::BOOL)]);
        store.unify(s1, s2).unwrap();
        let complete = store.row(s1).unwrap().complete().unwrap();
        assert_eq!(complete.keys().collect::<Vec<_>>(), vec!["a"]);

        let s3 = closed_struct(&mut store, &[("z", TypeId::NUM)]);
        let err = store.unify(s1, s3).unwrap_err();
        assert_eq!(err.reason, MismatchReason::NoCommonMembers);
    }

    #[test]
    fn mutable_requirement_against_immutable_member() {
        let mut store = TypeStore::new();
        let s = closed_struct(&mut store, &[("a", TypeId::NUM)]);
        let sel = store.select("a", TypeId::NUM);
        store.retag_required(sel, "a", FieldTag::Mutable);
        let err = store.unify(sel, s).unwrap_err();
        assert_eq!(err.reason, MismatchReason::ImmutableMember("a".into()));
    }

    #[test]
    fn open_variant_joins_closed_variant() {
        let mut store = TypeStore::new();
        let payload = store.fresh(0);
        let tag = store.tag("Some", payload);
        let mut complete = Fields::new();
        complete.insert("Some".into(), Member::plain(TypeId::NUM));
        complete.insert("None".into(), Member::plain(TypeId::UNIT));
        let closed = store.alloc(TypeNode::Variant(Row::closed(complete)));
        store.unify(tag, closed).unwrap();
        assert_eq!(store.deref(payload), TypeId::NUM);

        let other = store.fresh(0);
        let bad = store.tag("Other", other);
        assert!(store.unify(bad, closed).is_err());
    }

    #[test]
    fn host_types_unify_by_class() {
        let mut store = TypeStore::new();
        let a = store.host("java/lang/String", vec![]);
        let b = store.host("java/lang/String", vec![]);
        let c = store.host("java/lang/Object", vec![]);
        store.unify(a, b).unwrap();
        assert!(store.unify(a, c).is_err());
    }

    #[test]
    fn unify_is_idempotent() {
        let mut store = TypeStore::new();
        let v = store.fresh(0);
        let f1 = store.fun(v, TypeId::STR);
        let f2 = store.fun(TypeId::NUM, TypeId::STR);
        store.unify(f1, f2).unwrap();
        let before = store.describe(f1);
        store.unify(f1, f2).unwrap();
        assert_eq!(store.describe(f1), before);
    }
}
