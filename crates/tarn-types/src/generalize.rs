// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Free-variable collection and instantiation of generalized types.

use std::collections::{HashMap, HashSet};

use crate::store::TypeStore;
use crate::types::{FieldTag, Fields, Member, Row, TypeId, TypeNode};

/// Variables found by [`TypeStore::free_vars`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FreeVars {
    /// Generalizable variables, in order of first appearance.
    pub free: Vec<TypeId>,
    /// Variables reachable through a mutable or non-polymorphic member.
    /// These must stay shared between uses.
    pub denied: Vec<TypeId>,
}

impl FreeVars {
    pub fn is_empty(&self) -> bool {
        self.free.is_empty() && self.denied.is_empty()
    }

    /// Free variables minus the denied ones.
    pub fn generalizable(&self) -> Vec<TypeId> {
        self.free
            .iter()
            .copied()
            .filter(|v| !self.denied.contains(v))
            .collect()
    }
}

impl TypeStore {
    /// Collect the variables of `ty` created deeper than `depth`. With
    /// `None` every variable counts.
    pub fn free_vars(&self, ty: TypeId, depth: Option<u32>) -> FreeVars {
        let mut vars = FreeVars::default();
        let mut seen = HashSet::new();
        self.collect_free(ty, depth, false, &mut seen, &mut vars);
        vars
    }

    fn collect_free(
        &self,
        ty: TypeId,
        depth: Option<u32>,
        deny: bool,
        seen: &mut HashSet<(TypeId, bool)>,
        vars: &mut FreeVars,
    ) {
        let ty = self.resolve(ty);
        if !seen.insert((ty, deny)) {
            return;
        }
        match self.node(ty) {
            TypeNode::Var { depth: d } => {
                if depth.map_or(true, |limit| *d > limit) {
                    let list = if deny { &mut vars.denied } else { &mut vars.free };
                    if !list.contains(&ty) {
                        list.push(ty);
                    }
                }
            }
            TypeNode::Struct(row) | TypeNode::Variant(row) => {
                for (_, member) in row.members() {
                    let deny = deny || member.tag >= FieldTag::NonPolymorphic;
                    self.collect_free(member.ty, depth, deny, seen, vars);
                }
            }
            _ => {
                for child in self.children(ty) {
                    self.collect_free(child, depth, deny, seen, vars);
                }
            }
        }
    }

    /// Lower every variable of `ty` deeper than `depth` to `depth`, so a
    /// later generalization at that level leaves them shared.
    pub fn limit_depth(&mut self, ty: TypeId, depth: u32) {
        let mut seen = HashSet::new();
        self.lower_depths(ty, depth, &mut seen);
    }

    fn lower_depths(&mut self, ty: TypeId, depth: u32, seen: &mut HashSet<TypeId>) {
        let ty = self.deref(ty);
        if !seen.insert(ty) {
            return;
        }
        if let TypeNode::Var { depth: d } = self.node_mut(ty) {
            if *d > depth {
                *d = depth;
            }
            return;
        }
        for child in self.children(ty) {
            self.lower_depths(child, depth, seen);
        }
    }

    /// Copy `ty`, replacing every variable listed in `free` with a fresh
    /// variable at `depth`. Subgraphs without such variables are shared.
    pub fn instantiate(&mut self, ty: TypeId, free: &[TypeId], depth: u32) -> TypeId {
        if free.is_empty() {
            return ty;
        }
        let mut copies = HashMap::new();
        self.copy_type(ty, free, depth, &mut copies)
    }

    fn copy_type(
        &mut self,
        ty: TypeId,
        free: &[TypeId],
        depth: u32,
        copies: &mut HashMap<TypeId, TypeId>,
    ) -> TypeId {
        let ty = self.deref(ty);
        if let Some(copy) = copies.get(&ty) {
            return *copy;
        }
        if !self.mentions_any(ty, free, &mut HashSet::new()) {
            return ty;
        }
        let node = self.node(ty).clone();
        let copy = match node {
            TypeNode::Var { .. } => self.fresh(depth),
            TypeNode::Fun { arg, ret } => {
                let arg = self.copy_type(arg, free, depth, copies);
                let ret = self.copy_type(ret, free, depth, copies);
                self.fun(arg, ret)
            }
            TypeNode::Map { elem, key, kind } => {
                let elem = self.copy_type(elem, free, depth, copies);
                let key = self.copy_type(key, free, depth, copies);
                let kind = self.copy_type(kind, free, depth, copies);
                self.map(elem, key, kind)
            }
            TypeNode::Struct(row) => {
                let row = self.copy_row(&row, free, depth, copies);
                self.alloc(TypeNode::Struct(row))
            }
            TypeNode::Variant(row) => {
                let row = self.copy_row(&row, free, depth, copies);
                self.alloc(TypeNode::Variant(row))
            }
            TypeNode::Host { class, args } => {
                let args = args
                    .into_iter()
                    .map(|a| self.copy_type(a, free, depth, copies))
                    .collect();
                self.alloc(TypeNode::Host { class, args })
            }
            TypeNode::HostArray(elem) => {
                let elem = self.copy_type(elem, free, depth, copies);
                self.alloc(TypeNode::HostArray(elem))
            }
            _ => ty,
        };
        copies.insert(ty, copy);
        copy
    }

    fn copy_row(
        &mut self,
        row: &Row,
        free: &[TypeId],
        depth: u32,
        copies: &mut HashMap<TypeId, TypeId>,
    ) -> Row {
        let required = self.copy_fields(row.required(), free, depth, copies);
        match row.complete() {
            Some(complete) => {
                let complete = self.copy_fields(complete, free, depth, copies);
                Row::open(required).close(complete)
            }
            None => Row::open(required),
        }
    }

    fn copy_fields(
        &mut self,
        fields: &Fields,
        free: &[TypeId],
        depth: u32,
        copies: &mut HashMap<TypeId, TypeId>,
    ) -> Fields {
        fields
            .iter()
            .map(|(name, m)| {
                let ty = self.copy_type(m.ty, free, depth, copies);
                (name.clone(), Member::tagged(ty, m.tag))
            })
            .collect()
    }

    fn mentions_any(&self, ty: TypeId, vars: &[TypeId], seen: &mut HashSet<TypeId>) -> bool {
        let ty = self.resolve(ty);
        if vars.contains(&ty) {
            return true;
        }
        if !seen.insert(ty) {
            return false;
        }
        self.children(ty)
            .into_iter()
            .any(|child| self.mentions_any(child, vars, seen))
    }
}
