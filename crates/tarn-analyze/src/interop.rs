// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Host platform interop.
//!
//! The analyzer never inspects host classes itself; it asks a
//! [`HostResolver`]. Class names are internal names with `/` separators
//! (`java/lang/String`). Member signatures are written type syntax and are
//! elaborated by the analyzer like any other annotation.

use indexmap::IndexMap;
use tarn_ast::{TypeExpr, TypeExprKind};

#[derive(Debug, Clone, PartialEq)]
pub struct HostField {
    pub class: String,
    pub name: String,
    pub ty: TypeExpr,
    pub is_static: bool,
    /// Non-final fields may be assigned.
    pub mutable: bool,
}

/// A method or constructor signature.
#[derive(Debug, Clone, PartialEq)]
pub struct HostMethod {
    pub class: String,
    pub name: String,
    pub params: Vec<TypeExpr>,
    pub ret: TypeExpr,
    pub is_static: bool,
}

/// Resolution failure, reported by the analyzer as an unresolved member.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ResolveError(pub String);

pub trait HostResolver {
    /// Internal name of a class given a qualified (`pkg/Name`) or bare name.
    fn resolve_class(&self, name: &str) -> Option<String>;

    fn field(&self, class: &str, name: &str, is_static: bool) -> Result<HostField, ResolveError>;

    /// Pick the best overload for the argument types (exported written
    /// syntax; variables accept any parameter).
    fn method(
        &self,
        class: &str,
        name: &str,
        args: &[TypeExpr],
        is_static: bool,
    ) -> Result<HostMethod, ResolveError>;

    fn constructor(&self, class: &str, args: &[TypeExpr]) -> Result<HostMethod, ResolveError>;

    /// Number of inheritance steps from `from` up to `to`, or `None` when a
    /// `from` value cannot be assigned to `to`.
    fn distance(&self, from: &str, to: &str) -> Option<u32>;

    /// Closest class both arguments can be assigned to.
    fn common_supertype(&self, a: &str, b: &str) -> Option<String>;

    fn is_throwable(&self, class: &str) -> bool;
}

/// A class description for [`ClassTable`].
#[derive(Debug, Clone, Default)]
pub struct ClassDef {
    pub name: String,
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<HostField>,
    pub methods: Vec<HostMethod>,
    pub constructors: Vec<HostMethod>,
}

impl ClassDef {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), ..Default::default() }
    }

    pub fn extends(mut self, superclass: &str) -> Self {
        self.superclass = Some(superclass.to_string());
        self
    }

    pub fn implements(mut self, interface: &str) -> Self {
        self.interfaces.push(interface.to_string());
        self
    }

    pub fn field(mut self, name: &str, ty: TypeExpr, is_static: bool, mutable: bool) -> Self {
        self.fields.push(HostField {
            class: self.name.clone(),
            name: name.to_string(),
            ty,
            is_static,
            mutable,
        });
        self
    }

    pub fn method(mut self, name: &str, params: Vec<TypeExpr>, ret: TypeExpr, is_static: bool) -> Self {
        self.methods.push(HostMethod {
            class: self.name.clone(),
            name: name.to_string(),
            params,
            ret,
            is_static,
        });
        self
    }

    pub fn constructor(mut self, params: Vec<TypeExpr>) -> Self {
        self.constructors.push(HostMethod {
            class: self.name.clone(),
            name: "<init>".to_string(),
            params,
            ret: TypeExpr::host(self.name.replace('/', ".")),
            is_static: false,
        });
        self
    }
}

const ROOT_CLASS: &str = "java/lang/Object";
const THROWABLE: &str = "java/lang/Throwable";
/// Class of the values produced by `classOf`.
pub const CLASS_OBJECT: &str = "java/lang/Class";

/// In-memory [`HostResolver`] over a fixed set of classes.
#[derive(Debug, Clone)]
pub struct ClassTable {
    classes: IndexMap<String, ClassDef>,
    /// Packages searched for bare class names.
    default_packages: Vec<String>,
}

impl Default for ClassTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassTable {
    /// A table with the root class, strings and the throwable hierarchy.
    pub fn new() -> Self {
        let mut table = Self {
            classes: IndexMap::new(),
            default_packages: vec!["java/lang".to_string()],
        };
        table.add(
            ClassDef::new(ROOT_CLASS)
                .constructor(vec![])
                .method("toString", vec![], TypeExpr::named("string"), false),
        );
        table.add(
            ClassDef::new("java/lang/String")
                .extends(ROOT_CLASS)
                .method("length", vec![], TypeExpr::named("number"), false)
                .method("trim", vec![], TypeExpr::named("string"), false),
        );
        table.add(
            ClassDef::new(CLASS_OBJECT)
                .extends(ROOT_CLASS)
                .method("getName", vec![], TypeExpr::named("string"), false),
        );
        table.add(
            ClassDef::new(THROWABLE)
                .extends(ROOT_CLASS)
                .constructor(vec![])
                .constructor(vec![TypeExpr::named("string")])
                .method("getMessage", vec![], TypeExpr::named("string"), false),
        );
        table.add(
            ClassDef::new("java/lang/Exception")
                .extends(THROWABLE)
                .constructor(vec![])
                .constructor(vec![TypeExpr::named("string")]),
        );
        table.add(
            ClassDef::new("java/lang/RuntimeException")
                .extends("java/lang/Exception")
                .constructor(vec![])
                .constructor(vec![TypeExpr::named("string")]),
        );
        table
    }

    pub fn add(&mut self, class: ClassDef) -> &mut Self {
        self.classes.insert(class.name.clone(), class);
        self
    }

    pub fn with_class(mut self, class: ClassDef) -> Self {
        self.add(class);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ClassDef> {
        self.classes.get(name)
    }

    /// `class` followed by its ancestors, nearest first.
    fn ancestry<'a>(&'a self, class: &'a str) -> Vec<&'a str> {
        let mut out = vec![class];
        let mut i = 0;
        while i < out.len() {
            if let Some(def) = self.classes.get(out[i]) {
                for parent in def.superclass.iter().chain(def.interfaces.iter()) {
                    if !out.contains(&parent.as_str()) {
                        out.push(parent);
                    }
                }
            }
            i += 1;
        }
        out
    }

    fn members<'a, T, F>(&'a self, class: &'a str, pick: F) -> impl Iterator<Item = &'a T> + 'a
    where
        T: 'a,
        F: Fn(&'a ClassDef) -> &'a [T] + 'a,
    {
        self.ancestry(class)
            .into_iter()
            .filter_map(move |c| self.classes.get(c))
            .flat_map(move |def| pick(def).iter())
    }

    /// Cost of passing an argument of type `arg` to a parameter `param`.
    fn arg_cost(&self, arg: &TypeExpr, param: &TypeExpr) -> Option<u32> {
        match (&arg.kind, &param.kind) {
            (TypeExprKind::Named { name, .. }, _) if name.starts_with('\'') => Some(0),
            (TypeExprKind::Host { class: a, .. }, TypeExprKind::Host { class: p, .. }) => {
                self.distance(&a.replace('.', "/"), &p.replace('.', "/"))
            }
            (TypeExprKind::Named { name: a, .. }, TypeExprKind::Named { name: p, .. }) if a == p => {
                Some(0)
            }
            // Unit is the null value of every class.
            (TypeExprKind::Named { name, .. }, TypeExprKind::Host { .. }) if name == "()" => Some(1),
            _ if arg == param => Some(0),
            _ => None,
        }
    }

    fn best_overload<'a>(
        &self,
        candidates: impl Iterator<Item = &'a HostMethod>,
        args: &[TypeExpr],
    ) -> Option<&'a HostMethod> {
        candidates
            .filter(|m| m.params.len() == args.len())
            .filter_map(|m| {
                let cost = args
                    .iter()
                    .zip(&m.params)
                    .map(|(a, p)| self.arg_cost(a, p))
                    .sum::<Option<u32>>()?;
                Some((cost, m))
            })
            .min_by_key(|(cost, _)| *cost)
            .map(|(_, m)| m)
    }
}

fn describe_args(args: &[TypeExpr]) -> String {
    args.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ")
}

fn dotted(class: &str) -> String {
    class.replace('/', ".")
}

impl HostResolver for ClassTable {
    fn resolve_class(&self, name: &str) -> Option<String> {
        if self.classes.contains_key(name) {
            return Some(name.to_string());
        }
        if name.contains('/') {
            return None;
        }
        self.default_packages
            .iter()
            .map(|pkg| format!("{}/{}", pkg, name))
            .find(|qualified| self.classes.contains_key(qualified))
    }

    fn field(&self, class: &str, name: &str, is_static: bool) -> Result<HostField, ResolveError> {
        self.members(class, |def| def.fields.as_slice())
            .find(|f| f.name == name && f.is_static == is_static)
            .cloned()
            .ok_or_else(|| {
                let kind = if is_static { "static field" } else { "field" };
                ResolveError(format!("No {} {} found in {}", kind, name, dotted(class)))
            })
    }

    fn method(
        &self,
        class: &str,
        name: &str,
        args: &[TypeExpr],
        is_static: bool,
    ) -> Result<HostMethod, ResolveError> {
        let candidates = self
            .members(class, |def| def.methods.as_slice())
            .filter(|m| m.name == name && m.is_static == is_static);
        self.best_overload(candidates, args).cloned().ok_or_else(|| {
            let kind = if is_static { "static method" } else { "method" };
            ResolveError(format!(
                "No suitable {} {}({}) found in {}",
                kind,
                name,
                describe_args(args),
                dotted(class)
            ))
        })
    }

    fn constructor(&self, class: &str, args: &[TypeExpr]) -> Result<HostMethod, ResolveError> {
        let def = self
            .classes
            .get(class)
            .ok_or_else(|| ResolveError(format!("Unknown class: {}", dotted(class))))?;
        self.best_overload(def.constructors.iter(), args).cloned().ok_or_else(|| {
            ResolveError(format!(
                "No suitable constructor {}({}) found",
                dotted(class),
                describe_args(args)
            ))
        })
    }

    fn distance(&self, from: &str, to: &str) -> Option<u32> {
        if from == to {
            return Some(0);
        }
        // Breadth-first over the supertype graph.
        let mut frontier = vec![from];
        let mut steps = 0;
        let mut seen = vec![from];
        while !frontier.is_empty() {
            steps += 1;
            let mut next = Vec::new();
            for class in frontier {
                let Some(def) = self.classes.get(class) else { continue };
                for parent in def.superclass.iter().chain(def.interfaces.iter()) {
                    if parent == to {
                        return Some(steps);
                    }
                    if !seen.contains(&parent.as_str()) {
                        seen.push(parent);
                        next.push(parent.as_str());
                    }
                }
            }
            frontier = next;
        }
        // Every known class is a root class.
        (to == ROOT_CLASS).then_some(steps.max(1))
    }

    fn common_supertype(&self, a: &str, b: &str) -> Option<String> {
        let b_ancestry = self.ancestry(b);
        self.ancestry(a)
            .into_iter()
            .find(|c| b_ancestry.contains(c))
            .map(str::to_string)
    }

    fn is_throwable(&self, class: &str) -> bool {
        self.distance(class, THROWABLE).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ClassTable {
        ClassTable::new()
            .with_class(ClassDef::new("java/util/AbstractList").extends("java/lang/Object"))
            .with_class(
                ClassDef::new("java/util/ArrayList")
                    .extends("java/util/AbstractList")
                    .implements("java/util/List")
                    .constructor(vec![])
                    .method("size", vec![], TypeExpr::named("number"), false)
                    .method("add", vec![TypeExpr::host("java.lang.Object")], TypeExpr::named("boolean"), false)
                    .method("add", vec![TypeExpr::host("java.lang.String")], TypeExpr::named("()"), false),
            )
            .with_class(ClassDef::new("java/util/List"))
    }

    #[test]
    fn resolves_bare_names_in_default_package() {
        let t = table();
        assert_eq!(t.resolve_class("String").as_deref(), Some("java/lang/String"));
        assert_eq!(t.resolve_class("java/util/ArrayList").as_deref(), Some("java/util/ArrayList"));
        assert_eq!(t.resolve_class("Missing"), None);
    }

    #[test]
    fn distances_follow_inheritance() {
        let t = table();
        assert_eq!(t.distance("java/util/ArrayList", "java/util/ArrayList"), Some(0));
        assert_eq!(t.distance("java/util/ArrayList", "java/util/AbstractList"), Some(1));
        assert_eq!(t.distance("java/util/ArrayList", "java/util/List"), Some(1));
        assert_eq!(t.distance("java/util/ArrayList", "java/lang/Object"), Some(2));
        assert_eq!(t.distance("java/lang/Object", "java/util/ArrayList"), None);
    }

    #[test]
    fn picks_closest_overload() {
        let t = table();
        let m = t
            .method("java/util/ArrayList", "add", &[TypeExpr::host("java.lang.String")], false)
            .unwrap();
        assert_eq!(m.ret, TypeExpr::named("()"));
        let m = t
            .method("java/util/ArrayList", "add", &[TypeExpr::host("java.lang.Exception")], false)
            .unwrap();
        assert_eq!(m.ret, TypeExpr::named("boolean"));
        assert!(t.method("java/util/ArrayList", "add", &[], false).is_err());
    }

    #[test]
    fn inherited_members_and_throwables() {
        let t = table();
        assert!(t.method("java/util/ArrayList", "toString", &[], false).is_ok());
        assert!(t.is_throwable("java/lang/RuntimeException"));
        assert!(!t.is_throwable("java/lang/String"));
        assert_eq!(
            t.common_supertype("java/lang/RuntimeException", "java/lang/Throwable").as_deref(),
            Some("java/lang/Throwable")
        );
    }
}
