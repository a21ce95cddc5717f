// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Conditionals, loops and branch type merging.

use tarn_ast::{CondChoice, Node, Span};
use tarn_types::{TypeId, TypeNode};

use super::Analyzer;
use crate::code::{Code, CodeKind, CondBranch};
use crate::error::CompileError;
use crate::scope::Scope;

impl Analyzer<'_> {
    pub(super) fn cond(
        &mut self,
        choices: &[CondChoice],
        span: Span,
        scope: &Scope,
        depth: u32,
    ) -> Result<Code, CompileError> {
        let mut result: Option<TypeId> = None;
        let mut poly = true;
        let mut branches = Vec::with_capacity(choices.len());
        for choice in choices {
            let value = self.analyze(&choice.value, scope, depth)?;
            let guard = match &choice.guard {
                Some(guard) => {
                    let code = self.analyze(guard, scope, depth)?;
                    self.unify_or(TypeId::BOOL, code.ty, guard.span, |store, _| {
                        format!(
                            "if condition must have a boolean type (but here was {})",
                            store.describe(code.ty)
                        )
                    })?;
                    Some(code)
                }
                None => None,
            };
            poly &= value.polymorph;
            result = Some(match result {
                None => value.ty,
                Some(prev) => self.join(prev, value.ty, choice.value.span, |branch, other| {
                    format!("This if branch has a {} type, while another was a {}", branch, other)
                })?,
            });
            branches.push(CondBranch { value, guard });
        }
        let ty = match result {
            Some(ty) => ty,
            None => TypeId::UNIT,
        };
        Ok(Code::new(CodeKind::Cond(branches), ty, span).polymorphic(poly))
    }

    /// `cond loop body`, or `cond loop` when the condition does the work.
    pub(super) fn loop_(
        &mut self,
        cond: Option<&Node>,
        body: &Node,
        span: Span,
        scope: &Scope,
        depth: u32,
    ) -> Result<Code, CompileError> {
        let (cond_node, body_node) = match cond {
            Some(cond) => (cond, Some(body)),
            None => (body, None),
        };
        let cond = self.analyze(cond_node, scope, depth)?;
        self.unify_or(TypeId::BOOL, cond.ty, cond_node.span, |store, _| {
            format!(
                "Loop condition must have a boolean type (but here was {})",
                store.describe(cond.ty)
            )
        })?;
        let body = match body_node {
            Some(node) => {
                let body = self.analyze(node, scope, depth)?;
                self.unify_or(body.ty, TypeId::UNIT, node.span, |store, _| {
                    format!("Loop body must have a unit type, not {}", store.describe(body.ty))
                })?;
                body
            }
            None => Code::new(CodeKind::Unit, TypeId::UNIT, span),
        };
        let code = CodeKind::Loop { cond: Box::new(cond), body: Box::new(body) };
        Ok(Code::new(code, TypeId::UNIT, span))
    }

    /// Result type of two branches: the cheap merge when it applies,
    /// full unification otherwise.
    pub(super) fn join(
        &mut self,
        prev: TypeId,
        next: TypeId,
        span: Span,
        message: impl FnOnce(&str, &str) -> String,
    ) -> Result<TypeId, CompileError> {
        if let Some(merged) = self.merge_types(prev, next) {
            return Ok(merged);
        }
        self.unify_or(prev, next, span, |store, _| {
            let [branch, other] = store.describe_many([next, prev]);
            message(&branch, &other)
        })?;
        Ok(prev)
    }

    /// Merge without unification: identical types, or two host classes
    /// joined at their closest common supertype.
    pub(crate) fn merge_types(&mut self, a: TypeId, b: TypeId) -> Option<TypeId> {
        let a = self.store.deref(a);
        let b = self.store.deref(b);
        if a == b {
            return Some(a);
        }
        let (ca, cb) = match (self.store.node(a), self.store.node(b)) {
            (TypeNode::Host { class: ca, args: aa }, TypeNode::Host { class: cb, args: ab })
                if aa.is_empty() && ab.is_empty() =>
            {
                (ca.clone(), cb.clone())
            }
            _ => return None,
        };
        let common = self.resolver.common_supertype(&ca, &cb)?;
        if common == ca {
            Some(a)
        } else if common == cb {
            Some(b)
        } else {
            Some(self.store.host(common, Vec::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use tarn_types::{TypeId, TypeNode};

    use super::Analyzer;
    use crate::driver::ModuleRegistry;
    use crate::interop::{ClassTable, HostResolver};

    const CLASSES: &[&str] = &[
        "java/lang/Object",
        "java/lang/String",
        "java/lang/Throwable",
        "java/lang/Exception",
        "java/lang/RuntimeException",
    ];

    /// Primitives first, then one host type per class.
    fn palette(analyzer: &mut Analyzer<'_>) -> Vec<TypeId> {
        let mut types = vec![TypeId::UNIT, TypeId::BOOL, TypeId::NUM, TypeId::STR];
        types.push(analyzer.store.list(TypeId::NUM));
        for class in CLASSES {
            types.push(analyzer.store.host(*class, Vec::new()));
        }
        types
    }

    fn class_of(analyzer: &Analyzer<'_>, ty: TypeId) -> Option<String> {
        match analyzer.store.node(ty) {
            TypeNode::Host { class, .. } => Some(class.clone()),
            _ => None,
        }
    }

    #[test]
    fn sibling_classes_merge_at_parent() {
        let classes = ClassTable::new();
        let mut modules = ModuleRegistry::new();
        let mut analyzer = Analyzer::new(&classes, &mut modules, String::new());
        let a = analyzer.store.host("java/lang/String", Vec::new());
        let b = analyzer.store.host("java/lang/Exception", Vec::new());
        let merged = analyzer.merge_types(a, b).unwrap();
        assert_eq!(analyzer.describe(merged), "~java.lang.Object");
    }

    proptest! {
        #[test]
        fn merge_agrees_with_unification(i in 0usize..10, j in 0usize..10) {
            let classes = ClassTable::new();
            let mut modules = ModuleRegistry::new();
            let mut analyzer = Analyzer::new(&classes, &mut modules, String::new());
            let types = palette(&mut analyzer);
            let (a, b) = (types[i], types[j]);
            let hosts = (class_of(&analyzer, a), class_of(&analyzer, b));

            match (analyzer.merge_types(a, b), hosts) {
                (Some(merged), (Some(ca), Some(cb))) => {
                    let common = class_of(&analyzer, merged).unwrap();
                    prop_assert!(classes.distance(&ca, &common).is_some());
                    prop_assert!(classes.distance(&cb, &common).is_some());
                }
                (Some(merged), _) => {
                    prop_assert_eq!(i, j);
                    let expected = analyzer.describe(a);
                    prop_assert!(analyzer.store.unify(a, b).is_ok());
                    prop_assert_eq!(analyzer.describe(merged), expected);
                }
                (None, (Some(_), Some(_))) => prop_assert!(false, "host types always merge"),
                (None, _) => {
                    prop_assert_ne!(i, j);
                    prop_assert!(analyzer.store.unify(a, b).is_err());
                }
            }
        }
    }
}
