// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The semantic analyzer: one dispatch over node kinds, with an elaborator
//! per construct.

use tarn_ast::{Span, TypeExpr};
use tarn_types::{TypeError, TypeId, TypeStore};

use crate::code::{Binding, BindingId, BindingKind, Closure, ClosureId, ClosureKind, Code, CodeKind};
use crate::driver::ModuleLoader;
use crate::error::{CompileError, ErrorKind};
use crate::interop::HostResolver;
use crate::scope::{Item, SchemeOrigin, Scope};
use crate::type_expr::elaborate_at;

mod expr;
mod apply;
mod record;
mod collection;
mod control;
mod case;
mod binding;
mod lambda;
mod cast;
mod host;
mod module;

pub(crate) struct Analyzer<'a> {
    /// Type graph of this compilation.
    pub(crate) store: TypeStore,
    /// Binding arena.
    pub(crate) bindings: Vec<Binding>,
    /// Closure arena; slot 0 is the root closure.
    pub(crate) closures: Vec<Closure>,
    resolver: &'a dyn HostResolver,
    modules: &'a mut dyn ModuleLoader,
    /// Package of the unit, used to qualify bare class names.
    package: String,
}

impl<'a> Analyzer<'a> {
    pub fn new(
        resolver: &'a dyn HostResolver,
        modules: &'a mut dyn ModuleLoader,
        package: String,
    ) -> Self {
        let root = Closure {
            kind: ClosureKind::Root,
            parent: None,
            ty: TypeId::UNIT,
            arg: None,
            body: None,
            captures: Vec::new(),
            vars: Vec::new(),
            self_binding: None,
            bind_name: None,
        };
        Self {
            store: TypeStore::new(),
            bindings: Vec::new(),
            closures: vec![root],
            resolver,
            modules,
            package,
        }
    }

    pub fn into_parts(self) -> (TypeStore, Vec<Binding>, Vec<Closure>) {
        (self.store, self.bindings, self.closures)
    }

    pub(crate) fn fresh(&mut self, depth: u32) -> TypeId {
        self.store.fresh(depth)
    }

    pub(crate) fn describe(&self, ty: TypeId) -> String {
        self.store.describe(ty)
    }

    pub(crate) fn binding(&self, id: BindingId) -> &Binding {
        &self.bindings[id.index()]
    }

    pub(crate) fn binding_mut(&mut self, id: BindingId) -> &mut Binding {
        &mut self.bindings[id.index()]
    }

    pub(crate) fn closure_mut(&mut self, id: ClosureId) -> &mut Closure {
        &mut self.closures[id.index()]
    }

    pub(crate) fn new_binding(
        &mut self,
        name: &str,
        ty: TypeId,
        kind: BindingKind,
        mutable: bool,
        span: Span,
    ) -> BindingId {
        let id = BindingId(self.bindings.len() as u32);
        self.bindings.push(Binding {
            name: name.to_string(),
            ty,
            kind,
            mutable,
            polymorph: false,
            used: false,
            self_used: false,
            defining: false,
            span,
        });
        id
    }

    pub(crate) fn new_closure(&mut self, kind: ClosureKind, parent: Option<ClosureId>, ty: TypeId) -> ClosureId {
        let id = ClosureId(self.closures.len() as u32);
        self.closures.push(Closure {
            kind,
            parent,
            ty,
            arg: None,
            body: None,
            captures: Vec::new(),
            vars: Vec::new(),
            self_binding: None,
            bind_name: None,
        });
        id
    }

    /// Register a `var` binding with the closure that owns it.
    pub(crate) fn register_var(&mut self, binding: BindingId, scope: &Scope) {
        let closure = scope.nearest_closure().unwrap_or(ClosureId::ROOT);
        self.closure_mut(closure).vars.push(binding);
    }

    /// Unify, turning a failure into a type-mismatch error at `span`. The
    /// message is built after the failure so it sees the final types.
    pub(crate) fn unify_or(
        &mut self,
        a: TypeId,
        b: TypeId,
        span: Span,
        message: impl FnOnce(&TypeStore, &TypeError) -> String,
    ) -> Result<(), CompileError> {
        self.store.unify(a, b).map_err(|err| {
            CompileError::mismatch(span, message(&self.store, &err)).caused_by(err)
        })
    }

    pub(crate) fn elaborate(&mut self, expr: &TypeExpr, scope: &Scope, depth: u32) -> Result<TypeId, CompileError> {
        elaborate_at(&mut self.store, scope, self.resolver, &self.package, depth, expr)
    }

    /// Resolve a lowercase name to a value.
    pub(crate) fn resolve(&mut self, name: &str, span: Span, scope: &Scope, depth: u32) -> Result<Code, CompileError> {
        let Some(found) = scope.lookup(name) else {
            return Err(CompileError::unresolved(span, format!("Unknown identifier: {}", name)));
        };
        match found.item {
            Item::Local { binding, free } => {
                for closure in found.crossed {
                    let captures = &mut self.closures[closure.index()].captures;
                    if closure != ClosureId::ROOT && !captures.contains(&binding) {
                        captures.push(binding);
                    }
                }
                let b = self.binding_mut(binding);
                if b.defining {
                    b.self_used = true;
                } else {
                    b.used = true;
                }
                let (ty, polymorph) = (b.ty, b.polymorph && !b.defining);
                let ty = self.store.instantiate(ty, &free, depth);
                Ok(Code::new(CodeKind::Var(binding), ty, span).polymorphic(polymorph))
            }
            Item::Scheme { signature, origin } => {
                let ty = elaborate_at(
                    &mut self.store,
                    &Scope::empty(),
                    self.resolver,
                    "",
                    depth,
                    &signature,
                )?;
                let kind = match origin {
                    SchemeOrigin::Builtin => CodeKind::Builtin(name.to_string()),
                    SchemeOrigin::ModuleField { module, mutable } => CodeKind::ModuleField {
                        module,
                        field: name.to_string(),
                        mutable,
                    },
                };
                Ok(Code::new(kind, ty, span).polymorphic(true))
            }
            Item::Class(_) => Err(CompileError::new(
                ErrorKind::UnresolvedName,
                span,
                format!("{} is a class, not a value", name),
            )),
            Item::Nothing => Err(CompileError::unresolved(span, format!("Unknown identifier: {}", name))),
        }
    }
}
