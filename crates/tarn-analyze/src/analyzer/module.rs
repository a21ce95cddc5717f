// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! `load`: module references and exploding module fields into scope.

use tarn_ast::{Span, TypeExpr, TypeExprKind};
use tarn_types::TypeId;

use super::Analyzer;
use crate::code::{Code, CodeKind};
use crate::error::CompileError;
use crate::prelude;
use crate::scope::{SchemeOrigin, Scope};

impl Analyzer<'_> {
    /// Look a module up by name. Returns the module value and its signature.
    pub(crate) fn load_module(
        &mut self,
        name: &str,
        span: Span,
        depth: u32,
    ) -> Result<(Code, TypeExpr), CompileError> {
        let signature = self
            .modules
            .module_type(name)?
            .ok_or_else(|| CompileError::unresolved(span, format!("Unknown module: {}", name)))?;
        let ty = self.elaborate(&signature, &Scope::empty(), depth)?;
        tracing::debug!(module = %name, "loaded module");
        let code = Code::new(CodeKind::LoadModule(name.to_string()), ty, span).polymorphic(true);
        Ok((code, signature))
    }

    /// Bind every field of a struct-typed module as a scheme entry. With
    /// `protect_builtins`, fields named like a builtin are skipped.
    pub(crate) fn explode(
        &mut self,
        module: &str,
        signature: &TypeExpr,
        ty: TypeId,
        scope: &Scope,
        span: Span,
        protect_builtins: bool,
    ) -> Result<Scope, CompileError> {
        match &signature.kind {
            TypeExprKind::Struct(fields) => {
                let mut scope = scope.clone();
                for field in fields {
                    if protect_builtins && prelude::is_builtin(&field.name) {
                        tracing::trace!(module = %module, field = %field.name, "builtin kept");
                        continue;
                    }
                    let origin = SchemeOrigin::ModuleField {
                        module: module.to_string(),
                        mutable: field.mutable,
                    };
                    scope = scope.bind_scheme(&field.name, field.ty.clone(), origin);
                }
                Ok(scope)
            }
            TypeExprKind::Named { name, .. } if name == "()" => Ok(scope.clone()),
            _ => Err(CompileError::malformed(
                span,
                format!(
                    "Expected module with struct or unit type here ({} has type {}, but only structs can be exploded)",
                    module,
                    self.describe(ty)
                ),
            )),
        }
    }
}
