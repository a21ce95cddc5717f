// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Semantic analysis for the tarn language.
//!
//! Turns a parsed AST into typed IR: scope resolution, type inference with
//! open/closed structs and variants, let-polymorphism, closure capture
//! tracking and host interop resolution.

mod error;
mod code;
mod scope;
mod interop;
mod type_expr;
mod prelude;
mod analyzer;
mod driver;

pub use error::{CompileError, ErrorKind};
pub use code::{
    Binding, BindingId, BindingKind, CaseChoice, CatchClause, Closure, ClosureId, ClosureKind,
    Code, CodeKind, CondBranch, Statement, StructField, TryCatch,
};
pub use scope::{Item, Lookup, SchemeOrigin, Scope};
pub use interop::{ClassDef, ClassTable, HostField, HostMethod, HostResolver, ResolveError, CLASS_OBJECT};
pub use prelude::{is_builtin, root_scope, BUILTINS};
pub use driver::{
    compile, CompileContext, CompileOptions, CompileRequest, CompiledUnit, ModuleLoader,
    ModuleRegistry, ParsedUnit, SourceParser, STD_MODULE,
};
