// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Compilation driver: parse, preload, analyze, check completeness.

use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};
use tarn_ast::{parse_signature, Node, SignatureError, Span, TypeExpr};
use tarn_types::{TypeId, TypeStore};

use crate::analyzer::Analyzer;
use crate::code::{Binding, BindingId, Closure, ClosureId, Code};
use crate::error::{CompileError, ErrorKind};
use crate::interop::HostResolver;
use crate::prelude;

/// The preloaded module whose fields never shadow builtins.
pub const STD_MODULE: &str = "std";

/// Signature of the bundled `std` module.
const STD_SIGNATURE: &str = "{\
    map is ('a -> 'b) -> list?<'a> -> list<'b>, \
    filter is ('a -> boolean) -> list?<'a> -> list<'a>, \
    fold is ('b -> 'a -> 'b) -> 'b -> list?<'a> -> 'b, \
    length is list?<'a> -> number, \
    reverse is list?<'a> -> list<'a>, \
    concat is list?<list?<'a>> -> list<'a>, \
    keys is hash<'k, 'v> -> list<'k>, \
    strLength is string -> number, \
    min is number -> number -> number, \
    max is number -> number -> number, \
    abs is number -> number, \
    not is boolean -> boolean\
}";

/// Compilation flags.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CompileOptions {
    /// Treat the unit as a module even without a module header.
    pub compile_module: bool,
    /// Log the parse tree at debug level.
    pub print_parse_tree: bool,
    /// Modules exploded into the root scope, in order.
    pub preload: Vec<String>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            compile_module: false,
            print_parse_tree: false,
            preload: vec![STD_MODULE.to_string()],
        }
    }
}

impl CompileOptions {
    pub fn module(mut self) -> Self {
        self.compile_module = true;
        self
    }

    pub fn print_parse_tree(mut self) -> Self {
        self.print_parse_tree = true;
        self
    }

    pub fn with_preload<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preload = modules.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone)]
pub struct CompileRequest {
    /// Name errors are attributed to (usually a file path).
    pub source_name: String,
    /// Name of the produced unit; a module header overrides it.
    pub unit_name: String,
    pub source: String,
    pub options: CompileOptions,
}

impl CompileRequest {
    pub fn new(source_name: impl Into<String>, unit_name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            unit_name: unit_name.into(),
            source: source.into(),
            options: CompileOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }
}

/// Parser output for one source.
#[derive(Debug, Clone)]
pub struct ParsedUnit {
    pub root: Node,
    /// Name from a `module` header.
    pub module_name: Option<String>,
    pub is_module: bool,
}

pub trait SourceParser {
    fn parse(&self, source_name: &str, source: &str, options: &CompileOptions) -> Result<ParsedUnit, CompileError>;
}

/// Supplies module signatures to `load` and the preload list.
pub trait ModuleLoader {
    fn module_type(&mut self, name: &str) -> Result<Option<TypeExpr>, CompileError>;
}

/// Known module signatures by name.
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    signatures: IndexMap<String, TypeExpr>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the bundled `std` module.
    pub fn standard() -> Result<Self, SignatureError> {
        let mut registry = Self::new();
        registry.register_signature(STD_MODULE, STD_SIGNATURE)?;
        Ok(registry)
    }

    pub fn register(&mut self, name: impl Into<String>, signature: TypeExpr) {
        self.signatures.insert(name.into(), signature);
    }

    pub fn register_signature(&mut self, name: &str, signature: &str) -> Result<(), SignatureError> {
        self.register(name, parse_signature(signature)?);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&TypeExpr> {
        self.signatures.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.signatures.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.signatures.keys().map(String::as_str)
    }
}

impl ModuleLoader for ModuleRegistry {
    fn module_type(&mut self, name: &str) -> Result<Option<TypeExpr>, CompileError> {
        Ok(self.get(name).cloned())
    }
}

/// A module known only by its source, compiled on first load.
#[derive(Debug, Clone)]
struct PendingModule {
    source_name: String,
    source: String,
}

/// State shared by the compilations of one host session.
pub struct CompileContext {
    parser: Rc<dyn SourceParser>,
    resolver: Rc<dyn HostResolver>,
    modules: ModuleRegistry,
    pending: IndexMap<String, PendingModule>,
    /// Names of units produced so far.
    units: IndexSet<String>,
    /// Source being compiled, for diagnostics rendering.
    current_source: Option<Rc<str>>,
}

impl CompileContext {
    pub fn new(parser: Rc<dyn SourceParser>, resolver: Rc<dyn HostResolver>) -> Self {
        Self {
            parser,
            resolver,
            modules: ModuleRegistry::new(),
            pending: IndexMap::new(),
            units: IndexSet::new(),
            current_source: None,
        }
    }

    pub fn with_modules(mut self, modules: ModuleRegistry) -> Self {
        self.modules = modules;
        self
    }

    /// Make a module loadable by compiling `source` when it is first needed.
    pub fn add_module_source(&mut self, name: &str, source_name: &str, source: &str) {
        self.pending.insert(
            name.to_string(),
            PendingModule { source_name: source_name.to_string(), source: source.to_string() },
        );
    }

    pub fn modules(&self) -> &ModuleRegistry {
        &self.modules
    }

    pub fn has_unit(&self, name: &str) -> bool {
        self.units.contains(name)
    }

    pub fn units(&self) -> impl Iterator<Item = &str> {
        self.units.iter().map(String::as_str)
    }

    pub fn current_source(&self) -> Option<&str> {
        self.current_source.as_deref()
    }
}

impl ModuleLoader for CompileContext {
    fn module_type(&mut self, name: &str) -> Result<Option<TypeExpr>, CompileError> {
        if let Some(signature) = self.modules.get(name) {
            return Ok(Some(signature.clone()));
        }
        let Some(pending) = self.pending.shift_remove(name) else {
            return Ok(None);
        };
        tracing::debug!(module = %name, source = %pending.source_name, "compiling module on demand");
        let request = CompileRequest::new(pending.source_name, name, pending.source)
            .with_options(CompileOptions::default().module());
        let unit = compile(self, request)?;
        Ok(Some(unit.signature()))
    }
}

/// Installs a source as the current one and restores the previous source
/// when dropped, on success and on error alike.
struct SourceGuard<'a> {
    ctx: &'a mut CompileContext,
    saved: Option<Rc<str>>,
}

impl<'a> SourceGuard<'a> {
    fn enter(ctx: &'a mut CompileContext, source: Rc<str>) -> Self {
        let saved = ctx.current_source.replace(source);
        Self { ctx, saved }
    }
}

impl Deref for SourceGuard<'_> {
    type Target = CompileContext;

    fn deref(&self) -> &CompileContext {
        self.ctx
    }
}

impl DerefMut for SourceGuard<'_> {
    fn deref_mut(&mut self) -> &mut CompileContext {
        self.ctx
    }
}

impl Drop for SourceGuard<'_> {
    fn drop(&mut self) {
        self.ctx.current_source = self.saved.take();
    }
}

/// Result of a successful compilation.
#[derive(Debug, Clone)]
pub struct CompiledUnit {
    pub root: Code,
    pub ty: TypeId,
    pub is_module: bool,
    pub module_name: Option<String>,
    pub unit_name: String,
    pub preload: Vec<String>,
    pub store: TypeStore,
    pub bindings: Vec<Binding>,
    pub closures: Vec<Closure>,
}

impl CompiledUnit {
    /// Exported type of the unit, as registered for modules.
    pub fn signature(&self) -> TypeExpr {
        self.store.export(self.ty)
    }

    pub fn type_description(&self) -> String {
        self.store.describe(self.ty)
    }

    pub fn binding(&self, id: BindingId) -> &Binding {
        &self.bindings[id.index()]
    }

    pub fn closure(&self, id: ClosureId) -> &Closure {
        &self.closures[id.index()]
    }

    /// First binding with the given name, in creation order.
    pub fn find_binding(&self, name: &str) -> Option<&Binding> {
        self.bindings.iter().find(|b| b.name == name)
    }
}

/// Compile one unit. Errors are attributed to the request's source name
/// unless a nested compilation already attributed them.
pub fn compile(ctx: &mut CompileContext, request: CompileRequest) -> Result<CompiledUnit, CompileError> {
    let span = tracing::debug_span!("compile", source = %request.source_name, unit = %request.unit_name);
    let _entered = span.enter();
    let source_name = request.source_name.clone();
    let mut guard = SourceGuard::enter(ctx, Rc::from(request.source.as_str()));
    compile_unit(&mut guard, request).map_err(|e| e.in_source(&source_name))
}

fn compile_unit(ctx: &mut CompileContext, request: CompileRequest) -> Result<CompiledUnit, CompileError> {
    let CompileRequest { source_name, unit_name, source, options } = request;
    let parser = Rc::clone(&ctx.parser);
    let parsed = parser.parse(&source_name, &source, &options)?;
    if options.print_parse_tree {
        tracing::debug!(tree = %parsed.root, "parse tree");
    }
    let unit_name = parsed.module_name.clone().unwrap_or(unit_name);
    let is_module = parsed.is_module || options.compile_module;
    let preload: Vec<String> = options.preload.iter().filter(|m| **m != unit_name).cloned().collect();

    let resolver = Rc::clone(&ctx.resolver);
    let mut analyzer = Analyzer::new(resolver.as_ref(), ctx, package_of(&unit_name));
    let mut scope = prelude::root_scope()?;
    for module in &preload {
        let (code, signature) = analyzer.load_module(module, Span::DUMMY, 0)?;
        scope = analyzer.explode(module, &signature, code.ty, &scope, Span::DUMMY, module == STD_MODULE)?;
        tracing::debug!(module = %module, "preloaded");
    }
    let scope = scope.enter_closure(ClosureId::ROOT, None);
    let root = analyzer.analyze(&parsed.root, &scope, 0)?;

    if is_module {
        let vars = analyzer.store.free_vars(root.ty, None);
        let complete = vars.denied.is_empty() && (vars.free.is_empty() || root.polymorph);
        tracing::debug!(
            unit = %unit_name,
            free = vars.free.len(),
            denied = vars.denied.len(),
            complete,
            "module completeness"
        );
        if !complete {
            return Err(CompileError::new(
                ErrorKind::IncompleteModuleType,
                parsed.root.span,
                "Module type is not fully defined",
            ));
        }
    } else {
        let ty = root.ty;
        analyzer.unify_or(ty, TypeId::UNIT, parsed.root.span, |store, _| {
            format!("Program body must have a unit type, not {}", store.describe(ty))
        })?;
    }

    let (store, bindings, mut closures) = analyzer.into_parts();
    closures[ClosureId::ROOT.index()].ty = root.ty;
    let unit = CompiledUnit {
        ty: root.ty,
        root,
        is_module,
        module_name: parsed.module_name,
        unit_name: unit_name.clone(),
        preload,
        store,
        bindings,
        closures,
    };
    if is_module {
        ctx.modules.register(unit_name.clone(), unit.signature());
    }
    ctx.units.insert(unit_name);
    Ok(unit)
}

/// Package part of a unit name: `a.b.main` and `a/b/main` are in `a/b`.
fn package_of(unit_name: &str) -> String {
    let internal = unit_name.replace('.', "/");
    match internal.rfind('/') {
        Some(i) => internal[..i].to_string(),
        None => String::new(),
    }
}
