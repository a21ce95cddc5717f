// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Typed intermediate representation produced by the analyzer.
//!
//! Bindings and closures live in arenas owned by the compiled unit and are
//! referenced by index, so closure slots can be created before their bodies
//! exist (recursive bindings, struct methods, curried lambdas).

use tarn_ast::{Number, Span};
use tarn_types::TypeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClosureId(pub u32);

impl BindingId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl ClosureId {
    /// The root closure of every compiled unit.
    pub const ROOT: ClosureId = ClosureId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What introduced a binding.
#[derive(Debug, Clone, PartialEq)]
pub enum BindingKind {
    /// Sequence binding `name = value`.
    Let,
    /// Argument of a function closure.
    Argument(ClosureId),
    /// Field of a struct literal, visible to sibling methods.
    StructField { index: usize },
    /// Payload of a case arm.
    CasePayload,
    /// Exception captured by a catch clause.
    Caught,
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub name: String,
    pub ty: TypeId,
    pub kind: BindingKind,
    /// Declared with `var`.
    pub mutable: bool,
    /// References may be instantiated with fresh type variables.
    pub polymorph: bool,
    /// Referenced after its definition finished.
    pub used: bool,
    /// Referenced from inside its own definition (recursion).
    pub self_used: bool,
    /// Set while the bound value is being analyzed.
    pub(crate) defining: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosureKind {
    Root,
    Function,
    Try,
}

/// A closure slot. Function bodies are filled in after the slot is linked
/// into the scope chain.
#[derive(Debug, Clone)]
pub struct Closure {
    pub kind: ClosureKind,
    pub parent: Option<ClosureId>,
    pub ty: TypeId,
    pub arg: Option<BindingId>,
    pub body: Option<Box<Code>>,
    /// Bindings of enclosing closures referenced from inside this one.
    pub captures: Vec<BindingId>,
    /// Mutable bindings declared directly in this closure.
    pub vars: Vec<BindingId>,
    /// Binding the closure is recursively known by.
    pub self_binding: Option<BindingId>,
    pub bind_name: Option<String>,
}

/// A typed IR node.
#[derive(Debug, Clone)]
pub struct Code {
    pub kind: CodeKind,
    pub ty: TypeId,
    /// The value may be re-instantiated with fresh variables at every use.
    pub polymorph: bool,
    /// Outermost expression of a function body.
    pub tail: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum CodeKind {
    Number(Number),
    Str(String),
    Unit,
    /// Reference to a local binding.
    Var(BindingId),
    /// Reference to a prelude builtin.
    Builtin(String),
    /// Reference to a field of a loaded or preloaded module.
    ModuleField { module: String, field: String, mutable: bool },
    VariantConstructor(String),
    Apply { fun: Box<Code>, arg: Box<Code> },
    /// `(op arg)`: `op` applied to `arg` as its second argument.
    ApplySecond { fun: Box<Code>, arg: Box<Code> },
    /// `(.a.b)` selector function.
    SelectorFunction(Vec<String>),
    Closure(ClosureId),
    Struct(Vec<StructField>),
    List(Vec<Code>),
    Map { keys: Vec<Code>, values: Vec<Code> },
    Range { from: Box<Code>, to: Box<Code> },
    Cond(Vec<CondBranch>),
    Case { value: Box<Code>, choices: Vec<CaseChoice> },
    Seq { statements: Vec<Statement>, result: Box<Code> },
    Try(TryCatch),
    Select { src: Box<Code>, field: String },
    KeyRef { src: Box<Code>, key: Box<Code> },
    Assign { target: Box<Code>, value: Box<Code> },
    /// `checked` casts are verified at runtime.
    Cast { value: Box<Code>, checked: bool },
    Throw(Box<Code>),
    Loop { cond: Box<Code>, body: Box<Code> },
    Concat(Vec<Code>),
    LoadModule(String),
    New { class: String, args: Vec<Code> },
    /// Host field; `target` is `None` for static fields.
    HostField { target: Option<Box<Code>>, class: String, name: String, mutable: bool },
    HostCall { target: Option<Box<Code>>, class: String, method: String, args: Vec<Code> },
    ClassOf(String),
}

#[derive(Debug, Clone)]
pub struct StructField {
    pub name: String,
    pub value: Code,
    pub mutable: bool,
    /// Binding sibling methods see the field through.
    pub binding: Option<BindingId>,
}

#[derive(Debug, Clone)]
pub struct CondBranch {
    pub value: Code,
    /// `None` for the final `else` branch.
    pub guard: Option<Code>,
}

#[derive(Debug, Clone)]
pub struct CaseChoice {
    pub tag: String,
    pub payload: Option<BindingId>,
    pub body: Code,
}

#[derive(Debug, Clone)]
pub enum Statement {
    Bind { binding: BindingId, value: Code },
    /// Unit-typed expression evaluated for effect.
    Eval(Code),
    /// Module whose fields were exploded into scope.
    Load(Code),
}

#[derive(Debug, Clone)]
pub struct TryCatch {
    pub closure: ClosureId,
    pub block: Box<Code>,
    pub catches: Vec<CatchClause>,
    pub cleanup: Option<Box<Code>>,
}

#[derive(Debug, Clone)]
pub struct CatchClause {
    pub class: String,
    pub binding: Option<BindingId>,
    pub handler: Code,
}

impl Code {
    pub fn new(kind: CodeKind, ty: TypeId, span: Span) -> Self {
        Self { kind, ty, polymorph: false, tail: false, span }
    }

    pub fn polymorphic(mut self, polymorph: bool) -> Self {
        self.polymorph = polymorph;
        self
    }

    /// Mark the outermost expression of a function body. Sequences and
    /// branches pass the mark on to their result positions.
    pub fn mark_tail(&mut self) {
        match &mut self.kind {
            CodeKind::Seq { result, .. } => result.mark_tail(),
            CodeKind::Cond(branches) => {
                for branch in branches {
                    branch.value.mark_tail();
                }
            }
            CodeKind::Case { choices, .. } => {
                for choice in choices {
                    choice.body.mark_tail();
                }
            }
            _ => self.tail = true,
        }
    }

    pub fn is_unit_literal(&self) -> bool {
        matches!(self.kind, CodeKind::Unit)
    }
}
