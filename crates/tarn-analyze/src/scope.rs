// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Lexical scope chain.
//!
//! Scopes are immutable cons-lists: entering a construct pushes a frame in
//! front of the outer scope and the frame is dropped when the construct's
//! analysis returns. A frame may mark a closure boundary; references that
//! cross a boundary are captures of that closure.

use std::rc::Rc;

use tarn_ast::TypeExpr;
use tarn_types::TypeId;

use crate::code::{BindingId, ClosureId};

/// Where a scheme entry comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemeOrigin {
    Builtin,
    ModuleField { module: String, mutable: bool },
}

#[derive(Debug, Clone)]
pub enum Item {
    /// Pure closure boundary, binds no name.
    Nothing,
    /// A local binding. `free` lists the variables to instantiate afresh at
    /// each reference; empty for monomorphic bindings.
    Local { binding: BindingId, free: Rc<[TypeId]> },
    /// A value known by its signature, elaborated afresh at every reference.
    Scheme { signature: Rc<TypeExpr>, origin: SchemeOrigin },
    /// Imported host class; not a value.
    Class(String),
}

#[derive(Debug)]
struct Frame {
    name: Option<String>,
    item: Item,
    closure: Option<ClosureId>,
    outer: Scope,
}

#[derive(Debug, Clone, Default)]
pub struct Scope(Option<Rc<Frame>>);

/// A successful lookup.
#[derive(Debug, Clone)]
pub struct Lookup {
    pub item: Item,
    /// Closure boundaries walked across before the entry was found,
    /// innermost first.
    pub crossed: Vec<ClosureId>,
}

impl Scope {
    pub fn empty() -> Self {
        Scope(None)
    }

    fn push(&self, name: Option<String>, item: Item, closure: Option<ClosureId>) -> Scope {
        Scope(Some(Rc::new(Frame { name, item, closure, outer: self.clone() })))
    }

    pub fn bind(&self, name: &str, binding: BindingId) -> Scope {
        self.bind_poly(name, binding, Vec::new())
    }

    /// Bind a generalized value; `free` are its generalizable variables.
    pub fn bind_poly(&self, name: &str, binding: BindingId, free: Vec<TypeId>) -> Scope {
        self.push(
            Some(name.to_string()),
            Item::Local { binding, free: free.into() },
            None,
        )
    }

    pub fn bind_scheme(&self, name: &str, signature: TypeExpr, origin: SchemeOrigin) -> Scope {
        self.push(
            Some(name.to_string()),
            Item::Scheme { signature: Rc::new(signature), origin },
            None,
        )
    }

    pub fn import_class(&self, name: &str, class: &str) -> Scope {
        self.push(Some(name.to_string()), Item::Class(class.to_string()), None)
    }

    /// Bind a closure's argument on the frame that opens the closure.
    pub fn enter_closure(&self, closure: ClosureId, arg: Option<(&str, BindingId)>) -> Scope {
        match arg {
            Some((name, binding)) => self.push(
                Some(name.to_string()),
                Item::Local { binding, free: Vec::new().into() },
                Some(closure),
            ),
            None => self.push(None, Item::Nothing, Some(closure)),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Lookup> {
        let mut crossed = Vec::new();
        let mut cur = self;
        while let Some(frame) = &cur.0 {
            if frame.name.as_deref() == Some(name) {
                return Some(Lookup { item: frame.item.clone(), crossed });
            }
            if let Some(closure) = frame.closure {
                crossed.push(closure);
            }
            cur = &frame.outer;
        }
        None
    }

    /// Imported class registered under `name`, if any.
    pub fn class(&self, name: &str) -> Option<String> {
        match self.lookup(name)?.item {
            Item::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn nearest_closure(&self) -> Option<ClosureId> {
        self.frames().find_map(|frame| frame.closure)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.frames().any(|frame| frame.name.as_deref() == Some(name))
    }

    fn frames(&self) -> impl Iterator<Item = &Frame> {
        let mut cur = self.0.as_deref();
        std::iter::from_fn(move || {
            let frame = cur?;
            cur = frame.outer.0.as_deref();
            Some(frame)
        })
    }
}
