// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Type graph for the tarn language.
//!
//! Types live in a [`TypeStore`] arena and are addressed by [`TypeId`].
//! Unification aliases nodes through links, so every read goes through
//! `deref`/`resolve`. Structs and variants carry a [`Row`] that is either
//! open (more members may appear) or closed (the member set is final).

mod types;
mod store;
mod unify;
mod errors;
mod display;
mod generalize;
mod export;

pub use types::{FieldTag, Fields, Member, Row, TypeId, TypeNode};
pub use store::TypeStore;
pub use errors::{MismatchReason, TypeError};
pub use display::TypeDisplay;
pub use generalize::FreeVars;
