// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Abstract Syntax Tree types for the tarn language.
//!
//! This crate defines the parser's output contract: expression nodes, written
//! type syntax and source positions, shared by the parser, the semantic
//! analyzer and the diagnostics renderer.

pub mod span;
pub mod node;
pub mod type_expr;
pub mod signature;
pub mod build;

pub use span::{Span, LineMap};
pub use node::{
    is_tag_name, Bind, BinOp, Case, CastKind, Catch, CondChoice, Lambda, Node, NodeKind,
    Number, Op, RSection, SectionOp, Try,
};
pub use type_expr::{TypeExpr, TypeExprKind, TypeField};
pub use signature::{parse_signature, SignatureError};
