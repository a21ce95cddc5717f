// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Compile error type.

use std::error::Error as StdError;

use tarn_ast::Span;

/// Classification of compile errors, used for diagnostic codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorKind {
    /// Case patterns, selectors, struct members and other shape rules.
    MalformedConstruct,
    DuplicateDefinition,
    TypeMismatch,
    UnusedBinding,
    ImpossibleCast,
    IncompleteModuleType,
    UnresolvedName,
    UnresolvedMember,
}

/// The single error produced by analysis. The first error aborts the
/// compilation unit.
#[derive(Debug, thiserror::Error)]
#[error("{}", located(.source_name, .line, .col, .message))]
pub struct CompileError {
    pub kind: ErrorKind,
    /// Set by the driver when the error leaves a compilation unit.
    pub source_name: Option<String>,
    pub line: u32,
    pub col: u32,
    pub message: String,
    #[source]
    pub cause: Option<Box<dyn StdError + Send + Sync>>,
}

impl CompileError {
    pub fn new(kind: ErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            source_name: None,
            line: span.line,
            col: span.col,
            message: message.into(),
            cause: None,
        }
    }

    pub fn malformed(span: Span, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedConstruct, span, message)
    }

    pub fn mismatch(span: Span, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeMismatch, span, message)
    }

    pub fn unresolved(span: Span, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnresolvedName, span, message)
    }

    /// Chain an underlying error (usually a unification failure).
    pub fn caused_by(mut self, cause: impl StdError + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Attribute the error to a source unless it already is.
    pub fn in_source(mut self, source_name: &str) -> Self {
        if self.source_name.is_none() {
            self.source_name = Some(source_name.to_string());
        }
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn span(&self) -> Span {
        Span::new(self.line, self.col)
    }
}

fn located(source_name: &Option<String>, line: &u32, col: &u32, message: &str) -> String {
    let mut out = String::new();
    if let Some(name) = source_name {
        out.push_str(name);
        out.push(':');
    }
    if *line > 0 {
        out.push_str(&format!("{}:{}: ", line, col));
    } else if source_name.is_some() {
        out.push(' ');
    }
    out.push_str(message);
    out
}
