// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! tarn compiler diagnostics.
//!
//! A compile error is converted into a `Diagnostic` through the
//! `ToDiagnostic` trait, then rendered for a terminal or serialized as JSON.
//! The analyzer stays free of presentation concerns.

pub mod codes;
pub mod convert;
pub mod formatter;
pub mod json;

use serde::Serialize;
use tarn_analyze::ErrorKind;
use tarn_ast::Span;

pub use formatter::{render, DiagnosticFormatter};
pub use json::{to_json_report, to_json_string, DiagnosticReport};

// ============================================================================
// Core Types
// ============================================================================

/// A compiler diagnostic with context for display.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Option<ErrorCode>,
    /// Analyzer classification the code was derived from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
    pub message: String,
    /// Source that produced the diagnostic, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

/// A labeled source position within a diagnostic.
#[derive(Debug, Clone, Serialize)]
pub struct Label {
    pub span: Span,
    pub style: LabelStyle,
    pub message: Option<String>,
}

/// How a label should be displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelStyle {
    /// Primary error location (red carets).
    Primary,
    /// Related location (blue dashes).
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Note,
}

/// An error code like E0308.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorCode(pub String);

// ============================================================================
// Builder API
// ============================================================================

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code: None,
            kind: None,
            message: message.into(),
            source_name: None,
            labels: Vec::new(),
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(ErrorCode(code.into()));
        self
    }

    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    pub fn with_label(mut self, span: Span, style: LabelStyle, msg: impl Into<String>) -> Self {
        self.labels.push(Label {
            span,
            style,
            message: Some(msg.into()),
        });
        self
    }

    pub fn with_primary(self, span: Span, msg: impl Into<String>) -> Self {
        self.with_label(span, LabelStyle::Primary, msg)
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Returns the primary span (first primary label, or first label).
    pub fn primary_span(&self) -> Option<Span> {
        self.labels
            .iter()
            .find(|l| l.style == LabelStyle::Primary)
            .or(self.labels.first())
            .map(|l| l.span)
    }
}

// ============================================================================
// Conversion Trait
// ============================================================================

/// Convert a compiler error into a diagnostic.
pub trait ToDiagnostic {
    fn to_diagnostic(&self) -> Diagnostic;
}
