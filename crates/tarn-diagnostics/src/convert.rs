// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Conversion from analyzer errors to `Diagnostic`.

use std::error::Error as _;

use tarn_analyze::{CompileError, ErrorKind};

use crate::codes::code_for;
use crate::{Diagnostic, ToDiagnostic};

impl ToDiagnostic for CompileError {
    fn to_diagnostic(&self) -> Diagnostic {
        convert(self)
    }
}

fn convert(err: &CompileError) -> Diagnostic {
    // Continuation lines of a message hold the underlying mismatch.
    let mut lines = err.message.lines();
    let headline = lines.next().unwrap_or_default();
    let mut diag = Diagnostic::error(headline).with_code(code_for(err.kind));
    diag.kind = Some(err.kind);
    if let Some(name) = &err.source_name {
        diag = diag.with_source_name(name.as_str());
    }
    let span = err.span();
    if !span.is_dummy() {
        diag = diag.with_primary(span, label_for(err.kind));
    }
    for line in lines.map(str::trim).filter(|l| !l.is_empty()) {
        diag = diag.with_note(line);
    }

    let mut cause = err.source();
    while let Some(c) = cause {
        let text = c.to_string();
        if !err.message.contains(&text) {
            diag = diag.with_note(format!("caused by: {}", text));
        }
        cause = c.source();
    }

    match err.kind {
        ErrorKind::UnusedBinding => {
            diag = diag.with_help("use the binding or remove it");
        }
        ErrorKind::IncompleteModuleType => {
            diag = diag.with_help("add a type annotation to the fields whose type is still open");
        }
        _ => {}
    }
    diag
}

fn label_for(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::MalformedConstruct => "not valid here",
        ErrorKind::DuplicateDefinition => "defined again here",
        ErrorKind::TypeMismatch => "type mismatch",
        ErrorKind::UnusedBinding => "never used",
        ErrorKind::ImpossibleCast => "cast cannot succeed",
        ErrorKind::IncompleteModuleType => "module defined here",
        ErrorKind::UnresolvedName => "not found in this scope",
        ErrorKind::UnresolvedMember => "no such member",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tarn_ast::Span;
    use tarn_types::{MismatchReason, TypeError};

    #[test]
    fn code_label_and_source() {
        let err = CompileError::mismatch(Span::new(2, 5), "Cannot apply string to number -> number")
            .in_source("main.tarn");
        let diag = err.to_diagnostic();
        assert_eq!(diag.code.as_ref().map(|c| c.0.as_str()), Some("E0308"));
        assert_eq!(diag.kind, Some(ErrorKind::TypeMismatch));
        assert_eq!(diag.source_name.as_deref(), Some("main.tarn"));
        assert_eq!(diag.primary_span(), Some(Span::new(2, 5)));
    }

    #[test]
    fn continuation_lines_become_notes() {
        let cause = TypeError::new("number".into(), "string".into(), MismatchReason::Shape);
        let err = CompileError::mismatch(Span::new(1, 1), "Cannot apply string to number -> number\n    number is not string")
            .caused_by(cause);
        let diag = err.to_diagnostic();
        assert_eq!(diag.message, "Cannot apply string to number -> number");
        assert_eq!(diag.notes, ["number is not string"]);
    }

    #[test]
    fn cause_not_in_message_is_noted() {
        let cause = TypeError::new("number".into(), "string".into(), MismatchReason::Shape);
        let err = CompileError::mismatch(Span::new(1, 1), "This if branch has a string type").caused_by(cause);
        let diag = err.to_diagnostic();
        assert_eq!(diag.notes, ["caused by: number is not string"]);
    }

    #[test]
    fn help_depends_on_the_kind() {
        let err = CompileError::unresolved(Span::new(1, 1), "Unknown identifier: negat");
        assert!(err.to_diagnostic().help.is_none());

        let err = CompileError::new(ErrorKind::IncompleteModuleType, Span::new(1, 1), "Module type is not fully defined");
        assert_eq!(
            err.to_diagnostic().help.as_deref(),
            Some("add a type annotation to the fields whose type is still open")
        );
    }

    #[test]
    fn unknown_location_has_no_label() {
        let err = CompileError::unresolved(Span::DUMMY, "Unknown module: std");
        let diag = err.to_diagnostic();
        assert!(diag.labels.is_empty());
        assert!(diag.help.is_none());
    }
}
