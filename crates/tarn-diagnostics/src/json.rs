// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! JSON diagnostic output for machine consumption.
//!
//! Produces structured JSON that editors and tools can parse. Each
//! diagnostic carries its code, category, exact position and the source
//! line it points into.

use serde::Serialize;

use tarn_ast::LineMap;

use crate::{codes::ErrorCodeRegistry, Diagnostic, LabelStyle, Severity};

/// A complete JSON diagnostic report for one compilation.
#[derive(Debug, Serialize)]
pub struct DiagnosticReport {
    /// Schema version for forward compatibility.
    pub version: u32,
    /// The file that was compiled.
    pub file: String,
    /// Whether compilation succeeded (no errors).
    pub success: bool,
    pub diagnostics: Vec<JsonDiagnostic>,
    pub error_count: usize,
    pub warning_count: usize,
}

/// A single diagnostic in JSON form, enriched with source context.
#[derive(Debug, Serialize)]
pub struct JsonDiagnostic {
    /// "error", "warning" or "note".
    pub severity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Error category (e.g. "Type", "Interop").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Analyzer error kind, e.g. "TypeMismatch".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub message: String,
    /// Source the diagnostic came from, when it differs from the report file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
    pub labels: Vec<JsonLabel>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

/// A source location with line/column (1-based).
#[derive(Debug, Serialize)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
    /// The source line text for context.
    pub source_line: String,
}

/// A labeled position in JSON form.
#[derive(Debug, Serialize)]
pub struct JsonLabel {
    /// "primary" or "secondary".
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub line: u32,
    pub column: u32,
}

/// Convert diagnostics to a structured JSON report.
pub fn to_json_report(diagnostics: &[Diagnostic], source: &str, file: &str) -> DiagnosticReport {
    let registry = ErrorCodeRegistry::default();
    let line_map = LineMap::new(source);
    let mut error_count = 0;
    let mut warning_count = 0;

    let json_diags: Vec<JsonDiagnostic> = diagnostics
        .iter()
        .map(|d| {
            match d.severity {
                Severity::Error => error_count += 1,
                Severity::Warning => warning_count += 1,
                Severity::Note => {}
            }
            to_json_diagnostic(d, source, file, &line_map, &registry)
        })
        .collect();

    DiagnosticReport {
        version: 1,
        file: file.to_string(),
        success: error_count == 0,
        diagnostics: json_diags,
        error_count,
        warning_count,
    }
}

fn to_json_diagnostic(
    diag: &Diagnostic,
    source: &str,
    file: &str,
    line_map: &LineMap,
    registry: &ErrorCodeRegistry,
) -> JsonDiagnostic {
    let severity = match diag.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Note => "note",
    };

    let code = diag.code.as_ref().map(|c| c.0.clone());
    let category = code
        .as_ref()
        .and_then(|c| registry.get(c))
        .map(|info| info.category.to_string());

    // Positions in another source have no line text here.
    let source = match diag.source_name.as_deref() {
        Some(name) if name != file => None,
        _ => Some(source),
    };

    let location = diag.primary_span().filter(|s| !s.is_dummy()).map(|span| SourceLocation {
        line: span.line,
        column: span.col,
        source_line: source
            .and_then(|src| line_map.line_text(src, span.line))
            .unwrap_or("")
            .to_string(),
    });

    let labels = diag
        .labels
        .iter()
        .map(|l| JsonLabel {
            role: match l.style {
                LabelStyle::Primary => "primary".to_string(),
                LabelStyle::Secondary => "secondary".to_string(),
            },
            message: l.message.clone(),
            line: l.span.line,
            column: l.span.col,
        })
        .collect();

    JsonDiagnostic {
        severity: severity.to_string(),
        code,
        category,
        kind: diag.kind.map(|k| format!("{:?}", k)),
        message: diag.message.clone(),
        source: diag.source_name.clone().filter(|name| name != file),
        location,
        labels,
        notes: diag.notes.clone(),
        help: diag.help.clone(),
    }
}

/// Serialize a diagnostic report to pretty JSON.
pub fn to_json_string(report: &DiagnosticReport) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ToDiagnostic;
    use tarn_analyze::CompileError;
    use tarn_ast::Span;

    #[test]
    fn report_for_a_type_error() {
        let source = "a = 1;\nprintln (a \"s\")";
        let err = CompileError::mismatch(Span::new(2, 10), "Cannot apply string to number").in_source("main.tarn");
        let report = to_json_report(&[err.to_diagnostic()], source, "main.tarn");
        assert!(!report.success);
        assert_eq!(report.error_count, 1);

        let diag = &report.diagnostics[0];
        assert_eq!(diag.code.as_deref(), Some("E0308"));
        assert_eq!(diag.category.as_deref(), Some("Type"));
        assert_eq!(diag.kind.as_deref(), Some("TypeMismatch"));
        assert!(diag.source.is_none());
        let location = diag.location.as_ref().unwrap();
        assert_eq!((location.line, location.column), (2, 10));
        assert_eq!(location.source_line, "println (a \"s\")");
        assert_eq!(diag.labels[0].role, "primary");
    }

    #[test]
    fn error_from_another_source() {
        let err = CompileError::unresolved(Span::new(1, 5), "Unknown identifier: nowhere").in_source("lib.tarn");
        let report = to_json_report(&[err.to_diagnostic()], "load lib", "main.tarn");
        let diag = &report.diagnostics[0];
        assert_eq!(diag.source.as_deref(), Some("lib.tarn"));
        assert_eq!(diag.location.as_ref().map(|l| l.source_line.as_str()), Some(""));
    }

    #[test]
    fn serialized_shape() {
        let report = to_json_report(&[], "", "main.tarn");
        let value: serde_json::Value = serde_json::from_str(&to_json_string(&report)).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["version"], 1);
        assert_eq!(value["diagnostics"].as_array().map(Vec::len), Some(0));
    }
}
