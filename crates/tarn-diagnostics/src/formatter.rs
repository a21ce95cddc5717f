// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Terminal formatter for diagnostics.
//!
//! Produces multi-line, color-coded error output:
//!
//! ```text
//! error[E0308]: Cannot apply string to number -> number
//!   --> main.tarn:3:9
//!    |
//!  3 | println (f "s")
//!    |         ^ type mismatch
//!    |
//!    = note: string is not number
//! ```

use colored::Colorize;

use tarn_ast::LineMap;

use crate::{Diagnostic, LabelStyle, Severity, ToDiagnostic};

/// Render any convertible error against its source text.
pub fn render(err: &impl ToDiagnostic, source: &str) -> String {
    let diagnostic = err.to_diagnostic();
    let formatter = DiagnosticFormatter::new(source);
    match diagnostic.source_name.as_deref() {
        Some(name) => formatter.with_file_name(name).format(&diagnostic),
        None => formatter.format(&diagnostic),
    }
}

/// Formats diagnostics for terminal output.
pub struct DiagnosticFormatter<'a> {
    source: &'a str,
    file_name: Option<&'a str>,
    line_map: LineMap,
}

impl<'a> DiagnosticFormatter<'a> {
    pub fn new(source: &'a str) -> Self {
        let line_map = LineMap::new(source);
        Self {
            source,
            file_name: None,
            line_map,
        }
    }

    pub fn with_file_name(mut self, name: &'a str) -> Self {
        self.file_name = Some(name);
        self
    }

    pub fn format(&self, diagnostic: &Diagnostic) -> String {
        let mut out = String::new();

        // Line 1: severity[code]: message
        self.format_header(&mut out, diagnostic);

        let mut labels: Vec<_> = diagnostic.labels.iter().filter(|l| !l.span.is_dummy()).collect();
        labels.sort_by_key(|l| (l.span.line, l.span.col));
        let file = self.file_name.or(diagnostic.source_name.as_deref());

        let Some(first) = labels.first() else {
            if let Some(file) = file {
                out.push_str(&format!("  {} {}\n", "-->".blue(), file));
            }
            self.format_footer(&mut out, diagnostic, 2);
            return out;
        };

        // Line 2: --> file:line:col
        out.push_str(&format!(
            "  {} {}:{}:{}\n",
            "-->".blue(),
            file.unwrap_or("<source>"),
            first.span.line,
            first.span.col
        ));

        let max_line = labels.iter().map(|l| l.span.line).max().unwrap_or(1);
        let gutter_width = max_line.to_string().len().max(2);
        out.push_str(&format!("{} {}\n", " ".repeat(gutter_width + 1), "|".blue()));

        let mut prev_line: Option<u32> = None;
        for label in &labels {
            let line = label.span.line;
            if let Some(prev) = prev_line {
                if line > prev + 1 {
                    out.push_str(&format!("{} {}\n", " ".repeat(gutter_width), "...".blue()));
                }
            }
            let text = self.line_map.line_text(self.source, line).unwrap_or("");
            if prev_line != Some(line) {
                out.push_str(&format!(
                    "{:>width$} {} {}\n",
                    line.to_string().blue().bold(),
                    "|".blue(),
                    text,
                    width = gutter_width + 1,
                ));
            }

            let col = label.span.col as usize;
            let width = token_width(text, col);
            let (marks, message) = match label.style {
                LabelStyle::Primary => (
                    "^".repeat(width).red().bold(),
                    label.message.as_deref().unwrap_or("").red().bold(),
                ),
                LabelStyle::Secondary => (
                    "-".repeat(width).blue(),
                    label.message.as_deref().unwrap_or("").blue(),
                ),
            };
            out.push_str(&format!(
                "{} {} {}{} {}\n",
                " ".repeat(gutter_width + 1),
                "|".blue(),
                " ".repeat(col.saturating_sub(1)),
                marks,
                message,
            ));
            prev_line = Some(line);
        }

        if !diagnostic.notes.is_empty() || diagnostic.help.is_some() {
            out.push_str(&format!("{} {}\n", " ".repeat(gutter_width + 1), "|".blue()));
        }
        self.format_footer(&mut out, diagnostic, gutter_width);
        out
    }

    fn format_header(&self, out: &mut String, diagnostic: &Diagnostic) {
        let severity_str = match diagnostic.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
            Severity::Note => "note".blue().bold(),
        };

        if let Some(ref code) = diagnostic.code {
            out.push_str(&format!(
                "{}[{}]: {}\n",
                severity_str,
                code.0.as_str().red().bold(),
                diagnostic.message.bold()
            ));
        } else {
            out.push_str(&format!("{}: {}\n", severity_str, diagnostic.message.bold()));
        }
    }

    fn format_footer(&self, out: &mut String, diagnostic: &Diagnostic, gutter_width: usize) {
        for note in &diagnostic.notes {
            out.push_str(&format!(
                "{} {} {}: {}\n",
                " ".repeat(gutter_width + 1),
                "=".cyan(),
                "note".cyan().bold(),
                note
            ));
        }
        if let Some(ref help) = diagnostic.help {
            out.push_str(&format!(
                "{} {} {}: {}\n",
                " ".repeat(gutter_width + 1),
                "=".cyan(),
                "help".cyan().bold(),
                help
            ));
        }
    }
}

/// Width of the token starting at a 1-based column: an identifier or
/// number run, otherwise a single character.
fn token_width(line: &str, col: usize) -> usize {
    let rest = line.chars().skip(col.saturating_sub(1));
    let word = rest
        .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '\'' || *c == '?')
        .count();
    word.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tarn_analyze::CompileError;
    use tarn_ast::Span;

    fn plain<R>(f: impl FnOnce() -> R) -> R {
        colored::control::set_override(false);
        f()
    }

    #[test]
    fn renders_source_line_and_caret() {
        let source = "x = 1;\nprintln (foo 2)";
        let err = CompileError::unresolved(Span::new(2, 10), "Unknown identifier: foo").in_source("main.tarn");
        let out = plain(|| render(&err, source));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "error[E0200]: Unknown identifier: foo");
        assert_eq!(lines[1], "  --> main.tarn:2:10");
        assert_eq!(lines[3], "  2 | println (foo 2)");
        assert_eq!(lines[4], "    |          ^^^ not found in this scope");
    }

    #[test]
    fn notes_and_help_follow_the_snippet() {
        let source = "a = 1;\n()";
        let err = CompileError::new(tarn_analyze::ErrorKind::UnusedBinding, Span::new(1, 1), "Unused binding: a");
        let out = plain(|| render(&err, source));
        assert!(out.contains("  1 | a = 1;"), "{}", out);
        assert!(out.contains("= help: use the binding or remove it"), "{}", out);
        assert!(out.contains("--> <source>:1:1"), "{}", out);
    }

    #[test]
    fn unknown_position_prints_only_the_file() {
        let err = CompileError::unresolved(Span::DUMMY, "Unknown module: std").in_source("main.tarn");
        let out = plain(|| render(&err, ""));
        assert_eq!(out, "error[E0200]: Unknown module: std\n  --> main.tarn\n");
    }

    #[test]
    fn token_widths() {
        assert_eq!(token_width("println (foo 2)", 10), 3);
        assert_eq!(token_width("empty? xs", 1), 6);
        assert_eq!(token_width("a := 1", 3), 1);
        assert_eq!(token_width("", 4), 1);
    }
}
