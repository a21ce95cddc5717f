// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Error code registry.
//!
//! Maps error codes (E0102, E0308, etc.) to titles and categories, and each
//! analyzer error kind to its code.

use std::collections::HashMap;

use tarn_analyze::ErrorKind;

/// Registry of all known error codes.
pub struct ErrorCodeRegistry {
    codes: HashMap<&'static str, ErrorCodeInfo>,
}

/// Information about a single error code.
pub struct ErrorCodeInfo {
    pub code: &'static str,
    pub title: &'static str,
    pub category: ErrorCategory,
}

/// Error category for grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Syntax,
    Resolution,
    Type,
    Interop,
    Module,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Syntax => write!(f, "Syntax"),
            ErrorCategory::Resolution => write!(f, "Resolution"),
            ErrorCategory::Type => write!(f, "Type"),
            ErrorCategory::Interop => write!(f, "Interop"),
            ErrorCategory::Module => write!(f, "Module"),
        }
    }
}

macro_rules! register_codes {
    ($($code:literal => ($title:literal, $cat:expr)),* $(,)?) => {{
        let mut map = HashMap::new();
        $(
            map.insert($code, ErrorCodeInfo {
                code: $code,
                title: $title,
                category: $cat,
            });
        )*
        map
    }};
}

impl Default for ErrorCodeRegistry {
    fn default() -> Self {
        use ErrorCategory::*;

        Self {
            codes: register_codes! {
                // Shape errors (E01xx)
                "E0102" => ("malformed construct", Syntax),

                // Scope errors (E02xx)
                "E0200" => ("undefined symbol", Resolution),
                "E0201" => ("duplicate definition", Resolution),
                "E0210" => ("unused binding", Resolution),

                // Type errors (E03xx)
                "E0308" => ("mismatched types", Type),
                "E0320" => ("impossible cast", Type),

                // Host errors (E04xx)
                "E0400" => ("no such class member", Interop),

                // Module errors (E05xx)
                "E0500" => ("module type is not fully defined", Module),
            },
        }
    }
}

impl ErrorCodeRegistry {
    pub fn get(&self, code: &str) -> Option<&ErrorCodeInfo> {
        self.codes.get(code)
    }

    pub fn all(&self) -> impl Iterator<Item = &ErrorCodeInfo> {
        self.codes.values()
    }
}

/// Code reported for an analyzer error kind.
pub fn code_for(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::MalformedConstruct => "E0102",
        ErrorKind::UnresolvedName => "E0200",
        ErrorKind::DuplicateDefinition => "E0201",
        ErrorKind::UnusedBinding => "E0210",
        ErrorKind::TypeMismatch => "E0308",
        ErrorKind::ImpossibleCast => "E0320",
        ErrorKind::UnresolvedMember => "E0400",
        ErrorKind::IncompleteModuleType => "E0500",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KINDS: [ErrorKind; 8] = [
        ErrorKind::MalformedConstruct,
        ErrorKind::DuplicateDefinition,
        ErrorKind::TypeMismatch,
        ErrorKind::UnusedBinding,
        ErrorKind::ImpossibleCast,
        ErrorKind::IncompleteModuleType,
        ErrorKind::UnresolvedName,
        ErrorKind::UnresolvedMember,
    ];

    #[test]
    fn every_kind_has_a_registered_code() {
        let registry = ErrorCodeRegistry::default();
        for kind in KINDS {
            let code = code_for(kind);
            assert!(registry.get(code).is_some(), "{:?} maps to unknown {}", kind, code);
        }
        assert_eq!(registry.all().count(), KINDS.len());
    }

    #[test]
    fn categories() {
        let registry = ErrorCodeRegistry::default();
        let info = registry.get(code_for(ErrorKind::ImpossibleCast)).unwrap();
        assert_eq!(info.category, ErrorCategory::Type);
        assert_eq!(info.category.to_string(), "Type");
    }
}
