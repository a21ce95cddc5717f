// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Root scope: operators and core functions every unit sees.

use tarn_ast::{parse_signature, Span};

use crate::error::CompileError;
use crate::scope::{SchemeOrigin, Scope};

/// Builtins and their signatures. Names here are protected: exploding the
/// `std` module never shadows them.
pub const BUILTINS: &[(&str, &str)] = &[
    ("+", "number -> number -> number"),
    ("-", "number -> number -> number"),
    ("*", "number -> number -> number"),
    ("/", "number -> number -> number"),
    ("%", "number -> number -> number"),
    ("negate", "number -> number"),
    ("==", "'a -> 'a -> boolean"),
    ("!=", "'a -> 'a -> boolean"),
    ("<", "'a -> 'a -> boolean"),
    (">", "'a -> 'a -> boolean"),
    ("<=", "'a -> 'a -> boolean"),
    (">=", "'a -> 'a -> boolean"),
    ("and", "boolean -> boolean -> boolean"),
    ("or", "boolean -> boolean -> boolean"),
    ("not", "boolean -> boolean"),
    ("true", "boolean"),
    ("false", "boolean"),
    ("^", "string -> string -> string"),
    ("::", "'a -> list?<'a> -> list<'a>"),
    (".", "('b -> 'c) -> ('a -> 'b) -> 'a -> 'c"),
    ("|>", "'a -> ('a -> 'b) -> 'b"),
    ("in", "'k -> map<'k, 'v> -> boolean"),
    ("id", "'a -> 'a"),
    ("head", "list?<'a> -> 'a"),
    ("tail", "list?<'a> -> list<'a>"),
    ("empty?", "list?<'a> -> boolean"),
    ("array", "list?<'a> -> array<'a>"),
    ("string", "'a -> string"),
    ("print", "'a -> ()"),
    ("println", "'a -> ()"),
    ("undef_str", "string"),
];

pub fn is_builtin(name: &str) -> bool {
    BUILTINS.iter().any(|(n, _)| *n == name)
}

/// The root of every scope chain.
pub fn root_scope() -> Result<Scope, CompileError> {
    let mut scope = Scope::empty();
    for (name, sig) in BUILTINS {
        let signature = parse_signature(sig).map_err(|e| {
            CompileError::malformed(Span::DUMMY, format!("Bad builtin signature for {}", name))
                .caused_by(e)
        })?;
        scope = scope.bind_scheme(name, signature, SchemeOrigin::Builtin);
    }
    Ok(scope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::Item;

    #[test]
    fn every_builtin_signature_parses() {
        let scope = root_scope().unwrap();
        for (name, _) in BUILTINS {
            assert!(
                matches!(scope.lookup(name).map(|l| l.item), Some(Item::Scheme { .. })),
                "{} missing from root scope",
                name
            );
        }
    }

    #[test]
    fn protected_names() {
        assert!(is_builtin("not"));
        assert!(!is_builtin("map"));
    }
}
