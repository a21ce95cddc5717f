// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Type signature string parser.
//!
//! Used to declare prelude bindings, host members and stored module
//! signatures in the same syntax programs use for type annotations:
//!
//! ```text
//! 'a -> list<'a> -> list<'a>
//! {var count is number, name is string}
//! Some 'a | None ()
//! ~java.lang.String[]
//! ```

use thiserror::Error;

use crate::type_expr::{TypeExpr, TypeExprKind, TypeField};
use crate::Span;

#[derive(Debug, Clone, Error)]
#[error("invalid type signature `{input}`: {reason}")]
pub struct SignatureError {
    pub input: String,
    pub reason: String,
}

impl SignatureError {
    fn new(input: &str, reason: impl Into<String>) -> Self {
        Self { input: input.to_string(), reason: reason.into() }
    }
}

/// Parse a signature string into written type syntax.
pub fn parse_signature(s: &str) -> Result<TypeExpr, SignatureError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(SignatureError::new(s, "empty type"));
    }

    // Arrows are right associative: split at the first one at depth 0.
    if let Some(pos) = find_arrow_at_depth_0(s) {
        let arg = parse_signature(&s[..pos])?;
        let ret = parse_signature(&s[pos + 2..])?;
        return Ok(TypeExpr::fun(arg, ret));
    }

    if contains_pipe_at_depth_0(s) {
        let mut arms = Vec::new();
        for part in split_at_depth_0(s, '|') {
            let arm = parse_signature(part)?;
            match arm.kind {
                TypeExprKind::Named { name, mut args }
                    if is_tag(&name) && args.len() == 1 =>
                {
                    arms.push(TypeField {
                        name,
                        ty: args.remove(0),
                        mutable: false,
                        span: Span::DUMMY,
                    });
                }
                _ => return Err(SignatureError::new(s, format!("`{}` is not a variant arm", part))),
            }
        }
        return Ok(TypeExpr::new(TypeExprKind::Variant(arms), Span::DUMMY));
    }

    if s == "()" {
        return Ok(TypeExpr::named("()"));
    }

    if s.starts_with('(') && closing_index(s, 0) == Some(s.len() - 1) {
        return parse_signature(&s[1..s.len() - 1]);
    }

    if s.starts_with('{') && closing_index(s, 0) == Some(s.len() - 1) {
        return parse_struct(s);
    }

    // Variant tag with payload: `Some number`, `Pair {a is number}`
    if is_tag(s) {
        if let Some(ws) = first_whitespace_at_depth_0(s) {
            let name = &s[..ws];
            let payload = parse_signature(&s[ws..])?;
            return Ok(TypeExpr::with_args(name, vec![payload]));
        }
    }

    if let Some(class) = s.strip_prefix('~') {
        let (name, args) = split_generic(class)?;
        return Ok(TypeExpr::new(
            TypeExprKind::Host { class: name.to_string(), args },
            Span::DUMMY,
        ));
    }

    let (name, args) = split_generic(s)?;
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(SignatureError::new(s, "expected a type name"));
    }
    Ok(TypeExpr::with_args(name, args))
}

fn is_tag(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_uppercase())
}

fn parse_struct(s: &str) -> Result<TypeExpr, SignatureError> {
    let inner = &s[1..s.len() - 1];
    let mut fields = Vec::new();
    for part in split_at_depth_0(inner, ',') {
        if part.is_empty() {
            continue;
        }
        let (mutable, rest) = match part.strip_prefix("var ") {
            Some(rest) => (true, rest.trim_start()),
            None => (false, part),
        };
        let Some(is_pos) = rest.find(" is ") else {
            return Err(SignatureError::new(s, format!("field `{}` has no type", part)));
        };
        fields.push(TypeField {
            name: rest[..is_pos].trim().to_string(),
            ty: parse_signature(&rest[is_pos + 4..])?,
            mutable,
            span: Span::DUMMY,
        });
    }
    Ok(TypeExpr::new(TypeExprKind::Struct(fields), Span::DUMMY))
}

/// Split `name<args>[]` into the name (keeping array suffixes) and parsed args.
fn split_generic(s: &str) -> Result<(String, Vec<TypeExpr>), SignatureError> {
    let Some(lt_pos) = s.find('<') else {
        return Ok((s.trim().to_string(), Vec::new()));
    };
    let Some(gt_pos) = closing_index(s, lt_pos) else {
        return Err(SignatureError::new(s, "unbalanced `<`"));
    };
    let suffix = s[gt_pos + 1..].trim();
    if !suffix.chars().all(|c| c == '[' || c == ']') {
        return Err(SignatureError::new(s, "unexpected text after type arguments"));
    }
    let args = split_at_depth_0(&s[lt_pos + 1..gt_pos], ',')
        .into_iter()
        .map(parse_signature)
        .collect::<Result<Vec<_>, _>>()?;
    Ok((format!("{}{}", s[..lt_pos].trim(), suffix), args))
}

/// Walk `s`, calling `f(index, char)` for every char at bracket depth 0.
/// `->` is skipped as a unit so its `>` never closes an angle bracket.
fn walk_depth_0(s: &str, mut f: impl FnMut(usize, char) -> bool) {
    let mut depth = 0i32;
    let mut chars = s.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '-' if matches!(chars.peek(), Some((_, '>'))) => {
                if depth == 0 && !f(i, '-') {
                    return;
                }
                chars.next();
            }
            '<' | '(' | '{' => depth += 1,
            '>' | ')' | '}' => depth -= 1,
            _ => {
                if depth == 0 && !f(i, c) {
                    return;
                }
            }
        }
    }
}

fn find_arrow_at_depth_0(s: &str) -> Option<usize> {
    let mut found = None;
    walk_depth_0(s, |i, c| {
        if c == '-' && s[i..].starts_with("->") {
            found = Some(i);
            false
        } else {
            true
        }
    });
    found
}

/// Check if `|` appears at depth 0 (not inside `<>`, `()` or `{}`).
fn contains_pipe_at_depth_0(s: &str) -> bool {
    let mut found = false;
    walk_depth_0(s, |_, c| {
        found = c == '|';
        !found
    });
    found
}

fn first_whitespace_at_depth_0(s: &str) -> Option<usize> {
    let mut found = None;
    walk_depth_0(s, |i, c| {
        if c.is_whitespace() {
            found = Some(i);
            false
        } else {
            true
        }
    });
    found
}

/// Split at `sep` appearing at depth 0, trimming the parts.
fn split_at_depth_0(s: &str, sep: char) -> Vec<&str> {
    let mut cuts = Vec::new();
    walk_depth_0(s, |i, c| {
        if c == sep {
            cuts.push(i);
        }
        true
    });
    let mut result = Vec::new();
    let mut start = 0;
    for cut in cuts {
        result.push(s[start..cut].trim());
        start = cut + sep.len_utf8();
    }
    result.push(s[start..].trim());
    result
}

/// Index of the bracket closing the one opened at `open`.
fn closing_index(s: &str, open: usize) -> Option<usize> {
    let mut depth = 0i32;
    let bytes = s.as_bytes();
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'-' if bytes.get(i + 1) == Some(&b'>') => i += 1,
            b'<' | b'(' | b'{' => depth += 1,
            b'>' | b')' | b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(s: &str) -> String {
        parse_signature(s).unwrap().to_string()
    }

    #[test]
    fn primitives_and_vars() {
        assert_eq!(sig("number"), "number");
        assert_eq!(sig("()"), "()");
        assert_eq!(sig("'a"), "'a");
    }

    #[test]
    fn arrows_are_right_associative() {
        let t = parse_signature("number -> number -> boolean").unwrap();
        match t.kind {
            TypeExprKind::Fun(arg, ret) => {
                assert_eq!(arg.to_string(), "number");
                assert_eq!(ret.to_string(), "number -> boolean");
            }
            other => panic!("expected function, got {:?}", other),
        }
        assert_eq!(sig("('a -> 'b) -> list<'a> -> list<'b>"), "('a -> 'b) -> list<'a> -> list<'b>");
    }

    #[test]
    fn containers() {
        assert_eq!(sig("hash<string, list<number>>"), "hash<string, list<number>>");
        assert_eq!(sig("list?<'a>"), "list?<'a>");
    }

    #[test]
    fn structs_and_variants() {
        assert_eq!(sig("{var a is number, b is string}"), "{var a is number, b is string}");
        assert_eq!(sig("Some 'a | None ()"), "Some 'a | None ()");
        assert_eq!(sig("Leaf number"), "Leaf number");
        assert_eq!(sig("{f is number -> number}"), "{f is number -> number}");
    }

    #[test]
    fn host_types() {
        let t = parse_signature("~java.util.Map<string, number>[]").unwrap();
        match &t.kind {
            TypeExprKind::Host { class, args } => {
                assert_eq!(class, "java.util.Map[]");
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected host type, got {:?}", other),
        }
        assert_eq!(t.to_string(), "~java.util.Map<string, number>[]");
    }

    #[test]
    fn errors() {
        assert!(parse_signature("").is_err());
        assert!(parse_signature("{a number}").is_err());
        assert!(parse_signature("number | string").is_err());
        assert!(parse_signature("list<number").is_err());
    }
}
