//! Resolution of textual type expressions.
//!
//! Doc tags and type declarations both carry type strings that may name
//! classes in short form (`Model|null`, `?Collection<int, User>`). Each
//! union member is resolved through the file's name resolver; reserved
//! scalar words and already-qualified names come back as written.

use super::resolution::{NameKind, NameResolver};

/// Resolve every class-like component of a type string against the current
/// namespace and use table. The union structure and nullability marker are
/// preserved.
pub fn resolve_type_string(type_string: &str, resolver: &NameResolver) -> String {
    let parts: Vec<String> = split_union(type_string)
        .into_iter()
        .map(|part| resolve_part(part.trim(), resolver))
        .collect();
    parts.join("|")
}

fn resolve_part(part: &str, resolver: &NameResolver) -> String {
    if part.is_empty() {
        return String::new();
    }

    // `?Type` keeps its marker on the resolved inner type.
    if let Some(inner) = part.strip_prefix('?') {
        return format!("?{}", resolve_part(inner, resolver));
    }

    // Generic suffixes and array suffixes resolve their base only.
    if let Some(open) = part.find('<') {
        let base = resolve_part(&part[..open], resolver);
        return format!("{base}{}", &part[open..]);
    }
    if let Some(base) = part.strip_suffix("[]") {
        return format!("{}[]", resolve_part(base, resolver));
    }

    if NameResolver::is_reserved(part) || is_builtin_type(part) {
        return part.to_string();
    }
    if let Some(stripped) = part.strip_prefix('\\') {
        return stripped.to_string();
    }

    resolver.resolve_not_fully_qualified(part, NameKind::Class)
}

/// Pseudo-types that appear in doc blocks but never denote a class.
fn is_builtin_type(part: &str) -> bool {
    matches!(
        part,
        "mixed"
            | "array"
            | "callable"
            | "static"
            | "self"
            | "parent"
            | "resource"
            | "scalar"
            | "never"
            | "numeric"
    )
}

/// Split a type string on `|` while respecting `<...>`, `(...)` and
/// `{...}` nesting.
pub fn split_union(type_string: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut angle = 0i32;
    let mut paren = 0i32;
    let mut brace = 0i32;
    let mut start = 0;

    for (i, ch) in type_string.char_indices() {
        match ch {
            '<' => angle += 1,
            '>' => angle -= 1,
            '(' => paren += 1,
            ')' => paren -= 1,
            '{' => brace += 1,
            '}' => brace -= 1,
            '|' if angle == 0 && paren == 0 && brace == 0 => {
                parts.push(&type_string[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&type_string[start..]);
    parts
}
