//! Name-derived lookup keys for workspace-wide fuzzy search.
//!
//! Every named symbol exposes an acronym (`MyFooClass` → `mfc`) and a list
//! of suffix keys (`Foo\MyFooClass` → `foo\myfooclass`, `myfooclass`,
//! `fooclass`, `class`). Both are derived purely from the symbol name, so
//! they can be computed on demand without touching the index.

/// Byte positions inside `name` where a new word begins.
///
/// Word boundaries are namespace separators, underscores, the position after
/// a leading sigil, and camelCase humps. Position 0 is never reported.
fn word_starts(name: &str) -> Vec<usize> {
    let bytes = name.as_bytes();
    let mut starts = Vec::new();
    let mut prev: Option<u8> = None;

    for (i, &b) in bytes.iter().enumerate() {
        if i > 0 {
            match prev {
                Some(b'\\') | Some(b'_') | Some(b'$') => {
                    if b != b'\\' && b != b'_' {
                        starts.push(i);
                    }
                }
                Some(p) => {
                    // camelCase hump: lower-to-upper transition, or the last
                    // capital of an acronym run followed by lowercase.
                    let upper = b.is_ascii_uppercase();
                    if upper && p.is_ascii_lowercase() {
                        starts.push(i);
                    } else if upper
                        && p.is_ascii_uppercase()
                        && bytes.get(i + 1).is_some_and(|n| n.is_ascii_lowercase())
                    {
                        starts.push(i);
                    }
                }
                None => {}
            }
        }
        prev = Some(b);
    }

    starts
}

/// Compute the lowercase acronym of a symbol name.
///
/// Leading `$` and `_` sigils are stripped first; the result has one letter
/// per word of the remaining name.
pub fn acronym(name: &str) -> String {
    let stripped = name.trim_start_matches(['$', '_']);
    if stripped.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    if stripped.contains('_') {
        for part in stripped.split('_') {
            if let Some(c) = part.chars().next() {
                out.extend(c.to_lowercase());
            }
        }
    } else {
        for (i, c) in stripped.char_indices() {
            if !c.is_alphabetic() {
                continue;
            }
            if i == 0 || c.is_uppercase() {
                out.extend(c.to_lowercase());
            }
        }
    }
    out
}

/// Compute the ordered suffix keys of a symbol name.
///
/// The first key is always the full name lowercased; each following key is
/// the suffix starting at the next word boundary. All keys are lowercase.
pub fn suffix_keys(name: &str) -> Vec<String> {
    if name.is_empty() {
        return Vec::new();
    }

    let mut keys = vec![name.to_lowercase()];
    for start in word_starts(name) {
        if start < name.len() {
            let key = name[start..].to_lowercase();
            if keys.last().map(String::as_str) != Some(key.as_str()) {
                keys.push(key);
            }
        }
    }
    keys
}

/// Split a fully-qualified name into `(namespace, short name)`.
///
/// The namespace part is empty for a global name.
pub fn split_fqn(fqn: &str) -> (&str, &str) {
    match fqn.rfind('\\') {
        Some(pos) => (&fqn[..pos], &fqn[pos + 1..]),
        None => ("", fqn),
    }
}

/// The last segment of a (possibly qualified) name.
pub fn short_name(name: &str) -> &str {
    split_fqn(name).1
}

/// Join a namespace prefix and a name with the PHP separator, tolerating an
/// empty prefix.
pub fn join_namespace(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}\\{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acronym_camel_case() {
        assert_eq!(acronym("MyFooClass"), "mfc");
        assert_eq!(acronym("$myProperty"), "mp");
        assert_eq!(acronym("getValue"), "gv");
    }

    #[test]
    fn test_acronym_snake_case() {
        assert_eq!(acronym("_my_function"), "mf");
        assert_eq!(acronym("THIS_IS_A_CONSTANT"), "tiac");
        assert_eq!(acronym("str_replace"), "sr");
    }

    #[test]
    fn test_acronym_is_lowercase_letters_only() {
        for name in ["MyFooClass", "$myProperty", "SOME_CONST", "_hidden"] {
            let a = acronym(name);
            assert!(
                a.chars().all(|c| c.is_ascii_lowercase()),
                "acronym of {name} should be lowercase letters, got {a}"
            );
        }
    }

    #[test]
    fn test_suffix_keys_namespaced() {
        assert_eq!(
            suffix_keys("Foo\\MyFooClass"),
            vec!["foo\\myfooclass", "myfooclass", "fooclass", "class"]
        );
    }

    #[test]
    fn test_suffix_keys_property() {
        assert_eq!(
            suffix_keys("$myProperty"),
            vec!["$myproperty", "myproperty", "property"]
        );
    }

    #[test]
    fn test_suffix_keys_screaming_case() {
        assert_eq!(
            suffix_keys("THIS_IS_A_CONSTANT"),
            vec!["this_is_a_constant", "is_a_constant", "a_constant", "constant"]
        );
    }

    #[test]
    fn test_suffix_keys_first_is_full_lowercase() {
        for name in ["Foo\\Bar", "$x", "simple", "A\\B\\C"] {
            let keys = suffix_keys(name);
            assert_eq!(keys[0], name.to_lowercase());
        }
    }

    #[test]
    fn test_suffix_keys_are_right_suffixes() {
        let keys = suffix_keys("App\\Http\\RequestHandler");
        for pair in keys.windows(2) {
            assert!(
                pair[0].ends_with(pair[1].as_str()),
                "{} should end with {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_split_fqn() {
        assert_eq!(split_fqn("A\\B\\C"), ("A\\B", "C"));
        assert_eq!(split_fqn("Global"), ("", "Global"));
        assert_eq!(short_name("Foo\\Bar"), "Bar");
    }

    #[test]
    fn test_join_namespace() {
        assert_eq!(join_namespace("A\\B", "C"), "A\\B\\C");
        assert_eq!(join_namespace("", "C"), "C");
    }
}
