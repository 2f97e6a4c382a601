//! PHPDoc comment parsing.
//!
//! Turns a raw `/** ... */` block into a summary description plus a list of
//! recognised tags. Only the tags the symbol pass consumes are modelled:
//! `@param`, `@return`, `@var`, `@property` (and its read/write variants),
//! `@method`, and `@global`. Anything unrecognised or malformed is skipped;
//! a bad line never poisons the rest of the block.

/// A parsed PHPDoc block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocBlock {
    /// Free text before the first tag line.
    pub description: String,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    Param {
        type_string: String,
        name: String,
        description: String,
    },
    Return {
        type_string: String,
        description: String,
    },
    Var {
        type_string: String,
        /// `@var Type $name` names its subject; a bare `@var Type` applies
        /// to the declaration that follows.
        name: Option<String>,
        description: String,
    },
    Property {
        access: PropertyAccess,
        type_string: String,
        name: String,
        description: String,
    },
    Method {
        is_static: bool,
        return_type: Option<String>,
        name: String,
        parameters: Vec<MethodTagParam>,
        description: String,
    },
    Global {
        type_string: String,
        name: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyAccess {
    ReadWrite,
    ReadOnly,
    WriteOnly,
}

/// One parameter of an `@method` signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodTagParam {
    pub type_string: Option<String>,
    pub name: String,
    pub default: Option<String>,
    pub is_variadic: bool,
    pub by_ref: bool,
}

impl DocBlock {
    /// Parse a raw `/** ... */` comment. Returns `None` for anything that is
    /// not a doc comment.
    pub fn parse(text: &str) -> Option<DocBlock> {
        let trimmed = text.trim();
        if !trimmed.starts_with("/**") {
            return None;
        }
        let inner = trimmed
            .strip_prefix("/**")
            .unwrap_or(trimmed)
            .strip_suffix("*/")
            .unwrap_or(trimmed);

        let mut description_lines: Vec<&str> = Vec::new();
        let mut tags = Vec::new();
        let mut seen_tag = false;

        for line in inner.lines() {
            let line = line.trim().trim_start_matches('*').trim();
            if line.starts_with('@') {
                seen_tag = true;
                if let Some(tag) = parse_tag_line(line) {
                    tags.push(tag);
                }
            } else if !seen_tag && !line.is_empty() {
                description_lines.push(line);
            }
        }

        Some(DocBlock {
            description: description_lines.join("\n"),
            tags,
        })
    }

    /// The `@param` tag for a given parameter name (with `$`), if present.
    pub fn param(&self, param_name: &str) -> Option<(&str, &str)> {
        self.tags.iter().find_map(|t| match t {
            Tag::Param {
                type_string,
                name,
                description,
            } if name == param_name => Some((type_string.as_str(), description.as_str())),
            _ => None,
        })
    }

    /// The `@return` tag, if present.
    pub fn return_tag(&self) -> Option<(&str, &str)> {
        self.tags.iter().find_map(|t| match t {
            Tag::Return {
                type_string,
                description,
            } => Some((type_string.as_str(), description.as_str())),
            _ => None,
        })
    }

    /// The `@var` tag matching `name`, or an unnamed `@var`.
    pub fn var_tag(&self, subject: &str) -> Option<(&str, &str)> {
        self.tags.iter().find_map(|t| match t {
            Tag::Var {
                type_string,
                name,
                description,
            } if name.is_none() || name.as_deref() == Some(subject) => {
                Some((type_string.as_str(), description.as_str()))
            }
            _ => None,
        })
    }
}

fn parse_tag_line(line: &str) -> Option<Tag> {
    if let Some(rest) = strip_tag(line, "@param") {
        return parse_param(rest);
    }
    if let Some(rest) = strip_tag(line, "@return") {
        return parse_return(rest);
    }
    if let Some(rest) = strip_tag(line, "@var") {
        return parse_var(rest);
    }
    if let Some(rest) = strip_tag(line, "@property-read") {
        return parse_property(rest, PropertyAccess::ReadOnly);
    }
    if let Some(rest) = strip_tag(line, "@property-write") {
        return parse_property(rest, PropertyAccess::WriteOnly);
    }
    if let Some(rest) = strip_tag(line, "@property") {
        return parse_property(rest, PropertyAccess::ReadWrite);
    }
    if let Some(rest) = strip_tag(line, "@method") {
        return parse_method(rest);
    }
    if let Some(rest) = strip_tag(line, "@global") {
        return parse_global(rest);
    }
    None
}

/// Strip a tag prefix, requiring it to be followed by whitespace (so that
/// `@returns` does not match `@return`).
fn strip_tag<'a>(line: &'a str, tag: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(tag)?;
    if rest.is_empty() {
        return Some(rest);
    }
    let next = rest.chars().next()?;
    if next.is_whitespace() {
        Some(rest.trim_start())
    } else {
        None
    }
}

fn parse_param(rest: &str) -> Option<Tag> {
    let (type_string, remainder) = split_type_token(rest);
    if type_string.is_empty() {
        return None;
    }
    // Allow both `@param Type $x desc` and `@param $x desc`.
    let (type_string, name, remainder) = if type_string.starts_with('$') {
        (String::new(), type_string.to_string(), remainder)
    } else {
        let name = remainder.split_whitespace().next()?;
        if !name.starts_with('$') {
            return None;
        }
        let after = remainder[remainder.find(name)? + name.len()..].trim_start();
        (type_string.to_string(), name.to_string(), after)
    };

    Some(Tag::Param {
        type_string,
        name,
        description: remainder.trim().to_string(),
    })
}

fn parse_return(rest: &str) -> Option<Tag> {
    let (type_string, remainder) = split_type_token(rest);
    if type_string.is_empty() || type_string.starts_with('$') {
        return None;
    }
    Some(Tag::Return {
        type_string: type_string.to_string(),
        description: remainder.trim().to_string(),
    })
}

fn parse_var(rest: &str) -> Option<Tag> {
    let (type_string, remainder) = split_type_token(rest);
    if type_string.is_empty() || type_string.starts_with('$') {
        return None;
    }
    let mut name = None;
    let mut description = remainder.trim();
    if let Some(candidate) = description.split_whitespace().next() {
        if candidate.starts_with('$') {
            name = Some(candidate.to_string());
            description = description[description.find(candidate).unwrap() + candidate.len()..]
                .trim_start();
        }
    }
    Some(Tag::Var {
        type_string: type_string.to_string(),
        name,
        description: description.to_string(),
    })
}

fn parse_property(rest: &str, access: PropertyAccess) -> Option<Tag> {
    // `@property Type $name desc` or `@property $name desc`.
    let (first, remainder) = split_type_token(rest);
    if first.is_empty() {
        return None;
    }
    let (type_string, name, description) = if let Some(stripped) = first.strip_prefix('$') {
        if stripped.is_empty() {
            return None;
        }
        (String::new(), first.to_string(), remainder.trim())
    } else {
        let name = remainder.split_whitespace().find(|t| t.starts_with('$'))?;
        let after = remainder[remainder.find(name)? + name.len()..].trim_start();
        (first.to_string(), name.to_string(), after)
    };

    Some(Tag::Property {
        access,
        type_string,
        name,
        description: description.to_string(),
    })
}

fn parse_method(rest: &str) -> Option<Tag> {
    // `@method [static] [ReturnType] name(Type $a, ...) desc`
    let (is_static, rest) = match rest.strip_prefix("static") {
        Some(after) if after.starts_with(|c: char| c.is_whitespace() || c == '(') => {
            (true, after.trim_start())
        }
        _ => (false, rest),
    };

    let paren = rest.find('(')?;
    let before = rest[..paren].trim();
    if before.is_empty() {
        return None;
    }
    let (return_type, name) = match before.rfind(char::is_whitespace) {
        Some(pos) => (
            Some(before[..pos].trim().to_string()),
            before[pos..].trim().to_string(),
        ),
        None => (None, before.to_string()),
    };
    if name.is_empty() {
        return None;
    }

    let after_paren = &rest[paren + 1..];
    let close = after_paren.rfind(')');
    let params_str = match close {
        Some(pos) => &after_paren[..pos],
        None => after_paren,
    };
    let description = close
        .map(|pos| after_paren[pos + 1..].trim().to_string())
        .unwrap_or_default();

    Some(Tag::Method {
        is_static,
        return_type: return_type.filter(|t| !t.is_empty()),
        name,
        parameters: parse_method_params(params_str),
        description,
    })
}

fn parse_global(rest: &str) -> Option<Tag> {
    let (type_string, remainder) = split_type_token(rest);
    if type_string.is_empty() {
        return None;
    }
    let name = remainder
        .split_whitespace()
        .next()
        .filter(|t| t.starts_with('$'))
        .map(str::to_string);
    Some(Tag::Global {
        type_string: type_string.to_string(),
        name,
    })
}

fn parse_method_params(params_str: &str) -> Vec<MethodTagParam> {
    let mut out = Vec::new();
    for part in split_params(params_str) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let Some(dollar) = part.rfind('$') else {
            continue;
        };
        let name_and_rest = &part[dollar..];
        let name_end = name_and_rest
            .find(|c: char| c.is_whitespace() || c == '=' || c == ')')
            .unwrap_or(name_and_rest.len());
        let name = &name_and_rest[..name_end];

        let default = name_and_rest[name_end..]
            .trim_start()
            .strip_prefix('=')
            .map(|d| d.trim().to_string());

        let before = part[..dollar].trim();
        let by_ref = before.ends_with('&');
        let is_variadic = before.ends_with("...") || before.trim_end_matches('&').ends_with("...");
        let type_str = before
            .trim_end_matches('&')
            .trim_end_matches("...")
            .trim_end();

        out.push(MethodTagParam {
            type_string: (!type_str.is_empty()).then(|| type_str.to_string()),
            name: name.to_string(),
            default,
            is_variadic,
            by_ref,
        });
    }
    out
}

/// Extract the leading type token of a tag body, respecting `<...>`, `(...)`
/// and `{...}` nesting so that `array<string, int>` stays one token.
/// Returns the token and the remainder.
pub fn split_type_token(s: &str) -> (&str, &str) {
    let mut angle = 0i32;
    let mut paren = 0i32;
    let mut brace = 0i32;

    for (i, ch) in s.char_indices() {
        match ch {
            '<' => angle += 1,
            '>' => angle -= 1,
            '(' => paren += 1,
            ')' => paren -= 1,
            '{' => brace += 1,
            '}' => brace -= 1,
            c if c.is_whitespace() && angle == 0 && paren == 0 && brace == 0 => {
                return (&s[..i], s[i..].trim_start());
            }
            _ => {}
        }
    }
    (s, "")
}

/// Split a parameter list on commas while respecting `<>` and `()` nesting.
fn split_params(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut angle = 0i32;
    let mut paren = 0i32;
    let mut start = 0;

    for (i, ch) in s.char_indices() {
        match ch {
            '<' => angle += 1,
            '>' => angle -= 1,
            '(' => paren += 1,
            ')' => paren -= 1,
            ',' if angle == 0 && paren == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_doc_comment_rejected() {
        assert!(DocBlock::parse("// plain").is_none());
        assert!(DocBlock::parse("/* block */").is_none());
        assert!(DocBlock::parse("/** doc */").is_some());
    }

    #[test]
    fn test_description_before_tags() {
        let doc = DocBlock::parse(
            "/**\n * Summary line.\n * Second line.\n *\n * @return int the count\n */",
        )
        .unwrap();
        assert_eq!(doc.description, "Summary line.\nSecond line.");
        assert_eq!(doc.return_tag(), Some(("int", "the count")));
    }

    #[test]
    fn test_param_tag() {
        let doc = DocBlock::parse("/** @param string|null $name the name */").unwrap();
        assert_eq!(doc.param("$name"), Some(("string|null", "the name")));
        assert_eq!(doc.param("$other"), None);
    }

    #[test]
    fn test_param_without_type() {
        let doc = DocBlock::parse("/** @param $raw */").unwrap();
        match &doc.tags[0] {
            Tag::Param {
                type_string, name, ..
            } => {
                assert_eq!(type_string, "");
                assert_eq!(name, "$raw");
            }
            other => panic!("expected param tag, got {other:?}"),
        }
    }

    #[test]
    fn test_var_with_and_without_name() {
        let doc = DocBlock::parse("/** @var int $count */").unwrap();
        assert_eq!(doc.var_tag("$count"), Some(("int", "")));
        assert_eq!(doc.var_tag("$other"), None);

        let doc = DocBlock::parse("/** @var string */").unwrap();
        assert_eq!(doc.var_tag("$anything"), Some(("string", "")));
    }

    #[test]
    fn test_property_variants() {
        let doc = DocBlock::parse(
            "/**\n * @property int $x\n * @property-read string $y\n * @property-write Foo $z\n */",
        )
        .unwrap();
        let accesses: Vec<_> = doc
            .tags
            .iter()
            .map(|t| match t {
                Tag::Property { access, name, .. } => (*access, name.clone()),
                other => panic!("unexpected tag {other:?}"),
            })
            .collect();
        assert_eq!(
            accesses,
            vec![
                (PropertyAccess::ReadWrite, "$x".to_string()),
                (PropertyAccess::ReadOnly, "$y".to_string()),
                (PropertyAccess::WriteOnly, "$z".to_string()),
            ]
        );
    }

    #[test]
    fn test_generic_property_type_stays_whole() {
        let doc = DocBlock::parse("/** @property Collection<int, Model> $items */").unwrap();
        match &doc.tags[0] {
            Tag::Property { type_string, .. } => {
                assert_eq!(type_string, "Collection<int, Model>");
            }
            other => panic!("unexpected tag {other:?}"),
        }
    }

    #[test]
    fn test_method_tag() {
        let doc = DocBlock::parse(
            "/** @method static Builder where(string $column, mixed $value = null) chainable */",
        )
        .unwrap();
        match &doc.tags[0] {
            Tag::Method {
                is_static,
                return_type,
                name,
                parameters,
                description,
            } => {
                assert!(is_static);
                assert_eq!(return_type.as_deref(), Some("Builder"));
                assert_eq!(name, "where");
                assert_eq!(parameters.len(), 2);
                assert_eq!(parameters[0].name, "$column");
                assert_eq!(parameters[0].type_string.as_deref(), Some("string"));
                assert_eq!(parameters[1].default.as_deref(), Some("null"));
                assert_eq!(description, "chainable");
            }
            other => panic!("unexpected tag {other:?}"),
        }
    }

    #[test]
    fn test_method_without_return_type() {
        let doc = DocBlock::parse("/** @method flush() */").unwrap();
        match &doc.tags[0] {
            Tag::Method {
                return_type, name, ..
            } => {
                assert_eq!(*return_type, None);
                assert_eq!(name, "flush");
            }
            other => panic!("unexpected tag {other:?}"),
        }
    }

    #[test]
    fn test_malformed_tags_are_dropped() {
        let doc = DocBlock::parse("/**\n * @param\n * @method\n * @return int\n */").unwrap();
        assert_eq!(doc.tags.len(), 1);
        assert!(matches!(doc.tags[0], Tag::Return { .. }));
    }

    #[test]
    fn test_returns_tag_does_not_match_return() {
        let doc = DocBlock::parse("/** @returns int */").unwrap();
        assert!(doc.tags.is_empty());
    }
}
