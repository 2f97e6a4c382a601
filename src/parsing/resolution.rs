//! Per-file PHP name resolution.
//!
//! PHP resolves names through three inputs: the current namespace, the
//! file's `use` table, and the written form of the name (unqualified,
//! qualified, relative, or fully qualified). A fresh [`NameResolver`] is
//! created for every document; use-rules become visible the moment their
//! clause is walked, so they apply to every name that appears after them.

use crate::symbol::keys;
use crate::types::SymbolKind;

/// Type names PHP treats as built-in. They resolve to themselves, never
/// through the namespace or the use table.
const RESERVED_NAMES: &[&str] = &[
    "int", "string", "bool", "float", "iterable", "true", "false", "null", "void", "object",
];

/// The import kind of a `use` rule. Classes, functions, and constants live
/// in separate alias namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Class,
    Function,
    Constant,
}

impl NameKind {
    /// Map a symbol kind onto the alias namespace used to resolve it.
    pub fn from_symbol_kind(kind: SymbolKind) -> NameKind {
        match kind {
            SymbolKind::Function => NameKind::Function,
            SymbolKind::Constant => NameKind::Constant,
            _ => NameKind::Class,
        }
    }
}

/// One `use` import: `alias` is the short name visible in this file,
/// `fqn` the target it expands to.
#[derive(Debug, Clone)]
pub struct UseRule {
    pub alias: String,
    pub fqn: String,
    pub kind: NameKind,
}

/// An entry on the enclosing-class stack, so `self`, `static`, and
/// `parent` resolve while members are being walked.
#[derive(Debug, Clone)]
pub struct ClassContext {
    pub fqn: String,
    pub base: Option<String>,
}

#[derive(Debug, Default)]
pub struct NameResolver {
    namespace_name: String,
    rules: Vec<UseRule>,
    class_stack: Vec<ClassContext>,
}

impl NameResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespace_name(&self) -> &str {
        &self.namespace_name
    }

    pub fn set_namespace(&mut self, namespace: &str) {
        self.namespace_name = namespace.trim_matches('\\').to_string();
    }

    /// Register a use-import. Subsequent names resolve through it.
    pub fn add_rule(&mut self, rule: UseRule) {
        self.rules.push(rule);
    }

    pub fn push_class(&mut self, fqn: &str) {
        self.class_stack.push(ClassContext {
            fqn: fqn.to_string(),
            base: None,
        });
    }

    pub fn pop_class(&mut self) {
        self.class_stack.pop();
    }

    /// Record the base class of the class currently on top of the stack.
    pub fn set_current_base(&mut self, base: &str) {
        if let Some(top) = self.class_stack.last_mut() {
            top.base = Some(base.to_string());
        }
    }

    pub fn current_class(&self) -> Option<&str> {
        self.class_stack.last().map(|c| c.fqn.as_str())
    }

    pub fn current_base(&self) -> Option<&str> {
        self.class_stack.last().and_then(|c| c.base.as_deref())
    }

    pub fn is_reserved(name: &str) -> bool {
        RESERVED_NAMES.iter().any(|r| name.eq_ignore_ascii_case(r))
    }

    /// Qualify a declaration-site name against the current namespace.
    ///
    /// This is what class, interface, trait, function, and constant names go
    /// through at the point they are declared.
    pub fn resolve_relative(&self, name: &str) -> String {
        let name = name.trim_start_matches('\\');
        keys::join_namespace(&self.namespace_name, name)
    }

    /// Qualify the tail of a `namespace\Foo` syntactic form.
    pub fn resolve_relative_to_namespace(&self, name: &str) -> String {
        keys::join_namespace(&self.namespace_name, name.trim_start_matches('\\'))
    }

    /// Resolve a name that is not written fully qualified, following PHP's
    /// rules for the given alias namespace.
    ///
    /// Unqualified names check the use table for their kind first, then fall
    /// back to the current namespace. Qualified names substitute a class
    /// alias for their first segment when one matches. Reserved type words
    /// come back unchanged.
    pub fn resolve_not_fully_qualified(&self, name: &str, kind: NameKind) -> String {
        if Self::is_reserved(name) {
            return name.to_string();
        }
        if let Some(stripped) = name.strip_prefix('\\') {
            return stripped.to_string();
        }

        match name.find('\\') {
            None => match self.find_rule(name, kind) {
                Some(rule) => rule.fqn.clone(),
                None => keys::join_namespace(&self.namespace_name, name),
            },
            Some(pos) => {
                let first = &name[..pos];
                let rest = &name[pos + 1..];
                match self.find_rule(first, NameKind::Class) {
                    Some(rule) => format!("{}\\{rest}", rule.fqn),
                    None => keys::join_namespace(&self.namespace_name, name),
                }
            }
        }
    }

    fn find_rule(&self, alias: &str, kind: NameKind) -> Option<&UseRule> {
        self.rules
            .iter()
            .find(|r| r.kind == kind && r.alias == alias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver_in(ns: &str) -> NameResolver {
        let mut r = NameResolver::new();
        r.set_namespace(ns);
        r
    }

    #[test]
    fn test_resolve_relative_prepends_namespace() {
        let r = resolver_in("A\\B");
        assert_eq!(r.resolve_relative("C"), "A\\B\\C");

        let global = NameResolver::new();
        assert_eq!(global.resolve_relative("C"), "C");
    }

    #[test]
    fn test_unqualified_class_without_alias() {
        let r = resolver_in("App");
        assert_eq!(
            r.resolve_not_fully_qualified("User", NameKind::Class),
            "App\\User"
        );
    }

    #[test]
    fn test_unqualified_class_through_alias() {
        let mut r = resolver_in("App");
        r.add_rule(UseRule {
            alias: "B".to_string(),
            fqn: "Foo\\Bar".to_string(),
            kind: NameKind::Class,
        });
        assert_eq!(
            r.resolve_not_fully_qualified("B", NameKind::Class),
            "Foo\\Bar"
        );
    }

    #[test]
    fn test_qualified_name_first_segment_alias() {
        let mut r = resolver_in("App");
        r.add_rule(UseRule {
            alias: "Models".to_string(),
            fqn: "Domain\\Models".to_string(),
            kind: NameKind::Class,
        });
        assert_eq!(
            r.resolve_not_fully_qualified("Models\\User", NameKind::Class),
            "Domain\\Models\\User"
        );
        assert_eq!(
            r.resolve_not_fully_qualified("Other\\User", NameKind::Class),
            "App\\Other\\User"
        );
    }

    #[test]
    fn test_function_and_constant_aliases_are_separate() {
        let mut r = resolver_in("App");
        r.add_rule(UseRule {
            alias: "map".to_string(),
            fqn: "Func\\map".to_string(),
            kind: NameKind::Function,
        });
        assert_eq!(
            r.resolve_not_fully_qualified("map", NameKind::Function),
            "Func\\map"
        );
        // The same short name used as a class does not see the function rule.
        assert_eq!(
            r.resolve_not_fully_qualified("map", NameKind::Class),
            "App\\map"
        );
    }

    #[test]
    fn test_reserved_words_pass_through() {
        let r = resolver_in("App");
        for word in ["int", "string", "bool", "float", "iterable", "void", "object"] {
            assert_eq!(
                r.resolve_not_fully_qualified(word, NameKind::Class),
                word,
                "reserved word {word} must not be qualified"
            );
        }
        assert_eq!(r.resolve_not_fully_qualified("TRUE", NameKind::Constant), "TRUE");
    }

    #[test]
    fn test_fully_qualified_is_idempotent() {
        let mut r = resolver_in("App");
        r.add_rule(UseRule {
            alias: "Bar".to_string(),
            fqn: "Foo\\Bar".to_string(),
            kind: NameKind::Class,
        });
        assert_eq!(
            r.resolve_not_fully_qualified("\\Foo\\Bar", NameKind::Class),
            "Foo\\Bar"
        );
    }

    #[test]
    fn test_relative_to_namespace() {
        let r = resolver_in("A\\B");
        assert_eq!(r.resolve_relative_to_namespace("X\\Y"), "A\\B\\X\\Y");
    }

    #[test]
    fn test_class_stack() {
        let mut r = resolver_in("A");
        r.push_class("A\\C");
        r.set_current_base("A\\D");
        assert_eq!(r.current_class(), Some("A\\C"));
        assert_eq!(r.current_base(), Some("A\\D"));
        r.pop_class();
        assert_eq!(r.current_class(), None);
    }
}
