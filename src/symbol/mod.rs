//! The symbol and reference model produced by the extraction pass.
//!
//! A document yields one `File` symbol whose children are the declarations
//! of the document, in source order. Relationships that would create cycles
//! (base class, implemented interfaces, used traits) are held as
//! [`Reference`] values by fully-qualified name, never by pointer, so a
//! symbol tree is a plain owning tree that serializes without bookkeeping.

pub mod keys;
mod unique;

pub use unique::{is_superglobal, UniqueSymbolCollection};

use crate::types::{CompactString, Location, Range, SymbolKind, SymbolModifiers};
use serde::{Deserialize, Serialize};

/// A single definition discovered in a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
    pub kind: SymbolKind,
    /// Short name for members, fully-qualified name for namespace-level
    /// declarations, the document URI for files, a generated opaque name for
    /// anonymous classes and closures.
    pub name: CompactString,
    #[serde(default, skip_serializing_if = "SymbolModifiers::is_empty")]
    pub modifiers: SymbolModifiers,
    /// Declared or doc-derived type, resolved where possible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_hint: Option<String>,
    pub location: Location,
    /// Qualified name of the containing symbol (empty at file level).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scope: String,
    /// Literal initializer text, when the declaration has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Symbol>,
    /// Base class, implemented interfaces, and used traits, by name.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub associated: Vec<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<SymbolDoc>,
}

impl Symbol {
    pub fn new(kind: SymbolKind, name: &str, location: Location) -> Self {
        Self {
            kind,
            name: name.into(),
            modifiers: SymbolModifiers::empty(),
            type_hint: None,
            location,
            scope: String::new(),
            value: None,
            children: Vec::new(),
            associated: Vec::new(),
            doc: None,
        }
    }

    /// Whether this symbol carries a generated (anonymous) name.
    pub fn is_anonymous(&self) -> bool {
        self.modifiers.contains(SymbolModifiers::ANONYMOUS)
    }

    /// Lowercase acronym of the name, for fuzzy lookup.
    pub fn acronym(&self) -> String {
        keys::acronym(&self.name)
    }

    /// Ordered lowercase suffix keys of the name, for fuzzy lookup.
    pub fn suffix_keys(&self) -> Vec<String> {
        keys::suffix_keys(&self.name)
    }

    /// Depth-first traversal over this symbol and all owned descendants.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Symbol)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    /// Total number of symbols in this tree, the root included.
    pub fn tree_len(&self) -> usize {
        1 + self.children.iter().map(Symbol::tree_len).sum::<usize>()
    }
}

/// Documentation attached to a symbol from a PHPDoc comment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolDoc {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_hint: Option<String>,
}

impl SymbolDoc {
    pub fn new(description: &str, type_hint: Option<String>) -> Option<Self> {
        if description.is_empty() && type_hint.is_none() {
            return None;
        }
        Some(Self {
            description: description.to_string(),
            type_hint,
        })
    }
}

/// One occurrence of a name denoting a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub kind: SymbolKind,
    /// Resolved name: fully qualified for namespace-level symbols, member
    /// name for property/method/class-constant access.
    pub name: CompactString,
    /// The original written form, kept only when resolution rewrote a
    /// function or constant name so lookup can fall back to the global
    /// namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unresolved_name: Option<CompactString>,
    pub range: Range,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_hint: Option<String>,
}

impl Reference {
    pub fn new(kind: SymbolKind, name: &str, range: Range) -> Self {
        Self {
            kind,
            name: name.into(),
            unresolved_name: None,
            range,
            type_hint: None,
        }
    }
}
