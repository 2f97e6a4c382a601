//! Core identifier and location types shared across the crate.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId(pub u32);

impl FileId {
    pub fn new(value: u32) -> Option<Self> {
        if value == 0 { None } else { Some(Self(value)) }
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl Default for FileId {
    fn default() -> Self {
        FileId(1)
    }
}

/// A source range carrying both byte offsets and line/column positions.
///
/// Byte offsets are what downstream tooling (and anonymous-symbol naming)
/// key on; line/column pairs are what editors want back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start_byte: u32,
    pub end_byte: u32,
    pub start_line: u32,
    pub start_column: u16,
    pub end_line: u32,
    pub end_column: u16,
}

impl Range {
    pub fn new(
        start_byte: u32,
        end_byte: u32,
        start_line: u32,
        start_column: u16,
        end_line: u32,
        end_column: u16,
    ) -> Self {
        Self {
            start_byte,
            end_byte,
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// Convert a tree-sitter node's extent into a `Range`.
    pub fn from_node(node: &tree_sitter::Node) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        Self {
            start_byte: node.start_byte() as u32,
            end_byte: node.end_byte() as u32,
            start_line: start.row as u32,
            start_column: start.column as u16,
            end_line: end.row as u32,
            end_column: end.column as u16,
        }
    }

    pub fn contains(&self, line: u32, column: u16) -> bool {
        if line < self.start_line || line > self.end_line {
            return false;
        }
        if line == self.start_line && column < self.start_column {
            return false;
        }
        if line == self.end_line && column > self.end_column {
            return false;
        }
        true
    }
}

/// A packed symbol location: owning document plus source extent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file_id: FileId,
    pub range: Range,
}

impl Location {
    pub fn new(file_id: FileId, range: Range) -> Self {
        Self { file_id, range }
    }
}

/// The kind of thing a symbol or reference denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    File,
    Namespace,
    Class,
    Interface,
    Trait,
    Function,
    Method,
    Parameter,
    Property,
    ClassConstant,
    Constant,
    Variable,
    Use,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::File => "File",
            SymbolKind::Namespace => "Namespace",
            SymbolKind::Class => "Class",
            SymbolKind::Interface => "Interface",
            SymbolKind::Trait => "Trait",
            SymbolKind::Function => "Function",
            SymbolKind::Method => "Method",
            SymbolKind::Parameter => "Parameter",
            SymbolKind::Property => "Property",
            SymbolKind::ClassConstant => "ClassConstant",
            SymbolKind::Constant => "Constant",
            SymbolKind::Variable => "Variable",
            SymbolKind::Use => "Use",
        }
    }
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// PHP declaration modifiers, stored as a bitset on each symbol.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct SymbolModifiers: u16 {
        const PUBLIC     = 1 << 0;
        const PROTECTED  = 1 << 1;
        const PRIVATE    = 1 << 2;
        const STATIC     = 1 << 3;
        const FINAL      = 1 << 4;
        const ABSTRACT   = 1 << 5;
        const REFERENCE  = 1 << 6;
        const VARIADIC   = 1 << 7;
        const ANONYMOUS  = 1 << 8;
        const USE        = 1 << 9;
        const MAGIC      = 1 << 10;
        const READ_ONLY  = 1 << 11;
        const WRITE_ONLY = 1 << 12;
    }
}

impl SymbolModifiers {
    const VISIBILITY: SymbolModifiers = SymbolModifiers::PUBLIC
        .union(SymbolModifiers::PROTECTED)
        .union(SymbolModifiers::PRIVATE);

    /// Parse a single modifier keyword as it appears in source.
    pub fn from_keyword(word: &str) -> SymbolModifiers {
        match word {
            "public" | "var" => SymbolModifiers::PUBLIC,
            "protected" => SymbolModifiers::PROTECTED,
            "private" => SymbolModifiers::PRIVATE,
            "static" => SymbolModifiers::STATIC,
            "final" => SymbolModifiers::FINAL,
            "abstract" => SymbolModifiers::ABSTRACT,
            "readonly" => SymbolModifiers::READ_ONLY,
            _ => SymbolModifiers::empty(),
        }
    }

    /// Enforce PHP's modifier rules: visibility bits are mutually exclusive
    /// (private > protected > public when several are present) and a member
    /// cannot be both abstract and final.
    pub fn normalized(self) -> SymbolModifiers {
        let mut out = self;
        if out.contains(SymbolModifiers::PRIVATE) {
            out.remove(SymbolModifiers::PROTECTED | SymbolModifiers::PUBLIC);
        } else if out.contains(SymbolModifiers::PROTECTED) {
            out.remove(SymbolModifiers::PUBLIC);
        }
        if out.contains(SymbolModifiers::ABSTRACT) {
            out.remove(SymbolModifiers::FINAL);
        }
        out
    }

    /// Apply the default visibility for class members when none is declared.
    pub fn with_default_visibility(self) -> SymbolModifiers {
        if self.intersects(SymbolModifiers::VISIBILITY) {
            self
        } else {
            self | SymbolModifiers::PUBLIC
        }
    }

    pub fn has_visibility(self) -> bool {
        self.intersects(SymbolModifiers::VISIBILITY)
    }
}

pub type CompactString = Box<str>;

pub fn compact_string(s: &str) -> CompactString {
    s.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_id_creation() {
        assert!(FileId::new(0).is_none());
        let id = FileId::new(7).unwrap();
        assert_eq!(id.value(), 7);
    }

    #[test]
    fn test_range_contains() {
        let range = Range::new(0, 0, 10, 5, 15, 20);
        assert!(range.contains(12, 10));
        assert!(range.contains(10, 5));
        assert!(range.contains(15, 20));
        assert!(!range.contains(9, 10));
        assert!(!range.contains(16, 0));
        assert!(!range.contains(10, 4));
        assert!(!range.contains(15, 21));
    }

    #[test]
    fn test_visibility_is_exclusive() {
        let m = (SymbolModifiers::PUBLIC | SymbolModifiers::PRIVATE).normalized();
        assert_eq!(m, SymbolModifiers::PRIVATE);

        let m = (SymbolModifiers::PROTECTED | SymbolModifiers::PUBLIC).normalized();
        assert_eq!(m, SymbolModifiers::PROTECTED);
    }

    #[test]
    fn test_abstract_excludes_final() {
        let m = (SymbolModifiers::ABSTRACT | SymbolModifiers::FINAL).normalized();
        assert!(m.contains(SymbolModifiers::ABSTRACT));
        assert!(!m.contains(SymbolModifiers::FINAL));
    }

    #[test]
    fn test_default_visibility_is_public() {
        let m = SymbolModifiers::STATIC.with_default_visibility();
        assert!(m.contains(SymbolModifiers::PUBLIC));

        let m = SymbolModifiers::PRIVATE.with_default_visibility();
        assert!(!m.contains(SymbolModifiers::PUBLIC));
    }

    #[test]
    fn test_modifier_keywords() {
        assert_eq!(
            SymbolModifiers::from_keyword("var"),
            SymbolModifiers::PUBLIC
        );
        assert_eq!(
            SymbolModifiers::from_keyword("readonly"),
            SymbolModifiers::READ_ONLY
        );
        assert_eq!(
            SymbolModifiers::from_keyword("nonsense"),
            SymbolModifiers::empty()
        );
    }
}
