//! In-memory workspace symbol search.
//!
//! The index is populated one file at a time from finished symbol trees.
//! Lookup keys are the suffix keys and acronyms of each symbol name, so a
//! query matches from the right (`class` finds `Foo\MyFooClass`) or by
//! initials (`mfc`). Local variables and parameters stay out of the index;
//! anonymous symbols carry generated names and are skipped as well.

use std::collections::{BTreeMap, HashMap};

use crate::symbol::Symbol;
use crate::types::{Location, SymbolKind};

/// One searchable symbol occurrence.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub name: String,
    pub kind: SymbolKind,
    pub uri: String,
    pub location: Location,
    /// Containing qualified name, for display.
    pub scope: String,
}

#[derive(Debug, Default)]
pub struct SearchIndex {
    /// Slot storage; removed entries leave a hole until their file is
    /// re-added.
    entries: Vec<Option<IndexEntry>>,
    by_file: HashMap<String, Vec<u32>>,
    /// Suffix key -> entry ids. Ordered so prefix queries are range scans.
    suffixes: BTreeMap<String, Vec<u32>>,
    acronyms: HashMap<String, Vec<u32>>,
}

impl SearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index every named declaration of a file symbol tree. An existing
    /// entry set for the same URI is replaced.
    pub fn add_file(&mut self, uri: &str, root: &Symbol) {
        self.remove_file(uri);

        let mut ids = Vec::new();
        root.walk(&mut |symbol| {
            if !Self::indexable(symbol) {
                return;
            }
            let id = self.entries.len() as u32;
            self.entries.push(Some(IndexEntry {
                name: symbol.name.as_ref().to_string(),
                kind: symbol.kind,
                uri: uri.to_string(),
                location: symbol.location,
                scope: symbol.scope.clone(),
            }));
            ids.push(id);

            for key in symbol.suffix_keys() {
                self.suffixes.entry(key).or_default().push(id);
            }
            // Acronyms of both the full name and its last segment, so
            // `qr` finds `Acme\Search\QueryRunner` as well as `asqr`.
            let full = symbol.acronym();
            let short = crate::symbol::keys::acronym(crate::symbol::keys::short_name(
                symbol.name.as_ref(),
            ));
            if !full.is_empty() {
                self.acronyms.entry(full.clone()).or_default().push(id);
            }
            if !short.is_empty() && short != full {
                self.acronyms.entry(short).or_default().push(id);
            }
        });

        if !ids.is_empty() {
            self.by_file.insert(uri.to_string(), ids);
        }
    }

    /// Drop every entry belonging to a URI.
    pub fn remove_file(&mut self, uri: &str) {
        let Some(ids) = self.by_file.remove(uri) else {
            return;
        };
        for id in ids {
            self.entries[id as usize] = None;
        }
        // Dead ids are filtered lazily during search; the key maps are left
        // as-is until the next rebuild.
    }

    /// Find symbols whose suffix keys start with `query` (case-insensitive)
    /// or whose acronym equals it. Results preserve insertion order and
    /// contain no duplicates.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&IndexEntry> {
        let query = query.to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();

        let mut push = |id: u32, entries: &[Option<IndexEntry>], out: &mut Vec<u32>| {
            if entries[id as usize].is_some() && seen.insert(id) {
                out.push(id);
            }
        };

        let mut ids = Vec::new();
        for (key, key_ids) in self.suffixes.range(query.clone()..) {
            if !key.starts_with(&query) {
                break;
            }
            for &id in key_ids {
                push(id, &self.entries, &mut ids);
            }
        }
        if let Some(key_ids) = self.acronyms.get(&query) {
            for &id in key_ids {
                push(id, &self.entries, &mut ids);
            }
        }

        ids.sort_unstable();
        for id in ids.into_iter().take(limit) {
            if let Some(entry) = &self.entries[id as usize] {
                out.push(entry);
            }
        }
        out
    }

    fn indexable(symbol: &Symbol) -> bool {
        if symbol.is_anonymous() {
            return false;
        }
        matches!(
            symbol.kind,
            SymbolKind::Namespace
                | SymbolKind::Class
                | SymbolKind::Interface
                | SymbolKind::Trait
                | SymbolKind::Function
                | SymbolKind::Method
                | SymbolKind::Property
                | SymbolKind::ClassConstant
                | SymbolKind::Constant
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FileId, Range};

    fn symbol(kind: SymbolKind, name: &str) -> Symbol {
        Symbol::new(kind, name, Location::new(FileId(1), Range::default()))
    }

    fn sample_tree() -> Symbol {
        let mut file = symbol(SymbolKind::File, "file:///a.php");
        let mut class = symbol(SymbolKind::Class, "Foo\\MyFooClass");
        class.children.push(symbol(SymbolKind::Method, "getValue"));
        class
            .children
            .push(symbol(SymbolKind::Property, "$myProperty"));
        file.children.push(class);
        file.children
            .push(symbol(SymbolKind::Constant, "THIS_IS_A_CONSTANT"));
        file
    }

    #[test]
    fn test_search_by_suffix() {
        let mut index = SearchIndex::new();
        index.add_file("file:///a.php", &sample_tree());

        let hits = index.search("fooclass", 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Foo\\MyFooClass");

        let hits = index.search("property", 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "$myProperty");
    }

    #[test]
    fn test_search_by_acronym() {
        let mut index = SearchIndex::new();
        index.add_file("file:///a.php", &sample_tree());

        let hits = index.search("mfc", 10);
        assert!(hits.iter().any(|e| e.name == "Foo\\MyFooClass"));

        let hits = index.search("tiac", 10);
        assert!(hits.iter().any(|e| e.name == "THIS_IS_A_CONSTANT"));
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let mut index = SearchIndex::new();
        index.add_file("file:///a.php", &sample_tree());
        assert_eq!(index.search("MyFooClass", 10).len(), 1);
    }

    #[test]
    fn test_remove_file() {
        let mut index = SearchIndex::new();
        index.add_file("file:///a.php", &sample_tree());
        assert!(!index.is_empty());

        index.remove_file("file:///a.php");
        assert!(index.is_empty());
        assert!(index.search("fooclass", 10).is_empty());
    }

    #[test]
    fn test_readd_replaces_previous_entries() {
        let mut index = SearchIndex::new();
        index.add_file("file:///a.php", &sample_tree());

        let mut file = symbol(SymbolKind::File, "file:///a.php");
        file.children.push(symbol(SymbolKind::Class, "Renamed"));
        index.add_file("file:///a.php", &file);

        assert!(index.search("myfooclass", 10).is_empty());
        assert_eq!(index.search("renamed", 10).len(), 1);
    }

    #[test]
    fn test_variables_and_anonymous_are_not_indexed() {
        let mut file = symbol(SymbolKind::File, "file:///b.php");
        let mut func = symbol(SymbolKind::Function, "f");
        func.children.push(symbol(SymbolKind::Variable, "$local"));
        let mut anon = symbol(SymbolKind::Class, "#anon#b.php#10");
        anon.modifiers |= crate::types::SymbolModifiers::ANONYMOUS;
        file.children.push(func);
        file.children.push(anon);

        let mut index = SearchIndex::new();
        index.add_file("file:///b.php", &file);

        assert!(index.search("local", 10).is_empty());
        assert!(index.search("anon", 10).is_empty());
        assert_eq!(index.search("f", 10).len(), 1);
    }
}
