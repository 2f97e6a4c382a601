//! The PHP symbol-extraction entry point.
//!
//! [`PhpParser`] owns a tree-sitter parser configured for PHP and runs the
//! transformer pass over each parsed document, producing a hierarchical
//! file symbol and the flat reference list.
//!
//! **Tree-sitter ABI version**: ABI-14 (tree-sitter-php 0.23). When
//! upgrading the grammar, verify compatibility with the node kind names the
//! transformer set matches on.

use std::collections::HashMap;

use thiserror::Error;
use tree_sitter::Parser;

use crate::parsing::transform::SymbolPass;
use crate::parsing::walker::{walk_tree, CancellationFlag};
use crate::symbol::{Reference, Symbol};
use crate::types::{FileId, Location, Range, SymbolKind};

/// PHP-specific parsing errors.
#[derive(Error, Debug)]
pub enum PhpParseError {
    #[error(
        "Failed to initialize PHP parser: {reason}\nSuggestion: Ensure tree-sitter-php is properly installed and the version matches Cargo.toml"
    )]
    ParserInitFailed { reason: String },
}

/// Everything the symbol pass produces for one document.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// Root file symbol with every declaration nested under it.
    pub symbol: Symbol,
    /// Every resolved name occurrence, in walk order.
    pub references: Vec<Reference>,
    /// Reference index by tree-sitter node id, for tooling that walks the
    /// tree and wants the reference of the node under the cursor.
    pub node_references: HashMap<usize, usize>,
}

impl ParsedDocument {
    /// An empty document result, used when the parser yields no tree.
    fn empty(uri: &str, file_id: FileId) -> Self {
        Self {
            symbol: Symbol::new(
                SymbolKind::File,
                uri,
                Location::new(file_id, Range::default()),
            ),
            references: Vec::new(),
            node_references: HashMap::new(),
        }
    }
}

/// PHP language parser.
pub struct PhpParser {
    parser: Parser,
}

impl std::fmt::Debug for PhpParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhpParser")
            .field("language", &"PHP")
            .finish()
    }
}

impl PhpParser {
    /// Create a new PHP parser instance.
    pub fn new() -> Result<Self, PhpParseError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_php::LANGUAGE_PHP.into())
            .map_err(|e| PhpParseError::ParserInitFailed {
                reason: format!("tree-sitter error: {e}"),
            })?;
        Ok(Self { parser })
    }

    /// Parse PHP source and extract the document's symbols and references.
    ///
    /// Malformed input never fails: the pass extracts what the recovered
    /// tree supports and skips the rest.
    pub fn parse(&mut self, code: &str, uri: &str, file_id: FileId) -> ParsedDocument {
        self.parse_with_cancel(code, uri, file_id, &CancellationFlag::new())
            .unwrap_or_else(|| ParsedDocument::empty(uri, file_id))
    }

    /// Cancellation-aware variant of [`parse`](Self::parse). Returns `None`
    /// when cancelled: the partial symbol tree is discarded and no
    /// references are published.
    pub fn parse_with_cancel(
        &mut self,
        code: &str,
        uri: &str,
        file_id: FileId,
        cancel: &CancellationFlag,
    ) -> Option<ParsedDocument> {
        let tree = self.parser.parse(code, None)?;

        let mut pass = SymbolPass::new(code, uri, file_id);
        if !walk_tree(tree.root_node(), &mut pass, cancel) {
            return None;
        }

        let (symbol, references, node_references) = pass.into_output()?;
        Some(ParsedDocument {
            symbol,
            references,
            node_references,
        })
    }
}
