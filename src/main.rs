//! CLI entry point for the PHP symbol indexer.
//!
//! Commands: `index` a file or directory, dump the `symbols` of one file,
//! and `search` an indexed tree by suffix key or acronym.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use walkdir::WalkDir;

use phpdex::{
    CachedDocument, DocumentCache, FileId, ParsedDocument, PhpParser, SearchIndex, Settings,
    Symbol,
};

#[derive(Parser)]
#[command(name = "phpdex", version, about = "PHP symbol extraction and lookup")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a PHP file or directory and report what was found
    Index {
        /// File or directory to index
        path: PathBuf,
        /// Write the document cache after indexing
        #[arg(long)]
        cache: bool,
    },
    /// Print the symbol tree of a single file
    Symbols {
        /// PHP file to parse
        file: PathBuf,
    },
    /// Search indexed symbols by suffix key or acronym
    Search {
        /// File or directory to index before searching
        path: PathBuf,
        /// Query: a name suffix (`fooclass`) or an acronym (`mfc`)
        query: String,
        /// Maximum number of results
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    settings.apply();

    let result = match cli.command {
        Commands::Index { path, cache } => run_index(&path, cache, &settings),
        Commands::Symbols { file } => run_symbols(&file),
        Commands::Search { path, query, limit } => run_search(&path, &query, limit),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Parse every PHP file under `path`, newest file id first.
fn index_tree(path: &Path) -> Result<Vec<(String, ParsedDocument)>, String> {
    let mut parser = PhpParser::new().map_err(|e| e.to_string())?;
    let mut documents = Vec::new();
    let mut next_id: u32 = 1;

    for entry in WalkDir::new(path).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let is_php = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("php") || e.eq_ignore_ascii_case("inc"))
            .unwrap_or(false);
        if !is_php {
            continue;
        }

        let code = std::fs::read_to_string(entry.path())
            .map_err(|e| format!("failed to read {}: {e}", entry.path().display()))?;
        let uri = format!("file://{}", entry.path().display());
        let document = parser.parse(&code, &uri, FileId(next_id));
        phpdex::debug_print!(
            "{uri}: {} symbols, {} references",
            document.symbol.tree_len() - 1,
            document.references.len()
        );
        next_id += 1;
        documents.push((uri, document));
    }

    if documents.is_empty() {
        return Err(format!("no PHP files found under {}", path.display()));
    }
    Ok(documents)
}

fn run_index(path: &Path, write_cache: bool, settings: &Settings) -> Result<(), String> {
    let documents = index_tree(path)?;

    let mut index = SearchIndex::new();
    let mut symbol_count = 0;
    let mut reference_count = 0;
    for (uri, document) in &documents {
        index.add_file(uri, &document.symbol);
        symbol_count += document.symbol.tree_len() - 1;
        reference_count += document.references.len();
    }

    println!(
        "Indexed {} file(s): {} symbols, {} references, {} searchable entries",
        documents.len(),
        symbol_count,
        reference_count,
        index.len()
    );

    if write_cache {
        let cache_path = settings.cache_path();
        if let Some(parent) = cache_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("failed to create {}: {e}", parent.display()))?;
        }
        let cached: Vec<(String, CachedDocument)> = documents
            .into_iter()
            .map(|(uri, document)| {
                (
                    uri,
                    CachedDocument {
                        symbol: document.symbol,
                        references: document.references,
                    },
                )
            })
            .collect();
        DocumentCache::build(&cache_path, cached.iter().map(|(u, d)| (u.as_str(), d)))
            .map_err(|e| format!("failed to write cache: {e}"))?;
        println!("Wrote document cache to {}", cache_path.display());
    }

    Ok(())
}

fn run_symbols(file: &Path) -> Result<(), String> {
    let code = std::fs::read_to_string(file)
        .map_err(|e| format!("failed to read {}: {e}", file.display()))?;
    let uri = format!("file://{}", file.display());

    let mut parser = PhpParser::new().map_err(|e| e.to_string())?;
    let document = parser.parse(&code, &uri, FileId(1));

    print_symbol(&document.symbol, 0);
    println!("{} reference(s)", document.references.len());
    Ok(())
}

fn print_symbol(symbol: &Symbol, depth: usize) {
    let indent = "  ".repeat(depth);
    let type_hint = symbol
        .type_hint
        .as_deref()
        .map(|t| format!(": {t}"))
        .unwrap_or_default();
    println!(
        "{indent}{} {}{} [line {}]",
        symbol.kind,
        symbol.name,
        type_hint,
        symbol.location.range.start_line + 1
    );
    for child in &symbol.children {
        print_symbol(child, depth + 1);
    }
}

fn run_search(path: &Path, query: &str, limit: usize) -> Result<(), String> {
    let documents = index_tree(path)?;
    let mut index = SearchIndex::new();
    for (uri, document) in &documents {
        index.add_file(uri, &document.symbol);
    }

    let hits = index.search(query, limit);
    if hits.is_empty() {
        println!("No symbols match '{query}'");
        return Ok(());
    }
    for entry in hits {
        let scope = if entry.scope.is_empty() {
            String::new()
        } else {
            format!(" (in {})", entry.scope)
        };
        println!(
            "{} {}{} at {}:{}",
            entry.kind,
            entry.name,
            scope,
            entry.uri,
            entry.location.range.start_line + 1
        );
    }
    Ok(())
}
