pub mod document_cache;

pub use document_cache::{CachedDocument, ConcurrentDocumentCache, DocumentCache};
