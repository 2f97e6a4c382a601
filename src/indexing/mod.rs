pub mod search;

pub use search::{IndexEntry, SearchIndex};
