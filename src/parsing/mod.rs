pub mod docblock;
pub mod parser;
pub mod resolution;
pub mod transform;
pub mod type_string;
pub mod walker;

pub use docblock::DocBlock;
pub use parser::{ParsedDocument, PhpParseError, PhpParser};
pub use resolution::{NameKind, NameResolver, UseRule};
pub use walker::CancellationFlag;
