//! Document ingestion: text extraction and chunking.

pub mod chunker;
pub mod extract;

pub use chunker::{Chunk, Chunker, ChunkerConfig, DocumentMeta};
pub use extract::{extension_of, PlainTextExtractor, TextExtractor};
