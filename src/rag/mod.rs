//! Retrieval-augmented generation pipeline.
//!
//! - `analyzer`: pure query analysis (type, intent, level, key terms)
//! - `store`: vector store abstraction; `sqlite` is the backend
//! - `context_builder`: citation-numbered context blocks from search hits
//! - `prompt`: instruction template selection
//! - `service`: the retrieval orchestrator tying it all together

pub mod analyzer;
pub mod context_builder;
pub mod prompt;
pub mod service;
pub mod sqlite;
pub mod store;

pub use analyzer::{QueryAnalysis, QueryAnalyzer};
pub use service::RagService;
pub use sqlite::SqliteVectorStore;
pub use store::{SearchHit, VectorStore};
