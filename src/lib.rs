//! Document intelligence backend: a tenant-scoped RAG pipeline behind an
//! HTTP API. Documents are extracted, chunked, embedded and stored in a
//! vector index; questions are answered from retrieved chunks with source
//! citations, either adaptively or through fixed decision-mode templates.

pub mod auth;
pub mod core;
pub mod decision;
pub mod embedding;
pub mod ingest;
pub mod llm;
pub mod logging;
pub mod rag;
pub mod server;
pub mod state;
