//! Retrieval orchestrator.
//!
//! Classifies the question, widens retrieval for complex questions, searches
//! the vector store with every expanded query variant, merges the hits, and
//! hands a citation-annotated context to the generator.

use std::sync::Arc;

use serde::Serialize;

use super::analyzer::{QueryAnalysis, QueryAnalyzer, UserLevel};
use super::context_builder::{self, SourceRef};
use super::prompt;
use super::store::{SearchHit, VectorStore};
use crate::core::errors::ApiError;
use crate::embedding::Embedder;
use crate::llm::{GenerationRequest, GeneratorService};

const NO_RELEVANT_INFORMATION: &str =
    "I couldn't find any relevant information in the uploaded documents.";

#[derive(Debug, Clone, Serialize)]
pub struct QueryMetadata {
    pub chunks_retrieved: usize,
    pub question: String,
    pub query_analysis: QueryAnalysis,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    pub answer: String,
    pub sources: Vec<SourceRef>,
    pub metadata: QueryMetadata,
}

#[derive(Clone)]
pub struct RagService {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    generator: GeneratorService,
    analyzer: Arc<QueryAnalyzer>,
    top_k: usize,
    top_k_complex: usize,
}

impl RagService {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        generator: GeneratorService,
        analyzer: Arc<QueryAnalyzer>,
        top_k: usize,
        top_k_complex: usize,
    ) -> Self {
        Self {
            store,
            embedder,
            generator,
            analyzer,
            top_k,
            top_k_complex,
        }
    }

    pub async fn answer(&self, question: &str, tenant_id: &str) -> Result<QueryOutcome, ApiError> {
        let analysis = self.analyzer.analyze(question);
        let is_complex = analysis.is_complex();
        let width = if is_complex { self.top_k_complex } else { self.top_k };

        tracing::debug!(
            "Query for tenant {}: complex={} width={}",
            tenant_id,
            is_complex,
            width
        );

        let hits = self.retrieve(question, width, tenant_id).await?;

        if hits.is_empty() {
            let answer = if analysis.needs_explanation && !analysis.key_terms.is_empty() {
                let request = GenerationRequest::new(
                    prompt::compose_general_fallback(question, &analysis.key_terms),
                    temperature_for(&analysis, is_complex),
                    max_tokens_for(&analysis, is_complex),
                );
                self.generator.generate(&request).await?
            } else {
                NO_RELEVANT_INFORMATION.to_string()
            };

            return Ok(QueryOutcome {
                answer,
                sources: Vec::new(),
                metadata: QueryMetadata {
                    chunks_retrieved: 0,
                    question: question.to_string(),
                    query_analysis: analysis,
                },
            });
        }

        let context = context_builder::build_query_context(&hits);
        let request = GenerationRequest::new(
            prompt::compose(question, &context.text, &analysis),
            temperature_for(&analysis, is_complex),
            max_tokens_for(&analysis, is_complex),
        );
        let answer = self.generator.generate(&request).await?;

        Ok(QueryOutcome {
            answer,
            sources: context.sources,
            metadata: QueryMetadata {
                chunks_retrieved: hits.len(),
                question: question.to_string(),
                query_analysis: analysis,
            },
        })
    }

    /// Search once per expanded query variant and merge by record id,
    /// keeping the best distance per record. With a single variant this is
    /// the plain single-query search.
    async fn retrieve(
        &self,
        question: &str,
        width: usize,
        tenant_id: &str,
    ) -> Result<Vec<SearchHit>, ApiError> {
        let variants = self.analyzer.expand_query(question);

        let mut merged: Vec<SearchHit> = Vec::new();
        for variant in &variants {
            let vector = self.embedder.embed_one(variant).await?;
            for hit in self.store.search(&vector, width, tenant_id, None).await? {
                match merged.iter().position(|seen| seen.id == hit.id) {
                    Some(idx) => {
                        if distance_key(hit.distance) < distance_key(merged[idx].distance) {
                            merged[idx] = hit;
                        }
                    }
                    None => merged.push(hit),
                }
            }
        }

        merged.sort_by(|a, b| {
            distance_key(a.distance)
                .partial_cmp(&distance_key(b.distance))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        merged.truncate(width);
        Ok(merged)
    }
}

fn distance_key(distance: Option<f32>) -> f32 {
    distance.unwrap_or(f32::MAX)
}

fn temperature_for(analysis: &QueryAnalysis, is_complex: bool) -> f64 {
    if is_complex {
        0.2
    } else if analysis.user_level == UserLevel::Beginner {
        0.4
    } else {
        0.3
    }
}

fn max_tokens_for(analysis: &QueryAnalysis, is_complex: bool) -> u32 {
    if analysis.needs_explanation {
        2500
    } else if is_complex {
        2000
    } else {
        1500
    }
}
