//! Decision mode: fixed analytical templates over the retrieval pipeline.
//!
//! Unlike the adaptive query path, decision mode always retrieves at the
//! complex width and renders one of four fixed templates. Output leans
//! structured, so generation runs cold.

use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

use crate::core::errors::ApiError;
use crate::embedding::Embedder;
use crate::llm::{GenerationRequest, GeneratorService};
use crate::rag::context_builder;
use crate::rag::store::VectorStore;

const NO_RELEVANT_INFORMATION: &str = "No relevant information found in documents.";

const DECISION_TEMPERATURE: f64 = 0.2;
const DECISION_MAX_TOKENS: u32 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionMode {
    RiskAnalysis,
    RevenueAnalysis,
    ClauseExtraction,
    Summary,
}

impl DecisionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionMode::RiskAnalysis => "risk_analysis",
            DecisionMode::RevenueAnalysis => "revenue_analysis",
            DecisionMode::ClauseExtraction => "clause_extraction",
            DecisionMode::Summary => "summary",
        }
    }
}

impl FromStr for DecisionMode {
    type Err = ApiError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "risk_analysis" => Ok(DecisionMode::RiskAnalysis),
            "revenue_analysis" => Ok(DecisionMode::RevenueAnalysis),
            "clause_extraction" => Ok(DecisionMode::ClauseExtraction),
            "summary" => Ok(DecisionMode::Summary),
            other => Err(ApiError::BadRequest(format!(
                "invalid mode '{}'; valid modes: risk_analysis, revenue_analysis, clause_extraction, summary",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DecisionData {
    /// Deduped filenames of the analyzed chunks, first-seen order.
    pub sources: Vec<String>,
    pub chunks_analyzed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DecisionMetadata {
    pub mode: DecisionMode,
    pub sources_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DecisionOutcome {
    pub mode: DecisionMode,
    pub result: String,
    pub structured_data: Option<DecisionData>,
    pub metadata: DecisionMetadata,
}

#[derive(Clone)]
pub struct DecisionService {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    generator: GeneratorService,
    top_k_complex: usize,
}

impl DecisionService {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        generator: GeneratorService,
        top_k_complex: usize,
    ) -> Self {
        Self {
            store,
            embedder,
            generator,
            top_k_complex,
        }
    }

    pub async fn decide(
        &self,
        query: &str,
        mode: DecisionMode,
        tenant_id: &str,
    ) -> Result<DecisionOutcome, ApiError> {
        let vector = self.embedder.embed_one(query).await?;
        let hits = self
            .store
            .search(&vector, self.top_k_complex, tenant_id, None)
            .await?;

        if hits.is_empty() {
            return Ok(DecisionOutcome {
                mode,
                result: NO_RELEVANT_INFORMATION.to_string(),
                structured_data: None,
                metadata: DecisionMetadata {
                    mode,
                    sources_count: 0,
                },
            });
        }

        let context = context_builder::build_decision_context(&hits);
        let request = GenerationRequest::new(
            render_template(mode, query, &context),
            DECISION_TEMPERATURE,
            DECISION_MAX_TOKENS,
        );
        let result = self.generator.generate(&request).await?;

        let mut sources: Vec<String> = Vec::new();
        for hit in &hits {
            if !sources.contains(&hit.metadata.filename) {
                sources.push(hit.metadata.filename.clone());
            }
        }
        let sources_count = sources.len();

        Ok(DecisionOutcome {
            mode,
            result,
            structured_data: Some(DecisionData {
                sources,
                chunks_analyzed: hits.len(),
            }),
            metadata: DecisionMetadata {
                mode,
                sources_count,
            },
        })
    }
}

fn render_template(mode: DecisionMode, query: &str, context: &str) -> String {
    match mode {
        DecisionMode::RiskAnalysis => format!(
            "Analyze the following document context and identify all risks, liabilities, and potential issues.

Context:
{context}

Query: {query}

Provide a structured analysis with:
1. List of identified risks (with severity: High/Medium/Low)
2. Description of each risk
3. Affected parties or areas
4. Potential impact
5. Recommendations (if applicable)

Format your response clearly with numbered items."
        ),
        DecisionMode::RevenueAnalysis => format!(
            "Analyze the following document context for revenue trends, financial performance, and business metrics.

Context:
{context}

Query: {query}

Provide a structured analysis with:
1. Revenue trends (increasing/decreasing/stable)
2. Key factors affecting revenue
3. Specific numbers or percentages mentioned, with the calculation steps shown for any derived figure
4. Time periods covered
5. Recommendations or insights

Format your response clearly with numbered items."
        ),
        DecisionMode::ClauseExtraction => format!(
            "Extract all legal clauses, obligations, deadlines, and important terms from the following document context.

Context:
{context}

Query: {query}

Provide a structured extraction with:
1. Clause type (e.g., Payment Terms, Termination, Liability, etc.)
2. Description of the clause
3. Parties involved
4. Deadlines or dates (if any)
5. Key obligations or requirements

Format your response clearly with numbered items."
        ),
        DecisionMode::Summary => format!(
            "Provide a comprehensive executive summary of the following document context.

Context:
{context}

Query: {query}

Create a summary that includes:
1. Main topics and themes
2. Key points and findings
3. Important numbers or statistics
4. Conclusions or recommendations
5. Action items (if any)

Format your response clearly with numbered sections."
        ),
    }
}
