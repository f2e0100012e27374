use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::auth::{GoogleTokenVerifier, TokenVerifier};
use crate::core::config::Settings;
use crate::decision::DecisionService;
use crate::embedding::{Embedder, HttpEmbedder};
use crate::ingest::{Chunker, PlainTextExtractor, TextExtractor};
use crate::llm::openai::OpenAiChatProvider;
use crate::llm::{ChatProvider, GeneratorService};
use crate::rag::{QueryAnalyzer, RagService, SqliteVectorStore, VectorStore};

/// Process-wide state: every shared component is constructed exactly once
/// here and injected into the services that need it.
#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub store: Arc<dyn VectorStore>,
    pub embedder: Arc<dyn Embedder>,
    pub extractor: Arc<dyn TextExtractor>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub chunker: Arc<Chunker>,
    pub rag: RagService,
    pub decision: DecisionService,
    #[allow(dead_code)]
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub async fn initialize() -> anyhow::Result<Arc<Self>> {
        let settings = Settings::from_env();
        let embedder = Arc::new(HttpEmbedder::from_settings(&settings));
        let provider = Arc::new(OpenAiChatProvider::from_settings(&settings));
        Self::assemble(
            settings,
            embedder,
            provider,
            Arc::new(PlainTextExtractor),
            Arc::new(GoogleTokenVerifier::new()),
        )
        .await
    }

    /// Wire the services from explicit components. Production wiring goes
    /// through [`AppState::initialize`]; tests inject their own embedder,
    /// provider or verifier here.
    pub async fn assemble(
        settings: Settings,
        embedder: Arc<dyn Embedder>,
        provider: Arc<dyn ChatProvider>,
        extractor: Arc<dyn TextExtractor>,
        verifier: Arc<dyn TokenVerifier>,
    ) -> anyhow::Result<Arc<Self>> {
        let _ = std::fs::create_dir_all(&settings.data_dir);

        let store: Arc<dyn VectorStore> =
            Arc::new(SqliteVectorStore::open(&settings.vector_db_path).await?);
        let chunker = Arc::new(Chunker::from_settings(&settings));
        let analyzer = Arc::new(QueryAnalyzer::new());
        let generator = GeneratorService::new(provider, settings.generator_models.clone());

        let rag = RagService::new(
            store.clone(),
            embedder.clone(),
            generator.clone(),
            analyzer,
            settings.top_k,
            settings.top_k_complex,
        );
        let decision = DecisionService::new(
            store.clone(),
            embedder.clone(),
            generator,
            settings.top_k_complex,
        );

        Ok(Arc::new(AppState {
            settings,
            store,
            embedder,
            extractor,
            verifier,
            chunker,
            rag,
            decision,
            started_at: Utc::now(),
        }))
    }
}
