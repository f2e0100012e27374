//! Environment-sourced application settings.
//!
//! Loaded once at startup by the composition root and shared read-only
//! afterwards. Every knob has a local-development default so the server
//! boots with nothing but `cargo run`.

use std::env;
use std::path::PathBuf;

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Environment name (`local`, `cloud`, `production`).
    pub environment: String,
    pub host: String,
    pub port: u16,
    /// Base directory for uploads, the vector store and logs.
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    /// SQLite file backing the vector store.
    pub vector_db_path: PathBuf,
    /// Allowed upload extensions, lowercased, dot included.
    pub allowed_extensions: Vec<String>,
    /// Upload size ceiling in bytes.
    pub max_file_size: usize,
    /// Chunk window size in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters.
    pub chunk_overlap: usize,
    /// Retrieval width for plain questions.
    pub top_k: usize,
    /// Retrieval width for complex questions and decision mode.
    pub top_k_complex: usize,
    pub cors_allowed_origins: Vec<String>,
    pub generator_api_key: String,
    pub generator_base_url: String,
    /// Ordered completion-model fallback list.
    pub generator_models: Vec<String>,
    pub embedder_base_url: String,
    pub embedder_api_key: Option<String>,
    pub embedder_model: String,
}

impl Settings {
    pub fn from_env() -> Self {
        let data_dir = PathBuf::from(env_or("DATA_DIR", "./data"));
        let log_dir = data_dir.join("logs");
        let vector_db_path = env::var("VECTOR_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("vector_store.db"));

        let chunk_size = env_parse("CHUNK_SIZE", 1000);
        let mut chunk_overlap = env_parse("CHUNK_OVERLAP", 200);
        if chunk_overlap >= chunk_size {
            tracing::warn!(
                "CHUNK_OVERLAP {} must be smaller than CHUNK_SIZE {}; using {}",
                chunk_overlap,
                chunk_size,
                chunk_size / 5
            );
            chunk_overlap = chunk_size / 5;
        }

        Settings {
            environment: env_or("ENVIRONMENT", "local"),
            host: env_or("HOST", "127.0.0.1"),
            port: env_parse("PORT", 8000),
            data_dir,
            log_dir,
            vector_db_path,
            allowed_extensions: split_csv(&env_or("ALLOWED_EXTENSIONS", ".txt,.md")),
            max_file_size: env_parse("MAX_FILE_SIZE", 10 * 1024 * 1024),
            chunk_size,
            chunk_overlap,
            top_k: env_parse("TOP_K_RESULTS", 8),
            top_k_complex: env_parse("TOP_K_COMPLEX", 12),
            cors_allowed_origins: split_csv(&env_or("CORS_ALLOWED_ORIGINS", "")),
            generator_api_key: env_or("GENERATOR_API_KEY", ""),
            generator_base_url: env_or("GENERATOR_BASE_URL", "https://api.groq.com/openai"),
            generator_models: split_csv(&env_or(
                "GENERATOR_MODELS",
                "llama-3.3-70b-versatile,llama-3.1-8b-instant,mixtral-8x7b-32768",
            )),
            embedder_base_url: env_or("EMBEDDER_BASE_URL", "http://127.0.0.1:8090"),
            embedder_api_key: env::var("EMBEDDER_API_KEY").ok().filter(|v| !v.is_empty()),
            embedder_model: env_or("EMBEDDER_MODEL", "all-MiniLM-L6-v2"),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).ok().filter(|v| !v.is_empty()).unwrap_or_else(|| default.to_string())
}

fn env_parse<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|val| val.parse::<T>().ok())
        .unwrap_or(default)
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| item.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_csv_trims_and_lowercases() {
        let parsed = split_csv(" .TXT , .md ,, .PDF ");
        assert_eq!(parsed, vec![".txt", ".md", ".pdf"]);
    }

    #[test]
    fn split_csv_empty_input_yields_no_entries() {
        assert!(split_csv("").is_empty());
    }
}
