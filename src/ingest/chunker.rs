//! Fixed-width sliding-window chunker.
//!
//! Splits extracted text into overlapping windows over character offsets.
//! Chunks of one document, ordered by index, cover the full source text;
//! chunk n+1 starts at chunk n's end minus the overlap width.

use serde::{Deserialize, Serialize};

use crate::core::config::Settings;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Window size in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive windows, must be smaller than the window.
    pub chunk_overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Caller-supplied metadata inherited by every chunk of a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub filename: String,
    pub tenant_id: String,
    pub file_type: String,
    pub source_char_count: usize,
}

/// A contiguous slice of a source document's extracted text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    /// 0-based, sequential within the document.
    pub chunk_index: usize,
    /// Character offsets into the source text.
    pub start_offset: usize,
    pub end_offset: usize,
    pub filename: String,
    pub tenant_id: String,
    pub file_type: String,
    pub source_char_count: usize,
}

pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(ChunkerConfig {
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap,
        })
    }

    /// Split `text` into overlapping windows. Empty text yields no chunks;
    /// text no longer than one window yields exactly one chunk.
    pub fn chunk(&self, text: &str, meta: &DocumentMeta) -> Vec<Chunk> {
        let window = self.config.chunk_size;
        let step = window.saturating_sub(self.config.chunk_overlap).max(1);

        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();

        let mut chunks = Vec::new();
        if total == 0 {
            return chunks;
        }

        let mut start = 0;
        let mut chunk_index = 0;

        loop {
            let end = (start + window).min(total);
            chunks.push(Chunk {
                text: chars[start..end].iter().collect(),
                chunk_index,
                start_offset: start,
                end_offset: end,
                filename: meta.filename.clone(),
                tenant_id: meta.tenant_id.clone(),
                file_type: meta.file_type.clone(),
                source_char_count: meta.source_char_count,
            });

            if end >= total {
                break;
            }
            start += step;
            chunk_index += 1;
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> DocumentMeta {
        DocumentMeta {
            filename: "doc.txt".to_string(),
            tenant_id: "default".to_string(),
            file_type: ".txt".to_string(),
            source_char_count: 0,
        }
    }

    fn chunker(size: usize, overlap: usize) -> Chunker {
        Chunker::new(ChunkerConfig {
            chunk_size: size,
            chunk_overlap: overlap,
        })
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunker(1000, 200).chunk("", &meta()).is_empty());
    }

    #[test]
    fn short_text_yields_single_chunk() {
        let text = "a".repeat(1000);
        let chunks = chunker(1000, 200).chunk(&text, &meta());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text);
        assert_eq!(chunks[0].start_offset, 0);
        assert_eq!(chunks[0].end_offset, 1000);
    }

    #[test]
    fn windows_advance_by_size_minus_overlap() {
        let text = "x".repeat(2500);
        let chunks = chunker(1000, 200).chunk(&text, &meta());

        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i);
            assert_eq!(chunk.start_offset, i * 800);
        }
        // Consecutive chunks overlap by exactly the overlap width.
        for pair in chunks.windows(2) {
            assert_eq!(pair[1].start_offset, pair[0].end_offset - 200);
        }
        // Full coverage: last chunk reaches the end of the text.
        assert_eq!(chunks.last().unwrap().end_offset, 2500);
    }

    #[test]
    fn final_chunk_may_be_shorter() {
        let chunks = chunker(1000, 200).chunk(&"y".repeat(1100), &meta());
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text.chars().count(), 1000);
        assert_eq!(chunks[1].start_offset, 800);
        assert_eq!(chunks[1].end_offset, 1100);
        assert_eq!(chunks[1].text.chars().count(), 300);
    }

    #[test]
    fn offsets_are_characters_not_bytes() {
        let text = "é".repeat(150);
        let chunks = chunker(100, 20).chunk(&text, &meta());
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text.chars().count(), 100);
        assert_eq!(chunks[1].start_offset, 80);
        assert_eq!(chunks[1].end_offset, 150);
    }

    #[test]
    fn chunks_inherit_document_metadata() {
        let mut m = meta();
        m.filename = "report.md".to_string();
        m.tenant_id = "acme".to_string();
        m.file_type = ".md".to_string();
        m.source_char_count = 42;

        let chunks = chunker(10, 2).chunk("hello world again", &m);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert_eq!(chunk.filename, "report.md");
            assert_eq!(chunk.tenant_id, "acme");
            assert_eq!(chunk.file_type, ".md");
            assert_eq!(chunk.source_char_count, 42);
        }
    }
}
