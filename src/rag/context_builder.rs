//! Context assembly from search hits.
//!
//! Groups hits by source document (first-seen order, similarity order kept
//! within each group), assigns global source numbers, and renders the
//! citation-annotated context block fed to the prompt composer. The source
//! list handed back to the caller uses the same numbering as the context,
//! so citations in the answer line up with the reported sources.

use serde::Serialize;

use super::store::SearchHit;

const PREVIEW_CHARS: usize = 200;

/// A citation entry for one retrieved chunk.
#[derive(Debug, Clone, Serialize)]
pub struct SourceRef {
    /// 1-based, matches the numbering inside the context block.
    pub source_id: usize,
    pub filename: String,
    pub chunk_id: usize,
    pub text_preview: String,
    pub relevance_score: Option<f32>,
}

/// Context block plus the matching source list.
#[derive(Debug, Clone)]
pub struct QueryContext {
    pub text: String,
    pub sources: Vec<SourceRef>,
}

/// Group hits by filename, preserving first-seen document order and the
/// similarity order within each document.
pub fn group_by_filename(hits: &[SearchHit]) -> Vec<(String, Vec<&SearchHit>)> {
    let mut groups: Vec<(String, Vec<&SearchHit>)> = Vec::new();
    for hit in hits {
        match groups.iter().position(|(name, _)| *name == hit.metadata.filename) {
            Some(idx) => groups[idx].1.push(hit),
            None => groups.push((hit.metadata.filename.clone(), vec![hit])),
        }
    }
    groups
}

/// Render the labeled context block for the adaptive query path and the
/// source list sharing its numbering.
pub fn build_query_context(hits: &[SearchHit]) -> QueryContext {
    let mut parts = Vec::new();
    let mut sources = Vec::new();
    let mut source_counter = 1;

    for (filename, group) in group_by_filename(hits) {
        parts.push(format!("\n=== Document: {} ===\n", filename));
        for hit in group {
            parts.push(format!(
                "[Source {} - {}]\n{}\n",
                source_counter, filename, hit.text
            ));
            sources.push(SourceRef {
                source_id: source_counter,
                filename: filename.clone(),
                chunk_id: hit.metadata.chunk_index,
                text_preview: preview(&hit.text),
                relevance_score: hit.relevance_score(),
            });
            source_counter += 1;
        }
    }

    QueryContext {
        text: parts.join("\n"),
        sources,
    }
}

/// Decision-mode context: chunks labeled by filename only, no numbering.
pub fn build_decision_context(hits: &[SearchHit]) -> String {
    let mut parts = Vec::new();
    for (filename, group) in group_by_filename(hits) {
        for hit in group {
            parts.push(format!("[{}]\n{}\n", filename, hit.text));
        }
    }
    parts.join("\n")
}

fn preview(text: &str) -> String {
    let head: String = text.chars().take(PREVIEW_CHARS).collect();
    format!("{}...", head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::store::ChunkMetadata;

    fn hit(filename: &str, chunk_index: usize, text: &str, distance: f32) -> SearchHit {
        SearchHit {
            id: format!("{}-{}", filename, chunk_index),
            text: text.to_string(),
            metadata: ChunkMetadata {
                filename: filename.to_string(),
                chunk_index,
                start_offset: 0,
                end_offset: text.chars().count(),
                file_type: ".txt".to_string(),
                source_char_count: 0,
            },
            distance: Some(distance),
        }
    }

    #[test]
    fn groups_preserve_first_seen_document_order() {
        let hits = vec![
            hit("b.txt", 0, "beta", 0.1),
            hit("a.txt", 0, "alpha", 0.2),
            hit("b.txt", 1, "beta two", 0.3),
        ];

        let groups = group_by_filename(&hits);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "b.txt");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, "a.txt");
    }

    #[test]
    fn context_numbers_sources_globally_across_groups() {
        let hits = vec![
            hit("b.txt", 0, "beta", 0.1),
            hit("a.txt", 0, "alpha", 0.2),
            hit("b.txt", 1, "beta two", 0.3),
        ];

        let ctx = build_query_context(&hits);
        assert!(ctx.text.contains("=== Document: b.txt ==="));
        assert!(ctx.text.contains("=== Document: a.txt ==="));
        assert!(ctx.text.contains("[Source 1 - b.txt]\nbeta"));
        assert!(ctx.text.contains("[Source 2 - b.txt]\nbeta two"));
        assert!(ctx.text.contains("[Source 3 - a.txt]\nalpha"));

        let ids: Vec<usize> = ctx.sources.iter().map(|s| s.source_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        // Source list follows the grouped order the context uses.
        assert_eq!(ctx.sources[1].filename, "b.txt");
        assert_eq!(ctx.sources[1].chunk_id, 1);
        assert_eq!(ctx.sources[2].filename, "a.txt");
    }

    #[test]
    fn source_refs_carry_preview_and_relevance() {
        let long_text = "z".repeat(500);
        let hits = vec![hit("a.txt", 3, &long_text, 0.25)];

        let ctx = build_query_context(&hits);
        let source = &ctx.sources[0];
        assert_eq!(source.chunk_id, 3);
        assert_eq!(source.text_preview.chars().count(), 203);
        assert!(source.text_preview.ends_with("..."));
        assert!((source.relevance_score.unwrap() - 0.75).abs() < 1e-6);
    }

    #[test]
    fn missing_distance_stays_missing_in_sources() {
        let mut h = hit("a.txt", 0, "text", 0.0);
        h.distance = None;
        let ctx = build_query_context(&[h]);
        assert_eq!(ctx.sources[0].relevance_score, None);
    }

    #[test]
    fn decision_context_labels_by_filename_only() {
        let hits = vec![hit("a.txt", 0, "alpha", 0.1), hit("b.txt", 0, "beta", 0.2)];
        let ctx = build_decision_context(&hits);
        assert!(ctx.contains("[a.txt]\nalpha"));
        assert!(ctx.contains("[b.txt]\nbeta"));
        assert!(!ctx.contains("Source 1"));
    }

    #[test]
    fn empty_hits_yield_empty_context() {
        let ctx = build_query_context(&[]);
        assert!(ctx.text.is_empty());
        assert!(ctx.sources.is_empty());
    }
}
