use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Windowing parameters for [`crate::chunking::chunk_text`].
///
/// Defaults match the sizes the rest of the system assumes for prose
/// documents: ~2.8k-char windows with a 400-char overlap, and tails under
/// 300 chars folded into the previous window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChunkParams {
    pub max_chars: usize,
    pub overlap_chars: usize,
    pub min_tail_merge: usize,
}

impl Default for ChunkParams {
    fn default() -> Self {
        Self {
            max_chars: 2_800,
            overlap_chars: 400,
            min_tail_merge: 300,
        }
    }
}

/// Caller-supplied retrieval policy. Deliberately carries no defaults;
/// each entry point (CLI, server) owns its own.
#[derive(Debug, Clone, Copy)]
pub struct RetrievalParams {
    /// Number of nearest neighbors to request, clamped to collection size.
    pub k: usize,
    /// Maximum cosine distance for a neighbor to count as relevant.
    pub threshold: f32,
    /// Include the single best neighbor even above the threshold when
    /// nothing qualifies, tagged as low-confidence.
    pub fallback_if_empty: bool,
}

/// The aligned columns committed to the vector store in one upsert.
/// Row `i` of every column describes the same fragment.
#[derive(Debug, Clone)]
pub struct FragmentBatch {
    pub ids: Vec<String>,
    pub contents: Vec<String>,
    pub embeddings: Vec<Vec<f32>>,
    pub metadata: Vec<FragmentMeta>,
}

impl FragmentBatch {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Provenance metadata stored alongside each fragment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FragmentMeta {
    pub source: String,
    pub chunk: usize,
}

/// A ranked nearest neighbor as returned by the vector store.
#[derive(Debug, Clone)]
pub struct Neighbor {
    pub id: String,
    pub content: String,
    pub source: String,
    pub index: Option<u64>,
    /// Cosine distance; `None` when the store reported no distance.
    pub distance: Option<f32>,
}

impl Neighbor {
    /// Provenance tag in `[source#index]` form.
    pub fn tag(&self) -> String {
        match self.index {
            Some(index) => format!("[{}#{}]", self.source, index),
            None => format!("[{}#?]", self.source),
        }
    }
}

/// Assembled context for one query. Ephemeral; never persisted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RetrievalResult {
    /// Tagged fragment texts joined by blank lines, nearest first.
    pub context: String,
    /// One provenance tag per included fragment, in context order.
    pub citations: Vec<String>,
    pub used_count: usize,
}

/// Outcome of replacing one source's fragments.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub source: String,
    pub chunks_written: usize,
    /// Collection total across all sources, read back after the upsert.
    pub total_after: usize,
    pub ingested_at: DateTime<Utc>,
}

/// Outcome of a full folder sweep.
#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub files: usize,
    pub chunks: usize,
    pub total_after: usize,
}

/// Fragment count for a single source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceCount {
    pub source: String,
    pub chunks: usize,
}

#[cfg(test)]
mod tests {
    use super::Neighbor;

    #[test]
    fn neighbor_tag_includes_source_and_index() {
        let neighbor = Neighbor {
            id: "id".to_string(),
            content: "text".to_string(),
            source: "manual.pdf".to_string(),
            index: Some(3),
            distance: Some(0.2),
        };
        assert_eq!(neighbor.tag(), "[manual.pdf#3]");
    }

    #[test]
    fn neighbor_tag_marks_unknown_index() {
        let neighbor = Neighbor {
            id: "id".to_string(),
            content: "text".to_string(),
            source: "manual.pdf".to_string(),
            index: None,
            distance: None,
        };
        assert_eq!(neighbor.tag(), "[manual.pdf#?]");
    }
}
