mod chroma;

pub use chroma::ChromaStore;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{FragmentBatch, Neighbor, SourceCount};

/// Outcome of a source-scoped delete during replace-on-reingest.
/// Absence of prior fragments is expected and acceptable; it is not folded
/// into the error channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NoPriorFragments,
}

/// How the collection total was obtained: from the store's count
/// operation, or derived by enumerating stored ids when that operation is
/// unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionCount {
    Reported(usize),
    Enumerated(usize),
}

impl CollectionCount {
    pub fn value(self) -> usize {
        match self {
            CollectionCount::Reported(count) | CollectionCount::Enumerated(count) => count,
        }
    }
}

/// The persistent fragment collection, keyed by content-addressed id.
///
/// `query` must return neighbors ordered by ascending cosine distance
/// (lower = more similar). The retriever re-sorts in case an
/// implementation cannot guarantee that ordering, but relies on the store
/// for the candidate set itself.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Writes the batch, replacing any rows with the same ids.
    async fn upsert(&self, batch: &FragmentBatch) -> Result<(), StoreError>;

    /// Removes every fragment whose source metadata matches.
    async fn delete_source(&self, source: &str) -> Result<DeleteOutcome, StoreError>;

    /// The `k` nearest neighbors of `vector`, ascending by distance.
    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<Neighbor>, StoreError>;

    /// Total fragments across all sources.
    async fn count(&self) -> Result<CollectionCount, StoreError>;

    /// Per-source fragment counts, largest first.
    async fn source_counts(&self) -> Result<Vec<SourceCount>, StoreError>;
}
