pub mod chunking;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod identity;
pub mod indexer;
pub mod llm;
pub mod models;
pub mod profiles;
pub mod prompts;
pub mod retriever;
pub mod stores;

pub use chunking::{chunk_text, normalize_whitespace};
pub use embeddings::{Embedder, OllamaEmbedder};
pub use error::{ChatError, EmbedError, IngestError, RetrieveError, StoreError};
pub use extractor::{LopdfExtractor, TextExtractor};
pub use identity::fragment_id;
pub use indexer::{build_index, discover_pdf_files, ingest_text};
pub use llm::{ChatClient, OllamaChat};
pub use models::{
    ChunkParams, FragmentBatch, FragmentMeta, IndexStats, IngestReport, Neighbor, RetrievalParams,
    RetrievalResult, SourceCount,
};
pub use profiles::{load_profile, Profile};
pub use prompts::{build_system, build_user, NO_CONTEXT_NOTE};
pub use retriever::retrieve;
pub use stores::{ChromaStore, CollectionCount, DeleteOutcome, VectorStore};
