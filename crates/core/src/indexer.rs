use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::chunking::chunk_text;
use crate::embeddings::Embedder;
use crate::error::IngestError;
use crate::extractor::TextExtractor;
use crate::identity::fragment_id;
use crate::models::{ChunkParams, FragmentBatch, FragmentMeta, IndexStats, IngestReport};
use crate::stores::{DeleteOutcome, VectorStore};

const MIN_SOURCE_CHARS: usize = 3;
const MIN_TEXT_CHARS: usize = 50;
const EMBED_BATCH_SIZE: usize = 16;

/// Replaces one source's fragments with a freshly chunked and embedded set.
///
/// Validation happens before any network call. The prior fragment set for
/// the source is deleted first, so a shrunk or edited document leaves no
/// stale rows behind; absence of prior rows is expected on first ingest.
/// Because ids are content-addressed and chunking is deterministic,
/// repeating the call with unchanged text and parameters rewrites the same
/// rows.
///
/// The source-scoped delete-then-upsert is not atomic: a concurrent
/// retrieval may observe zero or partial fragments for this source while
/// the call is in flight.
pub async fn ingest_text<E, S>(
    source: &str,
    text: &str,
    params: &ChunkParams,
    embedder: &E,
    store: &S,
) -> Result<IngestReport, IngestError>
where
    E: Embedder + ?Sized,
    S: VectorStore + ?Sized,
{
    if source.trim().chars().count() < MIN_SOURCE_CHARS {
        return Err(IngestError::InvalidInput {
            origin: source.to_string(),
            detail: format!("source name shorter than {MIN_SOURCE_CHARS} chars"),
        });
    }

    let trimmed = text.trim();
    if trimmed.chars().count() < MIN_TEXT_CHARS {
        return Err(IngestError::InvalidInput {
            origin: source.to_string(),
            detail: format!("text shorter than {MIN_TEXT_CHARS} chars after trimming"),
        });
    }

    let contents = chunk_text(trimmed, params)?;
    if contents.is_empty() {
        return Err(IngestError::EmptyDocument(source.to_string()));
    }

    match store.delete_source(source).await? {
        DeleteOutcome::Deleted => info!(source, "removed prior fragments before replace"),
        DeleteOutcome::NoPriorFragments => {}
    }

    let ids: Vec<String> = contents
        .iter()
        .enumerate()
        .map(|(index, content)| fragment_id(source, index, content))
        .collect();
    let metadata: Vec<FragmentMeta> = (0..contents.len())
        .map(|index| FragmentMeta {
            source: source.to_string(),
            chunk: index,
        })
        .collect();
    let embeddings = embedder.embed_batch(&contents, EMBED_BATCH_SIZE).await?;

    if ids.len() != contents.len()
        || contents.len() != embeddings.len()
        || embeddings.len() != metadata.len()
    {
        return Err(IngestError::Alignment {
            origin: source.to_string(),
            detail: format!(
                "ids={} documents={} embeddings={} metadatas={}",
                ids.len(),
                contents.len(),
                embeddings.len(),
                metadata.len()
            ),
        });
    }

    let batch = FragmentBatch {
        ids,
        contents,
        embeddings,
        metadata,
    };
    store.upsert(&batch).await?;

    let total_after = store.count().await?.value();
    Ok(IngestReport {
        source: source.to_string(),
        chunks_written: batch.len(),
        total_after,
        ingested_at: Utc::now(),
    })
}

pub fn discover_pdf_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder).into_iter().filter_map(|item| item.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }

        let is_pdf = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if is_pdf {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

/// Sweeps a folder of PDFs and replace-ingests every document that yields
/// usable text. Files whose extraction comes back (near-)empty are skipped
/// with a warning rather than failing the sweep.
pub async fn build_index<X, E, S>(
    docs_dir: &Path,
    params: &ChunkParams,
    extractor: &X,
    embedder: &E,
    store: &S,
) -> Result<IndexStats, IngestError>
where
    X: TextExtractor + ?Sized,
    E: Embedder + ?Sized,
    S: VectorStore + ?Sized,
{
    if !docs_dir.is_dir() {
        return Err(IngestError::InvalidInput {
            origin: docs_dir.display().to_string(),
            detail: "documents directory does not exist".to_string(),
        });
    }

    let files = discover_pdf_files(docs_dir);
    if files.is_empty() {
        return Err(IngestError::InvalidInput {
            origin: docs_dir.display().to_string(),
            detail: "no pdf files found".to_string(),
        });
    }

    let mut chunks_written = 0;
    for path in &files {
        let source = file_source_name(path);
        info!(file = %path.display(), "extracting text");
        let text = extractor.extract_text(path);

        if text.trim().chars().count() < MIN_TEXT_CHARS {
            warn!(file = %path.display(), "skipping: no usable text");
            continue;
        }

        let report = ingest_text(&source, &text, params, embedder, store).await?;
        info!(source = %report.source, chunks = report.chunks_written, "indexed");
        chunks_written += report.chunks_written;
    }

    let total_after = store.count().await?.value();
    Ok(IndexStats {
        files: files.len(),
        chunks: chunks_written,
        total_after,
    })
}

fn file_source_name(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}
