use tracing::debug;

use crate::embeddings::Embedder;
use crate::error::RetrieveError;
use crate::models::{Neighbor, RetrievalParams, RetrievalResult};
use crate::stores::VectorStore;

/// Marker appended to the citation tag of a below-threshold fallback hit,
/// so downstream prompts and UIs can see the degraded confidence.
const LOW_CONFIDENCE_MARKER: &str = " (low_conf)";

/// Builds a provenance-tagged context for `query`.
///
/// Neighbors within the distance threshold are included nearest-first. If
/// none qualify and the fallback is enabled, the single nearest neighbor is
/// included anyway with its tag marked low-confidence, so callers always
/// get some grounding when any indexed material exists. An empty
/// collection short-circuits before the embedding provider is called.
pub async fn retrieve<E, S>(
    query: &str,
    params: &RetrievalParams,
    embedder: &E,
    store: &S,
) -> Result<RetrievalResult, RetrieveError>
where
    E: Embedder + ?Sized,
    S: VectorStore + ?Sized,
{
    let total = store.count().await?.value();
    if total == 0 {
        return Ok(RetrievalResult::default());
    }

    let k = params.k.min(total);
    let query_embedding = embedder.embed(query).await?;
    let mut neighbors = store.query(&query_embedding, k).await?;

    // The store contract says ascending distance; don't rely on it.
    neighbors.sort_by(|a, b| distance_or_max(a).total_cmp(&distance_or_max(b)));

    let mut context_parts = Vec::new();
    let mut citations = Vec::new();

    for neighbor in &neighbors {
        if let Some(distance) = neighbor.distance {
            if distance <= params.threshold {
                let tag = neighbor.tag();
                context_parts.push(format!("{tag} {}", neighbor.content));
                citations.push(tag);
            }
        }
    }

    if citations.is_empty() && params.fallback_if_empty {
        if let Some(best) = neighbors
            .iter()
            .min_by(|a, b| distance_or_max(a).total_cmp(&distance_or_max(b)))
        {
            debug!(
                source = %best.source,
                distance = ?best.distance,
                "no neighbor within threshold, using best available"
            );
            let tag = best.tag();
            context_parts.push(format!("{tag} {}", best.content));
            citations.push(format!("{tag}{LOW_CONFIDENCE_MARKER}"));
        }
    }

    let used_count = context_parts.len();
    Ok(RetrievalResult {
        context: context_parts.join("\n\n"),
        citations,
        used_count,
    })
}

fn distance_or_max(neighbor: &Neighbor) -> f32 {
    neighbor.distance.unwrap_or(f32::INFINITY)
}
