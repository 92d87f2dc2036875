use crate::error::IngestError;
use crate::models::ChunkParams;

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits `text` into overlapping windows of `max_chars` characters.
///
/// A window of width `max_chars` advances with stride
/// `max_chars - overlap_chars`; every slice is trimmed. A trimmed tail
/// shorter than `min_tail_merge` is folded into the previous window so the
/// last fragment never carries too little signal to embed. Slices that trim
/// to nothing are dropped. Output depends only on the inputs; the same text
/// and parameters always produce the same windows, which is what makes
/// re-ingestion an idempotent replace.
///
/// Windows are measured in `char`s, never bytes, so multi-byte text is
/// sliced on character boundaries.
pub fn chunk_text(text: &str, params: &ChunkParams) -> Result<Vec<String>, IngestError> {
    if text.is_empty() {
        return Ok(Vec::new());
    }

    if params.max_chars == 0 || params.overlap_chars >= params.max_chars {
        return Err(IngestError::InvalidChunkParams(format!(
            "max_chars={} overlap_chars={} (need max_chars > 0 and overlap_chars < max_chars)",
            params.max_chars, params.overlap_chars
        )));
    }

    let chars: Vec<char> = text.chars().collect();
    let step = params.max_chars - params.overlap_chars;
    let mut chunks: Vec<String> = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + params.max_chars).min(chars.len());
        let window: String = chars[start..end].iter().collect();
        chunks.push(window.trim().to_string());
        start += step;
    }

    if chunks.len() >= 2 && chunks[chunks.len() - 1].chars().count() < params.min_tail_merge {
        if let Some(tail) = chunks.pop() {
            if let Some(previous) = chunks.last_mut() {
                *previous = format!("{previous} {tail}").trim().to_string();
            }
        }
    }

    Ok(chunks.into_iter().filter(|chunk| !chunk.is_empty()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(max_chars: usize, overlap_chars: usize, min_tail_merge: usize) -> ChunkParams {
        ChunkParams {
            max_chars,
            overlap_chars,
            min_tail_merge,
        }
    }

    #[test]
    fn whitespace_is_normalized() {
        let input = "A  \t  lot\nof   spacing";
        assert_eq!(normalize_whitespace(input), "A lot of spacing");
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        let chunks = chunk_text("", &params(100, 10, 5)).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn zero_max_chars_is_rejected() {
        let result = chunk_text("x", &params(0, 0, 0));
        assert!(matches!(result, Err(IngestError::InvalidChunkParams(_))));
    }

    #[test]
    fn overlap_equal_to_width_is_rejected() {
        let result = chunk_text("x", &params(10, 10, 0));
        assert!(matches!(result, Err(IngestError::InvalidChunkParams(_))));
    }

    #[test]
    fn zero_overlap_tiles_disjointly() {
        let chunks = chunk_text("abcdef", &params(2, 0, 0)).unwrap();
        assert_eq!(chunks, vec!["ab", "cd", "ef"]);
    }

    #[test]
    fn short_text_yields_single_chunk() {
        let chunks = chunk_text("hello world", &params(100, 10, 5)).unwrap();
        assert_eq!(chunks, vec!["hello world"]);
    }

    #[test]
    fn long_tail_is_kept_standalone() {
        let text = "a".repeat(2_900);
        let chunks = chunk_text(&text, &params(2_800, 400, 300)).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 2_800);
        assert_eq!(chunks[1].len(), 500);
    }

    #[test]
    fn short_tail_merges_into_previous_chunk() {
        let text = "a".repeat(2_500);
        let chunks = chunk_text(&text, &params(2_800, 400, 300)).unwrap();
        assert_eq!(chunks.len(), 1);
        // window one (2500) + space + tail window (100)
        assert_eq!(chunks[0].len(), 2_601);
    }

    #[test]
    fn consecutive_windows_overlap() {
        let text: String = ('a'..='z').cycle().take(30).collect();
        let chunks = chunk_text(&text, &params(20, 5, 0)).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(&chunks[0][15..20], &chunks[1][..5]);
    }

    #[test]
    fn whitespace_only_windows_are_dropped() {
        let text = format!("{}{}", "a".repeat(4), " ".repeat(8));
        let chunks = chunk_text(&text, &params(4, 0, 0)).unwrap();
        assert_eq!(chunks, vec!["aaaa"]);
    }

    #[test]
    fn chunking_is_deterministic() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(40);
        let first = chunk_text(&text, &params(120, 30, 20)).unwrap();
        let second = chunk_text(&text, &params(120, 30, 20)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn multibyte_text_is_sliced_on_char_boundaries() {
        let text = "áéíóú".repeat(10);
        let chunks = chunk_text(&text, &params(7, 2, 0)).unwrap();
        assert!(!chunks.is_empty());
        let rejoined: usize = chunks.iter().map(|c| c.chars().count()).sum();
        assert!(rejoined >= text.chars().count());
    }
}
