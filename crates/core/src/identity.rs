use sha2::{Digest, Sha256};

/// Content-addressed fragment id: sha256 over the source name, the
/// `#`-prefixed fragment index, and the fragment text, in that order.
///
/// The `#` separator cannot appear in a bare index, so distinct
/// `(source, index, content)` triples cannot collide through concatenation
/// ambiguity. The digest has no environment or time dependence; the same
/// triple hashes identically across processes and machines, which lets the
/// vector store treat re-ingested fragments as the same logical row.
pub fn fragment_id(source: &str, index: usize, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update(format!("#{index}").as_bytes());
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::fragment_id;

    #[test]
    fn id_is_stable_across_calls() {
        let first = fragment_id("doc.pdf", 0, "hello");
        let second = fragment_id("doc.pdf", 0, "hello");
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn any_input_change_changes_the_id() {
        let base = fragment_id("doc.pdf", 0, "hello");
        assert_ne!(base, fragment_id("other.pdf", 0, "hello"));
        assert_ne!(base, fragment_id("doc.pdf", 1, "hello"));
        assert_ne!(base, fragment_id("doc.pdf", 0, "hello!"));
    }

    #[test]
    fn index_is_separated_from_source() {
        // "doc1" + #2 must not hash like "doc" + #12.
        assert_ne!(fragment_id("doc1", 2, "x"), fragment_id("doc", 12, "x"));
    }
}
