use lopdf::Document;
use std::path::Path;
use tracing::warn;

use crate::chunking::normalize_whitespace;

/// Best-effort plain-text extraction. Extraction failures degrade to empty
/// text, never to a pipeline error; callers decide whether an empty
/// document is worth reporting.
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, path: &Path) -> String;
}

#[derive(Default)]
pub struct LopdfExtractor;

impl TextExtractor for LopdfExtractor {
    fn extract_text(&self, path: &Path) -> String {
        let document = match Document::load(path) {
            Ok(document) => document,
            Err(error) => {
                warn!(file = %path.display(), %error, "unable to read pdf");
                return String::new();
            }
        };

        let mut pages = Vec::new();
        for (page_no, _object_id) in document.get_pages() {
            match document.extract_text(&[page_no]) {
                Ok(text) => pages.push(normalize_whitespace(&text)),
                Err(error) => {
                    warn!(
                        file = %path.display(),
                        page = page_no,
                        %error,
                        "unable to extract page text"
                    );
                }
            }
        }

        pages.join(" ").trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{LopdfExtractor, TextExtractor};
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    #[test]
    fn missing_file_degrades_to_empty_text() {
        let extractor = LopdfExtractor;
        let text = extractor.extract_text(Path::new("/nonexistent/file.pdf"));
        assert_eq!(text, "");
    }

    #[test]
    fn unreadable_pdf_degrades_to_empty_text() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("broken.pdf");
        fs::write(&path, b"%PDF-1.4\n%not really a pdf")?;

        let extractor = LopdfExtractor;
        assert_eq!(extractor.extract_text(&path), "");
        Ok(())
    }
}
