// file: src/document/model.rs
// description: markdown document model with parsing, validation and normalization
// reference: internal data structures

use crate::document::front_matter::{FrontMatter, MissingFieldError, MixedFormatError};
use crate::error::{Result, SyncError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One parsed markdown article: delimited front matter plus body.
///
/// A `Document` is rebuilt from disk on every run. The only permitted
/// mutation of the source file is `normalize_file`, which rewrites the front
/// matter block into canonical form.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub source_dir: PathBuf,
    pub front_matter: FrontMatter,
    pub body: String,
    raw: String,
}

impl Document {
    pub fn parse(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| SyncError::FileOperation {
            path: path.to_path_buf(),
            source: e,
        })?;

        let source_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let (header, body) = split_front_matter(&raw).ok_or_else(|| SyncError::Parse {
            file: path.display().to_string(),
            message: "No front matter block found".to_string(),
        })?;

        let front_matter = FrontMatter::parse(header).map_err(|line| SyncError::Parse {
            file: path.display().to_string(),
            message: format!("Unparseable front matter line: {}", line),
        })?;

        let document = Self {
            path: path.to_path_buf(),
            source_dir,
            front_matter,
            body: body.trim().to_string(),
            raw,
        };

        if let Some(diagnostic) = document.mixed_format_error() {
            warn!("{}", diagnostic);
        }

        Ok(document)
    }

    /// Absent `draft` counts as draft. Publishing is opt-in: only an explicit
    /// falsy value makes a document eligible.
    pub fn draft(&self) -> bool {
        match self.front_matter.get("draft") {
            Some(value) => value.is_truthy(),
            None => true,
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.front_matter.get("title").and_then(|v| v.as_str())
    }

    pub fn mixed_format_error(&self) -> Option<MixedFormatError> {
        self.front_matter.is_mixed_format().then(|| MixedFormatError {
            file: self.path.display().to_string(),
        })
    }

    pub fn validate(&self, required_fields: &[String]) -> Vec<MissingFieldError> {
        self.front_matter.missing_fields(required_fields)
    }

    /// Canonical-front-matter copy of this document. Idempotent: normalizing
    /// an already-normalized document changes nothing.
    pub fn normalize(&self) -> Self {
        let front_matter = self.front_matter.canonicalize();
        let mut normalized = self.clone();
        normalized.raw = render(&front_matter, &self.body);
        normalized.front_matter = front_matter;
        normalized
    }

    /// Full file content with the front matter in canonical form.
    pub fn normalized_content(&self) -> String {
        render(&self.front_matter.canonicalize(), &self.body)
    }

    /// Rewrite the source file with canonical front matter. Returns whether
    /// the file changed on disk.
    pub fn normalize_file(path: &Path) -> Result<bool> {
        let document = Self::parse(path)?;
        let canonical = document.normalized_content();

        if canonical == document.raw {
            debug!("Already canonical: {}", path.display());
            return Ok(false);
        }

        fs::write(path, &canonical).map_err(|e| SyncError::FileOperation {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(true)
    }
}

fn render(front_matter: &FrontMatter, body: &str) -> String {
    format!("+++\n{}\n+++\n\n{}\n", front_matter.to_canonical(), body)
}

/// Split content into (front matter block, body). Accepts `+++` or `---`
/// delimiters; the opening delimiter must be the first non-empty line.
fn split_front_matter(content: &str) -> Option<(&str, &str)> {
    let trimmed = content.trim_start();
    let delimiter = if trimmed.starts_with("+++") {
        "+++"
    } else if trimmed.starts_with("---") {
        "---"
    } else {
        return None;
    };

    let after_open = &trimmed[delimiter.len()..];
    let close = after_open.find(&format!("\n{}", delimiter))?;
    let header = &after_open[..close];
    let body = &after_open[close + 1 + delimiter.len()..];
    Some((header, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn write_doc(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_parse_plus_delimited() {
        let temp = TempDir::new().unwrap();
        let path = write_doc(
            &temp,
            "post.md",
            "+++\ntitle=\"Hello\"\ndraft=false\n+++\n\n# Body\n",
        );

        let doc = Document::parse(&path).unwrap();
        assert_eq!(doc.title(), Some("Hello"));
        assert!(!doc.draft());
        assert_eq!(doc.body, "# Body");
    }

    #[test]
    fn test_parse_dash_delimited() {
        let temp = TempDir::new().unwrap();
        let path = write_doc(&temp, "post.md", "---\ntitle: Hello\n---\n\nBody text\n");

        let doc = Document::parse(&path).unwrap();
        assert_eq!(doc.title(), Some("Hello"));
    }

    #[test]
    fn test_no_front_matter_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = write_doc(&temp, "post.md", "# Just a heading\n");

        let err = Document::parse(&path).unwrap_err();
        assert!(matches!(err, SyncError::Parse { .. }));
    }

    #[test]
    fn test_missing_draft_field_means_draft() {
        let temp = TempDir::new().unwrap();
        let path = write_doc(&temp, "post.md", "+++\ntitle=\"x\"\n+++\nBody\n");

        let doc = Document::parse(&path).unwrap();
        assert!(doc.draft());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let path = write_doc(
            &temp,
            "post.md",
            "+++\ntitle: Mixed\ndate=\"2024-01-01\"\ntags: [a, b]\n+++\nBody\n",
        );

        let doc = Document::parse(&path).unwrap();
        let once = doc.normalize();
        let twice = once.normalize();
        assert_eq!(once.normalized_content(), twice.normalized_content());
    }

    #[test]
    fn test_normalize_file_rewrites_mixed_styles() {
        let temp = TempDir::new().unwrap();
        let path = write_doc(
            &temp,
            "post.md",
            "+++\ntitle=\"x\"\ndate: \"2024-01-01\"\n+++\n\nBody\n",
        );

        let doc = Document::parse(&path).unwrap();
        assert!(doc.mixed_format_error().is_some());

        assert!(Document::normalize_file(&path).unwrap());
        let rewritten = fs::read_to_string(&path).unwrap();
        assert!(rewritten.contains("date=\"2024-01-01\""));

        // Second pass is a no-op byte for byte.
        assert!(!Document::normalize_file(&path).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), rewritten);
    }

    #[test]
    fn test_validate_reports_missing_title() {
        let temp = TempDir::new().unwrap();
        let path = write_doc(&temp, "post.md", "+++\ndate=\"2024-01-01\"\n+++\nBody\n");

        let doc = Document::parse(&path).unwrap();
        let missing = doc.validate(&["title".to_string()]);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].field, "title");
    }
}
