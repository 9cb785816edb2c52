// file: src/document/fingerprint.rs
// description: deterministic content fingerprint over front matter, body and image bytes
// reference: https://docs.rs/sha2

use crate::document::Document;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Digest of everything that makes a document's published form: canonical
/// front matter, body text, and the content hashes of its resolved images in
/// document order. Byte-identical inputs always produce the same fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn compute(document: &Document, image_hashes: &[String]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(document.front_matter.canonicalize().to_canonical().as_bytes());
        hasher.update([0u8]);
        hasher.update(document.body.as_bytes());
        for hash in image_hashes {
            hasher.update([0u8]);
            hasher.update(hash.as_bytes());
        }
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn doc(content: &str) -> Document {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("post.md");
        fs::write(&path, content).unwrap();
        Document::parse(&path).unwrap()
    }

    #[test]
    fn test_identical_input_identical_fingerprint() {
        let content = "+++\ntitle=\"x\"\ndraft=false\n+++\nBody\n";
        let hashes = vec!["aa".to_string(), "bb".to_string()];

        let first = Fingerprint::compute(&doc(content), &hashes);
        let second = Fingerprint::compute(&doc(content), &hashes);
        assert_eq!(first, second);
    }

    #[test]
    fn test_body_change_changes_fingerprint() {
        let a = Fingerprint::compute(&doc("+++\ntitle=\"x\"\n+++\nBody\n"), &[]);
        let b = Fingerprint::compute(&doc("+++\ntitle=\"x\"\n+++\nBody!\n"), &[]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_image_byte_change_changes_fingerprint() {
        let content = "+++\ntitle=\"x\"\n+++\nBody\n";
        let a = Fingerprint::compute(&doc(content), &["aaaa".to_string()]);
        let b = Fingerprint::compute(&doc(content), &["aaab".to_string()]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_style_differences_do_not_change_fingerprint() {
        // Canonicalization feeds the digest, so assignment style is invisible.
        let a = Fingerprint::compute(&doc("+++\ntitle=\"x\"\n+++\nBody\n"), &[]);
        let b = Fingerprint::compute(&doc("+++\ntitle: x\n+++\nBody\n"), &[]);
        assert_eq!(a, b);
    }
}
