// file: src/images/reference.rs
// description: typed image reference extraction and classification
// reference: https://docs.rs/pulldown-cmark

use lazy_static::lazy_static;
use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use regex::Regex;
use std::path::{Path, PathBuf};

lazy_static! {
    // <img ... src="path" ...>
    static ref HTML_IMG: Regex = Regex::new(
        r#"<img\s+[^>]*?src\s*=\s*["']([^"']*)["'][^>]*>"#
    ).expect("HTML_IMG regex is valid");

    static ref HTML_ALT: Regex = Regex::new(
        r#"alt\s*=\s*["']([^"']*)["']"#
    ).expect("HTML_ALT regex is valid");

    // Absolute URL: any scheme followed by ://
    static ref URL_SCHEME: Regex = Regex::new(
        r"^[a-zA-Z][a-zA-Z0-9+.-]*://"
    ).expect("URL_SCHEME regex is valid");
}

/// One image occurrence in a document body, as written. A reused image yields
/// one reference per occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// The reference text exactly as it appears in the body.
    pub raw: String,
    /// The path or URL inside the reference.
    pub target: String,
    pub alt_text: String,
    /// Byte offset of the reference in the body, used for document ordering.
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Local,
    Remote,
    /// A relative path that does not exist on disk. Remote references are
    /// never `Missing`; an unreachable URL is a resolution error instead.
    Missing,
}

#[derive(Debug, Clone)]
pub struct ClassifiedReference {
    pub reference: ImageReference,
    pub kind: ImageKind,
    /// Resolved filesystem path for local and missing references.
    pub local_path: Option<PathBuf>,
}

/// Extract every image reference from a markdown body, in document order.
/// Finds the inline markdown form through the markdown parser and the inline
/// `<img>` form through a tag matcher, then merges the two by byte offset.
pub fn extract(body: &str) -> Vec<ImageReference> {
    let mut references = extract_markdown(body);
    references.extend(extract_html(body));
    references.sort_by_key(|r| r.offset);
    references.retain(|r| !r.target.is_empty());
    references
}

fn extract_markdown(body: &str) -> Vec<ImageReference> {
    let mut references = Vec::new();
    let mut current: Option<(ImageReference, usize)> = None;
    let mut depth = 0usize;

    for (event, range) in Parser::new(body).into_offset_iter() {
        match event {
            Event::Start(Tag::Image { dest_url, .. }) => {
                depth += 1;
                if depth == 1 {
                    current = Some((
                        ImageReference {
                            raw: body[range.clone()].to_string(),
                            target: dest_url.to_string(),
                            alt_text: String::new(),
                            offset: range.start,
                        },
                        range.end,
                    ));
                }
            }
            Event::End(TagEnd::Image) => {
                depth = depth.saturating_sub(1);
                if depth == 0
                    && let Some((reference, _)) = current.take()
                {
                    references.push(reference);
                }
            }
            Event::Text(text) => {
                if let Some((ref mut reference, _)) = current {
                    reference.alt_text.push_str(&text);
                }
            }
            _ => {}
        }
    }

    references
}

fn extract_html(body: &str) -> Vec<ImageReference> {
    HTML_IMG
        .captures_iter(body)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let target = caps.get(1)?.as_str().to_string();
            let alt_text = HTML_ALT
                .captures(whole.as_str())
                .and_then(|alt| alt.get(1))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();

            Some(ImageReference {
                raw: whole.as_str().to_string(),
                target,
                alt_text,
                offset: whole.start(),
            })
        })
        .collect()
}

/// Classify a reference relative to the directory of its owning document.
pub fn classify(reference: ImageReference, document_dir: &Path) -> ClassifiedReference {
    if URL_SCHEME.is_match(&reference.target) {
        return ClassifiedReference {
            reference,
            kind: ImageKind::Remote,
            local_path: None,
        };
    }

    let relative = reference
        .target
        .strip_prefix("./")
        .unwrap_or(&reference.target);
    let path = document_dir.join(relative);

    let kind = if path.exists() {
        ImageKind::Local
    } else {
        ImageKind::Missing
    };

    ClassifiedReference {
        reference,
        kind,
        local_path: Some(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_extract_markdown_form() {
        let refs = extract("Intro\n\n![logo](images/logo.png)\n");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].target, "images/logo.png");
        assert_eq!(refs[0].alt_text, "logo");
        assert_eq!(refs[0].raw, "![logo](images/logo.png)");
    }

    #[test]
    fn test_extract_html_form() {
        let refs = extract("before <img src=\"a.png\" alt=\"diagram\"> after");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].target, "a.png");
        assert_eq!(refs[0].alt_text, "diagram");
    }

    #[test]
    fn test_extract_preserves_document_order() {
        let body = "<img src='first.png'>\n\n![second](second.png)\n\n<img src=\"third.png\">";
        let refs = extract(body);
        let targets: Vec<&str> = refs.iter().map(|r| r.target.as_str()).collect();
        assert_eq!(targets, vec!["first.png", "second.png", "third.png"]);
    }

    #[test]
    fn test_duplicates_kept_per_occurrence() {
        let refs = extract("![a](same.png)\n\ntext\n\n![b](same.png)\n");
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].target, refs[1].target);
    }

    #[test]
    fn test_empty_target_dropped() {
        let refs = extract("<img src=\"\" alt=\"empty\">");
        assert!(refs.is_empty());
    }

    #[test]
    fn test_classify_remote_by_scheme() {
        let temp = TempDir::new().unwrap();
        let reference = ImageReference {
            raw: "![x](https://example.com/a.png)".to_string(),
            target: "https://example.com/a.png".to_string(),
            alt_text: "x".to_string(),
            offset: 0,
        };

        let classified = classify(reference, temp.path());
        assert_eq!(classified.kind, ImageKind::Remote);
        assert!(classified.local_path.is_none());
    }

    #[test]
    fn test_classify_local_and_missing() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("images")).unwrap();
        fs::write(temp.path().join("images/b.jpg"), b"data").unwrap();

        let present = classify(
            ImageReference {
                raw: "![b](./images/b.jpg)".to_string(),
                target: "./images/b.jpg".to_string(),
                alt_text: "b".to_string(),
                offset: 0,
            },
            temp.path(),
        );
        assert_eq!(present.kind, ImageKind::Local);

        let absent = classify(
            ImageReference {
                raw: "![a](images/a.jpg)".to_string(),
                target: "images/a.jpg".to_string(),
                alt_text: "a".to_string(),
                offset: 0,
            },
            temp.path(),
        );
        assert_eq!(absent.kind, ImageKind::Missing);
        assert!(absent.local_path.unwrap().ends_with("images/a.jpg"));
    }
}
