// file: src/pipeline/outcome.rs
// description: per-document outcomes and the aggregated batch report

use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// `draft = true` (or no explicit opt-in). Never counted as an error.
    Draft,
    /// Fingerprint matched a cache entry; the platform was not contacted.
    Unchanged,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Draft => f.write_str("draft"),
            SkipReason::Unchanged => f.write_str("unchanged"),
        }
    }
}

/// Terminal state of one document's pipeline run.
#[derive(Debug, Clone)]
pub enum DocumentOutcome {
    Published { article_id: String },
    Skipped { reason: SkipReason },
    Failed { reason: String },
}

impl fmt::Display for DocumentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentOutcome::Published { article_id } => {
                write!(f, "published (article {})", article_id)
            }
            DocumentOutcome::Skipped { reason } => write!(f, "skipped ({})", reason),
            DocumentOutcome::Failed { reason } => write!(f, "failed: {}", reason),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DocumentReport {
    pub path: PathBuf,
    pub relative_path: String,
    pub outcome: DocumentOutcome,
}

/// Every document in the batch gets exactly one report; one document's
/// failure never suppresses another's.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub documents: Vec<DocumentReport>,
}

impl BatchReport {
    pub fn published(&self) -> usize {
        self.count(|o| matches!(o, DocumentOutcome::Published { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, DocumentOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, DocumentOutcome::Failed { .. }))
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    fn count(&self, predicate: impl Fn(&DocumentOutcome) -> bool) -> usize {
        self.documents
            .iter()
            .filter(|d| predicate(&d.outcome))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(outcome: DocumentOutcome) -> DocumentReport {
        DocumentReport {
            path: PathBuf::from("/tmp/a.md"),
            relative_path: "a.md".to_string(),
            outcome,
        }
    }

    #[test]
    fn test_counts_and_failure_flag() {
        let batch = BatchReport {
            documents: vec![
                report(DocumentOutcome::Published {
                    article_id: "1".to_string(),
                }),
                report(DocumentOutcome::Skipped {
                    reason: SkipReason::Draft,
                }),
                report(DocumentOutcome::Failed {
                    reason: "boom".to_string(),
                }),
            ],
        };

        assert_eq!(batch.published(), 1);
        assert_eq!(batch.skipped(), 1);
        assert_eq!(batch.failed(), 1);
        assert!(batch.has_failures());
    }

    #[test]
    fn test_outcome_display() {
        let outcome = DocumentOutcome::Skipped {
            reason: SkipReason::Unchanged,
        };
        assert_eq!(outcome.to_string(), "skipped (unchanged)");
    }
}
