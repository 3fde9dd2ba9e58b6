use std::collections::BTreeSet;

use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::BookCatalog;
use crate::segment::SegmentBounds;
use crate::types::VerseRecord;

/// Why a strict coverage check rejected a corpus.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CoverageError {
    #[error("missing books: {}", .0.iter().cloned().collect::<Vec<_>>().join(", "))]
    MissingBooks(BTreeSet<String>),
    #[error("first record's book is not a start boundary book: {0:?}")]
    InvalidStart(Option<String>),
    #[error("last record's book is not an end boundary book: {0:?}")]
    InvalidEnd(Option<String>),
}

/// Read-only summary of which catalog books a verse stream touched and
/// whether it opens and closes on the boundary books. Computed once per
/// validation run; never persisted.
#[derive(Debug, Clone)]
pub struct CoverageReport {
    pub detected: BTreeSet<String>,
    pub missing: BTreeSet<String>,
    pub first_book: Option<String>,
    pub last_book: Option<String>,
    pub valid_start: bool,
    pub valid_end: bool,
}

impl CoverageReport {
    pub fn new(records: &[VerseRecord], catalog: &BookCatalog, bounds: &SegmentBounds) -> Self {
        let detected: BTreeSet<String> = records
            .iter()
            .filter_map(|r| r.book.clone())
            .collect();

        let missing: BTreeSet<String> = catalog
            .names()
            .iter()
            .filter(|name| !detected.contains(name.as_str()))
            .cloned()
            .collect();

        let first_book = records.first().and_then(|r| r.book.clone());
        let last_book = records.last().and_then(|r| r.book.clone());

        let valid_start = first_book
            .as_deref()
            .map(|b| bounds.start_books.iter().any(|s| s == b))
            .unwrap_or(false);
        let valid_end = last_book
            .as_deref()
            .map(|b| bounds.end_books.iter().any(|s| s == b))
            .unwrap_or(false);

        Self { detected, missing, first_book, last_book, valid_start, valid_end }
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.valid_start && self.valid_end
    }

    /// Warn-mode reporting: log the summary, reject nothing.
    pub fn log_summary(&self, catalog: &BookCatalog) {
        info!(
            "coverage: {}/{} books detected",
            self.detected.len(),
            catalog.len()
        );
        if self.missing.is_empty() {
            info!("coverage: no missing books");
        } else {
            warn!(
                "coverage: {} missing books: {}",
                self.missing.len(),
                self.missing.iter().cloned().collect::<Vec<_>>().join(", ")
            );
        }
        if !self.valid_start {
            warn!("coverage: invalid first book: {:?}", self.first_book);
        }
        if !self.valid_end {
            warn!("coverage: invalid last book: {:?}", self.last_book);
        }
    }

    /// Reject-mode reporting: the first failed check becomes an error.
    pub fn check_strict(&self) -> Result<(), CoverageError> {
        if !self.missing.is_empty() {
            return Err(CoverageError::MissingBooks(self.missing.clone()));
        }
        if !self.valid_start {
            return Err(CoverageError::InvalidStart(self.first_book.clone()));
        }
        if !self.valid_end {
            return Err(CoverageError::InvalidEnd(self.last_book.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BookCatalog, Language};
    use crate::segment::SegmentBounds;
    use crate::types::VerseRecord;

    fn record(book: &str, chapter: i32, verse: i32) -> VerseRecord {
        VerseRecord {
            book: Some(book.to_string()),
            chapter: Some(chapter),
            verse_number: Some(verse),
            text: String::new(),
        }
    }

    #[test]
    fn test_full_catalog_has_no_missing_books() {
        let catalog = BookCatalog::for_language(Language::En);
        let bounds = SegmentBounds::canonical(Language::En);
        let records: Vec<VerseRecord> = catalog
            .names()
            .iter()
            .map(|name| record(name, 1, 1))
            .collect();
        let report = CoverageReport::new(&records, &catalog, &bounds);
        assert!(report.missing.is_empty());
        assert!(report.valid_start);
        assert!(report.valid_end);
        assert!(report.check_strict().is_ok());
    }

    #[test]
    fn test_missing_books_reported() {
        let catalog = BookCatalog::for_language(Language::En);
        let bounds = SegmentBounds::canonical(Language::En);
        let records = vec![record("Genesis", 1, 1), record("Revelation", 22, 21)];
        let report = CoverageReport::new(&records, &catalog, &bounds);
        assert_eq!(report.missing.len(), catalog.len() - 2);
        assert!(report.missing.contains("Exodus"));
        assert!(report.valid_start);
        assert!(report.valid_end);
        match report.check_strict() {
            Err(CoverageError::MissingBooks(missing)) => {
                assert!(missing.contains("Malachi"));
            }
            other => panic!("expected MissingBooks, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_boundaries_reported() {
        let catalog = BookCatalog::for_language(Language::Fr);
        let bounds = SegmentBounds::canonical(Language::Fr);
        let records = vec![record("Exode", 1, 1), record("Jude", 1, 25)];
        let report = CoverageReport::new(&records, &catalog, &bounds);
        assert!(!report.valid_start);
        assert!(!report.valid_end);
        assert!(report.check_strict().is_err());
    }

    #[test]
    fn test_empty_corpus_fails_boundary_checks() {
        let catalog = BookCatalog::for_language(Language::En);
        let bounds = SegmentBounds::canonical(Language::En);
        let report = CoverageReport::new(&[], &catalog, &bounds);
        assert!(!report.valid_start);
        assert!(!report.valid_end);
        assert_eq!(report.first_book, None);
    }
}
