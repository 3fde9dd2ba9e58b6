use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::catalog::{BookCatalog, Language};
use crate::types::{Corpus, SegmentOutcome, VerseRecord};

lazy_static! {
    // A verse-start line: leading decimal integer, optional remainder.
    static ref RE_VERSE_START: Regex = Regex::new(r"^(\d+)(.*)$").unwrap();
}

/// Where the gated pass is allowed to open and where it must close.
/// These are properties of the corpus being parsed, not of the engine,
/// so they travel in configuration.
#[derive(Debug, Clone)]
pub struct SegmentBounds {
    pub start_books: Vec<String>,
    pub start_chapter: i32,
    pub start_verse: i32,
    pub end_books: Vec<String>,
    pub end_chapter: i32,
    pub end_verse: i32,
}

impl SegmentBounds {
    /// Canonical bounds for a full bible corpus: opens at the first verse of
    /// the first canon book, closes at the last verse of the last.
    pub fn canonical(language: Language) -> Self {
        let (start, end) = match language {
            Language::Fr => ("Genèse", "Apocalypse"),
            Language::En => ("Genesis", "Revelation"),
        };
        Self {
            start_books: vec![start.to_string()],
            start_chapter: 1,
            start_verse: 1,
            end_books: vec![end.to_string()],
            end_chapter: 22,
            end_verse: 21,
        }
    }

    pub fn is_start(&self, book: &str, chapter: i32, verse: Option<i32>) -> bool {
        self.start_books.iter().any(|b| b == book)
            && chapter == self.start_chapter
            && verse == Some(self.start_verse)
    }

    pub fn is_end(&self, book: &str, chapter: i32, verse: Option<i32>) -> bool {
        self.end_books.iter().any(|b| b == book)
            && chapter == self.end_chapter
            && verse == Some(self.end_verse)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    NotStarted,
    Collecting,
    Finished,
}

/// The gated verse segmentation state machine.
///
/// Walks normalized lines in document order, keeps the current book/chapter
/// position updated from inline anchors, and emits verse records between the
/// configured start and end boundary verses. All state is local to one pass;
/// nothing survives between documents.
///
/// Detection misses and number parse failures never abort the pass: they
/// only discard a line or null out a verse number. The one way the pass ends
/// early is reaching the end boundary.
pub struct Segmenter<'a> {
    catalog: &'a BookCatalog,
    bounds: &'a SegmentBounds,
    state: State,
    current_book: Option<String>,
    current_chapter: Option<i32>,
}

impl<'a> Segmenter<'a> {
    pub fn new(catalog: &'a BookCatalog, bounds: &'a SegmentBounds) -> Self {
        Self {
            catalog,
            bounds,
            state: State::NotStarted,
            current_book: None,
            current_chapter: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.state == State::Finished
    }

    /// Run one full pass over normalized text and collect the corpus.
    pub fn segment(mut self, text: &str) -> Corpus {
        let mut records = Vec::new();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(record) = self.step(line) {
                records.push(record);
            }
            if self.is_finished() {
                // End boundary reached; later lines are never read.
                break;
            }
        }

        let outcome = if self.is_finished() {
            SegmentOutcome::ReachedEnd
        } else {
            SegmentOutcome::EndOfInput
        };
        debug!("segmentation pass ended: {} records, {:?}", records.len(), outcome);

        Corpus { records, outcome }
    }

    /// Process one line. Returns the record to emit, if any.
    fn step(&mut self, line: &str) -> Option<VerseRecord> {
        if self.state == State::Finished {
            return None;
        }

        // An anchor overwrites the current position regardless of state.
        if let Some(anchor) = self.catalog.detect_anchor(line) {
            self.current_book = Some(anchor.book);
            self.current_chapter = Some(anchor.chapter);
        }

        // Lines that do not open a verse are formatting noise. Continuation
        // text of a multi-line verse is not reassembled; only the verse-start
        // line's own remainder becomes that verse's content.
        let caps = RE_VERSE_START.captures(line)?;
        let verse_number: Option<i32> = caps[1].parse().ok();
        let text = caps[2].trim().to_string();

        let record = VerseRecord {
            book: self.current_book.clone(),
            chapter: self.current_chapter,
            verse_number,
            text,
        };

        match self.state {
            State::NotStarted => {
                let at_start = match (&self.current_book, self.current_chapter) {
                    (Some(book), Some(chapter)) => {
                        self.bounds.is_start(book, chapter, verse_number)
                    }
                    _ => false,
                };
                if at_start {
                    self.state = State::Collecting;
                    debug!("start boundary reached at {:?} {:?}", self.current_book, self.current_chapter);
                    Some(record)
                } else {
                    None
                }
            }
            State::Collecting => {
                let at_end = match (&self.current_book, self.current_chapter) {
                    (Some(book), Some(chapter)) => {
                        self.bounds.is_end(book, chapter, verse_number)
                    }
                    _ => false,
                };
                if at_end {
                    self.state = State::Finished;
                    debug!("end boundary reached at {:?} {:?}", self.current_book, self.current_chapter);
                }
                Some(record)
            }
            State::Finished => None,
        }
    }
}

/// Segment normalized scripture text between the configured boundary verses.
pub fn segment_verses(text: &str, catalog: &BookCatalog, bounds: &SegmentBounds) -> Corpus {
    Segmenter::new(catalog, bounds).segment(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BookCatalog, Language};

    fn fr() -> (BookCatalog, SegmentBounds) {
        (BookCatalog::for_language(Language::Fr), SegmentBounds::canonical(Language::Fr))
    }

    #[test]
    fn test_starts_at_canonical_first_verse() {
        let (catalog, bounds) = fr();
        let text = "Genèse 1\n1 Au commencement Dieu créa le ciel et la terre.";
        let corpus = segment_verses(text, &catalog, &bounds);
        assert_eq!(corpus.records.len(), 1);
        let first = &corpus.records[0];
        assert_eq!(first.book.as_deref(), Some("Genèse"));
        assert_eq!(first.chapter, Some(1));
        assert_eq!(first.verse_number, Some(1));
        assert_eq!(first.text, "Au commencement Dieu créa le ciel et la terre.");
        assert_eq!(corpus.outcome, SegmentOutcome::EndOfInput);
    }

    #[test]
    fn test_no_premature_start() {
        let (catalog, bounds) = fr();
        // Valid verse lines before the start boundary are discarded.
        let text = "Exode 1\n1 Voici les noms\n2 Ruben, Siméon\nGenèse 1\n1 Au commencement";
        let corpus = segment_verses(text, &catalog, &bounds);
        assert_eq!(corpus.records.len(), 1);
        assert_eq!(corpus.records[0].book.as_deref(), Some("Genèse"));
    }

    #[test]
    fn test_non_verse_lines_emit_nothing() {
        let (catalog, bounds) = fr();
        let text = "Genèse 1\n1 Au commencement\nTitre de section\nNotes du traducteur\n2 La terre était déserte";
        let corpus = segment_verses(text, &catalog, &bounds);
        assert_eq!(corpus.records.len(), 2);
        assert_eq!(corpus.records[1].verse_number, Some(2));
    }

    #[test]
    fn test_ends_at_canonical_last_verse() {
        let (catalog, bounds) = fr();
        let text = "Genèse 1\n\
                    1 Au commencement\n\
                    Apocalypse 22\n\
                    21 Que la grâce du Seigneur Jésus soit avec tous.\n\
                    9 une ligne après la fin\n\
                    Genèse 3";
        let corpus = segment_verses(text, &catalog, &bounds);
        assert_eq!(corpus.records.len(), 2);
        let last = corpus.records.last().unwrap();
        assert_eq!(last.book.as_deref(), Some("Apocalypse"));
        assert_eq!(last.chapter, Some(22));
        assert_eq!(last.verse_number, Some(21));
        assert_eq!(corpus.outcome, SegmentOutcome::ReachedEnd);
        // The terminal record is unique and final.
        let terminals = corpus
            .records
            .iter()
            .filter(|r| bounds.is_end(r.book.as_deref().unwrap(), r.chapter.unwrap(), r.verse_number))
            .count();
        assert_eq!(terminals, 1);
    }

    #[test]
    fn test_end_of_input_is_surfaced_as_incomplete() {
        let (catalog, bounds) = fr();
        let text = "Genèse 1\n1 Au commencement\n2 La terre";
        let corpus = segment_verses(text, &catalog, &bounds);
        assert!(!corpus.records.is_empty());
        assert!(!corpus.is_complete());
    }

    #[test]
    fn test_anchor_overwrites_position_midstream() {
        let (catalog, bounds) = fr();
        let text = "Genèse 1\n1 Au commencement\nGenèse 2\n1 Ainsi furent achevés";
        let corpus = segment_verses(text, &catalog, &bounds);
        assert_eq!(corpus.records[1].chapter, Some(2));
    }

    #[test]
    fn test_unparseable_verse_number_is_kept_with_none() {
        let (catalog, bounds) = fr();
        // The leading digits overflow i32, so the number nulls out but the
        // record is still emitted while collecting.
        let text = "Genèse 1\n1 Au commencement\n99999999999999999999 texte conservé";
        let corpus = segment_verses(text, &catalog, &bounds);
        assert_eq!(corpus.records.len(), 2);
        assert_eq!(corpus.records[1].verse_number, None);
        assert_eq!(corpus.records[1].text, "texte conservé");
        assert_eq!(corpus.records[1].book.as_deref(), Some("Genèse"));
    }

    #[test]
    fn test_emitted_records_always_positioned_after_start() {
        let (catalog, bounds) = fr();
        let text = "Genèse 1\n1 Au commencement\n2 La terre\n3 Dieu dit";
        let corpus = segment_verses(text, &catalog, &bounds);
        assert!(corpus.records.iter().all(|r| r.book.is_some() && r.chapter.is_some()));
    }

    #[test]
    fn test_configurable_bounds() {
        let catalog = BookCatalog::for_language(Language::En);
        let bounds = SegmentBounds {
            start_books: vec!["Matthew".to_string()],
            start_chapter: 1,
            start_verse: 1,
            end_books: vec!["John".to_string()],
            end_chapter: 21,
            end_verse: 25,
        };
        let text = "Genesis 1\n1 In the beginning\nMatthew 1\n1 The book of the genealogy\nJohn 21\n25 Now there are also many other things";
        let corpus = segment_verses(text, &catalog, &bounds);
        assert_eq!(corpus.records.len(), 2);
        assert_eq!(corpus.records[0].book.as_deref(), Some("Matthew"));
        assert!(corpus.is_complete());
    }
}
