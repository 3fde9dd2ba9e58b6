use std::str::FromStr;

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Document category, resolved before ingestion starts (never prompted for).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "bible")]
    Bible,
    #[serde(rename = "commentary")]
    Commentary,
    #[serde(rename = "introduction")]
    Introduction,
}

impl Category {
    pub fn title(&self) -> &'static str {
        match self {
            Category::Bible => "Bible",
            Category::Commentary => "Commentary",
            Category::Introduction => "Introduction",
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            Category::Bible => "BIB",
            Category::Commentary => "COM",
            Category::Introduction => "INTRO",
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Invalid category value: {0}")]
pub struct ParseCategoryError(String);

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bible" => Ok(Category::Bible),
            "commentary" => Ok(Category::Commentary),
            "introduction" | "intro" => Ok(Category::Introduction),
            _ => Err(ParseCategoryError(s.to_string())),
        }
    }
}

/// What to do with a verse line whose leading number failed to parse
/// (OCR artifacts, non-ASCII digits). Segmentation always emits the record;
/// this decides its fate at persistence time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnnumberedPolicy {
    #[default]
    Keep,
    Discard,
}

/// A book+chapter marker detected inline in source text. Ephemeral: it only
/// overwrites the segmenter's current position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub book: String,
    pub chapter: i32,
}

/// The atomic segmentation output. Once the gated pass has started, `book`
/// and `chapter` are always `Some` on emitted records; `verse_number` is
/// `None` when the leading digits did not parse as a number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerseRecord {
    pub book: Option<String>,
    pub chapter: Option<i32>,
    pub verse_number: Option<i32>,
    pub text: String,
}

/// How a segmentation pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentOutcome {
    /// The configured end-boundary verse was emitted and the pass stopped.
    ReachedEnd,
    /// Input ran out before the end boundary was seen. The corpus is
    /// incomplete; callers decide whether to warn or reject.
    EndOfInput,
}

/// Ordered verse records from one document, in reading order.
#[derive(Debug, Clone)]
pub struct Corpus {
    pub records: Vec<VerseRecord>,
    pub outcome: SegmentOutcome,
}

impl Corpus {
    pub fn is_complete(&self) -> bool {
        self.outcome == SegmentOutcome::ReachedEnd
    }
}

/// One textual section of a flattened document, in spine order.
#[derive(Debug, Clone)]
pub struct Section {
    pub title: String,
    pub text: String,
}

/// A single cited position, as written in a commentary citation
/// (the book part is an abbreviation or partial name, not a catalog entry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitedRef {
    pub book: String,
    pub chapter: i32,
    pub verse: i32,
}

/// A commentary passage covering an inclusive verse range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangePassage {
    pub start: CitedRef,
    pub end: CitedRef,
    pub text: String,
}
