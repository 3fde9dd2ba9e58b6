use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::types::{CitedRef, RangePassage, Section};

lazy_static! {
    // Explicit range citations like "Col 3:16-20" or "Mat 5:1–12".
    // Both the plain hyphen and the en-dash occur in the sources.
    static ref RE_RANGE_CITATION: Regex =
        Regex::new(r"([1-3]?\s?[A-Z][a-z]+)\s+(\d+):(\d+)(?:–|-)(\d+)").unwrap();
}

/// Segment commentary sections by their explicit verse-range citations.
///
/// Commentaries do not use the gated start/stop scan: each citation opens a
/// passage, and the passage text runs from the end of the citation to the
/// next citation in the same section (or the section end). Sections without
/// citations contribute nothing.
pub fn segment_commentary(sections: &[Section]) -> Vec<RangePassage> {
    let mut passages = Vec::new();

    for section in sections {
        let matches: Vec<_> = RE_RANGE_CITATION.captures_iter(&section.text).collect();
        debug!("section {:?}: {} range citations", section.title, matches.len());

        for (i, caps) in matches.iter().enumerate() {
            let book = caps[1].trim().to_string();
            let chapter: i32 = match caps[2].parse() {
                Ok(n) => n,
                Err(_) => continue,
            };
            let (start_verse, end_verse) = match (caps[3].parse(), caps[4].parse()) {
                (Ok(s), Ok(e)) => (s, e),
                _ => continue,
            };

            let block_start = caps.get(0).map(|m| m.end()).unwrap_or(0);
            let block_end = matches
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map(|m| m.start())
                .unwrap_or(section.text.len());
            let text = section.text[block_start..block_end].trim().to_string();

            passages.push(RangePassage {
                start: CitedRef { book: book.clone(), chapter, verse: start_verse },
                end: CitedRef { book, chapter, verse: end_verse },
                text,
            });
        }
    }

    passages
}
