use thiserror::Error;

/// A fully parsed lookup reference: book name, chapter, verse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerseRef {
    pub book: String,
    pub chapter: i32,
    pub verse: i32,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("could not parse reference '{0}', expected \"BookName C.V\" (e.g. \"Colossians 3.16\")")]
    Malformed(String),
}

/// Parse a free-text reference of the form `"BookName C.V"`, e.g.
/// `"Colossians 3.16"`: split on the first space, then split the remainder
/// on `.`. Any shape that does not yield a book plus two integers is a
/// `Malformed` error, never a partially filled value.
pub fn parse_reference(raw: &str) -> Result<VerseRef, ReferenceError> {
    let malformed = || ReferenceError::Malformed(raw.to_string());

    let (book, chap_verse) = raw.split_once(' ').ok_or_else(malformed)?;
    if book.is_empty() {
        return Err(malformed());
    }

    let (chapter, verse) = chap_verse.split_once('.').ok_or_else(malformed)?;
    let chapter: i32 = chapter.trim().parse().map_err(|_| malformed())?;
    let verse: i32 = verse.trim().parse().map_err(|_| malformed())?;

    Ok(VerseRef { book: book.to_string(), chapter, verse })
}
