use std::str::FromStr;

use regex::Regex;
use thiserror::Error;

use crate::types::Anchor;

/// Canonical book names in canon order, French.
pub static BOOKS_FR: &[&str] = &[
    // Pentateuch
    "Genèse", "Exode", "Lévitique", "Nombres", "Deutéronome",
    // Historical
    "Josué", "Juges", "Ruth", "1 Samuel", "2 Samuel", "1 Rois", "2 Rois",
    "1 Chroniques", "2 Chroniques", "Esdras", "Néhémie", "Tobie", "Judith",
    "Esther", "1 Maccabées", "2 Maccabées",
    // Poetic
    "Job", "Psaumes", "Proverbes", "Ecclésiaste", "Cantique des Cantiques",
    "Sagesse", "Siracide",
    // Prophetic
    "Isaïe", "Jérémie", "Lamentations", "Baruch", "Ézéchiel", "Daniel", "Osée",
    "Joël", "Amos", "Abdias", "Jonas", "Michée", "Nahum", "Habacuc", "Sophonie",
    "Aggée", "Zacharie", "Malachie",
    // NT
    "Matthieu", "Marc", "Luc", "Jean", "Actes", "Romains", "1 Corinthiens", "2 Corinthiens",
    "Galates", "Éphésiens", "Philippiens", "Colossiens", "1 Thessaloniciens",
    "2 Thessaloniciens", "1 Timothée", "2 Timothée", "Tite", "Philémon", "Hébreux",
    "Jacques", "1 Pierre", "2 Pierre", "1 Jean", "2 Jean", "3 Jean", "Jude", "Apocalypse",
];

/// Canonical book names in canon order, English.
pub static BOOKS_EN: &[&str] = &[
    // Pentateuch
    "Genesis", "Exodus", "Leviticus", "Numbers", "Deuteronomy",
    // Historical
    "Joshua", "Judges", "Ruth", "1 Samuel", "2 Samuel", "1 Kings", "2 Kings",
    "1 Chronicles", "2 Chronicles", "Ezra", "Nehemiah", "Tobit", "Judith",
    "Esther", "1 Maccabees", "2 Maccabees",
    // Poetic
    "Job", "Psalms", "Proverbs", "Ecclesiastes", "Song of Songs", "Wisdom of Solomon",
    "Sirach",
    // Prophetic
    "Isaiah", "Jeremiah", "Lamentations", "Baruch", "Ezekiel", "Daniel", "Hosea",
    "Joel", "Amos", "Obadiah", "Jonah", "Micah", "Nahum", "Habakkuk", "Zephaniah",
    "Haggai", "Zechariah", "Malachi",
    // NT
    "Matthew", "Mark", "Luke", "John", "Acts", "Romans", "1 Corinthians", "2 Corinthians",
    "Galatians", "Ephesians", "Philippians", "Colossians", "1 Thessalonians",
    "2 Thessalonians", "1 Timothy", "2 Timothy", "Titus", "Philemon", "Hebrews",
    "James", "1 Peter", "2 Peter", "1 John", "2 John", "3 John", "Jude", "Revelation",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Fr,
    En,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::Fr => "fr",
            Language::En => "en",
        }
    }

    pub fn book_names(&self) -> &'static [&'static str] {
        match self {
            Language::Fr => BOOKS_FR,
            Language::En => BOOKS_EN,
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Invalid language code: {0}")]
pub struct ParseLanguageError(String);

impl FromStr for Language {
    type Err = ParseLanguageError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fr" => Ok(Language::Fr),
            "en" => Ok(Language::En),
            _ => Err(ParseLanguageError(s.to_string())),
        }
    }
}

/// Ordered catalog of canonical book names for one language, with a
/// precompiled anchor pattern per name. The catalog order is part of the
/// detection contract: the first name that matches a line wins.
#[derive(Debug)]
pub struct BookCatalog {
    language: Language,
    names: Vec<String>,
    anchor_patterns: Vec<Regex>,
}

impl BookCatalog {
    pub fn for_language(language: Language) -> Self {
        let names: Vec<String> = language.book_names().iter().map(|s| s.to_string()).collect();
        let anchor_patterns = names
            .iter()
            .map(|name| {
                // Book name followed by optional whitespace and a chapter
                // number, anywhere in the line. The name is deliberately not
                // word-bounded on the left: catalog order disambiguates, and
                // tightening the match would silently change which lines
                // anchor. Known precision trade-off.
                Regex::new(&format!(r"{}\s*(\d+)", regex::escape(name)))
                    .expect("escaped book name must compile")
            })
            .collect();

        Self { language, names, anchor_patterns }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Find the first catalog entry whose name appears in the line, followed
    /// by optional whitespace and a decimal chapter number. Case-sensitive
    /// substring match. Absence of an anchor is the common case, not an
    /// error.
    pub fn detect_anchor(&self, line: &str) -> Option<Anchor> {
        for (name, pattern) in self.names.iter().zip(self.anchor_patterns.iter()) {
            if let Some(caps) = pattern.captures(line) {
                let chapter: i32 = match caps[1].parse() {
                    Ok(n) => n,
                    // Digits too long for i32; try the next catalog entry.
                    Err(_) => continue,
                };
                return Some(Anchor { book: name.clone(), chapter });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_anchor_simple() {
        let catalog = BookCatalog::for_language(Language::Fr);
        let anchor = catalog.detect_anchor("Deutéronome 12").unwrap();
        assert_eq!(anchor.book, "Deutéronome");
        assert_eq!(anchor.chapter, 12);
    }

    #[test]
    fn test_detect_anchor_mid_line() {
        let catalog = BookCatalog::for_language(Language::En);
        let anchor = catalog.detect_anchor("-- Genesis 3 --").unwrap();
        assert_eq!(anchor.book, "Genesis");
        assert_eq!(anchor.chapter, 3);
    }

    #[test]
    fn test_detect_anchor_optional_whitespace() {
        let catalog = BookCatalog::for_language(Language::En);
        let anchor = catalog.detect_anchor("Exodus2").unwrap();
        assert_eq!(anchor.book, "Exodus");
        assert_eq!(anchor.chapter, 2);
    }

    #[test]
    fn test_detect_anchor_none_without_number() {
        let catalog = BookCatalog::for_language(Language::En);
        assert_eq!(catalog.detect_anchor("Genesis tells of beginnings"), None);
        assert_eq!(catalog.detect_anchor("an ordinary line"), None);
    }

    #[test]
    fn test_detect_anchor_case_sensitive() {
        let catalog = BookCatalog::for_language(Language::En);
        assert_eq!(catalog.detect_anchor("genesis 1"), None);
    }

    #[test]
    fn test_detect_anchor_catalog_order_wins() {
        let catalog = BookCatalog::for_language(Language::En);
        // "1 John 4" contains both "John" and "1 John"; "John" comes first
        // in canon order, so it wins. Catalog order is the contract.
        let anchor = catalog.detect_anchor("1 John 4").unwrap();
        assert_eq!(anchor.book, "John");
        assert_eq!(anchor.chapter, 4);
    }

    #[test]
    fn test_detect_anchor_substring_not_word_bounded() {
        let catalog = BookCatalog::for_language(Language::En);
        // "Job" matching as the tail of another word is the documented
        // trade-off.
        let anchor = catalog.detect_anchor("the BigJob 12 machine").unwrap();
        assert_eq!(anchor.book, "Job");
        assert_eq!(anchor.chapter, 12);
    }

    #[test]
    fn test_catalog_sizes_match() {
        assert_eq!(BOOKS_FR.len(), BOOKS_EN.len());
        let catalog = BookCatalog::for_language(Language::Fr);
        assert_eq!(catalog.len(), BOOKS_FR.len());
    }
}
