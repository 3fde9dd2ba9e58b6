use std::collections::HashMap;

use diesel::prelude::*;
use anyhow::Result;
use tracing::{debug, warn};

use crate::catalog::Language;
use crate::db::StoreHandle;
use crate::db::models::*;
use crate::flatten::BookMeta;
use crate::reference::VerseRef;
use crate::types::{Category as DocCategory, RangePassage, Section, UnnumberedPolicy, VerseRecord};

/// A matching content block returned by reference lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentHit {
    pub content_id: i32,
    pub source_book: String,
    pub start_verse_id: Option<i32>,
    pub end_verse_id: Option<i32>,
    pub text: String,
}

/// Result of a staged reference lookup. A miss names the first stage that
/// failed to resolve; it is a user-facing warning, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Hits(Vec<ContentHit>),
    BookNotFound(String),
    ChapterNotFound { book: String, chapter: i32 },
    VerseNotFound { book: String, chapter: i32, verse: i32 },
}

/// Short display form of a canonical book name: optional leading number
/// kept, first word truncated to three characters ("Genèse" -> "Gen",
/// "1 Samuel" -> "1 Sam").
fn abbreviate(name: &str) -> String {
    let (prefix, rest) = match name.split_once(' ') {
        Some((p, r)) if !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()) => (Some(p), r),
        _ => (None, name),
    };
    let first_word = rest.split_whitespace().next().unwrap_or(rest);
    let short: String = first_word.chars().take(3).collect();
    match prefix {
        Some(p) => format!("{} {}", p, short),
        None => short,
    }
}

/// Deuterocanonical books, both catalog languages.
static DEUTEROCANONICAL: &[&str] = &[
    "Tobie", "Judith", "1 Maccabées", "2 Maccabées", "Sagesse", "Siracide", "Baruch",
    "Tobit", "1 Maccabees", "2 Maccabees", "Wisdom of Solomon", "Sirach",
];

/// Both catalogs carry 27 New Testament books at the tail.
const NEW_TESTAMENT_LEN: usize = 27;

impl StoreHandle {
    /// Seed the fixed reference data: the three document categories and the
    /// canonical book catalog for each supported language. Idempotent.
    pub(crate) fn seed(&self) -> Result<()> {
        self.do_write(|conn| {
            conn.transaction(|conn| {
                use crate::db::schema::categories::dsl as cat;
                use crate::db::schema::bible_books::dsl as bb;

                let n: i64 = cat::categories.count().get_result(conn)?;
                if n == 0 {
                    let rows = [
                        NewCategory {
                            title: DocCategory::Bible.title(),
                            description: Some("Scriptural text"),
                            abbreviation: Some(DocCategory::Bible.abbreviation()),
                        },
                        NewCategory {
                            title: DocCategory::Commentary.title(),
                            description: Some("Commentary on the canonical books"),
                            abbreviation: Some(DocCategory::Commentary.abbreviation()),
                        },
                        NewCategory {
                            title: DocCategory::Introduction.title(),
                            description: Some("General presentation or preface"),
                            abbreviation: Some(DocCategory::Introduction.abbreviation()),
                        },
                    ];
                    diesel::insert_into(cat::categories).values(&rows[..]).execute(conn)?;
                }

                let n: i64 = bb::bible_books.count().get_result(conn)?;
                if n == 0 {
                    for language in [Language::Fr, Language::En] {
                        let names = language.book_names();
                        let ot_len = names.len() - NEW_TESTAMENT_LEN;
                        for (order, name) in names.iter().enumerate() {
                            let abbreviation = abbreviate(name);
                            let row = NewBibleBook {
                                title: *name,
                                abbreviation: &abbreviation,
                                language: language.code(),
                                book_order: order as i32,
                                is_deuterocanonical: DEUTEROCANONICAL.contains(name),
                                is_old_testament: order < ot_len,
                                is_new_testament: order >= ot_len,
                            };
                            diesel::insert_into(bb::bible_books).values(&row).execute(conn)?;
                        }
                    }
                }

                Ok(())
            })
        })
    }

    /// Idempotent-ingest guard: a book row with this exact title means the
    /// document was already imported.
    pub fn book_exists(&self, book_title: &str) -> Result<bool> {
        use crate::db::schema::books::dsl::*;

        let n: i64 = self.do_read(|conn| {
            books.filter(title.eq(book_title)).count().get_result(conn)
        })?;
        Ok(n > 0)
    }

    /// Insert the source document row and return its id.
    pub fn insert_book(&self, meta: &BookMeta, category: DocCategory) -> Result<i32> {
        self.do_write(|conn| {
            use crate::db::schema::categories::dsl as cat;
            use crate::db::schema::books::dsl as b;

            let category_id: Option<i32> = cat::categories
                .filter(cat::title.eq(category.title()))
                .select(cat::id)
                .first(conn)
                .optional()?;

            let row = NewBook {
                title: &meta.title,
                abbreviation: None,
                language: meta.language.as_deref(),
                authors: meta.author.as_deref(),
                cover: None,
                metadata_json: Some(&meta.metadata_json),
                category_id,
            };
            diesel::insert_into(b::books).values(&row).execute(conn)?;

            b::books
                .filter(b::title.eq(meta.title.as_str()))
                .select(b::id)
                .order(b::id.desc())
                .first(conn)
        })
    }

    /// Persist a segmented verse corpus for one source document: every
    /// record resolves (book, chapter, verse) names to rows, creating
    /// chapter and verse rows on demand, and lands as a single-verse content
    /// block. Records with a null verse number follow `policy`.
    ///
    /// Runs as one transaction; a partially inserted corpus never survives.
    pub fn insert_verse_corpus(
        &self,
        source_book_id: i32,
        language: Language,
        records: &[VerseRecord],
        policy: UnnumberedPolicy,
    ) -> Result<usize> {
        self.do_write(|conn| {
            conn.transaction(|conn| {
                use crate::db::schema::bible_books::dsl as bb;

                let mut book_ids: HashMap<String, Option<i32>> = HashMap::new();
                let mut chapter_ids: HashMap<(i32, i32), i32> = HashMap::new();
                let mut inserted = 0usize;

                for record in records {
                    // Emitted records always carry a position once the gated
                    // pass has started; skip anything malformed anyway.
                    let (Some(book), Some(chapter)) = (&record.book, record.chapter) else {
                        continue;
                    };

                    if record.verse_number.is_none() && policy == UnnumberedPolicy::Discard {
                        continue;
                    }

                    let bible_book_id = match book_ids.get(book.as_str()) {
                        Some(cached) => *cached,
                        None => {
                            let found: Option<i32> = bb::bible_books
                                .filter(bb::title.eq(book.as_str()))
                                .filter(bb::language.eq(language.code()))
                                .select(bb::id)
                                .first(conn)
                                .optional()?;
                            book_ids.insert(book.clone(), found);
                            found
                        }
                    };
                    let Some(bible_book_id) = bible_book_id else {
                        warn!("no catalog row for book {:?} ({}), record skipped", book, language.code());
                        continue;
                    };

                    let chapter_id = match chapter_ids.get(&(bible_book_id, chapter)) {
                        Some(id) => *id,
                        None => {
                            let id = ensure_chapter(conn, bible_book_id, chapter)?;
                            chapter_ids.insert((bible_book_id, chapter), id);
                            id
                        }
                    };

                    let verse_id = ensure_verse(conn, chapter_id, record.verse_number)?;

                    let content = NewContent {
                        book_id: source_book_id,
                        start_verse_id: Some(verse_id),
                        end_verse_id: Some(verse_id),
                        text: &record.text,
                    };
                    diesel::insert_into(crate::db::schema::contents::table)
                        .values(&content)
                        .execute(conn)?;
                    inserted += 1;
                }

                debug!("inserted {} verse contents for book id {}", inserted, source_book_id);
                Ok(inserted)
            })
        })
    }

    /// Persist commentary passages. A citation that cannot be resolved
    /// against the catalog (unknown book, chapter or verse never ingested)
    /// is skipped with a warning.
    pub fn insert_range_passages(
        &self,
        source_book_id: i32,
        language: Language,
        passages: &[RangePassage],
    ) -> Result<usize> {
        self.do_write(|conn| {
            conn.transaction(|conn| {
                let mut inserted = 0usize;

                for passage in passages {
                    let start = resolve_cited_verse(conn, language, &passage.start.book, passage.start.chapter, passage.start.verse)?;
                    let end = resolve_cited_verse(conn, language, &passage.end.book, passage.end.chapter, passage.end.verse)?;

                    let (Some(start_id), Some(end_id)) = (start, end) else {
                        warn!(
                            "citation {} {}:{}-{} does not resolve, passage skipped",
                            passage.start.book, passage.start.chapter, passage.start.verse, passage.end.verse
                        );
                        continue;
                    };

                    let content = NewContent {
                        book_id: source_book_id,
                        start_verse_id: Some(start_id),
                        end_verse_id: Some(end_id),
                        text: &passage.text,
                    };
                    diesel::insert_into(crate::db::schema::contents::table)
                        .values(&content)
                        .execute(conn)?;
                    inserted += 1;
                }

                debug!("inserted {} range passages for book id {}", inserted, source_book_id);
                Ok(inserted)
            })
        })
    }

    /// Persist introduction sections as whole, unsegmented blocks with null
    /// verse bounds, in reading order.
    pub fn insert_whole_blocks(&self, source_book_id: i32, sections: &[Section]) -> Result<usize> {
        self.do_write(|conn| {
            conn.transaction(|conn| {
                let mut inserted = 0usize;
                for section in sections {
                    if section.text.trim().is_empty() {
                        continue;
                    }
                    let content = NewContent {
                        book_id: source_book_id,
                        start_verse_id: None,
                        end_verse_id: None,
                        text: &section.text,
                    };
                    diesel::insert_into(crate::db::schema::contents::table)
                        .values(&content)
                        .execute(conn)?;
                    inserted += 1;
                }
                Ok(inserted)
            })
        })
    }

    /// Staged lookup: book (title or abbreviation, LIKE) -> chapter ->
    /// verse -> all content blocks whose [start, end] range covers the
    /// verse. Null-bounded rows never match a range query.
    pub fn find_reference(&self, vref: &VerseRef) -> Result<LookupOutcome> {
        use crate::db::schema::bible_books::dsl as bb;
        use crate::db::schema::chapters::dsl as ch;
        use crate::db::schema::verses::dsl as v;
        use crate::db::schema::{books, contents};

        let pattern = format!("%{}%", vref.book);
        let chapter_number = vref.chapter;
        let verse_number = vref.verse;

        self.do_read(|conn| {
            let bible_book_id: Option<i32> = bb::bible_books
                .filter(bb::title.like(pattern.as_str()).or(bb::abbreviation.like(pattern.as_str())))
                .select(bb::id)
                .order(bb::id.asc())
                .first(conn)
                .optional()?;
            let Some(bible_book_id) = bible_book_id else {
                return Ok(LookupOutcome::BookNotFound(vref.book.clone()));
            };

            let chapter_id: Option<i32> = ch::chapters
                .filter(ch::bible_book_id.eq(bible_book_id))
                .filter(ch::number.eq(chapter_number))
                .select(ch::id)
                .first(conn)
                .optional()?;
            let Some(chapter_id) = chapter_id else {
                return Ok(LookupOutcome::ChapterNotFound {
                    book: vref.book.clone(),
                    chapter: chapter_number,
                });
            };

            let verse_id: Option<i32> = v::verses
                .filter(v::chapter_id.eq(chapter_id))
                .filter(v::number.eq(verse_number))
                .select(v::id)
                .first(conn)
                .optional()?;
            let Some(verse_id) = verse_id else {
                return Ok(LookupOutcome::VerseNotFound {
                    book: vref.book.clone(),
                    chapter: chapter_number,
                    verse: verse_number,
                });
            };

            let rows: Vec<(i32, Option<i32>, Option<i32>, String, String)> = contents::table
                .inner_join(books::table)
                .filter(contents::start_verse_id.le(verse_id))
                .filter(contents::end_verse_id.ge(verse_id))
                .select((
                    contents::id,
                    contents::start_verse_id,
                    contents::end_verse_id,
                    contents::text,
                    books::title,
                ))
                .order(contents::id.asc())
                .load(conn)?;

            let hits = rows
                .into_iter()
                .map(|(content_id, start_verse_id, end_verse_id, text, source_book)| ContentHit {
                    content_id,
                    source_book,
                    start_verse_id,
                    end_verse_id,
                    text,
                })
                .collect();

            Ok(LookupOutcome::Hits(hits))
        })
    }

    /// Count content rows attached to a source book.
    pub fn content_count(&self, source_book_id: i32) -> Result<i64> {
        use crate::db::schema::contents::dsl::*;
        self.do_read(|conn| {
            contents.filter(book_id.eq(source_book_id)).count().get_result(conn)
        })
    }
}

fn ensure_chapter(
    conn: &mut SqliteConnection,
    for_bible_book_id: i32,
    chapter_number: i32,
) -> Result<i32, diesel::result::Error> {
    use crate::db::schema::chapters::dsl::*;

    let existing: Option<i32> = chapters
        .filter(bible_book_id.eq(for_bible_book_id))
        .filter(number.eq(chapter_number))
        .select(id)
        .first(conn)
        .optional()?;
    if let Some(chapter_id) = existing {
        return Ok(chapter_id);
    }

    let row = NewChapter {
        bible_book_id: for_bible_book_id,
        number: chapter_number,
        is_ambiguous: false,
    };
    diesel::insert_into(chapters).values(&row).execute(conn)?;

    chapters
        .filter(bible_book_id.eq(for_bible_book_id))
        .filter(number.eq(chapter_number))
        .select(id)
        .first(conn)
}

/// Numbered verses are shared rows; unnumbered records each get their own
/// row, flagged ambiguous, since there is no number to key them on.
fn ensure_verse(
    conn: &mut SqliteConnection,
    for_chapter_id: i32,
    verse_number: Option<i32>,
) -> Result<i32, diesel::result::Error> {
    use crate::db::schema::verses::dsl::*;

    if let Some(n) = verse_number {
        let existing: Option<i32> = verses
            .filter(chapter_id.eq(for_chapter_id))
            .filter(number.eq(n))
            .select(id)
            .first(conn)
            .optional()?;
        if let Some(verse_id) = existing {
            return Ok(verse_id);
        }
    }

    let row = NewVerse {
        chapter_id: for_chapter_id,
        number: verse_number,
        is_ambiguous: verse_number.is_none(),
    };
    diesel::insert_into(verses).values(&row).execute(conn)?;

    verses
        .select(id)
        .order(id.desc())
        .first(conn)
}

/// Resolve a cited (book, chapter, verse) against the catalog, matching the
/// cited book text against titles and abbreviations. Returns None when any
/// stage misses.
fn resolve_cited_verse(
    conn: &mut SqliteConnection,
    language: Language,
    cited_book: &str,
    cited_chapter: i32,
    cited_verse: i32,
) -> Result<Option<i32>, diesel::result::Error> {
    use crate::db::schema::bible_books::dsl as bb;
    use crate::db::schema::chapters::dsl as ch;
    use crate::db::schema::verses::dsl as v;

    let pattern = format!("%{}%", cited_book);
    let bible_book_id: Option<i32> = bb::bible_books
        .filter(bb::language.eq(language.code()))
        .filter(bb::title.like(pattern.as_str()).or(bb::abbreviation.like(pattern.as_str())))
        .select(bb::id)
        .order(bb::book_order.asc())
        .first(conn)
        .optional()?;
    let Some(bible_book_id) = bible_book_id else {
        return Ok(None);
    };

    let chapter_id: Option<i32> = ch::chapters
        .filter(ch::bible_book_id.eq(bible_book_id))
        .filter(ch::number.eq(cited_chapter))
        .select(ch::id)
        .first(conn)
        .optional()?;
    let Some(chapter_id) = chapter_id else {
        return Ok(None);
    };

    v::verses
        .filter(v::chapter_id.eq(chapter_id))
        .filter(v::number.eq(cited_verse))
        .select(v::id)
        .first(conn)
        .optional()
}
