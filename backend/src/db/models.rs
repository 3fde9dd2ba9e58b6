use diesel::prelude::*;

use crate::db::schema::*;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, PartialEq)]
#[diesel(table_name = categories)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Category {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub abbreviation: Option<String>,
}

#[derive(Insertable)]
#[diesel(table_name = categories)]
pub struct NewCategory<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub abbreviation: Option<&'a str>,
}

/// One canonical scripture book of a language catalog. Seeded from the
/// catalog at schema creation; lookup resolves user-typed names against
/// `title` and `abbreviation`.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, PartialEq)]
#[diesel(table_name = bible_books)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BibleBook {
    pub id: i32,
    pub title: String,
    pub abbreviation: String,
    pub language: String,
    pub book_order: i32,
    pub is_deuterocanonical: bool,
    pub is_old_testament: bool,
    pub is_new_testament: bool,
}

#[derive(Insertable)]
#[diesel(table_name = bible_books)]
pub struct NewBibleBook<'a> {
    pub title: &'a str,
    pub abbreviation: &'a str,
    pub language: &'a str,
    pub book_order: i32,
    pub is_deuterocanonical: bool,
    pub is_old_testament: bool,
    pub is_new_testament: bool,
}

/// An ingested source document (a bible edition, a commentary volume, an
/// introduction). Identity for idempotent ingestion is the title.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, PartialEq)]
#[diesel(table_name = books)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub abbreviation: Option<String>,
    pub language: Option<String>,
    pub authors: Option<String>,
    pub cover: Option<String>,
    pub metadata_json: Option<String>,
    pub category_id: Option<i32>,
}

#[derive(Insertable)]
#[diesel(table_name = books)]
pub struct NewBook<'a> {
    pub title: &'a str,
    pub abbreviation: Option<&'a str>,
    pub language: Option<&'a str>,
    pub authors: Option<&'a str>,
    pub cover: Option<&'a str>,
    pub metadata_json: Option<&'a str>,
    pub category_id: Option<i32>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, PartialEq, Associations)]
#[diesel(belongs_to(BibleBook, foreign_key = bible_book_id))]
#[diesel(table_name = chapters)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Chapter {
    pub id: i32,
    pub bible_book_id: i32,
    pub number: i32,
    pub is_ambiguous: bool,
}

#[derive(Insertable)]
#[diesel(table_name = chapters)]
pub struct NewChapter {
    pub bible_book_id: i32,
    pub number: i32,
    pub is_ambiguous: bool,
}

/// `number` is null for records whose leading digits failed numeric
/// parsing; those rows are flagged ambiguous.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, PartialEq, Associations)]
#[diesel(belongs_to(Chapter, foreign_key = chapter_id))]
#[diesel(table_name = verses)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Verse {
    pub id: i32,
    pub chapter_id: i32,
    pub number: Option<i32>,
    pub is_ambiguous: bool,
}

#[derive(Insertable)]
#[diesel(table_name = verses)]
pub struct NewVerse {
    pub chapter_id: i32,
    pub number: Option<i32>,
    pub is_ambiguous: bool,
}

/// A text block attached to a verse range of the canon. Null bounds mean
/// whole-book content (introductions); equal bounds mean a single verse.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, PartialEq, Associations)]
#[diesel(belongs_to(Book, foreign_key = book_id))]
#[diesel(table_name = contents)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Content {
    pub id: i32,
    pub book_id: i32,
    pub start_verse_id: Option<i32>,
    pub end_verse_id: Option<i32>,
    pub text: String,
}

#[derive(Insertable)]
#[diesel(table_name = contents)]
pub struct NewContent<'a> {
    pub book_id: i32,
    pub start_verse_id: Option<i32>,
    pub end_verse_id: Option<i32>,
    pub text: &'a str,
}
