use diesel::prelude::*;
use tempfile::TempDir;

use canonry_backend::catalog::{BookCatalog, Language};
use canonry_backend::db::StoreHandle;
use canonry_backend::db::store::LookupOutcome;
use canonry_backend::flatten::BookMeta;
use canonry_backend::reference::parse_reference;
use canonry_backend::segment::{SegmentBounds, segment_verses};
use canonry_backend::types::{
    Category, CitedRef, RangePassage, Section, UnnumberedPolicy, VerseRecord,
};

fn open_temp_store() -> (TempDir, StoreHandle) {
    let dir = TempDir::new().expect("tempdir");
    let store = StoreHandle::open(&dir.path().join("canonry.sqlite3")).expect("open store");
    (dir, store)
}

fn meta(title: &str) -> BookMeta {
    BookMeta {
        title: title.to_string(),
        author: Some("Test Author".to_string()),
        language: Some("fr".to_string()),
        metadata_json: "[]".to_string(),
    }
}

const SOURCE_TEXT: &str = "Genèse 1\n\
    1 Au commencement Dieu créa le ciel et la terre\n\
    2 La terre était déserte et vide\n\
    Genèse 2\n\
    1 Ainsi furent achevés le ciel et la terre\n\
    Apocalypse 22\n\
    21 Que la grâce du Seigneur soit avec tous";

fn ingest_source_corpus(store: &StoreHandle) -> i32 {
    let catalog = BookCatalog::for_language(Language::Fr);
    let bounds = SegmentBounds::canonical(Language::Fr);
    let corpus = segment_verses(SOURCE_TEXT, &catalog, &bounds);
    assert!(corpus.is_complete());

    let book_id = store.insert_book(&meta("Bible de test"), Category::Bible).expect("insert book");
    store
        .insert_verse_corpus(book_id, Language::Fr, &corpus.records, UnnumberedPolicy::Keep)
        .expect("insert corpus");
    book_id
}

#[test]
fn test_schema_is_seeded() {
    use canonry_backend::db::schema::{bible_books, categories};

    let (_dir, store) = open_temp_store();

    let mut conn = store.get_conn().expect("conn");
    let n_categories: i64 = categories::table.count().get_result(&mut conn).expect("count");
    assert_eq!(n_categories, 3);

    let n_books: i64 = bible_books::table.count().get_result(&mut conn).expect("count");
    // Both language catalogs, 73 books each.
    assert_eq!(n_books, 146);

    let fr_books: i64 = bible_books::table
        .filter(bible_books::language.eq("fr"))
        .count()
        .get_result(&mut conn)
        .expect("count");
    assert_eq!(fr_books, 73);
}

#[test]
fn test_reopening_does_not_duplicate_seed() {
    use canonry_backend::db::schema::bible_books;

    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("canonry.sqlite3");

    let store = StoreHandle::open(&path).expect("open store");
    drop(store);
    let store = StoreHandle::open(&path).expect("reopen store");

    let mut conn = store.get_conn().expect("conn");
    let n_books: i64 = bible_books::table.count().get_result(&mut conn).expect("count");
    assert_eq!(n_books, 146);
}

#[test]
fn test_corpus_roundtrip_lookup() {
    let (_dir, store) = open_temp_store();
    ingest_source_corpus(&store);

    let vref = parse_reference("Genèse 1.2").expect("parse");
    match store.find_reference(&vref).expect("lookup") {
        LookupOutcome::Hits(hits) => {
            assert_eq!(hits.len(), 1);
            assert_eq!(hits[0].text, "La terre était déserte et vide");
            assert_eq!(hits[0].source_book, "Bible de test");
            assert_eq!(hits[0].start_verse_id, hits[0].end_verse_id);
        }
        other => panic!("expected hits, got {:?}", other),
    }
}

#[test]
fn test_lookup_misses_are_staged() {
    let (_dir, store) = open_temp_store();
    ingest_source_corpus(&store);

    let vref = parse_reference("Zorp 1.1").expect("parse");
    assert_eq!(
        store.find_reference(&vref).expect("lookup"),
        LookupOutcome::BookNotFound("Zorp".to_string())
    );

    let vref = parse_reference("Genèse 9.1").expect("parse");
    assert_eq!(
        store.find_reference(&vref).expect("lookup"),
        LookupOutcome::ChapterNotFound { book: "Genèse".to_string(), chapter: 9 }
    );

    let vref = parse_reference("Genèse 1.9").expect("parse");
    assert_eq!(
        store.find_reference(&vref).expect("lookup"),
        LookupOutcome::VerseNotFound { book: "Genèse".to_string(), chapter: 1, verse: 9 }
    );
}

#[test]
fn test_book_exists_makes_ingestion_idempotent() {
    let (_dir, store) = open_temp_store();
    assert!(!store.book_exists("Bible de test").expect("exists"));
    ingest_source_corpus(&store);
    assert!(store.book_exists("Bible de test").expect("exists"));
}

#[test]
fn test_commentary_range_overlaps_verse_lookup() {
    let (_dir, store) = open_temp_store();
    ingest_source_corpus(&store);

    let commentary_id = store
        .insert_book(&meta("Commentaire sur la Genèse"), Category::Commentary)
        .expect("insert commentary book");

    let passages = vec![RangePassage {
        start: CitedRef { book: "Gen".to_string(), chapter: 1, verse: 1 },
        end: CitedRef { book: "Gen".to_string(), chapter: 1, verse: 2 },
        text: "Le commencement de toutes choses.".to_string(),
    }];
    let inserted = store
        .insert_range_passages(commentary_id, Language::Fr, &passages)
        .expect("insert passages");
    assert_eq!(inserted, 1);

    // Both verses of the cited range see the commentary block.
    for reference in ["Genèse 1.1", "Genèse 1.2"] {
        let vref = parse_reference(reference).expect("parse");
        match store.find_reference(&vref).expect("lookup") {
            LookupOutcome::Hits(hits) => {
                assert!(
                    hits.iter().any(|h| h.source_book == "Commentaire sur la Genèse"),
                    "{} should match the commentary range",
                    reference
                );
            }
            other => panic!("expected hits, got {:?}", other),
        }
    }

    // A verse outside the range does not.
    let vref = parse_reference("Genèse 2.1").expect("parse");
    match store.find_reference(&vref).expect("lookup") {
        LookupOutcome::Hits(hits) => {
            assert!(hits.iter().all(|h| h.source_book != "Commentaire sur la Genèse"));
        }
        other => panic!("expected hits, got {:?}", other),
    }
}

#[test]
fn test_unresolvable_citation_is_skipped() {
    let (_dir, store) = open_temp_store();
    ingest_source_corpus(&store);

    let commentary_id = store
        .insert_book(&meta("Commentaire perdu"), Category::Commentary)
        .expect("insert commentary book");

    let passages = vec![RangePassage {
        start: CitedRef { book: "Nowhere".to_string(), chapter: 1, verse: 1 },
        end: CitedRef { book: "Nowhere".to_string(), chapter: 1, verse: 2 },
        text: "Orphan block.".to_string(),
    }];
    let inserted = store
        .insert_range_passages(commentary_id, Language::Fr, &passages)
        .expect("insert passages");
    assert_eq!(inserted, 0);
    assert_eq!(store.content_count(commentary_id).expect("count"), 0);
}

#[test]
fn test_introduction_blocks_never_match_range_lookup() {
    let (_dir, store) = open_temp_store();
    ingest_source_corpus(&store);

    let intro_id = store
        .insert_book(&meta("Introduction au canon"), Category::Introduction)
        .expect("insert intro book");
    let sections = vec![
        Section { title: "Préface".to_string(), text: "Contexte historique.".to_string() },
        Section { title: "Vide".to_string(), text: "   ".to_string() },
    ];
    let inserted = store.insert_whole_blocks(intro_id, &sections).expect("insert blocks");
    // The blank section is dropped.
    assert_eq!(inserted, 1);

    let vref = parse_reference("Genèse 1.1").expect("parse");
    match store.find_reference(&vref).expect("lookup") {
        LookupOutcome::Hits(hits) => {
            // Null-bounded rows are excluded from range matches.
            assert!(hits.iter().all(|h| h.source_book != "Introduction au canon"));
        }
        other => panic!("expected hits, got {:?}", other),
    }
}

#[test]
fn test_unnumbered_policy_keep_vs_discard() {
    let (_dir, store) = open_temp_store();

    let records = vec![
        VerseRecord {
            book: Some("Genèse".to_string()),
            chapter: Some(1),
            verse_number: Some(1),
            text: "Au commencement".to_string(),
        },
        VerseRecord {
            book: Some("Genèse".to_string()),
            chapter: Some(1),
            verse_number: None,
            text: "numéro illisible".to_string(),
        },
    ];

    let keep_id = store.insert_book(&meta("Bible keep"), Category::Bible).expect("insert");
    let kept = store
        .insert_verse_corpus(keep_id, Language::Fr, &records, UnnumberedPolicy::Keep)
        .expect("insert");
    assert_eq!(kept, 2);
    assert_eq!(store.content_count(keep_id).expect("count"), 2);

    let discard_id = store.insert_book(&meta("Bible discard"), Category::Bible).expect("insert");
    let kept = store
        .insert_verse_corpus(discard_id, Language::Fr, &records, UnnumberedPolicy::Discard)
        .expect("insert");
    assert_eq!(kept, 1);
    assert_eq!(store.content_count(discard_id).expect("count"), 1);
}
