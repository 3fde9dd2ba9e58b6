use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::catalog::BookCatalog;
use crate::commentary::segment_commentary;
use crate::config::AppConfig;
use crate::coverage::CoverageReport;
use crate::db::StoreHandle;
use crate::flatten::flatten_epub;
use crate::normalize::clean_source_text;
use crate::segment::segment_verses;
use crate::types::Category;

/// What happened to one EPUB file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Imported {
        title: String,
        contents: usize,
        /// False when the gated pass hit end-of-input before the end
        /// boundary: the stored corpus is incomplete.
        complete: bool,
    },
    SkippedExisting {
        title: String,
    },
}

/// Aggregate results of one directory scan.
#[derive(Debug, Default)]
pub struct SyncSummary {
    pub imported: Vec<String>,
    pub skipped_existing: Vec<String>,
    pub skipped_no_category: Vec<PathBuf>,
    pub incomplete: Vec<String>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Ingest one EPUB under an already-resolved category.
///
/// Idempotent on the document title: when a book row with the same title
/// exists, nothing is parsed or written.
pub fn ingest_epub(
    store: &StoreHandle,
    config: &AppConfig,
    epub_path: &Path,
    category: Category,
) -> Result<IngestOutcome> {
    let doc = flatten_epub(epub_path)
        .with_context(|| format!("Cannot flatten {:?}", epub_path))?;
    let title = doc.meta.title.clone();

    if store.book_exists(&title)? {
        info!("book {:?} already in store, skipping", title);
        return Ok(IngestOutcome::SkippedExisting { title });
    }

    info!("importing {:?} as {:?} ({})", title, category.title(), config.language.code());
    let book_id = store.insert_book(&doc.meta, category)?;

    let (contents, complete) = match category {
        Category::Bible => {
            let catalog = BookCatalog::for_language(config.language);
            let text = clean_source_text(&doc.flattened_text());
            let corpus = segment_verses(&text, &catalog, &config.bounds);

            let report = CoverageReport::new(&corpus.records, &catalog, &config.bounds);
            report.log_summary(&catalog);

            if !corpus.is_complete() {
                warn!(
                    "{:?}: input ended before the end boundary, storing an incomplete corpus ({} records)",
                    title,
                    corpus.records.len()
                );
            }

            let n = store.insert_verse_corpus(
                book_id,
                config.language,
                &corpus.records,
                config.unnumbered_policy,
            )?;
            (n, corpus.is_complete())
        }
        Category::Commentary => {
            let passages = segment_commentary(&doc.sections);
            let n = store.insert_range_passages(book_id, config.language, &passages)?;
            (n, true)
        }
        Category::Introduction => {
            let n = store.insert_whole_blocks(book_id, &doc.sections)?;
            (n, true)
        }
    };

    info!("imported {:?}: {} content blocks", title, contents);
    Ok(IngestOutcome::Imported { title, contents, complete })
}

/// Resolve a document's category from its parent directory name
/// (`bible/`, `commentary/`, `introduction/`). Categories are never
/// prompted for; a file that resolves to none is skipped.
pub fn category_from_path(path: &Path) -> Option<Category> {
    let parent = path.parent()?.file_name()?.to_str()?;
    parent.to_lowercase().parse().ok()
}

/// Scan the resources directory and ingest every EPUB that is not yet in
/// the store. Walks in sorted order so repeated runs see files in the same
/// sequence.
pub fn sync_directory(store: &StoreHandle, config: &AppConfig) -> Result<SyncSummary> {
    let mut summary = SyncSummary::default();

    let walker = WalkDir::new(&config.resources_dir)
        .follow_links(true)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("cannot read directory entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let is_epub = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("epub"))
            .unwrap_or(false);
        if !is_epub {
            continue;
        }

        info!("found EPUB: {:?}", path);
        let Some(category) = category_from_path(path) else {
            warn!(
                "{:?}: no category directory (expected bible/, commentary/ or introduction/), skipping",
                path
            );
            summary.skipped_no_category.push(path.to_path_buf());
            continue;
        };

        match ingest_epub(store, config, path, category) {
            Ok(IngestOutcome::Imported { title, complete, .. }) => {
                if !complete {
                    summary.incomplete.push(title.clone());
                }
                summary.imported.push(title);
            }
            Ok(IngestOutcome::SkippedExisting { title }) => {
                summary.skipped_existing.push(title);
            }
            Err(e) => {
                warn!("failed to ingest {:?}: {:#}", path, e);
                summary.failed.push((path.to_path_buf(), format!("{:#}", e)));
            }
        }
    }

    info!(
        "sync finished: {} imported, {} already present, {} without category, {} failed",
        summary.imported.len(),
        summary.skipped_existing.len(),
        summary.skipped_no_category.len(),
        summary.failed.len()
    );
    Ok(summary)
}
