use std::path::{Path, PathBuf};
use std::process::exit;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use dotenvy::dotenv;

use canonry_backend::LOOKUP_SNIPPET_LEN;
use canonry_backend::catalog::{BookCatalog, Language};
use canonry_backend::config::AppConfig;
use canonry_backend::coverage::CoverageReport;
use canonry_backend::db::StoreHandle;
use canonry_backend::db::store::LookupOutcome;
use canonry_backend::flatten::flatten_epub;
use canonry_backend::ingest::{IngestOutcome, ingest_epub, sync_directory};
use canonry_backend::logger::init_logger;
use canonry_backend::normalize::clean_source_text;
use canonry_backend::reference::parse_reference;
use canonry_backend::segment::segment_verses;
use canonry_backend::types::{Category, UnnumberedPolicy};

#[derive(Parser, Debug)]
#[command(author, version, about = "Canonry: scripture EPUB ingestion and reference lookup", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the SQLite store.
    /// If not provided, the DATABASE_FILE environment variable will be used.
    #[arg(long, global = true, value_name = "FILE_PATH", env = "DATABASE_FILE")]
    store_path: Option<PathBuf>,

    /// Directory scanned for EPUB resources.
    /// If not provided, the RESOURCES_PATH environment variable will be used.
    #[arg(long, global = true, value_name = "DIRECTORY_PATH", env = "RESOURCES_PATH")]
    resources_dir: Option<PathBuf>,

    /// Catalog language used for detection and seeding.
    #[arg(long, global = true, value_enum, default_value_t = LangArg::En)]
    language: LangArg,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Look up every content block covering a verse reference
    #[command(arg_required_else_help = true)]
    Lookup {
        /// Reference of the form "BookName C.V", e.g. "Colossians 3.16"
        reference: String,

        /// Scan the resources directory for new EPUBs before looking up
        #[arg(long, default_value_t = false)]
        sync: bool,
    },

    /// Ingest a single EPUB file under an explicit category
    #[command(arg_required_else_help = true)]
    Ingest {
        /// Path to the EPUB file
        #[arg(value_name = "FILE_PATH")]
        path: PathBuf,

        /// Document category
        #[arg(long, value_enum)]
        category: CategoryArg,

        /// Drop verse records whose leading number failed to parse instead
        /// of storing them unnumbered
        #[arg(long, default_value_t = false)]
        discard_unnumbered: bool,
    },

    /// Scan the resources directory and ingest every new EPUB.
    /// Categories come from the parent directory name
    /// (bible/, commentary/, introduction/).
    Sync,

    /// Create the store schema and seed the book catalogs
    InitDb,

    /// Segment one EPUB and report catalog coverage without writing anything
    #[command(arg_required_else_help = true)]
    Coverage {
        /// Path to the EPUB file
        #[arg(value_name = "FILE_PATH")]
        path: PathBuf,

        /// Exit non-zero when books are missing or a boundary is invalid
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LangArg {
    Fr,
    En,
}

impl std::fmt::Display for LangArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LangArg::Fr => write!(f, "fr"),
            LangArg::En => write!(f, "en"),
        }
    }
}

impl From<LangArg> for Language {
    fn from(value: LangArg) -> Self {
        match value {
            LangArg::Fr => Language::Fr,
            LangArg::En => Language::En,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum CategoryArg {
    Bible,
    Commentary,
    Introduction,
}

impl From<CategoryArg> for Category {
    fn from(value: CategoryArg) -> Self {
        match value {
            CategoryArg::Bible => Category::Bible,
            CategoryArg::Commentary => Category::Commentary,
            CategoryArg::Introduction => Category::Introduction,
        }
    }
}

fn cmd_lookup(store: &StoreHandle, config: &AppConfig, reference: &str, sync: bool) -> Result<()> {
    // Reject a malformed reference before any ingestion side effect.
    let vref = match parse_reference(reference) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("[ERROR] {}", e);
            exit(1);
        }
    };

    if sync {
        sync_directory(store, config)?;
    }

    match store.find_reference(&vref)? {
        LookupOutcome::Hits(hits) if !hits.is_empty() => {
            for hit in hits {
                println!("-----");
                println!("Source Book: {}", hit.source_book);
                if let (Some(start), Some(end)) = (hit.start_verse_id, hit.end_verse_id) {
                    println!("Verses Range: {} -> {}", start, end);
                }
                println!("Content:");
                let snippet: String = hit.text.chars().take(LOOKUP_SNIPPET_LEN).collect();
                let ellipsis = if hit.text.chars().count() > LOOKUP_SNIPPET_LEN { " ..." } else { "" };
                println!("{}{}", snippet, ellipsis);
            }
        }
        LookupOutcome::Hits(_) => {
            println!("No content found for {}.", reference);
        }
        LookupOutcome::BookNotFound(book) => {
            println!("[WARN] No match for book '{}'.", book);
        }
        LookupOutcome::ChapterNotFound { book, chapter } => {
            println!("[WARN] No match for chapter {} of book {}.", chapter, book);
        }
        LookupOutcome::VerseNotFound { book, chapter, verse } => {
            println!("[WARN] No match for verse {}.{} of book {}.", chapter, verse, book);
        }
    }

    Ok(())
}

fn cmd_ingest(
    store: &StoreHandle,
    config: &AppConfig,
    path: &Path,
    category: Category,
) -> Result<()> {
    match ingest_epub(store, config, path, category)? {
        IngestOutcome::Imported { title, contents, complete } => {
            println!("Imported '{}': {} content blocks.", title, contents);
            if !complete {
                eprintln!("[WARN] '{}' ended before the end boundary; the stored corpus is incomplete.", title);
            }
        }
        IngestOutcome::SkippedExisting { title } => {
            println!("Book '{}' already in store. Skipping.", title);
        }
    }
    Ok(())
}

fn cmd_sync(store: &StoreHandle, config: &AppConfig) -> Result<()> {
    let summary = sync_directory(store, config)?;
    println!(
        "Sync finished: {} imported, {} already present, {} without category, {} failed.",
        summary.imported.len(),
        summary.skipped_existing.len(),
        summary.skipped_no_category.len(),
        summary.failed.len()
    );
    for title in &summary.incomplete {
        eprintln!("[WARN] '{}' is incomplete: the end boundary was never reached.", title);
    }
    for (path, err) in &summary.failed {
        eprintln!("[WARN] {:?}: {}", path, err);
    }
    Ok(())
}

fn cmd_coverage(config: &AppConfig, path: &Path, strict: bool) -> Result<()> {
    let doc = flatten_epub(path)?;
    let catalog = BookCatalog::for_language(config.language);
    let text = clean_source_text(&doc.flattened_text());
    let corpus = segment_verses(&text, &catalog, &config.bounds);
    let report = CoverageReport::new(&corpus.records, &catalog, &config.bounds);

    println!("=== COVERAGE ({}) ===", config.language.code().to_uppercase());
    println!("Books detected ({}/{}):", report.detected.len(), catalog.len());
    println!("{}", report.detected.iter().cloned().collect::<Vec<_>>().join(", "));
    println!();
    println!("Missing books ({}):", report.missing.len());
    if report.missing.is_empty() {
        println!("none");
    } else {
        println!("{}", report.missing.iter().cloned().collect::<Vec<_>>().join(", "));
    }
    println!();
    println!("First book valid: {} ({:?})", report.valid_start, report.first_book);
    println!("Last book valid: {} ({:?})", report.valid_end, report.last_book);
    if !corpus.is_complete() {
        println!("Segmentation ended at end-of-input, before the end boundary.");
    }

    if strict {
        report.check_strict()?;
    }
    Ok(())
}

fn main() {
    // A missing .env file is fine; the environment may already be set.
    dotenv().ok();
    init_logger();

    let cli = Cli::parse();
    let language: Language = cli.language.into();

    let config = match AppConfig::resolve(cli.store_path, cli.resources_dir, language) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error resolving configuration: {:#}", e);
            exit(1);
        }
    };

    // Coverage runs without touching the store.
    if let Commands::Coverage { path, strict } = &cli.command {
        if let Err(e) = cmd_coverage(&config, path, *strict) {
            eprintln!("Error executing command: {:#}", e);
            exit(1);
        }
        return;
    }

    let store = match StoreHandle::open(&config.store_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error opening store {:?}: {:#}", config.store_path, e);
            exit(1);
        }
    };

    let command_result = match cli.command {
        Commands::Lookup { reference, sync } => cmd_lookup(&store, &config, &reference, sync),

        Commands::Ingest { path, category, discard_unnumbered } => {
            let config = if discard_unnumbered {
                config.clone().with_unnumbered_policy(UnnumberedPolicy::Discard)
            } else {
                config.clone()
            };
            cmd_ingest(&store, &config, &path, category.into())
        }

        Commands::Sync => cmd_sync(&store, &config),

        Commands::InitDb => {
            println!("Store initialized at {:?}.", config.store_path);
            Ok(())
        }

        Commands::Coverage { .. } => unreachable!("handled above"),
    };

    if let Err(e) = command_result {
        eprintln!("Error executing command: {:#}", e);
        exit(1);
    }
}
