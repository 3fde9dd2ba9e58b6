pub mod catalog;
pub mod commentary;
pub mod config;
pub mod coverage;
pub mod flatten;
pub mod ingest;
pub mod logger;
pub mod normalize;
pub mod reference;
pub mod segment;
pub mod types;

pub mod db;

use std::fs::create_dir_all;
use std::path::PathBuf;

use anyhow::Result;
use app_dirs::{AppDataType, AppInfo, get_app_root};

pub const APP_INFO: AppInfo = AppInfo { name: "canonry", author: "canonry" };

/// Lookup output is truncated to this many characters per content block.
pub static LOOKUP_SNIPPET_LEN: usize = 300;

pub fn get_create_app_root() -> Result<PathBuf> {
    let p = get_app_root(AppDataType::UserData, &APP_INFO)?;
    if !p.exists() {
        create_dir_all(&p)?;
    }
    Ok(p)
}

/// Default SQLite store location when neither the CLI nor the environment
/// supplies one.
pub fn default_store_path() -> Result<PathBuf> {
    Ok(get_create_app_root()?.join("canonry.sqlite3"))
}

/// Default directory scanned for EPUB resources.
pub fn default_resources_dir() -> Result<PathBuf> {
    let p = get_create_app_root()?.join("resources");
    if !p.exists() {
        create_dir_all(&p)?;
    }
    Ok(p)
}
