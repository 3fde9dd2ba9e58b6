use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use dotenvy::dotenv;

use crate::catalog::Language;
use crate::segment::SegmentBounds;
use crate::types::UnnumberedPolicy;
use crate::{default_resources_dir, default_store_path};

/// Everything the pipeline needs, resolved up front. Components receive this
/// struct (or pieces of it); nothing below the CLI edge reads the
/// environment or prompts.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store_path: PathBuf,
    pub resources_dir: PathBuf,
    pub language: Language,
    pub bounds: SegmentBounds,
    pub unnumbered_policy: UnnumberedPolicy,
}

impl AppConfig {
    pub fn new(store_path: PathBuf, resources_dir: PathBuf, language: Language) -> Self {
        Self {
            store_path,
            resources_dir,
            language,
            bounds: SegmentBounds::canonical(language),
            unnumbered_policy: UnnumberedPolicy::default(),
        }
    }

    /// Resolve configuration at the process edge.
    ///
    /// Precedence per value: explicit argument, then environment
    /// (`DATABASE_FILE` / `RESOURCES_PATH`, a `.env` file is honored), then
    /// the per-user application directory.
    pub fn resolve(
        store_path: Option<PathBuf>,
        resources_dir: Option<PathBuf>,
        language: Language,
    ) -> Result<Self> {
        dotenv().ok();

        let store_path = match store_path {
            Some(p) => p,
            None => match env::var("DATABASE_FILE") {
                Ok(s) => PathBuf::from(s),
                Err(_) => default_store_path().context("Cannot determine a store path")?,
            },
        };

        let resources_dir = match resources_dir {
            Some(p) => p,
            None => match env::var("RESOURCES_PATH") {
                Ok(s) => PathBuf::from(s),
                Err(_) => default_resources_dir().context("Cannot determine a resources directory")?,
            },
        };

        Ok(Self::new(store_path, resources_dir, language))
    }

    pub fn with_bounds(mut self, bounds: SegmentBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_unnumbered_policy(mut self, policy: UnnumberedPolicy) -> Self {
        self.unnumbered_policy = policy;
        self
    }
}
