//! TOML configuration.
//!
//! ```toml
//! [db]
//! path = "./data/pagenames.sqlite"
//!
//! [cache]
//! dir = "./data/lookup"
//!
//! [input]
//! dir = "./data/input"
//!
//! [ingest]
//! progress_every = 1000
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub cache: CacheConfig,
    pub input: InputConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

/// Directory holding the page lookup cache.
#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    pub dir: PathBuf,
}

/// Working directory of a run; the missing-items report is written here.
#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    pub dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    /// Emit a progress event every this many finished items.
    #[serde(default = "default_progress_every")]
    pub progress_every: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            progress_every: default_progress_every(),
        }
    }
}

fn default_progress_every() -> u64 {
    1_000
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if config.ingest.progress_every == 0 {
        anyhow::bail!("ingest.progress_every must be > 0");
    }

    if config.cache.dir.as_os_str().is_empty() {
        anyhow::bail!("cache.dir must not be empty");
    }

    Ok(config)
}
