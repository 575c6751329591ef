//! Lookup cache maintenance commands.
//!
//! `pagenames cache reset` wipes the cache directory. `pagenames cache
//! rebuild` wipes it and then indexes every row of the `pages` table under
//! its `"<sequence>|<item id>"` key, streaming rows so the table never has
//! to fit in memory.

use std::path::Path;

use anyhow::{Context, Result};
use futures::TryStreamExt;
use sqlx::SqlitePool;
use tracing::{debug, info};

use pagenames_core::store::page_key;

use crate::config::Config;
use crate::db;
use crate::lookup_cache::LookupCache;
use crate::progress::format_number;

/// Entries written per cache transaction during a rebuild.
const REBUILD_BATCH: usize = 50_000;

pub fn run_cache_reset(config: &Config) -> Result<()> {
    LookupCache::reset(&config.cache.dir)?;
    println!("Lookup cache reset: {}", config.cache.dir.display());
    Ok(())
}

pub async fn run_cache_rebuild(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let indexed = rebuild_cache(&pool, &config.cache.dir).await?;
    pool.close().await;

    println!("cache rebuild");
    println!("  directory: {}", config.cache.dir.display());
    println!("  pages indexed: {}", format_number(indexed));
    println!("ok");
    Ok(())
}

/// Reset the cache in `dir` and fill it from the `pages` table.
///
/// Returns the number of pages indexed.
pub async fn rebuild_cache(pool: &SqlitePool, dir: &Path) -> Result<u64> {
    LookupCache::reset(dir)?;
    let cache = LookupCache::open(dir).await?;

    let mut rows = sqlx::query_as::<_, (i64, i64, i64)>(
        "SELECT id, item_id, sequence FROM pages ORDER BY item_id, sequence",
    )
    .fetch(pool);

    let mut batch: Vec<(String, i64)> = Vec::with_capacity(REBUILD_BATCH);
    let mut indexed = 0u64;

    while let Some((page_id, item_id, sequence)) =
        rows.try_next().await.context("Failed to read pages")?
    {
        let sequence = u32::try_from(sequence)
            .with_context(|| format!("page {} has invalid sequence {}", page_id, sequence))?;
        batch.push((page_key(sequence, item_id), page_id));

        if batch.len() >= REBUILD_BATCH {
            cache.put_batch(&batch).await?;
            indexed += batch.len() as u64;
            debug!(indexed, "cache batch written");
            batch.clear();
        }
    }
    cache.put_batch(&batch).await?;
    indexed += batch.len() as u64;

    cache.close().await;
    info!(indexed, dir = %dir.display(), "lookup cache rebuilt");
    Ok(indexed)
}
