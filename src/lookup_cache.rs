//! Durable page lookup cache.
//!
//! Maps the composite key `"<sequence>|<item id>"` to a page id. The cache
//! lives in its own directory as a single SQLite database whose table is a
//! `WITHOUT ROWID` B-tree keyed by the composite key, so entries are stored
//! in key order and a lookup is one index probe.
//!
//! The pipeline only reads from the cache. It is filled by
//! [`crate::cache_cmd::rebuild_cache`] and wiped with [`LookupCache::reset`].
//!
//! A missing key is not an error: [`LookupCache::get`] returns `None` and
//! the caller skips the page. Any other failure is a [`CacheError`].

use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite};
use thiserror::Error;

use pagenames_core::store::PageLookup;

/// File name of the cache database inside the cache directory.
pub const CACHE_FILE: &str = "lookup.db";

// Two binds per entry keeps one statement well under SQLite's bind limit.
const ENTRIES_PER_STATEMENT: usize = 5_000;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cannot open lookup cache at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: sqlx::Error,
    },

    #[error("cannot prepare lookup cache directory {path}: {source}")]
    Dir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("lookup cache read failed for key {key:?}: {source}")]
    Read {
        key: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("lookup cache write failed: {0}")]
    Write(#[source] sqlx::Error),
}

/// Handle to an open lookup cache.
pub struct LookupCache {
    pool: SqlitePool,
}

impl LookupCache {
    /// Open the cache in `dir`, creating the directory and database if needed.
    pub async fn open(dir: &Path) -> Result<Self, CacheError> {
        std::fs::create_dir_all(dir).map_err(|source| CacheError::Dir {
            path: dir.to_path_buf(),
            source,
        })?;

        let path = dir.join(CACHE_FILE);
        let open_err = |source| CacheError::Open {
            path: path.clone(),
            source,
        };

        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(open_err)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS page_keys (
                key TEXT PRIMARY KEY,
                page_id INTEGER NOT NULL
            ) WITHOUT ROWID
            "#,
        )
        .execute(&pool)
        .await
        .map_err(open_err)?;

        Ok(Self { pool })
    }

    /// Destroy the cache directory and recreate it empty.
    ///
    /// Must not be called while a handle to the same directory is open.
    pub fn reset(dir: &Path) -> Result<(), CacheError> {
        let dir_err = |source| CacheError::Dir {
            path: dir.to_path_buf(),
            source,
        };
        if dir.exists() {
            std::fs::remove_dir_all(dir).map_err(dir_err)?;
        }
        std::fs::create_dir_all(dir).map_err(dir_err)?;
        Ok(())
    }

    /// Page id stored under `key`.
    ///
    /// The read runs in its own transaction, which is committed whether or
    /// not the key was found.
    pub async fn get(&self, key: &str) -> Result<Option<i64>, CacheError> {
        let read_err = |source| CacheError::Read {
            key: key.to_string(),
            source,
        };

        let mut tx = self.pool.begin().await.map_err(read_err)?;
        let page_id: Option<i64> =
            sqlx::query_scalar("SELECT page_id FROM page_keys WHERE key = ?")
                .bind(key)
                .fetch_optional(&mut *tx)
                .await
                .map_err(read_err)?;
        tx.commit().await.map_err(read_err)?;

        Ok(page_id)
    }

    /// Write entries in one transaction, replacing existing keys.
    pub async fn put_batch(&self, entries: &[(String, i64)]) -> Result<(), CacheError> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(CacheError::Write)?;
        for chunk in entries.chunks(ENTRIES_PER_STATEMENT) {
            let mut qb: QueryBuilder<Sqlite> =
                QueryBuilder::new("INSERT OR REPLACE INTO page_keys (key, page_id) ");
            qb.push_values(chunk, |mut b, (key, page_id)| {
                b.push_bind(key.as_str()).push_bind(*page_id);
            });
            qb.build()
                .execute(&mut *tx)
                .await
                .map_err(CacheError::Write)?;
        }
        tx.commit().await.map_err(CacheError::Write)?;

        Ok(())
    }

    /// Number of entries in the cache.
    pub async fn len(&self) -> Result<u64, CacheError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM page_keys")
            .fetch_one(&self.pool)
            .await
            .map_err(|source| CacheError::Read {
                key: String::new(),
                source,
            })?;
        Ok(count as u64)
    }

    pub async fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len().await? == 0)
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl PageLookup for LookupCache {
    async fn page_id(&self, key: &str) -> Result<Option<i64>> {
        Ok(self.get(key).await?)
    }
}
