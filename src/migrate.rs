use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate_pool(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create all tables and indexes on an open pool. Idempotent.
pub async fn migrate_pool(pool: &SqlitePool) -> Result<()> {
    // Create items table; the classification columns are derived by ingest
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS items (
            id INTEGER PRIMARY KEY,
            barcode TEXT NOT NULL UNIQUE,
            paths_total INTEGER NOT NULL DEFAULT 0,
            animalia_num INTEGER NOT NULL DEFAULT 0,
            plantae_num INTEGER NOT NULL DEFAULT 0,
            fungi_num INTEGER NOT NULL DEFAULT 0,
            bacteria_num INTEGER NOT NULL DEFAULT 0,
            majority_kingdom TEXT NOT NULL DEFAULT '',
            kingdom_percentage INTEGER NOT NULL DEFAULT 0,
            context TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create pages table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pages (
            id INTEGER PRIMARY KEY,
            item_id INTEGER NOT NULL,
            sequence INTEGER NOT NULL,
            UNIQUE(item_id, sequence),
            FOREIGN KEY (item_id) REFERENCES items(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create page_name_strings table (bulk loaded, no uniqueness)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS page_name_strings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            page_id INTEGER NOT NULL,
            name_string_id TEXT NOT NULL,
            offset_start INTEGER NOT NULL,
            offset_end INTEGER NOT NULL,
            odds REAL NOT NULL,
            annotation TEXT NOT NULL DEFAULT '',
            annotation_type INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_pages_item_id ON pages(item_id)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_page_name_strings_page_id ON page_name_strings(page_id)",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_page_name_strings_name ON page_name_strings(name_string_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
