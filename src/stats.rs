//! Database statistics overview.
//!
//! Summarizes what the last ingest run produced: item, page and occurrence
//! counts, how many items received a classification, and a breakdown by
//! majority kingdom. Used by `pagenames stats`.

use anyhow::Result;
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use crate::db;
use crate::progress::format_number;

/// Counts shown by `pagenames stats`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stats {
    pub items: i64,
    pub pages: i64,
    pub page_name_strings: i64,
    /// Items with a non-empty majority kingdom.
    pub classified_items: i64,
    /// `(kingdom, items)` ordered by item count, largest first.
    pub kingdoms: Vec<(String, i64)>,
}

pub async fn collect_stats(pool: &SqlitePool) -> Result<Stats> {
    let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
        .fetch_one(pool)
        .await?;

    let pages: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pages")
        .fetch_one(pool)
        .await?;

    let page_name_strings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM page_name_strings")
        .fetch_one(pool)
        .await?;

    let kingdom_rows = sqlx::query(
        r#"
        SELECT majority_kingdom, COUNT(*) AS item_count
        FROM items
        WHERE majority_kingdom <> ''
        GROUP BY majority_kingdom
        ORDER BY item_count DESC, majority_kingdom
        "#,
    )
    .fetch_all(pool)
    .await?;

    let kingdoms: Vec<(String, i64)> = kingdom_rows
        .iter()
        .map(|row| (row.get("majority_kingdom"), row.get("item_count")))
        .collect();

    Ok(Stats {
        items,
        pages,
        page_name_strings,
        classified_items: kingdoms.iter().map(|(_, n)| n).sum(),
        kingdoms,
    })
}

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let stats = collect_stats(&pool).await?;
    pool.close().await;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("pagenames — Database Stats");
    println!("==========================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Items:       {}", format_number(stats.items as u64));
    println!("  Pages:       {}", format_number(stats.pages as u64));
    println!(
        "  Names:       {}",
        format_number(stats.page_name_strings as u64)
    );
    println!(
        "  Classified:  {} / {} ({}%)",
        stats.classified_items,
        stats.items,
        if stats.items > 0 {
            (stats.classified_items * 100) / stats.items
        } else {
            0
        }
    );

    if !stats.kingdoms.is_empty() {
        println!();
        println!("  By majority kingdom:");
        println!("  {:<24} {:>8}", "KINGDOM", "ITEMS");
        println!("  {}", "-".repeat(33));
        for (kingdom, count) in &stats.kingdoms {
            println!("  {:<24} {:>8}", kingdom, count);
        }
    }

    println!();
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
