//! SQLite-backed [`NameStore`] implementation.
//!
//! Maps each [`NameStore`] operation to SQL against the schema created by
//! [`crate::migrate`]. Batches of occurrences are bulk loaded with
//! multi-row `INSERT ... VALUES` statements inside a single transaction.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use uuid::Uuid;

use pagenames_core::models::{AnnotationType, Item, ItemSummary, PageNameString};
use pagenames_core::store::NameStore;

// 7 binds per row; 1,000 rows stays far below SQLite's bind limit.
const ROWS_PER_STATEMENT: usize = 1_000;

/// SQLite implementation of the [`NameStore`] trait.
///
/// Cloning is cheap; clones share the same connection pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Read back the stored occurrences of a page, in insertion order.
    pub async fn page_name_strings(&self, page_id: i64) -> Result<Vec<PageNameString>> {
        let rows = sqlx::query(
            r#"
            SELECT page_id, name_string_id, offset_start, offset_end, odds,
                   annotation, annotation_type
            FROM page_name_strings
            WHERE page_id = ?
            ORDER BY id
            "#,
        )
        .bind(page_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<PageNameString> {
                let name_string_id: String = row.get("name_string_id");
                let annotation_type: i64 = row.get("annotation_type");
                Ok(PageNameString {
                    page_id: row.get("page_id"),
                    name_string_id: Uuid::parse_str(&name_string_id)
                        .with_context(|| format!("bad name_string_id {:?}", name_string_id))?,
                    offset_start: u32::try_from(row.get::<i64, _>("offset_start"))?,
                    offset_end: u32::try_from(row.get::<i64, _>("offset_end"))?,
                    odds: row.get("odds"),
                    annotation: row.get("annotation"),
                    annotation_type: AnnotationType::from_code(annotation_type)
                        .with_context(|| format!("bad annotation_type {}", annotation_type))?,
                })
            })
            .collect()
    }

    /// Read an item's classification summary by barcode.
    pub async fn item_summary(&self, barcode: &str) -> Result<Option<ItemSummary>> {
        let row = sqlx::query(
            r#"
            SELECT paths_total, animalia_num, plantae_num, fungi_num, bacteria_num,
                   majority_kingdom, kingdom_percentage, context
            FROM items
            WHERE barcode = ?
            "#,
        )
        .bind(barcode)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| ItemSummary {
            paths_total: row.get("paths_total"),
            animalia_num: row.get("animalia_num"),
            plantae_num: row.get("plantae_num"),
            fungi_num: row.get("fungi_num"),
            bacteria_num: row.get("bacteria_num"),
            majority_kingdom: row.get("majority_kingdom"),
            kingdom_percentage: row.get("kingdom_percentage"),
            context: row.get("context"),
        }))
    }
}

#[async_trait]
impl NameStore for SqliteStore {
    async fn truncate_page_name_strings(&self) -> Result<()> {
        sqlx::query("DELETE FROM page_name_strings")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn reset_item_summaries(&self) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE items SET
                paths_total = 0,
                animalia_num = 0,
                plantae_num = 0,
                fungi_num = 0,
                bacteria_num = 0,
                majority_kingdom = '',
                kingdom_percentage = 0,
                context = ''
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn find_item(&self, barcode: &str) -> Result<Option<Item>> {
        let row: Option<(i64, String)> =
            sqlx::query_as("SELECT id, barcode FROM items WHERE barcode = ?")
                .bind(barcode)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(id, barcode)| Item { id, barcode }))
    }

    async fn save_item_summary(&self, item_id: i64, summary: &ItemSummary) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE items SET
                paths_total = ?,
                animalia_num = ?,
                plantae_num = ?,
                fungi_num = ?,
                bacteria_num = ?,
                majority_kingdom = ?,
                kingdom_percentage = ?,
                context = ?
            WHERE id = ?
            "#,
        )
        .bind(summary.paths_total)
        .bind(summary.animalia_num)
        .bind(summary.plantae_num)
        .bind(summary.fungi_num)
        .bind(summary.bacteria_num)
        .bind(&summary.majority_kingdom)
        .bind(summary.kingdom_percentage)
        .bind(&summary.context)
        .bind(item_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_page_name_strings(&self, batch: &[PageNameString]) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        // Dropping the transaction on error rolls it back.
        let mut tx = self.pool.begin().await?;

        for rows in batch.chunks(ROWS_PER_STATEMENT) {
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO page_name_strings \
                 (page_id, name_string_id, offset_start, offset_end, odds, annotation, annotation_type) ",
            );
            qb.push_values(rows, |mut b, r| {
                b.push_bind(r.page_id)
                    .push_bind(r.name_string_id.to_string())
                    .push_bind(i64::from(r.offset_start))
                    .push_bind(i64::from(r.offset_end))
                    .push_bind(r.odds)
                    .push_bind(r.annotation.as_str())
                    .push_bind(r.annotation_type.code());
            });
            qb.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
