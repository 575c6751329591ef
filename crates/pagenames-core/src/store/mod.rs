//! Storage abstractions for pagenames.
//!
//! The ingestion pipeline talks to two stores:
//!
//! - [`NameStore`]: the relational store holding items and the
//!   `page_name_strings` occurrence table.
//! - [`PageLookup`]: the local lookup cache translating a composite
//!   `"<sequence>|<item id>"` key into a page id.
//!
//! Implementations must be `Send + Sync`: the store is shared between the
//! ingestor and the batch uploader task.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Item, ItemSummary, PageNameString};

/// Relational store operations used by the pipeline.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`truncate_page_name_strings`](NameStore::truncate_page_name_strings) | Empty the occurrence table before a run |
/// | [`reset_item_summaries`](NameStore::reset_item_summaries) | Zero every item's classification fields |
/// | [`find_item`](NameStore::find_item) | Look up an item by barcode |
/// | [`save_item_summary`](NameStore::save_item_summary) | Overwrite an item's classification fields |
/// | [`insert_page_name_strings`](NameStore::insert_page_name_strings) | Bulk-load one batch in one transaction |
#[async_trait]
pub trait NameStore: Send + Sync {
    async fn truncate_page_name_strings(&self) -> Result<()>;

    /// Returns the number of items reset.
    async fn reset_item_summaries(&self) -> Result<u64>;

    async fn find_item(&self, barcode: &str) -> Result<Option<Item>>;

    async fn save_item_summary(&self, item_id: i64, summary: &ItemSummary) -> Result<()>;

    /// Persist a batch atomically: either every row is committed or none.
    async fn insert_page_name_strings(&self, batch: &[PageNameString]) -> Result<()>;
}

/// Read side of the page lookup cache.
#[async_trait]
pub trait PageLookup: Send + Sync {
    /// Page id stored under `key`, or `None` when the key is absent.
    async fn page_id(&self, key: &str) -> Result<Option<i64>>;
}

/// Composite lookup key for a page: its 1-based sequence within the item
/// and the item's id.
pub fn page_key(sequence: u32, item_id: i64) -> String {
    format!("{}|{}", sequence, item_id)
}
