//! In-memory [`NameStore`] and [`PageLookup`] implementations for testing.
//!
//! Uses `HashMap` and `Vec` behind `std::sync::RwLock` for thread safety.
//! The store records the size of every committed batch so batching behaviour
//! can be asserted, and can be told to fail on a given batch.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::models::{Item, ItemSummary, PageNameString};

use super::{page_key, NameStore, PageLookup};

struct StoredItem {
    item: Item,
    summary: ItemSummary,
    saves: u32,
}

/// In-memory relational store.
pub struct InMemoryStore {
    items: RwLock<HashMap<String, StoredItem>>,
    rows: RwLock<Vec<PageNameString>>,
    batches: RwLock<Vec<usize>>,
    fail_on_batch: Option<usize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
            rows: RwLock::new(Vec::new()),
            batches: RwLock::new(Vec::new()),
            fail_on_batch: None,
        }
    }

    /// Make the `n`-th batch insert (0-based) fail without committing rows.
    pub fn failing_on_batch(mut self, n: usize) -> Self {
        self.fail_on_batch = Some(n);
        self
    }

    pub fn add_item(&self, id: i64, barcode: &str) {
        self.items.write().unwrap().insert(
            barcode.to_string(),
            StoredItem {
                item: Item {
                    id,
                    barcode: barcode.to_string(),
                },
                summary: ItemSummary::default(),
                saves: 0,
            },
        );
    }

    /// Seed an item's summary, e.g. to simulate leftovers of a previous run.
    pub fn set_summary(&self, barcode: &str, summary: ItemSummary) {
        if let Some(stored) = self.items.write().unwrap().get_mut(barcode) {
            stored.summary = summary;
        }
    }

    pub fn summary(&self, barcode: &str) -> Option<ItemSummary> {
        self.items
            .read()
            .unwrap()
            .get(barcode)
            .map(|s| s.summary.clone())
    }

    /// Number of times the item's summary was saved.
    pub fn summary_saves(&self, barcode: &str) -> u32 {
        self.items
            .read()
            .unwrap()
            .get(barcode)
            .map_or(0, |s| s.saves)
    }

    pub fn rows(&self) -> Vec<PageNameString> {
        self.rows.read().unwrap().clone()
    }

    /// Sizes of the committed batches, in commit order.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.read().unwrap().clone()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NameStore for InMemoryStore {
    async fn truncate_page_name_strings(&self) -> Result<()> {
        self.rows.write().unwrap().clear();
        Ok(())
    }

    async fn reset_item_summaries(&self) -> Result<u64> {
        let mut items = self.items.write().unwrap();
        for stored in items.values_mut() {
            stored.summary = ItemSummary::default();
        }
        Ok(items.len() as u64)
    }

    async fn find_item(&self, barcode: &str) -> Result<Option<Item>> {
        Ok(self
            .items
            .read()
            .unwrap()
            .get(barcode)
            .map(|s| s.item.clone()))
    }

    async fn save_item_summary(&self, item_id: i64, summary: &ItemSummary) -> Result<()> {
        let mut items = self.items.write().unwrap();
        match items.values_mut().find(|s| s.item.id == item_id) {
            Some(stored) => {
                stored.summary = summary.clone();
                stored.saves += 1;
                Ok(())
            }
            None => bail!("no item with id {}", item_id),
        }
    }

    async fn insert_page_name_strings(&self, batch: &[PageNameString]) -> Result<()> {
        let mut batches = self.batches.write().unwrap();
        if self.fail_on_batch == Some(batches.len()) {
            bail!("bulk load rejected batch {}", batches.len());
        }
        self.rows.write().unwrap().extend_from_slice(batch);
        batches.push(batch.len());
        Ok(())
    }
}

/// In-memory page lookup cache.
#[derive(Default)]
pub struct InMemoryLookup {
    pages: RwLock<HashMap<String, i64>>,
}

impl InMemoryLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map page `sequence` of item `item_id` to `page_id`.
    pub fn insert_page(&self, sequence: u32, item_id: i64, page_id: i64) {
        self.pages
            .write()
            .unwrap()
            .insert(page_key(sequence, item_id), page_id);
    }
}

#[async_trait]
impl PageLookup for InMemoryLookup {
    async fn page_id(&self, key: &str) -> Result<Option<i64>> {
        Ok(self.pages.read().unwrap().get(key).copied())
    }
}
