//! Stream ingestion pipeline.
//!
//! Consumes the ordered page stream, resolves every page to a page id through
//! the lookup cache, forwards occurrences from the trusted data source to the
//! [`BatchUploader`], and classifies each item once its last page has been
//! read.
//!
//! ```text
//! stream ──▶ ingestor ──▶ lookup cache
//!               │  │
//!               │  └──▶ queue ──▶ uploader task ──▶ page_name_strings
//!               ▼
//!         item summary (on item boundary)
//! ```
//!
//! Pages of one item arrive consecutively; a change of barcode marks the
//! boundary. The page sequence number used in the lookup key counts from 1
//! within each item, including pages whose item or page is unknown.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use pagenames_core::classify::summarize;
use pagenames_core::models::{Item, PageNameString, PageRecord};
use pagenames_core::store::{page_key, NameStore, PageLookup};
use pagenames_core::stream::PageStream;

use crate::config::Config;
use crate::db;
use crate::lookup_cache::LookupCache;
use crate::missing::MissingItems;
use crate::progress::{format_number, IngestProgressEvent, IngestProgressReporter, ProgressMode};
use crate::sqlite_store::SqliteStore;
use crate::stream::open_stream;
use crate::uploader::{BatchUploader, UploadError, UploadStats, UploaderHandle, BATCH_SIZE};

/// Only names verified against this data source are persisted.
pub const TRUSTED_DATA_SOURCE_ID: i32 = 1;

/// Default number of finished items between progress events.
pub const PROGRESS_EVERY: u64 = 1_000;

#[derive(Debug, Clone, Copy)]
pub struct IngestOptions {
    pub progress_every: u64,
    pub batch_size: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            progress_every: PROGRESS_EVERY,
            batch_size: BATCH_SIZE,
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    pub items: u64,
    pub pages: u64,
    /// Pages resolved to a page id.
    pub matched_pages: u64,
    /// Pages of known items with no lookup cache entry.
    pub unmatched_pages: u64,
    /// Trusted occurrences queued for upload.
    pub occurrences: u64,
    pub uploaded: u64,
    pub batches: u64,
    pub missing_items: usize,
    pub report_path: PathBuf,
}

/// Run the pipeline over `stream`.
///
/// Empties the occurrence table and resets every item summary first. The
/// missing-items report is written to `input_dir` whether or not the run
/// succeeds.
pub async fn ingest(
    lookup: &dyn PageLookup,
    store: Arc<dyn NameStore>,
    stream: &mut dyn PageStream,
    input_dir: &Path,
    options: IngestOptions,
    progress: &dyn IngestProgressReporter,
) -> Result<IngestReport> {
    let prepared = prepare(store.as_ref()).await;
    let (missing, mut counts, uploaded) = match prepared {
        Ok(()) => run_pipeline(lookup, store, stream, options, progress).await,
        Err(err) => (MissingItems::new(), IngestReport::default(), Err(err)),
    };

    let written = missing.write_report(input_dir);

    match (uploaded, written) {
        (Ok(stats), Ok(path)) => {
            counts.uploaded = stats.records;
            counts.batches = stats.batches;
            counts.missing_items = missing.len();
            if !missing.is_empty() {
                warn!(
                    count = missing.len(),
                    report = %path.display(),
                    "items missing from the database"
                );
            }
            counts.report_path = path;
            info!(
                items = counts.items,
                pages = counts.pages,
                uploaded = counts.uploaded,
                batches = counts.batches,
                missing = counts.missing_items,
                "ingest finished"
            );
            Ok(counts)
        }
        (Ok(_), Err(report_err)) => Err(report_err),
        (Err(err), Ok(path)) => {
            info!(path = %path.display(), "missing items report written after failed run");
            Err(err)
        }
        (Err(err), Err(report_err)) => {
            error!("missing items report not written: {:#}", report_err);
            Err(err)
        }
    }
}

/// Empty the occurrence table and reset every item summary.
async fn prepare(store: &dyn NameStore) -> Result<()> {
    store
        .truncate_page_name_strings()
        .await
        .context("Failed to truncate page_name_strings")?;
    let reset = store
        .reset_item_summaries()
        .await
        .context("Failed to reset item summaries")?;
    debug!(items = reset, "item summaries reset");
    Ok(())
}

/// Stream pages through the uploader. The missing set and counters are
/// returned even when the run fails, so the report can still be written.
async fn run_pipeline(
    lookup: &dyn PageLookup,
    store: Arc<dyn NameStore>,
    stream: &mut dyn PageStream,
    options: IngestOptions,
    progress: &dyn IngestProgressReporter,
) -> (MissingItems, IngestReport, Result<UploadStats>) {
    let uploader = BatchUploader::new(store.clone())
        .with_batch_size(options.batch_size)
        .spawn();

    let mut run = Run {
        lookup,
        store: store.as_ref(),
        uploader: &uploader,
        progress,
        progress_every: options.progress_every.max(1),
        missing: MissingItems::new(),
        counts: IngestReport::default(),
        window: None,
    };
    let consumed = run.consume(stream).await;
    let (missing, counts) = run.into_parts();

    let uploaded = match consumed {
        Ok(()) => {
            progress.report(IngestProgressEvent::Flushing {
                queued: counts.occurrences.saturating_sub(uploader.uploaded()),
            });
            uploader.finish().await
        }
        // The uploader stopped first; its own error is the cause.
        Err(err) if err.downcast_ref::<UploadError>().is_some() => match uploader.finish().await {
            Err(upload_err) => Err(upload_err),
            Ok(_) => Err(err),
        },
        Err(err) => {
            uploader.abort();
            Err(err)
        }
    };

    (missing, counts, uploaded)
}

/// Pages seen so far for the item being read.
struct ItemWindow {
    barcode: String,
    item: Option<Item>,
    sequence: u32,
    paths: BTreeSet<String>,
}

impl ItemWindow {
    fn new(barcode: String, item: Option<Item>) -> Self {
        Self {
            barcode,
            item,
            sequence: 0,
            paths: BTreeSet::new(),
        }
    }
}

struct Run<'a> {
    lookup: &'a dyn PageLookup,
    store: &'a dyn NameStore,
    uploader: &'a UploaderHandle,
    progress: &'a dyn IngestProgressReporter,
    progress_every: u64,
    missing: MissingItems,
    counts: IngestReport,
    window: Option<ItemWindow>,
}

impl Run<'_> {
    fn into_parts(self) -> (MissingItems, IngestReport) {
        (self.missing, self.counts)
    }

    async fn consume(&mut self, stream: &mut dyn PageStream) -> Result<()> {
        while let Some(page) = stream.next_page().await.context("page stream failed")? {
            self.page(page).await?;
        }
        if let Some(last) = self.window.take() {
            self.finalize(last).await?;
        }
        Ok(())
    }

    async fn page(&mut self, page: PageRecord) -> Result<()> {
        let PageRecord {
            item_barcode,
            names,
        } = page;

        let same_item = matches!(&self.window, Some(w) if w.barcode == item_barcode);
        if !same_item {
            if let Some(done) = self.window.take() {
                self.finalize(done).await?;
            }
            let item = self
                .store
                .find_item(&item_barcode)
                .await
                .with_context(|| format!("Failed to look up item {}", item_barcode))?;
            if item.is_none() && self.missing.record(&item_barcode) {
                warn!(barcode = %item_barcode, "item not in database");
            }
            self.window = Some(ItemWindow::new(item_barcode, item));
        }

        let Some(window) = self.window.as_mut() else {
            return Ok(());
        };
        window.sequence += 1;
        self.counts.pages += 1;

        let Some(item) = &window.item else {
            return Ok(());
        };

        let key = page_key(window.sequence, item.id);
        let page_id = self
            .lookup
            .page_id(&key)
            .await
            .with_context(|| format!("Failed to read lookup cache for {}", key))?;
        let Some(page_id) = page_id else {
            self.counts.unmatched_pages += 1;
            debug!(key = %key, "page not in lookup cache");
            return Ok(());
        };
        self.counts.matched_pages += 1;

        for occurrence in names
            .iter()
            .filter(|n| n.data_source_id == TRUSTED_DATA_SOURCE_ID)
        {
            self.uploader
                .send(PageNameString::from_occurrence(page_id, occurrence))?;
            self.counts.occurrences += 1;
            if !occurrence.classification_path.is_empty() {
                window.paths.insert(occurrence.classification_path.clone());
            }
        }

        Ok(())
    }

    async fn finalize(&mut self, window: ItemWindow) -> Result<()> {
        self.counts.items += 1;

        if let Some(item) = &window.item {
            let summary = summarize(&window.paths);
            self.store
                .save_item_summary(item.id, &summary)
                .await
                .with_context(|| format!("Failed to update item {}", window.barcode))?;
        }

        if self.counts.items % self.progress_every == 0 {
            let uploaded = self.uploader.uploaded();
            self.progress.report(IngestProgressEvent::Items {
                items: self.counts.items,
                pages: self.counts.pages,
                uploaded,
            });
            info!(items = self.counts.items, uploaded, "ingest progress");
        }

        Ok(())
    }
}

/// Run `pagenames ingest`: open the store, cache and stream named by the
/// configuration, run the pipeline, and print a summary.
pub async fn run_ingest(config: &Config, stream_path: &Path, mode: ProgressMode) -> Result<()> {
    let pool = db::connect(config).await?;
    let store: Arc<dyn NameStore> = Arc::new(SqliteStore::new(pool));
    let cache = LookupCache::open(&config.cache.dir).await?;
    if cache.is_empty().await? {
        warn!(
            dir = %config.cache.dir.display(),
            "lookup cache is empty, no page will match; run `pagenames cache rebuild`"
        );
    }
    let mut stream = open_stream(stream_path).await?;
    let reporter = mode.reporter();

    let options = IngestOptions {
        progress_every: config.ingest.progress_every,
        ..IngestOptions::default()
    };

    let result = ingest(
        &cache,
        store,
        stream.as_mut(),
        &config.input.dir,
        options,
        reporter.as_ref(),
    )
    .await;
    cache.close().await;
    let report = result?;

    println!("ingest {}", stream_path.display());
    println!("  items: {}", format_number(report.items));
    println!(
        "  pages: {} ({} matched, {} not in cache)",
        format_number(report.pages),
        format_number(report.matched_pages),
        format_number(report.unmatched_pages)
    );
    println!(
        "  page name strings: {} in {} batches",
        format_number(report.uploaded),
        report.batches
    );
    println!("  missing items: {}", report.missing_items);
    println!("  report: {}", report.report_path.display());
    println!("ok");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::missing::MISSING_ITEMS_BANNER;
    use crate::progress::NoProgress;
    use pagenames_core::models::{ItemSummary, NameOccurrence};
    use pagenames_core::store::memory::{InMemoryLookup, InMemoryStore};
    use pagenames_core::stream::MemoryStream;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn name(text: &str, source: i32, path: &str) -> NameOccurrence {
        NameOccurrence {
            name: text.to_string(),
            data_source_id: source,
            classification_path: path.to_string(),
            offset_start: 0,
            offset_end: text.len() as u32,
            odds: 0.9,
            annotation: String::new(),
            annotation_type: Default::default(),
        }
    }

    fn page(barcode: &str, names: Vec<NameOccurrence>) -> PageRecord {
        PageRecord {
            item_barcode: barcode.to_string(),
            names,
        }
    }

    async fn run(
        lookup: &InMemoryLookup,
        store: &Arc<InMemoryStore>,
        pages: Vec<PageRecord>,
        dir: &Path,
    ) -> Result<IngestReport> {
        let mut stream = MemoryStream::new(pages);
        ingest(
            lookup,
            store.clone(),
            &mut stream,
            dir,
            IngestOptions::default(),
            &NoProgress,
        )
        .await
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<IngestProgressEvent>>);

    impl IngestProgressReporter for Recorder {
        fn report(&self, event: IngestProgressEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    #[tokio::test]
    async fn test_scenario_a_item_summary() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(InMemoryStore::new());
        store.add_item(7, "bc7");
        let lookup = InMemoryLookup::new();
        lookup.insert_page(1, 7, 701);
        lookup.insert_page(2, 7, 702);

        let pages = vec![
            page(
                "bc7",
                vec![
                    name("Carabus", 1, "Animalia|Insecta|Coleoptera"),
                    name("Pieris", 1, "Animalia|Insecta|Lepidoptera"),
                ],
            ),
            page("bc7", vec![name("Araneus", 1, "Animalia|Arachnida|Araneae")]),
        ];
        let report = run(&lookup, &store, pages, tmp.path()).await.unwrap();

        assert_eq!(report.items, 1);
        assert_eq!(report.matched_pages, 2);
        assert_eq!(report.uploaded, 3);

        let summary = store.summary("bc7").unwrap();
        assert_eq!(summary.paths_total, 3);
        assert_eq!(summary.animalia_num, 3);
        assert_eq!(summary.majority_kingdom, "Animalia");
        assert_eq!(summary.kingdom_percentage, 100);
        assert_eq!(summary.context, "Insecta");

        let pages: Vec<i64> = store.rows().iter().map(|r| r.page_id).collect();
        assert_eq!(pages, vec![701, 701, 702]);
    }

    #[tokio::test]
    async fn test_untrusted_sources_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(InMemoryStore::new());
        store.add_item(1, "b1");
        let lookup = InMemoryLookup::new();
        lookup.insert_page(1, 1, 10);

        let pages = vec![page(
            "b1",
            vec![
                name("Bubo bubo", 1, "Animalia|Chordata|Aves"),
                name("Bubo bubo", 11, "Plantae|Tracheophyta|Magnoliopsida"),
            ],
        )];
        let report = run(&lookup, &store, pages, tmp.path()).await.unwrap();

        assert_eq!(report.uploaded, 1);
        let summary = store.summary("b1").unwrap();
        assert_eq!(summary.paths_total, 1);
        assert_eq!(summary.plantae_num, 0);
    }

    #[tokio::test]
    async fn test_scenario_b_all_cache_misses() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(InMemoryStore::new());
        store.add_item(3, "b3");
        store.set_summary(
            "b3",
            ItemSummary {
                paths_total: 9,
                animalia_num: 9,
                majority_kingdom: "Animalia".to_string(),
                kingdom_percentage: 100,
                context: "Aves".to_string(),
                ..ItemSummary::default()
            },
        );
        let lookup = InMemoryLookup::new();

        let pages = vec![
            page("b3", vec![name("Bubo bubo", 1, "Animalia|Chordata|Aves")]),
            page("b3", vec![name("Strix aluco", 1, "Animalia|Chordata|Aves")]),
        ];
        let report = run(&lookup, &store, pages, tmp.path()).await.unwrap();

        assert_eq!(report.unmatched_pages, 2);
        assert_eq!(report.uploaded, 0);
        assert!(store.rows().is_empty());
        assert_eq!(store.summary("b3").unwrap(), ItemSummary::default());
        assert_eq!(store.summary_saves("b3"), 1);
    }

    #[tokio::test]
    async fn test_scenario_c_missing_item_listed_once() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(InMemoryStore::new());
        let lookup = InMemoryLookup::new();

        let pages = (0..5)
            .map(|_| page("ghost", vec![name("Bubo bubo", 1, "Animalia|Chordata|Aves")]))
            .collect();
        let report = run(&lookup, &store, pages, tmp.path()).await.unwrap();

        assert_eq!(report.items, 1);
        assert_eq!(report.pages, 5);
        assert_eq!(report.missing_items, 1);
        assert_eq!(report.uploaded, 0);

        let text = std::fs::read_to_string(&report.report_path).unwrap();
        assert_eq!(text, format!("{}\nghost\n", MISSING_ITEMS_BANNER));
    }

    #[tokio::test]
    async fn test_scenario_d_batches() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(InMemoryStore::new());
        store.add_item(1, "b1");
        let lookup = InMemoryLookup::new();
        for seq in 1..=25 {
            lookup.insert_page(seq, 1, i64::from(seq));
        }

        let pages = (0..25)
            .map(|_| {
                page(
                    "b1",
                    (0..1_000)
                        .map(|_| name("Bubo bubo", 1, "Animalia|Chordata|Aves"))
                        .collect(),
                )
            })
            .collect();
        let report = run(&lookup, &store, pages, tmp.path()).await.unwrap();

        assert_eq!(report.uploaded, 25_000);
        assert_eq!(report.batches, 3);
        assert_eq!(store.batch_sizes(), vec![10_000, 10_000, 5_000]);
    }

    #[tokio::test]
    async fn test_sequence_counts_restart_per_item() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(InMemoryStore::new());
        store.add_item(1, "a");
        store.add_item(2, "b");
        let lookup = InMemoryLookup::new();
        // page 2 of item 1 is absent from the cache
        lookup.insert_page(1, 1, 11);
        lookup.insert_page(3, 1, 13);
        lookup.insert_page(1, 2, 21);

        let owl = || vec![name("Bubo bubo", 1, "Animalia|Chordata|Aves")];
        let pages = vec![
            page("a", owl()),
            page("a", owl()),
            page("a", owl()),
            page("b", owl()),
        ];
        let report = run(&lookup, &store, pages, tmp.path()).await.unwrap();

        let ids: Vec<i64> = store.rows().iter().map(|r| r.page_id).collect();
        assert_eq!(ids, vec![11, 13, 21]);
        assert_eq!(report.items, 2);
        assert_eq!(report.unmatched_pages, 1);
        assert_eq!(store.summary_saves("a"), 1);
        assert_eq!(store.summary_saves("b"), 1);
    }

    #[tokio::test]
    async fn test_missing_item_still_counts_pages() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(InMemoryStore::new());
        store.add_item(2, "known");
        let lookup = InMemoryLookup::new();
        lookup.insert_page(1, 2, 200);

        let owl = || vec![name("Bubo bubo", 1, "Animalia|Chordata|Aves")];
        let pages = vec![
            page("ghost", owl()),
            page("ghost", owl()),
            page("known", owl()),
        ];
        let report = run(&lookup, &store, pages, tmp.path()).await.unwrap();

        assert_eq!(report.pages, 3);
        assert_eq!(report.missing_items, 1);
        assert_eq!(store.rows().len(), 1);
        assert_eq!(store.rows()[0].page_id, 200);
    }

    #[tokio::test]
    async fn test_empty_paths_not_recorded() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(InMemoryStore::new());
        store.add_item(1, "b1");
        let lookup = InMemoryLookup::new();
        lookup.insert_page(1, 1, 10);

        let pages = vec![page("b1", vec![name("Incertae", 1, "")])];
        let report = run(&lookup, &store, pages, tmp.path()).await.unwrap();

        assert_eq!(report.uploaded, 1);
        assert_eq!(store.summary("b1").unwrap().paths_total, 0);
    }

    #[tokio::test]
    async fn test_truncated_stream_fails_but_writes_report() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(InMemoryStore::new());
        let lookup = InMemoryLookup::new();

        let mut stream = MemoryStream::truncated(vec![page("ghost", vec![])]);
        let result = ingest(
            &lookup,
            store.clone(),
            &mut stream,
            tmp.path(),
            IngestOptions::default(),
            &NoProgress,
        )
        .await;

        assert!(result.is_err());
        let text = std::fs::read_to_string(tmp.path().join("missing_items.txt")).unwrap();
        assert!(text.contains("ghost"));
    }

    #[tokio::test]
    async fn test_upload_failure_surfaces_store_error() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(InMemoryStore::new().failing_on_batch(0));
        store.add_item(1, "b1");
        let lookup = InMemoryLookup::new();
        for seq in 1..=50 {
            lookup.insert_page(seq, 1, i64::from(seq));
        }

        let pages = (0..50)
            .map(|_| page("b1", vec![name("Bubo bubo", 1, "Animalia|Chordata|Aves")]))
            .collect();
        let mut stream = MemoryStream::new(pages);
        let err = ingest(
            &lookup,
            store.clone(),
            &mut stream,
            tmp.path(),
            IngestOptions {
                batch_size: 2,
                ..IngestOptions::default()
            },
            &NoProgress,
        )
        .await
        .unwrap_err();

        assert!(format!("{:#}", err).contains("bulk load"));
        assert!(store.rows().is_empty());
    }

    #[tokio::test]
    async fn test_progress_every_n_items() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(InMemoryStore::new());
        let lookup = InMemoryLookup::new();
        let pages = (0..5).map(|i| page(&format!("b{}", i), vec![])).collect();

        let recorder = Recorder::default();
        let mut stream = MemoryStream::new(pages);
        ingest(
            &lookup,
            store.clone(),
            &mut stream,
            tmp.path(),
            IngestOptions {
                progress_every: 2,
                ..IngestOptions::default()
            },
            &recorder,
        )
        .await
        .unwrap();

        let events = recorder.0.lock().unwrap();
        let items: Vec<u64> = events
            .iter()
            .filter_map(|e| match e {
                IngestProgressEvent::Items { items, .. } => Some(*items),
                _ => None,
            })
            .collect();
        assert_eq!(items, vec![2, 4]);
        assert!(matches!(events.last(), Some(IngestProgressEvent::Flushing { .. })));
    }

    struct BrokenTruncate(InMemoryStore);

    #[async_trait::async_trait]
    impl NameStore for BrokenTruncate {
        async fn truncate_page_name_strings(&self) -> Result<()> {
            anyhow::bail!("table is locked")
        }

        async fn reset_item_summaries(&self) -> Result<u64> {
            self.0.reset_item_summaries().await
        }

        async fn find_item(&self, barcode: &str) -> Result<Option<Item>> {
            self.0.find_item(barcode).await
        }

        async fn save_item_summary(&self, item_id: i64, summary: &ItemSummary) -> Result<()> {
            self.0.save_item_summary(item_id, summary).await
        }

        async fn insert_page_name_strings(&self, batch: &[PageNameString]) -> Result<()> {
            self.0.insert_page_name_strings(batch).await
        }
    }

    #[tokio::test]
    async fn test_failed_truncate_still_writes_report() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(BrokenTruncate(InMemoryStore::new()));
        let lookup = InMemoryLookup::new();

        let mut stream = MemoryStream::new(vec![page("ghost", vec![])]);
        let err = ingest(
            &lookup,
            store.clone(),
            &mut stream,
            tmp.path(),
            IngestOptions::default(),
            &NoProgress,
        )
        .await
        .unwrap_err();

        assert!(format!("{:#}", err).contains("truncate"), "got: {:#}", err);
        let text = std::fs::read_to_string(tmp.path().join("missing_items.txt")).unwrap();
        assert_eq!(text, format!("{}\n", MISSING_ITEMS_BANNER));
        assert!(store.0.batch_sizes().is_empty());
    }

    #[tokio::test]
    async fn test_unwritable_report_fails_completed_run() {
        let tmp = TempDir::new().unwrap();
        let input_dir = tmp.path().join("input");
        std::fs::write(&input_dir, "not a directory").unwrap();

        let store = Arc::new(InMemoryStore::new());
        store.add_item(1, "b1");
        let lookup = InMemoryLookup::new();
        lookup.insert_page(1, 1, 10);

        let pages = vec![
            page("b1", vec![name("Bubo bubo", 1, "Animalia|Chordata|Aves")]),
            page("ghost", vec![]),
        ];
        let err = run(&lookup, &store, pages, &input_dir).await.unwrap_err();

        assert!(format!("{:#}", err).contains("input dir"), "got: {:#}", err);
        // the data itself was committed before the report failed
        assert_eq!(store.batch_sizes(), vec![1]);
        assert_eq!(store.summary("b1").unwrap().majority_kingdom, "Animalia");
    }

    #[tokio::test]
    async fn test_previous_rows_truncated() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(InMemoryStore::new());
        store.add_item(1, "b1");
        let lookup = InMemoryLookup::new();
        lookup.insert_page(1, 1, 10);

        let owl = || vec![page("b1", vec![name("Bubo bubo", 1, "Animalia|Chordata|Aves")])];
        run(&lookup, &store, owl(), tmp.path()).await.unwrap();
        run(&lookup, &store, owl(), tmp.path()).await.unwrap();

        assert_eq!(store.rows().len(), 1);
    }
}
