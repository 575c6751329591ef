//! # pagenames
//!
//! Loads the scientific names recognized on scanned pages into a relational
//! store and classifies every item (scanned volume) by the names found in it.
//!
//! The inbound stream delivers pages grouped by item. Each page is resolved to
//! its page id through a local lookup cache keyed by `"<sequence>|<item id>"`;
//! names verified against the trusted data source are bulk loaded into
//! `page_name_strings` by a background uploader, and their classification
//! paths are reduced to a majority kingdom and a context when the item ends.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌──────────┐   ┌──────────┐
//! │  Stream  │──▶│  Ingestor  │──▶│ Uploader │──▶│  SQLite  │
//! │  (JSONL) │   │            │   │  (task)  │   │          │
//! └──────────┘   └─────┬──────┘   └──────────┘   └────▲─────┘
//!                      │ lookup                       │ item summary
//!                      ▼                              │
//!                ┌────────────┐                       │
//!                │ Page cache │      classify ────────┘
//!                └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! pagenames init                  # create database
//! pagenames cache rebuild         # index pages into the lookup cache
//! pagenames ingest names.jsonl    # run the pipeline
//! pagenames stats
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite [`NameStore`](pagenames_core::store::NameStore) |
//! | [`lookup_cache`] | Durable page lookup cache |
//! | [`cache_cmd`] | Cache reset and rebuild |
//! | [`stream`] | JSON Lines page stream |
//! | [`uploader`] | Batched bulk writer task |
//! | [`ingest`] | Pipeline orchestration |
//! | [`missing`] | Missing-items report |
//! | [`progress`] | Progress reporting |
//! | [`stats`] | Database statistics |

pub mod cache_cmd;
pub mod config;
pub mod db;
pub mod ingest;
pub mod lookup_cache;
pub mod migrate;
pub mod missing;
pub mod progress;
pub mod sqlite_store;
pub mod stats;
pub mod stream;
pub mod uploader;
