//! # pagenames core
//!
//! Shared, I/O-free logic for pagenames: data models, the classification
//! vote, and the store, lookup and stream abstractions the ingestion
//! pipeline is written against.
//!
//! This crate contains no tokio, sqlx, or filesystem access. Concrete
//! backends (SQLite store, on-disk lookup cache, JSON Lines stream) live in
//! the `pagenames` crate; in-memory backends for tests live here.

pub mod classify;
pub mod models;
pub mod store;
pub mod stream;
