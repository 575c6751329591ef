//! Inbound page stream abstraction.
//!
//! A stream yields [`PageRecord`]s in source order and must end with an
//! explicit end-of-data frame. Reaching the end of the underlying transport
//! without that frame is an error, so a truncated transfer can never be
//! mistaken for a complete run.

use std::collections::VecDeque;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::PageRecord;

/// One frame of the wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageFrame {
    Page(PageRecord),
    End,
}

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("stream read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed frame on line {line}: {source}")]
    Decode {
        line: u64,
        #[source]
        source: serde_json::Error,
    },

    #[error("stream ended after line {line} without an end frame")]
    Truncated { line: u64 },

    #[error("frame on line {line} exceeds {limit} bytes")]
    FrameTooLong { line: u64, limit: u64 },
}

/// An ordered, single-pass source of pages.
#[async_trait]
pub trait PageStream: Send {
    /// Next page, or `None` once the end frame has been received.
    async fn next_page(&mut self) -> Result<Option<PageRecord>, StreamError>;
}

/// A stream over pages held in memory, for tests and tooling.
pub struct MemoryStream {
    pages: VecDeque<PageRecord>,
    truncated: bool,
}

impl MemoryStream {
    pub fn new(pages: Vec<PageRecord>) -> Self {
        Self {
            pages: pages.into(),
            truncated: false,
        }
    }

    /// Yields `pages`, then fails as if the transport dropped before the
    /// end frame.
    pub fn truncated(pages: Vec<PageRecord>) -> Self {
        Self {
            pages: pages.into(),
            truncated: true,
        }
    }
}

#[async_trait]
impl PageStream for MemoryStream {
    async fn next_page(&mut self) -> Result<Option<PageRecord>, StreamError> {
        match self.pages.pop_front() {
            Some(page) => Ok(Some(page)),
            None if self.truncated => Err(StreamError::Truncated { line: 0 }),
            None => Ok(None),
        }
    }
}
