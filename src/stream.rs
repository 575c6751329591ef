//! JSON Lines page stream.
//!
//! Each line is one [`PageFrame`]:
//!
//! ```text
//! {"type":"page","item_barcode":"mobot31753002152491","names":[{"name":"Bubo bubo", ...}]}
//! {"type":"page","item_barcode":"mobot31753002152491","names":[]}
//! {"type":"end"}
//! ```
//!
//! Blank lines are ignored. Reaching end of input before the `end` frame
//! yields [`StreamError::Truncated`]. A line longer than the frame limit
//! ([`MAX_FRAME_BYTES`] by default) yields [`StreamError::FrameTooLong`]
//! without buffering the rest of it.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, BufReader};

use pagenames_core::models::PageRecord;
use pagenames_core::stream::{PageFrame, PageStream, StreamError};

/// Default upper bound on one frame, excluding the line terminator.
pub const MAX_FRAME_BYTES: u64 = 16 * 1024 * 1024;

pub struct JsonLinesStream<R> {
    reader: R,
    buf: Vec<u8>,
    max_frame: u64,
    line_no: u64,
    finished: bool,
}

impl<R: AsyncBufRead + Unpin + Send> JsonLinesStream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            max_frame: MAX_FRAME_BYTES,
            line_no: 0,
            finished: false,
        }
    }

    pub fn with_max_frame(mut self, max_frame: u64) -> Self {
        self.max_frame = max_frame;
        self
    }

    /// Read the next line into `buf` without its terminator. Returns `false`
    /// at end of input.
    async fn read_line(&mut self) -> Result<bool, StreamError> {
        self.buf.clear();
        // One byte over the limit is enough to tell an oversized line apart.
        let read = (&mut self.reader)
            .take(self.max_frame.saturating_add(2))
            .read_until(b'\n', &mut self.buf)
            .await?;
        if read == 0 {
            return Ok(false);
        }
        self.line_no += 1;

        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }
        if self.buf.len() as u64 > self.max_frame {
            return Err(StreamError::FrameTooLong {
                line: self.line_no,
                limit: self.max_frame,
            });
        }
        Ok(true)
    }
}

/// Open a stream from a file path, or from stdin when `path` is `-`.
pub async fn open_stream(path: &Path) -> Result<Box<dyn PageStream>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(JsonLinesStream::new(BufReader::new(
            tokio::io::stdin(),
        ))));
    }

    let file = File::open(path)
        .await
        .with_context(|| format!("Failed to open stream: {}", path.display()))?;
    Ok(Box::new(JsonLinesStream::new(BufReader::new(file))))
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> PageStream for JsonLinesStream<R> {
    async fn next_page(&mut self) -> Result<Option<PageRecord>, StreamError> {
        if self.finished {
            return Ok(None);
        }

        loop {
            if !self.read_line().await? {
                return Err(StreamError::Truncated { line: self.line_no });
            }

            if self.buf.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            let frame: PageFrame =
                serde_json::from_slice(&self.buf).map_err(|source| StreamError::Decode {
                    line: self.line_no,
                    source,
                })?;

            match frame {
                PageFrame::Page(page) => return Ok(Some(page)),
                PageFrame::End => {
                    self.finished = true;
                    return Ok(None);
                }
            }
        }
    }
}
