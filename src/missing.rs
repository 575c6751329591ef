//! Barcodes seen in the stream that have no item row.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// File name of the report inside the input directory.
pub const MISSING_ITEMS_FILE: &str = "missing_items.txt";

/// First line of the report.
pub const MISSING_ITEMS_BANNER: &str = "Barcodes of items missing from the database:";

/// Unique set of missing barcodes, reported in sorted order.
#[derive(Debug, Default)]
pub struct MissingItems {
    barcodes: BTreeSet<String>,
}

impl MissingItems {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time a barcode is recorded.
    pub fn record(&mut self, barcode: &str) -> bool {
        if self.barcodes.contains(barcode) {
            return false;
        }
        self.barcodes.insert(barcode.to_string())
    }

    pub fn len(&self) -> usize {
        self.barcodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.barcodes.is_empty()
    }

    /// Write `<input_dir>/missing_items.txt`: the banner, then one barcode
    /// per line. The file is written even when no barcode is missing.
    pub fn write_report(&self, input_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(input_dir)
            .with_context(|| format!("Failed to create input dir: {}", input_dir.display()))?;

        let path = input_dir.join(MISSING_ITEMS_FILE);
        let mut content = String::with_capacity(MISSING_ITEMS_BANNER.len() + 1 + self.len() * 24);
        content.push_str(MISSING_ITEMS_BANNER);
        content.push('\n');
        for barcode in &self.barcodes {
            content.push_str(barcode);
            content.push('\n');
        }

        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write missing items report: {}", path.display()))?;
        Ok(path)
    }
}
