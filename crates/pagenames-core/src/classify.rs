//! Majority-vote classification of an item.
//!
//! Every name verified against the trusted data source contributes its
//! classification path (`Animalia|Insecta|Lepidoptera`) to the item's path
//! set. Once all pages of the item have been read, the set is reduced to an
//! [`ItemSummary`]:
//!
//! - **Kingdom**: the most frequent first element among paths with at
//!   least [`MIN_KINGDOM_PATH_LEN`] elements, with its share in percent.
//! - **Context**: walking depth by depth, the most frequent value at each
//!   depth is adopted while it holds at least [`CONTEXT_THRESHOLD`] of the
//!   paths reaching that depth. The last adopted value is the context.
//! - **Counters**: distinct paths, and first-element counts for the four
//!   tallied kingdoms.
//!
//! Ties at any vote resolve to the lexicographically smallest label.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::ItemSummary;

/// Minimum share of contributing paths a value needs to become the context.
pub const CONTEXT_THRESHOLD: f64 = 0.5;

/// Paths shorter than this do not vote for the kingdom.
pub const MIN_KINGDOM_PATH_LEN: usize = 3;

/// Separator between rank names in a classification path.
pub const PATH_SEPARATOR: char = '|';

pub const ANIMALIA: &str = "Animalia";
pub const PLANTAE: &str = "Plantae";
pub const FUNGI: &str = "Fungi";
pub const BACTERIA: &str = "Bacteria";

/// Reduce an item's set of classification paths to its summary.
///
/// Pure and deterministic: the same set always yields the same summary, and
/// an empty set yields [`ItemSummary::default`].
pub fn summarize(paths: &BTreeSet<String>) -> ItemSummary {
    let split: Vec<Vec<&str>> = paths
        .iter()
        .map(|p| p.split(PATH_SEPARATOR).collect())
        .collect();

    let mut summary = ItemSummary {
        paths_total: split.len() as u32,
        ..ItemSummary::default()
    };

    for path in &split {
        match path.first().copied() {
            Some(ANIMALIA) => summary.animalia_num += 1,
            Some(PLANTAE) => summary.plantae_num += 1,
            Some(FUNGI) => summary.fungi_num += 1,
            Some(BACTERIA) => summary.bacteria_num += 1,
            _ => {}
        }
    }

    let (kingdom, percentage) = majority_kingdom(&split);
    summary.majority_kingdom = kingdom;
    summary.kingdom_percentage = percentage;
    summary.context = context(&split);
    summary
}

/// Most frequent first element among sufficiently long paths, with its
/// integer percentage (rounded toward zero).
pub fn majority_kingdom(paths: &[Vec<&str>]) -> (String, u32) {
    let mut tally: BTreeMap<&str, u32> = BTreeMap::new();
    let mut counted = 0u32;
    for path in paths.iter().filter(|p| p.len() >= MIN_KINGDOM_PATH_LEN) {
        *tally.entry(path[0]).or_insert(0) += 1;
        counted += 1;
    }

    match top(&tally) {
        Some((kingdom, count)) => (kingdom.to_string(), percentage(count, counted)),
        None => (String::new(), 0),
    }
}

/// `100 * part / whole`, rounded toward zero, computed in `u64`.
fn percentage(part: u32, whole: u32) -> u32 {
    (100 * u64::from(part) / u64::from(whole)) as u32
}

/// Deepest value that keeps a majority at its depth.
pub fn context(paths: &[Vec<&str>]) -> String {
    let max_depth = paths.iter().map(Vec::len).max().unwrap_or(0);
    let mut adopted = "";

    for depth in 0..max_depth {
        let mut tally: BTreeMap<&str, u32> = BTreeMap::new();
        let mut contributors = 0u32;
        for value in paths.iter().filter_map(|p| p.get(depth)) {
            *tally.entry(*value).or_insert(0) += 1;
            contributors += 1;
        }

        let Some((value, count)) = top(&tally) else {
            break;
        };
        if f64::from(count) / f64::from(contributors) < CONTEXT_THRESHOLD {
            break;
        }
        adopted = value;
    }

    adopted.to_string()
}

// BTreeMap iterates in key order, so a strict comparison keeps the smallest
// label among equal counts.
fn top<'a>(tally: &BTreeMap<&'a str, u32>) -> Option<(&'a str, u32)> {
    let mut best: Option<(&'a str, u32)> = None;
    for (&label, &count) in tally {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((label, count));
        }
    }
    best
}
