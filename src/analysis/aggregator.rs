//! Relative frequency aggregation.
//!
//! Converts raw per-sample population counts into percentages of the
//! sample's total counted cells.

use crate::models::{CellCount, Population};
use std::collections::HashMap;
use tracing::debug;

/// Relative frequency of one population within one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationFrequency {
    pub sample_id: String,
    /// Sum of every count recorded for the sample.
    pub total_count: u64,
    pub population: Population,
    pub count: u64,
    /// `100 * count / total_count`.
    pub relative_frequency: f64,
}

/// Sum of all counts for a sample.
pub fn total_count(counts: &[CellCount]) -> u64 {
    counts.iter().map(|c| c.count).sum()
}

/// Aggregate the counts of a single sample.
///
/// Returns no rows when the total is zero. Rows come back in canonical
/// population order regardless of input order.
pub fn aggregate_sample(sample_id: &str, counts: &[CellCount]) -> Vec<PopulationFrequency> {
    let total = total_count(counts);
    if total == 0 {
        debug!("Sample {} has no counted cells, skipping", sample_id);
        return Vec::new();
    }

    let mut sorted: Vec<&CellCount> = counts.iter().collect();
    sorted.sort_by_key(|c| c.population);

    sorted
        .into_iter()
        .map(|c| PopulationFrequency {
            sample_id: sample_id.to_string(),
            total_count: total,
            population: c.population,
            count: c.count,
            relative_frequency: 100.0 * c.count as f64 / total as f64,
        })
        .collect()
}

/// Group joined count rows by sample, keeping first-seen sample order.
pub fn group_by_sample(counts: &[CellCount]) -> Vec<(String, Vec<CellCount>)> {
    let mut order: Vec<(String, Vec<CellCount>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for count in counts {
        let slot = *index.entry(count.sample_id.as_str()).or_insert_with(|| {
            order.push((count.sample_id.clone(), Vec::new()));
            order.len() - 1
        });
        order[slot].1.push(count.clone());
    }

    order
}

/// Aggregate a batch of joined rows spanning many samples.
pub fn aggregate_counts(counts: &[CellCount]) -> Vec<PopulationFrequency> {
    group_by_sample(counts)
        .iter()
        .flat_map(|(sample_id, rows)| aggregate_sample(sample_id, rows))
        .collect()
}
