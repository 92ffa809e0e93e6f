//! Response and cohort grouping.
//!
//! Two groupings live here: per-population responder/non-responder value
//! groups for the significance test, and the subject-deduplicated cohort
//! counts behind the filter summary.

use super::aggregator::{aggregate_sample, group_by_sample, PopulationFrequency};
use crate::models::{CellCount, CohortRow, ComparativeRow, Population, Response};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// A sample's population frequency labeled with its response.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseFrequency {
    pub response: Response,
    pub frequency: PopulationFrequency,
}

/// Relative frequencies of one population, split by response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseGroups {
    pub responders: Vec<f64>,
    pub non_responders: Vec<f64>,
}

impl ResponseGroups {
    fn push(&mut self, response: Response, value: f64) {
        match response {
            Response::Responder => self.responders.push(value),
            Response::NonResponder => self.non_responders.push(value),
        }
    }
}

/// Aggregate comparative rows into labeled frequencies.
///
/// Rows are grouped per sample in first-seen order. Samples whose response
/// is not exactly `y` or `n`, and samples with no counted cells, are left out.
pub fn response_frequencies(rows: &[ComparativeRow]) -> Vec<ResponseFrequency> {
    let mut responses: HashMap<&str, Option<Response>> = HashMap::new();
    let counts: Vec<CellCount> = rows
        .iter()
        .map(|row| {
            responses
                .entry(row.sample_id.as_str())
                .or_insert_with(|| Response::parse(&row.response));
            CellCount {
                sample_id: row.sample_id.clone(),
                population: row.population,
                count: row.count,
            }
        })
        .collect();

    let mut labeled = Vec::new();
    for (sample_id, sample_counts) in group_by_sample(&counts) {
        let Some(response) = responses.get(sample_id.as_str()).copied().flatten() else {
            debug!("Sample {} has no y/n response, not compared", sample_id);
            continue;
        };
        labeled.extend(
            aggregate_sample(&sample_id, &sample_counts)
                .into_iter()
                .map(|frequency| ResponseFrequency { response, frequency }),
        );
    }

    labeled
}

/// Group relative frequencies by population and response.
///
/// Every population present on a participating row gets an entry, even when
/// all of its samples were dropped for a zero total.
pub fn group_by_population(rows: &[ComparativeRow]) -> BTreeMap<Population, ResponseGroups> {
    let mut groups: BTreeMap<Population, ResponseGroups> = rows
        .iter()
        .filter(|r| Response::parse(&r.response).is_some())
        .map(|r| (r.population, ResponseGroups::default()))
        .collect();

    for labeled in response_frequencies(rows) {
        groups
            .entry(labeled.frequency.population)
            .or_default()
            .push(labeled.response, labeled.frequency.relative_frequency);
    }

    groups
}

/// Counts describing the cohort matched by a filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CohortGroups {
    /// One entry per matching sample, in row order.
    pub sample_ids: Vec<String>,
    /// Matching samples per project.
    pub samples_per_project: BTreeMap<String, usize>,
    /// Distinct subjects per response value.
    pub subjects_per_response: BTreeMap<String, usize>,
    /// Distinct subjects per sex value.
    pub subjects_per_sex: BTreeMap<String, usize>,
}

/// Summarize cohort rows.
///
/// Project counts are per sample. Response and sex counts are per distinct
/// subject: `(subject_id, value)` pairs are deduplicated before counting, and
/// absent or empty values are skipped.
pub fn group_cohort(rows: &[CohortRow]) -> CohortGroups {
    let mut groups = CohortGroups::default();
    let mut response_pairs: BTreeSet<(&str, &str)> = BTreeSet::new();
    let mut sex_pairs: BTreeSet<(&str, &str)> = BTreeSet::new();

    for row in rows {
        groups.sample_ids.push(row.sample_id.clone());
        *groups
            .samples_per_project
            .entry(row.project.clone())
            .or_default() += 1;

        if let Some(response) = present(&row.response) {
            response_pairs.insert((row.subject_id.as_str(), response));
        }
        if let Some(sex) = present(&row.sex) {
            sex_pairs.insert((row.subject_id.as_str(), sex));
        }
    }

    groups.subjects_per_response = count_values(&response_pairs);
    groups.subjects_per_sex = count_values(&sex_pairs);
    groups
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn count_values(pairs: &BTreeSet<(&str, &str)>) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for (_, value) in pairs {
        *counts.entry(value.to_string()).or_default() += 1;
    }
    counts
}
