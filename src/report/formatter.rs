//! Result shapes.
//!
//! Pure assembly of analysis output into the externally observable
//! structures. Field names here are the wire contract.

use crate::analysis::{
    round_p_value, CohortGroups, PopulationFrequency, PopulationTest, ResponseFrequency,
};
use crate::models::{Population, Response};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of the sample summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub sample_id: String,
    pub total_count: u64,
    pub population: Population,
    pub count: u64,
    pub relative_frequency: f64,
}

/// One row of the responder comparison table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub population: Population,
    pub response: Response,
    pub relative_frequency: f64,
}

/// One row of the significance table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignificanceRow {
    pub population: Population,
    /// Rounded to four decimals; `null` when the test was not run.
    pub p_value: Option<f64>,
    pub significant: bool,
    /// Group sizes and test statistics for human-readable reports.
    #[serde(skip)]
    pub detail: Option<TestDetail>,
}

/// Supporting numbers behind a significance row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestDetail {
    pub responders: usize,
    pub non_responders: usize,
    pub responder_mean: Option<f64>,
    pub non_responder_mean: Option<f64>,
    pub t_statistic: Option<f64>,
    pub df: Option<f64>,
}

/// Counts for the cohort matched by a filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSummary {
    pub sample_ids: Vec<String>,
    pub num_samples_per_project: BTreeMap<String, usize>,
    pub response_counts: BTreeMap<String, usize>,
    pub sex_counts: BTreeMap<String, usize>,
}

pub fn summary_rows(frequencies: &[PopulationFrequency]) -> Vec<SummaryRow> {
    frequencies
        .iter()
        .map(|f| SummaryRow {
            sample_id: f.sample_id.clone(),
            total_count: f.total_count,
            population: f.population,
            count: f.count,
            relative_frequency: f.relative_frequency,
        })
        .collect()
}

pub fn comparison_rows(labeled: &[ResponseFrequency]) -> Vec<ComparisonRow> {
    labeled
        .iter()
        .map(|l| ComparisonRow {
            population: l.frequency.population,
            response: l.response,
            relative_frequency: l.frequency.relative_frequency,
        })
        .collect()
}

pub fn significance_rows(tests: &[PopulationTest]) -> Vec<SignificanceRow> {
    tests
        .iter()
        .map(|t| SignificanceRow {
            population: t.population,
            p_value: t.p_value().map(round_p_value),
            significant: t.is_significant(),
            detail: Some(TestDetail {
                responders: t.responders.n,
                non_responders: t.non_responders.n,
                responder_mean: t.responders.mean,
                non_responder_mean: t.non_responders.mean,
                t_statistic: t.test.map(|w| w.t_statistic),
                df: t.test.map(|w| w.df),
            }),
        })
        .collect()
}

pub fn filter_summary(groups: CohortGroups) -> FilterSummary {
    FilterSummary {
        sample_ids: groups.sample_ids,
        num_samples_per_project: groups.samples_per_project,
        response_counts: groups.subjects_per_response,
        sex_counts: groups.subjects_per_sex,
    }
}
