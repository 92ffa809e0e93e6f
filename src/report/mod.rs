//! Result assembly and rendering.

pub mod formatter;
pub mod generator;

use chrono::{DateTime, Utc};
use formatter::{ComparisonRow, FilterSummary, SignificanceRow, SummaryRow};
use serde::Serialize;

use crate::models::{CohortFilter, ComparisonFilter, Sample};

pub use generator::{generate_json_report, generate_markdown_report};

/// Context shown in the Markdown header.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// Dataset the snapshot was loaded from.
    pub dataset: String,
    pub generated_at: DateTime<Utc>,
    pub subjects: usize,
    pub samples: usize,
    pub comparison: ComparisonFilter,
    pub filter: CohortFilter,
}

/// Every view bundled into one document.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub samples: Vec<Sample>,
    pub summary: Vec<SummaryRow>,
    pub compare: Vec<ComparisonRow>,
    pub compare_stats: Vec<SignificanceRow>,
    pub filter: FilterSummary,
}

/// Output of one view. Serializes to the bare result shape.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ViewOutput {
    Samples(Vec<Sample>),
    Summary(Vec<SummaryRow>),
    Compare(Vec<ComparisonRow>),
    CompareStats(Vec<SignificanceRow>),
    Filter(FilterSummary),
    Report(Box<Report>),
}
