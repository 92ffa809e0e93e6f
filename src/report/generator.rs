//! Report rendering.
//!
//! JSON output is the bare result shape of the view. Markdown output wraps
//! the same data in a human-readable document.

use super::formatter::{ComparisonRow, FilterSummary, SignificanceRow, SummaryRow};
use super::{Report, ReportMetadata, ViewOutput};
use crate::config::ReportConfig;
use crate::models::{CohortFilter, Population, Response, Sample};
use anyhow::Result;
use std::collections::BTreeMap;

/// Generate a JSON document for a view.
pub fn generate_json_report(output: &ViewOutput) -> Result<String> {
    serde_json::to_string_pretty(output).map_err(Into::into)
}

/// Generate a complete Markdown document for a view.
pub fn generate_markdown_report(
    output: &ViewOutput,
    metadata: &ReportMetadata,
    settings: &ReportConfig,
) -> String {
    let mut doc = String::new();

    doc.push_str("# Cellfreq Report\n\n");
    doc.push_str(&generate_metadata_section(metadata));

    match output {
        ViewOutput::Samples(samples) => doc.push_str(&generate_samples_section(samples)),
        ViewOutput::Summary(rows) => {
            doc.push_str(&generate_summary_section(rows, settings.frequency_precision))
        }
        ViewOutput::Compare(rows) => {
            doc.push_str(&generate_compare_section(rows, settings.frequency_precision))
        }
        ViewOutput::CompareStats(rows) => {
            doc.push_str(&generate_stats_section(rows, settings))
        }
        ViewOutput::Filter(summary) => {
            doc.push_str(&generate_filter_section(summary, &metadata.filter))
        }
        ViewOutput::Report(report) => doc.push_str(&generate_full_report(report, settings)),
    }

    doc.push_str(&generate_footer());
    doc
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Dataset:** `{}`\n", metadata.dataset));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Subjects:** {}\n", metadata.subjects));
    section.push_str(&format!("- **Samples:** {}\n", metadata.samples));
    section.push_str(&format!(
        "- **Comparison cohort:** {} / {} / {}\n",
        metadata.comparison.sample_type,
        metadata.comparison.treatment,
        metadata.comparison.condition
    ));
    section.push('\n');

    section
}

fn generate_full_report(report: &Report, settings: &ReportConfig) -> String {
    let mut doc = String::new();

    doc.push_str("## Table of Contents\n\n");
    doc.push_str("- [Samples](#samples)\n");
    doc.push_str("- [Population Frequencies](#population-frequencies)\n");
    doc.push_str("- [Responder Comparison](#responder-comparison)\n");
    doc.push_str("- [Statistical Significance](#statistical-significance)\n");
    doc.push_str("- [Cohort Filter](#cohort-filter)\n\n");

    doc.push_str(&generate_samples_section(&report.samples));
    doc.push_str(&generate_summary_section(
        &report.summary,
        settings.frequency_precision,
    ));
    doc.push_str(&generate_compare_section(
        &report.compare,
        settings.frequency_precision,
    ));
    doc.push_str(&generate_stats_section(&report.compare_stats, settings));
    doc.push_str(&generate_filter_section(
        &report.filter,
        &report.metadata.filter,
    ));

    doc
}

fn generate_samples_section(samples: &[Sample]) -> String {
    let mut section = String::new();

    section.push_str("## Samples\n\n");
    if samples.is_empty() {
        section.push_str("No samples in the dataset.\n\n");
        return section;
    }

    section.push_str("| Sample | Subject | Treatment | Response | Type | Time |\n");
    section.push_str("|:---|:---|:---|:---:|:---|---:|\n");
    for s in samples {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            s.sample_id,
            s.subject_id,
            s.treatment,
            s.response.as_deref().unwrap_or("-"),
            s.sample_type,
            s.time_from_treatment_start
        ));
    }
    section.push('\n');

    section
}

fn generate_summary_section(rows: &[SummaryRow], precision: usize) -> String {
    let mut section = String::new();

    section.push_str("## Population Frequencies\n\n");
    if rows.is_empty() {
        section.push_str("No samples with counted cells.\n\n");
        return section;
    }

    section.push_str("| Sample | Population | Count | Total Count | Relative Frequency (%) |\n");
    section.push_str("|:---|:---|---:|---:|---:|\n");
    for row in rows {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {:.*} |\n",
            row.sample_id,
            row.population,
            row.count,
            row.total_count,
            precision,
            row.relative_frequency
        ));
    }
    section.push('\n');

    section
}

/// Min, mean and max of a group.
fn describe(values: &[f64]) -> Option<(f64, f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    Some((min, mean, max))
}

fn describe_cell(values: &[f64], precision: usize) -> String {
    match describe(values) {
        Some((min, mean, max)) => format!(
            "{} | {:.*} | {:.*} – {:.*}",
            values.len(),
            precision,
            mean,
            precision,
            min,
            precision,
            max
        ),
        None => "0 | - | -".to_string(),
    }
}

fn generate_compare_section(rows: &[ComparisonRow], precision: usize) -> String {
    let mut section = String::new();

    section.push_str("## Responder Comparison\n\n");
    if rows.is_empty() {
        section.push_str("No responder or non-responder samples match the cohort.\n\n");
        return section;
    }

    let mut by_population: BTreeMap<Population, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for row in rows {
        let entry = by_population.entry(row.population).or_default();
        match row.response {
            Response::Responder => entry.0.push(row.relative_frequency),
            Response::NonResponder => entry.1.push(row.relative_frequency),
        }
    }

    section.push_str("| Population | y: n | y: Mean (%) | y: Range (%) |");
    section.push_str(" n: n | n: Mean (%) | n: Range (%) |\n");
    section.push_str("|:---|---:|---:|:---:|---:|---:|:---:|\n");
    for population in Population::ALL {
        let Some((responders, non_responders)) = by_population.get(&population) else {
            continue;
        };
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            population,
            describe_cell(responders, precision),
            describe_cell(non_responders, precision)
        ));
    }
    section.push('\n');

    section
}

fn generate_stats_section(rows: &[SignificanceRow], settings: &ReportConfig) -> String {
    let mut section = String::new();

    section.push_str("## Statistical Significance\n\n");
    section.push_str("Two-sided Welch's t-test per population, significant at p < 0.05. ");
    section.push_str("Populations with fewer than two samples in either group are not tested.\n\n");
    if rows.is_empty() {
        section.push_str("No populations to test.\n\n");
        return section;
    }

    if settings.include_statistics {
        section.push_str("| Population | p-value | Significant? | y | n |");
        section.push_str(" y: Mean (%) | n: Mean (%) | t | df |\n");
        section.push_str("|:---|---:|:---:|---:|---:|---:|---:|---:|---:|\n");
    } else {
        section.push_str("| Population | p-value | Significant? |\n");
        section.push_str("|:---|---:|:---:|\n");
    }

    for row in rows {
        let p_value = row
            .p_value
            .map(|p| format!("{:.4}", p))
            .unwrap_or_else(|| "N/A".to_string());
        let significant = if row.significant { "Yes" } else { "No" };

        section.push_str(&format!("| {} | {} | {} |", row.population, p_value, significant));
        if settings.include_statistics {
            let detail = row.detail.as_ref();
            let precision = settings.frequency_precision;
            section.push_str(&format!(
                " {} | {} | {} | {} | {} | {} |",
                detail.map_or(0, |d| d.responders),
                detail.map_or(0, |d| d.non_responders),
                format_optional(detail.and_then(|d| d.responder_mean), precision),
                format_optional(detail.and_then(|d| d.non_responder_mean), precision),
                format_optional(detail.and_then(|d| d.t_statistic), 3),
                format_optional(detail.and_then(|d| d.df), 3)
            ));
        }
        section.push('\n');
    }
    section.push('\n');

    section
}

fn format_optional(value: Option<f64>, precision: usize) -> String {
    value
        .map(|v| format!("{:.*}", precision, v))
        .unwrap_or_else(|| "-".to_string())
}

fn generate_filter_section(summary: &FilterSummary, filter: &CohortFilter) -> String {
    let mut section = String::new();

    section.push_str("## Cohort Filter\n\n");
    section.push_str(&format!(
        "*{} / {} / {} / time from treatment start {}*\n\n",
        filter.sample_type, filter.condition, filter.treatment, filter.time_from_treatment_start
    ));

    section.push_str(&format!("**Matching samples:** {}\n\n", summary.sample_ids.len()));
    if !summary.sample_ids.is_empty() {
        section.push_str(&format!("{}\n\n", summary.sample_ids.join(", ")));
    }

    section.push_str(&count_table(
        "Samples per Project",
        "Project",
        &summary.num_samples_per_project,
    ));
    section.push_str(&count_table("Subjects per Response", "Response", &summary.response_counts));
    section.push_str(&count_table("Subjects per Sex", "Sex", &summary.sex_counts));

    section
}

fn count_table(title: &str, key: &str, counts: &BTreeMap<String, usize>) -> String {
    let mut table = format!("### {}\n\n", title);
    if counts.is_empty() {
        table.push_str("None.\n\n");
        return table;
    }

    table.push_str(&format!("| {} | Count |\n", key));
    table.push_str("|:---|:---:|\n");
    for (value, count) in counts {
        table.push_str(&format!("| {} | {} |\n", value, count));
    }
    table.push('\n');

    table
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by cellfreq*\n".to_string()
}
