//! Request-scoped analysis pipeline.
//!
//! An [`Engine`] borrows a cohort reader for the duration of a call and
//! runs reader → aggregator → grouper → tester → formatter. Nothing is
//! cached between calls.

use crate::analysis::{
    aggregate_counts, group_by_population, group_cohort, response_frequencies, test_populations,
    PopulationTest,
};
use crate::cohort::CohortReader;
use crate::error::ReadResult;
use crate::models::{CohortFilter, ComparisonFilter, Sample};
use crate::report::formatter::{
    comparison_rows, filter_summary, significance_rows, summary_rows, ComparisonRow,
    FilterSummary, SignificanceRow, SummaryRow,
};
use tracing::debug;

/// Analysis entry points over one reader.
pub struct Engine<'r, R: CohortReader + ?Sized> {
    reader: &'r R,
}

impl<'r, R: CohortReader + ?Sized> Engine<'r, R> {
    pub fn new(reader: &'r R) -> Self {
        Self { reader }
    }

    /// Every sample in the store.
    pub fn samples(&self) -> ReadResult<Vec<Sample>> {
        self.reader.samples()
    }

    /// Relative frequencies for every sample with a non-zero total.
    pub fn summary(&self) -> ReadResult<Vec<SummaryRow>> {
        let mut counts = Vec::new();
        for sample in self.reader.samples()? {
            counts.extend(self.reader.cell_counts(&sample.sample_id)?);
        }
        let frequencies = aggregate_counts(&counts);
        debug!("Summary has {} rows", frequencies.len());
        Ok(summary_rows(&frequencies))
    }

    /// Relative frequencies of responders and non-responders.
    pub fn compare(&self, filter: &ComparisonFilter) -> ReadResult<Vec<ComparisonRow>> {
        let rows = self.reader.comparative_rows(filter)?;
        Ok(comparison_rows(&response_frequencies(&rows)))
    }

    /// Full per-population test results.
    pub fn population_tests(&self, filter: &ComparisonFilter) -> ReadResult<Vec<PopulationTest>> {
        let rows = self.reader.comparative_rows(filter)?;
        Ok(test_populations(&group_by_population(&rows)))
    }

    /// Significance table for the responder comparison.
    pub fn compare_stats(&self, filter: &ComparisonFilter) -> ReadResult<Vec<SignificanceRow>> {
        Ok(significance_rows(&self.population_tests(filter)?))
    }

    /// Cohort counts for samples matching the filter.
    pub fn filter(&self, filter: &CohortFilter) -> ReadResult<FilterSummary> {
        let rows = self.reader.cohort_rows(filter)?;
        Ok(filter_summary(group_cohort(&rows)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cohort::tests::record;
    use crate::cohort::MemoryCohort;
    use crate::error::ReadError;
    use crate::models::{CellCount, CohortRow, ComparativeRow, Population, Response};
    use std::path::PathBuf;

    fn fixture_cohort() -> MemoryCohort {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/cohort.json");
        MemoryCohort::load(&path).unwrap()
    }

    fn two_counts(b_cell: u64, nk_cell: u64) -> [(Population, u64); 2] {
        [(Population::BCell, b_cell), (Population::NkCell, nk_cell)]
    }

    struct FailingReader;

    impl CohortReader for FailingReader {
        fn samples(&self) -> ReadResult<Vec<Sample>> {
            Err(ReadError::Unavailable("store offline".to_string()))
        }

        fn cell_counts(&self, sample_id: &str) -> ReadResult<Vec<CellCount>> {
            Err(ReadError::SampleNotFound(sample_id.to_string()))
        }

        fn comparative_rows(&self, _: &ComparisonFilter) -> ReadResult<Vec<ComparativeRow>> {
            Err(ReadError::Unavailable("store offline".to_string()))
        }

        fn cohort_rows(&self, _: &CohortFilter) -> ReadResult<Vec<CohortRow>> {
            Err(ReadError::Unavailable("store offline".to_string()))
        }
    }

    #[test]
    fn test_summary_example() {
        let cohort = MemoryCohort::from_records(vec![record(
            "s1",
            "a",
            Some("y"),
            &[(Population::BCell, 10), (Population::Monocyte, 10)],
        )]);

        let rows = Engine::new(&cohort).summary().unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].population, Population::BCell);
        assert_eq!(rows[0].relative_frequency, 50.0);
        assert_eq!(rows[1].population, Population::Monocyte);
        assert_eq!(rows[1].relative_frequency, 50.0);
        assert!(rows.iter().all(|r| r.total_count == 20));
    }

    #[test]
    fn test_summary_skips_zero_total_samples() {
        let cohort = fixture_cohort();
        let rows = Engine::new(&cohort).summary().unwrap();

        assert!(rows.iter().all(|r| r.sample_id != "s9"));
        assert_eq!(rows.len(), 8 * 5);

        for sample_id in ["s1", "s2", "s3", "s4", "s5", "s6", "s7", "s8"] {
            let sum: f64 = rows
                .iter()
                .filter(|r| r.sample_id == sample_id)
                .map(|r| r.relative_frequency)
                .sum();
            assert!((sum - 100.0).abs() < 1e-6, "{} sums to {}", sample_id, sum);
        }
    }

    #[test]
    fn test_summary_follows_reader_order() {
        let cohort = MemoryCohort::from_records(vec![
            record("s2", "b", Some("n"), &two_counts(1, 3)),
            record("s0", "c", Some("n"), &two_counts(0, 0)),
            record("s1", "a", Some("y"), &two_counts(3, 1)),
        ]);

        let rows = Engine::new(&cohort).summary().unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r.sample_id.as_str()).collect();

        assert_eq!(ids, vec!["s2", "s2", "s1", "s1"]);
        assert_eq!(rows[0].relative_frequency, 25.0);
        assert_eq!(rows[2].relative_frequency, 75.0);
    }

    #[test]
    fn test_summary_is_idempotent() {
        let cohort = fixture_cohort();
        let engine = Engine::new(&cohort);

        let first = serde_json::to_string(&engine.summary().unwrap()).unwrap();
        let second = serde_json::to_string(&engine.summary().unwrap()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_compare_excludes_zero_totals_and_unknown_responses() {
        let cohort = fixture_cohort();
        let rows = Engine::new(&cohort)
            .compare(&ComparisonFilter::default())
            .unwrap();

        // s1, s2, s4 responders; s3, s5 non-responders; s9 has no cells.
        assert_eq!(rows.len(), 5 * 5);
        let responders = rows
            .iter()
            .filter(|r| r.response == Response::Responder)
            .count();
        assert_eq!(responders, 15);

        let b_cell_n: Vec<f64> = rows
            .iter()
            .filter(|r| {
                r.population == Population::BCell && r.response == Response::NonResponder
            })
            .map(|r| r.relative_frequency)
            .collect();
        assert_eq!(b_cell_n, vec![20.0, 22.0]);
    }

    #[test]
    fn test_compare_stats_fixture() {
        let cohort = fixture_cohort();
        let rows = Engine::new(&cohort)
            .compare_stats(&ComparisonFilter::default())
            .unwrap();

        let populations: Vec<Population> = rows.iter().map(|r| r.population).collect();
        assert_eq!(populations, Population::ALL.to_vec());

        let expected = [
            (Some(0.0084), true),
            (Some(0.0025), true),
            (Some(0.8802), false),
            (Some(0.6588), false),
            (Some(1.0), false),
        ];
        for (row, (p_value, significant)) in rows.iter().zip(expected) {
            assert_eq!(row.p_value, p_value, "{}", row.population);
            assert_eq!(row.significant, significant, "{}", row.population);
        }
    }

    #[test]
    fn test_compare_stats_single_sample_group() {
        let cohort = MemoryCohort::from_records(vec![
            record("s1", "a", Some("y"), &two_counts(1, 9)),
            record("s2", "b", Some("y"), &two_counts(5, 5)),
            record("s3", "c", Some("n"), &two_counts(9, 1)),
        ]);

        let rows = Engine::new(&cohort)
            .compare_stats(&ComparisonFilter::default())
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.p_value.is_none() && !r.significant));
    }

    #[test]
    fn test_compare_stats_identical_groups() {
        let counts = [two_counts(10, 30), two_counts(20, 20), two_counts(5, 45)];
        let mut records = Vec::new();
        for (i, c) in counts.iter().enumerate() {
            records.push(record(&format!("y{}", i), &format!("ya{}", i), Some("y"), c));
            records.push(record(&format!("n{}", i), &format!("na{}", i), Some("n"), c));
        }
        let cohort = MemoryCohort::from_records(records);

        let rows = Engine::new(&cohort)
            .compare_stats(&ComparisonFilter::default())
            .unwrap();

        assert_eq!(rows.len(), 2);
        for row in rows {
            assert!(row.p_value.unwrap() > 0.05);
            assert!(!row.significant);
        }
    }

    #[test]
    fn test_compare_stats_empty_cohort() {
        let cohort = MemoryCohort::default();
        let rows = Engine::new(&cohort)
            .compare_stats(&ComparisonFilter::default())
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_filter_fixture_defaults() {
        let cohort = fixture_cohort();
        let summary = Engine::new(&cohort).filter(&CohortFilter::default()).unwrap();

        assert_eq!(summary.sample_ids, vec!["s1", "s3", "s4", "s5", "s8", "s9"]);
        assert_eq!(summary.num_samples_per_project.get("prj1"), Some(&3));
        assert_eq!(summary.num_samples_per_project.get("prj2"), Some(&2));
        assert_eq!(summary.num_samples_per_project.get("prj3"), Some(&1));
        assert_eq!(summary.response_counts.get("y"), Some(&2));
        assert_eq!(summary.response_counts.get("n"), Some(&3));
        assert_eq!(summary.sex_counts.get("M"), Some(&3));
        assert_eq!(summary.sex_counts.get("F"), Some(&3));
    }

    #[test]
    fn test_filter_repeat_sampling_counts_subject_once() {
        let mut s3 = record("s3", "b", Some("n"), &[]);
        s3.project = "prj2".to_string();
        s3.sex = Some("M".to_string());
        let cohort = MemoryCohort::from_records(vec![
            record("s1", "a", Some("y"), &[]),
            record("s2", "a", Some("y"), &[]),
            s3,
        ]);

        let summary = Engine::new(&cohort).filter(&CohortFilter::default()).unwrap();

        assert_eq!(summary.sample_ids, vec!["s1", "s2", "s3"]);
        assert_eq!(summary.num_samples_per_project.get("prj1"), Some(&2));
        assert_eq!(summary.num_samples_per_project.get("prj2"), Some(&1));
        assert_eq!(summary.response_counts.get("y"), Some(&1));
        assert_eq!(summary.response_counts.get("n"), Some(&1));
        assert_eq!(summary.sex_counts.get("F"), Some(&1));
        assert_eq!(summary.sex_counts.get("M"), Some(&1));
    }

    #[test]
    fn test_read_failures_propagate() {
        let engine = Engine::new(&FailingReader);

        assert!(matches!(engine.samples(), Err(ReadError::Unavailable(_))));
        assert!(matches!(engine.summary(), Err(ReadError::Unavailable(_))));
        assert!(engine.compare(&ComparisonFilter::default()).is_err());
        assert!(engine.compare_stats(&ComparisonFilter::default()).is_err());
        assert!(engine.filter(&CohortFilter::default()).is_err());
    }

    #[test]
    fn test_engine_over_trait_object() {
        let cohort = fixture_cohort();
        let reader: &dyn CohortReader = &cohort;

        let samples = Engine::new(reader).samples().unwrap();
        assert_eq!(samples.len(), 9);
        assert_eq!(samples[0].sample_id, "s1");
    }
}
