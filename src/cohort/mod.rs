//! Cohort data access.
//!
//! The engine reads subjects, samples and counts only through the
//! [`CohortReader`] trait. [`MemoryCohort`] is an immutable in-memory
//! snapshot built from ingestion records.

pub mod dataset;

use crate::error::{ReadError, ReadResult};
use crate::models::{
    CellCount, CohortFilter, CohortRow, ComparativeRow, ComparisonFilter, Response, Sample,
    SampleRecord, Subject,
};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Read access to a snapshot of cohort data.
pub trait CohortReader {
    /// All samples, in storage order.
    fn samples(&self) -> ReadResult<Vec<Sample>>;

    /// Cell counts recorded for one sample.
    fn cell_counts(&self, sample_id: &str) -> ReadResult<Vec<CellCount>>;

    /// Joined count rows for samples matching the filter whose response is
    /// `y` or `n`.
    fn comparative_rows(&self, filter: &ComparisonFilter) -> ReadResult<Vec<ComparativeRow>>;

    /// One row per sample matching the filter, joined with its subject.
    fn cohort_rows(&self, filter: &CohortFilter) -> ReadResult<Vec<CohortRow>>;
}

/// In-memory cohort snapshot.
#[derive(Debug, Clone, Default)]
pub struct MemoryCohort {
    subjects: HashMap<String, Subject>,
    samples: Vec<Sample>,
    counts: HashMap<String, Vec<CellCount>>,
}

impl MemoryCohort {
    /// Build a snapshot from ingestion records.
    ///
    /// The first record seen for a subject defines that subject; later
    /// records only contribute samples. Duplicate sample ids are skipped.
    pub fn from_records(records: impl IntoIterator<Item = SampleRecord>) -> Self {
        let mut cohort = Self::default();

        for record in records {
            if cohort.counts.contains_key(&record.sample_id) {
                warn!("Duplicate sample {} skipped", record.sample_id);
                continue;
            }

            cohort
                .subjects
                .entry(record.subject_id.clone())
                .or_insert_with(|| record.subject());
            cohort
                .counts
                .insert(record.sample_id.clone(), record.counts());
            cohort.samples.push(record.sample());
        }

        debug!(
            "Cohort snapshot: {} subjects, {} samples",
            cohort.subjects.len(),
            cohort.samples.len()
        );

        cohort
    }

    pub fn subject_count(&self) -> usize {
        self.subjects.len()
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Samples joined with their subject. Samples whose subject is missing
    /// drop out, as with an inner join.
    fn joined(&self) -> impl Iterator<Item = (&Sample, &Subject)> + '_ {
        self.samples
            .iter()
            .filter_map(|s| self.subjects.get(&s.subject_id).map(|subj| (s, subj)))
    }
}

impl CohortReader for MemoryCohort {
    fn samples(&self) -> ReadResult<Vec<Sample>> {
        Ok(self.samples.clone())
    }

    fn cell_counts(&self, sample_id: &str) -> ReadResult<Vec<CellCount>> {
        self.counts
            .get(sample_id)
            .cloned()
            .ok_or_else(|| ReadError::SampleNotFound(sample_id.to_string()))
    }

    fn comparative_rows(&self, filter: &ComparisonFilter) -> ReadResult<Vec<ComparativeRow>> {
        let mut rows = Vec::new();

        for (sample, subject) in self.joined() {
            if sample.sample_type != filter.sample_type
                || sample.treatment != filter.treatment
                || subject.condition != filter.condition
            {
                continue;
            }
            let Some(response) = sample.response.as_deref().and_then(Response::parse) else {
                continue;
            };

            for count in self.counts.get(&sample.sample_id).into_iter().flatten() {
                rows.push(ComparativeRow {
                    sample_id: sample.sample_id.clone(),
                    response: response.as_str().to_string(),
                    population: count.population,
                    count: count.count,
                });
            }
        }

        Ok(rows)
    }

    fn cohort_rows(&self, filter: &CohortFilter) -> ReadResult<Vec<CohortRow>> {
        Ok(self
            .joined()
            .filter(|(sample, subject)| {
                sample.sample_type == filter.sample_type
                    && sample.time_from_treatment_start == filter.time_from_treatment_start
                    && sample.treatment == filter.treatment
                    && subject.condition == filter.condition
            })
            .map(|(sample, subject)| CohortRow {
                sample_id: sample.sample_id.clone(),
                subject_id: subject.subject_id.clone(),
                project: subject.project.clone(),
                response: sample.response.clone(),
                sex: subject.sex.clone(),
            })
            .collect())
    }
}
