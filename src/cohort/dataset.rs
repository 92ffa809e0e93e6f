//! Dataset file loading.
//!
//! A dataset is a JSON array of [`SampleRecord`]s.

use super::MemoryCohort;
use crate::models::SampleRecord;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Read sample records from a JSON file.
pub fn load_records(path: &Path) -> Result<Vec<SampleRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset: {}", path.display()))?;

    let records: Vec<SampleRecord> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse dataset: {}", path.display()))?;

    info!("Loaded {} sample records from {}", records.len(), path.display());
    Ok(records)
}

impl MemoryCohort {
    /// Load a dataset file into a cohort snapshot.
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::from_records(load_records(path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cohort::CohortReader;
    use crate::models::{CohortFilter, Population};
    use std::path::PathBuf;

    fn fixture() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/cohort.json")
    }

    #[test]
    fn test_load_fixture() {
        let cohort = MemoryCohort::load(&fixture()).unwrap();

        assert_eq!(cohort.sample_count(), 9);
        assert_eq!(cohort.subject_count(), 8);

        let counts = cohort.cell_counts("s1").unwrap();
        assert_eq!(counts.len(), 5);
        assert_eq!(counts[0].population, Population::BCell);
        assert_eq!(counts[0].count, 100);

        let rows = cohort.cohort_rows(&CohortFilter::default()).unwrap();
        assert_eq!(rows.len(), 6);
    }

    #[test]
    fn test_missing_file() {
        let err = load_records(Path::new("/nonexistent/cohort.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read dataset"));
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"[{"sample_id": "s1"}]"#).unwrap();

        let err = load_records(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse dataset"));
    }

    #[test]
    fn test_null_response_and_sex() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cohort.json");
        std::fs::write(
            &path,
            r#"[{
                "sample_id": "s1", "subject_id": "a", "project": "prj1",
                "condition": "melanoma", "age": 40, "sex": null,
                "treatment": "tr1", "response": null, "sample_type": "PBMC",
                "time_from_treatment_start": 0,
                "cell_counts": {"b_cell": 5}
            }]"#,
        )
        .unwrap();

        let records = load_records(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].response, None);
        assert_eq!(records[0].sex, None);
    }
}
