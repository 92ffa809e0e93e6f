//! Data models for the cohort engine.
//!
//! This module contains the core data structures shared by the cohort
//! reader, the analysis components and the report layer: subjects,
//! samples, cell counts, the ingestion record and the filter predicates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Immune-cell population counted per sample.
///
/// The set is closed. Declaration order is the canonical output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Population {
    BCell,
    Cd8TCell,
    Cd4TCell,
    NkCell,
    Monocyte,
}

impl Population {
    /// All populations in canonical order.
    pub const ALL: [Population; 5] = [
        Population::BCell,
        Population::Cd8TCell,
        Population::Cd4TCell,
        Population::NkCell,
        Population::Monocyte,
    ];

    /// Returns the wire name of the population.
    pub fn as_str(&self) -> &'static str {
        match self {
            Population::BCell => "b_cell",
            Population::Cd8TCell => "cd8_t_cell",
            Population::Cd4TCell => "cd4_t_cell",
            Population::NkCell => "nk_cell",
            Population::Monocyte => "monocyte",
        }
    }
}

impl fmt::Display for Population {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Clinical response label that participates in comparative analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Response {
    #[serde(rename = "y")]
    Responder,
    #[serde(rename = "n")]
    NonResponder,
}

impl Response {
    /// Parse a raw response value. Only the exact strings `"y"` and `"n"`
    /// are recognized; anything else does not participate.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "y" => Some(Response::Responder),
            "n" => Some(Response::NonResponder),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Response::Responder => "y",
            Response::NonResponder => "n",
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A clinical trial participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub subject_id: String,
    pub project: String,
    pub condition: String,
    pub age: u32,
    /// Sex label; absent values are excluded from sex counts.
    pub sex: Option<String>,
}

/// One biological specimen draw, owned by exactly one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub sample_id: String,
    pub subject_id: String,
    pub treatment: String,
    /// Raw response value (`"y"`, `"n"`, or anything else / absent).
    pub response: Option<String>,
    pub sample_type: String,
    pub time_from_treatment_start: i64,
}

/// Count of one population in one sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellCount {
    pub sample_id: String,
    pub population: Population,
    pub count: u64,
}

/// Ingestion record: one sample with its subject attributes and counts.
///
/// `cell_counts` is a closed map; unknown population keys fail to
/// deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    pub sample_id: String,
    pub subject_id: String,
    pub project: String,
    pub condition: String,
    pub age: u32,
    #[serde(default)]
    pub sex: Option<String>,
    pub treatment: String,
    #[serde(default)]
    pub response: Option<String>,
    pub sample_type: String,
    pub time_from_treatment_start: i64,
    #[serde(default)]
    pub cell_counts: BTreeMap<Population, u64>,
}

impl SampleRecord {
    /// Split the subject attributes out of the record.
    pub fn subject(&self) -> Subject {
        Subject {
            subject_id: self.subject_id.clone(),
            project: self.project.clone(),
            condition: self.condition.clone(),
            age: self.age,
            sex: self.sex.clone(),
        }
    }

    /// Split the sample attributes out of the record.
    pub fn sample(&self) -> Sample {
        Sample {
            sample_id: self.sample_id.clone(),
            subject_id: self.subject_id.clone(),
            treatment: self.treatment.clone(),
            response: self.response.clone(),
            sample_type: self.sample_type.clone(),
            time_from_treatment_start: self.time_from_treatment_start,
        }
    }

    /// Cell count rows in canonical population order.
    pub fn counts(&self) -> Vec<CellCount> {
        self.cell_counts
            .iter()
            .map(|(population, count)| CellCount {
                sample_id: self.sample_id.clone(),
                population: *population,
                count: *count,
            })
            .collect()
    }
}

/// Joined row feeding the responder comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparativeRow {
    pub sample_id: String,
    pub response: String,
    pub population: Population,
    pub count: u64,
}

/// Joined row feeding the cohort filter summary. One row per sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CohortRow {
    pub sample_id: String,
    pub subject_id: String,
    pub project: String,
    pub response: Option<String>,
    pub sex: Option<String>,
}

/// Predicate selecting samples for the responder comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonFilter {
    pub sample_type: String,
    pub treatment: String,
    pub condition: String,
}

impl Default for ComparisonFilter {
    fn default() -> Self {
        Self {
            sample_type: "PBMC".to_string(),
            treatment: "tr1".to_string(),
            condition: "melanoma".to_string(),
        }
    }
}

/// Predicate selecting samples for the cohort filter summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortFilter {
    pub sample_type: String,
    pub time_from_treatment_start: i64,
    pub treatment: String,
    pub condition: String,
}

impl Default for CohortFilter {
    fn default() -> Self {
        Self {
            sample_type: "PBMC".to_string(),
            time_from_treatment_start: 0,
            treatment: "tr1".to_string(),
            condition: "melanoma".to_string(),
        }
    }
}
