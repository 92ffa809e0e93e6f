//! Responder vs non-responder significance testing.
//!
//! Each population is tested on its own with a two-sided Welch's t-test
//! (unequal variances). Populations lacking two values in either group
//! are reported without a p-value.

use super::grouper::ResponseGroups;
use crate::models::Population;
use statrs::distribution::{ContinuousCDF, StudentsT};
use std::collections::BTreeMap;
use tracing::debug;

/// p-values strictly below this are significant. No multiple-comparison
/// correction is applied.
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// Minimum number of values each group needs before the test runs.
pub const MIN_GROUP_SIZE: usize = 2;

/// Outcome of a Welch's t-test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WelchTest {
    /// t statistic (first group minus second group)
    pub t_statistic: f64,
    /// Welch–Satterthwaite degrees of freedom
    pub df: f64,
    /// Two-sided p-value
    pub p_value: f64,
}

/// Size and mean of one response group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupStats {
    pub n: usize,
    pub mean: Option<f64>,
}

impl GroupStats {
    fn of(values: &[f64]) -> Self {
        Self {
            n: values.len(),
            mean: mean(values),
        }
    }
}

/// Test result for one population.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationTest {
    pub population: Population,
    pub responders: GroupStats,
    pub non_responders: GroupStats,
    /// `None` when either group is below [`MIN_GROUP_SIZE`].
    pub test: Option<WelchTest>,
}

impl PopulationTest {
    pub fn p_value(&self) -> Option<f64> {
        self.test.map(|t| t.p_value)
    }

    pub fn is_significant(&self) -> bool {
        self.p_value().is_some_and(|p| p < SIGNIFICANCE_LEVEL)
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Unbiased sample variance. Needs at least two values.
fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some(ss / (values.len() - 1) as f64)
}

/// Two-sided Welch's t-test.
///
/// Returns `None` when either sample has fewer than [`MIN_GROUP_SIZE`]
/// values. With zero variance in both groups the statistic is undefined:
/// equal means give p = 1 and different means give p = 0.
pub fn welch_t_test(a: &[f64], b: &[f64]) -> Option<WelchTest> {
    if a.len() < MIN_GROUP_SIZE || b.len() < MIN_GROUP_SIZE {
        return None;
    }

    let (mean_a, mean_b) = (mean(a)?, mean(b)?);
    let se_a = sample_variance(a)? / a.len() as f64;
    let se_b = sample_variance(b)? / b.len() as f64;
    let se2 = se_a + se_b;
    let diff = mean_a - mean_b;

    if se2 == 0.0 {
        let (t_statistic, p_value) = if diff == 0.0 {
            (0.0, 1.0)
        } else {
            (diff.signum() * f64::INFINITY, 0.0)
        };
        return Some(WelchTest {
            t_statistic,
            df: (a.len() + b.len() - 2) as f64,
            p_value,
        });
    }

    let t_statistic = diff / se2.sqrt();
    let df = se2.powi(2)
        / (se_a.powi(2) / (a.len() - 1) as f64 + se_b.powi(2) / (b.len() - 1) as f64);

    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    let p_value = (2.0 * dist.sf(t_statistic.abs())).clamp(0.0, 1.0);

    Some(WelchTest {
        t_statistic,
        df,
        p_value,
    })
}

/// Test every grouped population, in population order.
pub fn test_populations(groups: &BTreeMap<Population, ResponseGroups>) -> Vec<PopulationTest> {
    groups
        .iter()
        .map(|(population, group)| {
            let test = welch_t_test(&group.responders, &group.non_responders);
            if test.is_none() {
                debug!(
                    "Not enough data to test {} ({} responders, {} non-responders)",
                    population,
                    group.responders.len(),
                    group.non_responders.len()
                );
            }
            PopulationTest {
                population: *population,
                responders: GroupStats::of(&group.responders),
                non_responders: GroupStats::of(&group.non_responders),
                test,
            }
        })
        .collect()
}

/// Round a p-value to four decimal places.
pub fn round_p_value(p: f64) -> f64 {
    (p * 10_000.0).round() / 10_000.0
}
