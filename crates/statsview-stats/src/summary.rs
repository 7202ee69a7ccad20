//! Summary statistics for a component
//!
//! Computes the five panel aggregates in one pass over the data:
//! - Mean, median
//! - Min, max
//! - Sum

use serde::{Deserialize, Serialize};

use crate::kind::StatKind;

/// Summary statistics for a numeric column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    /// Number of finite values
    pub count: usize,
    /// Number of missing/NaN values
    pub missing: usize,
    /// Mean (average)
    pub mean: f64,
    /// Median (50th percentile)
    pub median: f64,
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
    /// Sum of finite values
    pub sum: f64,
}

impl SummaryStats {
    /// Compute summary statistics from data
    pub fn from_data(data: &[f64]) -> Self {
        let mut finite: Vec<f64> = data.iter().copied().filter(|x| x.is_finite()).collect();
        let missing = data.len() - finite.len();

        if finite.is_empty() {
            return Self::empty(missing);
        }

        let count = finite.len();
        let sum: f64 = finite.iter().sum();
        let mean = sum / count as f64;

        let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
        let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        finite.sort_by(|a, b| a.total_cmp(b));
        let median = if count % 2 == 0 {
            (finite[count / 2 - 1] + finite[count / 2]) / 2.0
        } else {
            finite[count / 2]
        };

        Self {
            count,
            missing,
            mean,
            median,
            min,
            max,
            sum,
        }
    }

    /// Statistics of a column with no finite values
    fn empty(missing: usize) -> Self {
        Self {
            count: 0,
            missing,
            mean: f64::NAN,
            median: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
            sum: 0.0,
        }
    }

    /// Look up one aggregate
    pub fn get(&self, kind: StatKind) -> f64 {
        match kind {
            StatKind::Mean => self.mean,
            StatKind::Median => self.median,
            StatKind::Minimum => self.min,
            StatKind::Maximum => self.max,
            StatKind::Sum => self.sum,
        }
    }

    /// The five aggregates in column order
    pub fn to_array(&self) -> [f64; 5] {
        [self.mean, self.median, self.min, self.max, self.sum]
    }
}
