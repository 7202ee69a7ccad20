//! Statistic kinds and the single-statistic primitive

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::summary::SummaryStats;

/// Errors from the statistics provider
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StatsError {
    #[error("Unknown statistic: {0}")]
    UnknownStatistic(String),
}

/// One of the five aggregates shown in the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatKind {
    Mean,
    Median,
    Minimum,
    Maximum,
    Sum,
}

impl StatKind {
    /// All kinds, in column order
    pub const ALL: [StatKind; 5] = [
        StatKind::Mean,
        StatKind::Median,
        StatKind::Minimum,
        StatKind::Maximum,
        StatKind::Sum,
    ];

    /// Column heading for this statistic
    pub fn heading(&self) -> &'static str {
        match self {
            StatKind::Mean => "Mean",
            StatKind::Median => "Median",
            StatKind::Minimum => "Minimum",
            StatKind::Maximum => "Maximum",
            StatKind::Sum => "Sum",
        }
    }

    /// Position of this statistic within a five-value tuple
    pub fn index(&self) -> usize {
        match self {
            StatKind::Mean => 0,
            StatKind::Median => 1,
            StatKind::Minimum => 2,
            StatKind::Maximum => 3,
            StatKind::Sum => 4,
        }
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.heading())
    }
}

impl FromStr for StatKind {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mean" => Ok(StatKind::Mean),
            "median" => Ok(StatKind::Median),
            "minimum" | "min" => Ok(StatKind::Minimum),
            "maximum" | "max" => Ok(StatKind::Maximum),
            "sum" => Ok(StatKind::Sum),
            _ => Err(StatsError::UnknownStatistic(s.to_string())),
        }
    }
}

/// Compute a single statistic over `data`.
///
/// Non-finite values are skipped. With no finite values left the result is
/// NaN, except for `Sum` which is 0.
pub fn compute(kind: StatKind, data: &[f64]) -> f64 {
    match kind {
        StatKind::Sum => data.iter().copied().filter(|x| x.is_finite()).sum(),
        StatKind::Minimum => finite_fold(data, f64::INFINITY, f64::min),
        StatKind::Maximum => finite_fold(data, f64::NEG_INFINITY, f64::max),
        StatKind::Mean | StatKind::Median => SummaryStats::from_data(data).get(kind),
    }
}

fn finite_fold(data: &[f64], init: f64, f: fn(f64, f64) -> f64) -> f64 {
    let mut seen = false;
    let result = data
        .iter()
        .copied()
        .filter(|x| x.is_finite())
        .inspect(|_| seen = true)
        .fold(init, f);
    if seen {
        result
    } else {
        f64::NAN
    }
}
