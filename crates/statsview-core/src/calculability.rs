//! Calculability analysis
//!
//! Decides whether the provider can produce numbers for a row. A pair of
//! (subset, dataset) is probed once, with `minimum` on its first numeric
//! component; every row under the pair shares the result. Dataset-level
//! rows are always calculable.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::collection::DataCollection;
use statsview_stats::StatKind;

/// Whether a node can be selected for calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Calculability {
    Calculable,
    /// Rendered grayed; never selectable
    NotCalculable,
    /// Not probed yet; treated as selectable
    #[default]
    NotProbed,
}

impl Calculability {
    pub fn is_selectable(&self) -> bool {
        !matches!(self, Calculability::NotCalculable)
    }
}

/// Probe one (dataset, subset, component) combination.
///
/// Categorical components are calculable: they deterministically yield NaN
/// without asking the provider. A provider error or a NaN minimum (no
/// intersecting points) means not calculable.
pub fn probe<C: DataCollection + ?Sized>(
    collection: &C,
    dataset: usize,
    subset: Option<usize>,
    component: usize,
) -> Calculability {
    let categorical = collection
        .components(dataset)
        .get(component)
        .map(|c| c.categorical)
        .unwrap_or(false);
    if categorical {
        return Calculability::Calculable;
    }

    match collection.compute_statistic(StatKind::Minimum, dataset, component, subset) {
        Ok(value) if value.is_nan() => {
            debug!("Probe of dataset {} subset {:?}: no data", dataset, subset);
            Calculability::NotCalculable
        }
        Ok(_) => Calculability::Calculable,
        Err(e) => {
            debug!("Probe of dataset {} subset {:?} failed: {}", dataset, subset, e);
            Calculability::NotCalculable
        }
    }
}

/// Probe a (subset, dataset) pair through its first numeric component.
///
/// A dataset with only categorical components is calculable.
pub fn probe_pair<C: DataCollection + ?Sized>(
    collection: &C,
    dataset: usize,
    subset: usize,
) -> Calculability {
    match collection
        .components(dataset)
        .iter()
        .position(|c| !c.categorical)
    {
        Some(component) => probe(collection, dataset, Some(subset), component),
        None => Calculability::Calculable,
    }
}
