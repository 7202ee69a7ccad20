//! Statistic cache
//!
//! Raw five-value tuples keyed by row identity, shared by both views.
//! Entries live until the subset they belong to is edited or the
//! underlying entity is deleted. Renames move entries to their new key.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::collection::DataCollection;
use crate::error::{ViewerError, ViewerResult};
use crate::identity::{ResolvedRow, RowIdentity};
use statsview_stats::StatKind;

/// Cached statistics for one row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatTuple {
    pub identity: RowIdentity,
    /// Mean, median, minimum, maximum, sum
    pub values: [f64; 5],
    /// Computed without the provider because the component is categorical
    pub categorical: bool,
}

impl StatTuple {
    pub fn new(identity: RowIdentity, values: [f64; 5]) -> Self {
        Self {
            identity,
            values,
            categorical: false,
        }
    }

    /// All-NaN tuple for a categorical component
    pub fn categorical(identity: RowIdentity) -> Self {
        Self {
            identity,
            values: [f64::NAN; 5],
            categorical: true,
        }
    }

    pub fn get(&self, kind: StatKind) -> f64 {
        self.values[kind.index()]
    }
}

/// Memoized statistics.
///
/// `get_or_compute` borrows the cache mutably for the whole provider
/// round-trip, so a key can never be computed twice concurrently.
#[derive(Debug, Default)]
pub struct StatisticCache {
    entries: HashMap<RowIdentity, StatTuple>,
    provider_calls: usize,
}

impl StatisticCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, row: &RowIdentity) -> Option<&StatTuple> {
        self.entries.get(row)
    }

    pub fn contains(&self, row: &RowIdentity) -> bool {
        self.entries.contains_key(row)
    }

    /// Number of statistic requests sent to the provider so far
    pub fn provider_calls(&self) -> usize {
        self.provider_calls
    }

    /// Cached tuple for `row`, computing and storing it on a miss.
    ///
    /// A miss costs one provider call per statistic kind. Categorical
    /// components never reach the provider. Failures are not cached.
    pub fn get_or_compute<C: DataCollection + ?Sized>(
        &mut self,
        collection: &C,
        row: &ResolvedRow,
    ) -> ViewerResult<StatTuple> {
        if let Some(hit) = self.entries.get(&row.identity) {
            debug!("Cache hit for {}", row.identity);
            return Ok(hit.clone());
        }

        let tuple = if row.categorical {
            StatTuple::categorical(row.identity.clone())
        } else {
            let mut values = [f64::NAN; 5];
            for kind in StatKind::ALL {
                self.provider_calls += 1;
                values[kind.index()] = collection
                    .compute_statistic(kind, row.dataset, row.component, row.subset)
                    .map_err(|source| ViewerError::ComputationFailure {
                        subset: row.identity.subset_label().to_string(),
                        dataset: row.identity.dataset.clone(),
                        component: row.identity.component.clone(),
                        source,
                    })?;
            }
            StatTuple::new(row.identity.clone(), values)
        };

        debug!("Cache miss for {}, stored", row.identity);
        self.entries.insert(row.identity.clone(), tuple.clone());
        Ok(tuple)
    }

    /// Remove one entry
    pub fn invalidate(&mut self, row: &RowIdentity) -> bool {
        self.entries.remove(row).is_some()
    }

    /// Remove every entry of a subset across all datasets and components
    pub fn invalidate_subset(&mut self, subset: &str) -> usize {
        self.remove_where(|row| row.subset.as_deref() == Some(subset))
    }

    /// Remove every entry of one subset applied to one dataset
    pub fn evict_pair(&mut self, subset: &str, dataset: &str) -> usize {
        self.remove_where(|row| row.subset.as_deref() == Some(subset) && row.dataset == dataset)
    }

    /// Remove every entry of a dataset
    pub fn evict_dataset(&mut self, dataset: &str) -> usize {
        self.remove_where(|row| row.dataset == dataset)
    }

    /// Remove every entry of one component
    pub fn evict_component(&mut self, dataset: &str, component: &str) -> usize {
        self.remove_where(|row| row.dataset == dataset && row.component == component)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Move entries of a renamed dataset to their new keys
    pub fn rename_dataset(&mut self, old: &str, new: &str) -> usize {
        self.rekey(|row| {
            if row.dataset == old {
                row.dataset = new.to_string();
                true
            } else {
                false
            }
        })
    }

    /// Move entries of a renamed component to their new keys
    pub fn rename_component(&mut self, dataset: &str, old: &str, new: &str) -> usize {
        self.rekey(|row| {
            if row.dataset == dataset && row.component == old {
                row.component = new.to_string();
                true
            } else {
                false
            }
        })
    }

    /// Move entries of a renamed subset group to their new keys
    pub fn rename_subset(&mut self, old: &str, new: &str) -> usize {
        self.rekey(|row| {
            if row.subset.as_deref() == Some(old) {
                row.subset = Some(new.to_string());
                true
            } else {
                false
            }
        })
    }

    fn remove_where<F: Fn(&RowIdentity) -> bool>(&mut self, pred: F) -> usize {
        let before = self.entries.len();
        self.entries.retain(|row, _| !pred(row));
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!("Removed {} cache entries", removed);
        }
        removed
    }

    fn rekey<F: Fn(&mut RowIdentity) -> bool>(&mut self, rewrite: F) -> usize {
        let keys: Vec<RowIdentity> = self.entries.keys().cloned().collect();
        let mut moved = 0;
        for key in keys {
            let mut new_key = key.clone();
            if !rewrite(&mut new_key) {
                continue;
            }
            if let Some(mut tuple) = self.entries.remove(&key) {
                tuple.identity = new_key.clone();
                self.entries.insert(new_key, tuple);
                moved += 1;
            }
        }
        moved
    }
}
