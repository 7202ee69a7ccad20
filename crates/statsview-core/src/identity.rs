//! Identity resolution
//!
//! Every calculation row is keyed by (subset, dataset, component) labels.
//! The resolver maps those labels back to the indices the host collection
//! uses, and translates the display forms the trees show
//! (`"S1 (D1)"`, `"All data (D1)"`) back to plain labels.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::collection::DataCollection;
use crate::error::{ViewerError, ViewerResult};

/// Subset label used for dataset-level rows
pub const ALL_DATA: &str = "All data";

/// Stable identity of a calculation row.
///
/// `subset` is `None` for dataset-level ("All data") rows. The same value
/// keys the statistic cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowIdentity {
    pub subset: Option<String>,
    pub dataset: String,
    pub component: String,
}

impl RowIdentity {
    /// Row for a whole dataset
    pub fn dataset_level(dataset: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            subset: None,
            dataset: dataset.into(),
            component: component.into(),
        }
    }

    /// Row for a subset of a dataset
    pub fn subset_level(
        subset: impl Into<String>,
        dataset: impl Into<String>,
        component: impl Into<String>,
    ) -> Self {
        Self {
            subset: Some(subset.into()),
            dataset: dataset.into(),
            component: component.into(),
        }
    }

    /// Build from the labels a tree displays.
    ///
    /// Accepts `"All data"` or `"All data (<dataset>)"` for dataset-level
    /// rows, and a dataset name optionally wrapped as `"<subset> (<dataset>)"`.
    pub fn from_display(subset_name: &str, dataset_name: &str, component_name: &str) -> Self {
        if is_all_data(subset_name) {
            Self::dataset_level(dataset_name, component_name)
        } else {
            Self::subset_level(
                subset_name,
                unwrap_dataset_label(subset_name, dataset_name),
                component_name,
            )
        }
    }

    /// `"All data"` or the subset label
    pub fn subset_label(&self) -> &str {
        self.subset.as_deref().unwrap_or(ALL_DATA)
    }

    pub fn is_dataset_level(&self) -> bool {
        self.subset.is_none()
    }
}

impl fmt::Display for RowIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} / {}", self.subset_label(), self.dataset, self.component)
    }
}

/// Collection indices for a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRow {
    pub identity: RowIdentity,
    /// `None` for dataset-level rows
    pub subset: Option<usize>,
    pub dataset: usize,
    pub component: usize,
    pub categorical: bool,
}

/// `"<subset> (<dataset>)"`
pub fn wrap_dataset_label(subset: &str, dataset: &str) -> String {
    format!("{} ({})", subset, dataset)
}

/// Strip a `"<subset> ("` prefix and `")"` suffix; plain labels pass through
pub fn unwrap_dataset_label<'a>(subset: &str, dataset_name: &'a str) -> &'a str {
    dataset_name
        .strip_prefix(subset)
        .and_then(|rest| rest.strip_prefix(" ("))
        .and_then(|rest| rest.strip_suffix(')'))
        .unwrap_or(dataset_name)
}

fn is_all_data(subset_name: &str) -> bool {
    subset_name == ALL_DATA
        || subset_name
            .strip_prefix(ALL_DATA)
            .is_some_and(|rest| rest.starts_with(" (") && rest.ends_with(')'))
}

/// Resolve display labels to collection indices
pub fn resolve<C: DataCollection + ?Sized>(
    collection: &C,
    subset_name: &str,
    dataset_name: &str,
    component_name: &str,
) -> ViewerResult<ResolvedRow> {
    resolve_row(
        collection,
        &RowIdentity::from_display(subset_name, dataset_name, component_name),
    )
}

/// Resolve a row identity to collection indices
pub fn resolve_row<C: DataCollection + ?Sized>(
    collection: &C,
    row: &RowIdentity,
) -> ViewerResult<ResolvedRow> {
    let not_found = || ViewerError::identity_not_found(row);

    let dataset = collection.dataset_index(&row.dataset).ok_or_else(not_found)?;
    let subset = match &row.subset {
        Some(label) => Some(collection.subset_index(label).ok_or_else(not_found)?),
        None => None,
    };
    let components = collection.components(dataset);
    let component = components
        .iter()
        .position(|c| c.label == row.component)
        .ok_or_else(not_found)?;

    Ok(ResolvedRow {
        identity: row.clone(),
        subset,
        dataset,
        component,
        categorical: components[component].categorical,
    })
}
