//! Host data collection interface
//!
//! The viewer never owns data. It reads datasets, components and subset
//! groups through [`DataCollection`] and asks it for statistics.
//! [`InMemoryCollection`] is a complete implementation used by the CLI
//! and the tests.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use statsview_selection::{parse_selection, EvalContext, EvalError, Evaluator, ParseError, SelectionExpr};
use statsview_stats::{compute, StatKind};

/// Errors raised by a data collection
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Dataset index {0} out of range")]
    DatasetOutOfRange(usize),

    #[error("Component index {component} out of range for dataset {dataset}")]
    ComponentOutOfRange { dataset: usize, component: usize },

    #[error("Subset index {0} out of range")]
    SubsetOutOfRange(usize),

    #[error("Component '{0}' is not numeric")]
    NonNumeric(String),

    /// The subset predicate cannot be evaluated on this dataset,
    /// typically because the dataset is not linked to the fields it uses
    #[error("Subset '{subset}' cannot be applied to '{dataset}': {reason}")]
    IncompatibleSubset {
        subset: String,
        dataset: String,
        reason: String,
    },

    #[error("Dataset '{0}' already exists")]
    DuplicateDataset(String),

    #[error("Column '{column}' has {actual} values, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
}

/// A component as the viewer sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentInfo {
    pub label: String,
    pub categorical: bool,
}

/// Column values of a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnValues {
    Numeric(Vec<f64>),
    Categorical(Vec<String>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Numeric(v) => v.len(),
            ColumnValues::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self, ColumnValues::Categorical(_))
    }
}

/// A named column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub label: String,
    pub values: ColumnValues,
}

/// A dataset to be added to the collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDataset {
    pub label: String,
    pub columns: Vec<Column>,
}

/// What the viewer needs from the host's data collection
pub trait DataCollection {
    /// Number of datasets
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn dataset_label(&self, dataset: usize) -> Option<String>;

    /// Point count of a dataset
    fn dataset_size(&self, dataset: usize) -> usize;

    /// Components of a dataset, in order
    fn components(&self, dataset: usize) -> Vec<ComponentInfo>;

    /// Subset group labels, in creation order
    fn subset_groups(&self) -> Vec<String>;

    /// Compute one statistic of a component, optionally restricted to a subset
    fn compute_statistic(
        &self,
        kind: StatKind,
        dataset: usize,
        component: usize,
        subset: Option<usize>,
    ) -> Result<f64, ProviderError>;

    /// Add a dataset built by the viewer
    fn add_dataset(&mut self, dataset: NewDataset) -> Result<(), ProviderError>;

    fn dataset_labels(&self) -> Vec<String> {
        (0..self.len()).filter_map(|i| self.dataset_label(i)).collect()
    }

    fn dataset_index(&self, label: &str) -> Option<usize> {
        (0..self.len()).find(|&i| self.dataset_label(i).as_deref() == Some(label))
    }

    fn component_index(&self, dataset: usize, label: &str) -> Option<usize> {
        self.components(dataset).iter().position(|c| c.label == label)
    }

    fn subset_index(&self, label: &str) -> Option<usize> {
        self.subset_groups().iter().position(|s| s == label)
    }
}

/// A dataset held in memory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub label: String,
    pub columns: Vec<Column>,
}

impl Dataset {
    /// Point count (length of the first column)
    pub fn size(&self) -> usize {
        self.columns.first().map(|c| c.values.len()).unwrap_or(0)
    }

    fn numeric(&self, label: &str) -> Option<&[f64]> {
        self.columns.iter().find(|c| c.label == label).and_then(|c| match &c.values {
            ColumnValues::Numeric(v) => Some(v.as_slice()),
            ColumnValues::Categorical(_) => None,
        })
    }
}

impl EvalContext for Dataset {
    fn has_field(&self, field: &str) -> bool {
        self.numeric(field).is_some()
    }

    fn field_value(&self, field: &str, index: usize) -> Option<f64> {
        self.numeric(field).and_then(|v| v.get(index).copied())
    }

    fn num_points(&self) -> usize {
        self.size()
    }
}

/// A subset group: a predicate shared by all datasets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsetGroup {
    pub label: String,
    pub predicate: SelectionExpr,
}

/// Collection of in-memory datasets and subset groups
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InMemoryCollection {
    datasets: Vec<Dataset>,
    subsets: Vec<SubsetGroup>,
}

impl InMemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a dataset built from `(label, values)` pairs
    pub fn push_dataset<I, S>(&mut self, label: impl Into<String>, columns: I)
    where
        I: IntoIterator<Item = (S, ColumnValues)>,
        S: Into<String>,
    {
        self.datasets.push(Dataset {
            label: label.into(),
            columns: columns
                .into_iter()
                .map(|(label, values)| Column {
                    label: label.into(),
                    values,
                })
                .collect(),
        });
    }

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    pub fn dataset(&self, label: &str) -> Option<&Dataset> {
        self.datasets.iter().find(|d| d.label == label)
    }

    fn dataset_mut(&mut self, label: &str) -> Option<&mut Dataset> {
        self.datasets.iter_mut().find(|d| d.label == label)
    }

    pub fn subsets(&self) -> &[SubsetGroup] {
        &self.subsets
    }

    /// Define a subset group from predicate text
    pub fn define_subset(&mut self, label: impl Into<String>, predicate: &str) -> Result<(), ParseError> {
        let predicate = parse_selection(predicate)?;
        self.subsets.push(SubsetGroup {
            label: label.into(),
            predicate,
        });
        Ok(())
    }

    /// Replace a subset group's predicate; false if the group is unknown
    pub fn set_subset_predicate(&mut self, label: &str, predicate: &str) -> Result<bool, ParseError> {
        let predicate = parse_selection(predicate)?;
        match self.subsets.iter_mut().find(|s| s.label == label) {
            Some(group) => {
                group.predicate = predicate;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn rename_subset(&mut self, old: &str, new: &str) -> bool {
        match self.subsets.iter_mut().find(|s| s.label == old) {
            Some(group) => {
                group.label = new.to_string();
                true
            }
            None => false,
        }
    }

    pub fn remove_subset(&mut self, label: &str) -> bool {
        let before = self.subsets.len();
        self.subsets.retain(|s| s.label != label);
        self.subsets.len() != before
    }

    pub fn remove_dataset(&mut self, label: &str) -> bool {
        let before = self.datasets.len();
        self.datasets.retain(|d| d.label != label);
        self.datasets.len() != before
    }

    pub fn rename_dataset(&mut self, old: &str, new: &str) -> bool {
        match self.dataset_mut(old) {
            Some(dataset) => {
                dataset.label = new.to_string();
                true
            }
            None => false,
        }
    }

    pub fn add_component(&mut self, dataset: &str, label: impl Into<String>, values: ColumnValues) -> bool {
        match self.dataset_mut(dataset) {
            Some(d) => {
                d.columns.push(Column {
                    label: label.into(),
                    values,
                });
                true
            }
            None => false,
        }
    }

    pub fn rename_component(&mut self, dataset: &str, old: &str, new: &str) -> bool {
        let column = self
            .dataset_mut(dataset)
            .and_then(|d| d.columns.iter_mut().find(|c| c.label == old));
        match column {
            Some(c) => {
                c.label = new.to_string();
                true
            }
            None => false,
        }
    }

    pub fn remove_component(&mut self, dataset: &str, label: &str) -> bool {
        match self.dataset_mut(dataset) {
            Some(d) => {
                let before = d.columns.len();
                d.columns.retain(|c| c.label != label);
                d.columns.len() != before
            }
            None => false,
        }
    }

    /// Membership mask of a subset group within a dataset
    pub fn membership(&self, dataset: usize, subset: usize) -> Result<Vec<bool>, ProviderError> {
        let data = self
            .datasets
            .get(dataset)
            .ok_or(ProviderError::DatasetOutOfRange(dataset))?;
        let group = self
            .subsets
            .get(subset)
            .ok_or(ProviderError::SubsetOutOfRange(subset))?;

        Evaluator::new(data)
            .evaluate(&group.predicate)
            .map_err(|e| ProviderError::IncompatibleSubset {
                subset: group.label.clone(),
                dataset: data.label.clone(),
                reason: match e {
                    EvalError::FieldNotFound(field) => format!("no component '{}'", field),
                    other => other.to_string(),
                },
            })
    }
}

impl DataCollection for InMemoryCollection {
    fn len(&self) -> usize {
        self.datasets.len()
    }

    fn dataset_label(&self, dataset: usize) -> Option<String> {
        self.datasets.get(dataset).map(|d| d.label.clone())
    }

    fn dataset_size(&self, dataset: usize) -> usize {
        self.datasets.get(dataset).map(Dataset::size).unwrap_or(0)
    }

    fn components(&self, dataset: usize) -> Vec<ComponentInfo> {
        self.datasets
            .get(dataset)
            .map(|d| {
                d.columns
                    .iter()
                    .map(|c| ComponentInfo {
                        label: c.label.clone(),
                        categorical: c.values.is_categorical(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn subset_groups(&self) -> Vec<String> {
        self.subsets.iter().map(|s| s.label.clone()).collect()
    }

    fn compute_statistic(
        &self,
        kind: StatKind,
        dataset: usize,
        component: usize,
        subset: Option<usize>,
    ) -> Result<f64, ProviderError> {
        let data = self
            .datasets
            .get(dataset)
            .ok_or(ProviderError::DatasetOutOfRange(dataset))?;
        let column = data
            .columns
            .get(component)
            .ok_or(ProviderError::ComponentOutOfRange { dataset, component })?;
        let values = match &column.values {
            ColumnValues::Numeric(v) => v,
            ColumnValues::Categorical(_) => {
                return Err(ProviderError::NonNumeric(column.label.clone()))
            }
        };

        match subset {
            None => Ok(compute(kind, values)),
            Some(subset) => {
                let mask = self.membership(dataset, subset)?;
                let selected: Vec<f64> = values
                    .iter()
                    .zip(mask)
                    .filter_map(|(&v, keep)| keep.then_some(v))
                    .collect();
                Ok(compute(kind, &selected))
            }
        }
    }

    fn add_dataset(&mut self, dataset: NewDataset) -> Result<(), ProviderError> {
        if self.dataset(&dataset.label).is_some() {
            return Err(ProviderError::DuplicateDataset(dataset.label));
        }
        let expected = dataset.columns.first().map(|c| c.values.len()).unwrap_or(0);
        if let Some(bad) = dataset.columns.iter().find(|c| c.values.len() != expected) {
            return Err(ProviderError::LengthMismatch {
                column: bad.label.clone(),
                expected,
                actual: bad.values.len(),
            });
        }
        self.datasets.push(Dataset {
            label: dataset.label,
            columns: dataset.columns,
        });
        Ok(())
    }
}
