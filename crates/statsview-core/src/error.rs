//! Error types for statsview-core
//!
//! Provides error handling for:
//! - Row identity resolution
//! - Statistic computation
//! - Export and save-as-dataset
//! - Configuration

use std::path::PathBuf;
use thiserror::Error;

use crate::collection::ProviderError;
use crate::identity::RowIdentity;
use crate::tree::ViewKind;
use statsview_selection::ParseError;

/// Main error type for viewer operations
#[derive(Error, Debug)]
pub enum ViewerError {
    /// A display row or event names something the collection or tree lacks
    #[error("No match for subset '{subset}', dataset '{dataset}', component '{component}'")]
    IdentityNotFound {
        subset: String,
        dataset: String,
        component: String,
    },

    /// The row belongs to a (subset, dataset) pair the provider cannot serve
    #[error("Subset '{subset}' has no calculable data in '{dataset}'")]
    NotCalculable { subset: String, dataset: String },

    /// The provider failed during a real calculation
    #[error("Computation failed for '{component}' in '{dataset}' ({subset}): {source}")]
    ComputationFailure {
        subset: String,
        dataset: String,
        component: String,
        source: ProviderError,
    },

    /// Export errors
    #[error("Export failed: {0}")]
    ExportFailure(#[from] ExportError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// A node handle that is not (or no longer) in the tree
    #[error("Node not found in the {view:?} view")]
    NodeNotFound { view: ViewKind },

    /// Operation not defined for this kind of tree entity
    #[error("Unsupported tree operation: {0}")]
    UnsupportedOperation(String),

    /// Custom column names must be non-empty and unique
    #[error("Invalid column name: '{0}'")]
    InvalidColumnName(String),

    /// Custom column expression refers to an unknown column
    #[error("Unknown column in expression: {0}")]
    UnknownColumnReference(String),

    /// Custom column expression does not parse
    #[error("Expression error: {0}")]
    Expression(#[from] ParseError),

    /// Save-as-dataset name is empty
    #[error("Dataset name must not be empty")]
    EmptyDatasetName,

    /// Save-as-dataset name collides with an existing dataset
    #[error("A dataset named '{0}' already exists")]
    DatasetNameTaken(String),

    /// Nothing has been calculated yet
    #[error("No calculated rows to save")]
    EmptyResults,

    /// `resolve_confirmation` without a pending request
    #[error("No calculation is waiting for confirmation")]
    NoPendingConfirmation,

    /// The host collection refused a mutation
    #[error("Collection error: {0}")]
    Collection(#[from] ProviderError),
}

impl ViewerError {
    /// Identity error for a row
    pub fn identity_not_found(row: &RowIdentity) -> Self {
        Self::IdentityNotFound {
            subset: row.subset_label().to_string(),
            dataset: row.dataset.clone(),
            component: row.component.clone(),
        }
    }

    /// Identity error for an entity named only by some of its labels
    pub fn missing(subset: Option<&str>, dataset: Option<&str>, component: Option<&str>) -> Self {
        Self::IdentityNotFound {
            subset: subset.unwrap_or_default().to_string(),
            dataset: dataset.unwrap_or_default().to_string(),
            component: component.unwrap_or_default().to_string(),
        }
    }
}

/// Errors related to export
#[derive(Error, Debug)]
pub enum ExportError {
    /// Output path cannot be written
    #[error("Cannot write to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// CSV serialization error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Value is out of valid range
    #[error("Value out of range: {0}")]
    OutOfRange(String),

    /// File could not be parsed
    #[error("Cannot parse configuration: {0}")]
    Parse(String),

    /// File could not be read or written
    #[error("Configuration file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for viewer operations
pub type ViewerResult<T> = Result<T, ViewerError>;

/// Result type alias for export operations
pub type ExportResult<T> = Result<T, ExportError>;

/// Validation utilities
pub mod validation {
    use super::*;
    use crate::config::MAX_DECIMALS;

    /// Validate a decimal-place count
    pub fn validate_decimals(decimals: u8) -> Result<(), ConfigError> {
        if decimals > MAX_DECIMALS {
            return Err(ConfigError::OutOfRange(format!(
                "decimals must be between 0 and {}, got {}",
                MAX_DECIMALS, decimals
            )));
        }
        Ok(())
    }

    /// Validate the name for a dataset created from results
    pub fn validate_dataset_name(name: &str, existing: &[String]) -> ViewerResult<()> {
        if name.trim().is_empty() {
            return Err(ViewerError::EmptyDatasetName);
        }
        if existing.iter().any(|e| e == name) {
            return Err(ViewerError::DatasetNameTaken(name.to_string()));
        }
        Ok(())
    }

    /// Validate the name of a new custom column
    pub fn validate_column_name(name: &str, headings: &[String]) -> ViewerResult<()> {
        if name.trim().is_empty() || headings.iter().any(|h| h == name) {
            return Err(ViewerError::InvalidColumnName(name.to_string()));
        }
        Ok(())
    }
}
