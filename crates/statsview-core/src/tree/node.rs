//! Tree nodes and identity keys

use serde::{Deserialize, Serialize};

use crate::calculability::Calculability;
use crate::identity::RowIdentity;

/// Handle to a node within one view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Which projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewKind {
    /// Data / Subsets headings, subsets nest datasets
    Subset,
    /// Datasets nest components, components nest subsets
    Component,
}

impl ViewKind {
    pub const BOTH: [ViewKind; 2] = [ViewKind::Subset, ViewKind::Component];

    /// The view that is not this one
    pub fn other(self) -> ViewKind {
        match self {
            ViewKind::Subset => ViewKind::Component,
            ViewKind::Component => ViewKind::Subset,
        }
    }
}

/// Role of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// "Data" heading of the subset view
    DataRoot,
    /// "Subsets" heading of the subset view
    SubsetRoot,
    Dataset,
    SubsetGroup,
    /// `<subset> (<dataset>)` in the subset view
    DatasetSubset,
    /// Component grouping in the component view
    ComponentGroup,
    /// A calculation row
    Row,
}

/// Identity labels attached to a node
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeKey {
    pub subset: Option<String>,
    pub dataset: Option<String>,
    pub component: Option<String>,
}

impl NodeKey {
    pub fn dataset(dataset: &str) -> Self {
        Self {
            dataset: Some(dataset.to_string()),
            ..Self::default()
        }
    }

    pub fn component(dataset: &str, component: &str) -> Self {
        Self {
            dataset: Some(dataset.to_string()),
            component: Some(component.to_string()),
            ..Self::default()
        }
    }

    pub fn group(subset: &str) -> Self {
        Self {
            subset: Some(subset.to_string()),
            ..Self::default()
        }
    }

    pub fn pair(subset: &str, dataset: &str) -> Self {
        Self {
            subset: Some(subset.to_string()),
            dataset: Some(dataset.to_string()),
            component: None,
        }
    }

    pub fn row(row: &RowIdentity) -> Self {
        Self {
            subset: row.subset.clone(),
            dataset: Some(row.dataset.clone()),
            component: Some(row.component.clone()),
        }
    }

    pub(crate) fn has_subset(&self, subset: &str) -> bool {
        self.subset.as_deref() == Some(subset)
    }

    pub(crate) fn has_dataset(&self, dataset: &str) -> bool {
        self.dataset.as_deref() == Some(dataset)
    }

    pub(crate) fn has_component(&self, component: &str) -> bool {
        self.component.as_deref() == Some(component)
    }
}

/// Check state of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CheckState {
    #[default]
    Unchecked,
    Checked,
}

/// A tree entity addressed by its labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Entity {
    Dataset(String),
    Component { dataset: String, component: String },
    SubsetGroup(String),
    DatasetSubset { subset: String, dataset: String },
}

/// A node of one view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub kind: NodeKind,
    pub key: NodeKey,
    pub label: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub check: CheckState,
    pub calculability: Calculability,
    pub expanded: bool,
    /// Identity marker, e.g. the subset colour
    pub marker: Option<String>,
    /// Statistic cells followed by custom column cells
    pub columns: Vec<Option<String>>,
}

impl TreeNode {
    /// Identity of a calculation row
    pub fn row_identity(&self) -> Option<RowIdentity> {
        if self.kind != NodeKind::Row {
            return None;
        }
        Some(RowIdentity {
            subset: self.key.subset.clone(),
            dataset: self.key.dataset.clone()?,
            component: self.key.component.clone()?,
        })
    }

    pub fn is_row(&self) -> bool {
        self.kind == NodeKind::Row
    }

    pub fn is_checked(&self) -> bool {
        self.check == CheckState::Checked
    }

    pub fn is_selectable(&self) -> bool {
        self.calculability.is_selectable()
    }

    /// Whether any statistic cell has a value
    pub fn has_values(&self) -> bool {
        self.columns.iter().any(Option::is_some)
    }
}
