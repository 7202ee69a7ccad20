//! Paired subset/component views

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::node::{CheckState, Entity, NodeId, NodeKey, NodeKind, TreeNode, ViewKind};
use super::view::TreeView;
use crate::calculability::Calculability;
use crate::error::{ViewerError, ViewerResult};
use crate::identity::RowIdentity;

/// Both projections of the collection. Every structural edit goes
/// through here so the two views always hold the same rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DualTree {
    subset_view: TreeView,
    component_view: TreeView,
}

impl DualTree {
    pub fn new(column_count: usize, subset_level: u8, component_level: u8) -> Self {
        Self {
            subset_view: TreeView::new(ViewKind::Subset, column_count, subset_level),
            component_view: TreeView::new(ViewKind::Component, column_count, component_level),
        }
    }

    pub fn view(&self, kind: ViewKind) -> &TreeView {
        match kind {
            ViewKind::Subset => &self.subset_view,
            ViewKind::Component => &self.component_view,
        }
    }

    pub(crate) fn view_mut(&mut self, kind: ViewKind) -> &mut TreeView {
        match kind {
            ViewKind::Subset => &mut self.subset_view,
            ViewKind::Component => &mut self.component_view,
        }
    }

    pub fn node(&self, view: ViewKind, id: NodeId) -> ViewerResult<&TreeNode> {
        self.view(view)
            .node(id)
            .ok_or(ViewerError::NodeNotFound { view })
    }

    pub(crate) fn node_mut(&mut self, view: ViewKind, id: NodeId) -> ViewerResult<&mut TreeNode> {
        self.view_mut(view)
            .node_mut(id)
            .ok_or(ViewerError::NodeNotFound { view })
    }

    // ---- lookups ----

    fn data_root(&self) -> Option<NodeId> {
        self.subset_view.roots().first().copied()
    }

    fn subset_root(&self) -> Option<NodeId> {
        self.subset_view.roots().get(1).copied()
    }

    fn sv_dataset(&self, dataset: &str) -> Option<NodeId> {
        let root = self.data_root()?;
        self.subset_view.child_where(Some(root), |n| {
            n.kind == NodeKind::Dataset && n.key.has_dataset(dataset)
        })
    }

    fn sv_group(&self, subset: &str) -> Option<NodeId> {
        let root = self.subset_root()?;
        self.subset_view.child_where(Some(root), |n| {
            n.kind == NodeKind::SubsetGroup && n.key.has_subset(subset)
        })
    }

    fn sv_pair(&self, subset: &str, dataset: &str) -> Option<NodeId> {
        let group = self.sv_group(subset)?;
        self.subset_view.child_where(Some(group), |n| {
            n.kind == NodeKind::DatasetSubset && n.key.has_dataset(dataset)
        })
    }

    fn cv_dataset(&self, dataset: &str) -> Option<NodeId> {
        self.component_view
            .child_where(None, |n| n.kind == NodeKind::Dataset && n.key.has_dataset(dataset))
    }

    fn cv_component(&self, dataset: &str, component: &str) -> Option<NodeId> {
        let d = self.cv_dataset(dataset)?;
        self.component_view.child_where(Some(d), |n| {
            n.kind == NodeKind::ComponentGroup && n.key.has_component(component)
        })
    }

    fn labels_of(&self, ids: &[NodeId], pick: impl Fn(&NodeKey) -> Option<&String>) -> Vec<String> {
        ids.iter()
            .filter_map(|&id| self.subset_view.node(id))
            .filter_map(|n| pick(&n.key).cloned())
            .collect()
    }

    /// Dataset labels in display order
    pub fn datasets(&self) -> Vec<String> {
        match self.data_root() {
            Some(root) => self.labels_of(self.subset_view.children(root), |k| k.dataset.as_ref()),
            None => Vec::new(),
        }
    }

    /// Subset group labels in display order
    pub fn subset_groups(&self) -> Vec<String> {
        match self.subset_root() {
            Some(root) => self.labels_of(self.subset_view.children(root), |k| k.subset.as_ref()),
            None => Vec::new(),
        }
    }

    /// Component labels the tree shows for a dataset
    pub fn components(&self, dataset: &str) -> Vec<String> {
        match self.sv_dataset(dataset) {
            Some(d) => self.labels_of(self.subset_view.children(d), |k| k.component.as_ref()),
            None => Vec::new(),
        }
    }

    /// Subsets that have a pair node for this dataset
    pub fn pair_subsets(&self, dataset: &str) -> Vec<String> {
        self.subset_groups()
            .into_iter()
            .filter(|s| self.sv_pair(s, dataset).is_some())
            .collect()
    }

    /// Every (subset, dataset) pair in display order
    pub fn pairs(&self) -> Vec<(String, String)> {
        self.subset_view
            .find_all(|n| n.kind == NodeKind::DatasetSubset)
            .into_iter()
            .filter_map(|id| self.subset_view.node(id))
            .filter_map(|n| Some((n.key.subset.clone()?, n.key.dataset.clone()?)))
            .collect()
    }

    /// Calculability recorded on a pair node
    pub fn pair_calculability(&self, subset: &str, dataset: &str) -> Option<Calculability> {
        let id = self.sv_pair(subset, dataset)?;
        self.subset_view.node(id).map(|n| n.calculability)
    }

    pub fn identity_chains(&self, view: ViewKind) -> BTreeSet<RowIdentity> {
        self.view(view).identity_chains()
    }

    /// Both views hold the same rows
    pub fn is_consistent(&self) -> bool {
        self.subset_view.identity_chains() == self.component_view.identity_chains()
    }

    // ---- insertion ----

    /// Add a dataset with its components and any subsets already defined.
    /// Returns false when the dataset is already present.
    pub fn insert_dataset(&mut self, dataset: &str, components: &[String], subsets: &[String]) -> bool {
        let Some(root) = self.data_root() else {
            return false;
        };
        if self.sv_dataset(dataset).is_some() {
            return false;
        }

        let d = self
            .subset_view
            .append(Some(root), NodeKind::Dataset, NodeKey::dataset(dataset));
        let cd = self
            .component_view
            .append(None, NodeKind::Dataset, NodeKey::dataset(dataset));
        for component in components {
            let row = NodeKey::row(&RowIdentity::dataset_level(dataset, component));
            self.subset_view.append(Some(d), NodeKind::Row, row.clone());
            let c = self.component_view.append(
                Some(cd),
                NodeKind::ComponentGroup,
                NodeKey::component(dataset, component),
            );
            self.component_view.append(Some(c), NodeKind::Row, row);
        }

        for subset in subsets {
            self.attach_pair(subset, dataset, components);
        }
        debug!("Tree: added dataset '{}'", dataset);
        true
    }

    /// Add a component to a dataset already in the tree
    pub fn insert_component(&mut self, dataset: &str, component: &str) -> ViewerResult<bool> {
        let missing = || ViewerError::missing(None, Some(dataset), Some(component));
        let d = self.sv_dataset(dataset).ok_or_else(missing)?;
        let cd = self.cv_dataset(dataset).ok_or_else(missing)?;
        if self.components(dataset).iter().any(|c| c == component) {
            return Ok(false);
        }

        let row = RowIdentity::dataset_level(dataset, component);
        self.subset_view
            .append(Some(d), NodeKind::Row, NodeKey::row(&row));
        let c = self.component_view.append(
            Some(cd),
            NodeKind::ComponentGroup,
            NodeKey::component(dataset, component),
        );
        self.component_view
            .append(Some(c), NodeKind::Row, NodeKey::row(&row));

        for subset in self.pair_subsets(dataset) {
            let Some(pair) = self.sv_pair(&subset, dataset) else {
                continue;
            };
            let inherited = self
                .subset_view
                .node(pair)
                .map(|n| n.calculability)
                .unwrap_or_default();
            let key = NodeKey::row(&RowIdentity::subset_level(&subset, dataset, component));
            let sv_row = self.subset_view.append(Some(pair), NodeKind::Row, key.clone());
            let cv_row = self.component_view.append(Some(c), NodeKind::Row, key);
            for (view, id) in [(ViewKind::Subset, sv_row), (ViewKind::Component, cv_row)] {
                if let Some(node) = self.view_mut(view).node_mut(id) {
                    node.calculability = inherited;
                }
            }
        }
        debug!("Tree: added component '{}' to '{}'", component, dataset);
        Ok(true)
    }

    /// Add a subset group and pair it with the given datasets
    /// (label plus components). Returns true when the group is new.
    pub fn insert_subset_group(&mut self, subset: &str, datasets: &[(String, Vec<String>)]) -> bool {
        let created = self.ensure_group(subset).1;
        for (dataset, components) in datasets {
            if self.sv_dataset(dataset).is_some() {
                self.attach_pair(subset, dataset, components);
            }
        }
        debug!("Tree: subset group '{}' (new: {})", subset, created);
        created
    }

    /// Pair a subset with one dataset, using the components the tree shows
    pub fn insert_pair(&mut self, subset: &str, dataset: &str) -> ViewerResult<bool> {
        if self.sv_dataset(dataset).is_none() {
            return Err(ViewerError::missing(Some(subset), Some(dataset), None));
        }
        let components = self.components(dataset);
        Ok(self.attach_pair(subset, dataset, &components))
    }

    fn ensure_group(&mut self, subset: &str) -> (Option<NodeId>, bool) {
        if let Some(group) = self.sv_group(subset) {
            return (Some(group), false);
        }
        let Some(root) = self.subset_root() else {
            return (None, false);
        };
        let group = self
            .subset_view
            .append(Some(root), NodeKind::SubsetGroup, NodeKey::group(subset));
        (Some(group), true)
    }

    fn attach_pair(&mut self, subset: &str, dataset: &str, components: &[String]) -> bool {
        let (Some(group), _) = self.ensure_group(subset) else {
            return false;
        };
        if self.sv_pair(subset, dataset).is_some() {
            return false;
        }
        let pair = self.subset_view.append(
            Some(group),
            NodeKind::DatasetSubset,
            NodeKey::pair(subset, dataset),
        );
        for component in components {
            let key = NodeKey::row(&RowIdentity::subset_level(subset, dataset, component));
            self.subset_view.append(Some(pair), NodeKind::Row, key.clone());
            if let Some(c) = self.cv_component(dataset, component) {
                self.component_view.append(Some(c), NodeKind::Row, key);
            }
        }
        true
    }

    // ---- removal ----

    /// Remove an entity from both views; returns the number of nodes removed
    pub fn remove_node_by_identity(&mut self, entity: &Entity) -> ViewerResult<usize> {
        let (sv, cv): (Vec<NodeId>, Vec<NodeId>) = match entity {
            Entity::Dataset(dataset) => {
                let mut sv: Vec<NodeId> = self.sv_dataset(dataset).into_iter().collect();
                sv.extend(
                    self.subset_view
                        .find_all(|n| n.kind == NodeKind::DatasetSubset && n.key.has_dataset(dataset)),
                );
                (sv, self.cv_dataset(dataset).into_iter().collect())
            }
            Entity::Component { dataset, component } => (
                self.subset_view.find_all(|n| {
                    n.is_row() && n.key.has_dataset(dataset) && n.key.has_component(component)
                }),
                self.cv_component(dataset, component).into_iter().collect(),
            ),
            Entity::SubsetGroup(subset) => (
                self.sv_group(subset).into_iter().collect(),
                self.component_view
                    .find_all(|n| n.is_row() && n.key.has_subset(subset)),
            ),
            Entity::DatasetSubset { subset, dataset } => (
                self.sv_pair(subset, dataset).into_iter().collect(),
                self.component_view.find_all(|n| {
                    n.is_row() && n.key.has_subset(subset) && n.key.has_dataset(dataset)
                }),
            ),
        };
        if sv.is_empty() && cv.is_empty() {
            return Err(entity_missing(entity));
        }

        let removed = sv.into_iter().map(|id| self.subset_view.remove(id)).sum::<usize>()
            + cv.into_iter().map(|id| self.component_view.remove(id)).sum::<usize>();
        debug!("Tree: removed {:?} ({} nodes)", entity, removed);
        Ok(removed)
    }

    // ---- rename ----

    /// Rename an entity in both views. Pair nodes are named after their
    /// subset and dataset and cannot be renamed directly.
    pub fn rename_node(&mut self, entity: &Entity, new_label: &str) -> ViewerResult<usize> {
        let present = match entity {
            Entity::Dataset(dataset) => self.sv_dataset(dataset).is_some(),
            Entity::Component { dataset, component } => {
                self.cv_component(dataset, component).is_some()
            }
            Entity::SubsetGroup(subset) => self.sv_group(subset).is_some(),
            Entity::DatasetSubset { .. } => {
                return Err(ViewerError::UnsupportedOperation(
                    "dataset-subset nodes are renamed through their subset or dataset".into(),
                ))
            }
        };
        if !present {
            return Err(entity_missing(entity));
        }

        let new = Some(new_label.to_string());
        let changed = match entity {
            Entity::Dataset(dataset) => self.rewrite_keys(&|key: &mut NodeKey| {
                if key.has_dataset(dataset) {
                    key.dataset = new.clone();
                    true
                } else {
                    false
                }
            }),
            Entity::Component { dataset, component } => self.rewrite_keys(&|key: &mut NodeKey| {
                if key.has_dataset(dataset) && key.has_component(component) {
                    key.component = new.clone();
                    true
                } else {
                    false
                }
            }),
            Entity::SubsetGroup(subset) => self.rewrite_keys(&|key: &mut NodeKey| {
                if key.has_subset(subset) {
                    key.subset = new.clone();
                    true
                } else {
                    false
                }
            }),
            Entity::DatasetSubset { .. } => 0,
        };
        debug!("Tree: renamed {:?} to '{}' ({} nodes)", entity, new_label, changed);
        Ok(changed)
    }

    fn rewrite_keys(&mut self, f: &impl Fn(&mut NodeKey) -> bool) -> usize {
        self.subset_view.rewrite_keys(f) + self.component_view.rewrite_keys(f)
    }

    // ---- row lookup ----

    /// Locate the row a set of display labels names
    pub fn find_node(
        &self,
        view: ViewKind,
        subset_name: &str,
        dataset_name: &str,
        component_name: &str,
    ) -> ViewerResult<NodeId> {
        let row = RowIdentity::from_display(subset_name, dataset_name, component_name);
        self.find_row(view, &row)
            .ok_or_else(|| ViewerError::identity_not_found(&row))
    }

    /// Locate a row by identity
    pub fn find_row(&self, view: ViewKind, row: &RowIdentity) -> Option<NodeId> {
        let matches = |n: &TreeNode| n.is_row() && n.row_identity().as_ref() == Some(row);
        match view {
            ViewKind::Subset => {
                let parent = match &row.subset {
                    None => self.sv_dataset(&row.dataset)?,
                    Some(subset) => self.sv_pair(subset, &row.dataset)?,
                };
                self.subset_view.child_where(Some(parent), matches)
            }
            ViewKind::Component => {
                let parent = self.cv_component(&row.dataset, &row.component)?;
                self.component_view.child_where(Some(parent), matches)
            }
        }
    }

    /// The same row in the other view
    pub fn counterpart(&self, view: ViewKind, id: NodeId) -> Option<NodeId> {
        let row = self.view(view).node(id)?.row_identity()?;
        self.find_row(view.other(), &row)
    }

    // ---- cells and state ----

    /// Fill a row's cells
    pub fn set_statistic_columns(
        &mut self,
        view: ViewKind,
        id: NodeId,
        cells: Vec<String>,
    ) -> ViewerResult<()> {
        let width = self.view(view).column_count();
        let node = self.node_mut(view, id)?;
        node.columns = cells.into_iter().map(Some).chain(std::iter::repeat(None)).take(width).collect();
        Ok(())
    }

    pub fn clear_statistic_columns(&mut self, view: ViewKind, id: NodeId) -> ViewerResult<()> {
        let node = self.node_mut(view, id)?;
        node.columns.iter_mut().for_each(|c| *c = None);
        Ok(())
    }

    /// Blank every row of a subset in both views
    pub fn clear_columns_for_subset(&mut self, subset: &str) -> usize {
        let mut cleared = 0;
        for kind in ViewKind::BOTH {
            let view = self.view_mut(kind);
            for id in view.find_all(|n| n.is_row() && n.key.has_subset(subset)) {
                if let Some(node) = view.node_mut(id) {
                    node.columns.iter_mut().for_each(|c| *c = None);
                    cleared += 1;
                }
            }
        }
        cleared
    }

    /// Record calculability for a pair in both views. A pair that cannot
    /// be calculated is unchecked, collapsed and blanked.
    pub fn set_pair_calculability(&mut self, subset: &str, dataset: &str, value: Calculability) {
        let sv: Vec<NodeId> = self
            .sv_pair(subset, dataset)
            .map(|p| self.subset_view.subtree(p))
            .unwrap_or_default();
        let cv = self.component_view.find_all(|n| {
            n.is_row() && n.key.has_subset(subset) && n.key.has_dataset(dataset)
        });
        for (kind, ids) in [(ViewKind::Subset, sv), (ViewKind::Component, cv)] {
            let view = self.view_mut(kind);
            for id in ids {
                if let Some(node) = view.node_mut(id) {
                    node.calculability = value;
                    if value == Calculability::NotCalculable {
                        node.check = CheckState::Unchecked;
                        node.expanded = false;
                        node.columns.iter_mut().for_each(|c| *c = None);
                    }
                }
            }
        }
    }

    /// Attach an identity marker (e.g. colour) to every node of a subset
    pub fn set_marker(&mut self, subset: &str, marker: Option<&str>) -> ViewerResult<usize> {
        let mut count = 0;
        for kind in ViewKind::BOTH {
            let view = self.view_mut(kind);
            for id in view.find_all(|n| n.key.has_subset(subset)) {
                if let Some(node) = view.node_mut(id) {
                    node.marker = marker.map(str::to_string);
                    count += 1;
                }
            }
        }
        if count == 0 {
            return Err(ViewerError::missing(Some(subset), None, None));
        }
        Ok(count)
    }

    /// Append an empty cell to every node of both views
    pub fn add_column(&mut self) {
        self.subset_view.add_column();
        self.component_view.add_column();
    }

    // ---- expansion ----

    pub fn apply_expansion(&mut self, view: ViewKind) {
        self.view_mut(view).apply_expansion();
    }

    pub fn set_expansion_level(&mut self, view: ViewKind, level: u8) -> u8 {
        let tree = self.view_mut(view);
        let level = tree.set_level(level);
        tree.apply_expansion();
        level
    }

    /// One level deeper, up to the view's maximum
    pub fn expand_level(&mut self, view: ViewKind) -> u8 {
        let level = self.view(view).level().saturating_add(1);
        self.set_expansion_level(view, level)
    }

    /// One level shallower
    pub fn collapse_level(&mut self, view: ViewKind) -> u8 {
        let level = self.view(view).level().saturating_sub(1);
        self.set_expansion_level(view, level)
    }
}

fn entity_missing(entity: &Entity) -> ViewerError {
    match entity {
        Entity::Dataset(d) => ViewerError::missing(None, Some(d), None),
        Entity::Component { dataset, component } => {
            ViewerError::missing(None, Some(dataset), Some(component))
        }
        Entity::SubsetGroup(s) => ViewerError::missing(Some(s), None, None),
        Entity::DatasetSubset { subset, dataset } => {
            ViewerError::missing(Some(subset), Some(dataset), None)
        }
    }
}
