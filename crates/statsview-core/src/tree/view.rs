//! One tree projection stored as an arena

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::node::{CheckState, NodeId, NodeKey, NodeKind, TreeNode, ViewKind};
use crate::calculability::Calculability;
use crate::config::{COMPONENT_VIEW_MAX_LEVEL, SUBSET_VIEW_MAX_LEVEL};
use crate::identity::{wrap_dataset_label, RowIdentity, ALL_DATA};

/// Heading of the dataset branch in the subset view
pub const DATA_HEADING: &str = "Data";
/// Heading of the subset branch in the subset view
pub const SUBSETS_HEADING: &str = "Subsets";

/// Nodes of one view. Removed nodes leave an empty slot that the next
/// `append` reuses, so a handle is only valid until its node is removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeView {
    kind: ViewKind,
    nodes: Vec<Option<TreeNode>>,
    #[serde(default)]
    free: Vec<NodeId>,
    roots: Vec<NodeId>,
    level: u8,
    column_count: usize,
}

impl TreeView {
    pub fn new(kind: ViewKind, column_count: usize, level: u8) -> Self {
        let mut view = Self {
            kind,
            nodes: Vec::new(),
            free: Vec::new(),
            roots: Vec::new(),
            level: level.min(max_level(kind)),
            column_count,
        };
        if kind == ViewKind::Subset {
            view.append(None, NodeKind::DataRoot, NodeKey::default());
            view.append(None, NodeKind::SubsetRoot, NodeKey::default());
        }
        view
    }

    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn max_level(&self) -> u8 {
        max_level(self.kind)
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut TreeNode> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Arena slots in use or waiting for reuse
    pub fn slot_count(&self) -> usize {
        self.nodes.len()
    }

    /// Pre-order traversal of the whole view
    pub fn walk(&self) -> Vec<NodeId> {
        self.walk_with_depth().into_iter().map(|(id, _)| id).collect()
    }

    /// Pre-order traversal with depth (roots at depth 0)
    pub fn walk_with_depth(&self) -> Vec<(NodeId, usize)> {
        let mut out = Vec::new();
        let mut stack: Vec<(NodeId, usize)> = self.roots.iter().rev().map(|&r| (r, 0)).collect();
        while let Some((id, depth)) = stack.pop() {
            out.push((id, depth));
            for &child in self.children(id).iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        out
    }

    /// The node and everything below it, pre-order
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if self.node(id).is_none() {
            return out;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            for &child in self.children(current).iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.node(id).and_then(|n| n.parent);
        while let Some(parent) = current {
            depth += 1;
            current = self.node(parent).and_then(|n| n.parent);
        }
        depth
    }

    /// Nodes matching a predicate, in display order
    pub fn find_all(&self, pred: impl Fn(&TreeNode) -> bool) -> Vec<NodeId> {
        self.walk()
            .into_iter()
            .filter(|&id| self.node(id).is_some_and(&pred))
            .collect()
    }

    /// First child of `parent` (or first root) matching a predicate
    pub fn child_where(
        &self,
        parent: Option<NodeId>,
        pred: impl Fn(&TreeNode) -> bool,
    ) -> Option<NodeId> {
        let candidates = match parent {
            Some(p) => self.children(p),
            None => &self.roots,
        };
        candidates
            .iter()
            .copied()
            .find(|&id| self.node(id).is_some_and(&pred))
    }

    /// All calculation rows, in display order
    pub fn rows(&self) -> Vec<NodeId> {
        self.find_all(TreeNode::is_row)
    }

    /// Calculation rows at or below a node
    pub fn rows_under(&self, id: NodeId) -> Vec<NodeId> {
        self.subtree(id)
            .into_iter()
            .filter(|&n| self.node(n).is_some_and(TreeNode::is_row))
            .collect()
    }

    /// Checked, selectable rows in display order
    pub fn checked_rows(&self) -> Vec<NodeId> {
        self.find_all(|n| n.is_row() && n.is_checked() && n.is_selectable())
    }

    /// Identities of every row; equal across views when they agree
    pub fn identity_chains(&self) -> BTreeSet<RowIdentity> {
        self.nodes
            .iter()
            .flatten()
            .filter_map(TreeNode::row_identity)
            .collect()
    }

    /// Add a node under `parent`, or as a root
    pub fn append(&mut self, parent: Option<NodeId>, kind: NodeKind, key: NodeKey) -> NodeId {
        let calculability = match kind {
            NodeKind::DatasetSubset | NodeKind::Row if key.subset.is_some() => {
                Calculability::NotProbed
            }
            _ => Calculability::Calculable,
        };
        let node = TreeNode {
            label: label_for(self.kind, kind, &key),
            kind,
            key,
            parent,
            children: Vec::new(),
            check: CheckState::Unchecked,
            calculability,
            expanded: false,
            marker: None,
            columns: vec![None; self.column_count],
        };
        let id = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot.0] = Some(node);
                slot
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        };
        match parent.and_then(|p| self.node_mut(p)) {
            Some(p) => p.children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Detach a node and drop its subtree; returns the number of nodes removed
    pub fn remove(&mut self, id: NodeId) -> usize {
        let Some(parent) = self.node(id).map(|n| n.parent) else {
            return 0;
        };
        match parent.and_then(|p| self.node_mut(p)) {
            Some(p) => p.children.retain(|&c| c != id),
            None => self.roots.retain(|&r| r != id),
        }
        let doomed = self.subtree(id);
        for &n in &doomed {
            self.nodes[n.0] = None;
        }
        self.free.extend(doomed.iter().rev().copied());
        doomed.len()
    }

    /// Rewrite identity labels; changed nodes get a fresh label
    pub(crate) fn rewrite_keys(&mut self, f: &impl Fn(&mut NodeKey) -> bool) -> usize {
        let kind = self.kind;
        let mut changed = 0;
        for node in self.nodes.iter_mut().flatten() {
            if f(&mut node.key) {
                node.label = label_for(kind, node.kind, &node.key);
                changed += 1;
            }
        }
        changed
    }

    /// Append an empty cell to every node
    pub(crate) fn add_column(&mut self) {
        self.column_count += 1;
        for node in self.nodes.iter_mut().flatten() {
            node.columns.push(None);
        }
    }

    pub(crate) fn set_level(&mut self, level: u8) -> u8 {
        self.level = level.min(self.max_level());
        self.level
    }

    /// A node the user cannot open: not calculable itself, or a group
    /// whose every child is
    pub fn is_grayed(&self, id: NodeId) -> bool {
        let Some(node) = self.node(id) else {
            return false;
        };
        if node.calculability == Calculability::NotCalculable {
            return true;
        }
        node.kind == NodeKind::SubsetGroup
            && !node.children.is_empty()
            && node.children.iter().all(|&c| {
                self.node(c)
                    .is_some_and(|n| n.calculability == Calculability::NotCalculable)
            })
    }

    /// Open every node shallower than the current level, except grayed ones
    pub fn apply_expansion(&mut self) {
        let level = usize::from(self.level);
        for (id, depth) in self.walk_with_depth() {
            let expanded = depth < level && !self.is_grayed(id);
            if let Some(node) = self.node_mut(id) {
                node.expanded = expanded;
            }
        }
    }

    /// Set the check state of a node and its descendants, skipping
    /// subtrees that cannot be selected. Checking opens the groups it
    /// passes, unchecking closes them. Returns the rows touched.
    pub(crate) fn set_check_subtree(&mut self, id: NodeId, check: CheckState) -> Vec<NodeId> {
        let mut rows = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.node_mut(current) else {
                continue;
            };
            if !node.is_selectable() {
                continue;
            }
            node.check = check;
            if node.is_row() {
                rows.push(current);
            } else {
                node.expanded = check == CheckState::Checked;
            }
            stack.extend(node.children.iter().rev().copied());
        }
        rows
    }
}

/// Deepest expansion level for a view
pub fn max_level(kind: ViewKind) -> u8 {
    match kind {
        ViewKind::Subset => SUBSET_VIEW_MAX_LEVEL,
        ViewKind::Component => COMPONENT_VIEW_MAX_LEVEL,
    }
}

/// Display label for a node
pub fn label_for(view: ViewKind, kind: NodeKind, key: &NodeKey) -> String {
    let subset = key.subset.as_deref().unwrap_or_default();
    let dataset = key.dataset.as_deref().unwrap_or_default();
    let component = key.component.as_deref().unwrap_or_default();
    match kind {
        NodeKind::DataRoot => DATA_HEADING.to_string(),
        NodeKind::SubsetRoot => SUBSETS_HEADING.to_string(),
        NodeKind::Dataset => dataset.to_string(),
        NodeKind::SubsetGroup => subset.to_string(),
        NodeKind::DatasetSubset => wrap_dataset_label(subset, dataset),
        NodeKind::ComponentGroup => component.to_string(),
        NodeKind::Row => match view {
            ViewKind::Subset => component.to_string(),
            ViewKind::Component if key.subset.is_none() => {
                wrap_dataset_label(ALL_DATA, dataset)
            }
            ViewKind::Component => subset.to_string(),
        },
    }
}
