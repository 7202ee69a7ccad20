//! Active plot layer tracking
//!
//! The host reports its display layers as a full list on every change.
//! [`ActiveLayers`] keeps the previous snapshot and turns a new list into
//! the tree edits it implies.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// What a layer draws
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerTarget {
    Dataset { dataset: String },
    Subset { subset: String, dataset: String },
}

impl LayerTarget {
    pub fn dataset(dataset: &str) -> Self {
        Self::Dataset {
            dataset: dataset.to_string(),
        }
    }

    pub fn subset(subset: &str, dataset: &str) -> Self {
        Self::Subset {
            subset: subset.to_string(),
            dataset: dataset.to_string(),
        }
    }

    /// Dataset the layer belongs to
    pub fn dataset_label(&self) -> &str {
        match self {
            Self::Dataset { dataset } | Self::Subset { dataset, .. } => dataset,
        }
    }
}

/// One entry of the host's layer list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotLayer {
    pub target: LayerTarget,
    pub visible: bool,
    pub zorder: i32,
}

impl PlotLayer {
    pub fn new(target: LayerTarget, visible: bool, zorder: i32) -> Self {
        Self {
            target,
            visible,
            zorder,
        }
    }
}

/// Net change between two layer lists
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerDiff {
    /// Became invisible; drop from the trees
    pub hidden: Vec<LayerTarget>,
    /// Became visible or newly tracked; put back into the trees
    pub shown: Vec<LayerTarget>,
    /// No longer reported by the host. A removed layer that was hidden
    /// is listed in `shown` as well, since nothing hides it any more.
    pub removed: Vec<LayerTarget>,
    /// Z-order changed
    pub reordered: Vec<LayerTarget>,
}

impl LayerDiff {
    pub fn is_empty(&self) -> bool {
        self.hidden.is_empty()
            && self.shown.is_empty()
            && self.removed.is_empty()
            && self.reordered.is_empty()
    }
}

/// Last layer snapshot plus the layers currently hidden from the trees
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActiveLayers {
    snapshot: Vec<PlotLayer>,
    hidden: BTreeSet<LayerTarget>,
}

impl ActiveLayers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Layers in z-order
    pub fn snapshot(&self) -> &[PlotLayer] {
        &self.snapshot
    }

    pub fn is_hidden(&self, target: &LayerTarget) -> bool {
        self.hidden.contains(target)
    }

    pub fn is_dataset_hidden(&self, dataset: &str) -> bool {
        self.is_hidden(&LayerTarget::dataset(dataset))
    }

    pub fn is_pair_hidden(&self, subset: &str, dataset: &str) -> bool {
        self.is_hidden(&LayerTarget::subset(subset, dataset))
    }

    /// Replace the snapshot and report what changed. Feeding the same
    /// list twice yields an empty diff the second time.
    pub fn diff(&mut self, layers: &[PlotLayer]) -> LayerDiff {
        let previous: BTreeMap<&LayerTarget, &PlotLayer> =
            self.snapshot.iter().map(|l| (&l.target, l)).collect();
        let mut diff = LayerDiff::default();

        for layer in layers {
            let before = previous.get(&layer.target);
            if layer.visible {
                if self.hidden.contains(&layer.target) || before.is_none() {
                    diff.shown.push(layer.target.clone());
                }
            } else if !self.hidden.contains(&layer.target) {
                diff.hidden.push(layer.target.clone());
            }
            if before.is_some_and(|b| b.zorder != layer.zorder) {
                diff.reordered.push(layer.target.clone());
            }
        }

        let current: BTreeSet<&LayerTarget> = layers.iter().map(|l| &l.target).collect();
        diff.removed = self
            .snapshot
            .iter()
            .filter(|l| !current.contains(&l.target))
            .map(|l| l.target.clone())
            .collect();
        for target in &diff.removed {
            if self.hidden.contains(target) {
                diff.shown.push(target.clone());
            }
        }

        for target in &diff.hidden {
            self.hidden.insert(target.clone());
        }
        for target in &diff.shown {
            self.hidden.remove(target);
        }

        let mut snapshot = layers.to_vec();
        snapshot.sort_by_key(|l| l.zorder);
        self.snapshot = snapshot;
        diff
    }

    pub fn rename_dataset(&mut self, old: &str, new: &str) {
        self.rewrite(|target| match target {
            LayerTarget::Dataset { dataset } | LayerTarget::Subset { dataset, .. }
                if *dataset == old =>
            {
                *dataset = new.to_string();
            }
            _ => {}
        });
    }

    pub fn rename_subset(&mut self, old: &str, new: &str) {
        self.rewrite(|target| {
            if let LayerTarget::Subset { subset, .. } = target {
                if *subset == old {
                    *subset = new.to_string();
                }
            }
        });
    }

    fn rewrite(&mut self, f: impl Fn(&mut LayerTarget)) {
        for layer in &mut self.snapshot {
            f(&mut layer.target);
        }
        self.hidden = std::mem::take(&mut self.hidden)
            .into_iter()
            .map(|mut t| {
                f(&mut t);
                t
            })
            .collect();
    }

    /// Forget layers of a dataset that no longer exists
    pub fn forget_dataset(&mut self, dataset: &str) {
        self.snapshot.retain(|l| l.target.dataset_label() != dataset);
        self.hidden.retain(|t| t.dataset_label() != dataset);
    }

    /// Forget layers of a subset that no longer exists
    pub fn forget_subset(&mut self, subset: &str) {
        let keep = |t: &LayerTarget| !matches!(t, LayerTarget::Subset { subset: s, .. } if s == subset);
        self.snapshot.retain(|l| keep(&l.target));
        self.hidden.retain(keep);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layers(d1_visible: bool, s1_visible: bool) -> Vec<PlotLayer> {
        vec![
            PlotLayer::new(LayerTarget::dataset("D1"), d1_visible, 1),
            PlotLayer::new(LayerTarget::subset("S1", "D1"), s1_visible, 2),
        ]
    }

    #[test]
    fn test_first_snapshot_shows_everything() {
        let mut active = ActiveLayers::new();
        let diff = active.diff(&layers(true, true));
        assert_eq!(diff.shown.len(), 2);
        assert!(diff.hidden.is_empty());
    }

    #[test]
    fn test_diff_is_idempotent() {
        let mut active = ActiveLayers::new();
        active.diff(&layers(true, true));
        let diff = active.diff(&layers(true, false));
        assert_eq!(diff.hidden, vec![LayerTarget::subset("S1", "D1")]);
        assert!(active.is_pair_hidden("S1", "D1"));
        assert!(active.diff(&layers(true, false)).is_empty());

        let diff = active.diff(&layers(true, true));
        assert_eq!(diff.shown, vec![LayerTarget::subset("S1", "D1")]);
        assert!(active.diff(&layers(true, true)).is_empty());
    }

    #[test]
    fn test_reorder_and_removal() {
        let mut active = ActiveLayers::new();
        active.diff(&layers(true, true));
        let mut next = layers(true, true);
        next[0].zorder = 5;
        next.pop();
        let diff = active.diff(&next);
        assert_eq!(diff.reordered, vec![LayerTarget::dataset("D1")]);
        assert_eq!(diff.removed, vec![LayerTarget::subset("S1", "D1")]);
    }

    #[test]
    fn test_dropping_hidden_layer_shows_it() {
        let mut active = ActiveLayers::new();
        active.diff(&layers(false, true));
        assert!(active.is_dataset_hidden("D1"));

        let diff = active.diff(&layers(true, true)[1..]);
        assert_eq!(diff.removed, vec![LayerTarget::dataset("D1")]);
        assert_eq!(diff.shown, vec![LayerTarget::dataset("D1")]);
        assert!(!active.is_dataset_hidden("D1"));
        assert!(active.diff(&layers(true, true)[1..]).is_empty());
    }

    #[test]
    fn test_rename_rewrites_hidden() {
        let mut active = ActiveLayers::new();
        active.diff(&layers(false, false));
        active.rename_dataset("D1", "D1b");
        active.rename_subset("S1", "S2");
        assert!(active.is_dataset_hidden("D1b"));
        assert!(active.is_pair_hidden("S2", "D1b"));
        assert_eq!(active.snapshot()[1].target, LayerTarget::subset("S2", "D1b"));
    }
}
