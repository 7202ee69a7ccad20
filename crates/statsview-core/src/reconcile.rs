//! Event reconciliation
//!
//! Each [`HostEvent`] becomes the smallest set of tree edits and cache
//! updates that brings the viewer back in line with the collection. An
//! event that names something the viewer does not know is logged and
//! dropped; the next event is handled normally.

use tracing::{debug, warn};

use crate::collection::DataCollection;
use crate::error::{ViewerError, ViewerResult};
use crate::event::HostEvent;
use crate::layers::{LayerTarget, PlotLayer};
use crate::tree::{Entity, ViewKind};
use crate::viewer::{component_labels, StatsViewer};

impl StatsViewer {
    /// Apply one host event
    pub fn handle_event<C: DataCollection + ?Sized>(
        &mut self,
        collection: &C,
        event: &HostEvent,
    ) -> ViewerResult<()> {
        debug!("Handling {} event", event.kind());
        if self.pending.take().is_some() {
            debug!("Pending confirmation cancelled by {} event", event.kind());
        }
        let result = match event {
            HostEvent::DatasetAdded { dataset } => self.on_dataset_added(collection, dataset),
            HostEvent::DatasetRemoved { dataset } => self.on_dataset_removed(dataset),
            HostEvent::DatasetRenamed {
                old_label,
                new_label,
            } => self.on_dataset_renamed(old_label, new_label),
            HostEvent::ComponentAdded { dataset, component } => {
                self.on_component_added(collection, dataset, component)
            }
            HostEvent::ComponentRenamed {
                dataset,
                old_label,
                new_label,
            } => self.on_component_renamed(collection, dataset, old_label, new_label),
            HostEvent::ComponentRemoved { dataset, component } => {
                self.on_component_removed(collection, dataset, component)
            }
            HostEvent::SubsetCreated { subset } => self.on_subset_created(collection, subset),
            HostEvent::SubsetUpdated {
                subset,
                new_label,
                color,
            } => self.on_subset_updated(subset, new_label.as_deref(), color.as_deref()),
            HostEvent::SubsetDeleted { subset } => self.on_subset_deleted(subset),
            HostEvent::SubsetEdited { subset } => self.on_subset_edited(collection, subset),
            HostEvent::LayersChanged { layers } => self.on_layers_changed(collection, layers),
            HostEvent::LinksChanged => {
                let changed = self.reprobe_all(collection);
                debug!("Links changed: {} pairs re-classified", changed);
                self.apply_default_expansion();
                Ok(())
            }
        };
        if let Err(e) = &result {
            warn!("Dropped {} event: {}", event.kind(), e);
        }
        result
    }

    fn apply_default_expansion(&mut self) {
        for view in ViewKind::BOTH {
            self.trees.apply_expansion(view);
        }
    }

    fn on_dataset_added<C: DataCollection + ?Sized>(&mut self, collection: &C, dataset: &str) -> ViewerResult<()> {
        let index = collection
            .dataset_index(dataset)
            .ok_or_else(|| ViewerError::missing(None, Some(dataset), None))?;
        if self.layers.is_dataset_hidden(dataset) || self.trees.datasets().iter().any(|d| d == dataset) {
            debug!("Dataset '{}' already known", dataset);
            return Ok(());
        }
        self.dataset_count += 1;
        self.insert_dataset(collection, index, dataset);
        self.check_large_dataset(collection, index);
        Ok(())
    }

    /// Put a dataset (back) into the trees with its visible subset pairs
    fn insert_dataset<C: DataCollection + ?Sized>(&mut self, collection: &C, index: usize, dataset: &str) {
        let components = component_labels(collection, index);
        let subsets: Vec<String> = collection
            .subset_groups()
            .into_iter()
            .filter(|s| !self.layers.is_pair_hidden(s, dataset))
            .collect();
        if !self.trees.insert_dataset(dataset, &components, &subsets) {
            debug!("Dataset '{}' already in the tree", dataset);
        }
        for subset in &subsets {
            self.reprobe_pair(collection, subset, dataset);
        }
        self.apply_default_expansion();
        for view in ViewKind::BOTH {
            self.repopulate(view);
        }
    }

    fn on_dataset_removed(&mut self, dataset: &str) -> ViewerResult<()> {
        let hidden = self.layers.is_dataset_hidden(dataset);
        match self
            .trees
            .remove_node_by_identity(&Entity::Dataset(dataset.to_string()))
        {
            Ok(_) => {}
            Err(_) if hidden => {}
            Err(e) => return Err(e),
        }
        let evicted = self.cache.evict_dataset(dataset);
        self.calculated.retain(|row| row.dataset != dataset);
        self.layers.forget_dataset(dataset);
        self.dataset_count = self.dataset_count.saturating_sub(1);
        debug!("Removed dataset '{}', evicted {} cache entries", dataset, evicted);
        Ok(())
    }

    fn on_dataset_renamed(&mut self, old: &str, new: &str) -> ViewerResult<()> {
        let hidden = self.layers.is_dataset_hidden(old);
        match self
            .trees
            .rename_node(&Entity::Dataset(old.to_string()), new)
        {
            Ok(_) => {}
            Err(_) if hidden => {}
            Err(e) => return Err(e),
        }
        self.cache.rename_dataset(old, new);
        self.calculated.rewrite(|row| {
            if row.dataset == old {
                row.dataset = new.to_string();
            }
        });
        self.layers.rename_dataset(old, new);
        Ok(())
    }

    fn on_component_added<C: DataCollection + ?Sized>(
        &mut self,
        collection: &C,
        dataset: &str,
        component: &str,
    ) -> ViewerResult<()> {
        if self.layers.is_dataset_hidden(dataset) {
            debug!("Component '{}' added to hidden dataset '{}'", component, dataset);
            return Ok(());
        }
        if !self.trees.insert_component(dataset, component)? {
            debug!("Component '{}' already under '{}'", component, dataset);
            return Ok(());
        }
        self.reprobe_dataset(collection, dataset);
        self.apply_default_expansion();
        Ok(())
    }

    /// Pairs are probed through the first numeric component, so any
    /// component change can flip them
    fn reprobe_dataset<C: DataCollection + ?Sized>(&mut self, collection: &C, dataset: &str) {
        for subset in self.trees.pair_subsets(dataset) {
            self.reprobe_pair(collection, &subset, dataset);
        }
    }

    fn on_component_renamed<C: DataCollection + ?Sized>(
        &mut self,
        collection: &C,
        dataset: &str,
        old: &str,
        new: &str,
    ) -> ViewerResult<()> {
        let hidden = self.layers.is_dataset_hidden(dataset);
        match self.trees.rename_node(
            &Entity::Component {
                dataset: dataset.to_string(),
                component: old.to_string(),
            },
            new,
        ) {
            Ok(_) => {}
            Err(_) if hidden => {}
            Err(e) => return Err(e),
        }
        self.cache.rename_component(dataset, old, new);
        self.calculated.rewrite(|row| {
            if row.dataset == dataset && row.component == old {
                row.component = new.to_string();
            }
        });
        self.reprobe_dataset(collection, dataset);
        Ok(())
    }

    fn on_component_removed<C: DataCollection + ?Sized>(
        &mut self,
        collection: &C,
        dataset: &str,
        component: &str,
    ) -> ViewerResult<()> {
        let hidden = self.layers.is_dataset_hidden(dataset);
        match self.trees.remove_node_by_identity(&Entity::Component {
            dataset: dataset.to_string(),
            component: component.to_string(),
        }) {
            Ok(_) => {}
            Err(_) if hidden => {}
            Err(e) => return Err(e),
        }
        self.cache.evict_component(dataset, component);
        self.calculated
            .retain(|row| !(row.dataset == dataset && row.component == component));
        self.reprobe_dataset(collection, dataset);
        Ok(())
    }

    fn on_subset_created<C: DataCollection + ?Sized>(&mut self, collection: &C, subset: &str) -> ViewerResult<()> {
        if collection.subset_index(subset).is_none() {
            return Err(ViewerError::missing(Some(subset), None, None));
        }
        let datasets: Vec<(String, Vec<String>)> = self
            .trees
            .datasets()
            .into_iter()
            .filter(|d| !self.layers.is_pair_hidden(subset, d))
            .map(|d| {
                let components = self.trees.components(&d);
                (d, components)
            })
            .collect();
        if !self.trees.insert_subset_group(subset, &datasets) {
            debug!("Subset group '{}' already in the tree", subset);
        }
        for (dataset, _) in &datasets {
            self.reprobe_pair(collection, subset, dataset);
        }
        self.apply_default_expansion();
        Ok(())
    }

    fn on_subset_updated(&mut self, subset: &str, new_label: Option<&str>, color: Option<&str>) -> ViewerResult<()> {
        let mut current = subset;
        if let Some(new) = new_label.filter(|&n| n != subset) {
            self.trees
                .rename_node(&Entity::SubsetGroup(subset.to_string()), new)?;
            self.cache.rename_subset(subset, new);
            self.calculated.rewrite(|row| {
                if row.subset.as_deref() == Some(subset) {
                    row.subset = Some(new.to_string());
                }
            });
            self.layers.rename_subset(subset, new);
            current = new;
        }
        if color.is_some() {
            self.trees.set_marker(current, color)?;
        }
        Ok(())
    }

    fn on_subset_deleted(&mut self, subset: &str) -> ViewerResult<()> {
        self.trees
            .remove_node_by_identity(&Entity::SubsetGroup(subset.to_string()))?;
        self.cache.invalidate_subset(subset);
        self.calculated
            .retain(|row| row.subset.as_deref() != Some(subset));
        self.layers.forget_subset(subset);
        Ok(())
    }

    /// Predicate edit: drop cached values of the subset, blank its cells,
    /// then recompute the checked rows of the active view. Gray state is
    /// left as it was; `LinksChanged` or a reset re-probes.
    fn on_subset_edited<C: DataCollection + ?Sized>(&mut self, collection: &C, subset: &str) -> ViewerResult<()> {
        if !self.trees.subset_groups().iter().any(|s| s == subset) {
            return Err(ViewerError::missing(Some(subset), None, None));
        }
        let invalidated = self.cache.invalidate_subset(subset);
        self.trees.clear_columns_for_subset(subset);
        self.calculated
            .retain(|row| row.subset.as_deref() != Some(subset));
        debug!("Subset '{}' edited, {} cache entries dropped", subset, invalidated);
        self.calculate_checked(collection);
        Ok(())
    }

    fn on_layers_changed<C: DataCollection + ?Sized>(
        &mut self,
        collection: &C,
        layers: &[PlotLayer],
    ) -> ViewerResult<()> {
        let diff = self.layers.diff(layers);
        if diff.is_empty() {
            return Ok(());
        }

        for target in &diff.hidden {
            let entity = match target {
                LayerTarget::Dataset { dataset } => Entity::Dataset(dataset.clone()),
                LayerTarget::Subset { subset, dataset } => Entity::DatasetSubset {
                    subset: subset.clone(),
                    dataset: dataset.clone(),
                },
            };
            if let Err(e) = self.trees.remove_node_by_identity(&entity) {
                debug!("Hidden layer not in tree: {}", e);
            }
        }

        for target in &diff.shown {
            match target {
                LayerTarget::Dataset { dataset } => {
                    if self.trees.datasets().contains(dataset) {
                        continue;
                    }
                    match collection.dataset_index(dataset) {
                        Some(index) => self.insert_dataset(collection, index, dataset),
                        None => debug!("Shown layer '{}' not in collection", dataset),
                    }
                }
                LayerTarget::Subset { subset, dataset } => {
                    if collection.subset_index(subset).is_none() {
                        continue;
                    }
                    if let Ok(true) = self.trees.insert_pair(subset, dataset) {
                        self.reprobe_pair(collection, subset, dataset);
                    }
                }
            }
        }

        for target in &diff.reordered {
            debug!("Layer {:?} changed z-order", target);
        }

        self.apply_default_expansion();
        for view in ViewKind::BOTH {
            self.repopulate(view);
        }
        Ok(())
    }
}
