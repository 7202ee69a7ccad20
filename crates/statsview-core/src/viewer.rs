//! The statistics viewer state

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::{StatTuple, StatisticCache};
use crate::calculability::{probe_pair, Calculability};
use crate::collection::DataCollection;
use crate::columns::{custom_values, CustomColumn};
use crate::config::{CalcMode, UserPreferences, ViewerConfig};
use crate::error::ViewerResult;
use crate::format::{render_tuple, NumberFormat};
use crate::identity::RowIdentity;
use crate::layers::ActiveLayers;
use crate::orchestrator::PendingMark;
use crate::tree::{DualTree, NodeId, ViewKind};
use statsview_stats::StatKind;

/// Something the host should tell the user about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notice {
    /// A dataset is large enough that calculation switched to manual
    LargeDataset { dataset: String, size: usize },
    /// Some rows of a batch had no data to calculate
    NoDataToCalculate { failed: usize },
}

/// Identities of calculated rows, per view, in calculation order
#[derive(Debug, Clone, Default)]
pub struct CalculatedRows {
    subset: Vec<RowIdentity>,
    component: Vec<RowIdentity>,
}

impl CalculatedRows {
    pub fn rows(&self, view: ViewKind) -> &[RowIdentity] {
        match view {
            ViewKind::Subset => &self.subset,
            ViewKind::Component => &self.component,
        }
    }

    pub fn contains(&self, view: ViewKind, row: &RowIdentity) -> bool {
        self.rows(view).contains(row)
    }

    pub(crate) fn record(&mut self, view: ViewKind, row: &RowIdentity) {
        let rows = match view {
            ViewKind::Subset => &mut self.subset,
            ViewKind::Component => &mut self.component,
        };
        if !rows.contains(row) {
            rows.push(row.clone());
        }
    }

    pub(crate) fn retain(&mut self, keep: impl Fn(&RowIdentity) -> bool) {
        self.subset.retain(&keep);
        self.component.retain(&keep);
    }

    pub(crate) fn rewrite(&mut self, f: impl Fn(&mut RowIdentity)) {
        self.subset.iter_mut().for_each(&f);
        self.component.iter_mut().for_each(&f);
    }
}

/// Statistics side panel over a host data collection.
///
/// The viewer borrows the collection for every call that needs it and
/// never holds on to it.
#[derive(Debug)]
pub struct StatsViewer {
    pub(crate) config: ViewerConfig,
    pub(crate) trees: DualTree,
    pub(crate) cache: StatisticCache,
    pub(crate) layers: ActiveLayers,
    pub(crate) active_view: ViewKind,
    pub(crate) calculated: CalculatedRows,
    pub(crate) custom_columns: Vec<CustomColumn>,
    pub(crate) notices: Vec<Notice>,
    pub(crate) pending: Option<PendingMark>,
    pub(crate) confirmed: bool,
    pub(crate) instructions_pending: bool,
    pub(crate) dataset_count: usize,
}

impl StatsViewer {
    /// Build both trees from the collection
    pub fn new<C: DataCollection + ?Sized>(collection: &C, config: ViewerConfig) -> ViewerResult<Self> {
        config.validate()?;
        let trees = new_trees(&config, 0);
        let mut viewer = Self {
            instructions_pending: config.preferences.show_instructions,
            config,
            trees,
            cache: StatisticCache::new(),
            layers: ActiveLayers::new(),
            active_view: ViewKind::Subset,
            calculated: CalculatedRows::default(),
            custom_columns: Vec::new(),
            notices: Vec::new(),
            pending: None,
            confirmed: false,
            dataset_count: 0,
        };
        viewer.rebuild(collection);
        for dataset in 0..collection.len() {
            viewer.check_large_dataset(collection, dataset);
        }
        info!(
            "Stats viewer ready: {} datasets, {} subset groups",
            viewer.dataset_count,
            viewer.trees.subset_groups().len()
        );
        Ok(viewer)
    }

    /// Rebuild both trees from the live collection and restore the
    /// calculated rows from the cache
    pub fn reset<C: DataCollection + ?Sized>(&mut self, collection: &C) {
        self.pending = None;
        self.rebuild(collection);
        for view in ViewKind::BOTH {
            self.repopulate(view);
        }
        info!("Stats viewer reset");
    }

    pub(crate) fn rebuild<C: DataCollection + ?Sized>(&mut self, collection: &C) {
        let mut trees = new_trees(&self.config, self.custom_columns.len());
        let mut datasets = Vec::new();
        for index in 0..collection.len() {
            let Some(label) = collection.dataset_label(index) else {
                continue;
            };
            if self.layers.is_dataset_hidden(&label) {
                debug!("Skipping hidden dataset '{}'", label);
                continue;
            }
            let components = component_labels(collection, index);
            trees.insert_dataset(&label, &components, &[]);
            datasets.push((label, components));
        }
        for subset in collection.subset_groups() {
            let visible: Vec<(String, Vec<String>)> = datasets
                .iter()
                .filter(|(dataset, _)| !self.layers.is_pair_hidden(&subset, dataset))
                .cloned()
                .collect();
            trees.insert_subset_group(&subset, &visible);
        }

        self.trees = trees;
        self.dataset_count = collection.len();
        self.reprobe_all(collection);
        for view in ViewKind::BOTH {
            self.trees.apply_expansion(view);
        }
    }

    /// Probe every (subset, dataset) pair again; returns how many changed
    pub(crate) fn reprobe_all<C: DataCollection + ?Sized>(&mut self, collection: &C) -> usize {
        let mut changed = 0;
        for (subset, dataset) in self.trees.pairs() {
            if self.reprobe_pair(collection, &subset, &dataset) {
                changed += 1;
            }
        }
        changed
    }

    /// Probe one pair and record the result in both views
    pub(crate) fn reprobe_pair<C: DataCollection + ?Sized>(
        &mut self,
        collection: &C,
        subset: &str,
        dataset: &str,
    ) -> bool {
        let value = match (collection.dataset_index(dataset), collection.subset_index(subset)) {
            (Some(d), Some(s)) => probe_pair(collection, d, s),
            _ => {
                warn!("Cannot probe '{}' on '{}': not in collection", subset, dataset);
                Calculability::NotCalculable
            }
        };
        let before = self.trees.pair_calculability(subset, dataset);
        self.trees.set_pair_calculability(subset, dataset, value);
        if value == Calculability::NotCalculable && before != Some(value) {
            let evicted = self.cache.evict_pair(subset, dataset);
            self.calculated
                .retain(|row| !(row.subset.as_deref() == Some(subset) && row.dataset == dataset));
            debug!("'{}' on '{}' no longer calculable, evicted {} entries", subset, dataset, evicted);
        }
        before != Some(value)
    }

    pub(crate) fn check_large_dataset<C: DataCollection + ?Sized>(&mut self, collection: &C, dataset: usize) {
        let size = collection.dataset_size(dataset);
        if size <= self.config.calculation.large_dataset_threshold {
            return;
        }
        let label = collection.dataset_label(dataset).unwrap_or_default();
        info!(
            "Dataset '{}' has {} points, switching to manual calculation",
            label, size
        );
        self.config.calculation.mode = CalcMode::Manual;
        self.notices.push(Notice::LargeDataset {
            dataset: label,
            size,
        });
    }

    /// Re-render calculated rows of a view from the cache. Rows whose
    /// node is currently absent (e.g. hidden layer) are kept for later.
    pub(crate) fn repopulate(&mut self, view: ViewKind) -> usize {
        let mut filled = 0;
        for row in self.calculated.rows(view).to_vec() {
            let Some(id) = self.trees.find_row(view, &row) else {
                continue;
            };
            match self.cache.get(&row).cloned() {
                Some(tuple) => {
                    if self.render_row(view, id, &tuple).is_ok() {
                        filled += 1;
                    }
                }
                None => {
                    if let Err(e) = self.trees.clear_statistic_columns(view, id) {
                        warn!("Cannot blank row {}: {}", row, e);
                    }
                }
            }
        }
        filled
    }

    /// Write a tuple's formatted cells to a node; true when any cell is an error
    pub(crate) fn render_row(&mut self, view: ViewKind, id: NodeId, tuple: &StatTuple) -> ViewerResult<bool> {
        let custom = custom_values(&self.custom_columns, tuple);
        let rendered = render_tuple(tuple, &custom, self.number_format());
        self.trees.set_statistic_columns(view, id, rendered.cells)?;
        Ok(rendered.has_error)
    }

    pub fn number_format(&self) -> NumberFormat {
        NumberFormat::new(self.config.display.notation, self.config.display.decimals)
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn trees(&self) -> &DualTree {
        &self.trees
    }

    pub fn cache(&self) -> &StatisticCache {
        &self.cache
    }

    pub fn layers(&self) -> &ActiveLayers {
        &self.layers
    }

    pub fn active_view(&self) -> ViewKind {
        self.active_view
    }

    pub fn calculated_rows(&self) -> &CalculatedRows {
        &self.calculated
    }

    pub fn custom_columns(&self) -> &[CustomColumn] {
        &self.custom_columns
    }

    /// Datasets the viewer believes the collection holds
    pub fn dataset_count(&self) -> usize {
        self.dataset_count
    }

    /// Headings of the value cells: the statistics, then custom columns
    pub fn headings(&self) -> Vec<String> {
        StatKind::ALL
            .iter()
            .map(|k| k.heading().to_string())
            .chain(self.custom_columns.iter().map(|c| c.name.clone()))
            .collect()
    }

    /// Take the queued notices
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Whether the instructions should be shown
    pub fn instructions_pending(&self) -> bool {
        self.instructions_pending
    }

    /// Hide the instructions; returns the preferences for the host to persist
    pub fn dismiss_instructions(&mut self, never_again: bool) -> UserPreferences {
        self.instructions_pending = false;
        if never_again {
            self.config.preferences.show_instructions = false;
        }
        self.config.preferences
    }
}

fn new_trees(config: &ViewerConfig, custom_columns: usize) -> DualTree {
    let mut trees = DualTree::new(
        StatKind::ALL.len(),
        config.expansion.subset_view_level,
        config.expansion.component_view_level,
    );
    for _ in 0..custom_columns {
        trees.add_column();
    }
    trees
}

pub(crate) fn component_labels<C: DataCollection + ?Sized>(collection: &C, dataset: usize) -> Vec<String> {
    collection
        .components(dataset)
        .into_iter()
        .map(|c| c.label)
        .collect()
}
