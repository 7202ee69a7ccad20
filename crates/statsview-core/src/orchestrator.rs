//! Selection and calculation
//!
//! Checking a node checks every selectable row beneath it. In automatic
//! mode the rows compute right away; in manual mode a multi-row check
//! waits for a confirmation that is remembered for the session.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::CalcMode;
use crate::error::{validation, ViewerError, ViewerResult};
use crate::format::{Notation, RenderedRow};
use crate::identity::resolve_row;
use crate::collection::DataCollection;
use crate::tree::{CheckState, NodeId, ViewKind};
use crate::viewer::{Notice, StatsViewer};

/// Result of [`StatsViewer::mark`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    /// Nothing to do
    Unchanged,
    /// Check state applied; `computed` rows now show values
    Marked { computed: usize },
    /// Manual mode needs the user to confirm first
    ConfirmationRequired,
}

/// Summary of a calculation batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationReport {
    /// Rows that got values
    pub computed: usize,
    /// Rows that show "Error"
    pub failed: usize,
    /// Rows skipped: not calculable, not rows, or unresolvable
    pub skipped: usize,
}

/// A check waiting for confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingMark {
    pub view: ViewKind,
    pub node: NodeId,
}

impl StatsViewer {
    /// Check or uncheck a node and everything selectable below it
    pub fn mark<C: DataCollection + ?Sized>(
        &mut self,
        collection: &C,
        view: ViewKind,
        node: NodeId,
        checked: bool,
    ) -> ViewerResult<MarkOutcome> {
        let target = self.trees.node(view, node)?;
        if !target.is_selectable() {
            return Err(ViewerError::NotCalculable {
                subset: target.key.subset.clone().unwrap_or_default(),
                dataset: target.key.dataset.clone().unwrap_or_default(),
            });
        }
        let is_row = target.is_row();
        let was_checked = target.is_checked();

        if !checked {
            if !was_checked && is_row {
                return Ok(MarkOutcome::Unchanged);
            }
            self.trees
                .view_mut(view)
                .set_check_subtree(node, CheckState::Unchecked);
            return Ok(MarkOutcome::Marked { computed: 0 });
        }

        if was_checked && is_row {
            return Ok(MarkOutcome::Unchanged);
        }
        if self.config.calculation.mode == CalcMode::Manual && !is_row && !was_checked && !self.confirmed {
            debug!("Manual mode: waiting for confirmation");
            self.pending = Some(PendingMark { view, node });
            return Ok(MarkOutcome::ConfirmationRequired);
        }

        let rows = self
            .trees
            .view_mut(view)
            .set_check_subtree(node, CheckState::Checked);
        let report = self.calculate(collection, view, &rows);
        Ok(MarkOutcome::Marked {
            computed: report.computed,
        })
    }

    /// The check waiting for confirmation, if any
    pub fn pending_confirmation(&self) -> Option<PendingMark> {
        self.pending
    }

    /// Answer a confirmation request. Acceptance is remembered for the
    /// session and applies the pending check.
    pub fn resolve_confirmation<C: DataCollection + ?Sized>(
        &mut self,
        collection: &C,
        accepted: bool,
    ) -> ViewerResult<MarkOutcome> {
        let pending = self.pending.take().ok_or(ViewerError::NoPendingConfirmation)?;
        if !accepted {
            debug!("Calculation declined");
            return Ok(MarkOutcome::Unchanged);
        }
        self.confirmed = true;
        self.mark(collection, pending.view, pending.node, true)
    }

    /// Compute and display the given rows of a view.
    ///
    /// Rows that cannot be resolved or are not calculable are skipped.
    /// Provider failures and empty subsets render "Error" and raise one
    /// [`Notice::NoDataToCalculate`] for the whole batch.
    pub fn calculate<C: DataCollection + ?Sized>(
        &mut self,
        collection: &C,
        view: ViewKind,
        rows: &[NodeId],
    ) -> CalculationReport {
        let mut report = CalculationReport::default();
        let width = self.trees.view(view).column_count();

        for &id in rows {
            let identity = match self.trees.node(view, id) {
                Ok(node) if node.is_selectable() => node.row_identity(),
                Ok(_) => None,
                Err(e) => {
                    warn!("Skipping row: {}", e);
                    None
                }
            };
            let Some(identity) = identity else {
                report.skipped += 1;
                continue;
            };
            let resolved = match resolve_row(collection, &identity) {
                Ok(resolved) => resolved,
                Err(e) => {
                    warn!("Skipping row: {}", e);
                    report.skipped += 1;
                    continue;
                }
            };

            match self.cache.get_or_compute(collection, &resolved) {
                Ok(tuple) => match self.render_row(view, id, &tuple) {
                    Ok(has_error) => {
                        if has_error {
                            report.failed += 1;
                        } else {
                            report.computed += 1;
                        }
                        self.calculated.record(view, &identity);
                    }
                    Err(e) => {
                        warn!("Skipping row {}: {}", identity, e);
                        report.skipped += 1;
                    }
                },
                Err(e) => {
                    warn!("{}", e);
                    let failed = RenderedRow::failed(width);
                    if self.trees.set_statistic_columns(view, id, failed.cells).is_ok() {
                        report.failed += 1;
                    }
                }
            }
        }

        if report.failed > 0 {
            self.notices.push(Notice::NoDataToCalculate {
                failed: report.failed,
            });
        }
        info!(
            "Calculated {} rows ({} failed, {} skipped)",
            report.computed, report.failed, report.skipped
        );
        report
    }

    /// Check and compute every selectable row of the active view
    pub fn calculate_all<C: DataCollection + ?Sized>(&mut self, collection: &C) -> CalculationReport {
        let view = self.active_view;
        let tree = self.trees.view_mut(view);
        for root in tree.roots().to_vec() {
            tree.set_check_subtree(root, CheckState::Checked);
        }
        let rows = tree.checked_rows();
        self.calculate(collection, view, &rows)
    }

    /// Compute every checked row of the active view
    pub fn calculate_checked<C: DataCollection + ?Sized>(&mut self, collection: &C) -> CalculationReport {
        let view = self.active_view;
        let rows = self.trees.view(view).checked_rows();
        self.calculate(collection, view, &rows)
    }

    /// Switch the displayed view
    pub fn set_active_view(&mut self, view: ViewKind) {
        if self.active_view != view {
            debug!("Active view: {:?}", view);
            self.active_view = view;
        }
    }

    /// Change notation; cells re-render from the cache
    pub fn set_notation(&mut self, notation: Notation) {
        self.config.display.notation = notation;
        self.refresh_display();
    }

    /// Change the decimal places (0-10); cells re-render from the cache
    pub fn set_decimals(&mut self, decimals: u8) -> ViewerResult<()> {
        validation::validate_decimals(decimals)?;
        self.config.display.decimals = decimals;
        self.refresh_display();
        Ok(())
    }

    pub fn set_calc_mode(&mut self, mode: CalcMode) {
        info!("Calculation mode: {:?}", mode);
        self.config.calculation.mode = mode;
        if mode == CalcMode::Automatic {
            self.pending = None;
        }
    }

    /// Re-render every calculated row from the cache; never calls the provider
    pub fn refresh_display(&mut self) -> usize {
        ViewKind::BOTH.iter().map(|&view| self.repopulate(view)).sum()
    }

    /// Step the expansion level of a view deeper
    pub fn expand_level(&mut self, view: ViewKind) -> u8 {
        self.trees.expand_level(view)
    }

    /// Step the expansion level of a view shallower
    pub fn collapse_level(&mut self, view: ViewKind) -> u8 {
        self.trees.collapse_level(view)
    }
}
