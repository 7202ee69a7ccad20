//! Change scripts
//!
//! Each line of a script is one JSON step. Steps that change the data
//! are applied to the collection first and then reported to the viewer
//! as the event the host would send.

use std::error::Error;
use std::path::PathBuf;

use serde::Deserialize;
use statsview_core::{
    DataCollection, HostEvent, InMemoryCollection, MarkOutcome, Notation, PlotLayer, StatsViewer,
    ViewKind,
};
use tracing::{info, warn};

use crate::load_dataset;

type StepResult = Result<(), Box<dyn Error>>;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    LoadDataset { path: PathBuf },
    RemoveDataset { dataset: String },
    RenameDataset { old: String, new: String },
    RenameComponent { dataset: String, old: String, new: String },
    RemoveComponent { dataset: String, component: String },
    DefineSubset { subset: String, predicate: String },
    EditSubset { subset: String, predicate: String },
    RenameSubset { old: String, new: String },
    RecolorSubset { subset: String, color: String },
    DeleteSubset { subset: String },
    Layers { layers: Vec<PlotLayer> },
    /// Check a row or branch by its display labels
    Check {
        view: ViewKind,
        subset: String,
        dataset: String,
        component: String,
    },
    CalculateAll,
    ShowView { view: ViewKind },
    Notation { notation: Notation },
    Decimals { decimals: u8 },
    AddColumn { name: String, expression: String },
    Reset,
}

/// Parse a script; blank lines and `#` comments are skipped
pub fn parse_script(text: &str) -> Result<Vec<Step>, serde_json::Error> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

/// Run every step; a failing step is logged and the rest still run
pub fn run_script(steps: &[Step], collection: &mut InMemoryCollection, viewer: &mut StatsViewer) -> usize {
    let mut failures = 0;
    for (line, step) in steps.iter().enumerate() {
        if let Err(e) = apply(step, collection, viewer) {
            warn!("Step {} failed: {}", line + 1, e);
            failures += 1;
        }
    }
    info!("Script finished: {} steps, {} failed", steps.len(), failures);
    failures
}

fn missing(what: &str) -> Box<dyn Error> {
    format!("{} not found", what).into()
}

fn apply(step: &Step, collection: &mut InMemoryCollection, viewer: &mut StatsViewer) -> StepResult {
    let event = match step {
        Step::LoadDataset { path } => {
            let dataset = load_dataset(collection, path)?;
            HostEvent::DatasetAdded { dataset }
        }
        Step::RemoveDataset { dataset } => {
            if !collection.remove_dataset(dataset) {
                return Err(missing(dataset));
            }
            HostEvent::DatasetRemoved {
                dataset: dataset.clone(),
            }
        }
        Step::RenameDataset { old, new } => {
            if !collection.rename_dataset(old, new) {
                return Err(missing(old));
            }
            HostEvent::DatasetRenamed {
                old_label: old.clone(),
                new_label: new.clone(),
            }
        }
        Step::RenameComponent { dataset, old, new } => {
            if !collection.rename_component(dataset, old, new) {
                return Err(missing(old));
            }
            HostEvent::ComponentRenamed {
                dataset: dataset.clone(),
                old_label: old.clone(),
                new_label: new.clone(),
            }
        }
        Step::RemoveComponent { dataset, component } => {
            if !collection.remove_component(dataset, component) {
                return Err(missing(component));
            }
            HostEvent::ComponentRemoved {
                dataset: dataset.clone(),
                component: component.clone(),
            }
        }
        Step::DefineSubset { subset, predicate } => {
            collection.define_subset(subset.clone(), predicate)?;
            HostEvent::SubsetCreated {
                subset: subset.clone(),
            }
        }
        Step::EditSubset { subset, predicate } => {
            if !collection.set_subset_predicate(subset, predicate)? {
                return Err(missing(subset));
            }
            HostEvent::SubsetEdited {
                subset: subset.clone(),
            }
        }
        Step::RenameSubset { old, new } => {
            if !collection.rename_subset(old, new) {
                return Err(missing(old));
            }
            HostEvent::SubsetUpdated {
                subset: old.clone(),
                new_label: Some(new.clone()),
                color: None,
            }
        }
        Step::RecolorSubset { subset, color } => HostEvent::SubsetUpdated {
            subset: subset.clone(),
            new_label: None,
            color: Some(color.clone()),
        },
        Step::DeleteSubset { subset } => {
            if !collection.remove_subset(subset) {
                return Err(missing(subset));
            }
            HostEvent::SubsetDeleted {
                subset: subset.clone(),
            }
        }
        Step::Layers { layers } => HostEvent::LayersChanged {
            layers: layers.clone(),
        },
        Step::Check {
            view,
            subset,
            dataset,
            component,
        } => return check(&*collection, viewer, *view, subset, dataset, component),
        Step::CalculateAll => {
            viewer.calculate_all(&*collection);
            return Ok(());
        }
        Step::ShowView { view } => {
            viewer.set_active_view(*view);
            return Ok(());
        }
        Step::Notation { notation } => {
            viewer.set_notation(*notation);
            return Ok(());
        }
        Step::Decimals { decimals } => {
            viewer.set_decimals(*decimals)?;
            return Ok(());
        }
        Step::AddColumn { name, expression } => {
            viewer.add_custom_column(name, expression)?;
            return Ok(());
        }
        Step::Reset => {
            viewer.reset(&*collection);
            return Ok(());
        }
    };
    viewer.handle_event(&*collection, &event)?;
    Ok(())
}

/// Check a row; manual-mode confirmations are accepted
pub fn check<C: DataCollection + ?Sized>(
    collection: &C,
    viewer: &mut StatsViewer,
    view: ViewKind,
    subset: &str,
    dataset: &str,
    component: &str,
) -> StepResult {
    viewer.set_active_view(view);
    let node = viewer.trees().find_node(view, subset, dataset, component)?;
    if viewer.mark(collection, view, node, true)? == MarkOutcome::ConfirmationRequired {
        viewer.resolve_confirmation(collection, true)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script() {
        let text = r#"
# rename then calculate
{"rename_dataset":{"old":"D1","new":"D1b"}}
"calculate_all"
{"check":{"view":"Component","subset":"All data (D1b)","dataset":"D1b","component":"x"}}
"#;
        let steps = parse_script(text).unwrap();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[1], Step::CalculateAll);
        assert!(matches!(&steps[2], Step::Check { view: ViewKind::Component, .. }));
    }

    #[test]
    fn test_bad_line_rejected() {
        assert!(parse_script("{\"explode\":{}}").is_err());
    }
}
