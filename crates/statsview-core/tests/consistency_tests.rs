//! Incremental reconciliation against a full rebuild
//!
//! Random sequences of host mutations are applied both to a live viewer
//! (through events) and, after every step, to a freshly built one that is
//! handed the live viewer's layer state. The two must describe the same
//! trees.

use std::collections::BTreeMap;

use proptest::prelude::*;
use statsview_core::{
    Calculability, ColumnValues, DataCollection, HostEvent, InMemoryCollection, LayerTarget,
    PlotLayer, StatsViewer, ViewKind, ViewerConfig,
};

#[derive(Debug, Clone)]
enum Op {
    AddDataset,
    RemoveDataset(usize),
    RenameDataset(usize),
    AddComponent(usize, bool),
    RenameComponent(usize, usize),
    RemoveComponent(usize, usize),
    CreateSubset(i32),
    EditSubset(usize, i32),
    RenameSubset(usize),
    DeleteSubset(usize),
    /// 0 drops the layer from the list, 1 hides it, 2 shows it
    Layers(Vec<u8>),
    Links,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::AddDataset),
        1 => any::<usize>().prop_map(Op::RemoveDataset),
        1 => any::<usize>().prop_map(Op::RenameDataset),
        1 => (any::<usize>(), any::<bool>()).prop_map(|(d, c)| Op::AddComponent(d, c)),
        1 => (any::<usize>(), any::<usize>()).prop_map(|(d, c)| Op::RenameComponent(d, c)),
        1 => (any::<usize>(), any::<usize>()).prop_map(|(d, c)| Op::RemoveComponent(d, c)),
        2 => (0..5i32).prop_map(Op::CreateSubset),
        1 => (any::<usize>(), 0..5i32).prop_map(|(s, t)| Op::EditSubset(s, t)),
        1 => any::<usize>().prop_map(Op::RenameSubset),
        1 => any::<usize>().prop_map(Op::DeleteSubset),
        3 => prop::collection::vec(0..3u8, 1..8).prop_map(Op::Layers),
        1 => Just(Op::Links),
    ]
}

/// Mutate the collection and return the event the host would send
fn apply(collection: &mut InMemoryCollection, op: &Op, counter: &mut usize) -> Option<HostEvent> {
    *counter += 1;
    let n = *counter;
    let datasets = collection.dataset_labels();
    let subsets = collection.subset_groups();
    let pick = |labels: &[String], i: usize| labels.get(i % labels.len().max(1)).cloned();

    match op {
        Op::AddDataset => {
            let dataset = format!("D{}", n);
            collection.push_dataset(
                dataset.as_str(),
                vec![
                    ("a", ColumnValues::Numeric(vec![1.0, 2.0, 3.0])),
                    ("b", ColumnValues::Numeric(vec![4.0, 5.0, 6.0])),
                ],
            );
            Some(HostEvent::DatasetAdded { dataset })
        }
        Op::RemoveDataset(i) => {
            let dataset = pick(&datasets, *i)?;
            collection.remove_dataset(&dataset);
            Some(HostEvent::DatasetRemoved { dataset })
        }
        Op::RenameDataset(i) => {
            let old_label = pick(&datasets, *i)?;
            let new_label = format!("D{}", n);
            collection.rename_dataset(&old_label, &new_label);
            Some(HostEvent::DatasetRenamed {
                old_label,
                new_label,
            })
        }
        Op::AddComponent(i, categorical) => {
            let dataset = pick(&datasets, *i)?;
            let component = format!("c{}", n);
            let values = if *categorical {
                ColumnValues::Categorical(vec!["p".into(), "q".into(), "r".into()])
            } else {
                ColumnValues::Numeric(vec![7.0, 8.0, 9.0])
            };
            collection.add_component(&dataset, component.as_str(), values);
            Some(HostEvent::ComponentAdded { dataset, component })
        }
        Op::RenameComponent(i, c) => {
            let dataset = pick(&datasets, *i)?;
            let index = collection.dataset_index(&dataset)?;
            let components: Vec<String> = collection
                .components(index)
                .into_iter()
                .map(|c| c.label)
                .collect();
            let old_label = pick(&components, *c)?;
            let new_label = format!("c{}", n);
            collection.rename_component(&dataset, &old_label, &new_label);
            Some(HostEvent::ComponentRenamed {
                dataset,
                old_label,
                new_label,
            })
        }
        Op::RemoveComponent(i, c) => {
            let dataset = pick(&datasets, *i)?;
            let index = collection.dataset_index(&dataset)?;
            let components: Vec<String> = collection
                .components(index)
                .into_iter()
                .map(|c| c.label)
                .collect();
            let component = pick(&components, *c)?;
            collection.remove_component(&dataset, &component);
            Some(HostEvent::ComponentRemoved { dataset, component })
        }
        Op::CreateSubset(threshold) => {
            let subset = format!("S{}", n);
            collection
                .define_subset(subset.as_str(), &format!("a > {}", threshold))
                .unwrap();
            Some(HostEvent::SubsetCreated { subset })
        }
        Op::EditSubset(i, threshold) => {
            let subset = pick(&subsets, *i)?;
            collection
                .set_subset_predicate(&subset, &format!("a > {}", threshold))
                .unwrap();
            Some(HostEvent::SubsetEdited { subset })
        }
        Op::RenameSubset(i) => {
            let subset = pick(&subsets, *i)?;
            let new_label = format!("S{}", n);
            collection.rename_subset(&subset, &new_label);
            Some(HostEvent::SubsetUpdated {
                subset,
                new_label: Some(new_label),
                color: None,
            })
        }
        Op::DeleteSubset(i) => {
            let subset = pick(&subsets, *i)?;
            collection.remove_subset(&subset);
            Some(HostEvent::SubsetDeleted { subset })
        }
        Op::Layers(codes) => {
            let mut targets: Vec<LayerTarget> =
                datasets.iter().map(|d| LayerTarget::dataset(d)).collect();
            for subset in &subsets {
                for dataset in &datasets {
                    targets.push(LayerTarget::subset(subset, dataset));
                }
            }
            let layers = targets
                .into_iter()
                .enumerate()
                .filter_map(|(i, target)| match codes[i % codes.len()] {
                    0 => None,
                    code => Some(PlotLayer::new(target, code == 2, i as i32)),
                })
                .collect();
            Some(HostEvent::LayersChanged { layers })
        }
        Op::Links => Some(HostEvent::LinksChanged),
    }
}

/// Full rebuild that honours the live viewer's hidden layers
fn rebuilt(collection: &InMemoryCollection, live: &StatsViewer) -> StatsViewer {
    let mut fresh = StatsViewer::new(collection, ViewerConfig::default()).unwrap();
    let layers = live.layers().snapshot().to_vec();
    fresh
        .handle_event(collection, &HostEvent::LayersChanged { layers })
        .unwrap();
    fresh
}

fn sorted(mut labels: Vec<String>) -> Vec<String> {
    labels.sort();
    labels
}

fn pair_states(viewer: &StatsViewer) -> BTreeMap<(String, String), Option<Calculability>> {
    viewer
        .trees()
        .pairs()
        .into_iter()
        .map(|(s, d)| {
            let value = viewer.trees().pair_calculability(&s, &d);
            ((s, d), value)
        })
        .collect()
}

fn base_collection() -> InMemoryCollection {
    let mut collection = InMemoryCollection::new();
    collection.push_dataset(
        "D0",
        vec![
            ("a", ColumnValues::Numeric(vec![1.0, 2.0, 3.0])),
            ("label", ColumnValues::Categorical(vec!["x".into(), "y".into(), "z".into()])),
        ],
    );
    collection.define_subset("S0", "a > 1").unwrap();
    collection
}

proptest! {
    #[test]
    fn test_incremental_matches_rebuild(ops in prop::collection::vec(op(), 1..25)) {
        let mut collection = base_collection();
        let mut viewer = StatsViewer::new(&collection, ViewerConfig::default()).unwrap();
        viewer.calculate_all(&collection);
        let mut counter = 0;
        // Predicate edits keep gray state until links change
        let mut probes_current = true;

        for op in &ops {
            let Some(event) = apply(&mut collection, op, &mut counter) else {
                continue;
            };
            match event {
                HostEvent::SubsetEdited { .. } => probes_current = false,
                HostEvent::LinksChanged => probes_current = true,
                _ => {}
            }
            viewer.handle_event(&collection, &event).unwrap();
            let fresh = rebuilt(&collection, &viewer);

            prop_assert!(viewer.trees().is_consistent(), "views diverged after {:?}", op);
            prop_assert_eq!(sorted(viewer.trees().datasets()), sorted(fresh.trees().datasets()));
            prop_assert_eq!(viewer.trees().subset_groups(), fresh.trees().subset_groups());
            for view in ViewKind::BOTH {
                prop_assert_eq!(
                    viewer.trees().identity_chains(view),
                    fresh.trees().identity_chains(view)
                );
            }
            let (live, full) = (pair_states(&viewer), pair_states(&fresh));
            prop_assert_eq!(live.keys().collect::<Vec<_>>(), full.keys().collect::<Vec<_>>());
            if probes_current {
                prop_assert_eq!(live, full);
            }
            prop_assert_eq!(viewer.dataset_count(), collection.len());
        }
    }

    #[test]
    fn test_cache_never_outlives_its_entities(ops in prop::collection::vec(op(), 1..25)) {
        let mut collection = base_collection();
        let mut viewer = StatsViewer::new(&collection, ViewerConfig::default()).unwrap();
        let mut counter = 0;

        for op in &ops {
            let Some(event) = apply(&mut collection, op, &mut counter) else {
                continue;
            };
            viewer.handle_event(&collection, &event).unwrap();
            viewer.calculate_all(&collection);

            for row in viewer.calculated_rows().rows(ViewKind::Subset) {
                prop_assert!(
                    statsview_core::resolve_row(&collection, row).is_ok(),
                    "stale row {} after {:?}",
                    row,
                    op
                );
            }
        }
    }
}
