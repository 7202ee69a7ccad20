//! End-to-end behaviour of the viewer against an in-memory collection

mod common;

use common::fixtures::{cells, linked_collection, node_labelled, row_cells, scenario_collection, viewer};
use statsview_core::{
    CalcMode, Calculability, ColumnValues, DataCollection, HostEvent, LayerTarget, MarkOutcome,
    NodeKind, Notation, Notice, PlotLayer, RowIdentity, StatsViewer, ViewKind, ViewerConfig,
    ViewerError,
};

#[test]
fn test_dataset_statistics_scientific() {
    let collection = scenario_collection();
    let mut viewer = viewer(&collection);
    let d1 = node_labelled(&viewer, ViewKind::Subset, NodeKind::Dataset, "D1");

    let outcome = viewer.mark(&collection, ViewKind::Subset, d1, true).unwrap();
    assert_eq!(outcome, MarkOutcome::Marked { computed: 2 });

    assert_eq!(
        row_cells(&viewer, ViewKind::Subset, "All data", "D1", "C1"),
        vec!["2.000E+00", "2.000E+00", "1.000E+00", "3.000E+00", "6.000E+00"]
    );
    assert_eq!(
        row_cells(&viewer, ViewKind::Subset, "All data", "D1", "C2"),
        vec!["NaN"; 5]
    );
    // C1 needs five provider calls, the categorical C2 none
    assert_eq!(viewer.cache().provider_calls(), 5);
}

#[test]
fn test_fixed_notation_rerenders_without_provider() {
    let collection = scenario_collection();
    let mut viewer = viewer(&collection);
    viewer.calculate_all(&collection);
    let calls = viewer.cache().provider_calls();

    viewer.set_notation(Notation::Fixed);
    viewer.set_decimals(1).unwrap();

    assert_eq!(
        row_cells(&viewer, ViewKind::Subset, "All data", "D1", "C1"),
        vec!["2.0", "2.0", "1.0", "3.0", "6.0"]
    );
    assert_eq!(viewer.cache().provider_calls(), calls);
    assert!(matches!(
        viewer.set_decimals(11),
        Err(ViewerError::InvalidConfig(_))
    ));
}

#[test]
fn test_empty_subset_is_grayed_everywhere() {
    let mut collection = scenario_collection();
    collection.define_subset("S1", "C1 > 10").unwrap();
    let mut viewer = viewer(&collection);

    assert_eq!(
        viewer.trees().pair_calculability("S1", "D1"),
        Some(Calculability::NotCalculable)
    );
    let subset_view = viewer.trees().view(ViewKind::Subset);
    let group = node_labelled(&viewer, ViewKind::Subset, NodeKind::SubsetGroup, "S1");
    assert!(subset_view.is_grayed(group));
    assert!(!subset_view.node(group).unwrap().expanded);

    let row = viewer
        .trees()
        .find_node(ViewKind::Component, "S1", "D1", "C1")
        .unwrap();
    assert!(viewer.trees().view(ViewKind::Component).is_grayed(row));

    let err = viewer
        .mark(&collection, ViewKind::Component, row, true)
        .unwrap_err();
    assert!(matches!(err, ViewerError::NotCalculable { .. }));

    let report = viewer.calculate_all(&collection);
    assert_eq!(report.computed, 2);
    assert!(!viewer
        .cache()
        .contains(&RowIdentity::subset_level("S1", "D1", "C1")));
}

#[test]
fn test_views_share_the_cache() {
    let collection = linked_collection();
    let mut viewer = viewer(&collection);
    let row = viewer
        .trees()
        .find_node(ViewKind::Subset, "S1", "S1 (D1)", "x")
        .unwrap();
    viewer.mark(&collection, ViewKind::Subset, row, true).unwrap();
    assert_eq!(viewer.cache().provider_calls(), 5);

    let other = viewer
        .trees()
        .find_node(ViewKind::Component, "S1", "D1", "x")
        .unwrap();
    viewer
        .mark(&collection, ViewKind::Component, other, true)
        .unwrap();
    assert_eq!(viewer.cache().provider_calls(), 5);
    assert_eq!(
        cells(&viewer, ViewKind::Component, other),
        cells(&viewer, ViewKind::Subset, row)
    );
    assert_eq!(
        viewer.trees().counterpart(ViewKind::Subset, row),
        Some(other)
    );
}

#[test]
fn test_dataset_rename_keeps_results() {
    let mut collection = linked_collection();
    let mut viewer = viewer(&collection);
    viewer
        .handle_event(
            &collection,
            &HostEvent::LayersChanged {
                layers: vec![
                    PlotLayer::new(LayerTarget::dataset("D1"), true, 0),
                    PlotLayer::new(LayerTarget::dataset("D2"), true, 1),
                ],
            },
        )
        .unwrap();
    viewer.calculate_all(&collection);
    let calls = viewer.cache().provider_calls();
    let before = row_cells(&viewer, ViewKind::Subset, "S1", "D1", "y");

    assert!(collection.rename_dataset("D1", "D1b"));
    viewer
        .handle_event(
            &collection,
            &HostEvent::DatasetRenamed {
                old_label: "D1".into(),
                new_label: "D1b".into(),
            },
        )
        .unwrap();

    assert_eq!(viewer.trees().datasets(), vec!["D1b", "D2"]);
    assert!(viewer.trees().is_consistent());
    assert_eq!(row_cells(&viewer, ViewKind::Subset, "S1", "S1 (D1b)", "y"), before);
    assert!(viewer
        .cache()
        .contains(&RowIdentity::subset_level("S1", "D1b", "y")));
    assert!(viewer
        .calculated_rows()
        .contains(ViewKind::Subset, &RowIdentity::dataset_level("D1b", "x")));
    assert_eq!(
        viewer.layers().snapshot()[0].target,
        LayerTarget::dataset("D1b")
    );

    viewer.refresh_display();
    assert_eq!(viewer.cache().provider_calls(), calls);
}

#[test]
fn test_subset_edit_invalidates_only_that_subset() {
    let mut collection = linked_collection();
    let mut viewer = viewer(&collection);
    viewer.calculate_all(&collection);
    let calls = viewer.cache().provider_calls();
    assert_eq!(
        row_cells(&viewer, ViewKind::Subset, "S1", "D1", "x")[0],
        "3.500E+00"
    );

    collection.set_subset_predicate("S1", "x > 3").unwrap();
    viewer
        .handle_event(&collection, &HostEvent::SubsetEdited { subset: "S1".into() })
        .unwrap();

    // Four S1 rows (D1: x, y and D2: x, z), five statistics each
    assert_eq!(viewer.cache().provider_calls(), calls + 20);
    assert_eq!(
        row_cells(&viewer, ViewKind::Subset, "S1", "D1", "x")[0],
        "4.000E+00"
    );
    assert_eq!(
        row_cells(&viewer, ViewKind::Subset, "S2", "D2", "z")[0],
        "1.000E+00"
    );
}

#[test]
fn test_manual_confirmation_matches_automatic() {
    let collection = linked_collection();
    let mut automatic = viewer(&collection);
    let mut config = ViewerConfig::default();
    config.calculation.mode = CalcMode::Manual;
    let mut manual = StatsViewer::new(&collection, config).unwrap();

    let d1 = node_labelled(&automatic, ViewKind::Subset, NodeKind::Dataset, "D1");
    automatic.mark(&collection, ViewKind::Subset, d1, true).unwrap();

    let d1 = node_labelled(&manual, ViewKind::Subset, NodeKind::Dataset, "D1");
    assert_eq!(
        manual.mark(&collection, ViewKind::Subset, d1, true).unwrap(),
        MarkOutcome::ConfirmationRequired
    );
    assert!(manual.pending_confirmation().is_some());
    assert_eq!(manual.cache().provider_calls(), 0);

    let outcome = manual.resolve_confirmation(&collection, true).unwrap();
    assert_eq!(outcome, MarkOutcome::Marked { computed: 2 });
    for component in ["x", "y"] {
        assert_eq!(
            row_cells(&manual, ViewKind::Subset, "All data", "D1", component),
            row_cells(&automatic, ViewKind::Subset, "All data", "D1", component)
        );
    }

    // Confirmation is remembered for the session
    let d2 = node_labelled(&manual, ViewKind::Subset, NodeKind::Dataset, "D2");
    assert!(matches!(
        manual.mark(&collection, ViewKind::Subset, d2, true).unwrap(),
        MarkOutcome::Marked { .. }
    ));
    assert!(matches!(
        manual.resolve_confirmation(&collection, true),
        Err(ViewerError::NoPendingConfirmation)
    ));
}

#[test]
fn test_hidden_layer_restores_from_cache() {
    let collection = linked_collection();
    let mut viewer = viewer(&collection);
    viewer.calculate_all(&collection);
    let calls = viewer.cache().provider_calls();
    let before = row_cells(&viewer, ViewKind::Subset, "All data", "D1", "y");
    assert!(!before[0].is_empty());

    let hide = HostEvent::LayersChanged {
        layers: vec![
            PlotLayer::new(LayerTarget::dataset("D1"), false, 0),
            PlotLayer::new(LayerTarget::dataset("D2"), true, 1),
        ],
    };
    viewer.handle_event(&collection, &hide).unwrap();
    assert_eq!(viewer.trees().datasets(), vec!["D2"]);
    assert!(viewer.trees().is_consistent());

    // Same layer state again changes nothing
    viewer.handle_event(&collection, &hide).unwrap();
    assert_eq!(viewer.trees().datasets(), vec!["D2"]);

    let show = HostEvent::LayersChanged {
        layers: vec![
            PlotLayer::new(LayerTarget::dataset("D1"), true, 0),
            PlotLayer::new(LayerTarget::dataset("D2"), true, 1),
        ],
    };
    viewer.handle_event(&collection, &show).unwrap();
    assert_eq!(viewer.trees().datasets(), vec!["D2", "D1"]);
    assert!(viewer.trees().is_consistent());
    assert_eq!(
        row_cells(&viewer, ViewKind::Subset, "All data", "D1", "y"),
        before
    );
    assert_eq!(viewer.cache().provider_calls(), calls);
}

#[test]
fn test_hidden_subset_layer() {
    let collection = linked_collection();
    let mut viewer = viewer(&collection);
    viewer
        .handle_event(
            &collection,
            &HostEvent::LayersChanged {
                layers: vec![PlotLayer::new(LayerTarget::subset("S1", "D2"), false, 0)],
            },
        )
        .unwrap();

    assert!(viewer
        .trees()
        .find_node(ViewKind::Subset, "S1", "D2", "x")
        .is_err());
    assert!(viewer
        .trees()
        .find_node(ViewKind::Component, "S1", "D2", "x")
        .is_err());
    assert!(viewer.trees().is_consistent());
    assert_eq!(viewer.trees().pair_subsets("D2"), vec!["S2"]);
}

#[test]
fn test_dropped_hidden_layer_returns_dataset() {
    let mut collection = linked_collection();
    let mut viewer = viewer(&collection);
    viewer.calculate_all(&collection);
    let before = row_cells(&viewer, ViewKind::Subset, "All data", "D1", "y");

    for d1_visible in [true, false] {
        let event = HostEvent::LayersChanged {
            layers: vec![
                PlotLayer::new(LayerTarget::dataset("D1"), d1_visible, 0),
                PlotLayer::new(LayerTarget::dataset("D2"), true, 1),
            ],
        };
        viewer.handle_event(&collection, &event).unwrap();
    }
    assert_eq!(viewer.trees().datasets(), vec!["D2"]);

    let dropped = HostEvent::LayersChanged {
        layers: vec![PlotLayer::new(LayerTarget::dataset("D2"), true, 1)],
    };
    viewer.handle_event(&collection, &dropped).unwrap();
    assert!(!viewer.layers().is_dataset_hidden("D1"));
    assert_eq!(viewer.trees().datasets(), vec!["D2", "D1"]);
    assert!(viewer.trees().is_consistent());
    assert_eq!(
        row_cells(&viewer, ViewKind::Subset, "All data", "D1", "y"),
        before
    );

    assert!(collection.rename_dataset("D1", "D1b"));
    viewer
        .handle_event(
            &collection,
            &HostEvent::DatasetRenamed {
                old_label: "D1".into(),
                new_label: "D1b".into(),
            },
        )
        .unwrap();
    assert_eq!(viewer.trees().datasets(), vec!["D2", "D1b"]);
}

#[test]
fn test_layer_toggles_reuse_tree_slots() {
    let collection = linked_collection();
    let mut viewer = viewer(&collection);
    let layers = |visible: bool| HostEvent::LayersChanged {
        layers: vec![
            PlotLayer::new(LayerTarget::dataset("D1"), visible, 0),
            PlotLayer::new(LayerTarget::dataset("D2"), true, 1),
        ],
    };
    viewer.handle_event(&collection, &layers(true)).unwrap();
    let slots: Vec<usize> = ViewKind::BOTH
        .iter()
        .map(|&view| viewer.trees().view(view).slot_count())
        .collect();

    for _ in 0..200 {
        viewer.handle_event(&collection, &layers(false)).unwrap();
        viewer.handle_event(&collection, &layers(true)).unwrap();
    }
    for (view, before) in ViewKind::BOTH.iter().zip(slots) {
        assert!(viewer.trees().view(*view).slot_count() <= before);
    }
    assert!(viewer.trees().is_consistent());
}

#[test]
fn test_reset_restores_cells() {
    let collection = linked_collection();
    let mut viewer = viewer(&collection);
    viewer.calculate_all(&collection);
    let calls = viewer.cache().provider_calls();
    let before = row_cells(&viewer, ViewKind::Subset, "S2", "D2", "x");

    viewer.reset(&collection);

    assert_eq!(row_cells(&viewer, ViewKind::Subset, "S2", "D2", "x"), before);
    assert_eq!(viewer.cache().provider_calls(), calls);
}

#[test]
fn test_save_results_as_dataset() {
    let mut collection = scenario_collection();
    let mut viewer = viewer(&collection);

    assert!(matches!(
        viewer.save_results_as_dataset(&mut collection, ViewKind::Subset, "Results"),
        Err(ViewerError::EmptyResults)
    ));

    viewer.calculate_all(&collection);
    assert!(matches!(
        viewer.save_results_as_dataset(&mut collection, ViewKind::Subset, ""),
        Err(ViewerError::EmptyDatasetName)
    ));
    assert!(matches!(
        viewer.save_results_as_dataset(&mut collection, ViewKind::Subset, "D1"),
        Err(ViewerError::DatasetNameTaken(_))
    ));

    viewer
        .save_results_as_dataset(&mut collection, ViewKind::Subset, "Results")
        .unwrap();
    let saved = collection.dataset("Results").unwrap();
    let labels: Vec<&str> = saved.columns.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(
        labels,
        vec!["Subset", "Dataset", "Component", "Mean", "Median", "Minimum", "Maximum", "Sum"]
    );
    assert_eq!(saved.size(), 2);
    assert!(saved.columns[0].values.is_categorical());
    match &saved.columns[6].values {
        ColumnValues::Numeric(max) => {
            assert_eq!(max[0], 3.0);
            assert!(max[1].is_nan());
        }
        other => panic!("expected numeric maximum, got {:?}", other),
    }

    viewer
        .handle_event(&collection, &HostEvent::DatasetAdded { dataset: "Results".into() })
        .unwrap();
    assert_eq!(viewer.trees().datasets(), vec!["D1", "Results"]);
    assert_eq!(viewer.dataset_count(), collection.len());
}

#[test]
fn test_custom_column_fills_calculated_rows() {
    let collection = scenario_collection();
    let mut viewer = viewer(&collection);
    viewer.calculate_all(&collection);

    viewer
        .add_custom_column("Range", "{Maximum} - {Minimum}")
        .unwrap();
    assert_eq!(
        row_cells(&viewer, ViewKind::Subset, "All data", "D1", "C1")[5],
        "2.000E+00"
    );
    assert_eq!(
        row_cells(&viewer, ViewKind::Subset, "All data", "D1", "C2")[5],
        "NaN"
    );
    assert!(matches!(
        viewer.add_custom_column("Mean", "{Sum}"),
        Err(ViewerError::InvalidColumnName(_))
    ));
    assert!(matches!(
        viewer.add_custom_column("Dataset", "{Sum}"),
        Err(ViewerError::InvalidColumnName(_))
    ));
}

#[test]
fn test_large_dataset_event_switches_mode() {
    let mut collection = scenario_collection();
    let mut config = ViewerConfig::default();
    config.calculation.large_dataset_threshold = 10;
    let mut viewer = StatsViewer::new(&collection, config).unwrap();
    assert!(viewer.drain_notices().is_empty());

    collection.push_dataset(
        "Big",
        vec![("v", ColumnValues::Numeric((0..20).map(f64::from).collect()))],
    );
    viewer
        .handle_event(&collection, &HostEvent::DatasetAdded { dataset: "Big".into() })
        .unwrap();

    assert_eq!(viewer.config().calculation.mode, CalcMode::Manual);
    assert_eq!(
        viewer.drain_notices(),
        vec![Notice::LargeDataset {
            dataset: "Big".into(),
            size: 20
        }]
    );
}

#[test]
fn test_subset_on_missing_component_is_grayed() {
    let mut collection = linked_collection();
    collection.define_subset("S3", "y > 15").unwrap();
    let mut viewer = viewer(&collection);
    viewer.calculate_all(&collection);
    assert!(viewer.drain_notices().is_empty());

    // S3 needs y, which D2 lacks: the pair is grayed, not an error
    assert_eq!(
        viewer.trees().pair_calculability("S3", "D2"),
        Some(Calculability::NotCalculable)
    );
    assert_eq!(
        row_cells(&viewer, ViewKind::Subset, "S3", "D1", "x")[0],
        "3.000E+00"
    );
}

#[test]
fn test_subset_rename_and_delete() {
    let mut collection = linked_collection();
    let mut viewer = viewer(&collection);
    viewer.calculate_all(&collection);

    assert!(collection.rename_subset("S1", "S1b"));
    viewer
        .handle_event(
            &collection,
            &HostEvent::SubsetUpdated {
                subset: "S1".into(),
                new_label: Some("S1b".into()),
                color: Some("#ff0000".into()),
            },
        )
        .unwrap();
    assert_eq!(viewer.trees().subset_groups(), vec!["S1b", "S2"]);
    let group = node_labelled(&viewer, ViewKind::Subset, NodeKind::SubsetGroup, "S1b");
    assert_eq!(
        viewer.trees().node(ViewKind::Subset, group).unwrap().marker.as_deref(),
        Some("#ff0000")
    );
    assert!(viewer
        .cache()
        .contains(&RowIdentity::subset_level("S1b", "D2", "z")));
    assert_eq!(
        row_cells(&viewer, ViewKind::Subset, "S1b", "S1b (D1)", "x")[0],
        "3.500E+00"
    );

    assert!(collection.remove_subset("S1b"));
    viewer
        .handle_event(&collection, &HostEvent::SubsetDeleted { subset: "S1b".into() })
        .unwrap();
    assert_eq!(viewer.trees().subset_groups(), vec!["S2"]);
    assert!(viewer.trees().is_consistent());
    assert!(!viewer
        .cache()
        .contains(&RowIdentity::subset_level("S1b", "D2", "z")));
}

#[test]
fn test_unknown_event_target_is_dropped() {
    let collection = linked_collection();
    let mut viewer = viewer(&collection);
    let result = viewer.handle_event(
        &collection,
        &HostEvent::DatasetRenamed {
            old_label: "Nope".into(),
            new_label: "Other".into(),
        },
    );
    assert!(matches!(result, Err(ViewerError::IdentityNotFound { .. })));

    // Next event is handled normally
    viewer
        .handle_event(&collection, &HostEvent::LinksChanged)
        .unwrap();
    assert_eq!(viewer.trees().datasets(), vec!["D1", "D2"]);
}

#[test]
fn test_component_events() {
    let mut collection = linked_collection();
    let mut viewer = viewer(&collection);
    viewer.calculate_all(&collection);

    collection.add_component("D2", "w", ColumnValues::Numeric(vec![0.5, 1.5]));
    viewer
        .handle_event(
            &collection,
            &HostEvent::ComponentAdded {
                dataset: "D2".into(),
                component: "w".into(),
            },
        )
        .unwrap();
    assert_eq!(viewer.trees().components("D2"), vec!["x", "z", "w"]);
    assert!(viewer
        .trees()
        .find_node(ViewKind::Component, "S2", "D2", "w")
        .is_ok());

    collection.rename_component("D1", "y", "y2");
    viewer
        .handle_event(
            &collection,
            &HostEvent::ComponentRenamed {
                dataset: "D1".into(),
                old_label: "y".into(),
                new_label: "y2".into(),
            },
        )
        .unwrap();
    assert_eq!(
        row_cells(&viewer, ViewKind::Subset, "All data", "D1", "y2")[4],
        "1.000E+02"
    );

    collection.remove_component("D1", "y2");
    viewer
        .handle_event(
            &collection,
            &HostEvent::ComponentRemoved {
                dataset: "D1".into(),
                component: "y2".into(),
            },
        )
        .unwrap();
    assert_eq!(viewer.trees().components("D1"), vec!["x"]);
    assert!(!viewer
        .cache()
        .contains(&RowIdentity::dataset_level("D1", "y2")));
    assert!(viewer.trees().is_consistent());
}
