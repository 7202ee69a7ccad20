//! Shared collections and helpers for integration tests

use statsview_core::{
    ColumnValues, InMemoryCollection, NodeId, NodeKind, StatsViewer, ViewKind, ViewerConfig,
};

/// `D1` with a numeric `C1 = [1, 2, 3]` and a categorical `C2`
pub fn scenario_collection() -> InMemoryCollection {
    let mut collection = InMemoryCollection::new();
    collection.push_dataset(
        "D1",
        vec![
            ("C1", ColumnValues::Numeric(vec![1.0, 2.0, 3.0])),
            (
                "C2",
                ColumnValues::Categorical(vec!["a".into(), "b".into(), "c".into()]),
            ),
        ],
    );
    collection
}

/// Two datasets sharing `x`; `S1` applies to both, `S2` only to `D2`
#[allow(dead_code)]
pub fn linked_collection() -> InMemoryCollection {
    let mut collection = InMemoryCollection::new();
    collection.push_dataset(
        "D1",
        vec![
            ("x", ColumnValues::Numeric(vec![1.0, 2.0, 3.0, 4.0])),
            ("y", ColumnValues::Numeric(vec![10.0, 20.0, 30.0, 40.0])),
        ],
    );
    collection.push_dataset(
        "D2",
        vec![
            ("x", ColumnValues::Numeric(vec![5.0, 6.0])),
            ("z", ColumnValues::Numeric(vec![-1.0, 1.0])),
        ],
    );
    collection.define_subset("S1", "x > 2").unwrap();
    collection.define_subset("S2", "z > 0").unwrap();
    collection
}

#[allow(dead_code)]
pub fn viewer(collection: &InMemoryCollection) -> StatsViewer {
    StatsViewer::new(collection, ViewerConfig::default()).unwrap()
}

/// Cell text of a node, empty for blank cells
#[allow(dead_code)]
pub fn cells(viewer: &StatsViewer, view: ViewKind, id: NodeId) -> Vec<String> {
    viewer
        .trees()
        .node(view, id)
        .unwrap()
        .columns
        .iter()
        .map(|c| c.clone().unwrap_or_default())
        .collect()
}

/// Cell text of the row named by display labels
#[allow(dead_code)]
pub fn row_cells(
    viewer: &StatsViewer,
    view: ViewKind,
    subset: &str,
    dataset: &str,
    component: &str,
) -> Vec<String> {
    let id = viewer
        .trees()
        .find_node(view, subset, dataset, component)
        .unwrap();
    cells(viewer, view, id)
}

/// First node of a view with the given kind and label
#[allow(dead_code)]
pub fn node_labelled(viewer: &StatsViewer, view: ViewKind, kind: NodeKind, label: &str) -> NodeId {
    viewer
        .trees()
        .view(view)
        .find_all(|n| n.kind == kind && n.label == label)
        .into_iter()
        .next()
        .unwrap()
}
