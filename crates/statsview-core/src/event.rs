//! Host mutation events
//!
//! One variant per kind of change the host reports. Events carry the
//! labels they affect directly, including the previous label for renames.

use serde::{Deserialize, Serialize};

use crate::layers::PlotLayer;

/// A change in the host's data collection or display state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostEvent {
    DatasetAdded {
        dataset: String,
    },
    DatasetRemoved {
        dataset: String,
    },
    DatasetRenamed {
        old_label: String,
        new_label: String,
    },
    ComponentAdded {
        dataset: String,
        component: String,
    },
    ComponentRenamed {
        dataset: String,
        old_label: String,
        new_label: String,
    },
    ComponentRemoved {
        dataset: String,
        component: String,
    },
    SubsetCreated {
        subset: String,
    },
    /// Label and/or attribute change; `new_label` is `None` when only an
    /// attribute such as the colour changed
    SubsetUpdated {
        subset: String,
        #[serde(default)]
        new_label: Option<String>,
        #[serde(default)]
        color: Option<String>,
    },
    SubsetDeleted {
        subset: String,
    },
    /// The subset predicate changed
    SubsetEdited {
        subset: String,
    },
    LayersChanged {
        layers: Vec<PlotLayer>,
    },
    /// Links between datasets changed; subset membership may differ
    LinksChanged,
}

impl HostEvent {
    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            HostEvent::DatasetAdded { .. } => "dataset_added",
            HostEvent::DatasetRemoved { .. } => "dataset_removed",
            HostEvent::DatasetRenamed { .. } => "dataset_renamed",
            HostEvent::ComponentAdded { .. } => "component_added",
            HostEvent::ComponentRenamed { .. } => "component_renamed",
            HostEvent::ComponentRemoved { .. } => "component_removed",
            HostEvent::SubsetCreated { .. } => "subset_created",
            HostEvent::SubsetUpdated { .. } => "subset_updated",
            HostEvent::SubsetDeleted { .. } => "subset_deleted",
            HostEvent::SubsetEdited { .. } => "subset_edited",
            HostEvent::LayersChanged { .. } => "layers_changed",
            HostEvent::LinksChanged => "links_changed",
        }
    }

    /// Parse one JSON event, e.g. `{"dataset_added":{"dataset":"D1"}}`
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::LayerTarget;

    #[test]
    fn test_parse_event() {
        let event = HostEvent::from_json(r#"{"dataset_renamed":{"old_label":"D1","new_label":"D1b"}}"#)
            .unwrap();
        assert_eq!(
            event,
            HostEvent::DatasetRenamed {
                old_label: "D1".into(),
                new_label: "D1b".into()
            }
        );
        assert_eq!(event.kind(), "dataset_renamed");
    }

    #[test]
    fn test_parse_unit_and_defaults() {
        assert_eq!(HostEvent::from_json(r#""links_changed""#).unwrap(), HostEvent::LinksChanged);
        let event = HostEvent::from_json(r##"{"subset_updated":{"subset":"S1","color":"#00ff00"}}"##)
            .unwrap();
        assert_eq!(
            event,
            HostEvent::SubsetUpdated {
                subset: "S1".into(),
                new_label: None,
                color: Some("#00ff00".into())
            }
        );
    }

    #[test]
    fn test_parse_layers() {
        let json = r#"{"layers_changed":{"layers":[
            {"target":{"type":"subset","subset":"S1","dataset":"D1"},"visible":false,"zorder":2}
        ]}}"#;
        let HostEvent::LayersChanged { layers } = HostEvent::from_json(json).unwrap() else {
            panic!("wrong variant");
        };
        assert_eq!(layers[0].target, LayerTarget::subset("S1", "D1"));
        assert!(!layers[0].visible);
    }

    #[test]
    fn test_unknown_event_rejected() {
        assert!(HostEvent::from_json(r#"{"dataset_exploded":{}}"#).is_err());
    }
}
