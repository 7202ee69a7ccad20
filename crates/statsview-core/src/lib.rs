//! statsview-core - Statistics side-panel engine
//!
//! This crate keeps two tree presentations of a live data collection in
//! sync and fills them with summary statistics on demand:
//!
//! - **Identity resolution**: display rows back to collection indices
//! - **Statistic cache**: one provider round-trip per row per edit
//! - **Calculability**: which (subset, dataset) pairs can produce numbers
//! - **Dual tree model**: the by-subset and by-component views
//! - **Event reconciliation**: host mutations into minimal tree edits
//! - **Orchestration**: check propagation, calculation modes, formatting
//!
//! # Architecture
//!
//! The host owns the data collection and implements [`DataCollection`].
//! A [`StatsViewer`] borrows it for each call: events go through
//! [`StatsViewer::handle_event`], user checks through [`StatsViewer::mark`],
//! and results come back as formatted cells on tree nodes or as a
//! [`ResultTable`] for export.

pub mod cache;
pub mod calculability;
pub mod collection;
pub mod columns;
pub mod config;
pub mod error;
pub mod event;
pub mod export;
pub mod format;
pub mod identity;
pub mod layers;
pub mod orchestrator;
pub mod reconcile;
pub mod tree;
pub mod viewer;

pub use cache::*;
pub use calculability::*;
pub use collection::*;
pub use columns::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use export::*;
pub use format::*;
pub use identity::*;
pub use layers::*;
pub use orchestrator::*;
pub use tree::*;
pub use viewer::*;

pub use statsview_stats::StatKind;
