//! statsview-stats - Statistics provider for the statsview panel
//!
//! The panel shows five aggregates per row:
//!
//! - **Mean** and **Median**
//! - **Minimum** and **Maximum**
//! - **Sum**
//!
//! All aggregates skip non-finite values, so a column with missing data
//! still produces numbers for the points that are present.

pub mod kind;
pub mod summary;

pub use kind::*;
pub use summary::*;
