//! Dual tree model
//!
//! Two projections of the same (dataset, component, subset) entities:
//!
//! ```text
//! Subset view                         Component view
//! Data                                D1
//!   D1                                  C1
//!     C1          <- row                  All data (D1)   <- row
//! Subsets                                 S1              <- row
//!   S1
//!     S1 (D1)
//!       C1        <- row
//! ```
//!
//! Nodes carry their identity labels as metadata; child order is only a
//! display concern. [`DualTree`] applies every structural edit to both
//! projections.

mod dual;
mod node;
mod view;

pub use dual::*;
pub use node::*;
pub use view::*;
