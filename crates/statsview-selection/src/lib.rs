//! statsview-selection - Expression grammars for statsview
//!
//! Two small languages live here:
//!
//! - **Subset predicates**: `x > 0 && y < 10`, `!(flux <= 3) || all`.
//!   A subset group holds one predicate; evaluating it against a dataset
//!   yields that dataset's membership mask.
//! - **Column expressions**: `{Maximum} - {Minimum}`, `{Sum} / 2`.
//!   Custom statistic columns are defined in terms of the built-in ones.
//!
//! # Example
//!
//! ```ignore
//! let expr = parse_selection("x > 0 && y < 10")?;
//! let mask = Evaluator::new(&context).evaluate(&expr)?;
//! ```

pub mod ast;
pub mod column;
pub mod eval;
pub mod parser;

pub use ast::*;
pub use column::*;
pub use eval::*;
pub use parser::*;
