//! Custom statistic columns
//!
//! A custom column is an arithmetic expression over the built-in
//! statistics (`{Mean}`, `{Sum}`, ...) and earlier custom columns.

use tracing::info;

use crate::cache::StatTuple;
use crate::error::{validation, ViewerError, ViewerResult};
use crate::export::IDENTITY_HEADINGS;
use crate::tree::ViewKind;
use crate::viewer::StatsViewer;
use statsview_selection::{parse_column_expr, ColumnExpr};
use statsview_stats::StatKind;

/// A user-defined column
#[derive(Debug, Clone, PartialEq)]
pub struct CustomColumn {
    pub name: String,
    /// Expression text as entered
    pub expression: String,
    expr: ColumnExpr,
}

impl CustomColumn {
    /// Parse an expression; every `{reference}` must be in `known`
    pub fn parse(name: &str, expression: &str, known: &[String]) -> ViewerResult<Self> {
        let expr = parse_column_expr(expression)?;
        if let Some(unknown) = expr.references().into_iter().find(|r| !known.contains(r)) {
            return Err(ViewerError::UnknownColumnReference(unknown));
        }
        Ok(Self {
            name: name.to_string(),
            expression: expression.to_string(),
            expr,
        })
    }

    pub fn expr(&self) -> &ColumnExpr {
        &self.expr
    }
}

/// Values of every custom column for one row; NaN where evaluation fails
pub fn custom_values(columns: &[CustomColumn], tuple: &StatTuple) -> Vec<f64> {
    let mut values: Vec<f64> = Vec::with_capacity(columns.len());
    for column in columns {
        let lookup = |name: &str| {
            StatKind::ALL
                .iter()
                .find(|k| k.heading() == name)
                .map(|&k| tuple.get(k))
                .or_else(|| {
                    columns
                        .iter()
                        .zip(&values)
                        .find(|(c, _)| c.name == name)
                        .map(|(_, &v)| v)
                })
        };
        let value = column.expr.evaluate(&lookup).unwrap_or(f64::NAN);
        values.push(value);
    }
    values
}

impl StatsViewer {
    /// Append a custom column to both views and fill it for calculated rows
    pub fn add_custom_column(&mut self, name: &str, expression: &str) -> ViewerResult<()> {
        let mut taken: Vec<String> = IDENTITY_HEADINGS.iter().map(|h| h.to_string()).collect();
        taken.extend(self.headings());
        validation::validate_column_name(name, &taken)?;

        let column = CustomColumn::parse(name, expression, &self.headings())?;
        info!("Adding custom column '{}' = {}", name, expression);
        self.custom_columns.push(column);
        self.trees.add_column();
        for view in ViewKind::BOTH {
            self.repopulate(view);
        }
        Ok(())
    }
}
