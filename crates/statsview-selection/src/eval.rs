//! Subset predicate evaluator
//!
//! Evaluates a predicate against a dataset to produce a membership mask.

use crate::ast::*;
use thiserror::Error;

/// Evaluation errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    /// The dataset has no component with this label. For a subset group
    /// this means the dataset is not linked to the data the predicate was
    /// defined on.
    #[error("Field not found: {0}")]
    FieldNotFound(String),

    #[error("Field is not numeric: {0}")]
    NonNumericField(String),
}

/// Result type for evaluation
pub type EvalResult<T> = Result<T, EvalError>;

/// Row-level access to the dataset being filtered
pub trait EvalContext {
    /// Whether the dataset has a numeric component with this label
    fn has_field(&self, field: &str) -> bool;

    /// Get the value of a field for a point
    fn field_value(&self, field: &str, index: usize) -> Option<f64>;

    /// Get the number of points
    fn num_points(&self) -> usize;
}

/// Predicate evaluator
pub struct Evaluator<'a, C: EvalContext> {
    context: &'a C,
}

impl<'a, C: EvalContext> Evaluator<'a, C> {
    /// Create a new evaluator
    pub fn new(context: &'a C) -> Self {
        Self { context }
    }

    /// Evaluate a predicate, returning a mask with one entry per point
    pub fn evaluate(&self, expr: &SelectionExpr) -> EvalResult<Vec<bool>> {
        if let Some(missing) = expr.fields().into_iter().find(|f| !self.context.has_field(f)) {
            return Err(EvalError::FieldNotFound(missing));
        }

        (0..self.context.num_points())
            .map(|i| self.evaluate_point(expr, i))
            .collect()
    }

    /// Evaluate a predicate for a single point
    pub fn evaluate_point(&self, expr: &SelectionExpr, index: usize) -> EvalResult<bool> {
        match expr {
            SelectionExpr::And(a, b) => {
                Ok(self.evaluate_point(a, index)? && self.evaluate_point(b, index)?)
            }
            SelectionExpr::Or(a, b) => {
                Ok(self.evaluate_point(a, index)? || self.evaluate_point(b, index)?)
            }
            SelectionExpr::Not(e) => Ok(!self.evaluate_point(e, index)?),
            SelectionExpr::Comparison(c) => {
                let lhs = self.evaluate_value(&c.lhs, index)?;
                let rhs = self.evaluate_value(&c.rhs, index)?;
                Ok(c.op.evaluate(lhs, rhs))
            }
            SelectionExpr::All => Ok(true),
            SelectionExpr::None => Ok(false),
        }
    }

    fn evaluate_value(&self, value: &Value, index: usize) -> EvalResult<f64> {
        match value {
            Value::Number(n) => Ok(*n),
            Value::Field(field) => self
                .context
                .field_value(field, index)
                .ok_or_else(|| EvalError::NonNumericField(field.clone())),
        }
    }
}

/// Count the number of selected points
pub fn count_selected(mask: &[bool]) -> usize {
    mask.iter().filter(|&&b| b).count()
}

/// Get indices of selected points
pub fn selected_indices(mask: &[bool]) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter_map(|(i, &b)| if b { Some(i) } else { None })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_selection;

    struct TestContext {
        x: Vec<f64>,
        y: Vec<f64>,
    }

    impl EvalContext for TestContext {
        fn has_field(&self, field: &str) -> bool {
            matches!(field, "x" | "y")
        }

        fn field_value(&self, field: &str, index: usize) -> Option<f64> {
            match field {
                "x" => self.x.get(index).copied(),
                "y" => self.y.get(index).copied(),
                _ => None,
            }
        }

        fn num_points(&self) -> usize {
            self.x.len()
        }
    }

    fn context() -> TestContext {
        TestContext {
            x: vec![1.0, 2.0, 3.0, 4.0, 5.0],
            y: vec![5.0, 4.0, 3.0, 2.0, 1.0],
        }
    }

    #[test]
    fn test_evaluate_comparison() {
        let ctx = context();
        let eval = Evaluator::new(&ctx);

        let expr = SelectionExpr::Comparison(Comparison::field_gt("x", 2.0));
        let mask = eval.evaluate(&expr).unwrap();

        assert_eq!(mask, vec![false, false, true, true, true]);
    }

    #[test]
    fn test_evaluate_and() {
        let ctx = context();
        let eval = Evaluator::new(&ctx);

        let expr = parse_selection("x > 2 && y > 2").unwrap();
        let mask = eval.evaluate(&expr).unwrap();

        // x > 2: [F, F, T, T, T]
        // y > 2: [T, T, T, F, F]
        // AND:   [F, F, T, F, F]
        assert_eq!(mask, vec![false, false, true, false, false]);
    }

    #[test]
    fn test_evaluate_field_to_field() {
        let ctx = context();
        let mask = Evaluator::new(&ctx)
            .evaluate(&parse_selection("x >= y").unwrap())
            .unwrap();
        assert_eq!(selected_indices(&mask), vec![2, 3, 4]);
    }

    #[test]
    fn test_missing_field_is_reported() {
        let ctx = context();
        let err = Evaluator::new(&ctx)
            .evaluate(&parse_selection("x > 1 && mass < 3").unwrap())
            .unwrap_err();
        assert_eq!(err, EvalError::FieldNotFound("mass".into()));
    }

    #[test]
    fn test_none_selects_nothing() {
        let ctx = context();
        let mask = Evaluator::new(&ctx).evaluate(&SelectionExpr::None).unwrap();
        assert_eq!(count_selected(&mask), 0);
    }
}
