//! Number formatting for statistic cells
//!
//! Renders raw values the way printf does: `%.<N>E` for scientific and
//! `%.<N>F` for fixed notation.

use serde::{Deserialize, Serialize};

use crate::cache::StatTuple;

/// Cell text for categorical components
pub const NAN_TEXT: &str = "NaN";

/// Cell text for values the provider could not produce
pub const ERROR_TEXT: &str = "Error";

/// Scientific or fixed notation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Notation {
    #[default]
    Scientific,
    Fixed,
}

/// Formatting settings for numeric cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberFormat {
    pub notation: Notation,
    pub decimals: u8,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            notation: Notation::Scientific,
            decimals: 3,
        }
    }
}

impl NumberFormat {
    pub fn new(notation: Notation, decimals: u8) -> Self {
        Self { notation, decimals }
    }

    /// Format a raw value
    pub fn format(&self, value: f64) -> String {
        if value.is_nan() {
            return NAN_TEXT.to_string();
        }
        if value.is_infinite() {
            return if value > 0.0 { "INF" } else { "-INF" }.to_string();
        }

        let decimals = self.decimals as usize;
        match self.notation {
            Notation::Fixed => format!("{:.*}", decimals, value),
            Notation::Scientific => scientific(value, decimals),
        }
    }
}

/// `1.5e3` with 3 decimals becomes `1.500E+03`
fn scientific(value: f64, decimals: usize) -> String {
    let text = format!("{:.*E}", decimals, value);
    match text.split_once('E') {
        Some((mantissa, exponent)) => match exponent.parse::<i32>() {
            Ok(exp) => {
                let sign = if exp < 0 { '-' } else { '+' };
                format!("{}E{}{:02}", mantissa, sign, exp.abs())
            }
            Err(_) => text,
        },
        None => text,
    }
}

/// Cells for one row plus whether any of them is an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedRow {
    pub cells: Vec<String>,
    pub has_error: bool,
}

impl RenderedRow {
    /// Every cell reads "Error"; used when the provider failed outright
    pub fn failed(width: usize) -> Self {
        Self {
            cells: vec![ERROR_TEXT.to_string(); width],
            has_error: true,
        }
    }
}

/// Render a cached tuple and its custom column values.
///
/// Categorical rows read "NaN" throughout. For numeric rows a NaN
/// statistic means the subset had no data and reads "Error"; a NaN custom
/// value reads "NaN".
pub fn render_tuple(tuple: &StatTuple, custom: &[f64], format: NumberFormat) -> RenderedRow {
    let width = tuple.values.len() + custom.len();
    if tuple.categorical {
        return RenderedRow {
            cells: vec![NAN_TEXT.to_string(); width],
            has_error: false,
        };
    }

    let mut has_error = false;
    let mut cells = Vec::with_capacity(width);
    for value in tuple.values {
        if value.is_nan() {
            has_error = true;
            cells.push(ERROR_TEXT.to_string());
        } else {
            cells.push(format.format(value));
        }
    }
    cells.extend(custom.iter().map(|&v| format.format(v)));

    RenderedRow { cells, has_error }
}
