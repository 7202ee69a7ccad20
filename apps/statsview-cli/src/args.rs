//! Command-line arguments

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use statsview_core::{CalcMode, Notation, ViewKind};

#[derive(Parser, Debug)]
#[command(name = "statsview")]
#[command(about = "Summary statistics for datasets, components and subsets", long_about = None)]
pub struct Cli {
    /// CSV/TSV files to load, one dataset each
    #[arg(short, long = "data", value_name = "FILE")]
    pub data: Vec<PathBuf>,

    /// Subset group as NAME=PREDICATE, e.g. "bright=flux > 10"
    #[arg(short, long = "subset", value_name = "NAME=PREDICATE")]
    pub subsets: Vec<String>,

    /// JSON-lines script of changes to replay
    #[arg(long, value_name = "FILE")]
    pub script: Option<PathBuf>,

    /// Configuration file (TOML or JSON)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// View to print and export
    #[arg(long, value_enum, default_value_t = ViewArg::Subset)]
    pub view: ViewArg,

    /// Check and calculate every selectable row
    #[arg(short = 'a', long)]
    pub calculate_all: bool,

    #[arg(long, value_enum)]
    pub notation: Option<NotationArg>,

    /// Decimal places (0-10)
    #[arg(long)]
    pub decimals: Option<u8>,

    /// Ask before multi-row calculations (answered yes)
    #[arg(long)]
    pub manual: bool,

    /// Custom column as NAME=EXPRESSION, e.g. "Range={Maximum} - {Minimum}"
    #[arg(long = "column", value_name = "NAME=EXPRESSION")]
    pub columns: Vec<String>,

    /// Write the result table to a CSV file
    #[arg(short, long, value_name = "FILE")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ViewArg {
    Subset,
    Component,
}

impl From<ViewArg> for ViewKind {
    fn from(arg: ViewArg) -> Self {
        match arg {
            ViewArg::Subset => ViewKind::Subset,
            ViewArg::Component => ViewKind::Component,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NotationArg {
    Scientific,
    Fixed,
}

impl From<NotationArg> for Notation {
    fn from(arg: NotationArg) -> Self {
        match arg {
            NotationArg::Scientific => Notation::Scientific,
            NotationArg::Fixed => Notation::Fixed,
        }
    }
}

impl Cli {
    pub fn calc_mode(&self) -> Option<CalcMode> {
        self.manual.then_some(CalcMode::Manual)
    }
}

/// Split `NAME=VALUE`
pub fn split_assignment(text: &str) -> Option<(&str, &str)> {
    let (name, value) = text.split_once('=')?;
    let name = name.trim();
    (!name.is_empty()).then_some((name, value.trim()))
}
