//! statsview - statistics for datasets, components and subsets
//!
//! Loads delimited-text datasets, defines subset groups, optionally
//! replays a script of changes, and prints the statistics table.

mod args;
mod script;

use std::error::Error;
use std::path::Path;

use clap::Parser;
use statsview_core::{
    ColumnValues, InMemoryCollection, Notice, ResultTable, StatsViewer, ViewKind, ViewerConfig,
};
use statsview_io::{open_file, DataColumn};
use tracing::{info, warn};

use args::{split_assignment, Cli};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let mut config = load_config(&cli)?;
    if let Some(notation) = cli.notation {
        config.display.notation = notation.into();
    }
    if let Some(decimals) = cli.decimals {
        config.display.decimals = decimals;
    }
    if let Some(mode) = cli.calc_mode() {
        config.calculation.mode = mode;
    }

    let mut collection = InMemoryCollection::new();
    for path in &cli.data {
        let label = load_dataset(&mut collection, path)?;
        info!("Loaded '{}' from {}", label, path.display());
    }
    for assignment in &cli.subsets {
        let (name, predicate) = split_assignment(assignment)
            .ok_or_else(|| format!("expected NAME=PREDICATE, got '{}'", assignment))?;
        collection.define_subset(name, predicate)?;
    }

    let mut viewer = StatsViewer::new(&collection, config)?;
    for assignment in &cli.columns {
        let (name, expression) = split_assignment(assignment)
            .ok_or_else(|| format!("expected NAME=EXPRESSION, got '{}'", assignment))?;
        viewer.add_custom_column(name, expression)?;
    }

    if let Some(path) = &cli.script {
        let steps = script::parse_script(&std::fs::read_to_string(path)?)?;
        script::run_script(&steps, &mut collection, &mut viewer);
    }

    let view = ViewKind::from(cli.view);
    viewer.set_active_view(view);
    if cli.calculate_all {
        viewer.calculate_all(&collection);
    }

    for notice in viewer.drain_notices() {
        match notice {
            Notice::LargeDataset { dataset, size } => {
                warn!("'{}' has {} points; calculation is manual", dataset, size)
            }
            Notice::NoDataToCalculate { failed } => {
                warn!("{} rows had no data to calculate", failed)
            }
        }
    }

    print!("{}", render_table(&viewer.result_table(view)));
    if let Some(path) = &cli.export {
        let rows = viewer.export_to_path(view, path)?;
        info!("Wrote {} rows to {}", rows, path.display());
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<ViewerConfig, Box<dyn Error>> {
    if let Some(path) = &cli.config {
        return Ok(ViewerConfig::load(path)?);
    }
    match ViewerConfig::default_path() {
        Some(path) if path.exists() => Ok(ViewerConfig::load(&path)?),
        _ => Ok(ViewerConfig::default()),
    }
}

/// Read a file into the collection; returns the dataset label
pub(crate) fn load_dataset(collection: &mut InMemoryCollection, path: &Path) -> Result<String, Box<dyn Error>> {
    let reader = open_file(&path.to_string_lossy())?;
    let label = reader
        .dataset_label()
        .unwrap_or_else(|| format!("data{}", collection.datasets().len() + 1));
    let columns = reader.read_all()?;
    collection.push_dataset(
        label.clone(),
        columns
            .into_iter()
            .map(|column| (column.name, column_values(&column.data))),
    );
    Ok(label)
}

fn column_values(data: &DataColumn) -> ColumnValues {
    match data.to_f64() {
        Some(values) => ColumnValues::Numeric(values),
        None => ColumnValues::Categorical(data.to_strings().unwrap_or_default()),
    }
}

/// Plain-text table with padded columns
fn render_table(table: &ResultTable) -> String {
    let mut widths: Vec<usize> = table.headings.iter().map(|h| h.len()).collect();
    for row in &table.rows {
        for (width, cell) in widths.iter_mut().zip(&row.cells) {
            *width = (*width).max(cell.len());
        }
    }

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{:<width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = line(&table.headings);
    out.push('\n');
    for row in &table.rows {
        out.push_str(&line(&row.cells));
        out.push('\n');
    }
    out
}
