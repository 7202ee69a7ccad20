//! Result tables, CSV export and save-as-dataset

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::collection::{Column, ColumnValues, DataCollection, NewDataset};
use crate::columns::custom_values;
use crate::error::{validation, ExportError, ViewerError, ViewerResult};
use crate::identity::{wrap_dataset_label, RowIdentity, ALL_DATA};
use crate::tree::ViewKind;
use crate::viewer::StatsViewer;

/// Identity headings, in subset view order
pub const IDENTITY_HEADINGS: [&str; 3] = ["Subset", "Dataset", "Component"];

/// One calculated row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub identity: RowIdentity,
    /// Identity cells followed by the formatted value cells
    pub cells: Vec<String>,
    /// Raw values behind the value cells
    pub values: Vec<f64>,
}

/// Calculated rows of one view in display order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultTable {
    pub headings: Vec<String>,
    pub rows: Vec<ResultRow>,
}

impl ResultTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Identity headings as a view orders them
pub fn identity_headings(view: ViewKind) -> [&'static str; 3] {
    match view {
        ViewKind::Subset => IDENTITY_HEADINGS,
        ViewKind::Component => ["Dataset", "Component", "Subset"],
    }
}

/// Identity cells of a row as a view shows them
pub fn identity_cells(view: ViewKind, row: &RowIdentity) -> [String; 3] {
    let subset = match (&row.subset, view) {
        (None, ViewKind::Subset) => ALL_DATA.to_string(),
        (None, ViewKind::Component) => wrap_dataset_label(ALL_DATA, &row.dataset),
        (Some(s), ViewKind::Subset) => wrap_dataset_label(s, &row.dataset),
        (Some(s), ViewKind::Component) => s.clone(),
    };
    match view {
        ViewKind::Subset => [subset, row.dataset.clone(), row.component.clone()],
        ViewKind::Component => [row.dataset.clone(), row.component.clone(), subset],
    }
}

impl StatsViewer {
    /// Calculated rows of a view, in tree order
    pub fn result_table(&self, view: ViewKind) -> ResultTable {
        let mut headings: Vec<String> = identity_headings(view).iter().map(|h| h.to_string()).collect();
        headings.extend(self.headings());

        let tree = self.trees.view(view);
        let rows = tree
            .rows()
            .into_iter()
            .filter_map(|id| tree.node(id))
            .filter(|node| node.has_values())
            .filter_map(|node| {
                let identity = node.row_identity()?;
                if !self.calculated.contains(view, &identity) {
                    return None;
                }
                let tuple = self.cache.get(&identity)?;
                let mut values = tuple.values.to_vec();
                values.extend(custom_values(&self.custom_columns, tuple));

                let mut cells: Vec<String> = identity_cells(view, &identity).into();
                cells.extend(node.columns.iter().map(|c| c.clone().unwrap_or_default()));
                Some(ResultRow {
                    identity,
                    cells,
                    values,
                })
            })
            .collect();

        ResultTable { headings, rows }
    }

    /// Write the result table of a view as CSV; returns the row count
    pub fn export_csv<W: Write>(&self, view: ViewKind, writer: W) -> ViewerResult<usize> {
        let table = self.result_table(view);
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(&table.headings).map_err(ExportError::from)?;
        for row in &table.rows {
            csv.write_record(&row.cells).map_err(ExportError::from)?;
        }
        csv.flush().map_err(ExportError::from)?;
        Ok(table.rows.len())
    }

    /// Export a view's results to a CSV file
    pub fn export_to_path(&self, view: ViewKind, path: &Path) -> ViewerResult<usize> {
        let file = File::create(path).map_err(|source| ExportError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        let rows = self.export_csv(view, file)?;
        info!("Exported {} rows to {}", rows, path.display());
        Ok(rows)
    }

    /// Add the result table of a view to the collection as a new dataset.
    ///
    /// Identity columns become categorical components and value columns
    /// numeric ones holding the raw values.
    pub fn save_results_as_dataset<C: DataCollection + ?Sized>(
        &self,
        collection: &mut C,
        view: ViewKind,
        name: &str,
    ) -> ViewerResult<()> {
        validation::validate_dataset_name(name, &collection.dataset_labels())?;
        let table = self.result_table(view);
        if table.is_empty() {
            return Err(ViewerError::EmptyResults);
        }

        let mut columns = Vec::with_capacity(table.headings.len());
        for (i, heading) in table.headings.iter().enumerate() {
            let values = if i < IDENTITY_HEADINGS.len() {
                ColumnValues::Categorical(table.rows.iter().map(|r| r.cells[i].clone()).collect())
            } else {
                let offset = i - IDENTITY_HEADINGS.len();
                ColumnValues::Numeric(
                    table
                        .rows
                        .iter()
                        .map(|r| r.values.get(offset).copied().unwrap_or(f64::NAN))
                        .collect(),
                )
            };
            columns.push(Column {
                label: heading.clone(),
                values,
            });
        }

        collection.add_dataset(NewDataset {
            label: name.to_string(),
            columns,
        })?;
        info!("Saved {} result rows as dataset '{}'", table.rows.len(), name);
        Ok(())
    }
}
