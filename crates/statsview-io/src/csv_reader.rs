//! CSV file reader with type inference

use crate::reader::{DataReader, IoError, IoResult};
use crate::schema::{ColumnDescriptor, ColumnType, DataColumn, DataSchema};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// CSV file reader
///
/// The file is read once on open; columns are served from memory.
pub struct CsvReader {
    path: Option<String>,
    schema: DataSchema,
    raw: Vec<Vec<String>>,
}

impl CsvReader {
    /// Open a CSV file
    pub fn open(path: &str) -> IoResult<Self> {
        Self::open_with_options(path, b',')
    }

    /// Open a delimited file with a custom delimiter
    pub fn open_with_options(path: &str, delimiter: u8) -> IoResult<Self> {
        if !Path::new(path).exists() {
            return Err(IoError::FileNotFound(path.to_string()));
        }

        let file = File::open(path).map_err(|e| IoError::OpenFailed(e.to_string()))?;
        let mut reader = Self::from_reader(BufReader::new(file), delimiter)?;
        reader.path = Some(path.to_string());
        Ok(reader)
    }

    /// Read delimited text from any reader; the first record is the header
    pub fn from_reader<R: Read>(source: R, delimiter: u8) -> IoResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(source);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| IoError::InvalidFormat(e.to_string()))?
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mut raw: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        let mut num_records = 0;

        for result in reader.records() {
            let record = result.map_err(|e| IoError::InvalidFormat(e.to_string()))?;
            for (i, column) in raw.iter_mut().enumerate() {
                column.push(record.get(i).unwrap_or_default().to_string());
            }
            num_records += 1;
        }

        let columns = headers
            .into_iter()
            .zip(raw.iter())
            .map(|(name, values)| ColumnDescriptor::new(name, infer_type(values)))
            .collect();

        Ok(Self {
            path: None,
            schema: DataSchema::new(columns, num_records),
            raw,
        })
    }
}

impl DataReader for CsvReader {
    fn read_schema(&self) -> IoResult<DataSchema> {
        Ok(self.schema.clone())
    }

    fn read_column(&self, name: &str) -> IoResult<DataColumn> {
        let col_index = self
            .schema
            .column_index(name)
            .ok_or_else(|| IoError::ColumnNotFound(name.to_string()))?;

        let dtype = self.schema.columns[col_index].dtype;
        Ok(parse_column(&self.raw[col_index], dtype))
    }

    fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    fn format_name(&self) -> &'static str {
        "CSV"
    }
}

/// Infer column type from sample values
fn infer_type(values: &[String]) -> ColumnType {
    let non_empty: Vec<&str> = values
        .iter()
        .map(|s| s.as_str())
        .filter(|s| !s.is_empty())
        .collect();
    if non_empty.is_empty() {
        return ColumnType::String;
    }

    if non_empty.iter().all(|s| s.parse::<i64>().is_ok()) {
        return ColumnType::Int64;
    }

    if non_empty.iter().all(|s| s.parse::<f64>().is_ok()) {
        return ColumnType::Float64;
    }

    if non_empty
        .iter()
        .all(|s| matches!(s.to_lowercase().as_str(), "true" | "false"))
    {
        return ColumnType::Bool;
    }

    ColumnType::String
}

/// Parse column values into a DataColumn
///
/// Empty cells in numeric columns become NaN so they count as missing.
fn parse_column(values: &[String], dtype: ColumnType) -> DataColumn {
    match dtype {
        ColumnType::Float64 => DataColumn::Float64(
            values
                .iter()
                .map(|s| s.parse().unwrap_or(f64::NAN))
                .collect(),
        ),
        ColumnType::Int64 => {
            if values.iter().any(|s| s.is_empty()) {
                DataColumn::Float64(
                    values
                        .iter()
                        .map(|s| s.parse().unwrap_or(f64::NAN))
                        .collect(),
                )
            } else {
                DataColumn::Int64(values.iter().map(|s| s.parse().unwrap_or(0)).collect())
            }
        }
        ColumnType::Bool => DataColumn::Bool(
            values
                .iter()
                .map(|s| s.eq_ignore_ascii_case("true"))
                .collect(),
        ),
        ColumnType::String => DataColumn::String(values.to_vec()),
    }
}
