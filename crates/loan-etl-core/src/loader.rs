use std::fs::File;
use std::path::Path;

use polars::prelude::*;
use tracing::{debug, info};

use crate::config::LoadOptions;
use crate::error::{EtlError, Result};
use crate::schema::{ColumnKind, LoanColumn};

/// Reads a loan CSV (header row, empty fields as null) and conforms it to the declared schema.
pub fn load_loans(path: &Path, options: &LoadOptions) -> Result<DataFrame> {
    let file = File::open(path).map_err(|source| EtlError::io(path, source))?;

    let raw = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(options.infer_schema_length)
        .into_reader_with_file_handle(file)
        .finish()?;

    info!(
        path = %path.display(),
        rows = raw.height(),
        columns = raw.width(),
        "Loaded loan CSV"
    );

    conform_schema(&raw, &path.display().to_string())
}

/// Checks every declared column is present and casts it to its declared type.
///
/// Text columns are cast leniently. Numeric columns use a strict cast so that values which do
/// not parse surface here as [`EtlError::ColumnType`] instead of failing later in arithmetic.
pub fn conform_schema(df: &DataFrame, source_name: &str) -> Result<DataFrame> {
    let mut output = df.clone();

    for column in LoanColumn::ALL {
        let name = column.canonical_name();
        if output.get_column_index(name).is_none() {
            return Err(EtlError::MissingColumn {
                column: name,
                source_name: source_name.to_string(),
            });
        }

        let current = output.column(name)?;
        let expected = column.kind().dtype();
        if current.dtype() == &expected {
            continue;
        }

        let found = current.dtype().clone();
        let converted = match column.kind() {
            ColumnKind::Text => current.cast(&expected)?,
            ColumnKind::Float | ColumnKind::Count => {
                if column.kind() == ColumnKind::Count && has_fractional_values(current)? {
                    return Err(EtlError::ColumnType {
                        column: name,
                        expected,
                        found,
                    });
                }
                current
                    .strict_cast(&expected)
                    .map_err(|_| EtlError::ColumnType {
                        column: name,
                        expected: expected.clone(),
                        found: found.clone(),
                    })?
            }
        };

        debug!(column = name, from = %found, to = %expected, "Cast declared column");
        output.with_column(converted)?;
    }

    Ok(output)
}

/// A float column cast to Int64 would truncate `1.5` to `1`, so counts must be whole numbers.
fn has_fractional_values(column: &Column) -> Result<bool> {
    if !column.dtype().is_float() {
        return Ok(false);
    }
    let values = column.cast(&DataType::Float64)?;
    let fractional = values
        .f64()?
        .into_iter()
        .flatten()
        .any(|value| !value.is_finite() || value.fract() != 0.0);
    Ok(fractional)
}
