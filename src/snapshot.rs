//! Columnar snapshot I/O for the cleaned results table.
//!
//! The snapshot is an Arrow IPC file (the feather format) written once per
//! run. Two guards protect an existing snapshot: callers check the
//! destination before doing any expensive work, and the writer checks again
//! immediately before the final rename. The write itself stages into a
//! temp file in the destination directory and lands via rename, so readers
//! never observe a half-written file.

use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Arc;

use arrow_array::{Array, ArrayRef, Float64Array, Int32Array, Int64Array, RecordBatch, StringArray};
use arrow_ipc::reader::FileReader;
use arrow_ipc::writer::FileWriter;
use arrow_schema::{DataType, Field, Schema};

use crate::error::SnapshotError;
use crate::model::{ResultRow, STRATUM_POSITIONS};

/// File name of the cleaned-results snapshot inside the output directory.
pub const SNAPSHOT_FILE: &str = "achilles_results.feather";

/// Distribution-statistics columns, in table order.
const DIST_COLUMNS: [&str; 9] = [
    "min_value",
    "max_value",
    "avg_value",
    "stdev_value",
    "median_value",
    "p10_value",
    "p25_value",
    "p75_value",
    "p90_value",
];

/// Provenance recorded in the snapshot's schema metadata.
#[derive(Debug, Clone, Default)]
pub struct Provenance {
    /// Redacted source identifier (connection URL without credentials).
    pub source: Option<String>,
}

/// Error unless the destination is absent or overwriting was requested.
///
/// Callers run this before any expensive work; [`write_snapshot`] runs it
/// again immediately before the final rename to close the race window
/// between the two.
pub fn guard_destination(path: &Path, force: bool) -> Result<(), SnapshotError> {
    if !force && path.exists() {
        return Err(SnapshotError::OutputExists {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Write the cleaned results table to `path`, atomically.
pub fn write_snapshot(
    path: &Path,
    rows: &[ResultRow],
    provenance: &Provenance,
    force: bool,
) -> Result<(), SnapshotError> {
    guard_destination(path, force)?;

    let schema = results_schema(provenance);
    let batch = to_record_batch(&schema, rows).map_err(|source| SnapshotError::Arrow {
        path: path.to_path_buf(),
        source,
    })?;

    let dir = match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Path::new("."),
        Some(parent) => parent,
        None => Path::new("."),
    };
    let mut staged = tempfile::Builder::new()
        .prefix("achilles_results")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|source| SnapshotError::WriteFailed {
            path: path.to_path_buf(),
            source,
        })?;

    {
        let arrow_err = |source| SnapshotError::Arrow {
            path: path.to_path_buf(),
            source,
        };
        let mut writer = FileWriter::try_new(staged.as_file_mut(), &schema).map_err(arrow_err)?;
        writer.write(&batch).map_err(arrow_err)?;
        writer.finish().map_err(arrow_err)?;
    }

    let persisted = if force {
        staged.persist(path).map(|_| ())
    } else {
        staged.persist_noclobber(path).map(|_| ())
    };
    persisted.map_err(|err| {
        if err.error.kind() == io::ErrorKind::AlreadyExists {
            SnapshotError::OutputExists {
                path: path.to_path_buf(),
            }
        } else {
            SnapshotError::WriteFailed {
                path: path.to_path_buf(),
                source: err.error,
            }
        }
    })?;

    tracing::info!(rows = rows.len(), path = %path.display(), "wrote results snapshot");
    Ok(())
}

/// Read a snapshot back into rows.
pub fn read_snapshot(path: &Path) -> Result<Vec<ResultRow>, SnapshotError> {
    let file = File::open(path).map_err(|source| SnapshotError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = FileReader::try_new(file, None).map_err(|source| SnapshotError::Arrow {
        path: path.to_path_buf(),
        source,
    })?;

    let mut rows = Vec::new();
    for batch in reader {
        let batch = batch.map_err(|source| SnapshotError::Arrow {
            path: path.to_path_buf(),
            source,
        })?;
        append_rows(&batch, path, &mut rows)?;
    }
    Ok(rows)
}

/// Read the schema metadata of a snapshot (tool name, version, source).
pub fn read_metadata(path: &Path) -> Result<HashMap<String, String>, SnapshotError> {
    let file = File::open(path).map_err(|source| SnapshotError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = FileReader::try_new(file, None).map_err(|source| SnapshotError::Arrow {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(reader.schema().metadata().clone())
}

fn results_schema(provenance: &Provenance) -> Schema {
    let mut fields = vec![Field::new("analysis_id", DataType::Int32, false)];
    for position in STRATUM_POSITIONS {
        fields.push(Field::new(
            format!("stratum_{position}"),
            DataType::Utf8,
            true,
        ));
    }
    fields.push(Field::new("count_value", DataType::Int64, false));
    for name in DIST_COLUMNS {
        fields.push(Field::new(name, DataType::Float64, true));
    }

    let mut metadata = HashMap::new();
    metadata.insert("tool".to_string(), env!("CARGO_PKG_NAME").to_string());
    metadata.insert(
        "tool_version".to_string(),
        env!("CARGO_PKG_VERSION").to_string(),
    );
    if let Some(source) = &provenance.source {
        metadata.insert("source".to_string(), source.clone());
    }
    Schema::new_with_metadata(fields, metadata)
}

fn to_record_batch(
    schema: &Schema,
    rows: &[ResultRow],
) -> Result<RecordBatch, arrow_schema::ArrowError> {
    let float_column = |get: fn(&ResultRow) -> Option<f64>| -> ArrayRef {
        Arc::new(Float64Array::from_iter(rows.iter().map(get)))
    };

    let mut columns: Vec<ArrayRef> = vec![Arc::new(Int32Array::from_iter_values(
        rows.iter().map(|r| r.analysis_id),
    ))];
    for position in STRATUM_POSITIONS {
        columns.push(Arc::new(StringArray::from_iter(
            rows.iter().map(|r| r.stratum(position)),
        )));
    }
    columns.push(Arc::new(Int64Array::from_iter_values(
        rows.iter().map(|r| r.count_value),
    )));
    columns.push(float_column(|r| r.min_value));
    columns.push(float_column(|r| r.max_value));
    columns.push(float_column(|r| r.avg_value));
    columns.push(float_column(|r| r.stdev_value));
    columns.push(float_column(|r| r.median_value));
    columns.push(float_column(|r| r.p10_value));
    columns.push(float_column(|r| r.p25_value));
    columns.push(float_column(|r| r.p75_value));
    columns.push(float_column(|r| r.p90_value));

    RecordBatch::try_new(Arc::new(schema.clone()), columns)
}

fn append_rows(
    batch: &RecordBatch,
    path: &Path,
    rows: &mut Vec<ResultRow>,
) -> Result<(), SnapshotError> {
    let analysis_id = column::<Int32Array>(batch, path, "analysis_id")?;
    let strata: Vec<&StringArray> = STRATUM_POSITIONS
        .iter()
        .map(|p| column::<StringArray>(batch, path, &format!("stratum_{p}")))
        .collect::<Result<_, _>>()?;
    let count_value = column::<Int64Array>(batch, path, "count_value")?;
    let dist: Vec<&Float64Array> = DIST_COLUMNS
        .iter()
        .map(|name| column::<Float64Array>(batch, path, name))
        .collect::<Result<_, _>>()?;

    let string_at = |array: &StringArray, i: usize| -> Option<String> {
        if array.is_null(i) {
            None
        } else {
            Some(array.value(i).to_string())
        }
    };
    let float_at = |array: &Float64Array, i: usize| -> Option<f64> {
        if array.is_null(i) {
            None
        } else {
            Some(array.value(i))
        }
    };

    for i in 0..batch.num_rows() {
        rows.push(ResultRow {
            analysis_id: analysis_id.value(i),
            stratum_1: string_at(strata[0], i),
            stratum_2: string_at(strata[1], i),
            stratum_3: string_at(strata[2], i),
            stratum_4: string_at(strata[3], i),
            stratum_5: string_at(strata[4], i),
            count_value: count_value.value(i),
            min_value: float_at(dist[0], i),
            max_value: float_at(dist[1], i),
            avg_value: float_at(dist[2], i),
            stdev_value: float_at(dist[3], i),
            median_value: float_at(dist[4], i),
            p10_value: float_at(dist[5], i),
            p25_value: float_at(dist[6], i),
            p75_value: float_at(dist[7], i),
            p90_value: float_at(dist[8], i),
        });
    }
    Ok(())
}

fn column<'a, T: 'static>(
    batch: &'a RecordBatch,
    path: &Path,
    name: &str,
) -> Result<&'a T, SnapshotError> {
    batch
        .column_by_name(name)
        .and_then(|array| array.as_any().downcast_ref::<T>())
        .ok_or_else(|| SnapshotError::ColumnMismatch {
            path: path.to_path_buf(),
            column: name.to_string(),
        })
}
