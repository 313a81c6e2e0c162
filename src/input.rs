//! Flat-file loaders for the results and concept table exports.
//!
//! The upstream database is out of scope; a run consumes CSV exports of
//! the two tables. Tool-internal statistics rows are dropped here so no
//! later stage has to think about them.

use std::path::Path;

use crate::error::InputError;
use crate::model::{ConceptRecord, ResultRow, INTERNAL_STATS_MIN_ANALYSIS_ID};

/// Load a results export, dropping tool-internal statistics rows
/// (`analysis_id >= 2_000_000`).
pub fn load_results(path: &Path) -> Result<Vec<ResultRow>, InputError> {
    let mut reader = open(path)?;
    let mut rows = Vec::new();
    let mut internal = 0usize;

    for record in reader.deserialize::<ResultRow>() {
        let row = record.map_err(|source| InputError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
        if row.analysis_id >= INTERNAL_STATS_MIN_ANALYSIS_ID {
            internal += 1;
            continue;
        }
        rows.push(row);
    }

    if internal > 0 {
        tracing::debug!(internal, "dropped tool-internal statistics rows");
    }
    tracing::debug!(rows = rows.len(), path = %path.display(), "loaded results export");
    Ok(rows)
}

/// Load a concept-table export.
pub fn load_concepts(path: &Path) -> Result<Vec<ConceptRecord>, InputError> {
    let mut reader = open(path)?;
    let mut records = Vec::new();

    for record in reader.deserialize::<ConceptRecord>() {
        records.push(record.map_err(|source| InputError::Malformed {
            path: path.to_path_buf(),
            source,
        })?);
    }

    tracing::debug!(records = records.len(), path = %path.display(), "loaded concept export");
    Ok(records)
}

fn open(path: &Path) -> Result<csv::Reader<std::fs::File>, InputError> {
    csv::Reader::from_path(path).map_err(|source| InputError::Read {
        path: path.to_path_buf(),
        source,
    })
}
