//! Batch entry points: one complete snapshot in, one artifact out.
//!
//! Everything a run needs arrives through its args struct; nothing is
//! loaded at module scope and nothing survives the call.

use std::fs;
use std::io;
use std::path::PathBuf;

use crate::decoder::ResultDecoder;
use crate::error::Result;
use crate::input;
use crate::metrics::BatchMetrics;
use crate::reshape;
use crate::schema_ref::AnalysisCatalog;
use crate::snapshot::{self, Provenance, SNAPSHOT_FILE};
use crate::vocabulary::Vocabulary;

#[derive(Debug)]
pub struct DecodeArgs {
    /// Results-table CSV export
    pub results_path: PathBuf,
    /// Concept-table CSV export
    pub concepts_path: PathBuf,
    /// Directory holding the analysis-details reference
    pub schema_dir: PathBuf,
    /// Directory the snapshot lands in
    pub out_dir: PathBuf,
    /// Overwrite an existing snapshot
    pub force: bool,
    /// Redacted source identifier for snapshot provenance
    pub source: Option<String>,
}

/// Decode a results export and write the cleaned snapshot.
pub fn run_decode(args: DecodeArgs) -> Result<()> {
    tracing::info!("Starting decode run");
    tracing::info!("Results export: {:?}", args.results_path);
    tracing::info!("Concept export: {:?}", args.concepts_path);
    tracing::info!("Output directory: {:?}", args.out_dir);

    let mut metrics = BatchMetrics::new();
    let destination = args.out_dir.join(SNAPSHOT_FILE);

    // Before we do anything, check that we are not going to fall at the
    // last hurdle. The writer re-checks right before the rename.
    snapshot::guard_destination(&destination, args.force)?;

    let catalog = metrics.time_stage("schema_load", || AnalysisCatalog::load(&args.schema_dir))?;
    let results = metrics.time_stage("results_load", || input::load_results(&args.results_path))?;
    metrics.rows_in = results.len() as u64;

    let concepts =
        metrics.time_stage("concepts_load", || input::load_concepts(&args.concepts_path))?;
    let vocabulary =
        metrics.time_stage("vocabulary_build", || Vocabulary::from_records(concepts))?;
    tracing::info!(
        analyses = catalog.len(),
        concepts = vocabulary.len(),
        "reference data ready"
    );

    let decoder = ResultDecoder::new(&catalog, &vocabulary);
    let output = metrics.time_stage("decode", || decoder.decode(results))?;
    metrics.rows_out = output.summary.rows as u64;
    metrics.candidate_concepts = output.summary.candidate_concepts as u64;
    metrics.resolved_concepts = output.summary.resolved_concepts as u64;
    metrics.unmatched_cells = output.summary.unmatched_cells as u64;

    fs::create_dir_all(&args.out_dir)?;
    let provenance = Provenance {
        source: args.source,
    };
    metrics.time_stage("snapshot_write", || {
        snapshot::write_snapshot(&destination, &output.rows, &provenance, args.force)
    })?;

    metrics.log_summary();
    Ok(())
}

#[derive(Debug)]
pub struct TableOneArgs {
    /// Decoded snapshot to reshape
    pub snapshot_path: PathBuf,
    /// CSV destination; stdout when absent
    pub output: Option<PathBuf>,
}

/// Reshape a decoded snapshot into the demographic summary table.
pub fn run_table_one(args: TableOneArgs) -> Result<()> {
    tracing::info!("Reading snapshot: {:?}", args.snapshot_path);
    let rows = snapshot::read_snapshot(&args.snapshot_path)?;
    let table = reshape::table_one(&rows)?;

    match &args.output {
        Some(path) => {
            let file = fs::File::create(path)?;
            table.write_csv(file).map_err(io::Error::from)?;
            tracing::info!(rows = table.rows.len(), path = %path.display(), "wrote summary table");
        }
        None => {
            table
                .write_csv(io::stdout().lock())
                .map_err(io::Error::from)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{
        concepts_csv, raw_demographics, results_csv, sample_concepts, sample_details, schema_dir,
    };
    use tempfile::TempDir;

    fn decode_args(out_dir: &TempDir, force: bool) -> (DecodeArgs, Vec<tempfile::NamedTempFile>, TempDir) {
        let results = results_csv(&raw_demographics());
        let concepts = concepts_csv(&sample_concepts());
        let schema = schema_dir(&sample_details());
        let args = DecodeArgs {
            results_path: results.path().to_path_buf(),
            concepts_path: concepts.path().to_path_buf(),
            schema_dir: schema.path().to_path_buf(),
            out_dir: out_dir.path().to_path_buf(),
            force,
            source: None,
        };
        (args, vec![results, concepts], schema)
    }

    #[test]
    fn test_run_decode_writes_snapshot() {
        let out_dir = TempDir::new().unwrap();
        let (args, _files, _schema) = decode_args(&out_dir, false);
        run_decode(args).unwrap();

        let rows = snapshot::read_snapshot(&out_dir.path().join(SNAPSHOT_FILE)).unwrap();
        assert_eq!(rows.len(), raw_demographics().len());
        assert!(rows
            .iter()
            .any(|row| row.stratum_1.as_deref() == Some("Male")));
    }

    #[test]
    fn test_run_decode_refuses_existing_snapshot() {
        let out_dir = TempDir::new().unwrap();
        std::fs::write(out_dir.path().join(SNAPSHOT_FILE), b"existing").unwrap();

        let (args, _files, _schema) = decode_args(&out_dir, false);
        let err = run_decode(args).unwrap_err();
        assert!(err.recovery_hint().unwrap().contains("--force"));
    }

    #[test]
    fn test_run_decode_force_overwrites() {
        let out_dir = TempDir::new().unwrap();
        std::fs::write(out_dir.path().join(SNAPSHOT_FILE), b"existing").unwrap();

        let (args, _files, _schema) = decode_args(&out_dir, true);
        run_decode(args).unwrap();

        let rows = snapshot::read_snapshot(&out_dir.path().join(SNAPSHOT_FILE)).unwrap();
        assert!(!rows.is_empty());
    }
}
