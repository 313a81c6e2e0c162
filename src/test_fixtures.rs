//! Synthetic tabular fixtures for development and testing
//!
//! This module provides deterministic results rows, analysis details, and
//! concept records with known properties, allowing testing without
//! committing database exports to the repository.

use std::fs;
use std::path::Path;

use tempfile::{NamedTempFile, TempDir};

use crate::model::{AnalysisDetail, ConceptRecord, ResultRow};
use crate::schema_ref::{AnalysisCatalog, ANALYSIS_DETAILS_FILE};
use crate::vocabulary::Vocabulary;

/// Build a standard results row with up to five stratum values.
///
/// Positions beyond `strata.len()` stay absent; distribution statistics
/// stay unset.
///
/// # Example
/// ```
/// use achilles_decoder::test_fixtures::standard_row;
/// let row = standard_row(2, &["8507"], 1000);
/// assert_eq!(row.stratum(1), Some("8507"));
/// assert_eq!(row.stratum(2), None);
/// ```
pub fn standard_row(analysis_id: i32, strata: &[&str], count_value: i64) -> ResultRow {
    assert!(strata.len() <= 5, "at most five stratum values");
    let stratum = |i: usize| strata.get(i).map(|s| s.to_string());
    ResultRow {
        analysis_id,
        stratum_1: stratum(0),
        stratum_2: stratum(1),
        stratum_3: stratum(2),
        stratum_4: stratum(3),
        stratum_5: stratum(4),
        count_value,
        min_value: None,
        max_value: None,
        avg_value: None,
        stdev_value: None,
        median_value: None,
        p10_value: None,
        p25_value: None,
        p75_value: None,
        p90_value: None,
    }
}

fn detail(analysis_id: i32, names: [Option<&str>; 5]) -> AnalysisDetail {
    AnalysisDetail {
        analysis_id,
        stratum_1_name: names[0].map(str::to_string),
        stratum_2_name: names[1].map(str::to_string),
        stratum_3_name: names[2].map(str::to_string),
        stratum_4_name: names[3].map(str::to_string),
        stratum_5_name: names[4].map(str::to_string),
    }
}

/// Analysis-details rows covering the demographic analyses plus
/// representative non-coded strata (birth year, zip, state, calendar).
pub fn sample_details() -> Vec<AnalysisDetail> {
    vec![
        detail(0, [None, None, None, None, None]),
        detail(2, [Some("gender_concept_id"), None, None, None, None]),
        detail(3, [Some("year_of_birth"), None, None, None, None]),
        detail(4, [Some("race_concept_id"), None, None, None, None]),
        detail(5, [Some("ethnicity_concept_id"), None, None, None, None]),
        detail(
            12,
            [
                Some("race_concept_id"),
                Some("ethnicity_concept_id"),
                None,
                None,
                None,
            ],
        ),
        detail(109, [Some("calendar month"), None, None, None, None]),
        detail(1100, [Some("3-digit zip"), None, None, None, None]),
        detail(1101, [Some("state"), None, None, None, None]),
    ]
}

/// Catalog built from [`sample_details`].
pub fn sample_catalog() -> AnalysisCatalog {
    AnalysisCatalog::from_details(sample_details())
}

fn concept(concept_id: i64, name: &str, domain_id: &str) -> ConceptRecord {
    ConceptRecord {
        concept_id,
        concept_name: name.to_string(),
        domain_id: domain_id.to_string(),
        standard_concept: Some("S".to_string()),
        invalid_reason: None,
    }
}

/// Concept records for the demographic vocabulary subset.
pub fn sample_concepts() -> Vec<ConceptRecord> {
    vec![
        concept(8507, "Male", "Gender"),
        concept(8532, "Female", "Gender"),
        concept(8527, "White", "Race"),
        concept(8516, "Black or African American", "Race"),
        concept(38003563, "Hispanic or Latino", "Ethnicity"),
        concept(38003564, "Not Hispanic or Latino", "Ethnicity"),
    ]
}

/// Vocabulary built from [`sample_concepts`].
pub fn sample_vocabulary() -> Vocabulary {
    Vocabulary::from_records(sample_concepts()).expect("sample concepts are unique")
}

/// A small raw results snapshot: coded demographics plus non-coded birth
/// years, matching [`sample_catalog`] and [`sample_vocabulary`].
pub fn raw_demographics() -> Vec<ResultRow> {
    vec![
        standard_row(0, &[], 1000),
        standard_row(2, &["8507"], 460),
        standard_row(2, &["8532"], 540),
        standard_row(3, &["1950"], 300),
        standard_row(3, &["1975"], 400),
        standard_row(3, &["1990"], 300),
        standard_row(4, &["8527"], 700),
        standard_row(4, &["8516"], 300),
        standard_row(5, &["38003563"], 200),
        standard_row(5, &["38003564"], 800),
        standard_row(1100, &["941"], 25),
    ]
}

/// The decoded form of [`raw_demographics`]: what the reshaper consumes.
pub fn decoded_demographics() -> Vec<ResultRow> {
    vec![
        standard_row(0, &[], 1000),
        standard_row(2, &["Male"], 460),
        standard_row(2, &["Female"], 540),
        standard_row(3, &["1950"], 300),
        standard_row(3, &["1975"], 400),
        standard_row(3, &["1990"], 300),
        standard_row(4, &["White"], 700),
        standard_row(4, &["Black or African American"], 300),
        standard_row(5, &["Hispanic or Latino"], 200),
        standard_row(5, &["Not Hispanic or Latino"], 800),
        standard_row(1100, &["941"], 25),
    ]
}

/// Write rows to a temporary results CSV (the standard-export shape).
pub fn results_csv(rows: &[ResultRow]) -> NamedTempFile {
    let file = NamedTempFile::new().expect("create temp results csv");
    write_csv(file.path(), rows);
    file
}

/// Write records to a temporary concept-table CSV.
pub fn concepts_csv(records: &[ConceptRecord]) -> NamedTempFile {
    let file = NamedTempFile::new().expect("create temp concepts csv");
    write_csv(file.path(), records);
    file
}

/// Create a temporary schema directory holding the analysis-details
/// reference file.
pub fn schema_dir(details: &[AnalysisDetail]) -> TempDir {
    let dir = TempDir::new().expect("create temp schema dir");
    write_csv(&dir.path().join(ANALYSIS_DETAILS_FILE), details);
    dir
}

fn write_csv<T: serde::Serialize>(path: &Path, records: &[T]) {
    let mut writer = csv::Writer::from_path(path).expect("open csv for writing");
    for record in records {
        writer.serialize(record).expect("serialize csv record");
    }
    writer.flush().expect("flush csv");
    // Writer::from_path buffers through a File that closes on drop.
    drop(writer);
    assert!(fs::metadata(path).expect("csv written").len() > 0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_and_decoded_fixtures_align() {
        let raw = raw_demographics();
        let decoded = decoded_demographics();
        assert_eq!(raw.len(), decoded.len());
        for (r, d) in raw.iter().zip(&decoded) {
            assert_eq!(r.analysis_id, d.analysis_id);
            assert_eq!(r.count_value, d.count_value);
        }
    }

    #[test]
    fn test_csv_fixtures_round_trip() {
        let rows = raw_demographics();
        let file = results_csv(&rows);

        let mut reader = csv::Reader::from_path(file.path()).unwrap();
        let back: Vec<ResultRow> = reader.deserialize().map(Result::unwrap).collect();
        assert_eq!(back, rows);
    }
}
