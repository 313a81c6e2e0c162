//! Summary-table runs over a decoded snapshot
//!
//! Covers the snapshot-to-CSV path: write a decoded snapshot, reshape it
//! through the batch entry point, and check the emitted table against the
//! title-row rule the displaying layer relies on.

use achilles_decoder::batch::{run_table_one, TableOneArgs};
use achilles_decoder::reshape::Table;
use achilles_decoder::snapshot::{write_snapshot, Provenance, SNAPSHOT_FILE};
use achilles_decoder::test_fixtures::decoded_demographics;
use tempfile::TempDir;

fn written_snapshot(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join(SNAPSHOT_FILE);
    write_snapshot(&path, &decoded_demographics(), &Provenance::default(), false)
        .expect("write snapshot");
    path
}

fn read_table(path: &std::path::Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .expect("open table csv");
    let columns = reader
        .headers()
        .expect("headers")
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .records()
        .map(|record| {
            record
                .expect("record")
                .iter()
                .map(str::to_string)
                .collect()
        })
        .collect();
    (columns, rows)
}

#[test]
fn test_table_one_csv_structure() {
    let dir = TempDir::new().unwrap();
    let snapshot_path = written_snapshot(&dir);
    let output_path = dir.path().join("table1.csv");

    run_table_one(TableOneArgs {
        snapshot_path,
        output: Some(output_path.clone()),
    })
    .expect("summary run");

    let (columns, rows) = read_table(&output_path);
    assert_eq!(columns, vec!["", "N", "%"]);

    let titles: Vec<&str> = rows
        .iter()
        .filter(|row| Table::is_title_row(row))
        .map(|row| row[0].as_str())
        .collect();
    assert_eq!(titles, vec!["Age", "Gender", "Race", "Ethnicity"]);
}

#[test]
fn test_table_one_csv_values() {
    let dir = TempDir::new().unwrap();
    let snapshot_path = written_snapshot(&dir);
    let output_path = dir.path().join("table1.csv");

    run_table_one(TableOneArgs {
        snapshot_path,
        output: Some(output_path.clone()),
    })
    .expect("summary run");

    let (_, rows) = read_table(&output_path);

    // Ages: 1950 -> 70-79, 1975 -> 40-49, 1990 -> <40; merged bucket first.
    let age_title = rows.iter().position(|row| row[0] == "Age").unwrap();
    assert_eq!(rows[age_title + 1], vec!["<40", "300", "30.0"]);
    assert_eq!(rows[age_title + 2], vec!["40-49", "400", "40.0"]);
    assert_eq!(rows[age_title + 3], vec!["70-79", "300", "30.0"]);

    let gender_title = rows.iter().position(|row| row[0] == "Gender").unwrap();
    assert_eq!(rows[gender_title + 1], vec!["Male", "460", "46.0"]);
    assert_eq!(rows[gender_title + 2], vec!["Female", "540", "54.0"]);
}

#[test]
fn test_every_data_row_sits_under_a_title() {
    let dir = TempDir::new().unwrap();
    let snapshot_path = written_snapshot(&dir);
    let output_path = dir.path().join("table1.csv");

    run_table_one(TableOneArgs {
        snapshot_path,
        output: Some(output_path.clone()),
    })
    .expect("summary run");

    let (_, rows) = read_table(&output_path);
    assert!(Table::is_title_row(&rows[0]), "table must open with a title");
    for row in rows.iter().filter(|row| !Table::is_title_row(row)) {
        assert_eq!(row.len(), 3);
        assert!(row[1].parse::<i64>().is_ok(), "count column: {row:?}");
        assert!(row[2].parse::<f64>().is_ok(), "percent column: {row:?}");
    }
}
