//! Demographic presentation reshaping over a decoded results table.
//!
//! Produces the dashboard's "Table 1": one section per demographic report
//! (Age, Gender, Race, Ethnicity), each with a count and percentage column
//! and a single-cell title row on top. The displaying layer recognizes
//! title rows by the rule implemented in [`Table::is_title_row`].

use std::collections::BTreeMap;
use std::io::Write;

use crate::error::ReshapeError;
use crate::model::ResultRow;

/// Analysis id of the gender report.
pub const ANALYSIS_GENDER: i32 = 2;
/// Analysis id of the year-of-birth report that feeds the age section.
pub const ANALYSIS_BIRTH_YEAR: i32 = 3;
/// Analysis id of the race report.
pub const ANALYSIS_RACE: i32 = 4;
/// Analysis id of the ethnicity report.
pub const ANALYSIS_ETHNICITY: i32 = 5;
/// Analysis id of the combined race/ethnicity report.
pub const ANALYSIS_RACE_ETHNICITY: i32 = 12;

/// Year the study snapshot was taken. Ages derive from this constant, not
/// from the wall clock, so a re-run months later reproduces the same table.
pub const STUDY_YEAR: i32 = 2020;

/// Width of one age bucket in years.
const AGE_BUCKET_WIDTH: i32 = 10;
/// Ages under this cutoff merge into a single bucket.
const AGE_MERGE_BELOW: i32 = 40;
/// Sort key of the merged bucket; below every real bucket so ascending
/// order lists it first.
const MERGED_BUCKET_KEY: i32 = -1;

/// A column-named grid of display strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// A title row has exactly one non-empty cell.
    pub fn is_title_row(row: &[String]) -> bool {
        row.iter().filter(|cell| !cell.is_empty()).count() == 1
    }

    /// Write the table as CSV, header row included.
    pub fn write_csv<W: Write>(&self, writer: W) -> csv::Result<()> {
        let mut out = csv::Writer::from_writer(writer);
        out.write_record(&self.columns)?;
        for row in &self.rows {
            out.write_record(row)?;
        }
        out.flush()?;
        Ok(())
    }
}

/// One demographic report: a display label per row plus its count,
/// in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub rows: Vec<(String, i64)>,
}

/// Gender counts (analysis 2), labels capitalized.
pub fn gender_report(rows: &[ResultRow]) -> Report {
    simple_report(rows, ANALYSIS_GENDER)
}

/// Race counts (analysis 4), labels capitalized.
pub fn race_report(rows: &[ResultRow]) -> Report {
    simple_report(rows, ANALYSIS_RACE)
}

/// Ethnicity counts (analysis 5), labels capitalized.
pub fn ethnicity_report(rows: &[ResultRow]) -> Report {
    simple_report(rows, ANALYSIS_ETHNICITY)
}

/// One-stratum report: filter to the analysis id, capitalize the label.
fn simple_report(rows: &[ResultRow], analysis_id: i32) -> Report {
    let rows = rows
        .iter()
        .filter(|row| row.analysis_id == analysis_id)
        .map(|row| {
            let label = capitalize(row.stratum(1).unwrap_or_default());
            (label, row.count_value)
        })
        .collect();
    Report { rows }
}

/// Combined race/ethnicity counts (analysis 12), both labels capitalized.
///
/// Not part of [`table_one`]; kept for callers that chart the two-way
/// split directly.
pub fn race_ethnicity_report(rows: &[ResultRow]) -> Table {
    let mut table = Table::new(&["stratum_1", "stratum_2", "count_value"]);
    for row in rows
        .iter()
        .filter(|row| row.analysis_id == ANALYSIS_RACE_ETHNICITY)
    {
        table.rows.push(vec![
            capitalize(row.stratum(1).unwrap_or_default()),
            capitalize(row.stratum(2).unwrap_or_default()),
            row.count_value.to_string(),
        ]);
    }
    table
}

/// Age counts (analysis 3) bucketed into fixed-width bins.
///
/// The stratum holds a birth year; age is `STUDY_YEAR - year`. Ages under
/// 40 merge into a single `<40` bucket that sorts first; the rest label as
/// `40-49`, `50-59`, and so on, ascending.
pub fn age_report(rows: &[ResultRow]) -> Result<Report, ReshapeError> {
    let mut buckets: BTreeMap<i32, i64> = BTreeMap::new();

    for row in rows
        .iter()
        .filter(|row| row.analysis_id == ANALYSIS_BIRTH_YEAR)
    {
        let value = row.stratum(1).unwrap_or_default();
        let birth_year: i32 =
            value
                .trim()
                .parse()
                .map_err(|_| ReshapeError::InvalidBirthYear {
                    value: value.to_string(),
                })?;
        let age = STUDY_YEAR - birth_year;
        let key = if age < AGE_MERGE_BELOW {
            MERGED_BUCKET_KEY
        } else {
            age.div_euclid(AGE_BUCKET_WIDTH) * AGE_BUCKET_WIDTH
        };
        *buckets.entry(key).or_insert(0) += row.count_value;
    }

    let rows = buckets
        .into_iter()
        .map(|(key, count)| {
            let label = if key == MERGED_BUCKET_KEY {
                format!("<{AGE_MERGE_BELOW}")
            } else {
                format!("{}-{}", key, key + AGE_BUCKET_WIDTH - 1)
            };
            (label, count)
        })
        .collect();
    Ok(Report { rows })
}

/// Percentage strings for a count column: each row's share of the total,
/// formatted to one decimal place. An all-zero column yields `0.0` rows.
pub fn percent_strings(counts: &[i64]) -> Vec<String> {
    let total: i64 = counts.iter().sum();
    counts
        .iter()
        .map(|&count| {
            if total == 0 {
                "0.0".to_string()
            } else {
                format!("{:.1}", 100.0 * count as f64 / total as f64)
            }
        })
        .collect()
}

/// The full demographic summary: Age, Gender, Race, Ethnicity sections in
/// that order, each titled and carrying count and percentage columns.
pub fn table_one(rows: &[ResultRow]) -> Result<Table, ReshapeError> {
    let sections = [
        ("Age", age_report(rows)?),
        ("Gender", gender_report(rows)),
        ("Race", race_report(rows)),
        ("Ethnicity", ethnicity_report(rows)),
    ];

    let mut table = Table::new(&["", "N", "%"]);
    for (title, report) in sections {
        table
            .rows
            .push(vec![title.to_string(), String::new(), String::new()]);

        let counts: Vec<i64> = report.rows.iter().map(|(_, count)| *count).collect();
        let percents = percent_strings(&counts);
        for ((label, count), percent) in report.rows.into_iter().zip(percents) {
            table.rows.push(vec![label, count.to_string(), percent]);
        }
    }
    Ok(table)
}

/// First character upper-cased, the rest lower-cased.
fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{decoded_demographics, standard_row};

    #[test]
    fn test_age_bucketing() {
        // Birth year 1990 -> age 30 -> merged bucket; 1960 -> 60 -> 60-69.
        let rows = vec![
            standard_row(ANALYSIS_BIRTH_YEAR, &["1990"], 10),
            standard_row(ANALYSIS_BIRTH_YEAR, &["1960"], 20),
        ];
        let report = age_report(&rows).unwrap();
        assert_eq!(
            report.rows,
            vec![("<40".to_string(), 10), ("60-69".to_string(), 20)]
        );
    }

    #[test]
    fn test_age_buckets_merge_and_sort() {
        let rows = vec![
            standard_row(ANALYSIS_BIRTH_YEAR, &["1945"], 1), // 75 -> 70-79
            standard_row(ANALYSIS_BIRTH_YEAR, &["1995"], 2), // 25 -> <40
            standard_row(ANALYSIS_BIRTH_YEAR, &["1985"], 3), // 35 -> <40
            standard_row(ANALYSIS_BIRTH_YEAR, &["1970"], 4), // 50 -> 50-59
        ];
        let report = age_report(&rows).unwrap();
        assert_eq!(
            report.rows,
            vec![
                ("<40".to_string(), 5),
                ("50-59".to_string(), 4),
                ("70-79".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_age_report_rejects_non_numeric_year() {
        let rows = vec![standard_row(ANALYSIS_BIRTH_YEAR, &["unknown"], 1)];
        let err = age_report(&rows).unwrap_err();
        assert!(matches!(err, ReshapeError::InvalidBirthYear { .. }));
    }

    #[test]
    fn test_simple_report_capitalizes() {
        let rows = vec![
            standard_row(ANALYSIS_GENDER, &["MALE"], 460),
            standard_row(ANALYSIS_GENDER, &["female"], 540),
        ];
        let report = gender_report(&rows);
        assert_eq!(
            report.rows,
            vec![("Male".to_string(), 460), ("Female".to_string(), 540)]
        );
    }

    #[test]
    fn test_percent_strings() {
        assert_eq!(percent_strings(&[30, 70]), vec!["30.0", "70.0"]);
        assert_eq!(percent_strings(&[1, 2]), vec!["33.3", "66.7"]);
        assert_eq!(percent_strings(&[0, 0]), vec!["0.0", "0.0"]);
        assert!(percent_strings(&[]).is_empty());
    }

    #[test]
    fn test_title_row_rule() {
        assert!(Table::is_title_row(&[
            "Age".to_string(),
            String::new(),
            String::new()
        ]));
        assert!(!Table::is_title_row(&[
            "Male".to_string(),
            "460".to_string(),
            "46.0".to_string()
        ]));
        assert!(!Table::is_title_row(&[String::new(), String::new()]));
    }

    #[test]
    fn test_table_one_sections_in_order() {
        let table = table_one(&decoded_demographics()).unwrap();
        assert_eq!(table.columns, vec!["", "N", "%"]);

        let titles: Vec<&str> = table
            .rows
            .iter()
            .filter(|row| Table::is_title_row(row))
            .map(|row| row[0].as_str())
            .collect();
        assert_eq!(titles, vec!["Age", "Gender", "Race", "Ethnicity"]);
    }

    #[test]
    fn test_table_one_counts_and_percents() {
        let table = table_one(&decoded_demographics()).unwrap();

        let gender_title = table
            .rows
            .iter()
            .position(|row| row[0] == "Gender")
            .unwrap();
        assert_eq!(
            table.rows[gender_title + 1],
            vec!["Male".to_string(), "460".to_string(), "46.0".to_string()]
        );
        assert_eq!(
            table.rows[gender_title + 2],
            vec!["Female".to_string(), "540".to_string(), "54.0".to_string()]
        );
    }

    #[test]
    fn test_race_ethnicity_report_keeps_both_strata() {
        let rows = vec![standard_row(
            ANALYSIS_RACE_ETHNICITY,
            &["WHITE", "not hispanic or latino"],
            650,
        )];
        let table = race_ethnicity_report(&rows);
        assert_eq!(
            table.rows,
            vec![vec![
                "White".to_string(),
                "Not hispanic or latino".to_string(),
                "650".to_string()
            ]]
        );
    }

    #[test]
    fn test_table_csv_output() {
        let table = table_one(&decoded_demographics()).unwrap();
        let mut buffer = Vec::new();
        table.write_csv(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(",N,%"));
        assert_eq!(lines.next(), Some("Age,,"));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("MALE"), "Male");
        assert_eq!(capitalize("male"), "Male");
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("no matching concept"), "No matching concept");
    }
}
