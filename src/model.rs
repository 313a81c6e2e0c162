//! Record types for the three tabular inputs: the Achilles results table,
//! the analysis-details reference, and the OMOP concept table.
//!
//! Field names follow the source table columns so the CSV exports
//! deserialize without any header mapping (the analysis-details reference
//! ships with upper-case headers and is renamed explicitly).

use serde::{Deserialize, Serialize};

/// Analysis ids at or above this value are Achilles-internal statistics and
/// are excluded from every run.
pub const INTERNAL_STATS_MIN_ANALYSIS_ID: i32 = 2_000_000;

/// The five stratum positions of a results row, 1-based as in the source
/// table's `stratum_1`..`stratum_5` columns.
pub const STRATUM_POSITIONS: [usize; 5] = [1, 2, 3, 4, 5];

/// One row of the Achilles results table.
///
/// The standard results export carries the first seven columns; the
/// distribution export adds nine summary statistics. Both shapes
/// deserialize into this struct, with absent statistics left as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub analysis_id: i32,
    pub stratum_1: Option<String>,
    pub stratum_2: Option<String>,
    pub stratum_3: Option<String>,
    pub stratum_4: Option<String>,
    pub stratum_5: Option<String>,
    pub count_value: i64,
    #[serde(default)]
    pub min_value: Option<f64>,
    #[serde(default)]
    pub max_value: Option<f64>,
    #[serde(default)]
    pub avg_value: Option<f64>,
    #[serde(default)]
    pub stdev_value: Option<f64>,
    #[serde(default)]
    pub median_value: Option<f64>,
    #[serde(default)]
    pub p10_value: Option<f64>,
    #[serde(default)]
    pub p25_value: Option<f64>,
    #[serde(default)]
    pub p75_value: Option<f64>,
    #[serde(default)]
    pub p90_value: Option<f64>,
}

impl ResultRow {
    /// Read one stratum value by 1-based position.
    ///
    /// # Panics
    ///
    /// Panics if `position` is outside `1..=5`.
    pub fn stratum(&self, position: usize) -> Option<&str> {
        match position {
            1 => self.stratum_1.as_deref(),
            2 => self.stratum_2.as_deref(),
            3 => self.stratum_3.as_deref(),
            4 => self.stratum_4.as_deref(),
            5 => self.stratum_5.as_deref(),
            _ => panic!("stratum position out of range: {position}"),
        }
    }

    /// Replace one stratum value by 1-based position.
    ///
    /// # Panics
    ///
    /// Panics if `position` is outside `1..=5`.
    pub fn set_stratum(&mut self, position: usize, value: String) {
        let slot = match position {
            1 => &mut self.stratum_1,
            2 => &mut self.stratum_2,
            3 => &mut self.stratum_3,
            4 => &mut self.stratum_4,
            5 => &mut self.stratum_5,
            _ => panic!("stratum position out of range: {position}"),
        };
        *slot = Some(value);
    }
}

/// One row of the analysis-details reference: the declared meaning of each
/// stratum position for one analysis id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisDetail {
    #[serde(rename = "ANALYSIS_ID")]
    pub analysis_id: i32,
    #[serde(rename = "STRATUM_1_NAME")]
    pub stratum_1_name: Option<String>,
    #[serde(rename = "STRATUM_2_NAME")]
    pub stratum_2_name: Option<String>,
    #[serde(rename = "STRATUM_3_NAME")]
    pub stratum_3_name: Option<String>,
    #[serde(rename = "STRATUM_4_NAME")]
    pub stratum_4_name: Option<String>,
    #[serde(rename = "STRATUM_5_NAME")]
    pub stratum_5_name: Option<String>,
}

impl AnalysisDetail {
    /// Declared name of one stratum position, 1-based.
    ///
    /// # Panics
    ///
    /// Panics if `position` is outside `1..=5`.
    pub fn stratum_name(&self, position: usize) -> Option<&str> {
        match position {
            1 => self.stratum_1_name.as_deref(),
            2 => self.stratum_2_name.as_deref(),
            3 => self.stratum_3_name.as_deref(),
            4 => self.stratum_4_name.as_deref(),
            5 => self.stratum_5_name.as_deref(),
            _ => panic!("stratum position out of range: {position}"),
        }
    }
}

/// One raw row of the OMOP concept table export.
///
/// Only standard, non-invalidated concepts participate in decoding; the
/// filter lives in [`crate::vocabulary::Vocabulary::from_records`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptRecord {
    pub concept_id: i64,
    pub concept_name: String,
    pub domain_id: String,
    pub standard_concept: Option<String>,
    pub invalid_reason: Option<String>,
}

impl ConceptRecord {
    /// Whether this record is a standard, currently-valid concept.
    pub fn is_standard(&self) -> bool {
        self.standard_concept.as_deref() == Some("S")
            && self.invalid_reason.as_deref().is_none_or(str::is_empty)
    }
}
