//! Stratum classification from the static analysis-details reference.
//!
//! Achilles declares, per analysis id, what each of the five stratum
//! positions holds. Most positions hold vocabulary concept ids, but a fixed
//! set of declared names mark positions that hold literal values instead
//! (ages, calendar periods, zip codes, table names, ...). The decoder must
//! never try to resolve those against the vocabulary.

use std::collections::HashMap;
use std::path::Path;

use crate::error::InputError;
use crate::model::{AnalysisDetail, STRATUM_POSITIONS};

/// File name of the analysis-details reference inside the schema directory.
pub const ANALYSIS_DETAILS_FILE: &str = "achilles_analysis_details.csv";

/// Semantic kind of one stratum position, derived from its declared name.
///
/// The mapping is total: every declared name (or its absence) lands on
/// exactly one kind. Declared names the catalog does not recognize are
/// assumed to be concept-coded, which matches how Achilles names its
/// concept strata (they carry free-form names like `gender_concept_id`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StratumKind {
    /// Vocabulary concept id; the only kind the decoder resolves.
    Concept,
    /// Year of birth, age, or age decile.
    Age,
    /// Calendar month or calendar year.
    Calendar,
    /// Payer-plan / observation period lengths and period counts.
    PeriodLength,
    /// 3-digit zip or state.
    Geography,
    /// Name of a source table.
    TableName,
    /// Verbatim source value carried through from the source system.
    SourceValue,
    /// No name declared for this position.
    Unset,
}

impl StratumKind {
    /// Classify a declared stratum name.
    ///
    /// Matching is over the trimmed, lower-cased name; the reference file
    /// is inconsistent about case and spacing for several entries.
    pub fn from_name(name: Option<&str>) -> Self {
        let Some(name) = name else {
            return StratumKind::Unset;
        };
        match name.trim().to_lowercase().as_str() {
            "" => StratumKind::Unset,
            "year_of_birth" | "age" | "age_decile" | "age decile" => StratumKind::Age,
            "calendar_month" | "calendar month" | "calendar year" => StratumKind::Calendar,
            "payer plan period length 30d increments"
            | "observation period length 30d increments"
            | "number of observation periods"
            | "number of payer plan periods" => StratumKind::PeriodLength,
            "3-digit zip" | "state" => StratumKind::Geography,
            "table name" | "table_name" => StratumKind::TableName,
            "source_value" => StratumKind::SourceValue,
            _ => StratumKind::Concept,
        }
    }

    /// Whether values in a stratum of this kind are concept ids.
    pub fn is_coded(self) -> bool {
        matches!(self, StratumKind::Concept)
    }
}

/// Per-analysis stratum classification, built once per run from the
/// analysis-details reference.
#[derive(Debug, Clone)]
pub struct AnalysisCatalog {
    kinds: HashMap<i32, [StratumKind; 5]>,
}

impl AnalysisCatalog {
    /// Build the catalog from already-loaded detail rows.
    pub fn from_details(details: impl IntoIterator<Item = AnalysisDetail>) -> Self {
        let kinds = details
            .into_iter()
            .map(|detail| {
                let kinds =
                    STRATUM_POSITIONS.map(|p| StratumKind::from_name(detail.stratum_name(p)));
                (detail.analysis_id, kinds)
            })
            .collect();
        Self { kinds }
    }

    /// Load the catalog from `achilles_analysis_details.csv` inside
    /// `schema_dir`.
    pub fn load(schema_dir: &Path) -> Result<Self, InputError> {
        Self::from_csv_path(&schema_dir.join(ANALYSIS_DETAILS_FILE))
    }

    /// Load the catalog from an explicit reference file path.
    pub fn from_csv_path(path: &Path) -> Result<Self, InputError> {
        let mut reader = csv::Reader::from_path(path).map_err(|source| InputError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut details = Vec::new();
        for record in reader.deserialize::<AnalysisDetail>() {
            details.push(record.map_err(|source| InputError::Malformed {
                path: path.to_path_buf(),
                source,
            })?);
        }
        tracing::debug!(analyses = details.len(), "loaded analysis-details reference");

        Ok(Self::from_details(details))
    }

    /// Classification of one stratum position of one analysis.
    ///
    /// Analyses absent from the reference have no declared names at all, so
    /// every position classifies as [`StratumKind::Unset`].
    pub fn stratum_kind(&self, analysis_id: i32, position: usize) -> StratumKind {
        assert!(
            (1..=5).contains(&position),
            "stratum position out of range: {position}"
        );
        self.kinds
            .get(&analysis_id)
            .map_or(StratumKind::Unset, |kinds| kinds[position - 1])
    }

    /// Whether one stratum position of one analysis holds concept ids.
    pub fn is_coded(&self, analysis_id: i32, position: usize) -> bool {
        self.stratum_kind(analysis_id, position).is_coded()
    }

    /// Number of analyses in the catalog.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Whether the catalog holds no analyses.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}
