//! Results-table decoding: concept-id resolution against the vocabulary.
//!
//! The pass works on a complete in-memory snapshot of the results table.
//! Stratum values classified as concept-coded are validated (digits or
//! empty, nothing else), collected into one de-duplicated candidate set,
//! bounds-checked, and then replaced by their canonical concept names.
//! Everything else passes through byte-for-byte.

use std::collections::BTreeSet;

use crate::error::DecodeError;
use crate::model::{ResultRow, STRATUM_POSITIONS};
use crate::schema_ref::AnalysisCatalog;
use crate::vocabulary::Vocabulary;

/// Soft bound on the candidate concept-id set; crossing it logs a warning.
pub const CONCEPT_SET_WARN: usize = 20_000;
/// Hard bound on the candidate concept-id set; crossing it aborts the run.
pub const CONCEPT_SET_LIMIT: usize = 100_000;

/// Replacement label for coded values with no vocabulary match.
pub const NO_MATCHING_CONCEPT: &str = "No matching concept";

/// Counters describing one decode pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeSummary {
    /// Rows in the decoded table.
    pub rows: usize,
    /// Distinct concept ids referenced by coded strata.
    pub candidate_concepts: usize,
    /// Candidates with a vocabulary match.
    pub resolved_concepts: usize,
    /// Stratum cells that fell back to the no-match placeholder.
    pub unmatched_cells: usize,
}

/// A decoded results table plus its pass counters.
#[derive(Debug)]
pub struct DecodeOutput {
    pub rows: Vec<ResultRow>,
    pub summary: DecodeSummary,
}

/// One-shot decoder over a results snapshot.
pub struct ResultDecoder<'a> {
    catalog: &'a AnalysisCatalog,
    vocabulary: &'a Vocabulary,
}

impl<'a> ResultDecoder<'a> {
    pub fn new(catalog: &'a AnalysisCatalog, vocabulary: &'a Vocabulary) -> Self {
        Self {
            catalog,
            vocabulary,
        }
    }

    /// Decode a results snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::NonNumericStratum`] when a coded, non-empty
    /// stratum value contains anything but decimal digits, and
    /// [`DecodeError::TooManyConcepts`] when the candidate set exceeds
    /// [`CONCEPT_SET_LIMIT`]. Both abort the run; no partial output exists.
    pub fn decode(&self, mut rows: Vec<ResultRow>) -> Result<DecodeOutput, DecodeError> {
        let candidates = self.collect_candidates(&rows)?;

        if candidates.len() >= CONCEPT_SET_WARN {
            tracing::warn!(
                candidates = candidates.len(),
                "candidate concept set is large; vocabulary resolution may be slow"
            );
        }
        if candidates.len() > CONCEPT_SET_LIMIT {
            return Err(DecodeError::TooManyConcepts {
                count: candidates.len(),
                limit: CONCEPT_SET_LIMIT,
            });
        }

        let resolved_concepts = candidates
            .iter()
            .filter(|id| self.vocabulary.lookup(**id).is_some())
            .count();

        let mut unmatched_cells = 0usize;
        for row in &mut rows {
            for position in STRATUM_POSITIONS {
                // Validated digits-or-skip in the collection pass.
                let Some(concept_id) = self.coded_value(row, position) else {
                    continue;
                };
                let name = match self.vocabulary.lookup(concept_id) {
                    Some(concept) => concept.concept_name.clone(),
                    None => {
                        unmatched_cells += 1;
                        NO_MATCHING_CONCEPT.to_string()
                    }
                };
                row.set_stratum(position, name);
            }
        }

        let summary = DecodeSummary {
            rows: rows.len(),
            candidate_concepts: candidates.len(),
            resolved_concepts,
            unmatched_cells,
        };
        Ok(DecodeOutput { rows, summary })
    }

    /// Union of all concept ids referenced by coded, non-empty strata.
    ///
    /// This is also the integrity gate: every coded, non-empty value must
    /// be a string of decimal digits.
    fn collect_candidates(&self, rows: &[ResultRow]) -> Result<BTreeSet<i64>, DecodeError> {
        let mut candidates = BTreeSet::new();
        for row in rows {
            for position in STRATUM_POSITIONS {
                let Some(value) = row.stratum(position) else {
                    continue;
                };
                if value.is_empty() || !self.catalog.is_coded(row.analysis_id, position) {
                    continue;
                }
                let concept_id =
                    parse_concept_id(value).ok_or_else(|| DecodeError::NonNumericStratum {
                        analysis_id: row.analysis_id,
                        position,
                        value: value.to_string(),
                    })?;
                candidates.insert(concept_id);
            }
        }
        Ok(candidates)
    }

    /// The already-validated concept id of a coded, non-empty stratum cell,
    /// or `None` when the cell is non-coded or empty.
    fn coded_value(&self, row: &ResultRow, position: usize) -> Option<i64> {
        let value = row.stratum(position)?;
        if value.is_empty() || !self.catalog.is_coded(row.analysis_id, position) {
            return None;
        }
        parse_concept_id(value)
    }
}

/// Parse a stratum value as a concept id: decimal digits only, nothing
/// else. Ids too large for `i64` are rejected the same way; no vocabulary
/// uses them and letting them through would corrupt the candidate set.
fn parse_concept_id(value: &str) -> Option<i64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}
