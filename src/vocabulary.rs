//! Concept vocabulary lookup built from a raw concept-table export.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::error::VocabularyError;
use crate::model::ConceptRecord;

/// A resolved vocabulary entry. The concept id is the key it was stored
/// under, so only the payload lives here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Concept {
    pub concept_name: String,
    pub domain_id: String,
}

/// Lookup table from concept id to its canonical name and domain.
///
/// Only standard (`S`), non-invalidated records are retained; everything
/// else decodes to the no-match placeholder downstream. The retained ids
/// must be unique, since they act as the join key for every coded stratum.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    concepts: HashMap<i64, Concept>,
}

impl Vocabulary {
    /// Build the lookup from raw concept records.
    ///
    /// # Errors
    ///
    /// Returns [`VocabularyError::DuplicateConceptId`] when two retained
    /// records share a concept id.
    pub fn from_records(
        records: impl IntoIterator<Item = ConceptRecord>,
    ) -> Result<Self, VocabularyError> {
        let mut concepts = HashMap::new();
        let mut dropped = 0usize;

        for record in records {
            if !record.is_standard() {
                dropped += 1;
                continue;
            }
            match concepts.entry(record.concept_id) {
                Entry::Occupied(_) => {
                    return Err(VocabularyError::DuplicateConceptId {
                        concept_id: record.concept_id,
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(Concept {
                        concept_name: record.concept_name,
                        domain_id: record.domain_id,
                    });
                }
            }
        }

        if dropped > 0 {
            tracing::debug!(dropped, "dropped non-standard or invalidated concept records");
        }

        Ok(Self { concepts })
    }

    /// Resolve one concept id.
    pub fn lookup(&self, concept_id: i64) -> Option<&Concept> {
        self.concepts.get(&concept_id)
    }

    /// Number of retained concepts.
    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    /// Whether no concepts were retained.
    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }
}
