// Pipeline entry point: reconcile per-extractor reference lists into one
// authoritative set.

use refmerge_common::{ExtractionSet, PriorTable, Reference, Result};
use tracing::{debug, info};

use crate::align::align_records;
use crate::arbitrate::arbitrate_all;
use crate::beliefs::validate;
use crate::normalize::{filter_records, normalize_records};

/// Minimum record score for a merged reference to survive filtering.
pub const SCORE_THRESHOLD: f64 = 0.5;

/// Normalize every extractor's list, preserving extraction-set order.
///
/// This also yields the cleaned-up raw lists a caller hands to storage for
/// audit, so normalization is applied exactly once.
pub fn normalize_extractions(records: &ExtractionSet) -> ExtractionSet {
    records
        .iter()
        .map(|(extractor, list)| (extractor.clone(), normalize_records(list.clone())))
        .collect()
}

/// Merge extracted references into a single authoritative set.
///
/// The per-extractor lists are normalized, aligned into groups describing
/// the same citation, belief-scored per field, arbitrated against the prior
/// table, and filtered at [`SCORE_THRESHOLD`]. Returns the retained
/// references and their aggregate score (0.0 when nothing passes).
pub fn merge_records(
    records: &ExtractionSet,
    priors: &PriorTable,
) -> Result<(Vec<Reference>, f64)> {
    let normalized = normalize_extractions(records);

    let aligned = align_records(&normalized);
    debug!(
        extractions = normalized.len(),
        groups = aligned.len(),
        "aligned extraction records"
    );

    let beliefs = validate(&aligned);
    let arbitrated = arbitrate_all(&aligned, &beliefs, priors)?;
    let (references, score) = filter_records(arbitrated, SCORE_THRESHOLD);

    info!(
        retained = references.len(),
        score, "merged extraction records"
    );
    Ok((references, score))
}

#[cfg(test)]
mod tests {
    use super::*;
    use refmerge_common::Reference;

    #[test]
    fn empty_extraction_set_merges_to_nothing() {
        let records = ExtractionSet::new();
        let (references, score) = merge_records(&records, &PriorTable::default()).unwrap();
        assert!(references.is_empty());
        assert_eq!(score, 0.0);
    }

    #[test]
    fn normalization_preserves_extractor_order() {
        let mut records = ExtractionSet::new();
        records.insert("refextract".to_string(), vec![Reference::default()]);
        records.insert("cermine".to_string(), vec![]);
        let normalized = normalize_extractions(&records);
        let keys: Vec<&str> = normalized.keys().map(String::as_str).collect();
        assert_eq!(keys, ["refextract", "cermine"]);
    }
}
