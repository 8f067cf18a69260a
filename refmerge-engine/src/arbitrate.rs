// Arbitration: generate the authoritative record for one aligned group.
//
// Competing field values are pooled by similarity so that near-identical
// variants vote together, weighted by belief probability times the static
// extractor prior, and the heaviest pooled value wins each field.

use indexmap::IndexMap;
use refmerge_common::{
    AlignedGroup, Author, Error, Field, FieldValue, GroupBeliefs, PriorTable, Reference, Result,
};
use std::collections::HashSet;
use tracing::debug;

use crate::value::{similarity, Value};

/// Minimum similarity at which two field values are considered the same
/// value and share their pooled weight.
pub const SIMILARITY_THRESHOLD: f64 = 0.9;

/// One distinct value pooled for a field, with its accumulated weight.
struct PooledValue {
    value: FieldValue,
    rendered: Value,
    weight: f64,
}

fn validate_shapes(
    group: &AlignedGroup,
    beliefs: &GroupBeliefs,
    priors: &PriorTable,
) -> Result<()> {
    let extractors: HashSet<&str> = group.iter().map(|(extractor, _)| extractor.as_str()).collect();

    let mut missing: Vec<&str> = extractors
        .iter()
        .filter(|&&extractor| priors.get(extractor).is_none())
        .copied()
        .collect();
    if !missing.is_empty() {
        missing.sort_unstable();
        return Err(Error::Config(format!(
            "priors missing for one or more extractors: {}",
            missing.join("; ")
        )));
    }

    let belief_extractors: HashSet<&str> = beliefs
        .iter()
        .map(|(extractor, _)| extractor.as_str())
        .collect();
    if group.len() != beliefs.len() || extractors != belief_extractors {
        return Err(Error::Validation(
            "aligned group and belief records must have the same shape".to_string(),
        ));
    }
    Ok(())
}

/// Pool similar values for every field across the group's records.
///
/// `prob_valid` yields the combined belief-times-prior weight for one
/// extractor and field. A new value merges into every pooled value it
/// resembles at [`SIMILARITY_THRESHOLD`] or better; when the newcomer's own
/// weight beats the pooled weight of a similar-but-different value, it takes
/// over as the representative while the accumulated weight carries forward.
fn pool(
    group: &AlignedGroup,
    prob_valid: impl Fn(&str, Field) -> f64,
) -> IndexMap<Field, Vec<PooledValue>> {
    let mut pooled: IndexMap<Field, Vec<PooledValue>> = IndexMap::new();
    for (extractor, reference) in group {
        for field in Field::ALL {
            let Some(value) = reference.get(field) else {
                continue;
            };
            let weight = prob_valid(extractor, field);
            let rendered = Value::from(&value);
            let entry = pooled.entry(field).or_default();
            let mut matched = false;
            for pooled_value in entry.iter_mut() {
                if similarity(&rendered, &pooled_value.rendered) >= SIMILARITY_THRESHOLD {
                    if weight > pooled_value.weight && value != pooled_value.value {
                        pooled_value.value = value.clone();
                        pooled_value.rendered = rendered.clone();
                    }
                    pooled_value.weight += weight;
                    matched = true;
                }
            }
            if !matched {
                entry.push(PooledValue {
                    value,
                    rendered,
                    weight,
                });
            }
        }
    }
    pooled
}

/// Select the most probable value per field and assemble the merged record
/// with its quality score.
fn select(pooled: IndexMap<Field, Vec<PooledValue>>) -> (Reference, f64) {
    let mut merged = Reference::default();
    let mut max_probabilities = Vec::new();

    for (field, values) in &pooled {
        let total: f64 = values.iter().map(|value| value.weight).sum();
        if total <= 0.0 {
            // Nothing credible was pooled for this field.
            continue;
        }
        let mut best_index = 0;
        let mut best_probability = f64::NEG_INFINITY;
        for (index, value) in values.iter().enumerate() {
            let probability = value.weight / total;
            if probability > best_probability {
                best_index = index;
                best_probability = probability;
            }
        }
        let mut chosen = values[best_index].value.clone();
        if let FieldValue::Authors(authors) = &mut chosen {
            fix_authors(authors);
        }
        merged.set(*field, chosen);
        max_probabilities.push(best_probability);
    }

    let confidence = if max_probabilities.is_empty() {
        0.0
    } else {
        max_probabilities.iter().sum::<f64>() / max_probabilities.len() as f64
    };
    let score = quality(&merged) * confidence;
    (merged, score)
}

/// Fill out `fullname` when only the name parts were extracted.
fn fix_authors(authors: &mut [Author]) {
    for author in authors {
        if author.fullname.is_empty() && !author.givennames.is_empty() && !author.surname.is_empty()
        {
            author.fullname = format!("{} {}", author.givennames, author.surname);
        }
    }
}

/// Overall quality of the assembled record: a DOI or arXiv id is a strong
/// external anchor and scores 1.0 outright; otherwise completeness over the
/// core bibliographic fields.
fn quality(reference: &Reference) -> f64 {
    if reference.has(Field::Doi) || reference.has(Field::ArxivId) {
        return 1.0;
    }
    let core = [Field::Volume, Field::Source, Field::Year, Field::Authors];
    let present = core.iter().filter(|field| reference.has(**field)).count();
    present as f64 / core.len() as f64
}

/// Apply arbitration logic to one aligned group.
///
/// `beliefs` must have the same extractor shape as `group`, and every
/// extractor in the group must have an entry in `priors`.
pub fn arbitrate(
    group: &AlignedGroup,
    beliefs: &GroupBeliefs,
    priors: &PriorTable,
) -> Result<(Reference, f64)> {
    validate_shapes(group, beliefs, priors)?;

    let validity: IndexMap<&str, &IndexMap<Field, f64>> = beliefs
        .iter()
        .map(|(extractor, probabilities)| (extractor.as_str(), probabilities))
        .collect();

    let prob_valid = |extractor: &str, field: Field| -> f64 {
        let p_value = validity
            .get(extractor)
            .and_then(|probabilities| probabilities.get(&field))
            .copied()
            .unwrap_or(0.0);
        let p_extractor = priors
            .get(extractor)
            .map(|trust| trust.weight(field))
            .unwrap_or(0.0);
        p_value * p_extractor
    };

    let pooled = pool(group, prob_valid);
    Ok(select(pooled))
}

/// Arbitrate every aligned group, threading the same prior table through
/// each call. Output order follows group order.
pub fn arbitrate_all(
    groups: &[AlignedGroup],
    beliefs: &[GroupBeliefs],
    priors: &PriorTable,
) -> Result<Vec<(Reference, f64)>> {
    if groups.len() != beliefs.len() {
        return Err(Error::Validation(
            "aligned groups and belief records must have the same length".to_string(),
        ));
    }
    debug!(groups = groups.len(), "arbitrating aligned groups");
    groups
        .iter()
        .zip(beliefs)
        .map(|(group, group_beliefs)| arbitrate(group, group_beliefs, priors))
        .collect()
}
