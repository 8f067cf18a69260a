// Record alignment across extractions.
//
// Partitions the per-extractor reference lists into groups of records
// believed to describe the same citation. The match cutoff is not a fixed
// constant: it is derived per document from the distribution of pairwise
// similarity scores, so matching adapts to how similar the extractors'
// outputs generally are for this document.
//
// The assignment is a single-pass greedy heuristic, not a global
// optimization over all references at once.

use std::cmp::Reverse;
use std::collections::HashSet;

use refmerge_common::{AlignedGroup, ExtractionSet, Reference};
use tracing::debug;

use crate::value::Value;

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Robust outlier threshold: `median + 3 * 1.4826 * MAD`.
pub(crate) fn mad_cutoff(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let center = median(data);
    let deviations: Vec<f64> = data.iter().map(|x| (x - center).abs()).collect();
    let mad = 1.4826 * median(&deviations);
    center + 3.0 * mad
}

fn tokenize(digest: &str) -> HashSet<String> {
    digest.split_whitespace().map(str::to_string).collect()
}

fn jaccard_tokens(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let shared = a.intersection(b).count();
    let all = a.union(b).count();
    if all == 0 {
        return 0.0;
    }
    shared as f64 / all as f64
}

/// The similarity score below which two records are considered unrelated,
/// derived from the full pairwise jaccard matrices over all extractor pairs.
pub fn similarity_cutoff(records: &ExtractionSet) -> f64 {
    let token_sets: Vec<Vec<HashSet<String>>> = records
        .values()
        .map(|list| {
            list.iter()
                .map(|reference| tokenize(&Value::from(reference).digest()))
                .collect()
        })
        .collect();

    // Candidate cap per side; with the cap at the largest list length it
    // never truncates, but it bounds cost if list sizes ever diverge wildly.
    let cap = token_sets.iter().map(Vec::len).max().unwrap_or(0);

    let mut scores = Vec::new();
    for i in 0..token_sets.len() {
        for j in (i + 1)..token_sets.len() {
            for a in token_sets[i].iter().take(cap) {
                for b in token_sets[j].iter().take(cap) {
                    scores.push(jaccard_tokens(a, b));
                }
            }
        }
    }
    mad_cutoff(&scores)
}

struct GroupEntry {
    extractor: String,
    tokens: HashSet<String>,
    reference: Reference,
}

/// Partition the extraction set into aligned groups.
///
/// Groups are seeded from the largest extraction; every other extractor's
/// records (in descending list-size order) either join the existing group
/// they overlap best with, above the cutoff, or start a new singleton group.
/// A group never takes a second record from the same extractor: when the
/// best-matching group is already represented, the record starts a new
/// group instead. Every input record appears in exactly one group.
pub fn align_records(records: &ExtractionSet) -> Vec<AlignedGroup> {
    if records.is_empty() {
        return Vec::new();
    }

    // A single extraction has nothing to be compared against.
    if records.len() == 1 {
        return records
            .iter()
            .flat_map(|(extractor, list)| {
                list.iter()
                    .map(move |reference| vec![(extractor.clone(), reference.clone())])
            })
            .collect();
    }

    let cutoff = similarity_cutoff(records);
    debug!(cutoff, extractions = records.len(), "aligning extractions");

    // Largest extraction first; ties keep the extraction set's own order.
    let mut order: Vec<&String> = records.keys().collect();
    order.sort_by_key(|extractor| Reverse(records[*extractor].len()));

    let entries = |extractor: &String| -> Vec<GroupEntry> {
        records[extractor]
            .iter()
            .map(|reference| GroupEntry {
                extractor: extractor.clone(),
                tokens: tokenize(&Value::from(reference).digest()),
                reference: reference.clone(),
            })
            .collect()
    };

    let mut output: Vec<Vec<GroupEntry>> = entries(order[0]).into_iter().map(|e| vec![e]).collect();

    for &extractor in order.iter().skip(1) {
        for entry in entries(extractor) {
            // Rank candidate groups by their best member score; above the
            // cutoff only. On a tied score the later group wins.
            let mut best: Option<(f64, usize)> = None;
            for (index, group) in output.iter().enumerate() {
                let score = group
                    .iter()
                    .map(|member| jaccard_tokens(&member.tokens, &entry.tokens))
                    .fold(f64::NEG_INFINITY, f64::max);
                if score <= cutoff {
                    continue;
                }
                if best.map_or(true, |(best_score, _)| score >= best_score) {
                    best = Some((score, index));
                }
            }

            match best {
                Some((_, index))
                    if !output[index]
                        .iter()
                        .any(|member| member.extractor == entry.extractor) =>
                {
                    output[index].push(entry);
                }
                // Either nothing matched, or the matching group already has
                // a record from this extractor: start a fresh group.
                _ => output.push(vec![entry]),
            }
        }
    }

    output
        .into_iter()
        .map(|group| {
            group
                .into_iter()
                .map(|entry| (entry.extractor, entry.reference))
                .collect()
        })
        .collect()
}
