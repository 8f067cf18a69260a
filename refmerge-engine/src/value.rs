// Value digest & similarity.
//
// Field values span free text, numbers, and nested structures (author and
// identifier lists). They are modeled as a closed union so digesting and
// similarity are exhaustive over every shape a value can take; a mismatched
// pair of shapes is an explicit case, not a silent fallback.

use std::collections::HashSet;

use indexmap::IndexMap;
use refmerge_common::{Author, Field, FieldValue, Identifier, Reference};
use serde::{Deserialize, Serialize};

use crate::textutil::clean_text;

/// Keys considered too free-form or redundant for coarse matching.
const DIGEST_SKIP_KEYS: [&str; 3] = ["raw", "doi", "identifiers"];

/// A structured field value: string, number, list, or map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Str(String),
    Num(f64),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
}

impl Value {
    /// Recursively render this value to a cleaned, lowercase token string.
    ///
    /// Map values concatenate the digests of all entries except the
    /// free-form keys (`raw`, `doi`, `identifiers`); list values concatenate
    /// element digests; scalars are string-coerced. Numeric tokens are kept:
    /// years and page numbers matter for alignment.
    pub fn digest(&self) -> String {
        match self {
            Value::Str(s) => clean_text(s, true),
            Value::Num(n) => clean_text(&render_number(*n), true),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(Value::digest).collect();
                clean_text(&parts.join(" "), true)
            }
            Value::Map(map) => {
                let parts: Vec<String> = map
                    .iter()
                    .filter(|(key, _)| !DIGEST_SKIP_KEYS.contains(&key.as_str()))
                    .map(|(_, value)| value.digest())
                    .collect();
                clean_text(&parts.join(" "), true)
            }
        }
    }
}

fn render_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Jaccard similarity between two digest strings: the fraction of
/// whitespace-delimited tokens shared between them.
pub fn jaccard(a: &str, b: &str) -> f64 {
    let words_a: HashSet<&str> = a.split_whitespace().collect();
    let words_b: HashSet<&str> = b.split_whitespace().collect();
    let shared = words_a.intersection(&words_b).count();
    let all = words_a.union(&words_b).count();
    if all == 0 {
        return 0.0;
    }
    shared as f64 / all as f64
}

/// Similarity of two field values, dispatched on shape.
///
/// Numbers compare by relative difference, strings by normalized edit
/// distance, lists by one-level greedy alignment of their elements, maps by
/// the mean similarity over the union of their keys. Values of different
/// shapes never describe the same thing.
pub fn similarity(a: &Value, b: &Value) -> f64 {
    match (a, b) {
        (Value::Num(x), Value::Num(y)) => similarity_num(*x, *y),
        (Value::Str(x), Value::Str(y)) => similarity_str(x, y),
        (Value::List(x), Value::List(y)) => similarity_list(x, y),
        (Value::Map(x), Value::Map(y)) => similarity_map(x, y),
        (Value::Str(_), Value::Num(_) | Value::List(_) | Value::Map(_))
        | (Value::Num(_), Value::Str(_) | Value::List(_) | Value::Map(_))
        | (Value::List(_), Value::Str(_) | Value::Num(_) | Value::Map(_))
        | (Value::Map(_), Value::Str(_) | Value::Num(_) | Value::List(_)) => 0.0,
    }
}

/// Relative similarity of two numbers: `1 - |a-b| / mean(a, b)`, 0 when the
/// mean is 0.
fn similarity_num(a: f64, b: f64) -> f64 {
    let mean = (a + b) / 2.0;
    if mean == 0.0 {
        return 0.0;
    }
    1.0 - (a - b).abs() / mean
}

/// Edit-distance similarity of two strings, 0 when both are empty.
fn similarity_str(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    strsim::normalized_levenshtein(a, b)
}

/// Mean similarity across the union of both maps' keys; a key present on
/// only one side scores 0.
fn similarity_map(a: &IndexMap<String, Value>, b: &IndexMap<String, Value>) -> f64 {
    let mut keys: Vec<&String> = a.keys().collect();
    keys.extend(b.keys().filter(|key| !a.contains_key(*key)));
    if keys.is_empty() {
        return 0.0;
    }
    let total: f64 = keys
        .iter()
        .map(|key| match (a.get(*key), b.get(*key)) {
            (Some(value_a), Some(value_b)) => similarity(value_a, value_b),
            _ => 0.0,
        })
        .sum();
    total / keys.len() as f64
}

/// Similarity of two lists, without regard to order: elements are greedily
/// paired by digest overlap (the aligner's pairwise-matching idea at one
/// level), matched pairs contribute their recursive similarity, and
/// unmatched elements contribute 0.
fn similarity_list(a: &[Value], b: &[Value]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    // Pair each element of the shorter side with its best still-unmatched
    // counterpart on the longer side; no token overlap means no pair.
    let (seed, other) = if b.len() > a.len() { (b, a) } else { (a, b) };
    let seed_digests: Vec<String> = seed.iter().map(Value::digest).collect();
    let other_digests: Vec<String> = other.iter().map(Value::digest).collect();

    let mut matched: Vec<Option<usize>> = vec![None; seed.len()];
    let mut unmatched = 0usize;
    for (j, od) in other_digests.iter().enumerate() {
        let mut best: Option<(f64, usize)> = None;
        for (i, sd) in seed_digests.iter().enumerate() {
            if matched[i].is_some() {
                continue;
            }
            let score = jaccard(sd, od);
            if score <= 0.0 {
                continue;
            }
            if best.map_or(true, |(best_score, _)| score >= best_score) {
                best = Some((score, i));
            }
        }
        match best {
            Some((_, i)) => matched[i] = Some(j),
            None => unmatched += 1,
        }
    }

    let total: f64 = matched
        .iter()
        .enumerate()
        .map(|(i, pair)| match pair {
            Some(j) => similarity(&seed[i], &other[*j]),
            None => 0.0,
        })
        .sum();
    total / (seed.len() + unmatched) as f64
}

impl From<&Author> for Value {
    /// Name parts that were never extracted are left out of the map, so two
    /// authors agree or disagree only on what both actually carry.
    fn from(author: &Author) -> Self {
        let parts = [
            ("surname", &author.surname),
            ("givennames", &author.givennames),
            ("prefix", &author.prefix),
            ("suffix", &author.suffix),
            ("fullname", &author.fullname),
        ];
        let mut map = IndexMap::new();
        for (key, part) in parts {
            if !part.is_empty() {
                map.insert(key.to_string(), Value::Str(part.clone()));
            }
        }
        Value::Map(map)
    }
}

impl From<&Identifier> for Value {
    fn from(identifier: &Identifier) -> Self {
        let mut map = IndexMap::new();
        if !identifier.identifier_type.is_empty() {
            map.insert(
                "identifier_type".to_string(),
                Value::Str(identifier.identifier_type.clone()),
            );
        }
        if !identifier.identifier.is_empty() {
            map.insert(
                "identifier".to_string(),
                Value::Str(identifier.identifier.clone()),
            );
        }
        Value::Map(map)
    }
}

impl From<&FieldValue> for Value {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Text(s) => Value::Str(s.clone()),
            FieldValue::Authors(authors) => {
                Value::List(authors.iter().map(Value::from).collect())
            }
            FieldValue::Identifiers(identifiers) => {
                Value::List(identifiers.iter().map(Value::from).collect())
            }
        }
    }
}

impl From<&Reference> for Value {
    fn from(reference: &Reference) -> Self {
        let mut map = IndexMap::new();
        for field in Field::ALL {
            if let Some(value) = reference.get(field) {
                map.insert(field.as_str().to_string(), Value::from(&value));
            }
        }
        Value::Map(map)
    }
}

/// Boundary conversion for extractor adapters that hand over plain JSON.
impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Str(String::new()),
            serde_json::Value::Bool(b) => Value::Str(b.to_string()),
            serde_json::Value::Number(n) => Value::Num(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(title: &str, year: &str) -> Reference {
        Reference {
            title: Some(title.to_string()),
            year: Some(year.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn jaccard_bounds() {
        assert_eq!(jaccard("", ""), 0.0);
        assert_eq!(jaccard("electron scattering", "electron scattering"), 1.0);
        let score = jaccard("electron scattering theory", "electron capture");
        assert!(score > 0.0 && score < 1.0);
    }

    #[test]
    fn digest_ignores_free_form_keys() {
        let mut with_doi = reference("Quantum Fields", "2001");
        with_doi.doi = Some("10.1000/quantum".to_string());
        with_doi.raw = "Quantum Fields, J. Phys (2001)".to_string();
        let without_doi = reference("Quantum Fields", "2001");
        assert_eq!(
            Value::from(&with_doi).digest(),
            Value::from(&without_doi).digest()
        );
    }

    #[test]
    fn digest_keeps_numbers() {
        let value = Value::from(&reference("Spin Glasses", "1987"));
        assert!(value.digest().contains("1987"));
    }

    #[test]
    fn digest_renders_whole_numbers_without_fraction() {
        assert_eq!(Value::Num(2011.0).digest(), "2011");
    }

    #[test]
    fn string_similarity_matches_edit_distance() {
        assert_eq!(similarity(&Value::Str("meh".into()), &Value::Str("meh".into())), 1.0);
        let meb = similarity(&Value::Str("meh".into()), &Value::Str("meb".into()));
        assert!((meb - 2.0 / 3.0).abs() < 1e-9);
        let fuzz = similarity(&Value::Str("foo".into()), &Value::Str("fuzz".into()));
        assert!((fuzz - 1.0 / 4.0).abs() < 1e-9);
        assert_eq!(similarity(&Value::Str(String::new()), &Value::Str(String::new())), 0.0);
    }

    #[test]
    fn numeric_similarity_is_relative() {
        let close = similarity(&Value::Num(100.0), &Value::Num(99.0));
        assert!((close - (1.0 - 1.0 / 99.5)).abs() < 1e-9);
        assert_eq!(similarity(&Value::Num(0.0), &Value::Num(0.0)), 0.0);
    }

    #[test]
    fn mismatched_shapes_never_match() {
        assert_eq!(
            similarity(&Value::Str("12".into()), &Value::Num(12.0)),
            0.0
        );
        assert_eq!(
            similarity(&Value::List(vec![]), &Value::Map(IndexMap::new())),
            0.0
        );
    }

    #[test]
    fn identical_author_lists_are_fully_similar() {
        let authors = FieldValue::Authors(vec![
            Author {
                surname: "Noether".to_string(),
                givennames: "Emmy".to_string(),
                ..Default::default()
            },
            Author {
                surname: "Hilbert".to_string(),
                givennames: "David".to_string(),
                ..Default::default()
            },
        ]);
        let a = Value::from(&authors);
        let b = Value::from(&authors);
        assert!((similarity(&a, &b) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn disjoint_lists_score_zero() {
        let a = Value::List(vec![Value::Str("alpha decay rates".into())]);
        let b = Value::List(vec![Value::Str("market equilibria".into())]);
        assert_eq!(similarity(&a, &b), 0.0);
    }

    #[test]
    fn json_boundary_conversion() {
        let json: serde_json::Value =
            serde_json::json!({"title": "On Things", "year": 2011, "tags": ["a", "b"]});
        let value = Value::from(json);
        match &value {
            Value::Map(map) => {
                assert_eq!(map.get("year"), Some(&Value::Num(2011.0)));
            }
            other => panic!("expected map, got {other:?}"),
        }
    }
}
