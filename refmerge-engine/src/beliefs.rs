// Per-field belief scoring.
//
// For every (extractor, record) pair in an aligned group, each present field
// gets a probability that its value is a correct extraction: the average of
// the field's heuristic functions, clamped to [0, 1]. Fields without
// registered heuristics treat any present value (including a blank string)
// as fully plausible.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use refmerge_common::{AlignedGroup, Field, FieldValue, GroupBeliefs};

static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());
static PAGE_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\s*[\s\-._/:]+\s*(\d+)").unwrap());
static DOI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(?:doi:(?://)?|https?://(?:dx\.)?doi\.org/)?10\.[0-9]{3,}(?:\.[0-9]+)*/[^\s"&'#%]+"#)
        .unwrap()
});
static ARXIV_NEW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:arxiv:)?\d{4}\.\d{4,5}(?:v\d+)?$").unwrap());
static ARXIV_OLD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:arxiv:)?[a-z-]+(?:\.[a-z]{2})?/\d{7}(?:v\d+)?$").unwrap());
static ISBN_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^isbn(?:-1[03])?:?\s*").unwrap());
static ISBN_10: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{9}[0-9Xx]$").unwrap());
static ISBN_13: Lazy<Regex> = Lazy::new(|| Regex::new(r"^97[89][0-9]{10}$").unwrap());

/// A single belief heuristic: value in, probability out.
pub type BeliefFn = Box<dyn Fn(&FieldValue) -> f64 + Send + Sync>;

fn text_of(value: &FieldValue) -> Option<&str> {
    match value {
        FieldValue::Text(text) => Some(text),
        FieldValue::Authors(_) | FieldValue::Identifiers(_) => None,
    }
}

/// Any present value is plausible.
pub fn unity(_value: &FieldValue) -> f64 {
    1.0
}

/// 1.0 when the whole value parses as a plain integer.
pub fn is_integer(value: &FieldValue) -> f64 {
    let parses = text_of(value).is_some_and(|text| text.trim().parse::<i64>().is_ok());
    if parses {
        1.0
    } else {
        0.0
    }
}

/// Fraction of the value's whitespace tokens that parse as plain integers.
pub fn integer_likeness(value: &FieldValue) -> f64 {
    let Some(text) = text_of(value) else { return 0.0 };
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.is_empty() {
        return 0.0;
    }
    let integers = tokens
        .iter()
        .filter(|token| token.parse::<i64>().is_ok())
        .count();
    integers as f64 / tokens.len() as f64
}

fn plausible_year(text: &str) -> bool {
    text.trim()
        .parse::<i64>()
        .map(|year| year > 1600 && year < 2100)
        .unwrap_or(false)
}

/// 1.0 when the value is an integer in a plausible publication-year range.
pub fn is_year(value: &FieldValue) -> f64 {
    if text_of(value).is_some_and(plausible_year) {
        1.0
    } else {
        0.0
    }
}

/// 1.0 when any number embedded in the value is a plausible year.
pub fn year_likeness(value: &FieldValue) -> f64 {
    let Some(text) = text_of(value) else { return 0.0 };
    let found = NUMBER
        .find_iter(text)
        .any(|number| plausible_year(number.as_str()));
    if found {
        1.0
    } else {
        0.0
    }
}

/// Page ranges: ascending `start-end` scores 1.0, an inverted range 0.5,
/// anything else 0.0.
pub fn is_pages(value: &FieldValue) -> f64 {
    let Some(text) = text_of(value) else { return 0.0 };
    let Some(captures) = PAGE_RANGE.captures(text.trim()) else {
        return 0.0;
    };
    let start: u64 = match captures[1].parse() {
        Ok(n) => n,
        Err(_) => return 0.0,
    };
    let end: u64 = match captures[2].parse() {
        Ok(n) => n,
        Err(_) => return 0.0,
    };
    if start < end {
        1.0
    } else {
        0.5
    }
}

fn doi_like(text: &str) -> bool {
    DOI.is_match(text.trim())
}

fn arxiv_like(text: &str) -> bool {
    let text = text.trim();
    ARXIV_NEW.is_match(text) || ARXIV_OLD.is_match(text)
}

fn isbn_like(text: &str) -> bool {
    let stripped = ISBN_PREFIX.replace(text.trim(), "");
    let compact: String = stripped
        .chars()
        .filter(|c| !matches!(c, '-' | ' '))
        .collect();
    ISBN_10.is_match(&compact) || ISBN_13.is_match(&compact)
}

/// Structural DOI check.
pub fn valid_doi(value: &FieldValue) -> f64 {
    if text_of(value).is_some_and(doi_like) {
        1.0
    } else {
        0.0
    }
}

/// Structural arXiv identifier check (new `NNNN.NNNNN` and old
/// `category/NNNNNNN` forms).
pub fn valid_arxiv_id(value: &FieldValue) -> f64 {
    if text_of(value).is_some_and(arxiv_like) {
        1.0
    } else {
        0.0
    }
}

/// Fraction of the identifier list that is structurally valid for its
/// declared type.
pub fn valid_identifiers(value: &FieldValue) -> f64 {
    let FieldValue::Identifiers(identifiers) = value else {
        return 0.0;
    };
    if identifiers.is_empty() {
        return 0.0;
    }
    let good = identifiers
        .iter()
        .filter(|id| match id.identifier_type.as_str() {
            "doi" => doi_like(&id.identifier),
            "arxiv" => arxiv_like(&id.identifier),
            "isbn" => isbn_like(&id.identifier),
            _ => false,
        })
        .count();
    good as f64 / identifiers.len() as f64
}

/// Heuristic constructor: full credit only when the value contains `needle`.
pub fn contains(needle: &str) -> BeliefFn {
    let needle = needle.to_lowercase();
    Box::new(move |value| {
        let found = text_of(value).is_some_and(|text| text.to_lowercase().contains(&needle));
        if found {
            1.0
        } else {
            0.0
        }
    })
}

/// Heuristic constructor: full credit only when the value does NOT contain
/// `needle`. `lacks("arxiv")` penalizes a journal-name field that actually
/// holds an arXiv reference.
pub fn lacks(needle: &str) -> BeliefFn {
    let needle = needle.to_lowercase();
    Box::new(move |value| {
        let found = text_of(value).is_some_and(|text| text.to_lowercase().contains(&needle));
        if found {
            0.0
        } else {
            1.0
        }
    })
}

/// Heuristic constructor: full credit only when the value ends with `suffix`.
pub fn ends_with(suffix: &str) -> BeliefFn {
    let suffix = suffix.to_lowercase();
    Box::new(move |value| {
        let found = text_of(value).is_some_and(|text| text.to_lowercase().ends_with(&suffix));
        if found {
            1.0
        } else {
            0.0
        }
    })
}

/// Pluggable per-field heuristic registry.
pub struct BeliefSet {
    funcs: IndexMap<Field, Vec<BeliefFn>>,
}

impl BeliefSet {
    pub fn new() -> Self {
        Self {
            funcs: IndexMap::new(),
        }
    }

    /// Register an additional heuristic for a field.
    pub fn with(mut self, field: Field, func: BeliefFn) -> Self {
        self.funcs.entry(field).or_default().push(func);
        self
    }

    /// Probability that `value` is a correct extraction of `field`: the mean
    /// of the field's heuristics, clamped to [0, 1]. Fields with no
    /// registered heuristics score a constant 1.0.
    pub fn probability(&self, field: Field, value: &FieldValue) -> f64 {
        match self.funcs.get(&field) {
            Some(funcs) if !funcs.is_empty() => {
                let sum: f64 = funcs.iter().map(|func| func(value)).sum();
                (sum / funcs.len() as f64).clamp(0.0, 1.0)
            }
            _ => unity(value),
        }
    }
}

impl Default for BeliefSet {
    /// The standard heuristic wiring.
    fn default() -> Self {
        BeliefSet::new()
            .with(Field::Doi, Box::new(valid_doi))
            .with(Field::ArxivId, Box::new(valid_arxiv_id))
            .with(Field::Pages, Box::new(integer_likeness))
            .with(Field::Pages, Box::new(is_pages))
            .with(Field::Source, lacks("arxiv"))
            .with(Field::Year, Box::new(is_integer))
            .with(Field::Year, Box::new(integer_likeness))
            .with(Field::Year, Box::new(is_year))
            .with(Field::Year, Box::new(year_likeness))
            .with(Field::Identifiers, Box::new(valid_identifiers))
    }
}

/// Estimate per-field correctness probabilities for every record in every
/// aligned group, using the standard heuristics.
///
/// The output is shape-preserving: one belief map per (extractor, record)
/// pair, with an entry for every present field. A missing field gets no
/// probability; a present-but-blank value is scored like any other.
pub fn validate(groups: &[AlignedGroup]) -> Vec<GroupBeliefs> {
    validate_with(groups, &BeliefSet::default())
}

/// [`validate`] with a caller-supplied heuristic registry.
pub fn validate_with(groups: &[AlignedGroup], beliefs: &BeliefSet) -> Vec<GroupBeliefs> {
    groups
        .iter()
        .map(|group| {
            group
                .iter()
                .map(|(extractor, reference)| {
                    let mut probabilities = IndexMap::new();
                    for field in Field::ALL {
                        if let Some(value) = reference.get(field) {
                            probabilities.insert(field, beliefs.probability(field, &value));
                        }
                    }
                    (extractor.clone(), probabilities)
                })
                .collect()
        })
        .collect()
}
