//! Core data structures for extracted bibliographic references.
//!
//! Absence and blankness are distinct throughout: `None` (or an empty
//! `raw`/`authors`/`identifiers`) means an extractor produced nothing for the
//! field, while `Some("")` is a present-but-blank value that still gets
//! scored by the belief engine.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A parsed author name in a bibliographic reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Author {
    pub surname: String,
    pub givennames: String,
    pub prefix: String,
    pub suffix: String,
    /// Free-text fallback when the name could not be split.
    pub fullname: String,
}

/// A persistent identifier attached to a cited reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Identifier {
    /// E.g. "doi", "isbn", "arxiv".
    pub identifier_type: String,
    pub identifier: String,
}

/// One cited-work record as produced by an extractor or by the merge engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reference {
    pub title: Option<String>,
    /// The un-parsed reference line.
    pub raw: String,
    pub arxiv_id: Option<String>,
    pub authors: Vec<Author>,
    /// The type of work the reference points at.
    pub reftype: String,
    pub doi: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub pages: Option<String>,
    /// Journal, conference, etc.
    pub source: Option<String>,
    pub year: Option<String>,
    pub identifiers: Vec<Identifier>,
    /// Merge quality score, written back by the filter stage.
    pub score: f64,
}

impl Default for Reference {
    fn default() -> Self {
        Self {
            title: None,
            raw: String::new(),
            arxiv_id: None,
            authors: Vec::new(),
            reftype: "citation".to_string(),
            doi: None,
            volume: None,
            issue: None,
            pages: None,
            source: None,
            year: None,
            identifiers: Vec::new(),
            score: 0.0,
        }
    }
}

/// The arbitratable fields of a [`Reference`].
///
/// `score` is bookkeeping and deliberately not a field: it never takes part
/// in digesting, belief scoring, or arbitration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Title,
    Raw,
    ArxivId,
    Authors,
    Reftype,
    Doi,
    Volume,
    Issue,
    Pages,
    Source,
    Year,
    Identifiers,
}

impl Field {
    /// Every arbitratable field, in canonical order.
    pub const ALL: [Field; 12] = [
        Field::Title,
        Field::Raw,
        Field::ArxivId,
        Field::Authors,
        Field::Reftype,
        Field::Doi,
        Field::Volume,
        Field::Issue,
        Field::Pages,
        Field::Source,
        Field::Year,
        Field::Identifiers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Raw => "raw",
            Field::ArxivId => "arxiv_id",
            Field::Authors => "authors",
            Field::Reftype => "reftype",
            Field::Doi => "doi",
            Field::Volume => "volume",
            Field::Issue => "issue",
            Field::Pages => "pages",
            Field::Source => "source",
            Field::Year => "year",
            Field::Identifiers => "identifiers",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The payload of a single [`Reference`] field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Authors(Vec<Author>),
    Identifiers(Vec<Identifier>),
}

impl Reference {
    /// Project a field to its value, or `None` when the field is absent.
    ///
    /// Blank text in an `Option` field is present (`Some(Text(""))`); an
    /// empty `raw`, `reftype`, or list field is absent.
    pub fn get(&self, field: Field) -> Option<FieldValue> {
        match field {
            Field::Title => self.title.clone().map(FieldValue::Text),
            Field::Raw => non_empty(&self.raw),
            Field::ArxivId => self.arxiv_id.clone().map(FieldValue::Text),
            Field::Authors => {
                if self.authors.is_empty() {
                    None
                } else {
                    Some(FieldValue::Authors(self.authors.clone()))
                }
            }
            Field::Reftype => non_empty(&self.reftype),
            Field::Doi => self.doi.clone().map(FieldValue::Text),
            Field::Volume => self.volume.clone().map(FieldValue::Text),
            Field::Issue => self.issue.clone().map(FieldValue::Text),
            Field::Pages => self.pages.clone().map(FieldValue::Text),
            Field::Source => self.source.clone().map(FieldValue::Text),
            Field::Year => self.year.clone().map(FieldValue::Text),
            Field::Identifiers => {
                if self.identifiers.is_empty() {
                    None
                } else {
                    Some(FieldValue::Identifiers(self.identifiers.clone()))
                }
            }
        }
    }

    /// Write an arbitrated value back onto the record.
    pub fn set(&mut self, field: Field, value: FieldValue) {
        match (field, value) {
            (Field::Title, FieldValue::Text(v)) => self.title = Some(v),
            (Field::Raw, FieldValue::Text(v)) => self.raw = v,
            (Field::ArxivId, FieldValue::Text(v)) => self.arxiv_id = Some(v),
            (Field::Authors, FieldValue::Authors(v)) => self.authors = v,
            (Field::Reftype, FieldValue::Text(v)) => self.reftype = v,
            (Field::Doi, FieldValue::Text(v)) => self.doi = Some(v),
            (Field::Volume, FieldValue::Text(v)) => self.volume = Some(v),
            (Field::Issue, FieldValue::Text(v)) => self.issue = Some(v),
            (Field::Pages, FieldValue::Text(v)) => self.pages = Some(v),
            (Field::Source, FieldValue::Text(v)) => self.source = Some(v),
            (Field::Year, FieldValue::Text(v)) => self.year = Some(v),
            (Field::Identifiers, FieldValue::Identifiers(v)) => self.identifiers = v,
            (field, value) => {
                warn!(field = field.as_str(), ?value, "type-mismatched field write ignored");
            }
        }
    }

    /// Whether a field holds a usable (present and non-blank) value.
    pub fn has(&self, field: Field) -> bool {
        match self.get(field) {
            Some(FieldValue::Text(v)) => !v.is_empty(),
            Some(FieldValue::Authors(v)) => !v.is_empty(),
            Some(FieldValue::Identifiers(v)) => !v.is_empty(),
            None => false,
        }
    }
}

fn non_empty(value: &str) -> Option<FieldValue> {
    if value.is_empty() {
        None
    } else {
        Some(FieldValue::Text(value.to_string()))
    }
}

/// Per-extractor reference lists for one document, keyed by extractor name.
/// Iteration order is insertion order.
pub type ExtractionSet = IndexMap<String, Vec<Reference>>;

/// Records from several extractors believed to describe the same citation.
/// Invariant: at most one entry per extractor name.
pub type AlignedGroup = Vec<(String, Reference)>;

/// Per-extractor, per-field correctness probabilities for one aligned group.
/// Shape-parallel to [`AlignedGroup`].
pub type GroupBeliefs = Vec<(String, IndexMap<Field, f64>)>;

/// A merged (or raw pre-merge) reference list, as handed to storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceSet {
    /// Source document identifier (e.g. arXiv paper id with version affix).
    pub document_id: String,
    pub references: Vec<Reference>,
    /// Version of the application that produced this set.
    pub version: String,
    /// Relative quality of the set as a whole, in 0-1.
    pub score: f64,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    /// `"combined"` for a reconciled set, or a single extractor's name.
    pub extractor: String,
    /// Extractors that contributed to this set.
    pub extractors: Vec<String>,
    /// True when `references` is a single extractor's pre-merge output,
    /// retained for audit.
    pub raw: bool,
}

impl ReferenceSet {
    /// Envelope for the reconciled, authoritative reference list.
    pub fn combined(
        document_id: impl Into<String>,
        version: impl Into<String>,
        references: Vec<Reference>,
        score: f64,
        extractors: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            document_id: document_id.into(),
            references,
            version: version.into(),
            score,
            created: now,
            updated: now,
            extractor: "combined".to_string(),
            extractors,
            raw: false,
        }
    }

    /// Envelope for one extractor's pre-merge output, kept for audit.
    pub fn raw_extraction(
        document_id: impl Into<String>,
        version: impl Into<String>,
        extractor: impl Into<String>,
        references: Vec<Reference>,
    ) -> Self {
        let extractor = extractor.into();
        let now = Utc::now();
        Self {
            document_id: document_id.into(),
            references,
            version: version.into(),
            score: 0.0,
            created: now,
            updated: now,
            extractors: vec![extractor.clone()],
            extractor,
            raw: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_title_is_present_but_empty_authors_are_absent() {
        let reference = Reference {
            title: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(
            reference.get(Field::Title),
            Some(FieldValue::Text(String::new()))
        );
        assert_eq!(reference.get(Field::Authors), None);
        assert!(!reference.has(Field::Title));
    }

    #[test]
    fn reftype_defaults_to_citation_and_counts_as_present() {
        let reference = Reference::default();
        assert_eq!(
            reference.get(Field::Reftype),
            Some(FieldValue::Text("citation".to_string()))
        );
    }

    #[test]
    fn set_round_trips_every_field() {
        let mut merged = Reference::default();
        merged.set(Field::Doi, FieldValue::Text("10.1000/xyz".to_string()));
        merged.set(
            Field::Authors,
            FieldValue::Authors(vec![Author {
                surname: "Curie".to_string(),
                ..Default::default()
            }]),
        );
        assert_eq!(merged.doi.as_deref(), Some("10.1000/xyz"));
        assert_eq!(merged.authors[0].surname, "Curie");
    }

    #[test]
    fn reference_deserializes_with_defaults() {
        let reference: Reference =
            serde_json::from_str(r#"{"title": "On Things", "volume": "12"}"#).unwrap();
        assert_eq!(reference.title.as_deref(), Some("On Things"));
        assert_eq!(reference.reftype, "citation");
        assert!(reference.doi.is_none());
    }
}
