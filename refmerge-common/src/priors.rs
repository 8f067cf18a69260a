//! Prior expectations about extractor field quality.
//!
//! A prior is a static trust weight for an extractor's output, overall
//! (`default`) or per field. The table ships with compiled-in defaults for
//! the known extractors and can be replaced wholesale from a TOML document.
//! It is loaded once at startup and read-only afterwards.

use crate::domain::Field;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Trust weights for a single extractor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Priors {
    /// Weight applied to any field without a specific entry.
    #[serde(default)]
    pub default: f64,

    /// Field-specific overrides.
    #[serde(default)]
    pub fields: IndexMap<Field, f64>,
}

impl Priors {
    /// The trust weight for one field: the specific entry when present,
    /// otherwise the extractor-wide default.
    pub fn weight(&self, field: Field) -> f64 {
        self.fields.get(&field).copied().unwrap_or(self.default)
    }
}

/// Static trust table, keyed by extractor name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriorTable {
    pub extractors: IndexMap<String, Priors>,
}

impl PriorTable {
    pub fn get(&self, extractor: &str) -> Option<&Priors> {
        self.extractors.get(extractor)
    }

    /// Parse a prior table from a TOML document.
    ///
    /// ```toml
    /// [refextract]
    /// default = 1.0
    /// [refextract.fields]
    /// authors = 0.5
    /// ```
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let table: PriorTable = toml::from_str(text)?;
        table.validate()?;
        Ok(table)
    }

    /// Load a prior table from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<()> {
        for (extractor, priors) in &self.extractors {
            let out_of_range = std::iter::once(priors.default)
                .chain(priors.fields.values().copied())
                .any(|w| !(0.0..=1.0).contains(&w));
            if out_of_range {
                return Err(Error::Config(format!(
                    "prior weights for '{extractor}' must lie in [0, 1]"
                )));
            }
        }
        Ok(())
    }
}

impl Default for PriorTable {
    /// Compiled-in trust weights for the known extractors.
    fn default() -> Self {
        let mut extractors = IndexMap::new();
        extractors.insert(
            "refextract".to_string(),
            Priors {
                default: 1.0,
                fields: IndexMap::from([
                    (Field::Authors, 0.5),
                    (Field::Raw, 0.8),
                    (Field::Issue, 0.6),
                    (Field::Source, 1.0),
                ]),
            },
        );
        extractors.insert(
            "cermine".to_string(),
            Priors {
                default: 1.0,
                fields: IndexMap::from([
                    (Field::Authors, 0.9),
                    (Field::Raw, 1.0),
                    (Field::Issue, 0.9),
                    (Field::Source, 0.9),
                ]),
            },
        );
        extractors.insert(
            "grobid".to_string(),
            Priors {
                default: 1.0,
                fields: IndexMap::from([
                    (Field::Authors, 1.0),
                    (Field::Raw, 0.8),
                    (Field::Issue, 0.8),
                    (Field::Source, 0.9),
                ]),
            },
        );
        extractors.insert(
            "scienceparse".to_string(),
            Priors {
                default: 1.0,
                fields: IndexMap::from([
                    (Field::Authors, 0.9),
                    (Field::Raw, 0.8),
                    (Field::Issue, 0.8),
                    (Field::Source, 0.9),
                ]),
            },
        );
        Self { extractors }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_covers_known_extractors() {
        let table = PriorTable::default();
        for extractor in ["refextract", "cermine", "grobid", "scienceparse"] {
            assert!(table.get(extractor).is_some(), "missing {extractor}");
        }
        let refextract = table.get("refextract").unwrap();
        assert_eq!(refextract.weight(Field::Authors), 0.5);
        // No specific entry: fall back to the extractor-wide default.
        assert_eq!(refextract.weight(Field::Title), 1.0);
    }

    #[test]
    fn toml_round_trip() {
        let table = PriorTable::from_toml_str(
            r#"
            [cermine]
            default = 1.0

            [cermine.fields]
            authors = 0.9
            source = 0.9

            [refextract]
            default = 0.8
            "#,
        )
        .unwrap();
        assert_eq!(table.get("cermine").unwrap().weight(Field::Authors), 0.9);
        assert_eq!(table.get("refextract").unwrap().weight(Field::Doi), 0.8);
    }

    #[test]
    fn missing_default_weight_is_zero() {
        let table = PriorTable::from_toml_str(
            r#"
            [oddball.fields]
            title = 0.7
            "#,
        )
        .unwrap();
        let priors = table.get("oddball").unwrap();
        assert_eq!(priors.weight(Field::Title), 0.7);
        assert_eq!(priors.weight(Field::Doi), 0.0);
    }

    #[test]
    fn out_of_range_weight_is_rejected() {
        let result = PriorTable::from_toml_str(
            r#"
            [cermine]
            default = 1.5
            "#,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
