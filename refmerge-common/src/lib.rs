//! # RefMerge Common Library
//!
//! Shared domain model for the RefMerge reference reconciliation pipeline:
//! - Bibliographic record types (`Reference`, `Author`, `Identifier`)
//! - The `Field` enum and `FieldValue` union used by the merge engine
//! - Extractor trust priors (compiled defaults + TOML overrides)
//! - Common error types

pub mod domain;
pub mod error;
pub mod priors;

pub use domain::{
    AlignedGroup, Author, ExtractionSet, Field, FieldValue, GroupBeliefs, Identifier, Reference,
    ReferenceSet,
};
pub use error::{Error, Result};
pub use priors::{PriorTable, Priors};
