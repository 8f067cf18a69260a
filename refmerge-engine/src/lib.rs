//! # RefMerge Engine
//!
//! Reconciles multiple independent, noisy extractions of bibliographic
//! references from the same document into one authoritative,
//! confidence-scored reference list.
//!
//! Pipeline: raw per-extractor lists → [`normalize`] → [`align`] →
//! [`beliefs`] → [`arbitrate`] → [`normalize::filter_records`] → final
//! `(references, aggregate_score)`.
//!
//! The engine is a pure, synchronous computation over in-memory data for one
//! document at a time: no I/O, no shared mutable state, deterministic for a
//! fixed input. Orchestration, extractor adapters, and storage live in
//! collaborating services.

pub mod align;
pub mod arbitrate;
pub mod beliefs;
pub mod merge;
pub mod normalize;
pub mod textutil;
pub mod value;

pub use align::{align_records, similarity_cutoff};
pub use arbitrate::{arbitrate, arbitrate_all, SIMILARITY_THRESHOLD};
pub use beliefs::{validate, validate_with, BeliefSet};
pub use merge::{merge_records, normalize_extractions, SCORE_THRESHOLD};
pub use normalize::{filter_records, normalize_records};
pub use textutil::clean_text;
pub use value::{jaccard, similarity, Value};
