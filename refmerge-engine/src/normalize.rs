// Field-local cleanup and final filtering.
//
// Normalization runs on the raw per-extractor lists before alignment, so
// every extractor's formatting quirks (stray dots in initials, decorated
// titles, arXiv category typos) are evened out before records are compared.

use once_cell::sync::Lazy;
use refmerge_common::{Author, Reference};
use regex::Regex;
use tracing::debug;

static DOTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.\s*").unwrap());
static LEADING_NON_ALPHANUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^0-9a-zA-Z]+").unwrap());
static TRAILING_NON_ALPHANUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9a-zA-Z]+$").unwrap());

/// Historical arXiv category names, used to repair hyphen-dropped typos
/// such as `hepth` -> `hep-th`.
const CATEGORIES: [&str; 34] = [
    "acc-phys", "adap-org", "alg-geom", "ao-sci", "astro-ph", "atom-ph", "bayes-an", "chao-dyn",
    "chem-ph", "cmp-lg", "comp-gas", "cond-mat", "cs", "dg-ga", "funct-an", "gr-qc", "hep-ex",
    "hep-lat", "hep-ph", "hep-th", "math-ph", "mtrl-th", "math", "nlin", "nucl-ex", "nucl-th",
    "patt-sol", "physics", "plasm-ph", "q-alg", "q-bio", "quant-ph", "solv-int", "supr-con",
];

/// Remove dots while preserving word boundaries.
fn remove_dots(text: &str) -> String {
    DOTS.replace_all(text, " ").trim().to_string()
}

/// Capitalize the first letter of every word, lowercasing the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut boundary = true;
    for c in text.chars() {
        if c.is_alphabetic() {
            if boundary {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            boundary = false;
        } else {
            out.push(c);
            boundary = true;
        }
    }
    out
}

fn trim_non_alphanumeric(text: &str) -> String {
    let text = LEADING_NON_ALPHANUMERIC.replace(text, "");
    TRAILING_NON_ALPHANUMERIC.replace(&text, "").into_owned()
}

/// Repair hyphen-dropped arXiv category typos (`hepth/9901001` ->
/// `hep-th/9901001`).
fn fix_arxiv_id(value: &str) -> String {
    for category in CATEGORIES {
        let typo = category.replace('-', "");
        if value.contains(&typo) {
            return value.replace(&typo, category);
        }
    }
    value.to_string()
}

fn normalize_author(author: &mut Author) {
    if !author.givennames.is_empty() {
        author.givennames = title_case(&remove_dots(&author.givennames));
    }
    if !author.fullname.is_empty() {
        author.fullname = title_case(&remove_dots(&author.fullname));
    }
}

/// Field-local cleanup of one record.
pub fn normalize_record(mut record: Reference) -> Reference {
    for author in &mut record.authors {
        normalize_author(author);
    }
    if let Some(title) = record.title.take() {
        record.title = Some(trim_non_alphanumeric(&title));
    }
    if let Some(source) = record.source.take() {
        record.source = Some(title_case(&remove_dots(&source)));
    }
    if let Some(arxiv_id) = record.arxiv_id.take() {
        record.arxiv_id = Some(fix_arxiv_id(&arxiv_id));
    }
    record
}

/// Field-local cleanup of a whole extraction.
pub fn normalize_records(records: Vec<Reference>) -> Vec<Reference> {
    records.into_iter().map(normalize_record).collect()
}

/// Drop low-quality merged records and compute the aggregate score.
///
/// Records scoring at or above `threshold` are retained with their score
/// (rounded to two decimals) written back; the aggregate is the mean of the
/// retained raw scores, or 0.0 when nothing passes.
pub fn filter_records(
    records: Vec<(Reference, f64)>,
    threshold: f64,
) -> (Vec<Reference>, f64) {
    let mut retained = Vec::new();
    let mut scores = Vec::new();
    for (mut record, score) in records {
        if score < threshold {
            continue;
        }
        record.score = (score * 100.0).round() / 100.0;
        retained.push(record);
        scores.push(score);
    }
    if retained.is_empty() {
        debug!(threshold, "no records above the quality threshold");
        return (Vec::new(), 0.0);
    }
    let aggregate = scores.iter().sum::<f64>() / scores.len() as f64;
    (retained, aggregate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn author_initials_lose_their_dots() {
        let record = normalize_record(Reference {
            authors: vec![Author {
                surname: "Maxwell".to_string(),
                givennames: "j. c.".to_string(),
                fullname: "j. c. maxwell".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        });
        assert_eq!(record.authors[0].givennames, "J C");
        assert_eq!(record.authors[0].fullname, "J C Maxwell");
        // Surname is left alone.
        assert_eq!(record.authors[0].surname, "Maxwell");
    }

    #[test]
    fn title_loses_decoration() {
        let record = normalize_record(Reference {
            title: Some("[1] \"On the electrodynamics of moving bodies\",".to_string()),
            ..Default::default()
        });
        assert_eq!(
            record.title.as_deref(),
            Some("1] \"On the electrodynamics of moving bodies")
        );
    }

    #[test]
    fn source_is_de_dotted_and_title_cased() {
        let record = normalize_record(Reference {
            source: Some("phys. rev. lett.".to_string()),
            ..Default::default()
        });
        assert_eq!(record.source.as_deref(), Some("Phys Rev Lett"));
    }

    #[test]
    fn arxiv_category_typos_are_repaired() {
        let record = normalize_record(Reference {
            arxiv_id: Some("hepth/9901001".to_string()),
            ..Default::default()
        });
        assert_eq!(record.arxiv_id.as_deref(), Some("hep-th/9901001"));

        let untouched = normalize_record(Reference {
            arxiv_id: Some("1704.01689".to_string()),
            ..Default::default()
        });
        assert_eq!(untouched.arxiv_id.as_deref(), Some("1704.01689"));
    }

    #[test]
    fn filter_keeps_records_above_threshold() {
        let records = vec![
            (Reference::default(), 0.1),
            (Reference::default(), 0.4),
            (Reference::default(), 0.9),
        ];
        let (retained, aggregate) = filter_records(records, 0.5);
        assert_eq!(retained.len(), 1);
        assert!((retained[0].score - 0.9).abs() < 1e-9);
        assert!((aggregate - 0.9).abs() < 1e-9);
    }

    #[test]
    fn filter_with_nothing_passing_returns_empty_and_zero() {
        let records = vec![
            (Reference::default(), 0.1),
            (Reference::default(), 0.4),
            (Reference::default(), 0.9),
        ];
        let (retained, aggregate) = filter_records(records, 1.0);
        assert!(retained.is_empty());
        assert_eq!(aggregate, 0.0);
    }

    #[test]
    fn filter_threshold_is_inclusive() {
        let records = vec![(Reference::default(), 0.5)];
        let (retained, _) = filter_records(records, 0.5);
        assert_eq!(retained.len(), 1);
    }

    #[test]
    fn scores_round_to_two_decimals_on_write_back() {
        let records = vec![(Reference::default(), 0.8456)];
        let (retained, aggregate) = filter_records(records, 0.5);
        assert!((retained[0].score - 0.85).abs() < 1e-9);
        // The aggregate uses the unrounded score.
        assert!((aggregate - 0.8456).abs() < 1e-9);
    }
}
