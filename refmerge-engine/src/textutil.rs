// Text cleaning for record digests.
//
// Extractor output carries OCR artifacts, hyphen-broken line wraps, and
// stray punctuation; cleaning reduces a value to a flat lowercase token
// stream so token-set comparisons see through formatting differences.

use once_cell::sync::Lazy;
use regex::Regex;

static CID: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(cid:\d+\)").unwrap());
static HYPHEN_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-\s*\n\s*").unwrap());
static PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[!"\#$%&'()*+,\-./:;<=>?@\[\\\]^_`{|}~]"#).unwrap());
static NON_ALPHANUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9 ]").unwrap());
static PURE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[0-9]+\b").unwrap());
static MULTI_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Reduce text to a cleaned lowercase token stream.
///
/// Lowercases, replaces `(cid:NNN)` OCR artifacts with a placeholder token,
/// joins hyphen-broken line wraps, maps punctuation and any other
/// non-alphanumeric character to a space, optionally strips pure-numeric
/// tokens (`numok = false`), collapses whitespace, and trims.
pub fn clean_text(txt: &str, numok: bool) -> String {
    let txt = txt.to_lowercase();
    let txt = CID.replace_all(&txt, " UNK ");
    let txt = HYPHEN_LINE.replace_all(&txt, "");
    let txt = PUNCTUATION.replace_all(&txt, " ");
    let txt = NON_ALPHANUMERIC.replace_all(&txt, " ");
    let txt = if numok {
        txt
    } else {
        std::borrow::Cow::Owned(PURE_NUMBER.replace_all(&txt, " ").into_owned())
    };
    let txt = MULTI_WHITESPACE.replace_all(&txt, " ");
    txt.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_strips_punctuation() {
        assert_eq!(
            clean_text("Phys. Rev. Lett., 42:1-7", true),
            "phys rev lett 42 1 7"
        );
    }

    #[test]
    fn cid_artifacts_become_placeholder_tokens() {
        assert_eq!(clean_text("energy(cid:123)levels", true), "energy UNK levels");
    }

    #[test]
    fn hyphen_line_wraps_are_joined() {
        assert_eq!(clean_text("electro-\nmagnetic waves", true), "electromagnetic waves");
    }

    #[test]
    fn numeric_tokens_dropped_unless_numok() {
        assert_eq!(clean_text("volume 42 issue 7", false), "volume issue");
        assert_eq!(clean_text("volume 42 issue 7", true), "volume 42 issue 7");
        // Mixed alphanumerics survive either way.
        assert_eq!(clean_text("a1b2", false), "a1b2");
    }

    #[test]
    fn whitespace_collapses_and_trims() {
        assert_eq!(clean_text("  a \t b \n c  ", true), "a b c");
    }

    #[test]
    fn blank_input_stays_blank() {
        assert_eq!(clean_text("", true), "");
        assert_eq!(clean_text("  ...  ", true), "");
    }
}
