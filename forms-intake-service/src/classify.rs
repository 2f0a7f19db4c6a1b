//! Keyword-scoring form classifier.
//!
//! Each form kind carries a fixed list of indicator phrases. A kind becomes a
//! candidate when at least [`MATCH_THRESHOLD`] distinct phrases occur anywhere
//! in the normalized text (substring containment, not word-boundary aware).
//! Ties between candidates resolve to the earliest kind in
//! [`FormKind::PRIORITY`], not the highest scorer.

use crate::models::FormKind;

/// Minimum distinct indicator phrases for a kind to be a candidate.
pub const MATCH_THRESHOLD: usize = 2;

/// Below this many characters the extracted text is considered near-empty and
/// the extractor's OCR fallback kicks in before classification gives up.
pub const MIN_TEXT_LEN: usize = 40;

const FC_INDICATORS: &[&str] = &[
    "form fc",
    "fc-gpr",
    "foreign collaboration",
    "foreign currency",
    "shares allotted",
    "foreign direct investment",
];

const APR_INDICATORS: &[&str] = &[
    "annual performance report",
    "apr",
    "overseas direct investment",
    "odi",
    "joint venture",
    "wholly owned subsidiary",
];

const ECB_INDICATORS: &[&str] = &[
    "ecb",
    "external commercial borrowing",
    "loan registration number",
    "lrn",
    "drawdown",
];

fn indicators(kind: FormKind) -> &'static [&'static str] {
    match kind {
        FormKind::Fc => FC_INDICATORS,
        FormKind::Apr => APR_INDICATORS,
        FormKind::Ecb => ECB_INDICATORS,
    }
}

/// Lowercase the text and fold Unicode dash variants to ASCII `-` so phrases
/// like "fc-gpr" match regardless of how the PDF encoded the dash.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .replace(['\u{2010}', '\u{2011}', '\u{2012}', '\u{2013}', '\u{2014}', '\u{2212}'], "-")
}

/// How many distinct indicator phrases of `kind` occur in the normalized text.
pub fn indicator_hits(kind: FormKind, normalized: &str) -> usize {
    indicators(kind)
        .iter()
        .filter(|phrase| normalized.contains(*phrase))
        .count()
}

/// Classify normalized text into a form kind, or `None` for "unknown".
///
/// Returning the first candidate in priority order means a tie never goes to
/// the highest-scoring kind; the fixed ordering decides.
pub fn classify(normalized: &str) -> Option<FormKind> {
    FormKind::PRIORITY
        .into_iter()
        .find(|kind| indicator_hits(*kind, normalized) >= MATCH_THRESHOLD)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_raw(text: &str) -> Option<FormKind> {
        classify(&normalize(text))
    }

    #[test]
    fn below_threshold_everywhere_is_unknown() {
        // One indicator per kind at most.
        assert_eq!(classify_raw("this mentions foreign currency once"), None);
        assert_eq!(classify_raw("a lone annual performance report"), None);
        assert_eq!(classify_raw("completely unrelated text"), None);
        assert_eq!(classify_raw(""), None);
    }

    #[test]
    fn two_indicators_for_one_kind_classify_it() {
        let text = "Return under FEMA: external commercial borrowing, \
                    loan registration number E12345";
        assert_eq!(classify_raw(text), Some(FormKind::Ecb));
    }

    #[test]
    fn apr_scenario_from_three_indicators() {
        let text = "...Annual Performance Report... APR submission... APR filing...";
        assert_eq!(classify_raw(text), Some(FormKind::Apr));
    }

    #[test]
    fn tie_resolves_to_priority_label_not_score() {
        // APR scores 3, FC scores 2; FC still wins because it is first in the
        // priority ordering.
        let text = "form fc with fc-gpr attached, annual performance report, \
                    apr details, overseas direct investment";
        assert!(indicator_hits(FormKind::Apr, &normalize(text)) > 2);
        assert_eq!(classify_raw(text), Some(FormKind::Fc));
    }

    #[test]
    fn normalization_folds_dashes_and_case() {
        let text = "FORM FC filing with FC\u{2013}GPR annexure";
        assert_eq!(classify_raw(text), Some(FormKind::Fc));
    }

    #[test]
    fn classification_is_idempotent() {
        let text = "annual performance report, apr filing, odi return";
        let normalized = normalize(text);
        let first = classify(&normalized);
        let second = classify(&normalized);
        assert_eq!(first, second);
        assert_eq!(first, Some(FormKind::Apr));
    }
}
