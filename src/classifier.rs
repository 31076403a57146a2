use crate::game::Verification;
use include_dir::{include_dir, Dir};
use std::collections::HashSet;

static DICT_DIR: Dir = include_dir!("dictionary");

/// Seeds the initial verification state of a freshly submitted term.
///
/// Implementations only ever answer `Accepted` (known-good) or `Unset`
/// (unknown, left for the reviewer); rejection is a reviewer decision.
pub trait TermClassifier {
    fn classify(&self, term: &str) -> Verification;
}

/// Lookup against a fixed set of known terms, case-insensitive and
/// edge-trimmed.
pub struct DictionaryClassifier {
    terms: HashSet<String>,
}

impl DictionaryClassifier {
    /// Classifier backed by the term list embedded at build time.
    pub fn embedded() -> Self {
        let contents = DICT_DIR
            .get_file("terms.txt")
            .and_then(|f| f.contents_utf8())
            .unwrap_or("");
        Self::from_terms(contents.lines())
    }

    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms = terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_uppercase())
            .filter(|t| !t.is_empty())
            .collect();
        Self { terms }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl TermClassifier for DictionaryClassifier {
    fn classify(&self, term: &str) -> Verification {
        if self.terms.contains(&term.trim().to_uppercase()) {
            Verification::Accepted
        } else {
            Verification::Unset
        }
    }
}

/// Classifier that recognizes nothing; every round starts pending.
pub struct NullClassifier;

impl TermClassifier for NullClassifier {
    fn classify(&self, _term: &str) -> Verification {
        Verification::Unset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_dictionary_is_populated() {
        let dict = DictionaryClassifier::embedded();
        assert!(dict.len() > 100);
    }

    #[test]
    fn known_terms_classify_as_accepted() {
        let dict = DictionaryClassifier::embedded();
        assert_eq!(dict.classify("rust"), Verification::Accepted);
        assert_eq!(dict.classify("TYPESCRIPT"), Verification::Accepted);
        assert_eq!(dict.classify("  api  "), Verification::Accepted);
    }

    #[test]
    fn unknown_terms_stay_unset() {
        let dict = DictionaryClassifier::embedded();
        assert_eq!(dict.classify("banana bread"), Verification::Unset);
        assert_eq!(dict.classify(""), Verification::Unset);
    }

    #[test]
    fn custom_term_sets_work() {
        let dict = DictionaryClassifier::from_terms(["frob", " Nitz "]);
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.classify("FROB"), Verification::Accepted);
        assert_eq!(dict.classify("nitz"), Verification::Accepted);
        assert_eq!(dict.classify("quux"), Verification::Unset);
    }

    #[test]
    fn null_classifier_never_accepts() {
        assert_eq!(NullClassifier.classify("rust"), Verification::Unset);
    }
}
