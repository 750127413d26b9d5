use crate::{error::ModelError, sparse::SparseVector};
use regex::Regex;
use std::{
    collections::{BTreeMap, HashMap},
    sync::OnceLock,
};

/// Tokens are runs of two or more word characters, matched on lowercased text.
/// A word character is a letter, a number or `_`. Combining marks split words,
/// as they do in the tokenizer the vocabularies were built with; regex's `\w`
/// would keep them.
const TOKEN_PATTERN: &str = r"[\p{L}\p{N}_]{2,}";

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TOKEN_PATTERN).expect("token pattern is valid"))
}

pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    token_regex()
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Every window of `n` consecutive tokens, space-joined.
pub fn ngrams(tokens: &[String], n: usize) -> impl Iterator<Item = String> + '_ {
    // windows(0) panics
    tokens.windows(n.max(1)).map(|w| w.join(" "))
}

/// A fixed n-gram vocabulary mapping each term to its feature column.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    order: usize,
    terms: HashMap<String, usize>,
}

impl Vocabulary {
    /// Validates that indices cover `0..len` exactly once and that every term
    /// is a normalised n-gram of the given order.
    pub fn from_terms(order: usize, terms: HashMap<String, usize>) -> Result<Self, ModelError> {
        if order == 0 {
            return Err(ModelError::Invalid("n-gram order must be at least 1".to_string()));
        }

        let mut seen = vec![false; terms.len()];
        for (term, &index) in &terms {
            match seen.get_mut(index) {
                Some(slot) if !*slot => *slot = true,
                Some(_) => {
                    return Err(ModelError::Invalid(format!(
                        "feature index {} is assigned more than once",
                        index
                    )))
                }
                None => {
                    return Err(ModelError::Invalid(format!(
                        "feature index {} for {:?} is outside 0..{}",
                        index,
                        term,
                        terms.len()
                    )))
                }
            }

            let tokens = tokenize(term);
            if tokens.len() != order || tokens.join(" ") != *term {
                return Err(ModelError::Invalid(format!(
                    "term {:?} is not a {}-gram",
                    term, order
                )));
            }
        }

        Ok(Self { order, terms })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.terms.get(term).copied()
    }

    /// Counts of in-vocabulary n-grams over an already tokenized text.
    pub fn transform(&self, tokens: &[String]) -> SparseVector {
        let mut counts = BTreeMap::new();
        for gram in ngrams(tokens, self.order) {
            if let Some(index) = self.index_of(&gram) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }
        SparseVector::from_counts(self.len(), counts)
    }

    pub fn to_terms(&self) -> BTreeMap<String, usize> {
        self.terms
            .iter()
            .map(|(term, index)| (term.clone(), *index))
            .collect()
    }
}
