use crate::{
    error::ModelError,
    sparse::SparseVector,
    vocabulary::{tokenize, Vocabulary},
};
use tracing::debug;

/// Turns raw text into the concatenated n-gram count vector the classifier
/// was trained on.
///
/// Column layout is `[trigram | bigram | unigram]`. The classifier's weights
/// are indexed against this layout, so the order must never change.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    trigram: Vocabulary,
    bigram: Vocabulary,
    unigram: Vocabulary,
}

impl FeatureExtractor {
    pub fn new(
        unigram: Vocabulary,
        bigram: Vocabulary,
        trigram: Vocabulary,
    ) -> Result<Self, ModelError> {
        for (vocab, expected) in [(&unigram, 1), (&bigram, 2), (&trigram, 3)] {
            if vocab.order() != expected {
                return Err(ModelError::Invalid(format!(
                    "expected a {}-gram vocabulary, got a {}-gram one",
                    expected,
                    vocab.order()
                )));
            }
        }

        Ok(Self {
            trigram,
            bigram,
            unigram,
        })
    }

    pub fn extract(&self, text: &str) -> SparseVector {
        let tokens = tokenize(text);

        let z = self.trigram.transform(&tokens);
        let y = self.bigram.transform(&tokens);
        let x = self.unigram.transform(&tokens);

        let features = SparseVector::hstack(&[z, y, x]);
        debug!(
            "Extracted {} non-zero features from {} tokens",
            features.nnz(),
            tokens.len()
        );
        features
    }

    /// Total feature width, independent of any input.
    pub fn width(&self) -> usize {
        self.trigram.len() + self.bigram.len() + self.unigram.len()
    }

    pub fn unigram(&self) -> &Vocabulary {
        &self.unigram
    }

    pub fn bigram(&self) -> &Vocabulary {
        &self.bigram
    }

    pub fn trigram(&self) -> &Vocabulary {
        &self.trigram
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vocab(order: usize, terms: &[&str]) -> Vocabulary {
        let terms: HashMap<String, usize> = terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.to_string(), i))
            .collect();
        Vocabulary::from_terms(order, terms).unwrap()
    }

    fn extractor() -> FeatureExtractor {
        FeatureExtractor::new(
            vocab(1, &["love", "you", "me"]),
            vocab(2, &["in love", "love you"]),
            vocab(3, &["am in love"]),
        )
        .unwrap()
    }

    #[test]
    fn test_width_is_sum_of_vocabularies() {
        let fx = extractor();
        assert_eq!(fx.width(), 6);
        let long = "love you ".repeat(500);
        for text in ["", "x", "I am in love", long.as_str()] {
            assert_eq!(fx.extract(text).width(), 6);
        }
    }

    #[test]
    fn test_concatenation_order_is_trigram_bigram_unigram() {
        let fx = extractor();
        let v = fx.extract("I am in love");
        // trigram "am in love" | bigrams "in love", "love you" | unigrams "love", "you", "me"
        assert_eq!(v.to_dense(), vec![1.0, 1.0, 0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_out_of_vocabulary_text_is_all_zero() {
        let v = extractor().extract("goodbye cruel world");
        assert_eq!(v.nnz(), 0);
        assert!(v.to_dense().iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_rejects_vocabularies_in_wrong_slots() {
        let err = FeatureExtractor::new(
            vocab(2, &["in love"]),
            vocab(1, &["love"]),
            vocab(3, &[]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("expected a 1-gram vocabulary"));
    }
}
