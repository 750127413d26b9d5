use crate::{
    error::ModelError,
    features::FeatureExtractor,
    models::Classifier,
    types::Label,
};
use tracing::debug;

/// Text-to-label pipeline: n-gram features followed by a linear classifier.
///
/// Immutable after construction, so one instance can be shared across request
/// handlers behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Predictor<L> {
    extractor: FeatureExtractor,
    classifier: Classifier<L>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction<L> {
    pub label: L,
    pub non_zero_features: usize,
    pub feature_width: usize,
}

impl<L: Label> Predictor<L> {
    pub fn new(extractor: FeatureExtractor, classifier: Classifier<L>) -> Result<Self, ModelError> {
        if classifier.n_features() != extractor.width() {
            return Err(ModelError::DimensionMismatch {
                expected: classifier.n_features(),
                actual: extractor.width(),
            });
        }

        Ok(Self {
            extractor,
            classifier,
        })
    }

    pub fn predict(&self, text: &str) -> Result<L, ModelError> {
        self.predict_detailed(text).map(|p| p.label)
    }

    pub fn predict_detailed(&self, text: &str) -> Result<Prediction<L>, ModelError> {
        let features = self.extractor.extract(text);
        let label = self.classifier.predict(&features)?.clone();

        debug!(
            "Predicted {} {} from {}/{} active features",
            L::KIND.as_str(),
            label,
            features.nnz(),
            features.width()
        );

        Ok(Prediction {
            label,
            non_zero_features: features.nnz(),
            feature_width: features.width(),
        })
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    pub fn classifier(&self) -> &Classifier<L> {
        &self.classifier
    }

    pub fn feature_width(&self) -> usize {
        self.extractor.width()
    }
}
