use crate::{
    config::ModelConfig,
    error::{AppError, ArtifactFailure, ArtifactKind, ModelError},
    features::FeatureExtractor,
    models::{Classifier, ClassifierArtifact},
    predictor::Predictor,
    types::Label,
    vocabulary::Vocabulary,
};
use sha2::{Digest, Sha256};
use std::{collections::HashMap, fs, path::Path};
use tracing::{debug, info};

/// A predictor together with the fingerprint of the artifacts it came from.
#[derive(Debug, Clone)]
pub struct LoadedModel<L> {
    pub predictor: Predictor<L>,
    pub fingerprint: String,
}

/// Reads and writes the four JSON artifacts of a trained model.
pub struct ModelStore;

impl ModelStore {
    /// Loads all four artifacts. Every unreadable or malformed artifact is
    /// reported in a single `ArtifactLoad` error; nothing is returned unless
    /// all of them load.
    pub fn load<L: Label>(config: &ModelConfig) -> Result<LoadedModel<L>, ModelError> {
        let mut failures = Vec::new();
        let mut hasher = Sha256::new();

        let unigram = load_vocabulary(
            ArtifactKind::UnigramVocab,
            1,
            &config.unigram_vocab,
            &mut hasher,
            &mut failures,
        );
        let bigram = load_vocabulary(
            ArtifactKind::BigramVocab,
            2,
            &config.bigram_vocab,
            &mut hasher,
            &mut failures,
        );
        let trigram = load_vocabulary(
            ArtifactKind::TrigramVocab,
            3,
            &config.trigram_vocab,
            &mut hasher,
            &mut failures,
        );
        let classifier = load_classifier::<L>(&config.classifier, &mut hasher, &mut failures);

        let (Some(unigram), Some(bigram), Some(trigram), Some(classifier)) =
            (unigram, bigram, trigram, classifier)
        else {
            return Err(ModelError::ArtifactLoad { failures });
        };

        info!(
            "Loaded vocabularies: {} unigrams, {} bigrams, {} trigrams",
            unigram.len(),
            bigram.len(),
            trigram.len()
        );

        let extractor = FeatureExtractor::new(unigram, bigram, trigram)?;
        let predictor = Predictor::new(extractor, classifier)?;
        let fingerprint = hex::encode(hasher.finalize());

        info!(
            "Loaded {} classifier with {} classes over {} features (fingerprint {})",
            predictor.classifier().rule().as_str(),
            predictor.classifier().classes().len(),
            predictor.feature_width(),
            fingerprint
        );

        Ok(LoadedModel {
            predictor,
            fingerprint,
        })
    }

    /// Writes the predictor's vocabularies and classifier to the configured
    /// paths in the same format `load` reads.
    pub fn save<L: Label>(config: &ModelConfig, predictor: &Predictor<L>) -> Result<(), AppError> {
        let extractor = predictor.extractor();
        write_json(&config.unigram_vocab, &extractor.unigram().to_terms())?;
        write_json(&config.bigram_vocab, &extractor.bigram().to_terms())?;
        write_json(&config.trigram_vocab, &extractor.trigram().to_terms())?;
        write_json(&config.classifier, &predictor.classifier().to_artifact())?;

        info!("Saved model artifacts to {}", config.classifier.display());
        Ok(())
    }
}

fn read_artifact(
    artifact: ArtifactKind,
    path: &Path,
    hasher: &mut Sha256,
    failures: &mut Vec<ArtifactFailure>,
) -> Option<Vec<u8>> {
    match fs::read(path) {
        Ok(bytes) => {
            hasher.update((bytes.len() as u64).to_le_bytes());
            hasher.update(&bytes);
            debug!("Read {} ({} bytes) from {}", artifact, bytes.len(), path.display());
            Some(bytes)
        }
        Err(e) => {
            failures.push(ArtifactFailure {
                artifact,
                path: path.to_path_buf(),
                reason: e.to_string(),
            });
            None
        }
    }
}

fn load_vocabulary(
    artifact: ArtifactKind,
    order: usize,
    path: &Path,
    hasher: &mut Sha256,
    failures: &mut Vec<ArtifactFailure>,
) -> Option<Vocabulary> {
    let bytes = read_artifact(artifact, path, hasher, failures)?;

    let parsed = serde_json::from_slice::<HashMap<String, usize>>(&bytes)
        .map_err(|e| e.to_string())
        .and_then(|terms| Vocabulary::from_terms(order, terms).map_err(|e| e.to_string()));

    match parsed {
        Ok(vocab) => Some(vocab),
        Err(reason) => {
            failures.push(ArtifactFailure {
                artifact,
                path: path.to_path_buf(),
                reason,
            });
            None
        }
    }
}

fn load_classifier<L: Label>(
    path: &Path,
    hasher: &mut Sha256,
    failures: &mut Vec<ArtifactFailure>,
) -> Option<Classifier<L>> {
    let artifact = ArtifactKind::Classifier;
    let bytes = read_artifact(artifact, path, hasher, failures)?;

    let parsed = serde_json::from_slice::<ClassifierArtifact<L>>(&bytes)
        .map_err(|e| e.to_string())
        .and_then(|a| Classifier::from_artifact(a).map_err(|e| e.to_string()));

    match parsed {
        Ok(classifier) => Some(classifier),
        Err(reason) => {
            failures.push(ArtifactFailure {
                artifact,
                path: path.to_path_buf(),
                reason,
            });
            None
        }
    }
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let bytes = serde_json::to_vec_pretty(value)?;
    fs::write(path, bytes)?;
    Ok(())
}
