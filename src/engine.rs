use crate::{
    error::AppError,
    model_store::LoadedModel,
    predictor::{Prediction, Predictor},
    storage::PredictionStore,
    telemetry,
    types::{Label, PredictionRecord},
};
use std::{sync::Arc, time::Instant};
use tracing::{debug, info};

/// Runs predictions against the loaded model and records them.
///
/// Built once at startup and handed to request handlers; the model inside is
/// read-only, so handlers share it without locking.
pub struct PredictionService<L> {
    predictor: Arc<Predictor<L>>,
    fingerprint: String,
    store: PredictionStore,
}

impl<L: Label> PredictionService<L> {
    pub fn new(model: LoadedModel<L>, store: PredictionStore) -> Self {
        info!(
            "Prediction service ready: {} labels, model {}",
            L::KIND.as_str(),
            model.fingerprint
        );
        Self {
            predictor: Arc::new(model.predictor),
            fingerprint: model.fingerprint,
            store,
        }
    }

    /// Predicts a label for `text` without storing anything.
    pub fn preview(&self, text: &str) -> Result<Prediction<L>, AppError> {
        let start = Instant::now();

        let prediction = match self.predictor.predict_detailed(text) {
            Ok(p) => p,
            Err(e) => {
                telemetry::observe_error();
                return Err(e.into());
            }
        };

        telemetry::observe_prediction(&prediction.label.to_string(), start.elapsed());
        Ok(prediction)
    }

    /// Predicts a label for `text` and appends the pair to the store.
    pub async fn submit(&self, text: &str) -> Result<(Prediction<L>, PredictionRecord), AppError> {
        let prediction = self.preview(text)?;
        let record = self
            .store
            .insert(text, &prediction.label.to_string())
            .await?;

        debug!("Recorded prediction {} as {}", record.id, record.label);
        Ok((prediction, record))
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<PredictionRecord>, AppError> {
        self.store.list_recent(limit).await
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn feature_width(&self) -> usize {
        self.predictor.feature_width()
    }

    pub fn store(&self) -> &PredictionStore {
        &self.store
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{predictor::tests::love_predictor, types::Artist};

    pub(crate) async fn love_service() -> PredictionService<Artist> {
        let model = LoadedModel {
            predictor: love_predictor(),
            fingerprint: "test-fingerprint".to_string(),
        };
        let store = PredictionStore::in_memory().await.unwrap();
        PredictionService::new(model, store)
    }

    #[tokio::test]
    async fn test_submit_persists_prediction() {
        let service = love_service().await;

        let (prediction, record) = service.submit("I am in love").await.unwrap();
        assert_eq!(prediction.label, Artist("ArtistA".to_string()));
        assert_eq!(record.label, "ArtistA");
        assert_eq!(record.input_text, "I am in love");

        let recent = service.recent(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, record.id);
    }

    #[tokio::test]
    async fn test_preview_does_not_persist() {
        let service = love_service().await;

        let prediction = service.preview("goodbye").unwrap();
        assert_eq!(prediction.label, Artist("ArtistB".to_string()));
        assert_eq!(tokio_test::assert_ok!(service.store().count().await), 0);
    }

    #[tokio::test]
    async fn test_recent_is_newest_first() {
        let service = love_service().await;
        service.submit("goodbye").await.unwrap();
        service.submit("in love again").await.unwrap();

        let labels: Vec<String> = service
            .recent(10)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.label)
            .collect();
        assert_eq!(labels, vec!["ArtistA", "ArtistB"]);
    }
}
