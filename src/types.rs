use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;

/// Which label domain a deployment's classifier predicts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LabelKind {
    Artist,
    Rating,
}

impl LabelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelKind::Artist => "artist",
            LabelKind::Rating => "rating",
        }
    }
}

/// A class value the classifier can emit.
pub trait Label:
    Clone + fmt::Debug + fmt::Display + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const KIND: LabelKind;
}

/// An artist name, predicted from song lyrics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Artist(pub String);

impl fmt::Display for Artist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Label for Artist {
    const KIND: LabelKind = LabelKind::Artist;
}

/// A star rating, predicted from review text. Business ratings come in half
/// steps, so classes are read as floats.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, PartialOrd)]
#[serde(transparent)]
pub struct Rating(pub f64);

impl fmt::Display for Rating {
    // f64 Display already drops a zero fraction: 4.0 prints as "4"
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Label for Rating {
    const KIND: LabelKind = LabelKind::Rating;
}

/// A persisted (input, label) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionRecord {
    pub id: i64,
    pub input_text: String,
    pub label: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitForm {
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictRequest {
    pub text: String,
    #[serde(default)]
    pub persist: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictResponse {
    pub label: String,
    pub label_kind: LabelKind,
    pub non_zero_features: usize,
    pub feature_width: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndexQuery {
    #[serde(default)]
    pub posted: Option<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub label_kind: LabelKind,
    pub model_fingerprint: String,
    pub feature_width: usize,
    pub timestamp: String,
}
