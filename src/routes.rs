use axum::{
    extract::{Query, State},
    response::{Html, Redirect},
    routing::{get, post},
    Form, Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    engine::PredictionService,
    error::{validation_error, AppError},
    types::{
        HealthResponse, IndexQuery, Label, LabelKind, ListQuery, PredictRequest, PredictResponse,
        PredictionRecord, SubmitForm,
    },
};

const MAX_LIST_LIMIT: i64 = 1000;

pub struct AppState<L> {
    pub service: Arc<PredictionService<L>>,
    pub metrics: Option<PrometheusHandle>,
    pub page_size: i64,
}

impl<L> Clone for AppState<L> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            metrics: self.metrics.clone(),
            page_size: self.page_size,
        }
    }
}

pub fn build_router<L: Label>(state: AppState<L>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/", get(show_predictions::<L>))
        .route("/add", post(add_prediction::<L>))
        .route("/api/predict", post(predict::<L>))
        .route("/api/predictions", get(list_predictions::<L>))
        .route("/health", get(health_check::<L>))
        .route("/metrics", get(metrics_endpoint::<L>))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn show_predictions<L: Label>(
    State(state): State<AppState<L>>,
    Query(query): Query<IndexQuery>,
) -> Result<Html<String>, AppError> {
    let records = state.service.recent(state.page_size).await?;
    Ok(Html(render_index(L::KIND, &records, query.posted.is_some())))
}

pub async fn add_prediction<L: Label>(
    State(state): State<AppState<L>>,
    Form(form): Form<SubmitForm>,
) -> Result<Redirect, AppError> {
    let (_, record) = state.service.submit(&form.text).await?;
    info!("Prediction {} posted: {}", record.id, record.label);
    Ok(Redirect::to("/?posted=1"))
}

pub async fn predict<L: Label>(
    State(state): State<AppState<L>>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, AppError> {
    let (prediction, prediction_id) = if request.persist {
        let (prediction, record) = state.service.submit(&request.text).await?;
        (prediction, Some(record.id))
    } else {
        (state.service.preview(&request.text)?, None)
    };

    Ok(Json(PredictResponse {
        label: prediction.label.to_string(),
        label_kind: L::KIND,
        non_zero_features: prediction.non_zero_features,
        feature_width: prediction.feature_width,
        prediction_id,
    }))
}

pub async fn list_predictions<L: Label>(
    State(state): State<AppState<L>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<PredictionRecord>>, AppError> {
    let limit = query.limit.unwrap_or(state.page_size);
    if !(1..=MAX_LIST_LIMIT).contains(&limit) {
        return Err(validation_error(&format!(
            "limit must be between 1 and {}",
            MAX_LIST_LIMIT
        )));
    }

    Ok(Json(state.service.recent(limit).await?))
}

pub async fn health_check<L: Label>(State(state): State<AppState<L>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        label_kind: L::KIND,
        model_fingerprint: state.service.fingerprint().to_string(),
        feature_width: state.service.feature_width(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

pub async fn metrics_endpoint<L: Label>(State(state): State<AppState<L>>) -> String {
    state
        .metrics
        .as_ref()
        .map(PrometheusHandle::render)
        .unwrap_or_default()
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn render_index(kind: LabelKind, records: &[PredictionRecord], posted: bool) -> String {
    let (title, prompt, column) = match kind {
        LabelKind::Rating => ("Review Rating Predictions", "Paste a review", "Predicted rating"),
        LabelKind::Artist => ("Lyrics Artist Predictions", "Paste some song lyrics", "Predicted artist"),
    };

    let flash = if posted {
        r#"<div class="flash">Prediction was successfully posted</div>"#
    } else {
        ""
    };

    let rows = if records.is_empty() {
        r#"<li class="empty">No predictions yet.</li>"#.to_string()
    } else {
        records
            .iter()
            .map(|r| {
                format!(
                    r#"<li><span class="label">{}</span><p>{}</p><time datetime="{}">{}</time></li>"#,
                    escape_html(&r.label),
                    escape_html(&r.input_text),
                    r.created_at.to_rfc3339(),
                    r.created_at.format("%Y-%m-%d %H:%M UTC"),
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <style>
        body {{ font-family: sans-serif; max-width: 48em; margin: 2em auto; }}
        textarea {{ width: 100%; }}
        .flash {{ background: #cee5f5; padding: 0.5em; }}
        .label {{ font-weight: bold; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ border-bottom: 1px solid #ddd; padding: 0.5em 0; }}
    </style>
</head>
<body>
    <h1>{title}</h1>
    {flash}
    <form action="/add" method="post">
        <label for="text">{prompt}</label>
        <textarea id="text" name="text" rows="6"></textarea>
        <input type="submit" value="Predict">
    </form>
    <h2>{column}</h2>
    <ul class="predictions">
{rows}
    </ul>
</body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::love_service;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;

    async fn app() -> Router {
        let state = AppState {
            service: Arc::new(love_service().await),
            metrics: None,
            page_size: 100,
        };
        build_router(state, 64 * 1024)
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn form_post(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/add")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Tom & Jerry's"</b>"#),
            "&lt;b&gt;&quot;Tom &amp; Jerry&#39;s&quot;&lt;/b&gt;"
        );
    }

    #[tokio::test]
    async fn test_index_starts_empty() {
        let response = app().await.oneshot(get_request("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_string(response).await;
        assert!(html.contains("Lyrics Artist Predictions"));
        assert!(html.contains("No predictions yet."));
        assert!(!html.contains("successfully posted"));
    }

    #[tokio::test]
    async fn test_add_redirects_and_lists_prediction() {
        let app = app().await;

        let response = app
            .clone()
            .oneshot(form_post("text=I+am+in+love"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/?posted=1");

        let html = body_string(app.oneshot(get_request("/?posted=1")).await.unwrap()).await;
        assert!(html.contains("Prediction was successfully posted"));
        assert!(html.contains(r#"<span class="label">ArtistA</span><p>I am in love</p>"#));
    }

    #[tokio::test]
    async fn test_index_escapes_user_text() {
        let app = app().await;
        app.clone()
            .oneshot(form_post("text=%3Cscript%3Ealert(1)%3C%2Fscript%3E"))
            .await
            .unwrap();

        let html = body_string(app.oneshot(get_request("/")).await.unwrap()).await;
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[tokio::test]
    async fn test_add_without_text_field_is_rejected() {
        let response = app().await.oneshot(form_post("lyrics=hello")).await.unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_api_predict_preview_and_persist() {
        let app = app().await;

        let request = |body: &str| {
            Request::builder()
                .method("POST")
                .uri("/api/predict")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap()
        };

        let response = app
            .clone()
            .oneshot(request(r#"{"text": "goodbye"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["label"], "ArtistB");
        assert_eq!(json["label_kind"], "artist");
        assert_eq!(json["non_zero_features"], 0);
        assert_eq!(json["feature_width"], 2);
        assert!(json.get("prediction_id").is_none());

        let response = app
            .clone()
            .oneshot(request(r#"{"text": "in love", "persist": true}"#))
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["label"], "ArtistA");
        assert_eq!(json["prediction_id"], 1);

        let response = app.oneshot(get_request("/api/predictions")).await.unwrap();
        let records: Vec<PredictionRecord> =
            serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].input_text, "in love");
    }

    #[tokio::test]
    async fn test_list_rejects_out_of_range_limit() {
        let response = app()
            .await
            .oneshot(get_request("/api/predictions?limit=0"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health_reports_model() {
        let response = app().await.oneshot(get_request("/health")).await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["model_fingerprint"], "test-fingerprint");
        assert_eq!(json["feature_width"], 2);
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let state = AppState {
            service: Arc::new(love_service().await),
            metrics: None,
            page_size: 100,
        };
        let app = build_router(state, 16);

        let response = app
            .oneshot(form_post(&format!("text={}", "love+".repeat(100))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
