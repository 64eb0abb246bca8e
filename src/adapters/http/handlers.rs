//! HTTP handlers for the assessment endpoints.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::SharedModel;
use crate::application::AssessmentService;
use crate::domain::RawClinicalInput;
use crate::{CardioError, ErrorKind};

use super::dto::{ErrorResponse, HealthResponse, PredictResponse};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct AppState {
    service: Arc<AssessmentService<SharedModel>>,
}

impl AppState {
    pub fn new(service: Arc<AssessmentService<SharedModel>>) -> Self {
        Self { service }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/predict - Assess one clinical record
pub async fn predict(State(state): State<AppState>, body: Bytes) -> Response {
    let raw = match parse_record(&body) {
        Ok(raw) => raw,
        Err(message) => return bad_request(message),
    };

    let input = match raw.into_clinical_input() {
        Ok(input) => input,
        Err(e) => return bad_request(e.to_string()),
    };

    // Model load and inference are synchronous.
    let service = Arc::clone(&state.service);
    match tokio::task::spawn_blocking(move || service.assess(&input)).await {
        Ok(Ok(assessment)) => {
            (StatusCode::OK, Json(PredictResponse::from(&assessment))).into_response()
        }
        Ok(Err(e)) => handle_assessment_error(e),
        Err(e) => {
            tracing::error!("Assessment task failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Assessment task failed")),
            )
                .into_response()
        }
    }
}

/// GET /api/health - Liveness and model status
///
/// Attempts the lazy model load so a freshly deployed artifact is picked up.
pub async fn health(State(state): State<AppState>) -> Response {
    let model = Arc::clone(state.service.classifier());
    let model_path = model.path().display().to_string();

    let model_loaded = tokio::task::spawn_blocking(move || model.get().is_ok())
        .await
        .unwrap_or(false);

    let response = HealthResponse {
        status: "healthy".to_string(),
        model_loaded,
        model_path,
    };
    (StatusCode::OK, Json(response)).into_response()
}

// ════════════════════════════════════════════════════════════════════════════
// Helpers
// ════════════════════════════════════════════════════════════════════════════

/// Decode a request body into a raw record. Must be a JSON object carrying at
/// least one non-null clinical field.
fn parse_record(body: &[u8]) -> Result<RawClinicalInput, String> {
    const NO_DATA: &str = "No data provided";

    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| format!("Invalid JSON: {e}"))?;

    match value.as_object() {
        None => return Err("Request body must be a JSON object".to_string()),
        Some(fields) if fields.is_empty() => return Err(NO_DATA.to_string()),
        Some(_) => {}
    }

    let raw: RawClinicalInput =
        serde_json::from_value(value).map_err(|e| format!("Invalid field type: {e}"))?;
    if raw.is_empty() {
        return Err(NO_DATA.to_string());
    }
    Ok(raw)
}

fn bad_request(message: String) -> Response {
    tracing::warn!("Rejected request: {message}");
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message))).into_response()
}

fn handle_assessment_error(e: CardioError) -> Response {
    let status = match e.kind() {
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::ModelUnavailable | ErrorKind::Classifier => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!("Assessment failed: {e}");
    } else {
        tracing::warn!("Assessment rejected: {e}");
    }
    (status, Json(ErrorResponse::new(e.to_string()))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::http::{router, HealthResponse, PredictResponse};
    use crate::adapters::logistic::{ExportedLogisticModel, Integrity, LogisticModel};
    use crate::domain::{FeatureEncoder, RecommendationEngine, FEATURE_COUNT, FEATURE_NAMES};
    use axum::body::Body;
    use axum::http::{header, Request};
    use tower::ServiceExt;

    // ───────────────────────────────────────────────────────────────
    // Fixtures
    // ───────────────────────────────────────────────────────────────

    /// Identity scaling; only `ap_hi` contributes, p = 0.5 at 140 mmHg.
    fn blood_pressure_model() -> LogisticModel {
        let mut coefficients = vec![0.0; FEATURE_COUNT];
        coefficients[3] = 0.1;
        LogisticModel::from_params(ExportedLogisticModel {
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            coefficients,
            intercept: -14.0,
            scaler_mean: vec![0.0; FEATURE_COUNT],
            scaler_scale: vec![1.0; FEATURE_COUNT],
            threshold: 0.5,
            supports_probability: true,
        })
        .expect("valid params")
    }

    fn state_for(model: SharedModel) -> AppState {
        AppState::new(Arc::new(AssessmentService::new(
            Arc::new(model),
            FeatureEncoder::default(),
            RecommendationEngine::default(),
        )))
    }

    fn loaded_state() -> AppState {
        state_for(SharedModel::preloaded("memory/cardio_model.json", blood_pressure_model()))
    }

    async fn post(state: AppState, body: &str) -> (StatusCode, serde_json::Value) {
        let response = router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/predict")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn get_health(state: AppState) -> HealthResponse {
        let response = router(state)
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    // ───────────────────────────────────────────────────────────────
    // Tests
    // ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn predict_rejects_empty_object() {
        let (status, body) = post(loaded_state(), "{}").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No data provided");
    }

    #[tokio::test]
    async fn predict_rejects_all_null_fields() {
        let (status, body) = post(loaded_state(), r#"{"gender": null, "ap_hi": null}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No data provided");
    }

    #[tokio::test]
    async fn predict_accepts_five_bucket_age_group_under_default_settings() {
        let settings = crate::config::Settings::default();
        let state = AppState::new(Arc::new(AssessmentService::new(
            Arc::new(SharedModel::preloaded(
                "memory/cardio_model.json",
                blood_pressure_model(),
            )),
            settings.encoder(),
            settings.recommendation_engine(),
        )));

        // What the assessment form sends for an 80-year-old.
        let (status, body) = post(
            state,
            r#"{"gender": 1, "height": 170, "weight": 72, "ap_hi": 135, "ap_lo": 85,
                "cholesterol": 1, "gluc": 1, "smoke": 0, "alco": 0, "active": 1,
                "ageInYr": 80, "bmi": 24.9, "hypertension": 0, "obese": 0,
                "age_group": 4}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["prediction"], 0);
        let categories: Vec<&str> = body["recommendations"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["category"].as_str().unwrap())
            .collect();
        assert_eq!(categories, vec!["Regular Checkups", "Maintain Health"]);
    }

    #[tokio::test]
    async fn predict_rejects_non_object_bodies() {
        let (status, body) = post(loaded_state(), "[1, 2, 3]").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("JSON object"));

        let (status, body) = post(loaded_state(), "not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON"));
    }

    #[tokio::test]
    async fn predict_rejects_out_of_domain_values() {
        let (status, body) = post(loaded_state(), r#"{"cholesterol": 5, "smoke": 2}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error = body["error"].as_str().unwrap();
        assert!(error.contains("cholesterol"));
        assert!(error.contains("smoke"));

        let (status, _) = post(loaded_state(), r#"{"height": "tall"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn predict_high_risk_response_shape() {
        let (status, body) = post(
            loaded_state(),
            r#"{"gender": 1, "ap_hi": 160, "ap_lo": 100, "smoke": 1}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let response: PredictResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.prediction, 1);
        assert_eq!(response.risk_level, "High Risk");
        let p = response.probability.expect("probability present");
        assert!(p > 0.5 && p <= 1.0);

        let categories: Vec<&str> = response
            .recommendations
            .iter()
            .map(|r| r.category.as_str())
            .collect();
        assert_eq!(categories[0], "Consult Doctor");
        assert!(categories.contains(&"Blood Pressure"));
        assert!(categories.contains(&"Smoking"));
        assert!(!categories.contains(&"Maintain Health"));
        assert!(response.recommendations.iter().all(|r| !r.text.is_empty()));
    }

    #[tokio::test]
    async fn predict_low_risk_ends_with_maintain_health() {
        let (status, body) = post(loaded_state(), r#"{"gender": 0}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["prediction"], 0);
        assert_eq!(body["risk_level"], "Low Risk");

        let recommendations = body["recommendations"].as_array().unwrap();
        let last = recommendations.last().unwrap();
        assert_eq!(last["category"], "Maintain Health");
        assert!(last.get("advisory").is_none());
    }

    #[tokio::test]
    async fn predict_without_model_is_server_error() {
        let state = state_for(SharedModel::logistic(
            "/nonexistent/cardio_model.json",
            Integrity::Optional,
        ));
        let (status, body) = post(state, r#"{"ap_hi": 130}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("Model unavailable"));
    }

    #[tokio::test]
    async fn health_reports_model_status() {
        let health = get_health(loaded_state()).await;
        assert_eq!(health.status, "healthy");
        assert!(health.model_loaded);
        assert_eq!(health.model_path, "memory/cardio_model.json");

        let missing = get_health(state_for(SharedModel::logistic(
            "/nonexistent/cardio_model.json",
            Integrity::Optional,
        )))
        .await;
        assert_eq!(missing.status, "healthy");
        assert!(!missing.model_loaded);
    }

    #[test]
    fn parse_record_accepts_partial_objects() {
        let raw = parse_record(br#"{"ageInYr": 61, "bmi": 31.2}"#).expect("valid");
        assert_eq!(raw.age_in_yr, Some(61.0));
        assert_eq!(raw.bmi, Some(31.2));
        assert!(raw.gender.is_none());

        assert_eq!(
            parse_record(br#"{"bmi": null}"#).expect_err("all null"),
            "No data provided"
        );
    }
}
