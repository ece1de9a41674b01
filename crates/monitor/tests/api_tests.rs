//! Integration tests for the prediction API

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use monitor_lib::{
    health::{components, HealthRegistry},
    models::FeatureVector,
    observability::{MonitorMetrics, StructuredLogger},
    pipeline::{CategoryVocabulary, HealthPipeline},
    store::{VerdictKey, VerdictStore},
    Classification, Classifier,
};
use serde_json::{json, Value};
use tower::ServiceExt;

#[path = "../src/api.rs"]
mod api;

use api::AppState;

/// Classifier stub returning a fixed label and confidence
struct StubClassifier {
    label: &'static str,
    confidence: f64,
}

impl Classifier for StubClassifier {
    fn classify(&self, _vector: &FeatureVector) -> anyhow::Result<Classification> {
        let mut probabilities = BTreeMap::new();
        let other = 1.0 - self.confidence;
        if self.label == "healthy" {
            probabilities.insert("healthy".to_string(), self.confidence);
            probabilities.insert("unhealthy".to_string(), other);
        } else {
            probabilities.insert("healthy".to_string(), other);
            probabilities.insert("unhealthy".to_string(), self.confidence);
        }
        Ok(Classification {
            label: self.label.to_string(),
            probabilities,
        })
    }

    fn model_version(&self) -> &str {
        "stub"
    }
}

/// Store stub recording every upsert
#[derive(Default)]
struct RecordingStore {
    writes: Mutex<Vec<(VerdictKey, Value)>>,
}

#[async_trait::async_trait]
impl VerdictStore for RecordingStore {
    async fn upsert(&self, key: &VerdictKey, document: &Value) -> anyhow::Result<()> {
        self.writes
            .lock()
            .unwrap()
            .push((key.clone(), document.clone()));
        Ok(())
    }
}

async fn setup_app(
    label: &'static str,
    confidence: f64,
    store: Option<Arc<RecordingStore>>,
) -> (axum::Router, Arc<AppState>) {
    let pipeline = Arc::new(HealthPipeline::new(
        Arc::new(StubClassifier { label, confidence }),
        CategoryVocabulary::new(
            "breed_type",
            vec![
                "Cross Breed".to_string(),
                "Holstein".to_string(),
                "Normal Breed".to_string(),
            ],
        ),
        CategoryVocabulary::new(
            "faecal_consistency",
            vec![
                "black faece".to_string(),
                "ideal".to_string(),
                "watery".to_string(),
            ],
        ),
    ));

    let health_registry = HealthRegistry::new();
    health_registry.register(components::CLASSIFIER).await;
    health_registry.set_ready(true).await;

    let state = Arc::new(AppState::new(
        pipeline,
        health_registry,
        MonitorMetrics::new(),
        StructuredLogger::new("herd-monitor-test"),
        store.map(|s| s as Arc<dyn VerdictStore>),
        "test-app".to_string(),
    ));
    let router = api::create_router(state.clone());

    (router, state)
}

fn healthy_cow() -> Value {
    json!({
        "body_temperature": 38.5,
        "breed_type": "Holstein",
        "milk_production": 22.0,
        "respiratory_rate": 30,
        "walking_capacity": 12000,
        "sleeping_duration": 6.0,
        "body_condition_score": 3.5,
        "heart_rate": 60,
        "eating_duration": 4.0,
        "lying_down_duration": 10.0,
        "ruminating": 6.0,
        "rumen_fill": 3,
        "faecal_consistency": "ideal",
        "cattle_id": "COW-42"
    })
}

fn post_predict(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_healthy_prediction_is_low_risk() {
    let (app, _state) = setup_app("healthy", 0.95, None).await;

    let response = app
        .oneshot(post_predict(healthy_cow().to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    assert_eq!(body["cattle_id"], "COW-42");
    assert_eq!(body["monitoring_results"]["health_status"], "Healthy");
    assert_eq!(body["monitoring_results"]["risk_level"], "Low");
    assert_eq!(body["monitoring_results"]["confidence"], "95.00%");
    assert_eq!(body["ml_predictions_detail"]["predicted_class"], "healthy");
    assert_eq!(body["specific_diseases_detected"], json!([]));
    assert_eq!(body["alerts"], json!([]));
    assert_eq!(body["input_data_snapshot"], healthy_cow());
}

#[tokio::test]
async fn test_missing_field_returns_400_with_names() {
    let (app, _state) = setup_app("healthy", 0.95, None).await;

    let mut request = healthy_cow();
    request.as_object_mut().unwrap().remove("milk_production");

    let response = app
        .oneshot(post_predict(request.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Missing features in input");
    assert_eq!(body["missing"], json!(["milk_production"]));
}

#[tokio::test]
async fn test_non_json_body_returns_400() {
    let (app, _state) = setup_app("healthy", 0.95, None).await;

    let response = app
        .oneshot(post_predict("not json at all".to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Request must be JSON");
}

#[tokio::test]
async fn test_missing_cattle_id_falls_back_to_unknown() {
    let (app, _state) = setup_app("healthy", 0.95, None).await;

    let mut request = healthy_cow();
    request.as_object_mut().unwrap().remove("cattle_id");

    let response = app
        .oneshot(post_predict(request.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["cattle_id"], "Unknown");
}

#[tokio::test]
async fn test_systemic_symptoms_force_critical_verdict() {
    // Classifier insists the animal is healthy; rules must win
    let (app, _state) = setup_app("healthy", 0.99, None).await;

    let mut request = healthy_cow();
    request["body_temperature"] = json!(39.9);
    request["heart_rate"] = json!(85);
    request["respiratory_rate"] = json!(45);

    let response = app
        .oneshot(post_predict(request.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    assert_eq!(body["monitoring_results"]["risk_level"], "Critical");
    assert_eq!(body["monitoring_results"]["health_status"], "Unhealthy");
    let diseases = body["specific_diseases_detected"].as_array().unwrap();
    assert!(diseases.contains(&json!("Systemic Infection")));

    // Alerts arrive severity-sorted, Critical first
    let alerts = body["alerts"].as_array().unwrap();
    assert!(!alerts.is_empty());
    assert_eq!(alerts[0]["severity"], "Critical");
}

#[tokio::test]
async fn test_unhealthy_prediction_with_gi_alert() {
    let (app, _state) = setup_app("unhealthy", 0.9, None).await;

    let mut request = healthy_cow();
    request["faecal_consistency"] = json!("Black faece");

    let response = app
        .oneshot(post_predict(request.to_string()))
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(body["monitoring_results"]["risk_level"], "High");
    assert_eq!(body["monitoring_results"]["health_status"], "Unhealthy");

    let alerts = body["alerts"].as_array().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["severity"], "High");
    assert_eq!(alerts[0]["rule_triggered"], "GI_Feces");
    assert_eq!(alerts[0]["value"], "Black faece");
}

#[tokio::test]
async fn test_verdict_is_persisted_with_user_key() {
    let store = Arc::new(RecordingStore::default());
    let (app, _state) = setup_app("healthy", 0.95, Some(store.clone())).await;

    let request = Request::builder()
        .method("POST")
        .uri("/predict")
        .header("content-type", "application/json")
        .header("x-user-id", "farmer-7")
        .body(Body::from(healthy_cow().to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The write is spawned fire-and-forget; give it a moment to land
    let mut writes = Vec::new();
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        writes = store.writes.lock().unwrap().clone();
        if !writes.is_empty() {
            break;
        }
    }

    assert_eq!(writes.len(), 1);
    let (key, document) = &writes[0];
    assert_eq!(key.app_namespace, "test-app");
    assert_eq!(key.user_id, "farmer-7");
    assert_eq!(key.cattle_id, "COW-42");
    assert_eq!(document["cattle_id"], "COW-42");
}

#[tokio::test]
async fn test_missing_user_header_degrades_to_anonymous() {
    let store = Arc::new(RecordingStore::default());
    let (app, _state) = setup_app("healthy", 0.95, Some(store.clone())).await;

    let response = app
        .oneshot(post_predict(healthy_cow().to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut writes = Vec::new();
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        writes = store.writes.lock().unwrap().clone();
        if !writes.is_empty() {
            break;
        }
    }

    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].0.user_id, monitor_lib::ANONYMOUS_USER);
}

#[tokio::test]
async fn test_healthz_returns_ok_when_healthy() {
    let (app, _state) = setup_app("healthy", 0.95, None).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let health = body_json(response).await;
    assert_eq!(health["status"], "healthy");
    assert!(health["components"]["classifier"].is_object());
}

#[tokio::test]
async fn test_healthz_returns_503_when_unhealthy() {
    let (app, state) = setup_app("healthy", 0.95, None).await;

    state
        .health_registry
        .set_unhealthy(components::CLASSIFIER, "Model unloaded")
        .await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_readyz_reflects_readiness() {
    let (app, state) = setup_app("healthy", 0.95, None).await;

    state.health_registry.set_ready(false).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/readyz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let readiness = body_json(response).await;
    assert_eq!(readiness["ready"], false);
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let (app, _state) = setup_app("healthy", 0.95, None).await;

    // Generate one prediction so counters exist
    let _ = app
        .clone()
        .oneshot(post_predict(healthy_cow().to_string()))
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let metrics_text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(metrics_text.contains("herd_monitor_predictions_total"));
    assert!(metrics_text.contains("herd_monitor_prediction_latency_seconds"));
}
