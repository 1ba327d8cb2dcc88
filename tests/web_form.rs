use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use distillation_yield_predictor::{
    feature_extractor::DEFAULT_FEATURE_NAMES, web, FeatureExtractor, InferenceEngine,
    InferenceError, InputRecord, LoadError, ModelCache, PredictionMetrics, Predictor,
};
use reqwest::StatusCode;

/// Linear stand-in for the trained regressor
struct LinearPredictor {
    feature_names: Vec<String>,
    calls: AtomicUsize,
}

impl LinearPredictor {
    fn new() -> Self {
        Self {
            feature_names: DEFAULT_FEATURE_NAMES.map(String::from).to_vec(),
            calls: AtomicUsize::new(0),
        }
    }
}

impl Predictor for LinearPredictor {
    fn name(&self) -> &str {
        "linear"
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict(&self, record: &InputRecord) -> Result<Vec<f64>, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        record.ensure_schema(&self.feature_names)?;
        let v = record.values();
        let (pressure, flow, temp) = (v[0] as f64, v[1] as f64, v[2] as f64);
        Ok(vec![50.0 + 0.05 * flow + 0.1 * (temp - 100.0) - 0.1 * pressure])
    }
}

struct FaultyPredictor;

impl Predictor for FaultyPredictor {
    fn name(&self) -> &str {
        "faulty"
    }

    fn feature_names(&self) -> &[String] {
        &[]
    }

    fn predict(&self, _record: &InputRecord) -> Result<Vec<f64>, InferenceError> {
        Err(InferenceError::Runtime("simulated numerical fault".to_string()))
    }
}

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(cache: ModelCache) -> Self {
        let engine = Arc::new(InferenceEngine::with_cache(
            Arc::new(cache),
            FeatureExtractor::new(),
            Arc::new(PredictionMetrics::new()),
        ));
        let app = web::build_app(engine);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    async fn post_predict(&self, form: &[(&str, &str)]) -> (StatusCode, String) {
        let resp = reqwest::Client::new()
            .post(format!("{}/predict", self.base_url))
            .form(form)
            .send()
            .await
            .unwrap();
        let status = resp.status();
        (status, resp.text().await.unwrap())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn missing_model_cache() -> ModelCache {
    ModelCache::with_loader("models/absent.onnx", |path| {
        Err(LoadError::ArtifactMissing {
            path: path.to_path_buf(),
        })
    })
}

const DEFAULTS: [(&str, &str); 3] = [
    ("flow_rate", "300"),
    ("temperature", "130"),
    ("pressure_diff", "0"),
];

#[tokio::test]
async fn form_page_renders_default_controls() {
    let server = TestServer::spawn(ModelCache::preloaded(Arc::new(LinearPredictor::new()))).await;

    let resp = reqwest::get(format!("{}/", server.base_url)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = resp.text().await.unwrap();

    assert!(html.contains("Distillation Column Yield Predictor"));
    assert!(html.contains(r#"name="flow_rate" min="100" max="500" step="1" value="300""#));
    assert!(html.contains(r#"<button type="submit" id="predict">"#));
}

#[tokio::test]
async fn default_parameters_show_two_decimal_percentage() {
    let predictor = Arc::new(LinearPredictor::new());
    let server = TestServer::spawn(ModelCache::preloaded(predictor.clone())).await;

    let (status, html) = server.post_predict(&DEFAULTS).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<code>68.00%</code>"), "{}", html);
    assert_eq!(predictor.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn extreme_boundary_values_reach_the_model() {
    let server = TestServer::spawn(ModelCache::preloaded(Arc::new(LinearPredictor::new()))).await;

    let (status, html) = server
        .post_predict(&[
            ("flow_rate", "100"),
            ("temperature", "200"),
            ("pressure_diff", "-50"),
        ])
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<code>70.00%</code>"), "{}", html);
    // Submitted values are kept in the controls
    assert!(html.contains(r#"name="pressure_diff" min="-50" max="50" step="1" value="-50""#));
}

#[tokio::test]
async fn missing_model_shows_warning_and_never_predicts() {
    let server = TestServer::spawn(missing_model_cache()).await;

    let html = reqwest::get(format!("{}/", server.base_url))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("The model could not be loaded"));
    assert!(html.contains("models/absent.onnx"));
    assert!(html.contains(r#"id="predict" disabled"#));

    let (status, html) = server.post_predict(&DEFAULTS).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("The model could not be loaded"));
    assert!(!html.contains("Predicted yield"));
}

#[tokio::test]
async fn inference_fault_is_shown_as_message() {
    let server = TestServer::spawn(ModelCache::preloaded(Arc::new(FaultyPredictor))).await;

    let (status, html) = server.post_predict(&DEFAULTS).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains(
        "An error occurred during prediction: inference failed: simulated numerical fault"
    ));

    // The session keeps working after a failure
    let (status, _) = server.post_predict(&DEFAULTS).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn out_of_range_submission_is_rejected() {
    let predictor = Arc::new(LinearPredictor::new());
    let server = TestServer::spawn(ModelCache::preloaded(predictor.clone())).await;

    let (status, html) = server
        .post_predict(&[
            ("flow_rate", "501"),
            ("temperature", "130"),
            ("pressure_diff", "0"),
        ])
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(html.contains("flow_rate must be between 100 and 500, got 501"));
    assert_eq!(predictor.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn rejected_submission_keeps_valid_controls() {
    let server = TestServer::spawn(ModelCache::preloaded(Arc::new(LinearPredictor::new()))).await;

    let (status, html) = server
        .post_predict(&[
            ("flow_rate", "501"),
            ("temperature", "150"),
            ("pressure_diff", "-20"),
        ])
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(html.contains(r#"name="temperature" min="100" max="200" step="1" value="150""#));
    assert!(html.contains(r#"name="pressure_diff" min="-50" max="50" step="1" value="-20""#));
    // The offending control falls back to its default
    assert!(html.contains(r#"name="flow_rate" min="100" max="500" step="1" value="300""#));
}

#[tokio::test]
async fn first_load_runs_off_the_async_workers() {
    // block_on panics when called from an async worker thread
    let cache = ModelCache::with_loader("models/slow.onnx", |_path| {
        tokio::runtime::Handle::current().block_on(async {});
        Ok(Arc::new(LinearPredictor::new()) as _)
    });
    let server = TestServer::spawn(cache).await;

    let resp = reqwest::get(format!("{}/", server.base_url)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains(r#"<button type="submit" id="predict">"#));

    let body: serde_json::Value = reqwest::get(format!("{}/healthz", server.base_url))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["model_loaded"], true);
}

#[tokio::test]
async fn health_reports_model_state_and_counters() {
    let server = TestServer::spawn(ModelCache::preloaded(Arc::new(LinearPredictor::new()))).await;
    server.post_predict(&DEFAULTS).await;

    let body: serde_json::Value = reqwest::get(format!("{}/healthz", server.base_url))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["model_loaded"], true);
    assert_eq!(body["metrics"]["predictions_succeeded"], 1);

    let degraded = TestServer::spawn(missing_model_cache()).await;
    let body: serde_json::Value = reqwest::get(format!("{}/healthz", degraded.base_url))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["model_loaded"], false);
    assert!(body["model_error"].as_str().unwrap().contains("absent.onnx"));
}
