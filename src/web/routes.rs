use std::sync::Arc;

use axum::{
    extract::{Extension, Form},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::InferenceError;
use crate::models::InferenceEngine;
use crate::types::{OperatingParameters, PredictionOutcome};
use crate::web::page::{self, PageView};

/// Raw values posted by the range controls
#[derive(Debug, Deserialize)]
pub struct PredictForm {
    pub pressure_diff: i64,
    pub flow_rate: i64,
    pub temperature: i64,
}

/// Why the model is unavailable, if it is.
///
/// The first call may load the model, so it runs on the blocking pool.
async fn model_error(engine: &Arc<InferenceEngine>) -> Option<String> {
    let engine = engine.clone();
    tokio::task::spawn_blocking(move || engine.availability().err().map(|e| e.to_string()))
        .await
        .unwrap_or_else(|e| Some(format!("model load aborted: {}", e)))
}

pub async fn index(Extension(engine): Extension<Arc<InferenceEngine>>) -> Html<String> {
    Html(page::render(&PageView {
        model_error: model_error(&engine).await,
        ..PageView::default()
    }))
}

pub async fn predict(
    Extension(engine): Extension<Arc<InferenceEngine>>,
    Form(form): Form<PredictForm>,
) -> Response {
    let params = match OperatingParameters::from_controls(
        form.pressure_diff,
        form.flow_rate,
        form.temperature,
    ) {
        Ok(params) => params,
        Err(e) => {
            warn!(error = %e, "Rejected out-of-range form submission");
            let view = PageView {
                params: OperatingParameters::from_controls_or_default(
                    form.pressure_diff,
                    form.flow_rate,
                    form.temperature,
                ),
                model_error: model_error(&engine).await,
                rejection: Some(e.to_string()),
                outcome: None,
            };
            return (StatusCode::UNPROCESSABLE_ENTITY, Html(page::render(&view))).into_response();
        }
    };

    let worker = engine.clone();
    let outcome = tokio::task::spawn_blocking(move || worker.predict(&params))
        .await
        .unwrap_or_else(|e| PredictionOutcome::Failed(InferenceError::Panicked(e.to_string())));

    info!(
        outcome = outcome.kind(),
        pressure_diff = params.pressure_diff,
        flow_rate = params.flow_rate,
        temperature = params.temperature,
        "Prediction requested"
    );

    let view = PageView {
        params,
        model_error: model_error(&engine).await,
        outcome: Some(outcome),
        rejection: None,
    };
    Html(page::render(&view)).into_response()
}

pub async fn health(Extension(engine): Extension<Arc<InferenceEngine>>) -> impl IntoResponse {
    let error = model_error(&engine).await;
    Json(serde_json::json!({
        "status": if error.is_none() { "ok" } else { "degraded" },
        "model_loaded": error.is_none(),
        "model_error": error,
        "metrics": engine.metrics().snapshot(),
    }))
}
