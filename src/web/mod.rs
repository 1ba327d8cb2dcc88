//! Single-page prediction form served over HTTP

pub mod page;
pub mod routes;

use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};

use crate::models::InferenceEngine;

/// Build the router: the form page, its submit action and a health probe.
pub fn build_app(engine: Arc<InferenceEngine>) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/predict", post(routes::predict))
        .route("/healthz", get(routes::health))
        .layer(Extension(engine))
}
