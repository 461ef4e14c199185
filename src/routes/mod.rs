mod detect;
mod health;
mod metrics;

pub use detect::{ErrorBody, IMAGE_FIELD};

use crate::server::SharedState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::healthcheck))
        .route("/metrics", get(metrics::metrics_handler))
        .route("/api/coding/status", get(health::coding_status))
        .route(
            "/api/detection/status",
            get(health::detection_status).post(detect::reject_status_kind),
        )
        .route("/api/detection/{kind}", post(detect::detect))
}
