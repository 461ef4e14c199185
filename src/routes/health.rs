use axum::{response::IntoResponse, response::Json};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct Status {
    status: String,
}

impl Status {
    fn new(status: impl Into<String>) -> Json<Self> {
        Json(Self {
            status: status.into(),
        })
    }
}

pub async fn healthcheck() -> impl IntoResponse {
    Status::new("Available")
}

pub async fn root() -> &'static str {
    "✅ Backend server is running and integrated!"
}

pub async fn coding_status() -> impl IntoResponse {
    Status::new("coding working")
}

pub async fn detection_status() -> impl IntoResponse {
    Status::new("detection working")
}
