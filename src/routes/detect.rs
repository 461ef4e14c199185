use crate::{
    codec::DecodeError,
    detection::{DetectionKind, DetectionResult},
    server::SharedState,
    service::{RawUpload, RequestError},
};
use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::instrument;

pub const IMAGE_FIELD: &str = "image";

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let status = match &self {
            RequestError::MissingUpload | RequestError::InvalidUpload(_) => StatusCode::BAD_REQUEST,
            RequestError::UnsupportedKind(_) => StatusCode::NOT_FOUND,
            RequestError::UploadTooLarge(_) | RequestError::Decode(DecodeError::TooLarge { .. }) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            RequestError::Decode(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RequestError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let error = match &self {
            RequestError::Internal(detail) => {
                tracing::error!(%detail, "detection request failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorBody { error })).into_response()
    }
}

#[instrument(skip(state, multipart))]
pub async fn detect(
    State(state): State<SharedState>,
    Path(kind): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<DetectionResult>, RequestError> {
    let kind: DetectionKind = kind.parse().map_err(|other| {
        state
            .metrics
            .record_detection_error("unknown", "unsupported_kind");
        RequestError::UnsupportedKind(other)
    })?;
    state
        .metrics
        .record_request(&format!("/api/detection/{}", kind));

    let started = Instant::now();
    let outcome = match read_upload(multipart).await {
        Ok(upload) => state.detection_service.detect(upload, kind).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(result) => {
            let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
            state
                .metrics
                .record_detection_duration(elapsed_ms, kind.as_str());
            tracing::info!(%kind, elapsed_ms, "detection completed");
            Ok(Json(result))
        }
        Err(e) => {
            state
                .metrics
                .record_detection_error(kind.as_str(), e.reason());
            tracing::warn!(%kind, error = %e, "detection rejected");
            Err(e)
        }
    }
}

/// `status` is a GET probe under the same prefix; posting to it is treated
/// like any other unknown detection kind.
pub async fn reject_status_kind(State(state): State<SharedState>) -> RequestError {
    state
        .metrics
        .record_detection_error("unknown", "unsupported_kind");
    RequestError::UnsupportedKind("status".into())
}

/// Pulls the `image` field out of the form. A body that is not multipart at
/// all is treated the same as a form without the field.
async fn read_upload(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Option<RawUpload>, RequestError> {
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            tracing::debug!(%rejection, "request body is not multipart");
            return Ok(None);
        }
    };

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        // Only file parts count, a plain form value named `image` is skipped.
        let Some(file_name) = field.file_name().map(str::to_owned) else {
            continue;
        };

        let content_type = field.content_type().map(str::to_owned);
        let data = field.bytes().await.map_err(multipart_error)?;

        return Ok(Some(RawUpload {
            data,
            content_type,
            file_name: Some(file_name),
        }));
    }

    Ok(None)
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> RequestError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        RequestError::UploadTooLarge(err.body_text())
    } else {
        RequestError::InvalidUpload(err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn error_body(err: RequestError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_missing_upload_response() {
        let (status, body) = error_body(RequestError::MissingUpload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "No image provided");
    }

    #[tokio::test]
    async fn test_decode_error_response() {
        let (status, body) = error_body(RequestError::Decode(DecodeError::Empty)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.error, "Image data is empty");

        let (status, _) =
            error_body(RequestError::Decode(DecodeError::TooLarge { size: 2, max: 1 })).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let (status, body) =
            error_body(RequestError::Internal("task panicked at model.rs".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Internal server error");
    }

    #[tokio::test]
    async fn test_unsupported_kind_response() {
        let (status, body) = error_body(RequestError::UnsupportedKind("car".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "Unsupported detection kind: car");
    }
}
