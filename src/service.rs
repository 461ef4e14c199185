use crate::{
    codec::{DecodeError, ImageCodec},
    detection::{DetectionKind, DetectionResult, FaceDetectionStrategy, ObjectDetectionStrategy},
};
use bytes::Bytes;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RequestError {
    #[error("No image provided")]
    MissingUpload,
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),
    #[error("Upload too large: {0}")]
    UploadTooLarge(String),
    #[error("Unsupported detection kind: {0}")]
    UnsupportedKind(String),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RequestError {
    /// Short label used for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            RequestError::MissingUpload => "missing_upload",
            RequestError::InvalidUpload(_) => "invalid_upload",
            RequestError::UploadTooLarge(_) => "too_large",
            RequestError::UnsupportedKind(_) => "unsupported_kind",
            RequestError::Decode(DecodeError::TooLarge { .. }) => "too_large",
            RequestError::Decode(_) => "decode",
            RequestError::Internal(_) => "internal",
        }
    }
}

/// Uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct RawUpload {
    pub data: Bytes,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

impl RawUpload {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            content_type: None,
            file_name: None,
        }
    }
}

pub struct DetectionService {
    codec: ImageCodec,
    face: Arc<dyn FaceDetectionStrategy>,
    object: Arc<dyn ObjectDetectionStrategy>,
}

impl DetectionService {
    pub fn new(
        codec: ImageCodec,
        face: impl FaceDetectionStrategy,
        object: impl ObjectDetectionStrategy,
    ) -> Self {
        Self {
            codec,
            face: Arc::new(face),
            object: Arc::new(object),
        }
    }

    pub fn codec(&self) -> &ImageCodec {
        &self.codec
    }

    /// Validates, decodes and dispatches one upload. CPU-bound; async callers
    /// should go through [`DetectionService::detect`].
    pub fn handle(
        &self,
        upload: Option<RawUpload>,
        kind: DetectionKind,
    ) -> Result<DetectionResult, RequestError> {
        let upload = upload.ok_or(RequestError::MissingUpload)?;

        tracing::debug!(
            %kind,
            size = upload.data.len(),
            content_type = upload.content_type.as_deref(),
            file_name = upload.file_name.as_deref(),
            "handling upload"
        );

        let image = self.codec.decode(&upload.data)?;

        let result = match kind {
            DetectionKind::Face => DetectionResult::Face(self.face.run(&image)),
            DetectionKind::Object => DetectionResult::Object(self.object.run(&image)),
        };

        Ok(result)
    }

    /// Runs [`DetectionService::handle`] on the blocking pool. A panic in the
    /// decoder or a strategy is reported as [`RequestError::Internal`].
    pub async fn detect(
        self: &Arc<Self>,
        upload: Option<RawUpload>,
        kind: DetectionKind,
    ) -> Result<DetectionResult, RequestError> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || service.handle(upload, kind))
            .await
            .map_err(|e| RequestError::Internal(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::DecodedImage;
    use crate::detection::{
        FaceDetectionResult, ObjectDetectionResult, StubFaceDetector, StubObjectDetector,
    };
    use image::{ImageBuffer, ImageFormat, Rgb};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(width, height, Rgb([0, 128, 255]));
        let mut cursor = Cursor::new(Vec::new());
        img.write_to(&mut cursor, ImageFormat::Png).unwrap();
        cursor.into_inner()
    }

    fn stub_service() -> Arc<DetectionService> {
        Arc::new(DetectionService::new(
            ImageCodec::new(1024 * 1024),
            StubFaceDetector,
            StubObjectDetector::default(),
        ))
    }

    struct MockFaceDetector;

    impl FaceDetectionStrategy for MockFaceDetector {
        fn name(&self) -> &str {
            "mock-face"
        }

        fn run(&self, image: &DecodedImage) -> FaceDetectionResult {
            FaceDetectionResult {
                face_detected: image.width() > 1,
                multiple_faces: image.width() > 2,
                phone_detected: false,
            }
        }
    }

    struct PanickingObjectDetector;

    impl ObjectDetectionStrategy for PanickingObjectDetector {
        fn name(&self) -> &str {
            "panicking-object"
        }

        fn run(&self, _image: &DecodedImage) -> ObjectDetectionResult {
            panic!("model crashed")
        }
    }

    #[test]
    fn test_handle_face() {
        let service = stub_service();
        let result = service
            .handle(Some(RawUpload::new(png(2, 2))), DetectionKind::Face)
            .unwrap();

        assert_eq!(result, DetectionResult::Face(StubFaceDetector::RESULT));
    }

    #[test]
    fn test_handle_object() {
        let service = stub_service();
        let result = service
            .handle(Some(RawUpload::new(png(1, 1))), DetectionKind::Object)
            .unwrap();

        match result {
            DetectionResult::Object(object) => {
                assert!(object.object_detected);
                assert_eq!(object.label, "Phone");
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_result_matches_kind() {
        let service = stub_service();
        for kind in [DetectionKind::Face, DetectionKind::Object] {
            let result = service
                .handle(Some(RawUpload::new(png(3, 3))), kind)
                .unwrap();
            assert_eq!(result.kind(), kind);
        }
    }

    #[test]
    fn test_handle_missing_upload() {
        let service = stub_service();
        let err = service.handle(None, DetectionKind::Face).unwrap_err();

        assert!(matches!(err, RequestError::MissingUpload));
        assert_eq!(err.to_string(), "No image provided");
    }

    #[test]
    fn test_handle_decode_failure() {
        let service = stub_service();
        let err = service
            .handle(
                Some(RawUpload::new(&b"not-an-image"[..])),
                DetectionKind::Object,
            )
            .unwrap_err();

        assert!(matches!(
            err,
            RequestError::Decode(DecodeError::UnsupportedFormat)
        ));
    }

    #[test]
    fn test_custom_strategy_sees_decoded_image() {
        let service = DetectionService::new(
            ImageCodec::new(1024 * 1024),
            MockFaceDetector,
            StubObjectDetector::new("Book"),
        );

        let result = service
            .handle(Some(RawUpload::new(png(3, 1))), DetectionKind::Face)
            .unwrap();
        assert_eq!(
            result,
            DetectionResult::Face(FaceDetectionResult {
                face_detected: true,
                multiple_faces: true,
                phone_detected: false,
            })
        );
    }

    #[tokio::test]
    async fn test_detect_runs_on_blocking_pool() {
        let service = stub_service();
        let first = service
            .detect(Some(RawUpload::new(png(2, 2))), DetectionKind::Face)
            .await
            .unwrap();
        let second = service
            .detect(Some(RawUpload::new(png(2, 2))), DetectionKind::Face)
            .await
            .unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_detect_reports_strategy_panic() {
        let service = Arc::new(DetectionService::new(
            ImageCodec::new(1024 * 1024),
            StubFaceDetector,
            PanickingObjectDetector,
        ));

        let err = service
            .detect(Some(RawUpload::new(png(1, 1))), DetectionKind::Object)
            .await
            .unwrap_err();
        assert!(matches!(err, RequestError::Internal(_)));
    }
}
