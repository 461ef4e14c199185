use super::log_run;
use crate::codec::DecodedImage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FaceDetectionResult {
    pub face_detected: bool,
    pub multiple_faces: bool,
    pub phone_detected: bool,
}

pub trait FaceDetectionStrategy: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Never fails for a decoded image; "nothing found" is a result, not an error.
    fn run(&self, image: &DecodedImage) -> FaceDetectionResult;
}

/// Fixed result used until a face model is wired in: one face, no phone.
/// The pixels are not inspected.
#[derive(Debug, Clone, Default)]
pub struct StubFaceDetector;

impl StubFaceDetector {
    pub const RESULT: FaceDetectionResult = FaceDetectionResult {
        face_detected: true,
        multiple_faces: false,
        phone_detected: false,
    };
}

impl FaceDetectionStrategy for StubFaceDetector {
    fn name(&self) -> &str {
        "stub-face"
    }

    fn run(&self, image: &DecodedImage) -> FaceDetectionResult {
        log_run(self.name(), image);
        Self::RESULT
    }
}
