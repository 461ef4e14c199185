//! Detection strategies.
//!
//! A strategy maps a [`DecodedImage`] to a typed result. The service holds one
//! strategy per [`DetectionKind`] behind an `Arc`, so a real model can replace
//! the stubs without touching the service or the routes.

mod face;
mod object;

pub use face::{FaceDetectionResult, FaceDetectionStrategy, StubFaceDetector};
pub use object::{ObjectDetectionResult, ObjectDetectionStrategy, StubObjectDetector};

use crate::codec::DecodedImage;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionKind {
    Face,
    Object,
}

impl DetectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionKind::Face => "face",
            DetectionKind::Object => "object",
        }
    }
}

impl fmt::Display for DetectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetectionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "face" => Ok(Self::Face),
            "object" => Ok(Self::Object),
            other => Err(other.to_string()),
        }
    }
}

/// Outcome of a single detection request. Serialized untagged so the body is
/// exactly the shape of the inner result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DetectionResult {
    Face(FaceDetectionResult),
    Object(ObjectDetectionResult),
}

impl DetectionResult {
    pub fn kind(&self) -> DetectionKind {
        match self {
            DetectionResult::Face(_) => DetectionKind::Face,
            DetectionResult::Object(_) => DetectionKind::Object,
        }
    }
}

pub(crate) fn log_run(strategy: &str, image: &DecodedImage) {
    tracing::debug!(
        strategy,
        width = image.width(),
        height = image.height(),
        "running detection"
    );
}
