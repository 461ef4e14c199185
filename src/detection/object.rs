use super::log_run;
use crate::codec::DecodedImage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ObjectDetectionResult {
    pub object_detected: bool,
    pub label: String,
}

pub trait ObjectDetectionStrategy: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn run(&self, image: &DecodedImage) -> ObjectDetectionResult;
}

/// Reports a single fixed object for every image. The label comes from
/// configuration and defaults to `"Phone"`.
#[derive(Debug, Clone)]
pub struct StubObjectDetector {
    label: String,
}

impl StubObjectDetector {
    pub const DEFAULT_LABEL: &'static str = "Phone";

    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl Default for StubObjectDetector {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LABEL)
    }
}

impl ObjectDetectionStrategy for StubObjectDetector {
    fn name(&self) -> &str {
        "stub-object"
    }

    fn run(&self, image: &DecodedImage) -> ObjectDetectionResult {
        log_run(self.name(), image);
        ObjectDetectionResult {
            object_detected: true,
            label: self.label.clone(),
        }
    }
}
