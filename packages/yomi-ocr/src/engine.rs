use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{CropRegion, OcrFrame};

/// Image handed to a provider: a file on disk or encoded bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum OcrInput {
    FilePath(PathBuf),
    Bytes(Vec<u8>),
}

/// One provider call: the captured image and, optionally, the region to read.
#[derive(Debug, Clone)]
pub struct OcrRequest {
    pub image: Arc<OcrInput>,
    pub crop_region: Option<CropRegion>,
}

impl OcrRequest {
    pub fn new(image: Arc<OcrInput>) -> Self {
        Self {
            image,
            crop_region: None,
        }
    }

    pub fn with_crop(mut self, crop_region: Option<CropRegion>) -> Self {
        self.crop_region = crop_region;
        self
    }
}

/// What a provider returned, every part optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Per-line detections, when the provider reports geometry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<OcrFrame>,
    /// Region the provider suggests cropping to on the next pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_suggestion: Option<CropRegion>,
    /// Provider specific response, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl OcrResult {
    pub fn from_frame(frame: OcrFrame) -> Self {
        Self {
            success: true,
            frame: Some(frame),
            ..Self::default()
        }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            success: true,
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn failed() -> Self {
        Self::default()
    }
}

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("unsupported operation")]
    Unsupported,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("engine error: {0}")]
    EngineError(String),
}

#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Short provider name used in logs and events.
    fn name(&self) -> &str;

    async fn recognize(&self, request: &OcrRequest) -> Result<OcrResult, OcrError>;
}
