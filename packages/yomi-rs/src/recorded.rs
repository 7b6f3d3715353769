//! An [`OcrEngine`] that plays back provider output captured earlier.
//!
//! The "image" handed to it is a JSON document holding an [`OcrFrame`], either
//! as a file on disk or as raw bytes. Used to replay sessions without a live
//! OCR provider.
use async_trait::async_trait;
use tracing::debug;
use yomi_ocr::{CropRegion, OcrEngine, OcrError, OcrFrame, OcrInput, OcrRequest, OcrResult};

#[derive(Debug, Clone)]
pub struct RecordedOcrEngine {
  name: String,
}

impl Default for RecordedOcrEngine {
  fn default() -> Self {
    Self::new("recorded")
  }
}

impl RecordedOcrEngine {
  pub fn new(name: impl Into<String>) -> Self {
    Self { name: name.into() }
  }

  /// Parses a recorded frame document.
  pub fn parse(bytes: &[u8]) -> Result<OcrFrame, OcrError> {
    serde_json::from_slice(bytes)
      .map_err(|e| OcrError::InvalidInput(format!("recorded frame: {}", e)))
  }

  async fn read(input: &OcrInput) -> Result<Vec<u8>, OcrError> {
    match input {
      OcrInput::FilePath(path) => tokio::fs::read(path)
        .await
        .map_err(|e| OcrError::EngineError(format!("{}: {}", path.display(), e))),
      OcrInput::Bytes(bytes) => Ok(bytes.clone()),
    }
  }
}

/// Keeps only lines whose centre falls inside `crop`, dropping emptied paragraphs.
pub fn crop_frame(frame: OcrFrame, crop: &CropRegion) -> OcrFrame {
  let OcrFrame {
    image_width,
    image_height,
    units,
    mut paragraphs,
  } = frame;
  let mut cropped = OcrFrame::new(image_width, image_height).with_units(units);
  for paragraph in &mut paragraphs {
    paragraph.lines.retain(|line| {
      let bbox = cropped.to_pixels(&line.bounding_box);
      crop.contains(bbox.center_x, bbox.center_y)
    });
  }
  paragraphs.retain(|paragraph| !paragraph.lines.is_empty());
  cropped.paragraphs = paragraphs;
  cropped
}

/// Pixel region covering every usable line of `frame`.
pub fn suggest_crop(frame: &OcrFrame) -> Option<CropRegion> {
  let bbox = frame
    .lines()
    .map(|line| frame.to_pixels(&line.bounding_box))
    .filter(|bbox| bbox.is_usable())
    .reduce(|acc, b| acc.union(&b))?;
  let left = bbox.left().floor();
  let top = bbox.top().floor();
  Some(CropRegion::new(
    left as i32,
    top as i32,
    (bbox.right().ceil() - left) as u32,
    (bbox.bottom().ceil() - top) as u32,
  ))
}

#[async_trait]
impl OcrEngine for RecordedOcrEngine {
  fn name(&self) -> &str {
    &self.name
  }

  async fn recognize(&self, request: &OcrRequest) -> Result<OcrResult, OcrError> {
    let bytes = Self::read(&request.image).await?;
    let mut frame = Self::parse(&bytes)?;
    if let Some(crop) = &request.crop_region {
      frame = crop_frame(frame, crop);
    }
    debug!(engine = %self.name, lines = frame.lines().count(), "replayed recorded frame");
    let crop_suggestion = suggest_crop(&frame);
    Ok(OcrResult {
      crop_suggestion,
      ..OcrResult::from_frame(frame)
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Arc;
  use yomi_ocr::{BoundingBox, Line};

  fn frame_json() -> Vec<u8> {
    let frame = OcrFrame::from_lines(
      640,
      480,
      vec![
        Line::new("inside", BoundingBox::new(100.0, 100.0, 80.0, 20.0)),
        Line::new("outside", BoundingBox::new(500.0, 400.0, 80.0, 20.0)),
      ],
    );
    serde_json::to_vec(&frame).unwrap()
  }

  #[tokio::test]
  async fn test_recognize_returns_recorded_frame() {
    let engine = RecordedOcrEngine::default();
    let request = OcrRequest::new(Arc::new(OcrInput::Bytes(frame_json())));
    let result = engine.recognize(&request).await.unwrap();
    assert!(result.success);
    assert_eq!(result.frame.unwrap().lines().count(), 2);
  }

  #[tokio::test]
  async fn test_crop_keeps_lines_inside_region() {
    let engine = RecordedOcrEngine::default();
    let request = OcrRequest::new(Arc::new(OcrInput::Bytes(frame_json())))
      .with_crop(Some(CropRegion::new(0, 0, 320, 240)));
    let frame = engine.recognize(&request).await.unwrap().frame.unwrap();
    let texts: Vec<String> = frame.lines().map(|l| l.text()).collect();
    assert_eq!(texts, vec!["inside"]);
    assert_eq!(frame.paragraphs.len(), 1);
  }

  #[tokio::test]
  async fn test_crop_suggestion_covers_all_lines() {
    let engine = RecordedOcrEngine::default();
    let request = OcrRequest::new(Arc::new(OcrInput::Bytes(frame_json())));
    let result = engine.recognize(&request).await.unwrap();
    assert_eq!(result.crop_suggestion, Some(CropRegion::new(60, 90, 480, 320)));
  }

  #[tokio::test]
  async fn test_invalid_document_is_rejected() {
    let engine = RecordedOcrEngine::default();
    let request = OcrRequest::new(Arc::new(OcrInput::Bytes(b"not json".to_vec())));
    let err = engine.recognize(&request).await.unwrap_err();
    assert!(matches!(err, OcrError::InvalidInput(_)));
  }

  #[tokio::test]
  async fn test_missing_file_is_an_engine_error() {
    let engine = RecordedOcrEngine::new("disk");
    let request = OcrRequest::new(Arc::new(OcrInput::FilePath("/nonexistent/frame.json".into())));
    let err = engine.recognize(&request).await.unwrap_err();
    assert!(matches!(err, OcrError::EngineError(_)));
    assert_eq!(engine.name(), "disk");
  }
}
