//! # yomi-rs
//!
//! Drives a two-pass screen OCR loop on top of [`yomi_ocr`]: a fast pass reads
//! every captured frame, its lines are put back into reading order, and once the
//! text on screen settles a slower, more accurate pass re-reads the same region.
//!
//! ## Features
//!
//! - **Reading order**: paragraphs rebuilt from loose line boxes, horizontal and vertical
//!   (tategaki) text
//! - **Furigana suppression**: ruby printed beside kanji is dropped from the text
//! - **Stabilization**: refinement runs once per sentence, never for text already shown
//! - **Replay**: recorded sessions can be run through the full pipeline without a live provider
//!
//! ## Quick Start
//!
//! ```ignore
//! use yomi_rs::prelude::*;
//!
//! let frame: OcrFrame = serde_json::from_str(&std::fs::read_to_string("frame.json")?)?;
//! let layout = reconstruct(&frame, &LayoutOptions::default());
//! println!("{}", layout.text);
//!
//! let engine = std::sync::Arc::new(RecordedOcrEngine::default());
//! let pipeline = SourcePipeline::new("screen", PipelineConfig::default());
//! // Events are unbounded, so they can be read after shutdown.
//! let (handle, mut events) = pipeline.spawn(engine);
//! handle.submit(CapturedFrame::new(frame)).await?;
//! handle.shutdown().await?;
//! while let Some(event) = events.recv().await {
//!     println!("{}", event);
//! }
//! ```

pub mod config;
pub mod filter;
pub mod pipeline;
pub mod queue;
pub mod recorded;
pub mod replay;

// Re-export commonly used types at the root level
pub use config::PipelineConfig;
pub use filter::{FilterLanguage, TextFilter};
pub use pipeline::{
  refine_with, CapturedFrame, EventKind, FrameOutcome, PipelineError, PipelineEvent, PipelineHandle,
  RefinementJob, SourcePipeline,
};
pub use queue::RefinementQueue;
pub use recorded::{crop_frame, suggest_crop, RecordedOcrEngine};
pub use replay::{load_replay, run_replay, ReplayStep};

/// Prelude module for convenient imports
///
/// Import everything you need with:
/// ```ignore
/// use yomi_rs::prelude::*;
/// ```
pub mod prelude {
  pub use crate::{
    load_replay, run_replay, CapturedFrame, EventKind, FilterLanguage, PipelineConfig,
    PipelineEvent, PipelineHandle, RecordedOcrEngine, ReplayStep, SourcePipeline, TextFilter,
  };
  pub use yomi_ocr::{
    reconstruct, similar, Action, BoundingBox, CropRegion, LayoutOptions, LayoutResult, Line,
    OcrEngine, OcrFrame, OcrInput, Paragraph, StabilizationController, StabilizerConfig,
    WritingDirection,
  };
}
