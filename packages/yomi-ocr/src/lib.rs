//! Reading-order reconstruction and text stabilization for noisy screen OCR.
//!
//! [`reconstruct`] turns one frame of loose line detections into ordered
//! paragraphs; a [`StabilizationController`] per source decides when that text
//! has settled enough for a second, slower OCR pass.

pub mod engine;
pub mod geometry;
pub mod layout;
pub mod similarity;
pub mod stabilizer;
pub mod text;

pub use engine::{OcrEngine, OcrError, OcrInput, OcrRequest, OcrResult};
pub use geometry::{
    BoundingBox, BoxUnits, CropRegion, Line, OcrFrame, Orientation, Paragraph, Word,
    WritingDirection,
};
pub use layout::{reconstruct, FuriganaOptions, LayoutOptions, LayoutResult, BLANK_LINE_MARKER};
pub use similarity::{flatten_parts, similar, similar_parts, similarity_ratio};
pub use stabilizer::{
    Action, PendingText, RefinementRequest, StabilizationController, StabilizerConfig,
    TriggerReason,
};
