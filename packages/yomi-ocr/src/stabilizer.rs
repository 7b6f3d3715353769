//! Decides when text on screen has settled enough to deserve a second, slower
//! OCR pass.
//!
//! One [`StabilizationController`] tracks one OCR source. It is fed every
//! reconstructed frame in order and answers with an [`Action`]. Text that keeps
//! changing slightly (a line still being typed out, OCR jitter) stays pending;
//! text that vanishes, gets replaced by an unrelated sentence, or is forced
//! stable by the caller is handed back as a [`RefinementRequest`].
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::OcrInput;
use crate::geometry::CropRegion;
use crate::similarity::similar;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilizerConfig {
    /// Below this similarity (0-100) a new observation is a different sentence.
    pub replacement_threshold: f64,
    /// At or above this similarity to the last emitted text a refinement is skipped.
    pub duplicate_threshold: f64,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            replacement_threshold: 20.0,
            duplicate_threshold: 80.0,
        }
    }
}

/// The candidate region currently being watched.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingText {
    pub text: String,
    /// Text before filtering, used for similarity.
    pub original_text: String,
    pub start_time: DateTime<Utc>,
    pub reference_image: Option<Arc<OcrInput>>,
    pub crop_region: Option<CropRegion>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerReason {
    TextDisappeared,
    ForcedStable,
    TextReplaced,
}

/// Frozen copy of the pending state at the moment a refinement was requested.
#[derive(Debug, Clone, PartialEq)]
pub struct RefinementRequest {
    pub pending: PendingText,
    pub triggered_at: DateTime<Utc>,
    pub reason: TriggerReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    None,
    TriggerRefinement(RefinementRequest),
    UpdateOnly,
}

impl Action {
    pub fn is_trigger(&self) -> bool {
        matches!(self, Action::TriggerRefinement(_))
    }
}

#[derive(Debug, Default)]
pub struct StabilizationController {
    config: StabilizerConfig,
    pending: Option<PendingText>,
    force_stable: bool,
    last_emitted_text: Option<String>,
    empty_streak: u32,
}

impl StabilizationController {
    pub fn new(config: StabilizerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Feeds one observation and returns what the caller should do about it.
    pub fn observe(
        &mut self,
        text: &str,
        original_text: &str,
        image: Option<Arc<OcrInput>>,
        crop_region: Option<CropRegion>,
        now: DateTime<Utc>,
    ) -> Action {
        let empty = text.trim().is_empty();
        if empty {
            self.empty_streak = self.empty_streak.saturating_add(1);
        } else {
            self.empty_streak = 0;
        }

        let Some(pending) = self.pending.as_mut() else {
            if empty {
                return Action::None;
            }
            self.start_pending(text, original_text, image, crop_region, now);
            return Action::UpdateOnly;
        };

        if empty {
            return self.trigger(TriggerReason::TextDisappeared, now);
        }

        if self.force_stable {
            self.force_stable = false;
            return self.trigger(TriggerReason::ForcedStable, now);
        }

        let threshold = self.config.replacement_threshold;
        if is_replacement(&pending.original_text, original_text, threshold) {
            let action = self.trigger(TriggerReason::TextReplaced, now);
            self.start_pending(text, original_text, image, crop_region, now);
            return action;
        }

        pending.text = text.to_string();
        pending.original_text = original_text.to_string();
        pending.reference_image = image;
        pending.crop_region = crop_region;
        Action::UpdateOnly
    }

    /// Makes the next non-empty observation trigger a refinement regardless of content.
    pub fn request_stable(&mut self) {
        self.force_stable = true;
    }

    pub fn set_last_emitted_text(&mut self, text: impl Into<String>) {
        self.last_emitted_text = Some(text.into());
    }

    pub fn last_emitted_text(&self) -> Option<&str> {
        self.last_emitted_text.as_deref()
    }

    /// Drops the pending region and any forced-stable request.
    pub fn clear(&mut self) {
        self.pending = None;
        self.force_stable = false;
    }

    pub fn pending(&self) -> Option<&PendingText> {
        self.pending.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Consecutive empty observations so far.
    pub fn empty_streak(&self) -> u32 {
        self.empty_streak
    }

    fn start_pending(
        &mut self,
        text: &str,
        original_text: &str,
        image: Option<Arc<OcrInput>>,
        crop_region: Option<CropRegion>,
        now: DateTime<Utc>,
    ) {
        debug!(text, "tracking new pending text");
        self.pending = Some(PendingText {
            text: text.to_string(),
            original_text: original_text.to_string(),
            start_time: now,
            reference_image: image,
            crop_region,
        });
    }

    /// Takes the pending state and surfaces it, unless it repeats the last emission.
    fn trigger(&mut self, reason: TriggerReason, now: DateTime<Utc>) -> Action {
        let Some(pending) = self.pending.take() else {
            return Action::None;
        };
        if pending.text.trim().is_empty() {
            return Action::None;
        }
        if let Some(last) = self.last_emitted_text.as_deref() {
            if similar(last, &pending.text, self.config.duplicate_threshold) {
                debug!(
                    ?reason,
                    text = %pending.text,
                    "skipping refinement of already emitted text"
                );
                return Action::None;
            }
        }

        debug!(?reason, text = %pending.text, "pending text is stable");
        self.last_emitted_text = Some(pending.text.clone());
        Action::TriggerRefinement(RefinementRequest {
            pending,
            triggered_at: now,
            reason,
        })
    }
}

/// A wholly different sentence: dissimilar and sharing neither its first nor its last character.
fn is_replacement(previous: &str, current: &str, threshold: f64) -> bool {
    let (Some(prev_first), Some(prev_last)) = (previous.chars().next(), previous.chars().last())
    else {
        return false;
    };
    let (Some(cur_first), Some(cur_last)) = (current.chars().next(), current.chars().last()) else {
        return false;
    };
    prev_first != cur_first && prev_last != cur_last && !similar(previous, current, threshold)
}
