//! Step 3: drops reading aids printed beside kanji.
//!
//! A line is only dropped when every test agrees; anything ambiguous stays.
use tracing::debug;

use crate::geometry::WritingDirection;
use crate::text::{contains_cjk, contains_kanji};

use super::arena::{MergedLine, ParagraphDraft};
use super::axis::{center, overlap_ratio};
use super::FuriganaOptions;

pub(crate) fn suppress_furigana(draft: &mut ParagraphDraft, opts: &FuriganaOptions) {
    let count = draft.lines.len();
    if count < 2 {
        return;
    }

    let direction = draft.direction;
    let keep: Vec<bool> = (0..count)
        .map(|i| {
            // Ruby normally precedes its base line; the final line can only sit after one.
            let base = if i + 1 < count { i + 1 } else { i - 1 };
            !is_furigana(&draft.lines[i], &draft.lines[base], direction, opts)
        })
        .collect();

    if keep.iter().all(|&k| k) {
        return;
    }
    let before = draft.lines.len();
    let mut flags = keep.into_iter();
    draft.lines.retain(|_| flags.next().unwrap_or(true));
    debug!(dropped = before - draft.lines.len(), "suppressed furigana lines");
    draft.refresh();
}

fn is_furigana(
    candidate: &MergedLine,
    base: &MergedLine,
    direction: WritingDirection,
    opts: &FuriganaOptions,
) -> bool {
    if !contains_cjk(&candidate.text) || !contains_cjk(&base.text) {
        return false;
    }
    if contains_kanji(&candidate.text) || !contains_kanji(&base.text) {
        return false;
    }

    let stack = direction.stack();
    let this_size = candidate.thickness(direction);
    let base_size = base.thickness(direction);
    let offset = (center(&base.bbox, stack) - center(&candidate.bbox, stack)).abs();
    let window_start = (base_size - this_size).abs() / 2.0;
    let window_end = base_size + this_size / 2.0;
    if !(window_start..=window_end).contains(&offset) {
        return false;
    }

    if overlap_ratio(&candidate.bbox, &base.bbox, direction.along()) < opts.min_overlap {
        return false;
    }

    let ratio = match direction {
        WritingDirection::LeftToRight => opts.horizontal_extent_ratio,
        WritingDirection::TopToBottom => opts.vertical_extent_ratio,
    };
    candidate.length(direction) < ratio * base.length(direction)
}
