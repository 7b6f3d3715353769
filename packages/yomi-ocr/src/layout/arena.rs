//! Per-frame storage of every detected line, addressed by index.
//!
//! Grouping never edits lines in place: it works on [`LineId`]s and the derived
//! pixel geometry kept here, and real [`Paragraph`]s are only built once the final
//! order is known.
use crate::geometry::{BoundingBox, Line, OcrFrame, Orientation, Paragraph, Word, WritingDirection};
use crate::text::{glyph_count, join_fragments, needs_separator};

use super::axis::{extent, span};
use super::LayoutOptions;

pub(crate) type LineId = usize;

pub(crate) struct LineSlot {
    pub line: Line,
    /// Geometry in pixels, whatever the frame's units.
    pub bbox: BoundingBox,
    pub text: String,
    pub orientation: Orientation,
    pub usable: bool,
}

pub(crate) struct LineArena {
    slots: Vec<LineSlot>,
}

/// Step 1: aspect-ratio classification of one line.
pub(crate) fn classify_orientation(
    text: &str,
    bbox: &BoundingBox,
    opts: &LayoutOptions,
) -> Orientation {
    if glyph_count(text) < opts.min_orientation_chars || !bbox.is_usable() {
        return Orientation::Unknown;
    }
    aspect_orientation(bbox, opts)
}

/// Orientation from box shape alone.
pub(crate) fn aspect_orientation(bbox: &BoundingBox, opts: &LayoutOptions) -> Orientation {
    if bbox.width / bbox.height < opts.vertical_aspect_ratio {
        Orientation::Vertical
    } else {
        Orientation::Horizontal
    }
}

impl LineArena {
    pub(crate) fn from_frame(frame: &OcrFrame, opts: &LayoutOptions) -> Self {
        let slots = frame
            .lines()
            .map(|line| {
                let bbox = frame.to_pixels(&line.bounding_box);
                let text = line.text();
                let usable = bbox.is_usable();
                let orientation = classify_orientation(&text, &bbox, opts);
                LineSlot {
                    line: line.clone(),
                    bbox,
                    text,
                    orientation,
                    usable,
                }
            })
            .collect();
        Self { slots }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn slot(&self, id: LineId) -> &LineSlot {
        &self.slots[id]
    }

    pub(crate) fn usable_ids(&self) -> impl Iterator<Item = LineId> + '_ {
        (0..self.slots.len()).filter(|&id| self.slots[id].usable)
    }

    pub(crate) fn degenerate_ids(&self) -> impl Iterator<Item = LineId> + '_ {
        (0..self.slots.len()).filter(|&id| !self.slots[id].usable)
    }
}

/// One output line: a single detection or several near-duplicate fragments.
#[derive(Debug, Clone)]
pub(crate) struct MergedLine {
    /// Fragments in along-axis order.
    pub parts: Vec<LineId>,
    pub bbox: BoundingBox,
    pub text: String,
}

impl MergedLine {
    pub(crate) fn single(arena: &LineArena, id: LineId) -> Self {
        let slot = arena.slot(id);
        Self {
            parts: vec![id],
            bbox: slot.bbox,
            text: slot.text.clone(),
        }
    }

    pub(crate) fn absorb(
        &mut self,
        arena: &LineArena,
        other: MergedLine,
        direction: WritingDirection,
    ) {
        let along = direction.along();
        self.parts.extend(other.parts);
        self.parts.sort_by(|&a, &b| {
            span(&arena.slot(a).bbox, along)
                .0
                .total_cmp(&span(&arena.slot(b).bbox, along).0)
                .then(a.cmp(&b))
        });
        self.bbox = self.bbox.union(&other.bbox);
        self.text = self
            .parts
            .iter()
            .fold(String::new(), |acc, &id| join_fragments(&acc, &arena.slot(id).text));
    }

    pub(crate) fn thickness(&self, direction: WritingDirection) -> f32 {
        extent(&self.bbox, direction.stack())
    }

    pub(crate) fn length(&self, direction: WritingDirection) -> f32 {
        extent(&self.bbox, direction.along())
    }

    /// Builds the public line, converting geometry back to frame units.
    pub(crate) fn materialize(
        &self,
        arena: &LineArena,
        frame: &OcrFrame,
        opts: &LayoutOptions,
    ) -> Line {
        if let [only] = self.parts.as_slice() {
            let slot = arena.slot(*only);
            let mut line = slot.line.clone();
            line.orientation = slot.orientation;
            return line;
        }

        let mut words: Vec<Word> = Vec::new();
        let mut previous: Option<&str> = None;
        for &id in &self.parts {
            let slot = arena.slot(id);
            if let Some(prev) = previous {
                if needs_separator(prev, &slot.text) {
                    if let Some(last) = words.last_mut() {
                        if last.separator.is_none() {
                            last.separator = Some(" ".to_string());
                        }
                    }
                }
            }
            if slot.line.words.is_empty() {
                words.push(Word::new(slot.text.clone(), slot.line.bounding_box));
            } else {
                words.extend(slot.line.words.iter().cloned());
            }
            previous = Some(&slot.text);
        }

        Line {
            bounding_box: frame.from_pixels(&self.bbox),
            words,
            text: Some(self.text.clone()),
            orientation: classify_orientation(&self.text, &self.bbox, opts),
        }
    }
}

/// A paragraph under construction, still in pixel space.
#[derive(Debug, Clone)]
pub(crate) struct ParagraphDraft {
    pub direction: WritingDirection,
    pub lines: Vec<MergedLine>,
    pub bbox: BoundingBox,
    pub character_size: f32,
}

impl ParagraphDraft {
    pub(crate) fn new(direction: WritingDirection, lines: Vec<MergedLine>) -> Self {
        let mut draft = Self {
            direction,
            lines,
            bbox: BoundingBox::default(),
            character_size: 0.0,
        };
        draft.refresh();
        draft
    }

    /// Recomputes the enclosing box and character size after lines change.
    pub(crate) fn refresh(&mut self) {
        self.bbox = self
            .lines
            .iter()
            .map(|line| line.bbox)
            .reduce(|acc, b| acc.union(&b))
            .unwrap_or_default();
        self.character_size = estimate_character_size(&self.lines, self.direction);
    }

    pub(crate) fn text(&self) -> String {
        self.lines
            .iter()
            .fold(String::new(), |acc, line| join_fragments(&acc, &line.text))
    }

    pub(crate) fn orientation(&self) -> Orientation {
        self.direction.orientation()
    }

    /// Height of every line, used to judge blank-line gaps.
    pub(crate) fn line_heights(&self) -> impl Iterator<Item = f32> + '_ {
        self.lines.iter().map(|line| line.bbox.height)
    }

    pub(crate) fn materialize(
        &self,
        arena: &LineArena,
        frame: &OcrFrame,
        opts: &LayoutOptions,
    ) -> Paragraph {
        Paragraph {
            bounding_box: frame.from_pixels(&self.bbox),
            lines: self
                .lines
                .iter()
                .map(|line| line.materialize(arena, frame, opts))
                .collect(),
            writing_direction: self.direction,
            character_size: frame.length_from_pixels(self.character_size, self.direction),
        }
    }
}

/// Step 4: glyph size of the thickest line that has any text.
pub(crate) fn estimate_character_size(lines: &[MergedLine], direction: WritingDirection) -> f32 {
    let largest = lines
        .iter()
        .filter(|line| glyph_count(&line.text) > 0)
        .max_by(|a, b| a.thickness(direction).total_cmp(&b.thickness(direction)));
    let Some(line) = largest else {
        return 0.0;
    };
    let size = line.length(direction) / glyph_count(&line.text) as f32;
    if size.is_finite() && size > 0.0 {
        size
    } else {
        f32::EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena_of(lines: Vec<Line>) -> LineArena {
        let frame = OcrFrame::from_lines(1000, 1000, lines);
        LineArena::from_frame(&frame, &LayoutOptions::default())
    }

    #[test]
    fn test_orientation_classification() {
        let opts = LayoutOptions::default();
        let tall = BoundingBox::new(0.0, 0.0, 20.0, 80.0);
        let wide = BoundingBox::new(0.0, 0.0, 80.0, 20.0);
        assert_eq!(classify_orientation("日本語", &tall, &opts), Orientation::Vertical);
        assert_eq!(classify_orientation("abc", &wide, &opts), Orientation::Horizontal);
        assert_eq!(classify_orientation("ab", &tall, &opts), Orientation::Unknown);
    }

    #[test]
    fn test_degenerate_lines_are_tracked_separately() {
        let arena = arena_of(vec![
            Line::new("fine", BoundingBox::new(50.0, 50.0, 40.0, 10.0)),
            Line::new("broken", BoundingBox::new(50.0, 50.0, 0.0, 10.0)),
        ]);
        assert_eq!(arena.usable_ids().collect::<Vec<_>>(), vec![0]);
        assert_eq!(arena.degenerate_ids().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_absorb_orders_fragments_along_the_line() {
        let arena = arena_of(vec![
            Line::new("cat", BoundingBox::new(120.0, 100.0, 60.0, 20.0)),
            Line::new("The", BoundingBox::new(40.0, 102.0, 60.0, 20.0)),
        ]);
        let mut merged = MergedLine::single(&arena, 0);
        merged.absorb(&arena, MergedLine::single(&arena, 1), WritingDirection::LeftToRight);
        assert_eq!(merged.parts, vec![1, 0]);
        assert_eq!(merged.text, "The cat");
        assert_eq!(merged.bbox.left(), 10.0);
        assert_eq!(merged.bbox.right(), 150.0);
    }

    #[test]
    fn test_character_size_uses_thickest_line() {
        let arena = arena_of(vec![
            Line::new("abcd", BoundingBox::new(50.0, 50.0, 80.0, 20.0)),
            Line::new("xy", BoundingBox::new(50.0, 80.0, 60.0, 30.0)),
        ]);
        let lines = vec![MergedLine::single(&arena, 0), MergedLine::single(&arena, 1)];
        let size = estimate_character_size(&lines, WritingDirection::LeftToRight);
        assert_eq!(size, 30.0);
    }

    #[test]
    fn test_character_size_is_zero_without_text() {
        let arena = arena_of(vec![Line::new("  ", BoundingBox::new(50.0, 50.0, 80.0, 20.0))]);
        let lines = vec![MergedLine::single(&arena, 0)];
        assert_eq!(estimate_character_size(&lines, WritingDirection::LeftToRight), 0.0);
    }
}
