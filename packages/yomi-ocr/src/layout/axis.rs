//! Axis bookkeeping for one writing direction.
//!
//! The *along* axis runs through the glyphs of a single line (X for horizontal
//! text, Y for vertical text). The *stack* axis is the one successive lines of a
//! paragraph advance along. A line's *length* is its extent on the along axis and
//! its *thickness* the extent on the stack axis.
use crate::geometry::{BoundingBox, WritingDirection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Axis {
    X,
    Y,
}

impl WritingDirection {
    pub(crate) fn along(self) -> Axis {
        match self {
            WritingDirection::LeftToRight => Axis::X,
            WritingDirection::TopToBottom => Axis::Y,
        }
    }

    pub(crate) fn stack(self) -> Axis {
        match self {
            WritingDirection::LeftToRight => Axis::Y,
            WritingDirection::TopToBottom => Axis::X,
        }
    }
}

pub(crate) fn span(b: &BoundingBox, axis: Axis) -> (f32, f32) {
    match axis {
        Axis::X => (b.left(), b.right()),
        Axis::Y => (b.top(), b.bottom()),
    }
}

pub(crate) fn extent(b: &BoundingBox, axis: Axis) -> f32 {
    match axis {
        Axis::X => b.width,
        Axis::Y => b.height,
    }
}

pub(crate) fn center(b: &BoundingBox, axis: Axis) -> f32 {
    match axis {
        Axis::X => b.center_x,
        Axis::Y => b.center_y,
    }
}

pub(crate) fn overlap(a: (f32, f32), b: (f32, f32)) -> f32 {
    (a.1.min(b.1) - a.0.max(b.0)).max(0.0)
}

pub(crate) fn gap(a: (f32, f32), b: (f32, f32)) -> f32 {
    (a.0.max(b.0) - a.1.min(b.1)).max(0.0)
}

/// Overlap on `axis` as a fraction of the smaller of the two extents.
pub(crate) fn overlap_ratio(a: &BoundingBox, b: &BoundingBox, axis: Axis) -> f32 {
    let smaller = extent(a, axis).min(extent(b, axis));
    if smaller <= 0.0 {
        return 0.0;
    }
    overlap(span(a, axis), span(b, axis)) / smaller
}

/// Pairwise measurements every grouping rule is expressed in.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PairMetrics {
    pub stack_overlap: f32,
    pub along_overlap: f32,
    pub stack_gap: f32,
    pub along_gap: f32,
}

impl PairMetrics {
    pub(crate) fn measure(a: &BoundingBox, b: &BoundingBox, direction: WritingDirection) -> Self {
        let (along, stack) = (direction.along(), direction.stack());
        Self {
            stack_overlap: overlap_ratio(a, b, stack),
            along_overlap: overlap_ratio(a, b, along),
            stack_gap: gap(span(a, stack), span(b, stack)),
            along_gap: gap(span(a, along), span(b, along)),
        }
    }

    /// Either fragments of one line or neighbouring lines of one block.
    pub(crate) fn adjacent(&self, min_overlap: f32, max_gap: f32) -> bool {
        let fragments = self.stack_overlap > min_overlap && self.along_gap < max_gap;
        let stacked = self.along_overlap > min_overlap && self.stack_gap < max_gap;
        fragments || stacked
    }
}
