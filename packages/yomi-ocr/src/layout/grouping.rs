//! Steps 2 and 5: lines into paragraphs, then repair of paragraphs split too eagerly.
use tracing::trace;

use crate::geometry::{BoundingBox, Orientation, WritingDirection};

use super::arena::{aspect_orientation, LineArena, LineId, MergedLine, ParagraphDraft};
use super::axis::{extent, span, PairMetrics};
use super::components::{connected_components, SweepItem};
use super::LayoutOptions;

const PASSES: [WritingDirection; 2] = [
    WritingDirection::TopToBottom,
    WritingDirection::LeftToRight,
];

/// Groups every usable line of the arena into paragraph drafts.
///
/// Vertical lines are grouped first, then horizontal ones; lines of unknown
/// orientation are offered to both passes and stay with the first that claims
/// them. Lines nobody claims become single-line paragraphs.
pub(crate) fn group_lines(arena: &LineArena, opts: &LayoutOptions) -> Vec<ParagraphDraft> {
    let mut grouped = vec![false; arena.len()];
    let mut drafts = Vec::new();

    for direction in PASSES {
        let wanted = direction.orientation();
        let candidates: Vec<LineId> = arena
            .usable_ids()
            .filter(|&id| !grouped[id])
            .filter(|&id| {
                let orientation = arena.slot(id).orientation;
                orientation == wanted || orientation == Orientation::Unknown
            })
            .collect();
        if candidates.len() < 2 {
            continue;
        }

        let stack = direction.stack();
        let items: Vec<SweepItem> = candidates
            .iter()
            .map(|&id| {
                let bbox = &arena.slot(id).bbox;
                let (start, end) = span(bbox, stack);
                SweepItem {
                    start,
                    end,
                    reach: opts.line_gap * extent(bbox, stack),
                }
            })
            .collect();

        let components = connected_components(&items, |a, b| {
            let (a, b) = (&arena.slot(candidates[a]).bbox, &arena.slot(candidates[b]).bbox);
            let limit = opts.line_gap * extent(a, stack).max(extent(b, stack));
            PairMetrics::measure(a, b, direction).adjacent(opts.line_overlap, limit)
        });

        for component in components {
            if component.len() < 2 {
                continue;
            }
            let ids: Vec<LineId> = component.into_iter().map(|i| candidates[i]).collect();
            if !claims(arena, &ids, direction, opts) {
                continue;
            }
            for &id in &ids {
                grouped[id] = true;
            }
            let lines = ids.iter().map(|&id| MergedLine::single(arena, id)).collect();
            let draft = assemble(arena, direction, lines, opts);
            trace!(
                lines = ids.len(),
                merged = draft.lines.len(),
                ?direction,
                "grouped paragraph"
            );
            drafts.push(draft);
        }
    }

    for id in arena.usable_ids().filter(|&id| !grouped[id]) {
        let slot = arena.slot(id);
        let direction = match slot.orientation {
            Orientation::Vertical => WritingDirection::TopToBottom,
            Orientation::Horizontal => WritingDirection::LeftToRight,
            Orientation::Unknown => direction_from_aspect(&slot.bbox, opts),
        };
        drafts.push(ParagraphDraft::new(direction, vec![MergedLine::single(arena, id)]));
    }

    drafts
}

fn direction_from_aspect(bbox: &BoundingBox, opts: &LayoutOptions) -> WritingDirection {
    match aspect_orientation(bbox, opts) {
        Orientation::Vertical => WritingDirection::TopToBottom,
        _ => WritingDirection::LeftToRight,
    }
}

/// Whether a pass may take a component.
///
/// The vertical pass needs one vertical line, or a group of short lines whose
/// combined box is itself tall; the horizontal pass takes whatever is left.
fn claims(
    arena: &LineArena,
    ids: &[LineId],
    direction: WritingDirection,
    opts: &LayoutOptions,
) -> bool {
    if direction == WritingDirection::LeftToRight {
        return true;
    }
    if ids
        .iter()
        .any(|&id| arena.slot(id).orientation == Orientation::Vertical)
    {
        return true;
    }
    let union = ids
        .iter()
        .map(|&id| arena.slot(id).bbox)
        .reduce(|acc, b| acc.union(&b));
    matches!(union, Some(b) if aspect_orientation(&b, opts) == Orientation::Vertical)
}

/// Orders lines for reading and folds near-duplicate fragments together.
pub(crate) fn assemble(
    arena: &LineArena,
    direction: WritingDirection,
    mut lines: Vec<MergedLine>,
    opts: &LayoutOptions,
) -> ParagraphDraft {
    sort_lines(&mut lines, direction);

    let mut merged: Vec<MergedLine> = Vec::with_capacity(lines.len());
    for line in lines {
        match merged.last_mut() {
            Some(last) if is_near_duplicate(last, &line, direction, opts) => {
                last.absorb(arena, line, direction)
            }
            _ => merged.push(line),
        }
    }
    ParagraphDraft::new(direction, merged)
}

/// Vertical columns right to left, horizontal lines top to bottom.
fn sort_lines(lines: &mut [MergedLine], direction: WritingDirection) {
    let along = direction.along();
    lines.sort_by(|a, b| {
        let primary = match direction {
            WritingDirection::TopToBottom => b.bbox.right().total_cmp(&a.bbox.right()),
            WritingDirection::LeftToRight => a.bbox.top().total_cmp(&b.bbox.top()),
        };
        primary
            .then(span(&a.bbox, along).0.total_cmp(&span(&b.bbox, along).0))
            .then(a.parts.cmp(&b.parts))
    });
}

fn is_near_duplicate(
    a: &MergedLine,
    b: &MergedLine,
    direction: WritingDirection,
    opts: &LayoutOptions,
) -> bool {
    let m = PairMetrics::measure(&a.bbox, &b.bbox, direction);
    m.stack_overlap > opts.duplicate_stack_overlap && m.along_overlap < opts.duplicate_along_overlap
}

/// Step 5: rejoins paragraphs of one direction that continue each other on the same line.
///
/// Two paragraphs connect when they overlap by more than `paragraph_overlap` of the
/// thinner one and the gap along the line is at most `paragraph_gap` character sizes.
pub(crate) fn merge_paragraphs(
    arena: &LineArena,
    drafts: Vec<ParagraphDraft>,
    opts: &LayoutOptions,
) -> Vec<ParagraphDraft> {
    let mut slots: Vec<Option<ParagraphDraft>> = drafts.into_iter().map(Some).collect();
    let mut out = Vec::with_capacity(slots.len());

    for direction in PASSES {
        let members: Vec<usize> = slots
            .iter()
            .enumerate()
            .filter_map(|(i, d)| d.as_ref().filter(|d| d.direction == direction).map(|_| i))
            .collect();
        let stack = direction.stack();

        let components = {
            let view: Vec<&ParagraphDraft> =
                members.iter().filter_map(|&i| slots[i].as_ref()).collect();
            let items: Vec<SweepItem> = view
                .iter()
                .map(|d| {
                    let (start, end) = span(&d.bbox, stack);
                    SweepItem {
                        start,
                        end,
                        reach: 0.0,
                    }
                })
                .collect();
            connected_components(&items, |a, b| {
                let (a, b) = (view[a], view[b]);
                let limit = opts.paragraph_gap * a.character_size.max(b.character_size);
                let m = PairMetrics::measure(&a.bbox, &b.bbox, direction);
                m.stack_overlap > opts.paragraph_overlap && m.along_gap <= limit
            })
        };

        for component in components {
            let mut parts: Vec<ParagraphDraft> = component
                .into_iter()
                .filter_map(|i| slots[members[i]].take())
                .collect();
            if parts.len() == 1 {
                out.append(&mut parts);
                continue;
            }
            trace!(paragraphs = parts.len(), ?direction, "merging split paragraphs");
            let lines: Vec<MergedLine> = parts.into_iter().flat_map(|d| d.lines).collect();
            out.push(assemble(arena, direction, lines, opts));
        }
    }
    out
}
