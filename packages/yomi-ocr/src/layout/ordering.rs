//! Steps 6–8: rows of paragraphs, ordered for reading.
use crate::geometry::Orientation;

use super::arena::ParagraphDraft;
use super::axis::{overlap_ratio, span, Axis};
use super::components::{connected_components, SweepItem};
use super::LayoutOptions;

/// Returns the drafts in final reading order.
pub(crate) fn order_paragraphs(
    drafts: Vec<ParagraphDraft>,
    opts: &LayoutOptions,
) -> Vec<ParagraphDraft> {
    if drafts.is_empty() {
        return drafts;
    }

    let items: Vec<SweepItem> = drafts
        .iter()
        .map(|d| {
            let (start, end) = span(&d.bbox, Axis::Y);
            SweepItem {
                start,
                end,
                reach: 0.0,
            }
        })
        .collect();
    let rows = connected_components(&items, |a, b| {
        overlap_ratio(&drafts[a].bbox, &drafts[b].bbox, Axis::Y) > opts.row_overlap
    });

    let mut rows: Vec<(f32, Vec<usize>)> = rows
        .into_iter()
        .map(|members| {
            let top = members
                .iter()
                .map(|&i| drafts[i].bbox.top())
                .fold(f32::INFINITY, f32::min);
            (top, order_row(&drafts, members))
        })
        .collect();
    rows.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.first().cmp(&b.1.first())));

    let order: Vec<usize> = rows.into_iter().flat_map(|(_, members)| members).collect();
    let mut slots: Vec<Option<ParagraphDraft>> = drafts.into_iter().map(Some).collect();
    order.into_iter().filter_map(|i| slots[i].take()).collect()
}

/// Step 7 for a single row.
fn order_row(drafts: &[ParagraphDraft], mut members: Vec<usize>) -> Vec<usize> {
    let vertical = members
        .iter()
        .filter(|&&i| drafts[i].orientation() == Orientation::Vertical)
        .count();
    let dominant = if vertical * 2 >= members.len() {
        Orientation::Vertical
    } else {
        Orientation::Horizontal
    };

    members.sort_by(|&a, &b| {
        drafts[a]
            .bbox
            .left()
            .total_cmp(&drafts[b].bbox.left())
            .then(a.cmp(&b))
    });
    if dominant == Orientation::Vertical {
        members.reverse();
    }

    // Runs written against the row's grain keep their own left-to-right sense.
    let mut start = 0;
    while start < members.len() {
        if drafts[members[start]].orientation() == dominant {
            start += 1;
            continue;
        }
        let mut end = start;
        while end < members.len() && drafts[members[end]].orientation() != dominant {
            end += 1;
        }
        members[start..end].reverse();
        start = end;
    }
    members
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{BoundingBox, Line, OcrFrame, WritingDirection};
    use crate::layout::arena::{LineArena, MergedLine};

    fn drafts(specs: &[(&str, WritingDirection, BoundingBox)]) -> Vec<ParagraphDraft> {
        let lines = specs.iter().map(|(t, _, b)| Line::new(*t, *b)).collect();
        let frame = OcrFrame::from_lines(2000, 2000, lines);
        let arena = LineArena::from_frame(&frame, &LayoutOptions::default());
        specs
            .iter()
            .enumerate()
            .map(|(id, (_, dir, _))| {
                ParagraphDraft::new(*dir, vec![MergedLine::single(&arena, id)])
            })
            .collect()
    }

    fn texts(ordered: &[ParagraphDraft]) -> Vec<String> {
        ordered.iter().map(|d| d.text()).collect()
    }

    #[test]
    fn test_rows_are_read_top_to_bottom() {
        let h = WritingDirection::LeftToRight;
        let ordered = order_paragraphs(
            drafts(&[
                ("lower", h, BoundingBox::new(100.0, 300.0, 80.0, 20.0)),
                ("upper", h, BoundingBox::new(300.0, 100.0, 80.0, 20.0)),
            ]),
            &LayoutOptions::default(),
        );
        assert_eq!(texts(&ordered), vec!["upper", "lower"]);
    }

    #[test]
    fn test_horizontal_row_reads_left_to_right() {
        let h = WritingDirection::LeftToRight;
        let ordered = order_paragraphs(
            drafts(&[
                ("right", h, BoundingBox::new(300.0, 100.0, 80.0, 20.0)),
                ("left", h, BoundingBox::new(100.0, 102.0, 80.0, 20.0)),
            ]),
            &LayoutOptions::default(),
        );
        assert_eq!(texts(&ordered), vec!["left", "right"]);
    }

    #[test]
    fn test_vertical_row_reads_right_to_left() {
        let v = WritingDirection::TopToBottom;
        let ordered = order_paragraphs(
            drafts(&[
                ("一列目", v, BoundingBox::new(300.0, 200.0, 30.0, 200.0)),
                ("三列目", v, BoundingBox::new(100.0, 200.0, 30.0, 200.0)),
                ("二列目", v, BoundingBox::new(200.0, 210.0, 30.0, 200.0)),
            ]),
            &LayoutOptions::default(),
        );
        assert_eq!(texts(&ordered), vec!["一列目", "二列目", "三列目"]);
    }

    #[test]
    fn test_horizontal_run_inside_vertical_row_keeps_its_order() {
        let v = WritingDirection::TopToBottom;
        let h = WritingDirection::LeftToRight;
        let ordered = order_paragraphs(
            drafts(&[
                ("縦右", v, BoundingBox::new(500.0, 200.0, 30.0, 200.0)),
                ("縦左", v, BoundingBox::new(400.0, 200.0, 30.0, 200.0)),
                ("ab", h, BoundingBox::new(100.0, 200.0, 60.0, 150.0)),
                ("cd", h, BoundingBox::new(200.0, 200.0, 60.0, 150.0)),
            ]),
            &LayoutOptions::default(),
        );
        assert_eq!(texts(&ordered), vec!["縦右", "縦左", "ab", "cd"]);
    }

    #[test]
    fn test_vertical_run_inside_horizontal_row_reads_right_to_left() {
        let v = WritingDirection::TopToBottom;
        let h = WritingDirection::LeftToRight;
        let ordered = order_paragraphs(
            drafts(&[
                ("ab", h, BoundingBox::new(100.0, 200.0, 60.0, 150.0)),
                ("cd", h, BoundingBox::new(200.0, 200.0, 60.0, 150.0)),
                ("縦左", v, BoundingBox::new(400.0, 200.0, 30.0, 200.0)),
                ("縦右", v, BoundingBox::new(500.0, 200.0, 30.0, 200.0)),
                ("ef", h, BoundingBox::new(700.0, 200.0, 60.0, 150.0)),
            ]),
            &LayoutOptions::default(),
        );
        assert_eq!(texts(&ordered), vec!["ab", "cd", "縦右", "縦左", "ef"]);
    }
}
