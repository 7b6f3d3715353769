//! Flattened text for the whole frame.
use super::arena::ParagraphDraft;
use super::{LayoutOptions, BLANK_LINE_MARKER};

/// Joins paragraph texts, inserting the blank-line marker where the vertical
/// gap between neighbours exceeds `blank_line_gap` × their mean line height.
pub(crate) fn flatten_text(paragraphs: &[ParagraphDraft], opts: &LayoutOptions) -> String {
    let mut out = String::new();
    let mut previous: Option<&ParagraphDraft> = None;

    for paragraph in paragraphs {
        let text = paragraph.text();
        if text.trim().is_empty() {
            continue;
        }
        if let Some(prev) = previous {
            if is_wide_gap(prev, paragraph, opts) {
                out.push('\n');
                out.push_str(BLANK_LINE_MARKER);
            }
            out.push('\n');
        }
        out.push_str(&text);
        previous = Some(paragraph);
    }
    out
}

fn is_wide_gap(upper: &ParagraphDraft, lower: &ParagraphDraft, opts: &LayoutOptions) -> bool {
    let gap = lower.bbox.top() - upper.bbox.bottom();
    let (sum, count) = upper
        .line_heights()
        .chain(lower.line_heights())
        .fold((0.0_f32, 0usize), |(sum, count), t| (sum + t, count + 1));
    if count == 0 {
        return false;
    }
    gap > opts.blank_line_gap * (sum / count as f32)
}
