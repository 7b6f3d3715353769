//! Turns one frame of loose line detections into paragraphs in reading order.
//!
//! The reconstruction runs in fixed steps, each consuming the previous one:
//!
//! 1. classify every line as vertical, horizontal or unknown from its aspect ratio;
//! 2. group lines into paragraphs (vertical pass, then horizontal pass), merging
//!    fragments of one line detected separately;
//! 3. drop furigana lines (optional);
//! 4. estimate each paragraph's character size;
//! 5. merge paragraphs split apart by generous line spacing;
//! 6. collect paragraphs into rows that overlap on screen;
//! 7. order each row (right to left when it is mostly vertical text);
//! 8. order rows top to bottom.
//!
//! [`reconstruct`] is a pure function of its inputs and may be called from any
//! number of threads at once.
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::{OcrFrame, Paragraph, WritingDirection};

mod arena;
mod axis;
mod components;
mod flatten;
mod furigana;
mod grouping;
mod ordering;

use arena::{LineArena, MergedLine, ParagraphDraft};

/// Written between paragraphs separated by a visibly empty line.
pub const BLANK_LINE_MARKER: &str = "BLANK_LINE";

/// Empirically tuned furigana thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuriganaOptions {
    /// Minimum overlap with the base line along the reading direction, as a fraction.
    pub min_overlap: f32,
    /// Maximum length of horizontal ruby relative to its base line.
    pub horizontal_extent_ratio: f32,
    /// Maximum length of vertical ruby relative to its base column.
    pub vertical_extent_ratio: f32,
}

impl Default for FuriganaOptions {
    fn default() -> Self {
        Self {
            min_overlap: 0.4,
            horizontal_extent_ratio: 0.85,
            vertical_extent_ratio: 0.77,
        }
    }
}

/// Thresholds driving [`reconstruct`]. Ratios are fractions; gaps are multiples of a size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    /// Width/height below which a line reads vertically.
    pub vertical_aspect_ratio: f32,
    /// Lines with fewer glyphs are not classified.
    pub min_orientation_chars: usize,
    pub line_overlap: f32,
    /// Line gap limit, in line thicknesses.
    pub line_gap: f32,
    pub duplicate_stack_overlap: f32,
    pub duplicate_along_overlap: f32,
    pub paragraph_overlap: f32,
    /// Paragraph gap limit, in character sizes.
    pub paragraph_gap: f32,
    pub row_overlap: f32,
    /// Vertical gap, in line heights, that earns a blank-line marker.
    pub blank_line_gap: f32,
    pub furigana_filter: bool,
    pub furigana: FuriganaOptions,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            vertical_aspect_ratio: 0.8,
            min_orientation_chars: 3,
            line_overlap: 0.1,
            line_gap: 2.0,
            duplicate_stack_overlap: 0.7,
            duplicate_along_overlap: 0.4,
            paragraph_overlap: 0.4,
            paragraph_gap: 3.0,
            row_overlap: 0.4,
            blank_line_gap: 2.0,
            furigana_filter: true,
            furigana: FuriganaOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutResult {
    /// Paragraphs in reading order.
    pub paragraphs: Vec<Paragraph>,
    /// Paragraph texts joined by line breaks (and blank-line markers).
    pub text: String,
}

impl LayoutResult {
    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }
}

/// Rebuilds reading order for one frame.
///
/// Lines with unusable geometry (zero or negative size, non-finite values) take
/// no part in grouping or ordering; each is appended as its own paragraph after
/// the ordered ones.
pub fn reconstruct(frame: &OcrFrame, opts: &LayoutOptions) -> LayoutResult {
    let arena = LineArena::from_frame(frame, opts);
    if arena.len() == 0 {
        return LayoutResult::default();
    }

    let mut drafts = grouping::group_lines(&arena, opts);
    if opts.furigana_filter {
        for draft in &mut drafts {
            furigana::suppress_furigana(draft, &opts.furigana);
        }
    }
    let drafts = grouping::merge_paragraphs(&arena, drafts, opts);
    let mut ordered = ordering::order_paragraphs(drafts, opts);

    let degenerate = arena.degenerate_ids().count();
    ordered.extend(arena.degenerate_ids().map(|id| {
        ParagraphDraft::new(WritingDirection::LeftToRight, vec![MergedLine::single(&arena, id)])
    }));

    let text = flatten::flatten_text(&ordered, opts);
    debug!(
        lines = arena.len(),
        paragraphs = ordered.len(),
        degenerate,
        "reconstructed frame layout"
    );
    LayoutResult {
        paragraphs: ordered
            .iter()
            .map(|draft| draft.materialize(&arena, frame, opts))
            .collect(),
        text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{BoundingBox, BoxUnits, Line, Orientation};

    fn line(text: &str, cx: f32, cy: f32, w: f32, h: f32) -> Line {
        Line::new(text, BoundingBox::new(cx, cy, w, h))
    }

    fn run(lines: Vec<Line>) -> LayoutResult {
        reconstruct(&OcrFrame::from_lines(1920, 1080, lines), &LayoutOptions::default())
    }

    #[test]
    fn test_empty_frame() {
        let result = run(vec![]);
        assert!(result.is_empty());
        assert_eq!(result.text, "");
    }

    #[test]
    fn test_same_row_words_join_with_a_space() {
        let result = run(vec![
            line("The", 40.0, 100.0, 60.0, 20.0),
            line("cat", 120.0, 104.0, 60.0, 20.0),
        ]);
        assert_eq!(result.paragraphs.len(), 1);
        assert_eq!(result.text, "The cat");
    }

    #[test]
    fn test_distant_lines_are_separated_by_blank_line() {
        let result = run(vec![
            line("First", 100.0, 100.0, 100.0, 20.0),
            line("Second", 100.0, 180.0, 100.0, 20.0),
        ]);
        assert_eq!(result.paragraphs.len(), 2);
        assert_eq!(result.text, "First\nBLANK_LINE\nSecond");
    }

    #[test]
    fn test_stacked_vertical_columns_use_line_height_for_blank_lines() {
        let result = run(vec![
            line("上の縦書きです", 300.0, 200.0, 30.0, 200.0),
            line("下の縦書きです", 300.0, 500.0, 30.0, 200.0),
        ]);
        assert_eq!(result.paragraphs.len(), 2);
        assert_eq!(result.text, "上の縦書きです\n下の縦書きです");
    }

    #[test]
    fn test_trailing_punctuation_attaches_without_space() {
        let result = run(vec![
            line("Hello", 100.0, 200.0, 100.0, 20.0),
            line("!", 156.0, 202.0, 10.0, 20.0),
        ]);
        assert_eq!(result.paragraphs.len(), 1);
        assert_eq!(result.paragraphs[0].lines.len(), 1);
        assert_eq!(result.text, "Hello!");
    }

    #[test]
    fn test_tall_lines_read_top_to_bottom() {
        let result = run(vec![
            line("日本語", 100.0, 100.0, 20.0, 80.0),
            line("日本語", 100.0, 185.0, 20.0, 80.0),
        ]);
        assert_eq!(result.paragraphs.len(), 1);
        let paragraph = &result.paragraphs[0];
        assert_eq!(paragraph.writing_direction, WritingDirection::TopToBottom);
        assert!(paragraph.lines.iter().all(|l| l.orientation == Orientation::Vertical));
        assert!(paragraph.character_size > 0.0);
    }

    #[test]
    fn test_furigana_under_kanji_line_is_suppressed() {
        let lines = vec![
            line("漢字を読む", 100.0, 100.0, 150.0, 30.0),
            line("かんじ", 60.0, 122.0, 60.0, 12.0),
        ];
        let result = run(lines.clone());
        assert_eq!(result.text, "漢字を読む");

        let mut opts = LayoutOptions::default();
        opts.furigana_filter = false;
        let unfiltered = reconstruct(&OcrFrame::from_lines(1920, 1080, lines), &opts);
        assert_eq!(unfiltered.text, "漢字を読むかんじ");
    }

    #[test]
    fn test_reconstruct_is_idempotent() {
        let lines = vec![
            line("右の列の文章", 400.0, 200.0, 30.0, 200.0),
            line("左の列の文章", 360.0, 200.0, 30.0, 200.0),
            line("caption text", 200.0, 500.0, 150.0, 20.0),
            line("more caption", 200.0, 525.0, 150.0, 20.0),
        ];
        let frame = OcrFrame::from_lines(1920, 1080, lines);
        let opts = LayoutOptions::default();
        assert_eq!(reconstruct(&frame, &opts), reconstruct(&frame, &opts));
    }

    #[test]
    fn test_bands_read_top_down_and_vertical_bands_right_to_left() {
        let result = run(vec![
            line("bottom band", 300.0, 700.0, 200.0, 20.0),
            line("左側の縦書き", 100.0, 300.0, 30.0, 200.0),
            line("右側の縦書き", 600.0, 300.0, 30.0, 200.0),
            line("top band", 300.0, 50.0, 200.0, 20.0),
        ]);
        let texts: Vec<String> = result.paragraphs.iter().map(|p| p.text()).collect();
        assert_eq!(
            texts,
            vec!["top band", "右側の縦書き", "左側の縦書き", "bottom band"]
        );
    }

    #[test]
    fn test_degenerate_line_is_kept_as_its_own_paragraph() {
        let result = run(vec![
            line("visible", 100.0, 100.0, 100.0, 20.0),
            line("ghost", 100.0, 100.0, 0.0, 20.0),
            line("nan", f32::NAN, 100.0, 10.0, 20.0),
        ]);
        assert_eq!(result.paragraphs.len(), 3);
        assert_eq!(result.paragraphs[0].text(), "visible");
        assert_eq!(result.paragraphs[1].text(), "ghost");
        assert_eq!(result.paragraphs[2].text(), "nan");
        assert!(result.paragraphs.iter().all(|p| p.character_size > 0.0));
    }

    #[test]
    fn test_normalized_frames_report_normalized_geometry() {
        let frame = OcrFrame::from_lines(
            1000,
            1000,
            vec![
                line("The", 0.04, 0.100, 0.06, 0.02),
                line("cat", 0.12, 0.104, 0.06, 0.02),
            ],
        )
        .with_units(BoxUnits::Normalized);
        let result = reconstruct(&frame, &LayoutOptions::default());
        assert_eq!(result.text, "The cat");
        let b = result.paragraphs[0].bounding_box;
        assert!(b.right() <= 1.0 && b.left() >= 0.0);
        assert!((result.paragraphs[0].character_size - 0.14 / 6.0).abs() < 1e-4);
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let opts: LayoutOptions = serde_json::from_str(r#"{"furigana_filter": false}"#).unwrap();
        assert!(!opts.furigana_filter);
        assert_eq!(opts.line_gap, 2.0);
        assert_eq!(opts.furigana.vertical_extent_ratio, 0.77);
    }
}
