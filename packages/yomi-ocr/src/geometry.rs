//! Value types describing what an OCR provider saw on screen.
//!
//! Boxes are stored centre-first, the way most providers report them. Whether the
//! numbers are pixels or fractions of the image is recorded once per frame in
//! [`BoxUnits`]; everything inside a frame must agree.
use serde::{Deserialize, Serialize};

use crate::text::join_fragments;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub center_x: f32,
    pub center_y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(center_x: f32, center_y: f32, width: f32, height: f32) -> Self {
        Self {
            center_x,
            center_y,
            width,
            height,
        }
    }

    pub fn from_edges(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            center_x: (left + right) / 2.0,
            center_y: (top + bottom) / 2.0,
            width: right - left,
            height: bottom - top,
        }
    }

    pub fn left(&self) -> f32 {
        self.center_x - self.width / 2.0
    }

    pub fn right(&self) -> f32 {
        self.center_x + self.width / 2.0
    }

    pub fn top(&self) -> f32 {
        self.center_y - self.height / 2.0
    }

    pub fn bottom(&self) -> f32 {
        self.center_y + self.height / 2.0
    }

    /// A box carries usable geometry only when it is finite with a positive area.
    pub fn is_usable(&self) -> bool {
        self.center_x.is_finite()
            && self.center_y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }

    /// Smallest box enclosing both.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::from_edges(
            self.left().min(other.left()),
            self.top().min(other.top()),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    pub fn scale(&self, sx: f32, sy: f32) -> BoundingBox {
        BoundingBox {
            center_x: self.center_x * sx,
            center_y: self.center_y * sy,
            width: self.width * sx,
            height: self.height * sy,
        }
    }

    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.left() && x <= self.right() && y >= self.top() && y <= self.bottom()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    pub bounding_box: BoundingBox,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
}

impl Word {
    pub fn new(text: impl Into<String>, bounding_box: BoundingBox) -> Self {
        Self {
            text: text.into(),
            bounding_box,
            separator: None,
        }
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = Some(separator.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Vertical,
    Horizontal,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritingDirection {
    TopToBottom,
    #[default]
    LeftToRight,
}

impl WritingDirection {
    /// Line orientation that reads in this direction.
    pub fn orientation(self) -> Orientation {
        match self {
            WritingDirection::TopToBottom => Orientation::Vertical,
            WritingDirection::LeftToRight => Orientation::Horizontal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub bounding_box: BoundingBox,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub words: Vec<Word>,
    /// Provider supplied text; when absent the words are concatenated instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub orientation: Orientation,
}

impl Line {
    pub fn new(text: impl Into<String>, bounding_box: BoundingBox) -> Self {
        Self {
            bounding_box,
            words: Vec::new(),
            text: Some(text.into()),
            orientation: Orientation::Unknown,
        }
    }

    pub fn from_words(words: Vec<Word>, bounding_box: BoundingBox) -> Self {
        Self {
            bounding_box,
            words,
            text: None,
            orientation: Orientation::Unknown,
        }
    }

    pub fn text(&self) -> String {
        if let Some(text) = &self.text {
            return text.clone();
        }
        let mut out = String::new();
        for word in &self.words {
            out.push_str(&word.text);
            if let Some(separator) = &word.separator {
                out.push_str(separator);
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    #[serde(default)]
    pub bounding_box: BoundingBox,
    pub lines: Vec<Line>,
    #[serde(default)]
    pub writing_direction: WritingDirection,
    /// Reading-axis size of one glyph of the paragraph's largest line.
    #[serde(default)]
    pub character_size: f32,
}

impl Paragraph {
    /// Wraps raw provider lines; reconstruction recomputes every derived field.
    pub fn from_lines(lines: Vec<Line>) -> Self {
        let bounding_box = lines
            .iter()
            .map(|line| line.bounding_box)
            .reduce(|acc, b| acc.union(&b))
            .unwrap_or_default();
        Self {
            bounding_box,
            lines,
            writing_direction: WritingDirection::default(),
            character_size: 0.0,
        }
    }

    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.text())
            .fold(String::new(), |acc, next| join_fragments(&acc, &next))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoxUnits {
    #[default]
    Pixels,
    /// Fractions of the image width and height.
    Normalized,
}

/// One capture's worth of raw detections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrFrame {
    pub image_width: u32,
    pub image_height: u32,
    #[serde(default)]
    pub units: BoxUnits,
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,
}

impl OcrFrame {
    pub fn new(image_width: u32, image_height: u32) -> Self {
        Self {
            image_width,
            image_height,
            units: BoxUnits::Pixels,
            paragraphs: Vec::new(),
        }
    }

    pub fn with_units(mut self, units: BoxUnits) -> Self {
        self.units = units;
        self
    }

    /// Builds a frame where every detected line is its own provider paragraph.
    pub fn from_lines(image_width: u32, image_height: u32, lines: Vec<Line>) -> Self {
        let mut frame = Self::new(image_width, image_height);
        frame.paragraphs = lines
            .into_iter()
            .map(|line| Paragraph::from_lines(vec![line]))
            .collect();
        frame
    }

    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.paragraphs.iter().flat_map(|p| p.lines.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.lines().next().is_none()
    }

    pub fn to_pixels(&self, bbox: &BoundingBox) -> BoundingBox {
        match self.units {
            BoxUnits::Pixels => *bbox,
            BoxUnits::Normalized => bbox.scale(self.image_width as f32, self.image_height as f32),
        }
    }

    pub fn from_pixels(&self, bbox: &BoundingBox) -> BoundingBox {
        match self.units {
            BoxUnits::Pixels => *bbox,
            BoxUnits::Normalized if self.image_width > 0 && self.image_height > 0 => bbox.scale(
                1.0 / self.image_width as f32,
                1.0 / self.image_height as f32,
            ),
            BoxUnits::Normalized => *bbox,
        }
    }

    /// Converts a pixel length measured along `direction`'s reading axis back to frame units.
    pub fn length_from_pixels(&self, length: f32, direction: WritingDirection) -> f32 {
        let dimension = match direction {
            WritingDirection::LeftToRight => self.image_width,
            WritingDirection::TopToBottom => self.image_height,
        };
        match self.units {
            BoxUnits::Normalized if dimension > 0 => length / dimension as f32,
            _ => length,
        }
    }
}

/// Pixel rectangle of the screen region a frame was cropped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn to_bounding_box(&self) -> BoundingBox {
        BoundingBox::from_edges(
            self.x as f32,
            self.y as f32,
            self.x as f32 + self.width as f32,
            self.y as f32 + self.height as f32,
        )
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        self.to_bounding_box().contains_point(x, y)
    }
}
