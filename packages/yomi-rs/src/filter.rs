//! Derives the comparable text of a frame from the raw reconstructed text.
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use yomi_ocr::BLANK_LINE_MARKER;

static BLANK_LINE_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
static JAPANESE_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
static WHITESPACE_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

fn blank_line_pattern() -> Option<&'static Regex> {
  BLANK_LINE_PATTERN
    .get_or_init(|| Regex::new(&format!(r"\s*\b{}\b\s*", BLANK_LINE_MARKER)).ok())
    .as_ref()
}

fn japanese_pattern() -> Option<&'static Regex> {
  // Anything that is not kana, kanji, CJK punctuation, fullwidth forms or whitespace.
  JAPANESE_PATTERN
    .get_or_init(|| {
      Regex::new(
        r"[^\p{Han}\p{Hiragana}\p{Katakana}\u{30FC}\u{3000}-\u{303F}\u{FF00}-\u{FFEF}\s]",
      )
      .ok()
    })
    .as_ref()
}

fn whitespace_pattern() -> Option<&'static Regex> {
  WHITESPACE_PATTERN.get_or_init(|| Regex::new(r"\s+").ok()).as_ref()
}

/// Characters kept by [`TextFilter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterLanguage {
  Japanese,
  #[default]
  Any,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextFilter {
  language: FilterLanguage,
}

impl TextFilter {
  pub fn new(language: FilterLanguage) -> Self {
    Self { language }
  }

  pub fn language(&self) -> FilterLanguage {
    self.language
  }

  /// Strips layout markers, drops characters outside the language and collapses whitespace.
  pub fn apply(&self, original_text: &str) -> String {
    let mut text = match blank_line_pattern() {
      Some(re) => re.replace_all(original_text, " ").into_owned(),
      None => original_text.replace(BLANK_LINE_MARKER, " "),
    };

    if self.language == FilterLanguage::Japanese {
      if let Some(re) = japanese_pattern() {
        text = re.replace_all(&text, "").into_owned();
      }
    }

    let collapsed = match whitespace_pattern() {
      Some(re) => re.replace_all(&text, " ").into_owned(),
      None => text.split_whitespace().collect::<Vec<_>>().join(" "),
    };
    collapsed.trim().to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_blank_line_marker_is_removed() {
    let filter = TextFilter::default();
    assert_eq!(filter.apply("First\nBLANK_LINE\nSecond"), "First Second");
  }

  #[test]
  fn test_whitespace_collapses() {
    let filter = TextFilter::new(FilterLanguage::Any);
    assert_eq!(filter.apply("  The \n\n cat\t sat "), "The cat sat");
  }

  #[test]
  fn test_japanese_filter_drops_latin_noise() {
    let filter = TextFilter::new(FilterLanguage::Japanese);
    assert_eq!(
      filter.apply("HP 100 「こんにちは」 ラーメン"),
      "「こんにちは」 ラーメン"
    );
    assert_eq!(filter.apply("abc"), "");
  }

  #[test]
  fn test_marker_inside_words_is_kept() {
    let filter = TextFilter::default();
    assert_eq!(filter.apply("XBLANK_LINEY"), "XBLANK_LINEY");
  }

  #[test]
  fn test_language_deserializes_lowercase() {
    let lang: FilterLanguage = serde_json::from_str("\"japanese\"").unwrap();
    assert_eq!(lang, FilterLanguage::Japanese);
  }
}
