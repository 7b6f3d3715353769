//! Character classes and the joiner used when fragments of one line are stitched together.
use regex::Regex;
use std::sync::OnceLock;

static CJK: OnceLock<Option<Regex>> = OnceLock::new();
static KANJI: OnceLock<Option<Regex>> = OnceLock::new();
static SPACELESS: OnceLock<Option<Regex>> = OnceLock::new();

const CJK_PATTERN: &str = r"[\p{Han}\p{Hiragana}\p{Katakana}々〆ヵヶー]";
const KANJI_PATTERN: &str = r"[\p{Han}々〆ヵヶ]";
/// Scripts and forms written without spaces between words.
const SPACELESS_PATTERN: &str =
    r"[\p{Han}\p{Hiragana}\p{Katakana}\p{Hangul}\u{3000}-\u{303F}\u{FF00}-\u{FFEF}ー々〆]";

fn is_match(cell: &'static OnceLock<Option<Regex>>, pattern: &str, text: &str) -> bool {
    cell.get_or_init(|| Regex::new(pattern).ok())
        .as_ref()
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}

/// Punctuation that attaches to the preceding fragment.
const CLOSING: &[char] = &[
    '!', '?', '.', ',', ':', ';', ')', ']', '}', '%', '…', '、', '。', '，', '．', '！', '？',
    '」', '』', '）', '】', '〕', '〉', '》', '・',
];

/// Punctuation that attaches to the following fragment.
const OPENING: &[char] = &['(', '[', '{', '「', '『', '（', '【', '〔', '〈', '《'];

/// True when the text holds any Japanese/Chinese script character.
pub fn contains_cjk(text: &str) -> bool {
    is_match(&CJK, CJK_PATTERN, text)
}

/// True when the text holds a kanji-class (logographic) character.
pub fn contains_kanji(text: &str) -> bool {
    is_match(&KANJI, KANJI_PATTERN, text)
}

fn is_spaceless(c: char) -> bool {
    let mut buf = [0u8; 4];
    is_match(&SPACELESS, SPACELESS_PATTERN, c.encode_utf8(&mut buf))
}

/// Whether a space belongs between `left` and `right` when they are read as one run.
pub fn needs_separator(left: &str, right: &str) -> bool {
    let (Some(last), Some(first)) = (left.chars().next_back(), right.chars().next()) else {
        return false;
    };
    if last.is_whitespace() || first.is_whitespace() {
        return false;
    }
    if CLOSING.contains(&first) || OPENING.contains(&last) {
        return false;
    }
    !(is_spaceless(last) || is_spaceless(first))
}

pub fn join_fragments(left: &str, right: &str) -> String {
    let mut out = String::with_capacity(left.len() + right.len() + 1);
    out.push_str(left);
    if needs_separator(left, right) {
        out.push(' ');
    }
    out.push_str(right);
    out
}

/// Count of characters that occupy a glyph cell.
pub fn glyph_count(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}
