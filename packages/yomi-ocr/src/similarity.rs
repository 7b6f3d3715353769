//! Fuzzy text comparison shared by the stabilizer and the pipeline's duplicate checks.
//!
//! Scores are `100 × (1 − levenshtein(a, b) / max(|a|, |b|))` over Unicode scalar
//! values, so identical strings score exactly 100 and strings with nothing in
//! common score 0.

/// Similarity score in `0.0..=100.0`. Empty input scores 0.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    100.0 * strsim::normalized_levenshtein(a, b)
}

/// True when `a` and `b` score at least `threshold` (0–100). Never true for empty input.
pub fn similar(a: &str, b: &str, threshold: f64) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    similarity_ratio(a, b) >= threshold
}

/// Concatenates the present entries of a list-shaped OCR result.
pub fn flatten_parts<S: AsRef<str>>(parts: &[Option<S>]) -> String {
    parts
        .iter()
        .flatten()
        .map(|part| part.as_ref())
        .collect::<Vec<_>>()
        .concat()
}

/// [`similar`] over list-shaped inputs, flattened first.
pub fn similar_parts<A: AsRef<str>, B: AsRef<str>>(
    a: &[Option<A>],
    b: &[Option<B>],
    threshold: f64,
) -> bool {
    similar(&flatten_parts(a), &flatten_parts(b), threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_strings_are_similar_at_every_threshold() {
        for threshold in [0.0, 20.0, 80.0, 99.9, 100.0] {
            assert!(similar("こんにちは", "こんにちは", threshold));
        }
    }

    #[test]
    fn test_full_threshold_requires_equality() {
        assert!(!similar("hello", "hellp", 100.0));
        assert!(similar("hello", "hellp", 80.0));
    }

    #[test]
    fn test_empty_input_is_never_similar() {
        assert!(!similar("", "", 0.0));
        assert!(!similar("abc", "", 0.0));
        assert_eq!(similarity_ratio("", "abc"), 0.0);
    }

    #[test]
    fn test_unrelated_strings_score_low() {
        assert!(similarity_ratio("abc", "xyz") < 1.0);
        assert!(!similar("今日は晴れ", "雨が降るでしょう", 20.0));
    }

    #[test]
    fn test_ratio_grows_with_shared_prefix() {
        let short = similarity_ratio("今日は", "今日はいい天気ですね");
        let long = similarity_ratio("今日はいい天気", "今日はいい天気ですね");
        assert!(long > short);
    }

    #[test]
    fn test_parts_are_flattened_skipping_missing_entries() {
        let a = [Some("foo"), None, Some("bar")];
        let b = [Some("foobar")];
        assert_eq!(flatten_parts(&a), "foobar");
        assert!(similar_parts(&a, &b, 100.0));
        let none: [Option<&str>; 2] = [None, None];
        assert!(!similar_parts(&none, &b, 0.0));
    }
}
