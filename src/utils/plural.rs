//! Pluralization utilities.

/// Return "s" suffix for plural counts
///
/// # Examples
///
/// - `plural_s(0)` -> `"s"` (0 fonts)
/// - `plural_s(1)` -> `""` (1 font)
/// - `plural_s(5)` -> `"s"` (5 fonts)
#[inline]
pub fn plural_s(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// Format count with noun, handling pluralization
///
/// # Examples
///
/// - `plural_count(0, "artifact")` -> `"0 artifacts"`
/// - `plural_count(1, "artifact")` -> `"1 artifact"`
#[inline]
pub fn plural_count(count: usize, noun: &str) -> String {
    format!("{} {}{}", count, noun, plural_s(count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural_count() {
        assert_eq!(plural_count(0, "font"), "0 fonts");
        assert_eq!(plural_count(1, "font"), "1 font");
        assert_eq!(plural_count(3, "glyph"), "3 glyphs");
    }
}
