//! Text normalization for extracted document content.
//!
//! NFKC-normalize, fold line endings to `\n`, keep `\n`/`\t`, collapse every
//! other whitespace run to a single space, and drop every character in the
//! Unicode "control" (Cc) and "format" (Cf) categories.

use unicode_categories::UnicodeCategories;
use unicode_normalization::UnicodeNormalization;

pub fn normalize_text(text: &str) -> String {
    let folded = text.replace("\r\n", "\n").replace('\r', "\n");
    let normalized: String = folded.nfkc().collect();

    let mut out = String::with_capacity(normalized.len());
    for ch in normalized.chars() {
        if ch == '\n' || ch == '\t' {
            out.push(ch);
            continue;
        }
        if ch.is_whitespace() {
            out.push(' ');
            continue;
        }
        if ch.is_control() || ch.is_other_format() {
            continue;
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_newline_and_tab() {
        assert_eq!(normalize_text("a\nb\tc"), "a\nb\tc");
    }

    #[test]
    fn folds_crlf_and_cr() {
        assert_eq!(normalize_text("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn collapses_other_whitespace() {
        assert_eq!(normalize_text("a\u{00A0}b"), "a b");
    }

    #[test]
    fn drops_control_and_format_chars() {
        let text = format!("a{}b{}c", '\u{0007}', '\u{200B}');
        assert_eq!(normalize_text(&text), "abc");
    }

    #[test]
    fn nfkc_normalizes_compatibility_forms() {
        // U+FF21 FULLWIDTH LATIN CAPITAL LETTER A -> 'A'
        assert_eq!(normalize_text("\u{FF21}"), "A");
    }
}
