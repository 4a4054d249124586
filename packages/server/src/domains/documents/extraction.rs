//! Plain-text extraction from uploaded files.
//!
//! There is no real PDF parser here. Two cheap scrapes are offered and callers
//! pick one: [`readable_text`] keeps printable ASCII runs, [`text_objects`]
//! pulls literal strings shown with `Tj` inside `BT ... ET` text objects.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TEXT_OBJECT: Regex = Regex::new(r"(?s)BT.*?ET").unwrap();
    static ref SHOW_TEXT: Regex = Regex::new(r"\(([^)]*)\)\s*Tj").unwrap();
}

pub fn is_text(file_type: Option<&str>, name: &str) -> bool {
    file_type.is_some_and(|t| t.starts_with("text/")) || name.ends_with(".txt") || name.ends_with(".md")
}

pub fn is_pdf(file_type: Option<&str>, name: &str) -> bool {
    file_type == Some("application/pdf") || name.ends_with(".pdf")
}

/// Decode bytes as UTF-8, replacing invalid sequences.
pub fn decode_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Printable ASCII only, whitespace collapsed to single spaces, trimmed, and
/// cut to at most `limit` characters.
pub fn readable_text(bytes: &[u8], limit: usize) -> String {
    let printable: String = decode_text(bytes)
        .chars()
        .map(|c| if matches!(c, ' '..='~') { c } else { ' ' })
        .collect();

    let collapsed = printable.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(limit).collect()
}

/// Strings shown by `(...) Tj` inside text objects, each followed by a space.
pub fn text_objects(bytes: &[u8]) -> String {
    let source = decode_text(bytes);
    let mut text = String::new();

    for object in TEXT_OBJECT.find_iter(&source) {
        for shown in SHOW_TEXT.captures_iter(object.as_str()) {
            text.push_str(&shown[1]);
            text.push(' ');
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_detection() {
        assert!(is_text(Some("text/markdown"), "notes"));
        assert!(is_text(None, "notes.md"));
        assert!(is_text(Some("application/octet-stream"), "a.txt"));
        assert!(!is_text(Some("application/pdf"), "a.pdf"));

        assert!(is_pdf(Some("application/pdf"), "scan"));
        assert!(is_pdf(None, "scan.pdf"));
        assert!(!is_pdf(Some("text/plain"), "a.txt"));
    }

    #[test]
    fn test_readable_text_collapses_binary() {
        let bytes = b"%PDF-1.4\n\x00\x01stream\r\n  Hello\tworld \xff\xfe end";
        assert_eq!(readable_text(bytes, 100), "%PDF-1.4 stream Hello world end");
    }

    #[test]
    fn test_readable_text_limit() {
        let bytes = "a b c d e".as_bytes();
        assert_eq!(readable_text(bytes, 3), "a b");
    }

    #[test]
    fn test_readable_text_drops_non_ascii() {
        assert_eq!(readable_text("café crème".as_bytes(), 100), "caf cr me");
    }

    #[test]
    fn test_text_objects() {
        let pdf = b"1 0 obj BT /F1 12 Tf (Hello) Tj (World)  Tj ET junk (Ignored) Tj BT\n(Again)\nTj\nET";
        assert_eq!(text_objects(pdf), "Hello World Again ");
    }

    #[test]
    fn test_text_objects_empty_without_markers() {
        assert_eq!(text_objects(b"(Hello) Tj"), "");
    }
}
