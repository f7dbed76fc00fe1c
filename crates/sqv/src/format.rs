//! Converting cell values into printable text.

use serde_json::Value as JsonValue;

use crate::db::CellValue;

/// Default truncation length for table cells.
pub const DEFAULT_MAX_CELL_LEN: usize = 100;

/// Bytes shown in the one-line blob preview.
const BLOB_PREVIEW_BYTES: usize = 8;

/// Bytes per line of the hex dump.
const HEX_DUMP_WIDTH: usize = 16;

/// Character treated as markup by display layers that interpret it.
const MARKUP_OPEN: char = '[';

/// Format a cell for a table view that interprets `[` as markup.
///
/// NULL and blobs get fixed renderings; everything else is truncated to
/// `max_len` characters (plus `...`) and has every `[` escaped.
pub fn format_cell(value: &CellValue, max_len: usize) -> String {
    match value {
        CellValue::Null | CellValue::Blob(_) => preview_cell(value, max_len),
        _ => escape_markup(&preview_cell(value, max_len)),
    }
}

/// Same as [`format_cell`] but without markup escaping, for widgets that
/// render text literally.
pub fn preview_cell(value: &CellValue, max_len: usize) -> String {
    match value {
        CellValue::Null => "NULL".to_string(),
        CellValue::Blob(bytes) => blob_preview(bytes),
        other => truncate_chars(&other.to_string(), max_len),
    }
}

/// `<BLOB 12 bytes: 00 01 02 03 04 05 06 07...>`
pub fn blob_preview(bytes: &[u8]) -> String {
    let shown: Vec<String> = bytes
        .iter()
        .take(BLOB_PREVIEW_BYTES)
        .map(|b| format!("{:02X}", b))
        .collect();
    let more = if bytes.len() > BLOB_PREVIEW_BYTES {
        "..."
    } else {
        ""
    };
    format!("<BLOB {} bytes: {}{}>", bytes.len(), shown.join(" "), more)
}

/// Keep the first `max_len` characters, appending `...` when anything was cut.
pub fn truncate_chars(s: &str, max_len: usize) -> String {
    match s.char_indices().nth(max_len) {
        Some((byte_idx, _)) => format!("{}...", &s[..byte_idx]),
        None => s.to_string(),
    }
}

/// Prefix every markup-opening character with a backslash.
pub fn escape_markup(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if ch == MARKUP_OPEN {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Check if a string looks like JSON (starts/ends with {} or [])
pub fn looks_like_json(value: &str) -> bool {
    let trimmed = value.trim();
    (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']'))
}

/// Pretty-print a JSON object or array. Returns None for anything else.
pub fn try_format_json(value: &str) -> Option<String> {
    if !looks_like_json(value) {
        return None;
    }
    serde_json::from_str::<JsonValue>(value)
        .ok()
        .and_then(|v| serde_json::to_string_pretty(&v).ok())
}

/// What the cell viewer shows: the untruncated value, re-indented when it is
/// JSON, or a hex dump for blobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullValue {
    pub text: String,
    pub is_json: bool,
}

pub fn full_value(value: &CellValue) -> FullValue {
    match value {
        CellValue::Null => FullValue {
            text: "NULL".to_string(),
            is_json: false,
        },
        CellValue::Blob(bytes) => FullValue {
            text: format!(
                "BLOB ({} bytes)\n\n{}",
                group_thousands(bytes.len() as u64),
                hex_dump(bytes)
            ),
            is_json: false,
        },
        other => {
            let raw = other.to_string();
            match try_format_json(&raw) {
                Some(pretty) => FullValue {
                    text: pretty,
                    is_json: true,
                },
                None => FullValue {
                    text: raw,
                    is_json: false,
                },
            }
        }
    }
}

/// Classic hex + ASCII dump, one line per 16 bytes:
/// `00000000  48 65 6C 6C 6F ...  Hello`
pub fn hex_dump(bytes: &[u8]) -> String {
    let hex_width = HEX_DUMP_WIDTH * 3;
    bytes
        .chunks(HEX_DUMP_WIDTH)
        .enumerate()
        .map(|(i, chunk)| {
            let hex: Vec<String> = chunk.iter().map(|b| format!("{:02X}", b)).collect();
            let ascii: String = chunk
                .iter()
                .map(|&b| {
                    if (0x20..=0x7E).contains(&b) {
                        b as char
                    } else {
                        '.'
                    }
                })
                .collect();
            format!(
                "{:08X}  {:<width$}  {}",
                i * HEX_DUMP_WIDTH,
                hex.join(" "),
                ascii,
                width = hex_width
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `1234567` -> `1,234,567`
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null() {
        assert_eq!(format_cell(&CellValue::Null, 100), "NULL");
    }

    #[test]
    fn test_small_blob() {
        let v = CellValue::Blob(vec![0x00, 0x01, 0x02, 0x03]);
        assert_eq!(format_cell(&v, 100), "<BLOB 4 bytes: 00 01 02 03>");
    }

    #[test]
    fn test_large_blob_preview() {
        let v = CellValue::Blob((0..1000u32).map(|i| (i % 256) as u8).collect());
        assert_eq!(
            format_cell(&v, 100),
            "<BLOB 1000 bytes: 00 01 02 03 04 05 06 07...>"
        );
    }

    #[test]
    fn test_exactly_eight_bytes_has_no_ellipsis() {
        let v = CellValue::Blob(vec![0xAB; 8]);
        assert_eq!(
            format_cell(&v, 100),
            "<BLOB 8 bytes: AB AB AB AB AB AB AB AB>"
        );
    }

    #[test]
    fn test_markup_escaped() {
        let v = CellValue::Text("[bold]x[/bold]".to_string());
        assert_eq!(format_cell(&v, 100), "\\[bold]x\\[/bold]");
        // The literal renderer leaves it alone.
        assert_eq!(preview_cell(&v, 100), "[bold]x[/bold]");
    }

    #[test]
    fn test_truncation() {
        let long = "a".repeat(200);
        let out = format_cell(&CellValue::Text(long), 100);
        assert_eq!(out, format!("{}...", "a".repeat(100)));

        let exact = "b".repeat(100);
        assert_eq!(format_cell(&CellValue::Text(exact.clone()), 100), exact);
    }

    #[test]
    fn test_truncation_counts_chars_not_bytes() {
        let s = "é".repeat(5);
        assert_eq!(truncate_chars(&s, 3), "ééé...");
    }

    #[test]
    fn test_numbers() {
        assert_eq!(format_cell(&CellValue::Integer(42), 100), "42");
        assert_eq!(format_cell(&CellValue::Real(1.5), 100), "1.5");
    }

    #[test]
    fn test_json_left_alone_in_cells() {
        let v = CellValue::Text(r#"{"a":1}"#.to_string());
        assert_eq!(preview_cell(&v, 100), r#"{"a":1}"#);
    }

    #[test]
    fn test_full_value_json() {
        let v = CellValue::Text(r#"{"a":1,"b":[1,2]}"#.to_string());
        let full = full_value(&v);
        assert!(full.is_json);
        assert_eq!(
            full.text,
            "{\n  \"a\": 1,\n  \"b\": [\n    1,\n    2\n  ]\n}"
        );
    }

    #[test]
    fn test_full_value_invalid_json_is_plain() {
        let v = CellValue::Text("{not json}".to_string());
        let full = full_value(&v);
        assert!(!full.is_json);
        assert_eq!(full.text, "{not json}");
    }

    #[test]
    fn test_full_value_is_not_truncated() {
        let long = "x".repeat(500);
        assert_eq!(full_value(&CellValue::Text(long.clone())).text, long);
    }

    #[test]
    fn test_hex_dump_full_line() {
        let bytes: Vec<u8> = b"Hello, World!!!!".to_vec();
        assert_eq!(
            hex_dump(&bytes),
            "00000000  48 65 6C 6C 6F 2C 20 57 6F 72 6C 64 21 21 21 21   Hello, World!!!!"
        );
    }

    #[test]
    fn test_hex_dump_short_last_line_is_padded() {
        let mut bytes = vec![0x41; 16];
        bytes.extend_from_slice(&[0x00, 0x7F, 0x42]);
        let dump = hex_dump(&bytes);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            format!("00000010  00 7F 42{}  ..B", " ".repeat(48 - 8))
        );
        // Both ASCII columns start at the same offset.
        assert_eq!(lines[0].find("AAAA"), Some(10 + 48 + 2));
        assert_eq!(lines[1].find("..B"), Some(10 + 48 + 2));
    }

    #[test]
    fn test_full_value_blob_header() {
        let v = CellValue::Blob(vec![0u8; 2048]);
        let full = full_value(&v);
        assert!(full.text.starts_with("BLOB (2,048 bytes)\n\n00000000  00 00"));
        assert_eq!(full.text.lines().count(), 2 + 128);
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }
}
