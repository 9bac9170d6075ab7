// =============================================================================
// Ingest — blob payload repair and bar parsing
// =============================================================================
//
// The upstream feed writes one JSON record per line, CRLF-terminated, with
// backslash escape sequences and a UTF-8 byte-order-mark baked into the blob.
// That raw byte stream is not valid JSON. Repair transform, in order:
//
//   1. Decode backslash escapes (\n \r \t \" \\ \/ \uXXXX \xNN) over the
//      latin-1 interpretation of the bytes. Unknown escapes pass through.
//   2. Strip the BOM — both a decoded U+FEFF and its mis-decoded latin-1
//      form `ï»¿`.
//   3. Replace every CRLF line terminator with a `,` separator.
//   4. Trim the trailing separator left behind by the final line.
//   5. Wrap the whole thing in `[` ... `]`.
//
// The result parses as a JSON array of `{timestamp, open, high, low, close,
// volume}` records (names case-sensitive, exactly as the feed sends them).
// =============================================================================

use crate::error::IngestError;
use crate::types::Bar;

/// Repair the raw blob bytes into a parseable JSON array string.
pub fn repair_payload(raw: &[u8]) -> Result<String, IngestError> {
    let decoded = decode_escapes(raw)?;
    let stripped = decoded.replace('\u{feff}', "").replace("ï»¿", "");
    let joined = stripped.replace("\r\n", ",");
    let trimmed = joined.trim().trim_end_matches(',');
    Ok(format!("[{trimmed}]"))
}

/// Repair and parse the blob into typed bars.
pub fn parse_bars(raw: &[u8]) -> Result<Vec<Bar>, IngestError> {
    let repaired = repair_payload(raw)?;
    let bars: Vec<Bar> = serde_json::from_str(&repaired)?;
    Ok(bars)
}

// =============================================================================
// Escape decoding
// =============================================================================

/// Decode backslash escape sequences, reading plain bytes as latin-1.
fn decode_escapes(raw: &[u8]) -> Result<String, IngestError> {
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;

    while i < raw.len() {
        let b = raw[i];
        if b != b'\\' {
            out.push(b as char);
            i += 1;
            continue;
        }

        let esc = *raw.get(i + 1).ok_or(IngestError::TruncatedEscape(i))?;
        match esc {
            b'n' => out.push('\n'),
            b'r' => out.push('\r'),
            b't' => out.push('\t'),
            b'"' => out.push('"'),
            b'\\' => out.push('\\'),
            b'/' => out.push('/'),
            b'u' => {
                let code = hex_escape(raw, i, 4)?;
                let ch = char::from_u32(code).ok_or(IngestError::InvalidEscape(i))?;
                out.push(ch);
                i += 6;
                continue;
            }
            b'x' => {
                let code = hex_escape(raw, i, 2)?;
                out.push(code as u8 as char);
                i += 4;
                continue;
            }
            // Unknown escape: keep it verbatim for the JSON parser to judge.
            other => {
                out.push('\\');
                out.push(other as char);
            }
        }
        i += 2;
    }

    Ok(out)
}

/// Read `digits` hex digits following `\u` / `\x` at byte offset `start`.
fn hex_escape(raw: &[u8], start: usize, digits: usize) -> Result<u32, IngestError> {
    let hex = raw
        .get(start + 2..start + 2 + digits)
        .ok_or(IngestError::TruncatedEscape(start))?;
    let text = std::str::from_utf8(hex).map_err(|_| IngestError::InvalidEscape(start))?;
    u32::from_str_radix(text, 16).map_err(|_| IngestError::InvalidEscape(start))
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    const RECORD_A: &str =
        r#"{"timestamp":"2021-03-01","open":1.0,"high":2.0,"low":0.5,"close":1.5,"volume":100}"#;
    const RECORD_B: &str =
        r#"{"timestamp":"2021-03-02","open":1.5,"high":2.5,"low":1.0,"close":2.0,"volume":200}"#;

    /// Raw feed bytes: BOM + CRLF-terminated record lines.
    fn feed_bytes() -> Vec<u8> {
        let mut raw = vec![0xEF, 0xBB, 0xBF];
        raw.extend_from_slice(RECORD_A.as_bytes());
        raw.extend_from_slice(b"\r\n");
        raw.extend_from_slice(RECORD_B.as_bytes());
        raw.extend_from_slice(b"\r\n");
        raw
    }

    // ---- repair_payload ----------------------------------------------------

    #[test]
    fn repair_joins_lines_and_strips_bom() {
        let repaired = repair_payload(&feed_bytes()).unwrap();
        assert!(repaired.starts_with('['));
        assert!(repaired.ends_with(']'));
        assert!(!repaired.contains('\u{feff}'));
        assert!(!repaired.contains("ï»¿"));
        assert!(!repaired.contains("\r\n"));
        assert_eq!(repaired.matches("timestamp").count(), 2);
    }

    #[test]
    fn repair_trims_trailing_separator() {
        let repaired = repair_payload(&feed_bytes()).unwrap();
        assert!(!repaired.ends_with(",]"));
        assert!(serde_json::from_str::<serde_json::Value>(&repaired).is_ok());
    }

    #[test]
    fn repair_handles_escaped_line_terminators() {
        // Feed where CRLF arrives as the two-character escapes `\r\n`.
        let raw = format!("{RECORD_A}\\r\\n{RECORD_B}\\r\\n");
        let repaired = repair_payload(raw.as_bytes()).unwrap();
        let bars: Vec<Bar> = serde_json::from_str(&repaired).unwrap();
        assert_eq!(bars.len(), 2);
    }

    #[test]
    fn repair_empty_payload_yields_empty_array() {
        assert_eq!(repair_payload(b"").unwrap(), "[]");
        let bars = parse_bars(b"").unwrap();
        assert!(bars.is_empty());
    }

    // ---- decode_escapes ----------------------------------------------------

    #[test]
    fn escapes_decode_unicode_and_hex() {
        assert_eq!(decode_escapes(br"A\x42C").unwrap(), "ABC");
        assert_eq!(decode_escapes(br#"a\"b\\c\/d\te"#).unwrap(), "a\"b\\c/d\te");
    }

    #[test]
    fn escapes_decode_bom_escape() {
        let decoded = decode_escapes(br"\ufeffx").unwrap();
        assert_eq!(decoded, "\u{feff}x");
        // ...and repair strips it.
        assert_eq!(repair_payload(br"\ufeff").unwrap(), "[]");
    }

    #[test]
    fn unknown_escape_passes_through() {
        assert_eq!(decode_escapes(br"\q").unwrap(), "\\q");
    }

    #[test]
    fn truncated_escape_is_an_error() {
        assert!(matches!(
            decode_escapes(b"abc\\").unwrap_err(),
            IngestError::TruncatedEscape(3)
        ));
        assert!(matches!(
            decode_escapes(br"\u00").unwrap_err(),
            IngestError::TruncatedEscape(0)
        ));
    }

    #[test]
    fn invalid_hex_escape_is_an_error() {
        assert!(matches!(
            decode_escapes(br"\uZZZZ").unwrap_err(),
            IngestError::InvalidEscape(0)
        ));
    }

    // ---- parse_bars --------------------------------------------------------

    #[test]
    fn parse_bars_end_to_end() {
        let bars = parse_bars(&feed_bytes()).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 1.5);
        assert_eq!(bars[1].volume, 200);
    }

    #[test]
    fn parse_bars_rejects_garbage() {
        assert!(matches!(
            parse_bars(b"this is not a feed"),
            Err(IngestError::Parse(_))
        ));
    }

    #[test]
    fn parse_bars_rejects_wrong_shape() {
        let raw = br#"{"rows":[1,2,3]}"#;
        assert!(parse_bars(raw).is_err());
    }
}
