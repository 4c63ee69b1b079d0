/// Utility functions for payload formatting and logging
use time::macros::format_description;
use time::OffsetDateTime;

/// Format a timestamp for human-readable logging
///
/// Converts an OffsetDateTime to DD.MM.YYYY - HH:MM:SS format.
/// Falls back to default string representation if formatting fails.
pub fn format_datetime(dt: &OffsetDateTime) -> String {
    let format = format_description!("[day].[month].[year] - [hour]:[minute]:[second]");
    dt.format(&format).unwrap_or_else(|_| dt.to_string())
}

/// Render bytes as space separated upper-case hex
pub fn hex_dump(data: &[u8]) -> String {
    data.iter()
        .map(|byte| format!("{:02X}", byte))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a contiguous hex string such as `01FF07`
///
/// Returns None on odd length or non-hex characters.
pub fn parse_hex(text: &str) -> Option<Vec<u8>> {
    if text.len() % 2 != 0 || !text.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return None;
    }

    (0..text.len())
        .step_by(2)
        .map(|start| u8::from_str_radix(&text[start..start + 2], 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn formats_datetime_for_logs() {
        let dt = datetime!(2024-02-29 07:05:09 UTC);
        assert_eq!(format_datetime(&dt), "29.02.2024 - 07:05:09");
    }

    #[test]
    fn hex_round_trip() {
        assert_eq!(parse_hex("01ff10"), Some(vec![0x01, 0xFF, 0x10]));
        assert_eq!(hex_dump(&[0x01, 0xFF, 0x10]), "01 FF 10");
    }

    #[test]
    fn rejects_malformed_hex() {
        assert_eq!(parse_hex("abc"), None);
        assert_eq!(parse_hex("zz"), None);
        assert_eq!(parse_hex("+1"), None);
    }
}
