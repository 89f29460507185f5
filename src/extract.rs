//! Payload extraction from raw provider output.

/// Opening delimiter the instruction template asks providers to emit.
pub const OPEN_DELIMITER: &str = "<code>";
/// Closing delimiter matching [`OPEN_DELIMITER`].
pub const CLOSE_DELIMITER: &str = "</code>";

/// Return the trimmed text between the first `<code>` and the first `</code>`
/// that follows it. Without a well-formed pair the raw text is returned
/// unchanged, so this never fails.
pub fn extract(raw: &str) -> &str {
    let Some(start) = raw.find(OPEN_DELIMITER) else {
        return raw;
    };
    let body = &raw[start + OPEN_DELIMITER.len()..];
    match body.find(CLOSE_DELIMITER) {
        Some(end) => body[..end].trim(),
        None => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_trimmed_payload_and_drops_surroundings() {
        let raw = "preamble <code>  <div>hi</div>  </code> trailer";
        assert_eq!(extract(raw), "<div>hi</div>");
    }

    #[test]
    fn no_delimiters_is_identity() {
        assert_eq!(extract("just text"), "just text");
        assert_eq!(extract(""), "");
    }

    #[test]
    fn unclosed_delimiter_falls_back_to_raw() {
        let raw = "<code><div>never closed";
        assert_eq!(extract(raw), raw);
    }

    #[test]
    fn closing_before_opening_is_not_a_pair() {
        let raw = "</code> stray <code>";
        assert_eq!(extract(raw), raw);
    }

    #[test]
    fn first_pair_wins() {
        let raw = "<code>first</code> and <code>second</code>";
        assert_eq!(extract(raw), "first");
    }

    #[test]
    fn multiline_payload_is_kept_whole() {
        let raw = "Here you go:\n<code>\n<html>\n  <body></body>\n</html>\n</code>\nEnjoy";
        assert_eq!(extract(raw), "<html>\n  <body></body>\n</html>");
    }

    #[test]
    fn extraction_is_idempotent() {
        let wrapped = "intro <code><p>payload</p></code> outro";
        let once = extract(wrapped);
        assert_eq!(once, "<p>payload</p>");
        assert_eq!(extract(once), once);
    }
}
