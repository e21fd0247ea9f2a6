use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use std::sync::LazyLock;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Sanitize a content body before staging: strip HTML tags, straighten
/// curly quotes, drop non-ASCII characters, collapse whitespace.
pub fn sanitize_body(raw: &str) -> String {
    let stripped = TAG_RE.replace_all(raw, " ");

    let mut ascii = String::with_capacity(stripped.len());
    for c in stripped.chars() {
        match c {
            '\u{2018}' | '\u{2019}' => ascii.push('\''),
            '\u{201C}' | '\u{201D}' => ascii.push('"'),
            c if c.is_ascii() => ascii.push(c),
            _ => {}
        }
    }

    WS_RE.replace_all(&ascii, " ").trim().to_string()
}

/// Normalize an upstream timestamp to UTC. Accepts RFC 3339, a bare
/// `YYYY-MM-DD HH:MM:SS` (read as UTC), or epoch seconds.
pub fn normalize_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }

    if let Ok(secs) = raw.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_straightens_quotes_drops_non_ascii() {
        let cleaned = sanitize_body("<p>Hello \u{2018}World\u{2019}!</p> \u{2014} caf\u{e9}");
        assert_eq!(cleaned, "Hello 'World'! caf");
    }

    #[test]
    fn straightens_double_quotes() {
        let cleaned = sanitize_body("she said \u{201C}hi\u{201D}");
        assert_eq!(cleaned, "she said \"hi\"");
    }

    #[test]
    fn collapses_whitespace_from_removed_tags() {
        let cleaned = sanitize_body("<div>one</div><div>two</div>");
        assert_eq!(cleaned, "one two");
    }

    #[test]
    fn plain_ascii_passes_through() {
        assert_eq!(sanitize_body("nothing to do here"), "nothing to do here");
    }

    #[test]
    fn empty_after_sanitizing_is_empty() {
        assert_eq!(sanitize_body("<br/>\u{4F60}\u{597D}"), "");
    }

    #[test]
    fn normalizes_rfc3339() {
        let dt = normalize_timestamp("2026-03-01T09:30:00Z").unwrap();
        assert_eq!(dt.to_rfc3339(), "2026-03-01T09:30:00+00:00");
    }

    #[test]
    fn normalizes_offset_to_utc() {
        let dt = normalize_timestamp("2026-03-01T09:30:00-05:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2026-03-01T14:30:00+00:00");
    }

    #[test]
    fn normalizes_bare_datetime_and_epoch() {
        assert!(normalize_timestamp("2026-03-01 09:30:00").is_some());
        assert!(normalize_timestamp("1767225600").is_some());
    }

    #[test]
    fn garbage_timestamp_is_none() {
        assert!(normalize_timestamp("yesterday-ish").is_none());
        assert!(normalize_timestamp("").is_none());
    }
}
