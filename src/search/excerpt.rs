//! Value excerpts for search hits

/// Characters kept in front of the first match
pub const LEAD: usize = 25;
/// Longest excerpt, not counting the `…` markers
pub const WIDTH: usize = 80;

const ELLIPSIS: char = '…';

/// Lowercase each char to a single char, so char positions line up with the input
#[must_use]
pub fn fold(text: &str) -> String {
    text.chars()
        .map(|c| c.to_lowercase().next().unwrap_or(c))
        .collect()
}

/// Char position of the first case-insensitive occurrence of `folded_query`
///
/// `folded_query` must already be passed through [`fold`].
#[must_use]
pub fn find(text: &str, folded_query: &str) -> Option<usize> {
    let folded = fold(text);
    let byte = folded.find(folded_query)?;
    Some(folded[..byte].chars().count())
}

/// Cut a window around the first match of `folded_query` in `text`
///
/// The window starts [`LEAD`] chars left of the match, or at the start of the
/// text, and is at most [`WIDTH`] chars long. A side that was cut off gets a
/// `…` marker; line breaks become spaces.
#[must_use]
pub fn excerpt(text: &str, folded_query: &str) -> Option<String> {
    let at = find(text, folded_query)?;
    let chars: Vec<char> = text.chars().collect();
    let start = at.saturating_sub(LEAD);
    let end = (start + WIDTH).min(chars.len());

    let mut out = String::with_capacity(WIDTH + 2);
    if start > 0 {
        out.push(ELLIPSIS);
    }
    out.extend(chars[start..end].iter().map(|c| match c {
        '\n' | '\r' => ' ',
        other => *other,
    }));
    if end < chars.len() {
        out.push(ELLIPSIS);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_value_is_whole() {
        assert_eq!(excerpt("host=db.internal", "db").as_deref(), Some("host=db.internal"));
    }

    #[test]
    fn test_window_starts_before_match() {
        let value = format!("{}needle{}", "a".repeat(40), "b".repeat(100));
        let out = excerpt(&value, "needle").unwrap();

        assert!(out.starts_with('…'));
        assert!(out.ends_with('…'));
        let body: String = out.trim_matches('…').to_string();
        assert_eq!(body.chars().count(), WIDTH);
        assert_eq!(body.find("needle"), Some(LEAD));
    }

    #[test]
    fn test_match_near_start_keeps_left_edge() {
        let value = format!("xx needle {}", "z".repeat(200));
        let out = excerpt(&value, "needle").unwrap();
        assert!(out.starts_with("xx needle"));
        assert!(out.ends_with('…'));
    }

    #[test]
    fn test_match_near_end_has_only_left_marker() {
        let value = format!("{}needle", "q".repeat(60));
        let out = excerpt(&value, "needle").unwrap();
        assert!(out.starts_with('…'));
        assert!(out.ends_with("needle"));
    }

    #[test]
    fn test_line_breaks_flattened() {
        let out = excerpt("line one\nline two\r\nthree", "two").unwrap();
        assert_eq!(out, "line one line two  three");
    }

    #[test]
    fn test_case_insensitive_and_multibyte() {
        let value = "ÄÖÜ Prefix NEEDLE";
        assert_eq!(find(value, &fold("needle")), Some(11));
        assert!(excerpt(value, &fold("Needle")).is_some());
        assert!(excerpt(value, "absent").is_none());
    }
}
