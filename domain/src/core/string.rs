//! String utilities for the domain layer.

/// Truncate to at most `max_len` bytes, appending an ellipsis (UTF-8 safe).
///
/// Used for log previews and failure details so that a provider echoing a
/// large body never bloats events or the result object.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len.saturating_sub(3).min(s.len());
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

/// Reduce a caller-supplied identifier to `[A-Za-z0-9_-]` for use in file names.
///
/// Returns `None` when nothing usable remains.
pub fn file_component(s: &str) -> Option<String> {
    let cleaned: String = s
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('-').to_string();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_ascii() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        // 'é' is two bytes; a cut in the middle backs off to the boundary
        assert_eq!(truncate("ééééé", 8), "éé...");
    }

    #[test]
    fn test_file_component() {
        assert_eq!(file_component("team-a"), Some("team-a".to_string()));
        assert_eq!(file_component("a/b c"), Some("a-b-c".to_string()));
        assert_eq!(file_component("../"), None);
        assert_eq!(file_component("   "), None);
    }
}
