/// Console rule used around section headers.
pub fn rule() -> String {
    "=".repeat(60)
}

/// First `max_chars` characters of `text` with `...` appended when cut.
pub fn truncate_for_display(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate_for_display("short", 60), "short");
    }

    #[test]
    fn test_truncate_long_text() {
        let text = "a".repeat(61);
        assert_eq!(truncate_for_display(&text, 60), format!("{}...", "a".repeat(60)));
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        assert_eq!(truncate_for_display("héllo wörld", 5), "héllo...");
    }
}
