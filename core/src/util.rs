/// Largest character boundary in `text` that is `<= offset`.
///
/// Cursor offsets arrive from the input surface and may point past the end of
/// the text or into the middle of a multi-byte character.
pub fn clamp_to_char_boundary(text: &str, offset: usize) -> usize {
    if offset >= text.len() {
        return text.len();
    }
    let mut idx = offset;
    while idx > 0 && !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// Length of `text` as shown to the user (and checked against the limit).
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte offset where the line containing `cursor` starts.
pub fn line_start(text: &str, cursor: usize) -> usize {
    let cursor = clamp_to_char_boundary(text, cursor);
    text[..cursor].rfind('\n').map(|idx| idx + 1).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_into_multibyte_characters() {
        let text = "a诶b";
        assert_eq!(clamp_to_char_boundary(text, 0), 0);
        assert_eq!(clamp_to_char_boundary(text, 1), 1);
        assert_eq!(clamp_to_char_boundary(text, 2), 1);
        assert_eq!(clamp_to_char_boundary(text, 3), 1);
        assert_eq!(clamp_to_char_boundary(text, 4), 4);
        assert_eq!(clamp_to_char_boundary(text, 99), text.len());
    }

    #[test]
    fn char_len_counts_scalars() {
        assert_eq!(char_len(""), 0);
        assert_eq!(char_len("héllo"), 5);
        assert_eq!(char_len("👍👍"), 2);
    }

    #[test]
    fn line_start_finds_previous_newline() {
        assert_eq!(line_start("abc", 2), 0);
        assert_eq!(line_start("ab\ncd", 5), 3);
        assert_eq!(line_start("ab\ncd", 3), 3);
        // A newline exactly at the cursor belongs to the previous line.
        assert_eq!(line_start("ab\ncd", 2), 0);
        assert_eq!(line_start("\n\n", 2), 2);
    }
}
