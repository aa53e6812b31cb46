//! Default editing for the input: whatever the mention logic leaves
//! unhandled ends up here.
//!
//! Edits never touch the composer directly. [`SurfaceEdit::apply`] proposes
//! the next text and caret, and the caller hands the proposal to the
//! composer, which may reject it.

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyModifiers;
use richinput_core::util::clamp_to_char_boundary;
use richinput_core::util::line_start;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SurfaceEdit {
    Insert(String),
    Newline,
    DeleteBackward,
    DeleteForward,
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    MoveHome,
    MoveEnd,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SurfaceChange {
    Text { text: String, cursor: usize },
    Cursor(usize),
    Unchanged,
}

impl SurfaceEdit {
    pub(crate) fn from_key(key: &KeyEvent) -> Option<Self> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        let edit = match key.code {
            KeyCode::Char('j') if ctrl => Self::Newline,
            KeyCode::Char(c) if !ctrl && !alt => Self::Insert(c.to_string()),
            KeyCode::Enter => Self::Newline,
            KeyCode::Backspace => Self::DeleteBackward,
            KeyCode::Delete => Self::DeleteForward,
            KeyCode::Left => Self::MoveLeft,
            KeyCode::Right => Self::MoveRight,
            KeyCode::Up => Self::MoveUp,
            KeyCode::Down => Self::MoveDown,
            KeyCode::Home => Self::MoveHome,
            KeyCode::End => Self::MoveEnd,
            _ => return None,
        };
        Some(edit)
    }

    pub(crate) fn apply(&self, text: &str, cursor: usize) -> SurfaceChange {
        let cursor = clamp_to_char_boundary(text, cursor);
        match self {
            Self::Insert(s) if s.is_empty() => SurfaceChange::Unchanged,
            Self::Insert(s) => insert(text, cursor, s),
            Self::Newline => insert(text, cursor, "\n"),
            Self::DeleteBackward => match prev_boundary(text, cursor) {
                Some(start) => SurfaceChange::Text {
                    text: format!("{}{}", &text[..start], &text[cursor..]),
                    cursor: start,
                },
                None => SurfaceChange::Unchanged,
            },
            Self::DeleteForward => match next_boundary(text, cursor) {
                Some(end) => SurfaceChange::Text {
                    text: format!("{}{}", &text[..cursor], &text[end..]),
                    cursor,
                },
                None => SurfaceChange::Unchanged,
            },
            Self::MoveLeft => prev_boundary(text, cursor)
                .map_or(SurfaceChange::Unchanged, SurfaceChange::Cursor),
            Self::MoveRight => next_boundary(text, cursor)
                .map_or(SurfaceChange::Unchanged, SurfaceChange::Cursor),
            Self::MoveHome => move_to(cursor, line_start(text, cursor)),
            Self::MoveEnd => move_to(cursor, line_end(text, cursor)),
            Self::MoveUp => vertical(text, cursor, false),
            Self::MoveDown => vertical(text, cursor, true),
        }
    }
}

/// Terminals deliver pasted newlines as `\r`; the input stores `\n`.
pub(crate) fn normalize_paste(pasted: &str) -> String {
    pasted.replace("\r\n", "\n").replace('\r', "\n")
}

/// Byte offset of the end of the line containing `cursor` (excluding `\n`).
pub(crate) fn line_end(text: &str, cursor: usize) -> usize {
    text[cursor..].find('\n').map_or(text.len(), |i| cursor + i)
}

/// Byte offset for a `(row, column)` cell position within `text`, clamped to
/// the nearest valid position.
pub(crate) fn offset_at(text: &str, row: usize, column: usize) -> usize {
    let mut start = 0;
    for _ in 0..row {
        match text[start..].find('\n') {
            Some(i) => start += i + 1,
            None => return text.len(),
        }
    }
    let end = line_end(text, start);
    start + offset_at_column(&text[start..end], column)
}

fn offset_at_column(line: &str, column: usize) -> usize {
    let mut width = 0;
    for (i, grapheme) in line.grapheme_indices(true) {
        let w = grapheme.width();
        if width + w > column {
            return i;
        }
        width += w;
    }
    line.len()
}

fn insert(text: &str, cursor: usize, s: &str) -> SurfaceChange {
    let mut next = String::with_capacity(text.len() + s.len());
    next.push_str(&text[..cursor]);
    next.push_str(s);
    next.push_str(&text[cursor..]);
    SurfaceChange::Text {
        text: next,
        cursor: cursor + s.len(),
    }
}

fn prev_boundary(text: &str, cursor: usize) -> Option<usize> {
    text[..cursor]
        .grapheme_indices(true)
        .next_back()
        .map(|(i, _)| i)
}

fn next_boundary(text: &str, cursor: usize) -> Option<usize> {
    text[cursor..]
        .graphemes(true)
        .next()
        .map(|g| cursor + g.len())
}

fn move_to(cursor: usize, target: usize) -> SurfaceChange {
    if target == cursor {
        SurfaceChange::Unchanged
    } else {
        SurfaceChange::Cursor(target)
    }
}

fn vertical(text: &str, cursor: usize, down: bool) -> SurfaceChange {
    let start = line_start(text, cursor);
    let column = text[start..cursor].width();
    let target_start = if down {
        let end = line_end(text, cursor);
        if end == text.len() {
            return SurfaceChange::Unchanged;
        }
        end + 1
    } else {
        if start == 0 {
            return SurfaceChange::Unchanged;
        }
        line_start(text, start - 1)
    };
    let target_end = line_end(text, target_start);
    SurfaceChange::Cursor(target_start + offset_at_column(&text[target_start..target_end], column))
}
