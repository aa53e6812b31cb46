//! Tracking of the `@mention` token the user is currently typing.
//!
//! [`MentionTracker`] is a two-state machine (`Idle` / `Active`) re-evaluated
//! on every text change. While active it owns the filtered suggestion list
//! and its selection. The tracker never edits text itself: committing a
//! suggestion produces a [`CommitEdit`] that the caller applies (or rejects,
//! e.g. because of the length limit).

use std::sync::LazyLock;

use regex_lite::Regex;
use serde::Serialize;

use crate::directory::CaseMatching;
use crate::directory::Directory;
use crate::util::clamp_to_char_boundary;
use crate::util::line_start;

/// A completed mention (plus any whitespace after it) ending at the cursor.
#[allow(clippy::expect_used)]
static TRAILING_MENTION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@\w+\s*$").expect("trailing mention pattern should compile"));

/// The open, uncommitted `@…` token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MentionToken {
    /// Byte offset of the `@`.
    pub start_offset: usize,
    /// Text typed after the `@`, up to the cursor. May be empty.
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MentionState {
    #[default]
    Idle,
    Active(MentionToken),
}

impl MentionState {
    pub fn token(&self) -> Option<&MentionToken> {
        match self {
            MentionState::Idle => None,
            MentionState::Active(token) => Some(token),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, MentionState::Active(_))
    }
}

/// Find the mention token the cursor is currently extending, if any.
///
/// Only the caret's line is inspected, and only the text before the caret:
/// the last `@` there opens a token unless whitespace was typed after it.
pub fn detect_mention(text: &str, cursor: usize) -> Option<MentionToken> {
    let cursor = clamp_to_char_boundary(text, cursor);
    let start = line_start(text, cursor);
    let line = &text[start..cursor];

    let at = line.rfind('@')?;
    let tail = &line[at + 1..];
    if tail.chars().any(is_space_char) {
        return None;
    }

    Some(MentionToken {
        start_offset: start + at,
        query: tail.to_string(),
    })
}

/// Result of a whole-token backspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteEdit {
    pub text: String,
    pub cursor: usize,
}

/// Remove a complete `@name` (and the whitespace that follows it) ending
/// exactly at `cursor`.
///
/// Returns `None` when the text before the cursor does not end with such a
/// token, or when the cursor sits inside a name (`@fr|ench`); the caller then
/// performs an ordinary one-character backspace.
pub fn delete_mention_backward(text: &str, cursor: usize) -> Option<DeleteEdit> {
    let cursor = clamp_to_char_boundary(text, cursor);
    let before = &text[..cursor];
    let m = TRAILING_MENTION_REGEX.find(before)?;

    let ends_in_name = m.as_str().ends_with(is_word_char);
    if ends_in_name && text[cursor..].starts_with(is_word_char) {
        return None;
    }

    let mut new_text = String::with_capacity(text.len() - m.len());
    new_text.push_str(&text[..m.start()]);
    new_text.push_str(&text[cursor..]);
    Some(DeleteEdit {
        text: new_text,
        cursor: m.start(),
    })
}

/// Matches `\s` in the mention patterns. Other Unicode spaces stay part of
/// the token.
fn is_space_char(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0B' | '\x0C' | '\r')
}

/// Matches `\w` in the mention patterns.
fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Filtered candidates plus the highlighted row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionList {
    items: Vec<String>,
    selected_idx: usize,
}

impl SuggestionList {
    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn selected_index(&self) -> usize {
        self.selected_idx
    }

    pub fn selected(&self) -> Option<&str> {
        self.items.get(self.selected_idx).map(String::as_str)
    }

    /// Move the highlight by `delta` rows, stopping at either end.
    pub fn move_selection(&mut self, delta: isize) {
        let Some(last) = self.items.len().checked_sub(1) else {
            return;
        };
        self.selected_idx = self.selected_idx.saturating_add_signed(delta).min(last);
    }

    fn replace(&mut self, items: Vec<String>, reset_selection: bool) {
        self.items = items;
        self.selected_idx = if reset_selection {
            0
        } else {
            self.selected_idx.min(self.items.len().saturating_sub(1))
        };
    }

    fn clear(&mut self) {
        self.items.clear();
        self.selected_idx = 0;
    }
}

/// Text replacement produced by committing a suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitEdit {
    pub name: String,
    pub text: String,
    pub cursor: usize,
}

pub struct MentionTracker<D> {
    directory: D,
    case: CaseMatching,
    state: MentionState,
    suggestions: SuggestionList,
}

impl<D: Directory> MentionTracker<D> {
    pub fn new(directory: D) -> Self {
        Self {
            directory,
            case: CaseMatching::Insensitive,
            state: MentionState::Idle,
            suggestions: SuggestionList::default(),
        }
    }

    pub fn with_case_matching(mut self, case: CaseMatching) -> Self {
        self.case = case;
        self
    }

    pub fn state(&self) -> &MentionState {
        &self.state
    }

    pub fn token(&self) -> Option<&MentionToken> {
        self.state.token()
    }

    pub fn suggestions(&self) -> &SuggestionList {
        &self.suggestions
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// Re-evaluate the state machine for the current text and caret.
    ///
    /// The selection is reset to the first row whenever the token changes;
    /// re-running with the same text and caret keeps it.
    pub fn update(&mut self, text: &str, cursor: usize) {
        let Some(token) = detect_mention(text, cursor) else {
            if self.state.is_active() {
                tracing::debug!("mention token closed");
            }
            self.reset();
            return;
        };

        let token_changed = self.state.token() != Some(&token);
        let items = self.directory.search(&token.query, self.case);
        if token_changed {
            tracing::debug!(
                start = token.start_offset,
                query = %token.query,
                matches = items.len(),
                "mention token updated"
            );
        }
        self.suggestions.replace(items, token_changed);
        self.state = MentionState::Active(token);
    }

    pub fn move_selection(&mut self, delta: isize) {
        self.suggestions.move_selection(delta);
    }

    /// Close the token without touching the text.
    pub fn cancel(&mut self) {
        if self.state.is_active() {
            tracing::debug!("mention token cancelled");
        }
        self.reset();
    }

    /// Compute the edit that replaces the open token with `@name `.
    ///
    /// With no `name` the highlighted suggestion is used. Returns `None` when
    /// idle or when there is nothing to commit. The tracker state is left
    /// untouched; call [`MentionTracker::reset`] once the edit is applied.
    pub fn plan_commit(&self, name: Option<&str>, text: &str, cursor: usize) -> Option<CommitEdit> {
        let token = self.state.token()?;
        let name = match name {
            Some(name) => name,
            None => self.suggestions.selected()?,
        };

        let cursor = clamp_to_char_boundary(text, cursor);
        let start = token.start_offset.min(cursor);
        let mention = format!("@{name} ");

        let mut new_text = String::with_capacity(text.len() + mention.len());
        new_text.push_str(&text[..start]);
        new_text.push_str(&mention);
        new_text.push_str(&text[cursor..]);

        Some(CommitEdit {
            name: name.to_string(),
            text: new_text,
            cursor: start + mention.len(),
        })
    }

    /// Back to `Idle` with no suggestions.
    pub fn reset(&mut self) {
        self.state = MentionState::Idle;
        self.suggestions.clear();
    }
}
