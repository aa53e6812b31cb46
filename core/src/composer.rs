//! The input widget's state: text, caret, classified spans and the mention
//! popup.
//!
//! `Composer` is what a host drives. It turns input events
//! (`on_text_change`, `on_key_down`, suggestion clicks, clicks outside) into
//! state transitions and publishes a [`Snapshot`] after each one. It owns no
//! rendering: the popup position comes from a [`CaretGeometry`], candidates
//! from a [`Directory`].

use std::sync::Arc;
use std::sync::mpsc::Receiver;

use crate::caret::CaretPlacement;
use crate::caret::CaretScheduler;
use crate::caret::Generation;
use crate::directory::Directory;
use crate::geometry::CaretCoords;
use crate::geometry::CaretGeometry;
use crate::mention::MentionState;
use crate::mention::MentionTracker;
use crate::mention::SuggestionList;
use crate::mention::delete_mention_backward;
use crate::snapshot::Snapshot;
use crate::snapshot::SnapshotBus;
use crate::snapshot::SubscriptionId;
use crate::span::Span;
use crate::span::classify;
use crate::util::char_len;
use crate::util::clamp_to_char_boundary;

/// Keys the composer cares about. Everything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentionKey {
    ArrowUp,
    ArrowDown,
    Enter,
    Escape,
    Space,
    Backspace,
    Other,
}

/// What happened to a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum KeyOutcome {
    /// Not consumed; the host applies its default editing behavior.
    Unhandled,
    Handled,
    /// A suggestion was committed. The host should re-render the new text
    /// and then fire the placement.
    Committed(CaretPlacement),
}

impl KeyOutcome {
    pub fn is_handled(&self) -> bool {
        !matches!(self, KeyOutcome::Unhandled)
    }
}

pub struct Composer<D, G> {
    text: String,
    /// Byte offset, always on a character boundary.
    cursor: usize,
    max_length: usize,
    spans: Vec<Span>,
    tracker: MentionTracker<D>,
    geometry: G,
    popup_anchor: Option<CaretCoords>,
    caret: CaretScheduler,
    bus: SnapshotBus,
}

impl<D: Directory, G: CaretGeometry> Composer<D, G> {
    pub fn new(directory: D, geometry: G, max_length: usize) -> Self {
        Self {
            text: String::new(),
            cursor: 0,
            max_length,
            spans: Vec::new(),
            tracker: MentionTracker::new(directory),
            geometry,
            popup_anchor: None,
            caret: CaretScheduler::default(),
            bus: SnapshotBus::default(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn char_count(&self) -> usize {
        char_len(&self.text)
    }

    pub fn mention_state(&self) -> &MentionState {
        self.tracker.state()
    }

    pub fn suggestions(&self) -> &SuggestionList {
        self.tracker.suggestions()
    }

    pub fn popup_anchor(&self) -> Option<CaretCoords> {
        self.popup_anchor
    }

    pub fn popup_visible(&self) -> bool {
        !self.tracker.suggestions().is_empty() && self.popup_anchor.is_some()
    }

    pub fn directory(&self) -> &D {
        self.tracker.directory()
    }

    pub fn geometry(&self) -> &G {
        &self.geometry
    }

    /// Mutable access for viewport updates (scroll, resize). Follow up with
    /// [`Composer::refresh_geometry`] so the popup anchor is recomputed.
    pub fn geometry_mut(&mut self) -> &mut G {
        &mut self.geometry
    }

    pub fn subscribe(&mut self) -> (SubscriptionId, Receiver<Arc<Snapshot>>) {
        self.bus.subscribe()
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    pub fn snapshot(&self) -> Snapshot {
        let suggestions = self.tracker.suggestions();
        Snapshot {
            text: self.text.clone(),
            cursor: self.cursor,
            spans: self.spans.clone(),
            mention: self.tracker.token().cloned(),
            suggestions: suggestions.items().to_vec(),
            selected_index: suggestions.selected_index(),
            popup_anchor: self.popup_anchor,
            char_count: self.char_count(),
            max_length: self.max_length,
        }
    }

    /// Accept new text from the input surface.
    ///
    /// Returns `false`, changing nothing, when `new_text` is longer than the
    /// configured maximum.
    pub fn on_text_change(&mut self, new_text: &str, cursor: usize) -> bool {
        let len = char_len(new_text);
        if len > self.max_length {
            tracing::debug!(
                len,
                max_length = self.max_length,
                "rejected edit over length limit"
            );
            return false;
        }
        self.apply_text(new_text.to_string(), cursor);
        true
    }

    /// The caret moved without the text changing (arrow keys, clicks).
    pub fn on_cursor_move(&mut self, cursor: usize) {
        self.cursor = clamp_to_char_boundary(&self.text, cursor);
        self.tracker.update(&self.text, self.cursor);
        self.refresh_anchor();
        self.publish();
    }

    /// Route a key press. See [`KeyOutcome`] for what the host should do
    /// next.
    ///
    /// Only Backspace reads `cursor`, since whole-token deletion works from
    /// the surface's caret. Every other key acts on the open token, which was
    /// located from the cursor last passed to [`Self::on_text_change`] or
    /// [`Self::on_cursor_move`]; call one of those first when the caret moves.
    pub fn on_key_down(&mut self, key: MentionKey, cursor: usize) -> KeyOutcome {
        if key == MentionKey::Backspace {
            return if self.delete_backward(cursor) {
                KeyOutcome::Handled
            } else {
                KeyOutcome::Unhandled
            };
        }

        if self.tracker.suggestions().is_empty() {
            return KeyOutcome::Unhandled;
        }

        match key {
            MentionKey::ArrowDown => {
                self.move_selection(1);
                KeyOutcome::Handled
            }
            MentionKey::ArrowUp => {
                self.move_selection(-1);
                KeyOutcome::Handled
            }
            MentionKey::Enter => self.commit_outcome(),
            MentionKey::Space if self.tracker.state().is_active() => self.commit_outcome(),
            MentionKey::Escape => {
                self.cancel();
                KeyOutcome::Handled
            }
            _ => KeyOutcome::Unhandled,
        }
    }

    fn commit_outcome(&mut self) -> KeyOutcome {
        match self.commit(None) {
            Some(placement) => KeyOutcome::Committed(placement),
            // Swallow the key even if the commit was rejected so Enter/Space
            // do not leak into the text while the popup is open.
            None => KeyOutcome::Handled,
        }
    }

    pub fn move_selection(&mut self, delta: isize) {
        if self.tracker.suggestions().is_empty() {
            return;
        }
        self.tracker.move_selection(delta);
        self.publish();
    }

    /// Replace the open token with `@name ` (the highlighted suggestion when
    /// `name` is `None`).
    ///
    /// Returns the caret placement the host must fire once it has rendered
    /// the new text, or `None` if nothing was committed: idle, no suggestion
    /// to pick, or the result would exceed the length limit.
    pub fn commit(&mut self, name: Option<&str>) -> Option<CaretPlacement> {
        let edit = self.tracker.plan_commit(name, &self.text, self.cursor)?;
        let len = char_len(&edit.text);
        if len > self.max_length {
            tracing::debug!(
                len,
                max_length = self.max_length,
                name = %edit.name,
                "rejected mention commit over length limit"
            );
            return None;
        }

        tracing::debug!(name = %edit.name, cursor = edit.cursor, "committed mention");
        self.tracker.reset();
        self.text = edit.text;
        self.cursor = edit.cursor;
        self.spans = classify(&self.text);
        self.popup_anchor = None;
        let placement = self.caret.schedule(edit.cursor);
        self.publish();
        Some(placement)
    }

    pub fn on_suggestion_click(&mut self, name: &str) -> Option<CaretPlacement> {
        self.commit(Some(name))
    }

    /// Close the popup, leaving the text alone.
    pub fn cancel(&mut self) {
        if !self.tracker.state().is_active() {
            return;
        }
        self.tracker.cancel();
        self.popup_anchor = None;
        self.publish();
    }

    pub fn on_outside_interaction(&mut self) {
        self.cancel();
    }

    /// Whole-token backspace. Returns `false` when the caller should do an
    /// ordinary one-character delete instead.
    pub fn delete_backward(&mut self, cursor: usize) -> bool {
        let Some(edit) = delete_mention_backward(&self.text, cursor) else {
            return false;
        };
        tracing::debug!(cursor = edit.cursor, "deleted mention token");
        self.apply_text(edit.text, edit.cursor);
        true
    }

    /// Run a caret placement scheduled by a commit. Returns the offset the
    /// surface should move its caret to, or `None` for a stale generation.
    pub fn fire_caret(&mut self, generation: Generation) -> Option<usize> {
        let offset = self.caret.fire(generation)?;
        Some(clamp_to_char_boundary(&self.text, offset))
    }

    pub fn pending_caret(&self) -> Option<CaretPlacement> {
        self.caret.pending()
    }

    /// Re-query the geometry collaborator, e.g. after the view scrolled.
    pub fn refresh_geometry(&mut self) {
        let before = self.popup_anchor;
        self.refresh_anchor();
        if self.popup_anchor != before {
            self.publish();
        }
    }

    fn apply_text(&mut self, text: String, cursor: usize) {
        self.text = text;
        self.cursor = clamp_to_char_boundary(&self.text, cursor);
        self.spans = classify(&self.text);
        self.tracker.update(&self.text, self.cursor);
        self.refresh_anchor();
        self.publish();
    }

    fn refresh_anchor(&mut self) {
        self.popup_anchor = if self.tracker.state().is_active() {
            self.geometry.caret_coords(&self.text, self.cursor)
        } else {
            None
        };
    }

    fn publish(&mut self) {
        if self.bus.subscriber_count() == 0 {
            return;
        }
        let snapshot = Arc::new(self.snapshot());
        self.bus.publish(snapshot);
    }
}
