//! Immutable views of the composer state, fanned out to subscribers.
//!
//! The composer publishes a fresh [`Snapshot`] after every state change.
//! Renderers hold a receiver and redraw from the newest snapshot they find;
//! they never call back into the composer from the subscription itself.

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::sync::mpsc::Sender;
use std::sync::mpsc::channel;

use serde::Serialize;

use crate::geometry::CaretCoords;
use crate::mention::MentionToken;
use crate::span::Span;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub text: String,
    pub cursor: usize,
    pub spans: Vec<Span>,
    pub mention: Option<MentionToken>,
    pub suggestions: Vec<String>,
    pub selected_index: usize,
    /// `None` while idle, or while active but not locatable on screen.
    pub popup_anchor: Option<CaretCoords>,
    pub char_count: usize,
    pub max_length: usize,
}

impl Snapshot {
    /// The popup is drawn only when there is something to show and a place
    /// to show it.
    pub fn popup_visible(&self) -> bool {
        !self.suggestions.is_empty() && self.popup_anchor.is_some()
    }

    /// Text for the length counter, e.g. `13/200`.
    pub fn counter_label(&self) -> String {
        format!("{}/{}", self.char_count, self.max_length)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Debug, Default)]
pub struct SnapshotBus {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Sender<Arc<Snapshot>>)>,
}

impl SnapshotBus {
    pub fn subscribe(&mut self) -> (SubscriptionId, Receiver<Arc<Snapshot>>) {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        let (tx, rx) = channel();
        self.subscribers.push((id, tx));
        (id, rx)
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Deliver `snapshot` to every subscriber. Subscribers whose receiver was
    /// dropped are removed.
    pub fn publish(&mut self, snapshot: Arc<Snapshot>) {
        self.subscribers.retain(|(id, tx)| match tx.send(Arc::clone(&snapshot)) {
            Ok(()) => true,
            Err(_) => {
                tracing::debug!("dropping snapshot subscriber {id:?}: receiver gone");
                false
            }
        });
    }
}
