use richinput_core::caret::Generation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AppEvent {
    /// Draw the next frame.
    Redraw,

    /// Move the caret scheduled by a committed mention. Always queued after
    /// the [`AppEvent::Redraw`] that shows the committed text.
    PlaceCaret(Generation),

    /// Request to exit the application gracefully.
    ExitRequest,
}
