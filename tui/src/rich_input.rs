//! The rich text input: composer state plus its terminal rendering.
//!
//! All drawing happens from the latest [`Snapshot`] the composer published;
//! `prepare_frame` drains the subscription and lays out the viewport before
//! each draw.

use std::sync::Arc;
use std::sync::mpsc::Receiver;

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyModifiers;
use ratatui::buffer::Buffer;
use ratatui::layout::Alignment;
use ratatui::layout::Position;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::style::Style;
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Block;
use ratatui::widgets::BorderType;
use ratatui::widgets::Borders;
use ratatui::widgets::Clear;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Widget;
use ratatui::widgets::WidgetRef;
use richinput_core::Composer;
use richinput_core::Config;
use richinput_core::KeyOutcome;
use richinput_core::MentionKey;
use richinput_core::MonospaceGeometry;
use richinput_core::Snapshot;
use richinput_core::SpanKind;
use richinput_core::StaticDirectory;
use richinput_core::caret::Generation;
use richinput_core::interaction::Region;
use richinput_core::util::clamp_to_char_boundary;
use richinput_core::util::line_start;
use unicode_width::UnicodeWidthStr;

use crate::mention_popup;
use crate::mention_popup::MentionPopup;
use crate::text_surface::SurfaceChange;
use crate::text_surface::SurfaceEdit;
use crate::text_surface::normalize_paste;
use crate::text_surface::offset_at;

/// What an input event did to the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InputResult {
    Unchanged,
    Changed,
    /// A mention was committed. Draw the new text first, then place the
    /// caret for this generation.
    Committed(Generation),
}

struct InputLayout {
    block: Rect,
    inner: Rect,
    counter: Rect,
}

pub(crate) struct RichInput {
    composer: Composer<StaticDirectory, MonospaceGeometry>,
    snapshots: Receiver<Arc<Snapshot>>,
    latest: Arc<Snapshot>,
    placeholder: String,
    /// Caret of the editing surface (byte offset). After a commit it lags
    /// behind the composer until the scheduled placement fires.
    caret: usize,
    /// First text line shown in the input.
    scroll_top: usize,
    /// First column shown. Long lines scroll sideways with the caret.
    scroll_left: usize,
    /// First suggestion shown in the popup.
    popup_scroll: usize,
    /// Area of the last prepared frame, used for mouse hit testing.
    area: Rect,
}

impl RichInput {
    pub(crate) fn new(
        config: &Config,
        directory: StaticDirectory,
        initial_text: Option<String>,
    ) -> Self {
        let mut composer = Composer::new(
            directory,
            MonospaceGeometry::default(),
            config.max_length,
        );
        let (_subscription, snapshots) = composer.subscribe();
        let latest = Arc::new(composer.snapshot());
        let mut input = Self {
            composer,
            snapshots,
            latest,
            placeholder: config.placeholder.clone(),
            caret: 0,
            scroll_top: 0,
            scroll_left: 0,
            popup_scroll: 0,
            area: Rect::default(),
        };
        if let Some(text) = initial_text {
            input.set_initial_text(&text);
        }
        input
    }

    fn set_initial_text(&mut self, text: &str) {
        let text = normalize_paste(text);
        let max_length = self.composer.max_length();
        let text: String = if text.chars().count() > max_length {
            tracing::warn!(max_length, "initial text truncated to the length limit");
            text.chars().take(max_length).collect()
        } else {
            text
        };
        if self.composer.on_text_change(&text, text.len()) {
            self.caret = self.composer.cursor();
        }
        self.drain_snapshots();
    }

    pub(crate) fn text(&self) -> &str {
        self.composer.text()
    }

    pub(crate) fn handle_key_event(&mut self, key: KeyEvent) -> InputResult {
        match self.composer.on_key_down(mention_key(&key), self.caret) {
            KeyOutcome::Committed(placement) => InputResult::Committed(placement.generation),
            KeyOutcome::Handled => {
                self.caret = self.composer.cursor();
                InputResult::Changed
            }
            KeyOutcome::Unhandled => match SurfaceEdit::from_key(&key) {
                Some(edit) => self.apply_edit(&edit),
                None => InputResult::Unchanged,
            },
        }
    }

    pub(crate) fn handle_paste(&mut self, pasted: &str) -> InputResult {
        self.apply_edit(&SurfaceEdit::Insert(normalize_paste(pasted)))
    }

    /// Fire a caret placement scheduled by a commit. Returns `false` for a
    /// stale generation.
    pub(crate) fn place_caret(&mut self, generation: Generation) -> bool {
        match self.composer.fire_caret(generation) {
            Some(offset) => {
                self.caret = offset;
                true
            }
            None => false,
        }
    }

    /// Left click inside the input or the popup.
    pub(crate) fn handle_click(&mut self, column: u16, row: u16) -> InputResult {
        self.drain_snapshots();
        let position = Position::new(column, row);

        if let Some(popup) = self.popup_rect(self.area)
            && popup.contains(position)
        {
            let len = self.latest.suggestions.len();
            let name = mention_popup::row_at(popup, self.popup_scroll, len, row)
                .and_then(|idx| self.latest.suggestions.get(idx))
                .cloned();
            return match name.and_then(|name| self.composer.on_suggestion_click(&name)) {
                Some(placement) => InputResult::Committed(placement.generation),
                None => InputResult::Unchanged,
            };
        }

        let inner = self.layout(self.area).inner;
        if !inner.contains(position) {
            return InputResult::Unchanged;
        }
        let line = self.scroll_top + usize::from(row - inner.y);
        let column = self.scroll_left + usize::from(column - inner.x);
        let offset = offset_at(self.composer.text(), line, column);
        self.composer.on_cursor_move(offset);
        self.caret = self.composer.cursor();
        InputResult::Changed
    }

    /// A click landed outside the input and the popup.
    pub(crate) fn on_outside_click(&mut self) -> InputResult {
        if !self.composer.mention_state().is_active() {
            return InputResult::Unchanged;
        }
        self.composer.on_outside_interaction();
        InputResult::Changed
    }

    /// Screen regions that count as "inside" for click-outside detection.
    pub(crate) fn hit_regions(&self) -> Vec<Region> {
        let mut regions = vec![region(self.layout(self.area).block)];
        if let Some(popup) = self.popup_rect(self.area) {
            regions.push(region(popup));
        }
        regions
    }

    /// Sync with the composer and lay out the viewport for a frame drawn
    /// into `area`.
    pub(crate) fn prepare_frame(&mut self, area: Rect) {
        self.area = area;
        self.drain_snapshots();

        let inner = self.layout(area).inner;
        let visible = usize::from(inner.height).max(1);
        let text = &self.latest.text;
        let caret = clamp_to_char_boundary(text, self.caret);
        let caret_line = text[..caret].matches('\n').count();
        let line_count = text.matches('\n').count() + 1;

        let mut scroll_top = self.scroll_top.min(line_count.saturating_sub(visible));
        if caret_line < scroll_top {
            scroll_top = caret_line;
        } else if caret_line >= scroll_top + visible {
            scroll_top = caret_line + 1 - visible;
        }
        self.scroll_top = scroll_top;

        let width = usize::from(inner.width).max(1);
        let caret_column = text[line_start(text, caret)..caret].width();
        if caret_column < self.scroll_left {
            self.scroll_left = caret_column;
        } else if caret_column >= self.scroll_left + width {
            self.scroll_left = caret_column + 1 - width;
        }

        let geometry = self.composer.geometry_mut();
        geometry.padding_left = f32::from(inner.x);
        geometry.padding_top = f32::from(inner.y);
        geometry.scroll_left = self.scroll_left;
        geometry.set_viewport(scroll_top, Some(usize::from(inner.height)));
        self.composer.refresh_geometry();
        self.drain_snapshots();

        self.popup_scroll = match self.popup_rect(area) {
            Some(popup) => mention_popup::ensure_visible(
                self.popup_scroll,
                self.latest.selected_index,
                self.latest.suggestions.len(),
                usize::from(popup.height),
            ),
            None => 0,
        };
    }

    pub(crate) fn cursor_pos(&self, area: Rect) -> Option<(u16, u16)> {
        let inner = self.layout(area).inner;
        let text = &self.latest.text;
        let caret = clamp_to_char_boundary(text, self.caret);
        let line = text[..caret].matches('\n').count();
        let row = line.checked_sub(self.scroll_top)?;
        if row >= usize::from(inner.height) {
            return None;
        }
        let column = text[line_start(text, caret)..caret].width();
        let column = column.checked_sub(self.scroll_left)?;
        if column >= usize::from(inner.width) {
            return None;
        }
        Some((inner.x + column as u16, inner.y + row as u16))
    }

    fn apply_edit(&mut self, edit: &SurfaceEdit) -> InputResult {
        match edit.apply(self.composer.text(), self.caret) {
            SurfaceChange::Text { text, cursor } => {
                if !self.composer.on_text_change(&text, cursor) {
                    return InputResult::Unchanged;
                }
                self.caret = self.composer.cursor();
                InputResult::Changed
            }
            SurfaceChange::Cursor(cursor) => {
                self.composer.on_cursor_move(cursor);
                self.caret = self.composer.cursor();
                InputResult::Changed
            }
            SurfaceChange::Unchanged => InputResult::Unchanged,
        }
    }

    fn drain_snapshots(&mut self) {
        if let Some(snapshot) = self.snapshots.try_iter().last() {
            self.latest = snapshot;
        }
    }

    fn layout(&self, area: Rect) -> InputLayout {
        let line_count = self.latest.text.split('\n').count();
        let max_inner = usize::from(area.height.saturating_sub(3).max(1));
        let inner_height = line_count.clamp(1, max_inner) as u16;
        let block = Rect {
            height: (inner_height + 2).min(area.height),
            ..area
        };
        let inner = input_block().inner(block);
        let counter = Rect {
            x: area.x,
            y: block.bottom(),
            width: area.width,
            height: u16::from(block.bottom() < area.bottom()),
        };
        InputLayout {
            block,
            inner,
            counter,
        }
    }

    fn popup_rect(&self, area: Rect) -> Option<Rect> {
        if !self.latest.popup_visible() {
            return None;
        }
        let anchor = self.latest.popup_anchor?;
        let x = anchor.left as u16;
        let y = anchor.top as u16;
        if y < area.y || y >= area.bottom() {
            return None;
        }
        let (width, height) = mention_popup::required_size(&self.latest.suggestions);
        let width = width.min(area.width);
        Some(Rect {
            x: x.min(area.right().saturating_sub(width)).max(area.x),
            y,
            width,
            height: height.min(area.bottom() - y),
        })
    }
}

impl WidgetRef for &RichInput {
    fn render_ref(&self, area: Rect, buf: &mut Buffer) {
        let layout = self.layout(area);
        input_block().render(layout.block, buf);

        let lines: Vec<Line> = if self.latest.text.is_empty() {
            vec![Line::from(self.placeholder.clone().dim())]
        } else {
            styled_lines(&self.latest)
                .into_iter()
                .skip(self.scroll_top)
                .take(usize::from(layout.inner.height))
                .collect()
        };
        let scroll_left = u16::try_from(self.scroll_left).unwrap_or(u16::MAX);
        Paragraph::new(lines)
            .scroll((0, scroll_left))
            .render(layout.inner, buf);

        Line::from(self.latest.counter_label().dim())
            .alignment(Alignment::Right)
            .render(layout.counter, buf);

        if let Some(popup_area) = self.popup_rect(area) {
            Clear.render(popup_area, buf);
            MentionPopup {
                items: &self.latest.suggestions,
                selected: self.latest.selected_index,
                scroll_top: self.popup_scroll,
            }
            .render_ref(popup_area, buf);
        }
    }
}

fn input_block() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
}

fn mention_key(key: &KeyEvent) -> MentionKey {
    let chord = key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
    match key.code {
        KeyCode::Up => MentionKey::ArrowUp,
        KeyCode::Down => MentionKey::ArrowDown,
        KeyCode::Enter if !chord && !key.modifiers.contains(KeyModifiers::SHIFT) => {
            MentionKey::Enter
        }
        KeyCode::Esc => MentionKey::Escape,
        KeyCode::Char(' ') if !chord => MentionKey::Space,
        KeyCode::Backspace => MentionKey::Backspace,
        _ => MentionKey::Other,
    }
}

fn span_style(kind: SpanKind) -> Style {
    match kind {
        SpanKind::Url | SpanKind::Hashtag => Style::default().fg(Color::Blue),
        SpanKind::Mention => Style::default().bg(Color::DarkGray),
        SpanKind::Normal => Style::default(),
    }
}

/// One styled line per text line; spans that contain newlines are split.
fn styled_lines(snapshot: &Snapshot) -> Vec<Line<'static>> {
    let mut lines = vec![Line::default()];
    for span in &snapshot.spans {
        let style = span_style(span.kind);
        for (i, part) in span.text.split('\n').enumerate() {
            if i > 0 {
                lines.push(Line::default());
            }
            if part.is_empty() {
                continue;
            }
            if let Some(line) = lines.last_mut() {
                line.push_span(Span::styled(part.to_string(), style));
            }
        }
    }
    lines
}

fn region(rect: Rect) -> Region {
    Region::new(
        f32::from(rect.x),
        f32::from(rect.y),
        f32::from(rect.width),
        f32::from(rect.height),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn input_with(names: &[&str], max_length: usize, initial: Option<&str>) -> RichInput {
        let config = Config {
            max_length,
            ..Config::default()
        };
        RichInput::new(
            &config,
            StaticDirectory::new(names.iter().copied()),
            initial.map(str::to_string),
        )
    }

    fn input(initial: Option<&str>) -> RichInput {
        input_with(&["french", "sarah", "france", "frog"], 200, initial)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(input: &mut RichInput, text: &str) {
        for ch in text.chars() {
            let _ = input.handle_key_event(key(KeyCode::Char(ch)));
        }
    }

    fn render(input: &mut RichInput, width: u16, height: u16) -> Buffer {
        let area = Rect::new(0, 0, width, height);
        input.prepare_frame(area);
        let mut buf = Buffer::empty(area);
        (&*input).render_ref(area, &mut buf);
        buf
    }

    fn text_at(buf: &Buffer, x: u16, y: u16, len: u16) -> String {
        (x..x + len).map(|x| buf[(x, y)].symbol()).collect()
    }

    #[test]
    fn placeholder_and_counter_when_empty() {
        let mut input = input(None);
        let buf = render(&mut input, 30, 5);
        assert_eq!(text_at(&buf, 1, 1, 18), "write something...");
        assert_eq!(text_at(&buf, 25, 3, 5), "0/200");
    }

    #[test]
    fn typing_mention_opens_popup_under_the_at_sign() {
        let mut input = input(None);
        type_str(&mut input, "hi @fr");
        let buf = render(&mut input, 30, 12);

        assert_eq!(text_at(&buf, 1, 1, 6), "hi @fr");
        assert_eq!(text_at(&buf, 5, 2, 7), "@french");
        assert_eq!(text_at(&buf, 5, 3, 7), "@france");
        assert_eq!(text_at(&buf, 5, 4, 5), "@frog");
        assert_eq!(buf[(5, 2)].fg, Color::Cyan);
        assert_eq!(input.hit_regions().len(), 2);
    }

    #[test]
    fn enter_commits_and_caret_waits_for_placement() {
        let mut input = input(None);
        type_str(&mut input, "@f");
        assert_eq!(input.handle_key_event(key(KeyCode::Down)), InputResult::Changed);

        let InputResult::Committed(generation) = input.handle_key_event(key(KeyCode::Enter)) else {
            panic!("expected a commit");
        };
        assert_eq!(input.text(), "@france ");
        assert_eq!(input.caret, 2);

        let _ = render(&mut input, 30, 5);
        assert!(input.place_caret(generation));
        assert!(!input.place_caret(generation));
        assert_eq!(input.caret, 8);
        assert_eq!(input.cursor_pos(Rect::new(0, 0, 30, 5)), Some((9, 1)));
    }

    #[test]
    fn enter_without_suggestions_inserts_newline() {
        let mut input = input(None);
        type_str(&mut input, "ab");
        assert_eq!(input.handle_key_event(key(KeyCode::Enter)), InputResult::Changed);
        assert_eq!(input.text(), "ab\n");

        let buf = render(&mut input, 30, 8);
        assert_eq!(text_at(&buf, 25, 4, 5), "3/200");
        assert_eq!(input.cursor_pos(Rect::new(0, 0, 30, 8)), Some((1, 2)));
    }

    #[test]
    fn space_commits_active_mention() {
        let mut input = input(None);
        type_str(&mut input, "@sa");
        assert!(matches!(
            input.handle_key_event(key(KeyCode::Char(' '))),
            InputResult::Committed(_)
        ));
        assert_eq!(input.text(), "@sarah ");
    }

    #[test]
    fn escape_closes_popup() {
        let mut input = input(None);
        type_str(&mut input, "@f");
        assert_eq!(input.handle_key_event(key(KeyCode::Esc)), InputResult::Changed);
        let _ = render(&mut input, 30, 12);
        assert_eq!(input.popup_rect(input.area), None);
        assert_eq!(input.text(), "@f");
    }

    #[test]
    fn backspace_deletes_whole_mention() {
        let mut input = input(Some("hi @french "));
        assert_eq!(input.handle_key_event(key(KeyCode::Backspace)), InputResult::Changed);
        assert_eq!(input.text(), "hi ");
        assert_eq!(input.caret, 3);
    }

    #[test]
    fn length_limit_rejects_typing() {
        let mut input = input_with(&[], 3, None);
        type_str(&mut input, "abcd");
        assert_eq!(input.text(), "abc");
        assert_eq!(input.handle_paste("z"), InputResult::Unchanged);
        let buf = render(&mut input, 20, 5);
        assert_eq!(text_at(&buf, 17, 3, 3), "3/3");
    }

    #[test]
    fn initial_text_is_truncated_to_limit() {
        let input = input_with(&[], 5, Some("abcdefgh"));
        assert_eq!(input.text(), "abcde");
    }

    #[test]
    fn paste_normalizes_newlines() {
        let mut input = input(None);
        assert_eq!(input.handle_paste("a\r\nb"), InputResult::Changed);
        assert_eq!(input.text(), "a\nb");
    }

    #[test]
    fn spans_are_styled_by_kind() {
        let mut input = input(Some("#tag @sam x"));
        let buf = render(&mut input, 30, 5);
        assert_eq!(buf[(1, 1)].fg, Color::Blue);
        assert_eq!(buf[(6, 1)].bg, Color::DarkGray);
        assert_eq!(buf[(11, 1)].symbol(), "x");
        assert_eq!(buf[(11, 1)].bg, Color::Reset);
    }

    #[test]
    fn scrolls_to_keep_caret_visible() {
        let mut input = input(Some("a\nb\nc\nd"));
        let buf = render(&mut input, 30, 5);
        assert_eq!(text_at(&buf, 1, 1, 1), "c");
        assert_eq!(text_at(&buf, 1, 2, 1), "d");
        assert_eq!(input.cursor_pos(Rect::new(0, 0, 30, 5)), Some((2, 2)));

        for _ in 0..3 {
            assert_eq!(input.handle_key_event(key(KeyCode::Up)), InputResult::Changed);
        }
        let buf = render(&mut input, 30, 5);
        assert_eq!(text_at(&buf, 1, 1, 1), "a");
        assert_eq!(input.cursor_pos(Rect::new(0, 0, 30, 5)), Some((2, 1)));
    }

    #[test]
    fn long_line_scrolls_sideways_with_the_caret() {
        let text = "0123456789abcdefghijKLMNOPQRST@fr";
        let mut input = input(Some(text));
        let area = Rect::new(0, 0, 20, 10);
        let buf = render(&mut input, 20, 10);

        assert_eq!(input.scroll_left, 16);
        assert_eq!(text_at(&buf, 0, 1, 20), "│ghijKLMNOPQRST@fr │");
        assert_eq!(input.cursor_pos(area), Some((18, 1)));
        assert_eq!(input.latest.popup_anchor.map(|a| a.left), Some(15.0));
        assert_eq!(
            input.popup_rect(area).map(|popup| (popup.x, popup.y)),
            Some((10, 2))
        );

        assert_eq!(input.handle_click(1, 1), InputResult::Changed);
        assert_eq!(input.caret, 16);

        assert_eq!(input.handle_key_event(key(KeyCode::Home)), InputResult::Changed);
        let buf = render(&mut input, 20, 10);
        assert_eq!(input.scroll_left, 0);
        assert_eq!(text_at(&buf, 1, 1, 18), "0123456789abcdefgh");
        assert_eq!(input.cursor_pos(area), Some((1, 1)));
    }

    #[test]
    fn popup_keeps_selection_in_view() {
        let names: Vec<String> = (0..12).map(|i| format!("n{i:02}")).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut input = input_with(&names, 200, None);
        type_str(&mut input, "@n");
        for _ in 0..9 {
            let _ = input.handle_key_event(key(KeyCode::Down));
        }
        let buf = render(&mut input, 30, 20);
        assert_eq!(input.popup_scroll, 2);
        assert_eq!(text_at(&buf, 2, 2, 4), "@n02");
        assert_eq!(text_at(&buf, 2, 9, 4), "@n09");
        assert_eq!(buf[(2, 9)].fg, Color::Cyan);
    }

    #[test]
    fn clicking_a_popup_row_commits_it() {
        let mut input = input(None);
        type_str(&mut input, "hi @fr");
        let _ = render(&mut input, 30, 12);
        assert!(matches!(input.handle_click(6, 3), InputResult::Committed(_)));
        assert_eq!(input.text(), "hi @france ");
    }

    #[test]
    fn clicking_text_moves_caret() {
        let mut input = input(Some("hello world"));
        let _ = render(&mut input, 30, 5);
        assert_eq!(input.handle_click(3, 1), InputResult::Changed);
        assert_eq!(input.caret, 2);
        assert_eq!(input.handle_click(3, 4), InputResult::Unchanged);
    }

    #[test]
    fn outside_click_cancels_once() {
        let mut input = input(None);
        type_str(&mut input, "@f");
        assert_eq!(input.on_outside_click(), InputResult::Changed);
        assert_eq!(input.on_outside_click(), InputResult::Unchanged);
        let _ = render(&mut input, 30, 12);
        assert_eq!(input.hit_regions().len(), 1);
        assert_eq!(input.text(), "@f");
    }
}
