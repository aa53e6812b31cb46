use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::prelude::Constraint;
use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::widgets::Block;
use ratatui::widgets::BorderType;
use ratatui::widgets::Borders;
use ratatui::widgets::Cell;
use ratatui::widgets::Row;
use ratatui::widgets::Table;
use ratatui::widgets::Widget;
use ratatui::widgets::WidgetRef;
use unicode_width::UnicodeWidthStr;

/// Maximum number of suggestions visible at once; the rest scroll.
pub(crate) const MAX_POPUP_ROWS: usize = 8;

/// Suggestion list drawn under the `@` being typed.
pub(crate) struct MentionPopup<'a> {
    pub items: &'a [String],
    pub selected: usize,
    /// Index of the first visible item.
    pub scroll_top: usize,
}

impl WidgetRef for MentionPopup<'_> {
    fn render_ref(&self, area: Rect, buf: &mut Buffer) {
        let visible = visible_rows(self.items.len(), area.height);
        let rows: Vec<Row> = self
            .items
            .iter()
            .enumerate()
            .skip(self.scroll_top)
            .take(visible)
            .map(|(i, name)| {
                let mut cell = Cell::from(format!("@{name}"));
                if i == self.selected {
                    cell = cell.style(
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    );
                }
                Row::new(vec![cell])
            })
            .collect();

        Table::new(rows, [Constraint::Percentage(100)])
            .block(
                Block::default()
                    .borders(Borders::LEFT)
                    .border_type(BorderType::QuadrantOutside)
                    .border_style(Style::default().add_modifier(Modifier::DIM)),
            )
            .render(area, buf);
    }
}

/// Width and height (in cells) needed to show `items`, border included.
pub(crate) fn required_size(items: &[String]) -> (u16, u16) {
    let widest = items.iter().map(|name| name.width() + 1).max().unwrap_or(0);
    let width = u16::try_from(widest + 2).unwrap_or(u16::MAX);
    let height = items.len().min(MAX_POPUP_ROWS) as u16;
    (width, height)
}

/// Adjust `scroll_top` so `selected` lies inside a window of `visible` rows.
pub(crate) fn ensure_visible(
    scroll_top: usize,
    selected: usize,
    len: usize,
    visible: usize,
) -> usize {
    if len == 0 || visible == 0 {
        return 0;
    }
    let max_top = len.saturating_sub(visible);
    let scroll_top = if selected < scroll_top {
        selected
    } else if selected >= scroll_top + visible {
        selected + 1 - visible
    } else {
        scroll_top
    };
    scroll_top.min(max_top)
}

/// Item index under screen row `y`, for a popup drawn in `area`.
pub(crate) fn row_at(area: Rect, scroll_top: usize, len: usize, y: u16) -> Option<usize> {
    if y < area.y || y >= area.bottom() {
        return None;
    }
    let idx = scroll_top + usize::from(y - area.y);
    (idx < len).then_some(idx)
}

fn visible_rows(len: usize, height: u16) -> usize {
    len.min(MAX_POPUP_ROWS).min(usize::from(height))
}
