//! Popup placement. The engine only asks where the popup should go; how text
//! is measured belongs to the rendering layer.

use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use crate::util::clamp_to_char_boundary;
use crate::util::line_start;

/// Position of the popup's top-left corner, in the rendering layer's units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CaretCoords {
    pub top: f32,
    pub left: f32,
}

pub trait CaretGeometry {
    /// Where to anchor the popup for the `@` on the caret's line, or `None`
    /// when no `@` can be located there (or it is not currently visible).
    fn caret_coords(&self, text: &str, cursor: usize) -> Option<CaretCoords>;
}

impl<G: CaretGeometry + ?Sized> CaretGeometry for &G {
    fn caret_coords(&self, text: &str, cursor: usize) -> Option<CaretCoords> {
        (**self).caret_coords(text, cursor)
    }
}

impl<G: CaretGeometry + ?Sized> CaretGeometry for Box<G> {
    fn caret_coords(&self, text: &str, cursor: usize) -> Option<CaretCoords> {
        (**self).caret_coords(text, cursor)
    }
}

/// Geometry for fixed-pitch text laid out one logical line per row.
///
/// The anchor sits one row below the caret's line, horizontally aligned with
/// the `@`. `scroll_top` and `visible_lines` describe the viewport; an anchor
/// whose line is scrolled out of view is reported as `None`. `scroll_left`
/// shifts the anchor for lines scrolled sideways, so it may fall left of
/// `padding_left` when the `@` itself is out of view.
#[derive(Debug, Clone, PartialEq)]
pub struct MonospaceGeometry {
    pub cell_width: f32,
    pub line_height: f32,
    pub padding_left: f32,
    pub padding_top: f32,
    pub scroll_top: usize,
    pub visible_lines: Option<usize>,
    /// First visible column.
    pub scroll_left: usize,
}

impl Default for MonospaceGeometry {
    fn default() -> Self {
        Self {
            cell_width: 1.0,
            line_height: 1.0,
            padding_left: 0.0,
            padding_top: 0.0,
            scroll_top: 0,
            visible_lines: None,
            scroll_left: 0,
        }
    }
}

impl MonospaceGeometry {
    pub fn set_viewport(&mut self, scroll_top: usize, visible_lines: Option<usize>) {
        self.scroll_top = scroll_top;
        self.visible_lines = visible_lines;
    }
}

impl CaretGeometry for MonospaceGeometry {
    fn caret_coords(&self, text: &str, cursor: usize) -> Option<CaretCoords> {
        let cursor = clamp_to_char_boundary(text, cursor);
        let start = line_start(text, cursor);
        let line = &text[start..cursor];
        let at = line.rfind('@')?;

        let line_idx = text[..start].matches('\n').count();
        if line_idx < self.scroll_top {
            return None;
        }
        let visible_row = line_idx - self.scroll_top;
        if self.visible_lines.is_some_and(|rows| visible_row >= rows) {
            return None;
        }

        let columns = line[..at].width() as f32 - self.scroll_left as f32;
        Some(CaretCoords {
            top: self.padding_top + (visible_row + 1) as f32 * self.line_height,
            left: self.padding_left + columns * self.cell_width,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn anchors_below_the_caret_line_at_the_at_column() {
        let geometry = MonospaceGeometry::default();
        assert_eq!(
            geometry.caret_coords("hi @fr", 6),
            Some(CaretCoords {
                top: 1.0,
                left: 3.0
            })
        );
        assert_eq!(
            geometry.caret_coords("first\nsecond @x", 15),
            Some(CaretCoords {
                top: 2.0,
                left: 7.0
            })
        );
    }

    #[test]
    fn applies_metrics_and_padding() {
        let geometry = MonospaceGeometry {
            cell_width: 8.0,
            line_height: 20.0,
            padding_left: 12.0,
            padding_top: 4.0,
            ..MonospaceGeometry::default()
        };
        assert_eq!(
            geometry.caret_coords("ab@", 3),
            Some(CaretCoords {
                top: 24.0,
                left: 28.0
            })
        );
    }

    #[test]
    fn wide_characters_take_two_columns() {
        let geometry = MonospaceGeometry::default();
        let text = "诶 @a";
        assert_eq!(
            geometry.caret_coords(text, text.len()).map(|c| c.left),
            Some(3.0)
        );
    }

    #[test]
    fn horizontal_scroll_shifts_the_anchor() {
        let geometry = MonospaceGeometry {
            padding_left: 1.0,
            scroll_left: 16,
            ..MonospaceGeometry::default()
        };
        let text = "0123456789abcdefghijKLMNOPQRST@fr";
        assert_eq!(
            geometry.caret_coords(text, text.len()),
            Some(CaretCoords {
                top: 1.0,
                left: 15.0
            })
        );
        assert_eq!(
            geometry.caret_coords("ab @x", 5).map(|c| c.left),
            Some(-12.0)
        );
    }

    #[test]
    fn none_without_at_on_current_line() {
        let geometry = MonospaceGeometry::default();
        assert_eq!(geometry.caret_coords("no mention", 10), None);
        assert_eq!(geometry.caret_coords("@prev\nnext", 10), None);
    }

    #[test]
    fn none_when_line_is_scrolled_out_of_view() {
        let mut geometry = MonospaceGeometry::default();
        let text = "a\nb\n@c";
        geometry.set_viewport(0, Some(2));
        assert_eq!(geometry.caret_coords(text, text.len()), None);

        geometry.set_viewport(1, Some(2));
        assert_eq!(
            geometry.caret_coords(text, text.len()),
            Some(CaretCoords {
                top: 2.0,
                left: 0.0
            })
        );

        geometry.set_viewport(3, None);
        assert_eq!(geometry.caret_coords(text, text.len()), None);
    }
}
