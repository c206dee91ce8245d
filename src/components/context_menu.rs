use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Widget},
};

use crate::theme::ThemeColors;

/// Where a menu with `labels` opens for a pointer at (`x`, `y`).
///
/// It drops down from the row below the pointer and is shifted back
/// inside `area` when it would overflow the right or bottom edge.
pub fn menu_rect(x: u16, y: u16, labels: &[&str], area: Rect) -> Rect {
    let longest = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0) as u16;
    let width = (longest + 4).min(area.width);
    let height = (labels.len() as u16 + 2).min(area.height);

    let max_x = (area.x + area.width).saturating_sub(width);
    let max_y = (area.y + area.height).saturating_sub(height);
    Rect::new(
        x.clamp(area.x, max_x.max(area.x)),
        (y + 1).clamp(area.y, max_y.max(area.y)),
        width,
        height,
    )
}

/// Popup list of the actions available on one tree node.
pub struct ContextMenuWidget<'a> {
    labels: &'a [&'a str],
    selected: usize,
    theme: &'a ThemeColors,
}

impl<'a> ContextMenuWidget<'a> {
    pub fn new(labels: &'a [&'a str], selected: usize, theme: &'a ThemeColors) -> Self {
        Self {
            labels,
            selected,
            theme,
        }
    }
}

impl<'a> Widget for ContextMenuWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        let base = Style::default().bg(self.theme.menu_bg).fg(self.theme.tree_fg);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(base.fg(self.theme.border_focused_fg))
            .style(base);
        let inner = block.inner(area);
        block.render(area, buf);

        for (i, label) in self.labels.iter().enumerate().take(inner.height as usize) {
            let style = if i == self.selected {
                base.bg(self.theme.menu_selected_bg)
                    .add_modifier(Modifier::BOLD)
            } else {
                base
            };
            let text = format!(" {:<width$}", label, width = inner.width.saturating_sub(1) as usize);
            let line = Line::from(Span::styled(text, style));
            buf.set_line(inner.x, inner.y + i as u16, &line, inner.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::dark_theme;

    #[test]
    fn test_menu_rect_drops_below_pointer() {
        let area = Rect::new(0, 0, 80, 24);
        let rect = menu_rect(10, 4, &["Open", "Rename", "Delete"], area);
        assert_eq!(rect, Rect::new(10, 5, 10, 5));
    }

    #[test]
    fn test_menu_rect_stays_inside_area() {
        let area = Rect::new(0, 0, 30, 10);
        let rect = menu_rect(28, 9, &["Rename", "Delete", "Refresh"], area);
        assert_eq!(rect, Rect::new(19, 5, 11, 5));
    }

    #[test]
    fn test_renders_items_with_selection() {
        let theme = dark_theme();
        let labels = ["Open", "Rename", "Delete"];
        let area = Rect::new(0, 0, 10, 5);
        let mut buf = Buffer::empty(area);
        ContextMenuWidget::new(&labels, 1, &theme).render(area, &mut buf);

        let row = |y: u16| -> String { (0..10).map(|x| buf[(x, y)].symbol()).collect() };
        assert_eq!(row(0), "┌────────┐");
        assert_eq!(row(1), "│ Open   │");
        assert_eq!(row(2), "│ Rename │");
        assert_eq!(row(4), "└────────┘");
        assert_eq!(buf[(2, 2)].bg, theme.menu_selected_bg);
        assert_eq!(buf[(2, 1)].bg, theme.menu_bg);
    }
}
