use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::theme::ThemeColors;
use crate::view::{ElementRole, Row, ViewBinder};

/// Tree widget that renders the bound view elements with box-drawing characters.
///
/// With no rows it shows a centered placeholder instead, used while the
/// first snapshot loads or after it failed.
pub struct TreeWidget<'a> {
    binder: &'a ViewBinder,
    rows: &'a [Row],
    theme: &'a ThemeColors,
    selected: Option<usize>,
    scroll_offset: usize,
    placeholder: Option<&'a str>,
    block: Option<Block<'a>>,
}

impl<'a> TreeWidget<'a> {
    pub fn new(binder: &'a ViewBinder, rows: &'a [Row], theme: &'a ThemeColors) -> Self {
        Self {
            binder,
            rows,
            theme,
            selected: None,
            scroll_offset: 0,
            placeholder: None,
            block: None,
        }
    }

    pub fn selected(mut self, index: Option<usize>) -> Self {
        self.selected = index;
        self
    }

    pub fn scroll_offset(mut self, offset: usize) -> Self {
        self.scroll_offset = offset;
        self
    }

    pub fn placeholder(mut self, text: &'a str) -> Self {
        self.placeholder = Some(text);
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = block.into();
        self
    }

    /// Indentation for `rows[index]`: a continuation bar for every ancestor
    /// that still has siblings below it, then this row's own connector.
    fn build_prefix(rows: &[Row], index: usize) -> String {
        let row = &rows[index];
        let mut parts: Vec<&str> = Vec::with_capacity(row.depth + 1);

        for d in 0..row.depth {
            // The nearest earlier row at depth d is the ancestor at that level.
            let ancestor_is_last = rows[..index]
                .iter()
                .rev()
                .find(|r| r.depth <= d)
                .is_some_and(|r| r.depth == d && r.is_last_sibling);
            parts.push(if ancestor_is_last { "   " } else { "│  " });
        }
        parts.push(if row.is_last_sibling { "└─ " } else { "├─ " });
        parts.concat()
    }

    fn render_placeholder(&self, text: &str, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }
        let y = area.y + area.height / 2;
        let width = text.chars().count() as u16;
        let x = area.x + area.width.saturating_sub(width) / 2;
        let line = Line::from(Span::styled(
            text.to_string(),
            Style::default()
                .fg(self.theme.tree_placeholder_fg)
                .add_modifier(Modifier::ITALIC),
        ));
        buf.set_line(x, y, &line, area.width.saturating_sub(x - area.x));
    }
}

impl<'a> Widget for TreeWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        let visible_height = inner_area.height as usize;
        if visible_height == 0 {
            return;
        }
        if self.rows.is_empty() {
            if let Some(text) = self.placeholder {
                self.render_placeholder(text, inner_area, buf);
            }
            return;
        }

        let visible = self
            .rows
            .iter()
            .enumerate()
            .skip(self.scroll_offset)
            .take(visible_height);

        for (i, (idx, row)) in visible.enumerate() {
            let Some(element) = self.binder.element(row.owner) else {
                continue;
            };
            let y = inner_area.y + i as u16;
            let is_dir = element.role == ElementRole::Directory;

            let indicator = match (is_dir, element.open) {
                (true, true) => "▾ ",
                (true, false) => "▸ ",
                (false, _) => "",
            };

            let mut style = if is_dir {
                Style::default()
                    .fg(self.theme.tree_dir_fg)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.tree_fg)
            };
            if element.focused {
                style = style
                    .fg(self.theme.tree_focused_fg)
                    .add_modifier(Modifier::UNDERLINED);
            }
            if self.selected == Some(idx) {
                style = style.bg(self.theme.tree_selected_bg);
            }

            let prefix = Self::build_prefix(self.rows, idx);
            let line = Line::from(vec![
                Span::styled(prefix, Style::default().fg(self.theme.dim_fg)),
                Span::styled(format!("{}{}", indicator, element.text), style),
            ]);
            buf.set_line(inner_area.x, y, &line, inner_area.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::dark_theme;
    use crate::tree::{FileTreeModel, Snapshot};
    use crate::view::InteractionController;

    fn model() -> FileTreeModel {
        let json = r#"{"type": "directory", "name": "root", "rel_path": "", "children": {
            "z.md": {"type": "file", "name": "z.md", "rel_path": "z.md"},
            "docs": {"type": "directory", "name": "docs", "rel_path": "docs", "children": {
                "one.md": {"type": "file", "name": "one.md", "rel_path": "docs/one.md"},
                "two.md": {"type": "file", "name": "two.md", "rel_path": "docs/two.md"}}}}}"#;
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();
        FileTreeModel::build(&snapshot).unwrap()
    }

    fn mounted(model: &FileTreeModel) -> ViewBinder {
        let mut binder = ViewBinder::new();
        binder.mount(model, model.root()).unwrap();
        binder
    }

    fn line(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol())
            .collect::<String>()
            .trim_end()
            .to_string()
    }

    #[test]
    fn test_renders_closed_tree() {
        let model = model();
        let binder = mounted(&model);
        let rows = binder.visible_rows();
        let theme = dark_theme();
        let area = Rect::new(0, 0, 24, 4);
        let mut buf = Buffer::empty(area);
        TreeWidget::new(&binder, &rows, &theme).render(area, &mut buf);

        assert_eq!(line(&buf, 0), "├─ ▸ docs");
        assert_eq!(line(&buf, 1), "└─ z.md");
        assert_eq!(line(&buf, 2), "");
    }

    #[test]
    fn test_open_directory_draws_continuation_bars() {
        let model = model();
        let mut binder = mounted(&model);
        let controller: InteractionController<()> = InteractionController::new();
        let docs = model.id_of("docs").unwrap();
        controller.toggle_open(&mut binder, docs);
        let rows = binder.visible_rows();
        let theme = dark_theme();
        let area = Rect::new(0, 0, 24, 4);
        let mut buf = Buffer::empty(area);
        TreeWidget::new(&binder, &rows, &theme).render(area, &mut buf);

        assert_eq!(line(&buf, 0), "├─ ▾ docs");
        assert_eq!(line(&buf, 1), "│  ├─ one.md");
        assert_eq!(line(&buf, 2), "│  └─ two.md");
        assert_eq!(line(&buf, 3), "└─ z.md");
    }

    #[test]
    fn test_selected_and_scrolled() {
        let model = model();
        let binder = mounted(&model);
        let rows = binder.visible_rows();
        let theme = dark_theme();
        let area = Rect::new(0, 0, 24, 1);
        let mut buf = Buffer::empty(area);
        TreeWidget::new(&binder, &rows, &theme)
            .selected(Some(1))
            .scroll_offset(1)
            .render(area, &mut buf);

        assert_eq!(line(&buf, 0), "└─ z.md");
        assert_eq!(buf[(3, 0)].bg, theme.tree_selected_bg);
        assert_eq!(buf[(0, 0)].bg, ratatui::style::Color::Reset);
    }

    #[test]
    fn test_focused_row_is_underlined() {
        let model = model();
        let mut binder = mounted(&model);
        let mut controller: InteractionController<()> = InteractionController::new();
        controller.focus(&model, &mut binder, "z.md").unwrap();
        let rows = binder.visible_rows();
        let theme = dark_theme();
        let area = Rect::new(0, 0, 24, 2);
        let mut buf = Buffer::empty(area);
        TreeWidget::new(&binder, &rows, &theme).render(area, &mut buf);

        assert_eq!(buf[(3, 1)].fg, theme.tree_focused_fg);
        assert!(buf[(3, 1)].modifier.contains(Modifier::UNDERLINED));
        assert!(!buf[(3, 0)].modifier.contains(Modifier::UNDERLINED));
    }

    #[test]
    fn test_placeholder_when_empty() {
        let binder = ViewBinder::new();
        let theme = dark_theme();
        let area = Rect::new(0, 0, 20, 3);
        let mut buf = Buffer::empty(area);
        TreeWidget::new(&binder, &[], &theme)
            .placeholder("Loading…")
            .render(area, &mut buf);

        assert_eq!(line(&buf, 1).trim(), "Loading…");
        assert_eq!(line(&buf, 0), "");
    }
}
