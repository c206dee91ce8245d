use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::editor::EditorState;
use crate::theme::ThemeColors;

/// Widget for rendering the editor view with line numbers and cursor.
pub struct EditorWidget<'a> {
    editor: &'a EditorState,
    theme: &'a ThemeColors,
    show_cursor: bool,
    block: Option<Block<'a>>,
}

impl<'a> EditorWidget<'a> {
    pub fn new(editor: &'a EditorState, theme: &'a ThemeColors) -> Self {
        Self {
            editor,
            theme,
            show_cursor: true,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    /// Draw the cursor cell. Off while the tree pane has the keys.
    pub fn show_cursor(mut self, show: bool) -> Self {
        self.show_cursor = show;
        self
    }

    /// Calculate the width needed for the line number gutter.
    fn gutter_width(&self) -> u16 {
        let digits = self.editor.line_count().max(1).to_string().len() as u16;
        digits + 2 // digits + space + separator
    }

    fn render_empty(&self, inner: Rect, buf: &mut Buffer) {
        let text = "Select a note in the tree";
        let width = text.len() as u16;
        let x = inner.x + inner.width.saturating_sub(width) / 2;
        let line = Line::from(Span::styled(
            text,
            Style::default()
                .fg(self.theme.dim_fg)
                .add_modifier(Modifier::ITALIC),
        ));
        buf.set_line(x, inner.y + inner.height / 2, &line, inner.width);
    }
}

impl<'a> Widget for EditorWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        if inner.width == 0 || inner.height == 0 {
            return;
        }
        if !self.editor.is_attached() {
            self.render_empty(inner, buf);
            return;
        }

        let gutter_w = self.gutter_width();
        let code_width = inner.width.saturating_sub(gutter_w) as usize;
        if code_width == 0 {
            return;
        }
        let code_x = inner.x + gutter_w;

        // Scroll sideways just enough to keep the cursor column on screen.
        let h_offset = (self.editor.cursor_col + 1).saturating_sub(code_width);
        let scroll = self.editor.scroll_offset;
        let text_style = Style::default().fg(self.theme.editor_fg);
        let cursor_style = Style::default()
            .fg(self.theme.editor_cursor_fg)
            .bg(self.theme.editor_cursor_bg);

        for row in 0..inner.height as usize {
            let line_idx = scroll + row;
            let y = inner.y + row as u16;

            let Some(content) = self.editor.buffer.get(line_idx) else {
                // Lines beyond buffer: show tilde
                buf.set_string(inner.x, y, "~", Style::default().fg(self.theme.dim_fg));
                continue;
            };
            let is_current_line = line_idx == self.editor.cursor_line;

            let num_str = format!("{:>width$} ", line_idx + 1, width = (gutter_w - 2) as usize);
            let gutter_style = if is_current_line {
                Style::default()
                    .fg(self.theme.editor_line_nr_current)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.editor_line_nr)
            };
            buf.set_span(inner.x, y, &Span::styled(num_str, gutter_style), gutter_w);
            buf.set_string(
                inner.x + gutter_w - 1,
                y,
                "│",
                Style::default().fg(self.theme.border_fg),
            );

            let visible: String = content.chars().skip(h_offset).take(code_width).collect();
            buf.set_string(code_x, y, &visible, text_style);

            if is_current_line && self.show_cursor {
                let col = self.editor.cursor_col - h_offset.min(self.editor.cursor_col);
                let under = content
                    .chars()
                    .nth(self.editor.cursor_col)
                    .map(String::from)
                    .unwrap_or_else(|| " ".into());
                if col < code_width {
                    buf.set_string(code_x + col as u16, y, &under, cursor_style);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::buffer::Buffer;

    fn test_theme() -> ThemeColors {
        crate::theme::dark_theme()
    }

    fn editor_with(content: &str) -> EditorState {
        let mut editor = EditorState::new();
        editor.replace_all("test.md", content);
        editor
    }

    #[test]
    fn test_editor_widget_renders_lines() {
        let editor = editor_with("line1\nline2\nline3");
        let theme = test_theme();
        let area = Rect::new(0, 0, 40, 5);
        let mut buf = Buffer::empty(area);
        EditorWidget::new(&editor, &theme).render(area, &mut buf);

        let content = buffer_to_string(&buf, area);
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0].trim_end(), "1 │line1");
        assert_eq!(lines[2].trim_end(), "3 │line3");
        assert_eq!(lines[3].trim_end(), "~");
    }

    #[test]
    fn test_editor_widget_with_block() {
        let editor = editor_with("hello");
        let theme = test_theme();
        let block = Block::default()
            .title(" Test ")
            .borders(ratatui::widgets::Borders::ALL);
        let area = Rect::new(0, 0, 40, 5);
        let mut buf = Buffer::empty(area);
        EditorWidget::new(&editor, &theme).block(block).render(area, &mut buf);

        let content = buffer_to_string(&buf, area);
        assert!(content.contains("Test"));
        assert!(content.contains("hello"));
    }

    #[test]
    fn test_cursor_cell_is_highlighted() {
        let mut editor = editor_with("abc");
        editor.cursor_col = 1;
        let theme = test_theme();
        let area = Rect::new(0, 0, 20, 2);
        let mut buf = Buffer::empty(area);
        EditorWidget::new(&editor, &theme).render(area, &mut buf);

        // Gutter is "1 │", so text starts at column 3.
        assert_eq!(buf[(4, 0)].symbol(), "b");
        assert_eq!(buf[(4, 0)].bg, theme.editor_cursor_bg);
        assert_ne!(buf[(3, 0)].bg, theme.editor_cursor_bg);

        let mut buf = Buffer::empty(area);
        EditorWidget::new(&editor, &theme)
            .show_cursor(false)
            .render(area, &mut buf);
        assert_ne!(buf[(4, 0)].bg, theme.editor_cursor_bg);
    }

    #[test]
    fn test_long_line_scrolls_to_cursor() {
        let mut editor = editor_with("0123456789abcdef");
        editor.move_end();
        let theme = test_theme();
        let area = Rect::new(0, 0, 11, 1);
        let mut buf = Buffer::empty(area);
        EditorWidget::new(&editor, &theme).render(area, &mut buf);

        // 8 text columns: the last 7 chars then the cursor past the end.
        let content = buffer_to_string(&buf, area);
        assert_eq!(content.trim_end(), "1 │9abcdef");
        assert_eq!(buf[(10, 0)].bg, theme.editor_cursor_bg);
    }

    #[test]
    fn test_detached_editor_shows_hint() {
        let editor = EditorState::new();
        let theme = test_theme();
        let area = Rect::new(0, 0, 40, 3);
        let mut buf = Buffer::empty(area);
        EditorWidget::new(&editor, &theme).render(area, &mut buf);

        let content = buffer_to_string(&buf, area);
        assert!(content.contains("Select a note in the tree"));
        assert!(!content.contains('~'));
    }

    #[test]
    fn test_gutter_width() {
        let editor = editor_with("a");
        let theme = test_theme();
        assert_eq!(EditorWidget::new(&editor, &theme).gutter_width(), 3);

        let many_lines = (0..100)
            .map(|i| format!("line{}", i))
            .collect::<Vec<_>>()
            .join("\n");
        let editor2 = editor_with(&many_lines);
        assert_eq!(EditorWidget::new(&editor2, &theme).gutter_width(), 5);
    }

    fn buffer_to_string(buf: &Buffer, area: Rect) -> String {
        let mut s = String::new();
        for y in area.y..area.y + area.height {
            for x in area.x..area.x + area.width {
                s.push_str(buf[(x, y)].symbol());
            }
            s.push('\n');
        }
        s
    }
}
