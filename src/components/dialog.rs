use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Padding, Widget},
};

use crate::app::{AppMode, DialogKind, DialogState};
use crate::theme::ThemeColors;

/// Dialog widget that renders a centered modal overlay.
pub struct DialogWidget<'a> {
    mode: &'a AppMode,
    dialog_state: &'a DialogState,
    theme: &'a ThemeColors,
}

impl<'a> DialogWidget<'a> {
    pub fn new(mode: &'a AppMode, dialog_state: &'a DialogState, theme: &'a ThemeColors) -> Self {
        Self {
            mode,
            dialog_state,
            theme,
        }
    }
}

/// Calculate a centered rectangle within the given area.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    let x = area.x + area.width.saturating_sub(w) / 2;
    let y = area.y + area.height.saturating_sub(h) / 2;
    Rect::new(x, y, w, h)
}

impl<'a> Widget for DialogWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let AppMode::Dialog(kind) = self.mode else {
            return;
        };

        match kind {
            DialogKind::Rename { path } => {
                let title = format!("Rename {}", path);
                render_input_dialog(&title, self.dialog_state, self.theme, area, buf);
            }
            DialogKind::DeleteConfirm { path } => render_confirm_dialog(path, self.theme, area, buf),
            DialogKind::Error { message } => render_error_dialog(message, self.theme, area, buf),
        }
    }
}

fn frame(title: &str, border: Style, rect: Rect, buf: &mut Buffer) -> Rect {
    Clear.render(rect, buf);
    let block = Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(border)
        .padding(Padding::horizontal(1));
    let inner = block.inner(rect);
    block.render(rect, buf);
    inner
}

fn hint(text: &str, theme: &ThemeColors, inner: Rect, buf: &mut Buffer) {
    if inner.height > 1 {
        let line = Line::from(Span::styled(
            text,
            Style::default().fg(theme.dim_fg).add_modifier(Modifier::DIM),
        ));
        buf.set_line(inner.x, inner.y + inner.height - 1, &line, inner.width);
    }
}

fn render_input_dialog(
    title: &str,
    state: &DialogState,
    theme: &ThemeColors,
    area: Rect,
    buf: &mut Buffer,
) {
    let rect = centered_rect(50.min(area.width.saturating_sub(4)), 5, area);
    let inner = frame(
        title,
        Style::default().fg(theme.border_focused_fg),
        rect,
        buf,
    );
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    // Split around the cursor on char boundaries; the cursor cell shows
    // the char under it, or a space at the end of input.
    let input = &state.input;
    let pos = state.cursor_position.min(input.len());
    let (before, rest) = input.split_at(pos);
    let mut rest_chars = rest.chars();
    let cursor_char = rest_chars.next().map(String::from).unwrap_or_else(|| " ".into());
    let after = rest_chars.as_str();

    // Keep the cursor in view by dropping chars from the left.
    let room = (inner.width as usize).saturating_sub(1);
    let before_len = before.chars().count();
    let before_display: String = if before_len > room {
        before.chars().skip(before_len - room).collect()
    } else {
        before.to_string()
    };

    let input_style = Style::default().fg(theme.editor_fg);
    let cursor_style = Style::default()
        .bg(theme.editor_cursor_bg)
        .fg(theme.editor_cursor_fg)
        .add_modifier(Modifier::BOLD);
    let line = Line::from(vec![
        Span::styled(before_display, input_style),
        Span::styled(cursor_char, cursor_style),
        Span::styled(after, input_style),
    ]);
    buf.set_line(inner.x, inner.y + inner.height / 2, &line, inner.width);

    hint("[Enter] Confirm  [Esc] Cancel", theme, inner, buf);
}

fn render_confirm_dialog(path: &str, theme: &ThemeColors, area: Rect, buf: &mut Buffer) {
    let width = (path.chars().count() as u16 + 10)
        .max(40)
        .min(area.width.saturating_sub(4));
    let rect = centered_rect(width, 6, area);
    let inner = frame(
        "Delete Confirmation",
        Style::default().fg(theme.error_fg),
        rect,
        buf,
    );
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let header = Line::from(Span::styled(
        "Delete this from the store?",
        Style::default()
            .fg(theme.tree_focused_fg)
            .add_modifier(Modifier::BOLD),
    ));
    buf.set_line(inner.x, inner.y, &header, inner.width);

    if inner.height > 2 {
        let target = Line::from(Span::styled(
            format!("  • {}", path),
            Style::default().fg(theme.editor_fg),
        ));
        buf.set_line(inner.x, inner.y + 1, &target, inner.width);
    }

    hint("[y] Yes  [n/Esc] Cancel", theme, inner, buf);
}

fn render_error_dialog(message: &str, theme: &ThemeColors, area: Rect, buf: &mut Buffer) {
    let width = (message.chars().count() as u16 + 6)
        .max(30)
        .min(area.width.saturating_sub(4));
    let rect = centered_rect(width, 5, area);
    let inner = frame("Error", Style::default().fg(theme.error_fg), rect, buf);
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let msg_line = Line::from(Span::styled(message, Style::default().fg(theme.error_fg)));
    buf.set_line(inner.x, inner.y + inner.height / 2, &msg_line, inner.width);

    hint("[Enter/Esc] Dismiss", theme, inner, buf);
}
