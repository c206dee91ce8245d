use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::theme::ThemeColors;

const TREE_HINTS: &str = " ↵:open  m:menu  r:refresh  q:quit ";
const EDITOR_HINTS: &str = " Esc:tree  ^S:save  ^C:quit ";

/// Status bar widget that shows the open note, sync activity, key hints,
/// or a transient status message.
pub struct StatusBarWidget<'a> {
    note: Option<&'a str>,
    theme: &'a ThemeColors,
    editing: bool,
    activity: Option<&'a str>,
    status_message: Option<&'a str>,
    is_error: bool,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(note: Option<&'a str>, theme: &'a ThemeColors) -> Self {
        Self {
            note,
            theme,
            editing: false,
            activity: None,
            status_message: None,
            is_error: false,
        }
    }

    /// Show the editor's key hints instead of the tree's.
    pub fn editing(mut self, editing: bool) -> Self {
        self.editing = editing;
        self
    }

    /// Short indicator of in-flight sync work, e.g. "saving…".
    pub fn activity(mut self, activity: &'a str) -> Self {
        self.activity = Some(activity);
        self
    }

    pub fn status_message(mut self, msg: &'a str, is_error: bool) -> Self {
        self.status_message = Some(msg);
        self.is_error = is_error;
        self
    }
}

impl<'a> Widget for StatusBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }
        let width = area.width as usize;
        let bar = Style::default().bg(self.theme.status_bg).fg(self.theme.status_fg);
        buf.set_style(area, bar);

        if let Some(msg) = self.status_message {
            let style = if self.is_error {
                bar.bg(self.theme.error_fg)
            } else {
                bar.fg(self.theme.success_fg)
            };
            let display = format!(" {:<width$}", msg, width = width.saturating_sub(1));
            buf.set_line(area.x, area.y, &Line::from(Span::styled(display, style)), area.width);
            return;
        }

        let hints = if self.editing { EDITOR_HINTS } else { TREE_HINTS };
        let hints_len = hints.chars().count();
        let activity = self.activity.map(|a| format!(" [{}]", a)).unwrap_or_default();

        // The note path gets what the hints and activity leave, trimmed
        // from the left so the file name stays visible.
        let path = self.note.unwrap_or("no note open");
        let budget = width
            .saturating_sub(hints_len)
            .saturating_sub(activity.chars().count())
            .saturating_sub(1);
        let path_len = path.chars().count();
        let path_display = if path_len > budget && budget > 3 {
            let tail: String = path.chars().skip(path_len - (budget - 3)).collect();
            format!("...{}", tail)
        } else {
            path.chars().take(budget).collect()
        };

        let path_style = if self.note.is_some() {
            bar.add_modifier(Modifier::BOLD)
        } else {
            bar.fg(self.theme.dim_fg)
        };
        let mut spans = vec![
            Span::raw(" "),
            Span::styled(path_display, path_style),
            Span::styled(activity, bar.fg(self.theme.tree_focused_fg)),
        ];

        let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
        let pad = width.saturating_sub(used).saturating_sub(hints_len);
        spans.push(Span::raw(" ".repeat(pad)));
        spans.push(Span::styled(hints, bar.fg(self.theme.dim_fg)));

        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}
