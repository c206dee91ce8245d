use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::Style,
    widgets::{Block, Borders},
    Frame,
};

use crate::app::{App, AppMode, Pane};
use crate::components::context_menu::{menu_rect, ContextMenuWidget};
use crate::components::dialog::DialogWidget;
use crate::components::editor::EditorWidget;
use crate::components::status_bar::StatusBarWidget;
use crate::components::tree::TreeWidget;

/// Render the application UI.
///
/// Also records the pane and menu areas on `app` for mouse hit-testing,
/// and tells the tree and editor how many rows they have.
pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(app.sidebar_width()),
            Constraint::Min(1),
        ])
        .split(rows[0]);

    let (focused_fg, border_fg) = (app.theme.border_focused_fg, app.theme.border_fg);
    let border = |focused: bool| Style::default().fg(if focused { focused_fg } else { border_fg });

    // Tree pane
    let tree_block = Block::default()
        .title(" Notes ")
        .borders(Borders::ALL)
        .border_style(border(app.pane == Pane::Tree));
    app.tree_area = tree_block.inner(panes[0]);
    app.update_scroll(app.tree_area.height as usize);

    let placeholder = match (&app.tree_error, app.loading) {
        (Some(e), _) => format!("{} (r to retry)", e),
        (None, true) => "Loading…".to_string(),
        (None, false) => "No notes".to_string(),
    };
    let tree_rows = app.visible_rows();
    let tree = TreeWidget::new(&app.binder, &tree_rows, &app.theme)
        .selected(app.model.as_ref().map(|_| app.selected))
        .scroll_offset(app.scroll_offset)
        .placeholder(&placeholder)
        .block(tree_block);
    frame.render_widget(tree, panes[0]);

    // Editor pane
    let title = match &app.editor.path {
        Some(path) => format!(" {} ", path),
        None => " Editor ".to_string(),
    };
    let editor_block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border(app.pane == Pane::Editor));
    app.editor_area = editor_block.inner(panes[1]);
    app.editor.visible_height = app.editor_area.height as usize;
    app.editor.ensure_cursor_visible();
    let editor = EditorWidget::new(&app.editor, &app.theme)
        .show_cursor(app.pane == Pane::Editor)
        .block(editor_block);
    frame.render_widget(editor, panes[1]);

    // Status bar
    let activity = if app.scheduler.pending_count() > 0 || app.client.in_flight_count() > 0 {
        Some("saving…")
    } else if app.loading {
        Some("loading…")
    } else {
        None
    };
    let mut status = StatusBarWidget::new(app.editor.path.as_deref(), &app.theme)
        .editing(app.pane == Pane::Editor);
    if let Some(activity) = activity {
        status = status.activity(activity);
    }
    if let Some(msg) = &app.status_message {
        status = status.status_message(&msg.text, msg.is_error);
    }
    frame.render_widget(status, rows[1]);

    // Overlays
    app.menu_area = match app.controller.menu() {
        Some(menu) => {
            let labels = app.controller.menu_labels();
            let rect = menu_rect(menu.x, menu.y, &labels, area);
            frame.render_widget(ContextMenuWidget::new(&labels, menu.selected, &app.theme), rect);
            Some(rect)
        }
        None => None,
    };

    if matches!(app.mode, AppMode::Dialog(_)) {
        frame.render_widget(DialogWidget::new(&app.mode, &app.dialog_state, &app.theme), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::event::SyncEvent;
    use crate::prefs::Prefs;
    use crate::sync::mock::MockTransport;
    use crate::sync::SyncClient;
    use crate::tree::Snapshot;
    use ratatui::{backend::TestBackend, buffer::Buffer, layout::Rect, Terminal};
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn app() -> App {
        let (tx, _rx) = mpsc::unbounded_channel();
        App::new(
            &AppConfig::default(),
            SyncClient::new(Arc::new(MockTransport::new())),
            Prefs::load(None, (16, 80), 20),
            tx,
        )
    }

    fn draw(app: &mut App) -> Buffer {
        let mut terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();
        terminal.backend().buffer().clone()
    }

    fn row(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width).map(|x| buf[(x, y)].symbol()).collect()
    }

    fn snapshot() -> Snapshot {
        Snapshot::dir(
            "root",
            "",
            vec![
                Snapshot::file("a.md", "a.md"),
                Snapshot::dir("notes", "notes", vec![Snapshot::file("b.md", "notes/b.md")]),
            ],
        )
    }

    #[tokio::test]
    async fn test_layout_records_areas() {
        let mut app = app();
        app.apply_sync(SyncEvent::TreeLoaded(Ok(Some(snapshot()))));
        let buf = draw(&mut app);

        assert_eq!(app.tree_area, Rect::new(1, 1, 18, 9));
        assert_eq!(app.editor_area, Rect::new(21, 1, 38, 9));
        assert_eq!(app.editor.visible_height, 9);
        assert!(row(&buf, 1).contains("├─ ▸ notes"));
        assert!(row(&buf, 2).contains("└─ a.md"));
        assert!(row(&buf, 11).contains("no note open"));
        assert!(app.menu_area.is_none());
    }

    #[tokio::test]
    async fn test_placeholder_before_first_tree() {
        let mut app = app();
        app.loading = true;
        let buf = draw(&mut app);
        let text: String = (0..12).map(|y| row(&buf, y)).collect();
        assert!(text.contains("Loading…"));
        assert!(text.contains("Select a note in the tree"));
    }

    #[tokio::test]
    async fn test_menu_overlay_sets_area() {
        let mut app = app();
        app.apply_sync(SyncEvent::TreeLoaded(Ok(Some(snapshot()))));
        draw(&mut app);
        app.open_menu_for_selected();
        let buf = draw(&mut app);

        let menu = app.menu_area.unwrap();
        let text: String = (menu.y..menu.y + menu.height).map(|y| row(&buf, y)).collect();
        assert!(text.contains("Rename"));
        assert!(text.contains("Refresh"));
        assert!(!text.contains("Open"));
    }
}
