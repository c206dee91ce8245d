use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::{Position, Rect};

use crate::app::{App, AppMode, DialogKind, Pane};
use crate::view::{InteractionKind, PointerEvent};

/// Sidebar columns gained or lost per `<`/`>` press.
const SIDEBAR_STEP: i32 = 2;

/// Handle a key event.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }
    if key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL) {
        let sent = app.flush_writes().len();
        if sent > 0 {
            app.set_status(format!("Saving {} note(s)…", sent));
        }
        return;
    }

    if let AppMode::Dialog(kind) = &app.mode {
        let kind = kind.clone();
        handle_dialog_key(app, &kind, key);
        return;
    }
    if app.controller.menu().is_some() {
        handle_menu_key(app, key);
        return;
    }
    match app.pane {
        Pane::Tree => handle_tree_key(app, key),
        Pane::Editor => handle_editor_key(app, key),
    }
}

fn handle_dialog_key(app: &mut App, kind: &DialogKind, key: KeyEvent) {
    match kind {
        DialogKind::Rename { .. } => match key.code {
            KeyCode::Enter => app.submit_dialog(),
            KeyCode::Esc => app.close_dialog(),
            KeyCode::Backspace => app.dialog_delete_char(),
            KeyCode::Left => app.dialog_move_cursor_left(),
            KeyCode::Right => app.dialog_move_cursor_right(),
            KeyCode::Home => app.dialog_cursor_home(),
            KeyCode::End => app.dialog_cursor_end(),
            KeyCode::Char(c) => app.dialog_input_char(c),
            _ => {}
        },
        DialogKind::DeleteConfirm { .. } => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.submit_dialog(),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.close_dialog(),
            _ => {}
        },
        DialogKind::Error { .. } => {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                app.close_dialog();
            }
        }
    }
}

fn handle_menu_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => app.controller.menu_select_previous(),
        KeyCode::Down | KeyCode::Char('j') => app.controller.menu_select_next(),
        KeyCode::Enter => app.choose_menu_item(None),
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('m') => app.controller.close_menu(),
        _ => {}
    }
}

fn handle_tree_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
        KeyCode::Home | KeyCode::Char('g') => app.select_first(),
        KeyCode::End | KeyCode::Char('G') => app.select_last(),
        KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => app.activate_selected(),
        KeyCode::Char('m') => app.open_menu_for_selected(),
        KeyCode::Char('r') => app.request_tree(),
        KeyCode::Char('<') => app.resize_sidebar(-SIDEBAR_STEP),
        KeyCode::Char('>') => app.resize_sidebar(SIDEBAR_STEP),
        KeyCode::Tab => app.toggle_pane(),
        _ => {}
    }
}

fn handle_editor_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Tab => app.toggle_pane(),
        KeyCode::Enter => app.edit(|e| e.insert_newline()),
        KeyCode::Backspace => app.edit(|e| e.delete_char_before()),
        KeyCode::Delete => app.edit(|e| e.delete_char_at()),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.edit(|e| e.insert_char(c))
        }
        KeyCode::Up => app.editor.move_up(),
        KeyCode::Down => app.editor.move_down(),
        KeyCode::Left => app.editor.move_left(),
        KeyCode::Right => app.editor.move_right(),
        KeyCode::Home => app.editor.move_home(),
        KeyCode::End => app.editor.move_end(),
        KeyCode::PageUp => app.editor.page_up(),
        KeyCode::PageDown => app.editor.page_down(),
        _ => {}
    }
}

/// Handle a mouse event. Dialogs swallow the mouse.
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    if matches!(app.mode, AppMode::Dialog(_)) {
        return;
    }
    let (x, y) = (mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if let Some(menu) = app.menu_area.filter(|m| contains(*m, x, y)) {
                // One row of border above the first item.
                let item = y.saturating_sub(menu.y + 1) as usize;
                app.choose_menu_item(Some(item));
                return;
            }
            if let Some((index, row)) = app.row_at(x, y) {
                app.selected = index;
                app.pane = Pane::Tree;
                app.click(PointerEvent {
                    kind: InteractionKind::Click,
                    target: row.target,
                    x,
                    y,
                });
                return;
            }
            app.controller.close_menu();
            if contains(app.editor_area, x, y) && app.editor.is_attached() {
                app.pane = Pane::Editor;
            }
        }
        MouseEventKind::Down(MouseButton::Right) => {
            if let Some((index, row)) = app.row_at(x, y) {
                app.selected = index;
                app.open_context_menu(PointerEvent {
                    kind: InteractionKind::ContextMenu,
                    target: row.target,
                    x,
                    y,
                });
            } else {
                app.controller.close_menu();
            }
        }
        MouseEventKind::ScrollDown if contains(app.tree_area, x, y) => app.select_next(),
        MouseEventKind::ScrollUp if contains(app.tree_area, x, y) => app.select_previous(),
        MouseEventKind::ScrollDown if contains(app.editor_area, x, y) => app.editor.move_down(),
        MouseEventKind::ScrollUp if contains(app.editor_area, x, y) => app.editor.move_up(),
        _ => {}
    }
}

fn contains(area: Rect, x: u16, y: u16) -> bool {
    area.contains(Position::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::event::Event;
    use crate::prefs::Prefs;
    use crate::sync::mock::{Method, MockTransport};
    use crate::sync::SyncClient;
    use crossterm::event::KeyEventState;
    use std::sync::Arc;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    const TREE: &str = r#"{"data": {"type": "directory", "name": "root", "rel_path": "", "children": {
        "a.md": {"type": "file", "name": "a.md", "rel_path": "a.md"},
        "notes": {"type": "directory", "name": "notes", "rel_path": "notes", "children": {
            "b.md": {"type": "file", "name": "b.md", "rel_path": "notes/b.md"}}}}}}"#;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: crossterm::event::KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent {
            modifiers: KeyModifiers::CONTROL,
            ..key(KeyCode::Char(c))
        }
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    async fn loaded_app() -> (App, UnboundedReceiver<Event>, Arc<MockTransport>) {
        let mock = Arc::new(MockTransport::new());
        mock.reply(Method::Get, "/files", 200, TREE);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = App::new(
            &AppConfig::default(),
            SyncClient::new(mock.clone()),
            Prefs::load(None, (16, 80), 32),
            tx,
        );
        app.tree_area = Rect::new(1, 1, 30, 20);
        app.editor_area = Rect::new(33, 1, 40, 20);
        app.request_tree();
        next_sync(&mut app, &mut rx).await;
        (app, rx, mock)
    }

    async fn next_sync(app: &mut App, rx: &mut UnboundedReceiver<Event>) {
        while let Some(event) = rx.recv().await {
            if let Event::Sync(sync) = event {
                app.apply_sync(sync);
                return;
            }
        }
    }

    #[tokio::test]
    async fn test_q_quits_from_tree_but_types_in_editor() {
        let (mut app, mut rx, mock) = loaded_app().await;
        mock.reply(Method::Get, "/files/a.md", 200, "");
        app.open_file("a.md");
        next_sync(&mut app, &mut rx).await;

        handle_key_event(&mut app, key(KeyCode::Tab));
        assert_eq!(app.pane, Pane::Editor);
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(!app.should_quit);
        assert_eq!(app.editor.content(), "q");

        handle_key_event(&mut app, key(KeyCode::Esc));
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_ctrl_c_quits_anywhere() {
        let (mut app, _rx, _mock) = loaded_app().await;
        app.open_dialog(DialogKind::Rename {
            path: "a.md".into(),
        });
        handle_key_event(&mut app, ctrl('c'));
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_tab_stays_in_tree_without_a_note() {
        let (mut app, _rx, _mock) = loaded_app().await;
        handle_key_event(&mut app, key(KeyCode::Tab));
        assert_eq!(app.pane, Pane::Tree);
    }

    #[tokio::test]
    async fn test_menu_keys() {
        let (mut app, _rx, _mock) = loaded_app().await;
        handle_key_event(&mut app, key(KeyCode::Char('m')));
        assert!(app.controller.menu().is_some());

        // Tree keys are not reachable while the menu is up.
        handle_key_event(&mut app, key(KeyCode::Char('j')));
        assert_eq!(app.selected, 0);
        assert_eq!(app.controller.menu().map(|m| m.selected), Some(1));

        handle_key_event(&mut app, key(KeyCode::Enter));
        assert_eq!(
            app.mode,
            AppMode::Dialog(DialogKind::DeleteConfirm {
                path: "notes".into()
            })
        );
        handle_key_event(&mut app, key(KeyCode::Char('n')));
        assert_eq!(app.mode, AppMode::Normal);
    }

    #[tokio::test]
    async fn test_rename_dialog_typing() {
        let (mut app, _rx, _mock) = loaded_app().await;
        app.open_dialog(DialogKind::Rename {
            path: "a.md".into(),
        });
        for _ in 0..3 {
            handle_key_event(&mut app, key(KeyCode::Backspace));
        }
        handle_key_event(&mut app, key(KeyCode::Char('x')));
        assert_eq!(app.dialog_state.input, "ax");
        handle_key_event(&mut app, key(KeyCode::Esc));
        assert_eq!(app.mode, AppMode::Normal);
    }

    #[tokio::test]
    async fn test_sidebar_keys() {
        let (mut app, _rx, _mock) = loaded_app().await;
        handle_key_event(&mut app, key(KeyCode::Char('>')));
        assert_eq!(app.sidebar_width(), 34);
        handle_key_event(&mut app, key(KeyCode::Char('<')));
        handle_key_event(&mut app, key(KeyCode::Char('<')));
        assert_eq!(app.sidebar_width(), 30);
    }

    #[tokio::test]
    async fn test_left_click_on_directory_row_toggles_it() {
        let (mut app, _rx, _mock) = loaded_app().await;
        handle_mouse_event(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 5, 1));
        assert_eq!(app.visible_rows().len(), 3);
        handle_mouse_event(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 5, 1));
        assert_eq!(app.visible_rows().len(), 2);
    }

    #[tokio::test]
    async fn test_right_click_opens_menu_and_outside_click_closes_it() {
        let (mut app, _rx, _mock) = loaded_app().await;
        handle_mouse_event(&mut app, mouse(MouseEventKind::Down(MouseButton::Right), 5, 2));
        let menu = app.controller.menu().cloned().unwrap();
        assert_eq!((menu.x, menu.y), (5, 2));
        assert_eq!(app.selected, 1);
        assert_eq!(app.controller.menu_labels(), vec!["Open", "Rename", "Delete"]);

        handle_mouse_event(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 60, 30));
        assert!(app.controller.menu().is_none());
    }

    #[tokio::test]
    async fn test_click_on_menu_item_runs_it() {
        let (mut app, _rx, _mock) = loaded_app().await;
        handle_mouse_event(&mut app, mouse(MouseEventKind::Down(MouseButton::Right), 5, 2));
        app.menu_area = Some(Rect::new(5, 3, 12, 5));
        handle_mouse_event(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 7, 5));
        assert_eq!(
            app.mode,
            AppMode::Dialog(DialogKind::Rename {
                path: "a.md".into()
            })
        );
    }

    #[tokio::test]
    async fn test_mouse_is_ignored_under_a_dialog() {
        let (mut app, _rx, _mock) = loaded_app().await;
        app.open_dialog(DialogKind::Error {
            message: "boom".into(),
        });
        handle_mouse_event(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 5, 1));
        assert_eq!(app.visible_rows().len(), 2);
    }
}
