use std::future::Future;
use std::time::{Duration, Instant};

use ratatui::layout::Rect;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::editor::EditorState;
use crate::event::{Event, SyncEvent};
use crate::prefs::Prefs;
use crate::sync::{Outcome, SyncClient, WriteScheduler, WriteStatus};
use crate::theme::{resolve_theme, ThemeColors};
use crate::tree::index::{is_same_or_descendant, join, split_parent, validate_name};
use crate::tree::{FileTreeModel, NodeId, Snapshot};
use crate::view::{
    InteractionController, InteractionKind, MenuItem, PointerEvent, Row, ViewBinder,
};

/// What a tree interaction asks the application to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    OpenFile(String),
    ToggleDir(NodeId),
    StartRename(String),
    ConfirmDelete(String),
    Refresh,
}

/// The kind of dialog being displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogKind {
    Rename { path: String },
    DeleteConfirm { path: String },
    Error { message: String },
}

/// Application mode.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum AppMode {
    #[default]
    Normal,
    Dialog(DialogKind),
}

/// Which pane receives keys.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    #[default]
    Tree,
    Editor,
}

/// State for a dialog's text input.
#[derive(Debug, Default)]
pub struct DialogState {
    pub input: String,
    /// Byte offset into `input`, always on a char boundary.
    pub cursor_position: usize,
}

/// A transient message in the status bar.
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
    created: Instant,
}

const STATUS_TTL: Duration = Duration::from_secs(3);
const ERROR_TTL: Duration = Duration::from_secs(6);

/// Main application state.
///
/// Owns the tree model, its view binding, the interaction controller, the
/// editor surface and the sync machinery. Sync calls run on spawned tasks
/// and come back through `apply_sync`; nothing else mutates the tree.
pub struct App {
    /// `None` until a snapshot has loaded; the tree pane shows a placeholder.
    pub model: Option<FileTreeModel>,
    pub binder: ViewBinder,
    pub controller: InteractionController<Command>,
    pub editor: EditorState,
    pub client: SyncClient,
    pub scheduler: WriteScheduler,
    pub prefs: Prefs,
    pub theme: ThemeColors,
    pub mode: AppMode,
    pub dialog_state: DialogState,
    pub status_message: Option<StatusMessage>,
    pub pane: Pane,
    /// Index into the visible tree rows.
    pub selected: usize,
    pub scroll_offset: usize,
    /// Why the tree is unavailable, shown in the placeholder.
    pub tree_error: Option<String>,
    pub loading: bool,
    /// File to open once the first tree has loaded.
    pub initial_file: Option<String>,
    /// The read whose result the editor is waiting for.
    pub pending_read: Option<String>,
    /// Screen areas from the last draw, for mouse hit-testing.
    pub tree_area: Rect,
    pub editor_area: Rect,
    pub menu_area: Option<Rect>,
    pub should_quit: bool,
    event_tx: UnboundedSender<Event>,
}

impl App {
    pub fn new(
        config: &AppConfig,
        client: SyncClient,
        prefs: Prefs,
        event_tx: UnboundedSender<Event>,
    ) -> Self {
        let write_tx = event_tx.clone();
        let scheduler = WriteScheduler::new(
            client.clone(),
            config.write_debounce(),
            move |path, result| {
                let _ = write_tx.send(Event::Sync(SyncEvent::FileWritten { path, result }));
            },
        );
        Self {
            model: None,
            binder: ViewBinder::new(),
            controller: build_controller(),
            editor: EditorState::new(),
            client,
            scheduler,
            prefs,
            theme: resolve_theme(&config.theme),
            mode: AppMode::Normal,
            dialog_state: DialogState::default(),
            status_message: None,
            pane: Pane::Tree,
            selected: 0,
            scroll_offset: 0,
            tree_error: None,
            loading: false,
            initial_file: None,
            pending_read: None,
            tree_area: Rect::default(),
            editor_area: Rect::default(),
            menu_area: None,
            should_quit: false,
            event_tx,
        }
    }

    // ── Sync requests ─────────────────────────────────────────────────

    /// Fetch the tree snapshot; the result arrives as `SyncEvent::TreeLoaded`.
    pub fn request_tree(&mut self) {
        self.loading = true;
        let client = self.client.clone();
        self.spawn_sync(async move { SyncEvent::TreeLoaded(client.fetch_tree().await) });
    }

    /// Focus the file at `rel_path` and load its content into the editor.
    pub fn open_file(&mut self, rel_path: &str) {
        let Some(model) = &self.model else {
            return;
        };
        if let Err(e) = self.controller.focus(model, &mut self.binder, rel_path) {
            self.set_error(e.to_string());
            return;
        }
        self.select_path(rel_path);
        self.pending_read = Some(rel_path.to_string());

        let client = self.client.clone();
        let path = rel_path.to_string();
        self.spawn_sync(async move {
            let result = client.read_file(&path).await;
            SyncEvent::FileLoaded { path, result }
        });
    }

    pub fn request_rename(&mut self, rel_path: &str, new_name: &str) {
        let client = self.client.clone();
        let path = rel_path.to_string();
        let new_name = new_name.to_string();
        self.set_status(format!("Renaming {}…", path));
        self.spawn_sync(async move {
            let result = client.rename_file(&path, &new_name).await;
            SyncEvent::Renamed { path, result }
        });
    }

    pub fn request_delete(&mut self, rel_path: &str) {
        let client = self.client.clone();
        let path = rel_path.to_string();
        self.set_status(format!("Deleting {}…", path));
        self.spawn_sync(async move {
            let result = client.delete_file(&path).await;
            SyncEvent::Deleted { path, result }
        });
    }

    fn spawn_sync<F>(&self, call: F)
    where
        F: Future<Output = SyncEvent> + Send + 'static,
    {
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let event = call.await;
            let _ = tx.send(Event::Sync(event));
        });
    }

    // ── Sync results ──────────────────────────────────────────────────

    /// Apply a settled sync call. The only entry point for server-driven
    /// tree changes.
    pub fn apply_sync(&mut self, event: SyncEvent) {
        match event {
            SyncEvent::TreeLoaded(result) => self.on_tree_loaded(result),
            SyncEvent::FileLoaded { path, result } => self.on_file_loaded(path, result),
            SyncEvent::FileWritten { path, result } => self.on_file_written(path, result),
            SyncEvent::Renamed { path, result } => self.on_renamed(path, result),
            SyncEvent::Deleted { path, result } => self.on_deleted(path, result),
        }
    }

    fn on_tree_loaded(&mut self, result: Outcome<Option<Snapshot>>) {
        self.loading = false;
        let built = result.map_err(|e| e.to_string()).and_then(|data| {
            FileTreeModel::build_from_data(data.as_ref()).map_err(|e| e.to_string())
        });
        match built {
            Ok(model) => self.install_model(model),
            Err(message) => {
                warn!(error = %message, "tree unavailable");
                // A refresh that fails keeps the last good tree.
                if self.model.is_none() {
                    self.tree_error = Some(message.clone());
                }
                self.set_error(message);
            }
        }
    }

    /// Swap in a freshly built model, keeping open directories and focus
    /// where their paths survived.
    fn install_model(&mut self, model: FileTreeModel) {
        let open = self.open_dirs_under("");
        let focused = self.controller.focused_path().map(str::to_string);

        self.controller.clear_focus(&mut self.binder);
        self.binder.clear();
        if let Err(e) = self.binder.mount(&model, model.root()) {
            warn!(error = %e, "could not mount tree");
        }
        self.controller.wire(&self.binder);
        reopen(&mut self.binder, &model, &open);
        info!(nodes = model.len(), "tree loaded");

        let model = self.model.insert(model);
        self.tree_error = None;

        if let Some(path) = focused {
            if model.lookup(&path).map(|n| n.is_file()).unwrap_or(false) {
                let _ = self.controller.focus(model, &mut self.binder, &path);
            }
        }
        if let Some(path) = self.editor.path.clone() {
            if !model.contains(&path) {
                info!(path = %path, "open note vanished from the tree");
                self.scheduler.cancel(&path);
                self.editor.close();
            }
        }
        if let Some(path) = self.initial_file.take() {
            self.open_file(&path);
        }
        self.clamp_selection();
    }

    fn on_file_loaded(&mut self, path: String, result: Outcome<String>) {
        if self.pending_read.as_deref() != Some(path.as_str()) {
            debug!(path = %path, "ignoring stale read");
            return;
        }
        self.pending_read = None;
        match result {
            Ok(content) => {
                self.editor.replace_all(&path, &content);
                debug!(path = %path, "loaded note");
            }
            // The editor keeps showing whatever it had.
            Err(e) => self.set_error(format!("{}: {}", path, e)),
        }
    }

    fn on_file_written(&mut self, path: String, result: Outcome<WriteStatus>) {
        self.scheduler.settled(&path);
        match result {
            Ok(WriteStatus::Written) => self.set_status(format!("Saved {}", path)),
            Ok(WriteStatus::Superseded) => {}
            Err(e) => self.set_error(format!("{}: {}", path, e)),
        }
    }

    fn on_renamed(&mut self, path: String, result: Outcome<Snapshot>) {
        let canonical = match result {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.set_error(e.to_string());
                return;
            }
        };
        let Some(model) = self.model.as_mut() else {
            return;
        };
        let new_path = match model.rename(&path, canonical.name()) {
            Ok(p) => p,
            Err(e) => {
                warn!(path = %path, error = %e, "server rename does not fit the local tree");
                self.set_error(e.to_string());
                self.request_tree();
                return;
            }
        };
        if let Ok(node) = model.lookup(&new_path) {
            if let Err(e) = self.binder.relabel(node) {
                warn!(path = %new_path, error = %e, "could not relabel");
            }
        }
        self.controller.path_moved(&path, &new_path);
        self.scheduler.path_moved(&path, &new_path);
        if let Some(editing) = self.editor.path.clone() {
            if is_same_or_descendant(&editing, &path) {
                self.editor
                    .retarget(&format!("{}{}", new_path, &editing[path.len()..]));
            }
        }
        if let Some(reading) = self.pending_read.as_mut() {
            if is_same_or_descendant(reading, &path) {
                *reading = format!("{}{}", new_path, &reading[path.len()..]);
            }
        }

        self.adopt_canonical(&new_path, &canonical);
        self.set_status(format!("Renamed to {}", canonical.name()));
    }

    /// Replace the node at `rel_path` with the server's version of it.
    ///
    /// If the model rejects the snapshot, the node stays as it was and is
    /// mounted again.
    fn adopt_canonical(&mut self, rel_path: &str, canonical: &Snapshot) {
        let open = self.open_dirs_under(rel_path);
        let focused = self.controller.focused_path().map(str::to_string);
        let Some(model) = self.model.as_mut() else {
            return;
        };
        let Ok(old) = model.lookup(rel_path) else {
            return;
        };
        if let Err(e) = self.binder.unmount(old) {
            warn!(path = %rel_path, error = %e, "could not unmount");
        }

        if let Err(e) = model.replace(rel_path, canonical) {
            warn!(path = %rel_path, error = %e, "keeping local node");
        }
        let model: &FileTreeModel = model;
        if let Ok(node) = model.lookup(rel_path) {
            if let Err(e) = self.binder.mount(model, node) {
                warn!(path = %rel_path, error = %e, "could not mount");
            }
        }
        self.controller.wire(&self.binder);
        reopen(&mut self.binder, model, &open);

        if let Some(path) = focused.filter(|f| is_same_or_descendant(f, rel_path)) {
            if model.lookup(&path).map(|n| n.is_file()).unwrap_or(false) {
                let _ = self.controller.focus(model, &mut self.binder, &path);
            } else {
                self.controller.path_removed(&path);
            }
        }
        self.clamp_selection();
    }

    fn on_deleted(&mut self, path: String, result: Outcome<()>) {
        if let Err(e) = result {
            self.set_error(e.to_string());
            return;
        }
        let Some(model) = self.model.as_mut() else {
            return;
        };
        let Ok(node) = model.lookup(&path) else {
            debug!(path = %path, "deleted node already gone");
            return;
        };
        if let Err(e) = self.binder.unmount(node) {
            warn!(path = %path, error = %e, "could not unmount");
        }
        if let Err(e) = model.remove(&path) {
            warn!(path = %path, error = %e, "could not remove");
        }
        self.controller.path_removed(&path);
        self.controller.wire(&self.binder);
        self.scheduler.cancel(&path);
        if self
            .editor
            .path
            .as_deref()
            .is_some_and(|p| is_same_or_descendant(p, &path))
        {
            self.editor.close();
        }
        if self
            .pending_read
            .as_deref()
            .is_some_and(|p| is_same_or_descendant(p, &path))
        {
            self.pending_read = None;
        }
        self.clamp_selection();
        self.set_status(format!("Deleted {}", path));
    }

    /// Paths of open directories at or under `rel_path`.
    fn open_dirs_under(&self, rel_path: &str) -> Vec<String> {
        let Some(model) = &self.model else {
            return Vec::new();
        };
        self.binder
            .bound_handles()
            .filter(|h| self.binder.element(*h).map(|e| e.open).unwrap_or(false))
            .filter_map(|h| self.binder.node_for(h))
            .filter_map(|id| model.path_of(id))
            .filter(|p| is_same_or_descendant(p, rel_path))
            .map(str::to_string)
            .collect()
    }

    // ── Tree interaction ──────────────────────────────────────────────

    pub fn visible_rows(&self) -> Vec<Row> {
        self.binder.visible_rows()
    }

    /// Carry out what a click or menu item asked for.
    pub fn run(&mut self, command: Command) {
        debug!(?command, "running command");
        match command {
            Command::OpenFile(path) => self.open_file(&path),
            Command::ToggleDir(id) => {
                self.controller.toggle_open(&mut self.binder, id);
                self.clamp_selection();
            }
            Command::StartRename(path) => self.open_dialog(DialogKind::Rename { path }),
            Command::ConfirmDelete(path) => self.open_dialog(DialogKind::DeleteConfirm { path }),
            Command::Refresh => self.request_tree(),
        }
    }

    pub fn click(&mut self, event: PointerEvent) {
        let Some(model) = &self.model else {
            return;
        };
        if let Some(command) = self.controller.dispatch_click(model, &self.binder, &event) {
            self.run(command);
        }
    }

    pub fn open_context_menu(&mut self, event: PointerEvent) {
        let Some(model) = &self.model else {
            return;
        };
        self.controller.open_menu(model, &self.binder, &event);
    }

    /// Click the selected row, as Enter does.
    pub fn activate_selected(&mut self) {
        if let Some(event) = self.pointer_at_selected(InteractionKind::Click) {
            self.click(event);
        }
    }

    /// Open the context menu beside the selected row.
    pub fn open_menu_for_selected(&mut self) {
        if let Some(event) = self.pointer_at_selected(InteractionKind::ContextMenu) {
            self.open_context_menu(event);
        }
    }

    fn pointer_at_selected(&self, kind: InteractionKind) -> Option<PointerEvent> {
        let row = self.visible_rows().get(self.selected)?.clone();
        let line = self.selected.saturating_sub(self.scroll_offset) as u16;
        Some(PointerEvent {
            kind,
            target: row.target,
            x: self.tree_area.x + (row.depth as u16 + 1) * 3,
            y: self.tree_area.y + line,
        })
    }

    /// Run the menu item at `position`, or the highlighted one.
    pub fn choose_menu_item(&mut self, position: Option<usize>) {
        let Some(model) = &self.model else {
            self.controller.close_menu();
            return;
        };
        let command = match position {
            Some(p) => self.controller.choose(model, p),
            None => self.controller.choose_selected(model),
        };
        if let Some(command) = command {
            self.run(command);
        }
    }

    /// Tree row under a screen cell, with its index.
    pub fn row_at(&self, column: u16, row: u16) -> Option<(usize, Row)> {
        let area = self.tree_area;
        if column < area.x
            || column >= area.x + area.width
            || row < area.y
            || row >= area.y + area.height
        {
            return None;
        }
        let index = self.scroll_offset + (row - area.y) as usize;
        self.visible_rows().get(index).cloned().map(|r| (index, r))
    }

    pub fn select_next(&mut self) {
        let len = self.visible_rows().len();
        if len > 0 && self.selected < len - 1 {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.visible_rows().len().saturating_sub(1);
    }

    fn select_path(&mut self, rel_path: &str) {
        let Some(handle) = self
            .model
            .as_ref()
            .and_then(|m| m.id_of(rel_path))
            .and_then(|id| self.binder.handle_for(id))
        else {
            return;
        };
        if let Some(i) = self.visible_rows().iter().position(|r| r.owner == handle) {
            self.selected = i;
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_rows().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    /// Keep the selected row inside a viewport of `visible_height` rows.
    pub fn update_scroll(&mut self, visible_height: usize) {
        if visible_height == 0 {
            return;
        }
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + visible_height {
            self.scroll_offset = self.selected + 1 - visible_height;
        }
    }

    // ── Editor ────────────────────────────────────────────────────────

    /// Apply an edit; if it changed the buffer, schedule a write.
    pub fn edit(&mut self, apply: impl FnOnce(&mut EditorState) -> bool) {
        if apply(&mut self.editor) {
            if let Some(path) = self.editor.path.clone() {
                self.scheduler.schedule(&path, self.editor.content());
            }
        }
    }

    pub fn toggle_pane(&mut self) {
        self.pane = match self.pane {
            Pane::Tree if self.editor.is_attached() => Pane::Editor,
            _ => Pane::Tree,
        };
    }

    // ── Sidebar ───────────────────────────────────────────────────────

    pub fn sidebar_width(&self) -> u16 {
        self.prefs.sidebar_width()
    }

    /// Widen (positive) or narrow the sidebar and persist the result.
    pub fn resize_sidebar(&mut self, delta: i32) {
        let target = (i32::from(self.prefs.sidebar_width()) + delta).clamp(0, i32::from(u16::MAX));
        match self.prefs.save_sidebar_width(target as u16) {
            Ok(width) => debug!(width, "sidebar resized"),
            Err(e) => self.set_error(format!("could not save sidebar width: {}", e)),
        }
    }

    // ── Dialogs ───────────────────────────────────────────────────────

    /// Open a dialog of the given kind. Rename starts with the current name.
    pub fn open_dialog(&mut self, kind: DialogKind) {
        self.dialog_state = DialogState::default();
        if let DialogKind::Rename { path } = &kind {
            let (_, name) = split_parent(path);
            self.dialog_state.input = name.to_string();
            self.dialog_state.cursor_position = name.len();
        }
        self.mode = AppMode::Dialog(kind);
    }

    pub fn close_dialog(&mut self) {
        self.mode = AppMode::Normal;
        self.dialog_state = DialogState::default();
    }

    /// Confirm the open dialog.
    pub fn submit_dialog(&mut self) {
        let AppMode::Dialog(kind) = self.mode.clone() else {
            return;
        };
        match kind {
            DialogKind::Rename { path } => {
                let new_name = self.dialog_state.input.trim().to_string();
                let (parent, old_name) = split_parent(&path);
                if new_name == old_name {
                    self.close_dialog();
                    return;
                }
                if let Err(e) = validate_name(&new_name) {
                    self.open_dialog(DialogKind::Error {
                        message: e.to_string(),
                    });
                    return;
                }
                let taken = self
                    .model
                    .as_ref()
                    .is_some_and(|m| m.contains(&join(parent, &new_name)));
                if taken {
                    self.open_dialog(DialogKind::Error {
                        message: format!("{} already exists", new_name),
                    });
                    return;
                }
                self.close_dialog();
                self.request_rename(&path, &new_name);
            }
            DialogKind::DeleteConfirm { path } => {
                self.close_dialog();
                self.request_delete(&path);
            }
            DialogKind::Error { .. } => self.close_dialog(),
        }
    }

    /// Insert a character at the current cursor position.
    pub fn dialog_input_char(&mut self, c: char) {
        self.dialog_state
            .input
            .insert(self.dialog_state.cursor_position, c);
        self.dialog_state.cursor_position += c.len_utf8();
    }

    /// Delete the character before the cursor (backspace).
    pub fn dialog_delete_char(&mut self) {
        let pos = self.dialog_state.cursor_position;
        if let Some(prev) = self.dialog_state.input[..pos].chars().next_back() {
            self.dialog_state.cursor_position -= prev.len_utf8();
            self.dialog_state
                .input
                .remove(self.dialog_state.cursor_position);
        }
    }

    pub fn dialog_move_cursor_left(&mut self) {
        let pos = self.dialog_state.cursor_position;
        if let Some(prev) = self.dialog_state.input[..pos].chars().next_back() {
            self.dialog_state.cursor_position -= prev.len_utf8();
        }
    }

    pub fn dialog_move_cursor_right(&mut self) {
        let pos = self.dialog_state.cursor_position;
        if let Some(next) = self.dialog_state.input[pos..].chars().next() {
            self.dialog_state.cursor_position += next.len_utf8();
        }
    }

    pub fn dialog_cursor_home(&mut self) {
        self.dialog_state.cursor_position = 0;
    }

    pub fn dialog_cursor_end(&mut self) {
        self.dialog_state.cursor_position = self.dialog_state.input.len();
    }

    // ── Status ────────────────────────────────────────────────────────

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status_message = Some(StatusMessage {
            text: text.into(),
            is_error: false,
            created: Instant::now(),
        });
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        self.status_message = Some(StatusMessage {
            text: text.into(),
            is_error: true,
            created: Instant::now(),
        });
    }

    /// Drop the status message once it has been shown long enough.
    pub fn clear_expired_status(&mut self) {
        if let Some(msg) = &self.status_message {
            let ttl = if msg.is_error { ERROR_TTL } else { STATUS_TTL };
            if msg.created.elapsed() > ttl {
                self.status_message = None;
            }
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────────────

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Send every edit still waiting on its quiet period.
    pub fn flush_writes(&mut self) -> Vec<JoinHandle<()>> {
        self.scheduler.flush()
    }
}

fn build_controller() -> InteractionController<Command> {
    let mut controller = InteractionController::new();
    controller.on_click(|_, node| {
        Some(if node.is_dir() {
            Command::ToggleDir(node.id())
        } else {
            Command::OpenFile(node.rel_path().to_string())
        })
    });
    controller.add_menu_item(MenuItem::new("Open", true, false, |node, _| {
        Some(Command::OpenFile(node.rel_path().to_string()))
    }));
    controller.add_menu_item(MenuItem::new("Rename", true, true, |node, _| {
        Some(Command::StartRename(node.rel_path().to_string()))
    }));
    controller.add_menu_item(MenuItem::new("Delete", true, true, |node, _| {
        Some(Command::ConfirmDelete(node.rel_path().to_string()))
    }));
    controller.add_menu_item(MenuItem::new("Refresh", false, true, |_, _| {
        Some(Command::Refresh)
    }));
    controller
}

fn reopen(binder: &mut ViewBinder, model: &FileTreeModel, paths: &[String]) {
    for path in paths {
        if let Some(handle) = model.id_of(path).and_then(|id| binder.handle_for(id)) {
            binder.set_open(handle, true);
        }
    }
}
