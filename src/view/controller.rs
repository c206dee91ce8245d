use std::collections::{HashMap, HashSet};

use crate::error::{TreeError, TreeResult};
use crate::tree::index::{ancestors, is_same_or_descendant};
use crate::tree::{FileTreeModel, Node, NodeId, NodeKind};
use crate::view::binder::{ViewBinder, ViewHandle};

/// Which node, if any, is focused.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FocusState {
    #[default]
    Unfocused,
    Focused(String),
}

/// Interaction types a handle can be subscribed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionKind {
    Click,
    ContextMenu,
}

/// A pointer event aimed at a view element, with screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    pub kind: InteractionKind,
    pub target: ViewHandle,
    pub x: u16,
    pub y: u16,
}

type ClickHandler<C> = Box<dyn Fn(&PointerEvent, &Node) -> Option<C>>;
type MenuAction<C> = Box<dyn Fn(&Node, &FileTreeModel) -> Option<C>>;

/// One context-menu entry, tagged with the node variants it applies to.
pub struct MenuItem<C> {
    pub label: String,
    pub applies_to_file: bool,
    pub applies_to_directory: bool,
    action: MenuAction<C>,
}

impl<C> MenuItem<C> {
    pub fn new(
        label: &str,
        applies_to_file: bool,
        applies_to_directory: bool,
        action: impl Fn(&Node, &FileTreeModel) -> Option<C> + 'static,
    ) -> Self {
        Self {
            label: label.to_string(),
            applies_to_file,
            applies_to_directory,
            action: Box::new(action),
        }
    }

    fn applies_to(&self, kind: NodeKind) -> bool {
        match kind {
            NodeKind::File => self.applies_to_file,
            NodeKind::Directory => self.applies_to_directory,
        }
    }
}

/// The open context menu: where it sits, whom it targets, what it offers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextMenu {
    pub x: u16,
    pub y: u16,
    pub target: NodeId,
    /// Indices into the configured item list, already filtered.
    pub items: Vec<usize>,
    pub selected: usize,
}

/// Routes pointer events to nodes and owns focus and context-menu state.
///
/// Handlers return a command of type `C` for the caller to carry out,
/// which keeps the controller free of application state.
pub struct InteractionController<C> {
    focus: FocusState,
    focused_handle: Option<ViewHandle>,
    subscriptions: HashMap<InteractionKind, HashSet<ViewHandle>>,
    click_handler: Option<ClickHandler<C>>,
    menu_items: Vec<MenuItem<C>>,
    menu: Option<ContextMenu>,
}

impl<C> Default for InteractionController<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> InteractionController<C> {
    pub fn new() -> Self {
        Self {
            focus: FocusState::Unfocused,
            focused_handle: None,
            subscriptions: HashMap::new(),
            click_handler: None,
            menu_items: Vec::new(),
            menu: None,
        }
    }

    pub fn on_click(&mut self, handler: impl Fn(&PointerEvent, &Node) -> Option<C> + 'static) {
        self.click_handler = Some(Box::new(handler));
    }

    pub fn add_menu_item(&mut self, item: MenuItem<C>) {
        self.menu_items.push(item);
    }

    /// Subscribe every bound handle once per interaction type.
    ///
    /// Call after a mount pass; handles that no longer exist are dropped.
    pub fn wire(&mut self, binder: &ViewBinder) {
        for kind in [InteractionKind::Click, InteractionKind::ContextMenu] {
            let handles = self.subscriptions.entry(kind).or_default();
            handles.clear();
            handles.extend(binder.bound_handles());
        }
    }

    pub fn is_subscribed(&self, kind: InteractionKind, handle: ViewHandle) -> bool {
        self.subscriptions
            .get(&kind)
            .map(|s| s.contains(&handle))
            .unwrap_or(false)
    }

    pub fn focus_state(&self) -> &FocusState {
        &self.focus
    }

    pub fn focused_path(&self) -> Option<&str> {
        match &self.focus {
            FocusState::Focused(path) => Some(path),
            FocusState::Unfocused => None,
        }
    }

    /// Focus the file at `rel_path`, opening every ancestor directory.
    pub fn focus(
        &mut self,
        model: &FileTreeModel,
        binder: &mut ViewBinder,
        rel_path: &str,
    ) -> TreeResult<()> {
        let node = model.lookup(rel_path).map_err(|e| match e {
            TreeError::NotADirectory(_) => TreeError::NotFound(rel_path.to_string()),
            other => other,
        })?;
        if !node.is_file() {
            return Err(TreeError::NotAFile(rel_path.to_string()));
        }
        let handle = binder
            .handle_for(node.id())
            .ok_or_else(|| TreeError::NotFound(rel_path.to_string()))?;

        for dir in ancestors(rel_path) {
            if let Some(h) = model.id_of(&dir).and_then(|id| binder.handle_for(id)) {
                binder.set_open(h, true);
            }
        }

        if let Some(previous) = self.focused_handle.take() {
            binder.set_focused(previous, false);
        }
        binder.set_focused(handle, true);
        self.focused_handle = Some(handle);
        self.focus = FocusState::Focused(rel_path.to_string());
        Ok(())
    }

    pub fn clear_focus(&mut self, binder: &mut ViewBinder) {
        if let Some(previous) = self.focused_handle.take() {
            binder.set_focused(previous, false);
        }
        self.focus = FocusState::Unfocused;
    }

    /// Keep the focused path in step with a rename of `old` (or an ancestor).
    pub fn path_moved(&mut self, old: &str, new: &str) {
        if let FocusState::Focused(path) = &mut self.focus {
            if is_same_or_descendant(path, old) {
                *path = format!("{}{}", new, &path[old.len()..]);
            }
        }
    }

    /// Drop focus if it sat at or under a removed path.
    pub fn path_removed(&mut self, removed: &str) {
        let gone = matches!(&self.focus, FocusState::Focused(path) if is_same_or_descendant(path, removed));
        if gone {
            self.focus = FocusState::Unfocused;
            self.focused_handle = None;
        }
    }

    /// Flip the open state of a directory's element.
    pub fn toggle_open(&self, binder: &mut ViewBinder, id: NodeId) {
        if let Some(handle) = binder.handle_for(id) {
            let open = binder.element(handle).map(|e| e.open).unwrap_or(false);
            binder.set_open(handle, !open);
        }
    }

    /// Resolve a click to its node and hand it to the click handler.
    ///
    /// Any click first tears down an open context menu.
    pub fn dispatch_click(
        &mut self,
        model: &FileTreeModel,
        binder: &ViewBinder,
        event: &PointerEvent,
    ) -> Option<C> {
        self.close_menu();
        let node = self.resolve(model, binder, InteractionKind::Click, event.target)?;
        let handler = self.click_handler.as_ref()?;
        handler(event, node)
    }

    /// Open the context menu for the node owning `event.target`.
    ///
    /// Returns `false` when the target has no node or no item applies.
    pub fn open_menu(
        &mut self,
        model: &FileTreeModel,
        binder: &ViewBinder,
        event: &PointerEvent,
    ) -> bool {
        self.close_menu();
        let Some(node) = self.resolve(model, binder, InteractionKind::ContextMenu, event.target)
        else {
            return false;
        };
        let items: Vec<usize> = self
            .menu_items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.applies_to(node.kind()))
            .map(|(i, _)| i)
            .collect();
        if items.is_empty() {
            return false;
        }
        self.menu = Some(ContextMenu {
            x: event.x,
            y: event.y,
            target: node.id(),
            items,
            selected: 0,
        });
        true
    }

    pub fn menu(&self) -> Option<&ContextMenu> {
        self.menu.as_ref()
    }

    /// Labels of the open menu's items, in display order.
    pub fn menu_labels(&self) -> Vec<&str> {
        match &self.menu {
            Some(menu) => menu
                .items
                .iter()
                .filter_map(|i| self.menu_items.get(*i))
                .map(|item| item.label.as_str())
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn menu_select_next(&mut self) {
        if let Some(menu) = &mut self.menu {
            if menu.selected + 1 < menu.items.len() {
                menu.selected += 1;
            }
        }
    }

    pub fn menu_select_previous(&mut self) {
        if let Some(menu) = &mut self.menu {
            menu.selected = menu.selected.saturating_sub(1);
        }
    }

    /// Run the item at `position` in the open menu, then close the menu.
    ///
    /// The target is re-resolved first; if it left the tree meanwhile,
    /// nothing runs.
    pub fn choose(&mut self, model: &FileTreeModel, position: usize) -> Option<C> {
        let menu = self.menu.take()?;
        let item = self.menu_items.get(*menu.items.get(position)?)?;
        let node = model.lookup_id(menu.target)?;
        (item.action)(node, model)
    }

    /// Run the highlighted item of the open menu.
    pub fn choose_selected(&mut self, model: &FileTreeModel) -> Option<C> {
        let position = self.menu.as_ref()?.selected;
        self.choose(model, position)
    }

    pub fn close_menu(&mut self) {
        self.menu = None;
    }

    fn resolve<'m>(
        &self,
        model: &'m FileTreeModel,
        binder: &ViewBinder,
        kind: InteractionKind,
        target: ViewHandle,
    ) -> Option<&'m Node> {
        let owner = binder.owning_handle(target)?;
        if !self.is_subscribed(kind, owner) {
            return None;
        }
        model.lookup_id(binder.node_for(owner)?)
    }
}
