use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::debug;

use crate::error::{TreeError, TreeResult};
use crate::tree::index::split_parent;
use crate::tree::node::display_order;
use crate::tree::{FileTreeModel, Node, NodeId, NodeKind};

/// Opaque reference to one rendered element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewHandle(u32);

/// What an element draws as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementRole {
    /// The tree pane itself. Never bound to a node.
    Container,
    File,
    Directory,
    /// Decorative caption of a directory; events on it belong to the directory.
    Label,
}

/// A rendered element with its display state.
#[derive(Debug, Clone)]
pub struct ViewElement {
    pub role: ElementRole,
    pub text: String,
    pub open: bool,
    pub focused: bool,
    parent: Option<ViewHandle>,
    children: Vec<ViewHandle>,
}

impl ViewElement {
    fn new(role: ElementRole, text: &str, parent: Option<ViewHandle>) -> Self {
        Self {
            role,
            text: text.to_string(),
            open: false,
            focused: false,
            parent,
            children: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<ViewHandle> {
        self.parent
    }

    pub fn children(&self) -> &[ViewHandle] {
        &self.children
    }

    fn sort_kind(&self) -> Option<NodeKind> {
        match self.role {
            ElementRole::File => Some(NodeKind::File),
            ElementRole::Directory => Some(NodeKind::Directory),
            ElementRole::Container | ElementRole::Label => None,
        }
    }
}

/// One visible line of the tree pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Element a pointer event on this line lands on.
    pub target: ViewHandle,
    /// Element bound to the node shown on this line.
    pub owner: ViewHandle,
    pub depth: usize,
    pub is_last_sibling: bool,
}

/// Binds model nodes to view elements and keeps the lookup both ways.
///
/// The model never sees a handle; the binder never holds a node, only
/// its id. `unmount` is the only place both directions are cleared.
#[derive(Debug)]
pub struct ViewBinder {
    elements: HashMap<ViewHandle, ViewElement>,
    next_handle: u32,
    container: ViewHandle,
    node_to_handle: HashMap<NodeId, ViewHandle>,
    handle_to_node: HashMap<ViewHandle, NodeId>,
}

impl Default for ViewBinder {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewBinder {
    pub fn new() -> Self {
        let container = ViewHandle(0);
        let mut elements = HashMap::new();
        elements.insert(container, ViewElement::new(ElementRole::Container, "", None));
        Self {
            elements,
            next_handle: 1,
            container,
            node_to_handle: HashMap::new(),
            handle_to_node: HashMap::new(),
        }
    }

    pub fn container(&self) -> ViewHandle {
        self.container
    }

    /// Number of elements bound to nodes.
    pub fn len(&self) -> usize {
        self.node_to_handle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_to_handle.is_empty()
    }

    pub fn element(&self, handle: ViewHandle) -> Option<&ViewElement> {
        self.elements.get(&handle)
    }

    pub fn handle_for(&self, id: NodeId) -> Option<ViewHandle> {
        self.node_to_handle.get(&id).copied()
    }

    /// The node bound to `handle`, or `None` for elements this binder did
    /// not create for a node (labels, the container, foreign handles).
    pub fn node_for(&self, handle: ViewHandle) -> Option<NodeId> {
        self.handle_to_node.get(&handle).copied()
    }

    pub fn bound_handles(&self) -> impl Iterator<Item = ViewHandle> + '_ {
        self.handle_to_node.keys().copied()
    }

    /// Nearest element at or above `handle` that is bound to a node.
    pub fn owning_handle(&self, handle: ViewHandle) -> Option<ViewHandle> {
        let mut current = Some(handle);
        while let Some(h) = current {
            if self.handle_to_node.contains_key(&h) {
                return Some(h);
            }
            current = self.elements.get(&h)?.parent;
        }
        None
    }

    /// Create elements for `node` and its descendants in display order.
    ///
    /// Mounting the root mounts its children straight into the container.
    pub fn mount(&mut self, model: &FileTreeModel, node: &Node) -> TreeResult<ViewHandle> {
        if node.id() == model.root().id() {
            for child in model.children_sorted(node.rel_path())? {
                self.mount(model, child)?;
            }
            return Ok(self.container);
        }

        if self.node_to_handle.contains_key(&node.id()) {
            return Err(TreeError::DuplicateName(node.rel_path().to_string()));
        }
        let (parent_path, _) = split_parent(node.rel_path());
        let parent = model
            .id_of(parent_path)
            .and_then(|id| {
                if parent_path.is_empty() {
                    Some(self.container)
                } else {
                    self.handle_for(id)
                }
            })
            .ok_or_else(|| TreeError::NotFound(parent_path.to_string()))?;

        let handle = self.create(node, parent);
        self.insert_sorted(parent, handle);
        debug!(path = %node.rel_path(), "mounted");
        Ok(handle)
    }

    /// Destroy the elements of `node` and its descendants.
    ///
    /// Must happen before the node leaves the model.
    pub fn unmount(&mut self, node: &Node) -> TreeResult<()> {
        let handle = self
            .handle_for(node.id())
            .ok_or_else(|| TreeError::NotFound(node.rel_path().to_string()))?;
        if let Some(parent) = self.elements.get(&handle).and_then(|e| e.parent) {
            if let Some(p) = self.elements.get_mut(&parent) {
                p.children.retain(|h| *h != handle);
            }
        }
        self.destroy(handle);
        debug!(path = %node.rel_path(), "unmounted");
        Ok(())
    }

    /// Drop every element except the container.
    pub fn clear(&mut self) {
        let top: Vec<ViewHandle> = self
            .elements
            .get(&self.container)
            .map(|c| c.children.clone())
            .unwrap_or_default();
        for handle in top {
            self.destroy(handle);
        }
        if let Some(c) = self.elements.get_mut(&self.container) {
            c.children.clear();
        }
    }

    /// Refresh the caption of a renamed node and move it to its new sorted slot.
    pub fn relabel(&mut self, node: &Node) -> TreeResult<()> {
        let handle = self
            .handle_for(node.id())
            .ok_or_else(|| TreeError::NotFound(node.rel_path().to_string()))?;
        let (parent, label) = match self.elements.get_mut(&handle) {
            Some(el) => {
                el.text = node.name().to_string();
                (el.parent, el.children.first().copied())
            }
            None => return Err(TreeError::NotFound(node.rel_path().to_string())),
        };
        if node.is_dir() {
            if let Some(label) = label.and_then(|l| self.elements.get_mut(&l)) {
                label.text = node.name().to_string();
            }
        }
        if let Some(parent) = parent {
            if let Some(p) = self.elements.get_mut(&parent) {
                p.children.retain(|h| *h != handle);
            }
            self.insert_sorted(parent, handle);
        }
        Ok(())
    }

    pub fn set_open(&mut self, handle: ViewHandle, open: bool) {
        if let Some(el) = self.elements.get_mut(&handle) {
            if el.role == ElementRole::Directory {
                el.open = open;
            }
        }
    }

    pub fn set_focused(&mut self, handle: ViewHandle, focused: bool) {
        if let Some(el) = self.elements.get_mut(&handle) {
            el.focused = focused;
        }
    }

    /// Lines currently visible: everything under the container, descending
    /// only into open directories.
    pub fn visible_rows(&self) -> Vec<Row> {
        let mut rows = Vec::new();
        self.collect_rows(self.container, 0, &mut rows);
        rows
    }

    fn collect_rows(&self, parent: ViewHandle, depth: usize, rows: &mut Vec<Row>) {
        let Some(el) = self.elements.get(&parent) else {
            return;
        };
        let entries: Vec<ViewHandle> = el
            .children
            .iter()
            .copied()
            .filter(|h| self.handle_to_node.contains_key(h))
            .collect();
        for (i, handle) in entries.iter().enumerate() {
            let Some(child) = self.elements.get(handle) else {
                continue;
            };
            let target = match child.role {
                ElementRole::Directory => child.children.first().copied().unwrap_or(*handle),
                _ => *handle,
            };
            rows.push(Row {
                target,
                owner: *handle,
                depth,
                is_last_sibling: i + 1 == entries.len(),
            });
            if child.role == ElementRole::Directory && child.open {
                self.collect_rows(*handle, depth + 1, rows);
            }
        }
    }

    fn allocate(&mut self) -> ViewHandle {
        let handle = ViewHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }

    fn create(&mut self, node: &Node, parent: ViewHandle) -> ViewHandle {
        let handle = self.allocate();
        let role = match node.kind() {
            NodeKind::File => ElementRole::File,
            NodeKind::Directory => ElementRole::Directory,
        };
        let mut element = ViewElement::new(role, node.name(), Some(parent));

        if node.is_dir() {
            let label = self.allocate();
            self.elements.insert(
                label,
                ViewElement::new(ElementRole::Label, node.name(), Some(handle)),
            );
            element.children.push(label);
        }
        self.elements.insert(handle, element);
        self.node_to_handle.insert(node.id(), handle);
        self.handle_to_node.insert(handle, node.id());

        for child in node.children_in_display_order() {
            let child_handle = self.create(child, handle);
            if let Some(el) = self.elements.get_mut(&handle) {
                el.children.push(child_handle);
            }
        }
        handle
    }

    fn destroy(&mut self, handle: ViewHandle) {
        let Some(element) = self.elements.remove(&handle) else {
            return;
        };
        if let Some(id) = self.handle_to_node.remove(&handle) {
            self.node_to_handle.remove(&id);
        }
        for child in element.children {
            self.destroy(child);
        }
    }

    fn insert_sorted(&mut self, parent: ViewHandle, handle: ViewHandle) {
        let key = match self.elements.get(&handle) {
            Some(el) => match el.sort_kind() {
                Some(kind) => (kind, el.text.clone()),
                None => return,
            },
            None => return,
        };
        let Some(siblings) = self.elements.get(&parent).map(|p| &p.children) else {
            return;
        };
        let position = siblings
            .iter()
            .position(|h| {
                self.elements
                    .get(h)
                    .and_then(|el| el.sort_kind().map(|kind| (kind, &el.text)))
                    .map(|(kind, text)| display_order(key.0, &key.1, kind, text) == Ordering::Less)
                    .unwrap_or(false)
            })
            .unwrap_or(siblings.len());
        if let Some(p) = self.elements.get_mut(&parent) {
            p.children.insert(position, handle);
        }
    }
}
