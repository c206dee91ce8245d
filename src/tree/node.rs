use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Stable identity of a node for as long as it stays in the tree.
///
/// Renames keep the id; a node rebuilt from a server snapshot gets a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

/// Hands out fresh node ids. Ids are never reused within one model.
#[derive(Debug, Default)]
pub(super) struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub(super) fn allocate(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }
}

/// Variant tag of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    File,
    Directory,
}

/// Variant payload. Directories own their children, keyed by child name.
#[derive(Debug, Clone)]
pub(super) enum NodeBody {
    File,
    Directory { children: HashMap<String, Node> },
}

/// A file or directory in the tree.
///
/// Fields are only writable from inside the `tree` module so every
/// mutation goes through `FileTreeModel`.
#[derive(Debug, Clone)]
pub struct Node {
    pub(super) id: NodeId,
    pub(super) name: String,
    pub(super) rel_path: String,
    pub(super) abs_path: String,
    pub(super) body: NodeBody,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path from the tree root, segments joined by `/`. Empty for the root.
    pub fn rel_path(&self) -> &str {
        &self.rel_path
    }

    /// Server-side path, passed through untouched.
    pub fn abs_path(&self) -> &str {
        &self.abs_path
    }

    pub fn kind(&self) -> NodeKind {
        match self.body {
            NodeBody::File => NodeKind::File,
            NodeBody::Directory { .. } => NodeKind::Directory,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind() == NodeKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind() == NodeKind::File
    }

    /// Direct children, or `None` for a file.
    pub fn children(&self) -> Option<&HashMap<String, Node>> {
        match &self.body {
            NodeBody::File => None,
            NodeBody::Directory { children } => Some(children),
        }
    }

    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children().and_then(|c| c.get(name))
    }

    /// Children in display order: directories first, then names ascending.
    ///
    /// Empty for files.
    pub fn children_in_display_order(&self) -> Vec<&Node> {
        let mut children: Vec<&Node> = match self.children() {
            Some(c) => c.values().collect(),
            None => return Vec::new(),
        };
        children.sort_by(|a, b| display_order(a.kind(), &a.name, b.kind(), &b.name));
        children
    }

    pub(super) fn children_mut(&mut self) -> Option<&mut HashMap<String, Node>> {
        match &mut self.body {
            NodeBody::File => None,
            NodeBody::Directory { children } => Some(children),
        }
    }
}

/// Display ordering shared by the model and the view binder.
pub fn display_order(a_kind: NodeKind, a_name: &str, b_kind: NodeKind, b_name: &str) -> Ordering {
    let a_dir = a_kind == NodeKind::Directory;
    let b_dir = b_kind == NodeKind::Directory;
    b_dir.cmp(&a_dir).then_with(|| a_name.cmp(b_name))
}

/// Directory-shaped description of server state, as sent over the wire.
///
/// ```json
/// {"type": "directory", "name": "root", "rel_path": "", "abs_path": "/notes",
///  "children": {"a.md": {"type": "file", "name": "a.md", "rel_path": "a.md"}}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Snapshot {
    File {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rel_path: Option<String>,
        #[serde(default)]
        abs_path: String,
    },
    Directory {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rel_path: Option<String>,
        #[serde(default)]
        abs_path: String,
        #[serde(default)]
        children: HashMap<String, Snapshot>,
    },
}

impl Snapshot {
    pub fn file(name: &str, rel_path: &str) -> Self {
        Snapshot::File {
            name: name.to_string(),
            rel_path: Some(rel_path.to_string()),
            abs_path: String::new(),
        }
    }

    /// A directory snapshot; children are keyed by their own names.
    pub fn dir(name: &str, rel_path: &str, children: Vec<Snapshot>) -> Self {
        Snapshot::Directory {
            name: name.to_string(),
            rel_path: Some(rel_path.to_string()),
            abs_path: String::new(),
            children: children
                .into_iter()
                .map(|c| (c.name().to_string(), c))
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Snapshot::File { name, .. } | Snapshot::Directory { name, .. } => name,
        }
    }

    pub fn rel_path(&self) -> Option<&str> {
        match self {
            Snapshot::File { rel_path, .. } | Snapshot::Directory { rel_path, .. } => {
                rel_path.as_deref()
            }
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Snapshot::File { .. } => NodeKind::File,
            Snapshot::Directory { .. } => NodeKind::Directory,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_parses_server_json() {
        let json = r#"{
            "type": "directory", "name": "root", "rel_path": "", "abs_path": "/notes",
            "children": {
                "a.md": {"type": "file", "name": "a.md", "rel_path": "a.md", "abs_path": "/notes/a.md"},
                "sub": {"type": "directory", "name": "sub", "rel_path": "sub", "children": {}}
            }
        }"#;
        let snap: Snapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.name(), "root");
        assert_eq!(snap.kind(), NodeKind::Directory);
        match snap {
            Snapshot::Directory { children, abs_path, .. } => {
                assert_eq!(abs_path, "/notes");
                assert_eq!(children.len(), 2);
                assert_eq!(children["a.md"].kind(), NodeKind::File);
                assert_eq!(children["sub"].rel_path(), Some("sub"));
            }
            _ => panic!("expected directory"),
        }
    }

    #[test]
    fn snapshot_tolerates_missing_optional_fields() {
        let snap: Snapshot = serde_json::from_str(r#"{"type": "file", "name": "x.md"}"#).unwrap();
        assert_eq!(snap.rel_path(), None);
        assert_eq!(snap.name(), "x.md");
    }

    #[test]
    fn unknown_type_is_rejected() {
        let res = serde_json::from_str::<Snapshot>(r#"{"type": "symlink", "name": "x"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn display_order_puts_directories_first_then_ascending() {
        use NodeKind::*;
        assert_eq!(display_order(Directory, "z", File, "a"), Ordering::Less);
        assert_eq!(display_order(File, "a", Directory, "z"), Ordering::Greater);
        assert_eq!(display_order(File, "a.md", File, "b.md"), Ordering::Less);
        assert_eq!(display_order(Directory, "b", Directory, "a"), Ordering::Greater);
    }

    #[test]
    fn id_allocator_is_monotonic() {
        let mut ids = IdAllocator::default();
        let a = ids.allocate();
        let b = ids.allocate();
        assert_ne!(a, b);
        assert!(a < b);
    }
}
