use tracing::debug;

use crate::error::{TreeError, TreeResult};
use crate::tree::index::{join, split_parent, validate_name, PathIndex};
use crate::tree::node::{IdAllocator, Node, NodeBody, NodeId, Snapshot};

/// Reserved name of the synthetic top directory.
pub const ROOT_NAME: &str = "root";

/// In-memory mirror of the server's file tree.
///
/// Owns the node graph and keeps the path index in step with it. Knows
/// nothing about how nodes are displayed.
#[derive(Debug)]
pub struct FileTreeModel {
    root: Node,
    index: PathIndex,
    ids: IdAllocator,
}

impl FileTreeModel {
    /// Build a model from the `data` field of a tree response, which may be absent.
    pub fn build_from_data(data: Option<&Snapshot>) -> TreeResult<Self> {
        match data {
            Some(snapshot) => Self::build(snapshot),
            None => Err(TreeError::InvalidSnapshot("missing top node".into())),
        }
    }

    /// Build a model from a snapshot whose top node is the `root` directory.
    pub fn build(snapshot: &Snapshot) -> TreeResult<Self> {
        let (abs_path, children) = match snapshot {
            Snapshot::Directory {
                name,
                abs_path,
                children,
                ..
            } => {
                if name != ROOT_NAME {
                    return Err(TreeError::InvalidSnapshot(format!(
                        "top node is named {:?}, expected {:?}",
                        name, ROOT_NAME
                    )));
                }
                (abs_path, children)
            }
            Snapshot::File { .. } => {
                return Err(TreeError::InvalidSnapshot(
                    "top node is not a directory".into(),
                ))
            }
        };

        let mut ids = IdAllocator::default();
        let mut root = Node {
            id: ids.allocate(),
            name: ROOT_NAME.to_string(),
            rel_path: String::new(),
            abs_path: abs_path.clone(),
            body: NodeBody::Directory {
                children: Default::default(),
            },
        };

        let mut index = PathIndex::new();
        for (key, child) in children {
            if key != child.name() {
                return Err(key_mismatch(key, child));
            }
            let node = materialize(&mut ids, child, key)?;
            index_subtree(&mut index, &node)?;
            if let Some(c) = root.children_mut() {
                c.insert(key.clone(), node);
            }
        }

        debug!(nodes = index.len(), "built file tree");
        Ok(Self { root, index, ids })
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Number of addressable nodes (the root is not counted).
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Resolve a path by walking from the root; `""` is the root itself.
    pub fn lookup(&self, rel_path: &str) -> TreeResult<&Node> {
        walk(&self.root, rel_path)
    }

    pub fn lookup_id(&self, id: NodeId) -> Option<&Node> {
        let path = self.index.path_of(id)?;
        walk(&self.root, path).ok()
    }

    pub fn id_of(&self, rel_path: &str) -> Option<NodeId> {
        if rel_path.is_empty() {
            return Some(self.root.id);
        }
        self.index.get(rel_path)
    }

    pub fn path_of(&self, id: NodeId) -> Option<&str> {
        if id == self.root.id {
            return Some("");
        }
        self.index.path_of(id)
    }

    pub fn contains(&self, rel_path: &str) -> bool {
        self.index.contains(rel_path)
    }

    /// Every addressable path reachable from the root, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        collect_paths(&self.root, &mut out);
        out.sort();
        out
    }

    /// Children of the directory at `rel_path`, directories first, then by name.
    pub fn children_sorted(&self, rel_path: &str) -> TreeResult<Vec<&Node>> {
        let node = walk(&self.root, rel_path)?;
        if !node.is_dir() {
            return Err(TreeError::NotADirectory(rel_path.to_string()));
        }
        Ok(node.children_in_display_order())
    }

    /// Add a node described by `snapshot` under the directory at `parent_rel_path`.
    pub fn insert(&mut self, parent_rel_path: &str, snapshot: &Snapshot) -> TreeResult<NodeId> {
        let name = snapshot.name();
        let parent = walk(&self.root, parent_rel_path)?;
        if !parent.is_dir() {
            return Err(TreeError::NotADirectory(parent_rel_path.to_string()));
        }
        validate_name(name)?;
        let rel_path = join(parent_rel_path, name);
        if parent.child(name).is_some() {
            return Err(TreeError::DuplicateName(rel_path));
        }

        let node = materialize(&mut self.ids, snapshot, &rel_path)?;
        let id = self.attach(parent_rel_path, node)?;
        debug!(path = %rel_path, "inserted node");
        Ok(id)
    }

    /// Detach the node at `rel_path`, dropping its whole subtree from the index.
    ///
    /// Returns the detached node.
    pub fn remove(&mut self, rel_path: &str) -> TreeResult<Node> {
        if rel_path.is_empty() {
            return Err(TreeError::NotFound(String::new()));
        }
        let node = walk(&self.root, rel_path)?;
        unindex_subtree(&mut self.index, node);

        let (parent, name) = split_parent(rel_path);
        let removed = walk_mut(&mut self.root, parent)?
            .children_mut()
            .and_then(|c| c.remove(name))
            .ok_or_else(|| TreeError::NotFound(rel_path.to_string()))?;
        debug!(path = %rel_path, "removed node");
        Ok(removed)
    }

    /// Give the node at `rel_path` a new name, moving its whole subtree.
    ///
    /// Returns the node's new path. The tree is unchanged on error.
    pub fn rename(&mut self, rel_path: &str, new_name: &str) -> TreeResult<String> {
        if rel_path.is_empty() {
            return Err(TreeError::NotFound(String::new()));
        }
        walk(&self.root, rel_path)?;
        validate_name(new_name)?;

        let (parent, old_name) = split_parent(rel_path);
        let new_rel_path = join(parent, new_name);
        if new_name == old_name {
            return Ok(new_rel_path);
        }

        let siblings = walk_mut(&mut self.root, parent)?
            .children_mut()
            .ok_or_else(|| TreeError::NotADirectory(parent.to_string()))?;
        if siblings.contains_key(new_name) {
            return Err(TreeError::DuplicateName(new_rel_path));
        }
        let mut node = siblings
            .remove(old_name)
            .ok_or_else(|| TreeError::NotFound(rel_path.to_string()))?;
        node.name = new_name.to_string();
        relocate(&mut node, &new_rel_path);
        siblings.insert(new_name.to_string(), node);

        let moved = self.index.rename_prefix(rel_path, &new_rel_path);
        debug!(from = %rel_path, to = %new_rel_path, moved, "renamed node");
        Ok(new_rel_path)
    }

    /// Swap the node at `rel_path` for one freshly built from `snapshot`.
    ///
    /// The replacement lives under the same parent, named after the
    /// snapshot, and gets a new identity. The tree is unchanged on error.
    pub fn replace(&mut self, rel_path: &str, snapshot: &Snapshot) -> TreeResult<NodeId> {
        if rel_path.is_empty() {
            return Err(TreeError::NotFound(String::new()));
        }
        walk(&self.root, rel_path)?;
        let name = snapshot.name();
        validate_name(name)?;

        let (parent, old_name) = split_parent(rel_path);
        let new_rel_path = join(parent, name);
        if name != old_name && walk(&self.root, parent)?.child(name).is_some() {
            return Err(TreeError::DuplicateName(new_rel_path));
        }

        let node = materialize(&mut self.ids, snapshot, &new_rel_path)?;
        self.remove(rel_path)?;
        let id = self.attach(parent, node)?;
        debug!(from = %rel_path, to = %new_rel_path, "replaced node");
        Ok(id)
    }

    fn attach(&mut self, parent_rel_path: &str, node: Node) -> TreeResult<NodeId> {
        let id = node.id;
        index_subtree(&mut self.index, &node)?;
        let children = walk_mut(&mut self.root, parent_rel_path)?
            .children_mut()
            .ok_or_else(|| TreeError::NotADirectory(parent_rel_path.to_string()))?;
        children.insert(node.name.clone(), node);
        Ok(id)
    }
}

fn walk<'a>(root: &'a Node, rel_path: &str) -> TreeResult<&'a Node> {
    let mut node = root;
    if rel_path.is_empty() {
        return Ok(node);
    }
    for segment in rel_path.split('/') {
        let children = match node.children() {
            Some(c) => c,
            None => return Err(TreeError::NotADirectory(node.rel_path.clone())),
        };
        node = children
            .get(segment)
            .ok_or_else(|| TreeError::NotFound(rel_path.to_string()))?;
    }
    Ok(node)
}

fn walk_mut<'a>(root: &'a mut Node, rel_path: &str) -> TreeResult<&'a mut Node> {
    let mut node = root;
    if rel_path.is_empty() {
        return Ok(node);
    }
    for segment in rel_path.split('/') {
        if !node.is_dir() {
            return Err(TreeError::NotADirectory(node.rel_path.clone()));
        }
        node = node
            .children_mut()
            .and_then(|c| c.get_mut(segment))
            .ok_or_else(|| TreeError::NotFound(rel_path.to_string()))?;
    }
    Ok(node)
}

/// Turn a snapshot into an owned subtree rooted at `rel_path`.
fn materialize(ids: &mut IdAllocator, snapshot: &Snapshot, rel_path: &str) -> TreeResult<Node> {
    let name = snapshot.name();
    if validate_name(name).is_err() {
        return Err(TreeError::InvalidSnapshot(format!(
            "bad node name {:?} at {:?}",
            name, rel_path
        )));
    }
    if let Some(claimed) = snapshot.rel_path() {
        if claimed != rel_path {
            return Err(TreeError::InvalidSnapshot(format!(
                "node claims path {:?} but sits at {:?}",
                claimed, rel_path
            )));
        }
    }

    let (abs_path, body) = match snapshot {
        Snapshot::File { abs_path, .. } => (abs_path, NodeBody::File),
        Snapshot::Directory {
            abs_path, children, ..
        } => {
            let mut owned = std::collections::HashMap::with_capacity(children.len());
            for (key, child) in children {
                if key != child.name() {
                    return Err(key_mismatch(key, child));
                }
                owned.insert(key.clone(), materialize(ids, child, &join(rel_path, key))?);
            }
            (abs_path, NodeBody::Directory { children: owned })
        }
    };

    Ok(Node {
        id: ids.allocate(),
        name: name.to_string(),
        rel_path: rel_path.to_string(),
        abs_path: abs_path.clone(),
        body,
    })
}

fn key_mismatch(key: &str, child: &Snapshot) -> TreeError {
    TreeError::InvalidSnapshot(format!(
        "child key {:?} does not match node name {:?}",
        key,
        child.name()
    ))
}

fn index_subtree(index: &mut PathIndex, node: &Node) -> TreeResult<()> {
    index.insert(&node.rel_path, node.id)?;
    if let Some(children) = node.children() {
        for child in children.values() {
            index_subtree(index, child)?;
        }
    }
    Ok(())
}

/// Post-order: descendants leave the index before their directory.
fn unindex_subtree(index: &mut PathIndex, node: &Node) {
    if let Some(children) = node.children() {
        for child in children.values() {
            unindex_subtree(index, child);
        }
    }
    index.remove(&node.rel_path);
}

fn relocate(node: &mut Node, rel_path: &str) {
    node.rel_path = rel_path.to_string();
    if let Some(children) = node.children_mut() {
        for child in children.values_mut() {
            let child_path = join(rel_path, &child.name);
            relocate(child, &child_path);
        }
    }
}

fn collect_paths(node: &Node, out: &mut Vec<String>) {
    if let Some(children) = node.children() {
        for child in children.values() {
            out.push(child.rel_path.clone());
            collect_paths(child, out);
        }
    }
}
