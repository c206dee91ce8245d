use std::collections::HashMap;

use crate::error::{TreeError, TreeResult};
use crate::tree::node::NodeId;

/// Bidirectional map between relative paths and node ids.
///
/// Pure bookkeeping: no knowledge of the node graph itself. The root
/// directory is never indexed because it is not addressable by path.
#[derive(Debug, Default)]
pub struct PathIndex {
    by_path: HashMap<String, NodeId>,
    by_id: HashMap<NodeId, String>,
}

impl PathIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `path` for `id`. Fails if the path is already taken.
    pub fn insert(&mut self, path: &str, id: NodeId) -> TreeResult<()> {
        if self.by_path.contains_key(path) {
            return Err(TreeError::DuplicateName(path.to_string()));
        }
        self.by_path.insert(path.to_string(), id);
        self.by_id.insert(id, path.to_string());
        Ok(())
    }

    pub fn remove(&mut self, path: &str) -> Option<NodeId> {
        let id = self.by_path.remove(path)?;
        self.by_id.remove(&id);
        Some(id)
    }

    pub fn get(&self, path: &str) -> Option<NodeId> {
        self.by_path.get(path).copied()
    }

    pub fn path_of(&self, id: NodeId) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.by_path.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.by_path.keys().map(String::as_str)
    }

    /// Re-key `old` and everything below it to live under `new`.
    ///
    /// Returns the number of entries moved.
    pub fn rename_prefix(&mut self, old: &str, new: &str) -> usize {
        let moved: Vec<(String, NodeId)> = self
            .by_path
            .iter()
            .filter(|(path, _)| is_same_or_descendant(path, old))
            .map(|(path, id)| (path.clone(), *id))
            .collect();

        for (path, _) in &moved {
            self.by_path.remove(path);
        }
        for (path, id) in &moved {
            let renamed = format!("{}{}", new, &path[old.len()..]);
            self.by_id.insert(*id, renamed.clone());
            self.by_path.insert(renamed, *id);
        }
        moved.len()
    }
}

/// Whether `path` is `ancestor` itself or lies below it.
pub fn is_same_or_descendant(path: &str, ancestor: &str) -> bool {
    if ancestor.is_empty() {
        return true;
    }
    path == ancestor
        || (path.len() > ancestor.len()
            && path.starts_with(ancestor)
            && path.as_bytes()[ancestor.len()] == b'/')
}

/// Join a parent path and a child name. The root's path is empty.
pub fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Split a path into its parent path and last segment.
pub fn split_parent(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(i) => (&path[..i], &path[i + 1..]),
        None => ("", path),
    }
}

/// Paths of every ancestor directory of `path`, outermost first.
pub fn ancestors(path: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut end = 0;
    while let Some(i) = path[end..].find('/') {
        end += i;
        out.push(path[..end].to_string());
        end += 1;
    }
    out
}

/// A usable node name is non-empty and has no `/`.
pub fn validate_name(name: &str) -> TreeResult<()> {
    if name.is_empty() || name.contains('/') {
        return Err(TreeError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::node::IdAllocator;

    fn ids(n: usize) -> Vec<NodeId> {
        let mut alloc = IdAllocator::default();
        (0..n).map(|_| alloc.allocate()).collect()
    }

    #[test]
    fn insert_and_lookup_both_directions() {
        let ids = ids(1);
        let mut index = PathIndex::new();
        index.insert("sub/b.md", ids[0]).unwrap();
        assert_eq!(index.get("sub/b.md"), Some(ids[0]));
        assert_eq!(index.path_of(ids[0]), Some("sub/b.md"));
        assert!(index.contains("sub/b.md"));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn insert_rejects_taken_path() {
        let ids = ids(2);
        let mut index = PathIndex::new();
        index.insert("a.md", ids[0]).unwrap();
        let err = index.insert("a.md", ids[1]).unwrap_err();
        assert_eq!(err, TreeError::DuplicateName("a.md".into()));
        assert_eq!(index.get("a.md"), Some(ids[0]));
    }

    #[test]
    fn remove_clears_both_directions() {
        let ids = ids(1);
        let mut index = PathIndex::new();
        index.insert("a.md", ids[0]).unwrap();
        assert_eq!(index.remove("a.md"), Some(ids[0]));
        assert!(index.is_empty());
        assert_eq!(index.path_of(ids[0]), None);
        assert_eq!(index.remove("a.md"), None);
    }

    #[test]
    fn rename_prefix_moves_subtree_only() {
        let ids = ids(4);
        let mut index = PathIndex::new();
        index.insert("sub", ids[0]).unwrap();
        index.insert("sub/b.md", ids[1]).unwrap();
        index.insert("sub/deep/c.md", ids[2]).unwrap();
        index.insert("subway.md", ids[3]).unwrap();

        assert_eq!(index.rename_prefix("sub", "renamed"), 3);
        assert_eq!(index.get("renamed"), Some(ids[0]));
        assert_eq!(index.get("renamed/b.md"), Some(ids[1]));
        assert_eq!(index.path_of(ids[2]), Some("renamed/deep/c.md"));
        assert_eq!(index.get("subway.md"), Some(ids[3]));
        assert!(!index.contains("sub/b.md"));
    }

    #[test]
    fn descendant_check_respects_segment_boundaries() {
        assert!(is_same_or_descendant("sub", "sub"));
        assert!(is_same_or_descendant("sub/b.md", "sub"));
        assert!(!is_same_or_descendant("subway.md", "sub"));
        assert!(is_same_or_descendant("anything", ""));
    }

    #[test]
    fn path_helpers() {
        assert_eq!(join("", "a.md"), "a.md");
        assert_eq!(join("sub", "b.md"), "sub/b.md");
        assert_eq!(split_parent("sub/deep/c.md"), ("sub/deep", "c.md"));
        assert_eq!(split_parent("a.md"), ("", "a.md"));
        assert_eq!(ancestors("a/b/c.md"), vec!["a".to_string(), "a/b".to_string()]);
        assert!(ancestors("top.md").is_empty());
    }

    #[test]
    fn name_validation() {
        assert!(validate_name("notes.md").is_ok());
        assert_eq!(validate_name(""), Err(TreeError::InvalidName(String::new())));
        assert!(validate_name("a/b").is_err());
    }
}
