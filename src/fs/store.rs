use std::path::{Path, PathBuf};

use crate::fs::adapter::{Entry, EntryKind, EntryMeta};

/// Stable handle to a node in the store arena.
///
/// The default id addresses the super-root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NodeId(usize);

/// Per-node load state machine.
///
/// `Unloaded → Loading → {Loaded, Failed}`; a refresh resets the node to
/// `Unloaded` before re-dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    Loading,
    Loaded,
    Failed,
}

/// One tree node: an entry plus load state, child links, and the fetch
/// generation counter that gates merges.
#[derive(Debug)]
pub struct Node {
    pub id: NodeId,
    pub entry: Entry,
    pub parent: Option<NodeId>,
    /// Ordered child ids; insertion order is merge order.
    pub children: Vec<NodeId>,
    pub state: LoadState,
    /// Bumped on every refresh; a fetch result whose captured generation no
    /// longer matches is discarded instead of merged.
    pub generation: u64,
    /// Last listing error, shown for `Failed` nodes.
    pub error: Option<String>,
    /// Presentation state consumed by the flattener, not part of the load
    /// state machine.
    pub is_expanded: bool,
}

impl Node {
    pub fn is_dir(&self) -> bool {
        self.entry.kind == EntryKind::Directory
    }
}

/// Arena owning every node, indexed by `NodeId`.
///
/// Parent links are ids, never owning references. Records are only ever
/// appended; a refresh drops child links but the orphaned records stay in
/// the arena until the store is torn down with the owning view. All
/// mutations happen on the interactive loop, which is the single point of
/// serialization for merges.
pub struct TreeStore {
    nodes: Vec<Node>,
}

impl TreeStore {
    /// Create a store containing only the synthetic super-root.
    ///
    /// The super-root is a placeholder directory that is never rendered;
    /// its children are the filesystem roots.
    pub fn new(root_label: &str) -> Self {
        let entry = Entry {
            path: PathBuf::new(),
            name: root_label.to_string(),
            kind: EntryKind::Directory,
            meta: EntryMeta {
                size: 0,
                modified: None,
            },
        };
        let root = Node {
            id: NodeId(0),
            entry,
            parent: None,
            children: Vec::new(),
            state: LoadState::Unloaded,
            generation: 0,
            error: None,
            is_expanded: true,
        };
        Self { nodes: vec![root] }
    }

    pub fn root_id(&self) -> NodeId {
        NodeId(0)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Append a child under `parent`, preserving insertion order.
    pub fn create_child(&mut self, parent: NodeId, entry: Entry) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            id,
            entry,
            parent: Some(parent),
            children: Vec::new(),
            state: LoadState::Unloaded,
            generation: 0,
            error: None,
            is_expanded: false,
        });
        if let Some(parent_node) = self.nodes.get_mut(parent.0) {
            parent_node.children.push(id);
        }
        id
    }

    /// Ordered child ids of `id`. Empty for unknown ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn set_state(&mut self, id: NodeId, state: LoadState) {
        if let Some(node) = self.get_mut(id) {
            node.state = state;
        }
    }

    /// Find an existing child of `parent` by entry path.
    pub fn child_by_path(&self, parent: NodeId, path: &Path) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|&child| self.get(child).is_some_and(|n| n.entry.path == path))
    }

    /// Drop all child links of `id`. The records stay in the arena.
    pub fn clear_children(&mut self, id: NodeId) {
        if let Some(node) = self.get_mut(id) {
            node.children.clear();
        }
    }

    /// Total number of records ever created, super-root included.
    #[allow(dead_code)]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dir_entry(name: &str) -> Entry {
        Entry {
            path: PathBuf::from("/").join(name),
            name: name.to_string(),
            kind: EntryKind::Directory,
            meta: EntryMeta {
                size: 0,
                modified: None,
            },
        }
    }

    #[test]
    fn new_store_contains_only_expanded_super_root() {
        let store = TreeStore::new("roots");
        let root = store.get(store.root_id()).unwrap();
        assert!(root.is_dir());
        assert!(root.is_expanded);
        assert!(root.children.is_empty());
        assert_eq!(root.generation, 0);
    }

    #[test]
    fn create_child_preserves_insertion_order() {
        let mut store = TreeStore::new("roots");
        let root = store.root_id();
        let a = store.create_child(root, dir_entry("a"));
        let b = store.create_child(root, dir_entry("b"));
        let c = store.create_child(root, dir_entry("c"));
        assert_eq!(store.children(root), &[a, b, c]);
        assert_eq!(store.get(b).unwrap().parent, Some(root));
    }

    #[test]
    fn child_by_path_finds_existing() {
        let mut store = TreeStore::new("roots");
        let root = store.root_id();
        let a = store.create_child(root, dir_entry("a"));
        assert_eq!(store.child_by_path(root, Path::new("/a")), Some(a));
        assert_eq!(store.child_by_path(root, Path::new("/zzz")), None);
    }

    #[test]
    fn clear_children_keeps_records() {
        let mut store = TreeStore::new("roots");
        let root = store.root_id();
        let a = store.create_child(root, dir_entry("a"));
        store.create_child(root, dir_entry("b"));
        let before = store.node_count();
        store.clear_children(root);
        assert!(store.children(root).is_empty());
        assert_eq!(store.node_count(), before);
        // Orphaned record is still addressable by id.
        assert_eq!(store.get(a).unwrap().entry.name, "a");
    }

    #[test]
    fn set_state_transitions() {
        let mut store = TreeStore::new("roots");
        let root = store.root_id();
        let a = store.create_child(root, dir_entry("a"));
        assert_eq!(store.get(a).unwrap().state, LoadState::Unloaded);
        store.set_state(a, LoadState::Loading);
        assert_eq!(store.get(a).unwrap().state, LoadState::Loading);
        store.set_state(a, LoadState::Loaded);
        assert_eq!(store.get(a).unwrap().state, LoadState::Loaded);
    }
}
