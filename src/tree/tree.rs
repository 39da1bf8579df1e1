use std::collections::HashSet;
use std::fmt;

use hashlink::LinkedHashMap;
use snafu::prelude::*;
use tracing::debug;

use crate::container::{Container, is_valid_entry_name};
use crate::tree::error::{
    AlreadyAttachedSnafu, DuplicateKeySnafu, InvalidKeySnafu, NotDirectorySnafu, NotFoundSnafu,
    StaleNodeSnafu, WouldCycleSnafu,
};
use crate::tree::{Node, NodeId, NodeKind, StructuralError};
use crate::write_back::{DirtyObserver, FlushPolicy};

struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Arena holding every node of a document.
///
/// Nodes are addressed by [`NodeId`] handles. A node without a parent is a
/// root; several detached roots may live in the same tree at once. Discarded
/// slots are recycled through a free list and their generation is bumped so
/// outstanding handles fail with [`StructuralError::StaleNode`].
pub struct Tree {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    pub(crate) default_observer: Option<Box<dyn DirtyObserver>>,
    pub(crate) policy: FlushPolicy,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("nodes", &self.len())
            .field("free", &self.free_list.len())
            .field("policy", &self.policy)
            .finish()
    }
}

impl Tree {
    pub fn new() -> Self {
        Self::with_policy(FlushPolicy::default())
    }

    pub fn with_policy(policy: FlushPolicy) -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            default_observer: None,
            policy,
        }
    }

    // -- Construction --

    /// Creates a detached file node with empty contents.
    pub fn create_file(&mut self, key: impl Into<String>) -> Result<NodeId, StructuralError> {
        self.create_file_with_contents(key, Vec::new())
    }

    /// Creates a detached file node holding `contents`.
    ///
    /// Keys double as on-disk entry names, so they must be a single
    /// non-empty path component other than `.` and `..`.
    pub fn create_file_with_contents(
        &mut self,
        key: impl Into<String>,
        contents: impl Into<Vec<u8>>,
    ) -> Result<NodeId, StructuralError> {
        let key = key.into();
        ensure!(is_valid_entry_name(&key), InvalidKeySnafu { key });
        let contents = contents.into();
        debug!("Creating file node '{}' ({} bytes)", key, contents.len());
        Ok(self.allocate(Node::new(key, NodeKind::File(contents))))
    }

    /// Creates a detached directory node that takes ownership of `children`.
    ///
    /// Every child must be a live, detached node and child keys must be
    /// unique; otherwise nothing is created.
    pub fn create_directory(
        &mut self,
        key: impl Into<String>,
        children: Vec<NodeId>,
    ) -> Result<NodeId, StructuralError> {
        let key = key.into();
        ensure!(is_valid_entry_name(&key), InvalidKeySnafu { key });
        self.validate_new_children(&key, None, &children)?;

        debug!(
            "Creating directory node '{}' with {} children",
            key,
            children.len()
        );
        let directory = self.allocate(Node::new(key, NodeKind::Directory(LinkedHashMap::new())));
        self.attach_all(directory, &children)?;
        Ok(directory)
    }

    /// Recursively builds a detached node from an existing container.
    ///
    /// Directory containers produce one child node per entry, named after
    /// the entry; file containers keep their raw bytes. Every name is
    /// checked before the first node is allocated.
    pub fn import<C: Container>(
        &mut self,
        key: impl Into<String>,
        container: &C,
    ) -> Result<NodeId, StructuralError> {
        let key = key.into();
        ensure!(is_valid_entry_name(&key), InvalidKeySnafu { key });
        validate_container_keys(container)?;
        Ok(self.import_unchecked(key, container))
    }

    // -- Structural mutation --

    /// Replaces the whole child set of `directory`.
    ///
    /// Previous children that are not part of `children` are detached. The
    /// new list may repeat current children; any other node must be
    /// detached.
    pub fn set_children(
        &mut self,
        directory: NodeId,
        children: Vec<NodeId>,
    ) -> Result<(), StructuralError> {
        let node = self.live(directory)?;
        let dir_key = node.key.clone();
        let previous: Vec<NodeId> = node
            .children()
            .context(NotDirectorySnafu { key: &dir_key })?
            .values()
            .copied()
            .collect();

        self.validate_new_children(&dir_key, Some(directory), &children)?;

        for child in previous {
            if let Some(node) = self.node_mut(child) {
                node.parent = None;
            }
        }
        if let Some(node) = self.node_mut(directory) {
            node.kind = NodeKind::Directory(LinkedHashMap::new());
        }
        debug!(
            "Replacing children of '{}' with {} nodes",
            dir_key,
            children.len()
        );
        self.attach_all(directory, &children)
    }

    /// Adds `child` to `directory`.
    pub fn insert(&mut self, directory: NodeId, child: NodeId) -> Result<(), StructuralError> {
        let dir = self.live(directory)?;
        let children = dir.children().context(NotDirectorySnafu { key: &dir.key })?;
        let new = self.live(child)?;

        ensure!(
            !children.contains_key(&new.key),
            DuplicateKeySnafu {
                directory: &dir.key,
                key: &new.key
            }
        );
        ensure!(
            new.parent.is_none(),
            AlreadyAttachedSnafu { key: &new.key }
        );
        ensure!(
            !self.is_ancestor_or_self(child, directory),
            WouldCycleSnafu {
                directory: &dir.key,
                key: &new.key
            }
        );

        debug!("Inserting '{}' into '{}'", new.key, dir.key);
        self.link(directory, child);
        Ok(())
    }

    /// Detaches `child` from `directory`. The child stays alive as a root.
    pub fn remove(&mut self, directory: NodeId, child: NodeId) -> Result<(), StructuralError> {
        let dir = self.live(directory)?;
        let children = dir.children().context(NotDirectorySnafu { key: &dir.key })?;
        let old = self.live(child)?;

        ensure!(
            old.parent == Some(directory) && children.get(&old.key) == Some(&child),
            NotFoundSnafu {
                directory: &dir.key,
                key: &old.key
            }
        );

        debug!("Removing '{}' from '{}'", old.key, dir.key);
        let key = old.key.clone();
        if let Some(NodeKind::Directory(children)) = self.node_mut(directory).map(|n| &mut n.kind) {
            children.remove(&key);
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = None;
        }
        Ok(())
    }

    /// Returns a key not used by any direct child of `directory`.
    ///
    /// Keys are treated as decimal numbers: the result is one past the
    /// largest numeric key, or `"0"` when there is none.
    pub fn suggest_unused_key(&self, directory: NodeId) -> Result<String, StructuralError> {
        let dir = self.live(directory)?;
        let children = dir.children().context(NotDirectorySnafu { key: &dir.key })?;

        let mut candidate = children
            .keys()
            .filter_map(|key| key.parse::<u64>().ok())
            .max()
            .map_or(0, |max| max.wrapping_add(1));
        while children.contains_key(&candidate.to_string()) {
            candidate = candidate.wrapping_add(1);
        }
        Ok(candidate.to_string())
    }

    /// Destroys a detached node together with its whole subtree.
    pub fn discard(&mut self, id: NodeId) -> Result<(), StructuralError> {
        let node = self.live(id)?;
        ensure!(
            node.parent.is_none(),
            AlreadyAttachedSnafu { key: &node.key }
        );

        let mut pending = vec![id];
        let mut discarded = 0usize;
        while let Some(current) = pending.pop() {
            let slot = &mut self.slots[current.idx as usize];
            if let Some(node) = slot.node.take() {
                if let NodeKind::Directory(children) = node.kind {
                    pending.extend(children.values().copied());
                }
                slot.generation = slot.generation.wrapping_add(1);
                self.free_list.push(current.idx);
                discarded += 1;
            }
        }
        debug!("Discarded {} nodes", discarded);
        Ok(())
    }

    // -- Queries --

    /// Number of live nodes, attached or not.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn key(&self, id: NodeId) -> Result<&str, StructuralError> {
        Ok(&self.live(id)?.key)
    }

    pub fn is_directory(&self, id: NodeId) -> Result<bool, StructuralError> {
        Ok(self.live(id)?.is_directory())
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>, StructuralError> {
        Ok(self.live(id)?.parent)
    }

    /// Children of `id` in insertion order; empty for file nodes.
    pub fn children(&self, id: NodeId) -> Result<Vec<NodeId>, StructuralError> {
        Ok(self
            .live(id)?
            .children()
            .map(|children| children.values().copied().collect())
            .unwrap_or_default())
    }

    pub fn child_count(&self, id: NodeId) -> Result<usize, StructuralError> {
        Ok(self.live(id)?.children().map_or(0, |c| c.len()))
    }

    pub fn child(&self, directory: NodeId, key: &str) -> Result<Option<NodeId>, StructuralError> {
        let dir = self.live(directory)?;
        let children = dir.children().context(NotDirectorySnafu { key: &dir.key })?;
        Ok(children.get(key).copied())
    }

    /// Raw bytes of a file node, `None` for directories.
    pub fn contents(&self, id: NodeId) -> Result<Option<&[u8]>, StructuralError> {
        Ok(match &self.live(id)?.kind {
            NodeKind::File(contents) => Some(contents.as_slice()),
            NodeKind::Directory(_) => None,
        })
    }

    /// Looks up a descendant by a slash-separated path relative to `from`.
    ///
    /// Empty segments are ignored, so `""` resolves to `from` itself.
    pub fn resolve(&self, from: NodeId, path: &str) -> Result<Option<NodeId>, StructuralError> {
        self.live(from)?;
        let mut current = from;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let next = self
                .node(current)
                .and_then(Node::children)
                .and_then(|children| children.get(segment).copied());
            match next {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Slash-separated path of `id` below its topmost ancestor.
    pub fn path_of(&self, id: NodeId) -> Result<String, StructuralError> {
        let mut segments = Vec::new();
        let mut current = self.live(id)?;
        while let Some(parent) = current.parent {
            segments.push(current.key.as_str());
            current = self.live(parent)?;
        }
        segments.reverse();
        Ok(segments.join("/"))
    }

    // -- Internals --

    pub(crate) fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.idx as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        node_in_slots(&mut self.slots, id)
    }

    pub(crate) fn live(&self, id: NodeId) -> Result<&Node, StructuralError> {
        self.node(id).context(StaleNodeSnafu { id })
    }

    pub(crate) fn live_mut(&mut self, id: NodeId) -> Result<&mut Node, StructuralError> {
        self.node_mut(id).context(StaleNodeSnafu { id })
    }

    /// Splits the borrow so an observer can run while its node is borrowed.
    pub(crate) fn node_and_default_observer(
        &mut self,
        id: NodeId,
    ) -> Result<(&mut Node, Option<&mut Box<dyn DirtyObserver>>), StructuralError> {
        let node = node_in_slots(&mut self.slots, id).context(StaleNodeSnafu { id })?;
        Ok((node, self.default_observer.as_mut()))
    }

    pub(crate) fn live_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots.iter().enumerate().filter_map(|(idx, slot)| {
            slot.node.as_ref().map(|_| NodeId {
                idx: idx as u32,
                generation: slot.generation,
            })
        })
    }

    fn import_unchecked<C: Container>(&mut self, key: String, container: &C) -> NodeId {
        let Some(entries) = container.entries() else {
            let contents = container.contents().unwrap_or_default().to_vec();
            debug!("Importing file node '{}' ({} bytes)", key, contents.len());
            return self.allocate(Node::new(key, NodeKind::File(contents)));
        };

        let directory = self.allocate(Node::new(
            key.clone(),
            NodeKind::Directory(LinkedHashMap::new()),
        ));
        let mut imported = LinkedHashMap::new();
        for (name, entry) in entries {
            let child = self.import_unchecked(name.to_string(), entry);
            if let Some(node) = self.node_mut(child) {
                node.parent = Some(directory);
            }
            imported.insert(name.to_string(), child);
        }
        debug!("Imported directory '{}' with {} entries", key, imported.len());

        if let Some(node) = self.node_mut(directory) {
            node.kind = NodeKind::Directory(imported);
        }
        directory
    }

    fn allocate(&mut self, node: Node) -> NodeId {
        if let Some(idx) = self.free_list.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.node = Some(node);
            NodeId {
                idx,
                generation: slot.generation,
            }
        } else {
            let idx = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId { idx, generation: 0 }
        }
    }

    /// Checks that `children` may become the child set of a directory.
    ///
    /// `directory` is `None` while the directory does not exist yet.
    fn validate_new_children(
        &self,
        dir_key: &str,
        directory: Option<NodeId>,
        children: &[NodeId],
    ) -> Result<(), StructuralError> {
        let mut keys = HashSet::with_capacity(children.len());
        for &child in children {
            let node = self.live(child)?;
            ensure!(
                keys.insert(node.key.as_str()),
                DuplicateKeySnafu {
                    directory: dir_key,
                    key: &node.key
                }
            );
            ensure!(
                node.parent.is_none() || node.parent == directory,
                AlreadyAttachedSnafu { key: &node.key }
            );
            if let Some(directory) = directory {
                ensure!(
                    !self.is_ancestor_or_self(child, directory),
                    WouldCycleSnafu {
                        directory: dir_key,
                        key: &node.key
                    }
                );
            }
        }
        Ok(())
    }

    fn attach_all(&mut self, directory: NodeId, children: &[NodeId]) -> Result<(), StructuralError> {
        self.live(directory)?;
        for &child in children {
            self.link(directory, child);
        }
        Ok(())
    }

    fn link(&mut self, directory: NodeId, child: NodeId) {
        let Some(key) = self.node_mut(child).map(|node| {
            node.parent = Some(directory);
            node.key.clone()
        }) else {
            return;
        };
        if let Some(NodeKind::Directory(children)) = self.node_mut(directory).map(|n| &mut n.kind) {
            children.insert(key, child);
        }
    }

    /// Whether `ancestor` is `node` itself or lies on its parent chain.
    fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.node(id).and_then(|n| n.parent);
        }
        false
    }
}

fn validate_container_keys<C: Container>(container: &C) -> Result<(), StructuralError> {
    let Some(entries) = container.entries() else {
        return Ok(());
    };
    for (name, entry) in entries {
        ensure!(is_valid_entry_name(name), InvalidKeySnafu { key: name });
        validate_container_keys(entry)?;
    }
    Ok(())
}

fn node_in_slots(slots: &mut [Slot], id: NodeId) -> Option<&mut Node> {
    slots
        .get_mut(id.idx as usize)
        .filter(|slot| slot.generation == id.generation)
        .and_then(|slot| slot.node.as_mut())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Entry;
    use rstest::*;

    fn files(tree: &mut Tree, keys: &[&str]) -> Vec<NodeId> {
        keys.iter().map(|key| tree.create_file(*key).unwrap()).collect()
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(5)]
    fn directory_owns_its_children(#[case] count: usize) {
        let mut tree = Tree::new();
        let keys: Vec<String> = (0..count).map(|i| i.to_string()).collect();
        let children: Vec<NodeId> = keys
            .iter()
            .map(|key| tree.create_file(key.as_str()).unwrap())
            .collect();

        let dir = tree.create_directory("dir", children.clone()).unwrap();

        assert_eq!(tree.child_count(dir).unwrap(), count);
        assert_eq!(tree.children(dir).unwrap(), children);
        for child in children {
            assert_eq!(tree.parent(child).unwrap(), Some(dir));
        }
        assert_eq!(tree.parent(dir).unwrap(), None);
    }

    #[test]
    fn create_directory_rejects_duplicate_keys() {
        let mut tree = Tree::new();
        let children = files(&mut tree, &["a", "a"]);

        let result = tree.create_directory("dir", children.clone());

        assert!(matches!(result, Err(StructuralError::DuplicateKey { .. })));
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.parent(children[0]).unwrap(), None);
    }

    #[test]
    fn create_directory_rejects_attached_children() {
        let mut tree = Tree::new();
        let child = tree.create_file("a").unwrap();
        tree.create_directory("first", vec![child]).unwrap();

        let result = tree.create_directory("second", vec![child]);

        assert!(matches!(result, Err(StructuralError::AlreadyAttached { .. })));
    }

    #[test]
    fn duplicate_insert_leaves_children_unchanged() {
        let mut tree = Tree::new();
        let children = files(&mut tree, &["a", "b"]);
        let dir = tree.create_directory("dir", children.clone()).unwrap();
        let impostor = tree.create_file("a").unwrap();

        let result = tree.insert(dir, impostor);

        assert_eq!(
            result,
            Err(StructuralError::DuplicateKey {
                directory: "dir".into(),
                key: "a".into()
            })
        );
        assert_eq!(tree.children(dir).unwrap(), children);
        assert_eq!(tree.parent(impostor).unwrap(), None);
    }

    #[test]
    fn removing_a_foreign_node_is_not_found() {
        let mut tree = Tree::new();
        let dir = tree.create_directory("dir", Vec::new()).unwrap();
        let stranger = tree.create_file("x").unwrap();

        assert!(matches!(
            tree.remove(dir, stranger),
            Err(StructuralError::NotFound { .. })
        ));
    }

    #[test]
    fn remove_then_insert_moves_a_subtree() {
        let mut tree = Tree::new();
        let leaf = tree.create_file("b").unwrap();
        let a = tree.create_directory("a", vec![leaf]).unwrap();
        let doc = tree.create_directory("doc", vec![a]).unwrap();
        let other = tree.create_directory("other", Vec::new()).unwrap();

        tree.remove(doc, a).unwrap();
        assert_eq!(tree.parent(a).unwrap(), None);
        assert_eq!(tree.child_count(doc).unwrap(), 0);
        assert_eq!(tree.path_of(leaf).unwrap(), "b");

        tree.insert(other, a).unwrap();
        assert_eq!(tree.parent(a).unwrap(), Some(other));
        assert_eq!(tree.resolve(other, "a/b").unwrap(), Some(leaf));
        assert_eq!(tree.path_of(leaf).unwrap(), "a/b");
    }

    #[test]
    fn removed_child_can_be_inserted_again() {
        let mut tree = Tree::new();
        let children = files(&mut tree, &["a", "b"]);
        let a = children[0];
        let doc = tree.create_directory("doc", children).unwrap();
        assert_eq!(tree.child_count(doc).unwrap(), 2);

        tree.remove(doc, a).unwrap();
        assert_eq!(tree.child_count(doc).unwrap(), 1);
        assert_eq!(tree.parent(a).unwrap(), None);

        tree.insert(doc, a).unwrap();
        assert_eq!(tree.child_count(doc).unwrap(), 2);
        assert_eq!(tree.parent(a).unwrap(), Some(doc));
    }

    #[test]
    fn inserting_an_ancestor_would_cycle() {
        let mut tree = Tree::new();
        let inner = tree.create_directory("inner", Vec::new()).unwrap();
        let outer = tree.create_directory("outer", vec![inner]).unwrap();

        assert!(matches!(
            tree.insert(inner, outer),
            Err(StructuralError::WouldCycle { .. })
        ));
        assert!(matches!(
            tree.insert(outer, outer),
            Err(StructuralError::WouldCycle { .. })
        ));
    }

    #[test]
    fn inserting_into_a_file_fails() {
        let mut tree = Tree::new();
        let file = tree.create_file("f").unwrap();
        let other = tree.create_file("g").unwrap();

        assert!(matches!(
            tree.insert(file, other),
            Err(StructuralError::NotDirectory { .. })
        ));
    }

    #[test]
    fn set_children_detaches_previous_children() {
        let mut tree = Tree::new();
        let old = files(&mut tree, &["a", "b"]);
        let dir = tree.create_directory("dir", old.clone()).unwrap();
        let replacement = tree.create_file("c").unwrap();

        tree.set_children(dir, vec![old[1], replacement]).unwrap();

        assert_eq!(tree.children(dir).unwrap(), vec![old[1], replacement]);
        assert_eq!(tree.parent(old[0]).unwrap(), None);
        assert_eq!(tree.parent(old[1]).unwrap(), Some(dir));
        assert_eq!(tree.parent(replacement).unwrap(), Some(dir));
    }

    #[test]
    fn set_children_to_empty_clears_the_directory() {
        let mut tree = Tree::new();
        let old = files(&mut tree, &["a"]);
        let dir = tree.create_directory("dir", old.clone()).unwrap();

        tree.set_children(dir, Vec::new()).unwrap();

        assert_eq!(tree.child_count(dir).unwrap(), 0);
        assert_eq!(tree.parent(old[0]).unwrap(), None);
    }

    #[test]
    fn discarded_handles_become_stale() {
        let mut tree = Tree::new();
        let leaf = tree.create_file("leaf").unwrap();
        let dir = tree.create_directory("dir", vec![leaf]).unwrap();

        tree.discard(dir).unwrap();

        assert!(tree.is_empty());
        assert_eq!(tree.key(dir), Err(StructuralError::StaleNode { id: dir }));
        assert!(!tree.contains(leaf));

        let reused = tree.create_file("new").unwrap();
        assert!(reused.index() == dir.index() || reused.index() == leaf.index());
        assert_ne!(reused, dir);
        assert_ne!(reused, leaf);
        assert!(tree.contains(reused));
    }

    #[test]
    fn attached_nodes_cannot_be_discarded() {
        let mut tree = Tree::new();
        let leaf = tree.create_file("leaf").unwrap();
        tree.create_directory("dir", vec![leaf]).unwrap();

        assert!(matches!(
            tree.discard(leaf),
            Err(StructuralError::AlreadyAttached { .. })
        ));
    }

    #[rstest]
    #[case(&[], "0")]
    #[case(&["0", "1", "2"], "3")]
    #[case(&["title", "7"], "8")]
    #[case(&["title"], "0")]
    fn suggests_one_past_the_largest_numeric_key(#[case] keys: &[&str], #[case] expected: &str) {
        let mut tree = Tree::new();
        let children = files(&mut tree, keys);
        let dir = tree.create_directory("dir", children).unwrap();

        assert_eq!(tree.suggest_unused_key(dir).unwrap(), expected);
    }

    #[test]
    fn suggest_unused_key_needs_a_directory() {
        let mut tree = Tree::new();
        let file = tree.create_file("f").unwrap();

        assert!(matches!(
            tree.suggest_unused_key(file),
            Err(StructuralError::NotDirectory { .. })
        ));
    }

    #[test]
    fn import_mirrors_the_container() {
        let mut layers = Entry::directory();
        let _ = layers.insert_entry("0".into(), Entry::file(b"circle".to_vec()));
        let mut root = Entry::directory();
        let _ = root.insert_entry("layers".into(), layers);
        let _ = root.insert_entry("title".into(), Entry::file(b"Bounce".to_vec()));

        let mut tree = Tree::new();
        let doc = tree.import("doc", &root).unwrap();

        assert_eq!(tree.key(doc).unwrap(), "doc");
        assert_eq!(tree.child_count(doc).unwrap(), 2);
        let layer = tree.resolve(doc, "layers/0").unwrap().unwrap();
        assert_eq!(tree.contents(layer).unwrap(), Some(&b"circle"[..]));
        assert_eq!(tree.path_of(layer).unwrap(), "layers/0");
        let layers = tree.parent(layer).unwrap().unwrap();
        assert_eq!(tree.parent(layers).unwrap(), Some(doc));
    }

    #[rstest]
    #[case("")]
    #[case(".")]
    #[case("..")]
    #[case("a/b")]
    fn keys_must_be_single_path_components(#[case] key: &str) {
        let mut tree = Tree::new();
        let expected = Err(StructuralError::InvalidKey { key: key.into() });

        assert_eq!(tree.create_file(key), expected);
        assert_eq!(tree.create_file_with_contents(key, "x"), expected);
        assert_eq!(tree.create_directory(key, Vec::new()), expected);
        assert_eq!(tree.import(key, &Entry::directory()), expected);
        assert!(tree.is_empty());
    }

    #[test]
    fn import_rejects_nested_invalid_names_before_allocating() {
        let mut layers = Entry::directory();
        let _ = layers.insert_entry("..".into(), Entry::file(b"up".to_vec()));
        let mut root = Entry::directory();
        let _ = root.insert_entry("keep".into(), Entry::file(b"k".to_vec()));
        let _ = root.insert_entry("layers".into(), layers);

        let mut tree = Tree::new();
        let result = tree.import("scene", &root);

        assert_eq!(result, Err(StructuralError::InvalidKey { key: "..".into() }));
        assert!(tree.is_empty());
    }

    #[test]
    fn importing_a_file_container_keeps_its_bytes() {
        let mut tree = Tree::new();
        let node = tree
            .import("title", &Entry::file(b"Bounce".to_vec()))
            .unwrap();

        assert!(!tree.is_directory(node).unwrap());
        assert_eq!(tree.contents(node).unwrap(), Some(&b"Bounce"[..]));
        assert_eq!(tree.child_count(node).unwrap(), 0);
        assert!(tree.children(node).unwrap().is_empty());
        assert_eq!(tree.parent(node).unwrap(), None);
    }

    #[test]
    fn resolve_through_a_file_is_none() {
        let mut tree = Tree::new();
        let file = tree.create_file_with_contents("f", "x").unwrap();
        let dir = tree.create_directory("dir", vec![file]).unwrap();

        assert_eq!(tree.resolve(dir, "f/g").unwrap(), None);
        assert_eq!(tree.resolve(dir, "").unwrap(), Some(dir));
    }
}
