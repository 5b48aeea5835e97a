use smallvec::SmallVec;

use super::handle::Handle;
use crate::Key;

pub(crate) const MAX_KEYS: usize = 3;
pub(crate) const MAX_CHILDREN: usize = MAX_KEYS + 1;

// Keys kept by the left half of a split; the next key is promoted.
const SPLIT_KEEP: usize = 2;

/// A 2-, 3- or 4-node.
///
/// Internal nodes own `keys.len() + 1` children; leaves own none. `child_sizes[i]` is the number
/// of keys stored anywhere in the subtree below `children[i]`.
pub(crate) struct Node {
    // Non-owning; `None` for the root.
    parent: Option<Handle>,
    // +1 holds the transient overflow key before a split.
    keys: SmallVec<[Key; MAX_KEYS + 1]>,
    children: SmallVec<[Handle; MAX_CHILDREN + 1]>,
    child_sizes: SmallVec<[usize; MAX_CHILDREN + 1]>,
}

/// Result of searching for a key in a node.
pub(crate) enum SearchResult {
    /// Key was found at the given index.
    Found(usize),
    /// Key is absent; the index is both its insertion point and the child to descend into.
    GoDown(usize),
}

/// A key together with the child that travels with it during a rotation.
pub(crate) type Entry = (Key, Option<(Handle, usize)>);

impl Node {
    pub(crate) fn new() -> Self {
        Self {
            parent: None,
            keys: SmallVec::new(),
            children: SmallVec::new(),
            child_sizes: SmallVec::new(),
        }
    }

    pub(crate) fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub(crate) fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn child_count(&self) -> usize {
        self.children.len()
    }

    /// True when one more key would overflow the node.
    pub(crate) fn is_full(&self) -> bool {
        self.keys.len() >= MAX_KEYS
    }

    pub(crate) fn is_overflowing(&self) -> bool {
        self.keys.len() > MAX_KEYS
    }

    pub(crate) fn parent(&self) -> Option<Handle> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<Handle>) {
        self.parent = parent;
    }

    #[inline]
    pub(crate) fn key(&self, index: usize) -> Key {
        self.keys[index]
    }

    pub(crate) fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub(crate) fn set_key(&mut self, index: usize, key: Key) {
        self.keys[index] = key;
    }

    #[inline]
    pub(crate) fn child(&self, index: usize) -> Handle {
        self.children[index]
    }

    pub(crate) fn children(&self) -> &[Handle] {
        &self.children
    }

    #[inline]
    pub(crate) fn child_size(&self, index: usize) -> usize {
        self.child_sizes[index]
    }

    pub(crate) fn child_sizes(&self) -> &[usize] {
        &self.child_sizes
    }

    pub(crate) fn set_child_size(&mut self, index: usize, size: usize) {
        self.child_sizes[index] = size;
    }

    /// Number of keys in the subtree rooted here: own keys plus every child counter.
    pub(crate) fn subtree_size(&self) -> usize {
        self.keys.len() + self.child_sizes.iter().sum::<usize>()
    }

    /// Index of `child` among this node's children.
    pub(crate) fn position_of(&self, child: Handle) -> Option<usize> {
        self.children.iter().position(|&c| c == child)
    }

    #[inline]
    pub(crate) fn search(&self, key: Key) -> SearchResult {
        match self.keys.binary_search(&key) {
            Ok(idx) => SearchResult::Found(idx),
            Err(idx) => SearchResult::GoDown(idx),
        }
    }

    /// Inserts a key into a leaf at `index`, shifting larger keys right.
    pub(crate) fn insert_key(&mut self, index: usize, key: Key) {
        debug_assert!(self.is_leaf(), "keys without children only go into leaves");
        self.keys.insert(index, key);
    }

    /// Removes the key at `index` from a leaf, shifting larger keys left.
    pub(crate) fn remove_key(&mut self, index: usize) -> Key {
        debug_assert!(self.is_leaf(), "keys without children only leave leaves");
        self.keys.remove(index)
    }

    /// Adds the leftmost child of a fresh root.
    pub(crate) fn push_first_child(&mut self, child: Handle, size: usize) {
        debug_assert!(self.children.is_empty());
        self.children.push(child);
        self.child_sizes.push(size);
    }

    /// Inserts `key` at `index` with `child` immediately to its right.
    pub(crate) fn insert_child(&mut self, index: usize, key: Key, child: Handle, size: usize) {
        self.keys.insert(index, key);
        self.children.insert(index + 1, child);
        self.child_sizes.insert(index + 1, size);
    }

    /// Removes `keys[index]` and the child to its right.
    pub(crate) fn remove_child(&mut self, index: usize) -> (Key, Handle, usize) {
        let key = self.keys.remove(index);
        let child = self.children.remove(index + 1);
        let size = self.child_sizes.remove(index + 1);
        (key, child, size)
    }

    /// Removes the largest key and, for internal nodes, the rightmost child.
    pub(crate) fn pop_last(&mut self) -> Entry {
        let key = self.keys.remove(self.keys.len() - 1);
        let child = match self.children.pop() {
            Some(child) => self.child_sizes.pop().map(|size| (child, size)),
            None => None,
        };
        (key, child)
    }

    /// Removes the smallest key and, for internal nodes, the leftmost child.
    pub(crate) fn pop_first(&mut self) -> Entry {
        let key = self.keys.remove(0);
        let child = if self.children.is_empty() {
            None
        } else {
            Some((self.children.remove(0), self.child_sizes.remove(0)))
        };
        (key, child)
    }

    /// Prepends a key and its child, the mirror of [`Node::pop_last`] on a left sibling.
    pub(crate) fn push_front(&mut self, (key, child): Entry) {
        self.keys.insert(0, key);
        if let Some((child, size)) = child {
            self.children.insert(0, child);
            self.child_sizes.insert(0, size);
        }
    }

    /// Appends a key and its child, the mirror of [`Node::pop_first`] on a right sibling.
    pub(crate) fn push_back(&mut self, (key, child): Entry) {
        self.keys.push(key);
        if let Some((child, size)) = child {
            self.children.push(child);
            self.child_sizes.push(size);
        }
    }

    /// Splits a 4-key node. Returns (`median`, `right`).
    ///
    /// The two smallest keys and first three children stay here; the largest key and last two
    /// children move into `right`, which inherits this node's parent.
    pub(crate) fn split(&mut self) -> (Key, Node) {
        debug_assert!(self.is_overflowing(), "only an overflowing node splits");
        let mut right = Node::new();
        right.parent = self.parent;
        right.keys = self.keys.drain(SPLIT_KEEP + 1..).collect();
        if !self.is_leaf() {
            right.children = self.children.drain(SPLIT_KEEP + 1..).collect();
            right.child_sizes = self.child_sizes.drain(SPLIT_KEEP + 1..).collect();
        }
        let median = self.keys.remove(SPLIT_KEEP);
        (median, right)
    }

    /// Absorbs a right sibling, pulling `separator` down between the two key runs.
    pub(crate) fn merge_with_right(&mut self, separator: Key, mut right: Node) {
        self.keys.push(separator);
        self.keys.append(&mut right.keys);
        self.children.append(&mut right.children);
        self.child_sizes.append(&mut right.child_sizes);
    }
}
