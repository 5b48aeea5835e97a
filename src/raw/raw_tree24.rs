use core::fmt;

use log::{debug, trace};
use smallvec::SmallVec;

use super::arena::Arena;
use super::handle::Handle;
use super::node::{Node, SearchResult};
use crate::Key;
use crate::error::{Error, Result};

/// The core (2,4) tree backing `Tree24`.
pub(crate) struct RawTree24 {
    /// Node store; owns every node reachable from `root`.
    nodes: Arena<Node>,
    /// Always allocated. An empty tree is a root leaf with no keys.
    root: Handle,
    /// Total number of keys in the tree.
    len: usize,
}

/// Path element for tracking traversal during mutations.
struct PathElement {
    /// Handle to the node at this level.
    node: Handle,
    /// Index of the child we descended into.
    child_index: usize,
}

/// Type alias for a path through the tree (stack of path elements).
type Path = SmallVec<[PathElement; 16]>;

/// Where a root-to-leaf descent stopped.
enum Descent {
    /// The key sits at `index` in `node`, which may be internal.
    Found { node: Handle, index: usize },
    /// The key is absent; `index` is its insertion point in the leaf `node`.
    Leaf { node: Handle, index: usize },
}

impl RawTree24 {
    pub(crate) fn new() -> Self {
        let mut nodes = Arena::new();
        let root = nodes.alloc(Node::new());
        Self { nodes, root, len: 0 }
    }

    /// Creates an empty tree with node slots reserved for roughly `capacity` keys.
    pub(crate) fn with_capacity(capacity: usize) -> Result<Self> {
        // Nodes average about two keys; one more slot for the root.
        let mut nodes = Arena::with_capacity(capacity.div_ceil(2).saturating_add(1))?;
        let root = nodes.alloc(Node::new());
        Ok(Self { nodes, root, len: 0 })
    }

    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of live nodes in the node store.
    pub(crate) const fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of node levels; a lone root counts as one.
    pub(crate) fn height(&self) -> usize {
        let mut height = 1;
        let mut current = self.nodes.get(self.root);
        while !current.is_leaf() {
            current = self.nodes.get(current.child(0));
            height += 1;
        }
        height
    }

    /// Drops every node and starts over with an empty root.
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = self.nodes.alloc(Node::new());
        self.len = 0;
    }

    /// Descends from the root toward `key`, recording each internal step in `path`.
    fn descend(&self, key: Key, mut path: Option<&mut Path>) -> Descent {
        let mut current = self.root;

        loop {
            let node = self.nodes.get(current);
            match node.search(key) {
                SearchResult::Found(index) => return Descent::Found { node: current, index },
                SearchResult::GoDown(index) => {
                    if node.is_leaf() {
                        return Descent::Leaf { node: current, index };
                    }
                    if let Some(path) = path.as_mut() {
                        path.push(PathElement {
                            node: current,
                            child_index: index,
                        });
                    }
                    current = node.child(index);
                }
            }
        }
    }

    /// Returns true if the tree contains `key`.
    pub(crate) fn contains(&self, key: Key) -> bool {
        matches!(self.descend(key, None), Descent::Found { .. })
    }

    fn leftmost_leaf(&self, mut current: Handle) -> Handle {
        loop {
            let node = self.nodes.get(current);
            if node.is_leaf() {
                return current;
            }
            current = node.child(0);
        }
    }

    fn rightmost_leaf(&self, mut current: Handle) -> Handle {
        loop {
            let node = self.nodes.get(current);
            if node.is_leaf() {
                return current;
            }
            current = node.child(node.child_count() - 1);
        }
    }

    pub(crate) fn first(&self) -> Result<Key> {
        if self.is_empty() {
            return Err(Error::Empty);
        }
        Ok(self.nodes.get(self.leftmost_leaf(self.root)).key(0))
    }

    pub(crate) fn last(&self) -> Result<Key> {
        if self.is_empty() {
            return Err(Error::Empty);
        }
        let leaf = self.nodes.get(self.rightmost_leaf(self.root));
        Ok(leaf.key(leaf.key_count() - 1))
    }

    /// Inserts `key`, splitting over-full nodes on the way back up.
    pub(crate) fn insert(&mut self, key: Key) -> Result<Key> {
        let mut path: Path = SmallVec::new();
        let (leaf, index) = match self.descend(key, Some(&mut path)) {
            Descent::Found { .. } => return Err(Error::Duplicate(key)),
            Descent::Leaf { node, index } => (node, index),
        };

        if self.nodes.get(leaf).is_full() {
            // Worst case: one new sibling per level plus a new root. Reserving up front means the
            // cascade below never allocates fallibly.
            self.nodes.try_reserve(path.len() + 2)?;
        }

        let node = self.nodes.get_mut(leaf);
        node.insert_key(index, key);
        if node.is_overflowing() {
            self.split_and_propagate(leaf, &mut path);
        } else {
            self.increment_sizes_along_path(&path);
        }

        self.len += 1;
        Ok(key)
    }

    /// Splits `node` and every ancestor that overflows as a result.
    fn split_and_propagate(&mut self, node: Handle, path: &mut Path) {
        let mut current = node;

        loop {
            let (median, right) = self.nodes.get_mut(current).split();
            let left_size = self.nodes.get(current).subtree_size();
            let right_size = right.subtree_size();
            let moved: SmallVec<[Handle; 2]> = right.children().iter().copied().collect();

            let right_handle = self.nodes.alloc(right);
            for child in moved {
                self.nodes.get_mut(child).set_parent(Some(right_handle));
            }
            trace!("split {current:?}: promoted {median} with new sibling {right_handle:?}");

            let Some(elem) = path.pop() else {
                self.grow_root(current, left_size, median, right_handle, right_size);
                return;
            };

            let parent = self.nodes.get_mut(elem.node);
            parent.set_child_size(elem.child_index, left_size);
            parent.insert_child(elem.child_index, median, right_handle, right_size);
            if !parent.is_overflowing() {
                self.increment_sizes_along_path(path);
                return;
            }
            current = elem.node;
        }
    }

    /// Places a new root above the two halves of the old one.
    fn grow_root(&mut self, left: Handle, left_size: usize, median: Key, right: Handle, right_size: usize) {
        let mut root = Node::new();
        root.push_first_child(left, left_size);
        root.insert_child(0, median, right, right_size);

        let root_handle = self.nodes.alloc(root);
        self.nodes.get_mut(left).set_parent(Some(root_handle));
        self.nodes.get_mut(right).set_parent(Some(root_handle));
        self.root = root_handle;
        debug!("root split, tree height is now {}", self.height());
    }

    /// Increments the counter of every child slot on the path after a plain insertion.
    fn increment_sizes_along_path(&mut self, path: &Path) {
        for elem in path {
            let node = self.nodes.get_mut(elem.node);
            let size = node.child_size(elem.child_index) + 1;
            node.set_child_size(elem.child_index, size);
        }
    }

    fn decrement_sizes_along_path(&mut self, path: &Path) {
        for elem in path {
            let node = self.nodes.get_mut(elem.node);
            let size = node.child_size(elem.child_index) - 1;
            node.set_child_size(elem.child_index, size);
        }
    }

    /// Removes `key`, rotating or fusing under-full nodes on the way back up.
    pub(crate) fn remove(&mut self, key: Key) -> Result<Key> {
        if self.is_empty() {
            return Err(Error::Empty);
        }

        let mut path: Path = SmallVec::new();
        let (node, index) = match self.descend(key, Some(&mut path)) {
            Descent::Leaf { .. } => return Err(Error::NotFound(key)),
            Descent::Found { node, index } => (node, index),
        };

        let leaf = if self.nodes.get(node).is_leaf() {
            self.nodes.get_mut(node).remove_key(index);
            node
        } else {
            // Swap in the in-order predecessor so only a leaf ever loses a key.
            let leaf = self.predecessor_leaf(node, index, &mut path);
            let (predecessor, _) = self.nodes.get_mut(leaf).pop_last();
            self.nodes.get_mut(node).set_key(index, predecessor);
            leaf
        };

        // Every subtree on the path lost exactly one key. Rotations and fusions below move keys
        // between siblings of one parent, so counters above that parent stay correct.
        self.decrement_sizes_along_path(&path);
        self.len -= 1;
        self.repair_underflow(leaf, &mut path);

        Ok(key)
    }

    /// Follows the rightmost chain of the child left of `node.keys[index]` down to a leaf.
    fn predecessor_leaf(&self, node: Handle, index: usize, path: &mut Path) -> Handle {
        path.push(PathElement {
            node,
            child_index: index,
        });
        let mut current = self.nodes.get(node).child(index);

        loop {
            let node = self.nodes.get(current);
            if node.is_leaf() {
                return current;
            }
            let last = node.child_count() - 1;
            path.push(PathElement {
                node: current,
                child_index: last,
            });
            current = node.child(last);
        }
    }

    fn repair_underflow(&mut self, node: Handle, path: &mut Path) {
        let mut current = node;

        while self.nodes.get(current).key_count() == 0 {
            let Some(PathElement {
                node: parent,
                child_index: position,
            }) = path.pop()
            else {
                self.shrink_root();
                return;
            };

            if position > 0 {
                let left = self.nodes.get(parent).child(position - 1);
                if self.nodes.get(left).key_count() >= 2 {
                    self.rotate_from_left(parent, position);
                    return;
                }
                self.fuse_into_left(parent, position);
            } else {
                let right = self.nodes.get(parent).child(position + 1);
                if self.nodes.get(right).key_count() >= 2 {
                    self.rotate_from_right(parent, position);
                    return;
                }
                self.fuse_right_sibling(parent, position);
            }

            current = parent;
        }
    }

    /// Replaces an empty root by its only child.
    fn shrink_root(&mut self) {
        let root = self.nodes.get(self.root);
        if root.key_count() > 0 || root.child_count() != 1 {
            return;
        }

        let child = root.child(0);
        self.nodes.free(self.root);
        self.nodes.get_mut(child).set_parent(None);
        self.root = child;
        debug!("root collapsed, tree height is now {}", self.height());
    }

    /// Recomputes the counter of `parent.children[index]` from the child itself.
    fn refresh_child_size(&mut self, parent: Handle, index: usize) {
        let child = self.nodes.get(parent).child(index);
        let size = self.nodes.get(child).subtree_size();
        self.nodes.get_mut(parent).set_child_size(index, size);
    }

    /// Moves the left sibling's largest key up into the parent and the separator down.
    fn rotate_from_left(&mut self, parent: Handle, position: usize) {
        let (left, node) = {
            let parent = self.nodes.get(parent);
            (parent.child(position - 1), parent.child(position))
        };

        let (borrowed, child) = self.nodes.get_mut(left).pop_last();
        let separator = self.nodes.get(parent).key(position - 1);
        self.nodes.get_mut(parent).set_key(position - 1, borrowed);
        self.nodes.get_mut(node).push_front((separator, child));
        if let Some((moved, _)) = child {
            self.nodes.get_mut(moved).set_parent(Some(node));
        }

        self.refresh_child_size(parent, position - 1);
        self.refresh_child_size(parent, position);
        trace!("rotated {borrowed} up from {left:?}, {separator} down into {node:?}");
    }

    /// Moves the right sibling's smallest key up into the parent and the separator down.
    fn rotate_from_right(&mut self, parent: Handle, position: usize) {
        let (node, right) = {
            let parent = self.nodes.get(parent);
            (parent.child(position), parent.child(position + 1))
        };

        let (borrowed, child) = self.nodes.get_mut(right).pop_first();
        let separator = self.nodes.get(parent).key(position);
        self.nodes.get_mut(parent).set_key(position, borrowed);
        self.nodes.get_mut(node).push_back((separator, child));
        if let Some((moved, _)) = child {
            self.nodes.get_mut(moved).set_parent(Some(node));
        }

        self.refresh_child_size(parent, position);
        self.refresh_child_size(parent, position + 1);
        trace!("rotated {borrowed} up from {right:?}, {separator} down into {node:?}");
    }

    /// Fuses the empty node at `position` into its single-key left sibling.
    fn fuse_into_left(&mut self, parent: Handle, position: usize) {
        let (separator, node, _) = self.nodes.get_mut(parent).remove_child(position - 1);
        let left = self.nodes.get(parent).child(position - 1);
        self.absorb(left, separator, node);
        self.refresh_child_size(parent, position - 1);
    }

    /// Fuses the single-key right sibling into the empty node at `position`.
    fn fuse_right_sibling(&mut self, parent: Handle, position: usize) {
        let (separator, right, _) = self.nodes.get_mut(parent).remove_child(position);
        let node = self.nodes.get(parent).child(position);
        self.absorb(node, separator, right);
        self.refresh_child_size(parent, position);
    }

    /// Merges `right` into `keeper` around `separator` and destroys `right`.
    fn absorb(&mut self, keeper: Handle, separator: Key, right: Handle) {
        let right_node = self.nodes.take(right);
        let moved: SmallVec<[Handle; 2]> = right_node.children().iter().copied().collect();
        self.nodes.get_mut(keeper).merge_with_right(separator, right_node);
        for child in moved {
            self.nodes.get_mut(child).set_parent(Some(keeper));
        }
        trace!("fused {right:?} into {keeper:?} around {separator}");
    }

    /// Returns the `rank`-th smallest key, counting from one.
    pub(crate) fn select(&self, rank: usize) -> Result<&Key> {
        if self.is_empty() {
            return Err(Error::Empty);
        }
        if rank == 0 || rank > self.len {
            return Err(Error::RankOutOfRange { rank, len: self.len });
        }

        let mut current = self.root;
        let mut remaining = rank;

        loop {
            let node = self.nodes.get(current);
            if node.is_leaf() {
                return Ok(&node.keys()[remaining - 1]);
            }

            let mut next = None;
            for i in 0..node.child_count() {
                let size = node.child_size(i);
                if remaining <= size {
                    next = Some(node.child(i));
                    break;
                }
                remaining -= size;
                if remaining == 1 && i < node.key_count() {
                    return Ok(&node.keys()[i]);
                }
                remaining -= 1;
            }
            debug_assert!(
                next.is_some(),
                "select: child size counters disagree with len {} at rank {rank}",
                self.len
            );
            current = next.ok_or(Error::RankOutOfRange { rank, len: self.len })?;
        }
    }

    /// Returns the one-based rank of `key`.
    pub(crate) fn rank_of(&self, key: Key) -> Result<usize> {
        if self.is_empty() {
            return Err(Error::Empty);
        }

        let mut current = self.root;
        let mut rank = 0;

        loop {
            let node = self.nodes.get(current);
            match node.search(key) {
                SearchResult::Found(index) => {
                    let below: usize = node.child_sizes().iter().take(index + 1).sum();
                    return Ok(rank + below + index + 1);
                }
                SearchResult::GoDown(index) => {
                    if node.is_leaf() {
                        return Err(Error::NotFound(key));
                    }
                    // Children left of the descent, plus the keys separating them.
                    rank += node.child_sizes()[..index].iter().sum::<usize>() + index;
                    current = node.child(index);
                }
            }
        }
    }

    /// Position of the smallest key, if any.
    pub(crate) fn first_position(&self) -> Option<(Handle, usize)> {
        if self.is_empty() {
            None
        } else {
            Some((self.leftmost_leaf(self.root), 0))
        }
    }

    pub(crate) fn key_at(&self, (node, index): (Handle, usize)) -> Key {
        self.nodes.get(node).key(index)
    }

    /// Position of the in-order successor of `node.keys[index]`.
    pub(crate) fn successor(&self, (node, index): (Handle, usize)) -> Option<(Handle, usize)> {
        let current = self.nodes.get(node);
        if !current.is_leaf() {
            return Some((self.leftmost_leaf(current.child(index + 1)), 0));
        }
        if index + 1 < current.key_count() {
            return Some((node, index + 1));
        }

        // Climb until we arrive from a child that has a key to its right.
        let mut child = node;
        while let Some(parent) = self.nodes.get(child).parent() {
            let parent_node = self.nodes.get(parent);
            let position = parent_node
                .position_of(child)
                .expect("`RawTree24::successor()` - parent link is stale!");
            if position < parent_node.key_count() {
                return Some((parent, position));
            }
            child = parent;
        }
        None
    }

    /// Writes one line per node, pre-order, indented by depth.
    pub(crate) fn fmt_structure(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut label: SmallVec<[usize; 16]> = SmallVec::new();
        self.fmt_node(f, self.root, &mut label)
    }

    fn fmt_node(&self, f: &mut fmt::Formatter<'_>, handle: Handle, label: &mut SmallVec<[usize; 16]>) -> fmt::Result {
        let node = self.nodes.get(handle);
        write!(f, "{:indent$}[root", "", indent = label.len() * 4)?;
        for position in label.iter() {
            write!(f, ".{position}")?;
        }
        write!(f, "] {} keys:", node.key_count())?;
        for key in node.keys() {
            write!(f, " {key}")?;
        }
        writeln!(f)?;

        for (position, &child) in node.children().iter().enumerate() {
            label.push(position);
            self.fmt_node(f, child, label)?;
            label.pop();
        }
        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
mod tests {
    use super::*;
    use crate::raw::node::MAX_KEYS;
    use alloc::collections::BTreeSet;
    use alloc::string::String;
    use alloc::vec::Vec;
    use proptest::prelude::*;

    impl RawTree24 {
        /// Validates every structural invariant. Panics with a descriptive message on violation.
        pub(crate) fn validate_invariants(&self) {
            let mut errors: Vec<String> = Vec::new();
            let mut leaf_depth: Option<usize> = None;
            let mut visited = 0usize;

            if self.nodes.get(self.root).parent().is_some() {
                errors.push("root has a parent link".into());
            }

            let counted = self.validate_node(self.root, 0, None, None, &mut leaf_depth, &mut visited, &mut errors);
            if counted != self.len {
                errors.push(alloc::format!("len mismatch: self.len={}, counted={counted}", self.len));
            }
            if visited != self.nodes.len() {
                errors.push(alloc::format!(
                    "node store holds {} nodes but {visited} are reachable",
                    self.nodes.len()
                ));
            }

            assert!(errors.is_empty(), "Tree invariant violations:\n{}", errors.join("\n"));
        }

        #[allow(clippy::too_many_arguments)]
        fn validate_node(
            &self,
            handle: Handle,
            depth: usize,
            lower: Option<Key>,
            upper: Option<Key>,
            leaf_depth: &mut Option<usize>,
            visited: &mut usize,
            errors: &mut Vec<String>,
        ) -> usize {
            let node = self.nodes.get(handle);
            let is_root = handle == self.root;
            *visited += 1;

            if node.key_count() > MAX_KEYS || (!is_root && node.key_count() == 0) {
                errors.push(alloc::format!("{handle:?} holds {} keys", node.key_count()));
            }
            if is_root && node.key_count() == 0 && !node.is_leaf() {
                errors.push("empty root still has children".into());
            }
            for pair in node.keys().windows(2) {
                if pair[0] >= pair[1] {
                    errors.push(alloc::format!("{handle:?} keys not ascending: {:?}", node.keys()));
                }
            }
            for &key in node.keys() {
                if lower.is_some_and(|lo| key <= lo) || upper.is_some_and(|hi| key >= hi) {
                    errors.push(alloc::format!("{handle:?} key {key} outside ({lower:?}, {upper:?})"));
                }
            }

            if node.is_leaf() {
                match *leaf_depth {
                    None => *leaf_depth = Some(depth),
                    Some(expected) if expected != depth => {
                        errors.push(alloc::format!("leaf {handle:?} at depth {depth}, expected {expected}"));
                    }
                    Some(_) => {}
                }
                if !node.child_sizes().is_empty() {
                    errors.push(alloc::format!("leaf {handle:?} has child counters"));
                }
                return node.key_count();
            }

            if node.child_count() != node.key_count() + 1 || node.child_sizes().len() != node.child_count() {
                errors.push(alloc::format!(
                    "{handle:?} has {} keys, {} children, {} counters",
                    node.key_count(),
                    node.child_count(),
                    node.child_sizes().len()
                ));
                return node.key_count();
            }

            let mut total = node.key_count();
            for (i, &child) in node.children().iter().enumerate() {
                if self.nodes.get(child).parent() != Some(handle) {
                    errors.push(alloc::format!("{child:?} does not link back to parent {handle:?}"));
                }
                let lo = if i == 0 { lower } else { Some(node.key(i - 1)) };
                let hi = if i < node.key_count() { Some(node.key(i)) } else { upper };
                let actual = self.validate_node(child, depth + 1, lo, hi, leaf_depth, visited, errors);
                if node.child_size(i) != actual {
                    errors.push(alloc::format!(
                        "{handle:?} child {i}: stored size {}, actual {actual}",
                        node.child_size(i)
                    ));
                }
                total += actual;
            }
            total
        }

        fn keys(&self) -> Vec<Key> {
            let mut keys = Vec::with_capacity(self.len);
            let mut position = self.first_position();
            while let Some(at) = position {
                keys.push(self.key_at(at));
                position = self.successor(at);
            }
            keys
        }
    }

    fn tree_from(keys: impl IntoIterator<Item = Key>) -> RawTree24 {
        let mut tree = RawTree24::new();
        for key in keys {
            tree.insert(key).unwrap();
            tree.validate_invariants();
        }
        tree
    }

    #[derive(Clone, Debug)]
    enum Op {
        Insert(Key),
        Remove(Key),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (0i64..1000).prop_map(Op::Insert),
            2 => (0i64..1000).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn invariants_hold_after_every_operation(ops in prop::collection::vec(op_strategy(), 0..500)) {
            let mut tree = RawTree24::new();
            let mut model: BTreeSet<Key> = BTreeSet::new();

            for op in ops {
                match op {
                    Op::Insert(key) => {
                        let expected = if model.insert(key) { Ok(key) } else { Err(Error::Duplicate(key)) };
                        prop_assert_eq!(tree.insert(key), expected);
                    }
                    Op::Remove(key) => {
                        let expected = if model.is_empty() {
                            Err(Error::Empty)
                        } else if model.remove(&key) {
                            Ok(key)
                        } else {
                            Err(Error::NotFound(key))
                        };
                        prop_assert_eq!(tree.remove(key), expected);
                    }
                }
                tree.validate_invariants();
            }

            prop_assert_eq!(tree.keys(), model.iter().copied().collect::<Vec<_>>());
        }

        #[test]
        fn select_matches_sorted_order(ops in prop::collection::vec(op_strategy(), 1..400)) {
            let mut tree = RawTree24::new();
            let mut model: BTreeSet<Key> = BTreeSet::new();

            for op in ops {
                match op {
                    Op::Insert(key) => {
                        model.insert(key);
                        let _ = tree.insert(key);
                    }
                    Op::Remove(key) => {
                        model.remove(&key);
                        let _ = tree.remove(key);
                    }
                }
            }
            tree.validate_invariants();

            for (i, &key) in model.iter().enumerate() {
                prop_assert_eq!(tree.select(i + 1), Ok(&key), "select({})", i + 1);
                prop_assert_eq!(tree.rank_of(key), Ok(i + 1), "rank_of({})", key);
            }
            if !model.is_empty() {
                prop_assert_eq!(tree.select(0), Err(Error::RankOutOfRange { rank: 0, len: model.len() }));
                prop_assert_eq!(
                    tree.select(model.len() + 1),
                    Err(Error::RankOutOfRange { rank: model.len() + 1, len: model.len() })
                );
            }
        }

        #[test]
        fn insert_then_delete_restores_keys(keys in prop::collection::vec(0i64..300, 0..150), extra in 300i64..400) {
            let mut tree = RawTree24::new();
            for key in keys {
                let _ = tree.insert(key);
            }
            let before = tree.keys();

            prop_assert_eq!(tree.insert(extra), Ok(extra));
            prop_assert_eq!(tree.remove(extra), Ok(extra));
            tree.validate_invariants();
            prop_assert_eq!(tree.keys(), before);
        }
    }

    #[test]
    fn empty_tree_reports_empty() {
        let mut tree = RawTree24::new();
        tree.validate_invariants();
        assert!(!tree.contains(1));
        assert_eq!(tree.remove(1), Err(Error::Empty));
        assert_eq!(tree.select(1), Err(Error::Empty));
        assert_eq!(tree.rank_of(1), Err(Error::Empty));
        assert_eq!(tree.first(), Err(Error::Empty));
        assert_eq!(tree.first_position(), None);
        assert_eq!(tree.height(), 1);
    }

    #[test]
    fn fourth_key_splits_root() {
        let mut tree = tree_from([10, 20, 30]);
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.node_count(), 1);

        tree.insert(40).unwrap();
        tree.validate_invariants();
        assert_eq!(tree.height(), 2);
        assert_eq!(tree.node_count(), 3);

        let root = tree.nodes.get(tree.root);
        assert_eq!(root.keys(), &[30]);
        assert_eq!(root.child_sizes(), &[2, 1]);
        assert_eq!(tree.nodes.get(root.child(0)).keys(), &[10, 20]);
        assert_eq!(tree.nodes.get(root.child(1)).keys(), &[40]);
    }

    #[test]
    fn worked_example() {
        let mut tree = tree_from([10, 20, 5, 6, 12, 30, 7, 17]);
        assert_eq!(tree.len(), 8);
        assert_eq!(tree.keys(), [5, 6, 7, 10, 12, 17, 20, 30]);
        assert_eq!(tree.select(1), Ok(&5));
        assert_eq!(tree.select(4), Ok(&10));
        assert_eq!(tree.select(8), Ok(&30));

        assert_eq!(tree.remove(10), Ok(10));
        tree.validate_invariants();
        assert_eq!(tree.keys(), [5, 6, 7, 12, 17, 20, 30]);
        assert_eq!(tree.len(), 7);
        assert!(!tree.contains(10));
        assert_eq!(tree.select(4), Ok(&12));
        assert_eq!(tree.select(5), Ok(&17));
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let mut tree = tree_from([5]);
        assert_eq!(tree.insert(5), Err(Error::Duplicate(5)));
        assert_eq!(tree.len(), 1);
        tree.validate_invariants();
    }

    #[test]
    fn duplicate_of_internal_key_is_rejected() {
        let mut tree = tree_from(0..20);
        let separator = tree.nodes.get(tree.root).key(0);
        assert_eq!(tree.insert(separator), Err(Error::Duplicate(separator)));
        assert_eq!(tree.len(), 20);
        tree.validate_invariants();
    }

    #[test]
    fn delete_internal_key_uses_predecessor() {
        let mut tree = tree_from([10, 20, 30, 40, 50]);
        // Root is [30] over [10, 20] and [40, 50].
        assert_eq!(tree.nodes.get(tree.root).keys(), &[30]);
        tree.remove(30).unwrap();
        tree.validate_invariants();
        assert_eq!(tree.nodes.get(tree.root).keys(), &[20]);
        assert_eq!(tree.keys(), [10, 20, 40, 50]);
    }

    #[test]
    fn leaf_underflow_rotates_from_left() {
        let mut tree = tree_from([10, 20, 30, 40]);
        // Root [30] over [10, 20] and [40].
        tree.remove(40).unwrap();
        tree.validate_invariants();
        let root = tree.nodes.get(tree.root);
        assert_eq!(root.keys(), &[20]);
        assert_eq!(tree.nodes.get(root.child(0)).keys(), &[10]);
        assert_eq!(tree.nodes.get(root.child(1)).keys(), &[30]);
        assert_eq!(root.child_sizes(), &[1, 1]);
    }

    #[test]
    fn leaf_underflow_rotates_from_right() {
        let mut tree = tree_from([10, 20, 30, 40, 50]);
        tree.remove(10).unwrap();
        tree.remove(20).unwrap();
        tree.validate_invariants();
        let root = tree.nodes.get(tree.root);
        assert_eq!(root.keys(), &[40]);
        assert_eq!(tree.nodes.get(root.child(0)).keys(), &[30]);
        assert_eq!(tree.nodes.get(root.child(1)).keys(), &[50]);
    }

    #[test]
    fn fusion_collapses_root() {
        let mut tree = tree_from([10, 20, 30, 40]);
        tree.remove(10).unwrap();
        tree.validate_invariants();
        assert_eq!(tree.height(), 2);

        // Root [30] over [20] and [40]: deleting 40 must fuse and drop a level.
        tree.remove(40).unwrap();
        tree.validate_invariants();
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.keys(), [20, 30]);
    }

    #[test]
    fn cascading_fusion_through_internal_nodes() {
        let mut tree = tree_from(0..64);
        let height = tree.height();
        assert!(height >= 3);

        for key in 0..64 {
            tree.remove(key).unwrap();
            tree.validate_invariants();
            for rank in 1..=tree.len() {
                assert_eq!(tree.select(rank), Ok(&(key + rank as Key)));
            }
        }
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn descending_deletes_from_the_right() {
        let mut tree = tree_from((0..200).map(|i| (i * 37) % 200));
        for key in (0..200).rev() {
            assert_eq!(tree.remove(key), Ok(key));
            tree.validate_invariants();
            if key > 0 {
                assert_eq!(tree.last(), Ok(key - 1));
            }
        }
    }

    #[test]
    fn missing_key_delete_is_a_no_op() {
        let mut tree = tree_from([1, 3, 5, 7, 9]);
        assert_eq!(tree.remove(4), Err(Error::NotFound(4)));
        assert_eq!(tree.len(), 5);
        tree.validate_invariants();
    }

    #[test]
    fn insert_reports_out_of_memory_without_touching_tree() {
        let mut tree = RawTree24::new();
        let mut failed = None;
        for key in 0..1_000_000 {
            match tree.insert(key) {
                Ok(_) => {}
                Err(err) => {
                    failed = Some((key, err));
                    break;
                }
            }
        }

        let (key, err) = failed.expect("node store should run out of handles");
        assert_eq!(err, Error::OutOfMemory);
        assert_eq!(tree.len() as Key, key);
        assert!(!tree.contains(key));
        tree.validate_invariants();
    }

    #[test]
    fn structure_lists_nodes_by_path() {
        struct Dump<'a>(&'a RawTree24);
        impl fmt::Display for Dump<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt_structure(f)
            }
        }

        let tree = tree_from([10, 20, 30, 40]);
        let dump = alloc::format!("{}", Dump(&tree));
        assert_eq!(dump, "[root] 1 keys: 30\n    [root.0] 2 keys: 10 20\n    [root.1] 1 keys: 40\n");
    }

    #[test]
    fn clear_resets_to_empty_root() {
        let mut tree = tree_from(0..50);
        tree.clear();
        tree.validate_invariants();
        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 1);
        tree.insert(3).unwrap();
        assert_eq!(tree.keys(), [3]);
    }
}
