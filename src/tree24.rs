//! The public (2,4) tree handle.

use core::fmt;
use core::iter::FusedIterator;
use core::ops::Index;

use log::debug;

use crate::raw::{Handle, RawTree24};
use crate::{Error, Key, Rank, Result};

/// An ordered set of unique `i64` keys stored in a (2,4) tree.
///
/// Every node holds one to three keys, every leaf sits at the same depth, and each internal node
/// records how many keys live below each of its children. That last piece makes
/// [`select`](Tree24::select) and [`rank_of`](Tree24::rank_of) O(log n).
///
/// A tree can be [`destroy`](Tree24::destroy)ed, which releases every node. From then on each
/// fallible operation reports [`Error::Uninitialized`] until the tree is [`clear`](Tree24::clear)ed.
///
/// # Examples
///
/// ```
/// use tree24::{Error, Tree24};
///
/// let mut tree = Tree24::new();
/// for key in [10, 20, 5, 6, 12, 30, 7, 17] {
///     tree.insert(key).unwrap();
/// }
///
/// assert_eq!(tree.count(), Ok(8));
/// assert_eq!(tree.select(4), Ok(10));
/// assert_eq!(tree.insert(5), Err(Error::Duplicate(5)));
///
/// tree.delete(10).unwrap();
/// assert_eq!(tree.search(10), Err(Error::NotFound(10)));
/// assert_eq!(tree.iter().collect::<Vec<_>>(), [5, 6, 7, 12, 17, 20, 30]);
/// ```
pub struct Tree24 {
    raw: Option<RawTree24>,
}

/// An iterator over the keys of a [`Tree24`] in ascending order.
///
/// This `struct` is created by the [`iter`] method on [`Tree24`].
///
/// [`iter`]: Tree24::iter
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a> {
    raw: Option<&'a RawTree24>,
    front: Option<(Handle, usize)>,
    remaining: usize,
}

/// Renders the node layout of a [`Tree24`], one node per line.
///
/// This `struct` is created by the [`structure`] method on [`Tree24`].
///
/// [`structure`]: Tree24::structure
pub struct Structure<'a> {
    tree: &'a Tree24,
}

impl Tree24 {
    /// Creates an empty tree.
    ///
    /// # Examples
    ///
    /// ```
    /// use tree24::Tree24;
    ///
    /// let tree = Tree24::new();
    /// assert!(tree.is_empty());
    /// assert_eq!(tree.height(), 1);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self {
            raw: Some(RawTree24::new()),
        }
    }

    /// Creates an empty tree with node storage reserved for about `capacity` keys.
    ///
    /// # Errors
    ///
    /// [`Error::CapacityOverflow`] if the hint needs more nodes than a handle can address, or
    /// [`Error::OutOfMemory`] if the reservation fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use tree24::Tree24;
    ///
    /// let tree = Tree24::with_capacity(1_000).unwrap();
    /// assert!(tree.is_empty());
    /// assert!(Tree24::with_capacity(usize::MAX).is_err());
    /// ```
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Ok(Self {
            raw: Some(RawTree24::with_capacity(capacity)?),
        })
    }

    fn raw(&self) -> Result<&RawTree24> {
        self.raw.as_ref().ok_or(Error::Uninitialized)
    }

    fn raw_mut(&mut self) -> Result<&mut RawTree24> {
        self.raw.as_mut().ok_or(Error::Uninitialized)
    }

    /// Inserts `key` and returns it.
    ///
    /// # Errors
    ///
    /// - [`Error::Duplicate`] if the key is already stored; the tree is unchanged.
    /// - [`Error::OutOfMemory`] if a split needs a node that cannot be allocated; the tree is unchanged.
    /// - [`Error::Uninitialized`] if the tree was destroyed.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use tree24::{Error, Tree24};
    ///
    /// let mut tree = Tree24::new();
    /// assert_eq!(tree.insert(5), Ok(5));
    /// assert_eq!(tree.insert(5), Err(Error::Duplicate(5)));
    /// assert_eq!(tree.len(), 1);
    /// ```
    pub fn insert(&mut self, key: Key) -> Result<Key> {
        self.raw_mut()?.insert(key)
    }

    /// Removes `key` and returns it.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if the key is not stored.
    /// - [`Error::Empty`] if the tree holds no keys.
    /// - [`Error::Uninitialized`] if the tree was destroyed.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use tree24::{Error, Tree24};
    ///
    /// let mut tree = Tree24::from([1, 2, 3]);
    /// assert_eq!(tree.delete(2), Ok(2));
    /// assert_eq!(tree.delete(2), Err(Error::NotFound(2)));
    /// ```
    pub fn delete(&mut self, key: Key) -> Result<Key> {
        self.raw_mut()?.remove(key)
    }

    /// Looks `key` up and returns it if stored.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`], [`Error::Empty`] or [`Error::Uninitialized`]. Use
    /// [`contains`](Tree24::contains) when the reason for absence does not matter.
    ///
    /// # Examples
    ///
    /// ```
    /// use tree24::{Error, Tree24};
    ///
    /// let mut tree = Tree24::new();
    /// assert_eq!(tree.search(1), Err(Error::Empty));
    /// tree.insert(1).unwrap();
    /// assert_eq!(tree.search(1), Ok(1));
    /// assert_eq!(tree.search(2), Err(Error::NotFound(2)));
    /// ```
    pub fn search(&self, key: Key) -> Result<Key> {
        let raw = self.raw()?;
        if raw.is_empty() {
            Err(Error::Empty)
        } else if raw.contains(key) {
            Ok(key)
        } else {
            Err(Error::NotFound(key))
        }
    }

    /// Returns `true` if the tree stores `key`. A destroyed tree contains nothing.
    #[must_use]
    pub fn contains(&self, key: Key) -> bool {
        self.raw.as_ref().is_some_and(|raw| raw.contains(key))
    }

    /// Returns the `rank`-th smallest key, counting from one.
    ///
    /// # Errors
    ///
    /// [`Error::RankOutOfRange`] unless `1 <= rank <= len`; [`Error::Empty`] or
    /// [`Error::Uninitialized`] when there is nothing to select from.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use tree24::{Error, Tree24};
    ///
    /// let tree = Tree24::from([30, 10, 20]);
    /// assert_eq!(tree.select(1), Ok(10));
    /// assert_eq!(tree.select(3), Ok(30));
    /// assert_eq!(tree.select(0), Err(Error::RankOutOfRange { rank: 0, len: 3 }));
    /// assert_eq!(tree.select(4), Err(Error::RankOutOfRange { rank: 4, len: 3 }));
    /// ```
    pub fn select(&self, rank: usize) -> Result<Key> {
        self.raw()?.select(rank).copied()
    }

    /// Returns the one-based rank of `key`, the inverse of [`select`](Tree24::select).
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`], [`Error::Empty`] or [`Error::Uninitialized`].
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use tree24::Tree24;
    ///
    /// let tree = Tree24::from([30, 10, 20]);
    /// assert_eq!(tree.rank_of(20), Ok(2));
    /// assert!(tree.rank_of(25).is_err());
    /// ```
    pub fn rank_of(&self, key: Key) -> Result<usize> {
        self.raw()?.rank_of(key)
    }

    /// Returns the number of keys.
    ///
    /// Unlike [`len`](Tree24::len), an empty or destroyed tree is reported as an error rather
    /// than zero.
    ///
    /// # Errors
    ///
    /// [`Error::Empty`] or [`Error::Uninitialized`].
    ///
    /// # Examples
    ///
    /// ```
    /// use tree24::{Error, Tree24};
    ///
    /// let mut tree = Tree24::new();
    /// assert_eq!(tree.count(), Err(Error::Empty));
    /// tree.insert(7).unwrap();
    /// assert_eq!(tree.count(), Ok(1));
    /// tree.destroy();
    /// assert_eq!(tree.count(), Err(Error::Uninitialized));
    /// ```
    pub fn count(&self) -> Result<usize> {
        match self.raw()?.len() {
            0 => Err(Error::Empty),
            len => Ok(len),
        }
    }

    /// Returns the number of keys; zero for an empty or destroyed tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.raw.as_ref().map_or(0, RawTree24::len)
    }

    /// Returns `true` if the tree holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `false` once the tree has been destroyed.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.raw.is_some()
    }

    /// Returns the smallest key.
    ///
    /// # Errors
    ///
    /// [`Error::Empty`] or [`Error::Uninitialized`].
    pub fn first(&self) -> Result<Key> {
        self.raw()?.first()
    }

    /// Returns the largest key.
    ///
    /// # Errors
    ///
    /// [`Error::Empty`] or [`Error::Uninitialized`].
    pub fn last(&self) -> Result<Key> {
        self.raw()?.last()
    }

    /// Returns the number of node levels: 1 for a lone root, 0 once destroyed.
    ///
    /// # Examples
    ///
    /// ```
    /// use tree24::Tree24;
    ///
    /// let mut tree = Tree24::from([1, 2, 3]);
    /// assert_eq!(tree.height(), 1);
    /// tree.insert(4).unwrap();
    /// assert_eq!(tree.height(), 2);
    /// ```
    #[must_use]
    pub fn height(&self) -> usize {
        self.raw.as_ref().map_or(0, RawTree24::height)
    }

    /// Returns the number of nodes currently allocated.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.raw.as_ref().map_or(0, RawTree24::node_count)
    }

    /// Calls `visit` with every key in ascending order.
    ///
    /// # Examples
    ///
    /// ```
    /// use tree24::Tree24;
    ///
    /// let tree = Tree24::from([3, 1, 2]);
    /// let mut seen = Vec::new();
    /// tree.traverse(|key| seen.push(key));
    /// assert_eq!(seen, [1, 2, 3]);
    /// ```
    pub fn traverse<F: FnMut(Key)>(&self, visit: F) {
        self.iter().for_each(visit);
    }

    /// Gets an iterator over the keys in ascending order.
    ///
    /// # Examples
    ///
    /// ```
    /// use tree24::Tree24;
    ///
    /// let tree = Tree24::from([3, 1, 2]);
    /// let mut iter = tree.iter();
    /// assert_eq!(iter.next(), Some(1));
    /// assert_eq!(iter.len(), 2);
    /// ```
    pub fn iter(&self) -> Iter<'_> {
        match &self.raw {
            Some(raw) => Iter {
                raw: Some(raw),
                front: raw.first_position(),
                remaining: raw.len(),
            },
            None => Iter::default(),
        }
    }

    /// Removes every key, leaving a freshly created empty tree. Also revives a destroyed tree.
    ///
    /// # Examples
    ///
    /// ```
    /// use tree24::Tree24;
    ///
    /// let mut tree = Tree24::from([1, 2]);
    /// tree.destroy();
    /// tree.clear();
    /// assert_eq!(tree.insert(3), Ok(3));
    /// ```
    pub fn clear(&mut self) {
        match &mut self.raw {
            Some(raw) => raw.clear(),
            None => self.raw = Some(RawTree24::new()),
        }
        debug!("tree cleared");
    }

    /// Releases every node. Destroying an already destroyed tree does nothing.
    ///
    /// # Examples
    ///
    /// ```
    /// use tree24::{Error, Tree24};
    ///
    /// let mut tree = Tree24::from([1, 2]);
    /// tree.destroy();
    /// tree.destroy();
    /// assert_eq!(tree.insert(3), Err(Error::Uninitialized));
    /// assert!(!tree.contains(1));
    /// ```
    pub fn destroy(&mut self) {
        if let Some(raw) = self.raw.take() {
            debug!("tree destroyed, released {} nodes", raw.node_count());
        }
    }

    /// Returns a [`Display`](fmt::Display) adapter that draws the node layout.
    ///
    /// Each line is one node in pre-order, indented by depth and labelled with its path of child
    /// positions from the root.
    ///
    /// # Examples
    ///
    /// ```
    /// use tree24::Tree24;
    ///
    /// let tree = Tree24::from([10, 20, 30, 40]);
    /// assert_eq!(
    ///     tree.structure().to_string(),
    ///     "[root] 1 keys: 30\n    [root.0] 2 keys: 10 20\n    [root.1] 1 keys: 40\n"
    /// );
    /// ```
    pub fn structure(&self) -> Structure<'_> {
        Structure { tree: self }
    }
}

impl Default for Tree24 {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Tree24 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for Structure<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tree.raw {
            Some(raw) => raw.fmt_structure(f),
            None => writeln!(f, "<uninitialized>"),
        }
    }
}

/// Indexes into the tree by one-based rank.
///
/// # Panics
///
/// Panics if `rank` is out of bounds.
///
/// # Examples
///
/// ```
/// use tree24::{Rank, Tree24};
///
/// let tree = Tree24::from([10, 20, 30]);
/// assert_eq!(tree[Rank(2)], 20);
/// ```
impl Index<Rank> for Tree24 {
    type Output = Key;

    fn index(&self, rank: Rank) -> &Self::Output {
        self.raw
            .as_ref()
            .and_then(|raw| raw.select(rank.0).ok())
            .expect("rank out of bounds")
    }
}

impl Extend<Key> for Tree24 {
    /// Inserts every key, skipping ones already present.
    ///
    /// # Panics
    ///
    /// Panics if the tree was destroyed or a node cannot be allocated.
    fn extend<I: IntoIterator<Item = Key>>(&mut self, iter: I) {
        for key in iter {
            match self.insert(key) {
                Ok(_) | Err(Error::Duplicate(_)) => {}
                Err(err) => panic!("`Tree24::extend()` - {err}"),
            }
        }
    }
}

impl FromIterator<Key> for Tree24 {
    fn from_iter<I: IntoIterator<Item = Key>>(iter: I) -> Self {
        let mut tree = Tree24::new();
        tree.extend(iter);
        tree
    }
}

impl<const N: usize> From<[Key; N]> for Tree24 {
    /// Builds a tree from an array; repeated keys are stored once.
    ///
    /// ```
    /// use tree24::Tree24;
    ///
    /// let tree = Tree24::from([2, 1, 2]);
    /// assert_eq!(tree.len(), 2);
    /// ```
    fn from(keys: [Key; N]) -> Self {
        keys.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a Tree24 {
    type Item = Key;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

impl Iterator for Iter<'_> {
    type Item = Key;

    fn next(&mut self) -> Option<Key> {
        let raw = self.raw?;
        let at = self.front?;
        self.front = raw.successor(at);
        self.remaining -= 1;
        Some(raw.key_at(at))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl FusedIterator for Iter<'_> {}

impl Default for Iter<'_> {
    fn default() -> Self {
        Self {
            raw: None,
            front: None,
            remaining: 0,
        }
    }
}

impl fmt::Debug for Iter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter").field("remaining", &self.remaining).finish_non_exhaustive()
    }
}
