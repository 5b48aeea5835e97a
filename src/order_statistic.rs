/// A one-based rank into the ascending order of a [`Tree24`](crate::Tree24).
///
/// `Rank(1)` is the smallest key and `Rank(tree.len())` the largest.
///
/// # Examples
///
/// ```
/// use tree24::{Rank, Tree24};
///
/// let tree = Tree24::from([30, 10, 20]);
///
/// assert_eq!(tree[Rank(1)], 10);
/// assert_eq!(tree[Rank(3)], 30);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Rank(pub usize);
