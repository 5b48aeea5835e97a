//! An order-statistic (2,4) tree over `i64` keys.
//!
//! [`Tree24`] is a B-tree of order 4: every node holds one to three keys and two to four
//! children, and all leaves sit at the same depth. Internal nodes also count the keys stored
//! below each child, which turns rank queries into a single root-to-leaf walk:
//!
//! - [`select`](Tree24::select) - Get the key at a one-based sorted position
//! - [`rank_of`](Tree24::rank_of) - Get the one-based sorted position of a key
//! - Indexing by [`Rank`] - e.g., `tree[Rank(1)]` for the smallest key
//!
//! # Example
//!
//! ```
//! use tree24::{Error, Rank, Tree24};
//!
//! let mut tree = Tree24::new();
//! for key in [10, 20, 5, 6, 12, 30, 7, 17] {
//!     tree.insert(key)?;
//! }
//!
//! // Set operations report failures as values instead of sentinels.
//! assert_eq!(tree.search(12), Ok(12));
//! assert_eq!(tree.insert(6), Err(Error::Duplicate(6)));
//!
//! // Order-statistic operations (O(log n))
//! assert_eq!(tree.select(4), Ok(10));
//! assert_eq!(tree.rank_of(30), Ok(8));
//! assert_eq!(tree[Rank(1)], 5);
//!
//! tree.delete(10)?;
//! assert_eq!(tree.select(4), Ok(12));
//! # Ok::<(), Error>(())
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - The library only requires `alloc`
//! - **Allocation failures are errors** - An insert that cannot allocate leaves the tree untouched
//! - **`cli`** (default) - Builds the `tree24` interactive shell
//!
//! # Implementation
//!
//! Nodes live in an arena and refer to each other through compact handles. Children are owned
//! by their parent; the parent link each node keeps is only a back-reference used to walk
//! upwards during in-order iteration.

#![no_std]
// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod error;
mod order_statistic;
mod raw;

pub mod tree24;

pub use error::{Error, Result};
pub use order_statistic::Rank;
pub use tree24::Tree24;

/// The key type stored in a [`Tree24`].
pub type Key = i64;
