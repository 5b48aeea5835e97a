//! Outcomes reported by [`Tree24`](crate::Tree24) operations.

use thiserror::Error;

use crate::Key;

/// Result type alias for tree operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Every way a tree operation can decline to produce a value.
///
/// None of these leave the tree in a modified state: a failing call is a no-op.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Error {
    /// The tree was destroyed and has not been cleared since.
    #[error("tree is not initialized")]
    Uninitialized,

    /// The tree holds no keys.
    #[error("tree is empty")]
    Empty,

    /// Insert of a key that is already stored.
    #[error("key {0} is already present")]
    Duplicate(Key),

    /// Search or delete of a key that is not stored.
    #[error("key {0} is not present")]
    NotFound(Key),

    /// `select` was given a rank outside `1..=len`.
    #[error("rank {rank} is out of range, expected 1..={len}")]
    RankOutOfRange { rank: usize, len: usize },

    /// A new node could not be allocated.
    #[error("out of memory while allocating a tree node")]
    OutOfMemory,

    /// The capacity hint cannot be addressed by node handles.
    #[error("capacity hint {requested} exceeds the maximum of {max} nodes")]
    CapacityOverflow { requested: usize, max: usize },
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn messages_name_the_offending_value() {
        assert_eq!(Error::Duplicate(5).to_string(), "key 5 is already present");
        assert_eq!(Error::NotFound(-3).to_string(), "key -3 is not present");
        assert_eq!(
            Error::RankOutOfRange { rank: 9, len: 8 }.to_string(),
            "rank 9 is out of range, expected 1..=8"
        );
        assert_eq!(Error::Empty.to_string(), "tree is empty");
        assert_eq!(Error::Uninitialized.to_string(), "tree is not initialized");
    }
}
