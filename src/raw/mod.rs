mod arena;
mod handle;
mod node;
mod raw_tree24;

pub(crate) use handle::Handle;
pub(crate) use raw_tree24::RawTree24;
