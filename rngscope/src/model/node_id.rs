use crate::FileId;
use core::fmt::{self, Display, Formatter};
use serde::Serialize;

/// An identity of a node in a parsed schema file.
///
/// Identities are unique within one parse of a file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId {
    file: FileId,
    index: u32,
}

impl NodeId {
    /// Creates a node identity.
    pub const fn new(file: FileId, index: u32) -> Self {
        Self { file, index }
    }

    /// Returns a file identity.
    pub const fn file(&self) -> FileId {
        self.file
    }

    /// Returns an index.
    pub const fn index(&self) -> u32 {
        self.index
    }
}

impl Display for NodeId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.file, self.index)
    }
}
