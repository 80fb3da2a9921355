//! Readers of schema syntaxes into the schema model.

pub(crate) mod compact;
pub(crate) mod xml;

use crate::{FileId, model::NodeId};

// Allocates node identities in document order.
struct NodeIds {
    file: FileId,
    next: u32,
}

impl NodeIds {
    const fn new(file: FileId) -> Self {
        Self { file, next: 0 }
    }

    const fn next(&mut self) -> NodeId {
        let id = NodeId::new(self.file, self.next);
        self.next += 1;
        id
    }
}
