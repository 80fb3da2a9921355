use crate::{Root, SchemaFile, model::Grammar};
use alloc::sync::Arc;

/// Returns a top-level grammar of a schema file.
///
/// A compact syntax file exposes its grammar body. An XML syntax file exposes
/// its root element only if it is a `grammar` element in the RELAX NG
/// namespace. Bare patterns have no grammar.
pub fn grammar_of(file: &SchemaFile) -> Option<Arc<Grammar>> {
    match file.root() {
        Root::Grammar(grammar) => Some(grammar.clone()),
        Root::Pattern(_) | Root::Empty => None,
    }
}
