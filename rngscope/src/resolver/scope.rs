use crate::{
    SchemaFile,
    grammar_factory::grammar_of,
    model::{Grammar, ReferenceKind},
};
use alloc::sync::Arc;

/// A grammar scope in which definition names are resolved.
#[derive(Clone, Debug)]
pub struct Scope {
    file: Arc<SchemaFile>,
    grammar: Arc<Grammar>,
}

impl Scope {
    /// Creates a scope.
    pub const fn new(file: Arc<SchemaFile>, grammar: Arc<Grammar>) -> Self {
        Self { file, grammar }
    }

    /// Creates a scope of a top-level grammar of a file.
    pub fn of(file: Arc<SchemaFile>) -> Option<Self> {
        let grammar = grammar_of(&file)?;

        Some(Self::new(file, grammar))
    }

    /// Creates a scope of a reference from a stack of its enclosing grammars.
    ///
    /// A `ref` is resolved in its innermost grammar and a `parentRef` in the
    /// one enclosing it.
    pub fn of_reference(
        file: &Arc<SchemaFile>,
        kind: ReferenceKind,
        grammars: &[Arc<Grammar>],
    ) -> Option<Self> {
        let depth = match kind {
            ReferenceKind::Ref => 1,
            ReferenceKind::ParentRef => 2,
        };
        let grammar = grammars.get(grammars.len().checked_sub(depth)?)?;

        Some(Self::new(file.clone(), grammar.clone()))
    }

    /// Returns a file.
    pub const fn file(&self) -> &Arc<SchemaFile> {
        &self.file
    }

    /// Returns a grammar.
    pub const fn grammar(&self) -> &Arc<Grammar> {
        &self.grammar
    }
}
