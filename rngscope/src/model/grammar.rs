use super::{NodeId, Pattern, Span};
use alloc::sync::Arc;
use core::hash::{Hash, Hasher};
use serde::Serialize;

/// A combine method of definitions sharing a name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Combine {
    /// A choice.
    Choice,
    /// An interleave.
    Interleave,
}

/// A grammar.
///
/// Grammars are compared by their identities.
#[derive(Debug)]
pub struct Grammar {
    id: NodeId,
    items: Vec<GrammarItem>,
}

impl Grammar {
    /// Creates a grammar.
    pub const fn new(id: NodeId, items: Vec<GrammarItem>) -> Self {
        Self { id, items }
    }

    /// Returns an identity.
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// Returns items.
    pub fn items(&self) -> &[GrammarItem] {
        &self.items
    }

    /// Returns a start pattern combined from all start items.
    pub fn start(&self) -> impl Iterator<Item = &Start> {
        let mut starts = vec![];
        collect_starts(&self.items, &mut starts);
        starts.into_iter()
    }
}

fn collect_starts<'a>(items: &'a [GrammarItem], starts: &mut Vec<&'a Start>) {
    for item in items {
        match item {
            GrammarItem::Start(start) => starts.push(start),
            GrammarItem::Div(div) => collect_starts(div.items(), starts),
            GrammarItem::Define(_) | GrammarItem::Include(_) => {}
        }
    }
}

impl PartialEq for Grammar {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Grammar {}

impl Hash for Grammar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A grammar item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarItem {
    /// A definition.
    Define(Arc<Define>),
    /// A division.
    Div(Div),
    /// An include.
    Include(Include),
    /// A start.
    Start(Start),
}

/// A definition.
///
/// Definitions are compared by their identities so that distinct definitions
/// with the same content are kept apart.
#[derive(Debug)]
pub struct Define {
    id: NodeId,
    name: String,
    span: Span,
    combine: Option<Combine>,
    pattern: Option<Pattern>,
}

impl Define {
    /// Creates a definition.
    pub const fn new(
        id: NodeId,
        name: String,
        span: Span,
        combine: Option<Combine>,
        pattern: Option<Pattern>,
    ) -> Self {
        Self {
            id,
            name,
            span,
            combine,
            pattern,
        }
    }

    /// Returns an identity.
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// Returns a name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a span of the name.
    pub const fn span(&self) -> Span {
        self.span
    }

    /// Returns a combine method.
    pub const fn combine(&self) -> Option<Combine> {
        self.combine
    }

    /// Returns a body pattern.
    ///
    /// It is missing if the definition is malformed.
    pub const fn pattern(&self) -> Option<&Pattern> {
        self.pattern.as_ref()
    }
}

impl PartialEq for Define {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Define {}

impl Hash for Define {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A division grouping grammar items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Div {
    items: Vec<GrammarItem>,
}

impl Div {
    /// Creates a division.
    pub const fn new(items: Vec<GrammarItem>) -> Self {
        Self { items }
    }

    /// Returns items.
    pub fn items(&self) -> &[GrammarItem] {
        &self.items
    }
}

/// An include of another schema file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Include {
    id: NodeId,
    href: String,
    span: Span,
    items: Vec<GrammarItem>,
}

impl Include {
    /// Creates an include.
    pub const fn new(id: NodeId, href: String, span: Span, items: Vec<GrammarItem>) -> Self {
        Self {
            id,
            href,
            span,
            items,
        }
    }

    /// Returns an identity.
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// Returns a target reference.
    pub fn href(&self) -> &str {
        &self.href
    }

    /// Returns a span of the target reference.
    pub const fn span(&self) -> Span {
        self.span
    }

    /// Returns overriding items.
    pub fn items(&self) -> &[GrammarItem] {
        &self.items
    }

    /// Returns overriding definitions with divisions flattened.
    pub fn overrides(&self) -> Vec<&Arc<Define>> {
        let mut defines = vec![];
        collect_defines(&self.items, &mut defines);
        defines
    }
}

fn collect_defines<'a>(items: &'a [GrammarItem], defines: &mut Vec<&'a Arc<Define>>) {
    for item in items {
        match item {
            GrammarItem::Define(define) => defines.push(define),
            GrammarItem::Div(div) => collect_defines(div.items(), defines),
            GrammarItem::Include(_) | GrammarItem::Start(_) => {}
        }
    }
}

/// A start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Start {
    combine: Option<Combine>,
    pattern: Option<Pattern>,
}

impl Start {
    /// Creates a start.
    pub const fn new(combine: Option<Combine>, pattern: Option<Pattern>) -> Self {
        Self { combine, pattern }
    }

    /// Returns a combine method.
    pub const fn combine(&self) -> Option<Combine> {
        self.combine
    }

    /// Returns a pattern.
    pub const fn pattern(&self) -> Option<&Pattern> {
        self.pattern.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FileId;
    use pretty_assertions::assert_eq;

    fn id(index: u32) -> NodeId {
        NodeId::new(FileId::new(0), index)
    }

    fn define(index: u32, name: &str) -> Arc<Define> {
        Define::new(id(index), name.into(), Span::default(), None, None).into()
    }

    #[test]
    fn compare_defines_by_identity() {
        assert_eq!(define(0, "foo"), define(0, "bar"));
        assert_ne!(define(0, "foo"), define(1, "foo"));
    }

    #[test]
    fn flatten_overrides() {
        let include = Include::new(
            id(0),
            "a.rng".into(),
            Span::default(),
            vec![
                GrammarItem::Define(define(1, "foo")),
                GrammarItem::Div(Div::new(vec![
                    GrammarItem::Start(Start::new(None, Some(Pattern::Empty))),
                    GrammarItem::Define(define(2, "bar")),
                ])),
            ],
        );

        assert_eq!(
            include
                .overrides()
                .into_iter()
                .map(|define| define.name())
                .collect::<Vec<_>>(),
            vec!["foo", "bar"]
        );
    }

    #[test]
    fn collect_starts_in_divisions() {
        let grammar = Grammar::new(
            id(0),
            vec![
                GrammarItem::Start(Start::new(None, Some(Pattern::Empty))),
                GrammarItem::Div(Div::new(vec![GrammarItem::Start(Start::new(
                    Some(Combine::Choice),
                    Some(Pattern::Text),
                ))])),
            ],
        );

        assert_eq!(
            grammar
                .start()
                .map(|start| start.combine())
                .collect::<Vec<_>>(),
            vec![None, Some(Combine::Choice)]
        );
    }
}
