use super::{Define, ExternalRef, Grammar, GrammarItem, Include, Pattern, Reference};
use alloc::sync::Arc;
use core::ops::ControlFlow;

/// A kind of a reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    /// A reference into a current grammar.
    Ref,
    /// A reference into a parent grammar.
    ParentRef,
}

/// A schema model visitor.
///
/// Each method receives a stack of grammars enclosing a visited node with the
/// innermost one last.
pub trait Visitor {
    /// A break value.
    type Break;

    /// Visits a grammar before its items.
    fn visit_grammar(
        &mut self,
        _grammar: &Arc<Grammar>,
        _grammars: &[Arc<Grammar>],
    ) -> ControlFlow<Self::Break> {
        ControlFlow::Continue(())
    }

    /// Visits a definition before its pattern.
    fn visit_define(
        &mut self,
        _define: &Arc<Define>,
        _grammars: &[Arc<Grammar>],
    ) -> ControlFlow<Self::Break> {
        ControlFlow::Continue(())
    }

    /// Visits an include before its overriding items.
    fn visit_include(
        &mut self,
        _include: &Include,
        _grammars: &[Arc<Grammar>],
    ) -> ControlFlow<Self::Break> {
        ControlFlow::Continue(())
    }

    /// Visits a reference.
    fn visit_reference(
        &mut self,
        _reference: &Reference,
        _kind: ReferenceKind,
        _grammars: &[Arc<Grammar>],
    ) -> ControlFlow<Self::Break> {
        ControlFlow::Continue(())
    }

    /// Visits an external reference.
    fn visit_external_ref(&mut self, _external: &ExternalRef) -> ControlFlow<Self::Break> {
        ControlFlow::Continue(())
    }
}

/// Walks a grammar and its nested grammars.
pub fn walk_grammar<V: Visitor>(visitor: &mut V, grammar: &Arc<Grammar>) -> ControlFlow<V::Break> {
    walk_nested_grammar(visitor, grammar, &mut vec![])
}

/// Walks a pattern outside of any grammar.
pub fn walk_pattern<V: Visitor>(visitor: &mut V, pattern: &Pattern) -> ControlFlow<V::Break> {
    walk_inner_pattern(visitor, pattern, &mut vec![])
}

fn walk_nested_grammar<V: Visitor>(
    visitor: &mut V,
    grammar: &Arc<Grammar>,
    grammars: &mut Vec<Arc<Grammar>>,
) -> ControlFlow<V::Break> {
    visitor.visit_grammar(grammar, grammars)?;
    grammars.push(grammar.clone());
    let flow = walk_items(visitor, grammar.items(), grammars);
    grammars.pop();
    flow
}

fn walk_items<V: Visitor>(
    visitor: &mut V,
    items: &[GrammarItem],
    grammars: &mut Vec<Arc<Grammar>>,
) -> ControlFlow<V::Break> {
    for item in items {
        match item {
            GrammarItem::Define(define) => {
                visitor.visit_define(define, grammars)?;

                if let Some(pattern) = define.pattern() {
                    walk_inner_pattern(visitor, pattern, grammars)?;
                }
            }
            GrammarItem::Div(div) => walk_items(visitor, div.items(), grammars)?,
            GrammarItem::Include(include) => {
                visitor.visit_include(include, grammars)?;
                walk_items(visitor, include.items(), grammars)?;
            }
            GrammarItem::Start(start) => {
                if let Some(pattern) = start.pattern() {
                    walk_inner_pattern(visitor, pattern, grammars)?;
                }
            }
        }
    }

    ControlFlow::Continue(())
}

fn walk_inner_pattern<V: Visitor>(
    visitor: &mut V,
    pattern: &Pattern,
    grammars: &mut Vec<Arc<Grammar>>,
) -> ControlFlow<V::Break> {
    match pattern {
        Pattern::Attribute { pattern, .. }
        | Pattern::Element { pattern, .. }
        | Pattern::List(pattern)
        | Pattern::Mixed(pattern)
        | Pattern::OneOrMore(pattern)
        | Pattern::Optional(pattern)
        | Pattern::ZeroOrMore(pattern) => walk_inner_pattern(visitor, pattern, grammars),
        Pattern::Choice(patterns) | Pattern::Group(patterns) | Pattern::Interleave(patterns) => {
            for pattern in patterns {
                walk_inner_pattern(visitor, pattern, grammars)?;
            }

            ControlFlow::Continue(())
        }
        Pattern::Data { except, .. } => match except {
            Some(pattern) => walk_inner_pattern(visitor, pattern, grammars),
            None => ControlFlow::Continue(()),
        },
        Pattern::ExternalRef(external) => visitor.visit_external_ref(external),
        Pattern::Grammar(grammar) => walk_nested_grammar(visitor, grammar, grammars),
        Pattern::ParentRef(reference) => {
            visitor.visit_reference(reference, ReferenceKind::ParentRef, grammars)
        }
        Pattern::Ref(reference) => visitor.visit_reference(reference, ReferenceKind::Ref, grammars),
        Pattern::Empty | Pattern::NotAllowed | Pattern::Text | Pattern::Value { .. } => {
            ControlFlow::Continue(())
        }
    }
}
