//! A syntax-independent model of RELAX NG schemas.

mod grammar;
mod node_id;
mod pattern;
mod visit;

pub use self::{
    grammar::{Combine, Define, Div, Grammar, GrammarItem, Include, Start},
    node_id::NodeId,
    pattern::{ExternalRef, NameClass, Pattern, Reference},
    visit::{ReferenceKind, Visitor, walk_grammar, walk_pattern},
};
pub use rngscope_rnc::Span;
