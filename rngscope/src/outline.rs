//! Outlines of definitions merged across alternatives.

use crate::{
    Cancellation, Cancelled,
    model::{Combine, Define, NodeId, Pattern},
    resolver::{Resolver, Scope},
};
use alloc::sync::Arc;
use rngscope_merge::{Identity, Mergeable, Merged, ModelMerger};
use serde::Serialize;
use std::collections::HashSet;

/// An outline of a definition.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DefineOutline {
    define: NodeId,
    name: String,
    combine: Option<Combine>,
    elements: Vec<ElementOutline>,
    attributes: Vec<AttributeOutline>,
    references: Vec<ReferenceOutline>,
}

impl DefineOutline {
    /// Returns a definition.
    pub const fn define(&self) -> NodeId {
        self.define
    }

    /// Returns a name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a combine method.
    pub const fn combine(&self) -> Option<Combine> {
        self.combine
    }

    /// Returns child elements.
    pub fn elements(&self) -> &[ElementOutline] {
        &self.elements
    }

    /// Returns attributes.
    pub fn attributes(&self) -> &[AttributeOutline] {
        &self.attributes
    }

    /// Returns references.
    pub fn references(&self) -> &[ReferenceOutline] {
        &self.references
    }
}

impl Mergeable for DefineOutline {
    type Key = String;

    fn identity(&self) -> Identity<Self::Key> {
        Identity::PrimaryKey(self.name.clone())
    }
}

/// An outline of a child element.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ElementOutline {
    define: NodeId,
    name: String,
    optional: bool,
    repeated: bool,
}

impl ElementOutline {
    /// Returns a name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if the element may be absent.
    pub const fn optional(&self) -> bool {
        self.optional
    }

    /// Returns `true` if the element may occur more than once.
    pub const fn repeated(&self) -> bool {
        self.repeated
    }
}

impl Mergeable for ElementOutline {
    type Key = String;

    fn identity(&self) -> Identity<Self::Key> {
        Identity::PrimaryKey(self.name.clone())
    }
}

/// An outline of an attribute.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AttributeOutline {
    define: NodeId,
    name: String,
    optional: bool,
}

impl AttributeOutline {
    /// Returns a name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if the attribute may be absent.
    pub const fn optional(&self) -> bool {
        self.optional
    }
}

impl Mergeable for AttributeOutline {
    type Key = String;

    fn identity(&self) -> Identity<Self::Key> {
        Identity::PrimaryKey(self.name.clone())
    }
}

/// An outline of a reference.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ReferenceOutline(String);

impl ReferenceOutline {
    /// Returns a referenced name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Copy, Default)]
struct Occurrence {
    optional: bool,
    repeated: bool,
}

/// Outlines a definition.
///
/// Element and attribute contents are not outlined.
pub fn outline(define: &Define) -> DefineOutline {
    let mut outline = DefineOutline {
        define: define.id(),
        name: define.name().into(),
        combine: define.combine(),
        elements: vec![],
        attributes: vec![],
        references: vec![],
    };

    if let Some(pattern) = define.pattern() {
        collect(pattern, Occurrence::default(), &mut outline);
    }

    outline
}

fn collect(pattern: &Pattern, occurrence: Occurrence, outline: &mut DefineOutline) {
    let define = outline.define;

    match pattern {
        Pattern::Attribute { name, .. } => outline.attributes.push(AttributeOutline {
            define,
            name: name.to_string(),
            optional: occurrence.optional,
        }),
        Pattern::Element { name, .. } => outline.elements.push(ElementOutline {
            define,
            name: name.to_string(),
            optional: occurrence.optional,
            repeated: occurrence.repeated,
        }),
        Pattern::Choice(patterns) => {
            let occurrence = Occurrence {
                optional: true,
                ..occurrence
            };

            for pattern in patterns {
                collect(pattern, occurrence, outline);
            }
        }
        Pattern::Group(patterns) | Pattern::Interleave(patterns) => {
            for pattern in patterns {
                collect(pattern, occurrence, outline);
            }
        }
        Pattern::List(pattern) | Pattern::Mixed(pattern) => collect(pattern, occurrence, outline),
        Pattern::OneOrMore(pattern) => collect(
            pattern,
            Occurrence {
                repeated: true,
                ..occurrence
            },
            outline,
        ),
        Pattern::Optional(pattern) => collect(
            pattern,
            Occurrence {
                optional: true,
                ..occurrence
            },
            outline,
        ),
        Pattern::ZeroOrMore(pattern) => collect(
            pattern,
            Occurrence {
                optional: true,
                repeated: true,
            },
            outline,
        ),
        Pattern::ParentRef(reference) | Pattern::Ref(reference) => {
            let reference = ReferenceOutline(reference.name().into());

            if !outline.references.contains(&reference) {
                outline.references.push(reference);
            }
        }
        Pattern::Data { .. }
        | Pattern::Empty
        | Pattern::ExternalRef(_)
        | Pattern::Grammar(_)
        | Pattern::NotAllowed
        | Pattern::Text
        | Pattern::Value { .. } => {}
    }
}

/// Creates a model merger folding occurrences of children sharing names.
pub fn merger() -> Arc<ModelMerger> {
    ModelMerger::new()
        .add_merging_strategy::<ElementOutline>(|elements: &[ElementOutline]| {
            elements.iter().cloned().reduce(|one, other| ElementOutline {
                optional: one.optional || other.optional,
                repeated: one.repeated || other.repeated,
                ..one
            })
        })
        .add_merging_strategy::<AttributeOutline>(|attributes: &[AttributeOutline]| {
            attributes.iter().cloned().reduce(|one, other| AttributeOutline {
                optional: one.optional || other.optional,
                ..one
            })
        })
        .into()
}

/// A description of a name merged over its definitions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Description {
    name: String,
    definitions: usize,
    elements: Vec<ChildDescription>,
    attributes: Vec<ChildDescription>,
    required_attributes: Vec<String>,
    references: Vec<String>,
}

impl Description {
    /// Returns a name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a number of definitions.
    pub const fn definitions(&self) -> usize {
        self.definitions
    }

    /// Returns child elements.
    pub fn elements(&self) -> &[ChildDescription] {
        &self.elements
    }

    /// Returns attributes.
    pub fn attributes(&self) -> &[ChildDescription] {
        &self.attributes
    }

    /// Returns names of attributes required by every definition.
    pub fn required_attributes(&self) -> &[String] {
        &self.required_attributes
    }

    /// Returns referenced names.
    pub fn references(&self) -> &[String] {
        &self.references
    }
}

/// A description of a child element or attribute.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChildDescription {
    name: String,
    optional: bool,
    repeated: bool,
}

impl ChildDescription {
    /// Returns a name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if the child may be absent.
    pub const fn optional(&self) -> bool {
        self.optional
    }

    /// Returns `true` if the child may occur more than once.
    pub const fn repeated(&self) -> bool {
        self.repeated
    }
}

/// Describes a name by merging outlines of its definitions.
///
/// It returns `None` if the scope is stale or the name is unresolved.
pub fn describe(
    resolver: &Resolver,
    merger: &Arc<ModelMerger>,
    scope: &Scope,
    name: &str,
    cancellation: &Cancellation,
) -> Result<Option<Description>, Cancelled> {
    let Some(definitions) = resolver.resolve(scope, name, cancellation)? else {
        return Ok(None);
    };
    let count = definitions.len();
    let Some(merged) =
        merger.merge_models(definitions.iter().map(|define| outline(define)).collect())
    else {
        return Ok(None);
    };

    Ok(Some(Description {
        name: name.into(),
        definitions: count,
        elements: merged
            .collection(|outline| outline.elements.clone())
            .iter()
            .filter_map(|element| {
                Some(ChildDescription {
                    name: element.value(|element| Some(element.name.clone()))?,
                    optional: !element.all(|element| !element.optional)
                        || !covers(
                            element.implementations().iter().map(|element| element.define),
                            count,
                        ),
                    repeated: !element.all(|element| !element.repeated),
                })
            })
            .collect(),
        attributes: merged
            .collection(|outline| outline.attributes.clone())
            .iter()
            .filter_map(|attribute| {
                Some(ChildDescription {
                    name: attribute.value(|attribute| Some(attribute.name.clone()))?,
                    optional: !attribute.all(|attribute| !attribute.optional)
                        || !covers(
                            attribute.implementations().iter().map(|attribute| attribute.define),
                            count,
                        ),
                    repeated: false,
                })
            })
            .collect(),
        required_attributes: required_attributes(&merged, count),
        references: merged.values(|outline| {
            outline
                .references
                .iter()
                .map(|reference| reference.0.clone())
                .collect()
        }),
    }))
}

fn required_attributes(merged: &Merged<DefineOutline>, count: usize) -> Vec<String> {
    merged
        .intersection(|outline| {
            outline
                .attributes
                .iter()
                .filter(|attribute| !attribute.optional)
                .map(|attribute| Requirement {
                    define: attribute.define,
                    name: attribute.name.clone(),
                })
                .collect()
        })
        .iter()
        .filter(|requirement| {
            covers(
                requirement
                    .implementations()
                    .iter()
                    .map(|requirement| requirement.define),
                count,
            )
        })
        .filter_map(|requirement| requirement.value(|requirement| Some(requirement.name.clone())))
        .collect()
}

// Returns `true` if every one of `count` definitions has a child.
fn covers(defines: impl IntoIterator<Item = NodeId>, count: usize) -> bool {
    defines.into_iter().collect::<HashSet<_>>().len() == count
}

// A required attribute of a definition.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct Requirement {
    define: NodeId,
    name: String,
}

impl Mergeable for Requirement {
    type Key = String;

    fn identity(&self) -> Identity<Self::Key> {
        Identity::PrimaryKey(self.name.clone())
    }
}
