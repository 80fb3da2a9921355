use super::{Grammar, NodeId, Span};
use alloc::sync::Arc;
use core::fmt::{self, Display, Formatter};

/// A pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// An attribute.
    Attribute {
        /// A name class.
        name: NameClass,
        /// A value pattern.
        pattern: Box<Self>,
    },
    /// A choice.
    Choice(Vec<Self>),
    /// A datatype.
    Data {
        /// A datatype name.
        datatype: String,
        /// An excluded pattern.
        except: Option<Box<Self>>,
    },
    /// An element.
    Element {
        /// A name class.
        name: NameClass,
        /// A content pattern.
        pattern: Box<Self>,
    },
    /// An empty sequence.
    Empty,
    /// A reference to another schema file.
    ExternalRef(ExternalRef),
    /// A nested grammar.
    Grammar(Arc<Grammar>),
    /// A group.
    Group(Vec<Self>),
    /// An interleave.
    Interleave(Vec<Self>),
    /// A list.
    List(Box<Self>),
    /// A mixed content.
    Mixed(Box<Self>),
    /// A pattern matching nothing.
    NotAllowed,
    /// One or more repetitions.
    OneOrMore(Box<Self>),
    /// An optional pattern.
    Optional(Box<Self>),
    /// A reference to a definition in a parent grammar.
    ParentRef(Reference),
    /// A reference to a definition in a current grammar.
    Ref(Reference),
    /// A text.
    Text,
    /// A value.
    Value {
        /// A datatype name.
        datatype: Option<String>,
        /// A value.
        value: String,
    },
    /// Zero or more repetitions.
    ZeroOrMore(Box<Self>),
}

impl Pattern {
    /// Creates a group of patterns collapsing a single one.
    pub fn group(mut patterns: Vec<Self>) -> Option<Self> {
        match patterns.len() {
            0 => None,
            1 => patterns.pop(),
            _ => Some(Self::Group(patterns)),
        }
    }
}

/// A name class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NameClass {
    /// Any name.
    AnyName,
    /// A choice of name classes.
    Choice(Vec<Self>),
    /// A name class with exclusions.
    Except {
        /// A base name class.
        base: Box<Self>,
        /// An excluded name class.
        except: Box<Self>,
    },
    /// A name.
    Name(String),
    /// Any name in a namespace.
    NsName(Option<String>),
}

impl Display for NameClass {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnyName => write!(formatter, "*"),
            Self::Choice(classes) => {
                write!(formatter, "(")?;

                for (index, class) in classes.iter().enumerate() {
                    if index > 0 {
                        write!(formatter, " | ")?;
                    }

                    write!(formatter, "{class}")?;
                }

                write!(formatter, ")")
            }
            Self::Except { base, except } => write!(formatter, "{base} - {except}"),
            Self::Name(name) => write!(formatter, "{name}"),
            Self::NsName(Some(prefix)) => write!(formatter, "{prefix}:*"),
            Self::NsName(None) => write!(formatter, "*"),
        }
    }
}

/// A reference to a definition by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    id: NodeId,
    name: String,
    span: Span,
}

impl Reference {
    /// Creates a reference.
    pub const fn new(id: NodeId, name: String, span: Span) -> Self {
        Self { id, name, span }
    }

    /// Returns an identity.
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// Returns a referenced name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a span of the name.
    pub const fn span(&self) -> Span {
        self.span
    }
}

/// A reference to another schema file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExternalRef {
    href: String,
    span: Span,
}

impl ExternalRef {
    /// Creates an external reference.
    pub const fn new(href: String, span: Span) -> Self {
        Self { href, span }
    }

    /// Returns a target reference.
    pub fn href(&self) -> &str {
        &self.href
    }

    /// Returns a span of the target reference.
    pub const fn span(&self) -> Span {
        self.span
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn group_patterns() {
        assert_eq!(Pattern::group(vec![]), None);
        assert_eq!(Pattern::group(vec![Pattern::Text]), Some(Pattern::Text));
        assert_eq!(
            Pattern::group(vec![Pattern::Text, Pattern::Empty]),
            Some(Pattern::Group(vec![Pattern::Text, Pattern::Empty]))
        );
    }

    #[test]
    fn display_name_class() {
        assert_eq!(
            NameClass::Except {
                base: NameClass::AnyName.into(),
                except: NameClass::Choice(vec![
                    NameClass::Name("foo".into()),
                    NameClass::NsName(Some("html".into())),
                ])
                .into(),
            }
            .to_string(),
            "* - (foo | html:*)"
        );
    }
}
