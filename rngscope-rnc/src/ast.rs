use core::fmt::{self, Display, Formatter};

/// A byte range in a source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Span {
    /// A start offset.
    pub start: usize,
    /// An end offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Creates a span.
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// A schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// Declarations before a body.
    pub preamble: Vec<Declaration>,
    /// A body.
    pub body: SchemaBody,
}

/// A schema body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaBody {
    /// A grammar.
    Grammar(Grammar),
    /// A bare pattern.
    Pattern(Pattern),
}

/// Items of a grammar, a division, or overrides of an include.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grammar {
    /// Items.
    pub items: Vec<GrammarItem>,
}

/// A declaration binding a prefix to a URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// A kind.
    pub kind: DeclarationKind,
    /// A prefix.
    pub prefix: Option<String>,
    /// A URI, or `None` if inherited.
    pub uri: Option<Literal>,
}

/// A kind of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    /// `namespace`
    Namespace,
    /// `default namespace`
    DefaultNamespace,
    /// `datatypes`
    Datatypes,
}

/// A grammar item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarItem {
    /// A definition of a start or named pattern.
    Define(Definition),
    /// A division.
    Div(Grammar),
    /// An include.
    Include(Include),
}

/// A definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    /// A defined pattern.
    pub target: DefinitionTarget,
    /// A combine method.
    pub combine: Option<Combine>,
    /// A pattern.
    pub pattern: Pattern,
}

/// A pattern defined by a definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionTarget {
    /// A start pattern.
    Start,
    /// A named pattern.
    Name(Identifier),
}

/// An include.
///
/// Inherited namespaces are not kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Include {
    /// A referenced location.
    pub href: Literal,
    /// Items overriding ones in the included grammar.
    pub overrides: Option<Grammar>,
}

/// A combine method of definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combine {
    /// `|=`
    Choice,
    /// `&=`
    Interleave,
}

/// An identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    /// A value without an escape.
    pub value: String,
    /// A span.
    pub span: Span,
}

/// A string literal.
///
/// A span covers all concatenated segments with their delimiters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    /// A value after escapes and concatenation.
    pub value: String,
    /// A span.
    pub span: Span,
}

/// A pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// Patterns joined by a binary operator.
    Combination(Operator, Vec<Self>),
    /// A pattern with a quantifier.
    Quantified(Box<Self>, Quantifier),
    /// `list`
    List(Box<Self>),
    /// `mixed`
    Mixed(Box<Self>),
    /// `element`
    Element(NamedPattern),
    /// `attribute`
    Attribute(NamedPattern),
    /// A datatype pattern.
    Data {
        /// A datatype.
        datatype: Name,
        /// Parameters.
        parameters: Vec<Parameter>,
        /// An excluded pattern.
        except: Option<Box<Self>>,
    },
    /// A value pattern.
    Value {
        /// A datatype.
        datatype: Option<Name>,
        /// A value.
        value: String,
    },
    /// `text`
    Text,
    /// `empty`
    Empty,
    /// `notAllowed`
    NotAllowed,
    /// A reference to a definition in a current grammar.
    Ref(Identifier),
    /// A reference to a definition in a parent grammar.
    ParentRef(Identifier),
    /// A reference to an external schema.
    ExternalRef(Literal),
    /// A nested grammar.
    Grammar(Grammar),
}

/// A binary pattern operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `|`
    Choice,
    /// `,`
    Group,
    /// `&`
    Interleave,
}

/// A quantifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantifier {
    /// `?`
    Optional,
    /// `*`
    ZeroOrMore,
    /// `+`
    OneOrMore,
}

/// An element or attribute pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedPattern {
    /// A name class.
    pub name: NameClass,
    /// Content.
    pub content: Box<Pattern>,
}

/// A possibly prefixed name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    /// A prefix.
    pub prefix: Option<String>,
    /// A local name.
    pub local: String,
}

impl Name {
    /// Creates an unprefixed name.
    pub fn local(local: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local: local.into(),
        }
    }

    /// Creates a prefixed name.
    pub fn prefixed(prefix: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            local: local.into(),
        }
    }
}

impl Display for Name {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(formatter, "{prefix}:")?;
        }

        write!(formatter, "{}", self.local)
    }
}

/// A name class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameClass {
    /// A name.
    Name(Name),
    /// Any name in a namespace of a prefix.
    NsName(Option<String>),
    /// Any name.
    AnyName,
    /// A choice.
    Choice(Vec<Self>),
    /// An exclusion.
    Except {
        /// A base name class.
        base: Box<Self>,
        /// An excluded name class.
        except: Box<Self>,
    },
}

/// A datatype parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// A name.
    pub name: Name,
    /// A value.
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_name() {
        assert_eq!(Name::local("integer").to_string(), "integer");
        assert_eq!(Name::prefixed("xsd", "integer").to_string(), "xsd:integer");
    }
}
