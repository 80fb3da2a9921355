use super::NodeIds;
use crate::{
    FileId, Root,
    model::{
        Combine, Define, Div, ExternalRef, Grammar, GrammarItem, Include, NameClass, Pattern,
        Reference, Start,
    },
};
use alloc::sync::Arc;
use rngscope_rnc as ast;

/// Parses a schema in the compact syntax.
pub fn parse(file: FileId, source: &str) -> Result<Root, ast::ParseError> {
    let schema = ast::parse_schema(source)?;
    let mut lowerer = Lowerer {
        ids: NodeIds::new(file),
    };

    Ok(match schema.body {
        ast::SchemaBody::Grammar(grammar) => Root::Grammar(lowerer.grammar(grammar)),
        ast::SchemaBody::Pattern(pattern) => Root::Pattern(lowerer.pattern(pattern)),
    })
}

struct Lowerer {
    ids: NodeIds,
}

impl Lowerer {
    fn grammar(&mut self, grammar: ast::Grammar) -> Arc<Grammar> {
        let id = self.ids.next();

        Grammar::new(id, self.items(grammar.items)).into()
    }

    fn items(&mut self, items: Vec<ast::GrammarItem>) -> Vec<GrammarItem> {
        items
            .into_iter()
            .map(|item| match item {
                ast::GrammarItem::Define(ast::Definition {
                    target: ast::DefinitionTarget::Start,
                    combine: method,
                    pattern,
                }) => GrammarItem::Start(Start::new(
                    method.map(combine),
                    Some(self.pattern(pattern)),
                )),
                ast::GrammarItem::Define(ast::Definition {
                    target: ast::DefinitionTarget::Name(name),
                    combine: method,
                    pattern,
                }) => GrammarItem::Define(
                    Define::new(
                        self.ids.next(),
                        name.value,
                        name.span,
                        method.map(combine),
                        Some(self.pattern(pattern)),
                    )
                    .into(),
                ),
                ast::GrammarItem::Div(grammar) => {
                    GrammarItem::Div(Div::new(self.items(grammar.items)))
                }
                ast::GrammarItem::Include(include) => {
                    let id = self.ids.next();

                    GrammarItem::Include(Include::new(
                        id,
                        include.href.value,
                        include.href.span,
                        include
                            .overrides
                            .map(|grammar| self.items(grammar.items))
                            .unwrap_or_default(),
                    ))
                }
            })
            .collect()
    }

    fn pattern(&mut self, pattern: ast::Pattern) -> Pattern {
        match pattern {
            ast::Pattern::Combination(operator, patterns) => {
                let patterns = self.patterns(patterns);

                match operator {
                    ast::Operator::Choice => Pattern::Choice(patterns),
                    ast::Operator::Group => Pattern::Group(patterns),
                    ast::Operator::Interleave => Pattern::Interleave(patterns),
                }
            }
            ast::Pattern::Quantified(pattern, quantifier) => {
                let pattern = self.pattern(*pattern).into();

                match quantifier {
                    ast::Quantifier::Optional => Pattern::Optional(pattern),
                    ast::Quantifier::ZeroOrMore => Pattern::ZeroOrMore(pattern),
                    ast::Quantifier::OneOrMore => Pattern::OneOrMore(pattern),
                }
            }
            ast::Pattern::List(pattern) => Pattern::List(self.pattern(*pattern).into()),
            ast::Pattern::Mixed(pattern) => Pattern::Mixed(self.pattern(*pattern).into()),
            ast::Pattern::Element(element) => Pattern::Element {
                name: name_class_of(element.name),
                pattern: self.pattern(*element.content).into(),
            },
            ast::Pattern::Attribute(attribute) => Pattern::Attribute {
                name: name_class_of(attribute.name),
                pattern: self.pattern(*attribute.content).into(),
            },
            ast::Pattern::Data {
                datatype, except, ..
            } => Pattern::Data {
                datatype: datatype.to_string(),
                except: except.map(|pattern| self.pattern(*pattern).into()),
            },
            ast::Pattern::Value { datatype, value } => Pattern::Value {
                datatype: datatype.as_ref().map(ToString::to_string),
                value,
            },
            ast::Pattern::Text => Pattern::Text,
            ast::Pattern::Empty => Pattern::Empty,
            ast::Pattern::NotAllowed => Pattern::NotAllowed,
            ast::Pattern::Ref(identifier) => Pattern::Ref(self.reference(identifier)),
            ast::Pattern::ParentRef(identifier) => Pattern::ParentRef(self.reference(identifier)),
            ast::Pattern::ExternalRef(literal) => {
                Pattern::ExternalRef(ExternalRef::new(literal.value, literal.span))
            }
            ast::Pattern::Grammar(grammar) => Pattern::Grammar(self.grammar(grammar)),
        }
    }

    fn patterns(&mut self, patterns: Vec<ast::Pattern>) -> Vec<Pattern> {
        patterns
            .into_iter()
            .map(|pattern| self.pattern(pattern))
            .collect()
    }

    fn reference(&mut self, identifier: ast::Identifier) -> Reference {
        Reference::new(self.ids.next(), identifier.value, identifier.span)
    }
}

const fn combine(combine: ast::Combine) -> Combine {
    match combine {
        ast::Combine::Choice => Combine::Choice,
        ast::Combine::Interleave => Combine::Interleave,
    }
}

fn name_class_of(name_class: ast::NameClass) -> NameClass {
    match name_class {
        ast::NameClass::Name(name) => NameClass::Name(name.to_string()),
        ast::NameClass::NsName(prefix) => NameClass::NsName(prefix),
        ast::NameClass::AnyName => NameClass::AnyName,
        ast::NameClass::Choice(classes) => {
            NameClass::Choice(classes.into_iter().map(name_class_of).collect())
        }
        ast::NameClass::Except { base, except } => NameClass::Except {
            base: name_class_of(*base).into(),
            except: name_class_of(*except).into(),
        },
    }
}
