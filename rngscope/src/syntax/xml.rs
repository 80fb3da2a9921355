use super::NodeIds;
use crate::{
    FileId, Root,
    model::{
        Combine, Define, Div, ExternalRef, Grammar, GrammarItem, Include, NameClass, Pattern,
        Reference, Span, Start,
    },
};
use alloc::sync::Arc;
use roxmltree::{Document, Node};

const NAMESPACE: &str = "http://relaxng.org/ns/structure/1.0";

/// Parses a schema in the XML syntax.
///
/// Elements outside of the RELAX NG namespace are treated as annotations.
pub fn parse(file: FileId, source: &str) -> Result<Root, roxmltree::Error> {
    let document = Document::parse(source)?;
    let mut lowerer = Lowerer {
        ids: NodeIds::new(file),
    };
    let root = document.root_element();

    Ok(if is_schema(&root) && root.tag_name().name() == "grammar" {
        Root::Grammar(lowerer.grammar(root))
    } else {
        lowerer.pattern(root).map_or(Root::Empty, Root::Pattern)
    })
}

struct Lowerer {
    ids: NodeIds,
}

impl Lowerer {
    fn grammar(&mut self, node: Node) -> Arc<Grammar> {
        let id = self.ids.next();

        Grammar::new(id, self.items(node)).into()
    }

    fn items(&mut self, node: Node) -> Vec<GrammarItem> {
        schema_children(node)
            .filter_map(|child| self.item(child))
            .collect()
    }

    fn item(&mut self, node: Node) -> Option<GrammarItem> {
        Some(match node.tag_name().name() {
            "define" => {
                let (name, span) = attribute(node, "name")?;
                let id = self.ids.next();

                GrammarItem::Define(
                    Define::new(
                        id,
                        name.into(),
                        span,
                        combine(node),
                        self.group(node),
                    )
                    .into(),
                )
            }
            "div" => GrammarItem::Div(Div::new(self.items(node))),
            "include" => {
                let (href, span) = attribute(node, "href")?;
                let id = self.ids.next();

                GrammarItem::Include(Include::new(id, href.into(), span, self.items(node)))
            }
            "start" => GrammarItem::Start(Start::new(combine(node), self.group(node))),
            _ => return None,
        })
    }

    fn pattern(&mut self, node: Node) -> Option<Pattern> {
        if !is_schema(&node) {
            return None;
        }

        Some(match node.tag_name().name() {
            "attribute" => {
                let (name, children) = self.named_children(node);

                Pattern::Attribute {
                    name: name?,
                    pattern: Pattern::group(children).unwrap_or(Pattern::Text).into(),
                }
            }
            "choice" => Pattern::Choice(self.patterns(node)),
            "data" => Pattern::Data {
                datatype: node.attribute("type").unwrap_or_default().into(),
                except: schema_children(node)
                    .find(|child| child.tag_name().name() == "except")
                    .map(|except| Pattern::Choice(self.patterns(except)).into()),
            },
            "element" => {
                let (name, children) = self.named_children(node);

                Pattern::Element {
                    name: name?,
                    pattern: Pattern::group(children).unwrap_or(Pattern::Empty).into(),
                }
            }
            "empty" => Pattern::Empty,
            "externalRef" => {
                let (href, span) = attribute(node, "href")?;

                Pattern::ExternalRef(ExternalRef::new(href.into(), span))
            }
            "grammar" => Pattern::Grammar(self.grammar(node)),
            "group" => Pattern::Group(self.patterns(node)),
            "interleave" => Pattern::Interleave(self.patterns(node)),
            "list" => Pattern::List(self.group_or_empty(node)),
            "mixed" => Pattern::Mixed(self.group_or_empty(node)),
            "notAllowed" => Pattern::NotAllowed,
            "oneOrMore" => Pattern::OneOrMore(self.group_or_empty(node)),
            "optional" => Pattern::Optional(self.group_or_empty(node)),
            "parentRef" => Pattern::ParentRef(self.reference(node)?),
            "ref" => Pattern::Ref(self.reference(node)?),
            "text" => Pattern::Text,
            "value" => Pattern::Value {
                datatype: node.attribute("type").map(ToOwned::to_owned),
                value: node.text().unwrap_or_default().into(),
            },
            "zeroOrMore" => Pattern::ZeroOrMore(self.group_or_empty(node)),
            _ => return None,
        })
    }

    fn patterns(&mut self, node: Node) -> Vec<Pattern> {
        schema_children(node)
            .filter_map(|child| self.pattern(child))
            .collect()
    }

    fn group(&mut self, node: Node) -> Option<Pattern> {
        Pattern::group(self.patterns(node))
    }

    fn group_or_empty(&mut self, node: Node) -> Box<Pattern> {
        self.group(node).unwrap_or(Pattern::Empty).into()
    }

    fn named_children(&mut self, node: Node) -> (Option<NameClass>, Vec<Pattern>) {
        if let Some(name) = node.attribute("name") {
            return (Some(NameClass::Name(name.trim().into())), self.patterns(node));
        }

        let mut children = schema_children(node);
        let name = children.next().and_then(name_class);

        (
            name,
            children.filter_map(|child| self.pattern(child)).collect(),
        )
    }

    fn reference(&mut self, node: Node) -> Option<Reference> {
        let (name, span) = attribute(node, "name")?;

        Some(Reference::new(self.ids.next(), name.into(), span))
    }
}

fn name_class(node: Node) -> Option<NameClass> {
    let except = || {
        schema_children(node)
            .find(|child| child.tag_name().name() == "except")
            .map(|except| NameClass::Choice(schema_children(except).filter_map(name_class).collect()))
    };
    let base = match node.tag_name().name() {
        "anyName" => NameClass::AnyName,
        "choice" => NameClass::Choice(schema_children(node).filter_map(name_class).collect()),
        "name" => NameClass::Name(node.text().unwrap_or_default().trim().into()),
        "nsName" => NameClass::NsName(node.attribute("ns").map(ToOwned::to_owned)),
        _ => return None,
    };

    Some(match except() {
        Some(except) => NameClass::Except {
            base: base.into(),
            except: except.into(),
        },
        None => base,
    })
}

fn combine(node: Node) -> Option<Combine> {
    match node.attribute("combine")? {
        "choice" => Some(Combine::Choice),
        "interleave" => Some(Combine::Interleave),
        _ => None,
    }
}

fn attribute<'a>(node: Node<'a, '_>, name: &str) -> Option<(&'a str, Span)> {
    let attribute = node.attribute_node(name)?;
    let range = attribute.range_value();

    Some((attribute.value().trim(), Span::new(range.start, range.end)))
}

fn schema_children<'a, 'input>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(is_schema)
}

fn is_schema(node: &Node) -> bool {
    node.is_element() && node.tag_name().namespace() == Some(NAMESPACE)
}
