//! Parser implementation for Relax NG Compact Syntax.

mod error;

pub use self::error::ParseError;
use crate::ast::{
    Combine, Declaration, DeclarationKind, Definition, DefinitionTarget, Grammar, GrammarItem,
    Identifier, Include, Literal, Name, NameClass, NamedPattern, Operator, Parameter, Pattern,
    Quantifier, Schema, SchemaBody, Span,
};
use nom::{
    IResult, Input as _, Parser,
    branch::alt,
    bytes::complete::{tag, take_till},
    character::complete::{char, multispace1, satisfy},
    combinator::{all_consuming, cut, map, not, opt, peek, recognize, value},
    error::{Error, ErrorKind},
    multi::{many0, separated_list1},
    sequence::{delimited, preceded, terminated},
};
use nom_locate::LocatedSpan;

type Input<'input> = LocatedSpan<&'input str>;
type ParserError<'input> = Error<Input<'input>>;
type ParserResult<'input, Output> = IResult<Input<'input>, Output, ParserError<'input>>;

const STRING_DELIMITERS: [&str; 4] = ["\"\"\"", "'''", "\"", "'"];
const KEYWORDS: &[&str] = &[
    "attribute",
    "datatypes",
    "default",
    "div",
    "element",
    "empty",
    "external",
    "grammar",
    "include",
    "inherit",
    "list",
    "mixed",
    "namespace",
    "notAllowed",
    "parent",
    "start",
    "string",
    "text",
    "token",
];

/// Parses a Relax NG compact syntax schema.
///
/// Annotations and documentation comments are accepted and dropped.
pub fn parse_schema(source: &str) -> Result<Schema, ParseError> {
    let mut parser = all_consuming(delimited(whitespace0, schema, whitespace0));

    match parser.parse(Input::new(source)) {
        Ok((_, schema)) => Ok(schema),
        Err(error) => Err(ParseError::from_nom(source, error)),
    }
}

fn schema(input: Input<'_>) -> ParserResult<'_, Schema> {
    let (input, preamble) = many0(declaration).parse(input)?;
    let (input, _) = whitespace0(input)?;

    if input.fragment().is_empty() {
        return Ok((
            input,
            Schema {
                preamble,
                body: SchemaBody::Grammar(Grammar::default()),
            },
        ));
    }

    let (input, body) = schema_body(input)?;

    Ok((input, Schema { preamble, body }))
}

fn schema_body(input: Input<'_>) -> ParserResult<'_, SchemaBody> {
    let (input, _) = skip_annotations(input)?;

    match grammar_item(input) {
        Ok(_) => map(grammar, SchemaBody::Grammar).parse(input),
        Err(nom::Err::Error(_)) => map(pattern, SchemaBody::Pattern).parse(input),
        Err(error) => Err(error),
    }
}

fn declaration(input: Input<'_>) -> ParserResult<'_, Declaration> {
    delimited(
        whitespace0,
        alt((
            namespace_declaration,
            default_namespace_declaration,
            datatypes_declaration,
        )),
        whitespace0,
    )
    .parse(input)
}

fn namespace_declaration(input: Input<'_>) -> ParserResult<'_, Declaration> {
    let (input, _) = keyword("namespace").parse(input)?;
    let (input, prefix) = identifier_token(input)?;
    let (input, _) = symbol("=").parse(input)?;
    let (input, uri) = namespace_uri(input)?;

    Ok((
        input,
        Declaration {
            kind: DeclarationKind::Namespace,
            prefix: Some(prefix.value),
            uri,
        },
    ))
}

fn default_namespace_declaration(input: Input<'_>) -> ParserResult<'_, Declaration> {
    let (input, _) = keyword("default").parse(input)?;
    let (input, _) = keyword("namespace").parse(input)?;
    let (input, prefix) = opt(identifier_token).parse(input)?;
    let (input, _) = symbol("=").parse(input)?;
    let (input, uri) = namespace_uri(input)?;

    Ok((
        input,
        Declaration {
            kind: DeclarationKind::DefaultNamespace,
            prefix: prefix.map(|prefix| prefix.value),
            uri,
        },
    ))
}

fn namespace_uri(input: Input<'_>) -> ParserResult<'_, Option<Literal>> {
    alt((map(literal_token, Some), value(None, keyword("inherit")))).parse(input)
}

fn datatypes_declaration(input: Input<'_>) -> ParserResult<'_, Declaration> {
    let (input, _) = keyword("datatypes").parse(input)?;
    let (input, prefix) = opt(identifier_token).parse(input)?;
    let (input, _) = symbol("=").parse(input)?;
    let (input, uri) = literal_token(input)?;

    Ok((
        input,
        Declaration {
            kind: DeclarationKind::Datatypes,
            prefix: prefix.map(|prefix| prefix.value),
            uri: Some(uri),
        },
    ))
}

fn grammar(input: Input<'_>) -> ParserResult<'_, Grammar> {
    let (mut input, _) = skip_annotations(input)?;
    let mut items = Vec::new();

    loop {
        match grammar_item(input) {
            Ok((rest, item)) if rest.location_offset() > input.location_offset() => {
                items.extend(item);
                input = rest;
            }
            Ok(_) | Err(nom::Err::Error(_)) => break,
            Err(error) => return Err(error),
        }
    }

    Ok((input, Grammar { items }))
}

fn grammar_item(input: Input<'_>) -> ParserResult<'_, Option<GrammarItem>> {
    let (input, item) = delimited(
        whitespace0,
        alt((
            map(start_item, Some),
            map(div_item, Some),
            map(include_item, Some),
            map(annotation_element, |_| None),
            map(define_item, Some),
        )),
        whitespace0,
    )
    .parse(input)?;
    let (input, _) = skip_annotations(input)?;

    Ok((input, item))
}

fn start_item(input: Input<'_>) -> ParserResult<'_, GrammarItem> {
    let (input, _) = keyword("start").parse(input)?;
    let (input, (combine, pattern)) = cut((assignment_operator, pattern)).parse(input)?;

    Ok((
        input,
        GrammarItem::Define(Definition {
            target: DefinitionTarget::Start,
            combine,
            pattern,
        }),
    ))
}

fn define_item(input: Input<'_>) -> ParserResult<'_, GrammarItem> {
    let (input, name) = identifier_token(input)?;
    let (input, combine) = assignment_operator(input)?;
    let (input, pattern) = cut(pattern).parse(input)?;

    Ok((
        input,
        GrammarItem::Define(Definition {
            target: DefinitionTarget::Name(name),
            combine,
            pattern,
        }),
    ))
}

fn div_item(input: Input<'_>) -> ParserResult<'_, GrammarItem> {
    let (input, _) = keyword("div").parse(input)?;

    map(cut(braced(grammar)), GrammarItem::Div).parse(input)
}

fn include_item(input: Input<'_>) -> ParserResult<'_, GrammarItem> {
    let (input, _) = keyword("include").parse(input)?;
    let (input, href) = literal_token(input)?;
    let (input, _) = opt(inherit).parse(input)?;
    let (input, overrides) = opt(braced(grammar)).parse(input)?;

    Ok((input, GrammarItem::Include(Include { href, overrides })))
}

fn inherit(input: Input<'_>) -> ParserResult<'_, ()> {
    let (input, _) = keyword("inherit").parse(input)?;
    let (input, _) = opt(preceded(symbol("="), identifier_token)).parse(input)?;

    Ok((input, ()))
}

fn assignment_operator(input: Input<'_>) -> ParserResult<'_, Option<Combine>> {
    alt((
        value(Some(Combine::Choice), symbol("|=")),
        value(Some(Combine::Interleave), symbol("&=")),
        value(None, symbol("=")),
    ))
    .parse(input)
}

fn pattern(input: Input<'_>) -> ParserResult<'_, Pattern> {
    choice_pattern(input)
}

fn choice_pattern(input: Input<'_>) -> ParserResult<'_, Pattern> {
    let (input, patterns) = separated_list1(operator("|"), interleave_pattern).parse(input)?;

    Ok((input, combine_patterns(Operator::Choice, patterns)))
}

fn interleave_pattern(input: Input<'_>) -> ParserResult<'_, Pattern> {
    let (input, patterns) = separated_list1(operator("&"), group_pattern).parse(input)?;

    Ok((input, combine_patterns(Operator::Interleave, patterns)))
}

fn group_pattern(input: Input<'_>) -> ParserResult<'_, Pattern> {
    let (input, patterns) = separated_list1(symbol(","), quantified_pattern).parse(input)?;

    Ok((input, combine_patterns(Operator::Group, patterns)))
}

fn quantified_pattern(input: Input<'_>) -> ParserResult<'_, Pattern> {
    let (input, pattern) = primary_pattern(input)?;
    let (input, _) = many0(annotation_attachment).parse(input)?;
    let (input, quantifier) = opt(alt((
        value(Quantifier::Optional, symbol("?")),
        value(Quantifier::ZeroOrMore, symbol("*")),
        value(Quantifier::OneOrMore, symbol("+")),
    )))
    .parse(input)?;

    Ok((
        input,
        match quantifier {
            Some(quantifier) => Pattern::Quantified(pattern.into(), quantifier),
            None => pattern,
        },
    ))
}

fn primary_pattern(input: Input<'_>) -> ParserResult<'_, Pattern> {
    let (input, _) = skip_annotations(input)?;

    alt((
        map(preceded(keyword("element"), named_pattern), Pattern::Element),
        map(preceded(keyword("attribute"), named_pattern), Pattern::Attribute),
        map(preceded(keyword("list"), braced(pattern)), |pattern| {
            Pattern::List(pattern.into())
        }),
        map(preceded(keyword("mixed"), braced(pattern)), |pattern| {
            Pattern::Mixed(pattern.into())
        }),
        map(preceded(keyword("grammar"), braced(grammar)), Pattern::Grammar),
        map(
            preceded(keyword("parent"), identifier_token),
            Pattern::ParentRef,
        ),
        external_pattern,
        value(Pattern::Text, keyword("text")),
        value(Pattern::Empty, keyword("empty")),
        value(Pattern::NotAllowed, keyword("notAllowed")),
        delimited(symbol("("), pattern, symbol(")")),
        value_pattern,
        data_pattern,
        map(identifier_token, Pattern::Ref),
    ))
    .parse(input)
}

fn named_pattern(input: Input<'_>) -> ParserResult<'_, NamedPattern> {
    let (input, (name, content)) = cut((name_class, braced(pattern))).parse(input)?;

    Ok((
        input,
        NamedPattern {
            name,
            content: content.into(),
        },
    ))
}

fn external_pattern(input: Input<'_>) -> ParserResult<'_, Pattern> {
    let (input, _) = keyword("external").parse(input)?;
    let (input, href) = literal_token(input)?;
    let (input, _) = opt(inherit).parse(input)?;

    Ok((input, Pattern::ExternalRef(href)))
}

fn value_pattern(input: Input<'_>) -> ParserResult<'_, Pattern> {
    let (input, datatype) = opt(spaced(datatype_name)).parse(input)?;
    let (input, value) = literal_token(input)?;

    Ok((
        input,
        Pattern::Value {
            datatype,
            value: value.value,
        },
    ))
}

fn data_pattern(input: Input<'_>) -> ParserResult<'_, Pattern> {
    let (input, datatype) = spaced(datatype_name).parse(input)?;
    let (input, parameters) = opt(braced(many0(parameter))).parse(input)?;
    let (input, except) = opt(preceded(symbol("-"), primary_pattern)).parse(input)?;

    Ok((
        input,
        Pattern::Data {
            datatype,
            parameters: parameters.unwrap_or_default(),
            except: except.map(Box::new),
        },
    ))
}

fn datatype_name(input: Input<'_>) -> ParserResult<'_, Name> {
    alt((
        map((identifier, char(':'), identifier), |(prefix, _, local)| {
            Name::prefixed(prefix.value, local.value)
        }),
        map(
            alt((
                terminated(tag("string"), not(peek(satisfy(is_identifier_char)))),
                terminated(tag("token"), not(peek(satisfy(is_identifier_char)))),
            )),
            |name: Input<'_>| Name::local(*name.fragment()),
        ),
    ))
    .parse(input)
}

fn parameter(input: Input<'_>) -> ParserResult<'_, Parameter> {
    let (input, name) = spaced(name).parse(input)?;
    let (input, _) = symbol("=").parse(input)?;
    let (input, value) = literal_token(input)?;

    Ok((
        input,
        Parameter {
            name,
            value: value.value,
        },
    ))
}

fn name_class(input: Input<'_>) -> ParserResult<'_, NameClass> {
    let (input, mut classes) = separated_list1(symbol("|"), name_class_except).parse(input)?;

    Ok((
        input,
        if classes.len() == 1 {
            classes.remove(0)
        } else {
            NameClass::Choice(classes)
        },
    ))
}

fn name_class_except(input: Input<'_>) -> ParserResult<'_, NameClass> {
    let (input, base) = name_class_primary(input)?;
    let (input, except) = opt(preceded(symbol("-"), name_class_primary)).parse(input)?;

    Ok((
        input,
        match except {
            Some(except) => NameClass::Except {
                base: base.into(),
                except: except.into(),
            },
            None => base,
        },
    ))
}

fn name_class_primary(input: Input<'_>) -> ParserResult<'_, NameClass> {
    spaced(alt((
        value(NameClass::AnyName, tag("*")),
        map((identifier, tag(":*")), |(prefix, _)| {
            NameClass::NsName(Some(prefix.value))
        }),
        map(name, NameClass::Name),
        delimited(symbol("("), name_class, symbol(")")),
    )))
    .parse(input)
}

fn annotation_element(input: Input<'_>) -> ParserResult<'_, ()> {
    let (input, _) = spaced(name).parse(input)?;

    bracketed(input)
}

fn annotation_attachment(input: Input<'_>) -> ParserResult<'_, ()> {
    let (input, _) = symbol(">>").parse(input)?;

    annotation_element(input)
}

fn skip_annotations(input: Input<'_>) -> ParserResult<'_, ()> {
    let (input, _) = many0(preceded(whitespace0, bracketed)).parse(input)?;

    Ok((input, ()))
}

fn bracketed(input: Input<'_>) -> ParserResult<'_, ()> {
    let (input, _) = char('[').parse(input)?;
    let mut depth = 1_u32;
    let mut delimiter = None;

    for (index, character) in input.fragment().char_indices() {
        if let Some(active) = delimiter {
            if character == active {
                delimiter = None;
            }
            continue;
        }

        match character {
            '"' | '\'' => delimiter = Some(character),
            '[' => depth += 1,
            ']' => {
                depth -= 1;

                if depth == 0 {
                    let (input, _) = input.take_split(index + 1);
                    return Ok((input, ()));
                }
            }
            _ => {}
        }
    }

    Err(nom::Err::Error(Error::new(input, ErrorKind::Char)))
}

fn braced<'input, Output>(
    parser: impl Parser<Input<'input>, Output = Output, Error = ParserError<'input>>,
) -> impl Parser<Input<'input>, Output = Output, Error = ParserError<'input>> {
    delimited(symbol("{"), parser, symbol("}"))
}

fn spaced<'input, Output>(
    parser: impl Parser<Input<'input>, Output = Output, Error = ParserError<'input>>,
) -> impl Parser<Input<'input>, Output = Output, Error = ParserError<'input>> {
    delimited(whitespace0, parser, whitespace0)
}

fn keyword(text: &'static str) -> impl FnMut(Input<'_>) -> ParserResult<'_, Input<'_>> {
    move |input| {
        spaced(terminated(
            tag(text),
            not(peek(satisfy(is_identifier_char))),
        ))
        .parse(input)
    }
}

fn symbol(text: &'static str) -> impl FnMut(Input<'_>) -> ParserResult<'_, Input<'_>> {
    move |input| spaced(tag(text)).parse(input)
}

// A binary pattern operator that is not the start of a combining assignment.
fn operator(text: &'static str) -> impl FnMut(Input<'_>) -> ParserResult<'_, Input<'_>> {
    move |input| spaced(terminated(tag(text), not(peek(char('='))))).parse(input)
}

fn whitespace0(input: Input<'_>) -> ParserResult<'_, ()> {
    let (input, _) = many0(alt((value((), multispace1), comment))).parse(input)?;

    Ok((input, ()))
}

fn comment(input: Input<'_>) -> ParserResult<'_, ()> {
    let (input, _) = preceded(tag("#"), take_till(|character| character == '\n')).parse(input)?;
    let (input, _) = opt(char('\n')).parse(input)?;

    Ok((input, ()))
}

fn identifier_token(input: Input<'_>) -> ParserResult<'_, Identifier> {
    spaced(unreserved_identifier).parse(input)
}

// Keywords are only usable as identifiers when escaped with a backslash.
fn unreserved_identifier(input: Input<'_>) -> ParserResult<'_, Identifier> {
    let (rest, identifier) = identifier(input)?;

    if !input.fragment().starts_with('\\') && KEYWORDS.contains(&identifier.value.as_str()) {
        return Err(nom::Err::Error(Error::new(input, ErrorKind::Tag)));
    }

    Ok((rest, identifier))
}

fn name(input: Input<'_>) -> ParserResult<'_, Name> {
    let (input, first) = identifier(input)?;
    let (input, rest) = opt(preceded(char(':'), identifier)).parse(input)?;

    Ok((
        input,
        match rest {
            Some(local) => Name::prefixed(first.value, local.value),
            None => Name::local(first.value),
        },
    ))
}

fn identifier(input: Input<'_>) -> ParserResult<'_, Identifier> {
    let (input, _) = opt(char('\\')).parse(input)?;
    let (input, value) = recognize((
        satisfy(is_identifier_start),
        many0(satisfy(is_identifier_char)),
    ))
    .parse(input)?;

    Ok((
        input,
        Identifier {
            value: value.fragment().to_string(),
            span: span(&value),
        },
    ))
}

fn is_identifier_start(character: char) -> bool {
    character.is_alphabetic() || character == '_'
}

fn is_identifier_char(character: char) -> bool {
    character.is_alphanumeric() || character == '_' || character == '-' || character == '.'
}

fn literal_token(input: Input<'_>) -> ParserResult<'_, Literal> {
    let (input, _) = whitespace0(input)?;
    let start = input.location_offset();
    let (input, segments) = separated_list1(symbol("~"), string_segment).parse(input)?;
    let end = input.location_offset();
    let (input, _) = whitespace0(input)?;

    Ok((
        input,
        Literal {
            value: segments.concat(),
            span: Span::new(start, end),
        },
    ))
}

fn string_segment(input: Input<'_>) -> ParserResult<'_, String> {
    let fragment = *input.fragment();
    let Some(delimiter) = STRING_DELIMITERS
        .into_iter()
        .find(|delimiter| fragment.starts_with(delimiter))
    else {
        return Err(nom::Err::Error(Error::new(input, ErrorKind::Char)));
    };
    let body = &fragment[delimiter.len()..];
    let mut value = String::new();
    let mut index = 0;

    while index < body.len() {
        let rest = &body[index..];

        if rest.starts_with(delimiter) {
            let (input, _) = input.take_split(delimiter.len() + index + delimiter.len());
            return Ok((input, value));
        } else if let Some((character, length)) = hex_escape(rest) {
            value.push(character);
            index += length;
            continue;
        }

        let Some(character) = rest.chars().next() else {
            break;
        };

        if delimiter.len() == 1 && character == '\n' {
            break;
        }

        value.push(character);
        index += character.len_utf8();
    }

    Err(nom::Err::Error(Error::new(input, ErrorKind::Char)))
}

fn hex_escape(input: &str) -> Option<(char, usize)> {
    let digits = input.strip_prefix("\\x{")?;
    let end = digits.find('}')?;
    let character = char::from_u32(u32::from_str_radix(&digits[..end], 16).ok()?)?;

    Some((character, "\\x{".len() + end + 1))
}

fn span(input: &Input<'_>) -> Span {
    Span::new(
        input.location_offset(),
        input.location_offset() + input.fragment().len(),
    )
}

fn combine_patterns(operator: Operator, mut patterns: Vec<Pattern>) -> Pattern {
    if patterns.len() == 1 {
        patterns.remove(0)
    } else {
        Pattern::Combination(operator, patterns)
    }
}
