//! Lightweight SQL scanning using nom.
//!
//! Nothing here builds an AST. The parsers only know enough about quoting,
//! comments and parentheses to split a script into statements and to find the
//! tables and collections a schema declares.

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, tag_no_case, take_until, take_while1},
    character::complete::{char, multispace0, multispace1, none_of},
    combinator::{all_consuming, map, opt, recognize},
    multi::{many0_count, separated_list1},
    sequence::{delimited, pair, tuple},
    IResult,
};
use serde::{Deserialize, Serialize};

/// What kind of object a schema declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Table,
    Collection,
}

/// A table or collection found in schema text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaObject {
    /// Unquoted name, schema-qualified if it was written that way.
    pub name: String,
    pub kind: ObjectKind,
    /// Column list between the outer parentheses (tables only).
    pub definition: String,
}

/// Split a script on `;`, ignoring semicolons inside quotes and comments.
///
/// Statements are trimmed; blank and comment-only statements are dropped.
pub fn split_statements(text: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut input = text;
    loop {
        let (rest, statement) = match statement(input) {
            Ok(parsed) => parsed,
            Err(_) => (&input[input.len()..], input),
        };
        let statement = statement.trim();
        if !is_comment_only(statement) {
            statements.push(statement.to_string());
        }
        match rest.strip_prefix(';') {
            Some(next) => input = next,
            None => break,
        }
    }
    statements
}

/// Whitespace, `--`, `//` and `/* */` comments only.
fn is_comment_only(statement: &str) -> bool {
    let slash_comment = recognize(pair(tag("//"), opt(is_not("\n"))));
    all_consuming(many0_count(alt((
        multispace1,
        line_comment,
        block_comment,
        slash_comment,
    ))))(statement)
    .is_ok()
}

/// Everything up to (not including) the next top-level `;`.
fn statement(input: &str) -> IResult<&str, &str> {
    recognize(many0_count(fragment))(input)
}

fn fragment(input: &str) -> IResult<&str, &str> {
    alt((
        quoted('\''),
        quoted('"'),
        quoted('`'),
        line_comment,
        block_comment,
        is_not(";'\"`-/"),
        recognize(none_of(";")),
    ))(input)
}

/// A quoted run, with the quote doubled as its own escape.
fn quoted(quote: char) -> impl FnMut(&str) -> IResult<&str, &str> {
    move |input| {
        let doubled: String = [quote, quote].iter().collect();
        let stop = quote.to_string();
        recognize(tuple((
            char(quote),
            many0_count(alt((tag(doubled.as_str()), is_not(stop.as_str())))),
            char(quote),
        )))(input)
    }
}

fn line_comment(input: &str) -> IResult<&str, &str> {
    recognize(pair(tag("--"), opt(is_not("\n"))))(input)
}

fn block_comment(input: &str) -> IResult<&str, &str> {
    recognize(tuple((tag("/*"), take_until("*/"), tag("*/"))))(input)
}

/// Tables (`CREATE TABLE name (...)`) and collections
/// (`db.createCollection("name")`) in declaration order.
pub fn schema_objects(ddl: &str) -> Vec<SchemaObject> {
    let mut objects = Vec::new();
    let mut offset = 0;
    while offset < ddl.len() {
        let input = &ddl[offset..];
        if let Ok((rest, object)) = alt((create_table, create_collection))(input) {
            objects.push(object);
            offset = ddl.len() - rest.len();
            continue;
        }
        // Skip to the next character boundary.
        offset += input.chars().next().map_or(1, char::len_utf8);
    }
    objects
}

fn create_table(input: &str) -> IResult<&str, SchemaObject> {
    let (input, _) = tuple((
        tag_no_case("CREATE"),
        multispace1,
        opt(tuple((
            alt((tag_no_case("TEMPORARY"), tag_no_case("TEMP"))),
            multispace1,
        ))),
        tag_no_case("TABLE"),
        multispace1,
        opt(tuple((
            tag_no_case("IF"),
            multispace1,
            tag_no_case("NOT"),
            multispace1,
            tag_no_case("EXISTS"),
            multispace1,
        ))),
    ))(input)?;
    let (input, name) = qualified_name(input)?;
    let (input, _) = multispace0(input)?;
    let (input, definition) = parenthesized(input)?;
    Ok((
        input,
        SchemaObject {
            name,
            kind: ObjectKind::Table,
            definition: definition.trim().to_string(),
        },
    ))
}

fn create_collection(input: &str) -> IResult<&str, SchemaObject> {
    let (input, _) = tuple((tag("db.createCollection"), multispace0, char('('), multispace0))(input)?;
    let (input, name) = alt((
        delimited(char('"'), identifier, char('"')),
        delimited(char('\''), identifier, char('\'')),
    ))(input)?;
    Ok((
        input,
        SchemaObject {
            name: name.to_string(),
            kind: ObjectKind::Collection,
            definition: String::new(),
        },
    ))
}

fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)
}

/// One name part, bare or quoted with `"`, backticks or brackets.
fn name_part(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('"'), is_not("\""), char('"')),
        delimited(char('`'), is_not("`"), char('`')),
        delimited(char('['), is_not("]"), char(']')),
        identifier,
    ))(input)
}

fn qualified_name(input: &str) -> IResult<&str, String> {
    map(separated_list1(char('.'), name_part), |parts| parts.join("."))(input)
}

/// Contents of a balanced `( ... )` group; quoted text may contain parentheses.
fn parenthesized(input: &str) -> IResult<&str, &str> {
    let (body, _) = char('(')(input)?;
    let mut depth = 1usize;
    let mut rest = body;
    while let Some(c) = rest.chars().next() {
        match c {
            '\'' | '"' | '`' => {
                if let Ok((after, _)) = quoted(c)(rest) {
                    rest = after;
                    continue;
                }
            }
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    let inner = &body[..body.len() - rest.len()];
                    return Ok((&rest[1..], inner));
                }
            }
            _ => {}
        }
        rest = &rest[c.len_utf8()..];
    }
    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Char,
    )))
}
