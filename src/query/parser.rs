//! Textual query language.
//!
//! ```text
//! title=glacier AND (filetype=image OR filetype=video) AND NOT status=WITHDRAWN
//! created>=2020-01-01 AND description="Super Description"
//! melting ice
//! ```
//!
//! A pair is `index OP value` with `OP` one of `=`, `>`, `<`, `>=`, `<=`. Values run up
//! to the next ` AND `, ` OR ` or closing parenthesis and may contain spaces. A `\`
//! takes the next character literally and is dropped; the printer uses it for
//! `( ) = > <`, for itself, and for whitespace that would otherwise end the value.
//! Double-quoted values are kept verbatim, quotes included. Text without an operator
//! is a free-text search. Adjacent terms without a keyword are AND-joined and AND
//! binds tighter than OR.
//!
//! Keyed indexes address statement metadata:
//!
//! ```text
//! md.title=glacier AND md.created.date>2012 AND collection.md.Keywords=ice
//! technical[Exif Make]@Canon
//! ```

use super::element::{Group, Pair, QueryElement, SearchQuery, MAX_ELEMENT_DEPTH};
use super::field::{LogicalRelation, MetadataField, Operator, SearchField};
use once_cell::sync::Lazy;
use regex::Regex;
use std::str::FromStr;

static INDEX_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9\-_.]+$").expect("index pattern is valid"));

const SPECIAL_CHARACTERS: [char; 5] = ['(', ')', '=', '>', '<'];
const ESCAPE_CHARACTER: char = '\\';
const QUOTE: char = '"';
const OPERATOR_CHARACTERS: [char; 3] = ['=', '>', '<'];
const FRAGMENT_WIDTH: usize = 24;
const METADATA_PREFIX: &str = "md.";
const COLLECTION_METADATA_PREFIX: &str = "collection.md.";
const TECHNICAL_PREFIX: &str = "technical[";
const TECHNICAL_CLOSE: char = ']';
const CONTAINS: char = '@';

/// Malformed query text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Cannot parse query near '{fragment}': {reason}")]
pub struct QueryParseError {
    /// Offending part of the input
    pub fragment: String,
    pub reason: String,
}

impl QueryParseError {
    fn new(fragment: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            fragment: fragment.into(),
            reason: reason.into(),
        }
    }
}

/// Parser for the textual query language
#[derive(Debug, Clone, Copy)]
pub struct QueryParser {
    add_fulltext: bool,
}

impl Default for QueryParser {
    fn default() -> Self {
        Self { add_fulltext: true }
    }
}

impl QueryParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// With fulltext enabled (the default) free text `x` becomes
    /// `(all=x OR fulltext=x)`, otherwise `all=x`.
    pub fn with_fulltext(mut self, add_fulltext: bool) -> Self {
        self.add_fulltext = add_fulltext;
        self
    }

    pub fn parse(&self, text: &str) -> Result<SearchQuery, QueryParseError> {
        let chars: Vec<char> = text.chars().collect();
        let tokens = tokenize(&chars)?;
        if tokens.is_empty() {
            return Ok(SearchQuery::default());
        }

        let mut parser = TokenParser {
            chars: &chars,
            tokens,
            pos: 0,
            add_fulltext: self.add_fulltext,
        };
        let branches = parser.parse_expression(0)?;
        if let Some(token) = parser.peek() {
            return Err(parser.unexpected(token));
        }

        let elements = if branches.len() == 1 {
            branches.into_iter().next().unwrap_or_default()
        } else {
            vec![or_group(branches).into()]
        };
        Ok(SearchQuery::new(elements))
    }

    /// Parse a URL-encoded query (`+` stands for a space)
    pub fn parse_url(&self, text: &str) -> Result<SearchQuery, QueryParseError> {
        let plus_decoded = text.replace('+', " ");
        let decoded = urlencoding::decode(&plus_decoded)
            .map_err(|e| QueryParseError::new(fragment_of(text), e.to_string()))?;
        self.parse(&decoded)
    }

    /// Parse, falling back to an empty query on error
    pub fn parse_or_empty(&self, text: &str) -> SearchQuery {
        match self.parse(text) {
            Ok(query) => query,
            Err(e) => {
                tracing::warn!(
                    fragment = %e.fragment,
                    reason = %e.reason,
                    "Query text could not be parsed, using empty query"
                );
                SearchQuery::default()
            }
        }
    }
}

pub fn parse_query(text: &str) -> Result<SearchQuery, QueryParseError> {
    QueryParser::default().parse(text)
}

pub fn parse_url_query(text: &str) -> Result<SearchQuery, QueryParseError> {
    QueryParser::default().parse_url(text)
}

pub fn parse_or_empty(text: &str) -> SearchQuery {
    QueryParser::default().parse_or_empty(text)
}

/// Render the user-visible part of a query in the textual language. Filters are omitted.
pub fn pretty_print(query: &SearchQuery) -> String {
    join(&query.elements, LogicalRelation::And)
}

/// Percent-encoded [`pretty_print`]
pub fn to_url(query: &SearchQuery) -> String {
    urlencoding::encode(&pretty_print(query)).into_owned()
}

fn join(elements: &[QueryElement], relation: LogicalRelation) -> String {
    let separator = format!(" {} ", relation);
    elements
        .iter()
        .map(print_element)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(&separator)
}

fn print_element(element: &QueryElement) -> String {
    match element {
        QueryElement::Pair(pair) if pair.is_empty() => String::new(),
        QueryElement::Pair(pair) => format!(
            "{}{}{}{}",
            if pair.negated { "NOT " } else { "" },
            print_index(pair),
            pair.operator.symbol(),
            escape(&pair.value)
        ),
        QueryElement::Group(group) => {
            let inner = join(&group.elements, group.relation);
            if inner.is_empty() {
                inner
            } else {
                format!("{}({})", if group.negated { "NOT " } else { "" }, inner)
            }
        }
        QueryElement::Query(query) => {
            let inner = pretty_print(query);
            if inner.is_empty() {
                inner
            } else {
                format!("({})", inner)
            }
        }
    }
}

fn print_index(pair: &Pair) -> String {
    match (&pair.key, pair.field) {
        (Some(key), SearchField::Technical) => format!(
            "{}{}{}",
            TECHNICAL_PREFIX,
            escape(&key.name).replace(TECHNICAL_CLOSE, "\\]"),
            TECHNICAL_CLOSE
        ),
        _ => pair.index(),
    }
}

fn escape(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let balanced_quotes = chars.iter().filter(|c| **c == QUOTE).count() % 2 == 0;
    let mut escaped = String::with_capacity(value.len());
    let mut quoted = false;
    for (i, &c) in chars.iter().enumerate() {
        if c == QUOTE && balanced_quotes {
            quoted = !quoted;
        }
        let ends_value = c.is_whitespace()
            && !quoted
            && (chars[i..].iter().all(|n| n.is_whitespace()) || joins_at(&chars, i));
        if SPECIAL_CHARACTERS.contains(&c)
            || c == ESCAPE_CHARACTER
            || (c == QUOTE && !balanced_quotes)
            || ends_value
        {
            escaped.push(ESCAPE_CHARACTER);
        }
        escaped.push(c);
    }
    escaped
}

fn fragment_of(text: &str) -> String {
    text.chars().take(FRAGMENT_WIDTH).collect()
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Open(usize),
    Close(usize),
    Not(usize),
    And(usize),
    Or(usize),
    /// Characters with their escaped flag
    Text(usize, Vec<(char, bool)>),
}

impl Token {
    fn position(&self) -> usize {
        match self {
            Token::Open(p) | Token::Close(p) | Token::Not(p) | Token::And(p) | Token::Or(p) => *p,
            Token::Text(p, _) => *p,
        }
    }
}

/// Keyword starting at `i`, with its length
fn keyword_at(chars: &[char], i: usize) -> Option<(Token, usize)> {
    for (word, token) in [
        ("NOT", Token::Not(i)),
        ("AND", Token::And(i)),
        ("OR", Token::Or(i)),
    ] {
        let len = word.len();
        if i + len > chars.len() || !chars[i..i + len].iter().copied().eq(word.chars()) {
            continue;
        }
        let bounded_after = chars
            .get(i + len)
            .map_or(true, |c| c.is_whitespace() || *c == '(');
        if bounded_after {
            return Some((token, len));
        }
    }
    None
}

fn joins_at(chars: &[char], i: usize) -> bool {
    let mut j = i;
    while j < chars.len() && chars[j].is_whitespace() {
        j += 1;
    }
    j > i && matches!(keyword_at(chars, j), Some((Token::And(_) | Token::Or(_), _)))
}

fn tokenize(chars: &[char]) -> Result<Vec<Token>, QueryParseError> {
    let fragment_at = |i: usize| chars[i..].iter().take(FRAGMENT_WIDTH).collect::<String>();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c == '(' {
            tokens.push(Token::Open(i));
            i += 1;
            continue;
        }
        if c == ')' {
            tokens.push(Token::Close(i));
            i += 1;
            continue;
        }
        if let Some((token, len)) = keyword_at(chars, i) {
            tokens.push(token);
            i += len;
            continue;
        }

        let start = i;
        let mut text: Vec<(char, bool)> = Vec::new();
        let mut quoted = false;
        while i < chars.len() {
            let c = chars[i];
            if c == ESCAPE_CHARACTER {
                if let Some(next) = chars.get(i + 1) {
                    text.push((*next, true));
                }
                i += 2;
                continue;
            }
            if c == QUOTE {
                quoted = !quoted;
            } else if !quoted {
                if c == ')' || joins_at(chars, i) {
                    break;
                }
                if c == '(' {
                    if chars[i - 1].is_whitespace() {
                        break;
                    }
                    return Err(QueryParseError::new(
                        fragment_at(start),
                        "unescaped '(' inside a value",
                    ));
                }
            }
            text.push((c, false));
            i += 1;
        }

        if quoted {
            return Err(QueryParseError::new(fragment_at(start), "unterminated quote"));
        }
        while text.last().is_some_and(|(c, escaped)| !escaped && c.is_whitespace()) {
            text.pop();
        }
        tokens.push(Token::Text(start, text));
    }

    Ok(tokens)
}

struct TokenParser<'a> {
    chars: &'a [char],
    tokens: Vec<Token>,
    pos: usize,
    add_fulltext: bool,
}

impl TokenParser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn fragment(&self, position: usize) -> String {
        self.chars[position.min(self.chars.len())..]
            .iter()
            .take(FRAGMENT_WIDTH)
            .collect()
    }

    fn unexpected(&self, token: &Token) -> QueryParseError {
        let what = match token {
            Token::Open(_) => "unexpected '('",
            Token::Close(_) => "unexpected ')'",
            Token::Not(_) => "unexpected NOT",
            Token::And(_) => "unexpected AND",
            Token::Or(_) => "unexpected OR",
            Token::Text(_, _) => "unexpected term",
        };
        QueryParseError::new(self.fragment(token.position()), what)
    }

    /// OR-separated branches, each an AND-joined list
    fn parse_expression(&mut self, depth: usize) -> Result<Vec<Vec<QueryElement>>, QueryParseError> {
        let mut branches = vec![self.parse_conjunction(depth)?];
        while matches!(self.peek(), Some(Token::Or(_))) {
            self.next();
            branches.push(self.parse_conjunction(depth)?);
        }
        Ok(branches)
    }

    fn parse_conjunction(&mut self, depth: usize) -> Result<Vec<QueryElement>, QueryParseError> {
        let mut units = vec![self.parse_unary(depth)?];
        loop {
            match self.peek() {
                Some(Token::And(_)) => {
                    self.next();
                    units.push(self.parse_unary(depth)?);
                }
                Some(Token::Open(_) | Token::Not(_) | Token::Text(_, _)) => {
                    units.push(self.parse_unary(depth)?);
                }
                _ => return Ok(units),
            }
        }
    }

    fn parse_unary(&mut self, depth: usize) -> Result<QueryElement, QueryParseError> {
        let mut negations = 0usize;
        while matches!(self.peek(), Some(Token::Not(_))) {
            self.next();
            negations += 1;
        }
        let element = self.parse_operand(depth)?;
        Ok(if negations % 2 == 1 { negate(element) } else { element })
    }

    fn parse_operand(&mut self, depth: usize) -> Result<QueryElement, QueryParseError> {
        match self.next() {
            Some(Token::Open(position)) => {
                if depth >= MAX_ELEMENT_DEPTH {
                    return Err(QueryParseError::new(
                        self.fragment(position),
                        "groups are nested too deeply",
                    ));
                }
                let branches = self.parse_expression(depth + 1)?;
                match self.next() {
                    Some(Token::Close(_)) => Ok(group_of(branches).into()),
                    _ => Err(QueryParseError::new(self.fragment(position), "missing ')'")),
                }
            }
            Some(Token::Text(position, text)) => self.parse_term(position, &text),
            Some(token) => Err(self.unexpected(&token)),
            None => Err(QueryParseError::new(
                self.fragment(self.chars.len().saturating_sub(FRAGMENT_WIDTH)),
                "unexpected end of query",
            )),
        }
    }

    /// `index OP value`, or free text when no index is recognised
    fn parse_term(&self, position: usize, text: &[(char, bool)]) -> Result<QueryElement, QueryParseError> {
        if let Some(pair) = self.parse_technical(position, text)? {
            return Ok(pair.into());
        }

        let operator_at = text
            .iter()
            .position(|(c, escaped)| !escaped && OPERATOR_CHARACTERS.contains(c));

        if let Some(k) = operator_at {
            let index: String = text[..k].iter().map(|(c, _)| *c).collect();
            let index_is_plain = text[..k].iter().all(|(_, escaped)| !escaped);
            if index_is_plain && INDEX_PATTERN.is_match(&index) {
                let template = self.parse_index(position, &index)?;
                let (operator, len) = self.read_operator(position, &text[k..])?;
                let value = self.read_value(position, &text[k + len..])?;
                return Ok(Pair {
                    operator,
                    value,
                    ..template
                }
                .into());
            }
        }

        let value: String = text.iter().map(|(c, _)| *c).collect();
        if self.add_fulltext {
            Ok(Group::or(vec![
                Pair::equals(SearchField::All, value.clone()).into(),
                Pair::equals(SearchField::Fulltext, value).into(),
            ])
            .into())
        } else {
            Ok(Pair::equals(SearchField::All, value).into())
        }
    }

    /// Field and key of an index; operator and value are filled in by the caller
    fn parse_index(&self, position: usize, index: &str) -> Result<Pair, QueryParseError> {
        let error = |reason: String| QueryParseError::new(self.fragment(position), reason);

        if let Some(label) = index.strip_prefix(COLLECTION_METADATA_PREFIX) {
            if label.is_empty() {
                return Err(error("collection metadata requires a label".to_string()));
            }
            return Ok(Pair::collection_metadata(label, Operator::Equals, ""));
        }

        if let Some(rest) = index.strip_prefix(METADATA_PREFIX) {
            let mut parts = rest.split('.');
            let statement = parts.next().unwrap_or_default();
            if statement.is_empty() {
                return Err(error("metadata requires a statement".to_string()));
            }
            let subfield = match parts.next() {
                Some(name) => Some(
                    MetadataField::from_str(name)
                        .map_err(|_| error(format!("unknown metadata field '{}'", name)))?,
                ),
                None => None,
            };
            if parts.next().is_some() {
                return Err(error(format!("too many parts in '{}'", index)));
            }
            return Ok(Pair::metadata(statement, subfield, Operator::Equals, ""));
        }

        let field = SearchField::from_str(index)
            .map_err(|_| error(format!("unknown field '{}'", index)))?;
        if field.is_keyed() {
            return Err(error(format!("field '{}' requires a statement or label", index)));
        }
        Ok(Pair::equals(field, ""))
    }

    /// `technical[label]OP value` where `@` stands for `=`
    fn parse_technical(
        &self,
        position: usize,
        text: &[(char, bool)],
    ) -> Result<Option<Pair>, QueryParseError> {
        let prefix_len = TECHNICAL_PREFIX.chars().count();
        let has_prefix = text.len() > prefix_len
            && text[..prefix_len]
                .iter()
                .map(|(c, escaped)| (!escaped).then_some(*c))
                .eq(TECHNICAL_PREFIX.chars().map(Some));
        if !has_prefix {
            return Ok(None);
        }

        let error = |reason: &str| QueryParseError::new(self.fragment(position), reason);
        let close = text[prefix_len..]
            .iter()
            .position(|(c, escaped)| !escaped && *c == TECHNICAL_CLOSE)
            .map(|k| k + prefix_len)
            .ok_or_else(|| error("missing ']'"))?;
        let label: String = text[prefix_len..close].iter().map(|(c, _)| *c).collect();
        if label.trim().is_empty() {
            return Err(error("technical metadata requires a label"));
        }

        let rest = &text[close + 1..];
        let (operator, len) = match rest.first() {
            Some((CONTAINS, false)) => (Operator::Equals, 1),
            Some((c, false)) if OPERATOR_CHARACTERS.contains(c) => self.read_operator(position, rest)?,
            _ => return Err(error("missing operator after ']'")),
        };
        let value = self.read_value(position, &rest[len..])?;
        Ok(Some(Pair::technical(label, operator, value)))
    }

    fn read_value(&self, position: usize, text: &[(char, bool)]) -> Result<String, QueryParseError> {
        let value: String = text.iter().map(|(c, _)| *c).collect();
        if value.trim().is_empty() {
            return Err(QueryParseError::new(self.fragment(position), "missing value"));
        }
        Ok(value)
    }

    fn read_operator(
        &self,
        position: usize,
        text: &[(char, bool)],
    ) -> Result<(Operator, usize), QueryParseError> {
        let is_operator_char = |t: Option<&(char, bool)>| {
            t.is_some_and(|(c, escaped)| !escaped && OPERATOR_CHARACTERS.contains(c))
        };
        if is_operator_char(text.get(1)) {
            let symbol: String = text[..2].iter().map(|(c, _)| *c).collect();
            return Operator::from_str(&symbol).map(|op| (op, 2)).map_err(|_| {
                QueryParseError::new(self.fragment(position), format!("unknown operator '{}'", symbol))
            });
        }
        let symbol = text[0].0.to_string();
        Operator::from_str(&symbol).map(|op| (op, 1)).map_err(|_| {
            QueryParseError::new(self.fragment(position), format!("unknown operator '{}'", symbol))
        })
    }
}

fn negate(element: QueryElement) -> QueryElement {
    match element {
        QueryElement::Pair(pair) => pair.negate().into(),
        QueryElement::Group(group) => group.negate().into(),
        QueryElement::Query(query) => Group::and(query.elements).negate().into(),
    }
}

fn conjunction(mut units: Vec<QueryElement>) -> QueryElement {
    if units.len() == 1 {
        units.remove(0)
    } else {
        Group::and(units).into()
    }
}

fn or_group(branches: Vec<Vec<QueryElement>>) -> Group {
    Group::or(branches.into_iter().map(conjunction).collect())
}

fn group_of(mut branches: Vec<Vec<QueryElement>>) -> Group {
    if branches.len() == 1 {
        Group::new(LogicalRelation::And, branches.remove(0))
    } else {
        or_group(branches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryFactory;

    fn pair(field: SearchField, operator: Operator, value: &str) -> QueryElement {
        Pair::new(field, operator, value).into()
    }

    #[test]
    fn test_parse_simple_pair() {
        let query = parse_query("title=glacier").unwrap();
        assert_eq!(
            query.elements,
            vec![pair(SearchField::Title, Operator::Equals, "glacier")]
        );
    }

    #[test]
    fn test_parse_operators() {
        let query = parse_query("filesize>=10 AND created<2020 AND filesize>1").unwrap();
        assert_eq!(
            query.elements,
            vec![
                pair(SearchField::Filesize, Operator::GreaterEquals, "10"),
                pair(SearchField::Created, Operator::Lesser, "2020"),
                pair(SearchField::Filesize, Operator::Greater, "1"),
            ]
        );
        assert!(parse_query("filesize=>10").is_err());
    }

    #[test]
    fn test_values_may_contain_spaces() {
        let query = parse_query("title=this is an example AND license=CC0").unwrap();
        assert_eq!(
            query.elements,
            vec![
                pair(SearchField::Title, Operator::Equals, "this is an example"),
                pair(SearchField::License, Operator::Equals, "CC0"),
            ]
        );
    }

    #[test]
    fn test_quoted_values_kept_verbatim() {
        let query = parse_query("description=\"Super Description AND more\"").unwrap();
        assert_eq!(
            query.elements,
            vec![pair(
                SearchField::Description,
                Operator::Equals,
                "\"Super Description AND more\""
            )]
        );
        assert_eq!(
            parse_query("description=\"open").unwrap_err().reason,
            "unterminated quote"
        );
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let query = parse_query("title=a AND title=b OR title=c").unwrap();
        let expected = Group::or(vec![
            Group::and(vec![
                pair(SearchField::Title, Operator::Equals, "a"),
                pair(SearchField::Title, Operator::Equals, "b"),
            ])
            .into(),
            pair(SearchField::Title, Operator::Equals, "c"),
        ]);
        assert_eq!(query.elements, vec![expected.into()]);
    }

    #[test]
    fn test_not_and_groups() {
        let query = parse_query("NOT (filetype=image OR filetype=video) AND NOT status=PENDING").unwrap();
        assert_eq!(query.elements.len(), 2);
        match &query.elements[0] {
            QueryElement::Group(group) => {
                assert!(group.negated);
                assert_eq!(group.relation, LogicalRelation::Or);
                assert_eq!(group.elements.len(), 2);
            }
            other => panic!("expected group, got {:?}", other),
        }
        match &query.elements[1] {
            QueryElement::Pair(p) => assert!(p.negated),
            other => panic!("expected pair, got {:?}", other),
        }
    }

    #[test]
    fn test_free_text() {
        let query = parse_query("rien du tout").unwrap();
        assert_eq!(
            query.elements,
            vec![Group::or(vec![
                pair(SearchField::All, Operator::Equals, "rien du tout"),
                pair(SearchField::Fulltext, Operator::Equals, "rien du tout"),
            ])
            .into()]
        );

        let plain = QueryParser::new().with_fulltext(false).parse("lake").unwrap();
        assert_eq!(plain.elements, vec![pair(SearchField::All, Operator::Equals, "lake")]);
        assert!(plain.is_simple_search());
    }

    #[test]
    fn test_escaped_special_characters() {
        let query = parse_query(r"title=a\=b \(draft\)").unwrap();
        assert_eq!(
            query.elements,
            vec![pair(SearchField::Title, Operator::Equals, "a=b (draft)")]
        );
        assert_eq!(pretty_print(&query), r"title=a\=b \(draft\)");
    }

    #[test]
    fn test_backslash_escapes_any_character() {
        let query = parse_query(r"title=a\b").unwrap();
        assert_eq!(query.elements, vec![pair(SearchField::Title, Operator::Equals, "ab")]);

        let query = parse_query(r"title=C:\\temp").unwrap();
        assert_eq!(query.elements, vec![pair(SearchField::Title, Operator::Equals, r"C:\temp")]);
        assert_eq!(pretty_print(&query), r"title=C:\\temp");
    }

    #[test]
    fn test_long_not_chain() {
        let even = parse_query(&format!("{}title=a", "NOT ".repeat(20_000))).unwrap();
        assert_eq!(even.elements, vec![pair(SearchField::Title, Operator::Equals, "a")]);

        let odd = parse_query(&format!("{}title=a", "NOT ".repeat(20_001))).unwrap();
        assert_eq!(
            odd.elements,
            vec![Pair::equals(SearchField::Title, "a").negate().into()]
        );

        assert!(parse_or_empty(&"NOT ".repeat(20_000)).is_empty());
    }

    #[test]
    fn test_keyed_indexes() {
        let query = parse_query(
            r#"col="http://imeji.org/collection/86" AND md.title.text=TEST AND (md.created.date=2012 OR md.location.placename=Munich)"#,
        )
        .unwrap();
        let expected: Vec<QueryElement> = vec![
            pair(SearchField::Col, Operator::Equals, "\"http://imeji.org/collection/86\""),
            Pair::metadata("title", Some(MetadataField::Text), Operator::Equals, "TEST").into(),
            Group::or(vec![
                Pair::metadata("created", Some(MetadataField::Date), Operator::Equals, "2012").into(),
                Pair::metadata("location", Some(MetadataField::Placename), Operator::Equals, "Munich")
                    .into(),
            ])
            .into(),
        ];
        assert_eq!(query.elements, expected);
        assert!(parse_query(&pretty_print(&query)).unwrap().is_same(&query));

        let query = parse_query("collection.md.Keywords=ice AND technical[Exif Make]@Canon").unwrap();
        assert_eq!(
            query.elements,
            vec![
                Pair::collection_metadata("Keywords", Operator::Equals, "ice").into(),
                Pair::technical("Exif Make", Operator::Equals, "Canon").into(),
            ]
        );
        assert_eq!(
            pretty_print(&query),
            "collection.md.Keywords=ice AND technical[Exif Make]=Canon"
        );

        let query = parse_query("md.weight.number>=5").unwrap();
        assert_eq!(
            query.elements,
            vec![Pair::metadata("weight", Some(MetadataField::Number), Operator::GreaterEquals, "5").into()]
        );
    }

    #[test]
    fn test_keyed_index_errors() {
        assert_eq!(
            parse_query("md.title.colour=x").unwrap_err().reason,
            "unknown metadata field 'colour'"
        );
        assert_eq!(parse_query("md..text=x").unwrap_err().reason, "metadata requires a statement");
        assert_eq!(
            parse_query("md=x").unwrap_err().reason,
            "field 'md' requires a statement or label"
        );
        assert_eq!(
            parse_query("technical[Make=x").unwrap_err().reason,
            "missing ']'"
        );
        assert!(parse_query("md.a.text.b=x").is_err());
    }

    #[test]
    fn test_parse_errors() {
        let err = parse_query("colour=red").unwrap_err();
        assert_eq!(err.reason, "unknown field 'colour'");
        assert_eq!(err.fragment, "colour=red");

        assert_eq!(parse_query("(title=a").unwrap_err().reason, "missing ')'");
        assert_eq!(parse_query("title=a)").unwrap_err().reason, "unexpected ')'");
        assert_eq!(parse_query("title=a AND").unwrap_err().reason, "unexpected end of query");
        assert_eq!(parse_query("title=").unwrap_err().reason, "missing value");
        assert!(parse_query("title=a(b").is_err());
    }

    #[test]
    fn test_parse_or_empty_falls_back() {
        assert!(parse_or_empty("(title=a").is_empty());
        assert!(parse_query("   ").unwrap().is_empty());
    }

    #[test]
    fn test_url_round_trip() {
        let query = parse_url_query("(filetype=Image)+AND+license=no_license").unwrap();
        assert_eq!(query.elements.len(), 2);

        let url = to_url(&query);
        assert!(!url.contains(' '));
        assert!(parse_url_query(&url).unwrap().is_same(&query));
    }

    #[test]
    fn test_print_parse_is_same() {
        let texts = [
            "rien du tout OR (title=this is an example AND ((description=\"Super Description\" OR created=2000)))",
            "NOT (filetype=image OR filetype=video) AND NOT status=PENDING",
            "(title=a OR (title=b OR title=c)) AND filesize<=100",
            r"title=x\<y",
            "md.title=glacier AND technical[Exif Make]@Canon",
        ];
        for text in texts {
            let ast = parse_query(text).unwrap();
            let printed = pretty_print(&ast);
            let reparsed = parse_query(&printed).unwrap();
            assert!(reparsed.is_same(&ast), "{} -> {}", text, printed);
        }

        let built = [
            QueryFactory::new().pair(SearchField::Title, Operator::Equals, "rock AND roll"),
            QueryFactory::new().pair(SearchField::Title, Operator::Equals, "lake "),
            QueryFactory::new().pair(SearchField::Title, Operator::Equals, "a  OR b"),
            QueryFactory::new().pair(SearchField::Title, Operator::Equals, "rock AND"),
            QueryFactory::new().pair(SearchField::Description, Operator::Equals, "C:\\dir (old)"),
            QueryFactory::new()
                .pair(SearchField::Title, Operator::Equals, "tea OR coffee")
                .pair(SearchField::Author, Operator::Equals, "Ada"),
            QueryFactory::new().element(Pair::technical(
                "Lens ]Model",
                Operator::Equals,
                "50mm AND wide",
            )),
        ];
        for factory in built {
            let ast = factory.build();
            let printed = pretty_print(&ast);
            let reparsed = parse_query(&printed).unwrap();
            assert!(reparsed.is_same(&ast), "{:?} -> {}", ast, printed);
        }
    }

    #[test]
    fn test_filters_are_not_printed() {
        let mut query = parse_query("title=a").unwrap();
        query.filters.push(Pair::equals(SearchField::Collection, "c1").into());
        assert_eq!(pretty_print(&query), "title=a");
    }
}
