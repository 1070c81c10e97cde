//! SPARQL rendering of query trees.
//!
//! Every pair becomes a graph pattern over the subject `?s`. Groups join their
//! children's patterns (AND) or wrap them in `UNION` blocks (OR); negation uses
//! `FILTER NOT EXISTS`. Each pair binds fresh variables so patterns never interfere.

use crate::models::{Actor, ObjectKind, Visibility, RDF_TERMS};
use crate::query::{
    Group, LogicalRelation, Operator, Pair, QueryElement, SearchField, SearchQuery, SortCriterion,
    SortOrder, ValueType,
};
use crate::search::error::{SearchError, SearchResult};
use crate::search::port::{PageSize, Window};
use crate::search::values::{
    format_millis, normalize_status, range_bounds, split_alternatives, ANY_LICENSE, NO_LICENSE,
    STATUS_RELEASED, STATUS_WITHDRAWN,
};
use std::ops::Bound;

/// Backend name reported in compile errors
pub const BACKEND_NAME: &str = "triple";

const XSD_DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
const STATUS_PREDICATE: &str = "http://imeji.org/terms/status";
const COLLECTION_PREDICATE: &str = "http://imeji.org/terms/collection";
const PARENT_PREDICATE: &str = "http://imeji.org/terms/parent";

/// Predicate path leading from a subject to the values of a field
fn predicate(field: SearchField) -> Option<&'static str> {
    Some(match field {
        SearchField::All
        | SearchField::Fulltext
        | SearchField::Id
        | SearchField::Metadata
        | SearchField::CollectionMetadata
        | SearchField::Technical => return None,
        SearchField::Title => "<http://purl.org/dc/terms/title>",
        SearchField::Description => "<http://purl.org/dc/terms/description>",
        SearchField::Author => {
            "<http://xmlns.com/foaf/0.1/person>/<http://purl.org/escidoc/metadata/terms/0.1/complete-name>"
        }
        SearchField::Organization => {
            "<http://xmlns.com/foaf/0.1/person>/<http://purl.org/escidoc/metadata/profiles/0.1/organizationalunit>/<http://purl.org/dc/terms/title>"
        }
        SearchField::Status => "<http://imeji.org/terms/status>",
        SearchField::Collection | SearchField::Col => "<http://imeji.org/terms/collection>",
        SearchField::Creator => "<http://purl.org/dc/terms/creator>",
        SearchField::Created => "<http://purl.org/dc/terms/created>",
        SearchField::Modified => "<http://purl.org/dc/terms/modified>",
        SearchField::Filename => "<http://imeji.org/terms/filename>",
        SearchField::Filetype => "<http://imeji.org/terms/filetype>",
        SearchField::Filesize => "<http://imeji.org/terms/fileSize>",
        SearchField::License => "<http://imeji.org/terms/license>",
        SearchField::Checksum => "<http://imeji.org/terms/checksum>",
        SearchField::Email => "<http://xmlns.com/foaf/0.1/email>",
        SearchField::Name => "<http://xmlns.com/foaf/0.1/name>",
    })
}

/// Predicate of a field usable as a sort key
fn sort_predicate(field: SearchField) -> Option<&'static str> {
    match field {
        SearchField::Description | SearchField::Author | SearchField::Organization => None,
        field => predicate(field),
    }
}

/// IRI of a normalized status
pub fn status_iri(status: &str) -> String {
    format!("{}status#{}", RDF_TERMS, status)
}

/// Quoted SPARQL string literal
fn literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Renders SPARQL for a fixed set of kinds
#[derive(Debug, Clone)]
pub struct SparqlCompiler {
    kinds: Vec<ObjectKind>,
    resource_base: String,
}

/// Fresh variable names for one rendering
#[derive(Default)]
struct Variables {
    next: usize,
}

impl Variables {
    fn fresh(&mut self, prefix: &str) -> String {
        self.next += 1;
        format!("?{}{}", prefix, self.next)
    }
}

impl SparqlCompiler {
    pub fn new(kinds: Vec<ObjectKind>, resource_base: impl Into<String>) -> Self {
        Self {
            kinds,
            resource_base: resource_base.into(),
        }
    }

    /// Group graph pattern shared by the select and count queries
    pub fn where_clause(
        &self,
        query: &SearchQuery,
        actor: Option<&Actor>,
        scope_id: Option<&str>,
    ) -> SearchResult<String> {
        let mut vars = Variables::default();
        let mut patterns: Vec<String> = Vec::new();

        let status_named = query.has_field(SearchField::Status);
        let kind_patterns: Vec<String> = self
            .kinds
            .iter()
            .map(|kind| self.kind_pattern(*kind, actor, status_named, &mut vars))
            .collect::<SearchResult<_>>()?;
        match kind_patterns.len() {
            0 => {}
            1 => patterns.extend(kind_patterns),
            _ => patterns.push(union(&kind_patterns)),
        }

        if let Some(scope) = scope_id {
            patterns.push(format!(
                "?s (<{}>|<{}>)+ {} .",
                COLLECTION_PREDICATE,
                PARENT_PREDICATE,
                self.iri(SearchField::Collection, scope)?
            ));
        }

        for element in query.filters.iter().chain(&query.elements) {
            if let Some(pattern) = self.element(element, &mut vars)? {
                patterns.push(pattern);
            }
        }

        Ok(format!("{{ {} }}", patterns.join(" ")))
    }

    /// Id query over a where clause. Sort bindings are optional so records without a
    /// value are still returned.
    pub fn select(
        &self,
        where_clause: &str,
        sorts: &[SortCriterion],
        window: Window,
    ) -> SearchResult<String> {
        let mut optionals = String::new();
        let mut order = Vec::new();
        for (index, criterion) in sorts.iter().enumerate() {
            let variable = match criterion.field {
                SearchField::Id => "?s".to_string(),
                field => {
                    let path = sort_predicate(field).ok_or(SearchError::UnsupportedField {
                        field,
                        backend: BACKEND_NAME,
                    })?;
                    let variable = format!("?sort{}", index);
                    optionals.push_str(&format!(" OPTIONAL {{ ?s {} {} }}", path, variable));
                    variable
                }
            };
            order.push(match criterion.order {
                SortOrder::Ascending => format!("ASC({})", variable),
                SortOrder::Descending => format!("DESC({})", variable),
            });
        }
        if !sorts.iter().any(|s| s.field == SearchField::Id) {
            order.push("ASC(?s)".to_string());
        }

        let body = where_clause
            .strip_suffix('}')
            .map(|open| format!("{}{} }}", open.trim_end(), optionals))
            .unwrap_or_else(|| where_clause.to_string());

        let mut sparql = format!("SELECT DISTINCT ?s WHERE {} ORDER BY {}", body, order.join(" "));
        if let PageSize::Limited(size) = window.size() {
            sparql.push_str(&format!(" LIMIT {}", size));
        }
        if window.offset() > 0 {
            sparql.push_str(&format!(" OFFSET {}", window.offset()));
        }
        Ok(sparql)
    }

    /// Distinct subject count over a where clause
    pub fn count(&self, where_clause: &str) -> String {
        format!("SELECT (COUNT(DISTINCT ?s) AS ?count) WHERE {}", where_clause)
    }

    fn kind_pattern(
        &self,
        kind: ObjectKind,
        actor: Option<&Actor>,
        status_named: bool,
        vars: &mut Variables,
    ) -> SearchResult<String> {
        let shape = kind.shape();
        let mut pattern = format!("?s a <{}> .", shape.rdf_type);

        match (shape.visibility, actor) {
            (Visibility::Status, None) => {
                pattern.push_str(&format!(
                    " ?s <{}> <{}> .",
                    STATUS_PREDICATE,
                    status_iri(STATUS_RELEASED)
                ));
            }
            (Visibility::Status, Some(actor)) => {
                if !actor.sysadmin {
                    let released =
                        format!("?s <{}> <{}> .", STATUS_PREDICATE, status_iri(STATUS_RELEASED));
                    if actor.readable_containers.is_empty() {
                        pattern.push(' ');
                        pattern.push_str(&released);
                    } else {
                        let container = vars.fresh("grant");
                        let granted = actor
                            .readable_containers
                            .iter()
                            .map(|c| self.iri(SearchField::Collection, c))
                            .collect::<SearchResult<Vec<_>>>()?;
                        let readable = format!(
                            "?s (<{}>|<{}>)* {} . FILTER({} IN ({}))",
                            COLLECTION_PREDICATE,
                            PARENT_PREDICATE,
                            container,
                            container,
                            granted.join(", ")
                        );
                        pattern.push(' ');
                        pattern.push_str(&union(&[released, readable]));
                    }
                }
                if !status_named {
                    pattern.push_str(&format!(
                        " FILTER NOT EXISTS {{ ?s <{}> <{}> }}",
                        STATUS_PREDICATE,
                        status_iri(STATUS_WITHDRAWN)
                    ));
                }
            }
            (Visibility::Authenticated, None) => pattern.push_str(" FILTER(false)"),
            (Visibility::Authenticated, Some(_)) | (Visibility::Public, _) => {}
        }
        Ok(pattern)
    }

    fn element(&self, element: &QueryElement, vars: &mut Variables) -> SearchResult<Option<String>> {
        match element {
            QueryElement::Pair(pair) => self.pair(pair, vars),
            QueryElement::Group(group) => self.group(group, vars),
            QueryElement::Query(query) => {
                let mut patterns = Vec::new();
                for child in query.filters.iter().chain(&query.elements) {
                    if let Some(pattern) = self.element(child, vars)? {
                        patterns.push(pattern);
                    }
                }
                Ok((!patterns.is_empty()).then(|| patterns.join(" ")))
            }
        }
    }

    fn group(&self, group: &Group, vars: &mut Variables) -> SearchResult<Option<String>> {
        let mut patterns = Vec::new();
        for child in &group.elements {
            if let Some(pattern) = self.element(child, vars)? {
                patterns.push(pattern);
            }
        }
        if patterns.is_empty() {
            return Ok(None);
        }
        let rendered = match group.relation {
            LogicalRelation::And => patterns.join(" "),
            LogicalRelation::Or if patterns.len() == 1 => patterns.remove(0),
            LogicalRelation::Or => union(&patterns),
        };
        Ok(Some(negate_if(rendered, group.negated)))
    }

    fn pair(&self, pair: &Pair, vars: &mut Variables) -> SearchResult<Option<String>> {
        if pair.is_empty() {
            return Ok(None);
        }
        let field = pair.field;
        if field == SearchField::Fulltext || !self.kinds.iter().any(|k| k.supports(field)) {
            return Err(SearchError::UnsupportedField {
                field,
                backend: BACKEND_NAME,
            });
        }
        if !pair.is_range() && pair.operator != Operator::Equals {
            return Err(SearchError::UnsupportedOperator {
                field,
                operator: pair.operator,
            });
        }

        let value = pair.value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);

        let pattern = match field {
            SearchField::All => {
                let (p, v) = (vars.fresh("p"), vars.fresh("v"));
                format!(
                    "?s {} {} . FILTER(isLiteral({}) && regex(str({}), {}, \"i\"))",
                    p,
                    v,
                    v,
                    v,
                    literal(&regex::escape(value))
                )
            }
            SearchField::Id => format!("FILTER(?s = {})", self.iri(field, value)?),
            _ => {
                let path = predicate(field).ok_or(SearchError::UnsupportedField {
                    field,
                    backend: BACKEND_NAME,
                })?;
                let v = vars.fresh("v");
                let condition = match pair.value_type() {
                    ValueType::Text => {
                        format!("FILTER(regex(str({}), {}, \"i\"))", v, literal(&regex::escape(value)))
                    }
                    ValueType::Keyword => format!("FILTER(str({}) = {})", v, literal(value)),
                    ValueType::KeywordList if field == SearchField::License && value == ANY_LICENSE => {
                        format!("FILTER(str({}) != {})", v, literal(NO_LICENSE))
                    }
                    ValueType::KeywordList => {
                        let alternatives: Vec<String> =
                            split_alternatives(value).iter().map(|a| literal(a)).collect();
                        format!("FILTER(str({}) IN ({}))", v, alternatives.join(", "))
                    }
                    ValueType::Status => {
                        format!("FILTER({} = <{}>)", v, status_iri(normalize_status(value)?))
                    }
                    ValueType::Reference => format!("FILTER({} = {})", v, self.iri(field, value)?),
                    ValueType::Date | ValueType::Number => {
                        let bounds = range_bounds(pair)?;
                        let typed = |n: i64| {
                            if pair.value_type() == ValueType::Date {
                                format!("{}^^<{}>", literal(&format_millis(n)), XSD_DATE_TIME)
                            } else {
                                n.to_string()
                            }
                        };
                        let mut comparisons = Vec::new();
                        match bounds.lower {
                            Bound::Included(n) => comparisons.push(format!("{} >= {}", v, typed(n))),
                            Bound::Excluded(n) => comparisons.push(format!("{} > {}", v, typed(n))),
                            Bound::Unbounded => {}
                        }
                        match bounds.upper {
                            Bound::Included(n) => comparisons.push(format!("{} <= {}", v, typed(n))),
                            Bound::Excluded(n) => comparisons.push(format!("{} < {}", v, typed(n))),
                            Bound::Unbounded => {}
                        }
                        format!("FILTER({})", comparisons.join(" && "))
                    }
                };
                format!("?s {} {} . {}", path, v, condition)
            }
        };
        Ok(Some(negate_if(pattern, pair.negated)))
    }

    /// IRI for a reference value; bare ids are resolved against the resource base
    fn iri(&self, field: SearchField, value: &str) -> SearchResult<String> {
        let value = value.trim();
        if value.is_empty()
            || value
                .chars()
                .any(|c| c.is_whitespace() || matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\'))
        {
            return Err(SearchError::InvalidValue {
                field,
                value: value.to_string(),
                reason: "not a valid IRI".to_string(),
            });
        }
        if value.starts_with("http://") || value.starts_with("https://") {
            Ok(format!("<{}>", value))
        } else {
            Ok(format!("<{}{}>", self.resource_base, value))
        }
    }
}

fn union(patterns: &[String]) -> String {
    patterns
        .iter()
        .map(|p| format!("{{ {} }}", p))
        .collect::<Vec<_>>()
        .join(" UNION ")
}

fn negate_if(pattern: String, negated: bool) -> String {
    if negated {
        format!("FILTER NOT EXISTS {{ {} }}", pattern)
    } else {
        pattern
    }
}
