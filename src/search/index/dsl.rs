//! Engine-neutral index query language.
//!
//! The compiler emits these trees; each [`IndexEngine`](super::IndexEngine) translates
//! them into its native form. The JSON rendering is the Elasticsearch query DSL.

use crate::query::SortOrder;
use serde_json::{json, Map, Value};
use std::ops::Bound;

/// Index field holding the kind discriminator
pub const KIND_FIELD: &str = "kind";
/// Index field holding the record id
pub const ID_FIELD: &str = "id";
/// Direct container of a record
pub const PARENT_FIELD: &str = "parent";
/// Every container above a record
pub const ANCESTORS_FIELD: &str = "ancestors";
/// Names of the fields a record has a value for
pub const PRESENT_FIELD: &str = "present";
/// Nested statement metadata of an item
pub const METADATA_PATH: &str = "metadata";
/// Nested labelled metadata of a collection
pub const INFO_PATH: &str = "info";
/// Nested technical metadata of a file
pub const TECHNICAL_PATH: &str = "technical";
/// Suffix of the normalized keyword sub-field used for sorting text fields
pub const SORT_SUFFIX: &str = ".sort";

/// Query node
#[derive(Debug, Clone, PartialEq)]
pub enum IndexQuery {
    MatchAll,
    MatchNone,
    /// Exact keyword match
    Term { field: String, value: String },
    /// Keyword matching any of the values
    Terms { field: String, values: Vec<String> },
    /// Analyzed text, every token must match in one of the fields
    Match { fields: Vec<String>, text: String },
    /// Integer range, dates in epoch milliseconds
    Range {
        field: String,
        lower: Bound<i64>,
        upper: Bound<i64>,
    },
    /// Field has a value
    Exists { field: String },
    Bool(BoolQuery),
    /// Raw query in the engine's own query-string syntax
    QueryString { query: String },
    /// Query evaluated against each object of a nested list
    Nested { path: String, query: Box<IndexQuery> },
}

/// Boolean combination. A non-empty `should` list requires at least one match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolQuery {
    pub must: Vec<IndexQuery>,
    pub should: Vec<IndexQuery>,
    pub must_not: Vec<IndexQuery>,
    /// Like `must`, without scoring
    pub filter: Vec<IndexQuery>,
}

impl BoolQuery {
    pub fn is_empty(&self) -> bool {
        self.must.is_empty()
            && self.should.is_empty()
            && self.must_not.is_empty()
            && self.filter.is_empty()
    }
}

impl IndexQuery {
    pub fn term(field: impl Into<String>, value: impl Into<String>) -> Self {
        IndexQuery::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn terms<I, S>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        IndexQuery::Terms {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matching<S: AsRef<str>>(fields: &[S], text: impl Into<String>) -> Self {
        IndexQuery::Match {
            fields: fields.iter().map(|f| f.as_ref().to_string()).collect(),
            text: text.into(),
        }
    }

    pub fn exists(field: impl Into<String>) -> Self {
        IndexQuery::Exists {
            field: field.into(),
        }
    }

    pub fn must(queries: Vec<IndexQuery>) -> Self {
        IndexQuery::Bool(BoolQuery {
            must: queries,
            ..Default::default()
        })
    }

    pub fn should(queries: Vec<IndexQuery>) -> Self {
        IndexQuery::Bool(BoolQuery {
            should: queries,
            ..Default::default()
        })
    }

    pub fn filter(queries: Vec<IndexQuery>) -> Self {
        IndexQuery::Bool(BoolQuery {
            filter: queries,
            ..Default::default()
        })
    }

    pub fn not(query: IndexQuery) -> Self {
        IndexQuery::Bool(BoolQuery {
            must_not: vec![query],
            ..Default::default()
        })
    }

    pub fn nested(path: impl Into<String>, query: IndexQuery) -> Self {
        IndexQuery::Nested {
            path: path.into(),
            query: Box::new(query),
        }
    }

    /// Elasticsearch query DSL
    pub fn to_json(&self) -> Value {
        match self {
            IndexQuery::MatchAll => json!({ "match_all": {} }),
            IndexQuery::MatchNone => json!({ "match_none": {} }),
            IndexQuery::Term { field, value } => json!({ "term": { field.as_str(): value } }),
            IndexQuery::Terms { field, values } => json!({ "terms": { field.as_str(): values } }),
            IndexQuery::Match { fields, text } => match fields.as_slice() {
                [field] => json!({
                    "match": { field.as_str(): { "query": text, "operator": "and" } }
                }),
                _ => json!({
                    "multi_match": {
                        "query": text,
                        "fields": fields,
                        "type": "cross_fields",
                        "operator": "and"
                    }
                }),
            },
            IndexQuery::Range {
                field,
                lower,
                upper,
            } => {
                let mut range = Map::new();
                match lower {
                    Bound::Included(v) => {
                        range.insert("gte".to_string(), json!(v));
                    }
                    Bound::Excluded(v) => {
                        range.insert("gt".to_string(), json!(v));
                    }
                    Bound::Unbounded => {}
                }
                match upper {
                    Bound::Included(v) => {
                        range.insert("lte".to_string(), json!(v));
                    }
                    Bound::Excluded(v) => {
                        range.insert("lt".to_string(), json!(v));
                    }
                    Bound::Unbounded => {}
                }
                json!({ "range": { field.as_str(): range } })
            }
            IndexQuery::Exists { field } => json!({ "exists": { "field": field } }),
            IndexQuery::Bool(query) => {
                let mut body = Map::new();
                for (name, clauses) in [
                    ("must", &query.must),
                    ("filter", &query.filter),
                    ("should", &query.should),
                    ("must_not", &query.must_not),
                ] {
                    if !clauses.is_empty() {
                        let rendered: Vec<Value> = clauses.iter().map(IndexQuery::to_json).collect();
                        body.insert(name.to_string(), Value::Array(rendered));
                    }
                }
                if !query.should.is_empty() {
                    body.insert("minimum_should_match".to_string(), json!(1));
                }
                json!({ "bool": body })
            }
            IndexQuery::QueryString { query } => json!({ "query_string": { "query": query } }),
            IndexQuery::Nested { path, query } => json!({
                "nested": { "path": path, "query": query.to_json() }
            }),
        }
    }
}

/// One sort level
#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub field: String,
    pub order: SortOrder,
    /// Mapping type assumed when an index lacks the field
    pub unmapped_type: &'static str,
}

impl SortKey {
    pub fn new(field: impl Into<String>, order: SortOrder, unmapped_type: &'static str) -> Self {
        Self {
            field: field.into(),
            order,
            unmapped_type,
        }
    }

    /// Field name without the sort sub-field suffix
    pub fn source_field(&self) -> &str {
        self.field.strip_suffix(SORT_SUFFIX).unwrap_or(&self.field)
    }

    pub fn to_json(&self) -> Value {
        json!({
            self.field.as_str(): {
                "order": self.order.to_string(),
                "unmapped_type": self.unmapped_type,
                "missing": "_last"
            }
        })
    }
}

/// Aggregation body
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregation {
    /// Most frequent values of a keyword field
    Terms { field: String, size: usize },
    /// Count, min and max of a numeric field
    Stats { field: String },
    /// Number of results also matching the query
    Filter(IndexQuery),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregationSpec {
    pub name: String,
    pub aggregation: Aggregation,
}

impl AggregationSpec {
    pub fn new(name: impl Into<String>, aggregation: Aggregation) -> Self {
        Self {
            name: name.into(),
            aggregation,
        }
    }

    /// Field reported as the facet index
    pub fn index_field(&self) -> &str {
        match &self.aggregation {
            Aggregation::Terms { field, .. } | Aggregation::Stats { field } => field,
            Aggregation::Filter(_) => &self.name,
        }
    }

    pub fn to_json(&self) -> Value {
        match &self.aggregation {
            Aggregation::Terms { field, size } => {
                json!({ "terms": { "field": field, "size": size } })
            }
            Aggregation::Stats { field } => json!({ "stats": { "field": field } }),
            Aggregation::Filter(query) => json!({ "filter": query.to_json() }),
        }
    }
}

/// Compiled search request.
///
/// `base` holds visibility, scope, kind and filter restrictions; `post` holds the
/// caller's criteria. Hits match both.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineRequest {
    pub indices: Vec<String>,
    pub base: IndexQuery,
    pub post: IndexQuery,
    pub sort: Vec<SortKey>,
    pub aggregations: Vec<AggregationSpec>,
    pub from: usize,
    pub size: usize,
}

impl EngineRequest {
    /// Elasticsearch `_search` body. Aggregations see the post query only when it is
    /// part of the main query; without aggregations it runs as a post filter.
    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        if self.aggregations.is_empty() {
            body.insert(
                "query".to_string(),
                json!({ "bool": { "filter": [self.base.to_json()] } }),
            );
            body.insert("post_filter".to_string(), self.post.to_json());
        } else {
            body.insert(
                "query".to_string(),
                json!({
                    "bool": {
                        "filter": [self.base.to_json()],
                        "must": [self.post.to_json()]
                    }
                }),
            );
            let aggs: Map<String, Value> = self
                .aggregations
                .iter()
                .map(|spec| (spec.name.clone(), spec.to_json()))
                .collect();
            body.insert("aggs".to_string(), Value::Object(aggs));
        }
        if !self.sort.is_empty() {
            let sort: Vec<Value> = self.sort.iter().map(SortKey::to_json).collect();
            body.insert("sort".to_string(), Value::Array(sort));
        }
        body.insert("from".to_string(), json!(self.from));
        body.insert("size".to_string(), json!(self.size));
        body.insert("track_total_hits".to_string(), json!(true));
        body.insert("_source".to_string(), json!(false));
        Value::Object(body)
    }

    /// The base and post queries as one conjunction
    pub fn combined_query(&self) -> IndexQuery {
        IndexQuery::Bool(BoolQuery {
            filter: vec![self.base.clone()],
            must: vec![self.post.clone()],
            ..Default::default()
        })
    }
}

/// Raw aggregation result as returned by an engine
#[derive(Debug, Clone, PartialEq)]
pub enum RawAggregation {
    Buckets(Vec<(String, u64)>),
    Stats {
        count: u64,
        min: Option<f64>,
        max: Option<f64>,
    },
    Count(u64),
}

/// Hits of one request or scroll round trip
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineResponse {
    pub ids: Vec<String>,
    pub total: u64,
    /// Cursor to continue from, when the request opened one
    pub cursor: Option<String>,
    pub aggregations: Vec<(String, RawAggregation)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_json() {
        let query = IndexQuery::Bool(BoolQuery {
            must: vec![IndexQuery::term("status", "RELEASED")],
            should: vec![IndexQuery::exists("license")],
            ..Default::default()
        });
        let json = query.to_json();
        assert_eq!(json["bool"]["must"][0]["term"]["status"], "RELEASED");
        assert_eq!(json["bool"]["should"][0]["exists"]["field"], "license");
        assert_eq!(json["bool"]["minimum_should_match"], 1);
        assert!(json["bool"].get("must_not").is_none());
    }

    #[test]
    fn test_range_json() {
        let query = IndexQuery::Range {
            field: "filesize".to_string(),
            lower: Bound::Included(10),
            upper: Bound::Excluded(21),
        };
        assert_eq!(
            query.to_json(),
            json!({ "range": { "filesize": { "gte": 10, "lt": 21 } } })
        );
    }

    #[test]
    fn test_match_json() {
        let single = IndexQuery::matching(&["title"], "report");
        assert_eq!(single.to_json()["match"]["title"]["query"], "report");
        let multi = IndexQuery::matching(&["title", "description"], "report");
        assert_eq!(multi.to_json()["multi_match"]["fields"][1], "description");
    }

    fn request(aggregations: Vec<AggregationSpec>) -> EngineRequest {
        EngineRequest {
            indices: vec!["data".to_string()],
            base: IndexQuery::term("kind", "item"),
            post: IndexQuery::matching(&["title"], "report"),
            sort: vec![SortKey::new("title.sort", SortOrder::Ascending, "keyword")],
            aggregations,
            from: 40,
            size: 20,
        }
    }

    #[test]
    fn test_request_without_aggregations_uses_post_filter() {
        let body = request(vec![]).to_json();
        assert_eq!(body["query"]["bool"]["filter"][0]["term"]["kind"], "item");
        assert_eq!(body["post_filter"]["match"]["title"]["query"], "report");
        assert!(body.get("aggs").is_none());
        assert_eq!(body["from"], 40);
        assert_eq!(body["size"], 20);
        assert_eq!(body["track_total_hits"], true);
        assert_eq!(body["sort"][0]["title.sort"]["order"], "asc");
    }

    #[test]
    fn test_request_with_aggregations_scores_post_query() {
        let body = request(vec![AggregationSpec::new(
            "filetype",
            Aggregation::Terms {
                field: "filetype".to_string(),
                size: 100,
            },
        )])
        .to_json();
        assert!(body.get("post_filter").is_none());
        assert_eq!(body["query"]["bool"]["must"][0]["match"]["title"]["query"], "report");
        assert_eq!(body["aggs"]["filetype"]["terms"]["size"], 100);
    }

    #[test]
    fn test_sort_key_source_field() {
        let key = SortKey::new("title.sort", SortOrder::Descending, "keyword");
        assert_eq!(key.source_field(), "title");
        assert_eq!(SortKey::new("created", SortOrder::Ascending, "long").source_field(), "created");
    }
}
