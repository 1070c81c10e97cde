//! Translation of query trees into index queries

use super::dsl::{
    Aggregation, AggregationSpec, BoolQuery, EngineRequest, IndexQuery, SortKey, ANCESTORS_FIELD,
    ID_FIELD, INFO_PATH, KIND_FIELD, METADATA_PATH, PARENT_FIELD, SORT_SUFFIX, TECHNICAL_PATH,
};
use crate::models::{
    Actor, CountFacet, FacetKind, ObjectKind, Visibility, COUNT_CONTAINER_ITEMS,
    COUNT_CONTAINER_ROOT_ITEMS,
};
use crate::query::{
    FieldKey, Group, LogicalRelation, MetadataField, Operator, Pair, QueryElement, SearchField,
    SearchQuery, SortCriterion, SortOrder,
};
use crate::search::error::{SearchError, SearchResult};
use crate::search::values::{
    container_id, normalize_status, range_bounds, split_alternatives, ANY_LICENSE, NO_LICENSE,
    STATUS_RELEASED, STATUS_WITHDRAWN,
};

/// Backend name reported in compile errors
pub const BACKEND_NAME: &str = "index";

/// Fields searched by `all`
pub const ALL_TEXT_FIELDS: &[&str] = &[
    "title",
    "description",
    "author",
    "organization",
    "filename",
    "name",
];

/// Index field a search field is stored under
pub fn index_field(field: SearchField) -> &'static str {
    match field {
        SearchField::All => "all",
        SearchField::Fulltext => "fulltext",
        SearchField::Title => "title",
        SearchField::Description => "description",
        SearchField::Author => "author",
        SearchField::Organization => "organization",
        SearchField::Status => "status",
        SearchField::Collection | SearchField::Col => "collection",
        SearchField::Creator => "creator",
        SearchField::Created => "created",
        SearchField::Modified => "modified",
        SearchField::Filename => "filename",
        SearchField::Filetype => "filetype",
        SearchField::Filesize => "filesize",
        SearchField::License => "license",
        SearchField::Checksum => "checksum",
        SearchField::Id => ID_FIELD,
        SearchField::Email => "email",
        SearchField::Name => "name",
        SearchField::Metadata => METADATA_PATH,
        SearchField::CollectionMetadata => INFO_PATH,
        SearchField::Technical => TECHNICAL_PATH,
    }
}

/// Compiles queries for a fixed set of kinds
#[derive(Debug, Clone)]
pub struct IndexQueryCompiler {
    kinds: Vec<ObjectKind>,
    facet_bucket_size: usize,
}

impl IndexQueryCompiler {
    pub fn new(kinds: Vec<ObjectKind>, facet_bucket_size: usize) -> Self {
        Self {
            kinds,
            facet_bucket_size,
        }
    }

    pub fn kinds(&self) -> &[ObjectKind] {
        &self.kinds
    }

    /// Indices holding the kinds, without duplicates
    pub fn indices(&self) -> Vec<String> {
        let mut indices: Vec<String> = Vec::new();
        for kind in &self.kinds {
            let index = kind.shape().index;
            if !indices.iter().any(|i| i == index) {
                indices.push(index.to_string());
            }
        }
        indices
    }

    /// Full request for a structured query. Paging is left to the caller.
    pub fn request(
        &self,
        query: &SearchQuery,
        sorts: &[SortCriterion],
        actor: Option<&Actor>,
        scope_id: Option<&str>,
        with_facets: bool,
    ) -> SearchResult<EngineRequest> {
        Ok(EngineRequest {
            indices: self.indices(),
            base: self.base_query(query, actor, scope_id)?,
            post: self.post_query(query)?,
            sort: self.sort_keys(sorts)?,
            aggregations: if with_facets {
                self.aggregations(scope_id)
            } else {
                Vec::new()
            },
            from: 0,
            size: 0,
        })
    }

    /// Request running a raw query string under the actor's visibility
    pub fn raw_request(
        &self,
        raw_query: &str,
        sort: &SortCriterion,
        actor: Option<&Actor>,
    ) -> SearchResult<EngineRequest> {
        Ok(EngineRequest {
            indices: self.indices(),
            base: self.base_query(&SearchQuery::default(), actor, None)?,
            post: IndexQuery::QueryString {
                query: raw_query.to_string(),
            },
            sort: self.sort_keys(std::slice::from_ref(sort))?,
            aggregations: Vec::new(),
            from: 0,
            size: 0,
        })
    }

    /// Kind restriction, visibility, scope and the filter channel
    pub fn base_query(
        &self,
        query: &SearchQuery,
        actor: Option<&Actor>,
        scope_id: Option<&str>,
    ) -> SearchResult<IndexQuery> {
        let mut filter = Vec::new();

        let status_named = query.has_field(SearchField::Status);
        let mut kind_clauses: Vec<IndexQuery> = self
            .kinds
            .iter()
            .map(|kind| self.kind_clause(*kind, actor, status_named))
            .collect();
        match kind_clauses.len() {
            0 => {}
            1 => filter.append(&mut kind_clauses),
            _ => filter.push(IndexQuery::should(kind_clauses)),
        }

        if let Some(scope) = scope_id {
            filter.push(IndexQuery::term(ANCESTORS_FIELD, scope));
        }

        if let Some(filters) = self.compile_conjunction(&query.filters)? {
            filter.push(filters);
        }

        Ok(IndexQuery::filter(filter))
    }

    /// The caller's criteria, match-all when there are none
    pub fn post_query(&self, query: &SearchQuery) -> SearchResult<IndexQuery> {
        Ok(self
            .compile_conjunction(&query.elements)?
            .unwrap_or(IndexQuery::MatchAll))
    }

    /// Kind first, then the criteria, then the id as a tie-break
    pub fn sort_keys(&self, sorts: &[SortCriterion]) -> SearchResult<Vec<SortKey>> {
        let default_sort = [SortCriterion::default()];
        let sorts = if sorts.is_empty() { &default_sort[..] } else { sorts };

        let mut keys = vec![SortKey::new(KIND_FIELD, SortOrder::Ascending, "keyword")];
        for criterion in sorts {
            let field = criterion.field;
            let key = match field {
                SearchField::Title | SearchField::Filename | SearchField::Name => SortKey::new(
                    format!("{}{}", index_field(field), SORT_SUFFIX),
                    criterion.order,
                    "keyword",
                ),
                SearchField::Created | SearchField::Modified | SearchField::Filesize => {
                    SortKey::new(index_field(field), criterion.order, "long")
                }
                SearchField::Status
                | SearchField::Collection
                | SearchField::Col
                | SearchField::Creator
                | SearchField::Checksum
                | SearchField::Filetype
                | SearchField::License
                | SearchField::Email
                | SearchField::Id => SortKey::new(index_field(field), criterion.order, "keyword"),
                SearchField::All
                | SearchField::Fulltext
                | SearchField::Description
                | SearchField::Author
                | SearchField::Organization
                | SearchField::Metadata
                | SearchField::CollectionMetadata
                | SearchField::Technical => {
                    return Err(SearchError::UnsupportedField {
                        field,
                        backend: BACKEND_NAME,
                    })
                }
            };
            keys.push(key);
        }
        if !sorts.iter().any(|s| s.field == SearchField::Id) {
            keys.push(SortKey::new(ID_FIELD, SortOrder::Ascending, "keyword"));
        }
        Ok(keys)
    }

    /// Facets of the primary kind plus the scope counts
    pub fn aggregations(&self, scope_id: Option<&str>) -> Vec<AggregationSpec> {
        let Some(kind) = self.kinds.first() else {
            return Vec::new();
        };
        let shape = kind.shape();

        let mut specs: Vec<AggregationSpec> = shape
            .facets
            .iter()
            .map(|facet| {
                let field = index_field(facet.field).to_string();
                let aggregation = match facet.kind {
                    FacetKind::Terms => Aggregation::Terms {
                        field,
                        size: self.facet_bucket_size,
                    },
                    FacetKind::Stats => Aggregation::Stats { field },
                };
                AggregationSpec::new(facet.name, aggregation)
            })
            .collect();

        let item = ObjectKind::Item.shape().join_value;
        let folder = ObjectKind::Collection.shape().join_value;
        for count in shape.counts {
            let filter = match count {
                CountFacet::All => IndexQuery::MatchAll,
                CountFacet::RootContainers => IndexQuery::not(IndexQuery::exists(PARENT_FIELD)),
                CountFacet::Items => IndexQuery::term(KIND_FIELD, item),
                CountFacet::Subcontainers => IndexQuery::term(KIND_FIELD, folder),
            };
            specs.push(AggregationSpec::new(count.name(), Aggregation::Filter(filter)));
        }

        if let Some(scope) = scope_id {
            specs.push(AggregationSpec::new(
                COUNT_CONTAINER_ITEMS,
                Aggregation::Filter(IndexQuery::term(PARENT_FIELD, scope)),
            ));
            specs.push(AggregationSpec::new(
                COUNT_CONTAINER_ROOT_ITEMS,
                Aggregation::Filter(IndexQuery::must(vec![
                    IndexQuery::term(PARENT_FIELD, scope),
                    IndexQuery::term(KIND_FIELD, item),
                ])),
            ));
        }
        specs
    }

    fn kind_clause(&self, kind: ObjectKind, actor: Option<&Actor>, status_named: bool) -> IndexQuery {
        let shape = kind.shape();
        let mut clause = BoolQuery {
            filter: vec![IndexQuery::term(KIND_FIELD, shape.join_value)],
            ..Default::default()
        };

        match (shape.visibility, actor) {
            (Visibility::Status, None) => {
                clause.filter.push(IndexQuery::term("status", STATUS_RELEASED));
            }
            (Visibility::Status, Some(actor)) => {
                if !actor.sysadmin {
                    let mut readable = vec![IndexQuery::term("status", STATUS_RELEASED)];
                    if !actor.readable_containers.is_empty() {
                        readable.push(IndexQuery::terms(
                            ANCESTORS_FIELD,
                            actor.readable_containers.iter().cloned(),
                        ));
                        readable.push(IndexQuery::terms(
                            ID_FIELD,
                            actor.readable_containers.iter().cloned(),
                        ));
                    }
                    clause.filter.push(IndexQuery::should(readable));
                }
                if !status_named {
                    clause
                        .must_not
                        .push(IndexQuery::term("status", STATUS_WITHDRAWN));
                }
            }
            (Visibility::Authenticated, None) => clause.filter.push(IndexQuery::MatchNone),
            (Visibility::Authenticated, Some(_)) | (Visibility::Public, _) => {}
        }

        IndexQuery::Bool(clause)
    }

    fn supports(&self, field: SearchField) -> bool {
        self.kinds.iter().any(|kind| kind.supports(field))
    }

    fn compile_conjunction(&self, elements: &[QueryElement]) -> SearchResult<Option<IndexQuery>> {
        let mut compiled = Vec::with_capacity(elements.len());
        for element in elements {
            if let Some(query) = self.compile_element(element)? {
                compiled.push(query);
            }
        }
        Ok(match compiled.len() {
            0 => None,
            1 => compiled.pop(),
            _ => Some(IndexQuery::must(compiled)),
        })
    }

    /// `None` for elements that carry no condition
    pub fn compile_element(&self, element: &QueryElement) -> SearchResult<Option<IndexQuery>> {
        match element {
            QueryElement::Pair(pair) => self.compile_pair(pair),
            QueryElement::Group(group) => self.compile_group(group),
            QueryElement::Query(query) => {
                let mut elements = query.elements.clone();
                elements.extend(query.filters.iter().cloned());
                self.compile_conjunction(&elements)
            }
        }
    }

    fn compile_group(&self, group: &Group) -> SearchResult<Option<IndexQuery>> {
        let compiled = match group.relation {
            LogicalRelation::And => self.compile_conjunction(&group.elements)?,
            LogicalRelation::Or => {
                let mut alternatives = Vec::with_capacity(group.elements.len());
                for element in &group.elements {
                    if let Some(query) = self.compile_element(element)? {
                        alternatives.push(query);
                    }
                }
                match alternatives.len() {
                    0 => None,
                    1 => alternatives.pop(),
                    _ => Some(IndexQuery::should(alternatives)),
                }
            }
        };
        Ok(compiled.map(|query| negate_if(query, group.negated)))
    }

    fn compile_pair(&self, pair: &Pair) -> SearchResult<Option<IndexQuery>> {
        if pair.is_empty() {
            return Ok(None);
        }
        let field = pair.field;
        if !self.supports(field) {
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

        let value = unquote(pair.value.trim());
        let name = index_field(field);
        let query = match field {
            SearchField::All => IndexQuery::matching(ALL_TEXT_FIELDS, value),
            SearchField::Fulltext
            | SearchField::Title
            | SearchField::Description
            | SearchField::Author
            | SearchField::Organization
            | SearchField::Filename
            | SearchField::Name => IndexQuery::matching(&[name], value),
            SearchField::Status => IndexQuery::term(name, normalize_status(value)?),
            SearchField::Collection
            | SearchField::Creator
            | SearchField::Checksum
            | SearchField::Id
            | SearchField::Email => IndexQuery::term(name, value),
            SearchField::License if value == ANY_LICENSE => IndexQuery::Bool(BoolQuery {
                must: vec![IndexQuery::exists(name)],
                must_not: vec![IndexQuery::term(name, NO_LICENSE)],
                ..Default::default()
            }),
            SearchField::Filetype | SearchField::License => {
                IndexQuery::terms(name, split_alternatives(value))
            }
            SearchField::Col => IndexQuery::term(name, container_id(value)),
            SearchField::Created | SearchField::Modified | SearchField::Filesize => {
                range_query(name, pair)?
            }
            SearchField::Metadata | SearchField::CollectionMetadata | SearchField::Technical => {
                let key = pair.key.as_ref().ok_or_else(|| SearchError::InvalidValue {
                    field,
                    value: pair.value.clone(),
                    reason: "missing statement or label".to_string(),
                })?;
                keyed_query(pair, key, value)?
            }
        };
        Ok(Some(negate_if(query, pair.negated)))
    }
}

fn range_query(name: &str, pair: &Pair) -> SearchResult<IndexQuery> {
    let bounds = range_bounds(pair)?;
    Ok(IndexQuery::Range {
        field: name.to_string(),
        lower: bounds.lower,
        upper: bounds.upper,
    })
}

/// Condition on one object of a nested metadata list
fn keyed_query(pair: &Pair, key: &FieldKey, value: &str) -> SearchResult<IndexQuery> {
    let (path, selector, condition) = match pair.field {
        SearchField::CollectionMetadata => (
            INFO_PATH,
            IndexQuery::term("info.label.exact", key.name.replace('_', " ")),
            IndexQuery::matching(&["info.text"], value),
        ),
        SearchField::Technical => (
            TECHNICAL_PATH,
            IndexQuery::term("technical.name", key.name.as_str()),
            IndexQuery::matching(&["technical.value"], value),
        ),
        _ => {
            let condition = match key.subfield {
                None | Some(MetadataField::Text) => IndexQuery::matching(&["metadata.text"], value),
                Some(MetadataField::Exact) => IndexQuery::term("metadata.text.exact", value),
                Some(MetadataField::Url) => IndexQuery::term("metadata.uri", value),
                Some(MetadataField::Placename) => IndexQuery::matching(&["metadata.name"], value),
                Some(MetadataField::Title) => IndexQuery::matching(&["metadata.title"], value),
                Some(MetadataField::Familyname) => {
                    IndexQuery::matching(&["metadata.familyname"], value)
                }
                Some(MetadataField::Givenname) => {
                    IndexQuery::matching(&["metadata.givenname"], value)
                }
                Some(MetadataField::Number) => range_query("metadata.number", pair)?,
                Some(MetadataField::Date | MetadataField::Time) => {
                    range_query("metadata.time", pair)?
                }
                Some(MetadataField::Coordinates) => {
                    return Err(SearchError::InvalidValue {
                        field: pair.field,
                        value: pair.value.clone(),
                        reason: "geo-distance search is not supported".to_string(),
                    })
                }
            };
            (
                METADATA_PATH,
                IndexQuery::term("metadata.index", key.name.as_str()),
                condition,
            )
        }
    };
    Ok(IndexQuery::nested(path, IndexQuery::must(vec![selector, condition])))
}

fn negate_if(query: IndexQuery, negated: bool) -> IndexQuery {
    if negated {
        IndexQuery::not(query)
    } else {
        query
    }
}

/// Quoted values are matched without their quotes
fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{parse_query, QueryFactory};
    use std::ops::Bound;

    fn items() -> IndexQueryCompiler {
        IndexQueryCompiler::new(vec![ObjectKind::Item], 100)
    }

    fn post(text: &str) -> IndexQuery {
        items().post_query(&parse_query(text).unwrap()).unwrap()
    }

    #[test]
    fn test_empty_query_matches_all() {
        assert_eq!(items().post_query(&SearchQuery::default()).unwrap(), IndexQuery::MatchAll);
    }

    #[test]
    fn test_field_mapping() {
        assert_eq!(
            post("title=report"),
            IndexQuery::matching(&["title"], "report")
        );
        assert_eq!(post("status=public"), IndexQuery::term("status", "RELEASED"));
        let alternatives = SearchQuery::new(vec![
            Pair::equals(SearchField::Filetype, "image OR video").into(),
        ]);
        assert_eq!(
            items().post_query(&alternatives).unwrap(),
            IndexQuery::terms("filetype", ["image", "video"])
        );
        assert_eq!(
            post("filesize>=10"),
            IndexQuery::Range {
                field: "filesize".to_string(),
                lower: Bound::Included(10),
                upper: Bound::Unbounded,
            }
        );
    }

    #[test]
    fn test_any_license() {
        match post("license=*") {
            IndexQuery::Bool(query) => {
                assert_eq!(query.must, vec![IndexQuery::exists("license")]);
                assert_eq!(query.must_not, vec![IndexQuery::term("license", NO_LICENSE)]);
            }
            other => panic!("unexpected query {:?}", other),
        }
    }

    #[test]
    fn test_boolean_structure() {
        let query = QueryFactory::new()
            .or(vec![
                Pair::equals(SearchField::Title, "a").into(),
                Pair::equals(SearchField::Title, "b").negate().into(),
            ])
            .build();
        let compiled = items().post_query(&query).unwrap();
        assert_eq!(
            compiled,
            IndexQuery::should(vec![
                IndexQuery::matching(&["title"], "a"),
                IndexQuery::not(IndexQuery::matching(&["title"], "b")),
            ])
        );
    }

    #[test]
    fn test_empty_pairs_are_skipped() {
        let query = SearchQuery::new(vec![
            Pair::equals(SearchField::Title, "  ").into(),
            Pair::equals(SearchField::Author, "Ada").into(),
        ]);
        assert_eq!(
            items().post_query(&query).unwrap(),
            IndexQuery::matching(&["author"], "Ada")
        );
    }

    #[test]
    fn test_statement_metadata_is_nested() {
        let compiled = post(
            r#"col="http://imeji.org/collection/86" AND md.title.text=TEST AND (md.created.date=2012 OR md.location.placename=Munich)"#,
        )
        .to_json();
        let clauses = &compiled["bool"]["must"];
        assert_eq!(clauses[0]["term"]["collection"], "86");

        let title = &clauses[1]["nested"];
        assert_eq!(title["path"], "metadata");
        assert_eq!(title["query"]["bool"]["must"][0]["term"]["metadata.index"], "title");
        assert_eq!(
            title["query"]["bool"]["must"][1]["match"]["metadata.text"]["query"],
            "TEST"
        );

        let created = &clauses[2]["bool"]["should"][0]["nested"]["query"]["bool"]["must"][1];
        assert!(created["range"]["metadata.time"]["gte"].is_i64());
        let place = &clauses[2]["bool"]["should"][1]["nested"]["query"]["bool"]["must"][1];
        assert_eq!(place["match"]["metadata.name"]["query"], "Munich");
    }

    #[test]
    fn test_collection_and_technical_metadata() {
        let collections = IndexQueryCompiler::new(vec![ObjectKind::Collection], 100);
        let compiled = collections
            .post_query(&parse_query("collection.md.Project_Name=glacier").unwrap())
            .unwrap()
            .to_json();
        assert_eq!(compiled["nested"]["path"], "info");
        assert_eq!(
            compiled["nested"]["query"]["bool"]["must"][0]["term"]["info.label.exact"],
            "Project Name"
        );

        let compiled = post("technical[Make]@Canon").to_json();
        assert_eq!(compiled["nested"]["path"], "technical");
        assert_eq!(
            compiled["nested"]["query"]["bool"]["must"][0]["term"]["technical.name"],
            "Make"
        );

        assert!(matches!(
            items().post_query(&parse_query("md.position.coordinates=1,2").unwrap()),
            Err(SearchError::InvalidValue { .. })
        ));
        assert!(matches!(
            items().sort_keys(&[SortCriterion::ascending(SearchField::Metadata)]),
            Err(SearchError::UnsupportedField { .. })
        ));
    }

    #[test]
    fn test_compile_errors() {
        let users = IndexQueryCompiler::new(vec![ObjectKind::User], 100);
        let query = parse_query("filesize=10").unwrap();
        assert!(matches!(
            users.post_query(&query),
            Err(SearchError::UnsupportedField { .. })
        ));
        let query = QueryFactory::new()
            .pair(SearchField::Title, Operator::Greater, "a")
            .build();
        assert!(matches!(
            items().post_query(&query),
            Err(SearchError::UnsupportedOperator { .. })
        ));
        assert!(matches!(
            items().post_query(&parse_query("status=archived").unwrap()),
            Err(SearchError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_anonymous_base_query_only_sees_released() {
        let base = items()
            .base_query(&SearchQuery::default(), None, None)
            .unwrap()
            .to_json();
        let clause = &base["bool"]["filter"][0]["bool"];
        assert_eq!(clause["filter"][0]["term"]["kind"], "item");
        assert_eq!(clause["filter"][1]["term"]["status"], "RELEASED");
        assert!(clause.get("must_not").is_none());
    }

    #[test]
    fn test_logged_in_base_query() {
        let actor = Actor::new("u1").with_readable_containers(["c1"]);
        let base = items()
            .base_query(&SearchQuery::default(), Some(&actor), Some("c1"))
            .unwrap()
            .to_json();
        let clause = &base["bool"]["filter"][0]["bool"];
        assert_eq!(clause["filter"][1]["bool"]["should"][1]["terms"]["ancestors"][0], "c1");
        assert_eq!(clause["must_not"][0]["term"]["status"], "WITHDRAWN");
        assert_eq!(base["bool"]["filter"][1]["term"]["ancestors"], "c1");

        // naming the status lifts the default exclusion
        let query = parse_query("status=discarded").unwrap();
        let base = items().base_query(&query, Some(&actor), None).unwrap().to_json();
        assert!(base["bool"]["filter"][0]["bool"].get("must_not").is_none());

        let admin = Actor::admin("root");
        let base = items()
            .base_query(&SearchQuery::default(), Some(&admin), None)
            .unwrap()
            .to_json();
        assert_eq!(
            base["bool"]["filter"][0]["bool"]["filter"].as_array().map(Vec::len),
            Some(1)
        );
    }

    #[test]
    fn test_authenticated_kinds_hidden_from_anonymous() {
        let content = IndexQueryCompiler::new(vec![ObjectKind::Content], 100);
        let base = content
            .base_query(&SearchQuery::default(), None, None)
            .unwrap()
            .to_json();
        assert!(base["bool"]["filter"][0]["bool"]["filter"][1]
            .get("match_none")
            .is_some());
    }

    #[test]
    fn test_filters_go_to_base_query() {
        let query = QueryFactory::new()
            .pair(SearchField::Title, Operator::Equals, "report")
            .filter(Pair::equals(SearchField::Collection, "c9"))
            .build();
        let base = items().base_query(&query, None, None).unwrap().to_json();
        assert_eq!(base["bool"]["filter"][1]["term"]["collection"], "c9");
        assert_eq!(
            items().post_query(&query).unwrap(),
            IndexQuery::matching(&["title"], "report")
        );
    }

    #[test]
    fn test_sort_keys() {
        let keys = items()
            .sort_keys(&[SortCriterion::descending(SearchField::Title)])
            .unwrap();
        let fields: Vec<&str> = keys.iter().map(|k| k.field.as_str()).collect();
        assert_eq!(fields, vec!["kind", "title.sort", "id"]);
        assert_eq!(keys[1].order, SortOrder::Descending);

        let default_keys = items().sort_keys(&[]).unwrap();
        assert_eq!(default_keys[1].field, "created");

        assert!(matches!(
            items().sort_keys(&[SortCriterion::ascending(SearchField::Description)]),
            Err(SearchError::UnsupportedField { .. })
        ));
    }

    #[test]
    fn test_aggregations() {
        let specs = items().aggregations(Some("c1"));
        let names: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "filetype",
                "license",
                "collection",
                "status",
                "filesize",
                "all",
                "count_all_items",
                "count_all_collection_subcollections",
                "count_all_collection_items",
                "count_all_collection_root_items",
            ]
        );
        assert!(items().aggregations(None).len() < specs.len());
    }

    #[test]
    fn test_indices_deduplicated() {
        let compiler = IndexQueryCompiler::new(vec![ObjectKind::Item, ObjectKind::Collection], 100);
        assert_eq!(compiler.indices(), vec!["data".to_string()]);
        let base = compiler
            .base_query(&SearchQuery::default(), None, None)
            .unwrap()
            .to_json();
        assert_eq!(base["bool"]["filter"][0]["bool"]["should"].as_array().map(Vec::len), Some(2));
    }
}
