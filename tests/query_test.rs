//! Tests for building, printing and running query trees

mod common;

use catalog_search::models::ObjectKind;
use catalog_search::query::{
    parse_or_empty, parse_query, parse_url_query, pretty_print, to_url, Group, Operator, Pair,
    QueryElement, QueryFactory, SearchField, SearchQuery, SortCriterion,
};
use catalog_search::search::index::IndexSearch;
use catalog_search::search::{SearchError, SearchPort, Window};
use common::*;
use tempfile::TempDir;

#[test]
fn test_factory_matches_parsed_query() {
    let built = QueryFactory::new()
        .pair(SearchField::Title, Operator::Equals, "lake")
        .or(vec![
            Pair::equals(SearchField::Filetype, "image").into(),
            Pair::equals(SearchField::Filetype, "video").into(),
        ])
        .build();
    let parsed = parse_query("title=lake AND (filetype=image OR filetype=video)").unwrap();

    assert!(built.is_same(&parsed));
    assert_eq!(
        pretty_print(&built),
        "title=lake AND (filetype=image OR filetype=video)"
    );
}

#[test]
fn test_empty_fragments_are_dropped() {
    let query = QueryFactory::new()
        .pair(SearchField::Title, Operator::Equals, "")
        .element(Group::and(Vec::new()))
        .or(vec![Pair::equals(SearchField::Name, "ada").into()])
        .build();

    assert_eq!(query.elements.len(), 1);
    assert!(matches!(query.elements[0], QueryElement::Pair(_)));
}

#[test]
fn test_url_round_trip() {
    let query = parse_query("title=\"ice and snow\" AND NOT status=pending").unwrap();
    let url = to_url(&query);
    assert!(!url.contains(' '));
    assert!(parse_url_query(&url).unwrap().is_same(&query));
}

#[test]
fn test_parse_or_empty_falls_back() {
    assert!(parse_or_empty("(title=lake").is_empty());
    assert!(!parse_or_empty("title=lake").is_empty());
}

#[test]
fn test_tree_serializes() {
    let query = parse_query("NOT (filetype=image OR created>=2020)").unwrap();
    let json = serde_json::to_string(&query).unwrap();
    let back: SearchQuery = serde_json::from_str(&json).unwrap();
    assert!(back.is_same(&query));
}

#[tokio::test]
async fn test_filters_restrict_without_printing() {
    let dir = TempDir::new().unwrap();
    let index = indexed(test_config(&dir), &catalog()).await;
    let port = IndexSearch::new(index, vec![ObjectKind::Item], &test_config(&dir));

    let query = QueryFactory::from_query(parse_query("title=lake").unwrap())
        .filter(Pair::equals(SearchField::Filetype, "video"))
        .build();
    let result = port
        .search(&query, &SortCriterion::default(), None, None, Window::default())
        .await
        .unwrap();

    assert_eq!(result.ids, ids(&["i2"]));
    assert_eq!(result.query, "title=lake");
}

#[tokio::test]
async fn test_field_not_searchable_for_kind() {
    let dir = TempDir::new().unwrap();
    let index = indexed(test_config(&dir), &catalog()).await;
    let users = IndexSearch::new(index, vec![ObjectKind::User], &test_config(&dir));

    let err = users
        .search(
            &parse_query("filetype=image").unwrap(),
            &SortCriterion::default(),
            None,
            None,
            Window::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SearchError::UnsupportedField {
            field: SearchField::Filetype,
            ..
        }
    ));
}
