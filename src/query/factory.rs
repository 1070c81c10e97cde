//! Incremental construction of query trees

use super::element::{Group, Pair, QueryElement, SearchQuery};
use super::field::{LogicalRelation, Operator, SearchField};

/// Builds a [`SearchQuery`] from fragments.
///
/// Fragments added with [`and`](Self::and), [`pair`](Self::pair) and
/// [`element`](Self::element) are AND-joined. Empty fragments are dropped. The filter
/// channel is kept apart from the user-visible elements.
///
/// ```
/// use catalog_search::query::{QueryFactory, SearchField, Operator};
///
/// let query = QueryFactory::new()
///     .pair(SearchField::Title, Operator::Equals, "glacier")
///     .or(vec![
///         catalog_search::query::Pair::equals(SearchField::Filetype, "image").into(),
///         catalog_search::query::Pair::equals(SearchField::Filetype, "video").into(),
///     ])
///     .filter(catalog_search::query::Pair::equals(SearchField::Collection, "c1"))
///     .build();
///
/// assert_eq!(query.elements.len(), 2);
/// assert_eq!(query.filters.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryFactory {
    elements: Vec<QueryElement>,
    filters: Vec<QueryElement>,
}

impl QueryFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing group.
    ///
    /// A plain AND group contributes its children directly; any other group is kept
    /// as a single element so its relation and negation survive.
    pub fn from_group(group: Group) -> Self {
        let mut factory = Self::new();
        if group.relation == LogicalRelation::And && !group.negated {
            for element in group.elements {
                factory.push(element);
            }
        } else {
            factory.push(group.into());
        }
        factory
    }

    /// Start from an existing query, keeping its filters
    pub fn from_query(query: SearchQuery) -> Self {
        Self {
            elements: query.elements,
            filters: query.filters,
        }
    }

    /// AND-join a list of elements
    pub fn and(mut self, elements: Vec<QueryElement>) -> Self {
        for element in elements {
            self.push(element);
        }
        self
    }

    pub fn element(mut self, element: impl Into<QueryElement>) -> Self {
        self.push(element.into());
        self
    }

    pub fn pair(self, field: SearchField, operator: Operator, value: impl Into<String>) -> Self {
        self.element(Pair::new(field, operator, value))
    }

    /// AND-join one OR group of the given elements. A single remaining element is
    /// added without a wrapper.
    pub fn or(mut self, elements: Vec<QueryElement>) -> Self {
        let mut kept: Vec<QueryElement> = elements.into_iter().filter(|e| !e.is_empty()).collect();
        match kept.len() {
            0 => {}
            1 => self.push(kept.remove(0)),
            _ => self.push(Group::or(kept).into()),
        }
        self
    }

    /// Replace the filter channel with the elements and filters of `query`
    pub fn init_filter(mut self, query: SearchQuery) -> Self {
        self.filters = query
            .elements
            .into_iter()
            .chain(query.filters)
            .filter(|e| !e.is_empty())
            .collect();
        self
    }

    /// Add one server-side filter
    pub fn filter(mut self, element: impl Into<QueryElement>) -> Self {
        let element = element.into();
        if !element.is_empty() {
            self.filters.push(element);
        }
        self
    }

    pub fn build(self) -> SearchQuery {
        SearchQuery {
            elements: self.elements,
            filters: self.filters,
        }
    }

    /// Build the user-visible elements as one AND group. Filters are not part of a group.
    pub fn build_as_group(self) -> Group {
        Group::and(self.elements)
    }

    fn push(&mut self, element: QueryElement) {
        if !element.is_empty() {
            self.elements.push(element);
        }
    }
}
