//! Boolean query tree: pairs, groups and queries

use super::field::{LogicalRelation, MetadataField, Operator, SearchField, ValueType};
use serde::{Deserialize, Serialize};

/// Maximum nesting the equivalence check follows before giving up
pub const MAX_ELEMENT_DEPTH: usize = 64;

/// A node of the query tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueryElement {
    Pair(Pair),
    Group(Group),
    Query(SearchQuery),
}

/// Leaf condition: `field operator value`, optionally negated
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pair {
    pub field: SearchField,
    pub operator: Operator,
    pub value: String,
    #[serde(default)]
    pub negated: bool,
    /// Statement or label of a keyed field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<FieldKey>,
}

/// Qualifier of a pair on a keyed field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldKey {
    /// Statement id, or the label for collection and technical metadata
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subfield: Option<MetadataField>,
}

/// Ordered children joined by one logical relation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Group {
    pub elements: Vec<QueryElement>,
    #[serde(default)]
    pub relation: LogicalRelation,
    #[serde(default)]
    pub negated: bool,
}

/// Top-level query.
///
/// `elements` are AND-joined and form the user-visible query. `filters` carry
/// server-side scoping and are never printed back to the user.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub elements: Vec<QueryElement>,
    #[serde(default)]
    pub filters: Vec<QueryElement>,
}

impl Pair {
    pub fn new(field: SearchField, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            field,
            operator,
            value: value.into(),
            negated: false,
            key: None,
        }
    }

    /// Pair on the metadata of one statement
    pub fn metadata(
        statement: impl Into<String>,
        subfield: Option<MetadataField>,
        operator: Operator,
        value: impl Into<String>,
    ) -> Self {
        Self::keyed(SearchField::Metadata, statement, subfield, operator, value)
    }

    /// Pair on the collection metadata carrying `label`
    pub fn collection_metadata(
        label: impl Into<String>,
        operator: Operator,
        value: impl Into<String>,
    ) -> Self {
        Self::keyed(SearchField::CollectionMetadata, label, None, operator, value)
    }

    /// Pair on the technical metadata named `label`
    pub fn technical(label: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self::keyed(SearchField::Technical, label, None, operator, value)
    }

    fn keyed(
        field: SearchField,
        name: impl Into<String>,
        subfield: Option<MetadataField>,
        operator: Operator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            key: Some(FieldKey {
                name: name.into(),
                subfield,
            }),
            ..Self::new(field, operator, value)
        }
    }

    /// Index name in the textual query language
    pub fn index(&self) -> String {
        match (self.field, &self.key) {
            (SearchField::Metadata, Some(key)) => match key.subfield {
                Some(subfield) => format!("{}.{}.{}", self.field, key.name, subfield),
                None => format!("{}.{}", self.field, key.name),
            },
            (SearchField::CollectionMetadata, Some(key)) => format!("{}.{}", self.field, key.name),
            (SearchField::Technical, Some(key)) => format!("{}[{}]", self.field, key.name),
            (field, _) => field.to_string(),
        }
    }

    /// Value interpretation, refined by the metadata subfield
    pub fn value_type(&self) -> ValueType {
        let subfield = self.key.as_ref().and_then(|key| key.subfield);
        match (self.field, subfield) {
            (SearchField::Metadata, Some(MetadataField::Number)) => ValueType::Number,
            (SearchField::Metadata, Some(MetadataField::Date | MetadataField::Time)) => {
                ValueType::Date
            }
            (SearchField::Metadata, Some(MetadataField::Exact | MetadataField::Url)) => {
                ValueType::Keyword
            }
            (field, _) => field.value_type(),
        }
    }

    /// True if the pair accepts `>`, `<`, `>=`, `<=`
    pub fn is_range(&self) -> bool {
        matches!(self.value_type(), ValueType::Date | ValueType::Number)
    }

    /// Shorthand for an `Equals` pair
    pub fn equals(field: SearchField, value: impl Into<String>) -> Self {
        Self::new(field, Operator::Equals, value)
    }

    pub fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }
}

impl Group {
    pub fn new(relation: LogicalRelation, elements: Vec<QueryElement>) -> Self {
        Self {
            elements,
            relation,
            negated: false,
        }
    }

    pub fn and(elements: Vec<QueryElement>) -> Self {
        Self::new(LogicalRelation::And, elements)
    }

    pub fn or(elements: Vec<QueryElement>) -> Self {
        Self::new(LogicalRelation::Or, elements)
    }

    pub fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.elements.iter().all(QueryElement::is_empty)
    }
}

impl SearchQuery {
    pub fn new(elements: Vec<QueryElement>) -> Self {
        Self {
            elements,
            filters: Vec::new(),
        }
    }

    /// Lift any element into a query. A query is returned as is.
    pub fn to_search_query(element: QueryElement) -> Self {
        match element {
            QueryElement::Query(query) => query,
            other => Self::new(vec![other]),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty() && self.filters.is_empty()
    }

    /// Shallow structural clone of both element lists
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// True if a top-level free-text pair is present
    pub fn is_simple_search(&self) -> bool {
        self.elements
            .iter()
            .any(|e| matches!(e, QueryElement::Pair(p) if p.field == SearchField::All))
    }

    /// True if any user-visible element refers to `field`
    pub fn has_field(&self, field: SearchField) -> bool {
        self.elements.iter().any(|e| e.has_field(field))
    }

    /// Structural equivalence, see [`QueryElement::is_same`]
    pub fn is_same(&self, other: &SearchQuery) -> bool {
        QueryElement::Query(self.clone()).is_same(&QueryElement::Query(other.clone()))
    }
}

impl QueryElement {
    /// Children of the element; empty for pairs
    pub fn elements(&self) -> &[QueryElement] {
        match self {
            QueryElement::Pair(_) => &[],
            QueryElement::Group(group) => &group.elements,
            QueryElement::Query(query) => &query.elements,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            QueryElement::Pair(pair) => pair.is_empty(),
            QueryElement::Group(group) => group.is_empty(),
            QueryElement::Query(query) => query.is_empty(),
        }
    }

    pub fn has_field(&self, field: SearchField) -> bool {
        match self {
            QueryElement::Pair(pair) => pair.field == field,
            other => other.elements().iter().any(|e| e.has_field(field)),
        }
    }

    /// Structural equivalence.
    ///
    /// Singleton wrappers are unwrapped before comparing: a group holding exactly one
    /// pair is the same as that pair, and so is a query holding it. Negating a singleton
    /// group folds the negation into its child. Groups compare their relation and their
    /// children position by position. Trees deeper than [`MAX_ELEMENT_DEPTH`] are never
    /// considered the same.
    pub fn is_same(&self, other: &QueryElement) -> bool {
        match same(View::of(self), View::of(other), 0) {
            Some(result) => result,
            None => {
                tracing::warn!(
                    max_depth = MAX_ELEMENT_DEPTH,
                    "Query tree exceeds maximum depth, treating elements as different"
                );
                false
            }
        }
    }
}

impl From<Pair> for QueryElement {
    fn from(pair: Pair) -> Self {
        QueryElement::Pair(pair)
    }
}

impl From<Group> for QueryElement {
    fn from(group: Group) -> Self {
        QueryElement::Group(group)
    }
}

impl From<SearchQuery> for QueryElement {
    fn from(query: SearchQuery) -> Self {
        QueryElement::Query(query)
    }
}

/// An element seen through the negations of the wrappers around it
#[derive(Clone, Copy)]
struct View<'a> {
    element: &'a QueryElement,
    flipped: bool,
}

impl<'a> View<'a> {
    fn of(element: &'a QueryElement) -> Self {
        Self {
            element,
            flipped: false,
        }
    }
}

/// Strip singleton wrappers. Returns `None` when the depth guard trips.
fn unwrap_singletons(mut view: View<'_>, mut depth: usize) -> Option<(View<'_>, usize)> {
    loop {
        if depth > MAX_ELEMENT_DEPTH {
            return None;
        }
        match view.element {
            QueryElement::Group(group) if group.elements.len() == 1 => {
                view = View {
                    element: &group.elements[0],
                    flipped: view.flipped ^ group.negated,
                };
            }
            QueryElement::Query(query) if query.elements.len() == 1 && query.filters.is_empty() => {
                view = View {
                    element: &query.elements[0],
                    flipped: view.flipped,
                };
            }
            _ => return Some((view, depth)),
        }
        depth += 1;
    }
}

/// Shape a non-pair view compares as: relation, effective negation, children
fn as_junction<'a>(view: &View<'a>) -> Option<(LogicalRelation, bool, &'a [QueryElement])> {
    match view.element {
        QueryElement::Group(group) => {
            Some((group.relation, group.negated ^ view.flipped, &group.elements))
        }
        QueryElement::Query(query) if query.filters.is_empty() => {
            Some((LogicalRelation::And, view.flipped, &query.elements))
        }
        _ => None,
    }
}

fn same(a: View<'_>, b: View<'_>, depth: usize) -> Option<bool> {
    let (a, depth_a) = unwrap_singletons(a, depth)?;
    let (b, depth_b) = unwrap_singletons(b, depth)?;
    let depth = depth_a.max(depth_b) + 1;

    match (a.element, b.element) {
        (QueryElement::Pair(pa), QueryElement::Pair(pb)) => Some(
            pa.field == pb.field
                && pa.key == pb.key
                && pa.operator == pb.operator
                && pa.value == pb.value
                && (pa.negated ^ a.flipped) == (pb.negated ^ b.flipped),
        ),
        (QueryElement::Query(qa), QueryElement::Query(qb))
            if !qa.filters.is_empty() || !qb.filters.is_empty() =>
        {
            if a.flipped != b.flipped {
                return Some(false);
            }
            Some(
                same_children(&qa.elements, &qb.elements, depth)?
                    && same_children(&qa.filters, &qb.filters, depth)?,
            )
        }
        _ => match (as_junction(&a), as_junction(&b)) {
            (Some((rel_a, neg_a, children_a)), Some((rel_b, neg_b, children_b))) => {
                if rel_a != rel_b || neg_a != neg_b {
                    return Some(false);
                }
                same_children(children_a, children_b, depth)
            }
            _ => Some(false),
        },
    }
}

fn same_children(a: &[QueryElement], b: &[QueryElement], depth: usize) -> Option<bool> {
    if a.len() != b.len() {
        return Some(false);
    }
    for (x, y) in a.iter().zip(b) {
        if !same(View::of(x), View::of(y), depth)? {
            return Some(false);
        }
    }
    Some(true)
}
