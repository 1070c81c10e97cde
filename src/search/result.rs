//! Uniform result envelope

use crate::models::{
    COUNT_ALL, COUNT_ALL_ITEMS, COUNT_ALL_SUBCONTAINERS, COUNT_CONTAINER_ITEMS,
};
use crate::query::{SortCriterion, SortOrder};
use serde::{Deserialize, Serialize};

/// One bucket of a facet. `min` and `max` are only set for stats facets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetValue {
    pub value: String,
    pub count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl FacetValue {
    pub fn new(value: impl Into<String>, count: u64) -> Self {
        Self {
            value: value.into(),
            count,
            min: None,
            max: None,
        }
    }
}

/// Named aggregation over the current result set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetResult {
    pub name: String,
    /// Index field the facet aggregates
    pub index: String,
    pub values: Vec<FacetValue>,
}

impl FacetResult {
    /// Count of the first bucket, the shape count facets have
    pub fn first_count(&self) -> Option<u64> {
        self.values.first().map(|v| v.count)
    }
}

/// Scoping sub-counts. Each falls back to the hit total when not computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScopeCounts {
    /// Every visible record matching the query
    pub overall: u64,
    /// Records of the primary kind
    pub kind_restricted: u64,
    /// Records directly inside the scope container
    pub container_restricted: u64,
    /// Sub-containers among the results
    pub sub_containers: u64,
}

impl ScopeCounts {
    pub fn uniform(total: u64) -> Self {
        Self {
            overall: total,
            kind_restricted: total,
            container_restricted: total,
            sub_containers: total,
        }
    }
}

/// Result of one search call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    /// Record ids of the requested window, in result order
    pub ids: Vec<String>,
    /// Number of matching records
    pub total: u64,
    pub counts: ScopeCounts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facets: Option<Vec<FacetResult>>,
    /// Sort applied after the kind key
    #[serde(default)]
    pub sort: Vec<SortCriterion>,
    /// Printed form of the query that produced the result
    #[serde(default)]
    pub query: String,
}

impl ResultEnvelope {
    pub fn new(ids: Vec<String>, total: u64) -> Self {
        Self {
            ids,
            total,
            counts: ScopeCounts::uniform(total),
            facets: None,
            sort: Vec::new(),
            query: String::new(),
        }
    }

    /// Envelope for ids that were not sorted by a backend. The ids are stable-sorted in
    /// memory following the order of the first criterion.
    pub fn from_unsorted(mut ids: Vec<String>, sort: &[SortCriterion]) -> Self {
        match sort.first().map(|s| s.order) {
            Some(SortOrder::Descending) => ids.sort_by(|a, b| b.cmp(a)),
            _ => ids.sort(),
        }
        let total = ids.len() as u64;
        Self::new(ids, total).with_sort(sort.to_vec())
    }

    /// Attach facets and read the well-known counts out of them
    pub fn with_facets(mut self, facets: Vec<FacetResult>) -> Self {
        let count = |name: &str| {
            facets
                .iter()
                .find(|f| f.name == name)
                .and_then(FacetResult::first_count)
        };
        self.counts = ScopeCounts {
            overall: count(COUNT_ALL).unwrap_or(self.total),
            kind_restricted: count(COUNT_ALL_ITEMS).unwrap_or(self.total),
            container_restricted: count(COUNT_CONTAINER_ITEMS).unwrap_or(self.total),
            sub_containers: count(COUNT_ALL_SUBCONTAINERS).unwrap_or(self.total),
        };
        self.facets = Some(facets);
        self
    }

    pub fn with_sort(mut self, sort: Vec<SortCriterion>) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn facet(&self, name: &str) -> Option<&FacetResult> {
        self.facets.as_ref()?.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::SearchField;

    fn count_facet(name: &str, count: u64) -> FacetResult {
        FacetResult {
            name: name.to_string(),
            index: name.to_string(),
            values: vec![FacetValue::new(name, count)],
        }
    }

    #[test]
    fn test_counts_degrade_to_total() {
        let envelope = ResultEnvelope::new(vec!["a".into(), "b".into()], 7);
        assert_eq!(envelope.counts, ScopeCounts::uniform(7));
        assert!(envelope.facets.is_none());
    }

    #[test]
    fn test_counts_read_from_facets() {
        let envelope = ResultEnvelope::new(vec![], 10).with_facets(vec![
            count_facet(COUNT_ALL, 12),
            count_facet(COUNT_CONTAINER_ITEMS, 4),
        ]);
        assert_eq!(envelope.counts.overall, 12);
        assert_eq!(envelope.counts.container_restricted, 4);
        assert_eq!(envelope.counts.kind_restricted, 10);
        assert_eq!(envelope.counts.sub_containers, 10);
        assert!(envelope.facet(COUNT_ALL).is_some());
    }

    #[test]
    fn test_from_unsorted_is_sorted() {
        let ids = vec!["c".to_string(), "a".to_string(), "b".to_string()];
        let asc = ResultEnvelope::from_unsorted(ids.clone(), &[]);
        assert_eq!(asc.ids, vec!["a", "b", "c"]);
        let desc =
            ResultEnvelope::from_unsorted(ids, &[SortCriterion::descending(SearchField::Id)]);
        assert_eq!(desc.ids, vec!["c", "b", "a"]);
        assert_eq!(desc.total, 3);
    }
}
