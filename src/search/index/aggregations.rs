//! Aggregation results into facets

use super::dsl::{Aggregation, AggregationSpec, RawAggregation};
use crate::search::result::{FacetResult, FacetValue};
use serde_json::Value;

/// Facets in request order. Aggregations the engine did not return are left out.
pub fn to_facets(specs: &[AggregationSpec], raw: &[(String, RawAggregation)]) -> Vec<FacetResult> {
    let mut facets = Vec::with_capacity(specs.len());
    for spec in specs {
        let Some((_, aggregation)) = raw.iter().find(|(name, _)| *name == spec.name) else {
            tracing::debug!(facet = %spec.name, "Aggregation missing from engine response");
            continue;
        };
        let values = match aggregation {
            RawAggregation::Buckets(buckets) => buckets
                .iter()
                .map(|(value, count)| FacetValue::new(value.clone(), *count))
                .collect(),
            RawAggregation::Stats { count, min, max } => vec![FacetValue {
                value: spec.index_field().to_string(),
                count: *count,
                min: *min,
                max: *max,
            }],
            RawAggregation::Count(count) => vec![FacetValue::new(spec.name.clone(), *count)],
        };
        facets.push(FacetResult {
            name: spec.name.clone(),
            index: spec.index_field().to_string(),
            values,
        });
    }
    facets
}

/// Read the `aggregations` object of an Elasticsearch response
pub fn from_elastic(specs: &[AggregationSpec], aggregations: &Value) -> Vec<(String, RawAggregation)> {
    specs
        .iter()
        .filter_map(|spec| {
            let body = aggregations.get(&spec.name)?;
            let raw = match spec.aggregation {
                Aggregation::Terms { .. } => RawAggregation::Buckets(
                    body.get("buckets")?
                        .as_array()?
                        .iter()
                        .filter_map(|bucket| {
                            let key = match bucket.get("key_as_string").or_else(|| bucket.get("key"))? {
                                Value::String(s) => s.clone(),
                                other => other.to_string(),
                            };
                            Some((key, bucket.get("doc_count")?.as_u64()?))
                        })
                        .collect(),
                ),
                Aggregation::Stats { .. } => RawAggregation::Stats {
                    count: body.get("count").and_then(Value::as_u64).unwrap_or(0),
                    min: body.get("min").and_then(Value::as_f64),
                    max: body.get("max").and_then(Value::as_f64),
                },
                Aggregation::Filter(_) => RawAggregation::Count(body.get("doc_count")?.as_u64()?),
            };
            Some((spec.name.clone(), raw))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::index::dsl::IndexQuery;
    use serde_json::json;

    fn specs() -> Vec<AggregationSpec> {
        vec![
            AggregationSpec::new(
                "filetype",
                Aggregation::Terms {
                    field: "filetype".to_string(),
                    size: 100,
                },
            ),
            AggregationSpec::new(
                "filesize",
                Aggregation::Stats {
                    field: "filesize".to_string(),
                },
            ),
            AggregationSpec::new("all", Aggregation::Filter(IndexQuery::MatchAll)),
        ]
    }

    #[test]
    fn test_from_elastic() {
        let raw = from_elastic(
            &specs(),
            &json!({
                "filetype": { "buckets": [
                    { "key": "image", "doc_count": 4 },
                    { "key": "video", "doc_count": 1 }
                ]},
                "filesize": { "count": 5, "min": 10.0, "max": 900.0, "avg": 300.0, "sum": 1500.0 },
                "all": { "doc_count": 5 }
            }),
        );
        let facets = to_facets(&specs(), &raw);
        assert_eq!(facets.len(), 3);
        assert_eq!(facets[0].values[0], FacetValue::new("image", 4));
        assert_eq!(facets[1].values[0].max, Some(900.0));
        assert_eq!(facets[2].first_count(), Some(5));
    }

    #[test]
    fn test_missing_aggregations_are_skipped() {
        let raw = vec![("all".to_string(), RawAggregation::Count(3))];
        let facets = to_facets(&specs(), &raw);
        assert_eq!(facets.len(), 1);
        assert_eq!(facets[0].name, "all");
        assert_eq!(facets[0].index, "all");
    }
}
