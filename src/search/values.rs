//! Interpretation of pair values shared by the query compilers

use super::error::{SearchError, SearchResult};
use crate::query::{Operator, Pair, SearchField, ValueType};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use std::ops::Bound;

pub const STATUS_PENDING: &str = "PENDING";
pub const STATUS_RELEASED: &str = "RELEASED";
pub const STATUS_WITHDRAWN: &str = "WITHDRAWN";

/// `license=*` matches any real license
pub const ANY_LICENSE: &str = "*";
/// License value of records without a license
pub const NO_LICENSE: &str = "no_license";

const ALTERNATIVE_SEPARATOR: &str = " OR ";

/// Canonical status for user input: IRI fragments and `#` prefixes are stripped and
/// the legacy names `private`, `public` and `discarded` are mapped.
pub fn normalize_status(value: &str) -> SearchResult<&'static str> {
    let trimmed = value.trim();
    let name = trimmed.rsplit('#').next().unwrap_or(trimmed);
    match name.to_ascii_lowercase().as_str() {
        "private" | "pending" => Ok(STATUS_PENDING),
        "public" | "released" => Ok(STATUS_RELEASED),
        "discarded" | "withdrawn" => Ok(STATUS_WITHDRAWN),
        _ => Err(SearchError::InvalidValue {
            field: SearchField::Status,
            value: value.to_string(),
            reason: "unknown status".to_string(),
        }),
    }
}

/// Alternatives of a ` OR ` separated keyword list
pub fn split_alternatives(value: &str) -> Vec<String> {
    value
        .split(ALTERNATIVE_SEPARATOR)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// Integer bounds of a range condition. Dates are epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub lower: Bound<i64>,
    pub upper: Bound<i64>,
}

impl Bounds {
    fn unbounded() -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
        }
    }
}

/// Half-open interval a single value stands for: a whole day for `2020-05-01`, a whole
/// year for `2020`, one unit for a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start: i64,
    end: i64,
}

/// Bounds of a pair on a date or number field.
///
/// `=` covers the span of the value; `>` starts after it and `>=` at its start; `<`
/// ends before it and `<=` at its end. With `=`, the value may also be a
/// `from X to Y` range where either side can be left out.
pub fn range_bounds(pair: &Pair) -> SearchResult<Bounds> {
    let value_type = pair.value_type();
    if !matches!(value_type, ValueType::Date | ValueType::Number) {
        return Err(SearchError::UnsupportedOperator {
            field: pair.field,
            operator: pair.operator,
        });
    }

    if let Some((from, to)) = split_range(&pair.value) {
        if pair.operator != Operator::Equals {
            return Err(invalid(pair, "a from/to range requires '='"));
        }
        if from.is_none() && to.is_none() {
            return Err(invalid(pair, "empty range"));
        }
        let mut bounds = Bounds::unbounded();
        if let Some(from) = from {
            bounds.lower = Bound::Included(span(pair, value_type, from)?.start);
        }
        if let Some(to) = to {
            bounds.upper = Bound::Excluded(span(pair, value_type, to)?.end);
        }
        return Ok(bounds);
    }

    let span = span(pair, value_type, pair.value.trim())?;
    let mut bounds = Bounds::unbounded();
    match pair.operator {
        Operator::Equals => {
            bounds.lower = Bound::Included(span.start);
            bounds.upper = Bound::Excluded(span.end);
        }
        Operator::Greater => bounds.lower = Bound::Included(span.end),
        Operator::GreaterEquals => bounds.lower = Bound::Included(span.start),
        Operator::Lesser => bounds.upper = Bound::Excluded(span.start),
        Operator::LesserEquals => bounds.upper = Bound::Excluded(span.end),
    }
    Ok(bounds)
}

/// Identifier of a container given by id or by IRI: the last path segment of an IRI
pub fn container_id(value: &str) -> &str {
    let value = value.trim();
    if value.starts_with("http://") || value.starts_with("https://") {
        value
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(value)
    } else {
        value
    }
}

/// Epoch milliseconds as an `xsd:dateTime` lexical form
pub fn format_millis(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| millis.to_string())
}

fn invalid(pair: &Pair, reason: &str) -> SearchError {
    SearchError::InvalidValue {
        field: pair.field,
        value: pair.value.clone(),
        reason: reason.to_string(),
    }
}

/// `from X to Y`, `from X`, `to Y` or `X to Y`
fn split_range(value: &str) -> Option<(Option<&str>, Option<&str>)> {
    let value = value.trim();
    if let Some(rest) = value.strip_prefix("from ") {
        return Some(match split_to(rest) {
            Some((from, to)) => (non_empty(from), non_empty(to)),
            None => (non_empty(rest), None),
        });
    }
    if let Some(rest) = value.strip_prefix("to ") {
        return Some((None, non_empty(rest)));
    }
    if value == "to" {
        return Some((None, None));
    }
    split_to(value).map(|(from, to)| (non_empty(from), non_empty(to)))
}

fn split_to(s: &str) -> Option<(&str, &str)> {
    match s.find(" to ") {
        Some(idx) => Some((&s[..idx], &s[idx + 4..])),
        None => s.strip_suffix(" to").map(|head| (head, "")),
    }
}

fn non_empty(s: &str) -> Option<&str> {
    let s = s.trim();
    (!s.is_empty()).then_some(s)
}

fn span(pair: &Pair, value_type: ValueType, text: &str) -> SearchResult<Span> {
    match value_type {
        ValueType::Number => text
            .parse::<i64>()
            .map(|n| Span {
                start: n,
                end: n.saturating_add(1),
            })
            .map_err(|_| invalid(pair, "not an integer")),
        _ => date_span(text).ok_or_else(|| invalid(pair, "not a date")),
    }
}

fn date_span(text: &str) -> Option<Span> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        let start = instant.timestamp_millis();
        return Some(Span {
            start,
            end: start + 1,
        });
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        let start = naive.and_utc().timestamp_millis();
        return Some(Span {
            start,
            end: start + 1_000,
        });
    }
    if let Ok(day) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(Span {
            start: day_millis(day)?,
            end: day_millis(day.succ_opt()?)?,
        });
    }

    let parts: Vec<&str> = text.split('-').collect();
    match parts.as_slice() {
        [year, month] if year.len() == 4 => {
            let year: i32 = year.parse().ok()?;
            let month: u32 = month.parse().ok()?;
            let first = NaiveDate::from_ymd_opt(year, month, 1)?;
            let next = if month == 12 {
                NaiveDate::from_ymd_opt(year + 1, 1, 1)?
            } else {
                NaiveDate::from_ymd_opt(year, month + 1, 1)?
            };
            Some(Span {
                start: day_millis(first)?,
                end: day_millis(next)?,
            })
        }
        [year] if year.len() == 4 => {
            let year: i32 = year.parse().ok()?;
            Some(Span {
                start: day_millis(NaiveDate::from_ymd_opt(year, 1, 1)?)?,
                end: day_millis(NaiveDate::from_ymd_opt(year + 1, 1, 1)?)?,
            })
        }
        _ => None,
    }
}

fn day_millis(day: NaiveDate) -> Option<i64> {
    Some(day.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis())
}
