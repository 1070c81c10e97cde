//! Sort criteria

use super::field::SearchField;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::{Display, EnumString};

/// Sort direction
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    #[strum(to_string = "asc", serialize = "ascending")]
    Ascending,
    #[strum(to_string = "desc", serialize = "descending")]
    Descending,
}

/// One sort key applied after the object-kind primary key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortCriterion {
    pub field: SearchField,
    pub order: SortOrder,
}

impl SortCriterion {
    pub fn new(field: SearchField, order: SortOrder) -> Self {
        Self { field, order }
    }

    pub fn ascending(field: SearchField) -> Self {
        Self::new(field, SortOrder::Ascending)
    }

    pub fn descending(field: SearchField) -> Self {
        Self::new(field, SortOrder::Descending)
    }
}

/// Creation date, oldest first
impl Default for SortCriterion {
    fn default() -> Self {
        Self::ascending(SearchField::Created)
    }
}

impl fmt::Display for SortCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.order)
    }
}

/// Parses `field` or `field:asc|desc`
impl FromStr for SortCriterion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, order) = match s.split_once(':') {
            Some((field, order)) => (field, Some(order)),
            None => (s, None),
        };
        let field = SearchField::from_str(field.trim())
            .map_err(|_| format!("unknown sort field '{}'", field.trim()))?;
        let order = match order {
            Some(order) => SortOrder::from_str(&order.trim().to_lowercase())
                .map_err(|_| format!("unknown sort order '{}'", order.trim()))?,
            None => SortOrder::Ascending,
        };
        Ok(Self { field, order })
    }
}
