//! Searchable fields and comparison operators

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Enumerated domain of searchable fields.
///
/// The string form is the index name used by the textual query language
/// (`title=...`, `created>=...`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SearchField {
    /// Free text over every textual field
    All,
    /// Extracted file content
    Fulltext,
    Title,
    Description,
    Author,
    Organization,
    Status,
    Collection,
    Creator,
    Created,
    Modified,
    Filename,
    Filetype,
    Filesize,
    License,
    Checksum,
    Id,
    Email,
    Name,
    /// Container referenced by IRI, as written by saved queries
    Col,
    /// Item metadata of one statement: `md.<statement>[.<subfield>]`
    #[serde(rename = "md")]
    #[strum(serialize = "md")]
    Metadata,
    /// Collection metadata of one label: `collection.md.<label>`
    #[serde(rename = "collection_md")]
    #[strum(serialize = "collection.md")]
    CollectionMetadata,
    /// Technical metadata of the file content: `technical[<label>]`
    Technical,
}

/// Value a metadata pair is matched against
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MetadataField {
    Text,
    /// Whole text, unanalyzed
    Exact,
    Number,
    Date,
    Time,
    Placename,
    Title,
    Url,
    Familyname,
    Givenname,
    Coordinates,
}

/// How a field's values are interpreted by the compilers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// Analyzed text, matched token-wise
    Text,
    /// Exact keyword
    Keyword,
    /// Keyword that accepts ` OR ` separated alternatives
    KeywordList,
    /// Lifecycle status with alias normalization
    Status,
    /// Reference to another record (container, creator)
    Reference,
    /// Timestamp, compared as a range
    Date,
    /// Integer, compared as a range
    Number,
}

impl SearchField {
    pub fn value_type(&self) -> ValueType {
        match self {
            SearchField::All
            | SearchField::Fulltext
            | SearchField::Title
            | SearchField::Description
            | SearchField::Author
            | SearchField::Organization
            | SearchField::Filename
            | SearchField::Name
            | SearchField::Metadata
            | SearchField::CollectionMetadata
            | SearchField::Technical => ValueType::Text,
            SearchField::Checksum | SearchField::Id | SearchField::Email => ValueType::Keyword,
            SearchField::Filetype | SearchField::License => ValueType::KeywordList,
            SearchField::Status => ValueType::Status,
            SearchField::Collection | SearchField::Col | SearchField::Creator => {
                ValueType::Reference
            }
            SearchField::Created | SearchField::Modified => ValueType::Date,
            SearchField::Filesize => ValueType::Number,
        }
    }

    /// True if pairs on the field name a statement or label
    pub fn is_keyed(&self) -> bool {
        matches!(
            self,
            SearchField::Metadata | SearchField::CollectionMetadata | SearchField::Technical
        )
    }

    /// True if the field accepts `>`, `<`, `>=`, `<=`
    pub fn is_range(&self) -> bool {
        matches!(self.value_type(), ValueType::Date | ValueType::Number)
    }
}

/// Comparison operator of a pair
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    #[default]
    #[strum(serialize = "=")]
    Equals,
    #[strum(serialize = ">")]
    Greater,
    #[strum(serialize = "<")]
    Lesser,
    #[strum(serialize = ">=")]
    GreaterEquals,
    #[strum(serialize = "<=")]
    LesserEquals,
}

impl Operator {
    /// Symbol used in the textual query language
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Equals => "=",
            Operator::Greater => ">",
            Operator::Lesser => "<",
            Operator::GreaterEquals => ">=",
            Operator::LesserEquals => "<=",
        }
    }
}

/// Boolean relation joining the children of a group
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum LogicalRelation {
    #[default]
    And,
    Or,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_field_names_round_trip() {
        for field in SearchField::iter() {
            let name = field.to_string();
            assert_eq!(SearchField::from_str(&name).unwrap(), field);
        }
        assert_eq!(SearchField::Filesize.as_ref(), "filesize");
        assert_eq!(SearchField::CollectionMetadata.to_string(), "collection.md");
        assert!(SearchField::Metadata.is_keyed());
        assert!(!SearchField::Col.is_keyed());
        assert_eq!(MetadataField::from_str("placename").unwrap(), MetadataField::Placename);
        assert!(SearchField::from_str("unknown").is_err());
    }

    #[test]
    fn test_operator_symbols() {
        for op in Operator::iter() {
            assert_eq!(Operator::from_str(op.symbol()).unwrap(), op);
        }
        assert!(Operator::from_str("=>").is_err());
    }

    #[test]
    fn test_range_fields() {
        assert!(SearchField::Created.is_range());
        assert!(SearchField::Filesize.is_range());
        assert!(!SearchField::Title.is_range());
        assert_eq!(SearchField::License.value_type(), ValueType::KeywordList);
    }
}
