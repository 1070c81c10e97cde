//! Object kinds and their search shape

use crate::query::SearchField;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Overall count of the result set
pub const COUNT_ALL: &str = "all";
/// Items among the results
pub const COUNT_ALL_ITEMS: &str = "count_all_items";
/// Sub-containers among the results
pub const COUNT_ALL_SUBCONTAINERS: &str = "count_all_collection_subcollections";
/// Results whose direct parent is the scope container
pub const COUNT_CONTAINER_ITEMS: &str = "count_all_collection_items";
/// Items whose direct parent is the scope container
pub const COUNT_CONTAINER_ROOT_ITEMS: &str = "count_all_collection_root_items";

/// Kinds of searchable records
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
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ObjectKind {
    #[default]
    Item,
    Collection,
    User,
    UserGroup,
    Content,
    Statement,
}

/// Backend family preferred for a kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Index,
    Triple,
}

/// How read access is decided for a kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Released records for everyone, the rest through container grants
    Status,
    /// Any logged-in actor
    Authenticated,
    Public,
}

/// Aggregation type of a facet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetKind {
    /// Value buckets with counts
    Terms,
    /// Count, min and max of a numeric field
    Stats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacetDefinition {
    pub name: &'static str,
    pub field: SearchField,
    pub kind: FacetKind,
}

/// Fixed count aggregations attached to every faceted search of a kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountFacet {
    /// Every result
    All,
    /// Results without a parent container
    RootContainers,
    Items,
    Subcontainers,
}

impl CountFacet {
    pub fn name(&self) -> &'static str {
        match self {
            CountFacet::All | CountFacet::RootContainers => COUNT_ALL,
            CountFacet::Items => COUNT_ALL_ITEMS,
            CountFacet::Subcontainers => COUNT_ALL_SUBCONTAINERS,
        }
    }
}

/// Everything the search backends need to know about a kind
#[derive(Debug, Clone, Copy)]
pub struct KindShape {
    /// Index holding the kind
    pub index: &'static str,
    /// Value of the kind discriminator within that index
    pub join_value: &'static str,
    /// RDF class of the kind in the triple store
    pub rdf_type: &'static str,
    pub facets: &'static [FacetDefinition],
    pub counts: &'static [CountFacet],
    pub backend: Backend,
    pub visibility: Visibility,
    /// Fields a query on this kind may use
    pub fields: &'static [SearchField],
}

const ITEM_FACETS: &[FacetDefinition] = &[
    FacetDefinition {
        name: "filetype",
        field: SearchField::Filetype,
        kind: FacetKind::Terms,
    },
    FacetDefinition {
        name: "license",
        field: SearchField::License,
        kind: FacetKind::Terms,
    },
    FacetDefinition {
        name: "collection",
        field: SearchField::Collection,
        kind: FacetKind::Terms,
    },
    FacetDefinition {
        name: "status",
        field: SearchField::Status,
        kind: FacetKind::Terms,
    },
    FacetDefinition {
        name: "filesize",
        field: SearchField::Filesize,
        kind: FacetKind::Stats,
    },
];

const COLLECTION_FACETS: &[FacetDefinition] = &[FacetDefinition {
    name: "status",
    field: SearchField::Status,
    kind: FacetKind::Terms,
}];

const ITEM_FIELDS: &[SearchField] = &[
    SearchField::All,
    SearchField::Fulltext,
    SearchField::Title,
    SearchField::Description,
    SearchField::Author,
    SearchField::Organization,
    SearchField::Status,
    SearchField::Collection,
    SearchField::Creator,
    SearchField::Created,
    SearchField::Modified,
    SearchField::Filename,
    SearchField::Filetype,
    SearchField::Filesize,
    SearchField::License,
    SearchField::Checksum,
    SearchField::Id,
    SearchField::Col,
    SearchField::Metadata,
    SearchField::Technical,
];

const COLLECTION_FIELDS: &[SearchField] = &[
    SearchField::All,
    SearchField::Title,
    SearchField::Description,
    SearchField::Author,
    SearchField::Organization,
    SearchField::Status,
    SearchField::Collection,
    SearchField::Creator,
    SearchField::Created,
    SearchField::Modified,
    SearchField::Id,
    SearchField::Col,
    SearchField::CollectionMetadata,
];

const USER_FIELDS: &[SearchField] = &[
    SearchField::All,
    SearchField::Email,
    SearchField::Name,
    SearchField::Organization,
    SearchField::Created,
    SearchField::Modified,
    SearchField::Id,
];

const USER_GROUP_FIELDS: &[SearchField] = &[
    SearchField::All,
    SearchField::Name,
    SearchField::Created,
    SearchField::Modified,
    SearchField::Id,
];

const CONTENT_FIELDS: &[SearchField] = &[
    SearchField::All,
    SearchField::Fulltext,
    SearchField::Checksum,
    SearchField::Filetype,
    SearchField::Filesize,
    SearchField::Created,
    SearchField::Modified,
    SearchField::Id,
];

const STATEMENT_FIELDS: &[SearchField] = &[
    SearchField::All,
    SearchField::Name,
    SearchField::Created,
    SearchField::Modified,
    SearchField::Id,
];

/// Namespace of the catalog vocabulary
pub const RDF_TERMS: &str = "http://imeji.org/terms/";

impl ObjectKind {
    /// Search shape of the kind. Adding a kind means adding one arm here.
    pub fn shape(&self) -> KindShape {
        match self {
            ObjectKind::Item => KindShape {
                index: "data",
                join_value: "item",
                rdf_type: "http://imeji.org/terms/item",
                facets: ITEM_FACETS,
                counts: &[CountFacet::All, CountFacet::Items, CountFacet::Subcontainers],
                backend: Backend::Index,
                visibility: Visibility::Status,
                fields: ITEM_FIELDS,
            },
            ObjectKind::Collection => KindShape {
                index: "data",
                join_value: "folder",
                rdf_type: "http://imeji.org/terms/collection",
                facets: COLLECTION_FACETS,
                counts: &[CountFacet::RootContainers, CountFacet::Subcontainers],
                backend: Backend::Index,
                visibility: Visibility::Status,
                fields: COLLECTION_FIELDS,
            },
            ObjectKind::User => KindShape {
                index: "users",
                join_value: "user",
                rdf_type: "http://imeji.org/terms/user",
                facets: &[],
                counts: &[CountFacet::All],
                backend: Backend::Triple,
                visibility: Visibility::Authenticated,
                fields: USER_FIELDS,
            },
            ObjectKind::UserGroup => KindShape {
                index: "usergroups",
                join_value: "usergroup",
                rdf_type: "http://imeji.org/terms/userGroup",
                facets: &[],
                counts: &[CountFacet::All],
                backend: Backend::Triple,
                visibility: Visibility::Authenticated,
                fields: USER_GROUP_FIELDS,
            },
            ObjectKind::Content => KindShape {
                index: "content",
                join_value: "content",
                rdf_type: "http://imeji.org/terms/content",
                facets: &[],
                counts: &[CountFacet::All],
                backend: Backend::Index,
                visibility: Visibility::Authenticated,
                fields: CONTENT_FIELDS,
            },
            ObjectKind::Statement => KindShape {
                index: "statements",
                join_value: "statement",
                rdf_type: "http://imeji.org/terms/statement",
                facets: &[],
                counts: &[CountFacet::All],
                backend: Backend::Triple,
                visibility: Visibility::Public,
                fields: STATEMENT_FIELDS,
            },
        }
    }

    /// Kind whose join value is `value`
    pub fn from_join_value(value: &str) -> Option<ObjectKind> {
        use strum::IntoEnumIterator;
        ObjectKind::iter().find(|kind| kind.shape().join_value == value)
    }

    pub fn supports(&self, field: SearchField) -> bool {
        self.shape().fields.contains(&field)
    }
}
