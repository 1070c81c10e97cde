//! Catalog records as embedded index documents

use super::dsl::{ANCESTORS_FIELD, ID_FIELD, KIND_FIELD, PARENT_FIELD, PRESENT_FIELD};
use crate::models::{CatalogRecord, ObjectKind};
use crate::search::values::{normalize_status, NO_LICENSE};
use tantivy::schema::*;
use tantivy::TantivyDocument;

/// Text fields, analyzed and stored
pub const TEXT_FIELDS: &[&str] = &[
    "title",
    "description",
    "author",
    "organization",
    "filename",
    "name",
];

/// Keyword fields, indexed verbatim and stored
pub const KEYWORD_FIELDS: &[&str] = &[
    ID_FIELD,
    KIND_FIELD,
    "status",
    "collection",
    PARENT_FIELD,
    ANCESTORS_FIELD,
    "creator",
    "filetype",
    "license",
    "checksum",
    "email",
];

/// Integer fields, dates as epoch milliseconds
pub const NUMERIC_FIELDS: &[&str] = &["created", "modified", "filesize"];

/// Extracted file content, searchable only
pub const FULLTEXT_FIELD: &str = "fulltext";

/// Trait for documents that can be indexed and searched
pub trait SearchDocument {
    /// Convert to Tantivy document
    fn to_tantivy_doc(&self, schema: &Schema) -> TantivyDocument;

    /// Get document ID
    fn document_id(&self) -> String;
}

impl SearchDocument for CatalogRecord {
    fn to_tantivy_doc(&self, schema: &Schema) -> TantivyDocument {
        let mut doc = TantivyDocument::new();
        let mut present: Vec<&str> = Vec::new();

        let mut text = |doc: &mut TantivyDocument, name: &'static str, value: &str| {
            if value.trim().is_empty() {
                return;
            }
            if let Ok(field) = schema.get_field(name) {
                doc.add_text(field, value);
                if !present.contains(&name) {
                    present.push(name);
                }
            }
        };

        text(&mut doc, ID_FIELD, &self.id);
        text(&mut doc, KIND_FIELD, self.kind.shape().join_value);
        text(&mut doc, "title", &self.title);
        text(&mut doc, "description", &self.description);
        for author in &self.authors {
            text(&mut doc, "author", author);
        }
        for organization in &self.organizations {
            text(&mut doc, "organization", organization);
        }

        // Unknown statuses are kept upper-cased so they never match a normalized value
        if let Some(ref status) = self.status {
            let status = normalize_status(status)
                .map(str::to_string)
                .unwrap_or_else(|_| status.trim().to_uppercase());
            text(&mut doc, "status", &status);
        }

        if let Some(ref collection) = self.collection {
            text(&mut doc, "collection", collection);
        }
        if let Some(ref parent) = self.parent {
            text(&mut doc, PARENT_FIELD, parent);
        }
        for container in self.containers() {
            text(&mut doc, ANCESTORS_FIELD, container);
        }
        if let Some(ref creator) = self.creator {
            text(&mut doc, "creator", creator);
        }
        if let Some(ref filename) = self.filename {
            text(&mut doc, "filename", filename);
        }
        if let Some(ref filetype) = self.filetype {
            text(&mut doc, "filetype", filetype);
        }
        match self.license {
            Some(ref license) => text(&mut doc, "license", license),
            None if self.kind == ObjectKind::Item => text(&mut doc, "license", NO_LICENSE),
            None => {}
        }
        if let Some(ref checksum) = self.checksum {
            text(&mut doc, "checksum", checksum);
        }
        if let Some(ref email) = self.email {
            text(&mut doc, "email", email);
        }
        if let Some(ref name) = self.name {
            text(&mut doc, "name", name);
        }
        if let Some(ref fulltext) = self.fulltext {
            text(&mut doc, FULLTEXT_FIELD, fulltext);
        }

        let numbers = [
            ("created", self.created.map(|d| d.timestamp_millis())),
            ("modified", self.modified.map(|d| d.timestamp_millis())),
            ("filesize", self.filesize),
        ];
        for (name, value) in numbers {
            if let (Some(value), Ok(field)) = (value, schema.get_field(name)) {
                doc.add_i64(field, value);
                present.push(name);
            }
        }

        if let Ok(field) = schema.get_field(PRESENT_FIELD) {
            for name in present {
                doc.add_text(field, name);
            }
        }

        doc
    }

    fn document_id(&self) -> String {
        self.id.clone()
    }
}

/// Build the search schema for catalog records
pub fn build_catalog_schema() -> Schema {
    let mut schema_builder = Schema::builder();

    for name in KEYWORD_FIELDS {
        schema_builder.add_text_field(name, STRING | STORED);
    }

    for name in TEXT_FIELDS {
        schema_builder.add_text_field(name, TEXT | STORED);
    }

    for name in NUMERIC_FIELDS {
        schema_builder.add_i64_field(name, INDEXED | STORED | FAST);
    }

    schema_builder.add_text_field(FULLTEXT_FIELD, TEXT);

    // Backs exists queries
    schema_builder.add_text_field(PRESENT_FIELD, STRING);

    schema_builder.build()
}
