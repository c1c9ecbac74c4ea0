use crate::model::{FileKind, Id, RowVersion, Versioned};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentType {
    pub id: Id,
    pub code: String,
    pub description: String,
    /// Matching document type id in the storage service
    pub mayan_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: Id,
    /// Document id in the storage service
    pub mayan_document_id: i64,
    pub document_type_id: Id,
    pub status_code: String,
    pub file_name: String,
    /// SHA-256 of the uploaded bytes, hex encoded
    pub checksum: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub row_version: RowVersion,
}

impl Versioned for Document {
    fn row_version(&self) -> RowVersion {
        self.row_version
    }

    fn set_row_version(&mut self, version: RowVersion) {
        self.row_version = version;
    }
}

/// Link between a document and the file it belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRelationship {
    pub id: Id,
    pub parent_kind: FileKind,
    pub parent_id: Id,
    pub document: Document,
}
