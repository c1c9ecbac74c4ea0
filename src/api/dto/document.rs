use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Document, DocumentRelationship, DocumentType, FileKind, Id, RowVersion};
use crate::service::{DocumentUpdateResponse, DocumentUploadResponse, MetadataValue};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTypeDto {
    pub id: Id,
    pub document_type: String,
    pub document_type_description: String,
    pub mayan_id: i64,
}

impl From<DocumentType> for DocumentTypeDto {
    fn from(document_type: DocumentType) -> Self {
        Self {
            id: document_type.id,
            document_type: document_type.code,
            document_type_description: document_type.description,
            mayan_id: document_type.mayan_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDto {
    pub id: Id,
    pub mayan_document_id: i64,
    pub document_type_id: Id,
    pub status_code: String,
    pub file_name: String,
    pub checksum: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub row_version: RowVersion,
}

impl From<Document> for DocumentDto {
    fn from(document: Document) -> Self {
        Self {
            id: document.id,
            mayan_document_id: document.mayan_document_id,
            document_type_id: document.document_type_id,
            status_code: document.status_code,
            file_name: document.file_name,
            checksum: document.checksum,
            created_by: document.created_by,
            created_at: document.created_at,
            row_version: document.row_version,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRelationshipDto {
    pub id: Id,
    pub relationship_type: FileKind,
    pub parent_id: Id,
    pub document: DocumentDto,
}

impl From<DocumentRelationship> for DocumentRelationshipDto {
    fn from(relationship: DocumentRelationship) -> Self {
        Self {
            id: relationship.id,
            relationship_type: relationship.parent_kind,
            parent_id: relationship.parent_id,
            document: relationship.document.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentUploadResponseDto {
    pub document_relationship: DocumentRelationshipDto,
    pub document_metadata_errors: Vec<String>,
}

impl From<DocumentUploadResponse> for DocumentUploadResponseDto {
    fn from(response: DocumentUploadResponse) -> Self {
        Self {
            document_relationship: response.relationship.into(),
            document_metadata_errors: response.metadata_errors,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataValueDto {
    pub metadata_type_id: i64,
    pub value: String,
}

impl From<MetadataValueDto> for MetadataValue {
    fn from(dto: MetadataValueDto) -> Self {
        Self {
            metadata_type_id: dto.metadata_type_id,
            value: dto.value,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentUpdateDto {
    pub row_version: Option<RowVersion>,
    pub document_status_code: String,
    #[serde(default)]
    pub document_metadata: Vec<MetadataValueDto>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentUpdateResponseDto {
    pub document: DocumentDto,
    pub document_metadata_errors: Vec<String>,
}

impl From<DocumentUpdateResponse> for DocumentUpdateResponseDto {
    fn from(response: DocumentUpdateResponse) -> Self {
        Self {
            document: response.document.into(),
            document_metadata_errors: response.metadata_errors,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedDto {
    pub deleted: bool,
}
