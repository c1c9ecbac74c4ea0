use sha2::{Digest, Sha256};

use crate::error::{PimsError, PimsResult};
use crate::external::mayan::{
    DocumentMetadata, DocumentStorageClient, DocumentTypeMetadataType, ExternalResult, FileDownload,
    QueryResult,
};
use crate::logic::guard::require;
use crate::model::{Document, DocumentRelationship, FileKind, Id, Permission, RowVersion};
use crate::repository::{DocumentRepository, RepositoryScope};
use crate::store::Store;

/// One metadata field to set on a stored document
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataValue {
    pub metadata_type_id: i64,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct DocumentUploadRequest {
    pub file_name: String,
    pub contents: Vec<u8>,
    pub document_type_id: Id,
    /// Storage-side type id the client believes matches `document_type_id`
    pub document_type_mayan_id: Option<i64>,
    pub status_code: String,
    pub metadata: Vec<MetadataValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentUploadResponse {
    pub relationship: DocumentRelationship,
    /// Metadata the storage service refused; the upload itself succeeded
    pub metadata_errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentUpdateResponse {
    pub document: Document,
    pub metadata_errors: Vec<String>,
}

pub fn checksum(contents: &[u8]) -> String {
    hex::encode(Sha256::digest(contents))
}

pub struct DocumentService<'a, S> {
    scope: RepositoryScope<'a, S>,
    storage: &'a dyn DocumentStorageClient,
}

impl<'a, S: Store> DocumentService<'a, S> {
    pub fn new(scope: RepositoryScope<'a, S>, storage: &'a dyn DocumentStorageClient) -> Self {
        Self { scope, storage }
    }

    fn documents(&self) -> DocumentRepository<'a, S> {
        DocumentRepository::new(self.scope)
    }

    async fn ensure_parent(&self, kind: FileKind, parent_id: Id) -> PimsResult<()> {
        let exists = match kind {
            FileKind::Research => self.scope.store.get_research_file(parent_id).await?.is_some(),
            FileKind::Lease => self.scope.store.get_lease(parent_id).await?.is_some(),
        };
        if exists {
            Ok(())
        } else {
            Err(PimsError::not_found(
                match kind {
                    FileKind::Research => "research file",
                    FileKind::Lease => "lease",
                },
                parent_id,
            ))
        }
    }

    async fn push_metadata(&self, mayan_document_id: i64, metadata: &[MetadataValue]) -> Vec<String> {
        let mut errors = Vec::new();
        for field in metadata {
            if let Err(e) = self
                .storage
                .add_document_metadata(mayan_document_id, field.metadata_type_id, &field.value)
                .await
            {
                log::warn!(
                    "Failed to set metadata type {} on stored document {}: {}",
                    field.metadata_type_id,
                    mayan_document_id,
                    e
                );
                errors.push(e.body.clone().unwrap_or(e.message));
            }
        }
        errors
    }

    /// Send the file to storage first, then record the document and its link
    /// to the parent file.
    pub async fn upload(
        &self,
        kind: FileKind,
        parent_id: Id,
        request: DocumentUploadRequest,
    ) -> PimsResult<DocumentUploadResponse> {
        require(self.scope.user, Permission::DocumentAdd)?;
        if request.contents.is_empty() {
            return Err(PimsError::validation("An uploaded file is required"));
        }
        self.ensure_parent(kind, parent_id).await?;

        let document_type = self
            .scope
            .store
            .get_document_type(request.document_type_id)
            .await?
            .ok_or_else(|| PimsError::not_found("document type", request.document_type_id))?;
        if let Some(mayan_id) = request.document_type_mayan_id {
            if mayan_id != document_type.mayan_id {
                return Err(PimsError::validation(format!(
                    "Document type {} is stored as type {}, not {}",
                    document_type.code, document_type.mayan_id, mayan_id
                )));
            }
        }

        let checksum = checksum(&request.contents);
        let stored = self
            .storage
            .upload_document(document_type.mayan_id, &request.file_name, request.contents)
            .await?;
        log::info!(
            "Stored '{}' as storage document {}",
            request.file_name,
            stored.id
        );
        let metadata_errors = self.push_metadata(stored.id, &request.metadata).await;

        let document = Document {
            id: 0,
            mayan_document_id: stored.id,
            document_type_id: document_type.id,
            status_code: request.status_code,
            file_name: request.file_name,
            checksum,
            created_by: String::new(),
            created_at: chrono::Utc::now(),
            row_version: 0,
        };
        let relationship = self.documents().add_relationship(kind, parent_id, document).await?;
        Ok(DocumentUploadResponse {
            relationship,
            metadata_errors,
        })
    }

    /// Remove a link. When it was the document's last link the stored file
    /// is deleted too; returns whether storage cleanup succeeded.
    pub async fn delete_relationship(&self, kind: FileKind, relationship_id: Id) -> PimsResult<bool> {
        require(self.scope.user, Permission::DocumentDelete)?;
        let existing = self
            .scope
            .store
            .get_document_relationship(relationship_id)
            .await?
            .filter(|r| r.parent_kind == kind)
            .ok_or_else(|| PimsError::not_found("document relationship", relationship_id))?;

        let (_, document_removed) = self.documents().delete_relationship(existing.id).await?;
        if !document_removed {
            return Ok(true);
        }
        match self.storage.delete_document(existing.document.mayan_document_id).await {
            Ok(()) => Ok(true),
            Err(e) => {
                log::warn!(
                    "Document {} removed but storage copy {} was not: {}",
                    existing.document.id,
                    existing.document.mayan_document_id,
                    e
                );
                Ok(false)
            }
        }
    }

    pub async fn update(
        &self,
        document_id: Id,
        submitted: RowVersion,
        status_code: String,
        metadata: Vec<MetadataValue>,
    ) -> PimsResult<DocumentUpdateResponse> {
        require(self.scope.user, Permission::DocumentAdmin)?;
        let mut document = self
            .scope
            .store
            .get_document(document_id)
            .await?
            .ok_or_else(|| PimsError::not_found("document", document_id))?;
        document.status_code = status_code;
        let document = self.documents().update(document, submitted).await?;
        let metadata_errors = self.push_metadata(document.mayan_document_id, &metadata).await;
        Ok(DocumentUpdateResponse {
            document,
            metadata_errors,
        })
    }

    pub async fn get_storage_type_metadata(
        &self,
        mayan_type_id: i64,
    ) -> PimsResult<ExternalResult<QueryResult<DocumentTypeMetadataType>>> {
        require(self.scope.user, Permission::DocumentView)?;
        Ok(ExternalResult::from_result(
            self.storage.get_document_type_metadata(mayan_type_id).await,
        ))
    }

    pub async fn get_storage_document_metadata(
        &self,
        mayan_document_id: i64,
    ) -> PimsResult<ExternalResult<QueryResult<DocumentMetadata>>> {
        require(self.scope.user, Permission::DocumentView)?;
        Ok(ExternalResult::from_result(
            self.storage.get_document_metadata(mayan_document_id).await,
        ))
    }

    pub async fn download_file(&self, mayan_document_id: i64, file_id: i64) -> PimsResult<ExternalResult<FileDownload>> {
        require(self.scope.user, Permission::DocumentView)?;
        Ok(ExternalResult::from_result(
            self.storage.download_file(mayan_document_id, file_id).await,
        ))
    }

    pub async fn download_latest_file(&self, mayan_document_id: i64) -> PimsResult<ExternalResult<FileDownload>> {
        require(self.scope.user, Permission::DocumentView)?;
        Ok(ExternalResult::from_result(
            self.storage.download_latest_file(mayan_document_id).await,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_is_hex_sha256() {
        assert_eq!(
            checksum(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
