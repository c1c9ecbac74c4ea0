use crate::error::{resolve_outcome, PimsError, PimsResult};
use crate::logic::guard::require;
use crate::model::{
    Document, DocumentRelationship, DocumentType, FileKind, Id, Permission, RowVersion,
};
use crate::repository::RepositoryScope;
use crate::store::Store;

pub struct DocumentRepository<'a, S> {
    scope: RepositoryScope<'a, S>,
}

impl<'a, S: Store> DocumentRepository<'a, S> {
    pub fn new(scope: RepositoryScope<'a, S>) -> Self {
        Self { scope }
    }

    pub async fn get_types(&self) -> PimsResult<Vec<DocumentType>> {
        require(self.scope.user, Permission::DocumentView)?;
        Ok(self.scope.store.list_document_types().await?)
    }

    pub async fn get_type(&self, id: Id) -> PimsResult<DocumentType> {
        require(self.scope.user, Permission::DocumentView)?;
        self.scope
            .store
            .get_document_type(id)
            .await?
            .ok_or_else(|| PimsError::not_found("document type", id))
    }

    pub async fn get(&self, id: Id) -> PimsResult<Document> {
        require(self.scope.user, Permission::DocumentView)?;
        self.scope
            .store
            .get_document(id)
            .await?
            .ok_or_else(|| PimsError::not_found("document", id))
    }

    pub async fn get_relationships(&self, kind: FileKind, parent_id: Id) -> PimsResult<Vec<DocumentRelationship>> {
        require(self.scope.user, Permission::DocumentView)?;
        Ok(self
            .scope
            .store
            .list_document_relationships(kind, parent_id)
            .await?)
    }

    pub async fn get_relationship(&self, id: Id) -> PimsResult<DocumentRelationship> {
        require(self.scope.user, Permission::DocumentView)?;
        self.scope
            .store
            .get_document_relationship(id)
            .await?
            .ok_or_else(|| PimsError::not_found("document relationship", id))
    }

    pub async fn add_relationship(
        &self,
        kind: FileKind,
        parent_id: Id,
        mut document: Document,
    ) -> PimsResult<DocumentRelationship> {
        require(self.scope.user, Permission::DocumentAdd)?;
        document.created_by = self.scope.user.audit_name();
        document.created_at = chrono::Utc::now();
        let relationship = self
            .scope
            .store
            .insert_document_relationship(kind, parent_id, document)
            .await?;
        log::info!(
            "Linked document {} to {} file {}",
            relationship.document.id,
            kind,
            parent_id
        );
        Ok(relationship)
    }

    /// Returns the removed link and whether its document went with it.
    pub async fn delete_relationship(&self, id: Id) -> PimsResult<(DocumentRelationship, bool)> {
        require(self.scope.user, Permission::DocumentDelete)?;
        let removed = self
            .scope
            .store
            .delete_document_relationship(id)
            .await?
            .ok_or_else(|| PimsError::not_found("document relationship", id))?;
        log::info!(
            "Removed document relationship {} (document removed: {})",
            id,
            removed.1
        );
        Ok(removed)
    }

    pub async fn update(&self, document: Document, submitted: RowVersion) -> PimsResult<Document> {
        require(self.scope.user, Permission::DocumentAdmin)?;
        let id = document.id;
        let outcome = self.scope.store.update_document(document, submitted).await?;
        let updated = resolve_outcome(outcome, "document", id)?;
        log::info!("Updated document {} to version {}", id, updated.row_version);
        Ok(updated)
    }
}
