use chrono::Utc;

use crate::error::{resolve_outcome, PimsError, PimsResult};
use crate::logic::guard::require;
use crate::logic::validate::{validate_research_file, validate_research_properties};
use crate::model::{
    Id, PageRequest, Paged, Permission, PropertyResearchFile, ResearchFile, ResearchFileFilter,
    RowVersion,
};
use crate::repository::RepositoryScope;
use crate::store::Store;

pub struct ResearchFileRepository<'a, S> {
    scope: RepositoryScope<'a, S>,
}

impl<'a, S: Store> ResearchFileRepository<'a, S> {
    pub fn new(scope: RepositoryScope<'a, S>) -> Self {
        Self { scope }
    }

    pub async fn get_page(
        &self,
        filter: &ResearchFileFilter,
        page: PageRequest,
    ) -> PimsResult<Paged<ResearchFile>> {
        require(self.scope.user, Permission::ResearchFileView)?;
        Ok(self.scope.store.list_research_files(filter, page).await?)
    }

    pub async fn get(&self, id: Id) -> PimsResult<ResearchFile> {
        require(self.scope.user, Permission::ResearchFileView)?;
        self.scope
            .store
            .get_research_file(id)
            .await?
            .ok_or_else(|| PimsError::not_found("research file", id))
    }

    /// Properties must already be resolved to inventory records.
    pub async fn add(&self, mut file: ResearchFile) -> PimsResult<ResearchFile> {
        require(self.scope.user, Permission::ResearchFileAdd)?;
        validate_research_file(&file)?;
        let now = Utc::now();
        file.created_by = self.scope.user.audit_name();
        file.created_at = now;
        file.updated_by = file.created_by.clone();
        file.updated_at = now;
        let created = self.scope.store.insert_research_file(file).await?;
        log::info!("Added research file {} '{}'", created.file_number, created.name);
        Ok(created)
    }

    pub async fn update(&self, mut file: ResearchFile, submitted: RowVersion) -> PimsResult<ResearchFile> {
        require(self.scope.user, Permission::ResearchFileEdit)?;
        validate_research_file(&file)?;
        file.updated_by = self.scope.user.audit_name();
        file.updated_at = Utc::now();
        let id = file.id;
        let outcome = self.scope.store.update_research_file(file, submitted).await?;
        let updated = resolve_outcome(outcome, "research file", id)?;
        log::info!("Updated research file {} to version {}", id, updated.row_version);
        Ok(updated)
    }

    pub async fn update_properties(
        &self,
        id: Id,
        submitted: RowVersion,
        properties: Vec<PropertyResearchFile>,
    ) -> PimsResult<ResearchFile> {
        require(self.scope.user, Permission::ResearchFileEdit)?;
        validate_research_properties(&properties)?;
        let count = properties.len();
        let outcome = self
            .scope
            .store
            .replace_research_file_properties(id, submitted, properties)
            .await?;
        let updated = resolve_outcome(outcome, "research file", id)?;
        log::info!(
            "Replaced {} properties on research file {}, now version {}",
            count,
            id,
            updated.row_version
        );
        Ok(updated)
    }
}
