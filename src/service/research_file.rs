use crate::error::{PimsError, PimsResult};
use crate::logic::guard::require;
use crate::model::{Id, ParentConcurrencyGuard, Permission, PropertyResearchFile, ResearchFile, RowVersion};
use crate::repository::{PropertyRepository, RepositoryScope, ResearchFileRepository};
use crate::service::check_guard_parent;
use crate::store::Store;

pub struct ResearchFileService<'a, S> {
    scope: RepositoryScope<'a, S>,
}

impl<'a, S: Store> ResearchFileService<'a, S> {
    pub fn new(scope: RepositoryScope<'a, S>) -> Self {
        Self { scope }
    }

    fn files(&self) -> ResearchFileRepository<'a, S> {
        ResearchFileRepository::new(self.scope)
    }

    /// Parcels not yet in the inventory are added when the file is written.
    async fn resolve_properties(&self, properties: &mut [PropertyResearchFile]) -> PimsResult<()> {
        PropertyRepository::new(self.scope).link_existing(properties).await
    }

    pub async fn add(&self, mut file: ResearchFile) -> PimsResult<ResearchFile> {
        require(self.scope.user, Permission::ResearchFileAdd)?;
        self.resolve_properties(&mut file.properties).await?;
        self.files().add(file).await
    }

    pub async fn update(&self, file: ResearchFile, submitted: RowVersion) -> PimsResult<ResearchFile> {
        self.files().update(file, submitted).await
    }

    pub async fn update_properties(
        &self,
        id: Id,
        submitted: RowVersion,
        mut properties: Vec<PropertyResearchFile>,
    ) -> PimsResult<ResearchFile> {
        require(self.scope.user, Permission::ResearchFileEdit)?;
        self.resolve_properties(&mut properties).await?;
        self.files().update_properties(id, submitted, properties).await
    }

    /// Edit a single property link, guarded by the research file's version.
    pub async fn update_property(
        &self,
        file_id: Id,
        guard: ParentConcurrencyGuard<PropertyResearchFile>,
    ) -> PimsResult<ResearchFile> {
        require(self.scope.user, Permission::ResearchFileEdit)?;
        check_guard_parent(&guard, file_id)?;
        let file = self.files().get(file_id).await?;

        let mut link = guard.payload;
        let mut properties = file.properties;
        let Some(slot) = properties.iter_mut().find(|p| p.id == link.id) else {
            return Err(PimsError::not_found("research file property", link.id));
        };
        self.resolve_properties(std::slice::from_mut(&mut link)).await?;
        *slot = link;

        self.files()
            .update_properties(file_id, guard.parent_row_version, properties)
            .await
    }
}
