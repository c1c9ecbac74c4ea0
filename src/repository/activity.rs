use chrono::Utc;
use std::collections::HashSet;

use crate::error::{resolve_outcome, PimsError, PimsResult};
use crate::logic::guard::require;
use crate::model::{ActivityInstance, FileKind, Id, Permission, RowVersion};
use crate::repository::RepositoryScope;
use crate::store::Store;

pub struct ActivityRepository<'a, S> {
    scope: RepositoryScope<'a, S>,
}

impl<'a, S: Store> ActivityRepository<'a, S> {
    pub fn new(scope: RepositoryScope<'a, S>) -> Self {
        Self { scope }
    }

    pub async fn get(&self, id: Id) -> PimsResult<ActivityInstance> {
        require(self.scope.user, Permission::ActivityView)?;
        self.scope
            .store
            .get_activity(id)
            .await?
            .ok_or_else(|| PimsError::not_found("activity", id))
    }

    pub async fn list_for_file(&self, kind: FileKind, file_id: Id) -> PimsResult<Vec<ActivityInstance>> {
        require(self.scope.user, Permission::ActivityView)?;
        self.ensure_parent(kind, file_id).await?;
        Ok(self.scope.store.list_activities(kind, file_id).await?)
    }

    pub async fn add(&self, mut activity: ActivityInstance) -> PimsResult<ActivityInstance> {
        require(self.scope.user, Permission::ActivityAdd)?;
        if activity.template_code.trim().is_empty() {
            return Err(PimsError::validation("Activity template is required"));
        }
        self.ensure_parent(activity.file_kind, activity.file_id).await?;
        self.check_properties(activity.file_kind, activity.file_id, &activity.research_property_ids)
            .await?;
        activity.created_by = self.scope.user.audit_name();
        activity.created_at = Utc::now();
        let created = self.scope.store.insert_activity(activity).await?;
        log::info!(
            "Added {} activity {} to {} file {}",
            created.template_code,
            created.id,
            created.file_kind,
            created.file_id
        );
        Ok(created)
    }

    pub async fn update(&self, activity: ActivityInstance, submitted: RowVersion) -> PimsResult<ActivityInstance> {
        require(self.scope.user, Permission::ActivityEdit)?;
        let id = activity.id;
        let outcome = self.scope.store.update_activity(activity, submitted).await?;
        let updated = resolve_outcome(outcome, "activity", id)?;
        log::info!("Updated activity {} to version {}", id, updated.row_version);
        Ok(updated)
    }

    /// Replace the research-file properties an activity applies to.
    pub async fn update_properties(
        &self,
        id: Id,
        submitted: RowVersion,
        research_property_ids: Vec<Id>,
    ) -> PimsResult<ActivityInstance> {
        require(self.scope.user, Permission::ActivityEdit)?;
        let current = self
            .scope
            .store
            .get_activity(id)
            .await?
            .ok_or_else(|| PimsError::not_found("activity", id))?;
        self.check_properties(current.file_kind, current.file_id, &research_property_ids)
            .await?;
        let outcome = self
            .scope
            .store
            .replace_activity_properties(id, submitted, research_property_ids)
            .await?;
        let updated = resolve_outcome(outcome, "activity", id)?;
        log::info!("Updated activity {} properties, now version {}", id, updated.row_version);
        Ok(updated)
    }

    pub async fn delete(&self, id: Id, submitted: RowVersion) -> PimsResult<()> {
        require(self.scope.user, Permission::ActivityDelete)?;
        let outcome = self.scope.store.delete_activity(id, submitted).await?;
        resolve_outcome(outcome, "activity", id)?;
        log::info!("Deleted activity {}", id);
        Ok(())
    }

    async fn ensure_parent(&self, kind: FileKind, file_id: Id) -> PimsResult<()> {
        let exists = match kind {
            FileKind::Research => self.scope.store.get_research_file(file_id).await?.is_some(),
            FileKind::Lease => self.scope.store.get_lease(file_id).await?.is_some(),
        };
        if !exists {
            let entity = match kind {
                FileKind::Research => "research file",
                FileKind::Lease => "lease",
            };
            return Err(PimsError::not_found(entity, file_id));
        }
        Ok(())
    }

    /// Linked properties must be property-research-file links of the
    /// activity's own research file.
    async fn check_properties(&self, kind: FileKind, file_id: Id, property_ids: &[Id]) -> PimsResult<()> {
        if property_ids.is_empty() {
            return Ok(());
        }
        if kind != FileKind::Research {
            return Err(PimsError::validation(
                "Only research file activities can be linked to properties",
            ));
        }
        let file = self
            .scope
            .store
            .get_research_file(file_id)
            .await?
            .ok_or_else(|| PimsError::not_found("research file", file_id))?;
        let owned: HashSet<Id> = file.properties.iter().map(|p| p.id).collect();
        if let Some(foreign) = property_ids.iter().find(|id| !owned.contains(id)) {
            return Err(PimsError::validation(format!(
                "Property {} does not belong to research file {}",
                foreign, file_id
            )));
        }
        Ok(())
    }
}
