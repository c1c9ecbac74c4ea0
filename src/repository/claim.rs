use uuid::Uuid;

use crate::error::{resolve_outcome, PimsError, PimsResult};
use crate::logic::guard::require;
use crate::model::{Claim, PageRequest, Paged, Permission, RowVersion};
use crate::repository::RepositoryScope;
use crate::store::Store;

pub struct ClaimRepository<'a, S> {
    scope: RepositoryScope<'a, S>,
}

impl<'a, S: Store> ClaimRepository<'a, S> {
    pub fn new(scope: RepositoryScope<'a, S>) -> Self {
        Self { scope }
    }

    pub async fn get_page(&self, page: PageRequest, name: Option<&str>) -> PimsResult<Paged<Claim>> {
        require(self.scope.user, Permission::SystemAdmin)?;
        Ok(self.scope.store.list_claims(page, name).await?)
    }

    pub async fn get(&self, key: Uuid) -> PimsResult<Claim> {
        require(self.scope.user, Permission::SystemAdmin)?;
        self.scope
            .store
            .get_claim(key)
            .await?
            .ok_or_else(|| PimsError::not_found("claim", key))
    }

    pub async fn add(&self, mut claim: Claim) -> PimsResult<Claim> {
        require(self.scope.user, Permission::SystemAdmin)?;
        if claim.name.trim().is_empty() {
            return Err(PimsError::validation("Claim name is required"));
        }
        if claim.key.is_nil() {
            claim.key = Uuid::new_v4();
        } else if self.scope.store.get_claim(claim.key).await?.is_some() {
            return Err(PimsError::validation(format!(
                "Claim with key {} already exists",
                claim.key
            )));
        }
        let created = self.scope.store.insert_claim(claim).await?;
        log::info!("Added claim '{}' ({})", created.name, created.key);
        Ok(created)
    }

    pub async fn update(&self, claim: Claim, submitted: RowVersion) -> PimsResult<Claim> {
        require(self.scope.user, Permission::SystemAdmin)?;
        let key = claim.key;
        let outcome = self.scope.store.update_claim(claim, submitted).await?;
        let updated = resolve_outcome(outcome, "claim", key)?;
        log::info!("Updated claim {} to version {}", key, updated.row_version);
        Ok(updated)
    }

    pub async fn delete(&self, key: Uuid, submitted: RowVersion) -> PimsResult<()> {
        require(self.scope.user, Permission::SystemAdmin)?;
        let outcome = self.scope.store.delete_claim(key, submitted).await?;
        resolve_outcome(outcome, "claim", key)?;
        log::info!("Deleted claim {}", key);
        Ok(())
    }
}
