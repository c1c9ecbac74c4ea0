use crate::error::{resolve_outcome, PimsResult};
use crate::logic::guard::require;
use crate::model::{Permission, RowVersion, Tenant};
use crate::repository::RepositoryScope;
use crate::store::Store;

pub struct TenantRepository<'a, S> {
    scope: RepositoryScope<'a, S>,
}

impl<'a, S: Store> TenantRepository<'a, S> {
    pub fn new(scope: RepositoryScope<'a, S>) -> Self {
        Self { scope }
    }

    /// Tenant settings are public. No configured code, or a code with no
    /// matching row, is not an error.
    pub async fn get_configured(&self, code: Option<&str>) -> PimsResult<Option<Tenant>> {
        let Some(code) = code.map(str::trim).filter(|c| !c.is_empty()) else {
            log::debug!("No tenant configured");
            return Ok(None);
        };
        let tenant = self.scope.store.get_tenant(code).await?;
        if tenant.is_none() {
            log::debug!("Configured tenant '{}' not found", code);
        }
        Ok(tenant)
    }

    pub async fn update(&self, tenant: Tenant, submitted: RowVersion) -> PimsResult<Tenant> {
        require(self.scope.user, Permission::SystemAdmin)?;
        let code = tenant.code.clone();
        let outcome = self.scope.store.update_tenant(tenant, submitted).await?;
        let updated = resolve_outcome(outcome, "tenant", &code)?;
        log::info!("Updated tenant '{}' to version {}", code, updated.row_version);
        Ok(updated)
    }
}
