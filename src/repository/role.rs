use uuid::Uuid;

use crate::error::{resolve_outcome, PimsError, PimsResult};
use crate::logic::guard::{require, require_or_service_account};
use crate::logic::validate::validate_role;
use crate::model::{PageRequest, Paged, Permission, Role, RowVersion};
use crate::repository::RepositoryScope;
use crate::store::Store;

pub struct RoleRepository<'a, S> {
    scope: RepositoryScope<'a, S>,
}

impl<'a, S: Store> RoleRepository<'a, S> {
    pub fn new(scope: RepositoryScope<'a, S>) -> Self {
        Self { scope }
    }

    fn require_admin_or_service(&self) -> PimsResult<()> {
        require_or_service_account(self.scope.user, Permission::AdminRoles, self.scope.auth)
    }

    pub async fn get_page(&self, page: PageRequest, name: Option<&str>) -> PimsResult<Paged<Role>> {
        self.require_admin_or_service()?;
        Ok(self.scope.store.list_roles(page, name).await?)
    }

    pub async fn get(&self, key: Uuid) -> PimsResult<Role> {
        require(self.scope.user, Permission::AdminRoles)?;
        self.scope
            .store
            .get_role(key)
            .await?
            .ok_or_else(|| PimsError::not_found("role", key))
    }

    pub async fn get_by_name(&self, name: &str) -> PimsResult<Role> {
        self.require_admin_or_service()?;
        self.scope
            .store
            .get_role_by_name(name)
            .await?
            .ok_or_else(|| PimsError::not_found("role", name))
    }

    pub async fn get_by_keycloak_id(&self, group_id: Uuid) -> PimsResult<Role> {
        self.require_admin_or_service()?;
        self.scope
            .store
            .get_role_by_keycloak_id(group_id)
            .await?
            .ok_or_else(|| PimsError::not_found("role", group_id))
    }

    pub async fn add(&self, mut role: Role) -> PimsResult<Role> {
        require(self.scope.user, Permission::AdminRoles)?;
        validate_role(&role)?;
        if role.key.is_nil() {
            role.key = Uuid::new_v4();
        } else if self.scope.store.get_role(role.key).await?.is_some() {
            return Err(PimsError::validation(format!(
                "Role with key {} already exists",
                role.key
            )));
        }
        let created = self.scope.store.insert_role(role).await?;
        log::info!("Added role '{}' ({})", created.name, created.key);
        Ok(created)
    }

    pub async fn update(&self, role: Role, submitted: RowVersion) -> PimsResult<Role> {
        self.require_admin_or_service()?;
        validate_role(&role)?;
        let key = role.key;
        let outcome = self.scope.store.update_role(role, submitted).await?;
        let updated = resolve_outcome(outcome, "role", key)?;
        log::info!("Updated role {} to version {}", key, updated.row_version);
        Ok(updated)
    }

    pub async fn delete(&self, key: Uuid, submitted: RowVersion) -> PimsResult<()> {
        require(self.scope.user, Permission::AdminRoles)?;
        let outcome = self.scope.store.delete_role(key, submitted).await?;
        resolve_outcome(outcome, "role", key)?;
        log::info!("Deleted role {}", key);
        Ok(())
    }

    /// Drop every role not in `keep`. Used when synchronising with the
    /// identity provider's groups.
    pub async fn remove_all_except(&self, keep: &[Uuid]) -> PimsResult<u64> {
        self.require_admin_or_service()?;
        let removed = self.scope.store.remove_roles_except(keep).await?;
        log::info!("Removed {} roles not in the keep list", removed);
        Ok(removed)
    }
}
