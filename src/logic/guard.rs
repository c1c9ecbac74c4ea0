//! Capability checks, called explicitly at the start of each handler and
//! repository operation.

use crate::config::AuthConfig;
use crate::error::{PimsError, PimsResult};
use crate::model::{Permission, UserContext};

pub fn require(user: &UserContext, permission: Permission) -> PimsResult<()> {
    if user.has_permission(permission) {
        Ok(())
    } else {
        log::debug!("User '{}' lacks '{}'", user.user_id, permission);
        Err(PimsError::Forbidden { permission })
    }
}

/// Passes when the user holds any of `permissions`. Reports the first one on failure.
pub fn require_any(user: &UserContext, permissions: &[Permission]) -> PimsResult<()> {
    if permissions.iter().any(|p| user.has_permission(*p)) {
        return Ok(());
    }
    match permissions.first() {
        Some(permission) => Err(PimsError::Forbidden {
            permission: *permission,
        }),
        None => Ok(()),
    }
}

/// Service accounts of the configured client bypass the interactive check.
pub fn require_or_service_account(
    user: &UserContext,
    permission: Permission,
    auth: &AuthConfig,
) -> PimsResult<()> {
    if user.is_service_account(&auth.client_id) {
        return Ok(());
    }
    require(user, permission)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> AuthConfig {
        AuthConfig {
            client_id: "pims-api".to_string(),
        }
    }

    #[test]
    fn holder_passes_and_others_are_forbidden() {
        let user = UserContext::new("u".to_string()).with_permissions([Permission::LeaseView]);
        assert!(require(&user, Permission::LeaseView).is_ok());
        assert!(matches!(
            require(&user, Permission::LeaseEdit),
            Err(PimsError::Forbidden {
                permission: Permission::LeaseEdit
            })
        ));
    }

    #[test]
    fn service_account_bypasses_interactive_check() {
        let service = UserContext::new("service-account-pims-api".to_string());
        assert!(require_or_service_account(&service, Permission::AdminRoles, &auth()).is_ok());
        assert!(require(&service, Permission::AdminRoles).is_err());

        let interactive = UserContext::new("jdoe".to_string());
        assert!(require_or_service_account(&interactive, Permission::AdminRoles, &auth()).is_err());
    }

    #[test]
    fn require_any_accepts_one_of() {
        let user = UserContext::new("u".to_string()).with_permissions([Permission::DocumentAdmin]);
        assert!(require_any(&user, &[Permission::DocumentView, Permission::DocumentAdmin]).is_ok());
        assert!(require_any(&user, &[Permission::LeaseView]).is_err());
    }
}
