use crate::model::Permission;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The acting principal, extracted from request headers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: String,
    pub user_email: Option<String>,
    pub user_name: Option<String>,
    pub permissions: BTreeSet<Permission>,
}

impl UserContext {
    /// Create a new UserContext with just a user ID and no capabilities
    pub fn new(user_id: String) -> Self {
        Self {
            user_id,
            user_email: None,
            user_name: None,
            permissions: BTreeSet::new(),
        }
    }

    /// Create a UserContext with full user information
    pub fn with_details(user_id: String, email: Option<String>, name: Option<String>) -> Self {
        Self {
            user_id,
            user_email: email,
            user_name: name,
            permissions: BTreeSet::new(),
        }
    }

    pub fn with_permissions<I>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = Permission>,
    {
        self.permissions.extend(permissions);
        self
    }

    /// Create a system user context for internal operations (seeding, sync jobs)
    pub fn system() -> Self {
        Self {
            user_id: "system".to_string(),
            user_email: Some("system@pims.internal".to_string()),
            user_name: Some("System".to_string()),
            permissions: Permission::ALL.into_iter().collect(),
        }
    }

    /// Anonymous caller: no headers were supplied
    pub fn anonymous() -> Self {
        Self::new("anonymous".to_string())
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    /// Service accounts are identified by the identity provider's
    /// `service-account-<client>` naming.
    pub fn is_service_account(&self, client_id: &str) -> bool {
        !client_id.is_empty() && self.user_id == format!("service-account-{}", client_id)
    }

    /// Name written to audit columns
    pub fn audit_name(&self) -> String {
        self.user_name.clone().unwrap_or_else(|| self.user_id.clone())
    }
}

impl Default for UserContext {
    fn default() -> Self {
        Self::anonymous()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_account_matches_configured_client() {
        let ctx = UserContext::new("service-account-pims-api".to_string());
        assert!(ctx.is_service_account("pims-api"));
        assert!(!ctx.is_service_account("other"));
        assert!(!ctx.is_service_account(""));
    }

    #[test]
    fn anonymous_has_no_permissions() {
        let ctx = UserContext::default();
        assert!(ctx.permissions.is_empty());
        assert!(!ctx.has_permission(Permission::PropertyView));
    }

    #[test]
    fn system_holds_every_permission() {
        let ctx = UserContext::system();
        assert!(Permission::ALL.iter().all(|p| ctx.has_permission(*p)));
    }
}
