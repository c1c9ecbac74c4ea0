use serde::{Deserialize, Serialize};

/// Capability tags a principal can hold. The string form is what identity
/// tokens and request headers carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "system-admin")]
    SystemAdmin,
    #[serde(rename = "admin-users")]
    AdminUsers,
    #[serde(rename = "admin-roles")]
    AdminRoles,
    #[serde(rename = "property-view")]
    PropertyView,
    #[serde(rename = "property-add")]
    PropertyAdd,
    #[serde(rename = "property-edit")]
    PropertyEdit,
    #[serde(rename = "lease-view")]
    LeaseView,
    #[serde(rename = "lease-add")]
    LeaseAdd,
    #[serde(rename = "lease-edit")]
    LeaseEdit,
    #[serde(rename = "researchfile-view")]
    ResearchFileView,
    #[serde(rename = "researchfile-add")]
    ResearchFileAdd,
    #[serde(rename = "researchfile-edit")]
    ResearchFileEdit,
    #[serde(rename = "activity-view")]
    ActivityView,
    #[serde(rename = "activity-add")]
    ActivityAdd,
    #[serde(rename = "activity-edit")]
    ActivityEdit,
    #[serde(rename = "activity-delete")]
    ActivityDelete,
    #[serde(rename = "document-view")]
    DocumentView,
    #[serde(rename = "document-add")]
    DocumentAdd,
    #[serde(rename = "document-delete")]
    DocumentDelete,
    #[serde(rename = "document-admin")]
    DocumentAdmin,
}

impl Permission {
    pub const ALL: [Permission; 20] = [
        Permission::SystemAdmin,
        Permission::AdminUsers,
        Permission::AdminRoles,
        Permission::PropertyView,
        Permission::PropertyAdd,
        Permission::PropertyEdit,
        Permission::LeaseView,
        Permission::LeaseAdd,
        Permission::LeaseEdit,
        Permission::ResearchFileView,
        Permission::ResearchFileAdd,
        Permission::ResearchFileEdit,
        Permission::ActivityView,
        Permission::ActivityAdd,
        Permission::ActivityEdit,
        Permission::ActivityDelete,
        Permission::DocumentView,
        Permission::DocumentAdd,
        Permission::DocumentDelete,
        Permission::DocumentAdmin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::SystemAdmin => "system-admin",
            Permission::AdminUsers => "admin-users",
            Permission::AdminRoles => "admin-roles",
            Permission::PropertyView => "property-view",
            Permission::PropertyAdd => "property-add",
            Permission::PropertyEdit => "property-edit",
            Permission::LeaseView => "lease-view",
            Permission::LeaseAdd => "lease-add",
            Permission::LeaseEdit => "lease-edit",
            Permission::ResearchFileView => "researchfile-view",
            Permission::ResearchFileAdd => "researchfile-add",
            Permission::ResearchFileEdit => "researchfile-edit",
            Permission::ActivityView => "activity-view",
            Permission::ActivityAdd => "activity-add",
            Permission::ActivityEdit => "activity-edit",
            Permission::ActivityDelete => "activity-delete",
            Permission::DocumentView => "document-view",
            Permission::DocumentAdd => "document-add",
            Permission::DocumentDelete => "document-delete",
            Permission::DocumentAdmin => "document-admin",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        Self::ALL.iter().copied().find(|p| p.as_str() == tag)
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip_through_parse() {
        for permission in Permission::ALL {
            assert_eq!(Permission::parse(permission.as_str()), Some(permission));
        }
        assert_eq!(Permission::parse(" lease-edit "), Some(Permission::LeaseEdit));
        assert_eq!(Permission::parse("lease-destroy"), None);
    }

    #[test]
    fn serde_uses_tag_strings() {
        let json = serde_json::to_string(&Permission::ResearchFileView).unwrap();
        assert_eq!(json, "\"researchfile-view\"");
    }
}
