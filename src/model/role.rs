use crate::model::{Id, RowVersion, Versioned};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: Id,
    pub key: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub is_disabled: bool,
    pub sort_order: i32,
    pub keycloak_group_id: Option<Uuid>,
    pub claims: Vec<RoleClaim>,
    pub row_version: RowVersion,
}

/// Link between a role and one of its claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleClaim {
    pub claim_key: Uuid,
    pub claim_name: String,
    pub is_disabled: bool,
}

impl Role {
    pub fn claim_names(&self) -> Vec<&str> {
        self.claims.iter().map(|c| c.claim_name.as_str()).collect()
    }
}

impl Versioned for Role {
    fn row_version(&self) -> RowVersion {
        self.row_version
    }

    fn set_row_version(&mut self, version: RowVersion) {
        self.row_version = version;
    }
}
