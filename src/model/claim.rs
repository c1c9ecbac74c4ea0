use crate::model::{Id, RowVersion, Versioned};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub id: Id,
    pub key: Uuid,
    pub name: String,
    pub keycloak_role_id: Option<Uuid>,
    pub description: Option<String>,
    pub is_disabled: bool,
    pub row_version: RowVersion,
}

impl Versioned for Claim {
    fn row_version(&self) -> RowVersion {
        self.row_version
    }

    fn set_row_version(&mut self, version: RowVersion) {
        self.row_version = version;
    }
}
