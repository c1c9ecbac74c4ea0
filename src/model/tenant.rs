use crate::model::{Id, RowVersion, Versioned};
use serde::{Deserialize, Serialize};

/// A deployment tenant and its display settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Id,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    /// Free-form display configuration consumed by the frontend
    pub settings: serde_json::Value,
    pub row_version: RowVersion,
}

impl Versioned for Tenant {
    fn row_version(&self) -> RowVersion {
        self.row_version
    }

    fn set_row_version(&mut self, version: RowVersion) {
        self.row_version = version;
    }
}
