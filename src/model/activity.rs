use crate::model::{FileKind, Id, RowVersion, Versioned};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A workflow activity attached to a research file or lease
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityInstance {
    pub id: Id,
    pub template_code: String,
    pub status: String,
    pub description: Option<String>,
    pub file_kind: FileKind,
    pub file_id: Id,
    /// Template specific form data
    pub activity_data: serde_json::Value,
    /// Property-research-file links within the parent research file
    pub research_property_ids: Vec<Id>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub row_version: RowVersion,
}

impl Versioned for ActivityInstance {
    fn row_version(&self) -> RowVersion {
        self.row_version
    }

    fn set_row_version(&mut self, version: RowVersion) {
        self.row_version = version;
    }
}
