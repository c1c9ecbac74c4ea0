use crate::model::{ChildRecord, Id, RowVersion, Versioned};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchFile {
    pub id: Id,
    /// `R-<id>`, assigned on insert
    pub file_number: String,
    pub name: String,
    pub status: ResearchFileStatus,
    pub road_name: Option<String>,
    pub road_alias: Option<String>,
    pub request_date: Option<NaiveDate>,
    pub request_description: Option<String>,
    pub requestor: Option<String>,
    pub result_date: Option<NaiveDate>,
    pub result_description: Option<String>,
    pub expropriation: bool,
    pub expropriation_notes: Option<String>,
    pub properties: Vec<PropertyResearchFile>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
    pub row_version: RowVersion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResearchFileStatus {
    Active,
    Inactive,
    Archived,
    Closed,
}

impl ResearchFileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResearchFileStatus::Active => "ACTIVE",
            ResearchFileStatus::Inactive => "INACTIVE",
            ResearchFileStatus::Archived => "ARCHIVED",
            ResearchFileStatus::Closed => "CLOSED",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        match code.to_ascii_uppercase().as_str() {
            "ACTIVE" => Some(ResearchFileStatus::Active),
            "INACTIVE" => Some(ResearchFileStatus::Inactive),
            "ARCHIVED" => Some(ResearchFileStatus::Archived),
            "CLOSED" => Some(ResearchFileStatus::Closed),
            _ => None,
        }
    }
}

/// A property linked into a research file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyResearchFile {
    pub id: Id,
    pub property_id: Id,
    pub pid: Option<i32>,
    pub pin: Option<i32>,
    pub property_name: Option<String>,
    pub display_order: Option<i32>,
    pub document_reference: Option<String>,
    pub research_summary: Option<String>,
    pub is_legal_opinion_required: Option<bool>,
    pub is_legal_opinion_obtained: Option<bool>,
    pub purpose_codes: Vec<String>,
}

impl Versioned for ResearchFile {
    fn row_version(&self) -> RowVersion {
        self.row_version
    }

    fn set_row_version(&mut self, version: RowVersion) {
        self.row_version = version;
    }
}

impl ChildRecord for PropertyResearchFile {
    fn child_id(&self) -> Id {
        self.id
    }

    fn id_mut(&mut self) -> &mut Id {
        &mut self.id
    }
}
