use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PimsError, PimsResult};
use crate::model::{
    Id, PageRequest, PropertyResearchFile, ResearchFile, ResearchFileFilter, ResearchFileStatus,
    RowVersion,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyResearchFileDto {
    #[serde(default)]
    pub id: Id,
    #[serde(default)]
    pub property_id: Id,
    pub pid: Option<i32>,
    pub pin: Option<i32>,
    pub property_name: Option<String>,
    pub display_order: Option<i32>,
    pub document_reference: Option<String>,
    pub research_summary: Option<String>,
    pub is_legal_opinion_required: Option<bool>,
    pub is_legal_opinion_obtained: Option<bool>,
    #[serde(default)]
    pub purpose_codes: Vec<String>,
}

impl From<PropertyResearchFile> for PropertyResearchFileDto {
    fn from(link: PropertyResearchFile) -> Self {
        Self {
            id: link.id,
            property_id: link.property_id,
            pid: link.pid,
            pin: link.pin,
            property_name: link.property_name,
            display_order: link.display_order,
            document_reference: link.document_reference,
            research_summary: link.research_summary,
            is_legal_opinion_required: link.is_legal_opinion_required,
            is_legal_opinion_obtained: link.is_legal_opinion_obtained,
            purpose_codes: link.purpose_codes,
        }
    }
}

impl From<PropertyResearchFileDto> for PropertyResearchFile {
    fn from(dto: PropertyResearchFileDto) -> Self {
        Self {
            id: dto.id,
            property_id: dto.property_id,
            pid: dto.pid,
            pin: dto.pin,
            property_name: dto.property_name,
            display_order: dto.display_order,
            document_reference: dto.document_reference,
            research_summary: dto.research_summary,
            is_legal_opinion_required: dto.is_legal_opinion_required,
            is_legal_opinion_obtained: dto.is_legal_opinion_obtained,
            purpose_codes: dto.purpose_codes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchFileDto {
    #[serde(default)]
    pub id: Id,
    #[serde(default)]
    pub file_number: String,
    pub name: String,
    pub status: Option<String>,
    pub road_name: Option<String>,
    pub road_alias: Option<String>,
    pub request_date: Option<NaiveDate>,
    pub request_description: Option<String>,
    pub requestor: Option<String>,
    pub result_date: Option<NaiveDate>,
    pub result_description: Option<String>,
    #[serde(default)]
    pub expropriation: bool,
    pub expropriation_notes: Option<String>,
    #[serde(default)]
    pub properties: Vec<PropertyResearchFileDto>,
    #[serde(default, skip_deserializing)]
    pub created_by: String,
    #[serde(default, skip_deserializing)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_deserializing)]
    pub updated_by: String,
    #[serde(default, skip_deserializing)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub row_version: Option<RowVersion>,
}

impl From<ResearchFile> for ResearchFileDto {
    fn from(file: ResearchFile) -> Self {
        Self {
            id: file.id,
            file_number: file.file_number,
            name: file.name,
            status: Some(file.status.as_str().to_string()),
            road_name: file.road_name,
            road_alias: file.road_alias,
            request_date: file.request_date,
            request_description: file.request_description,
            requestor: file.requestor,
            result_date: file.result_date,
            result_description: file.result_description,
            expropriation: file.expropriation,
            expropriation_notes: file.expropriation_notes,
            properties: file.properties.into_iter().map(Into::into).collect(),
            created_by: file.created_by,
            created_at: Some(file.created_at),
            updated_by: file.updated_by,
            updated_at: Some(file.updated_at),
            row_version: Some(file.row_version),
        }
    }
}

impl TryFrom<ResearchFileDto> for ResearchFile {
    type Error = PimsError;

    /// A missing status means a new, active file.
    fn try_from(dto: ResearchFileDto) -> PimsResult<Self> {
        let status = match dto.status.as_deref() {
            None => ResearchFileStatus::Active,
            Some(code) => ResearchFileStatus::parse(code).ok_or_else(|| {
                PimsError::validation(format!("Unknown research file status '{}'", code))
            })?,
        };
        let now = Utc::now();
        Ok(Self {
            id: dto.id,
            file_number: dto.file_number,
            name: dto.name,
            status,
            road_name: dto.road_name,
            road_alias: dto.road_alias,
            request_date: dto.request_date,
            request_description: dto.request_description,
            requestor: dto.requestor,
            result_date: dto.result_date,
            result_description: dto.result_description,
            expropriation: dto.expropriation,
            expropriation_notes: dto.expropriation_notes,
            properties: dto.properties.into_iter().map(Into::into).collect(),
            created_by: String::new(),
            created_at: now,
            updated_by: String::new(),
            updated_at: now,
            row_version: dto.row_version.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchFilePropertiesDto {
    pub row_version: Option<RowVersion>,
    pub properties: Vec<PropertyResearchFileDto>,
}

/// `GET /researchFiles` query string
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchFileQuery {
    pub page: Option<i64>,
    pub quantity: Option<i64>,
    pub name: Option<String>,
    pub file_number: Option<String>,
    pub status: Option<String>,
    pub road_or_alias: Option<String>,
}

impl ResearchFileQuery {
    pub fn into_parts(self) -> (ResearchFileFilter, PageRequest) {
        let page = super::PageQuery {
            page: self.page,
            quantity: self.quantity,
            name: None,
        }
        .request();
        let filter = ResearchFileFilter {
            name: self.name,
            file_number: self.file_number,
            status: self.status,
            road_or_alias: self.road_or_alias,
        };
        (filter, page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_status_is_rejected() {
        let dto: ResearchFileDto =
            serde_json::from_str(r#"{"name":"Hwy 1 widening","status":"PENDING"}"#).unwrap();
        assert!(matches!(
            ResearchFile::try_from(dto),
            Err(PimsError::Validation(_))
        ));
    }

    #[test]
    fn status_defaults_to_active() {
        let dto: ResearchFileDto = serde_json::from_str(r#"{"name":"Hwy 1 widening"}"#).unwrap();
        let file = ResearchFile::try_from(dto).unwrap();
        assert_eq!(file.status, ResearchFileStatus::Active);
    }
}
