use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{ActivityInstance, FileKind, Id, RowVersion};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDto {
    #[serde(default)]
    pub id: Id,
    pub template_code: String,
    pub status: String,
    pub description: Option<String>,
    pub file_kind: FileKind,
    pub file_id: Id,
    #[serde(default)]
    pub activity_data: serde_json::Value,
    #[serde(default)]
    pub research_property_ids: Vec<Id>,
    #[serde(default, skip_deserializing)]
    pub created_by: String,
    #[serde(default, skip_deserializing)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub row_version: Option<RowVersion>,
}

impl From<ActivityInstance> for ActivityDto {
    fn from(activity: ActivityInstance) -> Self {
        Self {
            id: activity.id,
            template_code: activity.template_code,
            status: activity.status,
            description: activity.description,
            file_kind: activity.file_kind,
            file_id: activity.file_id,
            activity_data: activity.activity_data,
            research_property_ids: activity.research_property_ids,
            created_by: activity.created_by,
            created_at: Some(activity.created_at),
            row_version: Some(activity.row_version),
        }
    }
}

impl From<ActivityDto> for ActivityInstance {
    fn from(dto: ActivityDto) -> Self {
        Self {
            id: dto.id,
            template_code: dto.template_code,
            status: dto.status,
            description: dto.description,
            file_kind: dto.file_kind,
            file_id: dto.file_id,
            activity_data: dto.activity_data,
            research_property_ids: dto.research_property_ids,
            created_by: String::new(),
            created_at: Utc::now(),
            row_version: dto.row_version.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPropertiesDto {
    pub row_version: Option<RowVersion>,
    pub research_property_ids: Vec<Id>,
}
