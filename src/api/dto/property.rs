use serde::{Deserialize, Serialize};

use crate::model::{
    format_pid, AssociationSummary, Id, PageRequest, Property, PropertyAssociations, PropertyFilter,
    RowVersion,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDto {
    #[serde(default)]
    pub id: Id,
    pub pid: Option<i32>,
    /// `000-000-000`; ignored on input
    #[serde(default, skip_deserializing)]
    pub pid_formatted: Option<String>,
    pub pin: Option<i32>,
    pub address: Option<String>,
    pub legal_description: Option<String>,
    pub land_area: Option<f64>,
    pub area_unit: Option<String>,
    #[serde(default)]
    pub is_sensitive: bool,
    #[serde(default)]
    pub row_version: Option<RowVersion>,
}

impl From<Property> for PropertyDto {
    fn from(property: Property) -> Self {
        Self {
            id: property.id,
            pid: property.pid,
            pid_formatted: property.pid.map(format_pid),
            pin: property.pin,
            address: property.address,
            legal_description: property.legal_description,
            land_area: property.land_area,
            area_unit: property.area_unit,
            is_sensitive: property.is_sensitive,
            row_version: Some(property.row_version),
        }
    }
}

impl From<PropertyDto> for Property {
    fn from(dto: PropertyDto) -> Self {
        Self {
            id: dto.id,
            pid: dto.pid,
            pin: dto.pin,
            address: dto.address,
            legal_description: dto.legal_description,
            land_area: dto.land_area,
            area_unit: dto.area_unit,
            is_sensitive: dto.is_sensitive,
            row_version: dto.row_version.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationDto {
    pub id: Id,
    pub file_number: String,
    pub file_name: Option<String>,
    pub status: String,
    pub created_by: String,
    pub created_at: String,
}

impl From<AssociationSummary> for AssociationDto {
    fn from(summary: AssociationSummary) -> Self {
        Self {
            id: summary.id,
            file_number: summary.file_number,
            file_name: summary.file_name,
            status: summary.status,
            created_by: summary.created_by,
            created_at: summary.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyAssociationsDto {
    pub id: Id,
    pub pid: Option<String>,
    pub lease_associations: Vec<AssociationDto>,
    pub research_associations: Vec<AssociationDto>,
}

impl From<PropertyAssociations> for PropertyAssociationsDto {
    fn from(associations: PropertyAssociations) -> Self {
        Self {
            id: associations.id,
            pid: associations.pid.map(format_pid),
            lease_associations: associations.leases.into_iter().map(Into::into).collect(),
            research_associations: associations
                .research_files
                .into_iter()
                .map(Into::into)
                .collect(),
        }
    }
}

/// `GET /properties` query string
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyQuery {
    pub page: Option<i64>,
    pub quantity: Option<i64>,
    pub pid: Option<String>,
    pub pin: Option<i32>,
    pub address: Option<String>,
}

impl PropertyQuery {
    pub fn into_parts(self) -> (PropertyFilter, PageRequest) {
        let page = super::PageQuery {
            page: self.page,
            quantity: self.quantity,
            name: None,
        }
        .request();
        let filter = PropertyFilter {
            pid: self.pid,
            pin: self.pin,
            address: self.address,
        };
        (filter, page)
    }
}
