use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PimsError, PimsResult};
use crate::model::{
    Id, Insurance, Lease, LeaseFilter, LeasePayment, LeaseTenant, LeaseTerm, PageRequest,
    PropertyImprovement, PropertyLease, RowVersion, TenantParty,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseTenantDto {
    #[serde(default)]
    pub id: Id,
    pub person_id: Option<Id>,
    pub organization_id: Option<Id>,
    /// Display name of the backing person or organization; output only
    #[serde(default, skip_deserializing)]
    pub name: Option<String>,
    pub lessee_type: Option<String>,
    pub note: Option<String>,
}

impl From<LeaseTenant> for LeaseTenantDto {
    fn from(tenant: LeaseTenant) -> Self {
        let (person_id, organization_id) = match tenant.party {
            TenantParty::Person { person_id } => (Some(person_id), None),
            TenantParty::Organization { organization_id } => (None, Some(organization_id)),
        };
        Self {
            id: tenant.id,
            person_id,
            organization_id,
            name: None,
            lessee_type: tenant.lessee_type,
            note: tenant.note,
        }
    }
}

impl TryFrom<LeaseTenantDto> for LeaseTenant {
    type Error = PimsError;

    fn try_from(dto: LeaseTenantDto) -> PimsResult<Self> {
        let party = match (dto.person_id, dto.organization_id) {
            (Some(person_id), None) => TenantParty::Person { person_id },
            (None, Some(organization_id)) => TenantParty::Organization { organization_id },
            _ => {
                return Err(PimsError::validation(
                    "A lease tenant must reference exactly one of a person or an organization",
                ))
            }
        };
        Ok(Self {
            id: dto.id,
            party,
            lessee_type: dto.lessee_type,
            note: dto.note,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyLeaseDto {
    #[serde(default)]
    pub id: Id,
    #[serde(default)]
    pub property_id: Id,
    pub pid: Option<i32>,
    pub pin: Option<i32>,
    pub lease_area: Option<f64>,
    pub area_unit: Option<String>,
}

impl From<PropertyLease> for PropertyLeaseDto {
    fn from(link: PropertyLease) -> Self {
        Self {
            id: link.id,
            property_id: link.property_id,
            pid: link.pid,
            pin: link.pin,
            lease_area: link.lease_area,
            area_unit: link.area_unit,
        }
    }
}

impl From<PropertyLeaseDto> for PropertyLease {
    fn from(dto: PropertyLeaseDto) -> Self {
        Self {
            id: dto.id,
            property_id: dto.property_id,
            pid: dto.pid,
            pin: dto.pin,
            lease_area: dto.lease_area,
            area_unit: dto.area_unit,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovementDto {
    #[serde(default)]
    pub id: Id,
    pub improvement_type: String,
    pub description: Option<String>,
    pub structure_size: Option<String>,
    pub address: Option<String>,
}

impl From<PropertyImprovement> for ImprovementDto {
    fn from(improvement: PropertyImprovement) -> Self {
        Self {
            id: improvement.id,
            improvement_type: improvement.improvement_type,
            description: improvement.description,
            structure_size: improvement.structure_size,
            address: improvement.address,
        }
    }
}

impl From<ImprovementDto> for PropertyImprovement {
    fn from(dto: ImprovementDto) -> Self {
        Self {
            id: dto.id,
            improvement_type: dto.improvement_type,
            description: dto.description,
            structure_size: dto.structure_size,
            address: dto.address,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsuranceDto {
    #[serde(default)]
    pub id: Id,
    pub insurance_type: String,
    pub other_insurance_type: Option<String>,
    pub coverage_description: Option<String>,
    pub coverage_limit: Option<f64>,
    pub expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_insurance_in_place: bool,
}

impl From<Insurance> for InsuranceDto {
    fn from(insurance: Insurance) -> Self {
        Self {
            id: insurance.id,
            insurance_type: insurance.insurance_type,
            other_insurance_type: insurance.other_insurance_type,
            coverage_description: insurance.coverage_description,
            coverage_limit: insurance.coverage_limit,
            expiry_date: insurance.expiry_date,
            is_insurance_in_place: insurance.is_insurance_in_place,
        }
    }
}

impl From<InsuranceDto> for Insurance {
    fn from(dto: InsuranceDto) -> Self {
        Self {
            id: dto.id,
            insurance_type: dto.insurance_type,
            other_insurance_type: dto.other_insurance_type,
            coverage_description: dto.coverage_description,
            coverage_limit: dto.coverage_limit,
            expiry_date: dto.expiry_date,
            is_insurance_in_place: dto.is_insurance_in_place,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeasePaymentDto {
    #[serde(default)]
    pub id: Id,
    pub received_date: NaiveDate,
    pub amount_total: f64,
    pub amount_gst: Option<f64>,
    pub payment_method: String,
    pub note: Option<String>,
}

impl From<LeasePayment> for LeasePaymentDto {
    fn from(payment: LeasePayment) -> Self {
        Self {
            id: payment.id,
            received_date: payment.received_date,
            amount_total: payment.amount_total,
            amount_gst: payment.amount_gst,
            payment_method: payment.payment_method,
            note: payment.note,
        }
    }
}

impl From<LeasePaymentDto> for LeasePayment {
    fn from(dto: LeasePaymentDto) -> Self {
        Self {
            id: dto.id,
            received_date: dto.received_date,
            amount_total: dto.amount_total,
            amount_gst: dto.amount_gst,
            payment_method: dto.payment_method,
            note: dto.note,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseTermDto {
    #[serde(default)]
    pub id: Id,
    pub start_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub payment_amount: Option<f64>,
    pub status: String,
    #[serde(default)]
    pub is_term_exercised: bool,
    #[serde(default)]
    pub payments: Vec<LeasePaymentDto>,
}

impl From<LeaseTerm> for LeaseTermDto {
    fn from(term: LeaseTerm) -> Self {
        Self {
            id: term.id,
            start_date: term.start_date,
            expiry_date: term.expiry_date,
            payment_amount: term.payment_amount,
            status: term.status,
            is_term_exercised: term.is_term_exercised,
            payments: term.payments.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<LeaseTermDto> for LeaseTerm {
    fn from(dto: LeaseTermDto) -> Self {
        Self {
            id: dto.id,
            start_date: dto.start_date,
            expiry_date: dto.expiry_date,
            payment_amount: dto.payment_amount,
            status: dto.status,
            is_term_exercised: dto.is_term_exercised,
            payments: dto.payments.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseDto {
    #[serde(default)]
    pub id: Id,
    #[serde(default)]
    pub l_file_no: String,
    pub purpose: Option<String>,
    pub status: String,
    pub payment_frequency: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub amount: Option<f64>,
    pub note: Option<String>,
    #[serde(default)]
    pub tenants: Vec<LeaseTenantDto>,
    #[serde(default)]
    pub properties: Vec<PropertyLeaseDto>,
    #[serde(default)]
    pub improvements: Vec<ImprovementDto>,
    #[serde(default)]
    pub insurances: Vec<InsuranceDto>,
    #[serde(default)]
    pub terms: Vec<LeaseTermDto>,
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

impl From<Lease> for LeaseDto {
    fn from(lease: Lease) -> Self {
        Self {
            id: lease.id,
            l_file_no: lease.l_file_no,
            purpose: lease.purpose,
            status: lease.status,
            payment_frequency: lease.payment_frequency,
            start_date: lease.start_date,
            expiry_date: lease.expiry_date,
            amount: lease.amount,
            note: lease.note,
            tenants: lease.tenants.into_iter().map(Into::into).collect(),
            properties: lease.properties.into_iter().map(Into::into).collect(),
            improvements: lease.improvements.into_iter().map(Into::into).collect(),
            insurances: lease.insurances.into_iter().map(Into::into).collect(),
            terms: lease.terms.into_iter().map(Into::into).collect(),
            created_by: lease.created_by,
            created_at: Some(lease.created_at),
            updated_by: lease.updated_by,
            updated_at: Some(lease.updated_at),
            row_version: Some(lease.row_version),
        }
    }
}

impl TryFrom<LeaseDto> for Lease {
    type Error = PimsError;

    fn try_from(dto: LeaseDto) -> PimsResult<Self> {
        let now = Utc::now();
        Ok(Self {
            id: dto.id,
            l_file_no: dto.l_file_no,
            purpose: dto.purpose,
            status: dto.status,
            payment_frequency: dto.payment_frequency,
            start_date: dto.start_date,
            expiry_date: dto.expiry_date,
            amount: dto.amount,
            note: dto.note,
            tenants: tenants_into_model(dto.tenants)?,
            properties: dto.properties.into_iter().map(Into::into).collect(),
            improvements: dto.improvements.into_iter().map(Into::into).collect(),
            insurances: dto.insurances.into_iter().map(Into::into).collect(),
            terms: dto.terms.into_iter().map(Into::into).collect(),
            created_by: String::new(),
            created_at: now,
            updated_by: String::new(),
            updated_at: now,
            row_version: dto.row_version.unwrap_or_default(),
        })
    }
}

pub fn tenants_into_model(tenants: Vec<LeaseTenantDto>) -> PimsResult<Vec<LeaseTenant>> {
    tenants.into_iter().map(LeaseTenant::try_from).collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseTenantsDto {
    pub row_version: Option<RowVersion>,
    pub tenants: Vec<LeaseTenantDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseImprovementsDto {
    pub row_version: Option<RowVersion>,
    pub improvements: Vec<ImprovementDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseInsurancesDto {
    pub row_version: Option<RowVersion>,
    pub insurances: Vec<InsuranceDto>,
}

/// `GET /leases` query string
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseQuery {
    pub page: Option<i64>,
    pub quantity: Option<i64>,
    pub l_file_no: Option<String>,
    pub status: Option<String>,
    pub tenant_name: Option<String>,
    pub pid: Option<String>,
}

impl LeaseQuery {
    pub fn into_parts(self) -> (LeaseFilter, PageRequest) {
        let page = super::PageQuery {
            page: self.page,
            quantity: self.quantity,
            name: None,
        }
        .request();
        let filter = LeaseFilter {
            l_file_no: self.l_file_no,
            status: self.status,
            tenant_name: self.tenant_name,
            pid: self.pid,
        };
        (filter, page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant(person_id: Option<Id>, organization_id: Option<Id>) -> LeaseTenantDto {
        LeaseTenantDto {
            id: 0,
            person_id,
            organization_id,
            name: None,
            lessee_type: None,
            note: None,
        }
    }

    #[test]
    fn tenant_needs_exactly_one_party() {
        assert!(LeaseTenant::try_from(tenant(Some(1), None)).is_ok());
        assert!(LeaseTenant::try_from(tenant(None, Some(2))).is_ok());
        assert!(matches!(
            LeaseTenant::try_from(tenant(Some(1), Some(2))),
            Err(PimsError::Validation(_))
        ));
        assert!(matches!(
            LeaseTenant::try_from(tenant(None, None)),
            Err(PimsError::Validation(_))
        ));
    }

    #[test]
    fn organization_tenant_maps_back_to_organization_id() {
        let model = LeaseTenant {
            id: 4,
            party: TenantParty::Organization { organization_id: 9 },
            lessee_type: Some("ORG".to_string()),
            note: None,
        };
        let dto = LeaseTenantDto::from(model);
        assert_eq!(dto.organization_id, Some(9));
        assert_eq!(dto.person_id, None);
    }
}
