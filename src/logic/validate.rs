//! Business rules checked before a write reaches the store.

use crate::error::{PimsError, PimsResult};
use crate::model::{
    Insurance, LeaseTenant, LeaseTerm, PropertyResearchFile, ResearchFile, Role, TenantParty,
    MAX_PID,
};
use itertools::Itertools;
use std::collections::HashSet;

pub fn validate_role(role: &Role) -> PimsResult<()> {
    if role.name.trim().is_empty() {
        return Err(PimsError::validation("Role name is required"));
    }
    Ok(())
}

pub fn validate_research_file(file: &ResearchFile) -> PimsResult<()> {
    if file.name.trim().is_empty() {
        return Err(PimsError::validation("Research file name is required"));
    }
    if let (Some(request), Some(result)) = (file.request_date, file.result_date) {
        if result < request {
            return Err(PimsError::validation(
                "Research completed date cannot precede the request date",
            ));
        }
    }
    validate_research_properties(&file.properties)
}

pub fn validate_research_properties(properties: &[PropertyResearchFile]) -> PimsResult<()> {
    if let Some(missing) = properties.iter().find(|p| p.pid.is_none() && p.pin.is_none() && p.property_id == 0) {
        return Err(PimsError::validation(format!(
            "Property '{}' must have a PID or PIN",
            missing.property_name.as_deref().unwrap_or("unnamed")
        )));
    }
    Ok(())
}

/// PIDs have at most nine digits; neither identifier may be negative.
pub fn validate_parcel_ids(pid: Option<i32>, pin: Option<i32>) -> PimsResult<()> {
    if let Some(pid) = pid.filter(|p| !(0..=MAX_PID).contains(p)) {
        return Err(PimsError::validation(format!("'{}' is not a valid PID", pid)));
    }
    if let Some(pin) = pin.filter(|p| *p < 0) {
        return Err(PimsError::validation(format!("'{}' is not a valid PIN", pin)));
    }
    Ok(())
}

/// A party may appear on a lease only once.
pub fn validate_lease_tenants(tenants: &[LeaseTenant]) -> PimsResult<()> {
    let mut seen = HashSet::new();
    let duplicates = tenants
        .iter()
        .filter(|t| !seen.insert(t.party.clone()))
        .map(|t| match &t.party {
            TenantParty::Person { person_id } => format!("person {}", person_id),
            TenantParty::Organization { organization_id } => {
                format!("organization {}", organization_id)
            }
        })
        .collect::<Vec<_>>();
    if !duplicates.is_empty() {
        return Err(PimsError::validation(format!(
            "Duplicate lease tenants: {}",
            duplicates.iter().join(", ")
        )));
    }
    Ok(())
}

pub fn validate_term(term: &LeaseTerm) -> PimsResult<()> {
    if let Some(expiry) = term.expiry_date {
        if expiry < term.start_date {
            return Err(PimsError::validation("Term expiry date must not precede its start date"));
        }
    }
    if term.payment_amount.map_or(false, |a| a < 0.0) {
        return Err(PimsError::validation("Term payment amount cannot be negative"));
    }
    if term.payments.iter().any(|p| p.amount_total < 0.0) {
        return Err(PimsError::validation("Payment amount cannot be negative"));
    }
    Ok(())
}

pub fn validate_insurances(insurances: &[Insurance]) -> PimsResult<()> {
    let mut seen = HashSet::new();
    for insurance in insurances {
        if !seen.insert(insurance.insurance_type.as_str()) {
            return Err(PimsError::validation(format!(
                "Insurance type '{}' appears more than once",
                insurance.insurance_type
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn parcel_ids_are_limited_to_nine_digits() {
        assert!(validate_parcel_ids(Some(999_999_999), Some(0)).is_ok());
        assert!(validate_parcel_ids(None, None).is_ok());
        assert!(matches!(
            validate_parcel_ids(Some(1_000_000_000), None),
            Err(PimsError::Validation(_))
        ));
        assert!(validate_parcel_ids(Some(-1), None).is_err());
        assert!(validate_parcel_ids(None, Some(-5)).is_err());
    }

    fn tenant(party: TenantParty) -> LeaseTenant {
        LeaseTenant {
            id: 0,
            party,
            lessee_type: None,
            note: None,
        }
    }

    #[test]
    fn duplicate_party_is_rejected() {
        let tenants = vec![
            tenant(TenantParty::Person { person_id: 1 }),
            tenant(TenantParty::Organization { organization_id: 1 }),
            tenant(TenantParty::Person { person_id: 1 }),
        ];
        let err = validate_lease_tenants(&tenants).unwrap_err();
        assert!(err.to_string().contains("person 1"));
        assert!(validate_lease_tenants(&tenants[..2]).is_ok());
    }

    #[test]
    fn term_dates_must_be_ordered() {
        let term = LeaseTerm {
            id: 0,
            start_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            expiry_date: NaiveDate::from_ymd_opt(2024, 4, 1),
            payment_amount: None,
            status: "ACTIVE".to_string(),
            is_term_exercised: false,
            payments: vec![],
        };
        assert!(validate_term(&term).is_err());
    }
}
