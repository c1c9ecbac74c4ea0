use crate::model::{Lease, Property, ResearchFile};
use serde::{Deserialize, Serialize};

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn blank_to_none(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Case-insensitive substring match used for `name` filters
pub fn name_matches(name: &str, filter: Option<&str>) -> bool {
    match filter.map(str::trim).filter(|f| !f.is_empty()) {
        Some(f) => contains_ci(name, f),
        None => true,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchFileFilter {
    pub name: Option<String>,
    pub file_number: Option<String>,
    pub status: Option<String>,
    pub road_or_alias: Option<String>,
}

impl ResearchFileFilter {
    pub fn matches(&self, file: &ResearchFile) -> bool {
        if let Some(name) = blank_to_none(&self.name) {
            if !contains_ci(&file.name, name) {
                return false;
            }
        }
        if let Some(number) = blank_to_none(&self.file_number) {
            if !contains_ci(&file.file_number, number) {
                return false;
            }
        }
        if let Some(status) = blank_to_none(&self.status) {
            if !file.status.as_str().eq_ignore_ascii_case(status) {
                return false;
            }
        }
        if let Some(road) = blank_to_none(&self.road_or_alias) {
            let on_name = file.road_name.as_deref().map_or(false, |r| contains_ci(r, road));
            let on_alias = file.road_alias.as_deref().map_or(false, |r| contains_ci(r, road));
            if !on_name && !on_alias {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseFilter {
    pub l_file_no: Option<String>,
    pub status: Option<String>,
    pub tenant_name: Option<String>,
    pub pid: Option<String>,
}

impl LeaseFilter {
    /// `tenant_names` are the display names of the lease's tenants, resolved
    /// by the caller.
    pub fn matches(&self, lease: &Lease, tenant_names: &[String]) -> bool {
        if let Some(number) = blank_to_none(&self.l_file_no) {
            if !contains_ci(&lease.l_file_no, number) {
                return false;
            }
        }
        if let Some(status) = blank_to_none(&self.status) {
            if !lease.status.eq_ignore_ascii_case(status) {
                return false;
            }
        }
        if let Some(tenant) = blank_to_none(&self.tenant_name) {
            if !tenant_names.iter().any(|n| contains_ci(n, tenant)) {
                return false;
            }
        }
        if let Some(pid) = self.pid_value() {
            if !lease.properties.iter().any(|p| p.pid == Some(pid)) {
                return false;
            }
        }
        true
    }

    pub fn pid_value(&self) -> Option<i32> {
        blank_to_none(&self.pid)
            .and_then(crate::model::normalize_pid)
            .and_then(|p| p.parse().ok())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyFilter {
    pub pid: Option<String>,
    pub pin: Option<i32>,
    pub address: Option<String>,
}

impl PropertyFilter {
    pub fn matches(&self, property: &Property) -> bool {
        if let Some(pid) = self.pid_value() {
            if property.pid != Some(pid) {
                return false;
            }
        }
        if let Some(pin) = self.pin {
            if property.pin != Some(pin) {
                return false;
            }
        }
        if let Some(address) = blank_to_none(&self.address) {
            if !property.address.as_deref().map_or(false, |a| contains_ci(a, address)) {
                return false;
            }
        }
        true
    }

    pub fn pid_value(&self) -> Option<i32> {
        blank_to_none(&self.pid)
            .and_then(crate::model::normalize_pid)
            .and_then(|p| p.parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_filter_is_case_insensitive_substring() {
        assert!(name_matches("Administrator", Some("admin")));
        assert!(name_matches("Administrator", Some("  ")));
        assert!(name_matches("Administrator", None));
        assert!(!name_matches("Viewer", Some("admin")));
    }

    #[test]
    fn property_filter_accepts_formatted_pid() {
        let mut property = crate::model::Property::from_identifiers(Some(1505360), None);
        property.address = Some("1818 Cornwall St".to_string());
        let filter = PropertyFilter {
            pid: Some("001-505-360".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&property));

        let filter = PropertyFilter {
            address: Some("cornwall".to_string()),
            pin: Some(8157500),
            ..Default::default()
        };
        assert!(!filter.matches(&property));
    }
}
