use crate::model::{assign_child_ids, ChildRecord, Id, RowVersion, Versioned};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lease {
    pub id: Id,
    /// `L-<id>`, assigned on insert
    pub l_file_no: String,
    pub purpose: Option<String>,
    pub status: String,
    pub payment_frequency: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub amount: Option<f64>,
    pub note: Option<String>,
    pub tenants: Vec<LeaseTenant>,
    pub properties: Vec<PropertyLease>,
    pub improvements: Vec<PropertyImprovement>,
    pub insurances: Vec<Insurance>,
    pub terms: Vec<LeaseTerm>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
    pub row_version: RowVersion,
}

impl Versioned for Lease {
    fn row_version(&self) -> RowVersion {
        self.row_version
    }

    fn set_row_version(&mut self, version: RowVersion) {
        self.row_version = version;
    }
}

/// Who a lease tenant is: backed by either a person or an organization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TenantParty {
    Person { person_id: Id },
    Organization { organization_id: Id },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaseTenant {
    pub id: Id,
    pub party: TenantParty,
    pub lessee_type: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyLease {
    pub id: Id,
    pub property_id: Id,
    pub pid: Option<i32>,
    pub pin: Option<i32>,
    pub lease_area: Option<f64>,
    pub area_unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyImprovement {
    pub id: Id,
    pub improvement_type: String,
    pub description: Option<String>,
    pub structure_size: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insurance {
    pub id: Id,
    pub insurance_type: String,
    pub other_insurance_type: Option<String>,
    pub coverage_description: Option<String>,
    pub coverage_limit: Option<f64>,
    pub expiry_date: Option<NaiveDate>,
    pub is_insurance_in_place: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaseTerm {
    pub id: Id,
    pub start_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub payment_amount: Option<f64>,
    pub status: String,
    pub is_term_exercised: bool,
    pub payments: Vec<LeasePayment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeasePayment {
    pub id: Id,
    pub received_date: NaiveDate,
    pub amount_total: f64,
    pub amount_gst: Option<f64>,
    pub payment_method: String,
    pub note: Option<String>,
}

/// One of the child collections owned by a lease. Each is replaced
/// wholesale under the lease's row version.
#[derive(Debug, Clone, PartialEq)]
pub enum LeaseCollection {
    Tenants(Vec<LeaseTenant>),
    Properties(Vec<PropertyLease>),
    Improvements(Vec<PropertyImprovement>),
    Insurances(Vec<Insurance>),
    Terms(Vec<LeaseTerm>),
}

impl LeaseCollection {
    pub fn name(&self) -> &'static str {
        match self {
            LeaseCollection::Tenants(_) => "tenants",
            LeaseCollection::Properties(_) => "properties",
            LeaseCollection::Improvements(_) => "improvements",
            LeaseCollection::Insurances(_) => "insurances",
            LeaseCollection::Terms(_) => "terms",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            LeaseCollection::Tenants(v) => v.len(),
            LeaseCollection::Properties(v) => v.len(),
            LeaseCollection::Improvements(v) => v.len(),
            LeaseCollection::Insurances(v) => v.len(),
            LeaseCollection::Terms(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of records (including nested payments) still without an id
    pub fn unsaved_count(&self) -> usize {
        fn count<T: ChildRecord>(items: &[T]) -> usize {
            items.iter().filter(|c| c.child_id() <= 0).count()
        }
        match self {
            LeaseCollection::Tenants(v) => count(v),
            LeaseCollection::Properties(v) => count(v),
            LeaseCollection::Improvements(v) => count(v),
            LeaseCollection::Insurances(v) => count(v),
            LeaseCollection::Terms(v) => {
                count(v) + v.iter().map(|t| count(&t.payments)).sum::<usize>()
            }
        }
    }

    pub fn assign_ids<F: FnMut() -> Id>(&mut self, next_id: &mut F) {
        match self {
            LeaseCollection::Tenants(v) => {
                assign_child_ids(v, next_id);
            }
            LeaseCollection::Properties(v) => {
                assign_child_ids(v, next_id);
            }
            LeaseCollection::Improvements(v) => {
                assign_child_ids(v, next_id);
            }
            LeaseCollection::Insurances(v) => {
                assign_child_ids(v, next_id);
            }
            LeaseCollection::Terms(v) => {
                assign_child_ids(v, next_id);
                for term in v.iter_mut() {
                    assign_child_ids(&mut term.payments, next_id);
                }
            }
        }
    }

    /// Install this collection on a lease, replacing what was there.
    pub fn apply_to(self, lease: &mut Lease) {
        match self {
            LeaseCollection::Tenants(v) => lease.tenants = v,
            LeaseCollection::Properties(v) => lease.properties = v,
            LeaseCollection::Improvements(v) => lease.improvements = v,
            LeaseCollection::Insurances(v) => lease.insurances = v,
            LeaseCollection::Terms(v) => lease.terms = v,
        }
    }
}

/// Lookup record for a person-backed tenant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: Id,
    pub first_name: String,
    pub surname: String,
}

impl Person {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.surname)
    }
}

/// Lookup record for an organization-backed tenant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: Id,
    pub name: String,
}

macro_rules! child_record {
    ($($ty:ty),*) => {
        $(impl ChildRecord for $ty {
            fn child_id(&self) -> Id {
                self.id
            }

            fn id_mut(&mut self) -> &mut Id {
                &mut self.id
            }
        })*
    };
}

child_record!(
    LeaseTenant,
    PropertyLease,
    PropertyImprovement,
    Insurance,
    LeaseTerm,
    LeasePayment
);
