use crate::model::{Id, RowVersion, Versioned};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: Id,
    /// Parcel identifier from the land title registry
    pub pid: Option<i32>,
    /// Parcel identifier for untitled crown land
    pub pin: Option<i32>,
    pub address: Option<String>,
    pub legal_description: Option<String>,
    pub land_area: Option<f64>,
    pub area_unit: Option<String>,
    pub is_sensitive: bool,
    pub row_version: RowVersion,
}

impl Property {
    /// Bare property identified only by PID/PIN, used when a file references
    /// a parcel that is not yet in the inventory.
    pub fn from_identifiers(pid: Option<i32>, pin: Option<i32>) -> Self {
        Self {
            id: 0,
            pid,
            pin,
            address: None,
            legal_description: None,
            land_area: None,
            area_unit: None,
            is_sensitive: false,
            row_version: 0,
        }
    }
}

/// A file's reference to a parcel. A link with no property id names a
/// parcel the store adds to the inventory when the file is written.
pub trait ParcelLink {
    fn property_id(&self) -> Id;
    fn pid(&self) -> Option<i32>;
    fn pin(&self) -> Option<i32>;
    fn link_to(&mut self, property: &Property);

    fn is_linked(&self) -> bool {
        self.property_id() > 0
    }
}

macro_rules! parcel_link {
    ($($ty:ty),*) => {
        $(impl ParcelLink for $ty {
            fn property_id(&self) -> Id {
                self.property_id
            }

            fn pid(&self) -> Option<i32> {
                self.pid
            }

            fn pin(&self) -> Option<i32> {
                self.pin
            }

            fn link_to(&mut self, property: &Property) {
                self.property_id = property.id;
                self.pid = property.pid;
                self.pin = property.pin;
            }
        })*
    };
}

parcel_link!(crate::model::PropertyLease, crate::model::PropertyResearchFile);

impl Versioned for Property {
    fn row_version(&self) -> RowVersion {
        self.row_version
    }

    fn set_row_version(&mut self, version: RowVersion) {
        self.row_version = version;
    }
}

/// Files that reference a property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyAssociations {
    pub id: Id,
    pub pid: Option<i32>,
    pub leases: Vec<AssociationSummary>,
    pub research_files: Vec<AssociationSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationSummary {
    pub id: Id,
    pub file_number: String,
    pub file_name: Option<String>,
    pub status: String,
    pub created_by: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
