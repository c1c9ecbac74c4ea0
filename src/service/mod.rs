//! Operations spanning more than one repository or an external service.

pub mod document;
pub mod lease;
pub mod ltsa;
pub mod research_file;

pub use document::{DocumentService, DocumentUpdateResponse, DocumentUploadRequest, DocumentUploadResponse, MetadataValue};
pub use lease::LeaseService;
pub use ltsa::LtsaService;
pub use research_file::ResearchFileService;

use crate::error::{PimsError, PimsResult};
use crate::model::{Id, ParentConcurrencyGuard};

/// A guarded child edit must name the parent addressed by the route.
pub(crate) fn check_guard_parent<T>(guard: &ParentConcurrencyGuard<T>, parent_id: Id) -> PimsResult<()> {
    if guard.parent_id != parent_id {
        return Err(PimsError::validation(format!(
            "Parent id {} does not match the requested parent {}",
            guard.parent_id, parent_id
        )));
    }
    Ok(())
}
