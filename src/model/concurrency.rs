use crate::model::{Id, RowVersion};
use serde::{Deserialize, Serialize};

/// An aggregate that carries a row version token.
pub trait Versioned {
    fn row_version(&self) -> RowVersion;
    fn set_row_version(&mut self, version: RowVersion);
}

/// Result of a version-checked write. Conflicts are an expected outcome and
/// are returned as a value rather than an error.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome<T> {
    Written(T),
    Conflict {
        submitted: RowVersion,
        current: RowVersion,
    },
    NotFound,
}

impl<T> WriteOutcome<T> {
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> WriteOutcome<U> {
        match self {
            WriteOutcome::Written(value) => WriteOutcome::Written(f(value)),
            WriteOutcome::Conflict { submitted, current } => {
                WriteOutcome::Conflict { submitted, current }
            }
            WriteOutcome::NotFound => WriteOutcome::NotFound,
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, WriteOutcome::Written(_))
    }
}

/// A child record submitted on its own, guarded by the version of the
/// parent aggregate that owns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentConcurrencyGuard<T> {
    pub payload: T,
    pub parent_id: Id,
    pub parent_row_version: RowVersion,
}
