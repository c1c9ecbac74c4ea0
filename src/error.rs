use crate::external::http::HttpClientRequestError;
use crate::model::{Permission, RowVersion, WriteOutcome};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PimsError {
    #[error("{entity} '{key}' not found")]
    NotFound { entity: &'static str, key: String },

    #[error("{entity} was modified by another user (submitted version {submitted}, current version {current})")]
    Conflict {
        entity: &'static str,
        submitted: RowVersion,
        current: RowVersion,
    },

    #[error("missing required permission '{permission}'")]
    Forbidden { permission: Permission },

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Upstream(#[from] HttpClientRequestError),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type PimsResult<T> = Result<T, PimsError>;

impl PimsError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        PimsError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        PimsError::Validation(message.into())
    }
}

/// Turn a store write outcome into a value or a typed error.
pub fn resolve_outcome<T>(
    outcome: WriteOutcome<T>,
    entity: &'static str,
    key: impl ToString,
) -> PimsResult<T> {
    match outcome {
        WriteOutcome::Written(value) => Ok(value),
        WriteOutcome::Conflict { submitted, current } => {
            log::warn!(
                "Concurrency conflict on {} '{}': submitted {}, current {}",
                entity,
                key.to_string(),
                submitted,
                current
            );
            Err(PimsError::Conflict {
                entity,
                submitted,
                current,
            })
        }
        WriteOutcome::NotFound => Err(PimsError::not_found(entity, key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_outcome_distinguishes_conflict_from_not_found() {
        let conflict: WriteOutcome<()> = WriteOutcome::Conflict {
            submitted: 1,
            current: 3,
        };
        assert!(matches!(
            resolve_outcome(conflict, "lease", 7),
            Err(PimsError::Conflict { current: 3, .. })
        ));
        assert!(matches!(
            resolve_outcome(WriteOutcome::<()>::NotFound, "lease", 7),
            Err(PimsError::NotFound { .. })
        ));
        assert_eq!(resolve_outcome(WriteOutcome::Written(5), "lease", 7).unwrap(), 5);
    }
}
