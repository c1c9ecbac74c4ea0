//! Optimistic concurrency on row version tokens.
//!
//! A writer must echo the token from its last read. The stored token is
//! compared with the submitted one; on a match the write proceeds and the
//! token advances by one, otherwise the write is refused and nothing changes.
//! Child collections are never versioned on their own: they are replaced
//! wholesale under the parent's token, and the parent's token advances.

use crate::error::{PimsError, PimsResult};
use crate::model::{RowVersion, Versioned, WriteOutcome, INITIAL_ROW_VERSION};

/// Updates and deletes must carry a token. Creates never need one.
pub fn require_token(submitted: Option<RowVersion>) -> PimsResult<RowVersion> {
    submitted.ok_or_else(|| PimsError::validation("rowVersion is required for updates and deletes"))
}

/// Compare a stored token with a submitted one. On success the next token
/// is returned.
pub fn check_version(stored: Option<RowVersion>, submitted: RowVersion) -> WriteOutcome<RowVersion> {
    match stored {
        None => WriteOutcome::NotFound,
        Some(current) if current != submitted => WriteOutcome::Conflict { submitted, current },
        Some(current) => WriteOutcome::Written(current + 1),
    }
}

/// Stamp a freshly created record, ignoring whatever token the caller sent.
pub fn stamp_new<T: Versioned>(record: &mut T) {
    record.set_row_version(INITIAL_ROW_VERSION);
}

/// Overwrite `current` with `updated` if the token matches.
pub fn apply_update<T: Versioned>(
    current: Option<&T>,
    submitted: RowVersion,
    mut updated: T,
) -> WriteOutcome<T> {
    check_version(current.map(Versioned::row_version), submitted).map(|next| {
        updated.set_row_version(next);
        updated
    })
}

/// Replace a child collection of `parent` under the parent's token.
///
/// Concurrent edits to different children of the same parent conflict with
/// each other, since they share the one token.
pub fn replace_children<P, C, F>(
    parent: Option<&P>,
    submitted: RowVersion,
    children: C,
    install: F,
) -> WriteOutcome<P>
where
    P: Versioned + Clone,
    F: FnOnce(&mut P, C),
{
    let Some(parent) = parent else {
        return WriteOutcome::NotFound;
    };
    check_version(Some(parent.row_version()), submitted).map(|next| {
        let mut updated = parent.clone();
        install(&mut updated, children);
        updated.set_row_version(next);
        updated
    })
}

/// Version check for a delete; the caller removes the record on `Written`.
pub fn check_delete<T: Versioned>(current: Option<&T>, submitted: RowVersion) -> WriteOutcome<()> {
    check_version(current.map(Versioned::row_version), submitted).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Parent {
        version: RowVersion,
        children: Vec<&'static str>,
    }

    impl Versioned for Parent {
        fn row_version(&self) -> RowVersion {
            self.version
        }
        fn set_row_version(&mut self, version: RowVersion) {
            self.version = version;
        }
    }

    fn parent(version: RowVersion) -> Parent {
        Parent {
            version,
            children: vec!["a"],
        }
    }

    #[test]
    fn matching_token_advances() {
        let current = parent(4);
        let outcome = apply_update(Some(&current), 4, parent(0));
        match outcome {
            WriteOutcome::Written(updated) => {
                assert_eq!(updated.version, 5);
                assert_ne!(updated.version, current.version);
            }
            other => panic!("expected write, got {:?}", other),
        }
    }

    #[test]
    fn stale_token_conflicts() {
        let current = parent(4);
        assert_eq!(
            apply_update(Some(&current), 3, parent(0)),
            WriteOutcome::Conflict {
                submitted: 3,
                current: 4
            }
        );
        // Zero is an ordinary stale value on update
        assert!(matches!(
            apply_update(Some(&current), 0, parent(0)),
            WriteOutcome::Conflict { .. }
        ));
    }

    #[test]
    fn absent_record_is_not_found() {
        assert_eq!(apply_update::<Parent>(None, 1, parent(0)), WriteOutcome::NotFound);
        assert_eq!(check_delete::<Parent>(None, 1), WriteOutcome::NotFound);
    }

    #[test]
    fn missing_token_is_a_validation_error() {
        assert!(matches!(require_token(None), Err(PimsError::Validation(_))));
        assert_eq!(require_token(Some(0)).unwrap(), 0);
    }

    #[test]
    fn children_replace_wholesale_under_parent_token() {
        let current = parent(2);
        let outcome = replace_children(Some(&current), 2, vec!["x", "y"], |p, c| p.children = c);
        match outcome {
            WriteOutcome::Written(updated) => {
                assert_eq!(updated.children, vec!["x", "y"]);
                assert_eq!(updated.version, 3);
            }
            other => panic!("expected write, got {:?}", other),
        }
        // original snapshot is untouched
        assert_eq!(current.children, vec!["a"]);
    }

    #[test]
    fn stale_child_replace_leaves_parent_unchanged() {
        let current = parent(2);
        let outcome = replace_children(Some(&current), 1, vec!["x"], |p, c| p.children = c);
        assert!(matches!(outcome, WriteOutcome::Conflict { current: 2, .. }));
        assert_eq!(current, parent(2));
    }

    #[test]
    fn create_ignores_submitted_token() {
        let mut fresh = parent(99);
        stamp_new(&mut fresh);
        assert_eq!(fresh.version, INITIAL_ROW_VERSION);
    }
}
