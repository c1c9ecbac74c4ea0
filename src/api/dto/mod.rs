//! Wire shapes. Every body is camelCase; conversions to and from the domain
//! model are written out by hand.

pub mod activity;
pub mod admin;
pub mod document;
pub mod lease;
pub mod property;
pub mod research_file;

pub use activity::*;
pub use admin::*;
pub use document::*;
pub use lease::*;
pub use property::*;
pub use research_file::*;

use serde::{Deserialize, Serialize};

use crate::error::PimsResult;
use crate::logic::concurrency::require_token;
use crate::model::{Id, PageRequest, Paged, ParentConcurrencyGuard, RowVersion};

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub quantity: Option<i64>,
    pub name: Option<String>,
}

impl PageQuery {
    pub fn request(&self) -> PageRequest {
        let default = PageRequest::default();
        PageRequest::clamped(
            self.page.unwrap_or(default.page()),
            self.quantity.unwrap_or(default.quantity()),
        )
    }
}

#[derive(Debug, Serialize)]
pub struct PageDto<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub quantity: i64,
    pub total: i64,
}

impl<T> PageDto<T> {
    pub fn from_page<M>(page: Paged<M>, convert: impl FnMut(M) -> T) -> Self {
        let page = page.map(convert);
        Self {
            items: page.items,
            page: page.page,
            quantity: page.quantity,
            total: page.total,
        }
    }
}

/// Body of version-checked deletes
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowVersionDto {
    pub row_version: Option<RowVersion>,
}

impl RowVersionDto {
    /// The submitted token; a delete without one is rejected.
    pub fn token(&self) -> PimsResult<RowVersion> {
        require_token(self.row_version)
    }
}

/// Body of a child record edited on its own under its parent's version
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentGuardDto<T> {
    pub payload: T,
    pub parent_id: Id,
    pub parent_row_version: Option<RowVersion>,
}

/// Convert the payload of a guarded child edit, keeping the parent token.
pub fn guard_into_model<T, U>(
    guard: ParentGuardDto<T>,
    convert: impl FnOnce(T) -> PimsResult<U>,
) -> PimsResult<ParentConcurrencyGuard<U>> {
    let parent_row_version = require_token(guard.parent_row_version)?;
    Ok(ParentConcurrencyGuard {
        payload: convert(guard.payload)?,
        parent_id: guard.parent_id,
        parent_row_version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_query_defaults_and_clamps() {
        let query = PageQuery::default();
        assert_eq!(query.request(), PageRequest::clamped(1, 10));

        let query = PageQuery {
            page: Some(0),
            quantity: Some(51),
            name: None,
        };
        assert_eq!(query.request().page(), 1);
        assert_eq!(query.request().quantity(), 50);
    }

    #[test]
    fn delete_body_needs_a_token() {
        let body: RowVersionDto = serde_json::from_str("{}").unwrap();
        assert!(body.token().is_err());
        let body: RowVersionDto = serde_json::from_str(r#"{"rowVersion":3}"#).unwrap();
        assert_eq!(body.token().unwrap(), 3);
    }

    #[test]
    fn guarded_edit_needs_the_parent_token() {
        let guard: ParentGuardDto<i64> =
            serde_json::from_str(r#"{"payload":7,"parentId":4}"#).unwrap();
        assert!(matches!(
            guard_into_model(guard, Ok),
            Err(crate::error::PimsError::Validation(_))
        ));

        let guard: ParentGuardDto<i64> =
            serde_json::from_str(r#"{"payload":7,"parentId":4,"parentRowVersion":2}"#).unwrap();
        let guard = guard_into_model(guard, |v| Ok(v * 2)).unwrap();
        assert_eq!(guard.payload, 14);
        assert_eq!(guard.parent_row_version, 2);
    }
}
