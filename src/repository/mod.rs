//! One repository per aggregate root. A repository is built per request
//! around the acting user; every operation checks that user's capability
//! before touching the store.

pub mod activity;
pub mod claim;
pub mod document;
pub mod lease;
pub mod property;
pub mod research_file;
pub mod role;
pub mod tenant;

pub use activity::ActivityRepository;
pub use claim::ClaimRepository;
pub use document::DocumentRepository;
pub use lease::LeaseRepository;
pub use property::PropertyRepository;
pub use research_file::ResearchFileRepository;
pub use role::RoleRepository;
pub use tenant::TenantRepository;

use crate::config::AuthConfig;
use crate::model::UserContext;

/// What every repository needs: the store, the caller and the identity
/// client used to recognise service accounts.
pub struct RepositoryScope<'a, S> {
    pub store: &'a S,
    pub user: &'a UserContext,
    pub auth: &'a AuthConfig,
}

impl<'a, S> RepositoryScope<'a, S> {
    pub fn new(store: &'a S, user: &'a UserContext, auth: &'a AuthConfig) -> Self {
        Self { store, user, auth }
    }
}

impl<S> Clone for RepositoryScope<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for RepositoryScope<'_, S> {}
