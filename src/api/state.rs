use std::sync::Arc;

use crate::config::AppConfig;
use crate::external::{DocumentStorageClient, LtsaClient};
use crate::model::UserContext;
use crate::repository::RepositoryScope;

/// Shared by every handler
pub struct AppState<S> {
    pub store: Arc<S>,
    pub config: Arc<AppConfig>,
    pub ltsa: Arc<dyn LtsaClient>,
    pub storage: Arc<dyn DocumentStorageClient>,
}

impl<S> AppState<S> {
    pub fn new(
        store: Arc<S>,
        config: AppConfig,
        ltsa: Arc<dyn LtsaClient>,
        storage: Arc<dyn DocumentStorageClient>,
    ) -> Self {
        Self {
            store,
            config: Arc::new(config),
            ltsa,
            storage,
        }
    }

    pub fn scope<'a>(&'a self, user: &'a UserContext) -> RepositoryScope<'a, S> {
        RepositoryScope::new(&*self.store, user, &self.config.auth)
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: Arc::clone(&self.config),
            ltsa: Arc::clone(&self.ltsa),
            storage: Arc::clone(&self.storage),
        }
    }
}
