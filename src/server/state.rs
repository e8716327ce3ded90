//! Application state shared across handlers.

use crate::auth::{AuthService, CredentialProvider};
use crate::db::Database;
use crate::library::service::{BookService, CatalogService};
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Catalog service.
    pub books: Arc<dyn BookService>,
    /// Credential check for basic auth.
    pub auth: Arc<dyn CredentialProvider>,
}

impl AppState {
    /// Create application state from explicit collaborators.
    pub fn new(books: Arc<dyn BookService>, auth: Arc<dyn CredentialProvider>) -> Self {
        Self { books, auth }
    }

    /// Create application state backed by the SQLite database.
    pub fn new_with_db(db: Database) -> Self {
        let books = Arc::new(CatalogService::new(db.clone()));
        let auth = Arc::new(AuthService::new(db));
        Self::new(books, auth)
    }
}
