//! Catalog service layer.
//!
//! Handlers talk to a [`BookService`]; the production [`CatalogService`]
//! forwards to any [`BookStore`], which is implemented by the SQLite
//! [`Database`](crate::db::Database).

use crate::error::Result;
use crate::library::book::{Book, NewBook};

/// Persistence capability for books.
pub trait BookStore: Send + Sync {
    /// All stored books.
    fn find_all(&self) -> Result<Vec<Book>>;

    /// Book with the given ID, if any.
    fn find_by_id(&self, id: i64) -> Result<Option<Book>>;

    /// Store a new book and assign its ID.
    fn insert(&self, book: &NewBook) -> Result<Book>;

    /// Remove a book. Returns whether a row existed.
    fn delete_by_id(&self, id: i64) -> Result<bool>;

    /// Number of stored books.
    fn count(&self) -> Result<i64>;
}

/// Operations the HTTP layer needs from the catalog.
#[cfg_attr(test, mockall::automock)]
pub trait BookService: Send + Sync {
    /// List every book.
    fn find_all(&self) -> Result<Vec<Book>>;

    /// Look up one book.
    fn find_by_id(&self, id: i64) -> Result<Option<Book>>;

    /// Persist a new book and return the stored representation.
    fn save(&self, book: NewBook) -> Result<Book>;

    /// Delete a book. Returns whether it existed.
    fn delete(&self, id: i64) -> Result<bool>;
}

/// Catalog service backed by a [`BookStore`].
pub struct CatalogService<S> {
    store: S,
}

impl<S: BookStore> CatalogService<S> {
    /// Create a new catalog service.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Insert the given books when the catalog is empty. Returns how many were added.
    pub fn seed(&self, books: &[NewBook]) -> Result<usize> {
        if self.store.count()? > 0 {
            return Ok(0);
        }

        for book in books {
            self.store.insert(book)?;
        }

        tracing::info!(books = books.len(), "Seeded catalog");
        Ok(books.len())
    }
}

impl<S: BookStore> BookService for CatalogService<S> {
    fn find_all(&self) -> Result<Vec<Book>> {
        self.store.find_all()
    }

    fn find_by_id(&self, id: i64) -> Result<Option<Book>> {
        self.store.find_by_id(id)
    }

    fn save(&self, book: NewBook) -> Result<Book> {
        book.validate()?;
        let stored = self.store.insert(&book)?;
        tracing::info!(id = stored.id, title = %stored.title, "Book created");
        Ok(stored)
    }

    fn delete(&self, id: i64) -> Result<bool> {
        let existed = self.store.delete_by_id(id)?;
        if existed {
            tracing::info!(id, "Book deleted");
        } else {
            tracing::debug!(id, "Delete requested for unknown book");
        }
        Ok(existed)
    }
}
