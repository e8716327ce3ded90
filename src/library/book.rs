//! Book model.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Server-assigned identifier.
    pub id: i64,

    /// Book title.
    pub title: String,

    /// Book description or summary.
    pub description: String,
}

/// Payload for creating a book. Any `id` sent by the client is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    /// Book title.
    pub title: String,

    /// Book description or summary.
    pub description: String,
}

impl NewBook {
    /// Create a new book payload.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    /// Reject blank titles and descriptions.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::InvalidFormat("Title is required".to_string()));
        }
        if self.description.trim().is_empty() {
            return Err(AppError::InvalidFormat("Description is required".to_string()));
        }
        Ok(())
    }

    /// Attach the identifier assigned by the store.
    pub fn with_id(self, id: i64) -> Book {
        Book {
            id,
            title: self.title,
            description: self.description,
        }
    }
}
