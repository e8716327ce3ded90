//! Catalog model and service layer.

pub mod book;
pub mod service;

pub use book::{Book, NewBook};
pub use service::{BookService, BookStore, CatalogService};
