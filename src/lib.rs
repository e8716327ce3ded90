//! bookshelf-rs: a small library catalog REST server.
//!
//! Books are listed and read anonymously over JSON. Creating a book needs
//! HTTP basic-auth credentials holding the `USER` role, deleting one needs
//! `ADMIN`.
//!
//! # Routes
//!
//! - `GET /api/books/`
//! - `GET /api/books/{id}`
//! - `POST /api/books/` (`USER`)
//! - `DELETE /api/books/{id}` (`ADMIN`)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Authentication and authorization.
pub mod auth;
/// Configuration and CLI.
pub mod config;
/// Database operations.
pub mod db;
/// Error types.
pub mod error;
/// Book model and catalog service.
pub mod library;
/// HTTP server.
pub mod server;


pub use config::{Cli, Command, Config};
pub use db::Database;
pub use error::{AppError, Result};
pub use server::AppState;
