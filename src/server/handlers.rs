//! HTTP request handlers.

use crate::error::{AppError, Result};
use crate::library::book::{Book, NewBook};
use crate::server::AppState;
use crate::server::extract::{AdminRole, Authorized, UserRole};
use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};

/// List all books.
pub async fn list_books(State(state): State<AppState>) -> Result<Json<Vec<Book>>> {
    let books = state.books.find_all()?;
    Ok(Json(books))
}

/// Get one book.
pub async fn get_book(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Book>> {
    let book = state
        .books
        .find_by_id(id)?
        .ok_or_else(|| AppError::NotFound(format!("Book not found: {}", id)))?;

    Ok(Json(book))
}

/// Create a book. Requires `USER`.
pub async fn create_book(
    State(state): State<AppState>,
    caller: Authorized<UserRole>,
    Json(book): Json<NewBook>,
) -> Result<impl IntoResponse> {
    let book = state.books.save(book)?;
    tracing::debug!(id = book.id, user = %caller.principal.username, "Created book");

    let location = format!("/api/books/{}", book.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(book)))
}

/// Delete a book. Requires `ADMIN`; succeeds whether or not the book existed.
pub async fn delete_book(
    State(state): State<AppState>,
    caller: Authorized<AdminRole>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let existed = state.books.delete(id)?;
    tracing::debug!(id, existed, user = %caller.principal.username, "Delete book");

    Ok(StatusCode::OK)
}
