//! Router tests against a mocked catalog service.

use crate::auth::{CredentialProvider, Principal, Role};
use crate::error::{AppError, Result};
use crate::library::book::{Book, NewBook};
use crate::library::service::MockBookService;
use crate::server::{AppState, create_router};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tower::ServiceExt;

/// Fixed accounts, no hashing.
struct StaticCredentials {
    accounts: HashMap<String, (String, Vec<Role>)>,
}

impl StaticCredentials {
    fn new() -> Self {
        let mut accounts = HashMap::new();
        accounts.insert("user".to_string(), ("pass".to_string(), vec![Role::User]));
        accounts.insert(
            "admin".to_string(),
            ("pass".to_string(), vec![Role::User, Role::Admin]),
        );
        Self { accounts }
    }
}

impl CredentialProvider for StaticCredentials {
    fn authenticate(&self, username: &str, password: &str) -> Result<Option<Principal>> {
        Ok(self
            .accounts
            .get(username)
            .filter(|(expected, _)| expected == password)
            .map(|(_, roles)| Principal::new(username, roles.iter().copied())))
    }
}

/// Records the thread each credential check ran on.
struct ThreadRecordingCredentials {
    inner: StaticCredentials,
    threads: Arc<parking_lot::Mutex<Vec<ThreadId>>>,
}

impl CredentialProvider for ThreadRecordingCredentials {
    fn authenticate(&self, username: &str, password: &str) -> Result<Option<Principal>> {
        self.threads.lock().push(thread::current().id());
        self.inner.authenticate(username, password)
    }
}

fn app(books: MockBookService) -> Router {
    app_with(books, StaticCredentials::new())
}

fn app_with(books: MockBookService, auth: impl CredentialProvider + 'static) -> Router {
    create_router(AppState::new(Arc::new(books), Arc::new(auth)))
}

fn basic(username: &str, password: &str) -> String {
    format!(
        "Basic {}",
        STANDARD.encode(format!("{}:{}", username, password))
    )
}

fn book(id: i64, title: &str, description: &str) -> Book {
    Book {
        id,
        title: title.to_string(),
        description: description.to_string(),
    }
}

fn post_book(auth: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/books/")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ACCEPT, "application/json");
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn delete_book(auth: Option<&str>, id: i64) -> Request<Body> {
    let mut builder = Request::builder()
        .method("DELETE")
        .uri(format!("/api/books/{}", id));
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn list_books_returns_service_result() {
    let mut books = MockBookService::new();
    books.expect_find_all().times(1).returning(|| {
        Ok(vec![
            book(1, "Clean Code", "Este libro mola todo"),
            book(
                2,
                "Junit Patterns",
                "Este libro te enseña los principios de los test unitarios",
            ),
        ])
    });

    let response = app(books)
        .oneshot(
            Request::builder()
                .uri("/api/books/")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[0]["title"], "Clean Code");
}

#[tokio::test]
async fn list_books_without_trailing_slash() {
    let mut books = MockBookService::new();
    books.expect_find_all().returning(|| Ok(Vec::new()));

    let response = app(books)
        .oneshot(Request::builder().uri("/api/books").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!([]));
}

#[tokio::test]
async fn get_book_found_and_missing() {
    let mut books = MockBookService::new();
    books
        .expect_find_by_id()
        .withf(|id| *id == 1)
        .returning(|_| Ok(Some(book(1, "Clean Code", "Este libro mola todo"))));
    books
        .expect_find_by_id()
        .withf(|id| *id == 2)
        .returning(|_| Ok(None));

    let app = app(books);

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/api/books/1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["id"], 1);
    assert_eq!(body["description"], "Este libro mola todo");

    let response = app
        .oneshot(Request::builder().uri("/api/books/2").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn post_book_with_user_role() {
    let mut books = MockBookService::new();
    books
        .expect_save()
        .withf(|b: &NewBook| b.title == "Clean Code" && b.description == "Este libro mola todo")
        .times(1)
        .returning(|b| Ok(b.with_id(1)));

    let request = post_book(
        Some(&basic("user", "pass")),
        json!({"title": "Clean Code", "description": "Este libro mola todo"}),
    );
    let response = app(books).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/api/books/1"
    );
    let body = json_body(response).await;
    assert_eq!(body["id"], 1);
    assert_eq!(body["title"], "Clean Code");
    assert_eq!(body["description"], "Este libro mola todo");
}

#[tokio::test]
async fn post_book_without_trailing_slash() {
    let mut books = MockBookService::new();
    books.expect_save().times(1).returning(|b| Ok(b.with_id(3)));

    let request = Request::builder()
        .method("POST")
        .uri("/api/books")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, basic("user", "pass"))
        .body(Body::from(
            json!({"title": "Clean Code", "description": "Este libro mola todo"}).to_string(),
        ))
        .unwrap();
    let response = app(books).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/api/books/3"
    );
}

#[tokio::test]
async fn credentials_are_checked_on_blocking_pool() {
    let mut books = MockBookService::new();
    books.expect_save().times(1).returning(|b| Ok(b.with_id(1)));

    let threads = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let auth = ThreadRecordingCredentials {
        inner: StaticCredentials::new(),
        threads: threads.clone(),
    };

    let request = post_book(
        Some(&basic("user", "pass")),
        json!({"title": "Clean Code", "description": "Este libro mola todo"}),
    );
    let response = app_with(books, auth).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Current-thread runtime: anything not on the blocking pool runs here.
    let threads = threads.lock();
    assert_eq!(threads.len(), 1);
    assert_ne!(threads[0], thread::current().id());
}

#[tokio::test]
async fn post_book_without_auth_is_unauthorized() {
    let mut books = MockBookService::new();
    books.expect_save().never();

    let request = post_book(
        None,
        json!({"title": "Clean Code", "description": "Este libro mola todo"}),
    );
    let response = app(books).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Basic realm=\"bookshelf\""
    );
}

#[tokio::test]
async fn post_book_with_wrong_password_is_unauthorized() {
    let mut books = MockBookService::new();
    books.expect_save().never();

    let request = post_book(
        Some(&basic("user", "nope")),
        json!({"title": "Clean Code", "description": "Este libro mola todo"}),
    );
    let response = app(books).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn post_malformed_body_without_auth_is_unauthorized() {
    let mut books = MockBookService::new();
    books.expect_save().never();

    let request = Request::builder()
        .method("POST")
        .uri("/api/books/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app(books).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn post_malformed_body_with_auth_is_client_error() {
    let mut books = MockBookService::new();
    books.expect_save().never();

    let request = Request::builder()
        .method("POST")
        .uri("/api/books/")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, basic("user", "pass"))
        .body(Body::from("{not json"))
        .unwrap();
    let response = app(books).oneshot(request).await.unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn delete_book_with_admin_role() {
    let mut books = MockBookService::new();
    books
        .expect_delete()
        .withf(|id| *id == 1)
        .times(1)
        .returning(|_| Ok(true));

    let response = app(books)
        .oneshot(delete_book(Some(&basic("admin", "pass")), 1))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn delete_unknown_book_with_admin_role_is_ok() {
    let mut books = MockBookService::new();
    books.expect_delete().times(1).returning(|_| Ok(false));

    let response = app(books)
        .oneshot(delete_book(Some(&basic("admin", "pass")), 42))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn delete_book_with_user_role_is_forbidden() {
    let mut books = MockBookService::new();
    books.expect_delete().never();

    let response = app(books)
        .oneshot(delete_book(Some(&basic("user", "pass")), 1))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn delete_book_without_auth_is_unauthorized() {
    let mut books = MockBookService::new();
    books.expect_delete().never();

    let response = app(books).oneshot(delete_book(None, 1)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn service_failure_is_server_error() {
    let mut books = MockBookService::new();
    books
        .expect_find_all()
        .returning(|| Err(AppError::Internal("disk on fire".to_string())));

    let response = app(books)
        .oneshot(Request::builder().uri("/api/books/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
