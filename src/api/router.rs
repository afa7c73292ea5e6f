use axum::{
    Router,
    routing::{get, put},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, borrow_book, get_book, get_member, list_available_books, list_books, list_members,
    return_book, route_not_found,
};

/// Creates the API router with all library endpoints
///
/// Command endpoints (Write operations):
/// - PUT /api/books/:book_code/borrow/member/:member_code - Borrow a book
/// - PUT /api/books/:book_code/return/member/:member_code - Return a book
///
/// Query endpoints (Read operations):
/// - GET /api/books, GET /api/books/available, GET /api/books/:book_code
/// - GET /api/members, GET /api/members/:member_code
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        // Book endpoints
        .route("/api/books", get(list_books))
        .route("/api/books/available", get(list_available_books))
        .route("/api/books/:book_code", get(get_book))
        .route(
            "/api/books/:book_code/borrow/member/:member_code",
            put(borrow_book),
        )
        .route(
            "/api/books/:book_code/return/member/:member_code",
            put(return_book),
        )
        // Member endpoints
        .route("/api/members", get(list_members))
        .route("/api/members/:member_code", get(get_member))
        .fallback(route_not_found)
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
