use crate::application::loan::{
    ServiceDependencies, borrow_book as execute_borrow_book, return_book as execute_return_book,
};
use crate::domain::commands::{BorrowBook, ReturnBook};
use crate::domain::{Book, BookCode, MemberCode};
use axum::{
    Json,
    extract::{Path, State},
};
use std::collections::HashMap;
use std::sync::Arc;

use super::{
    error::ApiError,
    types::{
        AvailableBooksResponse, BookBorrowedResponse, BookResponse, BookReturnedResponse,
        DataResponse, ListResponse, MemberResponse, STATUS_SUCCESS,
    },
};

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
}

fn parse_book_code(raw: &str) -> Result<BookCode, ApiError> {
    BookCode::parse(raw).map_err(|e| ApiError::BadRequest(format!("Invalid book code: {}", e)))
}

fn parse_member_code(raw: &str) -> Result<MemberCode, ApiError> {
    MemberCode::parse(raw)
        .map_err(|e| ApiError::BadRequest(format!("Invalid member code: {}", e)))
}

// ============================================================================
// Command handlers (PUT)
// ============================================================================

/// PUT /api/books/:book_code/borrow/member/:member_code - 書籍を借りる
///
/// 強制されるビジネスルール:
/// - 書籍と会員が存在すること
/// - 書籍が貸出中でないこと
/// - 会員がペナルティ期間中でないこと
/// - 会員の貸出数が上限（2冊）未満であること
pub async fn borrow_book(
    State(state): State<Arc<AppState>>,
    Path((book_code, member_code)): Path<(String, String)>,
) -> Result<Json<BookBorrowedResponse>, ApiError> {
    let cmd = BorrowBook {
        book_code: parse_book_code(&book_code)?,
        member_code: parse_member_code(&member_code)?,
        requested_at: chrono::Utc::now(),
    };

    let event = execute_borrow_book(&state.service_deps, cmd).await?;

    Ok(Json(BookBorrowedResponse::from(event)))
}

/// PUT /api/books/:book_code/return/member/:member_code - 書籍を返却
///
/// 返却期限を過ぎていればペナルティが課される。
pub async fn return_book(
    State(state): State<Arc<AppState>>,
    Path((book_code, member_code)): Path<(String, String)>,
) -> Result<Json<BookReturnedResponse>, ApiError> {
    let cmd = ReturnBook {
        book_code: parse_book_code(&book_code)?,
        member_code: parse_member_code(&member_code)?,
        requested_at: chrono::Utc::now(),
    };

    let event = execute_return_book(&state.service_deps, cmd).await?;

    Ok(Json(BookReturnedResponse::from(event)))
}

// ============================================================================
// Query handlers (GET)
// ============================================================================

/// GET /api/books - 全書籍を取得
pub async fn list_books(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ListResponse<BookResponse>>, ApiError> {
    let books = state
        .service_deps
        .books
        .find_all()
        .await
        .map_err(ApiError::Internal)?;

    Ok(Json(ListResponse::new(
        books.into_iter().map(BookResponse::from).collect(),
    )))
}

/// GET /api/books/available - 貸出中でない書籍を取得
pub async fn list_available_books(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AvailableBooksResponse>, ApiError> {
    let books = state
        .service_deps
        .books
        .find_available()
        .await
        .map_err(ApiError::Internal)?;

    Ok(Json(AvailableBooksResponse {
        status: STATUS_SUCCESS.to_string(),
        quantities: books.len(),
        data: books.into_iter().map(BookResponse::from).collect(),
    }))
}

/// GET /api/books/:book_code - 書籍をコードで取得
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Path(book_code): Path<String>,
) -> Result<Json<DataResponse<BookResponse>>, ApiError> {
    let code = parse_book_code(&book_code)?;

    let book = state
        .service_deps
        .books
        .find_by_code(&code)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound(format!("Book with code {} not found", code)))?;

    Ok(Json(DataResponse::new(BookResponse::from(book))))
}

/// GET /api/members - 全会員を借りている書籍付きで取得
///
/// 書籍は一度だけ読み込み、借り手ごとに振り分ける。
pub async fn list_members(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ListResponse<MemberResponse>>, ApiError> {
    let deps = &state.service_deps;
    let (members, books) = futures::try_join!(deps.members.find_all(), deps.books.find_all())
        .map_err(ApiError::Internal)?;

    let mut loans_by_member: HashMap<MemberCode, Vec<Book>> = HashMap::new();
    for book in books {
        if let Some(code) = book.borrowed_by().cloned() {
            loans_by_member.entry(code).or_default().push(book);
        }
    }

    let data = members
        .into_iter()
        .map(|member| {
            let loan_books = loans_by_member.remove(&member.code).unwrap_or_default();
            MemberResponse::new(member, loan_books)
        })
        .collect();

    Ok(Json(ListResponse::new(data)))
}

/// GET /api/members/:member_code - 会員をコードで取得
pub async fn get_member(
    State(state): State<Arc<AppState>>,
    Path(member_code): Path<String>,
) -> Result<Json<DataResponse<MemberResponse>>, ApiError> {
    let code = parse_member_code(&member_code)?;
    let deps = &state.service_deps;

    let (member, loan_books) = futures::try_join!(
        deps.members.find_by_code(&code),
        deps.books.find_borrowed_by(&code)
    )
    .map_err(ApiError::Internal)?;

    let member =
        member.ok_or_else(|| ApiError::NotFound(format!("Member not found at code {}", code)))?;

    Ok(Json(DataResponse::new(MemberResponse::new(member, loan_books))))
}

/// 未定義のルート
pub async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}
