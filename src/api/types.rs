use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Book, BookBorrowed, BookReturned, Member};

/// 成功レスポンスの`status`
pub const STATUS_SUCCESS: &str = "success";

/// 失敗レスポンスの`status`
pub const STATUS_FAIL: &str = "fail";

/// 返却後もペナルティ期間中の場合に付く注記
pub const PENALTY_NOTE: &str = "You are in penalty period";

/// 書籍レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct BookResponse {
    pub code: String,
    pub title: String,
    pub author: String,
    pub stock: u32,
    pub borrowed_by: Option<String>,
    pub loan_deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            borrowed_by: book.borrowed_by().map(|code| code.to_string()),
            loan_deadline: book.loan_deadline(),
            code: book.code.into(),
            title: book.title,
            author: book.author,
            stock: book.stock,
            created_at: book.created_at,
        }
    }
}

/// 会員が借りている書籍の要約
#[derive(Debug, Serialize, Deserialize)]
pub struct LoanBookSummary {
    pub code: String,
    pub title: String,
    pub author: String,
    pub loan_deadline: Option<DateTime<Utc>>,
}

impl From<Book> for LoanBookSummary {
    fn from(book: Book) -> Self {
        Self {
            loan_deadline: book.loan_deadline(),
            code: book.code.into(),
            title: book.title,
            author: book.author,
        }
    }
}

/// 会員レスポンス（借りている書籍を含む）
#[derive(Debug, Serialize, Deserialize)]
pub struct MemberResponse {
    pub code: String,
    pub name: String,
    pub loan_book_quantity: u8,
    pub penalty_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub loan_books: Vec<LoanBookSummary>,
}

impl MemberResponse {
    pub fn new(member: Member, loan_books: Vec<Book>) -> Self {
        Self {
            code: member.code.into(),
            name: member.name,
            loan_book_quantity: member.loan_book_quantity.value(),
            penalty_time: member.penalty_time,
            created_at: member.created_at,
            loan_books: loan_books.into_iter().map(LoanBookSummary::from).collect(),
        }
    }
}

/// 一覧レスポンス（GET /api/books, GET /api/members）
#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub status: String,
    pub count: usize,
    pub data: Vec<T>,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            count: data.len(),
            data,
        }
    }
}

/// 貸出可能な書籍の一覧レスポンス（GET /api/books/available）
#[derive(Debug, Serialize, Deserialize)]
pub struct AvailableBooksResponse {
    pub status: String,
    pub quantities: usize,
    pub data: Vec<BookResponse>,
}

/// 単一リソースのレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub status: String,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            data,
        }
    }
}

/// 貸出レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct BookBorrowedResponse {
    pub status: String,
    pub message: String,
    pub book_code: String,
    pub member_code: String,
    pub loan_deadline: DateTime<Utc>,
}

impl From<BookBorrowed> for BookBorrowedResponse {
    fn from(event: BookBorrowed) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            message: "The book has been successfully borrowed".to_string(),
            book_code: event.book_code.into(),
            member_code: event.member_code.into(),
            loan_deadline: event.loan_deadline,
        }
    }
}

/// 返却レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct BookReturnedResponse {
    pub status: String,
    pub note: String,
    pub message: String,
    pub penalty_imposed: bool,
    pub penalty_time: Option<DateTime<Utc>>,
}

impl From<BookReturned> for BookReturnedResponse {
    fn from(event: BookReturned) -> Self {
        let note = if event.penalty_until.is_some() {
            PENALTY_NOTE.to_string()
        } else {
            String::new()
        };

        Self {
            status: STATUS_SUCCESS.to_string(),
            note,
            message: "Book returned successfully".to_string(),
            penalty_imposed: event.penalty_imposed,
            penalty_time: event.penalty_until,
        }
    }
}

/// エラーレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: STATUS_FAIL.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BookCode, MemberCode};
    use chrono::Duration;

    fn returned(penalty_imposed: bool, penalty_until: Option<DateTime<Utc>>) -> BookReturned {
        BookReturned {
            book_code: BookCode::parse("M122").unwrap(),
            member_code: MemberCode::parse("A001").unwrap(),
            returned_at: Utc::now(),
            was_late: penalty_imposed,
            penalty_imposed,
            penalty_until,
        }
    }

    #[test]
    fn test_late_return_response_carries_penalty_note() {
        let until = Utc::now() + Duration::days(3);
        let response = BookReturnedResponse::from(returned(true, Some(until)));

        assert_eq!(response.status, STATUS_SUCCESS);
        assert_eq!(response.note, PENALTY_NOTE);
        assert!(response.penalty_imposed);
        assert_eq!(response.penalty_time, Some(until));
    }

    #[test]
    fn test_return_during_existing_penalty_keeps_note() {
        let until = Utc::now() + Duration::days(1);
        let response = BookReturnedResponse::from(returned(false, Some(until)));

        assert_eq!(response.note, PENALTY_NOTE);
        assert!(!response.penalty_imposed);
        assert_eq!(response.penalty_time, Some(until));
    }

    #[test]
    fn test_on_time_return_response_has_no_note() {
        let response = BookReturnedResponse::from(returned(false, None));

        assert_eq!(response.note, "");
        assert_eq!(response.penalty_time, None);
    }
}
