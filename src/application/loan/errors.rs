use crate::domain::{BookCode, MemberCode};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// エラーの分類
///
/// 呼び出し側（API層）はこの分類だけを見てレスポンスを決める。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Forbidden,
    BadRequest,
    Internal,
}

/// 貸出管理アプリケーション層のエラー
#[derive(Debug, Error)]
pub enum LoanApplicationError {
    /// 書籍が存在しない
    #[error("Book not found at code {0}")]
    BookNotFound(BookCode),

    /// 会員が存在しない
    #[error("Member not found at code {0}")]
    MemberNotFound(MemberCode),

    /// 書籍が既に貸出中
    #[error("The book has been borrowed by someone")]
    BookAlreadyBorrowed,

    /// 書籍の在庫がない
    #[error("Book {0} is out of stock")]
    OutOfStock(BookCode),

    /// 読み込み後に他のリクエストが同じレコードを更新した
    #[error("The book or member was updated concurrently, please retry")]
    ConcurrentUpdate,

    /// 会員がペナルティ期間中
    #[error("Member {member_code} in penalty period until {until}")]
    MemberInPenaltyPeriod {
        member_code: MemberCode,
        until: DateTime<Utc>,
    },

    /// 貸出上限（2冊）に達している
    #[error("Member {0} has already borrowed two books")]
    LoanLimitReached(MemberCode),

    /// 返却者が借り手ではない
    #[error("Member {member_code} did not borrow the book with code {book_code}")]
    NotTheBorrower {
        member_code: MemberCode,
        book_code: BookCode,
    },

    /// 保存されたレコード同士が矛盾している
    #[error("Inconsistent record: {0}")]
    InconsistentRecord(String),

    /// BookRepositoryのエラー
    #[error("Book repository error")]
    BookRepositoryError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// MemberRepositoryのエラー
    #[error("Member repository error")]
    MemberRepositoryError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// LoanStoreのエラー
    #[error("Loan store error")]
    LoanStoreError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl LoanApplicationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BookNotFound(_) | Self::MemberNotFound(_) => ErrorKind::NotFound,
            Self::BookAlreadyBorrowed | Self::OutOfStock(_) | Self::ConcurrentUpdate => {
                ErrorKind::Conflict
            }
            Self::MemberInPenaltyPeriod { .. } | Self::LoanLimitReached(_) => ErrorKind::Forbidden,
            Self::NotTheBorrower { .. } => ErrorKind::BadRequest,
            Self::InconsistentRecord(_)
            | Self::BookRepositoryError(_)
            | Self::MemberRepositoryError(_)
            | Self::LoanStoreError(_) => ErrorKind::Internal,
        }
    }
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, LoanApplicationError>;
