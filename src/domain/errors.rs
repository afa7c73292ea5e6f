use chrono::{DateTime, Utc};

use super::{LoanQuantityError, MemberCode};

/// 貸出のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BorrowError {
    /// 既に誰かが借りている
    AlreadyBorrowed { borrowed_by: MemberCode },
    /// 会員がペナルティ期間中
    InPenaltyPeriod { until: DateTime<Utc> },
    /// 会員の貸出冊数が上限に達している
    LoanLimitReached,
    /// 在庫がない
    OutOfStock,
}

impl From<LoanQuantityError> for BorrowError {
    fn from(_: LoanQuantityError) -> Self {
        BorrowError::LoanLimitReached
    }
}

/// 返却のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnError {
    /// この会員が借りている本ではない
    NotTheBorrower,
    /// 会員の貸出冊数が書籍の状態と食い違っている
    QuantityMismatch(LoanQuantityError),
}

/// 会員作成のエラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemberError {
    #[error("member name is required")]
    BlankName,
}
