use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookCode, MemberCode};

/// イベント：書籍が貸出された
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookBorrowed {
    pub book_code: BookCode,
    pub member_code: MemberCode,
    pub borrowed_at: DateTime<Utc>,
    pub loan_deadline: DateTime<Utc>,
}

/// イベント：書籍が返却された
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookReturned {
    pub book_code: BookCode,
    pub member_code: MemberCode,
    pub returned_at: DateTime<Utc>,
    /// 返却期限を過ぎていたか
    pub was_late: bool,
    /// この返却で新たにペナルティが課されたか
    pub penalty_imposed: bool,
    /// 返却後の会員のペナルティ終了時刻（既存のものを含む）
    pub penalty_until: Option<DateTime<Utc>>,
}
