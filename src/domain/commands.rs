use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookCode, MemberCode};

/// コマンド：書籍を借りる
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowBook {
    pub book_code: BookCode,
    pub member_code: MemberCode,
    pub requested_at: DateTime<Utc>,
}

/// コマンド：書籍を返却する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnBook {
    pub book_code: BookCode,
    pub member_code: MemberCode,
    pub requested_at: DateTime<Utc>,
}
