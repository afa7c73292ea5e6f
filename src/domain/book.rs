use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookCode, BookId, MemberCode};

/// 貸出中の情報
///
/// 借り手と返却期限は常に対で存在する。
/// 片方だけが設定された状態は型で表現できない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveLoan {
    pub borrowed_by: MemberCode,
    pub deadline: DateTime<Utc>,
}

/// 書籍
///
/// 在庫数と、追跡対象の1冊の貸出状態を持つ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub code: BookCode,
    pub title: String,
    pub author: String,
    pub stock: u32,
    pub loan: Option<ActiveLoan>,
    pub created_at: DateTime<Utc>,
}

impl Book {
    /// 貸出されていない新しい書籍を作成する
    pub fn new(
        code: BookCode,
        title: impl Into<String>,
        author: impl Into<String>,
        stock: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: BookId::new(),
            code,
            title: title.into(),
            author: author.into(),
            stock,
            loan: None,
            created_at,
        }
    }

    pub fn borrowed_by(&self) -> Option<&MemberCode> {
        self.loan.as_ref().map(|loan| &loan.borrowed_by)
    }

    pub fn loan_deadline(&self) -> Option<DateTime<Utc>> {
        self.loan.as_ref().map(|loan| loan.deadline)
    }

    pub fn is_available(&self) -> bool {
        self.loan.is_none()
    }

    /// 指定した会員が借りているか
    pub fn is_borrowed_by(&self, member_code: &MemberCode) -> bool {
        self.borrowed_by() == Some(member_code)
    }
}
