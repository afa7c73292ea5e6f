use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{LoanQuantity, MemberCode, MemberError, MemberId};

/// 会員
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub code: MemberCode,
    pub name: String,
    pub loan_book_quantity: LoanQuantity,
    /// ペナルティの終了時刻（ペナルティ中でなければNone）
    pub penalty_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Member {
    /// 貸出のない新しい会員を作成する
    ///
    /// # エラー
    /// 名前が空（前後の空白を除く）の場合は`MemberError::BlankName`を返す
    pub fn new(
        code: MemberCode,
        name: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Self, MemberError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MemberError::BlankName);
        }

        Ok(Self {
            id: MemberId::new(),
            code,
            name: name.to_string(),
            loan_book_quantity: LoanQuantity::new(),
            penalty_time: None,
            created_at,
        })
    }

    /// `now`の時点でペナルティ期間中か
    ///
    /// 終了時刻ちょうどはペナルティ明けとみなす。
    pub fn is_penalized_at(&self, now: DateTime<Utc>) -> bool {
        self.penalty_time.is_some_and(|until| now < until)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn member() -> Member {
        Member::new(MemberCode::parse("A001").unwrap(), "  Angga ", Utc::now()).unwrap()
    }

    #[test]
    fn test_new_member_trims_name_and_starts_clean() {
        let member = member();
        assert_eq!(member.name, "Angga");
        assert_eq!(member.loan_book_quantity.value(), 0);
        assert_eq!(member.penalty_time, None);
    }

    #[test]
    fn test_new_member_rejects_blank_name() {
        let result = Member::new(MemberCode::parse("A001").unwrap(), " ", Utc::now());
        assert_eq!(result.unwrap_err(), MemberError::BlankName);
    }

    #[test]
    fn test_is_penalized_at_boundaries() {
        let now = Utc::now();
        let mut member = member();
        assert!(!member.is_penalized_at(now));

        member.penalty_time = Some(now + Duration::days(3));
        assert!(member.is_penalized_at(now));
        assert!(member.is_penalized_at(now + Duration::days(3) - Duration::seconds(1)));
        assert!(!member.is_penalized_at(now + Duration::days(3)));
    }
}
