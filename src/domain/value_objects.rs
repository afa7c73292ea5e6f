use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 書籍ID - 永続化層での識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookId(Uuid);

impl BookId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

/// 会員ID - 永続化層での識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberId(Uuid);

impl MemberId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for MemberId {
    fn default() -> Self {
        Self::new()
    }
}

/// コード値のエラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodeError {
    /// 空文字列または空白のみ
    #[error("code must not be empty")]
    Empty,
}

fn parse_code(raw: &str) -> Result<String, CodeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CodeError::Empty);
    }
    Ok(trimmed.to_string())
}

/// 書籍コード（例: "M122"）
///
/// 利用者から見た一意キー。作成後は変更されない。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BookCode(String);

impl BookCode {
    pub fn parse(raw: &str) -> Result<Self, CodeError> {
        parse_code(raw).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BookCode {
    type Error = CodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<BookCode> for String {
    fn from(code: BookCode) -> Self {
        code.0
    }
}

impl fmt::Display for BookCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 会員コード（例: "A001"）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MemberCode(String);

impl MemberCode {
    pub fn parse(raw: &str) -> Result<Self, CodeError> {
        parse_code(raw).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MemberCode {
    type Error = CodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MemberCode> for String {
    fn from(code: MemberCode) -> Self {
        code.0
    }
}

impl fmt::Display for MemberCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 貸出冊数エラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoanQuantityError {
    /// 上限（2冊）に達している
    #[error("loan limit of {} books reached", LoanQuantity::MAX)]
    LimitReached,
    /// 貸出中の本がない
    #[error("member has no book on loan")]
    NothingOnLoan,
    /// 永続化された値が範囲外
    #[error("loan quantity out of range: {0}")]
    OutOfRange(i64),
}

/// 会員の貸出中冊数
///
/// 不変条件：0〜2冊の範囲
/// 型システムでこの制約を強制し、範囲外の値を作成できないようにする。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct LoanQuantity(u8);

impl LoanQuantity {
    /// 会員1人あたりの最大貸出冊数
    pub const MAX: u8 = 2;

    /// 新規作成（0冊）
    pub fn new() -> Self {
        Self(0)
    }

    /// 貸出冊数を増やす
    ///
    /// # エラー
    /// 既に上限に達している場合は`LoanQuantityError::LimitReached`を返す
    pub fn increment(self) -> Result<Self, LoanQuantityError> {
        if !self.can_borrow() {
            return Err(LoanQuantityError::LimitReached);
        }
        Ok(Self(self.0 + 1))
    }

    /// 貸出冊数を減らす
    ///
    /// # エラー
    /// 0冊の場合は`LoanQuantityError::NothingOnLoan`を返す
    pub fn decrement(self) -> Result<Self, LoanQuantityError> {
        if self.0 == 0 {
            return Err(LoanQuantityError::NothingOnLoan);
        }
        Ok(Self(self.0 - 1))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// さらに借りられるか
    pub fn can_borrow(&self) -> bool {
        self.0 < Self::MAX
    }
}

impl Default for LoanQuantity {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<i64> for LoanQuantity {
    type Error = LoanQuantityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if !(0..=i64::from(Self::MAX)).contains(&value) {
            return Err(LoanQuantityError::OutOfRange(value));
        }
        Ok(Self(value as u8))
    }
}

impl From<LoanQuantity> for i64 {
    fn from(quantity: LoanQuantity) -> Self {
        i64::from(quantity.0)
    }
}
