use crate::domain::{Book, LoanQuantity, Member, MemberCode};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 貸出・返却による書籍と会員の同時更新
///
/// `expected_*`は読み込み時点の値。書き込み時に保存済みの値と
/// 一致しなければ、どちらのレコードも更新しない（楽観的排他制御）。
#[derive(Debug, Clone)]
pub struct LoanUpdate {
    pub book: Book,
    pub member: Member,
    pub expected_borrowed_by: Option<MemberCode>,
    pub expected_loan_book_quantity: LoanQuantity,
}

/// 同時更新の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// 両方のレコードを更新した
    Applied,
    /// 読み込み後に他の更新が入ったため、何も更新しなかった
    Stale,
}

/// 貸出ストアポート
///
/// 1回の貸出・返却で発生する2件の更新を1つのトランザクションとして扱う。
/// 部分的な更新が観測されることはない。
#[async_trait]
pub trait LoanStore: Send + Sync {
    async fn apply(&self, update: LoanUpdate) -> Result<ApplyOutcome>;
}
