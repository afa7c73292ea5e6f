use crate::domain::{Member, MemberCode};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 会員リポジトリポート
#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// 会員コードで会員を取得する
    async fn find_by_code(&self, code: &MemberCode) -> Result<Option<Member>>;

    /// すべての会員を取得する（コード順）
    async fn find_all(&self) -> Result<Vec<Member>>;

    /// 会員をまとめて登録する（シード用）
    ///
    /// 1件でもコードが重複すれば全件を登録しない。
    async fn insert_many(&self, members: Vec<Member>) -> Result<()>;

    /// すべての会員を削除する（シード用）
    async fn delete_all(&self) -> Result<u64>;
}
