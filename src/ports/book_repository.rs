use crate::domain::{Book, BookCode, MemberCode};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 書籍リポジトリポート
///
/// 書籍コードによる一点検索と一覧取得を抽象化する。
/// 貸出・返却による更新は`LoanStore`が担う。
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// 書籍コードで書籍を取得する
    async fn find_by_code(&self, code: &BookCode) -> Result<Option<Book>>;

    /// すべての書籍を取得する（コード順）
    async fn find_all(&self) -> Result<Vec<Book>>;

    /// 貸出中でない書籍を取得する（コード順）
    async fn find_available(&self) -> Result<Vec<Book>>;

    /// 会員が借りている書籍を取得する
    ///
    /// 会員詳細の`loan_books`表示に使用される。
    async fn find_borrowed_by(&self, member_code: &MemberCode) -> Result<Vec<Book>>;

    /// 書籍をまとめて登録する（シード用）
    ///
    /// 1件でもコードが重複すれば全件を登録しない。
    async fn insert_many(&self, books: Vec<Book>) -> Result<()>;

    /// すべての書籍を削除する（シード用）
    async fn delete_all(&self) -> Result<u64>;
}
