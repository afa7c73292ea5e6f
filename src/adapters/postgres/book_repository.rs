use crate::domain::{Book, BookCode, MemberCode};
use crate::ports::book_repository::{BookRepository as BookRepositoryTrait, Result};
use async_trait::async_trait;
use sqlx::PgPool;

use super::rows::{BOOK_COLUMNS, map_row_to_book, stock_to_db};

/// BookRepositoryのPostgreSQL実装
pub struct BookRepository {
    pool: PgPool,
}

impl BookRepository {
    /// PostgreSQLコネクションプールから新しいBookRepositoryを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookRepositoryTrait for BookRepository {
    async fn find_by_code(&self, code: &BookCode) -> Result<Option<Book>> {
        let row = sqlx::query(&format!("SELECT {BOOK_COLUMNS} FROM books WHERE code = $1"))
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_row_to_book).transpose()
    }

    async fn find_all(&self) -> Result<Vec<Book>> {
        let rows = sqlx::query(&format!("SELECT {BOOK_COLUMNS} FROM books ORDER BY code"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(map_row_to_book).collect()
    }

    /// 貸出中でない書籍（部分インデックスの対象外の行）
    async fn find_available(&self) -> Result<Vec<Book>> {
        let rows = sqlx::query(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE borrowed_by IS NULL ORDER BY code"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_book).collect()
    }

    async fn find_borrowed_by(&self, member_code: &MemberCode) -> Result<Vec<Book>> {
        let rows = sqlx::query(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE borrowed_by = $1 ORDER BY code"
        ))
        .bind(member_code.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_book).collect()
    }

    /// 1つのトランザクションで全件を登録する
    ///
    /// コードが重複すると一意制約違反となり、全件がロールバックされる。
    async fn insert_many(&self, books: Vec<Book>) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for book in &books {
            sqlx::query(
                r#"
                INSERT INTO books (id, code, title, author, stock, borrowed_by, loan_deadline, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(book.id.value())
            .bind(book.code.as_str())
            .bind(&book.title)
            .bind(&book.author)
            .bind(stock_to_db(book.stock)?)
            .bind(book.borrowed_by().map(|code| code.as_str()))
            .bind(book.loan_deadline())
            .bind(book.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete_all(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM books").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
