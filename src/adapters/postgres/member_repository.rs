use crate::domain::{Member, MemberCode};
use crate::ports::member_repository::{MemberRepository as MemberRepositoryTrait, Result};
use async_trait::async_trait;
use sqlx::PgPool;

use super::rows::{MEMBER_COLUMNS, map_row_to_member, quantity_to_db};

/// MemberRepositoryのPostgreSQL実装
pub struct MemberRepository {
    pool: PgPool,
}

impl MemberRepository {
    /// PostgreSQLコネクションプールから新しいMemberRepositoryを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MemberRepositoryTrait for MemberRepository {
    async fn find_by_code(&self, code: &MemberCode) -> Result<Option<Member>> {
        let row = sqlx::query(&format!("SELECT {MEMBER_COLUMNS} FROM members WHERE code = $1"))
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_row_to_member).transpose()
    }

    async fn find_all(&self) -> Result<Vec<Member>> {
        let rows = sqlx::query(&format!("SELECT {MEMBER_COLUMNS} FROM members ORDER BY code"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(map_row_to_member).collect()
    }

    async fn insert_many(&self, members: Vec<Member>) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for member in &members {
            sqlx::query(
                r#"
                INSERT INTO members (id, code, name, loan_book_quantity, penalty_time, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(member.id.value())
            .bind(member.code.as_str())
            .bind(&member.name)
            .bind(quantity_to_db(member.loan_book_quantity))
            .bind(member.penalty_time)
            .bind(member.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// 書籍から参照されている会員がいると外部キー制約で失敗する
    async fn delete_all(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM members").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
