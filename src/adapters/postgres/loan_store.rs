use crate::ports::loan_store::{ApplyOutcome, LoanStore as LoanStoreTrait, LoanUpdate, Result};
use async_trait::async_trait;
use sqlx::PgPool;

use super::rows::{quantity_to_db, stock_to_db};

/// PostgreSQL implementation of LoanStore
///
/// Both UPDATEs run in one transaction. Each one carries the value read by
/// the engine in its WHERE clause; if either matches no row the transaction
/// is rolled back and the update is reported as stale.
pub struct LoanStore {
    pool: PgPool,
}

impl LoanStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoanStoreTrait for LoanStore {
    async fn apply(&self, update: LoanUpdate) -> Result<ApplyOutcome> {
        let LoanUpdate {
            book,
            member,
            expected_borrowed_by,
            expected_loan_book_quantity,
        } = update;

        let mut tx = self.pool.begin().await?;

        let book_rows = sqlx::query(
            r#"
            UPDATE books
            SET stock = $2,
                borrowed_by = $3,
                loan_deadline = $4
            WHERE code = $1
              AND borrowed_by IS NOT DISTINCT FROM $5
            "#,
        )
        .bind(book.code.as_str())
        .bind(stock_to_db(book.stock)?)
        .bind(book.borrowed_by().map(|code| code.as_str()))
        .bind(book.loan_deadline())
        .bind(expected_borrowed_by.as_ref().map(|code| code.as_str()))
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if book_rows != 1 {
            tx.rollback().await?;
            return Ok(ApplyOutcome::Stale);
        }

        let member_rows = sqlx::query(
            r#"
            UPDATE members
            SET loan_book_quantity = $2,
                penalty_time = $3
            WHERE code = $1
              AND loan_book_quantity = $4
            "#,
        )
        .bind(member.code.as_str())
        .bind(quantity_to_db(member.loan_book_quantity))
        .bind(member.penalty_time)
        .bind(quantity_to_db(expected_loan_book_quantity))
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if member_rows != 1 {
            tx.rollback().await?;
            return Ok(ApplyOutcome::Stale);
        }

        tx.commit().await?;
        Ok(ApplyOutcome::Applied)
    }
}
