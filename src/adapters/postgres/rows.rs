use crate::domain::{
    ActiveLoan, Book, BookCode, BookId, LoanQuantity, Member, MemberCode, MemberId,
};
use chrono::{DateTime, Utc};
use sqlx::{Row, postgres::PgRow};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn invalid_data(message: String) -> BoxError {
    Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message))
}

pub(super) const BOOK_COLUMNS: &str =
    "id, code, title, author, stock, borrowed_by, loan_deadline, created_at";

pub(super) const MEMBER_COLUMNS: &str =
    "id, code, name, loan_book_quantity, penalty_time, created_at";

/// PostgreSQLの行データをBookに変換する
///
/// borrowed_byとloan_deadlineの片方だけが設定された行は不正データとして扱う。
pub(super) fn map_row_to_book(row: &PgRow) -> Result<Book, BoxError> {
    let code: String = row.try_get("code")?;
    let stock: i32 = row.try_get("stock")?;
    let borrowed_by: Option<String> = row.try_get("borrowed_by")?;
    let loan_deadline: Option<DateTime<Utc>> = row.try_get("loan_deadline")?;

    let loan = match (borrowed_by, loan_deadline) {
        (Some(borrowed_by), Some(deadline)) => Some(ActiveLoan {
            borrowed_by: MemberCode::parse(&borrowed_by)?,
            deadline,
        }),
        (None, None) => None,
        _ => {
            return Err(invalid_data(format!(
                "book {} has borrowed_by and loan_deadline out of sync",
                code
            )));
        }
    };

    Ok(Book {
        id: BookId::from_uuid(row.try_get("id")?),
        code: BookCode::parse(&code)?,
        title: row.try_get("title")?,
        author: row.try_get("author")?,
        stock: u32::try_from(stock)
            .map_err(|_| invalid_data(format!("book {} has negative stock {}", code, stock)))?,
        loan,
        created_at: row.try_get("created_at")?,
    })
}

/// PostgreSQLの行データをMemberに変換する
pub(super) fn map_row_to_member(row: &PgRow) -> Result<Member, BoxError> {
    let code: String = row.try_get("code")?;
    let loan_book_quantity: i16 = row.try_get("loan_book_quantity")?;

    Ok(Member {
        id: MemberId::from_uuid(row.try_get("id")?),
        code: MemberCode::parse(&code)?,
        name: row.try_get("name")?,
        loan_book_quantity: LoanQuantity::try_from(i64::from(loan_book_quantity))?,
        penalty_time: row.try_get("penalty_time")?,
        created_at: row.try_get("created_at")?,
    })
}

pub(super) fn stock_to_db(stock: u32) -> Result<i32, BoxError> {
    i32::try_from(stock).map_err(|_| invalid_data(format!("stock {} does not fit INTEGER", stock)))
}

pub(super) fn quantity_to_db(quantity: LoanQuantity) -> i16 {
    i16::from(quantity.value())
}
