use chrono::{DateTime, Duration, Utc};

use super::{ActiveLoan, Book, BookBorrowed, BookReturned, BorrowError, Member, ReturnError};

/// 貸出期間の既定値（日数）
pub const DEFAULT_BORROW_PERIOD_DAYS: u32 = 7;

/// ペナルティ期間の既定値（日数）
pub const DEFAULT_PENALTY_PERIOD_DAYS: u32 = 3;

/// 貸出ポリシー
///
/// 起動時に設定から決まり、実行中は変わらない。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanPolicy {
    pub borrow_period: Duration,
    pub penalty_period: Duration,
}

impl LoanPolicy {
    pub fn from_days(borrow_period_days: u32, penalty_period_days: u32) -> Self {
        Self {
            borrow_period: Duration::days(i64::from(borrow_period_days)),
            penalty_period: Duration::days(i64::from(penalty_period_days)),
        }
    }
}

impl Default for LoanPolicy {
    fn default() -> Self {
        Self::from_days(DEFAULT_BORROW_PERIOD_DAYS, DEFAULT_PENALTY_PERIOD_DAYS)
    }
}

/// 純粋関数：書籍を貸し出す
///
/// ビジネスルール（この順に判定）：
/// - 書籍が貸出中でないこと
/// - 会員がペナルティ期間中でないこと
/// - 会員の貸出冊数が上限未満であること
/// - 在庫があること
///
/// 返却期限は`now + 貸出期間`。
/// 副作用なし。更新後のBook・Memberとイベントを返す。
pub fn borrow_book(
    book: &Book,
    member: &Member,
    now: DateTime<Utc>,
    policy: &LoanPolicy,
) -> Result<(Book, Member, BookBorrowed), BorrowError> {
    if let Some(loan) = &book.loan {
        return Err(BorrowError::AlreadyBorrowed {
            borrowed_by: loan.borrowed_by.clone(),
        });
    }

    if let Some(until) = member.penalty_time.filter(|_| member.is_penalized_at(now)) {
        return Err(BorrowError::InPenaltyPeriod { until });
    }

    let loan_book_quantity = member.loan_book_quantity.increment()?;

    let stock = book.stock.checked_sub(1).ok_or(BorrowError::OutOfStock)?;

    let deadline = now + policy.borrow_period;

    let new_book = Book {
        stock,
        loan: Some(ActiveLoan {
            borrowed_by: member.code.clone(),
            deadline,
        }),
        ..book.clone()
    };

    let new_member = Member {
        loan_book_quantity,
        penalty_time: None,
        ..member.clone()
    };

    let event = BookBorrowed {
        book_code: book.code.clone(),
        member_code: member.code.clone(),
        borrowed_at: now,
        loan_deadline: deadline,
    };

    Ok((new_book, new_member, event))
}

/// 純粋関数：書籍を返却する
///
/// ビジネスルール：
/// - 返却するのは借りた本人であること
/// - 返却期限を過ぎており、かつ有効なペナルティがなければ
///   `now + ペナルティ期間`のペナルティを課す
///
/// 延滞判定には貸出状態をクリアする前の返却期限を使う。
/// 副作用なし。更新後のBook・Memberとイベントを返す。
pub fn return_book(
    book: &Book,
    member: &Member,
    now: DateTime<Utc>,
    policy: &LoanPolicy,
) -> Result<(Book, Member, BookReturned), ReturnError> {
    let deadline = match &book.loan {
        Some(loan) if loan.borrowed_by == member.code => loan.deadline,
        _ => return Err(ReturnError::NotTheBorrower),
    };

    let loan_book_quantity = member
        .loan_book_quantity
        .decrement()
        .map_err(ReturnError::QuantityMismatch)?;

    let was_late = now > deadline;
    let penalty_imposed = was_late && !member.is_penalized_at(now);

    let penalty_time = if penalty_imposed {
        Some(now + policy.penalty_period)
    } else {
        member.penalty_time
    };

    let new_book = Book {
        stock: book.stock + 1,
        loan: None,
        ..book.clone()
    };

    let new_member = Member {
        loan_book_quantity,
        penalty_time,
        ..member.clone()
    };

    let event = BookReturned {
        book_code: book.code.clone(),
        member_code: member.code.clone(),
        returned_at: now,
        was_late,
        penalty_imposed,
        penalty_until: penalty_time.filter(|_| new_member.is_penalized_at(now)),
    };

    Ok((new_book, new_member, event))
}
