use crate::domain::{self, commands::*, *};
use crate::ports::*;
use std::sync::Arc;

use super::errors::{LoanApplicationError, Result};
use super::locks::KeyedLocks;

/// サービスの依存関係
///
/// 関数型DDDの原則に従い、データ構造として定義。
/// 振る舞い（メソッド）は持たず、純粋な関数に依存関係を渡す。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub books: Arc<dyn BookRepository>,
    pub members: Arc<dyn MemberRepository>,
    pub loan_store: Arc<dyn LoanStore>,
    pub locks: Arc<KeyedLocks>,
    pub policy: domain::loan::LoanPolicy,
}

impl ServiceDependencies {
    pub fn new(
        books: Arc<dyn BookRepository>,
        members: Arc<dyn MemberRepository>,
        loan_store: Arc<dyn LoanStore>,
        policy: domain::loan::LoanPolicy,
    ) -> Self {
        Self {
            books,
            members,
            loan_store,
            locks: Arc::new(KeyedLocks::new()),
            policy,
        }
    }
}

/// 書籍と会員を読み込むヘルパー関数
///
/// 2件の読み込みは並行して行い、存在確認は書籍、会員の順に行う。
///
/// # エラー
/// - BookNotFound / MemberNotFound: レコードが存在しない
/// - BookRepositoryError / MemberRepositoryError: 読み込み失敗
async fn load_book_and_member(
    deps: &ServiceDependencies,
    book_code: &BookCode,
    member_code: &MemberCode,
) -> Result<(Book, Member)> {
    let (book, member) = futures::try_join!(
        async {
            deps.books
                .find_by_code(book_code)
                .await
                .map_err(LoanApplicationError::BookRepositoryError)
        },
        async {
            deps.members
                .find_by_code(member_code)
                .await
                .map_err(LoanApplicationError::MemberRepositoryError)
        },
    )?;

    let book = book.ok_or_else(|| LoanApplicationError::BookNotFound(book_code.clone()))?;
    let member = member.ok_or_else(|| LoanApplicationError::MemberNotFound(member_code.clone()))?;

    Ok((book, member))
}

/// 書籍と会員の更新を1つの単位として書き込むヘルパー関数
///
/// 読み込み時点の値を期待値として渡し、ストア側で再検証させる。
async fn commit(
    deps: &ServiceDependencies,
    before: (&Book, &Member),
    after: (Book, Member),
) -> Result<()> {
    let (book_before, member_before) = before;
    let (book, member) = after;

    let update = LoanUpdate {
        book,
        member,
        expected_borrowed_by: book_before.borrowed_by().cloned(),
        expected_loan_book_quantity: member_before.loan_book_quantity,
    };

    match deps
        .loan_store
        .apply(update)
        .await
        .map_err(LoanApplicationError::LoanStoreError)?
    {
        ApplyOutcome::Applied => Ok(()),
        ApplyOutcome::Stale => {
            tracing::warn!(
                book_code = %book_before.code,
                member_code = %member_before.code,
                "Stale loan update rejected"
            );
            Err(LoanApplicationError::ConcurrentUpdate)
        }
    }
}

fn borrow_error(err: BorrowError, cmd: &BorrowBook) -> LoanApplicationError {
    match err {
        BorrowError::AlreadyBorrowed { .. } => LoanApplicationError::BookAlreadyBorrowed,
        BorrowError::InPenaltyPeriod { until } => LoanApplicationError::MemberInPenaltyPeriod {
            member_code: cmd.member_code.clone(),
            until,
        },
        BorrowError::LoanLimitReached => {
            LoanApplicationError::LoanLimitReached(cmd.member_code.clone())
        }
        BorrowError::OutOfStock => LoanApplicationError::OutOfStock(cmd.book_code.clone()),
    }
}

fn return_error(err: ReturnError, cmd: &ReturnBook) -> LoanApplicationError {
    match err {
        ReturnError::NotTheBorrower => LoanApplicationError::NotTheBorrower {
            member_code: cmd.member_code.clone(),
            book_code: cmd.book_code.clone(),
        },
        ReturnError::QuantityMismatch(e) => LoanApplicationError::InconsistentRecord(format!(
            "member {} is recorded as borrower of {} but {}",
            cmd.member_code, cmd.book_code, e
        )),
    }
}

/// 書籍を貸し出す
///
/// ビジネスルール（この順に判定し、最初の違反で失敗する）：
/// - 書籍が存在すること
/// - 会員が存在すること
/// - 書籍が貸出中でないこと
/// - 会員がペナルティ期間中でないこと
/// - 会員の貸出中の冊数が2冊未満であること
///
/// # 一貫性保証
///
/// 同じ書籍・会員への操作はプロセス内で直列化される。
/// 書籍と会員の更新は`LoanStore`により原子的に書き込まれ、
/// 他プロセスとの競合は`ConcurrentUpdate`として報告される。
///
/// # 引数
/// * `deps` - サービスの依存関係
/// * `cmd` - 貸出コマンド（`requested_at`は呼び出しごとに一度だけ決める）
pub async fn borrow_book(deps: &ServiceDependencies, cmd: BorrowBook) -> Result<BookBorrowed> {
    let _guard = deps.locks.lock_loan(&cmd.book_code, &cmd.member_code).await;

    let (book, member) = load_book_and_member(deps, &cmd.book_code, &cmd.member_code).await?;

    let (new_book, new_member, event) =
        domain::loan::borrow_book(&book, &member, cmd.requested_at, &deps.policy).map_err(
            |e| {
                tracing::debug!(
                    book_code = %cmd.book_code,
                    member_code = %cmd.member_code,
                    reason = ?e,
                    "Borrow rejected"
                );
                borrow_error(e, &cmd)
            },
        )?;

    commit(deps, (&book, &member), (new_book, new_member)).await?;

    tracing::info!(
        book_code = %event.book_code,
        member_code = %event.member_code,
        loan_deadline = %event.loan_deadline,
        "Book borrowed"
    );

    Ok(event)
}

/// 書籍を返却する
///
/// ビジネスルール：
/// - 書籍が存在すること
/// - 会員が存在すること
/// - 会員がその書籍の借り手であること
/// - 返却期限を過ぎており、有効なペナルティがない場合はペナルティを課す
///
/// # 一貫性保証
///
/// `borrow_book()`と同じ。
pub async fn return_book(deps: &ServiceDependencies, cmd: ReturnBook) -> Result<BookReturned> {
    let _guard = deps.locks.lock_loan(&cmd.book_code, &cmd.member_code).await;

    let (book, member) = load_book_and_member(deps, &cmd.book_code, &cmd.member_code).await?;

    let (new_book, new_member, event) =
        domain::loan::return_book(&book, &member, cmd.requested_at, &deps.policy).map_err(
            |e| {
                tracing::debug!(
                    book_code = %cmd.book_code,
                    member_code = %cmd.member_code,
                    reason = ?e,
                    "Return rejected"
                );
                return_error(e, &cmd)
            },
        )?;

    commit(deps, (&book, &member), (new_book, new_member)).await?;

    tracing::info!(
        book_code = %event.book_code,
        member_code = %event.member_code,
        was_late = event.was_late,
        penalty_imposed = event.penalty_imposed,
        "Book returned"
    );

    Ok(event)
}
