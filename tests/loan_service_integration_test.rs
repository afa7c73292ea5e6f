use async_trait::async_trait;
use chrono::{Duration, Utc};
use rusty_library_lending::adapters::memory::LibraryStore;
use rusty_library_lending::application::loan::{
    ErrorKind, LoanApplicationError, ServiceDependencies, borrow_book, return_book,
};
use rusty_library_lending::domain::commands::{BorrowBook, ReturnBook};
use rusty_library_lending::domain::loan::LoanPolicy;
use rusty_library_lending::domain::{Book, Member};
use rusty_library_lending::ports::*;
use std::sync::Arc;

mod common;
use common::{book_code, in_memory_deps, member_code, seeded_store};

// ============================================================================
// ヘルパー
// ============================================================================

fn borrow_cmd(book: &str, member: &str, at: chrono::DateTime<Utc>) -> BorrowBook {
    BorrowBook {
        book_code: book_code(book),
        member_code: member_code(member),
        requested_at: at,
    }
}

fn return_cmd(book: &str, member: &str, at: chrono::DateTime<Utc>) -> ReturnBook {
    ReturnBook {
        book_code: book_code(book),
        member_code: member_code(member),
        requested_at: at,
    }
}

async fn load_book(store: &LibraryStore, code: &str) -> Book {
    BookRepository::find_by_code(store, &book_code(code))
        .await
        .unwrap()
        .unwrap()
}

async fn load_member(store: &LibraryStore, code: &str) -> Member {
    MemberRepository::find_by_code(store, &member_code(code))
        .await
        .unwrap()
        .unwrap()
}

/// 会員の貸出冊数と、その会員が借り手になっている書籍数が一致することを確認
async fn assert_quantity_matches_books(store: &LibraryStore, member: &str) {
    let loaned = store.find_borrowed_by(&member_code(member)).await.unwrap();
    let member = load_member(store, member).await;
    assert_eq!(member.loan_book_quantity.value() as usize, loaned.len());
}

/// 常にStaleを返すLoanStore（他プロセスとの競合を模擬）
struct StaleLoanStore;

#[async_trait]
impl LoanStore for StaleLoanStore {
    async fn apply(&self, _update: LoanUpdate) -> loan_store::Result<ApplyOutcome> {
        Ok(ApplyOutcome::Stale)
    }
}

/// 常に失敗するLoanStore
struct FailingLoanStore;

#[async_trait]
impl LoanStore for FailingLoanStore {
    async fn apply(&self, _update: LoanUpdate) -> loan_store::Result<ApplyOutcome> {
        Err("connection reset".into())
    }
}

fn deps_with_loan_store(store: &LibraryStore, loan_store: Arc<dyn LoanStore>) -> ServiceDependencies {
    ServiceDependencies::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        loan_store,
        LoanPolicy::default(),
    )
}

// ============================================================================
// シナリオ
// ============================================================================

#[tokio::test]
async fn test_borrow_then_late_return_scenario() {
    let store = seeded_store(&["M122"], &["A001"]).await;
    let deps = in_memory_deps(&store);
    let policy = deps.policy;
    let t0 = Utc::now();

    // Borrow(M122, A001, t0)
    let borrowed = borrow_book(&deps, borrow_cmd("M122", "A001", t0)).await.unwrap();
    assert_eq!(borrowed.loan_deadline, t0 + policy.borrow_period);

    let book = load_book(&store, "M122").await;
    assert_eq!(book.stock, 0);
    assert_eq!(book.borrowed_by(), Some(&member_code("A001")));
    assert_eq!(book.loan_deadline(), Some(t0 + policy.borrow_period));
    assert_eq!(load_member(&store, "A001").await.loan_book_quantity.value(), 1);

    // Return(M122, A001, t0 + borrowPeriod + 1day)
    let returned_at = t0 + policy.borrow_period + Duration::days(1);
    let returned = return_book(&deps, return_cmd("M122", "A001", returned_at))
        .await
        .unwrap();
    assert!(returned.was_late);
    assert!(returned.penalty_imposed);

    let book = load_book(&store, "M122").await;
    assert_eq!(book.stock, 1);
    assert_eq!(book.borrowed_by(), None);
    assert_eq!(book.loan_deadline(), None);

    let member = load_member(&store, "A001").await;
    assert_eq!(member.loan_book_quantity.value(), 0);
    assert_eq!(member.penalty_time, Some(returned_at + policy.penalty_period));
}

#[tokio::test]
async fn test_borrow_then_immediate_return_restores_state() {
    let store = seeded_store(&["M122"], &["A001"]).await;
    let deps = in_memory_deps(&store);
    let now = Utc::now();

    borrow_book(&deps, borrow_cmd("M122", "A001", now)).await.unwrap();
    let returned = return_book(&deps, return_cmd("M122", "A001", now)).await.unwrap();

    assert!(!returned.penalty_imposed);
    assert_eq!(returned.penalty_until, None);
    assert_eq!(load_book(&store, "M122").await.stock, 1);
    let member = load_member(&store, "A001").await;
    assert_eq!(member.loan_book_quantity.value(), 0);
    assert_eq!(member.penalty_time, None);
}

#[tokio::test]
async fn test_penalized_member_is_refused_until_penalty_expires() {
    let store = seeded_store(&["M122", "JK-45"], &["A001"]).await;
    let deps = in_memory_deps(&store);
    let policy = deps.policy;
    let t0 = Utc::now();

    borrow_book(&deps, borrow_cmd("M122", "A001", t0)).await.unwrap();
    let returned_at = t0 + policy.borrow_period + Duration::days(1);
    return_book(&deps, return_cmd("M122", "A001", returned_at))
        .await
        .unwrap();

    let during = returned_at + Duration::days(1);
    let err = borrow_book(&deps, borrow_cmd("JK-45", "A001", during))
        .await
        .unwrap_err();
    assert!(matches!(err, LoanApplicationError::MemberInPenaltyPeriod { .. }));
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let after = returned_at + policy.penalty_period;
    borrow_book(&deps, borrow_cmd("JK-45", "A001", after))
        .await
        .unwrap();
    assert_eq!(load_member(&store, "A001").await.penalty_time, None);
}

// ============================================================================
// 事前条件
// ============================================================================

#[tokio::test]
async fn test_borrow_unknown_book_is_not_found() {
    let store = seeded_store(&["M122"], &["A001"]).await;
    let deps = in_memory_deps(&store);

    let err = borrow_book(&deps, borrow_cmd("NOPE", "A001", Utc::now()))
        .await
        .unwrap_err();
    assert!(matches!(err, LoanApplicationError::BookNotFound(_)));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_missing_book_is_reported_before_missing_member() {
    let store = seeded_store(&[], &[]).await;
    let deps = in_memory_deps(&store);

    let err = return_book(&deps, return_cmd("NOPE", "NOBODY", Utc::now()))
        .await
        .unwrap_err();
    assert!(matches!(err, LoanApplicationError::BookNotFound(_)));
}

#[tokio::test]
async fn test_borrow_unknown_member_is_not_found() {
    let store = seeded_store(&["M122"], &["A001"]).await;
    let deps = in_memory_deps(&store);

    let err = borrow_book(&deps, borrow_cmd("M122", "Z999", Utc::now()))
        .await
        .unwrap_err();
    assert!(matches!(err, LoanApplicationError::MemberNotFound(_)));
}

#[tokio::test]
async fn test_borrowing_borrowed_book_conflicts_for_any_member() {
    let store = seeded_store(&["M122"], &["A001", "B002"]).await;
    let deps = in_memory_deps(&store);
    let now = Utc::now();

    borrow_book(&deps, borrow_cmd("M122", "A001", now)).await.unwrap();

    for member in ["A001", "B002"] {
        let err = borrow_book(&deps, borrow_cmd("M122", member, now))
            .await
            .unwrap_err();
        assert!(matches!(err, LoanApplicationError::BookAlreadyBorrowed));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }
}

#[tokio::test]
async fn test_return_by_non_borrower_is_bad_request() {
    let store = seeded_store(&["M122", "JK-45"], &["A001", "B002"]).await;
    let deps = in_memory_deps(&store);
    let now = Utc::now();

    borrow_book(&deps, borrow_cmd("M122", "A001", now)).await.unwrap();

    let err = return_book(&deps, return_cmd("M122", "B002", now))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);

    // 誰も借りていない書籍の返却も同じ扱い
    let err = return_book(&deps, return_cmd("JK-45", "A001", now))
        .await
        .unwrap_err();
    assert!(matches!(err, LoanApplicationError::NotTheBorrower { .. }));

    assert_quantity_matches_books(&store, "A001").await;
    assert_quantity_matches_books(&store, "B002").await;
}

#[tokio::test]
async fn test_third_loan_is_forbidden_until_one_is_returned() {
    let store = seeded_store(&["B1", "B2", "B3"], &["A001"]).await;
    let deps = in_memory_deps(&store);
    let now = Utc::now();

    borrow_book(&deps, borrow_cmd("B1", "A001", now)).await.unwrap();
    borrow_book(&deps, borrow_cmd("B2", "A001", now)).await.unwrap();

    let err = borrow_book(&deps, borrow_cmd("B3", "A001", now))
        .await
        .unwrap_err();
    assert!(matches!(err, LoanApplicationError::LoanLimitReached(_)));
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert_quantity_matches_books(&store, "A001").await;

    return_book(&deps, return_cmd("B1", "A001", now)).await.unwrap();
    borrow_book(&deps, borrow_cmd("B3", "A001", now)).await.unwrap();
    assert_quantity_matches_books(&store, "A001").await;
    assert_eq!(load_member(&store, "A001").await.loan_book_quantity.value(), 2);
}

// ============================================================================
// 並行性と原子性
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_borrows_of_one_book_have_exactly_one_winner() {
    let members: Vec<String> = (0..8).map(|i| format!("C{i:03}")).collect();
    let member_refs: Vec<&str> = members.iter().map(String::as_str).collect();
    let store = seeded_store(&["M122"], &member_refs).await;
    let deps = Arc::new(in_memory_deps(&store));
    let now = Utc::now();

    let handles: Vec<_> = members
        .iter()
        .map(|member| {
            let deps = deps.clone();
            let cmd = borrow_cmd("M122", member, now);
            tokio::spawn(async move { borrow_book(&deps, cmd).await })
        })
        .collect();

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(err) => assert_eq!(err.kind(), ErrorKind::Conflict),
        }
    }
    assert_eq!(successes, 1);

    let book = load_book(&store, "M122").await;
    assert_eq!(book.stock, 0);
    for member in &members {
        assert_quantity_matches_books(&store, member).await;
    }
}

#[tokio::test]
async fn test_stale_write_is_reported_as_concurrent_update() {
    let store = seeded_store(&["M122"], &["A001"]).await;
    let deps = deps_with_loan_store(&store, Arc::new(StaleLoanStore));

    let err = borrow_book(&deps, borrow_cmd("M122", "A001", Utc::now()))
        .await
        .unwrap_err();
    assert!(matches!(err, LoanApplicationError::ConcurrentUpdate));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(load_book(&store, "M122").await.is_available());
}

#[tokio::test]
async fn test_store_failure_is_internal_and_leaves_records_untouched() {
    let store = seeded_store(&["M122"], &["A001"]).await;
    let deps = deps_with_loan_store(&store, Arc::new(FailingLoanStore));

    let err = borrow_book(&deps, borrow_cmd("M122", "A001", Utc::now()))
        .await
        .unwrap_err();
    assert!(matches!(err, LoanApplicationError::LoanStoreError(_)));
    assert_eq!(err.kind(), ErrorKind::Internal);

    assert_eq!(load_book(&store, "M122").await.stock, 1);
    assert_eq!(load_member(&store, "A001").await.loan_book_quantity.value(), 0);
}
