use crate::domain::{BookCode, MemberCode};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// 使われていないエントリを掃除し始める件数
const PRUNE_THRESHOLD: usize = 1024;

/// キーごとの排他ロック表
///
/// 同じ書籍・同じ会員に対する読み込みから書き込みまでを直列化する。
/// プロセス内の排他のみを担い、プロセス間の競合は`LoanStore`の
/// 楽観的排他制御で検出する。
#[derive(Default)]
pub struct KeyedLocks {
    entries: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

/// 貸出・返却1回分のロック
///
/// ドロップ時に両方のロックを解放する。
pub struct LoanLockGuard {
    _book: OwnedMutexGuard<()>,
    _member: OwnedMutexGuard<()>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// 書籍と会員のロックを取得する
    ///
    /// 常に書籍、会員の順に取得するため、デッドロックしない。
    pub async fn lock_loan(&self, book_code: &BookCode, member_code: &MemberCode) -> LoanLockGuard {
        let book = self.lock(format!("book:{book_code}")).await;
        let member = self.lock(format!("member:{member_code}")).await;

        LoanLockGuard {
            _book: book,
            _member: member,
        }
    }

    async fn lock(&self, key: String) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            if entries.len() >= PRUNE_THRESHOLD {
                // 参照が表だけのエントリは誰も保持・待機していない
                entries.retain(|_, mutex| Arc::strong_count(mutex) > 1);
            }
            entries.entry(key).or_default().clone()
        };

        mutex.lock_owned().await
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn codes(book: &str, member: &str) -> (BookCode, MemberCode) {
        (BookCode::parse(book).unwrap(), MemberCode::parse(member).unwrap())
    }

    #[tokio::test]
    async fn test_same_book_is_serialized() {
        let locks = Arc::new(KeyedLocks::new());
        let (book, member_a) = codes("M122", "A001");
        let (_, member_b) = codes("M122", "B002");

        let guard = locks.lock_loan(&book, &member_a).await;

        let locks2 = locks.clone();
        let book2 = book.clone();
        let waiter = tokio::spawn(async move {
            let _guard = locks2.lock_loan(&book2, &member_b).await;
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks = KeyedLocks::new();
        let (book_a, member_a) = codes("M122", "A001");
        let (book_b, member_b) = codes("JK-45", "B002");

        let _first = locks.lock_loan(&book_a, &member_a).await;
        let second = tokio::time::timeout(
            Duration::from_millis(100),
            locks.lock_loan(&book_b, &member_b),
        )
        .await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_idle_entries_are_pruned() {
        let locks = KeyedLocks::new();
        for i in 0..PRUNE_THRESHOLD / 2 {
            let (book, member) = codes(&format!("B{i}"), &format!("M{i}"));
            drop(locks.lock_loan(&book, &member).await);
        }
        assert_eq!(locks.len(), PRUNE_THRESHOLD);

        let (book, member) = codes("LAST", "LAST");
        let _guard = locks.lock_loan(&book, &member).await;
        assert!(locks.len() < PRUNE_THRESHOLD);
    }
}
