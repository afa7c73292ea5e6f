use crate::domain::{Book, BookCode, Member, MemberCode};
use crate::ports::book_repository::{self, BookRepository};
use crate::ports::loan_store::{self, ApplyOutcome, LoanStore, LoanUpdate};
use crate::ports::member_repository::{self, MemberRepository};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
#[error("duplicate {kind} code {code}")]
pub struct DuplicateCode {
    kind: &'static str,
    code: String,
}

#[derive(Default)]
struct State {
    books: BTreeMap<BookCode, Book>,
    members: BTreeMap<MemberCode, Member>,
}

/// In-memory implementation of every record store port.
///
/// Books and members live behind a single lock, so `apply` updates both
/// records atomically. Cloning shares the same underlying state.
#[derive(Default, Clone)]
pub struct LibraryStore {
    state: Arc<RwLock<State>>,
}

impl LibraryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookRepository for LibraryStore {
    async fn find_by_code(&self, code: &BookCode) -> book_repository::Result<Option<Book>> {
        let state = self.state.read().await;
        Ok(state.books.get(code).cloned())
    }

    async fn find_all(&self) -> book_repository::Result<Vec<Book>> {
        let state = self.state.read().await;
        Ok(state.books.values().cloned().collect())
    }

    async fn find_available(&self) -> book_repository::Result<Vec<Book>> {
        let state = self.state.read().await;
        Ok(state
            .books
            .values()
            .filter(|book| book.is_available())
            .cloned()
            .collect())
    }

    async fn find_borrowed_by(
        &self,
        member_code: &MemberCode,
    ) -> book_repository::Result<Vec<Book>> {
        let state = self.state.read().await;
        Ok(state
            .books
            .values()
            .filter(|book| book.is_borrowed_by(member_code))
            .cloned()
            .collect())
    }

    async fn insert_many(&self, books: Vec<Book>) -> book_repository::Result<()> {
        let mut state = self.state.write().await;
        if let Some(book) = books.iter().find(|b| state.books.contains_key(&b.code)) {
            return Err(DuplicateCode {
                kind: "book",
                code: book.code.to_string(),
            }
            .into());
        }
        state
            .books
            .extend(books.into_iter().map(|book| (book.code.clone(), book)));
        Ok(())
    }

    async fn delete_all(&self) -> book_repository::Result<u64> {
        let mut state = self.state.write().await;
        let removed = state.books.len() as u64;
        state.books.clear();
        Ok(removed)
    }
}

#[async_trait]
impl MemberRepository for LibraryStore {
    async fn find_by_code(&self, code: &MemberCode) -> member_repository::Result<Option<Member>> {
        let state = self.state.read().await;
        Ok(state.members.get(code).cloned())
    }

    async fn find_all(&self) -> member_repository::Result<Vec<Member>> {
        let state = self.state.read().await;
        Ok(state.members.values().cloned().collect())
    }

    async fn insert_many(&self, members: Vec<Member>) -> member_repository::Result<()> {
        let mut state = self.state.write().await;
        if let Some(member) = members.iter().find(|m| state.members.contains_key(&m.code)) {
            return Err(DuplicateCode {
                kind: "member",
                code: member.code.to_string(),
            }
            .into());
        }
        state
            .members
            .extend(members.into_iter().map(|member| (member.code.clone(), member)));
        Ok(())
    }

    async fn delete_all(&self) -> member_repository::Result<u64> {
        let mut state = self.state.write().await;
        let removed = state.members.len() as u64;
        state.members.clear();
        Ok(removed)
    }
}

#[async_trait]
impl LoanStore for LibraryStore {
    /// Re-validates both guards and writes both records under one write lock.
    async fn apply(&self, update: LoanUpdate) -> loan_store::Result<ApplyOutcome> {
        let mut state = self.state.write().await;

        let book_matches = state
            .books
            .get(&update.book.code)
            .is_some_and(|book| book.borrowed_by() == update.expected_borrowed_by.as_ref());
        let member_matches = state
            .members
            .get(&update.member.code)
            .is_some_and(|member| member.loan_book_quantity == update.expected_loan_book_quantity);

        if !(book_matches && member_matches) {
            return Ok(ApplyOutcome::Stale);
        }

        state.books.insert(update.book.code.clone(), update.book);
        state.members.insert(update.member.code.clone(), update.member);
        Ok(ApplyOutcome::Applied)
    }
}
