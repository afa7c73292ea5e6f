//! 書籍・会員の一括登録と一括削除

use crate::domain::{Book, BookCode, Member, MemberCode};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::loan::ServiceDependencies;

/// シードファイルの書籍レコード
#[derive(Debug, Clone, Deserialize)]
pub struct SeedBook {
    pub code: String,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub stock: u32,
}

/// シードファイルの会員レコード
#[derive(Debug, Clone, Deserialize)]
pub struct SeedMember {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid {kind} at index {index}: {reason}")]
    InvalidRecord {
        kind: &'static str,
        index: usize,
        reason: String,
    },

    #[error("Duplicate {kind} code {code}")]
    DuplicateCode { kind: &'static str, code: String },

    #[error("Book repository error")]
    BookRepositoryError(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Member repository error")]
    MemberRepositoryError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// 登録・削除した件数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub books: u64,
    pub members: u64,
}

/// JSON配列のシードファイルを読み込む
pub fn read_seed_file<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, SeedError> {
    let file = File::open(path).map_err(|source| SeedError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_reader(BufReader::new(file)).map_err(|source| SeedError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn prepare_books(seed: Vec<SeedBook>, now: DateTime<Utc>) -> Result<Vec<Book>, SeedError> {
    let mut seen = HashSet::new();
    seed.into_iter()
        .enumerate()
        .map(|(index, record)| {
            let code = BookCode::parse(&record.code).map_err(|e| SeedError::InvalidRecord {
                kind: "book",
                index,
                reason: e.to_string(),
            })?;
            if !seen.insert(code.clone()) {
                return Err(SeedError::DuplicateCode {
                    kind: "book",
                    code: code.to_string(),
                });
            }
            Ok(Book::new(code, record.title, record.author, record.stock, now))
        })
        .collect()
}

fn prepare_members(seed: Vec<SeedMember>, now: DateTime<Utc>) -> Result<Vec<Member>, SeedError> {
    let mut seen = HashSet::new();
    seed.into_iter()
        .enumerate()
        .map(|(index, record)| {
            let invalid = |reason: String| SeedError::InvalidRecord {
                kind: "member",
                index,
                reason,
            };
            let code = MemberCode::parse(&record.code).map_err(|e| invalid(e.to_string()))?;
            if !seen.insert(code.clone()) {
                return Err(SeedError::DuplicateCode {
                    kind: "member",
                    code: code.to_string(),
                });
            }
            Member::new(code, &record.name, now).map_err(|e| invalid(e.to_string()))
        })
        .collect()
}

/// 登録済みのコードと重複していないか確認する
async fn ensure_not_stored(
    deps: &ServiceDependencies,
    books: &[Book],
    members: &[Member],
) -> Result<(), SeedError> {
    let (stored_books, stored_members) = futures::try_join!(
        async {
            deps.books
                .find_all()
                .await
                .map_err(SeedError::BookRepositoryError)
        },
        async {
            deps.members
                .find_all()
                .await
                .map_err(SeedError::MemberRepositoryError)
        },
    )?;

    let stored: HashSet<BookCode> = stored_books.into_iter().map(|b| b.code).collect();
    if let Some(book) = books.iter().find(|b| stored.contains(&b.code)) {
        return Err(SeedError::DuplicateCode {
            kind: "book",
            code: book.code.to_string(),
        });
    }

    let stored: HashSet<MemberCode> = stored_members.into_iter().map(|m| m.code).collect();
    if let Some(member) = members.iter().find(|m| stored.contains(&m.code)) {
        return Err(SeedError::DuplicateCode {
            kind: "member",
            code: member.code.to_string(),
        });
    }

    Ok(())
}

/// 書籍と会員を一括登録する
///
/// すべてのレコードを検証し、登録済みのコードとの重複も確認してから書き込む。
/// 検証エラーがあれば何も登録しない。
/// 書籍と会員はそれぞれ別の単位で書き込まれるため、確認後に他の書き込みと
/// 競合した場合は書籍だけが登録されて残ることがある。
pub async fn import(
    deps: &ServiceDependencies,
    books: Vec<SeedBook>,
    members: Vec<SeedMember>,
    now: DateTime<Utc>,
) -> Result<SeedReport, SeedError> {
    let books = prepare_books(books, now)?;
    let members = prepare_members(members, now)?;
    ensure_not_stored(deps, &books, &members).await?;

    let report = SeedReport {
        books: books.len() as u64,
        members: members.len() as u64,
    };

    deps.books
        .insert_many(books)
        .await
        .map_err(SeedError::BookRepositoryError)?;
    deps.members
        .insert_many(members)
        .await
        .map_err(SeedError::MemberRepositoryError)?;

    tracing::info!(books = report.books, members = report.members, "Seed data imported");

    Ok(report)
}

/// すべての書籍と会員を削除する
pub async fn destroy(deps: &ServiceDependencies) -> Result<SeedReport, SeedError> {
    let books = deps
        .books
        .delete_all()
        .await
        .map_err(SeedError::BookRepositoryError)?;
    let members = deps
        .members
        .delete_all()
        .await
        .map_err(SeedError::MemberRepositoryError)?;

    tracing::info!(books, members, "Seed data destroyed");

    Ok(SeedReport { books, members })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_book(code: &str) -> SeedBook {
        SeedBook {
            code: code.to_string(),
            title: "Harry Potter".to_string(),
            author: "J.K Rowling".to_string(),
            stock: 1,
        }
    }

    #[test]
    fn test_prepare_books_starts_unborrowed() {
        let books = prepare_books(vec![seed_book("JK-45"), seed_book("SHR-1")], Utc::now()).unwrap();
        assert_eq!(books.len(), 2);
        assert!(books.iter().all(Book::is_available));
        assert_eq!(books[0].stock, 1);
    }

    #[test]
    fn test_prepare_books_rejects_duplicates() {
        let result = prepare_books(vec![seed_book("JK-45"), seed_book("JK-45")], Utc::now());
        assert!(matches!(result, Err(SeedError::DuplicateCode { kind: "book", .. })));
    }

    #[test]
    fn test_prepare_members_rejects_blank_name() {
        let result = prepare_members(
            vec![SeedMember {
                code: "M001".to_string(),
                name: "  ".to_string(),
            }],
            Utc::now(),
        );
        assert!(matches!(
            result,
            Err(SeedError::InvalidRecord { kind: "member", index: 0, .. })
        ));
    }

    #[test]
    fn test_seed_book_stock_defaults_to_zero() {
        let book: SeedBook =
            serde_json::from_str(r#"{"code":"NRN-7","title":"The Lion","author":"C.S. Lewis"}"#)
                .unwrap();
        assert_eq!(book.stock, 0);
    }
}
