pub mod book_repository;
pub mod loan_store;
pub mod member_repository;

pub use book_repository::BookRepository;
pub use loan_store::{ApplyOutcome, LoanStore, LoanUpdate};
pub use member_repository::MemberRepository;
