pub mod book_repository;
pub mod loan_store;
pub mod member_repository;
mod rows;

// パブリックに型を再エクスポート
pub use book_repository::BookRepository as PostgresBookRepository;
pub use loan_store::LoanStore as PostgresLoanStore;
pub use member_repository::MemberRepository as PostgresMemberRepository;
