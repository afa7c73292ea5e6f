mod errors;
mod loan_service;
mod locks;

pub use errors::{ErrorKind, LoanApplicationError, Result};
pub use loan_service::{ServiceDependencies, borrow_book, return_book};
pub use locks::{KeyedLocks, LoanLockGuard};
