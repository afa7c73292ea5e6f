pub mod loan;
pub mod seed;
