//! Data models shared between the repository and API layers

pub mod book;
pub mod loan;
pub mod member;

pub use book::{Book, CreateBook, UpdateBook};
pub use loan::{CreateLoan, Loan, LoanDetails, LoanSummary};
pub use member::{CreateMember, Member, UpdateMember};
