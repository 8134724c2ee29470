//! Loan (ledger entry) model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Loan model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Loan {
    pub id: i32,
    pub member_id: i32,
    pub book_id: i32,
    pub loan_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub returned_date: Option<NaiveDate>,
}

/// Loan with joined book and member fields for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoanDetails {
    pub id: i32,
    pub member_id: i32,
    pub book_id: i32,
    pub loan_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub returned_date: Option<NaiveDate>,
    pub book_title: String,
    pub book_author: String,
    pub member_name: String,
    pub member_email: String,
    pub is_overdue: bool,
}

/// Create loan request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLoan {
    pub member_id: i32,
    pub book_id: i32,
    /// Informational only; the ledger never enforces it
    pub due_date: Option<NaiveDate>,
}

/// Result of a checkout or return, joined with book title and member name
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoanSummary {
    pub id: i32,
    pub book_id: i32,
    pub book_title: String,
    pub member_name: String,
    /// Availability of the book after the operation
    pub available: bool,
}

/// An open loan past its due date is overdue
pub fn is_overdue(due_date: Option<NaiveDate>, returned_date: Option<NaiveDate>, today: NaiveDate) -> bool {
    returned_date.is_none() && due_date.map(|d| d < today).unwrap_or(false)
}
