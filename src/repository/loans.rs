//! Loan ledger repository.
//!
//! Checkout and return are the only write paths for `books.available`;
//! both run in a single transaction so the flag always matches
//! "no open loan references this book".

use chrono::{NaiveDate, Utc};
use sqlx::{postgres::PgRow, Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::loan::{self, CreateLoan, Loan, LoanDetails, LoanSummary},
};

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

const LOAN_DETAILS_SELECT: &str = r#"
    SELECT l.id, l.member_id, l.book_id, l.loan_date, l.due_date, l.returned_date,
           b.title AS book_title, b.author AS book_author,
           m.name AS member_name, m.email AS member_email
    FROM loans l
    JOIN members m ON l.member_id = m.id
    JOIN books b ON l.book_id = b.id
"#;

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Create a new loan (check a book out to a member).
    ///
    /// All preconditions are checked and both writes happen under one
    /// transaction holding a row lock on the book, so two concurrent
    /// checkouts of the same book serialize here and only one can see
    /// `available = true`.
    pub async fn create(&self, loan: &CreateLoan) -> AppResult<LoanSummary> {
        let today = Utc::now().date_naive();

        let mut tx = self.pool.begin().await?;

        // Lock the book row for the duration of the transaction
        let book = sqlx::query("SELECT title, available FROM books WHERE id = $1 FOR UPDATE")
            .bind(loan.book_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", loan.book_id)))?;

        let book_title: String = book.get("title");
        let available: bool = book.get("available");

        let member_name: String = sqlx::query_scalar("SELECT name FROM members WHERE id = $1")
            .bind(loan.member_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Member with id {} not found", loan.member_id))
            })?;

        let duplicate: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM loans WHERE member_id = $1 AND book_id = $2 AND returned_date IS NULL)",
        )
        .bind(loan.member_id)
        .bind(loan.book_id)
        .fetch_one(&mut *tx)
        .await?;

        if duplicate {
            return Err(AppError::Conflict(
                "Member already has this book on loan".to_string(),
            ));
        }

        if !available {
            return Err(AppError::Conflict(format!(
                "Book '{}' is not available for loan",
                book_title
            )));
        }

        let loan_id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO loans (member_id, book_id, loan_date, due_date)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(loan.member_id)
        .bind(loan.book_id)
        .bind(today)
        .bind(loan.due_date)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE books SET available = FALSE, updated_at = now() WHERE id = $1")
            .bind(loan.book_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(LoanSummary {
            id: loan_id,
            book_id: loan.book_id,
            book_title,
            member_name,
            available: false,
        })
    }

    /// Return a loan: stamp the return date and free the book, atomically.
    pub async fn return_loan(&self, loan_id: i32) -> AppResult<LoanSummary> {
        let today = Utc::now().date_naive();

        let mut tx = self.pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(loan_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", loan_id)))?;

        if loan.returned_date.is_some() {
            return Err(AppError::Conflict(
                "This loan has already been returned".to_string(),
            ));
        }

        sqlx::query("UPDATE loans SET returned_date = $1 WHERE id = $2")
            .bind(today)
            .bind(loan_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE books SET available = TRUE, updated_at = now() WHERE id = $1")
            .bind(loan.book_id)
            .execute(&mut *tx)
            .await?;

        let book_title: String = sqlx::query_scalar("SELECT title FROM books WHERE id = $1")
            .bind(loan.book_id)
            .fetch_one(&mut *tx)
            .await?;

        let member_name: String = sqlx::query_scalar("SELECT name FROM members WHERE id = $1")
            .bind(loan.member_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(LoanSummary {
            id: loan.id,
            book_id: loan.book_id,
            book_title,
            member_name,
            available: true,
        })
    }

    /// Get loan with joined details by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<LoanDetails> {
        let today = Utc::now().date_naive();

        let row = sqlx::query(&format!("{} WHERE l.id = $1", LOAN_DETAILS_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))?;

        Ok(loan_details_from_row(&row, today))
    }

    /// All loans, newest first
    pub async fn list_all(&self) -> AppResult<Vec<LoanDetails>> {
        let today = Utc::now().date_naive();

        let rows = sqlx::query(&format!(
            "{} ORDER BY l.loan_date DESC, l.id DESC",
            LOAN_DETAILS_SELECT
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|r| loan_details_from_row(r, today)).collect())
    }

    /// Open loans only, newest first
    pub async fn list_active(&self) -> AppResult<Vec<LoanDetails>> {
        let today = Utc::now().date_naive();

        let rows = sqlx::query(&format!(
            "{} WHERE l.returned_date IS NULL ORDER BY l.loan_date DESC, l.id DESC",
            LOAN_DETAILS_SELECT
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|r| loan_details_from_row(r, today)).collect())
    }

    /// All loans for a member, newest first
    pub async fn list_by_member(&self, member_id: i32) -> AppResult<Vec<LoanDetails>> {
        let today = Utc::now().date_naive();

        let rows = sqlx::query(&format!(
            "{} WHERE l.member_id = $1 ORDER BY l.loan_date DESC, l.id DESC",
            LOAN_DETAILS_SELECT
        ))
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|r| loan_details_from_row(r, today)).collect())
    }
}

fn loan_details_from_row(row: &PgRow, today: NaiveDate) -> LoanDetails {
    let due_date: Option<NaiveDate> = row.get("due_date");
    let returned_date: Option<NaiveDate> = row.get("returned_date");

    LoanDetails {
        id: row.get("id"),
        member_id: row.get("member_id"),
        book_id: row.get("book_id"),
        loan_date: row.get("loan_date"),
        due_date,
        returned_date,
        book_title: row.get("book_title"),
        book_author: row.get("book_author"),
        member_name: row.get("member_name"),
        member_email: row.get("member_email"),
        is_overdue: loan::is_overdue(due_date, returned_date, today),
    }
}
