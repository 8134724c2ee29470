//! Loan ledger service

use crate::{
    error::AppResult,
    models::{
        loan::{CreateLoan, LoanDetails, LoanSummary},
        member::Member,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
}

impl LoansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Create a new loan (check a book out to a member).
    /// Existence, availability and duplicate checks all happen inside the
    /// ledger transaction.
    pub async fn create_loan(&self, loan: CreateLoan) -> AppResult<LoanSummary> {
        self.repository.loans.create(&loan).await
    }

    /// Return a borrowed book
    pub async fn return_loan(&self, loan_id: i32) -> AppResult<LoanSummary> {
        self.repository.loans.return_loan(loan_id).await
    }

    /// Get loan details by ID
    pub async fn get_loan(&self, loan_id: i32) -> AppResult<LoanDetails> {
        self.repository.loans.get_by_id(loan_id).await
    }

    /// List all loans
    pub async fn list_loans(&self) -> AppResult<Vec<LoanDetails>> {
        self.repository.loans.list_all().await
    }

    /// List open loans
    pub async fn list_active(&self) -> AppResult<Vec<LoanDetails>> {
        self.repository.loans.list_active().await
    }

    /// Get loans for a member together with the member record
    pub async fn get_member_loans(&self, member_id: i32) -> AppResult<(Member, Vec<LoanDetails>)> {
        // Verify member exists
        let member = self.repository.members.get_by_id(member_id).await?;
        let loans = self.repository.loans.list_by_member(member_id).await?;
        Ok((member, loans))
    }
}
