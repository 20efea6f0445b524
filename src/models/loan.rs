//! Loans tie a book to the member borrowing it.

use super::Model;
use crate::types::LOANS;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A loan, active until `return_date` is set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub loan_id: String,
    pub book_isbn: String,
    pub member_id: String,
    pub loan_date: NaiveDateTime,

    /// Written as `null` while the loan is active.
    #[serde(default)]
    pub return_date: Option<NaiveDateTime>,
}

impl Loan {
    pub const LOAN_ID: &'static str = "loanId";
    pub const BOOK_ISBN: &'static str = "bookIsbn";
    pub const MEMBER_ID: &'static str = "memberId";
    pub const RETURN_DATE: &'static str = "returnDate";

    /// An active loan starting at `loan_date`.
    pub fn open(
        loan_id: impl Into<String>,
        book_isbn: impl Into<String>,
        member_id: impl Into<String>,
        loan_date: NaiveDateTime,
    ) -> Self {
        Self {
            loan_id: loan_id.into(),
            book_isbn: book_isbn.into(),
            member_id: member_id.into(),
            loan_date,
            return_date: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.return_date.is_none()
    }
}

impl Model for Loan {
    const COLLECTION: &'static str = LOANS;
    const KEY_FIELD: &'static str = Self::LOAN_ID;

    fn key(&self) -> &str {
        &self.loan_id
    }
}
