//! Loan (borrow) model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Loan row from database. `returned_date` is `None` while the loan is open.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub borrowed_date: DateTime<Utc>,
    pub due_date: NaiveDate,
    pub returned_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loan {
    pub fn is_open(&self) -> bool {
        self.returned_date.is_none()
    }
}

/// Fields of a loan about to be opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewLoan {
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub due_date: NaiveDate,
}

/// Borrow request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BorrowRequest {
    pub book_id: Uuid,
    /// Due date (YYYY-MM-DD)
    pub due_date: String,
}

/// Return request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReturnRequest {
    pub book_id: Uuid,
    /// Return date (YYYY-MM-DD)
    pub returned_date: String,
}

/// Outcome of a successful return
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReturnReceipt {
    pub book_id: Uuid,
    pub user_id: Uuid,
    pub returned_date: NaiveDate,
}
