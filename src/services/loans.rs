//! Loan coordinator: borrow and return as single atomic units
//!
//! Both protocols follow the same shape. The date is validated and the
//! title's stock record is confirmed before any transaction exists; then,
//! inside one transaction, the stock row is locked first so that concurrent
//! requests for the same title serialize before they inspect loan state.
//! Whatever happens after `begin`, the transaction ends in exactly one
//! commit or one rollback decided here.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult, LoanError},
    models::{
        loan::{BorrowRequest, Loan, NewLoan, ReturnReceipt, ReturnRequest},
        parse_date,
    },
    repository::{LoanLedger, Repository},
};

pub struct LoansService<L: LoanLedger = Repository> {
    ledger: Arc<L>,
}

impl<L: LoanLedger> Clone for LoansService<L> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
        }
    }
}

impl<L: LoanLedger> LoansService<L> {
    pub fn new(ledger: L) -> Self {
        Self::from_shared(Arc::new(ledger))
    }

    pub fn from_shared(ledger: Arc<L>) -> Self {
        Self { ledger }
    }

    /// Borrow one copy of `request.book_id` for `user_id`
    pub async fn borrow(&self, user_id: Uuid, request: &BorrowRequest) -> AppResult<Loan> {
        let book_id = request.book_id;
        let due_date = parse_date(&request.due_date).ok_or_else(|| {
            tracing::warn!(%book_id, %user_id, due_date = %request.due_date, "borrow: malformed due date");
            LoanError::InvalidDate
        })?;
        self.ensure_stock_exists(book_id, "borrow").await?;

        let loan = NewLoan {
            user_id,
            book_id,
            due_date,
        };
        let mut tx = self.ledger.begin().await?;
        let outcome = self.borrow_in_tx(&mut tx, &loan).await;
        let created = self.finish(tx, outcome, "borrow").await?;

        tracing::info!(%book_id, %user_id, loan_id = %created.id, "book borrowed");
        Ok(created)
    }

    /// Return the copy of `request.book_id` held by `user_id`
    pub async fn return_book(&self, user_id: Uuid, request: &ReturnRequest) -> AppResult<ReturnReceipt> {
        let book_id = request.book_id;
        let returned_date = parse_date(&request.returned_date).ok_or_else(|| {
            tracing::warn!(%book_id, %user_id, returned_date = %request.returned_date, "return: malformed returned date");
            LoanError::InvalidDate
        })?;
        self.ensure_stock_exists(book_id, "return").await?;

        let mut tx = self.ledger.begin().await?;
        let outcome = self.return_in_tx(&mut tx, book_id, user_id, returned_date).await;
        self.finish(tx, outcome, "return").await?;

        tracing::info!(%book_id, %user_id, "book returned");
        Ok(ReturnReceipt {
            book_id,
            user_id,
            returned_date,
        })
    }

    async fn ensure_stock_exists(&self, book_id: Uuid, op: &'static str) -> AppResult<()> {
        if self.ledger.count_stock(book_id).await? <= 0 {
            tracing::warn!(%book_id, "{op}: book stock not found");
            return Err(LoanError::StockNotFound.into());
        }
        Ok(())
    }

    async fn borrow_in_tx(&self, tx: &mut L::Tx, loan: &NewLoan) -> AppResult<Loan> {
        self.ledger.lock_for_borrow(tx, loan.book_id).await?;
        self.ledger
            .ensure_no_open_loan(tx, loan.book_id, loan.user_id)
            .await?;
        let created = self.ledger.insert_loan(tx, loan).await?;
        self.ledger.decrement_stock(tx, loan.book_id, 1).await?;
        Ok(created)
    }

    async fn return_in_tx(
        &self,
        tx: &mut L::Tx,
        book_id: Uuid,
        user_id: Uuid,
        returned_date: chrono::NaiveDate,
    ) -> AppResult<()> {
        self.ledger.lock_for_return(tx, book_id).await?;
        self.ledger.ensure_returnable(tx, book_id, user_id).await?;
        self.ledger
            .close_loan(tx, book_id, user_id, returned_date)
            .await?;
        self.ledger.increment_stock(tx, book_id, 1).await?;
        Ok(())
    }

    /// Commit on success, roll back on failure. A failed commit is internal:
    /// nothing may be treated as applied without a confirmed commit.
    async fn finish<T: Send>(&self, tx: L::Tx, outcome: AppResult<T>, op: &'static str) -> AppResult<T> {
        match outcome {
            Ok(value) => match self.ledger.commit(tx).await {
                Ok(()) => Ok(value),
                Err(e) => {
                    tracing::error!("{op}: failed to commit transaction: {e}");
                    Err(AppError::Internal(format!("{op}: commit failed")))
                }
            },
            Err(err) => {
                match &err {
                    AppError::Loan(kind) => tracing::warn!("{op}: rejected: {kind}"),
                    other => tracing::error!("{op}: {other}"),
                }
                if let Err(rollback_err) = self.ledger.rollback(tx).await {
                    tracing::error!("{op}: failed to rollback transaction: {rollback_err}");
                }
                Err(err)
            }
        }
    }
}

impl LoansService<Repository> {
    /// Loans of a user, optionally only the open ones
    pub async fn user_loans(&self, user_id: Uuid, open_only: bool) -> AppResult<Vec<Loan>> {
        self.ledger.loans.list_for_user(user_id, open_only).await
    }
}
