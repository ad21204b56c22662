//! Transactional seam between the loan coordinator and storage.
//!
//! The coordinator owns the transaction: it calls [`LoanLedger::begin`],
//! drives the stock and loan operations through the returned handle, and
//! finishes with exactly one of [`commit`](LoanLedger::commit) or
//! [`rollback`](LoanLedger::rollback). Store operations report the outcome of
//! their own statement only and never end the transaction themselves.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use super::Repository;
use crate::{
    error::{AppResult, LoanError},
    models::loan::{Loan, NewLoan},
};

#[async_trait]
pub trait LoanLedger: Send + Sync + 'static {
    /// Open transaction handle. Dropping it without commit must roll back.
    type Tx: Send;

    async fn begin(&self) -> AppResult<Self::Tx>;
    async fn commit(&self, tx: Self::Tx) -> AppResult<()>;
    async fn rollback(&self, tx: Self::Tx) -> AppResult<()>;

    /// Stock records for the title; no lock, outside any transaction
    async fn count_stock(&self, book_id: Uuid) -> AppResult<i64>;
    async fn lock_for_borrow(&self, tx: &mut Self::Tx, book_id: Uuid) -> AppResult<()>;
    async fn lock_for_return(&self, tx: &mut Self::Tx, book_id: Uuid) -> AppResult<()>;
    async fn decrement_stock(&self, tx: &mut Self::Tx, book_id: Uuid, amount: i32) -> AppResult<()>;
    async fn increment_stock(&self, tx: &mut Self::Tx, book_id: Uuid, amount: i32) -> AppResult<()>;

    async fn ensure_no_open_loan(&self, tx: &mut Self::Tx, book_id: Uuid, user_id: Uuid) -> AppResult<()>;
    async fn insert_loan(&self, tx: &mut Self::Tx, loan: &NewLoan) -> AppResult<Loan>;
    async fn ensure_returnable(&self, tx: &mut Self::Tx, book_id: Uuid, user_id: Uuid) -> AppResult<()>;
    async fn close_loan(
        &self,
        tx: &mut Self::Tx,
        book_id: Uuid,
        user_id: Uuid,
        returned_date: NaiveDate,
    ) -> AppResult<()>;
}

#[async_trait]
impl LoanLedger for Repository {
    type Tx = Transaction<'static, Postgres>;

    async fn begin(&self) -> AppResult<Self::Tx> {
        Ok(self.pool.begin().await?)
    }

    async fn commit(&self, tx: Self::Tx) -> AppResult<()> {
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&self, tx: Self::Tx) -> AppResult<()> {
        tx.rollback().await?;
        Ok(())
    }

    async fn count_stock(&self, book_id: Uuid) -> AppResult<i64> {
        self.stocks.count_by_book(book_id).await
    }

    async fn lock_for_borrow(&self, tx: &mut Self::Tx, book_id: Uuid) -> AppResult<()> {
        self.stocks.lock_for_borrow(&mut **tx, book_id).await
    }

    async fn lock_for_return(&self, tx: &mut Self::Tx, book_id: Uuid) -> AppResult<()> {
        let available = self.stocks.lock_for_return(&mut **tx, book_id).await?;
        tracing::debug!(%book_id, available, "stock row locked for return");
        Ok(())
    }

    async fn decrement_stock(&self, tx: &mut Self::Tx, book_id: Uuid, amount: i32) -> AppResult<()> {
        self.stocks.decrement_available(&mut **tx, book_id, amount).await
    }

    async fn increment_stock(&self, tx: &mut Self::Tx, book_id: Uuid, amount: i32) -> AppResult<()> {
        self.stocks.increment_available(&mut **tx, book_id, amount).await
    }

    async fn ensure_no_open_loan(&self, tx: &mut Self::Tx, book_id: Uuid, user_id: Uuid) -> AppResult<()> {
        self.loans.ensure_no_open_loan(&mut **tx, book_id, user_id).await
    }

    async fn insert_loan(&self, tx: &mut Self::Tx, loan: &NewLoan) -> AppResult<Loan> {
        self.loans.insert(&mut **tx, loan).await
    }

    async fn ensure_returnable(&self, tx: &mut Self::Tx, book_id: Uuid, user_id: Uuid) -> AppResult<()> {
        self.loans.ensure_returnable(&mut **tx, book_id, user_id).await
    }

    async fn close_loan(
        &self,
        tx: &mut Self::Tx,
        book_id: Uuid,
        user_id: Uuid,
        returned_date: NaiveDate,
    ) -> AppResult<()> {
        let closed = self
            .loans
            .close_loan(&mut **tx, book_id, user_id, returned_date)
            .await?;
        if closed == 0 {
            return Err(LoanError::NoOpenLoan.into());
        }
        Ok(())
    }
}
