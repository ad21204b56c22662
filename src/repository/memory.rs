//! In-memory [`LoanLedger`] for exercising the loan protocols without a
//! database. Row locks are real async mutexes held until the transaction
//! ends, and every write is undone unless the transaction commits.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::{Mutex as RowLock, OwnedMutexGuard};
use uuid::Uuid;

use super::LoanLedger;
use crate::{
    error::{AppError, AppResult, LoanError},
    models::loan::{Loan, NewLoan},
};

#[derive(Debug, Clone, Copy)]
struct StockRow {
    total: i32,
    available: i32,
}

#[derive(Default)]
struct State {
    stocks: HashMap<Uuid, StockRow>,
    loans: Vec<Loan>,
}

enum Undo {
    Available { book_id: Uuid, previous: i32 },
    Inserted { loan_id: Uuid },
    Closed { loan_id: Uuid },
}

#[derive(Default)]
pub struct MemoryLedger {
    state: Arc<Mutex<State>>,
    row_locks: Mutex<HashMap<Uuid, Arc<RowLock<()>>>>,
    begun: AtomicUsize,
    fail_commit: AtomicBool,
}

pub struct MemoryTx {
    state: Arc<Mutex<State>>,
    held: Vec<(Uuid, OwnedMutexGuard<()>)>,
    undo: Vec<Undo>,
    committed: bool,
}

impl MemoryTx {
    fn holds(&self, book_id: Uuid) -> bool {
        self.held.iter().any(|(id, _)| *id == book_id)
    }

    fn log(&mut self, undo: Undo) {
        self.undo.push(undo);
    }
}

impl Drop for MemoryTx {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        let mut state = self.state.lock().unwrap();
        while let Some(undo) = self.undo.pop() {
            match undo {
                Undo::Available { book_id, previous } => {
                    if let Some(row) = state.stocks.get_mut(&book_id) {
                        row.available = previous;
                    }
                }
                Undo::Inserted { loan_id } => state.loans.retain(|l| l.id != loan_id),
                Undo::Closed { loan_id } => {
                    if let Some(loan) = state.loans.iter_mut().find(|l| l.id == loan_id) {
                        loan.returned_date = None;
                    }
                }
            }
        }
    }
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stock(self, book_id: Uuid, total: i32, available: i32) -> Self {
        self.state
            .lock()
            .unwrap()
            .stocks
            .insert(book_id, StockRow { total, available });
        self
    }

    /// Overwrite the available counter, as a manual data fix would
    pub fn set_available(&self, book_id: Uuid, available: i32) {
        if let Some(row) = self.state.lock().unwrap().stocks.get_mut(&book_id) {
            row.available = available;
        }
    }

    pub fn available(&self, book_id: Uuid) -> Option<i32> {
        self.state.lock().unwrap().stocks.get(&book_id).map(|s| s.available)
    }

    pub fn loans_for(&self, book_id: Uuid, user_id: Uuid) -> Vec<Loan> {
        self.state
            .lock()
            .unwrap()
            .loans
            .iter()
            .filter(|l| l.book_id == book_id && l.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn open_loans(&self, book_id: Uuid) -> usize {
        self.state
            .lock()
            .unwrap()
            .loans
            .iter()
            .filter(|l| l.book_id == book_id && l.is_open())
            .count()
    }

    /// Transactions opened so far
    pub fn begun(&self) -> usize {
        self.begun.load(Ordering::SeqCst)
    }

    /// Make every following commit fail (nothing is applied)
    pub fn fail_commits(&self) {
        self.fail_commit.store(true, Ordering::SeqCst);
    }

    fn row_lock(&self, book_id: Uuid) -> Arc<RowLock<()>> {
        self.row_locks
            .lock()
            .unwrap()
            .entry(book_id)
            .or_default()
            .clone()
    }

    async fn lock_row(&self, tx: &mut MemoryTx, book_id: Uuid) -> AppResult<()> {
        if !tx.holds(book_id) {
            let guard = self.row_lock(book_id).lock_owned().await;
            tx.held.push((book_id, guard));
        }
        // Let competing transactions run up to their own lock attempt
        tokio::task::yield_now().await;
        if !self.state.lock().unwrap().stocks.contains_key(&book_id) {
            return Err(LoanError::StockNotFound.into());
        }
        Ok(())
    }

    fn count_pair(&self, book_id: Uuid, user_id: Uuid) -> (usize, usize) {
        let state = self.state.lock().unwrap();
        let pair = state
            .loans
            .iter()
            .filter(|l| l.book_id == book_id && l.user_id == user_id);
        pair.fold((0, 0), |(open, closed), loan| {
            if loan.is_open() {
                (open + 1, closed)
            } else {
                (open, closed + 1)
            }
        })
    }
}

#[async_trait]
impl LoanLedger for MemoryLedger {
    type Tx = MemoryTx;

    async fn begin(&self) -> AppResult<MemoryTx> {
        self.begun.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryTx {
            state: Arc::clone(&self.state),
            held: Vec::new(),
            undo: Vec::new(),
            committed: false,
        })
    }

    async fn commit(&self, mut tx: MemoryTx) -> AppResult<()> {
        if self.fail_commit.load(Ordering::SeqCst) {
            return Err(AppError::Internal("connection reset during commit".to_string()));
        }
        tx.committed = true;
        Ok(())
    }

    async fn rollback(&self, tx: MemoryTx) -> AppResult<()> {
        drop(tx);
        Ok(())
    }

    async fn count_stock(&self, book_id: Uuid) -> AppResult<i64> {
        let present = self.state.lock().unwrap().stocks.contains_key(&book_id);
        Ok(i64::from(present))
    }

    async fn lock_for_borrow(&self, tx: &mut MemoryTx, book_id: Uuid) -> AppResult<()> {
        self.lock_row(tx, book_id).await
    }

    async fn lock_for_return(&self, tx: &mut MemoryTx, book_id: Uuid) -> AppResult<()> {
        self.lock_row(tx, book_id).await
    }

    async fn decrement_stock(&self, tx: &mut MemoryTx, book_id: Uuid, amount: i32) -> AppResult<()> {
        let previous = {
            let mut state = self.state.lock().unwrap();
            let row = state
                .stocks
                .get_mut(&book_id)
                .filter(|row| row.available >= amount)
                .ok_or(LoanError::InsufficientStock)?;
            let previous = row.available;
            row.available -= amount;
            previous
        };
        tx.log(Undo::Available { book_id, previous });
        Ok(())
    }

    async fn increment_stock(&self, tx: &mut MemoryTx, book_id: Uuid, amount: i32) -> AppResult<()> {
        let previous = {
            let mut state = self.state.lock().unwrap();
            let row = state
                .stocks
                .get_mut(&book_id)
                .filter(|row| row.available + amount <= row.total)
                .ok_or(LoanError::StockCapacityExceeded)?;
            let previous = row.available;
            row.available += amount;
            previous
        };
        tx.log(Undo::Available { book_id, previous });
        Ok(())
    }

    async fn ensure_no_open_loan(&self, _tx: &mut MemoryTx, book_id: Uuid, user_id: Uuid) -> AppResult<()> {
        tokio::task::yield_now().await;
        let (open, _) = self.count_pair(book_id, user_id);
        if open > 0 {
            return Err(LoanError::AlreadyBorrowed.into());
        }
        Ok(())
    }

    async fn insert_loan(&self, tx: &mut MemoryTx, loan: &NewLoan) -> AppResult<Loan> {
        let now = Utc::now();
        let row = Loan {
            id: Uuid::new_v4(),
            user_id: loan.user_id,
            book_id: loan.book_id,
            borrowed_date: now,
            due_date: loan.due_date,
            returned_date: None,
            created_at: now,
            updated_at: now,
        };
        self.state.lock().unwrap().loans.push(row.clone());
        tx.log(Undo::Inserted { loan_id: row.id });
        Ok(row)
    }

    async fn ensure_returnable(&self, _tx: &mut MemoryTx, book_id: Uuid, user_id: Uuid) -> AppResult<()> {
        tokio::task::yield_now().await;
        match self.count_pair(book_id, user_id) {
            (open, _) if open > 0 => Ok(()),
            (_, closed) if closed > 0 => Err(LoanError::AlreadyReturned.into()),
            _ => Err(LoanError::NoOpenLoan.into()),
        }
    }

    async fn close_loan(
        &self,
        tx: &mut MemoryTx,
        book_id: Uuid,
        user_id: Uuid,
        returned_date: NaiveDate,
    ) -> AppResult<()> {
        let closed: Vec<Uuid> = {
            let mut state = self.state.lock().unwrap();
            state
                .loans
                .iter_mut()
                .filter(|l| l.book_id == book_id && l.user_id == user_id && l.is_open())
                .map(|l| {
                    l.returned_date = Some(returned_date);
                    l.id
                })
                .collect()
        };
        if closed.is_empty() {
            return Err(LoanError::NoOpenLoan.into());
        }
        for loan_id in closed {
            tx.log(Undo::Closed { loan_id });
        }
        Ok(())
    }
}
