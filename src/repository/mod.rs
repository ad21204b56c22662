//! Repository layer for database operations

pub mod books;
pub mod ledger;
pub mod loans;
#[cfg(test)]
pub mod memory;
pub mod preferences;
pub mod stocks;

use sqlx::{Pool, Postgres};

use crate::error::{AppError, AppResult};

pub use ledger::LoanLedger;

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub books: books::BooksRepository,
    pub stocks: stocks::StocksRepository,
    pub loans: loans::LoansRepository,
    pub preferences: preferences::PreferencesRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            stocks: stocks::StocksRepository::new(pool.clone()),
            loans: loans::LoansRepository::new(pool.clone()),
            preferences: preferences::PreferencesRepository::new(pool.clone()),
            pool,
        }
    }

    /// Round-trip to the database (readiness probe)
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Map a unique-constraint violation to a conflict, pass anything else through
pub(crate) fn conflict_on_unique(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Database(err),
    }
}
