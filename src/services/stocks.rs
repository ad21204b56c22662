//! Stock record administration. Reads go straight to the database; lending
//! figures are never served from the cache.

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        stock::{BookStock, BookStockDetails, CreateBookStock, UpdateBookStock},
        Page, PageQuery,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct StocksService {
    repository: Repository,
}

impl StocksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn create_stock(&self, request: &CreateBookStock) -> AppResult<BookStock> {
        request.validate()?;
        check_counters(request.total_stock, request.available_stock)?;

        // Surfaces NotFound for an unknown book
        self.repository.books.get_by_id(request.book_id).await?;

        let stock = self.repository.stocks.create(request).await?;
        tracing::info!(
            book_id = %stock.book_id,
            total = stock.total_stock,
            available = stock.available_stock,
            "stock record created"
        );
        Ok(stock)
    }

    pub async fn get_stock(&self, id: Uuid) -> AppResult<BookStockDetails> {
        self.repository.stocks.get_by_id(id).await
    }

    pub async fn list_stocks(&self, query: &PageQuery) -> AppResult<Page<BookStockDetails>> {
        let rows = self.repository.stocks.list(query).await?;
        Ok(Page::new(rows, query))
    }

    /// Administrative correction of both counters. Runs under the title's
    /// row lock so no borrow or return interleaves; copies currently on loan
    /// must still fit between `available_stock` and `total_stock`.
    pub async fn update_stock(&self, id: Uuid, request: &UpdateBookStock) -> AppResult<BookStock> {
        request.validate()?;
        check_counters(request.total_stock, request.available_stock)?;

        let mut tx = self.repository.pool.begin().await?;
        let book_id = self.repository.stocks.lock_by_id(&mut *tx, id).await?;
        let open = self.repository.loans.count_open_for_book(&mut *tx, book_id).await?;
        check_outstanding(request.total_stock, request.available_stock, open)?;

        let stock = self.repository.stocks.update(&mut *tx, id, request).await?;
        tx.commit().await?;
        tracing::info!(
            book_id = %stock.book_id,
            total = stock.total_stock,
            available = stock.available_stock,
            open,
            "stock record corrected"
        );
        Ok(stock)
    }

    /// Delete a stock record. Refused while copies of the title are on loan.
    pub async fn delete_stock(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.repository.pool.begin().await?;
        let book_id = self.repository.stocks.lock_by_id(&mut *tx, id).await?;
        let open = self.repository.loans.count_open_for_book(&mut *tx, book_id).await?;
        if open > 0 {
            tracing::warn!(%book_id, open, "refusing to delete stock with open loans");
            return Err(AppError::Conflict(format!(
                "book stock has {} open loan(s)",
                open
            )));
        }
        self.repository.stocks.delete(&mut *tx, id).await?;
        tx.commit().await?;
        tracing::info!(%book_id, "stock record deleted");
        Ok(())
    }
}

fn check_counters(total: i32, available: i32) -> AppResult<()> {
    if available > total {
        return Err(AppError::Validation(
            "available_stock must not exceed total_stock".to_string(),
        ));
    }
    Ok(())
}

/// Every open loan must be returnable without pushing available past total
fn check_outstanding(total: i32, available: i32, open: i64) -> AppResult<()> {
    if i64::from(available) + open > i64::from(total) {
        return Err(AppError::Conflict(format!(
            "{} copies on loan do not fit: available {} + on loan must not exceed total {}",
            open, available, total
        )));
    }
    Ok(())
}
