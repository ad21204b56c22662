//! Stock ledger: per-title lending counters

use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use super::conflict_on_unique;
use crate::{
    error::{AppError, AppResult, LoanError},
    models::{
        stock::{BookStock, BookStockDetails, CreateBookStock, UpdateBookStock},
        PageQuery,
    },
};

#[derive(Clone)]
pub struct StocksRepository {
    pool: Pool<Postgres>,
}

impl StocksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Number of stock records for a title (0 or 1). Not locked.
    pub async fn count_by_book(&self, book_id: Uuid) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(id) FROM book_stocks WHERE book_id = $1")
            .bind(book_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Row-lock the title's stock record for the rest of the transaction.
    /// Blocks while another transaction holds the lock.
    pub async fn lock_for_borrow(&self, conn: &mut PgConnection, book_id: Uuid) -> AppResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1 FROM book_stocks WHERE book_id = $1 FOR UPDATE")
            .bind(book_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or(LoanError::StockNotFound)?;
        Ok(())
    }

    /// Same lock as [`lock_for_borrow`](Self::lock_for_borrow), taken on the
    /// return path. Yields the available count seen under the lock.
    pub async fn lock_for_return(&self, conn: &mut PgConnection, book_id: Uuid) -> AppResult<i32> {
        let available = sqlx::query_scalar::<_, i32>(
            "SELECT available_stock FROM book_stocks WHERE book_id = $1 FOR UPDATE",
        )
        .bind(book_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(LoanError::StockNotFound)?;
        Ok(available)
    }

    /// Check-and-decrement in one statement; the floor is enforced by the
    /// WHERE clause so no concurrent writer can slip between check and write.
    pub async fn decrement_available(
        &self,
        conn: &mut PgConnection,
        book_id: Uuid,
        amount: i32,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE book_stocks
            SET available_stock = available_stock - $1,
                updated_at = NOW()
            WHERE book_id = $2
              AND available_stock >= $1
            "#,
        )
        .bind(amount)
        .bind(book_id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(LoanError::InsufficientStock.into());
        }
        Ok(())
    }

    /// Increment capped at `total_stock`.
    pub async fn increment_available(
        &self,
        conn: &mut PgConnection,
        book_id: Uuid,
        amount: i32,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE book_stocks
            SET available_stock = available_stock + $1,
                updated_at = NOW()
            WHERE book_id = $2
              AND available_stock + $1 <= total_stock
            "#,
        )
        .bind(amount)
        .bind(book_id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(LoanError::StockCapacityExceeded.into());
        }
        Ok(())
    }

    /// Create the stock record of a title
    pub async fn create(&self, data: &CreateBookStock) -> AppResult<BookStock> {
        sqlx::query_as::<_, BookStock>(
            r#"
            INSERT INTO book_stocks (book_id, total_stock, available_stock)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(data.book_id)
        .bind(data.total_stock)
        .bind(data.available_stock)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "book stock already exist"))
    }

    /// Get stock record by ID, joined with the book title
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<BookStockDetails> {
        sqlx::query_as::<_, BookStockDetails>(
            r#"
            SELECT bs.id, bs.book_id, b.title AS book_title,
                   bs.total_stock, bs.available_stock,
                   bs.created_at, bs.updated_at
            FROM book_stocks bs
            JOIN books b ON bs.book_id = b.id
            WHERE bs.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("book stock not found".to_string()))
    }

    /// Stock record of a title, if any
    pub async fn get_by_book(&self, book_id: Uuid) -> AppResult<Option<BookStock>> {
        let stock = sqlx::query_as::<_, BookStock>("SELECT * FROM book_stocks WHERE book_id = $1")
            .bind(book_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(stock)
    }

    /// List stock records, most recently touched first
    pub async fn list(&self, page: &PageQuery) -> AppResult<Vec<BookStockDetails>> {
        let rows = sqlx::query_as::<_, BookStockDetails>(
            r#"
            SELECT bs.id, bs.book_id, b.title AS book_title,
                   bs.total_stock, bs.available_stock,
                   bs.created_at, bs.updated_at
            FROM book_stocks bs
            JOIN books b ON bs.book_id = b.id
            ORDER BY bs.updated_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Row-lock a stock record by its own id, yielding the title it belongs to.
    /// Takes the same lock as the loan paths.
    pub async fn lock_by_id(&self, conn: &mut PgConnection, id: Uuid) -> AppResult<Uuid> {
        sqlx::query_scalar::<_, Uuid>("SELECT book_id FROM book_stocks WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound("book stock not found".to_string()))
    }

    /// Overwrite both counters (administrative correction)
    pub async fn update(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        data: &UpdateBookStock,
    ) -> AppResult<BookStock> {
        sqlx::query_as::<_, BookStock>(
            r#"
            UPDATE book_stocks
            SET total_stock = $1, available_stock = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(data.total_stock)
        .bind(data.available_stock)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("book stock not found".to_string()))
    }

    /// Delete stock record
    pub async fn delete(&self, conn: &mut PgConnection, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM book_stocks WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("book stock not found".to_string()));
        }
        Ok(())
    }
}
