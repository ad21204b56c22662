//! Borrow record store: open/closed loan state per (book, user)

use chrono::NaiveDate;
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult, LoanError},
    models::loan::{Loan, NewLoan},
};

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Fail with `AlreadyBorrowed` if the pair has an open loan
    pub async fn ensure_no_open_loan(
        &self,
        conn: &mut PgConnection,
        book_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<()> {
        let open: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(id)
            FROM borrowed_books
            WHERE book_id = $1 AND user_id = $2 AND returned_date IS NULL
            "#,
        )
        .bind(book_id)
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;

        if open > 0 {
            return Err(LoanError::AlreadyBorrowed.into());
        }
        Ok(())
    }

    /// Open a new loan
    pub async fn insert(&self, conn: &mut PgConnection, loan: &NewLoan) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO borrowed_books (user_id, book_id, due_date)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(loan.user_id)
        .bind(loan.book_id)
        .bind(loan.due_date)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| match &e {
            // Partial unique index on open loans
            sqlx::Error::Database(db) if db.is_unique_violation() => LoanError::AlreadyBorrowed.into(),
            _ => AppError::Database(e),
        })
    }

    /// Ok when the pair has an open loan; otherwise `AlreadyReturned` if a
    /// closed one exists, `NoOpenLoan` if the pair never borrowed.
    pub async fn ensure_returnable(
        &self,
        conn: &mut PgConnection,
        book_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<()> {
        let (open, closed): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(id) FILTER (WHERE returned_date IS NULL),
                   COUNT(id) FILTER (WHERE returned_date IS NOT NULL)
            FROM borrowed_books
            WHERE book_id = $1 AND user_id = $2
            "#,
        )
        .bind(book_id)
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;

        match (open, closed) {
            (o, _) if o > 0 => Ok(()),
            (_, c) if c > 0 => Err(LoanError::AlreadyReturned.into()),
            _ => Err(LoanError::NoOpenLoan.into()),
        }
    }

    /// Close the pair's open loan. Returns the number of rows closed.
    pub async fn close_loan(
        &self,
        conn: &mut PgConnection,
        book_id: Uuid,
        user_id: Uuid,
        returned_date: NaiveDate,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE borrowed_books
            SET returned_date = $1,
                updated_at = NOW()
            WHERE book_id = $2 AND user_id = $3 AND returned_date IS NULL
            "#,
        )
        .bind(returned_date)
        .bind(book_id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Loans of a user, newest first
    pub async fn list_for_user(&self, user_id: Uuid, open_only: bool) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(
            r#"
            SELECT * FROM borrowed_books
            WHERE user_id = $1 AND ($2 = FALSE OR returned_date IS NULL)
            ORDER BY borrowed_date DESC
            "#,
        )
        .bind(user_id)
        .bind(open_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(loans)
    }

    /// Count open loans of a title (guards stock corrections and deletion)
    pub async fn count_open_for_book(&self, conn: &mut PgConnection, book_id: Uuid) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(id) FROM borrowed_books WHERE book_id = $1 AND returned_date IS NULL",
        )
        .bind(book_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(count)
    }
}
