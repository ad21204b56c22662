//! Books repository for database operations

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::conflict_on_unique;
use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookFields, BookSearchQuery},
        PageQuery,
    },
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("book not found".to_string()))
    }

    /// List books, most recently updated first
    pub async fn list(&self, page: &PageQuery) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT * FROM books ORDER BY updated_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    /// Whether another book already carries this ISBN
    pub async fn isbn_taken(&self, isbn: &str, exclude: Option<Uuid>) -> AppResult<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(isbn)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    /// Create a new book
    pub async fn create(&self, fields: &BookFields) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author_id, category_id, description, isbn, published_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&fields.title)
        .bind(fields.author_id)
        .bind(fields.category_id)
        .bind(&fields.description)
        .bind(&fields.isbn)
        .bind(fields.published_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "isbn already exist"))
    }

    /// Update a book
    pub async fn update(&self, id: Uuid, fields: &BookFields) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $1, author_id = $2, category_id = $3, description = $4,
                isbn = $5, published_date = $6, updated_at = NOW()
            WHERE id = $7
            RETURNING *
            "#,
        )
        .bind(&fields.title)
        .bind(fields.author_id)
        .bind(fields.category_id)
        .bind(&fields.description)
        .bind(&fields.isbn)
        .bind(fields.published_date)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "isbn already exist"))?
        .ok_or_else(|| AppError::NotFound("book not found".to_string()))
    }

    /// Delete a book. Its stock record goes with it; loan history blocks deletion.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                    AppError::Conflict("book has loan history".to_string())
                }
                _ => AppError::Database(e),
            })?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("book not found".to_string()));
        }
        Ok(())
    }

    /// Search by title fragment, author and category
    pub async fn search(&self, query: &BookSearchQuery, page: &PageQuery) -> AppResult<Vec<Book>> {
        let title = query
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| format!("%{}%", t));

        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT * FROM books
            WHERE ($1::text IS NULL OR title ILIKE $1)
              AND ($2::uuid IS NULL OR author_id = $2)
              AND ($3::uuid IS NULL OR category_id = $3)
            ORDER BY title
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(title)
        .bind(query.author_id)
        .bind(query.category_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    /// Books in the user's preferred categories, newest publications first
    pub async fn recommendations(&self, user_id: Uuid, page: &PageQuery) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT b.* FROM books b
            JOIN book_user_preferences p ON b.category_id = p.preferred_category
            WHERE p.user_id = $1
            ORDER BY b.published_date DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }
}
