//! Catalog management service

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use super::{
    cache::{book_key, book_list_key, CacheService, BOOK_LIST_PREFIX},
    external::ExternalLookup,
};
use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookDetails, BookFields, BookSearchQuery, CreateBook, UpdateBook},
        parse_date, Page, PageQuery,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    lookup: Arc<dyn ExternalLookup>,
    cache: CacheService,
}

impl CatalogService {
    pub fn new(repository: Repository, lookup: Arc<dyn ExternalLookup>, cache: CacheService) -> Self {
        Self {
            repository,
            lookup,
            cache,
        }
    }

    /// Create a new book
    pub async fn create_book(&self, request: &CreateBook) -> AppResult<Book> {
        request.validate()?;
        let fields = BookFields {
            title: request.title.trim().to_string(),
            author_id: request.author_id,
            category_id: request.category_id,
            description: request.description.clone(),
            isbn: normalize_isbn(Some(&request.isbn)),
            published_date: published_date(&request.published_date)?,
        };
        self.check_references(fields.author_id, fields.category_id).await?;
        self.check_isbn(fields.isbn.as_deref(), None).await?;

        let book = self.repository.books.create(&fields).await?;
        self.cache.invalidate_prefix(BOOK_LIST_PREFIX).await;
        tracing::info!(book_id = %book.id, title = %book.title, "book created");
        Ok(book)
    }

    /// Book with its live available stock. The row itself is read through the
    /// cache; the stock figure never is.
    pub async fn get_book(&self, id: Uuid) -> AppResult<BookDetails> {
        let key = book_key(id);
        let book = match self.cache.get_json::<Book>(&key).await {
            Some(book) => book,
            None => {
                let book = self.repository.books.get_by_id(id).await?;
                self.cache.set_json(&key, &book).await;
                book
            }
        };
        let available_stock = self
            .repository
            .stocks
            .get_by_book(id)
            .await?
            .map(|stock| stock.available_stock);
        Ok(BookDetails {
            book,
            available_stock,
        })
    }

    pub async fn list_books(&self, query: &PageQuery) -> AppResult<Page<Book>> {
        let key = book_list_key(query.page(), query.limit());
        if let Some(page) = self.cache.get_json::<Page<Book>>(&key).await {
            return Ok(page);
        }
        let books = self.repository.books.list(query).await?;
        let page = Page::new(books, query);
        self.cache.set_json(&key, &page).await;
        Ok(page)
    }

    /// Update a book
    pub async fn update_book(&self, id: Uuid, request: &UpdateBook) -> AppResult<Book> {
        request.validate()?;
        let fields = BookFields {
            title: request.title.trim().to_string(),
            author_id: request.author_id,
            category_id: request.category_id,
            description: request.description.clone(),
            isbn: normalize_isbn(request.isbn.as_deref()),
            published_date: published_date(&request.published_date)?,
        };
        self.check_references(fields.author_id, fields.category_id).await?;
        self.check_isbn(fields.isbn.as_deref(), Some(id)).await?;

        let book = self.repository.books.update(id, &fields).await?;
        self.forget(id).await;
        tracing::info!(book_id = %id, "book updated");
        Ok(book)
    }

    /// Delete a book and its stock record
    pub async fn delete_book(&self, id: Uuid) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        self.forget(id).await;
        tracing::info!(book_id = %id, "book deleted");
        Ok(())
    }

    pub async fn search_books(&self, query: &BookSearchQuery) -> AppResult<Page<Book>> {
        let page = PageQuery {
            page: query.page,
            limit: query.limit,
        };
        let books = self.repository.books.search(query, &page).await?;
        Ok(Page::new(books, &page))
    }

    /// Books in the categories the user prefers
    pub async fn recommendations(&self, user_id: Uuid, query: &PageQuery) -> AppResult<Page<Book>> {
        let books = self.repository.books.recommendations(user_id, query).await?;
        Ok(Page::new(books, query))
    }

    async fn check_references(&self, author_id: Uuid, category_id: Uuid) -> AppResult<()> {
        if !self.lookup.author_exists(author_id).await? {
            tracing::warn!(%author_id, "author not found");
            return Err(AppError::NotFound("author not found".to_string()));
        }
        if !self.lookup.category_exists(category_id).await? {
            tracing::warn!(%category_id, "category not found");
            return Err(AppError::NotFound("category not found".to_string()));
        }
        Ok(())
    }

    async fn check_isbn(&self, isbn: Option<&str>, exclude: Option<Uuid>) -> AppResult<()> {
        if let Some(isbn) = isbn {
            if self.repository.books.isbn_taken(isbn, exclude).await? {
                return Err(AppError::Conflict("isbn already exist".to_string()));
            }
        }
        Ok(())
    }

    async fn forget(&self, id: Uuid) {
        self.cache.invalidate(&book_key(id)).await;
        self.cache.invalidate_prefix(BOOK_LIST_PREFIX).await;
    }
}

fn published_date(value: &str) -> AppResult<chrono::NaiveDate> {
    parse_date(value)
        .ok_or_else(|| AppError::Validation("published_date must be YYYY-MM-DD".to_string()))
}

/// Blank ISBNs are stored as absent
fn normalize_isbn(isbn: Option<&str>) -> Option<String> {
    isbn.map(str::trim)
        .filter(|isbn| !isbn.is_empty())
        .map(str::to_string)
}
