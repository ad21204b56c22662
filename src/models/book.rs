//! Book (title) model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Book row from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author_id: Uuid,
    pub category_id: Uuid,
    pub description: String,
    pub isbn: Option<String>,
    pub published_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Book with its live stock figure
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookDetails {
    #[serde(flatten)]
    pub book: Book,
    /// Copies available for lending, `None` when the title has no stock record
    pub available_stock: Option<i32>,
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 2, max = 255, message = "Title must be 2 to 255 characters"))]
    pub title: String,
    pub author_id: Uuid,
    pub category_id: Uuid,
    #[validate(length(min = 1, max = 32, message = "ISBN must be 1 to 32 characters"))]
    pub isbn: String,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    /// Publication date (YYYY-MM-DD)
    pub published_date: String,
}

/// Update book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 2, max = 255, message = "Title must be 2 to 255 characters"))]
    pub title: String,
    pub author_id: Uuid,
    pub category_id: Uuid,
    /// Empty or missing clears the ISBN
    #[validate(length(max = 32, message = "ISBN must be at most 32 characters"))]
    pub isbn: Option<String>,
    #[serde(default)]
    pub description: String,
    /// Publication date (YYYY-MM-DD)
    pub published_date: String,
}

/// Validated book fields ready for insert/update
#[derive(Debug, Clone)]
pub struct BookFields {
    pub title: String,
    pub author_id: Uuid,
    pub category_id: Uuid,
    pub description: String,
    pub isbn: Option<String>,
    pub published_date: NaiveDate,
}

/// Book search query parameters
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookSearchQuery {
    /// Case-insensitive title fragment
    pub title: Option<String>,
    pub author_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
