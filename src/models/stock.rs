//! Stock record model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Stock row: lending capacity of one title
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookStock {
    pub id: Uuid,
    pub book_id: Uuid,
    pub total_stock: i32,
    pub available_stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stock row joined with its book title
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookStockDetails {
    pub id: Uuid,
    pub book_id: Uuid,
    pub book_title: String,
    pub total_stock: i32,
    pub available_stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create stock request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBookStock {
    pub book_id: Uuid,
    #[validate(range(min = 0, message = "Total stock must not be negative"))]
    pub total_stock: i32,
    #[validate(range(min = 0, message = "Available stock must not be negative"))]
    pub available_stock: i32,
}

/// Update stock request (administrative correction)
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateBookStock {
    #[validate(range(min = 0, message = "Total stock must not be negative"))]
    pub total_stock: i32,
    #[validate(range(min = 0, message = "Available stock must not be negative"))]
    pub available_stock: i32,
}
