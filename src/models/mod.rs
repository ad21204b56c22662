//! Data models for the lending server

pub mod book;
pub mod loan;
pub mod pagination;
pub mod preference;
pub mod stock;
pub mod user;

use chrono::NaiveDate;

// Re-export commonly used types
pub use book::{Book, BookDetails};
pub use loan::{Loan, NewLoan};
pub use pagination::{BookPage, Page, PageQuery, StockPage};
pub use stock::{BookStock, BookStockDetails};
pub use user::{Role, UserClaims};

/// Wire format of every date field (`YYYY-MM-DD`)
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` date, `None` when malformed
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}
