//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, health, loans, preferences, stocks};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lending API",
        version = "1.0.0",
        description = "Book catalog and lending REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        books::search_books,
        books::recommendations,
        // Stocks
        stocks::create_stock,
        stocks::list_stocks,
        stocks::get_stock,
        stocks::update_stock,
        stocks::delete_stock,
        // Loans
        loans::borrow_book,
        loans::return_book,
        loans::my_loans,
        // Preferences
        preferences::set_preference,
        preferences::list_preferences,
    ),
    components(
        schemas(
            // Books
            crate::models::book::Book,
            crate::models::book::BookDetails,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            crate::models::BookPage,
            // Stocks
            crate::models::stock::BookStock,
            crate::models::stock::BookStockDetails,
            crate::models::stock::CreateBookStock,
            crate::models::stock::UpdateBookStock,
            crate::models::StockPage,
            // Loans
            crate::models::loan::Loan,
            crate::models::loan::BorrowRequest,
            crate::models::loan::ReturnRequest,
            crate::models::loan::ReturnReceipt,
            // Preferences
            crate::models::preference::UserPreference,
            crate::models::preference::SetPreference,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Catalog management"),
        (name = "stocks", description = "Stock record administration"),
        (name = "loans", description = "Borrowing and returning"),
        (name = "preferences", description = "Reader category preferences")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
