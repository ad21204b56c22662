//! Stock record administration endpoints (admin only)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::AuthenticatedUser;
use crate::{
    error::AppResult,
    models::{
        stock::{BookStock, BookStockDetails, CreateBookStock, UpdateBookStock},
        PageQuery, StockPage,
    },
    AppState,
};

/// Create the stock record of a book
#[utoipa::path(
    post,
    path = "/stocks",
    tag = "stocks",
    security(("bearer_auth" = [])),
    request_body = CreateBookStock,
    responses(
        (status = 201, description = "Stock record created", body = BookStock),
        (status = 400, description = "Invalid counters"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book already has a stock record")
    )
)]
pub async fn create_stock(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateBookStock>,
) -> AppResult<(StatusCode, Json<BookStock>)> {
    claims.require_admin()?;

    let stock = state.services.stocks.create_stock(&request).await?;
    Ok((StatusCode::CREATED, Json(stock)))
}

/// List stock records
#[utoipa::path(
    get,
    path = "/stocks",
    tag = "stocks",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "One page of stock records", body = StockPage),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn list_stocks(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<StockPage>> {
    claims.require_admin()?;

    let page = state.services.stocks.list_stocks(&query).await?;
    Ok(Json(page))
}

/// Get a stock record
#[utoipa::path(
    get,
    path = "/stocks/{id}",
    tag = "stocks",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Stock record ID")
    ),
    responses(
        (status = 200, description = "Stock record", body = BookStockDetails),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Stock record not found")
    )
)]
pub async fn get_stock(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BookStockDetails>> {
    claims.require_admin()?;

    let stock = state.services.stocks.get_stock(id).await?;
    Ok(Json(stock))
}

/// Correct the counters of a stock record
#[utoipa::path(
    put,
    path = "/stocks/{id}",
    tag = "stocks",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Stock record ID")
    ),
    request_body = UpdateBookStock,
    responses(
        (status = 200, description = "Stock record updated", body = BookStock),
        (status = 400, description = "Invalid counters"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Stock record not found")
    )
)]
pub async fn update_stock(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateBookStock>,
) -> AppResult<Json<BookStock>> {
    claims.require_admin()?;

    let stock = state.services.stocks.update_stock(id, &request).await?;
    Ok(Json(stock))
}

/// Delete a stock record
#[utoipa::path(
    delete,
    path = "/stocks/{id}",
    tag = "stocks",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Stock record ID")
    ),
    responses(
        (status = 204, description = "Stock record deleted"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Stock record not found"),
        (status = 409, description = "Copies are still on loan")
    )
)]
pub async fn delete_stock(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;

    state.services.stocks.delete_stock(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
