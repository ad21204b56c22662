//! Loan endpoints: borrow, return, own loan history

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use super::AuthenticatedUser;
use crate::{
    error::AppResult,
    models::loan::{BorrowRequest, Loan, ReturnReceipt, ReturnRequest},
    AppState,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LoanListQuery {
    /// Only loans not yet returned
    #[serde(default)]
    pub open: bool,
}

/// Borrow one copy of a book
#[utoipa::path(
    post,
    path = "/loans/borrow",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = BorrowRequest,
    responses(
        (status = 201, description = "Book borrowed", body = Loan),
        (status = 400, description = "Malformed due date", body = crate::error::ErrorResponse),
        (status = 403, description = "User role required"),
        (status = 404, description = "No stock record for the book", body = crate::error::ErrorResponse),
        (status = 409, description = "Already borrowed or out of stock", body = crate::error::ErrorResponse)
    )
)]
pub async fn borrow_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<BorrowRequest>,
) -> AppResult<(StatusCode, Json<Loan>)> {
    claims.require_user()?;

    let loan = state.services.loans.borrow(claims.user_id, &request).await?;
    Ok((StatusCode::CREATED, Json(loan)))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/loans/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = ReturnRequest,
    responses(
        (status = 200, description = "Book returned", body = ReturnReceipt),
        (status = 400, description = "Malformed returned date", body = crate::error::ErrorResponse),
        (status = 403, description = "User role required"),
        (status = 404, description = "No stock record for the book", body = crate::error::ErrorResponse),
        (status = 409, description = "Already returned or stock at capacity", body = crate::error::ErrorResponse),
        (status = 422, description = "The caller never borrowed this book", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<ReturnRequest>,
) -> AppResult<Json<ReturnReceipt>> {
    claims.require_user()?;

    let receipt = state
        .services
        .loans
        .return_book(claims.user_id, &request)
        .await?;
    Ok(Json(receipt))
}

/// Loans of the caller, newest first
#[utoipa::path(
    get,
    path = "/loans/me",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(LoanListQuery),
    responses(
        (status = 200, description = "Caller's loans", body = Vec<Loan>),
        (status = 403, description = "User role required")
    )
)]
pub async fn my_loans(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<LoanListQuery>,
) -> AppResult<Json<Vec<Loan>>> {
    claims.require_user()?;

    let loans = state
        .services
        .loans
        .user_loans(claims.user_id, query.open)
        .await?;
    Ok(Json(loans))
}
