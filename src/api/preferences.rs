//! Reader preference endpoints

use axum::{extract::State, http::StatusCode, Json};

use super::AuthenticatedUser;
use crate::{
    error::AppResult,
    models::preference::{SetPreference, UserPreference},
    AppState,
};

/// Record a preferred category for the caller
#[utoipa::path(
    post,
    path = "/preferences",
    tag = "preferences",
    security(("bearer_auth" = [])),
    request_body = SetPreference,
    responses(
        (status = 201, description = "Preference recorded", body = UserPreference),
        (status = 403, description = "User role required"),
        (status = 404, description = "Category not found")
    )
)]
pub async fn set_preference(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<SetPreference>,
) -> AppResult<(StatusCode, Json<UserPreference>)> {
    claims.require_user()?;

    let preference = state
        .services
        .preferences
        .set_preference(claims.user_id, request.preferred_category)
        .await?;
    Ok((StatusCode::CREATED, Json(preference)))
}

/// Preferred categories of the caller
#[utoipa::path(
    get,
    path = "/preferences",
    tag = "preferences",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller's preferences", body = Vec<UserPreference>),
        (status = 403, description = "User role required")
    )
)]
pub async fn list_preferences(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<UserPreference>>> {
    claims.require_user()?;

    let preferences = state
        .services
        .preferences
        .list_preferences(claims.user_id)
        .await?;
    Ok(Json(preferences))
}
