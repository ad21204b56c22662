//! Reader category preferences

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserPreference {
    pub id: Uuid,
    pub user_id: Uuid,
    pub preferred_category: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Set preference request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SetPreference {
    pub preferred_category: Uuid,
}
