//! Reader category preferences

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{error::AppResult, models::preference::UserPreference};

#[derive(Clone)]
pub struct PreferencesRepository {
    pool: Pool<Postgres>,
}

impl PreferencesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Record a preferred category; re-submitting refreshes the existing row
    pub async fn upsert(&self, user_id: Uuid, category_id: Uuid) -> AppResult<UserPreference> {
        let row = sqlx::query_as::<_, UserPreference>(
            r#"
            INSERT INTO book_user_preferences (user_id, preferred_category)
            VALUES ($1, $2)
            ON CONFLICT (user_id, preferred_category)
            DO UPDATE SET updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(category_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<UserPreference>> {
        let rows = sqlx::query_as::<_, UserPreference>(
            "SELECT * FROM book_user_preferences WHERE user_id = $1 ORDER BY updated_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
