//! Reader category preferences

use std::sync::Arc;

use uuid::Uuid;

use super::external::ExternalLookup;
use crate::{
    error::{AppError, AppResult},
    models::preference::UserPreference,
    repository::Repository,
};

#[derive(Clone)]
pub struct PreferencesService {
    repository: Repository,
    lookup: Arc<dyn ExternalLookup>,
}

impl PreferencesService {
    pub fn new(repository: Repository, lookup: Arc<dyn ExternalLookup>) -> Self {
        Self { repository, lookup }
    }

    /// Record that `user_id` prefers `category_id`
    pub async fn set_preference(&self, user_id: Uuid, category_id: Uuid) -> AppResult<UserPreference> {
        if !self.lookup.category_exists(category_id).await? {
            tracing::warn!(%user_id, %category_id, "preference for unknown category");
            return Err(AppError::NotFound("category not found".to_string()));
        }
        let preference = self.repository.preferences.upsert(user_id, category_id).await?;
        tracing::info!(%user_id, %category_id, "preference recorded");
        Ok(preference)
    }

    pub async fn list_preferences(&self, user_id: Uuid) -> AppResult<Vec<UserPreference>> {
        self.repository.preferences.list_for_user(user_id).await
    }
}
