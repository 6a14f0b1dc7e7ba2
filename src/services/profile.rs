use chrono::Utc;
use sqlx::types::Json;

use crate::{
    auth::AuthenticatedUser,
    db::DbPool,
    error::ApiError,
    models::profile::{ProfilePatch, UserProfile},
};

#[derive(Clone)]
pub struct ProfileService {
    db: DbPool,
}

impl ProfileService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    // A user who never touched their profile still gets a usable default.
    pub async fn get_profile(&self, caller: &AuthenticatedUser) -> Result<UserProfile, ApiError> {
        let profile = sqlx::query_as("SELECT * FROM user_profiles WHERE id = ?")
            .bind(&caller.id)
            .fetch_optional(&self.db)
            .await?;
        Ok(profile.unwrap_or_else(|| UserProfile::default_for(&caller.id)))
    }

    pub async fn upsert_profile(
        &self,
        caller: &AuthenticatedUser,
        patch: ProfilePatch,
    ) -> Result<UserProfile, ApiError> {
        let mut profile = self.get_profile(caller).await?;

        if let Some(full_name) = patch.full_name {
            profile.full_name = Some(full_name);
        }
        if let Some(avatar_url) = patch.avatar_url {
            profile.avatar_url = Some(avatar_url);
        }
        if let Some(bio) = patch.bio {
            profile.bio = Some(bio);
        }
        if let Some(language) = patch.language {
            profile.language = language;
        }
        if let Some(preferences) = patch.preferences {
            profile.preferences = Json(preferences);
        }
        profile.updated_at = Utc::now();

        sqlx::query(
            "INSERT INTO user_profiles (id, full_name, avatar_url, bio, language, preferences,
                                        created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (id) DO UPDATE SET
                 full_name = excluded.full_name,
                 avatar_url = excluded.avatar_url,
                 bio = excluded.bio,
                 language = excluded.language,
                 preferences = excluded.preferences,
                 updated_at = excluded.updated_at",
        )
        .bind(&profile.id)
        .bind(&profile.full_name)
        .bind(&profile.avatar_url)
        .bind(&profile.bio)
        .bind(&profile.language)
        .bind(&profile.preferences)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&self.db)
        .await?;

        Ok(profile)
    }
}
