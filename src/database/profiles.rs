//! Profile database operations

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Database;

/// A stored profile row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ProfileRecord {
    pub id: String,
    pub username: String,
    pub password: String,
    pub profession: Option<String>,
    pub company_name: Option<String>,
    pub address1: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub plan: Option<String>,
    pub newsletter: bool,
    pub photo: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Values for a new profile. The id and timestamps are assigned on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewProfile {
    pub username: String,
    pub password: String,
    pub profession: Option<String>,
    pub company_name: Option<String>,
    pub address1: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub plan: Option<String>,
    pub newsletter: bool,
    pub photo: String,
}

/// Extension trait for profile database operations
pub trait ProfileOps {
    fn create_profile(&self, profile: &NewProfile) -> impl std::future::Future<Output = Result<ProfileRecord, sqlx::Error>> + Send;
    fn get_profile(&self, id: &str) -> impl std::future::Future<Output = Result<Option<ProfileRecord>, sqlx::Error>> + Send;
    fn get_profile_by_username(&self, username: &str) -> impl std::future::Future<Output = Result<Option<ProfileRecord>, sqlx::Error>> + Send;
    fn username_exists(&self, username: &str) -> impl std::future::Future<Output = Result<bool, sqlx::Error>> + Send;
    fn list_profiles(&self) -> impl std::future::Future<Output = Result<Vec<ProfileRecord>, sqlx::Error>> + Send;
    fn delete_profile(&self, id: &str) -> impl std::future::Future<Output = Result<bool, sqlx::Error>> + Send;
}

impl ProfileOps for Database {
    async fn create_profile(&self, profile: &NewProfile) -> Result<ProfileRecord, sqlx::Error> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO profiles (id, username, password, profession, company_name, address1,
                                  country, state, city, plan, newsletter, photo,
                                  created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&profile.username)
        .bind(&profile.password)
        .bind(&profile.profession)
        .bind(&profile.company_name)
        .bind(&profile.address1)
        .bind(&profile.country)
        .bind(&profile.state)
        .bind(&profile.city)
        .bind(&profile.plan)
        .bind(profile.newsletter)
        .bind(&profile.photo)
        .bind(&now)
        .bind(&now)
        .execute(self.pool())
        .await?;

        tracing::debug!(id = %id, username = %profile.username, "Profile inserted");

        Ok(ProfileRecord {
            id,
            username: profile.username.clone(),
            password: profile.password.clone(),
            profession: profile.profession.clone(),
            company_name: profile.company_name.clone(),
            address1: profile.address1.clone(),
            country: profile.country.clone(),
            state: profile.state.clone(),
            city: profile.city.clone(),
            plan: profile.plan.clone(),
            newsletter: profile.newsletter,
            photo: profile.photo.clone(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    async fn get_profile(&self, id: &str) -> Result<Option<ProfileRecord>, sqlx::Error> {
        sqlx::query_as::<_, ProfileRecord>("SELECT * FROM profiles WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await
    }

    async fn get_profile_by_username(&self, username: &str) -> Result<Option<ProfileRecord>, sqlx::Error> {
        sqlx::query_as::<_, ProfileRecord>("SELECT * FROM profiles WHERE username = ?")
            .bind(username)
            .fetch_optional(self.pool())
            .await
    }

    async fn username_exists(&self, username: &str) -> Result<bool, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles WHERE username = ?")
            .bind(username)
            .fetch_one(self.pool())
            .await?;
        Ok(count > 0)
    }

    async fn list_profiles(&self) -> Result<Vec<ProfileRecord>, sqlx::Error> {
        sqlx::query_as::<_, ProfileRecord>("SELECT * FROM profiles ORDER BY created_at DESC")
            .fetch_all(self.pool())
            .await
    }

    async fn delete_profile(&self, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM profiles WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
