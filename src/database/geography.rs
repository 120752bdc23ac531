//! Geography reference tables served by the backend.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Database;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CountryRecord {
    pub id: String,
    pub name: String,
    pub iso2: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct StateRecord {
    pub id: String,
    pub country_id: String,
    pub name: String,
    pub iso2: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CityRecord {
    pub id: String,
    pub state_id: String,
    pub country_id: String,
    pub name: String,
}

/// Extension trait for geography database operations
pub trait GeographyOps {
    fn save_country(&self, country: &CountryRecord) -> impl std::future::Future<Output = Result<(), sqlx::Error>> + Send;
    fn save_state(&self, state: &StateRecord) -> impl std::future::Future<Output = Result<(), sqlx::Error>> + Send;
    fn save_city(&self, city: &CityRecord) -> impl std::future::Future<Output = Result<(), sqlx::Error>> + Send;
    fn list_countries(&self) -> impl std::future::Future<Output = Result<Vec<CountryRecord>, sqlx::Error>> + Send;
    fn list_states(&self, country_id: &str) -> impl std::future::Future<Output = Result<Vec<StateRecord>, sqlx::Error>> + Send;
    fn list_cities(&self, state_id: &str) -> impl std::future::Future<Output = Result<Vec<CityRecord>, sqlx::Error>> + Send;
}

impl GeographyOps for Database {
    async fn save_country(&self, country: &CountryRecord) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT OR REPLACE INTO countries (id, name, iso2) VALUES (?, ?, ?)")
            .bind(&country.id)
            .bind(&country.name)
            .bind(&country.iso2)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    async fn save_state(&self, state: &StateRecord) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT OR REPLACE INTO states (id, country_id, name, iso2) VALUES (?, ?, ?, ?)")
            .bind(&state.id)
            .bind(&state.country_id)
            .bind(&state.name)
            .bind(&state.iso2)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    async fn save_city(&self, city: &CityRecord) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT OR REPLACE INTO cities (id, state_id, country_id, name) VALUES (?, ?, ?, ?)")
            .bind(&city.id)
            .bind(&city.state_id)
            .bind(&city.country_id)
            .bind(&city.name)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    async fn list_countries(&self) -> Result<Vec<CountryRecord>, sqlx::Error> {
        sqlx::query_as::<_, CountryRecord>("SELECT * FROM countries ORDER BY name")
            .fetch_all(self.pool())
            .await
    }

    async fn list_states(&self, country_id: &str) -> Result<Vec<StateRecord>, sqlx::Error> {
        sqlx::query_as::<_, StateRecord>("SELECT * FROM states WHERE country_id = ? ORDER BY name")
            .bind(country_id)
            .fetch_all(self.pool())
            .await
    }

    async fn list_cities(&self, state_id: &str) -> Result<Vec<CityRecord>, sqlx::Error> {
        sqlx::query_as::<_, CityRecord>("SELECT * FROM cities WHERE state_id = ? ORDER BY name")
            .bind(state_id)
            .fetch_all(self.pool())
            .await
    }
}
