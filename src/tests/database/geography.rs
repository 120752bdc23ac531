//! Geography Database Tests
//!
//! Tests for the country, state and city reference tables.

use crate::database::{CityRecord, CountryRecord, GeographyOps, StateRecord};
use crate::tests::common::create_test_db;

fn country(id: &str, name: &str) -> CountryRecord {
    CountryRecord {
        id: id.to_string(),
        name: name.to_string(),
        iso2: Some(id.to_string()),
    }
}

fn state(id: &str, country_id: &str, name: &str) -> StateRecord {
    StateRecord {
        id: id.to_string(),
        country_id: country_id.to_string(),
        name: name.to_string(),
        iso2: None,
    }
}

// =============================================================================
// Countries
// =============================================================================

#[tokio::test]
async fn test_countries_sorted_by_name() {
    let (db, _temp) = create_test_db().await;

    for (id, name) in [("US", "United States"), ("AF", "Afghanistan"), ("DE", "Germany")] {
        db.save_country(&country(id, name)).await.expect("Failed to save");
    }

    let names: Vec<String> = db
        .list_countries()
        .await
        .expect("Failed to list")
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Afghanistan", "Germany", "United States"]);
}

#[tokio::test]
async fn test_save_country_replaces() {
    let (db, _temp) = create_test_db().await;

    db.save_country(&country("US", "USA")).await.expect("Failed to save");
    db.save_country(&country("US", "United States")).await.expect("Failed to save");

    let countries = db.list_countries().await.expect("Failed to list");
    assert_eq!(countries.len(), 1);
    assert_eq!(countries[0].name, "United States");
}

// =============================================================================
// States and cities
// =============================================================================

#[tokio::test]
async fn test_states_and_cities_filtered_by_parent() {
    let (db, _temp) = create_test_db().await;

    db.save_country(&country("US", "United States")).await.expect("Failed to save");
    db.save_country(&country("CA", "Canada")).await.expect("Failed to save");
    db.save_state(&state("US-TX", "US", "Texas")).await.expect("Failed to save");
    db.save_state(&state("US-CA", "US", "California")).await.expect("Failed to save");
    db.save_state(&state("CA-ON", "CA", "Ontario")).await.expect("Failed to save");

    for (id, name) in [("2", "San Diego"), ("1", "Los Angeles")] {
        db.save_city(&CityRecord {
            id: id.to_string(),
            state_id: "US-CA".to_string(),
            country_id: "US".to_string(),
            name: name.to_string(),
        })
        .await
        .expect("Failed to save");
    }

    let us_states: Vec<String> = db
        .list_states("US")
        .await
        .expect("Failed to list")
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(us_states, vec!["California", "Texas"]);

    let cities = db.list_cities("US-CA").await.expect("Failed to list");
    assert_eq!(cities[0].name, "Los Angeles");
    assert_eq!(cities[1].name, "San Diego");

    assert!(db.list_cities("US-TX").await.expect("Failed to list").is_empty());
}

#[tokio::test]
async fn test_state_requires_existing_country() {
    let (db, _temp) = create_test_db().await;

    let result = db.save_state(&state("XX-YY", "XX", "Nowhere")).await;
    assert!(result.is_err(), "Foreign key should reject an unknown country");
}
