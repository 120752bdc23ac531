//! Profile Database Tests
//!
//! Tests for profile CRUD operations and username uniqueness.

use crate::database::{is_unique_violation, ProfileOps};
use crate::tests::common::{create_test_db, sample_new_profile};

// =============================================================================
// Profile Tests
// =============================================================================

#[tokio::test]
async fn test_profile_lifecycle() {
    let (db, _temp) = create_test_db().await;

    let created = db
        .create_profile(&sample_new_profile("alice123"))
        .await
        .expect("Failed to create");
    assert!(!created.id.is_empty());
    assert_eq!(created.created_at, created.updated_at);

    let fetched = db
        .get_profile(&created.id)
        .await
        .expect("Failed to get")
        .expect("Profile not found");
    assert_eq!(fetched, created);

    let by_name = db
        .get_profile_by_username("alice123")
        .await
        .expect("Failed to get")
        .expect("Profile not found");
    assert_eq!(by_name.id, created.id);

    assert!(db.delete_profile(&created.id).await.expect("Failed to delete"));
    assert!(db.get_profile(&created.id).await.expect("Failed to get").is_none());
    assert!(!db.delete_profile(&created.id).await.expect("Failed to delete"));
}

#[tokio::test]
async fn test_optional_fields_round_trip_as_null() {
    let (db, _temp) = create_test_db().await;

    let mut profile = sample_new_profile("minimal");
    profile.profession = None;
    profile.address1 = None;
    profile.plan = None;
    profile.newsletter = true;
    profile.photo = "data:image/png;base64,iVBORw0KGgo=".to_string();

    let created = db.create_profile(&profile).await.expect("Failed to create");
    let fetched = db
        .get_profile(&created.id)
        .await
        .expect("Failed to get")
        .expect("Profile not found");

    assert_eq!(fetched.profession, None);
    assert_eq!(fetched.address1, None);
    assert_eq!(fetched.plan, None);
    assert!(fetched.newsletter);
    assert_eq!(fetched.photo, profile.photo);
}

#[tokio::test]
async fn test_username_uniqueness() {
    let (db, _temp) = create_test_db().await;

    db.create_profile(&sample_new_profile("alice123"))
        .await
        .expect("Failed to create");
    assert!(db.username_exists("alice123").await.expect("Failed to check"));
    assert!(!db.username_exists("Alice123").await.expect("Failed to check"));

    let err = db
        .create_profile(&sample_new_profile("alice123"))
        .await
        .expect_err("Duplicate username should fail");
    assert!(is_unique_violation(&err));

    assert_eq!(db.list_profiles().await.expect("Failed to list").len(), 1);
}

#[tokio::test]
async fn test_list_profiles_newest_first() {
    let (db, _temp) = create_test_db().await;

    for name in ["first", "second", "third"] {
        db.create_profile(&sample_new_profile(name))
            .await
            .expect("Failed to create");
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let names: Vec<String> = db
        .list_profiles()
        .await
        .expect("Failed to list")
        .into_iter()
        .map(|p| p.username)
        .collect();
    assert_eq!(names, vec!["third", "second", "first"]);
}

#[tokio::test]
async fn test_database_reopens_with_data() {
    let (db, temp) = create_test_db().await;
    db.create_profile(&sample_new_profile("alice123"))
        .await
        .expect("Failed to create");
    let path = db.path().to_path_buf();
    drop(db);

    let reopened = crate::database::Database::new(temp.path())
        .await
        .expect("Failed to reopen");
    assert_eq!(reopened.path(), path.as_path());
    assert!(reopened.username_exists("alice123").await.expect("Failed to check"));
}
