//! Test helpers and utilities for unit and integration testing.
//!
//! Provides an in-memory SQLite database with the schema applied and factory
//! functions for the common entities.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};

use crate::db::entities::component::ComponentStatus;
use crate::db::entities::incident_update::IncidentStatus;
use crate::db::entities::{component, component_group, incident, incident_update, page, user};
use crate::services::security::hash_password;

/// Create an in-memory SQLite database for testing
pub async fn create_test_db() -> DatabaseConnection {
    // Each connection gets its own database
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    crate::db::run_migrations(&db)
        .await
        .expect("Failed to run test migrations");

    db
}

/// Create a test user; `password` of `None` leaves the credential unset
pub async fn create_test_user(
    db: &DatabaseConnection,
    email: &str,
    password: Option<&str>,
    active: bool,
) -> user::Model {
    let hashed = password.map(|p| hash_password(p).unwrap());

    let new_user = user::ActiveModel {
        email: Set(email.to_string()),
        full_name: Set(None),
        hashed_password: Set(hashed),
        active: Set(active),
        is_admin: Set(false),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    new_user.insert(db).await.unwrap()
}

/// Create a test status page
pub async fn create_test_page(db: &DatabaseConnection, name: &str, site_url: &str) -> page::Model {
    let new_page = page::ActiveModel {
        name: Set(name.to_string()),
        site_url: Set(site_url.to_string()),
        about_page: Set(None),
        timezone: Set(None),
        active: Set(true),
        ..Default::default()
    };

    new_page.insert(db).await.unwrap()
}

/// Create a test component group on a page
pub async fn create_test_group(
    db: &DatabaseConnection,
    page_id: i64,
    name: &str,
) -> component_group::Model {
    let new_group = component_group::ActiveModel {
        name: Set(name.to_string()),
        page_id: Set(page_id),
        ..Default::default()
    };

    new_group.insert(db).await.unwrap()
}

/// Create a test component, optionally inside a group
pub async fn create_test_component(
    db: &DatabaseConnection,
    page_id: i64,
    name: &str,
    group_id: Option<i64>,
    status: ComponentStatus,
) -> component::Model {
    let new_component = component::ActiveModel {
        name: Set(name.to_string()),
        description: Set(None),
        link: Set(None),
        status: Set(status),
        page_id: Set(page_id),
        group_id: Set(group_id),
        ..Default::default()
    };

    new_component.insert(db).await.unwrap()
}

/// Create a test incident with an explicit creation time
pub async fn create_test_incident_at(
    db: &DatabaseConnection,
    page_id: i64,
    title: &str,
    create_time: DateTime<Utc>,
) -> incident::Model {
    let new_incident = incident::ActiveModel {
        title: Set(title.to_string()),
        page_id: Set(page_id),
        create_time: Set(create_time),
        ..Default::default()
    };

    new_incident.insert(db).await.unwrap()
}

/// Create a test incident update with create and update time both set to `at`
pub async fn create_test_update_at(
    db: &DatabaseConnection,
    incident_id: i64,
    status: IncidentStatus,
    message: &str,
    at: DateTime<Utc>,
) -> incident_update::Model {
    let new_update = incident_update::ActiveModel {
        status: Set(status),
        message: Set(message.to_string()),
        incident_id: Set(incident_id),
        create_time: Set(at),
        update_time: Set(at),
        ..Default::default()
    };

    new_update.insert(db).await.unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::EntityTrait;

    #[tokio::test]
    async fn test_create_test_db() {
        let db = create_test_db().await;
        assert!(db.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_factories_round_trip() {
        use crate::db::entities::prelude::*;

        let db = create_test_db().await;
        let page = create_test_page(&db, "Demo", "https://demo.example.com").await;
        let group = create_test_group(&db, page.id, "Backend").await;
        let component =
            create_test_component(&db, page.id, "API", Some(group.id), ComponentStatus::Operational)
                .await;

        assert_eq!(component.page_id, page.id);
        assert_eq!(component.group_id, Some(group.id));

        let fetched = Component::find_by_id(component.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.status, ComponentStatus::Operational);
    }

    #[tokio::test]
    async fn test_user_factory_defaults() {
        let db = create_test_db().await;
        let user = create_test_user(&db, "foo@bar.com", None, true).await;

        assert_eq!(user.email, "foo@bar.com");
        assert!(user.hashed_password.is_none());
        assert!(!user.is_admin);
    }
}
