use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::entities::component::{ComponentStatus, StatusTier};
use crate::db::entities::incident_update::IncidentStatus;
use crate::db::entities::{component, component_group, incident_update, page, user};

// ============================================================================
// Identity Request/Response Models (DTOs)
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Not a valid email address"))]
    pub email: String,
    pub full_name: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub full_name: Option<String>,
    pub active: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            active: user.active,
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserResponse,
}

// ============================================================================
// Page Request/Response Models (DTOs)
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePage {
    #[validate(length(min = 1, max = 50, message = "Name is required"))]
    pub name: String,
    #[validate(
        length(min = 1, message = "Site URL is required"),
        url(message = "Not a valid URL")
    )]
    pub site_url: String,
    pub about_page: Option<String>,
    /// IANA identifier; membership is checked against the tz database.
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdatePage {
    #[validate(length(min = 1, max = 50, message = "Name is required"))]
    pub name: String,
    #[validate(
        length(min = 1, message = "Site URL is required"),
        url(message = "Not a valid URL")
    )]
    pub site_url: String,
    pub about_page: Option<String>,
    pub timezone: Option<String>,
    pub active: Option<bool>,
}

/// Page deletion requires the operator to re-type the page's name.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DeletePage {
    #[validate(length(min = 1, message = "Confirmation name is required"))]
    pub confirm_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageResponse {
    pub id: i64,
    pub name: String,
    pub site_url: String,
    pub about_page: Option<String>,
    pub timezone: Option<String>,
    pub effective_timezone: String,
    pub active: bool,
    pub component_count: u64,
    pub incident_count: u64,
}

impl PageResponse {
    pub fn from_page_with_counts(
        page: page::Model,
        effective_timezone: chrono_tz::Tz,
        component_count: u64,
        incident_count: u64,
    ) -> Self {
        Self {
            id: page.id,
            name: page.name,
            site_url: page.site_url,
            about_page: page.about_page,
            timezone: page.timezone,
            effective_timezone: effective_timezone.name().to_string(),
            active: page.active,
            component_count,
            incident_count,
        }
    }
}

// ============================================================================
// Component Request/Response Models (DTOs)
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateComponent {
    #[validate(length(min = 1, max = 50, message = "Name is required"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(url(message = "Not a valid URL"))]
    pub link: Option<String>,
    #[serde(default)]
    pub status: ComponentStatus,
    pub group_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateComponent {
    #[validate(length(min = 1, max = 50, message = "Name is required"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(url(message = "Not a valid URL"))]
    pub link: Option<String>,
    pub status: ComponentStatus,
    pub group_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateComponentStatus {
    pub component: i64,
    pub status: ComponentStatus,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateComponentGroup {
    #[validate(length(min = 1, max = 50, message = "Name is required"))]
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub link: Option<String>,
    pub status: ComponentStatus,
    pub status_tier: StatusTier,
    pub page_id: i64,
    pub group_id: Option<i64>,
}

impl From<component::Model> for ComponentResponse {
    fn from(component: component::Model) -> Self {
        Self {
            id: component.id,
            name: component.name,
            description: component.description,
            link: component.link,
            status: component.status,
            status_tier: component.status.tier(),
            page_id: component.page_id,
            group_id: component.group_id,
        }
    }
}

/// One partition of a page's components; `group` is `None` for the partition
/// of ungrouped components.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentGroupView {
    pub group: Option<component_group::Model>,
    pub components: Vec<ComponentResponse>,
}

// ============================================================================
// Incident Request/Response Models (DTOs)
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateIncident {
    #[validate(length(min = 1, max = 100, message = "Title is required"))]
    pub title: String,
    pub status: IncidentStatus,
    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,
}

/// Editing an incident can rename it and/or append a lifecycle update.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateIncident {
    #[validate(length(min = 1, max = 100, message = "Title is required"))]
    pub title: Option<String>,
    pub status: Option<IncidentStatus>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateIncidentUpdate {
    pub status: Option<IncidentStatus>,
    #[validate(length(min = 1, message = "Message is required"))]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IncidentUpdateResponse {
    pub id: i64,
    pub status: IncidentStatus,
    pub icon: &'static str,
    pub message: String,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

impl From<incident_update::Model> for IncidentUpdateResponse {
    fn from(update: incident_update::Model) -> Self {
        Self {
            id: update.id,
            status: update.status,
            icon: update.status.icon(),
            message: update.message,
            create_time: update.create_time,
            update_time: update.update_time,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IncidentResponse {
    pub id: i64,
    pub title: String,
    pub page_id: i64,
    pub create_time: DateTime<Utc>,
    /// Derived from the most recent update; absent with zero updates.
    pub status: Option<IncidentStatus>,
    pub message: Option<String>,
    pub effective_date: NaiveDate,
    pub updates: Vec<IncidentUpdateResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IncidentDayResponse {
    pub date: NaiveDate,
    pub incidents: Vec<IncidentResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IncidentListResponse {
    pub incidents: Vec<IncidentResponse>,
    pub page_no: u64,
    pub page_size: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

// ============================================================================
// Composite View Models
// ============================================================================

/// The public status page: component health plus a day-bucketed incident
/// history window.
#[derive(Debug, Clone, Serialize)]
pub struct StatusPageResponse {
    pub page: PageResponse,
    pub groups: Vec<ComponentGroupView>,
    pub days: Vec<IncidentDayResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardResponse {
    pub page: PageResponse,
    pub groups: Vec<ComponentGroupView>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_create_page_deserialize() {
        let json = r#"{
            "name": "Demo",
            "site_url": "https://demo.example.com",
            "about_page": "All about demo",
            "timezone": "Europe/Amsterdam"
        }"#;

        let page: CreatePage = serde_json::from_str(json).unwrap();
        assert_eq!(page.name, "Demo");
        assert_eq!(page.site_url, "https://demo.example.com");
        assert_eq!(page.timezone.as_deref(), Some("Europe/Amsterdam"));
        assert!(page.validate().is_ok());
    }

    #[test]
    fn test_create_page_requires_name() {
        let page = CreatePage {
            name: String::new(),
            site_url: "https://demo.example.com".to_string(),
            about_page: None,
            timezone: None,
        };
        let errors = page.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
    }

    #[test]
    fn test_create_page_rejects_invalid_url() {
        let page = CreatePage {
            name: "Demo".to_string(),
            site_url: "not a url".to_string(),
            about_page: None,
            timezone: None,
        };
        let errors = page.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("site_url"));
    }

    #[test]
    fn test_create_component_default_status() {
        let json = r#"{"name": "API"}"#;

        let component: CreateComponent = serde_json::from_str(json).unwrap();
        assert_eq!(component.status, ComponentStatus::Operational);
        assert!(component.group_id.is_none());
    }

    #[test]
    fn test_create_component_link_is_optional_but_checked() {
        let ok = CreateComponent {
            name: "API".to_string(),
            description: None,
            link: Some("https://api.example.com".to_string()),
            status: ComponentStatus::Operational,
            group_id: None,
        };
        assert!(ok.validate().is_ok());

        let bad = CreateComponent {
            link: Some("nope".to_string()),
            ..ok
        };
        let errors = bad.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("link"));
    }

    #[test]
    fn test_create_incident_deserialize() {
        let json = r#"{
            "title": "Outage",
            "status": "Investigating",
            "message": "looking"
        }"#;

        let incident: CreateIncident = serde_json::from_str(json).unwrap();
        assert_eq!(incident.title, "Outage");
        assert_eq!(incident.status, IncidentStatus::Investigating);
        assert!(incident.validate().is_ok());
    }

    #[test]
    fn test_register_request_validates_email_and_password() {
        let bad_email = RegisterRequest {
            email: "nope".to_string(),
            full_name: None,
            password: "longenough".to_string(),
        };
        assert!(bad_email.validate().is_err());

        let short_password = RegisterRequest {
            email: "foo@bar.com".to_string(),
            full_name: None,
            password: "abc".to_string(),
        };
        assert!(short_password.validate().is_err());
    }

    #[test]
    fn test_component_response_includes_tier() {
        let model = component::Model {
            id: 1,
            name: "API".to_string(),
            description: None,
            link: None,
            status: ComponentStatus::MajorOutage,
            page_id: 1,
            group_id: None,
        };

        let response = ComponentResponse::from(model);
        assert_eq!(response.status_tier, StatusTier::Danger);

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains(r#""status":"Major Outage""#));
        assert!(json.contains(r#""status_tier":"danger""#));
    }

    #[test]
    fn test_user_response_hides_password_hash() {
        let response = UserResponse {
            id: 1,
            email: "foo@bar.com".to_string(),
            full_name: Some("Foo Bar".to_string()),
            active: true,
            is_admin: false,
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("foo@bar.com"));
        assert!(!json.contains("password"));
    }
}
