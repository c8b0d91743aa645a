use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use chrono_tz::Tz;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};

use crate::db::entities::prelude::*;
use crate::db::entities::{component, component_group, incident, page};
use crate::db::models::{ComponentGroupView, ComponentResponse};
use crate::error::{AppError, Result};

/// The page's configured timezone, defaulting to UTC when unset.
///
/// Never fails: an unparseable stored value also degrades to UTC.
pub fn effective_timezone(page: &page::Model) -> Tz {
    page.timezone
        .as_deref()
        .and_then(|tz| tz.parse().ok())
        .unwrap_or(Tz::UTC)
}

/// Reject timezone identifiers that are not in the tz database.
pub fn ensure_valid_timezone(timezone: Option<&str>) -> Result<()> {
    if let Some(tz) = timezone {
        if tz.parse::<Tz>().is_err() {
            return Err(AppError::validation("timezone", "Unknown timezone"));
        }
    }
    Ok(())
}

/// Number of components attached to the page. Recomputed on every call.
pub async fn component_count(db: &DatabaseConnection, page_id: i64) -> Result<u64> {
    let count = Component::find()
        .filter(component::Column::PageId.eq(page_id))
        .count(db)
        .await?;
    Ok(count)
}

/// Number of incidents that have ever happened on the page.
pub async fn incident_count(db: &DatabaseConnection, page_id: i64) -> Result<u64> {
    let count = Incident::find()
        .filter(incident::Column::PageId.eq(page_id))
        .count(db)
        .await?;
    Ok(count)
}

/// All components of a page partitioned by component group.
///
/// The component group is not mandatory, so ungrouped components form their
/// own leading partition. Partitions follow group id order and components
/// within a partition follow component id order, which keeps the projection
/// stable across calls.
pub async fn components_grouped(
    db: &DatabaseConnection,
    page_id: i64,
) -> Result<Vec<ComponentGroupView>> {
    let groups = ComponentGroup::find()
        .filter(component_group::Column::PageId.eq(page_id))
        .order_by_asc(component_group::Column::Id)
        .all(db)
        .await?;

    let components = Component::find()
        .filter(component::Column::PageId.eq(page_id))
        .order_by_asc(component::Column::Id)
        .all(db)
        .await?;

    let mut by_group: HashMap<Option<i64>, Vec<ComponentResponse>> = HashMap::new();
    for component in components {
        by_group
            .entry(component.group_id)
            .or_default()
            .push(ComponentResponse::from(component));
    }

    let mut views = Vec::with_capacity(groups.len() + 1);
    if let Some(ungrouped) = by_group.remove(&None) {
        views.push(ComponentGroupView {
            group: None,
            components: ungrouped,
        });
    }
    for group in groups {
        let components = by_group.remove(&Some(group.id)).unwrap_or_default();
        views.push(ComponentGroupView {
            group: Some(group),
            components,
        });
    }

    Ok(views)
}

/// One calendar day of a page's incident history.
#[derive(Debug, Clone)]
pub struct IncidentDay {
    pub date: NaiveDate,
    pub incidents: Vec<incident::Model>,
}

/// Day-bucketed incident history: exactly `days` entries, one per calendar
/// day, strictly descending from `till_date`.
///
/// Each day covers 00:00:00 through 23:59:59.999999 inclusive against the
/// incident's creation time; an empty day yields an empty list, never an
/// omitted entry. Repeated calls are safe, there is no cursor state.
pub async fn incident_days(
    db: &DatabaseConnection,
    page_id: i64,
    till_date: NaiveDate,
    days: u32,
) -> Result<Vec<IncidentDay>> {
    if days == 0 {
        return Ok(Vec::new());
    }

    // till_date can come straight from a request parameter, and chrono's
    // parser accepts dates near the representable limits
    let first_date = till_date
        .checked_sub_days(Days::new(u64::from(days - 1)))
        .ok_or_else(|| AppError::BadRequest("Date out of range".to_string()))?;
    let window_start = first_date.and_hms_opt(0, 0, 0).expect("valid day start").and_utc();
    let window_end = till_date
        .and_hms_micro_opt(23, 59, 59, 999_999)
        .expect("valid day end")
        .and_utc();

    let incidents = Incident::find()
        .filter(incident::Column::PageId.eq(page_id))
        .filter(incident::Column::CreateTime.gte(window_start))
        .filter(incident::Column::CreateTime.lte(window_end))
        .order_by_asc(incident::Column::Id)
        .all(db)
        .await?;

    let mut by_date: HashMap<NaiveDate, Vec<incident::Model>> = HashMap::new();
    for incident in incidents {
        by_date
            .entry(incident.create_time.date_naive())
            .or_default()
            .push(incident);
    }

    let mut out = Vec::with_capacity(days as usize);
    for delta in 0..days {
        // Cannot underflow: delta never exceeds the offset checked above
        let date = till_date
            .checked_sub_days(Days::new(u64::from(delta)))
            .ok_or_else(|| AppError::BadRequest("Date out of range".to_string()))?;
        out.push(IncidentDay {
            date,
            incidents: by_date.remove(&date).unwrap_or_default(),
        });
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::entities::component::ComponentStatus;
    use crate::test_helpers::{
        create_test_component, create_test_db, create_test_group, create_test_incident_at,
        create_test_page,
    };
    use chrono::{NaiveDate, TimeZone, Utc};

    #[test]
    fn test_effective_timezone_defaults_to_utc() {
        let page = page::Model {
            id: 1,
            name: "Demo".to_string(),
            site_url: "https://demo.example.com".to_string(),
            about_page: None,
            timezone: None,
            active: true,
        };
        assert_eq!(effective_timezone(&page), Tz::UTC);
    }

    #[test]
    fn test_effective_timezone_uses_configured_zone() {
        let page = page::Model {
            id: 1,
            name: "Demo".to_string(),
            site_url: "https://demo.example.com".to_string(),
            about_page: None,
            timezone: Some("Europe/Amsterdam".to_string()),
            active: true,
        };
        assert_eq!(effective_timezone(&page), chrono_tz::Europe::Amsterdam);
    }

    #[test]
    fn test_effective_timezone_degrades_on_garbage() {
        let page = page::Model {
            id: 1,
            name: "Demo".to_string(),
            site_url: "https://demo.example.com".to_string(),
            about_page: None,
            timezone: Some("Not/AZone".to_string()),
            active: true,
        };
        assert_eq!(effective_timezone(&page), Tz::UTC);
    }

    #[test]
    fn test_ensure_valid_timezone() {
        assert!(ensure_valid_timezone(None).is_ok());
        assert!(ensure_valid_timezone(Some("UTC")).is_ok());
        assert!(ensure_valid_timezone(Some("America/New_York")).is_ok());
        assert!(ensure_valid_timezone(Some("Mars/Olympus")).is_err());
    }

    #[tokio::test]
    async fn test_component_count_recomputes() {
        let db = create_test_db().await;
        let page = create_test_page(&db, "Demo", "https://demo.example.com").await;

        assert_eq!(component_count(&db, page.id).await.unwrap(), 0);

        for name in ["c1", "c2", "c3", "c4"] {
            create_test_component(&db, page.id, name, None, ComponentStatus::Operational).await;
        }

        assert_eq!(component_count(&db, page.id).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_incident_count_scoped_to_page() {
        let db = create_test_db().await;
        let page = create_test_page(&db, "Demo", "https://demo.example.com").await;
        let other = create_test_page(&db, "Other", "https://other.example.com").await;

        let now = Utc::now();
        create_test_incident_at(&db, page.id, "Outage", now).await;
        create_test_incident_at(&db, other.id, "Unrelated", now).await;

        assert_eq!(incident_count(&db, page.id).await.unwrap(), 1);
        assert_eq!(incident_count(&db, other.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_components_grouped_partitions() {
        let db = create_test_db().await;
        let page = create_test_page(&db, "Demo", "https://demo.example.com").await;
        let group = create_test_group(&db, page.id, "Backend").await;

        create_test_component(&db, page.id, "Website", None, ComponentStatus::Operational).await;
        create_test_component(&db, page.id, "API", Some(group.id), ComponentStatus::PartialOutage)
            .await;
        create_test_component(&db, page.id, "Worker", Some(group.id), ComponentStatus::Operational)
            .await;

        let views = components_grouped(&db, page.id).await.unwrap();
        assert_eq!(views.len(), 2);

        // Ungrouped partition leads
        assert!(views[0].group.is_none());
        assert_eq!(views[0].components.len(), 1);
        assert_eq!(views[0].components[0].name, "Website");

        assert_eq!(views[1].group.as_ref().unwrap().name, "Backend");
        assert_eq!(views[1].components.len(), 2);
        assert_eq!(views[1].components[0].name, "API");
        assert_eq!(views[1].components[1].name, "Worker");
    }

    #[tokio::test]
    async fn test_components_grouped_is_idempotent() {
        let db = create_test_db().await;
        let page = create_test_page(&db, "Demo", "https://demo.example.com").await;
        let group = create_test_group(&db, page.id, "Backend").await;
        create_test_component(&db, page.id, "API", Some(group.id), ComponentStatus::Operational)
            .await;
        create_test_component(&db, page.id, "Website", None, ComponentStatus::Operational).await;

        let first = components_grouped(&db, page.id).await.unwrap();
        let second = components_grouped(&db, page.id).await.unwrap();

        let names = |views: &[ComponentGroupView]| {
            views
                .iter()
                .map(|v| {
                    (
                        v.group.as_ref().map(|g| g.name.clone()),
                        v.components.iter().map(|c| c.name.clone()).collect::<Vec<_>>(),
                    )
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(names(&first), names(&second));
    }

    #[tokio::test]
    async fn test_empty_group_still_appears() {
        let db = create_test_db().await;
        let page = create_test_page(&db, "Demo", "https://demo.example.com").await;
        create_test_group(&db, page.id, "Empty").await;

        let views = components_grouped(&db, page.id).await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].group.as_ref().unwrap().name, "Empty");
        assert!(views[0].components.is_empty());
    }

    #[tokio::test]
    async fn test_incident_days_exact_window() {
        let db = create_test_db().await;
        let page = create_test_page(&db, "Demo", "https://demo.example.com").await;

        let till = NaiveDate::from_ymd_opt(2015, 6, 10).unwrap();
        // One incident inside the window, one on the boundary day, one outside
        create_test_incident_at(
            &db,
            page.id,
            "Inside",
            Utc.with_ymd_and_hms(2015, 6, 9, 12, 0, 0).unwrap(),
        )
        .await;
        create_test_incident_at(
            &db,
            page.id,
            "Boundary",
            Utc.with_ymd_and_hms(2015, 6, 1, 0, 0, 0).unwrap(),
        )
        .await;
        create_test_incident_at(
            &db,
            page.id,
            "Outside",
            Utc.with_ymd_and_hms(2015, 5, 31, 23, 59, 59).unwrap(),
        )
        .await;

        let days = incident_days(&db, page.id, till, 10).await.unwrap();
        assert_eq!(days.len(), 10);

        // Strictly descending, one per calendar day
        for (i, day) in days.iter().enumerate() {
            assert_eq!(day.date, till - Days::new(i as u64));
        }

        let inside_day = &days[1];
        assert_eq!(inside_day.incidents.len(), 1);
        assert_eq!(inside_day.incidents[0].title, "Inside");

        let boundary_day = &days[9];
        assert_eq!(boundary_day.incidents.len(), 1);
        assert_eq!(boundary_day.incidents[0].title, "Boundary");

        // The May 31st incident falls before the window
        let titles: Vec<_> = days
            .iter()
            .flat_map(|d| d.incidents.iter().map(|i| i.title.clone()))
            .collect();
        assert!(!titles.contains(&"Outside".to_string()));
    }

    #[tokio::test]
    async fn test_incident_days_rejects_out_of_range_date() {
        let db = create_test_db().await;
        let page = create_test_page(&db, "Demo", "https://demo.example.com").await;

        // The date parser accepts years near the representable minimum, where
        // stepping back further is impossible
        let till = NaiveDate::parse_from_str("-262143-01-01", "%Y-%m-%d").unwrap();
        let err = incident_days(&db, page.id, till, 10).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_incident_days_empty_days_are_present() {
        let db = create_test_db().await;
        let page = create_test_page(&db, "Demo", "https://demo.example.com").await;

        let till = NaiveDate::from_ymd_opt(2015, 6, 10).unwrap();
        let days = incident_days(&db, page.id, till, 3).await.unwrap();

        assert_eq!(days.len(), 3);
        assert!(days.iter().all(|d| d.incidents.is_empty()));
    }

    #[tokio::test]
    async fn test_incident_days_single_day() {
        let db = create_test_db().await;
        let page = create_test_page(&db, "Demo", "https://demo.example.com").await;

        let till = NaiveDate::from_ymd_opt(2015, 6, 10).unwrap();
        create_test_incident_at(
            &db,
            page.id,
            "Late",
            Utc.with_ymd_and_hms(2015, 6, 10, 23, 59, 59).unwrap(),
        )
        .await;

        let days = incident_days(&db, page.id, till, 1).await.unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].date, till);
        assert_eq!(days[0].incidents.len(), 1);
    }

    #[tokio::test]
    async fn test_incident_days_natural_order_within_day() {
        let db = create_test_db().await;
        let page = create_test_page(&db, "Demo", "https://demo.example.com").await;

        let till = NaiveDate::from_ymd_opt(2015, 6, 10).unwrap();
        // Inserted later in the day first to prove id order, not time order
        create_test_incident_at(
            &db,
            page.id,
            "First inserted",
            Utc.with_ymd_and_hms(2015, 6, 10, 18, 0, 0).unwrap(),
        )
        .await;
        create_test_incident_at(
            &db,
            page.id,
            "Second inserted",
            Utc.with_ymd_and_hms(2015, 6, 10, 9, 0, 0).unwrap(),
        )
        .await;

        let days = incident_days(&db, page.id, till, 1).await.unwrap();
        let titles: Vec<_> = days[0].incidents.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["First inserted", "Second inserted"]);
    }
}
