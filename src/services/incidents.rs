use chrono::NaiveDate;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use crate::db::entities::incident_update::IncidentStatus;
use crate::db::entities::prelude::*;
use crate::db::entities::{incident, incident_update};
use crate::db::models::{IncidentResponse, IncidentUpdateResponse};
use crate::error::Result;

/// The most recent update: maximal (update_time, create_time).
pub fn latest_update(updates: &[incident_update::Model]) -> Option<&incident_update::Model> {
    updates.iter().max_by_key(|u| (u.update_time, u.create_time))
}

/// The first update: minimal (create_time, update_time).
pub fn earliest_update(updates: &[incident_update::Model]) -> Option<&incident_update::Model> {
    updates.iter().min_by_key(|u| (u.create_time, u.update_time))
}

/// Status of the most recent update; absent when there are no updates.
pub fn effective_status(updates: &[incident_update::Model]) -> Option<IncidentStatus> {
    latest_update(updates).map(|u| u.status)
}

/// Message of the most recent update; absent when there are no updates.
pub fn effective_message(updates: &[incident_update::Model]) -> Option<String> {
    latest_update(updates).map(|u| u.message.clone())
}

/// The date an incident is displayed under: the later of its creation date
/// and the most recent activity on its updates. With no updates this is the
/// incident's own creation date.
pub fn effective_date(
    incident: &incident::Model,
    updates: &[incident_update::Model],
) -> NaiveDate {
    let update_activity = latest_update(updates).map(|u| u.create_time.max(u.update_time));
    match update_activity {
        Some(activity) => incident.create_time.max(activity).date_naive(),
        None => incident.create_time.date_naive(),
    }
}

/// Fetch the most recent update from the store.
pub async fn last_update(
    db: &DatabaseConnection,
    incident_id: i64,
) -> Result<Option<incident_update::Model>> {
    let update = IncidentUpdate::find()
        .filter(incident_update::Column::IncidentId.eq(incident_id))
        .order_by_desc(incident_update::Column::UpdateTime)
        .order_by_desc(incident_update::Column::CreateTime)
        .one(db)
        .await?;
    Ok(update)
}

/// Fetch the first update from the store.
pub async fn first_update(
    db: &DatabaseConnection,
    incident_id: i64,
) -> Result<Option<incident_update::Model>> {
    let update = IncidentUpdate::find()
        .filter(incident_update::Column::IncidentId.eq(incident_id))
        .order_by_asc(incident_update::Column::CreateTime)
        .order_by_asc(incident_update::Column::UpdateTime)
        .one(db)
        .await?;
    Ok(update)
}

/// All updates of an incident in chronological order.
pub async fn updates_for(
    db: &DatabaseConnection,
    incident_id: i64,
) -> Result<Vec<incident_update::Model>> {
    let updates = IncidentUpdate::find()
        .filter(incident_update::Column::IncidentId.eq(incident_id))
        .order_by_asc(incident_update::Column::CreateTime)
        .order_by_asc(incident_update::Column::Id)
        .all(db)
        .await?;
    Ok(updates)
}

/// Assemble the full incident view: stored fields plus every derived
/// property. Read-only; nothing is mutated as a side effect.
pub async fn build_response(
    db: &DatabaseConnection,
    incident: incident::Model,
) -> Result<IncidentResponse> {
    let updates = updates_for(db, incident.id).await?;

    let status = effective_status(&updates);
    let message = effective_message(&updates);
    let date = effective_date(&incident, &updates);

    Ok(IncidentResponse {
        id: incident.id,
        title: incident.title,
        page_id: incident.page_id,
        create_time: incident.create_time,
        status,
        message,
        effective_date: date,
        updates: updates.into_iter().map(IncidentUpdateResponse::from).collect(),
    })
}
