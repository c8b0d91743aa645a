use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::info;
use validator::Validate;

use crate::api::extractors::AuthUser;
use crate::api::pages::get_page;
use crate::db::entities::prelude::*;
use crate::db::entities::{incident, incident_update};
use crate::db::models::{
    CreateIncident, IncidentListResponse, IncidentResponse, IncidentUpdateResponse,
    UpdateIncident, UpdateIncidentUpdate,
};
use crate::error::{AppError, Result};
use crate::services::incidents::build_response;
use crate::state::AppState;

/// Incidents shown per page of the operator incident list.
const INCIDENTS_PAGE_SIZE: u64 = 5;

pub fn incidents_routes(state: AppState) -> Router {
    // The page-number route and the incident routes share a path segment,
    // and the router requires a single parameter name per position.
    Router::new()
        .route("/:page_id/incidents", get(list_incidents))
        .route("/:page_id/incidents/add", post(add_incident))
        .route("/:page_id/incidents/:incident_id", get(list_incidents_page))
        .route("/:page_id/incidents/:incident_id/edit", post(edit_incident))
        .route(
            "/:page_id/incidents/:incident_id/updates/:update_id/edit",
            post(edit_incident_update),
        )
        .with_state(state)
}

async fn get_incident(db: &DatabaseConnection, incident_id: i64) -> Result<incident::Model> {
    Incident::find_by_id(incident_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Incident not found".to_string()))
}

async fn incident_list(
    db: &DatabaseConnection,
    page_id: i64,
    page_no: u64,
) -> Result<IncidentListResponse> {
    if page_no < 1 {
        return Err(AppError::BadRequest("Invalid page number".to_string()));
    }

    let paginator = Incident::find()
        .filter(incident::Column::PageId.eq(page_id))
        .order_by_desc(incident::Column::CreateTime)
        .order_by_desc(incident::Column::Id)
        .paginate(db, INCIDENTS_PAGE_SIZE);

    let totals = paginator.num_items_and_pages().await?;
    let models = paginator.fetch_page(page_no - 1).await?;

    let mut incidents = Vec::with_capacity(models.len());
    for model in models {
        incidents.push(build_response(db, model).await?);
    }

    Ok(IncidentListResponse {
        incidents,
        page_no,
        page_size: INCIDENTS_PAGE_SIZE,
        total_items: totals.number_of_items,
        total_pages: totals.number_of_pages,
    })
}

/// First page of the incident list, newest first.
async fn list_incidents(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(page_id): Path<i64>,
) -> Result<Json<IncidentListResponse>> {
    let page = get_page(&state.db, page_id).await?;
    Ok(Json(incident_list(&state.db, page.id, 1).await?))
}

async fn list_incidents_page(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path((page_id, page_no)): Path<(i64, u64)>,
) -> Result<Json<IncidentListResponse>> {
    let page = get_page(&state.db, page_id).await?;
    Ok(Json(incident_list(&state.db, page.id, page_no).await?))
}

/// Open an incident. The first update is created in the same request so an
/// incident never starts out without a status.
async fn add_incident(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(page_id): Path<i64>,
    Json(payload): Json<CreateIncident>,
) -> Result<Json<IncidentResponse>> {
    payload.validate()?;

    let page = get_page(&state.db, page_id).await?;
    let now = Utc::now();

    let new_incident = incident::ActiveModel {
        title: Set(payload.title),
        page_id: Set(page.id),
        create_time: Set(now),
        ..Default::default()
    };
    let created = new_incident.insert(&state.db).await?;

    let initial_update = incident_update::ActiveModel {
        status: Set(payload.status),
        message: Set(payload.message),
        incident_id: Set(created.id),
        create_time: Set(now),
        update_time: Set(now),
        ..Default::default()
    };
    initial_update.insert(&state.db).await?;

    info!(
        "Incident opened by {} on page {}: {}",
        user.email, page.name, created.title
    );

    Ok(Json(build_response(&state.db, created).await?))
}

/// Rename an incident and/or append a lifecycle update to it.
async fn edit_incident(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((page_id, incident_id)): Path<(i64, i64)>,
    Json(payload): Json<UpdateIncident>,
) -> Result<Json<IncidentResponse>> {
    payload.validate()?;

    let page = get_page(&state.db, page_id).await?;
    let incident = get_incident(&state.db, incident_id).await?;
    if incident.page_id != page.id {
        return Err(AppError::Forbidden(
            "Incident belongs to a different page".to_string(),
        ));
    }

    let incident = match payload.title {
        Some(title) => {
            let mut model: incident::ActiveModel = incident.into();
            model.title = Set(title);
            model.update(&state.db).await?
        }
        None => incident,
    };

    // A posted update needs both halves
    match (payload.status, payload.message) {
        (Some(status), Some(message)) => {
            let now = Utc::now();
            let new_update = incident_update::ActiveModel {
                status: Set(status),
                message: Set(message),
                incident_id: Set(incident.id),
                create_time: Set(now),
                update_time: Set(now),
                ..Default::default()
            };
            new_update.insert(&state.db).await?;
        }
        (None, None) => {}
        (Some(_), None) => {
            return Err(AppError::validation(
                "message",
                "Message is required when posting an update",
            ))
        }
        (None, Some(_)) => {
            return Err(AppError::validation(
                "status",
                "Status is required when posting an update",
            ))
        }
    }

    info!("Incident updated by {}: {}", user.email, incident.title);

    Ok(Json(build_response(&state.db, incident).await?))
}

/// Correct an existing update. Its update_time is refreshed, which can make
/// it the incident's most recent update again.
async fn edit_incident_update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((page_id, incident_id, update_id)): Path<(i64, i64, i64)>,
    Json(payload): Json<UpdateIncidentUpdate>,
) -> Result<Json<IncidentUpdateResponse>> {
    payload.validate()?;

    let page = get_page(&state.db, page_id).await?;
    let incident = get_incident(&state.db, incident_id).await?;
    if incident.page_id != page.id {
        return Err(AppError::Forbidden(
            "Incident belongs to a different page".to_string(),
        ));
    }

    let update = IncidentUpdate::find_by_id(update_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Incident update not found".to_string()))?;
    if update.incident_id != incident.id {
        return Err(AppError::Forbidden(
            "Update belongs to a different incident".to_string(),
        ));
    }

    let mut model: incident_update::ActiveModel = update.into();
    if let Some(status) = payload.status {
        model.status = Set(status);
    }
    if let Some(message) = payload.message {
        model.message = Set(message);
    }
    model.update_time = Set(Utc::now());
    let updated = model.update(&state.db).await?;

    info!(
        "Incident update edited by {} on incident {}",
        user.email, incident.title
    );

    Ok(Json(IncidentUpdateResponse::from(updated)))
}
