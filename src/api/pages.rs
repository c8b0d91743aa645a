use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use validator::Validate;

use crate::api::extractors::AuthUser;
use crate::db::entities::page;
use crate::db::entities::prelude::*;
use crate::db::models::{
    CreatePage, DashboardResponse, DeletePage, IncidentDayResponse, PageResponse,
    StatusPageResponse, UpdatePage,
};
use crate::error::{AppError, Result};
use crate::services::incidents::build_response;
use crate::services::status::{
    component_count, components_grouped, effective_timezone, ensure_valid_timezone, incident_count,
    incident_days,
};
use crate::state::AppState;

/// How many days of incident history the public status page shows.
const STATUS_PAGE_HISTORY_DAYS: u32 = 10;

pub fn pages_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_pages))
        .route("/add", post(add_page))
        .route("/:page_id", get(render_status_page))
        .route("/:page_id/dashboard", get(dashboard))
        .route("/:page_id/edit", post(edit_page))
        .route("/:page_id/delete", post(delete_page))
        .with_state(state)
}

/// Fetch a page or fail with 404. Shared by the component and incident
/// handlers as well.
pub(crate) async fn get_page(db: &DatabaseConnection, page_id: i64) -> Result<page::Model> {
    Page::find_by_id(page_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Page not found".to_string()))
}

async fn page_response(db: &DatabaseConnection, page: page::Model) -> Result<PageResponse> {
    let tz = effective_timezone(&page);
    let components = component_count(db, page.id).await?;
    let incidents = incident_count(db, page.id).await?;
    Ok(PageResponse::from_page_with_counts(
        page, tz, components, incidents,
    ))
}

async fn ensure_page_name_available(
    db: &DatabaseConnection,
    name: &str,
    exclude_id: Option<i64>,
) -> Result<()> {
    let mut query = Page::find().filter(page::Column::Name.eq(name));
    if let Some(id) = exclude_id {
        query = query.filter(page::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        return Err(AppError::validation(
            "name",
            "A page with this name already exists",
        ));
    }
    Ok(())
}

async fn ensure_site_url_available(
    db: &DatabaseConnection,
    site_url: &str,
    exclude_id: Option<i64>,
) -> Result<()> {
    let mut query = Page::find().filter(page::Column::SiteUrl.eq(site_url));
    if let Some(id) = exclude_id {
        query = query.filter(page::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        return Err(AppError::validation(
            "site_url",
            "A page for this site already exists",
        ));
    }
    Ok(())
}

/// List every status page for the operator overview.
async fn list_pages(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
) -> Result<Json<Vec<PageResponse>>> {
    let pages = Page::find()
        .order_by_asc(page::Column::Id)
        .all(&state.db)
        .await?;

    let mut responses = Vec::with_capacity(pages.len());
    for p in pages {
        responses.push(page_response(&state.db, p).await?);
    }

    Ok(Json(responses))
}

async fn add_page(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<CreatePage>,
) -> Result<Json<PageResponse>> {
    payload.validate()?;
    ensure_valid_timezone(payload.timezone.as_deref())?;
    ensure_page_name_available(&state.db, &payload.name, None).await?;
    ensure_site_url_available(&state.db, &payload.site_url, None).await?;

    let new_page = page::ActiveModel {
        name: Set(payload.name),
        site_url: Set(payload.site_url),
        about_page: Set(payload.about_page),
        timezone: Set(payload.timezone),
        active: Set(true),
        ..Default::default()
    };
    let created = new_page.insert(&state.db).await.map_err(|e| {
        if AppError::is_unique_violation(&e) {
            AppError::Conflict("A page with this name or site already exists".to_string())
        } else {
            AppError::Database(e)
        }
    })?;

    info!("Page created by {}: {}", user.email, created.name);

    Ok(Json(page_response(&state.db, created).await?))
}

#[derive(Debug, Deserialize)]
struct StatusPageQuery {
    /// Rewind the history window to end on this date (YYYY-MM-DD).
    date: Option<String>,
}

/// The public status page: no authentication, component health grouped by
/// component group, and a 10-day incident history ending today (or on the
/// requested date).
async fn render_status_page(
    State(state): State<AppState>,
    Path(page_id): Path<i64>,
    Query(query): Query<StatusPageQuery>,
) -> Result<Json<StatusPageResponse>> {
    let page = get_page(&state.db, page_id).await?;

    let till_date = match query.date.as_deref() {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| AppError::BadRequest("Invalid date, expected YYYY-MM-DD".to_string()))?,
        None => Utc::now().date_naive(),
    };

    let groups = components_grouped(&state.db, page.id).await?;
    let days = incident_days(&state.db, page.id, till_date, STATUS_PAGE_HISTORY_DAYS).await?;

    let mut day_responses = Vec::with_capacity(days.len());
    for day in days {
        let mut incidents = Vec::with_capacity(day.incidents.len());
        for incident in day.incidents {
            incidents.push(build_response(&state.db, incident).await?);
        }
        day_responses.push(IncidentDayResponse {
            date: day.date,
            incidents,
        });
    }

    Ok(Json(StatusPageResponse {
        page: page_response(&state.db, page).await?,
        groups,
        days: day_responses,
    }))
}

/// The operator dashboard for one page.
async fn dashboard(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(page_id): Path<i64>,
) -> Result<Json<DashboardResponse>> {
    let page = get_page(&state.db, page_id).await?;
    let groups = components_grouped(&state.db, page.id).await?;

    Ok(Json(DashboardResponse {
        page: page_response(&state.db, page).await?,
        groups,
    }))
}

async fn edit_page(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(page_id): Path<i64>,
    Json(payload): Json<UpdatePage>,
) -> Result<Json<PageResponse>> {
    payload.validate()?;
    ensure_valid_timezone(payload.timezone.as_deref())?;

    let page = get_page(&state.db, page_id).await?;
    ensure_page_name_available(&state.db, &payload.name, Some(page.id)).await?;
    ensure_site_url_available(&state.db, &payload.site_url, Some(page.id)).await?;

    let active = payload.active.unwrap_or(page.active);
    let mut model: page::ActiveModel = page.into();
    model.name = Set(payload.name);
    model.site_url = Set(payload.site_url);
    model.about_page = Set(payload.about_page);
    model.timezone = Set(payload.timezone);
    model.active = Set(active);
    let updated = model.update(&state.db).await?;

    info!("Page updated by {}: {}", user.email, updated.name);

    Ok(Json(page_response(&state.db, updated).await?))
}

/// Delete a page and everything attached to it. The operator must re-type
/// the page name (case-insensitive) as confirmation.
async fn delete_page(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(page_id): Path<i64>,
    Json(payload): Json<DeletePage>,
) -> Result<Json<Value>> {
    payload.validate()?;

    let page = get_page(&state.db, page_id).await?;
    if payload.confirm_name.trim().to_lowercase() != page.name.to_lowercase() {
        return Err(AppError::validation(
            "confirm_name",
            "Confirmation name does not match",
        ));
    }

    let name = page.name.clone();
    page.delete(&state.db).await?;

    info!("Page deleted by {}: {}", user.email, name);

    Ok(Json(json!({"detail": "Page deleted"})))
}
