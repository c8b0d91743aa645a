use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use tracing::info;
use validator::Validate;

use crate::api::extractors::AuthUser;
use crate::api::pages::get_page;
use crate::db::entities::prelude::*;
use crate::db::entities::{component, component_group};
use crate::db::models::{
    ComponentGroupView, ComponentResponse, CreateComponent, CreateComponentGroup, UpdateComponent,
    UpdateComponentStatus,
};
use crate::error::{AppError, Result};
use crate::services::status::components_grouped;
use crate::state::AppState;

pub fn components_routes(state: AppState) -> Router {
    Router::new()
        .route("/:page_id/components", get(list_components))
        .route("/:page_id/components/add", post(add_component))
        .route(
            "/:page_id/components/update-status",
            post(update_component_status),
        )
        .route("/:page_id/components/:component_id/edit", post(edit_component))
        .route("/:page_id/component-groups/add", post(add_component_group))
        .with_state(state)
}

/// A component may only be placed in a group of its own page.
async fn ensure_group_on_page(
    db: &DatabaseConnection,
    page_id: i64,
    group_id: Option<i64>,
) -> Result<()> {
    if let Some(group_id) = group_id {
        let group = ComponentGroup::find_by_id(group_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::validation("group_id", "Unknown component group"))?;
        if group.page_id != page_id {
            return Err(AppError::validation(
                "group_id",
                "Component group belongs to a different page",
            ));
        }
    }
    Ok(())
}

async fn get_component(db: &DatabaseConnection, component_id: i64) -> Result<component::Model> {
    Component::find_by_id(component_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Component not found".to_string()))
}

/// The page's components partitioned by group, ungrouped first.
async fn list_components(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(page_id): Path<i64>,
) -> Result<Json<Vec<ComponentGroupView>>> {
    let page = get_page(&state.db, page_id).await?;
    let views = components_grouped(&state.db, page.id).await?;
    Ok(Json(views))
}

async fn add_component(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(page_id): Path<i64>,
    Json(payload): Json<CreateComponent>,
) -> Result<Json<ComponentResponse>> {
    payload.validate()?;

    let page = get_page(&state.db, page_id).await?;
    ensure_group_on_page(&state.db, page.id, payload.group_id).await?;

    let new_component = component::ActiveModel {
        name: Set(payload.name),
        description: Set(payload.description),
        link: Set(payload.link),
        status: Set(payload.status),
        page_id: Set(page.id),
        group_id: Set(payload.group_id),
        ..Default::default()
    };
    let created = new_component.insert(&state.db).await?;

    info!(
        "Component added by {} on page {}: {}",
        user.email, page.name, created.name
    );

    Ok(Json(ComponentResponse::from(created)))
}

/// Flip a single component's operational status from the dashboard.
async fn update_component_status(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(page_id): Path<i64>,
    Json(payload): Json<UpdateComponentStatus>,
) -> Result<Json<ComponentResponse>> {
    let page = get_page(&state.db, page_id).await?;
    let component = get_component(&state.db, payload.component).await?;

    // Reject forged requests naming a component of another page
    if component.page_id != page.id {
        return Err(AppError::Forbidden(
            "Component belongs to a different page".to_string(),
        ));
    }

    let mut model: component::ActiveModel = component.into();
    model.status = Set(payload.status);
    let updated = model.update(&state.db).await?;

    info!(
        "Component status set by {}: {} -> {:?}",
        user.email, updated.name, updated.status
    );

    Ok(Json(ComponentResponse::from(updated)))
}

async fn edit_component(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((page_id, component_id)): Path<(i64, i64)>,
    Json(payload): Json<UpdateComponent>,
) -> Result<Json<ComponentResponse>> {
    payload.validate()?;

    let page = get_page(&state.db, page_id).await?;
    let component = get_component(&state.db, component_id).await?;
    if component.page_id != page.id {
        return Err(AppError::Forbidden(
            "Component belongs to a different page".to_string(),
        ));
    }
    ensure_group_on_page(&state.db, page.id, payload.group_id).await?;

    let mut model: component::ActiveModel = component.into();
    model.name = Set(payload.name);
    model.description = Set(payload.description);
    model.link = Set(payload.link);
    model.status = Set(payload.status);
    model.group_id = Set(payload.group_id);
    let updated = model.update(&state.db).await?;

    info!("Component updated by {}: {}", user.email, updated.name);

    Ok(Json(ComponentResponse::from(updated)))
}

async fn add_component_group(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(page_id): Path<i64>,
    Json(payload): Json<CreateComponentGroup>,
) -> Result<Json<component_group::Model>> {
    payload.validate()?;

    let page = get_page(&state.db, page_id).await?;
    let new_group = component_group::ActiveModel {
        name: Set(payload.name),
        page_id: Set(page.id),
        ..Default::default()
    };
    let created = new_group.insert(&state.db).await?;

    info!(
        "Component group added by {} on page {}: {}",
        user.email, page.name, created.name
    );

    Ok(Json(created))
}
