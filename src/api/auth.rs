use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde_json::{json, Value};
use tracing::info;
use validator::Validate;

use crate::db::entities::prelude::*;
use crate::db::entities::user;
use crate::db::models::{LoginRequest, LoginResponse, RegisterRequest, UserResponse};
use crate::error::{AppError, Result};
use crate::services::identity::{authenticate, users_exist};
use crate::services::security::{create_session_token, hash_password};
use crate::state::AppState;

pub fn auth_routes(state: AppState) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/register", post(register))
        .route("/setup/required", get(check_setup_required))
        .route("/setup/initialize", post(initial_setup))
        .with_state(state)
}

fn session_cookie(token: &str) -> Cookie<'static> {
    Cookie::build(("access_token", token.to_string()))
        .path("/")
        .http_only(true)
        .build()
}

/// Exchange operator credentials for a session token. The token is returned
/// in the body and also set as an HttpOnly cookie for browser clients.
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    payload.validate()?;

    let user = authenticate(&state.db, &payload.email, &payload.password).await?;
    let token = create_session_token(&user)?;

    info!("User logged in: {}", user.email);

    let jar = jar.add(session_cookie(&token));
    Ok((
        jar,
        Json(LoginResponse {
            access_token: token,
            token_type: "bearer".to_string(),
            user: UserResponse::from(user),
        }),
    ))
}

/// End the browser session by clearing the session cookie. Bearer tokens
/// simply expire; there is no server-side session store to invalidate.
async fn logout(jar: CookieJar) -> (CookieJar, Json<Value>) {
    let jar = jar.remove(Cookie::build("access_token").path("/").build());
    (jar, Json(json!({"detail": "Logged out"})))
}

/// Self-service account creation. New accounts are immediately active but
/// not admin.
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<UserResponse>> {
    payload.validate()?;

    let existing = User::find()
        .filter(user::Column::Email.eq(payload.email.clone()))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::validation("email", "Email already registered"));
    }

    let hashed = hash_password(&payload.password)?;
    let new_user = user::ActiveModel {
        email: Set(payload.email),
        full_name: Set(payload.full_name),
        hashed_password: Set(Some(hashed)),
        active: Set(true),
        is_admin: Set(false),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    // Races with a concurrent registration land on the unique index
    let user = new_user.insert(&state.db).await.map_err(|e| {
        if AppError::is_unique_violation(&e) {
            AppError::Conflict("Email already registered".to_string())
        } else {
            AppError::Database(e)
        }
    })?;

    info!("User registered: {}", user.email);

    Ok(Json(UserResponse::from(user)))
}

/// Whether the one-time initial setup still needs to run.
async fn check_setup_required(State(state): State<AppState>) -> Result<Json<Value>> {
    let setup_required = !users_exist(&state.db).await?;
    Ok(Json(json!({ "setup_required": setup_required })))
}

/// Create the first admin account. Only available while the user table is
/// empty; afterwards this endpoint refuses to run again.
async fn initial_setup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<RegisterRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    payload.validate()?;

    if users_exist(&state.db).await? {
        return Err(AppError::Forbidden(
            "Setup has already been completed".to_string(),
        ));
    }

    let hashed = hash_password(&payload.password)?;
    let new_user = user::ActiveModel {
        email: Set(payload.email),
        full_name: Set(payload.full_name),
        hashed_password: Set(Some(hashed)),
        active: Set(true),
        is_admin: Set(true),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    let user = new_user.insert(&state.db).await?;

    info!("Initial setup completed, admin created: {}", user.email);

    let token = create_session_token(&user)?;
    let jar = jar.add(session_cookie(&token));
    Ok((
        jar,
        Json(LoginResponse {
            access_token: token,
            token_type: "bearer".to_string(),
            user: UserResponse::from(user),
        }),
    ))
}
