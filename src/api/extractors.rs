use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::db::entities::prelude::*;
use crate::db::entities::user;
use crate::error::AppError;
use crate::services::security::decode_session_token;
use crate::state::AppState;

/// Extractor for authenticated operators
pub struct AuthUser(pub user::Model);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = extract_user_from_token(parts, &state.db).await?;

        match user {
            Some(u) => Ok(AuthUser(u)),
            None => Err(AppError::Unauthorized(
                "Authentication required".to_string(),
            )),
        }
    }
}

/// Extract the session user from the Authorization header or the session
/// cookie. An invalid or expired token behaves like no token at all.
async fn extract_user_from_token(
    parts: &Parts,
    db: &DatabaseConnection,
) -> Result<Option<user::Model>, AppError> {
    // A malformed header is treated like a missing one, same as an invalid
    // or expired token
    let token = if let Some(auth_header) = parts.headers.get(AUTHORIZATION) {
        auth_header
            .to_str()
            .ok()
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(|t| t.to_string())
    } else {
        parts
            .headers
            .get(axum::http::header::COOKIE)
            .and_then(|c| c.to_str().ok())
            .and_then(|cookies| {
                cookies.split(';').find_map(|cookie| {
                    cookie
                        .trim()
                        .strip_prefix("access_token=")
                        .map(|value| value.to_string())
                })
            })
    };

    let token = match token {
        Some(t) => t,
        None => return Ok(None),
    };

    let claims = match decode_session_token(&token) {
        Ok(c) => c,
        Err(_) => return Ok(None),
    };

    let user_id: i64 = claims.sub.parse().unwrap_or(0);
    let user = User::find_by_id(user_id)
        .filter(user::Column::Active.eq(true))
        .one(db)
        .await
        .map_err(AppError::Database)?;

    Ok(user)
}
