use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::CONFIG;
use crate::db::entities::user;
use crate::error::Result;

/// Session token claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (user id)
    pub exp: i64,    // Expiration time
    pub iat: i64,    // Issued at
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

/// Hash a password using bcrypt
pub fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|e| e.into())
}

/// Verify a password against its hash.
///
/// Returns false for any mismatch, including when no hash has ever been set
/// for the user.
pub fn verify_password(password: &str, hash: Option<&str>) -> bool {
    match hash {
        Some(hash) => bcrypt::verify(password, hash).unwrap_or(false),
        None => false,
    }
}

/// Create a signed session token bound to a user's identity
pub fn create_session_token(user: &user::Model) -> Result<String> {
    let now = Utc::now();
    let exp = now + Duration::seconds(CONFIG.session_ttl_secs);

    let claims = Claims {
        sub: user.id.to_string(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
        email: Some(user.email.clone()),
        jti: Some(uuid::Uuid::new_v4().to_string()),
    };

    let encoding_key = EncodingKey::from_secret(CONFIG.session_secret.as_bytes());
    let header = Header::new(jsonwebtoken::Algorithm::HS256);
    encode(&header, &claims, &encoding_key).map_err(|e| e.into())
}

/// Decode and validate a session token
pub fn decode_session_token(token: &str) -> Result<Claims> {
    let decoding_key = DecodingKey::from_secret(CONFIG.session_secret.as_bytes());

    let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(token, &decoding_key, &validation)?;
    Ok(token_data.claims)
}
