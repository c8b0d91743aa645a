use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,

    // Database
    pub db_path: PathBuf,

    // Sessions
    pub session_secret: String,
    pub session_ttl_secs: i64,

    // Build info
    pub version: String,

    // Logging
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            // Server
            host: env::var("STATUSDECK_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("STATUSDECK_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),

            // Database
            db_path: PathBuf::from(
                env::var("STATUSDECK_DB_PATH")
                    .unwrap_or_else(|_| "/data/statusdeck.db".to_string()),
            ),

            // Sessions: without a configured secret an ephemeral one is
            // generated, so sessions do not survive a restart.
            session_secret: env::var("STATUSDECK_SESSION_SECRET")
                .unwrap_or_else(|_| generate_ephemeral_secret()),
            session_ttl_secs: env::var("STATUSDECK_SESSION_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(7 * 24 * 3600),

            // Build info
            version: env!("CARGO_PKG_VERSION").to_string(),

            // Logging
            log_level: env::var("STATUSDECK_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }

    pub fn db_url(&self) -> String {
        format!("sqlite://{}?mode=rwc", self.db_path.display())
    }
}

fn generate_ephemeral_secret() -> String {
    use rand::Rng;
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);
