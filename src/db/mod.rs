pub mod entities;
pub mod models;

use sea_orm::{ConnectionTrait, Database, DatabaseConnection};

use crate::config::CONFIG;
use crate::error::{AppError, Result};

pub use entities::prelude;

/// Connect to the database and bring the schema up to date
pub async fn connect() -> Result<DatabaseConnection> {
    tracing::info!("Connecting to database: {}", CONFIG.db_path.display());

    let db = Database::connect(CONFIG.db_url())
        .await
        .map_err(|e| AppError::Internal(format!("Failed to connect to database: {}", e)))?;

    run_migrations(&db).await?;

    Ok(db)
}

/// Run database migrations
pub async fn run_migrations(db: &DatabaseConnection) -> Result<()> {
    tracing::info!("Running database migrations...");

    db.execute_unprepared(SCHEMA_SQL)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to run migrations: {}", e)))?;

    tracing::info!("Database migrations completed");
    Ok(())
}

/// SQL schema for creating all tables.
///
/// Cascades live here: deleting a page removes its component groups,
/// components and incidents through the foreign keys, and deleting an
/// incident removes its updates.
pub const SCHEMA_SQL: &str = r#"
-- Users table
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE,
    full_name TEXT,
    hashed_password TEXT,
    active BOOLEAN NOT NULL DEFAULT 0,
    is_admin BOOLEAN NOT NULL DEFAULT 0,
    created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);

-- Roles table
CREATE TABLE IF NOT EXISTS roles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    user_id INTEGER,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_roles_name ON roles(name);

-- Status pages
CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    site_url TEXT NOT NULL UNIQUE,
    about_page TEXT,
    timezone TEXT,
    active BOOLEAN NOT NULL DEFAULT 1
);

-- Component groups
CREATE TABLE IF NOT EXISTS page_component_groups (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    page_id INTEGER NOT NULL,
    FOREIGN KEY (page_id) REFERENCES pages(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_component_groups_page ON page_component_groups(page_id);

-- Components
CREATE TABLE IF NOT EXISTS page_components (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT,
    link TEXT,
    status TEXT NOT NULL DEFAULT 'Operational',
    page_id INTEGER NOT NULL,
    group_id INTEGER,
    FOREIGN KEY (page_id) REFERENCES pages(id) ON DELETE CASCADE,
    FOREIGN KEY (group_id) REFERENCES page_component_groups(id) ON DELETE SET NULL
);

CREATE INDEX IF NOT EXISTS idx_components_page ON page_components(page_id);
CREATE INDEX IF NOT EXISTS idx_components_group ON page_components(group_id);

-- Incidents
CREATE TABLE IF NOT EXISTS page_incidents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    page_id INTEGER NOT NULL,
    create_time DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (page_id) REFERENCES pages(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_incidents_page ON page_incidents(page_id);
CREATE INDEX IF NOT EXISTS idx_incidents_create_time ON page_incidents(create_time);

-- Incident updates
CREATE TABLE IF NOT EXISTS page_incident_updates (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    status TEXT NOT NULL,
    message TEXT NOT NULL,
    incident_id INTEGER NOT NULL,
    create_time DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
    update_time DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (incident_id) REFERENCES page_incidents(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_incident_updates_incident ON page_incident_updates(incident_id);
"#;
