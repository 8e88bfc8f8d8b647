//! Session persistence.
//!
//! SQLite-backed storage for workout session summaries, stored at
//! `~/.formcoach/formcoach.db`. Plain CRUD: the only processing is range
//! sanitisation at construction time.

pub mod migrations;
pub mod schema;
pub mod summary;

use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::OnceLock;

use crate::database::migrations::run_migrations;

/// Global database path, initialised once.
static DATABASE_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Database error types.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Failed to create database directory: {0}")]
    DirectoryCreation(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Migration failed: {0}")]
    Migration(String),
}

/// Returns the path to the data directory (~/.formcoach).
fn get_data_directory() -> Result<PathBuf, DatabaseError> {
    let home = dirs::home_dir().ok_or_else(|| {
        DatabaseError::DirectoryCreation(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not find home directory",
        ))
    })?;

    Ok(home.join(".formcoach"))
}

/// Returns the path to the database file (~/.formcoach/formcoach.db).
pub fn get_database_path() -> Result<PathBuf, DatabaseError> {
    let data_dir = get_data_directory()?;
    Ok(data_dir.join("formcoach.db"))
}

/// Ensures the data directory exists and returns the database path.
fn ensure_database_directory() -> Result<PathBuf, DatabaseError> {
    let data_dir = get_data_directory()?;

    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        tracing::info!("Created data directory at {:?}", data_dir);
    }

    Ok(data_dir.join("formcoach.db"))
}

/// Opens a connection to the database.
///
/// Each call creates a new connection; callers hold it only for the duration
/// of one operation.
pub fn open_connection() -> Result<Connection, DatabaseError> {
    // DATABASE_PATH is normally set by initialise_database() at startup.
    // The expect here is a safeguard for direct open_connection() calls.
    let db_path = DATABASE_PATH.get_or_init(|| {
        ensure_database_directory()
            .expect("database directory must be writable; called before initialise_database()?")
    });

    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    Ok(conn)
}

/// Initialises the database, creating the directory and running migrations.
///
/// This should be called once on application startup.
pub fn initialise_database() -> Result<(), DatabaseError> {
    tracing::info!("Initialising database");

    let db_path = ensure_database_directory()?;
    DATABASE_PATH.get_or_init(|| db_path.clone());

    tracing::info!("Database path: {:?}", db_path);

    let mut conn = open_connection()?;
    run_migrations(&mut conn)?;

    tracing::info!("Database initialised successfully");
    Ok(())
}

// =============================================================================
// Re-exports
// =============================================================================

pub use summary::WorkoutSummary;

pub use summary::{
    clear_summaries, count_summaries, delete_summary, get_summary, list_summaries, save_summary,
};
