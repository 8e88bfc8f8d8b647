//! Database schema definitions.
//!
//! Contains SQL statements for creating and managing database tables.

/// SQL statement to create the migrations tracking table.
pub const CREATE_MIGRATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// SQL statement to create the workout summaries table.
pub const CREATE_SUMMARIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS workout_summaries (
    id TEXT PRIMARY KEY,
    workout_id INTEGER NOT NULL,
    workout_title TEXT NOT NULL,
    category TEXT NOT NULL,
    completed_reps INTEGER NOT NULL,
    target_reps INTEGER NOT NULL,
    average_accuracy INTEGER NOT NULL,
    max_accuracy INTEGER NOT NULL,
    duration_seconds INTEGER NOT NULL,
    target_duration_seconds INTEGER NOT NULL,
    completed INTEGER NOT NULL DEFAULT 0,
    percent_complete INTEGER NOT NULL,
    started_at TEXT,
    ended_at TEXT NOT NULL
);
"#;

/// SQL statement to create an index on ended_at for listing by recency.
pub const CREATE_SUMMARIES_ENDED_AT_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_summaries_ended_at ON workout_summaries(ended_at);
"#;

/// SQL statement to create an index on workout_id for per-exercise queries.
pub const CREATE_SUMMARIES_WORKOUT_ID_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_summaries_workout_id ON workout_summaries(workout_id);
"#;
