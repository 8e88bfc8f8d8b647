//! Workout summary CRUD operations.
//!
//! Stores the final summary of each training session. Values go through
//! basic range sanitisation on construction; there are no further
//! invariants here.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::DatabaseError;
use crate::workout::Workout;

/// A completed (or abandoned) training session summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSummary {
    /// Unique identifier (UUID).
    pub id: String,
    pub workout_id: u32,
    pub workout_title: String,
    /// Muscle-group label, e.g. "Legs".
    pub category: String,
    pub completed_reps: u32,
    pub target_reps: u32,
    /// Smoothed accuracy at session end, 0–100.
    pub average_accuracy: u8,
    /// Best smoothed accuracy seen during the session, 0–100.
    pub max_accuracy: u8,
    pub duration_secs: u32,
    pub target_duration_secs: u32,
    /// Whether the rep target was reached.
    pub completed: bool,
    /// completed_reps as a percentage of the target.
    pub percent_complete: u32,
    /// When the session started (RFC 3339), if it was ever started.
    pub started_at: Option<String>,
    /// When the session ended (RFC 3339).
    pub ended_at: String,
}

impl WorkoutSummary {
    /// Builds a sanitised summary for a finished session.
    pub fn new(
        workout: &Workout,
        completed_reps: u32,
        average_accuracy: u8,
        max_accuracy: u8,
        duration_secs: u32,
        started_at: Option<DateTime<Utc>>,
        ended_at: DateTime<Utc>,
    ) -> Self {
        let percent_complete = if workout.target_reps == 0 {
            0
        } else {
            completed_reps * 100 / workout.target_reps
        };

        Self {
            id: Uuid::new_v4().to_string(),
            workout_id: workout.id,
            workout_title: workout.title.to_string(),
            category: workout.category.as_str().to_string(),
            completed_reps,
            target_reps: workout.target_reps,
            average_accuracy: average_accuracy.min(100),
            max_accuracy: max_accuracy.min(100),
            duration_secs,
            target_duration_secs: workout.target_duration_secs,
            completed: completed_reps >= workout.target_reps,
            percent_complete,
            started_at: started_at.map(|t| t.to_rfc3339()),
            ended_at: ended_at.to_rfc3339(),
        }
    }
}

// =============================================================================
// Database Functions
// =============================================================================

/// Column list for all SELECT queries.
const SELECT_COLUMNS: &str = r#"
    id, workout_id, workout_title, category,
    completed_reps, target_reps, average_accuracy, max_accuracy,
    duration_seconds, target_duration_seconds, completed,
    percent_complete, started_at, ended_at
"#;

/// Map a database row to a WorkoutSummary struct.
fn row_to_summary(row: &rusqlite::Row) -> rusqlite::Result<WorkoutSummary> {
    Ok(WorkoutSummary {
        id: row.get(0)?,
        workout_id: row.get(1)?,
        workout_title: row.get(2)?,
        category: row.get(3)?,
        completed_reps: row.get(4)?,
        target_reps: row.get(5)?,
        average_accuracy: row.get(6)?,
        max_accuracy: row.get(7)?,
        duration_secs: row.get(8)?,
        target_duration_secs: row.get(9)?,
        completed: row.get::<_, i32>(10)? != 0,
        percent_complete: row.get(11)?,
        started_at: row.get(12)?,
        ended_at: row.get(13)?,
    })
}

/// Saves a workout summary.
pub fn save_summary(conn: &Connection, summary: &WorkoutSummary) -> Result<(), DatabaseError> {
    conn.execute(
        r#"
        INSERT INTO workout_summaries (
            id, workout_id, workout_title, category,
            completed_reps, target_reps, average_accuracy, max_accuracy,
            duration_seconds, target_duration_seconds, completed,
            percent_complete, started_at, ended_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
        "#,
        params![
            summary.id,
            summary.workout_id,
            summary.workout_title,
            summary.category,
            summary.completed_reps,
            summary.target_reps,
            summary.average_accuracy,
            summary.max_accuracy,
            summary.duration_secs,
            summary.target_duration_secs,
            summary.completed as i32,
            summary.percent_complete,
            summary.started_at,
            summary.ended_at,
        ],
    )?;

    tracing::debug!("Saved workout summary: {}", summary.id);
    Ok(())
}

/// Retrieves a summary by its ID.
pub fn get_summary(conn: &Connection, id: &str) -> Result<Option<WorkoutSummary>, DatabaseError> {
    let result = conn.query_row(
        &format!(
            "SELECT {} FROM workout_summaries WHERE id = ?1",
            SELECT_COLUMNS
        ),
        params![id],
        row_to_summary,
    );

    match result {
        Ok(summary) => Ok(Some(summary)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Lists summaries, newest first.
pub fn list_summaries(
    conn: &Connection,
    limit: Option<i64>,
    offset: Option<i64>,
) -> Result<Vec<WorkoutSummary>, DatabaseError> {
    let limit = limit.unwrap_or(100);
    let offset = offset.unwrap_or(0);

    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM workout_summaries ORDER BY ended_at DESC LIMIT ?1 OFFSET ?2",
        SELECT_COLUMNS
    ))?;

    let summaries = stmt
        .query_map(params![limit, offset], row_to_summary)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(summaries)
}

/// Deletes a summary by its ID.
pub fn delete_summary(conn: &Connection, id: &str) -> Result<bool, DatabaseError> {
    let rows_affected = conn.execute("DELETE FROM workout_summaries WHERE id = ?1", params![id])?;

    if rows_affected > 0 {
        tracing::debug!("Deleted workout summary: {}", id);
        Ok(true)
    } else {
        tracing::warn!("No workout summary found with id: {}", id);
        Ok(false)
    }
}

/// Deletes all summaries, returning how many were removed.
pub fn clear_summaries(conn: &Connection) -> Result<usize, DatabaseError> {
    let rows_affected = conn.execute("DELETE FROM workout_summaries", [])?;
    tracing::info!("Cleared {} workout summaries", rows_affected);
    Ok(rows_affected)
}

/// Counts stored summaries.
pub fn count_summaries(conn: &Connection) -> Result<usize, DatabaseError> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM workout_summaries", [], |row| {
        row.get(0)
    })?;
    Ok(count as usize)
}
