//! Segmentation job repository
//!
//! Handles all database operations related to segmentation jobs. Each job is
//! written by the server once at creation and by the worker once at
//! completion; there are never concurrent writers for one identity.

use chrono::{DateTime, Utc};
use segint_core::domain::job::{JobStatus, SegmentationJob};
use sqlx::PgPool;
use uuid::Uuid;

/// Insert a new job in Queued state. This is the enqueue: the worker polls
/// for Queued rows.
pub async fn create(
    pool: &PgPool,
    id: Uuid,
    model_id: &str,
    input_ref: &str,
    created_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO segmentation_jobs (id, model_id, status, input_ref, created_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(id)
    .bind(model_id)
    .bind(JobStatus::Queued.as_str())
    .bind(input_ref)
    .bind(created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Find a job by model id and job id (jobs are always addressed by both,
/// matching the endpoint paths).
pub async fn find(
    pool: &PgPool,
    model_id: &str,
    id: Uuid,
) -> Result<Option<SegmentationJob>, sqlx::Error> {
    let row = sqlx::query_as::<_, JobRow>(
        r#"
        SELECT id, model_id, status, input_ref, output_ref, error,
               created_at, started_at, completed_at
        FROM segmentation_jobs
        WHERE id = $1 AND model_id = $2
        "#,
    )
    .bind(id)
    .bind(model_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.into()))
}

/// Delete a job by ID
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM segmentation_jobs WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
pub(crate) struct JobRow {
    id: Uuid,
    model_id: String,
    status: String,
    input_ref: String,
    output_ref: Option<String>,
    error: Option<String>,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl From<JobRow> for SegmentationJob {
    fn from(row: JobRow) -> Self {
        SegmentationJob {
            id: row.id,
            model_id: row.model_id,
            status: JobStatus::parse(&row.status),
            input_ref: row.input_ref,
            output_ref: row.output_ref,
            error: row.error,
            created_at: row.created_at,
            started_at: row.started_at,
            completed_at: row.completed_at,
        }
    }
}
