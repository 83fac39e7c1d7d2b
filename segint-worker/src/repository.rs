//! Worker-side job and catalog access
//!
//! The jobs table doubles as the durable task queue. Claiming is a
//! compare-and-swap on the status column, so two workers can never run the
//! same job, and each record receives its terminal state exactly once.

use chrono::{DateTime, Utc};
use segint_core::domain::catalog::{BackendKind, ModelVersion, Structure, StructureKind};
use segint_core::domain::job::{JobOutcome, JobStatus, SegmentationJob};
use sqlx::PgPool;
use uuid::Uuid;

/// Oldest-first list of queued job ids
pub async fn list_queued(pool: &PgPool) -> Result<Vec<Uuid>, sqlx::Error> {
    let rows: Vec<(Uuid,)> = sqlx::query_as(
        r#"
        SELECT id
        FROM segmentation_jobs
        WHERE status = $1
        ORDER BY created_at ASC
        "#,
    )
    .bind(JobStatus::Queued.as_str())
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Claim a queued job for execution (Queued → Running).
///
/// Returns `None` when another worker claimed it first or the job no longer
/// exists.
pub async fn claim(pool: &PgPool, id: Uuid) -> Result<Option<SegmentationJob>, sqlx::Error> {
    let row = sqlx::query_as::<_, JobRow>(
        r#"
        UPDATE segmentation_jobs
        SET status = $1, started_at = $2
        WHERE id = $3 AND status = $4
        RETURNING id, model_id, status, input_ref, output_ref, error,
                  created_at, started_at, completed_at
        "#,
    )
    .bind(JobStatus::Running.as_str())
    .bind(Utc::now())
    .bind(id)
    .bind(JobStatus::Queued.as_str())
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.into()))
}

/// Record the terminal state of a job (Running → Succeeded | Failed).
///
/// One UPDATE writes either the output reference or the error, never both.
pub async fn complete(pool: &PgPool, id: Uuid, outcome: &JobOutcome) -> Result<(), sqlx::Error> {
    let now = Utc::now();

    match outcome {
        JobOutcome::Succeeded { output_ref } => {
            sqlx::query(
                r#"
                UPDATE segmentation_jobs
                SET status = $1, output_ref = $2, completed_at = $3
                WHERE id = $4
                "#,
            )
            .bind(JobStatus::Succeeded.as_str())
            .bind(output_ref)
            .bind(now)
            .bind(id)
            .execute(pool)
            .await?;
        }
        JobOutcome::Failed { error } => {
            // Keep the stored diagnostic inside the column width.
            let short: String = error.chars().take(200).collect();
            sqlx::query(
                r#"
                UPDATE segmentation_jobs
                SET status = $1, error = $2, completed_at = $3
                WHERE id = $4
                "#,
            )
            .bind(JobStatus::Failed.as_str())
            .bind(short)
            .bind(now)
            .bind(id)
            .execute(pool)
            .await?;
        }
    }

    Ok(())
}

/// Look up the model version and its primary structure for a queued job.
pub async fn find_model(
    pool: &PgPool,
    model_id: &str,
) -> Result<Option<(ModelVersion, Structure)>, sqlx::Error> {
    let version = sqlx::query_as::<_, ModelVersionRow>(
        r#"
        SELECT model_id, description, backend, model_artifact, created_at,
               credits_required, major_version, minor_version, language_code
        FROM model_versions
        WHERE model_id = $1
        "#,
    )
    .bind(model_id)
    .fetch_optional(pool)
    .await?;

    let Some(version) = version else {
        return Ok(None);
    };

    let structure = sqlx::query_as::<_, StructureRow>(
        r#"
        SELECT name, color_r, color_g, color_b, kind, fma_code,
               input_channel_id, structure_id
        FROM structures
        WHERE model_id = $1
        ORDER BY id ASC
        LIMIT 1
        "#,
    )
    .bind(model_id)
    .fetch_optional(pool)
    .await?;

    let Some(structure) = structure else {
        return Ok(None);
    };

    Ok(Some((version.into(), structure.into())))
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct JobRow {
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

#[derive(sqlx::FromRow)]
struct ModelVersionRow {
    model_id: String,
    description: String,
    backend: String,
    model_artifact: Option<String>,
    created_at: DateTime<Utc>,
    credits_required: f64,
    major_version: i32,
    minor_version: i32,
    language_code: String,
}

impl From<ModelVersionRow> for ModelVersion {
    fn from(row: ModelVersionRow) -> Self {
        ModelVersion {
            model_id: row.model_id,
            description: row.description,
            backend: BackendKind::parse(&row.backend),
            model_artifact: row.model_artifact,
            created_at: row.created_at,
            credits_required: row.credits_required,
            major_version: row.major_version,
            minor_version: row.minor_version,
            language_code: row.language_code,
        }
    }
}

#[derive(sqlx::FromRow)]
struct StructureRow {
    name: String,
    color_r: i32,
    color_g: i32,
    color_b: i32,
    kind: i32,
    fma_code: i32,
    input_channel_id: String,
    structure_id: String,
}

impl From<StructureRow> for Structure {
    fn from(row: StructureRow) -> Self {
        Structure {
            name: row.name,
            color_r: row.color_r,
            color_g: row.color_g,
            color_b: row.color_b,
            kind: StructureKind::from_i32(row.kind),
            fma_code: row.fma_code,
            input_channel_id: row.input_channel_id,
            structure_id: row.structure_id,
        }
    }
}
