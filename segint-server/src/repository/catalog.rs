//! Model catalog repository
//!
//! Read access to model versions and their structures, plus the inserts used
//! by catalog seeding at startup.

use chrono::{DateTime, Utc};
use segint_core::domain::catalog::{BackendKind, ModelVersion, Structure, StructureKind};
use sqlx::PgPool;

/// Find a model version by its catalog id
pub async fn find_version(
    pool: &PgPool,
    model_id: &str,
) -> Result<Option<ModelVersion>, sqlx::Error> {
    let row = sqlx::query_as::<_, ModelVersionRow>(
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

    Ok(row.map(|r| r.into()))
}

/// List all model versions
pub async fn list_versions(pool: &PgPool) -> Result<Vec<ModelVersion>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ModelVersionRow>(
        r#"
        SELECT model_id, description, backend, model_artifact, created_at,
               credits_required, major_version, minor_version, language_code
        FROM model_versions
        ORDER BY model_id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

/// List the structures segmented by a model version
pub async fn list_structures(pool: &PgPool, model_id: &str) -> Result<Vec<Structure>, sqlx::Error> {
    let rows = sqlx::query_as::<_, StructureRow>(
        r#"
        SELECT name, color_r, color_g, color_b, kind, fma_code,
               input_channel_id, structure_id
        FROM structures
        WHERE model_id = $1
        ORDER BY id ASC
        "#,
    )
    .bind(model_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

/// Count catalog entries (used by startup seeding)
pub async fn count_versions(pool: &PgPool) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM model_versions")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Insert a model version
pub async fn insert_version(pool: &PgPool, version: &ModelVersion) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO model_versions
            (model_id, description, backend, model_artifact, created_at,
             credits_required, major_version, minor_version, language_code)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(&version.model_id)
    .bind(&version.description)
    .bind(version.backend.as_str())
    .bind(&version.model_artifact)
    .bind(version.created_at)
    .bind(version.credits_required)
    .bind(version.major_version)
    .bind(version.minor_version)
    .bind(&version.language_code)
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert a structure for a model version
pub async fn insert_structure(
    pool: &PgPool,
    model_id: &str,
    structure: &Structure,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO structures
            (model_id, name, color_r, color_g, color_b, kind, fma_code,
             input_channel_id, structure_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(model_id)
    .bind(&structure.name)
    .bind(structure.color_r)
    .bind(structure.color_g)
    .bind(structure.color_b)
    .bind(structure.kind.as_i32())
    .bind(structure.fma_code)
    .bind(&structure.input_channel_id)
    .bind(&structure.structure_id)
    .execute(pool)
    .await?;

    Ok(())
}

// =============================================================================
// Database Row Types
// =============================================================================

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
