//! Model catalog service
//!
//! Builds the wire catalog collection directly from the relational rows.
//! Catalog entries are fully materialized when they are ingested (seeded),
//! so the read path never mutates state.

use chrono::Utc;
use segint_core::domain::catalog::{
    BackendKind, ModelVersion, Structure, StructureKind,
};
use segint_core::wire::{ModelVersionInfo, ModelsCollection};
use sqlx::PgPool;

use crate::repository::catalog_repository;

/// Build the full catalog collection.
pub async fn list_models(pool: &PgPool) -> Result<ModelsCollection, sqlx::Error> {
    let versions = catalog_repository::list_versions(pool).await?;

    let mut models = Vec::with_capacity(versions.len());
    for version in versions {
        let structures = catalog_repository::list_structures(pool, &version.model_id).await?;
        models.push(to_wire(&version, &structures));
    }

    Ok(ModelsCollection { models })
}

/// Ensure at least one runnable model version exists so the service is
/// exercisable on a fresh database. Runs once at startup.
pub async fn ensure_seeded(pool: &PgPool) -> Result<(), sqlx::Error> {
    if catalog_repository::count_versions(pool).await? > 0 {
        return Ok(());
    }

    let version = default_phantom_version();
    let structure = default_phantom_structure();

    catalog_repository::insert_version(pool, &version).await?;
    catalog_repository::insert_structure(pool, &version.model_id, &structure).await?;

    tracing::info!("Seeded model catalog with: {}", version.model_id);

    Ok(())
}

fn to_wire(version: &ModelVersion, structures: &[Structure]) -> ModelVersionInfo {
    ModelVersionInfo {
        id: version.model_id.clone(),
        version_description: version.description.clone(),
        created_on: version.created_at,
        number_of_credits_required: version.credits_required,
        major_version: version.major_version,
        minor_version: version.minor_version,
        language_code: version.language_code.clone(),
        structures: structures.iter().map(|s| s.to_wire()).collect(),
    }
}

fn default_phantom_version() -> ModelVersion {
    ModelVersion {
        model_id: "phantom-box-v1".to_string(),
        description: "Synthetic centered-prism segmentation for integration testing".to_string(),
        backend: BackendKind::Phantom,
        model_artifact: None,
        created_at: Utc::now(),
        credits_required: 0.0,
        major_version: 1,
        minor_version: 0,
        language_code: "en-US".to_string(),
    }
}

fn default_phantom_structure() -> Structure {
    Structure {
        name: "Phantom Box".to_string(),
        color_r: 255,
        color_g: 0,
        color_b: 0,
        kind: StructureKind::Organ,
        fma_code: 0,
        input_channel_id: "CT".to_string(),
        structure_id: "phantom-box".to_string(),
    }
}
