//! Segmentation job service
//!
//! Business logic for the job lifecycle as seen from the request path:
//! submission (Received → Queued), derived progress, and single-consumption
//! result retrieval.

use chrono::Utc;
use segint_core::storage::StorageError;
use segint_core::wire::{self, ModelInput, SegmentationProgress, SegmentationTask};
use uuid::Uuid;

use crate::repository::{catalog_repository, job_repository};
use crate::state::AppState;

/// Service error type
#[derive(Debug)]
pub enum SegmentationError {
    /// Body does not parse as `ModelInput`, or declares zero channels.
    MalformedInput,
    ModelNotFound,
    JobNotFound,
    /// Result requested before the output payload exists.
    StillProcessing,
    /// Output payload exists on record but cannot be read back.
    ResultUnreadable,
    DatabaseError(sqlx::Error),
    StorageError(StorageError),
}

impl From<sqlx::Error> for SegmentationError {
    fn from(err: sqlx::Error) -> Self {
        SegmentationError::DatabaseError(err)
    }
}

impl From<StorageError> for SegmentationError {
    fn from(err: StorageError) -> Self {
        SegmentationError::StorageError(err)
    }
}

/// Parses and validates a submitted input payload.
///
/// The gate before anything is persisted: wrong total length, an unparsable
/// message, or zero channels all reject the submission.
pub fn validate_model_input(body: &[u8]) -> Result<ModelInput, SegmentationError> {
    let input: ModelInput =
        wire::from_bytes(body).map_err(|_| SegmentationError::MalformedInput)?;

    if input.channels.is_empty() {
        return Err(SegmentationError::MalformedInput);
    }

    Ok(input)
}

/// Create and enqueue a segmentation job.
///
/// The input payload is durably written before the Queued record is inserted;
/// if the insert fails the payload is removed again so a rejected submission
/// leaves nothing behind.
pub async fn submit(
    state: &AppState,
    model_id: &str,
    body: &[u8],
) -> Result<SegmentationTask, SegmentationError> {
    validate_model_input(body)?;

    catalog_repository::find_version(&state.pool, model_id)
        .await?
        .ok_or(SegmentationError::ModelNotFound)?;

    let job_id = Uuid::new_v4();
    let created_at = Utc::now();

    let input_ref = state.blobs.write_input(job_id, body)?;

    if let Err(err) = job_repository::create(&state.pool, job_id, model_id, &input_ref, created_at).await
    {
        let _ = state.blobs.remove(&input_ref);
        return Err(err.into());
    }

    tracing::info!("Job queued: {} for model: {}", job_id, model_id);

    Ok(SegmentationTask {
        segmentation_id: job_id.to_string(),
        start_time: created_at,
    })
}

/// Derived progress for a job: exactly 0 or 100, never in between, and never
/// a distinct failed state (legacy wire behavior).
pub async fn progress(
    state: &AppState,
    model_id: &str,
    job_id: Uuid,
) -> Result<SegmentationProgress, SegmentationError> {
    let job = job_repository::find(&state.pool, model_id, job_id)
        .await?
        .ok_or(SegmentationError::JobNotFound)?;

    Ok(SegmentationProgress {
        progress: job.progress(),
        errors: String::new(),
        error_code: 0,
    })
}

/// Read back a completed result exactly once.
///
/// The record delete commits before the blobs are removed, so a crash in
/// between can orphan blobs but never leave a record pointing at deleted
/// payloads. After a successful read the job no longer exists.
pub async fn retrieve_result(
    state: &AppState,
    model_id: &str,
    job_id: Uuid,
) -> Result<Vec<u8>, SegmentationError> {
    let job = job_repository::find(&state.pool, model_id, job_id)
        .await?
        .ok_or(SegmentationError::JobNotFound)?;

    if job.progress() < 100 {
        return Err(SegmentationError::StillProcessing);
    }

    let output_ref = job.output_ref.as_deref().ok_or(SegmentationError::StillProcessing)?;

    let bytes = state.blobs.read(output_ref).map_err(|err| {
        tracing::error!("Failed to read result payload for job {}: {:?}", job_id, err);
        SegmentationError::ResultUnreadable
    })?;

    job_repository::delete(&state.pool, job_id).await?;

    if let Err(err) = state.blobs.remove(&job.input_ref) {
        tracing::warn!("Failed to remove input payload for job {}: {:?}", job_id, err);
    }
    if let Err(err) = state.blobs.remove(output_ref) {
        tracing::warn!("Failed to remove result payload for job {}: {:?}", job_id, err);
    }

    tracing::info!("Job {} consumed and deleted", job_id);

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use segint_core::domain::catalog::{BackendKind, ModelVersion};
    use segint_core::storage::BlobStore;
    use segint_core::volume::{self, ElementKind, VolumeBuffer};
    use segint_core::wire::{CalibratedVolume, ModelInputChannel, VolumeData3D};

    fn valid_input(channels: usize) -> Vec<u8> {
        let volume = VolumeBuffer::zeroed(ElementKind::Short, 4, 4, 4);
        let compressed = volume::encode(&volume).unwrap();
        let input = ModelInput {
            channels: (0..channels)
                .map(|_| ModelInputChannel {
                    calibrated_volume: CalibratedVolume {
                        volume: VolumeData3D {
                            width: 4,
                            height: 4,
                            depth: 4,
                            data: compressed.clone(),
                            data_type: ElementKind::Short.wire_code(),
                            compression_method: wire::COMPRESSION_GZIP,
                        },
                    },
                })
                .collect(),
        };
        wire::to_bytes(&input).unwrap()
    }

    #[test]
    fn test_validate_accepts_well_formed_input() {
        let input = validate_model_input(&valid_input(2)).unwrap();
        assert_eq!(input.channels.len(), 2);
    }

    #[test]
    fn test_validate_rejects_garbage() {
        assert!(matches!(
            validate_model_input(&[0xFF; 40]),
            Err(SegmentationError::MalformedInput)
        ));
    }

    #[test]
    fn test_validate_rejects_zero_channels() {
        assert!(matches!(
            validate_model_input(&valid_input(0)),
            Err(SegmentationError::MalformedInput)
        ));
    }

    #[test]
    fn test_validate_rejects_trailing_bytes() {
        let mut body = valid_input(1);
        body.extend_from_slice(b"junk");
        assert!(matches!(
            validate_model_input(&body),
            Err(SegmentationError::MalformedInput)
        ));
    }

    /// Runs against a live database when DATABASE_URL is set; no-op
    /// otherwise.
    #[tokio::test]
    async fn test_result_read_consumes_the_job() {
        let Ok(database_url) = std::env::var("DATABASE_URL") else {
            return;
        };

        let pool = db::create_pool(&database_url).await.unwrap();
        db::run_migrations(&pool).await.unwrap();

        let model_id = format!("consume-test-{}", Uuid::new_v4());
        let version = ModelVersion {
            model_id: model_id.clone(),
            description: String::new(),
            backend: BackendKind::Phantom,
            model_artifact: None,
            created_at: Utc::now(),
            credits_required: 0.0,
            major_version: 1,
            minor_version: 0,
            language_code: "en-US".to_string(),
        };
        catalog_repository::insert_version(&pool, &version).await.unwrap();

        let blobs = BlobStore::new(
            std::env::temp_dir().join(format!("segint-consume-{}", Uuid::new_v4())),
        );
        blobs.ensure_layout().unwrap();

        let state = AppState {
            pool,
            blobs,
            service_url: String::new(),
        };

        let task = submit(&state, &model_id, &valid_input(1)).await.unwrap();
        let job_id = Uuid::parse_str(&task.segmentation_id).unwrap();

        // Before completion the result is not retrievable.
        assert!(matches!(
            retrieve_result(&state, &model_id, job_id).await,
            Err(SegmentationError::StillProcessing)
        ));

        // Stand in for the worker's terminal update.
        let output_ref = state.blobs.write_output(job_id, b"result-bytes").unwrap();
        sqlx::query(
            "UPDATE segmentation_jobs SET status = 'Succeeded', output_ref = $1 WHERE id = $2",
        )
        .bind(&output_ref)
        .bind(job_id)
        .execute(&state.pool)
        .await
        .unwrap();

        // First read returns the payload and deletes the job.
        let bytes = retrieve_result(&state, &model_id, job_id).await.unwrap();
        assert_eq!(bytes, b"result-bytes".to_vec());

        // Second read: the job no longer exists.
        assert!(matches!(
            retrieve_result(&state, &model_id, job_id).await,
            Err(SegmentationError::JobNotFound)
        ));
        assert!(matches!(
            progress(&state, &model_id, job_id).await,
            Err(SegmentationError::JobNotFound)
        ));

        // Both payload blobs are gone with the record.
        assert!(state.blobs.read(&output_ref).is_err());
    }
}
