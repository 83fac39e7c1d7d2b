//! Telemetry repository

use segint_core::wire::SegmentationTelemetry;
use sqlx::PgPool;

/// Insert a telemetry message
pub async fn insert(pool: &PgPool, telemetry: &SegmentationTelemetry) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO telemetry
            (client_software_version, upload_time_ms, segmentation_wait_ms,
             segmentation_down_ms, segmentation_retries, segmentation_model_id,
             segmentation_id, client_error, client_error_info)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(&telemetry.client_information.software_version)
    .bind(telemetry.upload_time_in_milliseconds)
    .bind(telemetry.segmentation_wait_in_milliseconds)
    .bind(telemetry.segmentation_download_in_milliseconds)
    .bind(telemetry.number_of_retries)
    .bind(&telemetry.model_id)
    .bind(&telemetry.segmentation_id)
    .bind(telemetry.client_error)
    .bind(&telemetry.client_error_information)
    .execute(pool)
    .await?;

    Ok(())
}
